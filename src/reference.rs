use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::utils::MyHash;

/// Handle to a diagram node, possibly complemented.
///
/// The sign carries the complement bit: `-r` denotes the negation of `r`.
/// Index `1` is the terminal, so `Ref(1)` is true and `Ref(-1)` is false.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    pub(crate) const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    /// Index of the referenced node in the unique table.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Raw value with the complement bit folded into the lowest bit.
    pub(crate) const fn unsigned(self) -> u32 {
        (self.0.unsigned_abs() << 1) | (self.0 < 0) as u32
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        self.unsigned() as u64
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let r = Ref::positive(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
    }

    #[test]
    fn test_unsigned_distinguishes_sign() {
        let r = Ref::positive(3);
        assert_eq!(r.unsigned(), 6);
        assert_eq!((-r).unsigned(), 7);
    }

    #[test]
    fn test_display() {
        let r = Ref::positive(2);
        assert_eq!(r.to_string(), "@2");
        assert_eq!((-r).to_string(), "~@2");
    }
}

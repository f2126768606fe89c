/// [Szudzik pairing function][szudzik-pairing], wrapping on overflow.
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Only used for bucket selection, so collisions after wrap-around are harmless.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

pub trait MyHash {
    /// Hash used to pick a bucket in [`Table`][crate::table::Table]
    /// and a slot in [`Cache`][crate::cache::Cache].
    fn hash(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_enumerates_squares() {
        // Pairs with max(a, b) < n fill exactly 0..n^2.
        let n = 6;
        let mut values: Vec<u64> = (0..n)
            .flat_map(|a| (0..n).map(move |b| pairing2(a, b)))
            .collect();
        values.sort_unstable();
        assert_eq!(values, (0..n * n).collect::<Vec<_>>());
        assert_eq!(pairing2(1, 2), 5);
        assert_eq!(pairing2(2, 1), 7);
    }

    #[test]
    fn test_large_values_wrap() {
        let big = u64::MAX - 1;
        // Must not overflow-panic in debug builds.
        let _ = pairing2(big, big);
        let _ = pairing3(big, 1, big);
    }
}

use std::ops::Index;

use log::debug;

use crate::error::{Error, Result};
use crate::utils::MyHash;

struct Entry<T> {
    value: T,
    next: usize,
}

/// Hash-consing table: every distinct value is stored exactly once.
///
/// Index `0` is a sentinel meaning "end of chain", so valid indices start at `1`.
/// Entries are never removed; a table lives as long as the manager that owns it.
pub struct Table<T> {
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
    /// Maximum number of stored values, if bounded.
    limit: Option<usize>,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table with initial room for `2^bits` values.
    pub fn new(bits: usize, limit: Option<usize>) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let mut data = Vec::with_capacity(1 << bits);
        data.push(Entry {
            value: T::default(),
            next: 0,
        });

        let buckets_bits = bits.min(16);
        let buckets = vec![0; 1 << buckets_bits];
        let bitmask = (buckets.len() - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            limit,
        }
    }
}

impl<T> Table<T> {
    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of values that fit without reallocation.
    pub fn capacity(&self) -> usize {
        self.data.capacity() - 1
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    fn next(&self, index: usize) -> usize {
        self.data[index].next
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a value into the table and return its index.
    ///
    /// Returns the index of the existing copy if the value is already present.
    pub fn put(&mut self, value: T) -> Result<usize> {
        let bucket = self.bucket_index(&value);
        let mut index = self.buckets[bucket];
        while index != 0 {
            if self.data[index].value == value {
                return Ok(index);
            }
            index = self.next(index);
        }

        if let Some(limit) = self.limit {
            if self.len() >= limit {
                return Err(Error::ResourceExhausted(format!(
                    "node table reached its limit of {} nodes",
                    limit
                )));
            }
        }

        let index = self.data.len();
        self.data.push(Entry {
            value,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = index;

        if self.len() > 2 * self.buckets.len() {
            self.grow_buckets();
        }

        Ok(index)
    }

    fn grow_buckets(&mut self) {
        let size = self.buckets.len() * 2;
        debug!("Growing table buckets to {}", size);
        self.buckets = vec![0; size];
        self.bitmask = (size - 1) as u64;
        for index in 1..self.data.len() {
            let bucket = self.bucket_index(&self.data[index].value);
            self.data[index].next = self.buckets[bucket];
            self.buckets[bucket] = index;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl MyHash for Item {
        fn hash(&self) -> u64 {
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_put_dedup() {
        let mut table = Table::new(2, None);
        let a = table.put(Item(5)).unwrap();
        let b = table.put(Item(-5)).unwrap();
        let c = table.put(Item(5)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(table[a], Item(5));
        assert_eq!(table[b], Item(-5));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_limit() {
        let mut table = Table::new(2, Some(2));
        table.put(Item(1)).unwrap();
        table.put(Item(2)).unwrap();
        // Existing values are still found at the limit.
        assert!(table.put(Item(1)).is_ok());
        assert!(matches!(table.put(Item(3)), Err(Error::ResourceExhausted(_))));
    }

    #[test]
    fn test_grow_keeps_values_reachable() {
        let mut table = Table::new(1, None);
        let indices: Vec<usize> = (0..100).map(|i| table.put(Item(i)).unwrap()).collect();
        for (i, &index) in indices.iter().enumerate() {
            assert_eq!(table.put(Item(i as i32)).unwrap(), index);
        }
        assert_eq!(table.len(), 100);
    }
}

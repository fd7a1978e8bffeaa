use super::Item;

/// Size spread of a name group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// Only one item, never a duplicate candidate.
    Singleton,
    /// Every item is within the tolerance of the first one.
    AllEqualSize,
    /// At least one item differs in size.
    SizeVaries,
}

/// Check if two sizes are equal within the given tolerance.
#[must_use]
pub const fn sizes_equal(a: u64, b: u64, tolerance: u64) -> bool {
    a.abs_diff(b) <= tolerance
}

/// Classify a name group by how the sizes of its members relate.
///
/// Each member is compared against the first one.
#[must_use]
pub fn classify_sizes(items: &[Item], tolerance: u64) -> SizeClass {
    let [first, rest @ ..] = items else {
        return SizeClass::Singleton;
    };
    if rest.is_empty() {
        return SizeClass::Singleton;
    }
    if rest
        .iter()
        .all(|item| sizes_equal(item.size_bytes, first.size_bytes, tolerance))
    {
        SizeClass::AllEqualSize
    } else {
        SizeClass::SizeVaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn sizes_equal_within_tolerance() {
        assert!(sizes_equal(5000, 5000, 1024));
        assert!(sizes_equal(5000, 6024, 1024));
        assert!(!sizes_equal(5000, 6025, 1024));
    }

    #[test]
    fn sizes_equal_is_symmetric() {
        let values = [0, 1, 1023, 1024, 1025, 4096, u64::MAX - 1, u64::MAX];
        for &a in &values {
            for &b in &values {
                assert_eq!(sizes_equal(a, b, 1024), sizes_equal(b, a, 1024));
            }
        }
    }

    #[test]
    fn zero_tolerance_requires_exact_size() {
        assert!(sizes_equal(10, 10, 0));
        assert!(!sizes_equal(10, 11, 0));
    }

    #[test]
    fn single_item_is_singleton() {
        assert_eq!(classify_sizes(&[Item::new(1, "Show", MB)], 1024), SizeClass::Singleton);
        assert_eq!(classify_sizes(&[], 1024), SizeClass::Singleton);
    }

    #[test]
    fn same_sizes_are_all_equal() {
        let items = [Item::new(1, "Show", 5000 * MB), Item::new(2, "Show", 5000 * MB + 512)];
        assert_eq!(classify_sizes(&items, 1024), SizeClass::AllEqualSize);
    }

    #[test]
    fn different_sizes_vary() {
        let items = [
            Item::new(1, "Show", 5000 * MB),
            Item::new(2, "Show", 5000 * MB),
            Item::new(3, "Show", 1500 * MB),
        ];
        assert_eq!(classify_sizes(&items, 1024), SizeClass::SizeVaries);
    }
}

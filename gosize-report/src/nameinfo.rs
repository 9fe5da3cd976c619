/// Aggregate statistics over the function names of a program.
///
/// Function names dominate the string data of a Go binary; the prefix
/// figure estimates how much of that a prefix-compressed encoding could
/// save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameStats {
    /// Total bytes of all function names, without terminators.
    pub total_bytes: usize,
    /// Bytes of names that are prefixes of the next name in sorted order.
    pub prefix_bytes: usize,
}

/// Computes [`NameStats`] over the given names.
pub fn name_stats<'a>(names: impl IntoIterator<Item = &'a str>) -> NameStats {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();
    let total_bytes = names.iter().map(|name| name.len()).sum();
    let prefix_bytes = names
        .windows(2)
        .filter(|pair| pair[1].starts_with(pair[0]))
        .map(|pair| pair[0].len())
        .sum();
    NameStats {
        total_bytes,
        prefix_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_stats() {
        let stats = name_stats(["main.main", "main.main.func1", "main.run"]);
        assert_eq!(stats.total_bytes, 9 + 15 + 8);
        assert_eq!(stats.prefix_bytes, 9);

        let empty = name_stats([]);
        assert_eq!(empty.total_bytes, 0);
        assert_eq!(empty.prefix_bytes, 0);
    }
}

//! Routing real points to discriminators.

/// Split batch indices `0..routes.len()` by route.
///
/// Every index lands in exactly one of the `domains` subsets; out-of-range
/// routes go to the last domain. Subsets may be empty.
pub fn partition_by_route(routes: &[usize], domains: usize) -> Vec<Vec<usize>> {
    let mut parts = vec![Vec::new(); domains];
    if let Some(last) = domains.checked_sub(1) {
        for (index, &route) in routes.iter().enumerate() {
            parts[route.min(last)].push(index);
        }
    }
    parts
}

/// Every discriminator sees the whole batch.
pub fn broadcast(batch: usize, domains: usize) -> Vec<Vec<usize>> {
    vec![(0..batch).collect(); domains]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partition_simple() {
        let parts = partition_by_route(&[1, 0, 1, 2], 3);
        assert_eq!(parts, vec![vec![1], vec![0, 2], vec![3]]);
    }

    #[test]
    fn test_partition_allows_empty_subsets() {
        let parts = partition_by_route(&[0, 0], 3);
        assert!(parts[1].is_empty() && parts[2].is_empty());
    }

    #[test]
    fn test_partition_zero_domains() {
        assert!(partition_by_route(&[0, 1], 0).is_empty());
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(broadcast(3, 2), vec![vec![0, 1, 2], vec![0, 1, 2]]);
    }

    proptest! {
        #[test]
        fn prop_partition_is_complete_and_disjoint(
            routes in prop::collection::vec(0usize..6, 0..64),
            domains in 1usize..6,
        ) {
            let parts = partition_by_route(&routes, domains);
            prop_assert_eq!(parts.len(), domains);
            let mut seen: Vec<usize> = parts.iter().flatten().copied().collect();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..routes.len()).collect::<Vec<_>>());
            for (d, part) in parts.iter().enumerate() {
                for &i in part {
                    prop_assert_eq!(routes[i].min(domains - 1), d);
                }
            }
        }
    }
}

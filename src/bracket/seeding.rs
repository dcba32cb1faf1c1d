//! Seed placement order for balanced knockout brackets.

/// Compute the left-to-right placement order for `n` ranked seeds.
///
/// Returns a permutation of the seed indices `0..n` such that adjacent
/// pairs in the result are the round-one pairings and the strongest seeds
/// can only meet in the latest possible round. This is the standard
/// "1 vs n, 2 vs n-1" recursive halving: for 8 seeds the order is
/// `[0, 7, 3, 4, 1, 6, 2, 5]`, giving round-one pairs (1v8), (4v5),
/// (2v7), (3v6).
///
/// `n` must be a power of two >= 2; callers validate before calling.
pub fn bracket_order(n: usize) -> Vec<usize> {
    debug_assert!(n >= 2 && n.is_power_of_two());

    if n == 2 {
        return vec![0, 1];
    }

    let half = bracket_order(n / 2);
    let mut order = Vec::with_capacity(n);
    for pos in half {
        order.push(pos);
        order.push(n - 1 - pos);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base_case() {
        assert_eq!(bracket_order(2), vec![0, 1]);
    }

    #[test]
    fn test_four_seeds() {
        // 1v4 and 2v3
        assert_eq!(bracket_order(4), vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_eight_seeds() {
        assert_eq!(bracket_order(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
    }

    #[test]
    fn test_top_two_seeds_in_opposite_halves() {
        for n in [4, 8, 16, 32, 64] {
            let order = bracket_order(n);
            let pos0 = order.iter().position(|&s| s == 0).unwrap();
            let pos1 = order.iter().position(|&s| s == 1).unwrap();
            // Seeds 0 and 1 can only meet in the final.
            assert!(
                (pos0 < n / 2) != (pos1 < n / 2),
                "seeds 0 and 1 share a half for n={n}"
            );
        }
    }

    #[test]
    fn test_round_one_pairs_sum_to_n_minus_one() {
        for n in [4, 8, 16, 32, 64] {
            let order = bracket_order(n);
            for pair in order.chunks(2) {
                assert_eq!(pair[0] + pair[1], n - 1);
            }
        }
    }

    proptest! {
        #[test]
        fn test_order_is_a_permutation(exp in 1u32..=6) {
            let n = 2usize.pow(exp);
            let mut order = bracket_order(n);
            order.sort_unstable();
            prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
        }
    }
}

//! crates/wayfarer_core/src/progression.rs
//!
//! The decaying-reward math. Kept pure so it can be tested without a ledger;
//! the engine supplies the prior-visit count from the ledger.

/// Experience awarded for a check-in given the number of *prior* visits to
/// that exact place under that identity.
///
/// First visit pays 20, each repeat pays 5 less, floored at 5: new places
/// are worth more than grinding one spot, but no check-in is ever worthless.
pub fn reward_for_visits(prior_visits: u32) -> i32 {
    (20i64 - 5 * i64::from(prior_visits)).max(5) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_decays_to_a_floor_of_five() {
        let rewards: Vec<i32> = (0..5).map(reward_for_visits).collect();
        assert_eq!(rewards, [20, 15, 10, 5, 5]);
    }

    #[test]
    fn reward_is_monotonically_non_increasing() {
        let mut last = i32::MAX;
        for n in 0..50 {
            let r = reward_for_visits(n);
            assert!(r <= last);
            assert!(r >= 5);
            last = r;
        }
    }

    #[test]
    fn reward_does_not_overflow_on_huge_counts() {
        assert_eq!(reward_for_visits(u32::MAX), 5);
    }
}

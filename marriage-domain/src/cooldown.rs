use chrono::Duration;

/// Cooldown applied to the first rejection between a given proposer/target pair.
pub const INITIAL_PER_TARGET_COOLDOWN: Duration = Duration::hours(24);

/// Cooldown a proposer must wait between any two proposals, regardless of target.
pub const GLOBAL_COOLDOWN: Duration = Duration::hours(4);

/// Window during which a Pending proposal remains open before the scheduler expires it.
pub const PROPOSAL_EXPIRY: Duration = Duration::hours(24);

/// How long an Active ceremony may run without progressing before it is postponed.
pub const DISCONNECTION_TIMEOUT: Duration = Duration::minutes(5);

/// Maximum number of invitees a ceremony may carry.
pub const MAX_INVITEES: usize = 15;

/// Minimum character level required to send or receive a proposal.
pub const MIN_LEVEL: u32 = 10;

/// Computes the cooldown window following a rejection, using exponential back-off keyed on
/// how many times this proposer had already been rejected by this target before this one
/// (`INITIAL_PER_TARGET_COOLDOWN × 2^rejectionCount_before_this_rejection`).
pub fn per_target_cooldown(rejection_count_before: u32) -> Duration {
    let multiplier = 1i64.checked_shl(rejection_count_before).unwrap_or(i64::MAX);
    INITIAL_PER_TARGET_COOLDOWN * multiplier as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rejection_uses_base_cooldown() {
        assert_eq!(per_target_cooldown(0), Duration::hours(24));
    }

    #[test]
    fn cooldown_doubles_per_prior_rejection() {
        assert_eq!(per_target_cooldown(1), Duration::hours(48));
        assert_eq!(per_target_cooldown(2), Duration::hours(96));
        assert_eq!(per_target_cooldown(3), Duration::hours(192));
    }
}

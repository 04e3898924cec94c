use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marriage_common::TenantId;

use crate::cooldown::{self, PROPOSAL_EXPIRY};
use crate::errors::{BuildError, TransitionError};
use crate::ids::{CharacterId, ProposalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
    Cancelled,
}

/// A directional offer from a proposer to a target.
///
/// Immutable: every transition produces a new value rather than mutating this one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub tenant_id: TenantId,
    pub proposer_id: CharacterId,
    pub target_id: CharacterId,
    pub status: ProposalStatus,
    pub proposed_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub rejection_count: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// Validates the structural invariants against an already-assembled value. Used both by
    /// `propose` (fresh construction) and by the store when hydrating a row, so a corrupted
    /// row is caught at the boundary rather than silently trusted.
    fn check_invariants(&self) -> Result<(), BuildError> {
        if self.proposer_id == self.target_id {
            return Err(BuildError::SelfProposal);
        }
        if self.proposer_id == 0 || self.target_id == 0 {
            return Err(BuildError::ZeroCharacterId);
        }
        if self.expires_at < self.proposed_at {
            return Err(BuildError::ExpiryBeforeProposal);
        }
        match self.status {
            ProposalStatus::Pending => {
                if self.responded_at.is_some() {
                    return Err(BuildError::PendingHasResponse);
                }
            }
            ProposalStatus::Accepted => {
                if self.responded_at.is_none() {
                    return Err(BuildError::InconsistentRejection);
                }
            }
            ProposalStatus::Rejected => {
                if self.responded_at.is_none() || self.cooldown_until.is_none() {
                    return Err(BuildError::InconsistentRejection);
                }
            }
            ProposalStatus::Expired | ProposalStatus::Cancelled => {
                if self.responded_at.is_some() {
                    return Err(BuildError::PendingHasResponse);
                }
            }
        }
        Ok(())
    }

    /// Creates a new Pending proposal. Eligibility (level, marriage state, cooldowns,
    /// concurrent-proposal check) is the Processor's responsibility; this constructor
    /// only enforces the structural invariants.
    pub fn propose(
        id: ProposalId,
        tenant_id: TenantId,
        proposer_id: CharacterId,
        target_id: CharacterId,
        now: DateTime<Utc>,
    ) -> Result<Self, BuildError> {
        let proposal = Self {
            id,
            tenant_id,
            proposer_id,
            target_id,
            status: ProposalStatus::Pending,
            proposed_at: now,
            responded_at: None,
            expires_at: now + PROPOSAL_EXPIRY,
            rejection_count: 0,
            cooldown_until: None,
            created_at: now,
            updated_at: now,
        };
        proposal.check_invariants()?;
        Ok(proposal)
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }

    fn require_pending(&self) -> Result<(), TransitionError> {
        if !self.is_pending() {
            return Err(TransitionError::ProposalNotPending);
        }
        Ok(())
    }

    pub fn accept(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.require_pending()?;
        let next = Self {
            status: ProposalStatus::Accepted,
            responded_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Rejects the proposal, incrementing `rejection_count` and setting a new
    /// `cooldown_until` using exponential back-off on the count *before* this rejection.
    pub fn reject(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.require_pending()?;
        let cooldown = cooldown::per_target_cooldown(self.rejection_count);
        let next = Self {
            status: ProposalStatus::Rejected,
            responded_at: Some(now),
            rejection_count: self.rejection_count + 1,
            cooldown_until: Some(now + cooldown),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn cancel(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.require_pending()?;
        let next = Self {
            status: ProposalStatus::Cancelled,
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn expire(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.require_pending()?;
        let next = Self {
            status: ProposalStatus::Expired,
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Whether, as of `now`, this rejected/expired proposal still places its proposer in a
    /// per-target cooldown against `target_id` (a `Propose` precondition).
    pub fn blocks_target(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ProposalStatus::Rejected => self.cooldown_until.is_some_and(|until| now < until),
            ProposalStatus::Expired => now < self.updated_at + cooldown::INITIAL_PER_TARGET_COOLDOWN,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tenant() -> TenantId {
        TenantId::new(Uuid::new_v4())
    }

    #[test]
    fn propose_rejects_self_proposal() {
        let now = Utc::now();
        let err = Proposal::propose(ProposalId(1), tenant(), 5, 5, now).unwrap_err();
        assert_eq!(err, BuildError::SelfProposal);
    }

    #[test]
    fn reject_then_accept_is_rejected() {
        let now = Utc::now();
        let proposal = Proposal::propose(ProposalId(1), tenant(), 1, 2, now).unwrap();
        let rejected = proposal.reject(now).unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);
        assert!(rejected.accept(now).is_err());
    }

    #[test]
    fn second_rejection_doubles_cooldown() {
        let now = Utc::now();
        let proposal = Proposal::propose(ProposalId(1), tenant(), 1, 2, now).unwrap();
        let first = proposal.reject(now).unwrap();
        assert_eq!(first.cooldown_until.unwrap() - now, chrono::Duration::hours(24));

        // simulate a later re-propose/reject cycle against the same target
        let second_round = Proposal {
            id: ProposalId(2),
            status: ProposalStatus::Pending,
            responded_at: None,
            rejection_count: first.rejection_count,
            ..first.clone()
        };
        let second = second_round.reject(now).unwrap();
        assert_eq!(second.cooldown_until.unwrap() - now, chrono::Duration::hours(48));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use marriage_common::TenantId;

use crate::cooldown::MAX_INVITEES;
use crate::errors::{BuildError, TransitionError};
use crate::ids::{CeremonyId, CharacterId, MarriageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CeremonyStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
    Postponed,
}

/// The scheduled wedding event linked to an Engaged marriage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ceremony {
    pub id: CeremonyId,
    pub tenant_id: TenantId,
    pub marriage_id: MarriageId,
    pub character_id_1: CharacterId,
    pub character_id_2: CharacterId,
    pub status: CeremonyStatus,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub postponed_at: Option<DateTime<Utc>>,
    pub invitees: Vec<CharacterId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_invitees(invitees: &[CharacterId], character_id_1: CharacterId, character_id_2: CharacterId) -> Result<(), BuildError> {
    if invitees.len() > MAX_INVITEES {
        return Err(BuildError::TooManyInvitees(invitees.len()));
    }
    let mut seen = HashSet::with_capacity(invitees.len());
    for &invitee in invitees {
        if invitee == character_id_1 || invitee == character_id_2 {
            return Err(BuildError::PartnerInvited);
        }
        if !seen.insert(invitee) {
            return Err(BuildError::DuplicateInvitee(invitee));
        }
    }
    Ok(())
}

impl Ceremony {
    fn check_invariants(&self) -> Result<(), BuildError> {
        validate_invitees(&self.invitees, self.character_id_1, self.character_id_2)?;
        match self.status {
            CeremonyStatus::Completed => {
                if self.started_at.is_none() || self.completed_at.is_none() {
                    return Err(BuildError::MissingCompletedAt);
                }
            }
            CeremonyStatus::Active => {
                if self.started_at.is_none() {
                    return Err(BuildError::MissingCompletedAt);
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn schedule(
        id: CeremonyId,
        tenant_id: TenantId,
        marriage_id: MarriageId,
        character_id_1: CharacterId,
        character_id_2: CharacterId,
        scheduled_at: DateTime<Utc>,
        invitees: Vec<CharacterId>,
        now: DateTime<Utc>,
    ) -> Result<Self, BuildError> {
        let ceremony = Self {
            id,
            tenant_id,
            marriage_id,
            character_id_1,
            character_id_2,
            status: CeremonyStatus::Scheduled,
            scheduled_at,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            postponed_at: None,
            invitees,
            created_at: now,
            updated_at: now,
        };
        ceremony.check_invariants()?;
        Ok(ceremony)
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(
            self.status,
            CeremonyStatus::Scheduled | CeremonyStatus::Active | CeremonyStatus::Postponed
        )
    }

    pub fn start(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != CeremonyStatus::Scheduled {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let next = Self {
            status: CeremonyStatus::Active,
            started_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn complete(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != CeremonyStatus::Active {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let next = Self {
            status: CeremonyStatus::Completed,
            completed_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn cancel(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if !self.is_non_terminal() {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let next = Self {
            status: CeremonyStatus::Cancelled,
            cancelled_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Moves an Active ceremony to Postponed, invoked by the ceremony timeout sweeper when a
    /// ceremony has sat Active past `DISCONNECTION_TIMEOUT`.
    pub fn postpone(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != CeremonyStatus::Active {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let next = Self {
            status: CeremonyStatus::Postponed,
            postponed_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Reschedules a Postponed ceremony back to Scheduled at a new time.
    pub fn reschedule(&self, scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != CeremonyStatus::Postponed {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let next = Self {
            status: CeremonyStatus::Scheduled,
            scheduled_at,
            started_at: None,
            postponed_at: None,
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn add_invitee(&self, character_id: CharacterId, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if !matches!(self.status, CeremonyStatus::Scheduled | CeremonyStatus::Postponed) {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let mut invitees = self.invitees.clone();
        invitees.push(character_id);
        let next = Self {
            invitees,
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn remove_invitee(&self, character_id: CharacterId, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if !matches!(self.status, CeremonyStatus::Scheduled | CeremonyStatus::Postponed) {
            return Err(TransitionError::InvalidCeremonyState);
        }
        let mut invitees = self.invitees.clone();
        let before = invitees.len();
        invitees.retain(|&id| id != character_id);
        if invitees.len() == before {
            return Err(TransitionError::from(BuildError::DuplicateInvitee(character_id)));
        }
        let next = Self {
            invitees,
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
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
    fn rejects_partner_as_invitee() {
        let now = Utc::now();
        let err = Ceremony::schedule(CeremonyId(1), tenant(), MarriageId(1), 1, 2, now, vec![2], now).unwrap_err();
        assert_eq!(err, BuildError::PartnerInvited);
    }

    #[test]
    fn rejects_too_many_invitees() {
        let now = Utc::now();
        let invitees: Vec<CharacterId> = (10..26).collect();
        let err = Ceremony::schedule(CeremonyId(1), tenant(), MarriageId(1), 1, 2, now, invitees, now).unwrap_err();
        assert_eq!(err, BuildError::TooManyInvitees(16));
    }

    #[test]
    fn start_then_complete() {
        let now = Utc::now();
        let ceremony = Ceremony::schedule(CeremonyId(1), tenant(), MarriageId(1), 1, 2, now, vec![], now).unwrap();
        let active = ceremony.start(now).unwrap();
        let completed = active.complete(now).unwrap();
        assert_eq!(completed.status, CeremonyStatus::Completed);
    }

    #[test]
    fn postpone_then_reschedule() {
        let now = Utc::now();
        let ceremony = Ceremony::schedule(CeremonyId(1), tenant(), MarriageId(1), 1, 2, now, vec![], now).unwrap();
        let active = ceremony.start(now).unwrap();
        let postponed = active.postpone(now).unwrap();
        let rescheduled = postponed.reschedule(now + chrono::Duration::hours(1), now).unwrap();
        assert_eq!(rescheduled.status, CeremonyStatus::Scheduled);
        assert!(rescheduled.started_at.is_none());
    }
}

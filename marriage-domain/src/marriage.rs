use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marriage_common::TenantId;

use crate::errors::{BuildError, TransitionError};
use crate::ids::{CharacterId, MarriageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarriageStatus {
    Proposed,
    Engaged,
    Married,
    Divorced,
    Expired,
}

/// The relationship between two characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marriage {
    pub id: MarriageId,
    pub tenant_id: TenantId,
    pub character_id_1: CharacterId,
    pub character_id_2: CharacterId,
    pub status: MarriageStatus,
    pub proposed_at: DateTime<Utc>,
    pub engaged_at: Option<DateTime<Utc>>,
    pub married_at: Option<DateTime<Utc>>,
    pub divorced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Marriage {
    fn check_invariants(&self) -> Result<(), BuildError> {
        if self.character_id_1 == self.character_id_2 {
            return Err(BuildError::SelfProposal);
        }
        if self.character_id_1 == 0 || self.character_id_2 == 0 {
            return Err(BuildError::ZeroCharacterId);
        }
        match self.status {
            MarriageStatus::Proposed => {
                if self.engaged_at.is_some() || self.married_at.is_some() || self.divorced_at.is_some() {
                    return Err(BuildError::MissingEngagedAt);
                }
            }
            MarriageStatus::Engaged => {
                if self.engaged_at.is_none() {
                    return Err(BuildError::MissingEngagedAt);
                }
                if self.married_at.is_some() || self.divorced_at.is_some() {
                    return Err(BuildError::MissingEngagedAt);
                }
            }
            MarriageStatus::Married => {
                if self.engaged_at.is_none() || self.married_at.is_none() {
                    return Err(BuildError::MissingMarriedAt);
                }
                if self.divorced_at.is_some() {
                    return Err(BuildError::MissingMarriedAt);
                }
            }
            MarriageStatus::Divorced => {
                if self.engaged_at.is_none() || self.married_at.is_none() || self.divorced_at.is_none() {
                    return Err(BuildError::MissingDivorcedAt);
                }
            }
            MarriageStatus::Expired => {
                if self.engaged_at.is_some() || self.married_at.is_some() || self.divorced_at.is_some() {
                    return Err(BuildError::MissingEngagedAt);
                }
            }
        }
        Ok(())
    }

    /// Creates a new marriage in the Proposed state, mirroring the acceptance of the backing
    /// proposal — called by the Processor in the same operation that accepts a Proposal.
    pub fn propose(
        id: MarriageId,
        tenant_id: TenantId,
        character_id_1: CharacterId,
        character_id_2: CharacterId,
        now: DateTime<Utc>,
    ) -> Result<Self, BuildError> {
        let marriage = Self {
            id,
            tenant_id,
            character_id_1,
            character_id_2,
            status: MarriageStatus::Proposed,
            proposed_at: now,
            engaged_at: None,
            married_at: None,
            divorced_at: None,
            created_at: now,
            updated_at: now,
        };
        marriage.check_invariants()?;
        Ok(marriage)
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self.status, MarriageStatus::Proposed | MarriageStatus::Engaged | MarriageStatus::Married)
    }

    pub fn partners(&self) -> (CharacterId, CharacterId) {
        (self.character_id_1, self.character_id_2)
    }

    pub fn involves(&self, character_id: CharacterId) -> bool {
        self.character_id_1 == character_id || self.character_id_2 == character_id
    }

    pub fn other_partner(&self, character_id: CharacterId) -> Option<CharacterId> {
        if self.character_id_1 == character_id {
            Some(self.character_id_2)
        } else if self.character_id_2 == character_id {
            Some(self.character_id_1)
        } else {
            None
        }
    }

    pub fn engage(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != MarriageStatus::Proposed {
            return Err(TransitionError::InvalidMarriageState);
        }
        let next = Self {
            status: MarriageStatus::Engaged,
            engaged_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Promotes an Engaged marriage to Married, invoked by the Processor when the linked
    /// ceremony completes.
    pub fn marry(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != MarriageStatus::Engaged {
            return Err(TransitionError::InvalidMarriageState);
        }
        let next = Self {
            status: MarriageStatus::Married,
            married_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    pub fn divorce(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != MarriageStatus::Married {
            return Err(TransitionError::InvalidMarriageState);
        }
        let next = Self {
            status: MarriageStatus::Divorced,
            divorced_at: Some(now),
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Forces a non-terminal marriage to Expired because its backing proposal expired
    /// before acceptance.
    pub fn expire(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != MarriageStatus::Proposed {
            return Err(TransitionError::InvalidMarriageState);
        }
        let next = Self {
            status: MarriageStatus::Expired,
            updated_at: now,
            ..self.clone()
        };
        next.check_invariants()?;
        Ok(next)
    }

    /// Forces any non-terminal marriage to a terminal state because one partner was
    /// deleted: Divorced if Married, otherwise Expired.
    pub fn force_terminal_on_deletion(&self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        match self.status {
            MarriageStatus::Married => self.divorce(now),
            MarriageStatus::Proposed | MarriageStatus::Engaged => {
                let next = Self {
                    status: MarriageStatus::Expired,
                    engaged_at: None,
                    updated_at: now,
                    ..self.clone()
                };
                next.check_invariants().map_err(TransitionError::from)?;
                Ok(next)
            }
            MarriageStatus::Divorced | MarriageStatus::Expired => Err(TransitionError::InvalidMarriageState),
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
    fn full_lifecycle() {
        let now = Utc::now();
        let marriage = Marriage::propose(MarriageId(1), tenant(), 1, 2, now).unwrap();
        let engaged = marriage.engage(now).unwrap();
        let married = engaged.marry(now).unwrap();
        let divorced = married.divorce(now).unwrap();
        assert_eq!(divorced.status, MarriageStatus::Divorced);
        assert!(divorced.divorce(now).is_err());
    }

    #[test]
    fn marry_requires_engaged() {
        let now = Utc::now();
        let marriage = Marriage::propose(MarriageId(1), tenant(), 1, 2, now).unwrap();
        assert!(marriage.marry(now).is_err());
    }
}

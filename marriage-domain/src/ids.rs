use serde::{Deserialize, Serialize};

/// Game-assigned character identifier (32-bit, non-zero for any real character).
pub type CharacterId = u32;

/// Monotonic proposal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(pub u32);

/// Monotonic marriage identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarriageId(pub u32);

/// Monotonic ceremony identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CeremonyId(pub u32);

macro_rules! impl_id_display {
    ($t:ty) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id_display!(ProposalId);
impl_id_display!(MarriageId);
impl_id_display!(CeremonyId);

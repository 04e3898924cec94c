pub mod ceremony;
pub mod cooldown;
pub mod errors;
pub mod ids;
pub mod marriage;
pub mod proposal;

pub use ceremony::{Ceremony, CeremonyStatus};
pub use errors::{BuildError, TransitionError};
pub use ids::{CeremonyId, CharacterId, MarriageId, ProposalId};
pub use marriage::{Marriage, MarriageStatus};
pub use proposal::{Proposal, ProposalStatus};

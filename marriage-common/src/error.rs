use thiserror::Error;

/// Error taxonomy shared by every layer of the service.
///
/// Domain and persistence crates define their own narrower error enums and convert into
/// this one at the boundary where a caller needs the cross-cutting HTTP/event mapping
/// (see `AppError::http_status` and the command consumer's `MARRIAGE_ERROR` synthesis).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("insufficient level")]
    InsufficientLevel,
    #[error("character is already married")]
    AlreadyMarried,
    #[error("character is already engaged")]
    AlreadyEngaged,
    #[error("proposer and target must be different characters")]
    SelfProposal,

    #[error("proposer is in global cooldown")]
    GlobalCooldown,
    #[error("proposer is in per-target cooldown")]
    TargetCooldown,

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("proposal not found")]
    ProposalNotFound,
    #[error("marriage not found")]
    MarriageNotFound,
    #[error("ceremony not found")]
    CeremonyNotFound,
    #[error("invitee not found")]
    InviteeNotFound,

    #[error("a pending proposal already exists between these characters")]
    ConcurrentProposal,
    #[error("character is already invited")]
    InviteeAlreadyInvited,
    #[error("ceremony invitee limit exceeded")]
    InviteeLimitExceeded,

    #[error("proposal has expired")]
    ProposalExpired,
    #[error("ceremony timed out")]
    CeremonyTimeout,

    #[error("character service error: {0}")]
    CharacterService(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("event emission error: {0}")]
    Emission(String),

    #[error("tenant mismatch")]
    TenantMismatch,
    #[error("missing tenant")]
    MissingTenant,

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, used as `errorCode` on `MARRIAGE_ERROR` events.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InsufficientLevel => "INSUFFICIENT_LEVEL",
            Self::AlreadyMarried => "ALREADY_MARRIED",
            Self::AlreadyEngaged => "ALREADY_ENGAGED",
            Self::SelfProposal => "SELF_PROPOSAL",
            Self::GlobalCooldown => "GLOBAL_COOLDOWN",
            Self::TargetCooldown => "TARGET_COOLDOWN",
            Self::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            Self::ProposalNotFound => "PROPOSAL_NOT_FOUND",
            Self::MarriageNotFound => "MARRIAGE_NOT_FOUND",
            Self::CeremonyNotFound => "CEREMONY_NOT_FOUND",
            Self::InviteeNotFound => "INVITEE_NOT_FOUND",
            Self::ConcurrentProposal => "CONCURRENT_PROPOSAL",
            Self::InviteeAlreadyInvited => "INVITEE_ALREADY_INVITED",
            Self::InviteeLimitExceeded => "INVITEE_LIMIT_EXCEEDED",
            Self::ProposalExpired => "PROPOSAL_EXPIRED",
            Self::CeremonyTimeout => "CEREMONY_TIMEOUT",
            Self::CharacterService(_) => "CHARACTER_SERVICE_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Emission(_) => "EMISSION_ERROR",
            Self::TenantMismatch => "TENANT_MISMATCH",
            Self::MissingTenant => "MISSING_TENANT",
            Self::Cancelled => "CANCELLED",
            Self::Other(_) => "INTERNAL",
        }
    }

    /// HTTP status mapping for the REST layer: NotFound → 404, Validation/MissingTenant →
    /// 400, everything else → 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ProposalNotFound | Self::MarriageNotFound | Self::CeremonyNotFound | Self::InviteeNotFound => 404,
            Self::Validation(_) | Self::MissingTenant | Self::SelfProposal => 400,
            _ => 500,
        }
    }

    /// The taxonomy category this error belongs to, used as `errorType` on `MARRIAGE_ERROR`
    /// events — distinct from `error_code`, which identifies the specific error.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::SelfProposal => "VALIDATION",
            Self::InsufficientLevel | Self::AlreadyMarried | Self::AlreadyEngaged => "ELIGIBILITY",
            Self::GlobalCooldown | Self::TargetCooldown => "COOLDOWN",
            Self::InvalidStateTransition(_) => "STATE",
            Self::ProposalNotFound | Self::MarriageNotFound | Self::CeremonyNotFound | Self::InviteeNotFound => "NOT_FOUND",
            Self::ConcurrentProposal | Self::InviteeAlreadyInvited | Self::InviteeLimitExceeded => "CONFLICT",
            Self::ProposalExpired | Self::CeremonyTimeout => "TEMPORAL",
            Self::CharacterService(_) | Self::Persistence(_) | Self::Emission(_) => "EXTERNAL",
            Self::TenantMismatch | Self::MissingTenant => "TENANT",
            Self::Cancelled | Self::Other(_) => "INTERNAL",
        }
    }
}

use thiserror::Error;

/// Raised by a builder when a constructed value would violate an invariant from the data
/// model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("proposer and target must differ")]
    SelfProposal,
    #[error("character ids must be non-zero")]
    ZeroCharacterId,
    #[error("tenant id is required")]
    MissingTenant,
    #[error("expiresAt must not precede proposedAt")]
    ExpiryBeforeProposal,
    #[error("rejected proposal requires respondedAt and cooldownUntil")]
    InconsistentRejection,
    #[error("pending proposal must not have respondedAt")]
    PendingHasResponse,
    #[error("engaged marriage requires engagedAt")]
    MissingEngagedAt,
    #[error("married marriage requires engagedAt and marriedAt")]
    MissingMarriedAt,
    #[error("divorced marriage requires engagedAt, marriedAt and divorcedAt")]
    MissingDivorcedAt,
    #[error("too many invitees: {0} exceeds the limit of 15")]
    TooManyInvitees(usize),
    #[error("duplicate invitee {0}")]
    DuplicateInvitee(u32),
    #[error("a marriage partner cannot be invited to their own ceremony")]
    PartnerInvited,
    #[error("completed ceremony requires startedAt and completedAt")]
    MissingCompletedAt,
}

/// Raised by a transition function when the current state cannot perform the requested
/// action (a `Can<Action>()` predicate).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("proposal is not pending")]
    ProposalNotPending,
    #[error("marriage is not in the expected state for this transition")]
    InvalidMarriageState,
    #[error("ceremony is not in the expected state for this transition")]
    InvalidCeremonyState,
    #[error(transparent)]
    Build(#[from] BuildError),
}

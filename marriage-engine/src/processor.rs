//! The Processor: the sole place domain rules are enforced. Each public method follows
//! the fixed recipe — extract tenant, load aggregates, evaluate preconditions, compute the
//! transition, persist, buffer events, flush, return.

use std::sync::{Arc, Mutex};

use marriage_bus::BusPublisher;
use marriage_common::{AppError, Clock, RequestScope};
use marriage_domain::cooldown::{GLOBAL_COOLDOWN, MIN_LEVEL};
use marriage_domain::{
    BuildError, Ceremony, CeremonyId, CharacterId, Marriage, MarriageId, Proposal, ProposalId, TransitionError,
};
use marriage_events::{provider, EventBuffer};
use marriage_store::{Store, StoreError};

use crate::character_service::CharacterService;
use crate::views::MarriageView;

fn map_store_err(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::Persistence("row not found".to_string()),
        other => AppError::Persistence(other.to_string()),
    }
}

fn map_build_err(err: BuildError) -> AppError {
    match err {
        BuildError::SelfProposal => AppError::SelfProposal,
        BuildError::TooManyInvitees(_) => AppError::InviteeLimitExceeded,
        BuildError::DuplicateInvitee(_) => AppError::InviteeAlreadyInvited,
        BuildError::PartnerInvited => AppError::Validation("a marriage partner cannot be invited to their own ceremony".to_string()),
        other => AppError::Validation(other.to_string()),
    }
}

fn map_transition_err(err: TransitionError) -> AppError {
    match err {
        TransitionError::ProposalNotPending => AppError::InvalidStateTransition("proposal is not pending".to_string()),
        TransitionError::InvalidMarriageState => AppError::InvalidStateTransition("marriage is not in the expected state".to_string()),
        TransitionError::InvalidCeremonyState => AppError::InvalidStateTransition("ceremony is not in the expected state".to_string()),
        TransitionError::Build(b) => map_build_err(b),
    }
}

fn check_cancel(scope: &RequestScope) -> Result<(), AppError> {
    if scope.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}

/// Orchestrates commands against the three aggregates, constructed once per process with
/// injected collaborators (store, bus, character service, clock).
pub struct MarriageProcessor {
    store: Arc<Mutex<Store>>,
    bus: Arc<dyn BusPublisher>,
    character_service: Arc<dyn CharacterService>,
    clock: Arc<dyn Clock>,
    event_topic: String,
}

impl MarriageProcessor {
    pub fn new(
        store: Arc<Mutex<Store>>,
        bus: Arc<dyn BusPublisher>,
        character_service: Arc<dyn CharacterService>,
        clock: Arc<dyn Clock>,
        event_topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bus,
            character_service,
            clock,
            event_topic: event_topic.into(),
        }
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    async fn flush(&self, buffer: EventBuffer) -> Result<(), AppError> {
        buffer.flush(self.bus.as_ref()).await.map_err(|e| AppError::Emission(e.to_string()))
    }

    // ---- Propose -----------------------------------------------------------------------

    pub async fn propose(&self, scope: &RequestScope, proposer_id: CharacterId, target_id: CharacterId) -> Result<Proposal, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;

        if proposer_id == target_id {
            return Err(AppError::SelfProposal);
        }

        let proposer = self.character_service.lookup(proposer_id).await?;
        let target = self.character_service.lookup(target_id).await?;
        if proposer.level < MIN_LEVEL || target.level < MIN_LEVEL {
            return Err(AppError::InsufficientLevel);
        }

        let now = self.clock.now();
        let proposal = {
            let store = self.store();
            if let Some(existing) = store.active_marriage_for_character(tenant_id, proposer_id).map_err(map_store_err)? {
                return Err(already_in_relationship(&existing));
            }
            if let Some(existing) = store.active_marriage_for_character(tenant_id, target_id).map_err(map_store_err)? {
                return Err(already_in_relationship(&existing));
            }
            if store.find_pending_between(tenant_id, proposer_id, target_id).map_err(map_store_err)?.is_some() {
                return Err(AppError::ConcurrentProposal);
            }
            if let Some(last) = store.last_proposal_by_proposer(tenant_id, proposer_id).map_err(map_store_err)? {
                if now - last.proposed_at < GLOBAL_COOLDOWN {
                    return Err(AppError::GlobalCooldown);
                }
            }
            if let Some(last) = store.last_proposal_to_target(tenant_id, proposer_id, target_id).map_err(map_store_err)? {
                if last.blocks_target(now) {
                    return Err(AppError::TargetCooldown);
                }
            }

            let proposal = Proposal::propose(ProposalId(0), tenant_id, proposer_id, target_id, now).map_err(map_build_err)?;
            store.create_proposal(&proposal).map_err(map_store_err)?
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::proposal_created(&self.event_topic, &proposal));
        self.flush(buffer).await?;

        tracing::info!(tenant_id = %tenant_id, proposal_id = proposal.id.0, proposer_id, target_id, "proposal created");
        Ok(proposal)
    }

    // ---- AcceptProposal ------------------------------------------------------------------

    /// Loads the proposal, accepts it, and creates the linked marriage directly in the
    /// Engaged state within the same operation. The Marriage row only exists from acceptance
    /// onward, so an unaccepted proposal's expiry never leaves behind an orphaned Marriage
    /// row to also terminate.
    pub async fn accept_proposal(&self, scope: &RequestScope, proposal_id: ProposalId) -> Result<Marriage, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let (accepted, marriage) = {
            let store = self.store();
            let proposal = store.get_proposal(proposal_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::ProposalNotFound)?;
            if now > proposal.expires_at {
                return Err(AppError::ProposalExpired);
            }
            let accepted = proposal.accept(now).map_err(map_transition_err)?;
            store.update_proposal(&accepted).map_err(map_store_err)?;

            let marriage = Marriage::propose(MarriageId(0), tenant_id, accepted.proposer_id, accepted.target_id, now)
                .map_err(map_build_err)?
                .engage(now)
                .map_err(map_transition_err)?;
            let marriage = store.create_marriage(&marriage).map_err(map_store_err)?;
            (accepted, marriage)
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::proposal_accepted(&self.event_topic, &accepted));
        buffer.push(provider::marriage_created(&self.event_topic, &marriage, "engaged"));
        self.flush(buffer).await?;

        tracing::info!(tenant_id = %tenant_id, marriage_id = marriage.id.0, "proposal accepted, marriage engaged");
        Ok(marriage)
    }

    // ---- DeclineProposal / CancelProposal / ExpireProposal -------------------------------

    pub async fn decline_proposal(&self, scope: &RequestScope, proposal_id: ProposalId) -> Result<Proposal, AppError> {
        self.terminate_proposal(scope, proposal_id, |p, now| p.reject(now), provider::proposal_declined).await
    }

    pub async fn cancel_proposal(&self, scope: &RequestScope, proposal_id: ProposalId) -> Result<Proposal, AppError> {
        self.terminate_proposal(scope, proposal_id, |p, now| p.cancel(now), provider::proposal_cancelled).await
    }

    pub async fn expire_proposal(&self, scope: &RequestScope, proposal_id: ProposalId) -> Result<Proposal, AppError> {
        self.terminate_proposal(scope, proposal_id, |p, now| p.expire(now), provider::proposal_expired).await
    }

    async fn terminate_proposal(
        &self,
        scope: &RequestScope,
        proposal_id: ProposalId,
        transition: impl FnOnce(&Proposal, chrono::DateTime<chrono::Utc>) -> Result<Proposal, TransitionError>,
        event: impl FnOnce(&str, &Proposal) -> marriage_bus::BusMessage,
    ) -> Result<Proposal, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let next = {
            let store = self.store();
            let proposal = store.get_proposal(proposal_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::ProposalNotFound)?;
            let next = transition(&proposal, now).map_err(map_transition_err)?;
            store.update_proposal(&next).map_err(map_store_err)?;
            next
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(event(&self.event_topic, &next));
        self.flush(buffer).await?;
        Ok(next)
    }

    // ---- Ceremony lifecycle ---------------------------------------------------------------

    pub async fn schedule_ceremony(
        &self,
        scope: &RequestScope,
        marriage_id: MarriageId,
        scheduled_at: chrono::DateTime<chrono::Utc>,
        invitees: Vec<CharacterId>,
    ) -> Result<Ceremony, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let ceremony = {
            let store = self.store();
            let marriage = store.get_marriage(marriage_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::MarriageNotFound)?;
            if marriage.status != marriage_domain::MarriageStatus::Engaged {
                return Err(AppError::InvalidStateTransition("marriage must be engaged to schedule a ceremony".to_string()));
            }
            if store.active_ceremony_for_marriage(tenant_id, marriage_id).map_err(map_store_err)?.is_some() {
                return Err(AppError::InvalidStateTransition("a non-terminal ceremony already exists for this marriage".to_string()));
            }
            let ceremony = Ceremony::schedule(
                CeremonyId(0),
                tenant_id,
                marriage_id,
                marriage.character_id_1,
                marriage.character_id_2,
                scheduled_at,
                invitees,
                now,
            )
            .map_err(map_build_err)?;
            store.create_ceremony(&ceremony).map_err(map_store_err)?
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::ceremony_scheduled(&self.event_topic, &ceremony));
        self.flush(buffer).await?;
        Ok(ceremony)
    }

    pub async fn start_ceremony(&self, scope: &RequestScope, ceremony_id: CeremonyId) -> Result<Ceremony, AppError> {
        self.transition_ceremony(scope, ceremony_id, |c, now| c.start(now), provider::ceremony_started).await
    }

    pub async fn cancel_ceremony(&self, scope: &RequestScope, ceremony_id: CeremonyId) -> Result<Ceremony, AppError> {
        self.transition_ceremony(scope, ceremony_id, |c, now| c.cancel(now), |topic, c| provider::ceremony_cancelled(topic, c, "CANCELLED")).await
    }

    pub async fn postpone_ceremony(&self, scope: &RequestScope, ceremony_id: CeremonyId) -> Result<Ceremony, AppError> {
        self.transition_ceremony(scope, ceremony_id, |c, now| c.postpone(now), |topic, c| provider::ceremony_postponed(topic, c, "ceremony_postponed")).await
    }

    pub async fn reschedule_ceremony(
        &self,
        scope: &RequestScope,
        ceremony_id: CeremonyId,
        scheduled_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Ceremony, AppError> {
        self.transition_ceremony(scope, ceremony_id, move |c, now| c.reschedule(scheduled_at, now), provider::ceremony_rescheduled).await
    }

    async fn transition_ceremony(
        &self,
        scope: &RequestScope,
        ceremony_id: CeremonyId,
        transition: impl FnOnce(&Ceremony, chrono::DateTime<chrono::Utc>) -> Result<Ceremony, TransitionError>,
        event: impl FnOnce(&str, &Ceremony) -> marriage_bus::BusMessage,
    ) -> Result<Ceremony, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let next = {
            let store = self.store();
            let ceremony = store.get_ceremony(ceremony_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::CeremonyNotFound)?;
            let next = transition(&ceremony, now).map_err(map_transition_err)?;
            store.update_ceremony(&next).map_err(map_store_err)?;
            next
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(event(&self.event_topic, &next));
        self.flush(buffer).await?;
        Ok(next)
    }

    /// Completing a ceremony additionally promotes its marriage to Married in the same
    /// operation; both `CEREMONY_COMPLETED` and `MARRIAGE_CREATED` (body `status: "married"`)
    /// are buffered and flushed in that order.
    pub async fn complete_ceremony(&self, scope: &RequestScope, ceremony_id: CeremonyId) -> Result<Ceremony, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let (ceremony, marriage) = {
            let store = self.store();
            let ceremony = store.get_ceremony(ceremony_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::CeremonyNotFound)?;
            let ceremony = ceremony.complete(now).map_err(map_transition_err)?;
            store.update_ceremony(&ceremony).map_err(map_store_err)?;

            let marriage = store.get_marriage(ceremony.marriage_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::MarriageNotFound)?;
            let marriage = marriage.marry(now).map_err(map_transition_err)?;
            store.update_marriage(&marriage).map_err(map_store_err)?;
            (ceremony, marriage)
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::ceremony_completed(&self.event_topic, &ceremony));
        buffer.push(provider::marriage_created(&self.event_topic, &marriage, "married"));
        self.flush(buffer).await?;

        tracing::info!(tenant_id = %tenant_id, marriage_id = marriage.id.0, ceremony_id = ceremony.id.0, "ceremony completed, marriage married");
        Ok(ceremony)
    }

    // ---- Invitees ---------------------------------------------------------------------------

    pub async fn add_invitee(&self, scope: &RequestScope, ceremony_id: CeremonyId, character_id: CharacterId) -> Result<Ceremony, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let ceremony = {
            let store = self.store();
            let ceremony = store.get_ceremony(ceremony_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::CeremonyNotFound)?;
            let next = ceremony.add_invitee(character_id, now).map_err(map_transition_err)?;
            store.update_ceremony(&next).map_err(map_store_err)?;
            next
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::invitee_added(&self.event_topic, &ceremony, character_id));
        self.flush(buffer).await?;
        Ok(ceremony)
    }

    pub async fn remove_invitee(&self, scope: &RequestScope, ceremony_id: CeremonyId, character_id: CharacterId) -> Result<Ceremony, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let ceremony = {
            let store = self.store();
            let ceremony = store.get_ceremony(ceremony_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::CeremonyNotFound)?;
            let next = ceremony.remove_invitee(character_id, now).map_err(|e| match e {
                // `remove_invitee` reuses `DuplicateInvitee` as its "not present" sentinel.
                TransitionError::Build(BuildError::DuplicateInvitee(_)) => AppError::InviteeNotFound,
                other => map_transition_err(other),
            })?;
            store.update_ceremony(&next).map_err(map_store_err)?;
            next
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::invitee_removed(&self.event_topic, &ceremony, character_id));
        self.flush(buffer).await?;
        Ok(ceremony)
    }

    // ---- Divorce ------------------------------------------------------------------------------

    pub async fn divorce(&self, scope: &RequestScope, marriage_id: MarriageId, initiator_id: CharacterId) -> Result<Marriage, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let marriage = {
            let store = self.store();
            let marriage = store.get_marriage(marriage_id, tenant_id).map_err(map_store_err)?.ok_or(AppError::MarriageNotFound)?;
            if !marriage.involves(initiator_id) {
                return Err(AppError::Validation("divorce must be initiated by a marriage partner".to_string()));
            }
            let next = marriage.divorce(now).map_err(map_transition_err)?;
            store.update_marriage(&next).map_err(map_store_err)?;
            next
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        buffer.push(provider::marriage_divorced(&self.event_topic, &marriage, initiator_id));
        self.flush(buffer).await?;

        tracing::info!(tenant_id = %tenant_id, marriage_id = marriage.id.0, initiator_id, "marriage divorced");
        Ok(marriage)
    }

    // ---- Character deletion cascade -----------------------------------------------------------

    /// Forces every non-terminal marriage, proposal, and ceremony involving `character_id` to a
    /// terminal state. Invoked by the character-deletion consumer; never retried by the
    /// Processor itself.
    pub async fn handle_character_deletion(&self, scope: &RequestScope, character_id: CharacterId) -> Result<(), AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let now = self.clock.now();

        let (terminated_marriages, cancelled_ceremonies, cancelled_proposals) = {
            let store = self.store();
            let mut terminated_marriages = Vec::new();
            let mut cancelled_ceremonies = Vec::new();
            for marriage in store.non_terminal_marriages_for_character(tenant_id, character_id).map_err(map_store_err)? {
                for ceremony in store.non_terminal_ceremonies_for_marriage(tenant_id, marriage.id).map_err(map_store_err)? {
                    let cancelled = ceremony.cancel(now).map_err(map_transition_err)?;
                    store.update_ceremony(&cancelled).map_err(map_store_err)?;
                    cancelled_ceremonies.push(cancelled);
                }
                let next = marriage.force_terminal_on_deletion(now).map_err(map_transition_err)?;
                store.update_marriage(&next).map_err(map_store_err)?;
                terminated_marriages.push(next);
            }

            let mut cancelled_proposals = Vec::new();
            for proposal in store.non_terminal_proposals_for_character(tenant_id, character_id).map_err(map_store_err)? {
                let cancelled = proposal.cancel(now).map_err(map_transition_err)?;
                store.update_proposal(&cancelled).map_err(map_store_err)?;
                cancelled_proposals.push(cancelled);
            }

            (terminated_marriages, cancelled_ceremonies, cancelled_proposals)
        };

        check_cancel(scope)?;
        let mut buffer = EventBuffer::new();
        for ceremony in &cancelled_ceremonies {
            buffer.push(provider::ceremony_cancelled(&self.event_topic, ceremony, "CHARACTER_DELETED"));
        }
        for marriage in &terminated_marriages {
            buffer.push(provider::marriage_deleted(&self.event_topic, marriage, character_id, "CHARACTER_DELETED"));
        }
        for proposal in &cancelled_proposals {
            buffer.push(provider::proposal_cancelled(&self.event_topic, proposal));
        }
        self.flush(buffer).await?;

        tracing::info!(tenant_id = %tenant_id, character_id, marriages = terminated_marriages.len(), "character deletion cascade applied");
        Ok(())
    }

    // ---- Read paths ---------------------------------------------------------------------------

    pub async fn current_marriage(&self, scope: &RequestScope, character_id: CharacterId) -> Result<Option<MarriageView>, AppError> {
        check_cancel(scope)?;
        let tenant_id = scope.tenant_id;
        let store = self.store();
        let Some(marriage) = store.active_marriage_for_character(tenant_id, character_id).map_err(map_store_err)? else {
            return Ok(None);
        };
        let ceremony = store.active_ceremony_for_marriage(tenant_id, marriage.id).map_err(map_store_err)?;
        Ok(Some(MarriageView { marriage, ceremony }))
    }

    pub async fn marriage_history(&self, scope: &RequestScope, character_id: CharacterId) -> Result<Vec<Marriage>, AppError> {
        check_cancel(scope)?;
        let store = self.store();
        store.marriage_history_for_character(scope.tenant_id, character_id).map_err(map_store_err)
    }

    pub async fn pending_proposals(&self, scope: &RequestScope, character_id: CharacterId) -> Result<Vec<Proposal>, AppError> {
        check_cancel(scope)?;
        let store = self.store();
        store.pending_proposals_for_character(scope.tenant_id, character_id).map_err(map_store_err)
    }
}

fn already_in_relationship(marriage: &Marriage) -> AppError {
    if marriage.status == marriage_domain::MarriageStatus::Married {
        AppError::AlreadyMarried
    } else {
        AppError::AlreadyEngaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character_service::testing::FakeCharacterService;
    use marriage_bus::InMemoryBus;
    use marriage_common::{FixedClock, TenantId};
    use uuid::Uuid;

    fn scope() -> RequestScope {
        RequestScope::new(TenantId::new(Uuid::new_v4()))
    }

    fn processor(clock: Arc<FixedClock>, characters: FakeCharacterService) -> MarriageProcessor {
        MarriageProcessor::new(
            Arc::new(Mutex::new(Store::open_memory().unwrap())),
            Arc::new(InMemoryBus::new()),
            Arc::new(characters),
            clock,
            "marriage.status",
        )
    }

    fn eligible_characters() -> FakeCharacterService {
        FakeCharacterService::new().with_character(1, 20).with_character(2, 20)
    }

    #[tokio::test]
    async fn happy_path_engagement_and_ceremony() {
        let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
        let proc = processor(clock.clone(), eligible_characters());
        let scope = scope();

        let proposal = proc.propose(&scope, 1, 2).await.unwrap();
        let marriage = proc.accept_proposal(&scope, proposal.id).await.unwrap();
        assert_eq!(marriage.status, marriage_domain::MarriageStatus::Engaged);

        let ceremony = proc
            .schedule_ceremony(&scope, marriage.id, clock.now() + chrono::Duration::days(1), vec![3, 4])
            .await
            .unwrap();
        proc.start_ceremony(&scope, ceremony.id).await.unwrap();
        let completed = proc.complete_ceremony(&scope, ceremony.id).await.unwrap();
        assert_eq!(completed.status, marriage_domain::CeremonyStatus::Completed);

        let view = proc.current_marriage(&scope, 1).await.unwrap().unwrap();
        assert_eq!(view.marriage.status, marriage_domain::MarriageStatus::Married);
    }

    #[tokio::test]
    async fn underage_proposal_is_rejected() {
        let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
        let characters = FakeCharacterService::new().with_character(1, 20).with_character(2, 5);
        let proc = processor(clock, characters);

        let err = proc.propose(&scope(), 1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientLevel));
    }

    #[tokio::test]
    async fn rejection_imposes_per_target_cooldown() {
        let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
        let proc = processor(clock.clone(), eligible_characters());
        let scope = scope();

        let proposal = proc.propose(&scope, 1, 2).await.unwrap();
        proc.decline_proposal(&scope, proposal.id).await.unwrap();

        // Clear the 4h global cooldown so it doesn't mask the per-target one under test.
        clock.advance(chrono::Duration::hours(5));

        let err = proc.propose(&scope, 1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::TargetCooldown));
    }

    #[tokio::test]
    async fn stalled_ceremony_is_postponed_on_timeout() {
        let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
        let proc = processor(clock.clone(), eligible_characters());
        let scope = scope();

        let proposal = proc.propose(&scope, 1, 2).await.unwrap();
        let marriage = proc.accept_proposal(&scope, proposal.id).await.unwrap();
        let ceremony = proc.schedule_ceremony(&scope, marriage.id, clock.now(), vec![]).await.unwrap();
        proc.start_ceremony(&scope, ceremony.id).await.unwrap();

        clock.advance(chrono::Duration::minutes(6));
        let postponed = proc.postpone_ceremony(&scope, ceremony.id).await.unwrap();
        assert_eq!(postponed.status, marriage_domain::CeremonyStatus::Postponed);
    }

    #[tokio::test]
    async fn character_deletion_cascades_to_marriage_and_ceremony() {
        let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
        let proc = processor(clock.clone(), eligible_characters());
        let scope = scope();

        let proposal = proc.propose(&scope, 1, 2).await.unwrap();
        let marriage = proc.accept_proposal(&scope, proposal.id).await.unwrap();
        proc.schedule_ceremony(&scope, marriage.id, clock.now(), vec![]).await.unwrap();

        proc.handle_character_deletion(&scope, 1).await.unwrap();

        let view = proc.current_marriage(&scope, 2).await.unwrap();
        assert!(view.is_none());
    }

    #[tokio::test]
    async fn sixteenth_invitee_exceeds_limit() {
        let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
        let proc = processor(clock.clone(), eligible_characters());
        let scope = scope();

        let proposal = proc.propose(&scope, 1, 2).await.unwrap();
        let marriage = proc.accept_proposal(&scope, proposal.id).await.unwrap();
        let invitees: Vec<CharacterId> = (100..115).collect();
        assert_eq!(invitees.len(), 15);
        let ceremony = proc.schedule_ceremony(&scope, marriage.id, clock.now(), invitees).await.unwrap();

        let err = proc.add_invitee(&scope, ceremony.id, 200).await.unwrap_err();
        assert!(matches!(err, AppError::InviteeLimitExceeded));
    }
}

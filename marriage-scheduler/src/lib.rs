//! Time-driven sweepers: two interval loops that scan the store for aggregates whose
//! deadline has passed and drive them through the Processor, exactly as the command consumer
//! drives externally-triggered transitions. Each is a `tokio::spawn` + `tokio::time::interval`
//! loop calling a store-scan method and warn-logging failures, with a `CancellationToken` for
//! graceful shutdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use marriage_common::{Clock, RequestScope};
use marriage_domain::cooldown::DISCONNECTION_TIMEOUT;
use marriage_engine::MarriageProcessor;
use marriage_store::Store;

/// Scans `expired_pending_proposals` on every tick and expires each one found, regardless of
/// tenant: the sweep itself is not tenant-filtered, since each hit carries its own tenant id.
pub async fn run_proposal_expiry_sweeper(store: Arc<Mutex<Store>>, processor: Arc<MarriageProcessor>, clock: Arc<dyn Clock>, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("proposal-expiry sweeper shutting down");
                return;
            }
            _ = interval.tick() => {}
        }

        let expired = {
            let store = store.lock().unwrap();
            store.expired_pending_proposals(clock.now())
        };
        let expired = match expired {
            Ok(proposals) => proposals,
            Err(e) => {
                tracing::warn!(error = %e, "proposal-expiry sweep failed to scan the store");
                continue;
            }
        };

        for proposal in expired {
            let scope = RequestScope::with_cancel(proposal.tenant_id, cancel.clone());
            if let Err(e) = processor.expire_proposal(&scope, proposal.id).await {
                tracing::warn!(proposal_id = proposal.id.0, tenant_id = %proposal.tenant_id, error = %e, "failed to expire proposal");
            }
        }
    }
}

/// Scans `stale_active_ceremonies` (cutoff = now - DISCONNECTION_TIMEOUT) on every tick and
/// postpones each one found.
pub async fn run_ceremony_timeout_sweeper(store: Arc<Mutex<Store>>, processor: Arc<MarriageProcessor>, clock: Arc<dyn Clock>, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("ceremony-timeout sweeper shutting down");
                return;
            }
            _ = interval.tick() => {}
        }

        let cutoff = clock.now() - DISCONNECTION_TIMEOUT;
        let stale = {
            let store = store.lock().unwrap();
            store.stale_active_ceremonies(cutoff)
        };
        let stale = match stale {
            Ok(ceremonies) => ceremonies,
            Err(e) => {
                tracing::warn!(error = %e, "ceremony-timeout sweep failed to scan the store");
                continue;
            }
        };

        for ceremony in stale {
            let scope = RequestScope::with_cancel(ceremony.tenant_id, cancel.clone());
            if let Err(e) = processor.postpone_ceremony(&scope, ceremony.id).await {
                tracing::warn!(ceremony_id = ceremony.id.0, tenant_id = %ceremony.tenant_id, error = %e, "failed to postpone stale ceremony");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use marriage_bus::InMemoryBus;
    use marriage_common::{Clock, FixedClock, TenantId};
    use marriage_engine::character_service::testing::FakeCharacterService;
    use marriage_store::Store;
    use std::sync::Arc;
    use uuid::Uuid;

    fn processor_with(store: Arc<Mutex<Store>>, clock: Arc<dyn Clock>) -> Arc<MarriageProcessor> {
        let bus = Arc::new(InMemoryBus::new());
        let characters = Arc::new(FakeCharacterService::new().with_character(1, 50).with_character(2, 50));
        Arc::new(MarriageProcessor::new(store, bus, characters, clock, "marriage.status"))
    }

    #[tokio::test]
    async fn proposal_expiry_sweeper_expires_past_deadline_proposals() {
        let store = Arc::new(Mutex::new(Store::open_memory().unwrap()));
        let tenant_id = TenantId::new(Uuid::new_v4());
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let processor = processor_with(store.clone(), clock.clone());

        let scope = RequestScope::new(tenant_id);
        processor.propose(&scope, 1, 2).await.unwrap();

        clock.set(now + marriage_domain::cooldown::PROPOSAL_EXPIRY + chrono::Duration::seconds(1));

        let cancel = CancellationToken::new();
        let sweep_cancel = cancel.clone();
        let handle = tokio::spawn(run_proposal_expiry_sweeper(store.clone(), processor.clone(), clock.clone(), 1, sweep_cancel));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        cancel.cancel();
        handle.await.unwrap();

        let history = processor.marriage_history(&scope, 1).await.unwrap();
        assert!(history.is_empty());
        let pending = processor.pending_proposals(&scope, 1).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn ceremony_timeout_sweeper_postpones_stale_active_ceremonies() {
        let store = Arc::new(Mutex::new(Store::open_memory().unwrap()));
        let tenant_id = TenantId::new(Uuid::new_v4());
        let now = Utc::now();
        let clock = Arc::new(FixedClock::new(now));
        let processor = processor_with(store.clone(), clock.clone());

        let scope = RequestScope::new(tenant_id);
        let proposal = processor.propose(&scope, 1, 2).await.unwrap();
        let marriage = processor.accept_proposal(&scope, proposal.id).await.unwrap();
        let ceremony = processor
            .schedule_ceremony(&scope, marriage.id, now, vec![])
            .await
            .unwrap();
        processor.start_ceremony(&scope, ceremony.id).await.unwrap();

        clock.set(now + DISCONNECTION_TIMEOUT + chrono::Duration::seconds(1));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ceremony_timeout_sweeper(store.clone(), processor.clone(), clock.clone(), 1, cancel.clone()));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        cancel.cancel();
        handle.await.unwrap();

        let refreshed = processor.current_marriage(&scope, 1).await.unwrap().unwrap();
        let ceremony = refreshed.ceremony.unwrap();
        assert_eq!(ceremony.status, marriage_domain::CeremonyStatus::Postponed);
    }
}

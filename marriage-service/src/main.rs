mod supervisor;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use marriage_bus::InMemoryBus;
use marriage_common::{Clock, EnvConfig};
use marriage_engine::{CharacterService, HttpCharacterService, MarriageProcessor};
use marriage_store::Store;

use supervisor::{spawn_supervised, ServicePriority};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvConfig::load(None);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| env.log_level.parse().unwrap()),
        )
        .init();

    info!("marriage-service starting...");
    info!(database_path = %env.database_path.display(), rest_port = env.rest_port, "configuration loaded");

    let store = Arc::new(Mutex::new(Store::open(&env.database_path)?));
    let bus = Arc::new(InMemoryBus::new());
    let character_service: Arc<dyn CharacterService> = Arc::new(HttpCharacterService::new(env.character_service_base_url.clone()));
    let clock: Arc<dyn Clock> = Arc::new(marriage_common::SystemClock);

    let processor = Arc::new(MarriageProcessor::new(
        store.clone(),
        bus.clone(),
        character_service,
        clock.clone(),
        env.event_topic_marriage_status.clone(),
    ));

    let cancel = CancellationToken::new();

    // Command consumer (Critical): the sole path through which external commands mutate state.
    {
        let bus = bus.clone();
        let processor = processor.clone();
        let command_topic = env.command_topic_marriage.clone();
        let event_topic = env.event_topic_marriage_status.clone();
        let cancel = cancel.clone();
        spawn_supervised("command-consumer", ServicePriority::Critical, move || {
            let bus = bus.clone();
            let processor = processor.clone();
            let command_topic = command_topic.clone();
            let event_topic = event_topic.clone();
            let cancel = cancel.clone();
            async move { marriage_consumer::run_command_consumer(bus, command_topic, event_topic, processor, cancel).await }
        });
    }

    // Character-deletion consumer (Important): tombstones aggregates on upstream DELETED events.
    {
        let bus = bus.clone();
        let processor = processor.clone();
        let character_status_topic = env.event_topic_character_status.clone();
        let cancel = cancel.clone();
        spawn_supervised("character-deletion-consumer", ServicePriority::Important, move || {
            let bus = bus.clone();
            let processor = processor.clone();
            let character_status_topic = character_status_topic.clone();
            let cancel = cancel.clone();
            async move { marriage_consumer::run_character_deletion_consumer(bus, character_status_topic, processor, cancel).await }
        });
    }

    // Proposal-expiry sweeper (Important).
    {
        let store = store.clone();
        let processor = processor.clone();
        let clock = clock.clone();
        let interval_secs = env.proposal_expiry_sweep_interval_secs;
        let cancel = cancel.clone();
        spawn_supervised("proposal-expiry-sweeper", ServicePriority::Important, move || {
            let store = store.clone();
            let processor = processor.clone();
            let clock = clock.clone();
            let cancel = cancel.clone();
            async move {
                marriage_scheduler::run_proposal_expiry_sweeper(store, processor, clock, interval_secs, cancel).await;
                Ok(())
            }
        });
    }

    // Ceremony-timeout sweeper (Important).
    {
        let store = store.clone();
        let processor = processor.clone();
        let clock = clock.clone();
        let interval_secs = env.ceremony_timeout_sweep_interval_secs;
        let cancel = cancel.clone();
        spawn_supervised("ceremony-timeout-sweeper", ServicePriority::Important, move || {
            let store = store.clone();
            let processor = processor.clone();
            let clock = clock.clone();
            let cancel = cancel.clone();
            async move {
                marriage_scheduler::run_ceremony_timeout_sweeper(store, processor, clock, interval_secs, cancel).await;
                Ok(())
            }
        });
    }

    // Management/read API (Important).
    {
        let api_state = marriage_api::state::ApiState {
            processor: processor.clone(),
            env: Arc::new(env.clone()),
        };
        let router = marriage_api::build_router(api_state);
        let port = env.rest_port;
        spawn_supervised("api", ServicePriority::Important, move || {
            let router = router.clone();
            async move {
                let addr: SocketAddr = format!("[::]:{port}").parse()?;
                let listener = tokio::net::TcpListener::bind(addr).await?;
                info!("REST API listening on {}", addr);
                axum::serve(listener, router).await?;
                Ok(())
            }
        });
    }

    // SIGINT/SIGTERM trigger graceful shutdown: the cancellation token propagates into every
    // consumer/scheduler loop above, each of which exits cleanly (`Ok(())`) on the next check.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_shutdown_signals(cancel).await {
                error!("signal handler error: {}", e);
            }
        });
    }

    info!("marriage-service started successfully");

    tokio::signal::ctrl_c().await?;
    info!("shutting down...");
    cancel.cancel();

    // Give in-flight loops a moment to observe cancellation before the process exits.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    Ok(())
}

async fn watch_shutdown_signals(cancel: CancellationToken) -> anyhow::Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT])?;

    while let Some(signal) = signals.next().await {
        match signal {
            SIGTERM | SIGINT => {
                warn!("received shutdown signal {signal}, cancelling workers");
                cancel.cancel();
                return Ok(());
            }
            other => {
                warn!("ignoring unexpected signal {other}");
            }
        }
    }

    Ok(())
}

//! bgpmibd daemon entry point.
//!
//! Wires the collector loop (BIRD control channel, timer-driven) and the
//! poll path (MIB mapper behind the responder boundary) around one shared
//! snapshot cache, and handles signals and shutdown ordering.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use birdctl::BirdcClient;

use bgpmibd::mib::bgp4_root;
use bgpmibd::{
    AgentConfig, AgentError, AgentResult, BirdSource, Collector, MibMapper, MibResponder,
    SnapshotCache, WalkResponder,
};

/// Bound on waiting for the collector to exit after cancellation.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize tracing/logging.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

/// Runs the daemon until a termination signal arrives.
async fn run_daemon(config: AgentConfig) -> AgentResult<()> {
    // Single shared mutable resource: the snapshot reference. The collector
    // is its sole writer; the mapper only ever reads.
    let cache = Arc::new(SnapshotCache::default());

    let client = BirdcClient::new(
        &config.birdc_path,
        config.bird_socket.clone(),
        config.command_timeout,
    );
    let source = BirdSource::new(client, config.local_as_default);

    let shutdown = CancellationToken::new();
    let collector = Collector::new(source, Arc::clone(&cache), config.refresh_interval);
    let collector_task = tokio::spawn(collector.run(shutdown.clone()));

    let mapper = MibMapper::new(Arc::clone(&cache));
    let mut responder = WalkResponder::new();
    info!(endpoint = %config.agentx_socket, "Registering BGP4-MIB subtree");
    responder.register(&bgp4_root()).await?;

    // Push the current MIB view on the poll cadence. The mapper reads only
    // the cache, so this path never waits on BIRD.
    let mut poll = tokio::time::interval(config.refresh_interval);
    let signal = shutdown_signal();
    tokio::pin!(signal);
    loop {
        tokio::select! {
            _ = &mut signal => {
                info!("Termination signal received");
                break;
            }
            _ = poll.tick() => {
                responder.publish(&mapper.poll()).await?;
            }
        }
    }

    shutdown.cancel();
    let joined = tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, collector_task).await;
    responder.close().await?;

    match joined {
        Ok(_) => Ok(()),
        Err(_) => Err(AgentError::ForcedShutdown(format!(
            "collector did not stop within {}s",
            SHUTDOWN_JOIN_TIMEOUT.as_secs()
        ))),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    info!("--- Starting bgpmibd ---");

    let config = AgentConfig::from_env();
    info!(
        birdc = %config.birdc_path.display(),
        refresh_secs = config.refresh_interval.as_secs(),
        local_as_default = config.local_as_default,
        "Configuration loaded"
    );

    match run_daemon(config).await {
        Ok(()) => {
            info!("bgpmibd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("bgpmibd error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Selective Forwarding Bridge daemon (sfbd)
//!
//! Hosts the conference registry and lifecycle manager. The signalling
//! transport connects from elsewhere and delivers requests into the
//! bridge; this binary wires up the control plane and drives shutdown
//! from process signals.

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{info, warn};

use sfb_bridge::conference::BridgeConferenceFactory;
use sfb_bridge::load::{LastNReducer, ZeroPacketRateProvider};
use sfb_bridge::pool::{self, HeapBufferPool};
use sfb_bridge::shutdown::ShutdownService;
use sfb_bridge::stats::{QueueStatsRegistry, COLIBRI_QUEUE};
use sfb_bridge::videobridge::AlwaysHealthy;
use sfb_bridge::{BridgeConfig, Videobridge, VideobridgeDeps};
use sfb_core::{SystemClock, TimeRandIdGen};

/// Service that unblocks the main loop when graceful shutdown completes.
struct DaemonShutdownService {
    done: Arc<Notify>,
}

impl ShutdownService for DaemonShutdownService {
    fn begin_shutdown(&self) {
        info!("graceful shutdown complete");
        self.done.notify_one();
    }

    fn force_exit(&self) {
        warn!("force shutdown, exiting");
        std::process::exit(0);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("sfbd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: sfbd [--version]");
                std::process::exit(1);
            }
        }
    }

    setup_logging();

    let config = BridgeConfig::load();

    // Buffer-pool hooks must be in place before the bridge starts so the
    // media plane never sees a half-installed allocator.
    pool::install(Arc::new(HeapBufferPool));

    let done = Arc::new(Notify::new());
    let clock: Arc<dyn sfb_core::Clock> = Arc::new(SystemClock);
    let queue_stats = Arc::new(QueueStatsRegistry::new());
    let factory = Arc::new(BridgeConferenceFactory::new(
        Arc::clone(&clock),
        config.conference_expire_after,
        config.conference_queue_capacity,
        config.default_last_n,
        queue_stats.register(COLIBRI_QUEUE),
    ));
    let bridge = Videobridge::new(
        config,
        VideobridgeDeps {
            id_gen: Arc::new(TimeRandIdGen::new(Arc::clone(&clock))),
            clock,
            factory,
            shutdown_service: Arc::new(DaemonShutdownService {
                done: Arc::clone(&done),
            }),
            packet_rate: Arc::new(ZeroPacketRateProvider),
            reducer: Arc::new(LastNReducer::default()),
            health: Arc::new(AlwaysHealthy),
            queue_stats,
        },
    );

    bridge.start();
    info!("sfbd ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                if bridge.shutdown_in_progress() {
                    info!("second SIGTERM, forcing shutdown");
                    bridge.shutdown(false);
                } else {
                    info!("SIGTERM received, starting graceful shutdown");
                    bridge.shutdown(true);
                }
            }
            _ = sigint.recv() => {
                if bridge.shutdown_in_progress() {
                    info!("second SIGINT, forcing shutdown");
                    bridge.shutdown(false);
                } else {
                    info!("SIGINT received, starting graceful shutdown");
                    bridge.shutdown(true);
                }
            }
            _ = done.notified() => {
                break;
            }
        }
    }

    bridge.stop();
    info!("sfbd stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Log to a file when SFB_LOG_FILE is set, otherwise to stderr.
    if let Ok(path) = std::env::var("SFB_LOG_FILE") {
        let path = std::path::PathBuf::from(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let file = path.file_name().unwrap_or_else(|| "sfbd.log".as_ref());
        let appender = tracing_appender::rolling::never(dir, file);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        // Keep the guard alive for the process lifetime.
        Box::leak(Box::new(guard));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(non_blocking))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

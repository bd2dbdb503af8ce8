//! Task orchestration: three ingest/tick tasks plus the negotiation
//! controller on the caller's task, all tied to one cancellation token.

use std::future::pending;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tokio::time::Interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::{
    BATCH_CAPACITY, DEFAULT_BATCH_TARGET, INGEST_RECV_BUFFER, RESPONSE_BUFFER,
    RESPONSE_POLL_INTERVAL,
};
use crate::error::Result;
use crate::heartbeat::run_heartbeat;
use crate::negotiation::{BatchTarget, Negotiator, Outcome};
use crate::network::{create_ingest_socket, open_output_socket};
use crate::processor::PacketProcessor;
use crate::quality::QualityTracker;
use crate::report::Reporter;
use crate::stats::RelayStats;
use crate::types::{Options, ShutdownReason, StationIdentity};

/// A relay with all sockets open, ready to run
pub struct Relay {
    report_secs: u64,
    identity: Arc<StationIdentity>,
    output: Arc<UdpSocket>,
    ts_socket: UdpSocket,
    telemetry_socket: UdpSocket,
    quality: Arc<QualityTracker>,
    target: Arc<BatchTarget>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
}

impl Relay {
    /// Resolve the server and bind both ingest ports.
    /// Any failure here is fatal for the process.
    pub async fn bind(opts: Options) -> Result<Self> {
        info!(
            ts_port = opts.ts_port,
            telemetry_port = opts.telemetry_port,
            host = %opts.host,
            port = opts.port,
            family = %opts.family,
            callsign = %opts.identity.callsign_str(),
            key_len = opts.identity.key_len(),
            "starting TS relay"
        );

        let output = open_output_socket(&opts.host, opts.port, opts.family).await?;
        let ts_socket = create_ingest_socket(opts.ts_port)?;
        let telemetry_socket = create_ingest_socket(opts.telemetry_port)?;

        Ok(Self {
            report_secs: opts.report_secs,
            identity: Arc::new(opts.identity),
            output: Arc::new(output),
            ts_socket,
            telemetry_socket,
            quality: Arc::new(QualityTracker::new()),
            target: Arc::new(BatchTarget::new(DEFAULT_BATCH_TARGET, BATCH_CAPACITY)),
            stats: Arc::new(RelayStats::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn ts_addr(&self) -> Result<SocketAddr> {
        Ok(self.ts_socket.local_addr()?)
    }

    pub fn telemetry_addr(&self) -> Result<SocketAddr> {
        Ok(self.telemetry_socket.local_addr()?)
    }

    /// Cancelling this token stops every loop
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> Arc<RelayStats> {
        self.stats.clone()
    }

    pub fn batch_target(&self) -> Arc<BatchTarget> {
        self.target.clone()
    }

    /// Run until authentication is rejected, Ctrl-C, or the shutdown token fires.
    /// The output socket is released when this returns.
    pub async fn run(self) -> Result<ShutdownReason> {
        let Relay {
            report_secs,
            identity,
            output,
            ts_socket,
            telemetry_socket,
            quality,
            target,
            stats,
            shutdown,
        } = self;

        let processor = PacketProcessor::new(
            identity.clone(),
            quality.clone(),
            target.clone(),
            stats.clone(),
        );

        let mut tasks = JoinSet::new();
        tasks.spawn(ts_ingest_loop(
            ts_socket,
            processor,
            output.clone(),
            stats.clone(),
            shutdown.clone(),
        ));
        tasks.spawn(telemetry_loop(
            telemetry_socket,
            quality.clone(),
            stats.clone(),
            shutdown.clone(),
        ));
        tasks.spawn(run_heartbeat(
            output.clone(),
            identity.clone(),
            stats.clone(),
            shutdown.clone(),
        ));

        let controller = Controller {
            negotiator: Negotiator::new(target.clone(), stats.clone(), shutdown.clone()),
            output,
            identity,
            quality,
            target,
            stats,
            shutdown: shutdown.clone(),
        };
        let reason = controller.run(report_secs).await;

        shutdown.cancel();
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                warn!("relay task ended abnormally: {e}");
            }
        }
        info!(?reason, "relay stopped");
        Ok(reason)
    }
}

async fn ts_ingest_loop(
    socket: UdpSocket,
    mut processor: PacketProcessor,
    output: Arc<UdpSocket>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; INGEST_RECV_BUFFER];
    loop {
        let n = tokio::select! {
            _ = shutdown.cancelled() => break,
            res = socket.recv(&mut buf) => match res {
                Ok(n) => n,
                Err(e) => {
                    debug!("TS recv failed: {e}");
                    continue;
                }
            },
        };

        let result = processor.process_datagram(&buf[..n], |payload| {
            // nothing leaves once shutdown is raised
            if shutdown.is_cancelled() {
                return;
            }
            match output.try_send(payload) {
                Ok(sent) => stats.record_batch(sent),
                Err(e) => {
                    stats.send_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("data send failed: {e}");
                }
            }
        });
        if let Err(e) = result {
            warn!("TS ingest: {e}");
        }
    }
    debug!("TS ingest loop stopped");
}

async fn telemetry_loop(
    socket: UdpSocket,
    quality: Arc<QualityTracker>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; INGEST_RECV_BUFFER];
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            res = socket.recv(&mut buf) => match res {
                Ok(n) => {
                    if quality.ingest(&buf[..n]) {
                        stats.telemetry_samples.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(e) => debug!("telemetry recv failed: {e}"),
            },
        }
    }
    debug!("telemetry loop stopped");
}

/// Negotiation controller plus periodic reporting
struct Controller {
    negotiator: Negotiator,
    output: Arc<UdpSocket>,
    identity: Arc<StationIdentity>,
    quality: Arc<QualityTracker>,
    target: Arc<BatchTarget>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
}

impl Controller {
    async fn run(mut self, report_secs: u64) -> ShutdownReason {
        let mut buf = vec![0u8; RESPONSE_BUFFER];
        let mut report = (report_secs > 0).then(|| {
            let period = Duration::from_secs(report_secs);
            tokio::time::interval_at(tokio::time::Instant::now() + period, period)
        });
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut signals = true;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return ShutdownReason::Interrupted,
                res = &mut ctrl_c, if signals => match res {
                    Ok(()) => {
                        info!("interrupted, shutting down");
                        return ShutdownReason::Interrupted;
                    }
                    Err(e) => {
                        warn!("Ctrl-C handler unavailable: {e}");
                        signals = false;
                    }
                },
                res = self.output.recv(&mut buf) => match res {
                    Ok(n) => {
                        if self.negotiator.handle(&buf[..n]) == Outcome::Rejected {
                            return ShutdownReason::AuthenticationRejected;
                        }
                    }
                    Err(e) => {
                        // typically ICMP port unreachable surfacing on the connected socket
                        debug!("response recv failed: {e}");
                        tokio::time::sleep(RESPONSE_POLL_INTERVAL).await;
                    }
                },
                _ = next_tick(&mut report) => self.print_report(),
            }
        }
    }

    fn print_report(&self) {
        let report = Reporter::create_report(
            &self.stats,
            self.identity.callsign_str(),
            self.target.get(),
            self.quality.current(),
        );
        println!("{}", Reporter::to_json(&report));
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(i) => {
            i.tick().await;
        }
        None => pending::<()>().await,
    }
}

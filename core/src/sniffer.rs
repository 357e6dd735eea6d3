//! # Capture Loop
//!
//! A dedicated reader thread pulls packets from a [`PacketSource`] and hands
//! them over a bounded channel to the async side, which runs one
//! classification task per packet.
//!
//! Two limits keep the loop from running away under a flood:
//! - the channel holds at most `queue_size` packets; when it is full the
//!   reader either waits or drops the packet, see [`Admission`];
//! - at most `max_in_flight` tasks run at once.
//!
//! On shutdown the reader is stopped first, then running tasks get
//! `grace_period` to finish before they are aborted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use badcapt_common::config::{DEFAULT_GRACE_PERIOD, DEFAULT_MAX_IN_FLIGHT, DEFAULT_QUEUE_SIZE};
use badcapt_common::error::CaptureError;
use badcapt_common::packet::Packet;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use crate::capture::PacketSource;
use crate::dispatcher::{Dispatcher, Outcome};
use crate::pipeline::Pipeline;

const READ_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// What the reader does with a packet when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Admission {
    /// Stop reading until the dispatcher catches up.
    #[default]
    Block,
    /// Throw the packet away and count it.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchLimits {
    pub max_in_flight: usize,
    pub queue_size: usize,
    pub admission: Admission,
    pub grace_period: Duration,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            queue_size: DEFAULT_QUEUE_SIZE,
            admission: Admission::Block,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub received: u64,
    pub dispatched: u64,
    pub dropped: u64,
    pub read_errors: u64,
    pub exported: u64,
    pub discarded: u64,
    pub suppressed: u64,
    pub unclassifiable: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    dispatched: AtomicU64,
    dropped: AtomicU64,
    read_errors: AtomicU64,
    exported: AtomicU64,
    discarded: AtomicU64,
    suppressed: AtomicU64,
    unclassifiable: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            exported: self.exported.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            unclassifiable: self.unclassifiable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct Sniffer {
    dispatcher: Dispatcher,
    limits: DispatchLimits,
}

impl Sniffer {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let limits: DispatchLimits = pipeline.limits().clone();
        Self {
            dispatcher: Dispatcher::new(pipeline),
            limits,
        }
    }

    /// Reads `source` until it is exhausted or `shutdown` completes.
    ///
    /// Per-packet failures are logged and counted; only failing to start the
    /// reader is an error.
    pub async fn run<S, F>(&self, source: S, shutdown: F) -> Result<CaptureStats, CaptureError>
    where
        S: PacketSource + 'static,
        F: Future<Output = ()>,
    {
        let counters: Arc<Counters> = Arc::new(Counters::default());
        let stop: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<Packet>(self.limits.queue_size);

        let reader: JoinHandle<()> = {
            let counters: Arc<Counters> = counters.clone();
            let stop: Arc<AtomicBool> = stop.clone();
            let admission: Admission = self.limits.admission;
            std::thread::Builder::new()
                .name("badcapt-reader".to_string())
                .spawn(move || read_packets(source, tx, admission, &stop, &counters))
                .map_err(CaptureError::Reader)?
        };

        let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(self.limits.max_in_flight));
        let mut tasks: JoinSet<()> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping capture");
                    break;
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    reap(result, &counters);
                }
                received = rx.recv() => {
                    let Some(packet) = received else {
                        debug!("Capture source exhausted");
                        break;
                    };
                    let permit: OwnedSemaphorePermit = tokio::select! {
                        permit = semaphore.clone().acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break,
                        },
                        _ = &mut shutdown => {
                            info!("Shutdown requested, stopping capture");
                            break;
                        }
                    };

                    Counters::bump(&counters.dispatched);
                    let dispatcher: Dispatcher = self.dispatcher.clone();
                    let counters: Arc<Counters> = counters.clone();
                    tasks.spawn(async move {
                        let _permit: OwnedSemaphorePermit = permit;
                        classify(&dispatcher, packet, &counters).await;
                    });
                }
            }
        }

        stop.store(true, Ordering::Relaxed);
        drop(rx);
        self.drain(&mut tasks, &counters).await;

        let grace: Duration = self.limits.grace_period;
        match timeout(grace, tokio::task::spawn_blocking(move || reader.join())).await {
            Ok(Ok(Ok(()))) => {}
            Ok(_) => error!("Capture reader terminated abnormally"),
            Err(_) => warn!("Capture reader did not stop within {grace:?}, detaching it"),
        }

        Ok(counters.snapshot())
    }

    async fn drain(&self, tasks: &mut JoinSet<()>, counters: &Counters) {
        let grace: Duration = self.limits.grace_period;
        let drained = timeout(grace, async {
            while let Some(result) = tasks.join_next().await {
                reap(result, counters);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "{} classification task(s) still running after {grace:?}, aborting",
                tasks.len()
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
    }
}

fn read_packets<S: PacketSource>(
    mut source: S,
    tx: mpsc::Sender<Packet>,
    admission: Admission,
    stop: &AtomicBool,
    counters: &Counters,
) {
    while !stop.load(Ordering::Relaxed) {
        let packet: Packet = match source.next_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break,
            Err(CaptureError::Timeout) => continue,
            Err(e) if e.is_transient() => {
                Counters::bump(&counters.read_errors);
                warn!("{e}, skipping");
                std::thread::sleep(READ_ERROR_BACKOFF);
                continue;
            }
            Err(e) => {
                error!("Capture source failed: {e}");
                break;
            }
        };
        Counters::bump(&counters.received);

        match admission {
            Admission::Block => {
                if tx.blocking_send(packet).is_err() {
                    break;
                }
            }
            Admission::Drop => match tx.try_send(packet) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => Counters::bump(&counters.dropped),
                Err(TrySendError::Closed(_)) => break,
            },
        }
    }
    source.close();
}

async fn classify(dispatcher: &Dispatcher, packet: Packet, counters: &Counters) {
    match dispatcher.handle(packet).await {
        Ok(Outcome::Exported) => Counters::bump(&counters.exported),
        Ok(Outcome::Discarded) => Counters::bump(&counters.discarded),
        Ok(Outcome::Suppressed) => Counters::bump(&counters.suppressed),
        Ok(Outcome::Unclassifiable) => {
            trace!("Tagged packet could not be turned into a record");
            Counters::bump(&counters.unclassifiable);
        }
        Err(e) => {
            error!("Failed to export record: {e}");
            Counters::bump(&counters.failed);
        }
    }
}

fn reap(result: Result<(), JoinError>, counters: &Counters) {
    if let Err(e) = result
        && e.is_panic()
    {
        error!("Classification task panicked: {e}");
        Counters::bump(&counters.failed);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

//! Poll supervisor — drives the cycle forever, isolating failures.
//!
//! Each iteration runs one cycle, then sleeps: the poll interval after a
//! success, the shorter backoff interval after a recoverable cycle error.
//! The shutdown signal is checked at the top of every iteration and raced
//! against both sleeps, so a Ctrl-C during a wait is honored promptly.
//! An in-flight collaborator call is not interrupted — cancellation is
//! cooperative.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cycle::Cycle;
use crate::error::Result;

/// Runs cycles on a fixed interval until shut down.
pub struct PollSupervisor {
    cycle: Arc<dyn Cycle>,
    poll_interval: Duration,
    backoff_interval: Duration,
}

impl PollSupervisor {
    pub fn new(cycle: Arc<dyn Cycle>, poll_interval: Duration, backoff_interval: Duration) -> Self {
        Self {
            cycle,
            poll_interval,
            backoff_interval,
        }
    }

    /// Run until `shutdown` flips to true.
    ///
    /// Returns `Err` only for an error classified non-recoverable — no such
    /// error exists in current scope, so in practice this ends only on
    /// shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            poll_secs = self.poll_interval.as_secs(),
            backoff_secs = self.backoff_interval.as_secs(),
            "Poll supervisor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.cycle.run_cycle().await {
                Ok(drafted) => {
                    info!(drafted, "Cycle complete");
                    self.poll_interval
                }
                Err(e) if e.is_recoverable() => {
                    error!(
                        error = %e,
                        backoff_secs = self.backoff_interval.as_secs(),
                        "Cycle failed, backing off"
                    );
                    self.backoff_interval
                }
                Err(e) => {
                    error!(error = %e, "Cycle failed with non-recoverable error");
                    return Err(e);
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => {}
            }
        }

        info!("Poll supervisor stopped");
        Ok(())
    }
}

/// Spawn the supervisor as a background task. Send `true` on the returned
/// channel to stop it.
pub fn spawn_supervisor(
    supervisor: PollSupervisor,
) -> (JoinHandle<Result<()>>, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { supervisor.run(rx).await });
    (handle, tx)
}

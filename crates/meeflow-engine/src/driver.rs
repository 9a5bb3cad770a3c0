//! Async driver for a [`Sequencer`].
//!
//! [`spawn_simulation`] moves a sequencer into a tokio task. The task turns the
//! sequencer's pending timer into a real deadline, applies control requests in
//! arrival order and publishes a [`SimulationSnapshot`] after every change.

use crate::sequencer::{
    Operation, Sequencer, SequencerError, SimulationEvent, SimulationSnapshot, Tick, TimerToken,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

#[derive(Debug)]
struct ControlRequest {
    operation: Operation,
    reply: Option<oneshot::Sender<Result<(), SequencerError>>>,
}

/// Handle for controlling and observing a running simulation.
///
/// Dropping the handle stops the simulation task.
#[derive(Debug)]
pub struct SimulationHandle {
    control_tx: mpsc::UnboundedSender<ControlRequest>,
    snapshot_rx: watch::Receiver<SimulationSnapshot>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Start playback.
    pub async fn start(&self) -> Result<(), ControlError> {
        self.control(Operation::Start).await
    }

    /// Pause playback.
    pub async fn pause(&self) -> Result<(), ControlError> {
        self.control(Operation::Pause).await
    }

    /// Resume playback.
    pub async fn resume(&self) -> Result<(), ControlError> {
        self.control(Operation::Resume).await
    }

    /// Reset to idle.
    pub async fn reset(&self) -> Result<(), ControlError> {
        self.control(Operation::Reset).await
    }

    /// Apply an operation and wait for the outcome.
    ///
    /// The snapshot reflecting the operation is published before this returns.
    pub async fn control(&self, operation: Operation) -> Result<(), ControlError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control_tx
            .send(ControlRequest {
                operation,
                reply: Some(reply_tx),
            })
            .map_err(|_| ControlError::Closed)?;
        reply_rx
            .await
            .map_err(|_| ControlError::Closed)?
            .map_err(ControlError::Rejected)
    }

    /// Request an operation without waiting (non-blocking version).
    ///
    /// Rejections are reported as [`SimulationEvent::Rejected`].
    /// Returns true if the request was queued.
    pub fn request(&self, operation: Operation) -> bool {
        self.control_tx
            .send(ControlRequest {
                operation,
                reply: None,
            })
            .is_ok()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SimulationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Latest snapshot, if one was published since the last call.
    pub fn take_update(&mut self) -> Option<SimulationSnapshot> {
        if self.snapshot_rx.has_changed().unwrap_or(false) {
            Some(self.snapshot_rx.borrow_and_update().clone())
        } else {
            None
        }
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> Result<(), ControlError> {
        self.snapshot_rx
            .changed()
            .await
            .map_err(|_| ControlError::Closed)
    }

    /// Wait until a snapshot satisfies `condition`.
    ///
    /// Returns the snapshot when the condition is met, or `None` on timeout or
    /// if the simulation task has stopped.
    pub async fn wait_for<F>(
        &mut self,
        condition: F,
        timeout: Duration,
    ) -> Option<SimulationSnapshot>
    where
        F: Fn(&SimulationSnapshot) -> bool,
    {
        let deadline = Instant::now() + timeout;

        loop {
            {
                let snapshot = self.snapshot_rx.borrow_and_update();
                if condition(&snapshot) {
                    return Some(snapshot.clone());
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match tokio::time::timeout(remaining, self.snapshot_rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) | Err(_) => return None,
            }
        }
    }

    /// Stop the simulation task and wait for it to exit.
    pub async fn shutdown(self) {
        drop(self.control_tx);
        let _ = self.task.await;
    }
}

/// Spawn the simulation task.
///
/// Events are sent on `event_tx` in the order the sequencer produced them.
/// Send failures are ignored: a dropped receiver does not stop playback.
pub fn spawn_simulation(
    sequencer: Sequencer,
    event_tx: mpsc::UnboundedSender<SimulationEvent>,
) -> SimulationHandle {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(sequencer.snapshot());

    let task = tokio::spawn(async move {
        run_simulation(sequencer, control_rx, snapshot_tx, event_tx).await;
    });

    SimulationHandle {
        control_tx,
        snapshot_rx,
        task,
    }
}

async fn run_simulation(
    mut sequencer: Sequencer,
    mut control_rx: mpsc::UnboundedReceiver<ControlRequest>,
    snapshot_tx: watch::Sender<SimulationSnapshot>,
    event_tx: mpsc::UnboundedSender<SimulationEvent>,
) {
    let mut deadline: Option<(TimerToken, Instant)> = None;

    loop {
        // A new token means a new timer; an unchanged token keeps its deadline.
        deadline = match (sequencer.pending_timer(), deadline) {
            (Some(timer), Some((token, at))) if token == timer.token => Some((token, at)),
            (Some(timer), _) => Some((timer.token, Instant::now() + timer.delay)),
            (None, _) => None,
        };

        let elapsed = async move {
            match deadline {
                Some((token, at)) => {
                    sleep_until(at).await;
                    token
                }
                None => std::future::pending().await,
            }
        };

        let reply = tokio::select! {
            request = control_rx.recv() => {
                let Some(request) = request else {
                    debug!("control channel closed, stopping simulation");
                    break;
                };
                let result = sequencer.apply(request.operation);
                if let Err(e) = &result {
                    let _ = event_tx.send(SimulationEvent::Rejected(e.clone()));
                }
                request.reply.map(|reply| (reply, result))
            }
            token = elapsed => {
                if sequencer.fire(token) == Tick::Stale {
                    continue;
                }
                None
            }
        };

        for event in sequencer.drain_events() {
            let _ = event_tx.send(event);
        }
        snapshot_tx.send_replace(sequencer.snapshot());

        if let Some((reply, result)) = reply {
            let _ = reply.send(result);
        }
    }
}

/// Errors returned by [`SimulationHandle`] controls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The sequencer rejected the operation.
    #[error(transparent)]
    Rejected(#[from] SequencerError),

    /// The simulation task is no longer running.
    #[error("simulation is not running")]
    Closed,
}

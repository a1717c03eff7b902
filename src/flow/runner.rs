//! Scheduling of game instances.
//!
//! Each running game occupies one tokio task plus a bounded input queue.
//! The task drains and fully processes one action at a time - there is no
//! interleaving of two in-flight actions against the same model - and many
//! independent instances run concurrently on the shared worker pool with no
//! shared mutable state.
//!
//! Stopping a handle aborts the task immediately: actions still sitting in
//! the queue are discarded and listeners observe no partial effect.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actions::action::Actionable;
use crate::registry::RunningGame;

use super::engine::GamePhase;
use super::step::{FlowStep, GameListener};

/// Error submitting an action to a running instance.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("game instance is no longer accepting input")]
pub struct InstanceStopped;

/// Handle to a spawned game instance.
///
/// Dropping the handle does not stop the game; call [`GameHandle::stop`].
pub struct GameHandle {
    input: mpsc::Sender<Actionable>,
    steps: mpsc::UnboundedReceiver<FlowStep>,
    join: JoinHandle<()>,
}

impl GameHandle {
    /// Enqueue one action. Suspends while the bounded queue is full.
    pub async fn submit(&self, action: Actionable) -> Result<(), InstanceStopped> {
        self.input.send(action).await.map_err(|_| InstanceStopped)
    }

    /// Receive the next emitted event, in emission order.
    ///
    /// Returns `None` once the instance has finished and all events are
    /// drained.
    pub async fn next_step(&mut self) -> Option<FlowStep> {
        self.steps.recv().await
    }

    /// Tear down the instance immediately, discarding queued actions.
    pub fn stop(self) {
        self.join.abort();
    }

    /// Wait for the instance to finish on its own.
    pub async fn finished(self) {
        // An aborted or panicked task is already torn down; nothing to do.
        let _ = self.join.await;
    }
}

/// Forwards emitted events into an unbounded channel, preserving order.
struct ChannelListener(mpsc::UnboundedSender<FlowStep>);

impl GameListener for ChannelListener {
    fn on_step(&mut self, step: &FlowStep) {
        // The receiver may have been dropped; the instance plays on.
        let _ = self.0.send(step.clone());
    }
}

/// Spawn a game instance onto the runtime.
///
/// `queue_capacity` bounds the number of submitted-but-unprocessed actions.
/// The returned handle is the only way to feed the instance.
pub fn spawn(mut game: Box<dyn RunningGame>, queue_capacity: usize) -> GameHandle {
    let (input, mut submissions) = mpsc::channel::<Actionable>(queue_capacity);
    let (events, steps) = mpsc::unbounded_channel();
    game.add_listener(Box::new(ChannelListener(events)));

    let join = tokio::spawn(async move {
        let mut phase = match game.start() {
            Ok(phase) => phase,
            Err(error) => {
                log::warn!("game '{}' failed to start: {}", game.game_type(), error);
                return;
            }
        };
        while phase == GamePhase::AwaitingInput {
            let Some(action) = submissions.recv().await else {
                log::debug!("game '{}' input closed, stopping", game.game_type());
                return;
            };
            phase = match game.perform(&action) {
                Ok(phase) => phase,
                Err(error) => {
                    log::warn!("game '{}' failed: {}", game.game_type(), error);
                    return;
                }
            };
        }
        log::debug!("game '{}' task finished", game.game_type());
    });

    GameHandle { input, steps, join }
}

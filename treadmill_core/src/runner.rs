//! Event loop that drives a `WorkoutSessionEngine`.
//!
//! Timer ticks and user commands arrive on one channel and are applied in
//! arrival order on the runner's thread, so no two mutations ever overlap.

use crate::engine::{EndOutcome, WorkoutSessionEngine};
use crate::{Error, Result, SessionSnapshot};
use std::sync::mpsc::Receiver;

/// User-issued command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Skip,
    End,
}

/// Everything the runner reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    Tick { generation: u64 },
    Command(Command),
}

impl From<Command> for DriverEvent {
    fn from(command: Command) -> Self {
        DriverEvent::Command(command)
    }
}

pub struct SessionRunner {
    engine: WorkoutSessionEngine,
    events: Receiver<DriverEvent>,
}

impl SessionRunner {
    pub fn new(engine: WorkoutSessionEngine, events: Receiver<DriverEvent>) -> Self {
        Self { engine, events }
    }

    pub fn engine(&self) -> &WorkoutSessionEngine {
        &self.engine
    }

    /// Start `workout_id` and process events until the session ends.
    ///
    /// `observer` receives a snapshot after start and after every event that
    /// changed the session. The session ends on natural completion, on
    /// `Command::End`, or when every sender has hung up. A `ThreadHeartbeat`
    /// keeps its own sender alive while the engine holds it, so with one the
    /// hang-up case never fires and only completion or `End` stop the loop.
    pub fn run<F>(&mut self, workout_id: &str, mut observer: F) -> Result<EndOutcome>
    where
        F: FnMut(&SessionSnapshot),
    {
        self.engine.start(workout_id)?;
        observer(&self.engine.snapshot());

        loop {
            let event = match self.events.recv() {
                Ok(event) => event,
                Err(_) => {
                    tracing::info!("Event channel closed, ending session");
                    return self.finish(false);
                }
            };

            let changed = match event {
                DriverEvent::Tick { generation } => self.engine.on_timer(generation),
                DriverEvent::Command(Command::Pause) => self.engine.pause(),
                DriverEvent::Command(Command::Resume) => self.engine.resume(),
                DriverEvent::Command(Command::Skip) => self.engine.skip(),
                DriverEvent::Command(Command::End) => return self.finish(false),
            };

            if changed {
                observer(&self.engine.snapshot());
            }

            if self.engine.is_completed() {
                return self.finish(true);
            }
        }
    }

    fn finish(&mut self, mark_completed: bool) -> Result<EndOutcome> {
        self.engine
            .end(mark_completed)
            .ok_or_else(|| Error::Other("session ended before it started".into()))
    }
}

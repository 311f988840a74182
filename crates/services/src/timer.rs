//! Per-question countdown driven by a tokio task.
//!
//! Events carry the session id and position they were started for, so a
//! late `Expired` from a previous question or session can be told apart and
//! dropped by [`QuizService::expire`](crate::QuizService::expire).

use std::time::Duration;

use log::debug;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use quiz_core::countdown::{Countdown, CountdownTick};
use quiz_core::model::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick {
        session_id: SessionId,
        position: usize,
        remaining: u32,
        /// At or under the urgent threshold the timer was started with.
        urgent: bool,
    },
    Expired {
        session_id: SessionId,
        position: usize,
    },
}

/// Handle to a running countdown. Dropping it stops the countdown.
#[derive(Debug, Default)]
pub struct QuestionTimer {
    handle: Option<JoinHandle<()>>,
}

impl QuestionTimer {
    /// Spawn a countdown of `seconds` that reports into `events`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        session_id: SessionId,
        position: usize,
        seconds: u32,
        urgent_threshold_secs: u32,
        events: UnboundedSender<TimerEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut countdown = Countdown::new(seconds);
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let event = match countdown.tick() {
                    CountdownTick::Running { remaining } => TimerEvent::Tick {
                        session_id,
                        position,
                        remaining,
                        urgent: countdown.is_urgent(urgent_threshold_secs),
                    },
                    CountdownTick::Expired => TimerEvent::Expired {
                        session_id,
                        position,
                    },
                };
                let expired = matches!(event, TimerEvent::Expired { .. });
                if events.send(event).is_err() || expired {
                    break;
                }
            }
            debug!("timer for position {position} stopped");
        });
        Self {
            handle: Some(handle),
        }
    }

    /// A timer that never fires.
    #[must_use]
    pub fn disabled() -> Self {
        Self { handle: None }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

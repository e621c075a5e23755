//! Background auto-refresh of room streams
//!
//! Each room owns at most one timer task. The task sleeps until the deadline
//! published on a `watch` channel and then refreshes the room; re-arming only
//! replaces the deadline, it never spawns a second task. The task holds a
//! `Weak` reference and exits once the room or the timer is dropped.

use super::RoomResolver;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct RefreshTimer {
    interval: Duration,
    deadline: Option<watch::Sender<Option<Instant>>>,
}

enum Wake {
    Deadline,
    Rearmed,
    Closed,
}

impl RefreshTimer {
    /// A timer that never fires
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
            deadline: None,
        }
    }

    /// Spawns the timer task for `target`
    ///
    /// A zero interval, or a call outside a tokio runtime, yields a disabled timer.
    pub fn start(interval: Duration, target: Weak<dyn RoomResolver>) -> Self {
        if interval.is_zero() {
            return Self::disabled();
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, auto refresh disabled");
            return Self::disabled();
        };

        let (tx, rx) = watch::channel(None);
        handle.spawn(run(target, rx));

        Self {
            interval,
            deadline: Some(tx),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedules the next refresh, replacing any pending one
    ///
    /// After a failed extraction the room is retried after half the interval.
    pub fn arm(&self, failover: bool) -> Option<Instant> {
        let tx = self.deadline.as_ref()?;
        let delay = if failover {
            self.interval / 2
        } else {
            self.interval
        };
        let at = Instant::now() + delay;
        tx.send_replace(Some(at));
        Some(at)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline.as_ref().and_then(|tx| *tx.borrow())
    }
}

async fn run(target: Weak<dyn RoomResolver>, mut rx: watch::Receiver<Option<Instant>>) {
    loop {
        let deadline = *rx.borrow_and_update();

        let wake = match deadline {
            None => match rx.changed().await {
                Ok(()) => Wake::Rearmed,
                Err(_) => Wake::Closed,
            },
            Some(at) => tokio::select! {
                _ = tokio::time::sleep_until(at) => Wake::Deadline,
                changed = rx.changed() => match changed {
                    Ok(()) => Wake::Rearmed,
                    Err(_) => Wake::Closed,
                },
            },
        };

        match wake {
            Wake::Rearmed => continue,
            Wake::Closed => break,
            Wake::Deadline => {
                let Some(room) = target.upgrade() else {
                    break;
                };
                debug!(provider = %room.provider(), room = room.room(), "Auto refreshing room");
                room.refresh().await;
                drop(room);

                // The refresh re-arms the deadline; otherwise wait for the next arm.
                match rx.has_changed() {
                    Ok(true) => {}
                    Ok(false) => {
                        if rx.changed().await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

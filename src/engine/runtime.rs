// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{BuildStats, Coordinator, WatchEvent};
use crate::errors::Result;

/// Drives the [`Coordinator`] from a channel of [`WatchEvent`]s.
///
/// This is a thin IO shell: it receives events in delivery order and hands
/// each one to the coordinator, which runs it to completion before the next
/// is received. There is never more than one pipeline running.
pub struct Runtime {
    coordinator: Coordinator,
    event_rx: mpsc::Receiver<WatchEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(coordinator: Coordinator, event_rx: mpsc::Receiver<WatchEvent>) -> Self {
        Self {
            coordinator,
            event_rx,
        }
    }

    /// Main event loop. Returns the final statistics.
    pub async fn run(mut self) -> Result<BuildStats> {
        debug!("cielo runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.coordinator.step(event).await;
            for observation in &step.observations {
                debug!(?observation, "coordinator observation");
            }

            if !step.keep_running {
                debug!("coordinator requested exit; stopping runtime");
                break;
            }
        }

        let stats = self.coordinator.stats();
        info!("done: {stats}");
        Ok(stats)
    }
}

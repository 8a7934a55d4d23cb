//! Pre-analysis initialization sequencer
//!
//! Runs once, on the calling thread, before the build spawns any analysis
//! worker. Each trigger is first-touched in order and must finish its whole
//! transitive initialization before the next one starts. A failing trigger
//! aborts the sequence; it is never retried.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::SequenceError;
use crate::registry::TypeRegistry;
use crate::trigger::TriggerList;

/// Outcome of one trigger.
#[derive(Debug, Clone)]
pub struct TriggerStep {
    /// Trigger type name.
    pub name: String,

    /// Types whose initialization completed during this trigger.
    pub newly_initialized: usize,

    /// Wall time spent in this trigger.
    pub elapsed: Duration,
}

/// Summary of a successful sequence.
#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub steps: Vec<TriggerStep>,

    /// Types initialized in the registry after the sequence.
    pub initialized: usize,

    pub elapsed: Duration,
}

/// The before-analysis hook.
#[derive(Debug, Clone)]
pub struct InitSequencer {
    triggers: TriggerList,
    strict: bool,
}

impl InitSequencer {
    pub fn new(triggers: TriggerList) -> Self {
        Self {
            triggers,
            strict: false,
        }
    }

    /// Treat cycles no trigger reaches as a fatal configuration error instead
    /// of a warning.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Walk the trigger list on the current thread.
    ///
    /// Consumes the sequencer: the hook runs exactly once per build.
    pub fn run_before_analysis(self, registry: &TypeRegistry) -> Result<SequenceReport, SequenceError> {
        let uncovered = self.triggers.uncovered_cycles(registry);
        if !uncovered.is_empty() {
            if self.strict {
                return Err(SequenceError::UncoveredCycles(uncovered));
            }
            for cycle in &uncovered {
                warn!(cycle = ?cycle, "dependency cycle not reached by any initialization trigger");
            }
        }

        let started = Instant::now();
        let mut steps = Vec::with_capacity(self.triggers.len());

        for (index, name) in self.triggers.iter().enumerate() {
            let before = registry.initialized_count();
            let step_started = Instant::now();

            registry
                .ensure_initialized(name)
                .map_err(|source| SequenceError::Trigger {
                    index,
                    name: name.to_string(),
                    source,
                })?;

            let step = TriggerStep {
                name: name.to_string(),
                newly_initialized: registry.initialized_count() - before,
                elapsed: step_started.elapsed(),
            };
            info!(
                trigger = %step.name,
                initialized = step.newly_initialized,
                elapsed_ms = step.elapsed.as_millis() as u64,
                "initialization trigger complete"
            );
            steps.push(step);
        }

        Ok(SequenceReport {
            steps,
            initialized: registry.initialized_count(),
            elapsed: started.elapsed(),
        })
    }
}

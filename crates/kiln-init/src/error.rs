//! Initialization error types.

use thiserror::Error;

/// Errors from `TypeRegistry::ensure_initialized`.
#[derive(Debug, Clone, Error)]
pub enum InitError {
    /// No type with this name is registered.
    #[error("Type not found: {0}")]
    UnknownType(String),

    /// The type's initializer returned an error.
    #[error("Initializer of {name} failed: {message}")]
    InitializerFailed { name: String, message: String },

    /// An earlier initialization attempt failed; it is never retried.
    #[error("{name} failed to initialize earlier: {message}")]
    PreviouslyFailed { name: String, message: String },

    /// A required type could not be initialized.
    ///
    /// The cause is rendered into the message, not exposed as `source()`.
    #[error("Cannot initialize {name}: {cause}")]
    Dependency { name: String, cause: Box<InitError> },
}

/// Errors building a trigger list.
#[derive(Debug, Error)]
pub enum TriggerListError {
    /// The same type appears twice.
    #[error("Duplicate trigger: {0}")]
    Duplicate(String),

    /// A blank entry.
    #[error("Empty trigger name at position {0}")]
    EmptyName(usize),
}

/// Fatal failures of the pre-analysis sequence.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// A trigger could not be located or initialized.
    #[error("Initialization trigger #{index} ({name}) failed")]
    Trigger {
        index: usize,
        name: String,
        #[source]
        source: InitError,
    },

    /// Strict mode: some dependency cycles are not reached by any trigger.
    #[error("Dependency cycles not covered by any trigger: {}", format_cycles(.0))]
    UncoveredCycles(Vec<Vec<String>>),
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| format!("[{}]", cycle.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

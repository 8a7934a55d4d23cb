//! Initialization sequencing
//!
//! Types in a cyclic cluster cannot be first-touched from several threads at
//! once: each thread can start a different member of the cycle and then wait
//! on the other forever. This crate provides:
//! - **registry**: an explicit initialization registry (`ensure_initialized`)
//!   with per-type state and cross-thread waiting
//! - **trigger**: the hand-curated, ordered list of cluster entry points
//! - **sequencer**: the once-only hook that walks the trigger list on one
//!   thread before analysis starts
//! - **graph**: cycle detection used to check that every cluster has a trigger

pub mod error;
pub mod graph;
pub mod registry;
pub mod sequencer;
pub mod trigger;

pub use error::{InitError, SequenceError, TriggerListError};
pub use graph::DependencyGraph;
pub use registry::{InitContext, InitState, TypeDef, TypeRegistry};
pub use sequencer::{InitSequencer, SequenceReport, TriggerStep};
pub use trigger::TriggerList;

//! Type initialization registry
//!
//! Every registered type runs its initializer at most once. A first touch
//! (`ensure_initialized`) follows the usual static-initialization protocol:
//!
//! | state of the type            | caller                                  |
//! |------------------------------|-----------------------------------------|
//! | initialized                  | returns immediately                     |
//! | in progress on this thread   | returns immediately (recursive touch)   |
//! | in progress on another thread| waits until that thread finishes        |
//! | failed earlier               | fails without retrying                  |
//! | uninitialized                | claims it, runs `requires`, then the initializer |
//!
//! The waiting rule is what makes concurrent first touches of a cycle
//! deadlock, and why the sequencer walks cycles on a single thread first.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::error::InitError;

/// Initializer body. May touch other types through the context.
pub type Initializer = Box<dyn Fn(&InitContext<'_>) -> Result<(), String> + Send + Sync>;

/// A registered type: name, required types, declared touches, and initializer.
pub struct TypeDef {
    name: String,
    requires: Vec<String>,
    touches: Vec<String>,
    init: Initializer,
}

impl std::fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("touches", &self.touches)
            .finish()
    }
}

impl TypeDef {
    /// A type with no requirements and an empty initializer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            touches: Vec::new(),
            init: Box::new(|_| Ok(())),
        }
    }

    /// Types that must be fully initialized before this type's initializer runs.
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(names.into_iter().map(Into::into));
        self
    }

    /// Types the initializer first-touches.
    ///
    /// Only recorded for the dependency graph; the initializer still has to
    /// touch them through its context.
    pub fn touches<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.touches.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the initializer body.
    pub fn with_initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&InitContext<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.init = Box::new(init);
        self
    }

    /// Fully-qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared requirements.
    pub fn required(&self) -> &[String] {
        &self.requires
    }

    /// Declared touches.
    pub fn touched(&self) -> &[String] {
        &self.touches
    }
}

/// Initialization state of a single type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    InProgress(ThreadId),
    Initialized,
    Failed(String),
}

/// Handle passed to initializers for touching other types.
pub struct InitContext<'a> {
    registry: &'a TypeRegistry,
    current: &'a str,
}

impl InitContext<'_> {
    /// First-touch another type from inside an initializer.
    pub fn ensure_initialized(&self, name: &str) -> Result<(), InitError> {
        self.registry.ensure_initialized(name)
    }

    /// The type whose initializer is running.
    pub fn type_name(&self) -> &str {
        self.current
    }

    /// The registry being initialized.
    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }
}

#[derive(Default)]
struct RegistryState {
    states: HashMap<String, InitState>,
    /// Names in the order their initialization completed.
    order: Vec<String>,
}

/// Registry of types and their initialization state.
///
/// Registration takes `&mut self`; once shared, all touches go through
/// `&self` and may come from any thread.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
    state: Mutex<RegistryState>,
    changed: Condvar,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("initialized", &self.initialized_count())
            .finish()
    }
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Returns the rejected definition if the name is taken.
    pub fn register(&mut self, def: TypeDef) -> Result<(), TypeDef> {
        if self.types.contains_key(&def.name) {
            return Err(def);
        }
        self.types.insert(def.name.clone(), def);
        Ok(())
    }

    /// Whether a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All registered definitions (unordered).
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Current state of a registered type.
    pub fn state(&self, name: &str) -> Option<InitState> {
        if !self.types.contains_key(name) {
            return None;
        }
        let state = self.state.lock();
        Some(
            state
                .states
                .get(name)
                .cloned()
                .unwrap_or(InitState::Uninitialized),
        )
    }

    /// Whether a type has completed initialization.
    pub fn is_initialized(&self, name: &str) -> bool {
        self.state(name) == Some(InitState::Initialized)
    }

    /// Number of types that completed initialization.
    pub fn initialized_count(&self) -> usize {
        self.state.lock().order.len()
    }

    /// Names in the order their initialization completed.
    pub fn initialization_order(&self) -> Vec<String> {
        self.state.lock().order.clone()
    }

    /// First-touch a type.
    ///
    /// On `Ok`, the type and everything its initialization touched are
    /// initialized, except types still in progress further up this thread's
    /// stack (recursive touches through a cycle).
    pub fn ensure_initialized(&self, name: &str) -> Result<(), InitError> {
        let def = self
            .types
            .get(name)
            .ok_or_else(|| InitError::UnknownType(name.to_string()))?;
        let me = thread::current().id();

        {
            let mut state = self.state.lock();
            loop {
                let current = state
                    .states
                    .get(name)
                    .cloned()
                    .unwrap_or(InitState::Uninitialized);
                match current {
                    InitState::Initialized => return Ok(()),
                    InitState::Failed(message) => {
                        return Err(InitError::PreviouslyFailed {
                            name: name.to_string(),
                            message,
                        });
                    }
                    InitState::InProgress(owner) if owner == me => return Ok(()),
                    InitState::InProgress(owner) => {
                        debug!(type_name = name, ?owner, "waiting for initialization on another thread");
                        self.changed.wait(&mut state);
                    }
                    InitState::Uninitialized => {
                        trace!(type_name = name, "initialization started");
                        state
                            .states
                            .insert(name.to_string(), InitState::InProgress(me));
                        break;
                    }
                }
            }
        }

        let mut guard = InProgressGuard {
            registry: self,
            name,
            finished: false,
        };
        let result = self.run_initializer(def);
        guard.finish(&result);
        result
    }

    fn run_initializer(&self, def: &TypeDef) -> Result<(), InitError> {
        for dep in &def.requires {
            self.ensure_initialized(dep)
                .map_err(|cause| InitError::Dependency {
                    name: def.name.clone(),
                    cause: Box::new(cause),
                })?;
        }

        let ctx = InitContext {
            registry: self,
            current: &def.name,
        };
        (def.init)(&ctx).map_err(|message| InitError::InitializerFailed {
            name: def.name.clone(),
            message,
        })
    }

    fn complete(&self, name: &str, outcome: InitState) {
        let mut state = self.state.lock();
        if outcome == InitState::Initialized {
            state.order.push(name.to_string());
        }
        trace!(type_name = name, state = ?outcome, "initialization finished");
        state.states.insert(name.to_string(), outcome);
        drop(state);
        self.changed.notify_all();
    }
}

/// Publishes the outcome of an in-progress initialization, including when
/// the initializer unwinds, so waiting threads are always released.
struct InProgressGuard<'a> {
    registry: &'a TypeRegistry,
    name: &'a str,
    finished: bool,
}

impl InProgressGuard<'_> {
    fn finish(&mut self, result: &Result<(), InitError>) {
        let outcome = match result {
            Ok(()) => InitState::Initialized,
            Err(e) => InitState::Failed(e.to_string()),
        };
        self.registry.complete(self.name, outcome);
        self.finished = true;
    }
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.registry
                .complete(self.name, InitState::Failed("initializer panicked".to_string()));
        }
    }
}

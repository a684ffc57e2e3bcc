//! Per-actor critical section around the buff engine
//!
//! Mutations can arrive from several logical sources at once (the owner's
//! update loop, other actors' skill resolution, session event handlers),
//! and every compound operation spans multiple indices that must stay
//! mutually consistent. The required discipline is one exclusive critical
//! section around the whole call, not per-index locking. `SharedBuffEngine`
//! is that critical section: a cloneable handle whose closure API holds
//! the actor's lock for the full operation.

use std::sync::{Arc, Mutex};

use super::BuffEngine;

/// Cloneable, thread-safe handle to one actor's buff engine.
#[derive(Debug, Clone)]
pub struct SharedBuffEngine {
    inner: Arc<Mutex<BuffEngine>>,
}

impl SharedBuffEngine {
    pub fn new(engine: BuffEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run a whole compound operation under the actor's exclusive lock.
    ///
    /// Two concurrent adds for the same (definition, caster) serialize
    /// here, so the second one sees the first one's instance and merges
    /// instead of duplicating.
    pub fn with<R>(&self, f: impl FnOnce(&mut BuffEngine) -> R) -> R {
        let mut engine = self.inner.lock().unwrap_or_else(|poisoned| {
            // Engine state transitions are panic-free; a poisoned lock
            // means a hook impl panicked and the state is still usable.
            poisoned.into_inner()
        });
        f(&mut engine)
    }
}

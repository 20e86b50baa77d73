//! Construction signal and per-instance side state.
//!
//! The side table is keyed by [`InstanceId`] and never stored on the model itself,
//! so it can not leak into keys or serialization. Entries are released when the
//! instance is dropped.

use crate::config;
use crate::model::{InstanceId, Model};
use crate::value::Value;
use amodel_domain::CreationScopeMode;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};
use tracing::trace;

thread_local! {
    static CREATING: Cell<usize> = const { Cell::new(0) };
}

/// Enters construction on the current thread.
///
/// In [`CreationScopeMode::Depth`] calls nest; in [`CreationScopeMode::Flag`] the
/// signal is a plain boolean and the first [`end_creating`] clears it.
pub fn start_creating() {
    let mode = config::current().creation.scope;
    CREATING.with(|depth| {
        depth.set(match mode {
            CreationScopeMode::Depth => depth.get() + 1,
            CreationScopeMode::Flag => 1,
        });
    });
}

pub fn end_creating() {
    let mode = config::current().creation.scope;
    CREATING.with(|depth| {
        depth.set(match mode {
            CreationScopeMode::Depth => depth.get().saturating_sub(1),
            CreationScopeMode::Flag => 0,
        });
    });
}

#[must_use]
pub fn is_creating() -> bool {
    CREATING.with(|depth| depth.get() > 0)
}

#[must_use]
pub fn is_not_creating() -> bool {
    !is_creating()
}

/// Guard keeping the current thread in construction until dropped.
#[derive(Debug)]
#[must_use = "construction ends as soon as the scope is dropped"]
pub struct CreationScope {
    _thread_bound: PhantomData<*const ()>,
}

impl CreationScope {
    pub fn enter() -> Self {
        start_creating();
        Self { _thread_bound: PhantomData }
    }
}

impl Drop for CreationScope {
    fn drop(&mut self) {
        end_creating();
    }
}

#[derive(Debug, Default)]
struct SideState {
    initial_state: Option<Arc<Value>>,
    raw: Option<Arc<Value>>,
    touched: bool,
}

static SIDE_TABLE: LazyLock<RwLock<FxHashMap<InstanceId, SideState>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Stores a detached copy of `snapshot` as the reference state of `model`
/// and clears its touched flag.
pub fn save_initial_state(model: &Model, snapshot: &Value) {
    let frozen = Arc::new(snapshot.detached());
    let mut table = SIDE_TABLE.write();
    let state = table.entry(model.id()).or_default();
    state.initial_state = Some(frozen);
    state.touched = false;
    trace!(id = %model.id(), "Initial state saved");
}

/// Stores a detached copy of the input `model` was created from.
pub fn save_raw(model: &Model, raw: &Value) {
    let frozen = Arc::new(raw.detached());
    SIDE_TABLE.write().entry(model.id()).or_default().raw = Some(frozen);
}

pub fn mark_touched(id: InstanceId) {
    SIDE_TABLE.write().entry(id).or_default().touched = true;
}

/// Whether `model` diverged from its saved state.
///
/// `None` if no state was ever saved. The answer is recomputed structurally on each
/// call, so reverting a field to its initial value makes the model untouched again.
#[must_use]
pub fn is_touched(model: &Model) -> Option<bool> {
    let initial = initial_state(model)?;
    Some(!initial.deep_eq(&model.tracked_state()))
}

/// Whether a declared field was written outside construction since tracking started.
#[must_use]
pub fn was_touched(model: &Model) -> bool {
    SIDE_TABLE.read().get(&model.id()).is_some_and(|state| state.touched)
}

#[must_use]
pub fn initial_state(model: &Model) -> Option<Arc<Value>> {
    SIDE_TABLE.read().get(&model.id()).and_then(|state| state.initial_state.clone())
}

#[must_use]
pub fn raw_state(model: &Model) -> Option<Arc<Value>> {
    SIDE_TABLE.read().get(&model.id()).and_then(|state| state.raw.clone())
}

/// Drops the side state of `id`. Returns `true` if an entry existed.
pub fn release(id: InstanceId) -> bool {
    SIDE_TABLE.write().remove(&id).is_some()
}

impl Model {
    /// Saves the current declared state as the reference for [`Model::is_touched`].
    pub fn start_tracking(&self) -> &Self {
        save_initial_state(self, &self.tracked_state());
        self
    }

    /// See [`is_touched`].
    #[must_use]
    pub fn is_touched(&self) -> Option<bool> {
        is_touched(self)
    }

    /// See [`was_touched`].
    #[must_use]
    pub fn was_touched(&self) -> bool {
        was_touched(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_scopes_nest() {
        assert!(is_not_creating());
        {
            let _outer = CreationScope::enter();
            {
                let _inner = CreationScope::enter();
                assert!(is_creating());
            }
            assert!(is_creating());
        }
        assert!(is_not_creating());
    }

    #[test]
    fn test_end_without_start_saturates() {
        end_creating();
        assert!(is_not_creating());
        let _scope = CreationScope::enter();
        assert!(is_creating());
    }
}

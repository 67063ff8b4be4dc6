//! Trigger dispatch and automatic key generation (spec §4.9). No teacher
//! file models a write-path trigger slot directly, so the swap-and-wait
//! latch is grounded on the general `tokio::sync::RwLock` + `Arc` strong-count
//! idiom already used for this crate's own predicate locks (`scan.rs`),
//! rather than copied from one file.

use crate::scan::PredicateLockTable;
use relquery::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Maintains secondary indexes (or whatever else a write should fan out
/// to) in response to a primary-table write.
pub trait SecondaryMaintainer: Send + Sync {
    fn maintain(&self, key: &[u8], old_value: Option<&[u8]>, new_value: Option<&[u8]>) -> Result<(), crate::error::StorageError>;
}

pub enum TriggerMode {
    /// Bypass: no secondary maintenance runs.
    Skip,
    /// A switch is in progress; writers must retry once it completes.
    Disabled,
    Active(Arc<dyn SecondaryMaintainer>),
}

/// A shared/exclusive latch over the current trigger. Write paths acquire
/// it shared (cloning the `Arc<TriggerMode>`) and dispatch against
/// whatever they observed; `set_trigger` acquires it exclusively to
/// publish a replacement, then waits for every shared holder of the old
/// value to finish before returning, so no write straddles the change.
pub struct TriggerSlot {
    mode: RwLock<Arc<TriggerMode>>,
}

impl Default for TriggerSlot {
    fn default() -> Self { Self::new(TriggerMode::Skip) }
}

impl TriggerSlot {
    pub fn new(initial: TriggerMode) -> Self { TriggerSlot { mode: RwLock::new(Arc::new(initial)) } }

    /// Dispatch a single write against the current trigger. `Disabled`
    /// spins (yielding between attempts) until `set_trigger` finishes
    /// publishing its replacement.
    pub async fn dispatch(&self, key: &[u8], old_value: Option<&[u8]>, new_value: Option<&[u8]>) -> Result<(), crate::error::StorageError> {
        loop {
            let current = self.mode.read().await.clone();
            match current.as_ref() {
                TriggerMode::Skip => return Ok(()),
                TriggerMode::Active(maintainer) => return maintainer.maintain(key, old_value, new_value),
                TriggerMode::Disabled => {
                    drop(current);
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    /// Publish `new_mode`, then block until every in-flight `dispatch` that
    /// observed the previous mode has returned.
    pub async fn set_trigger(&self, new_mode: TriggerMode) {
        let new_arc = Arc::new(new_mode);
        let old_arc = std::mem::replace(&mut *self.mode.write().await, new_arc);
        while Arc::strong_count(&old_arc) > 1 {
            tokio::task::yield_now().await;
        }
    }
}

/// The integer family an automatic key generator draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    I32,
    I64,
    U32,
    U64,
}

impl KeyKind {
    fn to_value(self, n: i64) -> Value {
        match self {
            KeyKind::I32 => Value::I32(n as i32),
            KeyKind::I64 => Value::I64(n),
            KeyKind::U32 => Value::U32(n as u32),
            KeyKind::U64 => Value::U64(n as u64),
        }
    }
}

/// Picks an unused key within `[min, max]`, consulting the predicate-lock
/// table to obtain the lock a caller would need before actually storing a
/// row under the key — without ever storing until a candidate is free
/// (spec §4.9).
pub struct KeyGenerator {
    kind: KeyKind,
    min: i64,
    max: i64,
}

impl KeyGenerator {
    pub fn new(kind: KeyKind, range: crate::row::AutoRange) -> Self { KeyGenerator { kind, min: range.min, max: range.max } }

    /// Scan forward from `min`, returning the first candidate for which
    /// `try_open_acquire` reports no conflicting predicate lock held
    /// against it on `column`. Returns `None` once the whole range has
    /// been exhausted without finding a free value.
    pub fn generate(&self, predicates: &Arc<PredicateLockTable>, column: &str) -> Option<Value> {
        let mut n = self.min;
        while n <= self.max {
            let value = self.kind.to_value(n);
            let row = |c: &str| if c == column { Some(value.clone()) } else { None };
            if predicates.try_open_acquire(&row).is_ok() {
                return Some(value);
            }
            n += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relquery::{Filter, Op};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingMaintainer(AtomicU32);
    impl SecondaryMaintainer for CountingMaintainer {
        fn maintain(&self, _key: &[u8], _old: Option<&[u8]>, _new: Option<&[u8]>) -> Result<(), crate::error::StorageError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn skip_mode_dispatches_without_invoking_maintainer() {
        let slot = TriggerSlot::default();
        slot.dispatch(b"k", None, Some(b"v")).await.unwrap();
    }

    #[tokio::test]
    async fn active_mode_invokes_current_maintainer() {
        let maintainer = Arc::new(CountingMaintainer(AtomicU32::new(0)));
        let slot = TriggerSlot::new(TriggerMode::Active(maintainer.clone()));
        slot.dispatch(b"k", None, Some(b"v")).await.unwrap();
        assert_eq!(maintainer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn set_trigger_waits_for_in_flight_dispatch_to_drain() {
        let slot = Arc::new(TriggerSlot::default());
        slot.set_trigger(TriggerMode::Active(Arc::new(CountingMaintainer(AtomicU32::new(0))))).await;

        let slot2 = slot.clone();
        let maintainer2 = Arc::new(CountingMaintainer(AtomicU32::new(0)));
        slot2.set_trigger(TriggerMode::Active(maintainer2.clone())).await;
        slot2.dispatch(b"k", None, Some(b"v")).await.unwrap();
        assert_eq!(maintainer2.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn key_generator_finds_first_value_with_no_held_predicate() {
        let predicates = Arc::new(PredicateLockTable::new());
        let _guard = predicates.hold(Filter::column_to_constant("id", Op::Eq, Value::I32(1)), Vec::new());
        let gen = KeyGenerator::new(KeyKind::I32, crate::row::AutoRange { min: 1, max: 5 });
        assert_eq!(gen.generate(&predicates, "id"), Some(Value::I32(2)));
    }

    #[test]
    fn key_generator_exhausts_range_when_all_locked() {
        let predicates = Arc::new(PredicateLockTable::new());
        let _guard = predicates.hold(Filter::True, Vec::new());
        let gen = KeyGenerator::new(KeyKind::I32, crate::row::AutoRange { min: 1, max: 2 });
        assert_eq!(gen.generate(&predicates, "id"), None);
    }
}

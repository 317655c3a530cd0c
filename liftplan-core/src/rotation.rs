//! Rotation pointer: calendar-independent "what's next" tracking.
//!
//! The pointer is `{variant_index, session_index}` into the plan's rotation.
//! It lives in an injected `PointerStore` and moves forward exactly once per
//! completed workout. Completion tokens (normally the workout session id) make
//! a repeated advance for the same workout a no-op.
//!
//! Transition rules:
//! - one-variant rotation: bump the session index, wrapping at the session
//!   count of the first rotation variant
//! - longer rotations: bump the variant index; the session index moves only
//!   when the variant index wraps back to 0 (a full lap)
//! - empty rotation: nothing moves

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::plan::PlanSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationPointer {
    pub variant_index: usize,
    pub session_index: usize,
}

impl RotationPointer {
    pub fn new(variant_index: usize, session_index: usize) -> Self {
        Self {
            variant_index,
            session_index,
        }
    }
}

/// What the store persists: the pointer plus the last completion token applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerRecord {
    #[serde(flatten)]
    pub pointer: RotationPointer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_advanced_token: Option<String>,
}

/// Persistence for the pointer. `None` from `get` means uninitialized.
pub trait PointerStore {
    fn get(&self) -> Result<Option<PointerRecord>>;
    fn set(&mut self, record: &PointerRecord) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPointerStore {
    record: Option<PointerRecord>,
}

impl MemoryPointerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pointer(pointer: RotationPointer) -> Self {
        Self {
            record: Some(PointerRecord {
                pointer,
                last_advanced_token: None,
            }),
        }
    }
}

impl PointerStore for MemoryPointerStore {
    fn get(&self) -> Result<Option<PointerRecord>> {
        Ok(self.record.clone())
    }

    fn set(&mut self, record: &PointerRecord) -> Result<()> {
        self.record = Some(record.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.record = None;
        Ok(())
    }
}

/// Session count that drives session-index wrap-around: the first rotation
/// variant's sessions, never less than 1.
fn lap_session_count(plan: &PlanSnapshot) -> usize {
    plan.rotation
        .first()
        .map(|key| plan.sessions_for(key).len())
        .unwrap_or(0)
        .max(1)
}

/// Pure advance transition.
pub fn advance_pointer(pointer: RotationPointer, plan: &PlanSnapshot) -> RotationPointer {
    let len = plan.rotation.len();
    if len == 0 {
        return pointer;
    }
    let sessions = lap_session_count(plan);

    // Persisted indices can be anything; reduce before incrementing.
    let next_session = (pointer.session_index % sessions + 1) % sessions;

    if len == 1 {
        return RotationPointer {
            variant_index: 0,
            session_index: next_session,
        };
    }

    let variant_index = (pointer.variant_index % len + 1) % len;
    let session_index = if variant_index == 0 {
        next_session
    } else {
        pointer.session_index
    };
    RotationPointer {
        variant_index,
        session_index,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextWorkout {
    pub variant_key: String,
    pub session_id: String,
    pub session_name: String,
    pub variant_index: usize,
    pub session_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced(RotationPointer),
    /// This completion token was already applied; pointer unchanged.
    AlreadyApplied(RotationPointer),
    /// The plan has no rotation; pointer unchanged.
    NoRotation,
}

/// Reads and moves the pointer held in `S`.
#[derive(Debug, Clone)]
pub struct RotationTracker<S: PointerStore> {
    store: S,
}

impl<S: PointerStore> RotationTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn record(&mut self) -> Result<PointerRecord> {
        if let Some(record) = self.store.get()? {
            return Ok(record);
        }
        let record = PointerRecord::default();
        self.store.set(&record)?;
        tracing::debug!("rotation pointer initialized at 0/0");
        Ok(record)
    }

    /// Current pointer; initializes and persists `{0,0}` on first read.
    pub fn pointer(&mut self) -> Result<RotationPointer> {
        Ok(self.record()?.pointer)
    }

    /// Next workout regardless of calendar gaps. `None` means there is nothing
    /// to schedule (no rotation, or the resolved variant has no sessions).
    pub fn next_workout(&mut self, plan: &PlanSnapshot) -> Result<Option<NextWorkout>> {
        let pointer = self.pointer()?;
        if plan.rotation.is_empty() {
            return Ok(None);
        }

        let variant_index = pointer.variant_index % plan.rotation.len();
        let variant_key = &plan.rotation[variant_index];
        let sessions = plan.sessions_for(variant_key);
        if sessions.is_empty() {
            return Ok(None);
        }

        let session_index = pointer.session_index % sessions.len();
        let session = &sessions[session_index];
        Ok(Some(NextWorkout {
            variant_key: variant_key.clone(),
            session_id: session.id.clone(),
            session_name: session.name.clone(),
            variant_index,
            session_index,
        }))
    }

    /// Apply the advance transition for one completed workout.
    pub fn advance(&mut self, plan: &PlanSnapshot, completion_token: &str) -> Result<AdvanceOutcome> {
        let record = self.record()?;
        if plan.rotation.is_empty() {
            return Ok(AdvanceOutcome::NoRotation);
        }
        if record.last_advanced_token.as_deref() == Some(completion_token) {
            tracing::debug!(token = completion_token, "completion already applied; pointer unchanged");
            return Ok(AdvanceOutcome::AlreadyApplied(record.pointer));
        }

        let next = advance_pointer(record.pointer, plan);
        self.store.set(&PointerRecord {
            pointer: next,
            last_advanced_token: Some(completion_token.to_string()),
        })?;
        tracing::debug!(
            from_variant = record.pointer.variant_index,
            from_session = record.pointer.session_index,
            to_variant = next.variant_index,
            to_session = next.session_index,
            "rotation pointer advanced"
        );
        Ok(AdvanceOutcome::Advanced(next))
    }

    /// Back to uninitialized; the next read starts over at `{0,0}`.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear()?;
        tracing::debug!("rotation pointer cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn ab_plan() -> PlanSnapshot {
        PlanSnapshot::new("PPL + UL", anchor())
            .with_rotation(&["A", "B"])
            .with_variant("A", &["Push", "Pull", "Legs"])
            .with_variant("B", &["Upper", "Lower"])
    }

    fn tracker() -> RotationTracker<MemoryPointerStore> {
        RotationTracker::new(MemoryPointerStore::new())
    }

    #[test]
    fn first_read_initializes_and_persists() {
        let mut t = tracker();
        assert_eq!(t.store().get().unwrap(), None);
        assert_eq!(t.pointer().unwrap(), RotationPointer::new(0, 0));
        assert_eq!(
            t.store().get().unwrap().map(|r| r.pointer),
            Some(RotationPointer::new(0, 0))
        );
    }

    #[test]
    fn single_variant_full_lap_returns_to_start() {
        let plan = PlanSnapshot::new("Full body", anchor())
            .with_rotation(&["A"])
            .with_variant("A", &["Day 1", "Day 2", "Day 3", "Day 4"]);
        let start = RotationPointer::new(0, 2);
        let mut p = start;
        for _ in 0..4 {
            p = advance_pointer(p, &plan);
            assert_eq!(p.variant_index, 0);
        }
        assert_eq!(p, start);
    }

    #[test]
    fn single_variant_without_sessions_stays_put() {
        let plan = PlanSnapshot::new("x", anchor()).with_rotation(&["A"]);
        assert_eq!(advance_pointer(RotationPointer::new(0, 0), &plan), RotationPointer::new(0, 0));
    }

    #[test]
    fn two_variant_lap_bumps_session_once() {
        let plan = ab_plan();
        let once = advance_pointer(RotationPointer::new(0, 0), &plan);
        assert_eq!(once, RotationPointer::new(1, 0));
        let twice = advance_pointer(once, &plan);
        assert_eq!(twice, RotationPointer::new(0, 1));
    }

    #[test]
    fn session_index_wraps_on_first_variant_count() {
        let plan = ab_plan();
        let mut p = RotationPointer::new(0, 0);
        for _ in 0..6 {
            p = advance_pointer(p, &plan);
        }
        // Three laps over a three-session first variant.
        assert_eq!(p, RotationPointer::new(0, 0));
    }

    #[test]
    fn empty_rotation_is_a_noop() {
        let plan = PlanSnapshot::new("x", anchor()).with_variant("A", &["Push"]);
        let p = RotationPointer::new(3, 2);
        assert_eq!(advance_pointer(p, &plan), p);

        let mut t = tracker();
        assert_eq!(t.advance(&plan, "w1").unwrap(), AdvanceOutcome::NoRotation);
        assert_eq!(t.next_workout(&plan).unwrap(), None);
    }

    #[test]
    fn worked_example_a_b() {
        let plan = ab_plan();
        let mut t = tracker();

        let first = t.next_workout(&plan).unwrap().unwrap();
        assert_eq!(first.variant_key, "A");
        assert_eq!(first.session_name, "Push");
        assert_eq!((first.variant_index, first.session_index), (0, 0));

        t.advance(&plan, "w1").unwrap();
        let second = t.next_workout(&plan).unwrap().unwrap();
        assert_eq!(second.variant_key, "B");
        assert_eq!(second.session_name, "Upper");
        assert_eq!((second.variant_index, second.session_index), (1, 0));

        t.advance(&plan, "w2").unwrap();
        let third = t.next_workout(&plan).unwrap().unwrap();
        assert_eq!(third.variant_key, "A");
        assert_eq!(third.session_name, "Pull");
        assert_eq!(third.session_id, "A-2");
    }

    #[test]
    fn repeated_token_does_not_double_advance() {
        let plan = ab_plan();
        let mut t = tracker();
        assert_eq!(
            t.advance(&plan, "w1").unwrap(),
            AdvanceOutcome::Advanced(RotationPointer::new(1, 0))
        );
        assert_eq!(
            t.advance(&plan, "w1").unwrap(),
            AdvanceOutcome::AlreadyApplied(RotationPointer::new(1, 0))
        );
        assert_eq!(t.pointer().unwrap(), RotationPointer::new(1, 0));
    }

    #[test]
    fn stale_pointer_is_normalized() {
        // Pointer saved under a longer rotation.
        let plan = ab_plan();
        let mut t = RotationTracker::new(MemoryPointerStore::with_pointer(RotationPointer::new(2, 4)));
        let next = t.next_workout(&plan).unwrap().unwrap();
        assert_eq!(next.variant_index, 0);
        assert_eq!(next.session_index, 1);
        assert_eq!(next.session_name, "Pull");
    }

    #[test]
    fn advance_from_huge_persisted_indices() {
        let single = PlanSnapshot::new("Full body", anchor())
            .with_rotation(&["A"])
            .with_variant("A", &["Day 1", "Day 2", "Day 3"]);
        let p = advance_pointer(RotationPointer::new(0, usize::MAX), &single);
        // usize::MAX % 3 == 0
        assert_eq!(p, RotationPointer::new(0, 1));

        let plan = ab_plan();
        let p = advance_pointer(RotationPointer::new(usize::MAX, usize::MAX), &plan);
        // usize::MAX is odd, so the variant index wraps and the lap completes.
        assert_eq!(p, RotationPointer::new(0, 1));

        let mut t = RotationTracker::new(MemoryPointerStore::with_pointer(RotationPointer::new(
            0,
            usize::MAX,
        )));
        assert_eq!(t.next_workout(&single).unwrap().unwrap().session_index, 0);
        assert_eq!(
            t.advance(&single, "w1").unwrap(),
            AdvanceOutcome::Advanced(RotationPointer::new(0, 1))
        );
    }

    #[test]
    fn variant_without_sessions_yields_none() {
        let plan = PlanSnapshot::new("x", anchor())
            .with_rotation(&["A", "B"])
            .with_variant("A", &["Push"]);
        let mut t = RotationTracker::new(MemoryPointerStore::with_pointer(RotationPointer::new(1, 0)));
        assert_eq!(t.next_workout(&plan).unwrap(), None);
    }

    #[test]
    fn reset_reinitializes_on_next_read() {
        let plan = ab_plan();
        let mut t = tracker();
        t.advance(&plan, "w1").unwrap();
        t.advance(&plan, "w2").unwrap();
        t.reset().unwrap();
        assert_eq!(t.store().get().unwrap(), None);

        let next = t.next_workout(&plan).unwrap().unwrap();
        assert_eq!((next.variant_index, next.session_index), (0, 0));
        assert_eq!(t.pointer().unwrap(), RotationPointer::new(0, 0));
    }

    #[test]
    fn record_wire_shape() {
        let record = PointerRecord {
            pointer: RotationPointer::new(1, 2),
            last_advanced_token: None,
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"variantIndex":1,"sessionIndex":2}"#
        );
        let back: PointerRecord =
            serde_json::from_str(r#"{"variantIndex":0,"sessionIndex":3,"lastAdvancedToken":"w9"}"#).unwrap();
        assert_eq!(back.pointer, RotationPointer::new(0, 3));
        assert_eq!(back.last_advanced_token.as_deref(), Some("w9"));
    }
}

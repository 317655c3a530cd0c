//! Plan storage seam.
//!
//! `PlanRepository` is what the scheduler needs from persistence. `PlanTables`
//! holds the rows (serializable, so file-backed stores can reuse it) and does
//! the write-time validation; `InMemoryPlanRepository` wraps it for tests and
//! embedding. `Planner` pairs a repository with the rotation tracker so every
//! plan reset or split deletion also clears the pointer.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::history::WorkoutSession;
use crate::plan::{
    serialize_rotation, Cycle, PlanExercise, PlanSnapshot, SessionTemplate, Split, SplitSnapshot,
    Variant,
};
use crate::rotation::{AdvanceOutcome, NextWorkout, PointerStore, RotationTracker};
use crate::time::week_monday;
use crate::week::{resolve_week, WeekSchedule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub target_weight_kg: Option<f64>,
}

impl NewExercise {
    pub fn new(name: impl Into<String>, target_sets: u32, target_reps: u32) -> Self {
        Self {
            name: name.into(),
            target_sets,
            target_reps,
            target_weight_kg: None,
        }
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.target_weight_kg = Some(kg);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    pub muscle_groups: Vec<String>,
    pub exercises: Vec<NewExercise>,
}

impl NewSession {
    pub fn new(name: impl Into<String>, muscle_groups: &[&str]) -> Self {
        Self {
            name: name.into(),
            muscle_groups: muscle_groups.iter().map(|m| m.to_string()).collect(),
            exercises: Vec::new(),
        }
    }

    pub fn exercise(mut self, exercise: NewExercise) -> Self {
        self.exercises.push(exercise);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVariant {
    pub key: String,
    pub sessions: Vec<NewSession>,
}

impl NewVariant {
    pub fn new(key: impl Into<String>, sessions: Vec<NewSession>) -> Self {
        Self {
            key: key.into(),
            sessions,
        }
    }
}

/// Split definition coming from the builder or a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSplit {
    pub name: String,
    pub variants: Vec<NewVariant>,
}

impl NewSplit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, variant: NewVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.variants.is_empty() {
            return Err(PlanError::NoVariants(self.name.clone()));
        }
        for (i, v) in self.variants.iter().enumerate() {
            if !is_valid_key(&v.key) {
                return Err(PlanError::InvalidVariantKey(v.key.clone()));
            }
            if self.variants[..i].iter().any(|prev| prev.key == v.key) {
                return Err(PlanError::DuplicateVariantKey(v.key.clone()));
            }
        }
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    (1..=4).contains(&key.len()) && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Row storage for splits and everything they own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanTables {
    #[serde(default)]
    pub splits: Vec<Split>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub sessions: Vec<SessionTemplate>,
    #[serde(default)]
    pub exercises: Vec<PlanExercise>,
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    #[serde(default)]
    next_id: u64,
}

impl PlanTables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    pub fn split_snapshot(&self, split_id: &str) -> Option<SplitSnapshot> {
        let split = self.splits.iter().find(|s| s.id == split_id)?;
        Some(SplitSnapshot::assemble(split, &self.variants, &self.sessions))
    }

    /// Id of the planned exercise called `name` (case-insensitive) in a session.
    pub fn exercise_id(&self, session_id: &str, name: &str) -> Option<&str> {
        self.exercises
            .iter()
            .find(|e| e.session_id == session_id && e.name.eq_ignore_ascii_case(name.trim()))
            .map(|e| e.id.as_str())
    }

    /// Most recently created split.
    pub fn latest_split(&self) -> Option<SplitSnapshot> {
        let split = self.splits.iter().max_by_key(|s| s.created_at)?;
        Some(SplitSnapshot::assemble(split, &self.variants, &self.sessions))
    }

    /// Plan of the most recently created active cycle.
    pub fn active_plan(&self) -> Option<PlanSnapshot> {
        let cycle = self
            .cycles
            .iter()
            .filter(|c| c.active)
            .max_by_key(|c| c.created_at)?;
        let split = self.splits.iter().find(|s| s.id == cycle.split_id)?;
        Some(PlanSnapshot::assemble(split, &self.variants, &self.sessions, cycle))
    }

    pub fn insert_split(&mut self, new: NewSplit, now: DateTime<Utc>) -> Result<SplitSnapshot, PlanError> {
        new.validate()?;

        let split_id = self.next_id("split");
        self.splits.push(Split {
            id: split_id.clone(),
            name: new.name,
            created_at: now,
        });

        for (vpos, v) in new.variants.into_iter().enumerate() {
            let variant_id = self.next_id("var");
            self.variants.push(Variant {
                id: variant_id.clone(),
                split_id: split_id.clone(),
                key: v.key,
                position: vpos as i32,
            });

            for (spos, s) in v.sessions.into_iter().enumerate() {
                let session_id = self.next_id("sess");
                self.sessions.push(SessionTemplate {
                    id: session_id.clone(),
                    variant_id: variant_id.clone(),
                    name: s.name,
                    position: spos as i32,
                    muscle_groups: s.muscle_groups,
                });

                for (epos, e) in s.exercises.into_iter().enumerate() {
                    let exercise_id = self.next_id("ex");
                    self.exercises.push(PlanExercise {
                        id: exercise_id,
                        session_id: session_id.clone(),
                        name: e.name,
                        position: epos as i32,
                        target_sets: e.target_sets,
                        target_reps: e.target_reps,
                        target_weight_kg: e.target_weight_kg,
                    });
                }
            }
        }

        self.split_snapshot(&split_id)
            .ok_or(PlanError::SplitNotFound(split_id))
    }

    /// Create a new active cycle for `split_id`, deactivating earlier ones.
    /// Every rotation key must name a variant of the split.
    pub fn upsert_cycle(
        &mut self,
        split_id: &str,
        rotation: &[String],
        anchor_week_start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Cycle, PlanError> {
        if !self.splits.iter().any(|s| s.id == split_id) {
            return Err(PlanError::SplitNotFound(split_id.to_string()));
        }
        if rotation.is_empty() {
            return Err(PlanError::EmptyRotation);
        }
        for key in rotation {
            let known = self
                .variants
                .iter()
                .any(|v| v.split_id == split_id && &v.key == key);
            if !known {
                return Err(PlanError::UnknownRotationKey {
                    split_id: split_id.to_string(),
                    key: key.clone(),
                });
            }
        }

        for c in self.cycles.iter_mut().filter(|c| c.split_id == split_id) {
            c.active = false;
        }
        let cycle = Cycle {
            id: self.next_id("cycle"),
            split_id: split_id.to_string(),
            rotation_json: serialize_rotation(rotation),
            anchor_week_start: week_monday(anchor_week_start),
            active: true,
            created_at: now,
        };
        self.cycles.push(cycle.clone());
        Ok(cycle)
    }

    /// Remove a split and everything it owns. Returns false if it did not exist.
    pub fn delete_split(&mut self, split_id: &str) -> bool {
        let before = self.splits.len();
        self.splits.retain(|s| s.id != split_id);
        if self.splits.len() == before {
            return false;
        }

        let variant_ids: Vec<String> = self
            .variants
            .iter()
            .filter(|v| v.split_id == split_id)
            .map(|v| v.id.clone())
            .collect();
        let session_ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|s| variant_ids.contains(&s.variant_id))
            .map(|s| s.id.clone())
            .collect();

        self.variants.retain(|v| v.split_id != split_id);
        self.sessions.retain(|s| !variant_ids.contains(&s.variant_id));
        self.exercises.retain(|e| !session_ids.contains(&e.session_id));
        self.cycles.retain(|c| c.split_id != split_id);
        true
    }

    pub fn clear(&mut self) {
        let next_id = self.next_id;
        *self = Self::default();
        // Keep ids unique across resets; history may still reference old ones.
        self.next_id = next_id;
    }
}

/// What the scheduler needs from plan persistence.
pub trait PlanRepository {
    fn active_plan(&self) -> Result<Option<PlanSnapshot>>;

    /// Latest split, with or without a cycle.
    fn split_if_exists(&self) -> Result<Option<SplitSnapshot>>;

    fn create_split(&mut self, split: NewSplit) -> Result<SplitSnapshot>;

    fn create_or_update_cycle(
        &mut self,
        split_id: &str,
        rotation: &[String],
        anchor_week_start: NaiveDate,
    ) -> Result<Cycle>;

    fn delete_split(&mut self, split_id: &str) -> Result<()>;

    /// Drop every split, cycle and template.
    fn reset_plan(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    tables: PlanTables,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &PlanTables {
        &self.tables
    }
}

impl PlanRepository for InMemoryPlanRepository {
    fn active_plan(&self) -> Result<Option<PlanSnapshot>> {
        Ok(self.tables.active_plan())
    }

    fn split_if_exists(&self) -> Result<Option<SplitSnapshot>> {
        Ok(self.tables.latest_split())
    }

    fn create_split(&mut self, split: NewSplit) -> Result<SplitSnapshot> {
        Ok(self.tables.insert_split(split, Utc::now())?)
    }

    fn create_or_update_cycle(
        &mut self,
        split_id: &str,
        rotation: &[String],
        anchor_week_start: NaiveDate,
    ) -> Result<Cycle> {
        Ok(self
            .tables
            .upsert_cycle(split_id, rotation, anchor_week_start, Utc::now())?)
    }

    fn delete_split(&mut self, split_id: &str) -> Result<()> {
        if !self.tables.delete_split(split_id) {
            return Err(PlanError::SplitNotFound(split_id.to_string()).into());
        }
        Ok(())
    }

    fn reset_plan(&mut self) -> Result<()> {
        self.tables.clear();
        Ok(())
    }
}

/// Repository plus rotation tracker, kept consistent with each other.
#[derive(Debug)]
pub struct Planner<R: PlanRepository, S: PointerStore> {
    repo: R,
    tracker: RotationTracker<S>,
}

impl<R: PlanRepository, S: PointerStore> Planner<R, S> {
    pub fn new(repo: R, store: S) -> Self {
        Self {
            repo,
            tracker: RotationTracker::new(store),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn tracker_mut(&mut self) -> &mut RotationTracker<S> {
        &mut self.tracker
    }

    pub fn into_parts(self) -> (R, S) {
        (self.repo, self.tracker.into_store())
    }

    pub fn active_plan(&self) -> Result<Option<PlanSnapshot>> {
        self.repo.active_plan()
    }

    pub fn create_split(&mut self, split: NewSplit) -> Result<SplitSnapshot> {
        let snapshot = self.repo.create_split(split)?;
        tracing::info!(split_id = %snapshot.split.id, name = %snapshot.split.name, "split created");
        Ok(snapshot)
    }

    /// Point the split at a new rotation. The pointer is kept; reads normalize
    /// it against the new rotation length.
    pub fn set_cycle(
        &mut self,
        split_id: &str,
        rotation: &[String],
        anchor_week_start: NaiveDate,
    ) -> Result<Cycle> {
        let cycle = self
            .repo
            .create_or_update_cycle(split_id, rotation, anchor_week_start)?;
        tracing::info!(
            cycle_id = %cycle.id,
            rotation = %cycle.rotation_json,
            anchor = %cycle.anchor_week_start,
            "cycle activated"
        );
        Ok(cycle)
    }

    /// Schedule for the week containing `date`; `None` without an active plan.
    pub fn week(&self, date: NaiveDate) -> Result<Option<WeekSchedule>> {
        Ok(self.repo.active_plan()?.map(|plan| resolve_week(&plan, date)))
    }

    pub fn next_workout(&mut self) -> Result<Option<NextWorkout>> {
        match self.repo.active_plan()? {
            Some(plan) => self.tracker.next_workout(&plan),
            None => Ok(None),
        }
    }

    /// Advance the rotation for a finished workout, at most once per workout id.
    pub fn complete_workout(&mut self, workout: &WorkoutSession) -> Result<AdvanceOutcome> {
        let Some(plan) = self.repo.active_plan()? else {
            return Ok(AdvanceOutcome::NoRotation);
        };
        self.tracker.advance(&plan, workout.id())
    }

    pub fn delete_split(&mut self, split_id: &str) -> Result<()> {
        self.repo.delete_split(split_id)?;
        self.tracker.reset()?;
        tracing::info!(split_id, "split deleted; rotation pointer cleared");
        Ok(())
    }

    pub fn reset_plan(&mut self) -> Result<()> {
        self.repo.reset_plan()?;
        self.tracker.reset()?;
        tracing::info!("plan reset; rotation pointer cleared");
        Ok(())
    }

    pub fn reset_pointer(&mut self) -> Result<()> {
        self.tracker.reset()
    }
}

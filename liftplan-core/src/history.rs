//! Completed workout records and the week overlay built from them.
//!
//! A `WorkoutSession` is a snapshot taken when a workout finishes. Its links to
//! the cycle and session template are weak ids that may dangle later.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::SessionRef;
use crate::time::week_monday;
use crate::week::WeekSchedule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSet {
    pub exercise_id: Option<String>,
    pub exercise_name: String,
    pub set_number: u32,
    pub weight_kg: f64,
    pub reps: u32,
}

/// Workout being logged. Turns into an immutable `WorkoutSession` via `complete`.
#[derive(Debug, Clone)]
pub struct WorkoutDraft {
    id: String,
    title: String,
    started_at: DateTime<Utc>,
    cycle_id: Option<String>,
    session_template_id: Option<String>,
    sets: Vec<CompletedSet>,
}

impl WorkoutDraft {
    pub fn new(id: impl Into<String>, title: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            started_at,
            cycle_id: None,
            session_template_id: None,
            sets: Vec::new(),
        }
    }

    pub fn linked_to(mut self, cycle_id: Option<String>, session_template_id: Option<String>) -> Self {
        self.cycle_id = cycle_id;
        self.session_template_id = session_template_id;
        self
    }

    /// Log one set without a link to a planned exercise.
    pub fn add_set(self, exercise_name: &str, weight_kg: f64, reps: u32) -> Self {
        self.add_exercise_set(None, exercise_name, weight_kg, reps)
    }

    /// Log one set; set numbers count per exercise name, starting at 1.
    pub fn add_exercise_set(
        mut self,
        exercise_id: Option<&str>,
        exercise_name: &str,
        weight_kg: f64,
        reps: u32,
    ) -> Self {
        let set_number = self
            .sets
            .iter()
            .filter(|s| s.exercise_name == exercise_name)
            .count() as u32
            + 1;
        self.sets.push(CompletedSet {
            exercise_id: exercise_id.map(str::to_string),
            exercise_name: exercise_name.to_string(),
            set_number,
            weight_kg,
            reps,
        });
        self
    }

    pub fn complete(self, completed_at: DateTime<Utc>) -> WorkoutSession {
        let total_volume_kg = self.sets.iter().map(|s| s.weight_kg * s.reps as f64).sum();
        let total_reps = self.sets.iter().map(|s| s.reps).sum();
        WorkoutSession {
            id: self.id,
            cycle_id: self.cycle_id,
            session_template_id: self.session_template_id,
            title: self.title,
            started_at: self.started_at,
            completed_at,
            total_volume_kg,
            total_sets: self.sets.len() as u32,
            total_reps,
            sets: self.sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    id: String,
    cycle_id: Option<String>,
    session_template_id: Option<String>,
    title: String,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_volume_kg: f64,
    total_sets: u32,
    total_reps: u32,
    sets: Vec<CompletedSet>,
}

impl WorkoutSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cycle_id(&self) -> Option<&str> {
        self.cycle_id.as_deref()
    }

    pub fn session_template_id(&self) -> Option<&str> {
        self.session_template_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn total_volume_kg(&self) -> f64 {
        self.total_volume_kg
    }

    pub fn total_sets(&self) -> u32 {
        self.total_sets
    }

    pub fn total_reps(&self) -> u32 {
        self.total_reps
    }

    pub fn sets(&self) -> &[CompletedSet] {
        &self.sets
    }

    /// Monday of the local week this workout was completed in.
    pub fn week_start_in<Z: TimeZone>(&self, tz: &Z) -> NaiveDate {
        week_monday(self.completed_at.with_timezone(tz).date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session: SessionRef,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionProgress {
    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A resolved week with logged history layered on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekProgress {
    pub week_start: NaiveDate,
    pub variant_key: String,
    pub sessions: Vec<SessionProgress>,
    pub completed: usize,
    pub total_planned: usize,
    /// Titles of workouts logged this week that match no planned session.
    pub unplanned: Vec<String>,
}

impl WeekProgress {
    /// Match history to the planned sessions of `schedule`. Weeks are judged in `tz`.
    pub fn layer<Z: TimeZone>(schedule: &WeekSchedule, history: &[WorkoutSession], tz: &Z) -> Self {
        let this_week: Vec<&WorkoutSession> = history
            .iter()
            .filter(|w| w.week_start_in(tz) == schedule.week_start)
            .collect();

        let sessions: Vec<SessionProgress> = schedule
            .sessions
            .iter()
            .map(|s| SessionProgress {
                session: s.clone(),
                completed_at: this_week
                    .iter()
                    .filter(|w| w.session_template_id() == Some(s.id.as_str()))
                    .map(|w| w.completed_at())
                    .min(),
            })
            .collect();

        let unplanned = this_week
            .iter()
            .filter(|w| {
                !schedule
                    .sessions
                    .iter()
                    .any(|s| w.session_template_id() == Some(s.id.as_str()))
            })
            .map(|w| w.title().to_string())
            .collect();

        Self {
            week_start: schedule.week_start,
            variant_key: schedule.variant_key.clone(),
            completed: sessions.iter().filter(|s| s.is_done()).count(),
            total_planned: schedule.total_planned,
            sessions,
            unplanned,
        }
    }
}

//! liftplan-core: workout rotation scheduling.
//!
//! Two views over one plan:
//! - calendar-driven: `resolve_week` maps any week to a variant and its sessions
//! - session-driven: `RotationTracker` hands out the next workout and advances
//!   once per completed workout, independent of skipped days

pub mod error;
pub mod history;
pub mod plan;
pub mod repository;
pub mod rotation;
pub mod templates;
pub mod time;
pub mod week;

pub use error::PlanError;
pub use history::{CompletedSet, SessionProgress, WeekProgress, WorkoutDraft, WorkoutSession};
pub use plan::{
    inspect_rotation, parse_rotation, serialize_rotation, Cycle, PlanExercise, PlanSnapshot,
    RotationParse, SessionRef, SessionTemplate, Split, SplitSnapshot, Variant, VariantPlan,
};
pub use repository::{
    InMemoryPlanRepository, NewExercise, NewSession, NewSplit, NewVariant, PlanRepository,
    PlanTables, Planner,
};
pub use rotation::{
    advance_pointer, AdvanceOutcome, MemoryPointerStore, NextWorkout, PointerRecord,
    PointerStore, RotationPointer, RotationTracker,
};
pub use templates::SplitTemplate;
pub use time::{
    end_of_week_sunday, local_date, parse_week_date, start_of_week_monday, week_index_in_cycle,
    week_monday, week_sunday, weeks_between,
};
pub use week::{resolve_week, resolve_weeks, WeekSchedule, DEFAULT_VARIANT_KEY};

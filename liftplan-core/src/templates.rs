//! Built-in split templates offered when a user creates a plan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::repository::{NewExercise, NewSession, NewSplit, NewVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitTemplate {
    /// One variant, three full-body days, same every week.
    FullBody,
    /// Heavy week / volume week.
    UpperLower,
    /// Push-pull-legs week alternating with an upper-lower week.
    PushPullLegs,
    /// Three-week heavy / medium / light wave on the main lifts.
    Wave,
}

impl SplitTemplate {
    pub const ALL: [SplitTemplate; 4] = [
        SplitTemplate::FullBody,
        SplitTemplate::UpperLower,
        SplitTemplate::PushPullLegs,
        SplitTemplate::Wave,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            SplitTemplate::FullBody => "full-body",
            SplitTemplate::UpperLower => "upper-lower",
            SplitTemplate::PushPullLegs => "push-pull-legs",
            SplitTemplate::Wave => "wave",
        }
    }

    pub fn default_rotation(self) -> Vec<String> {
        let keys: &[&str] = match self {
            SplitTemplate::FullBody => &["A"],
            SplitTemplate::UpperLower | SplitTemplate::PushPullLegs => &["A", "B"],
            SplitTemplate::Wave => &["A", "B", "C"],
        };
        keys.iter().map(|k| k.to_string()).collect()
    }

    pub fn build(self) -> NewSplit {
        match self {
            SplitTemplate::FullBody => NewSplit::new("Full Body").variant(NewVariant::new(
                "A",
                vec![
                    full_body_day("Full Body 1", "Back Squat", "Bench Press", "Barbell Row"),
                    full_body_day("Full Body 2", "Deadlift", "Overhead Press", "Pull-up"),
                    full_body_day("Full Body 3", "Front Squat", "Incline Press", "Chin-up"),
                ],
            )),
            SplitTemplate::UpperLower => NewSplit::new("Upper / Lower")
                .variant(NewVariant::new(
                    "A",
                    vec![
                        NewSession::new("Upper Heavy", &["chest", "back", "shoulders"])
                            .exercise(NewExercise::new("Bench Press", 5, 5))
                            .exercise(NewExercise::new("Barbell Row", 5, 5)),
                        NewSession::new("Lower Heavy", &["quads", "hamstrings"])
                            .exercise(NewExercise::new("Back Squat", 5, 5))
                            .exercise(NewExercise::new("Romanian Deadlift", 3, 8)),
                    ],
                ))
                .variant(NewVariant::new(
                    "B",
                    vec![
                        NewSession::new("Upper Volume", &["chest", "back", "arms"])
                            .exercise(NewExercise::new("Incline Dumbbell Press", 4, 10))
                            .exercise(NewExercise::new("Lat Pulldown", 4, 12)),
                        NewSession::new("Lower Volume", &["quads", "glutes"])
                            .exercise(NewExercise::new("Leg Press", 4, 12))
                            .exercise(NewExercise::new("Walking Lunge", 3, 12)),
                    ],
                )),
            SplitTemplate::PushPullLegs => NewSplit::new("Push Pull Legs")
                .variant(NewVariant::new(
                    "A",
                    vec![
                        NewSession::new("Push", &["chest", "shoulders", "triceps"])
                            .exercise(NewExercise::new("Bench Press", 4, 8))
                            .exercise(NewExercise::new("Overhead Press", 3, 8)),
                        NewSession::new("Pull", &["back", "biceps"])
                            .exercise(NewExercise::new("Deadlift", 3, 5))
                            .exercise(NewExercise::new("Pull-up", 4, 8)),
                        NewSession::new("Legs", &["quads", "hamstrings", "calves"])
                            .exercise(NewExercise::new("Back Squat", 4, 8))
                            .exercise(NewExercise::new("Leg Curl", 3, 12)),
                    ],
                ))
                .variant(NewVariant::new(
                    "B",
                    vec![
                        NewSession::new("Upper", &["chest", "back"])
                            .exercise(NewExercise::new("Incline Press", 4, 10))
                            .exercise(NewExercise::new("Cable Row", 4, 10)),
                        NewSession::new("Lower", &["quads", "glutes"])
                            .exercise(NewExercise::new("Front Squat", 4, 8))
                            .exercise(NewExercise::new("Hip Thrust", 3, 10)),
                    ],
                )),
            SplitTemplate::Wave => {
                let wave = |key: &str, label: &str, sets: u32, reps: u32| {
                    NewVariant::new(
                        key,
                        ["Squat", "Bench Press", "Deadlift"]
                            .iter()
                            .map(|lift| {
                                NewSession::new(format!("{lift} ({label})"), &[])
                                    .exercise(NewExercise::new(*lift, sets, reps))
                            })
                            .collect(),
                    )
                };
                NewSplit::new("Wave")
                    .variant(wave("A", "heavy", 5, 3))
                    .variant(wave("B", "medium", 4, 6))
                    .variant(wave("C", "light", 3, 10))
            }
        }
    }
}

fn full_body_day(name: &str, lower: &str, press: &str, pull: &str) -> NewSession {
    NewSession::new(name, &["full body"])
        .exercise(NewExercise::new(lower, 3, 5))
        .exercise(NewExercise::new(press, 3, 8))
        .exercise(NewExercise::new(pull, 3, 8))
}

impl fmt::Display for SplitTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for SplitTemplate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        SplitTemplate::ALL
            .into_iter()
            .find(|t| t.slug() == wanted || (wanted == "ppl" && *t == SplitTemplate::PushPullLegs))
            .ok_or_else(|| anyhow::anyhow!("unknown split template: {s}"))
    }
}

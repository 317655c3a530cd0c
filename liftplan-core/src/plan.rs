//! Plan model: split / variant / session rows, cycles, and the assembled
//! snapshot the scheduler reads.
//!
//! Rows mirror what the storage layer keeps. `PlanSnapshot` is the immutable
//! value handed to the week resolver and the rotation tracker: variants and
//! sessions already sorted by `position`, rotation already parsed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time::week_monday;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub split_id: String,
    /// "A", "B", "C", ...; unique within the split.
    pub key: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTemplate {
    pub id: String,
    pub variant_id: String,
    pub name: String,
    pub position: i32,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
}

/// Target prescription for one exercise of a session. Not used for scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExercise {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub position: i32,
    pub target_sets: u32,
    pub target_reps: u32,
    pub target_weight_kg: Option<f64>,
}

/// Binds a split to a rotation sequence anchored at a Monday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    pub split_id: String,
    /// JSON array text, e.g. `["A","B"]`.
    pub rotation_json: String,
    pub anchor_week_start: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Cycle {
    pub fn rotation(&self) -> Vec<String> {
        parse_rotation(&self.rotation_json)
    }
}

/// Outcome of reading a stored rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationParse {
    Configured(Vec<String>),
    /// Blank text or an empty array.
    Unconfigured,
    Corrupt { raw: String, reason: String },
}

pub fn inspect_rotation(serialized: &str) -> RotationParse {
    if serialized.trim().is_empty() {
        return RotationParse::Unconfigured;
    }
    match serde_json::from_str::<Vec<String>>(serialized) {
        Ok(keys) if keys.is_empty() => RotationParse::Unconfigured,
        Ok(keys) => RotationParse::Configured(keys),
        Err(e) => RotationParse::Corrupt {
            raw: serialized.to_string(),
            reason: e.to_string(),
        },
    }
}

/// Tolerant rotation parsing: anything malformed reads as "no rotation configured".
pub fn parse_rotation(serialized: &str) -> Vec<String> {
    match inspect_rotation(serialized) {
        RotationParse::Configured(keys) => keys,
        RotationParse::Unconfigured => Vec::new(),
        RotationParse::Corrupt { raw, reason } => {
            tracing::warn!(rotation = %raw, %reason, "stored rotation is corrupt; treating as empty");
            Vec::new()
        }
    }
}

pub fn serialize_rotation(keys: &[String]) -> String {
    serde_json::to_string(keys).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    pub id: String,
    pub name: String,
}

impl SessionRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPlan {
    pub key: String,
    pub sessions: Vec<SessionRef>,
}

/// A split with its ordered variants, without any cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSnapshot {
    pub split: Split,
    #[serde(rename = "variantsInOrder")]
    pub variants: Vec<VariantPlan>,
}

impl SplitSnapshot {
    /// Assemble from storage rows. Rows of other splits are ignored; ties in
    /// `position` keep storage order.
    pub fn assemble(split: &Split, variants: &[Variant], sessions: &[SessionTemplate]) -> Self {
        let mut own: Vec<&Variant> = variants.iter().filter(|v| v.split_id == split.id).collect();
        own.sort_by_key(|v| v.position);

        let variants = own
            .into_iter()
            .map(|v| {
                let mut rows: Vec<&SessionTemplate> =
                    sessions.iter().filter(|s| s.variant_id == v.id).collect();
                rows.sort_by_key(|s| s.position);
                VariantPlan {
                    key: v.key.clone(),
                    sessions: rows
                        .into_iter()
                        .map(|s| SessionRef::new(s.id.clone(), s.name.clone()))
                        .collect(),
                }
            })
            .collect();

        Self {
            split: split.clone(),
            variants,
        }
    }
}

/// Everything the scheduler needs for one active plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub split: Split,
    pub cycle_id: Option<String>,
    pub rotation: Vec<String>,
    #[serde(rename = "anchorWeekStartISO")]
    pub anchor_week_start: NaiveDate,
    #[serde(rename = "variantsInOrder")]
    pub variants: Vec<VariantPlan>,
}

impl PlanSnapshot {
    pub fn assemble(
        split: &Split,
        variants: &[Variant],
        sessions: &[SessionTemplate],
        cycle: &Cycle,
    ) -> Self {
        let SplitSnapshot { split, variants } = SplitSnapshot::assemble(split, variants, sessions);
        Self {
            split,
            cycle_id: Some(cycle.id.clone()),
            rotation: cycle.rotation(),
            anchor_week_start: week_monday(cycle.anchor_week_start),
            variants,
        }
    }

    /// Start an ad-hoc plan with no variants and an empty rotation.
    pub fn new(split_name: impl Into<String>, anchor: NaiveDate) -> Self {
        let name = split_name.into();
        Self {
            split: Split {
                id: format!("split-{}", name.to_lowercase().replace(' ', "-")),
                name,
                created_at: Utc::now(),
            },
            cycle_id: None,
            rotation: Vec::new(),
            anchor_week_start: week_monday(anchor),
            variants: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, keys: &[&str]) -> Self {
        self.rotation = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Append a variant; session ids are derived as "<key>-<n>".
    pub fn with_variant(mut self, key: &str, session_names: &[&str]) -> Self {
        let sessions = session_names
            .iter()
            .enumerate()
            .map(|(i, name)| SessionRef::new(format!("{key}-{}", i + 1), *name))
            .collect();
        self.variants.push(VariantPlan {
            key: key.to_string(),
            sessions,
        });
        self
    }

    /// Sessions of the variant named `key`; empty when no such variant exists.
    pub fn sessions_for(&self, key: &str) -> &[SessionRef] {
        self.variants
            .iter()
            .find(|v| v.key == key)
            .map(|v| v.sessions.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> Split {
        Split {
            id: "s1".into(),
            name: "PPL".into(),
            created_at: Utc::now(),
        }
    }

    fn variant(id: &str, split_id: &str, key: &str, position: i32) -> Variant {
        Variant {
            id: id.into(),
            split_id: split_id.into(),
            key: key.into(),
            position,
        }
    }

    fn session(id: &str, variant_id: &str, name: &str, position: i32) -> SessionTemplate {
        SessionTemplate {
            id: id.into(),
            variant_id: variant_id.into(),
            name: name.into(),
            position,
            muscle_groups: vec![],
        }
    }

    #[test]
    fn parse_rotation_reads_json_array() {
        assert_eq!(parse_rotation(r#"["A","B"]"#), vec!["A", "B"]);
        assert_eq!(parse_rotation(r#"["A"]"#), vec!["A"]);
        assert_eq!(parse_rotation(r#"["A","B","C"]"#), vec!["A", "B", "C"]);
    }

    #[test]
    fn parse_rotation_fails_soft() {
        assert!(parse_rotation("").is_empty());
        assert!(parse_rotation("[]").is_empty());
        assert!(parse_rotation("not json").is_empty());
        assert!(parse_rotation(r#"{"A":1}"#).is_empty());
        assert!(parse_rotation("[1,2]").is_empty());
    }

    #[test]
    fn inspect_distinguishes_corrupt_from_unconfigured() {
        assert_eq!(inspect_rotation("  "), RotationParse::Unconfigured);
        assert_eq!(inspect_rotation("[]"), RotationParse::Unconfigured);
        assert!(matches!(inspect_rotation("[\"A\""), RotationParse::Corrupt { .. }));
        assert_eq!(
            inspect_rotation(r#"["B","A"]"#),
            RotationParse::Configured(vec!["B".into(), "A".into()])
        );
    }

    #[test]
    fn serialize_rotation_is_json_text() {
        let keys = vec!["A".to_string(), "B".to_string()];
        assert_eq!(serialize_rotation(&keys), r#"["A","B"]"#);
        assert_eq!(parse_rotation(&serialize_rotation(&keys)), keys);
    }

    #[test]
    fn assemble_orders_by_position() {
        let variants = vec![
            variant("vb", "s1", "B", 1),
            variant("va", "s1", "A", 0),
            variant("vx", "other", "A", 0),
        ];
        let sessions = vec![
            session("p3", "va", "Legs", 2),
            session("p1", "va", "Push", 0),
            session("p2", "va", "Pull", 1),
            session("u1", "vb", "Upper", 0),
            session("x1", "vx", "Other", 0),
        ];
        let cycle = Cycle {
            id: "c1".into(),
            split_id: "s1".into(),
            rotation_json: r#"["A","B"]"#.into(),
            // Wednesday; the snapshot normalizes to Monday.
            anchor_week_start: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            active: true,
            created_at: Utc::now(),
        };

        let plan = PlanSnapshot::assemble(&split(), &variants, &sessions, &cycle);
        let keys: Vec<&str> = plan.variants.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        let a: Vec<&str> = plan.sessions_for("A").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(a, vec!["Push", "Pull", "Legs"]);
        assert_eq!(plan.rotation, vec!["A", "B"]);
        assert_eq!(plan.anchor_week_start, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(plan.cycle_id.as_deref(), Some("c1"));
        assert!(plan.sessions_for("C").is_empty());
    }

    #[test]
    fn snapshot_wire_shape() {
        let plan = PlanSnapshot::new("Upper Lower", NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
            .with_rotation(&["A", "B"])
            .with_variant("A", &["Upper"])
            .with_variant("B", &["Lower"]);
        let v = serde_json::to_value(&plan).unwrap();
        assert_eq!(v["anchorWeekStartISO"], "2025-01-06");
        assert_eq!(v["rotation"][1], "B");
        assert_eq!(v["variantsInOrder"][0]["sessions"][0]["id"], "A-1");
        assert_eq!(v["variantsInOrder"][1]["sessions"][0]["name"], "Lower");
    }
}

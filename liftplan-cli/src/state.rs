use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use liftplan_core::{
    Cycle, NewSplit, PlanError, PlanRepository, PlanSnapshot, PlanTables, PointerRecord,
    PointerStore, SplitSnapshot, WorkoutSession,
};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub fn liftplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("LIFTPLAN_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".liftplan"))
}

pub fn ensure_liftplan_home() -> Result<PathBuf> {
    let dir = liftplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn plan_path(home: &Path) -> PathBuf {
    home.join("plan.json")
}

pub fn pointer_path(home: &Path) -> PathBuf {
    home.join("pointer.json")
}

pub fn history_path(home: &Path) -> PathBuf {
    home.join("history.jsonl")
}

/// Plan rows kept as one JSON document; read on every call, written after every change.
#[derive(Debug, Clone)]
pub struct FilePlanRepository {
    path: PathBuf,
}

impl FilePlanRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<PlanTables> {
        if !self.path.exists() {
            return Ok(PlanTables::default());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", self.path.display()))
    }

    /// Planned exercise id for a logged set, if the session has one by that name.
    pub fn exercise_id(&self, session_id: &str, name: &str) -> Result<Option<String>> {
        Ok(self.load()?.exercise_id(session_id, name).map(str::to_string))
    }

    fn save(&self, tables: &PlanTables) -> Result<()> {
        let json = serde_json::to_string_pretty(tables)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

impl PlanRepository for FilePlanRepository {
    fn active_plan(&self) -> Result<Option<PlanSnapshot>> {
        Ok(self.load()?.active_plan())
    }

    fn split_if_exists(&self) -> Result<Option<SplitSnapshot>> {
        Ok(self.load()?.latest_split())
    }

    fn create_split(&mut self, split: NewSplit) -> Result<SplitSnapshot> {
        let mut tables = self.load()?;
        let snapshot = tables.insert_split(split, Utc::now())?;
        self.save(&tables)?;
        Ok(snapshot)
    }

    fn create_or_update_cycle(
        &mut self,
        split_id: &str,
        rotation: &[String],
        anchor_week_start: NaiveDate,
    ) -> Result<Cycle> {
        let mut tables = self.load()?;
        let cycle = tables.upsert_cycle(split_id, rotation, anchor_week_start, Utc::now())?;
        self.save(&tables)?;
        Ok(cycle)
    }

    fn delete_split(&mut self, split_id: &str) -> Result<()> {
        let mut tables = self.load()?;
        if !tables.delete_split(split_id) {
            return Err(PlanError::SplitNotFound(split_id.to_string()).into());
        }
        self.save(&tables)
    }

    fn reset_plan(&mut self) -> Result<()> {
        let mut tables = self.load()?;
        tables.clear();
        self.save(&tables)
    }
}

/// Rotation pointer in its own small JSON file; no file means uninitialized.
#[derive(Debug, Clone)]
pub struct FilePointerStore {
    path: PathBuf,
}

impl FilePointerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PointerStore for FilePointerStore {
    fn get(&self) -> Result<Option<PointerRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let record: Option<PointerRecord> = serde_json::from_str(&s)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(record)
    }

    fn set(&mut self, record: &PointerRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// Append-only log of completed workouts, one JSON object per line.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, workout: &WorkoutSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        writeln!(f, "{}", serde_json::to_string(workout)?)?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<WorkoutSession>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let f = fs::File::open(&self.path).with_context(|| format!("open {}", self.path.display()))?;
        let mut rows = Vec::new();
        for (n, line) in BufReader::new(f).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WorkoutSession>(&line) {
                Ok(w) => rows.push(w),
                Err(e) => tracing::warn!(line = n + 1, error = %e, "skipping unreadable history entry"),
            }
        }
        Ok(rows)
    }

    pub fn contains(&self, workout_id: &str) -> Result<bool> {
        Ok(self.read_all()?.iter().any(|w| w.id() == workout_id))
    }
}

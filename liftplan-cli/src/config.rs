use anyhow::{Context, Result};
use chrono_tz::Tz;
use liftplan_core::SplitTemplate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleSection {
    /// IANA zone used to decide which week a workout falls in.
    pub timezone: String,
    /// Template used by `liftplan init` when none is given.
    pub default_template: SplitTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSection {
    /// Filter directive when neither -v nor RUST_LOG is set.
    pub level: String,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            default_template: SplitTemplate::PushPullLegs,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.schedule
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone in config: {}", self.schedule.timezone))
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn load_config(home: &Path) -> Result<Config> {
    let p = config_path(home);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    cfg.timezone()?;
    Ok(cfg)
}

pub fn save_config(home: &Path, cfg: &Config) -> Result<()> {
    let p = config_path(home);
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(home: &Path) -> Result<()> {
    let p = config_path(home);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(home, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn empty_file_matches_section_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.schedule, ScheduleSection::default());
        assert_eq!(cfg.log.level, "warn");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            config_path(dir.path()),
            "[schedule]\ntimezone = \"Europe/Berlin\"\ndefault_template = \"wave\"\n",
        )
        .unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.schedule.default_template, SplitTemplate::Wave);
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(cfg.log.level, "warn");
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            config_path(dir.path()),
            "[schedule]\ntimezone = \"Nowhere/Land\"\ndefault_template = \"full-body\"\n",
        )
        .unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn init_writes_once() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path()).unwrap();
        let written = fs::read_to_string(config_path(dir.path())).unwrap();
        assert!(written.contains("push-pull-legs"));
        init_config(dir.path()).unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), Config::default());
    }
}

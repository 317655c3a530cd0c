use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand};
use liftplan_core::{
    local_date, parse_week_date, resolve_weeks, AdvanceOutcome, PlanRepository, Planner,
    SplitTemplate, WeekProgress, WorkoutDraft,
};
use tracing_subscriber::EnvFilter;

mod config;
mod state;

use state::{FilePlanRepository, FilePointerStore, HistoryLog};

#[derive(Parser, Debug)]
#[command(name = "liftplan", version, about = "Workout rotation planner")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a split from a template and activate its default rotation
    Init {
        /// full-body | upper-lower | push-pull-legs | wave (default from config)
        #[arg(long)]
        template: Option<SplitTemplate>,

        /// Override the rotation, e.g. "A,B"
        #[arg(long)]
        rotation: Option<String>,

        /// Week the rotation starts counting from (default: this week)
        #[arg(long)]
        anchor: Option<String>,

        /// Replace an existing plan
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Change the rotation and/or anchor week of the current split
    Cycle {
        /// Variant keys in order, e.g. "A,B,C"
        #[arg(long)]
        rotation: String,

        /// Anchor week (any date in it; default: this week)
        #[arg(long)]
        anchor: Option<String>,
    },

    /// Show the variant and sessions scheduled for a week
    Week {
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Number of consecutive weeks to show
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Show the next workout in the rotation
    Next,

    /// Log the next workout as done and advance the rotation
    Complete {
        /// Workout id; re-running with the same id does not advance twice
        #[arg(long)]
        id: Option<String>,

        /// Title override (default: session name)
        #[arg(long)]
        title: Option<String>,

        /// Logged set as "<exercise>:<kg>x<reps>", repeatable
        #[arg(long = "set")]
        sets: Vec<String>,
    },

    /// List completed workouts
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Delete the plan (or only the rotation pointer)
    Reset {
        #[arg(long, default_value_t = false)]
        pointer_only: bool,
    },

    /// List built-in split templates
    Templates,

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.liftplan/config.toml with defaults
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let home = state::ensure_liftplan_home()?;
    let cfg = config::load_config(&home)?;
    init_logging(cli.verbose, &cfg.log.level);
    tracing::debug!(home = %home.display(), "liftplan started");

    let mut planner = Planner::new(
        FilePlanRepository::new(state::plan_path(&home)),
        FilePointerStore::new(state::pointer_path(&home)),
    );
    let history = HistoryLog::new(state::history_path(&home));
    let today = local_date(Utc::now(), &cfg.schedule.timezone)?;

    match cli.command {
        Command::Init {
            template,
            rotation,
            anchor,
            force,
        } => {
            if planner.repo().split_if_exists()?.is_some() {
                if !force {
                    bail!("a plan already exists; pass --force to replace it or run `liftplan reset`");
                }
                planner.reset_plan()?;
            }
            let template = template.unwrap_or(cfg.schedule.default_template);
            let rotation = match rotation {
                Some(r) => parse_rotation_arg(&r)?,
                None => template.default_rotation(),
            };
            let anchor = resolve_date(anchor.as_deref(), today)?;

            let split = planner.create_split(template.build())?;
            let cycle = planner.set_cycle(&split.split.id, &rotation, anchor)?;
            println!(
                "Created '{}' ({}), rotation {} from week of {}",
                split.split.name,
                template,
                rotation.join("/"),
                cycle.anchor_week_start
            );
        }

        Command::Cycle { rotation, anchor } => {
            let split = planner
                .repo()
                .split_if_exists()?
                .context("no split yet. Run: liftplan init")?;
            let rotation = parse_rotation_arg(&rotation)?;
            let anchor = resolve_date(anchor.as_deref(), today)?;
            let cycle = planner.set_cycle(&split.split.id, &rotation, anchor)?;
            println!(
                "Rotation {} active from week of {}",
                rotation.join("/"),
                cycle.anchor_week_start
            );
        }

        Command::Week { date, count } => {
            let Some(plan) = planner.active_plan()? else {
                println!("No active plan. Run: liftplan init");
                return Ok(());
            };
            let from = resolve_date(date.as_deref(), today)?;
            let tz = cfg.timezone()?;
            let logged = history.read_all()?;

            for week in resolve_weeks(&plan, from, count.max(1)) {
                let progress = WeekProgress::layer(&week, &logged, &tz);
                println!(
                    "Week of {} | variant {} | {}/{} done",
                    progress.week_start, progress.variant_key, progress.completed, progress.total_planned
                );
                for s in &progress.sessions {
                    let mark = if s.is_done() { "x" } else { " " };
                    println!("  [{}] {}", mark, s.session.name);
                }
                for title in &progress.unplanned {
                    println!("  [+] {} (unplanned)", title);
                }
            }
        }

        Command::Next => match planner.next_workout()? {
            Some(next) => println!(
                "Next: {} (variant {}, pointer {}/{})",
                next.session_name,
                next.variant_key,
                next.variant_index,
                next.session_index
            ),
            None => println!("No next workout. Set up a plan with: liftplan init"),
        },

        Command::Complete { id, title, sets } => {
            complete(&mut planner, &history, id, title, &sets)?;
        }

        Command::History { limit } => {
            let rows = history.read_all()?;
            if rows.is_empty() {
                println!("No workouts logged at {}", state::history_path(&home).display());
            }
            for w in rows.iter().rev().take(limit) {
                println!(
                    "{} | {} | sets={} reps={} volume={:.1}kg",
                    w.completed_at().format("%Y-%m-%d %H:%M"),
                    w.title(),
                    w.total_sets(),
                    w.total_reps(),
                    w.total_volume_kg()
                );
            }
        }

        Command::Reset { pointer_only } => {
            if pointer_only {
                planner.reset_pointer()?;
                println!("Rotation pointer cleared");
            } else {
                planner.reset_plan()?;
                println!("Plan and rotation pointer cleared (history kept)");
            }
        }

        Command::Templates => {
            for t in SplitTemplate::ALL {
                let split = t.build();
                let variants: Vec<String> = split
                    .variants
                    .iter()
                    .map(|v| {
                        let names: Vec<&str> = v.sessions.iter().map(|s| s.name.as_str()).collect();
                        format!("{}=[{}]", v.key, names.join(", "))
                    })
                    .collect();
                println!(
                    "{:<15} rotation {:<6} {}",
                    t.slug(),
                    t.default_rotation().join("/"),
                    variants.join(" ")
                );
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(&home)?,
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                println!("# file: {}", config::config_path(&home).display());
            }
        },
    }

    Ok(())
}

fn init_logging(verbose: u8, default_level: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .init();
}

fn complete(
    planner: &mut Planner<FilePlanRepository, FilePointerStore>,
    history: &HistoryLog,
    id: Option<String>,
    title: Option<String>,
    sets: &[String],
) -> Result<AdvanceOutcome> {
    let plan = planner
        .active_plan()?
        .context("no active plan. Run: liftplan init")?;

    let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    // The pointer only remembers the last token, so history decides for older ids.
    if history.contains(&id)? {
        tracing::info!(workout_id = %id, "workout already logged; not advancing");
        println!("Workout {} was already counted; rotation unchanged", id);
        return Ok(AdvanceOutcome::AlreadyApplied(planner.tracker_mut().pointer()?));
    }

    let next = planner
        .next_workout()?
        .context("nothing scheduled: the current variant has no sessions")?;

    let now = Utc::now();
    let mut draft = WorkoutDraft::new(&id, title.unwrap_or_else(|| next.session_name.clone()), now)
        .linked_to(plan.cycle_id.clone(), Some(next.session_id.clone()));
    for raw in sets {
        let (exercise, kg, reps) = parse_set_arg(raw)?;
        let exercise_id = planner.repo().exercise_id(&next.session_id, &exercise)?;
        draft = draft.add_exercise_set(exercise_id.as_deref(), &exercise, kg, reps);
    }
    let workout = draft.complete(now);
    history.append(&workout)?;

    let outcome = planner.complete_workout(&workout)?;
    match &outcome {
        AdvanceOutcome::Advanced(_) => {
            println!("Logged '{}' ({} sets)", workout.title(), workout.total_sets());
            if let Some(after) = planner.next_workout()? {
                println!("Up next: {} (variant {})", after.session_name, after.variant_key);
            }
        }
        AdvanceOutcome::AlreadyApplied(_) => {
            println!("Workout {} was already counted; rotation unchanged", id);
        }
        AdvanceOutcome::NoRotation => println!("No rotation configured; nothing to advance"),
    }
    Ok(outcome)
}

fn resolve_date(arg: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match arg {
        Some(s) => parse_week_date(s),
        None => Ok(today),
    }
}

/// "A,B" / "A B" / "a/b" -> ["A", "B"]
fn parse_rotation_arg(s: &str) -> Result<Vec<String>> {
    let keys: Vec<String> = s
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|k| !k.is_empty())
        .map(|k| k.to_uppercase())
        .collect();
    if keys.is_empty() {
        bail!("rotation is empty (expected something like \"A,B\")");
    }
    Ok(keys)
}

/// "Bench Press:60x5" -> ("Bench Press", 60.0, 5)
fn parse_set_arg(s: &str) -> Result<(String, f64, u32)> {
    let (name, load) = s
        .rsplit_once(':')
        .with_context(|| format!("invalid set '{s}' (expected <exercise>:<kg>x<reps>)"))?;
    let (kg, reps) = load
        .split_once(['x', 'X'])
        .with_context(|| format!("invalid set '{s}' (expected <kg>x<reps>)"))?;
    let kg: f64 = kg.trim().parse().with_context(|| format!("invalid weight in '{s}'"))?;
    let reps: u32 = reps.trim().parse().with_context(|| format!("invalid reps in '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid set '{s}': missing exercise name");
    }
    Ok((name.to_string(), kg, reps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftplan_core::RotationPointer;
    use std::path::Path;
    use tempfile::TempDir;

    fn file_planner(home: &Path) -> Planner<FilePlanRepository, FilePointerStore> {
        let mut planner = Planner::new(
            FilePlanRepository::new(state::plan_path(home)),
            FilePointerStore::new(state::pointer_path(home)),
        );
        let split = planner.create_split(SplitTemplate::PushPullLegs.build()).unwrap();
        planner
            .set_cycle(
                &split.split.id,
                &["A".to_string(), "B".to_string()],
                NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            )
            .unwrap();
        planner
    }

    #[test]
    fn completing_an_older_logged_id_does_not_advance() {
        let dir = TempDir::new().unwrap();
        let mut planner = file_planner(dir.path());
        let history = HistoryLog::new(state::history_path(dir.path()));

        complete(&mut planner, &history, Some("w1".into()), None, &[]).unwrap();
        complete(&mut planner, &history, Some("w2".into()), None, &[]).unwrap();
        let after_w2 = planner.tracker_mut().pointer().unwrap();
        assert_eq!(after_w2, RotationPointer::new(0, 1));

        // w1 is no longer the pointer's last token; history still knows it.
        let outcome = complete(&mut planner, &history, Some("w1".into()), None, &[]).unwrap();
        assert_eq!(outcome, AdvanceOutcome::AlreadyApplied(after_w2));
        assert_eq!(planner.tracker_mut().pointer().unwrap(), after_w2);
        assert_eq!(history.read_all().unwrap().len(), 2);
    }

    #[test]
    fn completed_sets_link_to_planned_exercises() {
        let dir = TempDir::new().unwrap();
        let mut planner = file_planner(dir.path());
        let history = HistoryLog::new(state::history_path(dir.path()));

        let sets = ["bench press:60x5".to_string(), "Curl:10x12".to_string()];
        complete(&mut planner, &history, Some("w1".into()), None, &sets).unwrap();

        let logged = history.read_all().unwrap();
        let w = &logged[0];
        assert_eq!(w.title(), "Push");
        assert!(w.sets()[0].exercise_id.is_some());
        assert_eq!(w.sets()[1].exercise_id, None);
    }

    #[test]
    fn rotation_arg_forms() {
        assert_eq!(parse_rotation_arg("A,B").unwrap(), vec!["A", "B"]);
        assert_eq!(parse_rotation_arg("a / b / c").unwrap(), vec!["A", "B", "C"]);
        assert!(parse_rotation_arg(" , ").is_err());
    }

    #[test]
    fn set_arg_forms() {
        assert_eq!(parse_set_arg("Bench Press:60x5").unwrap(), ("Bench Press".to_string(), 60.0, 5));
        assert_eq!(parse_set_arg("Pull-up:0X12").unwrap(), ("Pull-up".to_string(), 0.0, 12));
        assert!(parse_set_arg("Bench 60x5").is_err());
        assert!(parse_set_arg(":60x5").is_err());
        assert!(parse_set_arg("Bench:sixtyx5").is_err());
    }

    #[test]
    fn cli_parses_complete_with_sets() {
        let cli = Cli::parse_from([
            "liftplan", "-vv", "complete", "--id", "w1", "--set", "Squat:100x5", "--set", "Squat:100x5",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Complete { id, sets, .. } => {
                assert_eq!(id.as_deref(), Some("w1"));
                assert_eq!(sets.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

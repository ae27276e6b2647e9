//! Subcommand handlers
//!
//! Each handler returns the text to print so the dispatch can be tested
//! without capturing stdout.

use crate::cli::DEFAULT_DATA_FILE;
use crate::items_file::{read_items, ItemsFile, NoGenerator};
use anyhow::{bail, Context};
use clap::ArgMatches;
use roadmap_core::{GenerationRequest, PlannerConfig, RoadmapGenerator, RoadmapPlanner};
use roadmap_model::sort_for_display;
use roadmap_phases::PhaseGenerator;
use roadmap_resilience::AbortSignal;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve config from `--config` and `--data`
pub(crate) fn load_config(matches: &ArgMatches) -> anyhow::Result<PlannerConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PlannerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(data) = matches.get_one::<PathBuf>("data") {
        config = config.with_data_file(data);
    } else if config.data_file.is_none() {
        config = config.with_data_file(DEFAULT_DATA_FILE);
    }
    Ok(config)
}

pub(crate) async fn run(matches: &ArgMatches, config: PlannerConfig) -> anyhow::Result<String> {
    let Some((name, args)) = matches.subcommand() else {
        bail!("no command given");
    };

    if name == "phases" {
        return phases(args, &config);
    }

    let generator: Arc<dyn RoadmapGenerator> = match args.try_get_one::<PathBuf>("items") {
        Ok(Some(path)) => Arc::new(ItemsFile::new(path)),
        _ => Arc::new(NoGenerator),
    };
    let planner = RoadmapPlanner::from_config(config, generator);
    planner.init()?;

    let output = match name {
        "plan" => plan(&planner, args).await,
        "resume" => {
            let id = required(args, "id")?;
            let signal = abort_on_ctrl_c();
            let roadmap = planner.resume(id, &signal).await?;
            Ok(serde_json::to_string_pretty(&roadmap)?)
        }
        "pause" => {
            let roadmap = planner.pause(required(args, "id")?)?;
            Ok(format!("Paused {}", roadmap.id))
        }
        "list" => list(&planner, args.get_flag("json")),
        "show" => {
            let id = required(args, "id")?;
            let roadmap = planner
                .repository()
                .get(id)
                .with_context(|| format!("roadmap not found: {id}"))?;
            Ok(serde_json::to_string_pretty(&roadmap)?)
        }
        "stats" => Ok(serde_json::to_string_pretty(&planner.repository().get_stats())?),
        "export" => export(&planner, args.get_one::<PathBuf>("out")),
        "import" => import(&planner, args),
        "delete" => {
            let id = required(args, "id")?;
            if !planner.repository().delete(id) {
                bail!("roadmap not found: {id}");
            }
            Ok(format!("Deleted {id}"))
        }
        "reset" => {
            planner.repository().reset()?;
            Ok("Reset user scope".to_string())
        }
        other => bail!("unknown command: {other}"),
    };

    planner.dispose();
    output
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing argument: {id}"))
}

fn phases(args: &ArgMatches, config: &PlannerConfig) -> anyhow::Result<String> {
    let input = args.get_one::<PathBuf>("input").context("missing --input")?;
    let items = read_items(input).with_context(|| format!("reading {}", input.display()))?;

    let mut options = config.phase;
    if let Some(max) = args.get_one::<usize>("max-items") {
        options = options.with_max_items(*max);
    }
    if let Some(preferred) = args.get_one::<i64>("preferred") {
        options = options.with_preferred_difficulty(*preferred);
    }
    if let Some(limit) = args.get_one::<f64>("time-constraint") {
        options = options.with_time_constraint(*limit);
    }

    let phases = PhaseGenerator::new(options).generate(&items);
    Ok(serde_json::to_string_pretty(&phases)?)
}

async fn plan(planner: &RoadmapPlanner, args: &ArgMatches) -> anyhow::Result<String> {
    let mut request = GenerationRequest::new(
        required(args, "title")?,
        required(args, "objective")?,
        required(args, "goal")?,
    );
    for constraint in args.get_many::<String>("constraint").into_iter().flatten() {
        request = request.with_constraint(constraint);
    }

    let signal = abort_on_ctrl_c();
    let roadmap = planner.plan(request, &signal).await?;
    Ok(serde_json::to_string_pretty(&roadmap)?)
}

fn list(planner: &RoadmapPlanner, json: bool) -> anyhow::Result<String> {
    let mut roadmaps = planner.repository().get_all();
    sort_for_display(&mut roadmaps);
    if json {
        return Ok(serde_json::to_string_pretty(&roadmaps)?);
    }

    let mut out = String::new();
    for roadmap in &roadmaps {
        let star = if roadmap.favorite { '*' } else { ' ' };
        writeln!(
            out,
            "{star} {}  {:<11}  {:>2} phases  {}",
            roadmap.id,
            roadmap.generation_state,
            roadmap.phases.len(),
            roadmap.title
        )?;
    }
    Ok(out.trim_end().to_string())
}

/// Import is a destructive replace, so existing roadmaps need `--yes`
fn import(planner: &RoadmapPlanner, args: &ArgMatches) -> anyhow::Result<String> {
    let path = args
        .get_one::<PathBuf>("file")
        .context("missing snapshot file")?;
    let stored = planner.repository().get_all().len();
    if stored > 0 && !args.get_flag("yes") {
        bail!(
            "import would replace {stored} stored roadmaps; re-run with --yes to confirm"
        );
    }

    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let count = planner.backup().import_json(&raw)?;
    Ok(format!("Imported {count} roadmaps, replacing {stored}"))
}

fn export(planner: &RoadmapPlanner, out: Option<&PathBuf>) -> anyhow::Result<String> {
    let snapshot = planner.backup().export();
    let raw = serde_json::to_string_pretty(&snapshot)?;
    match out {
        Some(path) => {
            std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
            Ok(format!(
                "Exported {} roadmaps to {} (backup key {})",
                snapshot.roadmaps.len(),
                path.display(),
                snapshot.backup_key
            ))
        }
        None => Ok(raw),
    }
}

/// Signal that fires on Ctrl-C
fn abort_on_ctrl_c() -> AbortSignal {
    let signal = AbortSignal::new();
    let handle = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current attempt");
            handle.abort();
        }
    });
    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;
    use pretty_assertions::assert_eq;
    use roadmap_model::{GenerationState, RoadmapDocument};
    use std::path::Path;

    async fn exec(data: &Path, argv: &[&str]) -> anyhow::Result<String> {
        let data = data.to_string_lossy().into_owned();
        let mut full = vec!["roadmap", "--data", data.as_str()];
        full.extend_from_slice(argv);
        let matches = cli::build().try_get_matches_from(full)?;
        let config = load_config(&matches)?;
        run(&matches, config).await
    }

    fn write_items(dir: &Path) -> PathBuf {
        let path = dir.join("items.json");
        let items = roadmap_test_utils::sample_items();
        std::fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();
        path
    }

    #[test]
    fn data_flag_overrides_default() {
        let matches = cli::build()
            .try_get_matches_from(["roadmap", "stats"])
            .unwrap();
        assert_eq!(
            load_config(&matches).unwrap().data_file,
            Some(PathBuf::from(DEFAULT_DATA_FILE))
        );

        let matches = cli::build()
            .try_get_matches_from(["roadmap", "--data", "mine.json", "stats"])
            .unwrap();
        assert_eq!(
            load_config(&matches).unwrap().data_file,
            Some(PathBuf::from("mine.json"))
        );
    }

    #[tokio::test]
    async fn phases_prints_grouping() {
        let dir = tempfile::tempdir().unwrap();
        let items = write_items(dir.path());
        let data = dir.path().join("data.json");

        let out = exec(&data, &["phases", "--input", items.to_str().unwrap(), "--max-items", "1"])
            .await
            .unwrap();
        let phases: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(phases.as_array().map(Vec::len), Some(6));
        assert_eq!(phases[0]["type"], "foundation");
    }

    #[tokio::test]
    async fn plan_list_show_delete() {
        let dir = tempfile::tempdir().unwrap();
        let items = write_items(dir.path());
        let data = dir.path().join("data.json");

        let out = exec(
            &data,
            &[
                "plan", "--title", "Rust", "--objective", "learn rust", "--goal", "ship",
                "--items", items.to_str().unwrap(),
            ],
        )
        .await
        .unwrap();
        let roadmap: RoadmapDocument = serde_json::from_str(&out).unwrap();
        assert_eq!(roadmap.generation_state, GenerationState::Completed);
        assert_eq!(roadmap.phases.len(), 4);

        let listing = exec(&data, &["list"]).await.unwrap();
        assert!(listing.contains(&roadmap.id));
        assert!(listing.contains("completed"));

        let shown = exec(&data, &["show", roadmap.id.as_str()]).await.unwrap();
        let shown: RoadmapDocument = serde_json::from_str(&shown).unwrap();
        assert_eq!(shown.id, roadmap.id);

        exec(&data, &["delete", roadmap.id.as_str()]).await.unwrap();
        assert!(exec(&data, &["delete", roadmap.id.as_str()]).await.is_err());
        assert_eq!(exec(&data, &["list"]).await.unwrap(), "");
    }

    #[tokio::test]
    async fn export_then_import_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let items = write_items(dir.path());
        let data = dir.path().join("a.json");
        let other = dir.path().join("b.json");
        let snapshot = dir.path().join("backup.json");

        exec(
            &data,
            &[
                "plan", "--title", "Rust", "--objective", "o", "--goal", "g",
                "--items", items.to_str().unwrap(),
            ],
        )
        .await
        .unwrap();
        exec(&data, &["export", "--out", snapshot.to_str().unwrap()]).await.unwrap();

        let out = exec(&other, &["import", snapshot.to_str().unwrap()]).await.unwrap();
        assert_eq!(out, "Imported 1 roadmaps, replacing 0");

        let stats: serde_json::Value =
            serde_json::from_str(&exec(&other, &["stats"]).await.unwrap()).unwrap();
        assert_eq!(stats["roadmapCount"], 1);
        assert_eq!(stats["completedRoadmaps"], 1);
    }

    #[tokio::test]
    async fn import_over_existing_roadmaps_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let items = write_items(dir.path());
        let data = dir.path().join("data.json");
        let snapshot = dir.path().join("backup.json");
        let plan = [
            "plan", "--title", "Rust", "--objective", "o", "--goal", "g",
            "--items", items.to_str().unwrap(),
        ];

        exec(&data, &plan).await.unwrap();
        exec(&data, &["export", "--out", snapshot.to_str().unwrap()]).await.unwrap();
        exec(&data, &plan).await.unwrap();

        let err = exec(&data, &["import", snapshot.to_str().unwrap()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("replace 2 stored roadmaps"));
        let listing = exec(&data, &["list", "--json"]).await.unwrap();
        let stored: serde_json::Value = serde_json::from_str(&listing).unwrap();
        assert_eq!(stored.as_array().map(Vec::len), Some(2));

        let out = exec(&data, &["import", snapshot.to_str().unwrap(), "--yes"])
            .await
            .unwrap();
        assert_eq!(out, "Imported 1 roadmaps, replacing 2");
        let listing = exec(&data, &["list", "--json"]).await.unwrap();
        let stored: serde_json::Value = serde_json::from_str(&listing).unwrap();
        assert_eq!(stored.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn reset_forgets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let items = write_items(dir.path());
        let data = dir.path().join("data.json");

        exec(
            &data,
            &[
                "plan", "--title", "Rust", "--objective", "o", "--goal", "g",
                "--items", items.to_str().unwrap(),
            ],
        )
        .await
        .unwrap();
        assert_eq!(exec(&data, &["reset"]).await.unwrap(), "Reset user scope");
        assert_eq!(exec(&data, &["list"]).await.unwrap(), "");
    }

    #[tokio::test]
    async fn pause_unknown_roadmap_fails() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        assert!(exec(&data, &["pause", "missing"]).await.is_err());
    }
}

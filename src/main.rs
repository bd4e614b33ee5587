//! ClickUp Insights - task and workload dashboard for ClickUp spaces
//!
//! A CLI and HTTP server that walks a ClickUp space, counts its tasks
//! and assignee workload, and writes Markdown reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, ClickUp API, incomplete data, report store, etc.)

mod analysis;
mod cli;
mod clickup;
mod config;
mod llm;
mod models;
mod report;
mod server;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, Command};
use clickup::{ClickUpClient, TaskQuery};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use report::{ReportComposer, ReportInput, ReportStore};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if args.command == Command::InitConfig {
        return handle_init_config();
    }

    // Load configuration before logging so the file can turn on verbose output
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = init_logging(args.log_level(config.general.verbose)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("ClickUp Insights v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Command: {:?}", args.command);

    if let Err(e) = run(args, config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .clickup-insights.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the API endpoints, model, and report directory.");
    Ok(())
}

/// Initialize logging at `level`. `RUST_LOG` wins when set.
fn init_logging(level: tracing::Level) -> Result<()> {
    let level = LevelFilter::from_level(level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

async fn run(args: Args, mut config: Config) -> Result<()> {
    match &args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            println!(
                "🌐 Serving dashboard on http://{}:{}",
                config.server.host, config.server.port
            );
            server::serve(config).await
        }
        Command::Teams => {
            let client = clickup_client(&config)?;
            let teams = client.get_teams().await?;
            if teams.is_empty() {
                println!("No teams visible to this token.");
            }
            for team in teams {
                println!("{}\t{}", team.id, team.name);
            }
            Ok(())
        }
        Command::Spaces { team } => {
            let client = clickup_client(&config)?;
            let spaces = client.get_spaces(team).await?;
            if spaces.is_empty() {
                println!("No spaces in team {}.", team);
            }
            for space in spaces {
                println!("{}\t{}", space.id, space.name);
            }
            Ok(())
        }
        Command::Stats { space, days_back } => {
            let days_back = days_back.unwrap_or(config.dashboard.default_days_back);
            run_stats(&config, space, days_back, args.quiet).await
        }
        Command::Report {
            space,
            days_back,
            output,
        } => run_report(&config, space, *days_back, output.as_deref(), args.quiet).await,
        Command::InitConfig => handle_init_config(),
    }
}

/// Print task statistics for a space. Partial statistics are printed before failing.
async fn run_stats(config: &Config, space_id: &str, days_back: u32, quiet: bool) -> Result<()> {
    let client = clickup_client(config)?;
    let query = TaskQuery::days_back(Some(days_back), Utc::now());

    let start_time = Instant::now();
    let progress = spinner(quiet, format!("Counting tasks in space {}...", space_id));
    let result =
        analysis::count_tasks_in_space(&client, space_id, &query, config.general.concurrency)
            .await;
    progress.finish_and_clear();
    debug!("Walk took {:.1}s", start_time.elapsed().as_secs_f64());

    match result {
        Ok(stats) => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Err(incomplete) => {
            println!("{}", serde_json::to_string_pretty(&incomplete.partial)?);
            Err(anyhow::Error::new(incomplete.source)).context("Task statistics are incomplete")
        }
    }
}

/// Compose a report for a space and write it to `output` or the report store.
async fn run_report(
    config: &Config,
    space_id: &str,
    days_back: Option<u32>,
    output: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let client = clickup_client(config)?;
    let space = client
        .get_space(space_id)
        .await
        .with_context(|| format!("Failed to load space {}", space_id))?;
    let query = TaskQuery::days_back(days_back, Utc::now());

    let progress = spinner(quiet, format!("Analyzing space \"{}\"...", space.name));
    let result =
        analysis::analyze_space(&client, space_id, &query, config.general.concurrency).await;
    progress.finish_and_clear();

    let analysis = result
        .map_err(|incomplete| anyhow::Error::new(incomplete.source))
        .with_context(|| format!("Failed to analyze space {}", space_id))?;

    let composer = ReportComposer::new(
        &config.llm,
        config.llm.api_key.as_deref(),
        config.report.max_lists_per_assignee,
    );
    if composer.is_delegating() {
        println!("🤖 Writing report with {}", config.llm.model);
    }

    let input = ReportInput::new(space.name, analysis.stats, analysis.assignees);
    let progress = spinner(quiet, "Composing report...".to_string());
    let report = composer.compose(&input).await;
    progress.finish_and_clear();

    let saved_to = match output {
        Some(path) => {
            std::fs::write(path, &report.content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            path.display().to_string()
        }
        None => {
            let store = ReportStore::new(&config.report.output_dir);
            let filename = store.save(space_id, &report.content, input.generated_at)?;
            store.dir().join(filename).display().to_string()
        }
    };

    if report.mode == report::ReportMode::Fallback {
        warn!("LLM report failed; the built-in template was used");
    }

    println!("\n📊 Report Summary:");
    println!("   Space: {}", input.space_name);
    println!("   Total tasks: {}", input.stats.total_tasks);
    println!("   Assignees: {}", input.assignees.len());
    println!("   Mode: {}", report.mode);
    println!("\n✅ Report saved to: {}", saved_to);
    Ok(())
}

/// Build a ClickUp client from the configured token.
fn clickup_client(config: &Config) -> Result<ClickUpClient> {
    let token = config
        .clickup
        .api_token
        .as_deref()
        .context("No ClickUp API token. Pass --token or set CLICKUP_API_TOKEN")?;

    let client = ClickUpClient::new(
        &config.clickup.api_url,
        token,
        Duration::from_secs(config.clickup.timeout_seconds),
    )?;
    Ok(client)
}

/// Spinner on stderr, hidden in quiet mode.
fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Load configuration from file or use defaults, with the path it came from.
///
/// Runs before logging is set up, so problems go to stderr directly.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE, e);
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    /// Space `S1` with one folderless list; `L1` answers `tasks_status`.
    async fn clickup(tasks_status: u16) -> MockServer {
        let server = MockServer::start().await;
        mount(&server, "/space/S1", 200, json!({"id": "S1", "name": "Engineering"})).await;
        mount(&server, "/space/S1/folder", 200, json!({"folders": []})).await;
        mount(&server, "/space/S1/list", 200, json!({"lists": [{"id": "L1", "name": "Inbox"}]})).await;
        let body = if tasks_status == 200 {
            json!({"tasks": [
                {"id": "a", "name": "A", "status": {"status": "complete"},
                 "assignees": [{"id": 1, "username": "ann"}]},
                {"id": "b", "name": "B", "status": {"status": "open"}, "assignees": []}
            ]})
        } else {
            json!({"err": "unavailable"})
        };
        mount(&server, "/list/L1/task", tasks_status, body).await;
        server
    }

    fn config_for(server: &MockServer, reports: &TempDir) -> Config {
        let mut config = Config::default();
        config.clickup.api_url = server.uri();
        config.clickup.api_token = Some("pk_test".to_string());
        config.clickup.timeout_seconds = 5;
        config.report.output_dir = reports.path().display().to_string();
        config
    }

    #[tokio::test]
    async fn test_stats_incomplete_fails() {
        let server = clickup(503).await;
        let reports = TempDir::new().unwrap();

        let err = run_stats(&config_for(&server, &reports), "S1", 30, true)
            .await
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Task statistics are incomplete"));
        assert!(message.contains("503"));
    }

    #[tokio::test]
    async fn test_stats_ok() {
        let server = clickup(200).await;
        let reports = TempDir::new().unwrap();
        run_stats(&config_for(&server, &reports), "S1", 0, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_report_written_to_output_file() {
        let server = clickup(200).await;
        let reports = TempDir::new().unwrap();
        let output = reports.path().join("out.md");

        run_report(&config_for(&server, &reports), "S1", None, Some(&output), true)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("## Workspace: Engineering"));
        assert!(content.contains("ann"));
    }

    #[tokio::test]
    async fn test_report_saved_to_store() {
        let server = clickup(200).await;
        let reports = TempDir::new().unwrap();

        run_report(&config_for(&server, &reports), "S1", None, None, true)
            .await
            .unwrap();

        let stored = ReportStore::new(reports.path()).list().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].filename.starts_with("clickup_report_S1_"));
    }

    #[tokio::test]
    async fn test_report_refuses_partial_data() {
        let server = clickup(500).await;
        let reports = TempDir::new().unwrap();

        let err = run_report(&config_for(&server, &reports), "S1", None, None, true)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to analyze space S1"));
        assert!(ReportStore::new(reports.path()).list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_an_error() {
        let args = Args::parse_from(["clickup-insights", "teams"]);
        let err = run(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("No ClickUp API token"));
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.toml");
        std::fs::write(&file, "[general]\nverbose = true\nconcurrency = 2\n").unwrap();

        let args = Args::parse_from([
            "clickup-insights",
            "--config",
            file.to_str().unwrap(),
            "teams",
        ]);
        let (config, origin) = load_config(&args).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.concurrency, 2);
        assert_eq!(origin.as_deref(), Some(file.as_path()));
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use taskpulse::{Dashboard, Scope, TaskImport, TaskPulse, Window};

#[derive(Parser)]
#[command(name = "taskpulse", about = "Productivity analytics for a local task store")]
struct Cli {
    /// Database path (default: ~/.taskpulse/taskpulse.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute analytics over the imported task history
    Stats {
        #[command(subcommand)]
        view: StatsView,
    },
    /// Import tasks with their event histories from a JSON export
    Import {
        /// Path to the export file
        file: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

/// Arguments shared by every stats view.
#[derive(Args)]
struct ScopeArgs {
    /// Caller user id (default: the `user_id` config value)
    #[arg(long)]
    user: Option<i64>,

    /// Aggregate scope: personal or global
    #[arg(long, default_value = "personal")]
    scope: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum StatsView {
    /// Day-by-day created/completed counts
    Trends {
        #[command(flatten)]
        common: ScopeArgs,
        /// Trailing window (e.g. 7d, 30d)
        #[arg(long, default_value = "7d")]
        window: String,
    },
    /// Active tasks by priority
    Distribution {
        #[command(flatten)]
        common: ScopeArgs,
    },
    /// Throughput, lead time, and performance score
    Productivity {
        #[command(flatten)]
        common: ScopeArgs,
        #[arg(long, default_value = "7d")]
        window: String,
    },
    /// Average dwell time per workflow status
    Efficiency {
        #[command(flatten)]
        common: ScopeArgs,
    },
    /// 90-day completion heatmap
    Heatmap {
        #[command(flatten)]
        common: ScopeArgs,
    },
    /// Rule-based observations
    Insights {
        #[command(flatten)]
        common: ScopeArgs,
        #[arg(long, default_value = "7d")]
        window: String,
    },
    /// Everything at once
    Dashboard {
        #[command(flatten)]
        common: ScopeArgs,
        #[arg(long, default_value = "7d")]
        window: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => taskpulse::Database::open_at(path).await?,
        None => taskpulse::Database::open().await?,
    };
    let engine = TaskPulse::new(db);

    match cli.command {
        Commands::Status => {
            let stats = engine.store_stats().await?;
            println!("Tasks:  {}", stats.task_count);
            println!("Events: {}", stats.event_count);
            if let (Some(first), Some(last)) = (&stats.first_event_at, &stats.last_event_at) {
                println!("Log:    {first} .. {last}");
            }
        }
        Commands::Config { action } => handle_config(&engine, action).await?,
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;
            let imports: Vec<TaskImport> = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid export file: {e}"))?;
            let report = engine.import_tasks(imports).await?;
            eprintln!("Imported {} tasks, {} events", report.tasks, report.events);
        }
        Commands::Stats { view } => handle_stats(&engine, view).await?,
    }

    Ok(())
}

/// Resolve the caller id: an explicit `--user` wins, then the `user_id`
/// config value. Global scope aggregates the whole store, so a missing
/// caller id only matters for personal scope.
async fn resolve_caller(
    engine: &TaskPulse,
    user: Option<i64>,
    scope: Scope,
) -> anyhow::Result<i64> {
    if let Some(id) = user {
        return Ok(id);
    }
    if let Some(id) = engine.default_user_id().await? {
        return Ok(id);
    }
    if scope == Scope::Personal {
        anyhow::bail!("no caller id: pass --user or run 'taskpulse config set user_id <ID>'");
    }
    Ok(0)
}

async fn handle_stats(engine: &TaskPulse, view: StatsView) -> anyhow::Result<()> {
    match view {
        StatsView::Trends { common, window } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let days = Window::parse(&window)?.days();
            let trends = engine.completion_trends(caller, scope, days).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&trends)?);
            } else {
                println!("{:<5} {:>9} {:>9}", "Day", "Created", "Completed");
                for point in &trends {
                    println!("{:<5} {:>9} {:>9}", point.label, point.created, point.completed);
                }
            }
        }
        StatsView::Distribution { common } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let dist = engine.priority_distribution(caller, scope).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&dist)?);
            } else {
                println!("Low:    {}", dist.low);
                println!("Medium: {}", dist.medium);
                println!("High:   {}", dist.high);
                println!("Urgent: {}", dist.urgent);
                println!("Total:  {}", dist.total());
            }
        }
        StatsView::Productivity { common, window } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let days = Window::parse(&window)?.days();
            let m = engine.productivity(caller, scope, days).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else {
                println!("Completed this period: {}", m.completed_this_period);
                println!("Avg lead time (days):  {}", m.avg_lead_time_days);
                println!("Total completed:       {}", m.total_completed);
                println!("Performance score:     {}", m.performance_score);
                println!("Throughput trend:      {:+}%", m.throughput_trend_pct);
                println!("Lead time trend:       {:+}%", m.lead_time_trend_pct);
                println!("Productivity trend:    {:+}%", m.productivity_trend_pct);
            }
        }
        StatsView::Efficiency { common } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let rows = engine.status_efficiency(caller, scope).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{:<12} {:>6} days", row.status.as_str(), row.avg_days);
                }
            }
        }
        StatsView::Heatmap { common } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let points = engine.completion_heatmap(caller, scope).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else if points.is_empty() {
                println!("No completions in the last 90 days");
            } else {
                for point in &points {
                    println!("{}  {}", point.date, point.count);
                }
            }
        }
        StatsView::Insights { common, window } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let days = Window::parse(&window)?.days();
            let insights = engine.insight_feed(caller, scope, days).await?;
            if common.json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else if insights.is_empty() {
                println!("Nothing noteworthy right now");
            } else {
                for line in &insights {
                    println!("- {line}");
                }
            }
        }
        StatsView::Dashboard { common, window } => {
            let scope = Scope::parse(&common.scope)?;
            let caller = resolve_caller(engine, common.user, scope).await?;
            let days = Window::parse(&window)?.days();

            // Degrade gracefully: an unavailable store yields the zeroed
            // baseline rather than an error in the user's face.
            let dash = match engine.dashboard(caller, scope, days).await {
                Ok(dash) => dash,
                Err(taskpulse::Error::DataUnavailable(e)) => {
                    log::warn!("store unavailable, using fallback dataset: {e}");
                    Dashboard::fallback(days)
                }
                Err(e) => return Err(e.into()),
            };

            if common.json {
                println!("{}", serde_json::to_string_pretty(&dash)?);
            } else {
                print_dashboard(&dash);
            }
        }
    }
    Ok(())
}

fn print_dashboard(dash: &Dashboard) {
    println!("── Trends ───────────────────────");
    for point in &dash.trends {
        println!("{:<5} created {:<3} completed {}", point.label, point.created, point.completed);
    }
    println!("── Active tasks by priority ─────");
    let d = &dash.distribution;
    println!("low {} / medium {} / high {} / urgent {}", d.low, d.medium, d.high, d.urgent);
    println!("── Productivity ─────────────────");
    let m = &dash.productivity;
    println!(
        "completed {} (trend {:+}%), lead time {} days (trend {:+}%), score {}",
        m.completed_this_period,
        m.throughput_trend_pct,
        m.avg_lead_time_days,
        m.lead_time_trend_pct,
        m.performance_score
    );
    println!("── Status efficiency ────────────");
    for row in &dash.efficiency {
        println!("{:<12} {} days", row.status.as_str(), row.avg_days);
    }
    if !dash.insights.is_empty() {
        println!("── Insights ─────────────────────");
        for line in &dash.insights {
            println!("- {line}");
        }
    }
}

async fn handle_config(engine: &TaskPulse, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match engine.config_get(&key).await? {
            Some(value) => println!("{value}"),
            None => eprintln!("(not set)"),
        },
        ConfigAction::Set { key, value } => {
            engine.config_set(&key, &value).await?;
        }
        ConfigAction::List => {
            for (key, value) in engine.config_list().await? {
                println!("{key}={value}");
            }
        }
    }
    Ok(())
}

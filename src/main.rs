//! StratIntel - strategic intelligence analysis CLI
//!
//! Produces CRAFT-format strategic reports with a real LLM provider or the
//! simulated analyst, stores them as JSON documents and answers dashboard
//! queries over the stored reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, storage, invalid export format, etc.)
//!   2 - Analysis at or above the --fail-on priority band

mod analysis;
mod backend;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod store;

use anyhow::{Context, Result};
use backend::{BackendRegistry, Dispatcher};
use cli::{AnalyzeArgs, Args, Command, ProviderToggle, SettingsAction, ThresholdLevel};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisRequest, AnalysisStatus, ListedAnalysis, PriorityLevel};
use pipeline::AnalysisPipeline;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use store::{DataDir, DashboardSettings, ExportFormat, ExportOutput};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Provider keys may live in a .env file
    dotenv::dotenv().ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("StratIntel v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .stratintel.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to configure providers, the data directory and default weights.");
    Ok(())
}

/// Initialize logging based on verbosity settings, or RUST_LOG when set.
fn init_logging(args: &Args) {
    let result = if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(args.log_level())
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the subcommand. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let data_dir = DataDir::new(&config.general.data_dir);
    debug!("Data directory: {}", data_dir.root().display());

    let Some(command) = args.command.clone() else {
        return Ok(0);
    };

    match command {
        Command::Analyze(analyze) => handle_analyze(&config, &data_dir, &analyze, args.quiet).await,
        Command::List { json } => {
            let analyses = data_dir.analysis_store().list_all();
            print_analyses(&analyses, json)?;
            Ok(0)
        }
        Command::Show { id } => handle_show(&data_dir, &id),
        Command::Delete { id } => {
            let removed = data_dir.analysis_store().delete_by_id(&id)?;
            if removed == 0 {
                println!("ℹ️  No analysis with id {}", id);
            } else {
                println!("🗑️  Deleted analysis {}", id);
            }
            Ok(0)
        }
        Command::Search { query } => {
            let found = data_dir.analysis_store().search(&query);
            println!("🔎 {} analyses matching \"{}\"", found.len(), query);
            print_analyses(&found, false)?;
            Ok(0)
        }
        Command::Filter { priority, from, to } => handle_filter(&data_dir, priority, from, to),
        Command::Stats { json } => handle_stats(&data_dir, json),
        Command::Compare { ids } => handle_compare(&data_dir, &ids),
        Command::Export { format, output } => handle_export(&data_dir, format, output),
        Command::Settings { action } => {
            handle_settings(&data_dir, action.unwrap_or(SettingsAction::Show))
        }
        Command::History { limit } => handle_history(&data_dir, limit),
    }
}

/// Run one analysis through the pipeline.
async fn handle_analyze(
    config: &Config,
    data_dir: &DataDir,
    analyze: &AnalyzeArgs,
    quiet: bool,
) -> Result<i32> {
    let content = read_content(analyze)?;
    if content.trim().is_empty() {
        warn!("Analyzing empty content");
    }

    let weights = analyze
        .effective_weights(config.analysis.weights)
        .map_err(anyhow::Error::msg)?;

    let request = AnalysisRequest {
        content,
        focus_area: analyze.focus,
        urgency_level: analyze.urgency,
        company_size: analyze.company_size,
        model_name: analyze
            .model
            .clone()
            .unwrap_or_else(|| config.analysis.model.clone()),
        weights,
    };

    let settings = data_dir.settings_store().load();
    let registry = BackendRegistry::from_config(config, &settings.ai_models)?;
    debug!("Configured providers: {:?}", registry.selectors());
    let pipeline = AnalysisPipeline::new(
        Dispatcher::new(registry),
        data_dir.analysis_store(),
        data_dir.metrics_log(),
    );

    let backend_name = pipeline
        .dispatcher()
        .registry()
        .resolve(&request.model_name)
        .name()
        .to_string();

    println!("🧠 Analyzing with {} ...", backend_name);
    println!(
        "   Focus: {} | Urgency: {} | Company: {}",
        request.focus_area, request.urgency_level, request.company_size
    );

    let spinner = (!quiet).then(|| analysis_spinner(&backend_name));
    let result = pipeline.run(&request, !analyze.no_save).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result.context("Failed to save analysis")?;

    match &analyze.output {
        Some(path) => {
            std::fs::write(path, &result.outcome.report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("📝 Report written to {}", path.display());
        }
        None => println!("\n{}", result.outcome.report),
    }

    println!("\n📊 Analysis Summary:");
    if let Some(ref record) = result.record {
        println!("   ID: {}", record.id);
    }
    println!("   Backend: {} ({})", result.outcome.backend, result.outcome.status);
    println!(
        "   Global score: {:.1}/10 - {} {}",
        result.metrics.global_score,
        result.metrics.priority_level.emoji(),
        result.metrics.priority_level
    );
    println!("   Duration: {:.1}s", result.duration.as_secs_f64());

    if result.outcome.status == AnalysisStatus::BackendFailed {
        eprintln!("\n⚠️  The backend call failed; the stored report holds the error message.");
        return Ok(0);
    }

    if let Some(fail_level) = analyze.fail_on {
        if result.metrics.priority_level >= fail_level {
            eprintln!(
                "\n⛔ Analysis is at or above {} priority. Failing (exit code 2).",
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn read_content(analyze: &AnalyzeArgs) -> Result<String> {
    if let Some(ref text) = analyze.text {
        return Ok(text.clone());
    }

    if let Some(ref file) = analyze.file {
        return std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()));
    }

    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read standard input")?;
    Ok(content)
}

fn analysis_spinner(backend: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Waiting for {}...", backend));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn handle_show(data_dir: &DataDir, id: &str) -> Result<i32> {
    match data_dir.analysis_store().get_by_id(id) {
        Some(record) => {
            println!("{}", record.content);
            println!("\n---");
            println!("ID: {} | Date: {}", record.id, record.created_at.format("%Y-%m-%d %H:%M"));
            for (key, value) in &record.metadata {
                println!("{}: {}", key, value);
            }
            Ok(0)
        }
        None => {
            eprintln!("No analysis with id {}", id);
            Ok(1)
        }
    }
}

fn handle_filter(
    data_dir: &DataDir,
    priority: Option<PriorityLevel>,
    from: Option<String>,
    to: Option<String>,
) -> Result<i32> {
    let store = data_dir.analysis_store();

    let mut analyses = match priority {
        Some(level) => store.filter_by_priority(level),
        None => store.list_all(),
    };

    if from.is_some() || to.is_some() {
        let start = match from {
            Some(ref s) => cli::parse_date_bound(s, false).map_err(anyhow::Error::msg)?,
            None => chrono::DateTime::<chrono::Utc>::MIN_UTC,
        };
        let end = match to {
            Some(ref s) => cli::parse_date_bound(s, true).map_err(anyhow::Error::msg)?,
            None => chrono::DateTime::<chrono::Utc>::MAX_UTC,
        };
        analyses = analysis::filter_by_date_range(&analyses, start, end);
    }

    println!("🔎 {} analyses match", analyses.len());
    print_analyses(&analyses, false)?;
    Ok(0)
}

fn handle_stats(data_dir: &DataDir, json: bool) -> Result<i32> {
    let store = data_dir.analysis_store();
    let settings = data_dir.settings_store().load();
    let stats = store.dashboard_stats();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?
        );
        return Ok(0);
    }

    println!("📊 Dashboard");
    println!("   Analyses: {}", stats.total_analyses);
    println!("   Average score: {:.1}/10", stats.average_score);
    println!("   Critical priorities: {}", stats.critical_priorities);
    println!(
        "   Alerts (score ≥ {:.1}): {}",
        settings.thresholds.critical,
        store.alert_count(settings.thresholds.critical)
    );
    println!("   Estimated ROI: {:.0} €", stats.estimated_roi);

    println!("\n   Priority distribution:");
    for level in PriorityLevel::ALL {
        println!(
            "     {} {:<8} {}",
            level.emoji(),
            level.label(),
            stats.priority_distribution.get(level)
        );
    }

    if !stats.recent_scores.is_empty() {
        let trend: Vec<String> = stats.recent_scores.iter().map(|s| format!("{:.1}", s)).collect();
        println!("\n   Score trend: {}", trend.join(" → "));
    }

    if !stats.recent_analyses.is_empty() {
        println!("\n   Recent analyses:");
        print_analyses(&stats.recent_analyses, false)?;
    }

    Ok(0)
}

fn handle_compare(data_dir: &DataDir, ids: &[String]) -> Result<i32> {
    let comparison = data_dir
        .analysis_store()
        .compare(ids)
        .context("Comparison failed")?;

    println!("⚖️  Comparing {} analyses", comparison.analyses.len());
    for compared in &comparison.analyses {
        println!(
            "   [{}] {} - {:.1}/10 ({})",
            compared.id,
            compared.title,
            compared.metrics.global_score,
            compared.metrics.priority_level
        );
    }

    println!("\n   {:<24} {:>5} {:>5} {:>6}", "Critère", "min", "max", "écart");
    for row in &comparison.criteria {
        println!(
            "   {:<24} {:>5.1} {:>5.1} {:>6.1} {}",
            row.criterion.label(),
            row.min,
            row.max,
            row.spread,
            if row.consensus { "✅" } else { "⚠️" }
        );
    }

    let consensus: Vec<&str> = comparison.consensus().map(|c| c.criterion.label()).collect();
    let divergences: Vec<&str> = comparison.divergences().map(|c| c.criterion.label()).collect();
    println!("\n   Consensus: {}", display_list(&consensus));
    println!("   Divergences: {}", display_list(&divergences));
    println!("   Global score spread: {:.1}", comparison.global_spread);

    Ok(0)
}

fn display_list(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn handle_export(
    data_dir: &DataDir,
    format: Option<String>,
    output: Option<std::path::PathBuf>,
) -> Result<i32> {
    let format: ExportFormat = match format {
        Some(f) => f.parse()?,
        None => data_dir.settings_store().load().export_format.parse()?,
    };

    match data_dir.analysis_store().export(format)? {
        ExportOutput::Text(text) => match output {
            Some(path) => {
                std::fs::write(&path, text)
                    .with_context(|| format!("Failed to write export to {}", path.display()))?;
                println!("✅ Exported {} to {}", format, path.display());
            }
            None => println!("{}", text),
        },
        ExportOutput::File(path) => {
            if output.is_some() {
                warn!("--output is ignored for spreadsheet exports");
            }
            println!("✅ Exported {} to {}", format, path.display());
        }
    }

    Ok(0)
}

fn handle_settings(data_dir: &DataDir, action: SettingsAction) -> Result<i32> {
    let settings_store = data_dir.settings_store();
    let mut settings = settings_store.load();

    match action {
        SettingsAction::Show => {
            print_settings(&settings);
            return Ok(0);
        }
        SettingsAction::SetThreshold { level, value } => match level {
            ThresholdLevel::Critical => settings.thresholds.critical = value,
            ThresholdLevel::High => settings.thresholds.high = value,
            ThresholdLevel::Moderate => settings.thresholds.moderate = value,
        },
        SettingsAction::Enable { provider } => set_provider(&mut settings, provider, true),
        SettingsAction::Disable { provider } => set_provider(&mut settings, provider, false),
        SettingsAction::SetFrequency { frequency } => settings.monitoring_frequency = frequency,
        SettingsAction::SetExportFormat { format } => {
            let parsed: ExportFormat = format.parse()?;
            settings.export_format = parsed.to_string().to_uppercase();
        }
        SettingsAction::Reset => settings = DashboardSettings::default(),
    }

    settings_store.save(&settings)?;
    println!("✅ Settings saved to {}", data_dir.settings_path().display());
    print_settings(&settings);
    Ok(0)
}

fn set_provider(settings: &mut DashboardSettings, provider: ProviderToggle, enabled: bool) {
    match provider {
        ProviderToggle::Claude => settings.ai_models.claude_enabled = enabled,
        ProviderToggle::Gpt4 => settings.ai_models.gpt4_enabled = enabled,
        ProviderToggle::Gemini => settings.ai_models.gemini_enabled = enabled,
    }
}

fn print_settings(settings: &DashboardSettings) {
    let flag = |enabled: bool| if enabled { "on" } else { "off" };

    println!("⚙️  Settings");
    println!(
        "   Thresholds: critical {:.1} | high {:.1} | moderate {:.1}",
        settings.thresholds.critical, settings.thresholds.high, settings.thresholds.moderate
    );
    println!("   Monitoring frequency: {}", settings.monitoring_frequency);
    println!("   Export format: {}", settings.export_format);
    println!(
        "   Providers: Claude {} | GPT-4 {} | Gemini {}",
        flag(settings.ai_models.claude_enabled),
        flag(settings.ai_models.gpt4_enabled),
        flag(settings.ai_models.gemini_enabled)
    );
}

fn handle_history(data_dir: &DataDir, limit: Option<usize>) -> Result<i32> {
    let snapshots = data_dir.metrics_log().load();
    let skip = limit.map_or(0, |n| snapshots.len().saturating_sub(n));

    if snapshots.is_empty() {
        println!("No metrics recorded yet.");
        return Ok(0);
    }

    println!("📈 {} metrics snapshots", snapshots.len() - skip);
    for snapshot in snapshots.iter().skip(skip) {
        let when = snapshot
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {} {:<12} {:<15} {:>6}ms {:>4.1}/10 {}",
            when,
            snapshot.backend,
            snapshot.status,
            snapshot.duration_ms,
            snapshot.global_score,
            snapshot.priority_level
        );
    }

    Ok(0)
}

fn print_analyses(analyses: &[ListedAnalysis], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(analyses).context("Failed to serialize analyses")?
        );
        return Ok(());
    }

    if analyses.is_empty() {
        println!("   No analyses.");
        return Ok(());
    }

    for analysis in analyses {
        let metrics = report::extract_metrics(&analysis.record.content);
        println!(
            "   {} [{}] {} {} - {:.1}/10 {}",
            metrics.priority_level.emoji(),
            analysis.record.id,
            analysis.record.created_at.format("%Y-%m-%d %H:%M"),
            analysis.title,
            metrics.global_score,
            metrics.priority_level
        );
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

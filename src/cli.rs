//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{CompanySize, FocusArea, PriorityLevel, UrgencyLevel, Weights};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// StratIntel - strategic intelligence analysis from the command line
///
/// Turns raw business news or documents into a scored strategic report
/// (CRAFT format) using Claude, GPT-4 or a built-in simulated analyst,
/// and keeps every analysis in a local JSON store for later querying.
///
/// Examples:
///   stratintel analyze --file article.txt --urgency critical --company-size startup
///   stratintel analyze --text "Rachat de X par Y" --model GPT-4
///   stratintel list
///   stratintel filter --priority critical --from 2024-01-01
///   stratintel compare 1a2b3c4d 5e6f7a8b
///   stratintel export --format csv --output analyses.csv
///   stratintel --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .stratintel.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding analyses.json, config.json and metrics.json
    #[arg(long, value_name = "DIR", env = "STRATINTEL_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Seed for the simulated analyst's score noise
    #[arg(long, value_name = "SEED", global = true)]
    pub seed: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .stratintel.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze content and store the resulting report
    Analyze(AnalyzeArgs),

    /// List stored analyses
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one stored report
    Show {
        /// Analysis identifier
        id: String,
    },

    /// Delete a stored analysis (no-op if the id is unknown)
    Delete {
        /// Analysis identifier
        id: String,
    },

    /// Case-insensitive search over titles and report content
    Search {
        /// Text to look for
        query: String,
    },

    /// Filter analyses by priority band and/or creation date
    Filter {
        /// Priority band
        #[arg(short, long, value_name = "LEVEL")]
        priority: Option<PriorityLevel>,

        /// Earliest creation date (YYYY-MM-DD or RFC 3339), inclusive
        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        /// Latest creation date (YYYY-MM-DD or RFC 3339), inclusive
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
    },

    /// Dashboard statistics over every stored analysis
    Stats {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Compare the scores of two or more analyses
    Compare {
        /// Analysis identifiers
        #[arg(required = true, num_args = 2..)]
        ids: Vec<String>,
    },

    /// Export every stored analysis
    Export {
        /// json, csv or excel (defaults to the dashboard setting)
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// Write JSON/CSV output to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or edit dashboard settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show recorded analysis metrics snapshots
    History {
        /// Only show the most recent N snapshots
        #[arg(short = 'n', long, value_name = "COUNT")]
        limit: Option<usize>,
    },
}

/// Arguments of `analyze`.
#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Read the content from a file
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["text", "stdin"])]
    pub file: Option<PathBuf>,

    /// Content given inline
    #[arg(short, long, value_name = "TEXT", conflicts_with = "stdin")]
    pub text: Option<String>,

    /// Read the content from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Strategic focus area
    #[arg(long, default_value = "general", value_name = "AREA")]
    pub focus: FocusArea,

    /// Urgency of the decision context
    #[arg(long, default_value = "moderate", value_name = "LEVEL")]
    pub urgency: UrgencyLevel,

    /// Size of the company the analysis is written for
    #[arg(long, default_value = "sme", value_name = "SIZE")]
    pub company_size: CompanySize,

    /// Backend selector: Claude-3-Sonnet, GPT-4, or anything else for simulation
    ///
    /// Defaults to the [analysis] model of the config file.
    #[arg(short, long, env = "STRATINTEL_MODEL")]
    pub model: Option<String>,

    /// Criterion weights: impact,urgency,complexity,risk,reliability
    ///
    /// Example: --weights 0.3,0.25,0.2,0.15,0.1
    #[arg(short, long, value_name = "W1,..,W5", value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,

    /// Also write the report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not persist the analysis
    #[arg(long)]
    pub no_save: bool,

    /// Fail if the analysis lands at or above this priority band
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is reached.
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<PriorityLevel>,
}

impl AnalyzeArgs {
    /// Weights from the command line, or `default`.
    pub fn effective_weights(&self, default: Weights) -> Result<Weights, String> {
        let weights = match &self.weights {
            Some(values) => Weights::try_from(values.clone())?,
            None => default,
        };
        weights.validate_range()?;
        Ok(weights)
    }

    fn validate(&self) -> Result<(), String> {
        let sources = [self.file.is_some(), self.text.is_some(), self.stdin]
            .iter()
            .filter(|set| **set)
            .count();
        if sources != 1 {
            return Err(
                "Provide the content with exactly one of --file, --text or --stdin".to_string(),
            );
        }

        if let Some(ref file) = self.file {
            if !file.is_file() {
                return Err(format!("Input file does not exist: {}", file.display()));
            }
        }

        if self.weights.is_some() {
            self.effective_weights(Weights::default())?;
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    /// Print the current settings
    Show,

    /// Set an alert threshold (0-10)
    SetThreshold {
        level: ThresholdLevel,
        value: f64,
    },

    /// Enable a provider
    Enable { provider: ProviderToggle },

    /// Disable a provider
    Disable { provider: ProviderToggle },

    /// Set the monitoring frequency label
    SetFrequency { frequency: String },

    /// Set the default export format
    SetExportFormat { format: String },

    /// Restore default settings
    Reset,
}

/// Alert threshold selected by `settings set-threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ThresholdLevel {
    Critical,
    High,
    Moderate,
}

/// Provider flag selected by `settings enable/disable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderToggle {
    Claude,
    Gpt4,
    Gemini,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("No command given (try --help)".to_string());
        };

        match command {
            Command::Analyze(analyze) => analyze.validate()?,
            Command::Filter { priority, from, to } => {
                if priority.is_none() && from.is_none() && to.is_none() {
                    return Err("Filter needs --priority, --from or --to".to_string());
                }
                let start = from.as_deref().map(|s| parse_date_bound(s, false)).transpose()?;
                let end = to.as_deref().map(|s| parse_date_bound(s, true)).transpose()?;
                if let (Some(start), Some(end)) = (start, end) {
                    if start > end {
                        return Err("--from must not be after --to".to_string());
                    }
                }
            }
            Command::Settings {
                action: Some(SettingsAction::SetThreshold { value, .. }),
            } => {
                if !(0.0..=10.0).contains(value) {
                    return Err("Threshold must be between 0 and 10".to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Parse a date bound given as RFC 3339 or `YYYY-MM-DD`.
///
/// A plain date covers the whole day: it maps to its first instant for a
/// lower bound and to its last instant for an upper bound.
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD or RFC 3339", value))?;

    let naive = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| format!("Invalid date '{}'", value))?;

    Ok(Utc.from_utc_datetime(&naive))
}

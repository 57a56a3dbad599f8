use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use imessage_wrapped_rust::config::AppConfig;
use imessage_wrapped_rust::loader::ExportLoader;
use imessage_wrapped_rust::logging::{init_logging, LogFormat, OperationTimer};
use imessage_wrapped_rust::metrics::MetricsCollector;
use imessage_wrapped_rust::scoring::ScoringMethod;
use imessage_wrapped_rust::sentiment::{BackendKind, SentimentInterval};
use imessage_wrapped_rust::validation::InputValidator;
use imessage_wrapped_rust::{writer, StatisticsAnalyzer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute statistics for an export
    Analyze {
        /// Export file (.json or .jsonl)
        input: PathBuf,

        /// Write statistics here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the export's target year
        #[arg(short, long)]
        year: Option<i32>,

        /// Skip the sentiment summary
        #[arg(long)]
        no_sentiment: bool,

        /// Sentiment backend (lexical or neural)
        #[arg(long)]
        sentiment_backend: Option<BackendKind>,

        /// Directory holding the neural model files
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Sentiment trend interval (day, week or month)
        #[arg(long)]
        interval: Option<SentimentInterval>,

        /// Shortest phrase length in tokens
        #[arg(long)]
        phrase_ngram_min: Option<usize>,

        /// Longest phrase length in tokens
        #[arg(long)]
        phrase_ngram_max: Option<usize>,

        /// Phrase scorer (frequency or tfidf)
        #[arg(long)]
        phrase_scorer: Option<ScoringMethod>,

        /// Per-extra-token score multiplier for longer phrases
        #[arg(long)]
        phrase_score_mult: Option<f64>,

        /// Days of silence before a conversation counts as ghosted
        #[arg(long)]
        ghost_days: Option<i64>,
    },
    /// Print the effective configuration as YAML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.file_path.as_ref().map(PathBuf::from));

    // Initialize logging
    let _guard = init_logging(
        Some(&config.get_log_level()),
        log_file.as_deref(),
        LogFormat::from_name(&config.logging.format),
    )?;

    info!("Starting imessage-wrapped");

    let result = match cli.command {
        Commands::Analyze {
            input,
            output,
            year,
            no_sentiment,
            sentiment_backend,
            model_dir,
            interval,
            phrase_ngram_min,
            phrase_ngram_max,
            phrase_scorer,
            phrase_score_mult,
            ghost_days,
        } => {
            if no_sentiment {
                config.sentiment.enabled = false;
            }
            if let Some(backend) = sentiment_backend {
                config.sentiment.backend = backend;
            }
            if model_dir.is_some() {
                config.sentiment.model_dir = model_dir;
            }
            if let Some(interval) = interval {
                config.sentiment.interval = interval.as_str().to_string();
            }
            if let Some(min) = phrase_ngram_min {
                config.phrases.ngram_min = min;
            }
            if let Some(max) = phrase_ngram_max {
                config.phrases.ngram_max = max;
            }
            if let Some(scorer) = phrase_scorer {
                config.phrases.scoring = scorer;
            }
            if let Some(mult) = phrase_score_mult {
                config.phrases.length_bias = mult;
            }
            if let Some(days) = ghost_days {
                config.ghosts.timeline_days = days;
            }
            analyze(&config, &input, output.as_ref(), year)
        }
        Commands::Config => print_config(&config),
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
        MetricsCollector::default().record_error("command", "main");
    }
    result
}

fn analyze(
    config: &AppConfig,
    input: &std::path::Path,
    output: Option<&PathBuf>,
    year: Option<i32>,
) -> Result<()> {
    let timer = OperationTimer::new("analyze_command");

    if let Some(path) = output {
        InputValidator::validate_output_path(path)?;
    }

    let mut export = ExportLoader::load(input)
        .with_context(|| format!("Failed to load export from {}", input.display()))?;
    if let Some(year) = year {
        InputValidator::validate_year(year)?;
        export.year = year;
    }

    let analyzer = StatisticsAnalyzer::from_config(config, |key| std::env::var(key).ok())?
        .with_progress(Box::new(|stage: &str, done: usize, total: usize| {
            if done == 0 || done == total {
                debug!(stage, done, total, "Sentiment progress");
            }
            Ok(())
        }));
    if let Some(options) = analyzer.sentiment() {
        let report = options.engine.report();
        info!(
            requested = %report.requested,
            active = %report.active,
            downgraded = report.downgraded,
            "Sentiment backend resolved"
        );
    }

    let stats = analyzer.analyze(&export);

    match output {
        Some(path) => writer::write_statistics(&stats, path)?,
        None => writer::write_to(&stats, &mut std::io::stdout().lock())?,
    }

    timer.finish();
    Ok(())
}

fn print_config(config: &AppConfig) -> Result<()> {
    let yaml = config.to_yaml()?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(yaml.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

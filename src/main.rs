use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use meme_signal::{
    format_float, format_percent, PipelineReport, SignalConfig, SignalError, SignalPipeline,
    TextRecord,
};

#[derive(Parser)]
#[command(name = "meme-signal", about = "Irony-collapse and market-impact signals for meme text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Analyze(AnalyzeArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/signal.toml")]
    path: PathBuf,
}

fn main() {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), SignalError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::InitConfig(args) => {
            SignalConfig::default().write(&args.path)?;
            println!("Wrote default config to {}", args.path.display());
            Ok(())
        }
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), SignalError> {
    let (config, config_path) = SignalConfig::load(args.config)?;
    if let Some(path) = config_path.filter(|path| path.exists()) {
        tracing::info!("Loaded config - path={}", path.display());
    }

    let records = read_records(args.input.as_deref())?;
    let mut pipeline = SignalPipeline::new(config)?;
    let report = pipeline.run(records)?;

    print_summary(&report, pipeline.config(), args.details);

    if let Some(path) = args.output {
        let payload = serde_json::to_string_pretty(&report)
            .map_err(|err| SignalError::parse("report", err))?;
        std::fs::write(&path, payload)?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &PipelineReport, config: &SignalConfig, details: bool) {
    println!("Records analyzed: {}", report.records.len());
    if report.flagged_records() > 0 {
        println!("Data quality flags: {}", report.flagged_records());
    }

    if let Some(metrics) = &report.metrics {
        println!(
            "Model: train R² {} | test R² {} | test MAE {}",
            format_float(metrics.train_r2, 4),
            format_float(metrics.test_r2, 4),
            format_float(metrics.test_mae, 4)
        );
        if metrics.is_overfit {
            println!(
                "Warning: test R² trails train R² by {}",
                format_float(metrics.overfit_gap, 4)
            );
        }
    }

    let strong = report
        .records
        .iter()
        .filter(|record| {
            record
                .lookalike
                .as_ref()
                .map(|matched| matched.is_strong(config.thresholds.lookalike_threshold))
                .unwrap_or(false)
        })
        .count();
    println!("Strong lookalikes: {}", strong);
    println!("Alerts: {}", report.alerts.len());

    for alert in &report.alerts {
        println!(
            "- [{}] {} record {} (toxicity {}, ici {}) keywords: {}",
            alert.severity.label(),
            alert.alert_id,
            alert.record_id,
            alert.toxicity_score,
            format_float(alert.irony_collapse_index, 2),
            alert.keywords.join(", ")
        );
    }

    if let Some(summary) = &report.high_risk {
        println!(
            "High-risk memes: {} (avg toxicity {})",
            summary.high_risk_count,
            format_float(summary.average_toxicity, 2)
        );
    }

    if details {
        println!("\nRecords:");
        for record in &report.records {
            let impact = record
                .impact
                .map(|impact| {
                    (
                        impact.impact_prob_24h,
                        impact.impact_prob_48h,
                        impact.impact_prob_72h,
                    )
                })
                .unwrap_or((0.0, 0.0, 0.0));
            println!(
                "  {} | band {} | seriousness {} | ici {} | readiness {} | 24h {} | 48h {} | 72h {}",
                record.record.stable_id(),
                record.ici_band(&config.thresholds).label(),
                format_float(record.seriousness(), 2),
                format_float(record.ici(), 2),
                format_float(record.readiness(), 3),
                format_percent(impact.0),
                format_percent(impact.1),
                format_percent(impact.2)
            );
        }

        if let Some(test) = &report.ici_ttest {
            println!(
                "\nICI t-test: t {} | p {} | significant {}",
                format_float(test.t_statistic, 4),
                format_float(test.p_value, 4),
                if test.significant { "yes" } else { "no" }
            );
        }

        if let Some(anova) = &report.category_anova {
            println!(
                "Category ANOVA: F {} | p {} | significant {}",
                format_float(anova.f_statistic, 4),
                format_float(anova.p_value, 4),
                if anova.significant { "yes" } else { "no" }
            );
        }
    }
}

fn read_records(path: Option<&Path>) -> Result<Vec<TextRecord>, SignalError> {
    let payload = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&payload).map_err(|err| SignalError::parse("records", err))
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use lap_forecast::data::partition_by_driver;
use lap_forecast::model::Trainer;
use lap_forecast::summary::{average_stint_length, driver_summary, weather_ranges, DriverSummary};
use lap_forecast::{
    build_feature_table, split, CsvLapSource, FittedPipeline, PipelineConfig, PredictionRequest,
    PredictionService, RaceKey, SessionRecords, SplitBoundary,
};

#[derive(Debug, Parser)]
#[command(name = "lap-forecast", about = "Next-lap-time model over exported F1 lap tables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build features, split chronologically, fit and score on the holdout.
    Train {
        #[arg(long)]
        laps: PathBuf,
        /// First held-out race, SEASON:ROUND.
        #[arg(long)]
        holdout: RaceKey,
        /// Last held-out race (default: only the first one).
        #[arg(long)]
        until: Option<RaceKey>,
        /// Pipeline settings as JSON (default settings when omitted).
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "pipeline.json")]
        out: PathBuf,
    },
    /// Score a saved pipeline on races after the ones it was trained on.
    Evaluate {
        #[arg(long)]
        laps: PathBuf,
        #[arg(long)]
        pipeline: PathBuf,
        #[arg(long)]
        holdout: RaceKey,
        #[arg(long)]
        until: Option<RaceKey>,
    },
    /// Walk-forward evaluation: hold out each race in turn.
    Backtest {
        #[arg(long)]
        laps: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        min_train_races: usize,
    },
    /// Predict one lap time from a JSON feature map.
    Predict {
        #[arg(long)]
        pipeline: PathBuf,
        /// JSON file with the feature map.
        #[arg(long)]
        input: PathBuf,
    },
    /// Serve predictions over HTTP.
    Serve {
        #[arg(long)]
        pipeline: PathBuf,
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Per-driver race summary: stints, pit stops, fastest lap.
    Summary {
        #[arg(long)]
        laps: PathBuf,
        #[arg(long)]
        race: RaceKey,
        #[arg(long)]
        driver: Option<String>,
        /// Pipeline settings as JSON; only the ingest section is used.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::load(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn holdout(from: RaceKey, until: Option<RaceKey>) -> SplitBoundary {
    SplitBoundary::Holdout {
        from,
        until: Some(until.unwrap_or(from)),
    }
}

fn print_summary(s: &DriverSummary) {
    println!("{} ({}) {}", s.driver, s.team, s.race);
    println!("- laps completed : {}", s.laps_completed);
    println!("- compounds      : {}", s.compounds_used.join(", "));
    println!("- pit stops      : {}", s.pit_stops);
    if let Some((lap, time)) = s.fastest_lap {
        println!("- fastest lap    : {time:.3}s (lap {lap})");
    }
    if let Some(speed) = s.top_speed {
        println!("- top speed      : {speed:.1} km/h");
    }
    match s.final_position {
        Some(p) => println!("- final position : {p}"),
        None => println!("- final position : N/A"),
    }
    println!("- position moves : {}", s.position_changes);
    for stint in &s.stints {
        println!(
            "  stint {} {:12} laps {:>3}-{:<3} ({} laps)",
            stint.stint, stint.compound, stint.start_lap, stint.end_lap, stint.laps
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train {
            laps,
            holdout: from,
            until,
            config,
            out,
        } => {
            let cfg = load_config(config.as_ref())?;
            let records = CsvLapSource::new(&laps, cfg.ingest.clone())
                .lap_records()
                .with_context(|| format!("reading {}", laps.display()))?;
            if records.is_empty() {
                anyhow::bail!("no usable laps in {}", laps.display());
            }

            let rows = build_feature_table(&records, &cfg.features)?;
            let split = split(&rows, &holdout(from, until))?;
            let pipeline = Trainer::new(&cfg).fit_and_evaluate(&split)?;
            if let Some(m) = pipeline.metrics() {
                println!("held-out laps : {}", m.samples);
                println!("MAE           : {:.3}s", m.mae);
                println!("RMSE          : {:.3}s", m.rmse);
                println!("R2            : {:.4}", m.r2);
                if let Some(mape) = m.mape {
                    println!("MAPE          : {mape:.3}%");
                }
            }
            pipeline.save(&out).with_context(|| format!("writing {}", out.display()))?;
            info!(out = %out.display(), "training run complete");
        }
        Command::Evaluate {
            laps,
            pipeline,
            holdout: from,
            until,
        } => {
            let fitted = FittedPipeline::load(&pipeline)
                .with_context(|| format!("loading {}", pipeline.display()))?;
            let records = CsvLapSource::new(&laps, fitted.ingest().clone()).lap_records()?;
            let rows = build_feature_table(&records, fitted.features())?;
            let split = split(&rows, &holdout(from, until))?;
            let m = fitted.evaluate_split(&split)?;
            println!(
                "laps {} | MAE {:.3}s | RMSE {:.3}s | R2 {:.4} | MAPE {}",
                m.samples,
                m.mae,
                m.rmse,
                m.r2,
                m.mape.map_or("n/a".to_string(), |v| format!("{v:.3}%"))
            );
        }
        Command::Backtest {
            laps,
            config,
            min_train_races,
        } => {
            let cfg = load_config(config.as_ref())?;
            let records = CsvLapSource::new(&laps, cfg.ingest.clone()).lap_records()?;
            let rows = build_feature_table(&records, &cfg.features)?;
            let results = Trainer::new(&cfg).walk_forward(&rows, min_train_races)?;
            for r in &results {
                println!(
                    "{:>16} | train {:>6} | test {:>5} | MAE {:.3}s | RMSE {:.3}s",
                    r.race.to_string(),
                    r.train_rows,
                    r.metrics.samples,
                    r.metrics.mae,
                    r.metrics.rmse
                );
            }
        }
        Command::Predict { pipeline, input } => {
            let service = PredictionService::load(&pipeline)
                .with_context(|| format!("loading {}", pipeline.display()))?;
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let request: PredictionRequest = serde_json::from_str(&raw)?;
            let prediction = service.predict(&request)?;
            for w in &prediction.warnings {
                eprintln!("warning: {w}");
            }
            println!("{:.3}", prediction.lap_time);
        }
        Command::Serve { pipeline, bind } => {
            let service = PredictionService::load(&pipeline)
                .with_context(|| format!("loading {}", pipeline.display()))?;
            lap_forecast::server::serve(service, bind).await?;
        }
        Command::Summary {
            laps,
            race,
            driver,
            config,
        } => {
            let cfg = load_config(config.as_ref())?;
            let records = CsvLapSource::new(&laps, cfg.ingest).lap_records()?;
            let race_laps: Vec<_> = records.into_iter().filter(|l| l.race() == race).collect();
            if race_laps.is_empty() {
                anyhow::bail!("no laps for {race}");
            }

            println!("{} ({race})", race_laps[0].event_name);
            for w in weather_ranges(&race_laps) {
                println!(
                    "- {:15}: {:.1}{unit} to {:.1}{unit}",
                    w.field.name(),
                    w.min,
                    w.max,
                    unit = w.unit
                );
            }

            let summaries: Vec<DriverSummary> = partition_by_driver(&race_laps)
                .values()
                .filter_map(|laps| driver_summary(laps))
                .collect();
            for s in summaries
                .iter()
                .filter(|s| driver.as_deref().map_or(true, |d| d == s.driver))
            {
                print_summary(s);
            }
            for compound in ["SOFT", "MEDIUM", "HARD"] {
                if let Some(avg) = average_stint_length(&summaries, compound) {
                    println!("avg {compound} stint: {avg:.1} laps");
                }
            }
        }
    }
    Ok(())
}

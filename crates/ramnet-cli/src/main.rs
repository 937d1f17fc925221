use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ramnet_core::{Classifier, ClassifierConfig, ConfusionMatrix, ModelStats, PatternSource};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "ramnet", version, about = "WiSARD weightless classifier tooling")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accuracy against noise: train, export, reload and classify at each noise level
    Sweep {
        #[arg(long, default_value_t = 128)]
        length: usize,
        #[arg(long, default_value_t = 16)]
        tuple_size: usize,
        #[arg(long, default_value_t = 10)]
        classes: usize,
        #[arg(long, default_value_t = 1000)]
        train_iters: usize,
        #[arg(long, default_value_t = 1000)]
        test_iters: usize,
        /// Noise increment in percent
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=100))]
        noise_step: u32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Scratch file the model is exported to and reloaded from
        #[arg(long, default_value = "wisard.bin")]
        model: PathBuf,
        /// One JSON object per noise level instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the dimensions and memory statistics of a saved model
    Inspect {
        model: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write the default classifier configuration as TOML
    InitConfig {
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Build a model from a config file, train it on synthetic data and save it
    TrainDemo {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Presentations per class
        #[arg(long, default_value_t = 100)]
        iters: usize,
        #[arg(long, default_value_t = 0.1)]
        noise: f64,
    },
}

#[derive(Debug, Serialize)]
struct SweepRow {
    noise: u32,
    accuracy: f64,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Serialize)]
struct ModelReport {
    input_bits: usize,
    tuple_size: usize,
    tuples: usize,
    classes: usize,
    seed: u64,
    saturation: u32,
    cells_per_class: Vec<usize>,
    stats: ModelStats,
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["ramnet_core=info", "ramnet_cli=info"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct SweepParams {
    length: usize,
    tuple_size: usize,
    classes: usize,
    train_iters: usize,
    test_iters: usize,
    seed: u64,
}

/// One noise level of the sweep
fn sweep_level(
    params: &SweepParams,
    noise_pct: u32,
    model_path: &Path,
) -> Result<SweepRow, Box<dyn std::error::Error>> {
    let noise = f64::from(noise_pct) / 100.0;
    let mut source = PatternSource::new(
        params.length,
        params.classes,
        params.seed.wrapping_add(u64::from(noise_pct)),
    );
    let mut pattern = vec![false; params.length];

    {
        let mut model =
            Classifier::new(params.length, params.tuple_size, params.classes, params.seed)?;
        for label in 0..params.classes {
            for _ in 0..params.train_iters {
                source.sample_into(label, noise, &mut pattern)?;
                model.train(&pattern, label)?;
            }
        }
        model.save(model_path)?;
    }

    let model = Classifier::load(model_path)?;
    debug!(noise_pct, cells = model.stats().cells, "model reloaded");

    let mut confusion = ConfusionMatrix::new(params.classes);
    for label in 0..params.classes {
        for _ in 0..params.test_iters {
            source.sample_into(label, noise, &mut pattern)?;
            confusion.record(label, model.classify(&pattern)?)?;
        }
    }

    Ok(SweepRow {
        noise: noise_pct,
        accuracy: confusion.accuracy(),
        hits: confusion.hits(),
        misses: confusion.misses(),
    })
}

fn report(model: &Classifier) -> ModelReport {
    ModelReport {
        input_bits: model.input_bits(),
        tuple_size: model.tuple_size(),
        tuples: model.tuple_count(),
        classes: model.classes(),
        seed: model.seed(),
        saturation: model.saturation(),
        cells_per_class: (0..model.classes())
            .filter_map(|label| model.discriminator(label).map(|d| d.cells()))
            .collect(),
        stats: model.stats(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Sweep {
            length,
            tuple_size,
            classes,
            train_iters,
            test_iters,
            noise_step,
            seed,
            model,
            json,
        } => {
            let params = SweepParams {
                length,
                tuple_size,
                classes,
                train_iters,
                test_iters,
                seed,
            };
            info!(length, tuple_size, classes, train_iters, test_iters, "starting noise sweep");
            for noise_pct in (0..=100).step_by(noise_step as usize) {
                let row = sweep_level(&params, noise_pct, &model)?;
                if json {
                    println!("{}", serde_json::to_string(&row)?);
                } else {
                    println!("Noise = {}, Accuracy = {:.6}", row.noise, row.accuracy);
                }
            }
        }
        Commands::Inspect { model, json } => {
            let loaded = Classifier::load(&model)?;
            let r = report(&loaded);
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("Model: {}", model.display());
                println!(
                    "  input bits {}, tuple size {}, tuples {}, classes {}",
                    r.input_bits, r.tuple_size, r.tuples, r.classes
                );
                println!("  seed {}, saturation {}", r.seed, r.saturation);
                println!(
                    "  cells {}, max counter {}, saturated {}",
                    r.stats.cells, r.stats.max_counter, r.stats.saturated
                );
                for (label, cells) in r.cells_per_class.iter().enumerate() {
                    println!("  class {:>3}: {} cells", label, cells);
                }
            }
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                return Err(format!("{} exists, pass --force to overwrite", path.display()).into());
            }
            ClassifierConfig::default().save_to_file(&path)?;
            println!("Wrote default config to {}", path.display());
        }
        Commands::TrainDemo {
            config,
            out,
            iters,
            noise,
        } => {
            let config = ClassifierConfig::from_file_with_env(&config)?;
            let mut model = Classifier::from_config(&config)?;
            let mut source = PatternSource::new(config.input_bits, config.classes, config.seed);

            for label in 0..config.classes {
                for _ in 0..iters {
                    let p = source.sample(label, noise)?;
                    model.train(&p, label)?;
                }
            }

            let mut confusion = ConfusionMatrix::new(config.classes);
            for label in 0..config.classes {
                let p = source.sample(label, noise)?;
                confusion.record(label, model.classify(&p)?)?;
            }

            model.save(&out)?;
            info!(path = %out.display(), cells = model.stats().cells, "model saved");
            println!(
                "Trained {} classes x {} presentations, holdout accuracy {:.3}, saved to {}",
                config.classes,
                iters,
                confusion.accuracy(),
                out.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sweep_level_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.bin");
        let params = SweepParams {
            length: 32,
            tuple_size: 8,
            classes: 3,
            train_iters: 10,
            test_iters: 10,
            seed: 4,
        };
        let row = sweep_level(&params, 0, &path).unwrap();
        assert_eq!(row.hits + row.misses, 30);
        assert_eq!(row.accuracy, 1.0);
        assert!(path.exists());

        let line = serde_json::to_string(&row).unwrap();
        assert!(line.contains("\"noise\":0"));
    }

    #[test]
    fn test_report_lists_every_class() {
        let mut model = Classifier::new(16, 4, 3, 0).unwrap();
        model.train(&[true; 16], 2).unwrap();
        let r = report(&model);
        assert_eq!(r.cells_per_class, vec![0, 0, 4]);
        assert_eq!(r.stats.cells, 4);
    }

    #[test]
    fn test_cli_parses_sweep_flags() {
        let cli = Cli::try_parse_from(["ramnet", "sweep", "--noise-step", "10", "--json"]).unwrap();
        match cli.cmd {
            Commands::Sweep {
                noise_step, json, ..
            } => {
                assert_eq!(noise_step, 10);
                assert!(json);
            }
            _ => panic!("expected sweep"),
        }
        assert!(Cli::try_parse_from(["ramnet", "sweep", "--noise-step", "0"]).is_err());
    }
}

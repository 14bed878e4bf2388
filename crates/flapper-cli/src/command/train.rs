use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use flapper_training::{
    arena::{Arena, ArenaConfig},
    history::GenerationHistory,
};
use tracing::debug;

use crate::{schema::training_report::TrainingReport, util};

/// Frame cap applied when neither the flags nor the config file set one, so
/// that a perfect controller cannot stall training forever.
const DEFAULT_FRAME_LIMIT: u64 = 20_000;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of generations to train
    #[arg(long, default_value_t = 100)]
    generations: u32,
    /// Agents per generation
    #[arg(long)]
    population: Option<usize>,
    /// Per-weight mutation probability
    #[arg(long)]
    mutation_rate: Option<f64>,
    /// Seed for the random source (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Kill agents still alive after this many frames
    #[arg(long)]
    max_frames: Option<u64>,
    /// Arena configuration file (JSON); flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn arena_config(&self) -> anyhow::Result<ArenaConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("arena config", path)?,
            None => ArenaConfig::default(),
        };
        if let Some(size) = self.population {
            config.population.size = size;
        }
        if let Some(rate) = self.mutation_rate {
            config.population.mutation_rate = rate;
        }
        config.max_frames_per_generation = self
            .max_frames
            .or(config.max_frames_per_generation)
            .or(Some(DEFAULT_FRAME_LIMIT));
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.arena_config()?;
    let seed = arg.seed.unwrap_or_else(rand::random);
    let started_at = Utc::now();
    debug!(?config, seed, "arena configuration");

    let mut arena: Arena =
        Arena::with_seed(config.clone(), seed).context("Invalid arena configuration")?;
    let mut history = GenerationHistory::new();

    eprintln!(
        "Training {} generations of {} agents (seed {seed})",
        arg.generations, config.population.size
    );

    let mut final_fitness = None;
    for _ in 0..arg.generations {
        let result = arena.run_generation(&mut history);
        let new_record = history
            .records()
            .next()
            .is_some_and(|record| record.is_new_record);

        eprintln!("Generation #{}:", result.generation);
        eprintln!(
            "  Best:    score {} ({} pipes){}",
            result.best_score,
            result.best_pipes_passed,
            if new_record { " - new record" } else { "" }
        );
        eprintln!("  Fitness Stats:");
        eprintln!("    Min:        {:.3}", result.fitness.min);
        eprintln!("    Max:        {:.3}", result.fitness.max);
        eprintln!("    Mean:       {:.3}", result.fitness.mean);
        eprintln!("    NormStddev: {:.3}", result.fitness.normalized_std_dev);

        final_fitness = Some(result.fitness);
    }

    let report = TrainingReport {
        started_at,
        finished_at: Utc::now(),
        seed,
        config,
        generations: arg.generations,
        best_score: history.best_score(),
        best_generation: history.best_generation(),
        final_fitness,
        history: history.records().copied().collect(),
        chart: history.chart_points().to_vec(),
    };
    util::save_json(&report, arg.output.as_deref())?;

    eprintln!();
    eprintln!("Training completed");
    if let Some(path) = &arg.output {
        eprintln!("  Report: {}", path.display());
    }
    eprintln!("  Seed: {}", report.seed);
    eprintln!(
        "  Best score: {} (generation {})",
        report.best_score, report.best_generation
    );

    Ok(())
}

use chrono::{DateTime, Utc};
use flapper_stats::descriptive::DescriptiveStats;
use flapper_training::{
    arena::ArenaConfig,
    history::{ChartPoint, HistoryRecord},
};
use serde::{Deserialize, Serialize};

/// Result of a `train` run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub seed: u64,
    pub config: ArenaConfig,
    pub generations: u32,
    pub best_score: u32,
    pub best_generation: u32,
    /// Fitness distribution of the last finished generation.
    pub final_fitness: Option<DescriptiveStats>,
    /// Most recent generations, newest first.
    pub history: Vec<HistoryRecord>,
    pub chart: Vec<ChartPoint>,
}

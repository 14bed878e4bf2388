//! Rolling record of finished generations.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{arena::TrainingObserver, genetic::GenerationSummary};

/// Number of records kept by [`GenerationHistory::new`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One row of the history table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub generation: u32,
    pub best_score: u32,
    pub pipes_passed: u32,
    pub average_fitness: f64,
    /// The generation beat every earlier one.
    pub is_new_record: bool,
}

/// Best score of one generation, for plotting progress over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub generation: u32,
    pub best_score: u32,
}

/// The most recent generations plus the all-time best.
///
/// Records are kept newest first and capped at `capacity`; the chart series
/// keeps every generation.
///
/// # Example
///
/// ```
/// use flapper_training::{genetic::GenerationSummary, history::GenerationHistory};
///
/// let mut history = GenerationHistory::new();
/// let summary = GenerationSummary {
///     generation: 1,
///     best_score: 30,
///     best_pipes_passed: 3,
///     average_fitness: 12.5,
/// };
/// assert!(history.record(&summary).is_new_record);
/// assert_eq!(history.best_score(), 30);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct GenerationHistory {
    capacity: usize,
    records: VecDeque<HistoryRecord>,
    chart: Vec<ChartPoint>,
    best_score: u32,
    best_generation: u32,
}

impl Default for GenerationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
            chart: vec![],
            best_score: 0,
            best_generation: 1,
        }
    }

    /// Adds a finished generation and returns the stored record.
    pub fn record(&mut self, summary: &GenerationSummary) -> HistoryRecord {
        let is_new_record = summary.best_score > self.best_score;
        if is_new_record {
            self.best_score = summary.best_score;
            self.best_generation = summary.generation;
        }

        let record = HistoryRecord {
            generation: summary.generation,
            best_score: summary.best_score,
            pipes_passed: summary.best_pipes_passed,
            average_fitness: summary.average_fitness,
            is_new_record,
        };
        self.records.push_front(record);
        self.records.truncate(self.capacity);
        self.chart.push(ChartPoint {
            generation: summary.generation,
            best_score: summary.best_score,
        });
        record
    }

    /// Stored records, newest first.
    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> + '_ {
        self.records.iter()
    }

    /// Every generation's best score in chronological order.
    #[must_use]
    pub fn chart_points(&self) -> &[ChartPoint] {
        &self.chart
    }

    #[must_use]
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Generation that set the current best score (1 if none has scored).
    #[must_use]
    pub fn best_generation(&self) -> u32 {
        self.best_generation
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.chart.clear();
        self.best_score = 0;
        self.best_generation = 1;
    }
}

impl TrainingObserver for GenerationHistory {
    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        self.record(summary);
    }
}

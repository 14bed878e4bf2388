//! Summary statistics for training runs.
//!
//! - [`descriptive`]: min, max, mean, median and spread of a set of samples,
//!   used to summarize the fitness distribution of each generation
//!
//! # Example
//!
//! ```
//! use flapper_stats::descriptive::DescriptiveStats;
//!
//! let fitness = [0.0, 15.0, 30.0, 75.0];
//! let stats = DescriptiveStats::new(fitness).unwrap();
//! assert_eq!(stats.mean, 30.0);
//! assert_eq!(stats.max, 75.0);
//! ```

pub mod descriptive;

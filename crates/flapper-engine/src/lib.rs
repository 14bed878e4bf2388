//! Simulation engine for the obstacle-avoidance game.
//!
//! The engine is a closed, frame-stepped numeric simulation with no I/O:
//!
//! - [`core`] - world geometry constants and moving [`Obstacle`]s
//! - [`engine`] - [`Agent`] physics, perception, collision and scoring, plus the
//!   [`Controller`] capability that makes the jump decision
//!
//! Evolutionary training on top of the engine lives in `flapper-training`.
//!
//! # Example
//!
//! ```
//! use flapper_engine::{Agent, Controller, Obstacle, ObstacleIdGenerator};
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! struct NeverJump;
//!
//! impl Controller for NeverJump {
//!     fn predict(&self, _inputs: &[f64; 4]) -> bool {
//!         false
//!     }
//! }
//!
//! let mut rng = Pcg32::seed_from_u64(7);
//! let mut ids = ObstacleIdGenerator::new();
//! let obstacles = vec![Obstacle::new(&mut ids, 400.0, &mut rng)];
//!
//! let mut agent = Agent::new(NeverJump);
//! while !agent.is_dead() {
//!     agent.step(&obstacles);
//! }
//! assert_eq!(agent.score(), 0);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

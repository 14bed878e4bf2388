//! Evolutionary training of obstacle-avoidance controllers.
//!
//! A population of agents, each steered by a small neural network, plays the
//! game until every agent has crashed. The fittest networks are then bred into
//! the next generation, and the cycle repeats.
//!
//! # Architecture
//!
//! ```text
//! Arena (frame driver, obstacle spawner)
//!     ↓ steps every frame
//! Population (genetic algorithm)
//!     ↓ owns
//! Agent (flapper-engine)
//!     ↓ asks
//! NeuralController (4-4-1 network)
//! ```
//!
//! - [`network`] - the controller network and its forward pass
//! - [`weights`] - weight matrices, crossover and mutation
//! - [`genetic`] - population, fitness evaluation, selection and reproduction
//! - [`arena`] - the headless game loop and its progress notifications
//! - [`history`] - rolling record of finished generations
//!
//! # Example
//!
//! ```
//! use flapper_training::{
//!     arena::{Arena, ArenaConfig},
//!     history::GenerationHistory,
//! };
//!
//! let config = ArenaConfig {
//!     max_frames_per_generation: Some(500),
//!     ..ArenaConfig::default()
//! };
//! let mut arena: Arena = Arena::with_seed(config, 42).unwrap();
//! let mut history = GenerationHistory::new();
//!
//! for _ in 0..3 {
//!     let result = arena.run_generation(&mut history);
//!     println!("generation {}: best {}", result.generation, result.best_score);
//! }
//! assert_eq!(arena.generation(), 4);
//! assert_eq!(history.records().count(), 3);
//! ```
//!
//! # Randomness
//!
//! Everything random (initial weights, spawn jitter, obstacle gaps, crossover,
//! mutation, tournaments) draws from the arena's single [`rand_pcg::Pcg32`].
//! Seeding it with [`Arena::with_seed`](arena::Arena::with_seed) makes a whole
//! training run reproducible.
//!
//! # Current Limitations
//!
//! - **Fixed topology**: only the weights evolve, never the network shape
//! - **Single elite**: exactly one genome is carried over unchanged
//! - **No persistence**: trained controllers live only as long as the process

pub mod arena;
pub mod genetic;
pub mod history;
pub mod network;
pub mod weights;

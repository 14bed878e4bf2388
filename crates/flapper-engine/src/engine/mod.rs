//! Agent simulation.
//!
//! - [`Agent`] - one simulated individual: physics, perception, collision and
//!   scoring, driven one frame at a time by [`Agent::step`]
//! - [`Controller`] - the jump/no-jump decision an agent delegates to
//!
//! # Frame Flow
//!
//! Each call to [`Agent::step`] runs, in order:
//!
//! 1. Physics (gravity, top clamp, bottom death)
//! 2. Perception of the nearest unscored obstacle ahead
//! 3. Decision via the controller (upward impulse on `true`)
//! 4. Collision against every obstacle
//! 5. Scoring of every obstacle that has just been passed
//!
//! Death in steps 1 or 4 ends the frame immediately.

pub use self::{agent::*, controller::*};

mod agent;
mod controller;

//! World geometry and obstacles.
//!
//! All coordinates are in world units with the origin at the top-left corner
//! and `y` growing downwards. The world is [`WORLD_HEIGHT`] units tall; its
//! width is owned by whoever spawns obstacles.

pub use self::obstacle::*;

mod obstacle;

/// Height of the playable world.
pub const WORLD_HEIGHT: f64 = 600.0;

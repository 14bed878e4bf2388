//! Scrolling obstacles and their identifiers.
//!
//! An [`Obstacle`] is a column pair with a fixed vertical gap that moves left
//! by [`OBSTACLE_SPEED`] every frame. Obstacles are created through an
//! [`ObstacleIdGenerator`] so that each one carries an identifier agents can
//! use to score it exactly once.

use std::ops::Range;

use rand::Rng;

/// Horizontal extent of every obstacle column.
pub const OBSTACLE_WIDTH: f64 = 60.0;

/// Vertical size of the opening an agent has to fly through.
pub const GAP_HEIGHT: f64 = 180.0;

/// Distance an obstacle travels leftwards per frame.
pub const OBSTACLE_SPEED: f64 = 2.5;

/// Range the top edge of the gap is drawn from, uniformly.
pub const GAP_START_RANGE: Range<f64> = 100.0..300.0;

/// Unique identifier of an obstacle.
///
/// Identifiers are handed out by an [`ObstacleIdGenerator`] in strictly
/// increasing order and are never reused while the generator lives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display, derive_more::From,
)]
#[display("#{_0}")]
pub struct ObstacleId(u64);

impl ObstacleId {
    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Source of fresh [`ObstacleId`]s.
///
/// A single generator is owned by whoever spawns obstacles, so uniqueness is
/// scoped to that owner instead of the whole process.
///
/// # Example
///
/// ```
/// use flapper_engine::ObstacleIdGenerator;
///
/// let mut ids = ObstacleIdGenerator::new();
/// let a = ids.next_id();
/// let b = ids.next_id();
/// assert!(a < b);
///
/// ids.reset();
/// assert_eq!(ids.next_id(), a);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObstacleIdGenerator {
    next: u64,
}

impl ObstacleIdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Hands out the next unused identifier.
    pub fn next_id(&mut self) -> ObstacleId {
        let id = ObstacleId(self.next);
        self.next += 1;
        id
    }

    /// Restarts numbering from zero.
    ///
    /// Only call this when every obstacle issued so far has been discarded,
    /// otherwise identifiers will collide.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// A pair of columns with a vertical gap, scrolling from right to left.
///
/// The gap is fixed at creation and never changes for the lifetime of the
/// obstacle; only `x` moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    id: ObstacleId,
    x: f64,
    gap_start: f64,
    gap_height: f64,
    speed: f64,
}

impl Obstacle {
    /// Spawns an obstacle at `spawn_x` with a randomly placed gap.
    ///
    /// The top edge of the gap is drawn uniformly from [`GAP_START_RANGE`];
    /// the gap height and speed are the world defaults.
    ///
    /// # Arguments
    ///
    /// * `ids` - Generator the obstacle takes its identifier from
    /// * `spawn_x` - Left edge of the new obstacle, usually the world width
    /// * `rng` - Random number generator for the gap position
    ///
    /// # Examples
    ///
    /// ```
    /// use flapper_engine::{GAP_HEIGHT, GAP_START_RANGE, Obstacle, ObstacleIdGenerator};
    /// use rand::SeedableRng as _;
    /// use rand_pcg::Pcg32;
    ///
    /// let mut ids = ObstacleIdGenerator::new();
    /// let mut rng = Pcg32::seed_from_u64(7);
    /// let obstacle = Obstacle::new(&mut ids, 400.0, &mut rng);
    ///
    /// assert_eq!(obstacle.x(), 400.0);
    /// assert!(GAP_START_RANGE.contains(&obstacle.gap_start()));
    /// assert_eq!(obstacle.gap_end() - obstacle.gap_start(), GAP_HEIGHT);
    /// ```
    pub fn new<R>(ids: &mut ObstacleIdGenerator, spawn_x: f64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let gap_start = rng.random_range(GAP_START_RANGE);
        Self::with_gap(ids.next_id(), spawn_x, gap_start)
    }

    /// Builds an obstacle with an explicit gap position.
    #[must_use]
    pub const fn with_gap(id: ObstacleId, x: f64, gap_start: f64) -> Self {
        Self {
            id,
            x,
            gap_start,
            gap_height: GAP_HEIGHT,
            speed: OBSTACLE_SPEED,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ObstacleId {
        self.id
    }

    /// Left edge of the column.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub const fn width(&self) -> f64 {
        OBSTACLE_WIDTH
    }

    /// Right edge of the column.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + OBSTACLE_WIDTH
    }

    /// Top edge of the gap (bottom of the upper column).
    #[must_use]
    pub const fn gap_start(&self) -> f64 {
        self.gap_start
    }

    #[must_use]
    pub const fn gap_height(&self) -> f64 {
        self.gap_height
    }

    /// Bottom edge of the gap (top of the lower column).
    #[must_use]
    pub fn gap_end(&self) -> f64 {
        self.gap_start + self.gap_height
    }

    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Moves the obstacle one frame to the left.
    ///
    /// There is no lower bound; the owner discards the obstacle once
    /// [`Obstacle::is_off_screen`] reports true.
    pub fn advance(&mut self) {
        self.x -= self.speed;
    }

    /// Returns `true` once the whole column has left the visible area.
    #[must_use]
    pub fn is_off_screen(&self) -> bool {
        self.x < -OBSTACLE_WIDTH
    }
}

//! Simulated agents.
//!
//! An [`Agent`] falls under [`GRAVITY`], asks its [`Controller`] whether to
//! jump based on the nearest obstacle, dies on collision or on leaving the
//! world through the bottom, and scores [`POINTS_PER_OBSTACLE`] for every
//! obstacle it gets past.

use std::collections::HashSet;

use crate::{
    core::{Obstacle, ObstacleId, WORLD_HEIGHT},
    engine::controller::{Controller, INPUT_COUNT},
};

/// Fixed horizontal position of every agent.
pub const AGENT_X: f64 = 100.0;

/// Default spawn height.
pub const SPAWN_Y: f64 = 300.0;

/// Nominal radius of an agent.
pub const AGENT_RADIUS: f64 = 15.0;

/// Downward acceleration applied every frame.
pub const GRAVITY: f64 = 0.5;

/// Velocity set by a jump (negative is upwards).
pub const LIFT: f64 = -8.0;

/// Points awarded for each obstacle passed.
pub const POINTS_PER_OBSTACLE: u32 = 10;

/// Agents cannot fly above this height; they are clamped, not killed.
pub const TOP_BOUND: f64 = AGENT_RADIUS;

/// Agents falling below this height die.
pub const BOTTOM_BOUND: f64 = WORLD_HEIGHT - AGENT_RADIUS;

/// Fraction of the radius used for the collision box.
const HITBOX_SCALE: f64 = 0.8;

/// Obstacles whose right edge is left of this line are never scored.
const SCORING_HORIZON: f64 = -50.0;

const PASS_BONUS: u32 = 5;
const PASS_MULTIPLIER: f64 = 1.2;

const VELOCITY_OFFSET: f64 = 10.0;
const VELOCITY_RANGE: f64 = 20.0;
const DISTANCE_RANGE: f64 = 400.0;

/// Life cycle of an agent. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum AgentState {
    Alive,
    Dead,
}

/// One simulated individual.
///
/// An agent owns its controller exclusively. Descendants receive a clone of
/// the controller and nothing else: score, pass count and the set of scored
/// obstacles always start empty.
///
/// Score and pass count only ever grow while the agent is alive and are frozen
/// once it dies.
#[derive(Debug)]
pub struct Agent<C> {
    controller: C,
    x: f64,
    y: f64,
    velocity: f64,
    score: u32,
    pipes_passed: u32,
    fitness: f64,
    state: AgentState,
    scored: HashSet<ObstacleId>,
}

impl<C> Agent<C> {
    /// Creates an agent at the default spawn position.
    pub fn new(controller: C) -> Self {
        Self::with_position(controller, SPAWN_Y)
    }

    /// Creates an agent at the given spawn height.
    pub fn with_position(controller: C, y: f64) -> Self {
        Self {
            controller,
            x: AGENT_X,
            y,
            velocity: 0.0,
            score: 0,
            pipes_passed: 0,
            fitness: 0.0,
            state: AgentState::Alive,
            scored: HashSet::new(),
        }
    }

    /// Creates a fresh agent for the next generation carrying a copy of this
    /// agent's controller.
    #[must_use]
    pub fn descendant(&self) -> Self
    where
        C: Clone,
    {
        Self::new(self.controller.clone())
    }

    #[must_use]
    pub fn controller(&self) -> &C {
        &self.controller
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of obstacles passed so far.
    #[must_use]
    pub fn pipes_passed(&self) -> u32 {
        self.pipes_passed
    }

    /// Returns the cached fitness without recomputing it.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn state(&self) -> AgentState {
        self.state
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    /// Returns `true` if the obstacle has already been scored by this agent.
    #[must_use]
    pub fn has_passed(&self, id: ObstacleId) -> bool {
        self.scored.contains(&id)
    }

    /// Advances the agent by one frame.
    ///
    /// The frame runs in a fixed order:
    ///
    /// 1. gravity is applied and the agent moves; it is clamped at
    ///    [`TOP_BOUND`] and dies below [`BOTTOM_BOUND`],
    /// 2. if there is an unscored obstacle ahead, the controller is asked
    ///    about the nearest one and may jump,
    /// 3. touching any obstacle outside its gap kills the agent,
    /// 4. every obstacle whose right edge is now behind the agent is scored
    ///    once.
    ///
    /// Does nothing once the agent is dead.
    ///
    /// # Arguments
    ///
    /// * `obstacles` - Every obstacle currently in the world
    ///
    /// # Examples
    ///
    /// ```
    /// use flapper_engine::{Agent, Controller, Obstacle, ObstacleIdGenerator};
    ///
    /// struct NeverJump;
    ///
    /// impl Controller for NeverJump {
    ///     fn predict(&self, _inputs: &[f64; 4]) -> bool {
    ///         false
    ///     }
    /// }
    ///
    /// let mut ids = ObstacleIdGenerator::new();
    /// // already behind the agent, with the gap around the spawn height
    /// let passed = Obstacle::with_gap(ids.next_id(), 0.0, 200.0);
    ///
    /// let mut agent = Agent::new(NeverJump);
    /// agent.step(&[passed.clone()]);
    /// assert_eq!(agent.score(), 10);
    /// assert_eq!(agent.pipes_passed(), 1);
    ///
    /// // the same obstacle is never scored twice
    /// agent.step(&[passed]);
    /// assert_eq!(agent.score(), 10);
    /// ```
    pub fn step(&mut self, obstacles: &[Obstacle])
    where
        C: Controller,
    {
        if self.is_dead() {
            return;
        }

        self.velocity += GRAVITY;
        self.y += self.velocity;
        if self.y < TOP_BOUND {
            self.y = TOP_BOUND;
            self.velocity = 0.0;
        }
        if self.y > BOTTOM_BOUND {
            self.die();
            return;
        }

        if let Some(nearest) = self.nearest_obstacle(obstacles) {
            let inputs = self.observe(nearest);
            if self.controller.predict(&inputs) {
                self.jump();
            }
        }

        if obstacles.iter().any(|obstacle| self.collides_with(obstacle)) {
            self.die();
            return;
        }

        for obstacle in obstacles {
            let right = obstacle.right();
            if self.x > right && right > SCORING_HORIZON && self.scored.insert(obstacle.id()) {
                self.pipes_passed += 1;
                self.score += POINTS_PER_OBSTACLE;
            }
        }
    }

    /// Marks the agent dead and freezes its provisional fitness.
    ///
    /// Only the first call has any effect.
    pub fn die(&mut self) {
        if self.is_dead() {
            return;
        }
        self.state = AgentState::Dead;
        self.fitness = self.base_fitness();
    }

    /// Computes the fitness used for selection, caching the result.
    ///
    /// The cache is keyed on the stored value being exactly zero rather than
    /// on whether it has been computed: a zero fitness is recomputed on every
    /// call, while any non-zero value is returned as is even if the score has
    /// changed since. Callers are expected to query fitness only after the
    /// episode is over.
    pub fn calculate_fitness(&mut self) -> f64 {
        if self.fitness == 0.0 {
            let mut fitness = self.base_fitness();
            if self.pipes_passed > 0 {
                fitness *= PASS_MULTIPLIER;
            }
            self.fitness = fitness;
        }
        self.fitness
    }

    fn base_fitness(&self) -> f64 {
        f64::from(self.score + self.pipes_passed * PASS_BONUS)
    }

    fn jump(&mut self) {
        self.velocity = LIFT;
    }

    /// The closest unscored obstacle whose right edge is still ahead of the
    /// world origin. Ties go to the first one in `obstacles`.
    fn nearest_obstacle<'a>(&self, obstacles: &'a [Obstacle]) -> Option<&'a Obstacle> {
        obstacles
            .iter()
            .filter(|obstacle| !self.scored.contains(&obstacle.id()) && obstacle.right() > 0.0)
            .min_by(|a, b| a.x().total_cmp(&b.x()))
    }

    fn observe(&self, nearest: &Obstacle) -> [f64; INPUT_COUNT] {
        [
            self.y / WORLD_HEIGHT,
            (self.velocity + VELOCITY_OFFSET) / VELOCITY_RANGE,
            f64::max(0.0, nearest.x() - self.x) / DISTANCE_RANGE,
            nearest.gap_start() / WORLD_HEIGHT,
        ]
    }

    fn collides_with(&self, obstacle: &Obstacle) -> bool {
        let half = AGENT_RADIUS * HITBOX_SCALE;
        let left = self.x - half;
        let right = self.x + half;
        let top = self.y - half;
        let bottom = self.y + half;

        let overlaps_column = right > obstacle.x() && left < obstacle.right();
        let outside_gap = top < obstacle.gap_start() || bottom > obstacle.gap_end();
        overlaps_column && outside_gap
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Fixed(bool);

    impl Controller for Fixed {
        fn predict(&self, _inputs: &[f64; INPUT_COUNT]) -> bool {
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        last: Cell<Option<[f64; INPUT_COUNT]>>,
        calls: Cell<usize>,
    }

    impl Controller for Recorder {
        fn predict(&self, inputs: &[f64; INPUT_COUNT]) -> bool {
            self.last.set(Some(*inputs));
            self.calls.set(self.calls.get() + 1);
            false
        }
    }

    fn obstacle(id: u64, x: f64, gap_start: f64) -> Obstacle {
        Obstacle::with_gap(ObstacleId::from(id), x, gap_start)
    }

    #[test]
    fn test_free_fall_dies_at_bottom_bound() {
        let mut agent = Agent::new(Fixed(false));
        let mut ticks = 0;
        while !agent.is_dead() {
            agent.step(&[]);
            ticks += 1;
            assert!(ticks < 1000, "agent never died");
        }
        // y(n) = 300 + 0.25 * n * (n + 1) first exceeds 585 at n = 34
        assert_eq!(ticks, 34);
        assert_eq!(agent.score(), 0);
        assert_eq!(agent.fitness(), 0.0);
    }

    #[test]
    fn test_top_bound_clamps_without_killing() {
        let far = [obstacle(0, 1000.0, 200.0)];
        let mut agent = Agent::new(Fixed(true));
        for _ in 0..200 {
            agent.step(&far);
        }
        assert!(!agent.is_dead());
        assert_eq!(agent.y(), TOP_BOUND);
    }

    #[test]
    fn test_controller_not_consulted_without_obstacles() {
        let mut agent = Agent::new(Recorder::default());
        agent.step(&[]);
        assert_eq!(agent.controller().calls.get(), 0);
    }

    #[test]
    fn test_observation_of_nearest_obstacle() {
        let obstacles = [obstacle(0, 500.0, 120.0), obstacle(1, 250.0, 150.0)];
        let mut agent = Agent::new(Recorder::default());
        agent.step(&obstacles);

        let inputs = agent.controller().last.get().unwrap();
        let y = 300.5;
        let velocity = 0.5;
        assert_eq!(
            inputs,
            [y / 600.0, (velocity + 10.0) / 20.0, 150.0 / 400.0, 150.0 / 600.0]
        );
    }

    #[test]
    fn test_nearest_tie_goes_to_first() {
        let obstacles = [obstacle(0, 250.0, 120.0), obstacle(1, 250.0, 240.0)];
        let mut agent = Agent::new(Recorder::default());
        agent.step(&obstacles);
        let inputs = agent.controller().last.get().unwrap();
        assert_eq!(inputs[3], 120.0 / 600.0);
    }

    #[test]
    fn test_distance_input_is_clamped_at_zero() {
        // column spans the agent, gap wide open around it
        let obstacles = [obstacle(0, 80.0, 200.0)];
        let mut agent = Agent::new(Recorder::default());
        agent.step(&obstacles);
        assert!(!agent.is_dead());
        assert_eq!(agent.controller().last.get().unwrap()[2], 0.0);
    }

    #[test]
    fn test_jump_sets_lift() {
        let obstacles = [obstacle(0, 400.0, 200.0)];
        let mut agent = Agent::new(Fixed(true));
        agent.step(&obstacles);
        assert_eq!(agent.velocity(), LIFT);
        assert_eq!(agent.y(), 300.5);
    }

    #[test]
    fn test_scores_each_obstacle_once() {
        let obstacles = [obstacle(7, 0.0, 200.0)];
        let mut agent = Agent::new(Fixed(false));
        for _ in 0..5 {
            agent.step(&obstacles);
        }
        assert!(agent.has_passed(ObstacleId::from(7)));
        assert_eq!(agent.score(), POINTS_PER_OBSTACLE);
        assert_eq!(agent.pipes_passed(), 1);
    }

    #[test]
    fn test_scores_several_obstacles_in_one_step() {
        let obstacles = [
            obstacle(0, 0.0, 200.0),
            obstacle(1, -20.0, 200.0),
            obstacle(2, 10.0, 200.0),
        ];
        let mut agent = Agent::new(Fixed(false));
        agent.step(&obstacles);
        assert_eq!(agent.score(), 30);
        assert_eq!(agent.pipes_passed(), 3);
    }

    #[test]
    fn test_long_gone_obstacles_are_not_scored() {
        // right edge at -60, beyond the scoring horizon
        let obstacles = [obstacle(0, -120.0, 200.0)];
        let mut agent = Agent::new(Fixed(false));
        agent.step(&obstacles);
        assert_eq!(agent.score(), 0);
        assert!(!agent.has_passed(ObstacleId::from(0)));
    }

    #[test]
    fn test_collision_kills_before_scoring() {
        // the column at x=90 overlaps the agent, gap [100, 280] is above it
        let obstacles = [obstacle(0, 0.0, 200.0), obstacle(1, 90.0, 100.0)];
        let mut agent = Agent::new(Fixed(false));
        agent.step(&obstacles);
        assert!(agent.is_dead());
        assert_eq!(agent.score(), 0);
        assert_eq!(agent.pipes_passed(), 0);
    }

    #[test]
    fn test_inside_gap_is_safe() {
        let obstacles = [obstacle(0, 90.0, 200.0)];
        let mut agent = Agent::new(Fixed(false));
        agent.step(&obstacles);
        assert!(!agent.is_dead());
    }

    #[test]
    fn test_hitbox_is_shrunk() {
        // nominal radius would touch the column at x=114, the shrunk box does not
        let obstacles = [obstacle(0, 114.0, 100.0)];
        let mut agent = Agent::new(Fixed(false));
        agent.step(&obstacles);
        assert!(!agent.is_dead());
    }

    #[test]
    fn test_dead_agent_is_frozen() {
        let obstacles = [obstacle(0, 0.0, 200.0)];
        let mut agent = Agent::new(Fixed(false));
        assert_eq!(agent.state(), AgentState::Alive);
        agent.step(&obstacles);
        agent.die();
        assert_eq!(agent.state(), AgentState::Dead);
        assert_eq!(agent.fitness(), 15.0);

        let (y, score) = (agent.y(), agent.score());
        let more = [obstacle(1, 0.0, 200.0)];
        agent.step(&more);
        agent.die();
        assert_eq!(agent.y(), y);
        assert_eq!(agent.score(), score);
        assert_eq!(agent.fitness(), 15.0);
    }

    #[test]
    fn test_calculate_fitness_after_death_keeps_frozen_value() {
        let obstacles = [obstacle(0, 0.0, 200.0)];
        let mut agent = Agent::new(Fixed(false));
        agent.step(&obstacles);
        agent.die();
        assert_eq!(agent.calculate_fitness(), 15.0);
        assert_eq!(agent.calculate_fitness(), 15.0);
    }

    #[test]
    fn test_calculate_fitness_applies_multiplier_and_caches() {
        let mut agent = Agent::new(Fixed(false));
        agent.step(&[obstacle(0, 0.0, 200.0)]);
        let first = agent.calculate_fitness();
        assert!((first - 18.0).abs() < 1e-9);

        agent.step(&[obstacle(1, 0.0, 200.0)]);
        assert_eq!(agent.score(), 20);
        assert_eq!(agent.calculate_fitness(), first);
    }

    #[test]
    fn test_zero_fitness_is_recomputed() {
        let mut agent = Agent::new(Fixed(false));
        assert_eq!(agent.calculate_fitness(), 0.0);

        agent.step(&[obstacle(0, 0.0, 200.0)]);
        assert!((agent.calculate_fitness() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_descendant_inherits_only_controller() {
        let mut parent = Agent::with_position(Fixed(true), 420.0);
        parent.step(&[obstacle(0, 0.0, 300.0)]);
        parent.die();

        let child = parent.descendant();
        assert_eq!(child.controller(), parent.controller());
        assert_eq!(child.y(), SPAWN_Y);
        assert_eq!(child.velocity(), 0.0);
        assert_eq!(child.score(), 0);
        assert_eq!(child.pipes_passed(), 0);
        assert_eq!(child.fitness(), 0.0);
        assert!(!child.is_dead());
        assert!(!child.has_passed(ObstacleId::from(0)));
    }
}

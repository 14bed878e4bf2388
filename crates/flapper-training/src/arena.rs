//! Frame driver: scrolls obstacles, steps the population and decides when a
//! generation is over.
//!
//! An [`Arena`] is the headless game loop. The caller invokes
//! [`Arena::tick`] once per frame; pausing is simply not calling it.
//!
//! # Frame Flow
//!
//! While a generation is running, each tick:
//!
//! 1. Drops off-screen obstacles, advances the rest and spawns a new one every
//!    `spawn_interval` frames (never before `spawn_warmup`)
//! 2. Steps the population and reports the running best score
//! 3. Ends the generation once no agent is alive and at least
//!    `min_frames_per_generation` frames have been played
//!
//! After the generation ends, the arena idles for `end_delay_frames` frames
//! and then breeds the next generation.

use flapper_engine::{Obstacle, ObstacleIdGenerator};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    genetic::{
        GenerationResult, GenerationSummary, Genome, ParamsError, Population, PopulationParams,
        ScoreUpdate,
    },
    network::NeuralController,
};

/// Receives progress notifications from an [`Arena`].
pub trait TrainingObserver {
    /// Called whenever the best score of the running generation is reported,
    /// and with zeros when a new generation starts.
    fn on_score_update(&mut self, _update: ScoreUpdate) {}

    /// Called once per finished generation.
    fn on_generation_complete(&mut self, _summary: &GenerationSummary) {}
}

impl TrainingObserver for () {}

/// Arena settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Width of the visible world; obstacles spawn at this `x`.
    pub width: f64,
    /// Frames between two obstacle spawns.
    pub spawn_interval: u64,
    /// No obstacle spawns until the frame counter exceeds this.
    pub spawn_warmup: u64,
    /// A generation lasts at least this many frames.
    pub min_frames_per_generation: u64,
    /// Idle frames between the end of a generation and the next one.
    pub end_delay_frames: u64,
    /// Kills every agent still alive after this many frames.
    pub max_frames_per_generation: Option<u64>,
    pub population: PopulationParams,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            spawn_interval: 120,
            spawn_warmup: 60,
            min_frames_per_generation: 300,
            end_delay_frames: 60,
            max_frames_per_generation: None,
            population: PopulationParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ConfigError {
    #[display("invalid population parameters: {_0}")]
    #[from]
    Population(ParamsError),
    #[display("arena width must be positive, got {width}")]
    Width { width: f64 },
    #[display("spawn interval must be at least 1 frame")]
    SpawnInterval,
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width.is_nan() || self.width <= 0.0 {
            return Err(ConfigError::Width { width: self.width });
        }
        if self.spawn_interval == 0 {
            return Err(ConfigError::SpawnInterval);
        }
        self.population.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ArenaPhase {
    Running,
    /// All agents are dead; waiting for the end delay to elapse.
    GenerationEnded { at_frame: u64 },
}

/// Headless game loop owning the population, the obstacles and the single
/// random source everything draws from.
#[derive(Debug)]
pub struct Arena<C = NeuralController> {
    config: ArenaConfig,
    rng: Pcg32,
    ids: ObstacleIdGenerator,
    population: Population<C>,
    obstacles: Vec<Obstacle>,
    frame: u64,
    last_spawn_frame: u64,
    phase: ArenaPhase,
    generation_best: ScoreUpdate,
}

impl<C> Arena<C>
where
    C: Genome,
{
    /// Creates an arena seeded from the operating system.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, Pcg32::from_os_rng())
    }

    /// Creates a deterministic arena.
    pub fn with_seed(config: ArenaConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    pub fn with_rng(config: ArenaConfig, mut rng: Pcg32) -> Result<Self, ConfigError> {
        config.validate()?;
        let population = Population::new(config.population.clone(), &mut rng)?;
        let mut arena = Self {
            config,
            rng,
            ids: ObstacleIdGenerator::new(),
            population,
            obstacles: vec![],
            frame: 0,
            last_spawn_frame: 0,
            phase: ArenaPhase::Running,
            generation_best: ScoreUpdate::default(),
        };
        arena.start_round();
        Ok(arena)
    }

    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population<C> {
        &self.population
    }

    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Frames played in the current generation, including idle frames.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn phase(&self) -> ArenaPhase {
        self.phase
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.population.generation()
    }

    /// Best score and pass count reported so far in this generation.
    #[must_use]
    pub fn generation_best(&self) -> ScoreUpdate {
        self.generation_best
    }

    /// Plays one frame.
    ///
    /// Returns the result of the previous generation on the frame that breeds
    /// a new one.
    pub fn tick<O>(&mut self, observer: &mut O) -> Option<GenerationResult<C>>
    where
        O: TrainingObserver + ?Sized,
    {
        if let ArenaPhase::GenerationEnded { at_frame } = self.phase {
            self.frame += 1;
            if self.frame - at_frame >= self.config.end_delay_frames {
                return Some(self.next_generation(observer));
            }
            return None;
        }

        self.frame += 1;
        self.update_obstacles();

        let report = self.population.step(&self.obstacles);
        if let Some(leader) = report.leader {
            if leader.score > self.generation_best.score {
                self.generation_best = leader;
            }
            observer.on_score_update(self.generation_best);
        }

        let mut alive = report.alive;
        if alive > 0
            && self
                .config
                .max_frames_per_generation
                .is_some_and(|limit| self.frame >= limit)
        {
            debug!(
                generation = self.generation(),
                frame = self.frame,
                alive,
                "frame limit reached"
            );
            self.population.end_generation();
            alive = 0;
        }

        if alive == 0 && self.frame >= self.config.min_frames_per_generation {
            debug!(
                generation = self.generation(),
                frame = self.frame,
                "all agents dead"
            );
            self.phase = ArenaPhase::GenerationEnded {
                at_frame: self.frame,
            };
        }
        None
    }

    /// Ticks until the current generation has been replaced.
    ///
    /// Without `max_frames_per_generation` this never returns if some agent
    /// survives forever.
    pub fn run_generation<O>(&mut self, observer: &mut O) -> GenerationResult<C>
    where
        O: TrainingObserver + ?Sized,
    {
        loop {
            if let Some(result) = self.tick(observer) {
                return result;
            }
        }
    }

    /// Starts over from a fresh random population at generation 1.
    pub fn reset(&mut self) {
        self.population.reinitialize(&mut self.rng);
        self.ids.reset();
        self.start_round();
    }

    fn next_generation<O>(&mut self, observer: &mut O) -> GenerationResult<C>
    where
        O: TrainingObserver + ?Sized,
    {
        let result = self.population.advance_generation(&mut self.rng);
        self.start_round();
        observer.on_score_update(self.generation_best);
        observer.on_generation_complete(&result.summary());
        result
    }

    fn start_round(&mut self) {
        self.obstacles.clear();
        self.spawn_obstacle();
        self.frame = 0;
        self.last_spawn_frame = 0;
        self.phase = ArenaPhase::Running;
        self.generation_best = ScoreUpdate::default();
    }

    fn update_obstacles(&mut self) {
        self.obstacles.retain(|obstacle| !obstacle.is_off_screen());
        for obstacle in &mut self.obstacles {
            obstacle.advance();
        }
        if self.frame - self.last_spawn_frame >= self.config.spawn_interval
            && self.frame > self.config.spawn_warmup
        {
            self.spawn_obstacle();
            self.last_spawn_frame = self.frame;
        }
    }

    fn spawn_obstacle(&mut self) {
        let obstacle = Obstacle::new(&mut self.ids, self.config.width, &mut self.rng);
        debug!(id = %obstacle.id(), gap_start = obstacle.gap_start(), "obstacle spawned");
        self.obstacles.push(obstacle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        updates: Vec<ScoreUpdate>,
        summaries: Vec<GenerationSummary>,
    }

    impl TrainingObserver for Recorder {
        fn on_score_update(&mut self, update: ScoreUpdate) {
            self.updates.push(update);
        }

        fn on_generation_complete(&mut self, summary: &GenerationSummary) {
            self.summaries.push(*summary);
        }
    }

    fn small_config() -> ArenaConfig {
        ArenaConfig {
            max_frames_per_generation: Some(100),
            population: PopulationParams {
                size: 8,
                ..PopulationParams::default()
            },
            ..ArenaConfig::default()
        }
    }

    fn arena(config: ArenaConfig, seed: u64) -> Arena {
        Arena::with_seed(config, seed).unwrap()
    }

    #[test]
    fn test_starts_with_single_obstacle_at_right_edge() {
        let arena = arena(small_config(), 1);
        assert_eq!(arena.generation(), 1);
        assert_eq!(arena.frame(), 0);
        assert!(arena.phase().is_running());
        assert_eq!(arena.obstacles().len(), 1);
        assert_eq!(arena.obstacles()[0].x(), 400.0);
        assert_eq!(arena.population().agents().len(), 8);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let narrow = ArenaConfig {
            width: 0.0,
            ..ArenaConfig::default()
        };
        assert_eq!(
            Arena::<NeuralController>::with_seed(narrow, 0).unwrap_err(),
            ConfigError::Width { width: 0.0 }
        );

        let empty = ArenaConfig {
            population: PopulationParams {
                size: 0,
                ..PopulationParams::default()
            },
            ..ArenaConfig::default()
        };
        let err = Arena::<NeuralController>::with_seed(empty, 0).unwrap_err();
        assert_eq!(err, ConfigError::Population(ParamsError::EmptyPopulation));
        assert_eq!(
            err.to_string(),
            "invalid population parameters: population size must be at least 1"
        );
    }

    #[test]
    fn test_generation_waits_for_minimum_frames_and_end_delay() {
        let mut arena = arena(small_config(), 2);
        let mut recorder = Recorder::default();

        for frame in 1..300 {
            assert!(arena.tick(&mut recorder).is_none());
            assert!(arena.phase().is_running(), "ended early at frame {frame}");
        }
        // frame cap at 100 killed everyone; the minimum duration ends at 300
        assert_eq!(arena.population().alive_count(), 0);
        assert!(arena.tick(&mut recorder).is_none());
        assert_eq!(arena.phase(), ArenaPhase::GenerationEnded { at_frame: 300 });

        for _ in 301..360 {
            assert!(arena.tick(&mut recorder).is_none());
        }
        let result = arena.tick(&mut recorder).unwrap();
        assert_eq!(result.generation, 1);
        assert_eq!(arena.generation(), 2);
        assert_eq!(arena.frame(), 0);
        assert!(arena.phase().is_running());
        assert_eq!(arena.obstacles().len(), 1);
        assert_eq!(arena.population().alive_count(), 8);

        assert_eq!(recorder.summaries, vec![result.summary()]);
        assert_eq!(recorder.updates.last(), Some(&ScoreUpdate::default()));
    }

    #[test]
    fn test_running_best_never_decreases_within_generation() {
        let mut arena = arena(small_config(), 3);
        let mut recorder = Recorder::default();
        arena.run_generation(&mut recorder);

        let (last, during) = recorder.updates.split_last().unwrap();
        assert_eq!(*last, ScoreUpdate::default());
        assert!(during.windows(2).all(|w| w[0].score <= w[1].score));
        assert!(during.iter().all(|u| u.score > 0));
    }

    #[test]
    fn test_generation_best_is_highest_score_so_far() {
        let mut arena = arena(small_config(), 5);
        let mut recorder = Recorder::default();
        assert_eq!(arena.generation_best(), ScoreUpdate::default());

        while arena.phase().is_running() {
            arena.tick(&mut recorder);
            let highest = arena
                .population()
                .agents()
                .iter()
                .map(|agent| agent.score())
                .max()
                .unwrap_or(0);
            assert_eq!(arena.generation_best().score, highest);
            if highest > 0 {
                assert_eq!(recorder.updates.last(), Some(&arena.generation_best()));
            }
        }
    }

    #[test]
    fn test_unseeded_arena() {
        let arena = Arena::<NeuralController>::new(small_config()).unwrap();
        assert_eq!(arena.generation(), 1);
        assert_eq!(arena.frame(), 0);
        assert_eq!(arena.population().agents().len(), 8);
    }

    #[test]
    fn test_obstacle_spawn_cadence() {
        let mut arena = arena(small_config(), 4);
        for _ in 0..119 {
            arena.tick(&mut ());
        }
        assert_eq!(arena.obstacles().len(), 1);
        assert_eq!(arena.obstacles()[0].x(), 400.0 - 2.5 * 119.0);

        arena.tick(&mut ());
        assert_eq!(arena.obstacles().len(), 2);
        assert_eq!(arena.obstacles()[1].x(), 400.0);
        assert!(arena.obstacles()[0].id() < arena.obstacles()[1].id());

        // the first obstacle leaves the screen before the third one spawns
        for _ in 120..240 {
            arena.tick(&mut ());
        }
        assert_eq!(arena.obstacles().len(), 2);
        assert_eq!(arena.obstacles()[0].id().get(), 1);
    }

    #[test]
    fn test_no_spawn_during_warmup() {
        let config = ArenaConfig {
            spawn_interval: 30,
            ..small_config()
        };
        let mut arena = arena(config, 5);
        for _ in 0..60 {
            arena.tick(&mut ());
        }
        assert_eq!(arena.obstacles().len(), 1);
        arena.tick(&mut ());
        assert_eq!(arena.obstacles().len(), 2);
    }

    #[test]
    fn test_same_seed_same_training() {
        let mut a = arena(small_config(), 6);
        let mut b = arena(small_config(), 6);
        for _ in 0..3 {
            let ra = a.run_generation(&mut ());
            let rb = b.run_generation(&mut ());
            assert_eq!(ra.summary(), rb.summary());
            assert_eq!(ra.best_controller, rb.best_controller);
        }
    }

    #[test]
    fn test_reset_restarts_everything() {
        let mut arena = arena(small_config(), 7);
        arena.run_generation(&mut ());
        arena.run_generation(&mut ());
        assert_eq!(arena.generation(), 3);

        arena.reset();
        assert_eq!(arena.generation(), 1);
        assert_eq!(arena.frame(), 0);
        assert_eq!(arena.obstacles().len(), 1);
        assert_eq!(arena.obstacles()[0].id().get(), 0);
        assert_eq!(arena.population().best_score(), 0);
        assert_eq!(arena.population().alive_count(), 8);
    }

    #[test]
    fn test_agent_statistics_only_grow_and_freeze_on_death() {
        let config = ArenaConfig {
            population: PopulationParams {
                size: 30,
                ..PopulationParams::default()
            },
            ..ArenaConfig::default()
        };
        let mut arena = arena(config, 8);
        let snapshot = |arena: &Arena| {
            arena
                .population()
                .agents()
                .iter()
                .map(|agent| (agent.score(), agent.pipes_passed(), agent.is_dead()))
                .collect::<Vec<_>>()
        };

        let mut previous = snapshot(&arena);
        // the generation cannot end before the minimum duration
        for _ in 1..300 {
            arena.tick(&mut ());
            let current = snapshot(&arena);
            for (before, after) in previous.iter().zip(&current) {
                assert!(after.0 >= before.0 && after.1 >= before.1);
                if before.2 {
                    assert_eq!(before, after);
                }
            }
            previous = current;
        }
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: ArenaConfig = serde_json::from_str(
            r#"{ "max_frames_per_generation": 5000, "population": { "size": 12 } }"#,
        )
        .unwrap();
        assert_eq!(config.max_frames_per_generation, Some(5000));
        assert_eq!(config.population.size, 12);
        assert_eq!(config.spawn_interval, 120);
        assert_eq!(config.width, 400.0);
    }
}

//! Generational genetic algorithm over a population of agents.
//!
//! One generation is one full population lifetime: every agent is stepped
//! frame by frame until all of them are dead, then
//! [`Population::advance_generation`] breeds the next one.
//!
//! # Reproduction
//!
//! 1. **Fitness** - every agent's fitness is computed (see
//!    [`Agent::calculate_fitness`])
//! 2. **Elitism** - the single fittest agent's controller is carried over
//!    unchanged, with all statistics reset
//! 3. **Tournament selection** - each parent is the fittest of
//!    `tournament_size` agents sampled uniformly with replacement
//! 4. **Crossover** - with probability `crossover_rate` the child takes each
//!    weight from either parent, otherwise it copies the first parent
//! 5. **Mutation** - every weight of the child is perturbed with probability
//!    `mutation_rate`
//!
//! Steps 3-5 repeat until the new population is full.
//!
//! # Example
//!
//! ```
//! use flapper_training::{
//!     genetic::{Population, PopulationParams},
//!     network::NeuralController,
//! };
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! let mut rng = Pcg32::seed_from_u64(3);
//! let params = PopulationParams { size: 10, ..PopulationParams::default() };
//! let mut population = Population::<NeuralController>::new(params, &mut rng).unwrap();
//!
//! while population.step(&[]).alive > 0 {}
//!
//! let result = population.advance_generation(&mut rng);
//! assert_eq!(result.generation, 1);
//! assert_eq!(population.generation(), 2);
//! assert_eq!(population.alive_count(), 10);
//! ```

use flapper_engine::{Agent, Controller, Obstacle};
use flapper_stats::descriptive::DescriptiveStats;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::network::NeuralController;

/// A controller that can be bred.
///
/// Implementors must be plain values: [`Clone`] has to produce a copy that
/// shares no mutable state with the original.
pub trait Genome: Controller + Clone {
    /// Creates a controller with randomly initialized parameters.
    fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized;

    /// Creates a child combining the parameters of `self` and `other`.
    #[must_use]
    fn crossover<R>(&self, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized;

    /// Perturbs parameters in place, each with probability `rate`.
    fn mutate<R>(&mut self, rate: f64, rng: &mut R)
    where
        R: Rng + ?Sized;
}

/// Parameters of the genetic algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationParams {
    /// Number of agents per generation.
    pub size: usize,
    /// Per-weight mutation probability.
    pub mutation_rate: f64,
    /// Probability that a child is produced by crossover instead of cloning.
    pub crossover_rate: f64,
    /// Number of agents sampled per tournament.
    pub tournament_size: usize,
    /// Lower bound of the spawn height jitter of the first generation.
    pub spawn_y_min: f64,
    /// Upper bound (exclusive) of the spawn height jitter of the first generation.
    pub spawn_y_max: f64,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            size: 50,
            mutation_rate: 0.1,
            crossover_rate: 0.7,
            tournament_size: 3,
            spawn_y_min: 250.0,
            spawn_y_max: 450.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ParamsError {
    #[display("population size must be at least 1")]
    EmptyPopulation,
    #[display("mutation rate must be within [0, 1], got {value}")]
    MutationRate { value: f64 },
    #[display("crossover rate must be within [0, 1], got {value}")]
    CrossoverRate { value: f64 },
    #[display("tournament size must be at least 1")]
    EmptyTournament,
    #[display("spawn range [{min}, {max}) is empty")]
    EmptySpawnRange { min: f64, max: f64 },
}

impl PopulationParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let unit = 0.0..=1.0;
        if self.size == 0 {
            return Err(ParamsError::EmptyPopulation);
        }
        if !unit.contains(&self.mutation_rate) {
            return Err(ParamsError::MutationRate {
                value: self.mutation_rate,
            });
        }
        if !unit.contains(&self.crossover_rate) {
            return Err(ParamsError::CrossoverRate {
                value: self.crossover_rate,
            });
        }
        if self.tournament_size == 0 {
            return Err(ParamsError::EmptyTournament);
        }
        if self.spawn_y_min.partial_cmp(&self.spawn_y_max) != Some(std::cmp::Ordering::Less) {
            return Err(ParamsError::EmptySpawnRange {
                min: self.spawn_y_min,
                max: self.spawn_y_max,
            });
        }
        Ok(())
    }
}

/// Score and pass count of the current leader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub score: u32,
    pub pipes_passed: u32,
}

/// Outcome of one [`Population::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Agents still alive after the step.
    pub alive: usize,
    /// Highest-scoring agent stepped this frame, if any has scored at all.
    pub leader: Option<ScoreUpdate>,
}

/// Weight-free summary of a finished generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u32,
    pub best_score: u32,
    pub best_pipes_passed: u32,
    pub average_fitness: f64,
}

/// Snapshot taken when a generation ends.
#[derive(Debug, Clone)]
pub struct GenerationResult<C> {
    /// The generation that just finished.
    pub generation: u32,
    /// Raw score (not fitness) of the fittest agent.
    pub best_score: u32,
    /// Obstacles passed by the fittest agent.
    pub best_pipes_passed: u32,
    /// Mean fitness over the whole finished population.
    pub average_fitness: f64,
    /// Fitness distribution of the finished population.
    pub fitness: DescriptiveStats,
    /// Copy of the fittest agent's controller.
    pub best_controller: C,
}

impl<C> GenerationResult<C> {
    #[must_use]
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            generation: self.generation,
            best_score: self.best_score,
            best_pipes_passed: self.best_pipes_passed,
            average_fitness: self.average_fitness,
        }
    }
}

/// The set of agents of the current generation.
#[derive(Debug)]
pub struct Population<C = NeuralController> {
    params: PopulationParams,
    agents: Vec<Agent<C>>,
    generation: u32,
    best_score: u32,
}

impl<C> Population<C>
where
    C: Genome,
{
    /// Creates the first generation with random controllers and jittered
    /// spawn heights.
    pub fn new<R>(params: PopulationParams, rng: &mut R) -> Result<Self, ParamsError>
    where
        R: Rng + ?Sized,
    {
        params.validate()?;
        let mut population = Self {
            params,
            agents: vec![],
            generation: 1,
            best_score: 0,
        };
        population.reinitialize(rng);
        Ok(population)
    }

    /// Creates a population from existing agents.
    ///
    /// Following generations have `params.size` members regardless of how
    /// many agents are given here.
    pub fn from_agents(params: PopulationParams, agents: Vec<Agent<C>>) -> Result<Self, ParamsError> {
        params.validate()?;
        if agents.is_empty() {
            return Err(ParamsError::EmptyPopulation);
        }
        Ok(Self {
            params,
            agents,
            generation: 1,
            best_score: 0,
        })
    }

    /// Discards all agents and starts over from generation 1.
    pub fn reinitialize<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let spawn = self.params.spawn_y_min..self.params.spawn_y_max;
        self.agents = (0..self.params.size)
            .map(|_| {
                let controller = C::random(rng);
                Agent::with_position(controller, rng.random_range(spawn.clone()))
            })
            .collect();
        self.generation = 1;
        self.best_score = 0;
        debug!(size = self.params.size, "population initialized");
    }

    #[must_use]
    pub fn params(&self) -> &PopulationParams {
        &self.params
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent<C>] {
        &self.agents
    }

    /// The generation currently being played, starting at 1.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Best live score observed over all generations so far.
    #[must_use]
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|agent| !agent.is_dead()).count()
    }

    /// Advances every live agent by one frame.
    pub fn step(&mut self, obstacles: &[Obstacle]) -> StepReport {
        let mut leader: Option<ScoreUpdate> = None;
        for agent in self.agents.iter_mut().filter(|agent| !agent.is_dead()) {
            agent.step(obstacles);
            if agent.score() > leader.map_or(0, |l| l.score) {
                leader = Some(ScoreUpdate {
                    score: agent.score(),
                    pipes_passed: agent.pipes_passed(),
                });
            }
        }
        if let Some(leader) = leader {
            self.best_score = self.best_score.max(leader.score);
        }
        StepReport {
            alive: self.alive_count(),
            leader,
        }
    }

    /// Kills every agent that is still alive.
    pub fn end_generation(&mut self) {
        for agent in &mut self.agents {
            agent.die();
        }
    }

    /// Statistics over the currently cached fitness values.
    #[must_use]
    pub fn fitness_stats(&self) -> DescriptiveStats {
        DescriptiveStats::new(self.agents.iter().map(Agent::fitness))
            .expect("population is never empty")
    }

    /// Evaluates the finished generation and replaces it with the next one.
    ///
    /// Returns the summary of the generation that just ended; the generation
    /// counter is incremented afterwards.
    #[expect(clippy::cast_precision_loss)]
    pub fn advance_generation<R>(&mut self, rng: &mut R) -> GenerationResult<C>
    where
        R: Rng + ?Sized,
    {
        assert!(!self.agents.is_empty(), "population must not be empty");

        let fitness = self
            .agents
            .iter_mut()
            .map(Agent::calculate_fitness)
            .collect::<Vec<_>>();
        let mut best_index = 0;
        for (i, f) in fitness.iter().enumerate() {
            if *f > fitness[best_index] {
                best_index = i;
            }
        }
        let average_fitness = fitness.iter().sum::<f64>() / fitness.len() as f64;

        let best = &self.agents[best_index];
        let result = GenerationResult {
            generation: self.generation,
            best_score: best.score(),
            best_pipes_passed: best.pipes_passed(),
            average_fitness,
            fitness: DescriptiveStats::new(fitness).expect("population is never empty"),
            best_controller: best.controller().clone(),
        };

        let mut next = Vec::with_capacity(self.params.size);
        next.push(best.descendant());
        while next.len() < self.params.size {
            let a = tournament_select(&mut self.agents, self.params.tournament_size, rng);
            let b = tournament_select(&mut self.agents, self.params.tournament_size, rng);
            let (parent_a, parent_b) = (self.agents[a].controller(), self.agents[b].controller());

            let mut child = if rng.random_bool(self.params.crossover_rate) {
                parent_a.crossover(parent_b, rng)
            } else {
                parent_a.clone()
            };
            child.mutate(self.params.mutation_rate, rng);
            next.push(Agent::new(child));
        }

        self.agents = next;
        self.generation += 1;

        info!(
            generation = result.generation,
            best_score = result.best_score,
            pipes_passed = result.best_pipes_passed,
            average_fitness = result.average_fitness,
            "generation completed",
        );
        result
    }
}

/// Selects a parent by tournament and returns its index.
///
/// Draws `tournament_size` agents uniformly at random with replacement and
/// keeps the one with the highest fitness; on ties the earliest draw wins.
///
/// # Panics
///
/// Panics if `agents` is empty or `tournament_size` is zero.
pub fn tournament_select<C, R>(
    agents: &mut [Agent<C>],
    tournament_size: usize,
    rng: &mut R,
) -> usize
where
    R: Rng + ?Sized,
{
    assert!(!agents.is_empty(), "cannot select from an empty population");
    assert!(tournament_size > 0, "tournament size must be positive");

    let mut winner: Option<(usize, f64)> = None;
    for _ in 0..tournament_size {
        let index = rng.random_range(0..agents.len());
        let fitness = agents[index].calculate_fitness();
        if winner.is_none_or(|(_, best)| fitness > best) {
            winner = Some((index, fitness));
        }
    }
    winner.map(|(index, _)| index).expect("at least one draw")
}

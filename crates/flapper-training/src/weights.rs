//! Weight matrices of the controller network and their genetic operators.
//!
//! The network has a fixed topology of [`INPUT_COUNT`] inputs,
//! [`HIDDEN_COUNT`] hidden units and a single output, so its genome is
//! exactly 20 scalars:
//!
//! - `input_hidden[j][i]` - weight from input `j` to hidden unit `i`
//! - `hidden_output[i]` - weight from hidden unit `i` to the output
//!
//! # Operations
//!
//! - **Initialization**: [`random`] draws every weight from `[-1, 1]`
//! - **Crossover**: [`uniform_crossover`] picks each weight from one parent
//! - **Mutation**: [`mutate`] nudges a random subset of weights in place
//!
//! Weights start in `[-1, 1]` but are not clamped afterwards; repeated
//! mutation may drift them outside that range.

use flapper_engine::INPUT_COUNT;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of hidden units.
pub const HIDDEN_COUNT: usize = 4;

/// Largest perturbation a single mutation applies to one weight.
pub const MUTATION_STEP: f64 = 0.2;

/// The complete set of weights of one controller.
///
/// Plain arrays, so cloning always yields an independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub input_hidden: [[f64; HIDDEN_COUNT]; INPUT_COUNT],
    pub hidden_output: [f64; HIDDEN_COUNT],
}

impl Weights {
    /// Total number of scalar weights.
    pub const LEN: usize = INPUT_COUNT * HIDDEN_COUNT + HIDDEN_COUNT;

    /// All weights set to zero.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            input_hidden: [[0.0; HIDDEN_COUNT]; INPUT_COUNT],
            hidden_output: [0.0; HIDDEN_COUNT],
        }
    }

    /// Builds a weight set by calling `f` once per weight.
    ///
    /// Weights are visited input-hidden row by row, then hidden-output.
    ///
    /// ```
    /// use flapper_training::weights::Weights;
    ///
    /// let mut n = 0.0;
    /// let weights = Weights::from_fn(|| {
    ///     n += 1.0;
    ///     n
    /// });
    /// assert_eq!(weights.input_hidden[0], [1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(weights.hidden_output, [17.0, 18.0, 19.0, 20.0]);
    /// ```
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut() -> f64,
    {
        let input_hidden = std::array::from_fn(|_| std::array::from_fn(|_| f()));
        let hidden_output = std::array::from_fn(|_| f());
        Self {
            input_hidden,
            hidden_output,
        }
    }

    /// Iterates over every weight in [`Weights::from_fn`] order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.input_hidden
            .iter()
            .flatten()
            .chain(&self.hidden_output)
            .copied()
    }

    /// Mutable counterpart of [`Weights::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> + '_ {
        self.input_hidden
            .iter_mut()
            .flatten()
            .chain(&mut self.hidden_output)
    }
}

/// Draws every weight independently and uniformly from `[-1, 1]`.
pub fn random<R>(rng: &mut R) -> Weights
where
    R: Rng + ?Sized,
{
    Weights::from_fn(|| rng.random_range(-1.0..=1.0))
}

/// Uniform (gene-level) crossover.
///
/// Every weight of the child is copied from `p1` or `p2` with equal
/// probability, independently of all other weights. No value is ever blended.
pub fn uniform_crossover<R>(p1: &Weights, p2: &Weights, rng: &mut R) -> Weights
where
    R: Rng + ?Sized,
{
    let mut genes = p1.iter().zip(p2.iter());
    Weights::from_fn(|| {
        let (a, b) = genes.next().expect("both parents have the same shape");
        if rng.random_bool(0.5) { a } else { b }
    })
}

/// Perturbs each weight with probability `rate` by a uniform amount in
/// `[-MUTATION_STEP, MUTATION_STEP)`.
///
/// # Panics
///
/// Panics if `rate` is not within `[0, 1]`.
pub fn mutate<R>(weights: &mut Weights, rate: f64, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for w in weights.iter_mut() {
        if rng.random_bool(rate) {
            *w += rng.random_range(-MUTATION_STEP..MUTATION_STEP);
        }
    }
}

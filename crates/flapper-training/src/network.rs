//! The feed-forward controller network.

use flapper_engine::{Controller, INPUT_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    genetic::Genome,
    weights::{self, HIDDEN_COUNT, Weights},
};

/// Output activation above which the controller decides to jump.
pub const JUMP_THRESHOLD: f64 = 0.5;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A 4-4-1 network with sigmoid activations on the hidden layer and output.
///
/// The controller has no identity beyond its weights: two controllers with
/// equal weights make identical decisions.
///
/// # Example
///
/// ```
/// use flapper_engine::Controller as _;
/// use flapper_training::network::NeuralController;
///
/// // sigmoid(0) == 0.5 is not above the threshold
/// let controller = NeuralController::zeroed();
/// assert!(!controller.predict(&[0.5, 0.5, 0.5, 0.5]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralController {
    weights: Weights,
}

impl NeuralController {
    #[must_use]
    pub const fn from_weights(weights: Weights) -> Self {
        Self { weights }
    }

    /// A controller whose weights are all zero.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self::from_weights(Weights::zeroed())
    }

    #[must_use]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Runs the forward pass and returns the output activation in `(0, 1)`.
    #[must_use]
    pub fn activation(&self, inputs: &[f64; INPUT_COUNT]) -> f64 {
        let hidden: [f64; HIDDEN_COUNT] = std::array::from_fn(|i| {
            let sum = inputs
                .iter()
                .zip(&self.weights.input_hidden)
                .map(|(input, row)| input * row[i])
                .sum::<f64>();
            sigmoid(sum)
        });
        let output = hidden
            .iter()
            .zip(&self.weights.hidden_output)
            .map(|(h, w)| h * w)
            .sum::<f64>();
        sigmoid(output)
    }
}

impl Controller for NeuralController {
    fn predict(&self, inputs: &[f64; INPUT_COUNT]) -> bool {
        self.activation(inputs) > JUMP_THRESHOLD
    }
}

impl Genome for NeuralController {
    fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_weights(weights::random(rng))
    }

    fn crossover<R>(&self, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_weights(weights::uniform_crossover(
            &self.weights,
            &other.weights,
            rng,
        ))
    }

    fn mutate<R>(&mut self, rate: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        weights::mutate(&mut self.weights, rate, rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_zero_weights_never_jump() {
        let a = NeuralController::zeroed();
        let b = NeuralController::zeroed();
        let mut rng = Pcg32::seed_from_u64(21);
        for _ in 0..100 {
            let inputs: [f64; INPUT_COUNT] = std::array::from_fn(|_| rng.random_range(-5.0..5.0));
            assert_eq!(a.activation(&inputs), 0.5);
            assert!(!a.predict(&inputs));
            assert!(!b.predict(&inputs));
        }
    }

    #[test]
    fn test_predict_is_pure() {
        let mut rng = Pcg32::seed_from_u64(22);
        let controller = NeuralController::random(&mut rng);
        let inputs = [0.5, 0.525, 0.375, 0.25];
        let first = controller.predict(&inputs);
        for _ in 0..10 {
            assert_eq!(controller.predict(&inputs), first);
        }
    }

    #[test]
    fn test_forward_pass_by_hand() {
        let mut weights = Weights::zeroed();
        weights.input_hidden[0] = [1.0, 0.0, 0.0, 0.0];
        weights.hidden_output = [2.0, -1.0, 0.0, 0.0];
        let controller = NeuralController::from_weights(weights);

        let inputs = [1.0, 0.0, 0.0, 0.0];
        let h0 = sigmoid(1.0);
        let h1 = sigmoid(0.0);
        let expected = sigmoid(2.0 * h0 - h1);
        assert!((controller.activation(&inputs) - expected).abs() < 1e-12);
        assert!(controller.predict(&inputs));
    }

    #[test]
    fn test_negative_output_does_not_jump() {
        let weights = Weights {
            input_hidden: [[0.0; HIDDEN_COUNT]; INPUT_COUNT],
            hidden_output: [-1.0; HIDDEN_COUNT],
        };
        let controller = NeuralController::from_weights(weights);
        assert!(!controller.predict(&[0.3, 0.4, 0.5, 0.6]));
    }

    #[test]
    fn test_clone_is_isolated_from_mutation() {
        let mut rng = Pcg32::seed_from_u64(23);
        let source = NeuralController::random(&mut rng);
        let snapshot = source.weights().clone();

        let mut copy = source.clone();
        copy.mutate(1.0, &mut rng);

        assert_eq!(source.weights(), &snapshot);
        assert_ne!(copy.weights(), &snapshot);
    }

    #[test]
    fn test_crossover_result_is_gene_wise() {
        let mut rng = Pcg32::seed_from_u64(24);
        let a = NeuralController::random(&mut rng);
        let b = NeuralController::random(&mut rng);
        let child = a.crossover(&b, &mut rng);
        for ((c, x), y) in child
            .weights()
            .iter()
            .zip(a.weights().iter())
            .zip(b.weights().iter())
        {
            assert!(c == x || c == y);
        }
    }
}

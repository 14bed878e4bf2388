//! The decision interface between an agent and whatever drives it.

/// Number of values an agent feeds to its controller each frame.
pub const INPUT_COUNT: usize = 4;

/// The decision-making capability of an agent.
///
/// A controller maps the normalized observation of the nearest obstacle to a
/// single jump decision. Implementations must be pure: the same inputs with
/// the same internal parameters always produce the same answer.
///
/// The observation vector is, in order:
///
/// 1. agent height / world height
/// 2. (vertical velocity + 10) / 20
/// 3. horizontal distance to the obstacle (clamped at 0) / 400
/// 4. gap start of the obstacle / world height
pub trait Controller {
    /// Returns `true` if the agent should jump this frame.
    fn predict(&self, inputs: &[f64; INPUT_COUNT]) -> bool;
}

impl<C> Controller for Box<C>
where
    C: Controller + ?Sized,
{
    fn predict(&self, inputs: &[f64; INPUT_COUNT]) -> bool {
        (**self).predict(inputs)
    }
}

impl<C> Controller for &C
where
    C: Controller + ?Sized,
{
    fn predict(&self, inputs: &[f64; INPUT_COUNT]) -> bool {
        (**self).predict(inputs)
    }
}

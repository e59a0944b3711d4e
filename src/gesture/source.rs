use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::GestureLabel;

/// Produces the next gesture on each timer tick.
///
/// The random simulator stands in for a real detector; a detector that
/// pushes results instead goes through `SessionHandle::report_gesture`.
pub trait GestureSource: Send {
    fn next_gesture(&mut self) -> GestureLabel;
}

/// Uniform, memoryless draw over [`GestureLabel::ALL`].
pub struct RandomGestureSource {
    rng: StdRng,
}

impl RandomGestureSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl GestureSource for RandomGestureSource {
    fn next_gesture(&mut self) -> GestureLabel {
        let idx = self.rng.gen_range(0..GestureLabel::ALL.len());
        GestureLabel::ALL[idx]
    }
}

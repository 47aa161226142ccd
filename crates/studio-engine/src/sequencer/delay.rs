//! Delay sources for simulated node processing

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::scheduler::Millis;

/// Produces the delay before each node's processing notification
pub trait DelaySource: Send {
    fn next_delay(&mut self) -> Millis;
}

/// Independent draws, uniform over `[min, max]` milliseconds
pub struct UniformDelay {
    rng: StdRng,
    min: Millis,
    max: Millis,
}

impl UniformDelay {
    pub fn new(min: Millis, max: Millis) -> Self {
        Self::with_rng(StdRng::from_entropy(), min, max)
    }

    /// Reproducible draws for a given seed
    pub fn seeded(min: Millis, max: Millis, seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), min, max)
    }

    fn with_rng(rng: StdRng, min: Millis, max: Millis) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { rng, min, max }
    }
}

impl DelaySource for UniformDelay {
    fn next_delay(&mut self) -> Millis {
        self.rng.gen_range(self.min..=self.max)
    }
}

/// Replays a fixed list of delays, repeating the last one when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedDelay {
    delays: VecDeque<Millis>,
    last: Millis,
}

impl ScriptedDelay {
    pub fn new(delays: impl IntoIterator<Item = Millis>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            last: 0,
        }
    }
}

impl DelaySource for ScriptedDelay {
    fn next_delay(&mut self) -> Millis {
        if let Some(delay) = self.delays.pop_front() {
            self.last = delay;
        }
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_delay_stays_in_range() {
        let mut delays = UniformDelay::seeded(500, 2000, 7);
        for _ in 0..1_000 {
            let delay = delays.next_delay();
            assert!((500..=2000).contains(&delay));
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let mut a = UniformDelay::seeded(500, 2000, 42);
        let mut b = UniformDelay::seeded(500, 2000, 42);
        let first: Vec<_> = (0..10).map(|_| a.next_delay()).collect();
        let second: Vec<_> = (0..10).map(|_| b.next_delay()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scripted_delay_repeats_last() {
        let mut delays = ScriptedDelay::new([10, 20]);
        assert_eq!(delays.next_delay(), 10);
        assert_eq!(delays.next_delay(), 20);
        assert_eq!(delays.next_delay(), 20);
    }
}

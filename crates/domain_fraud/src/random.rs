//! Injectable randomness for the heuristic scorer
//!
//! The heuristic adds a small jitter to its score and reports a sampled
//! confidence. Both draws come from a [`RandomSource`] passed in by the
//! caller so that scoring is reproducible under test.

use rand::Rng;

/// Maximum absolute jitter added to a heuristic score
pub const JITTER_BOUND: f64 = 0.05;

/// Range of the reported heuristic confidence
pub const CONFIDENCE_RANGE: (f64, f64) = (0.85, 0.98);

/// Source of the two random draws made per heuristic score
pub trait RandomSource {
    /// Uniform perturbation within `[-JITTER_BOUND, JITTER_BOUND]`
    fn jitter(&mut self) -> f64;

    /// Uniform confidence within `CONFIDENCE_RANGE`
    fn confidence(&mut self) -> f64;
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`]
#[derive(Debug)]
pub struct RngSource<R>(pub R);

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<rand::rngs::ThreadRng> {
    /// Thread-local RNG, for request-time scoring
    pub fn thread() -> Self {
        Self(rand::thread_rng())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn jitter(&mut self) -> f64 {
        self.0.gen_range(-JITTER_BOUND..=JITTER_BOUND)
    }

    fn confidence(&mut self) -> f64 {
        self.0.gen_range(CONFIDENCE_RANGE.0..=CONFIDENCE_RANGE.1)
    }
}

/// Returns the same draws every time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom {
    pub jitter: f64,
    pub confidence: f64,
}

impl FixedRandom {
    pub fn new(jitter: f64, confidence: f64) -> Self {
        Self { jitter, confidence }
    }

    /// No jitter, confidence at the lower end of the range
    pub fn zero_jitter() -> Self {
        Self::new(0.0, CONFIDENCE_RANGE.0)
    }
}

impl Default for FixedRandom {
    fn default() -> Self {
        Self::zero_jitter()
    }
}

impl RandomSource for FixedRandom {
    fn jitter(&mut self) -> f64 {
        self.jitter
    }

    fn confidence(&mut self) -> f64 {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rng_source_draws_stay_in_range() {
        let mut source = RngSource::new(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            let j = source.jitter();
            assert!((-JITTER_BOUND..=JITTER_BOUND).contains(&j));
            let c = source.confidence();
            assert!((CONFIDENCE_RANGE.0..=CONFIDENCE_RANGE.1).contains(&c));
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RngSource::new(StdRng::seed_from_u64(11));
        let mut b = RngSource::new(StdRng::seed_from_u64(11));
        assert_eq!(a.jitter(), b.jitter());
        assert_eq!(a.confidence(), b.confidence());
    }
}

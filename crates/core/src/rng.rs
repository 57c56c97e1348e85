//! RNG module - deterministic random numbers for world layout and pirate AI
//!
//! A small LCG keeps runs reproducible for a given seed, which the tests and
//! the control adapter rely on.

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // High bits of an LCG are far better distributed than the low ones.
        (self.next_u32() >> 8) % max
    }

    /// Returns true with probability `1 / odds`
    pub fn one_in(&mut self, odds: u32) -> bool {
        odds <= 1 || self.next_range(odds) == 0
    }

    /// Pick a lane index in {-1, 0, 1}
    pub fn next_lane(&mut self) -> i8 {
        self.next_range(3) as i8 - 1
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

use crate::constants::HEADING_STEPS;
use crate::geometry::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One gene: the displacement applied to a dot for a single step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Direction(Vec2);

impl Direction {
    /// A vector of length `speed` pointing along the +x axis rotated by `degrees`.
    pub fn from_heading(degrees: f64, speed: f64) -> Self {
        Self(Vec2::new(speed, 0.0).rotated(degrees))
    }

    /// Sample a heading from the whole degrees `0..360`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, speed: f64) -> Self {
        let degrees = rng.random_range(0..HEADING_STEPS);
        Self::from_heading(f64::from(degrees), speed)
    }

    pub fn vector(self) -> Vec2 {
        self.0
    }
}

/// Ordered per-step directions. Grows lazily as a dot walks past its end.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    directions: Vec<Direction>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_directions(directions: Vec<Direction>) -> Self {
        Self { directions }
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Direction> {
        self.directions.get(index).copied()
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn push(&mut self, direction: Direction) {
        self.directions.push(direction);
    }

    /// `prefix[..cut]` followed by `suffix[cut..end]`.
    ///
    /// `end` is clipped to `suffix.len()`, and a suffix range that would be
    /// negative contributes nothing. `cut` is clipped to `prefix.len()`.
    pub fn splice(prefix: &Genome, suffix: &Genome, cut: usize, end: usize) -> Genome {
        let cut_prefix = cut.min(prefix.len());
        let end = end.min(suffix.len());
        let mut directions = Vec::with_capacity(cut_prefix + end.saturating_sub(cut));
        directions.extend_from_slice(&prefix.directions[..cut_prefix]);
        if end > cut {
            directions.extend_from_slice(&suffix.directions[cut..end]);
        }
        Genome { directions }
    }

    /// Replace each gene with a fresh random direction with `probability`.
    /// Length is preserved.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, probability: f64, speed: f64) {
        debug_assert!(
            (0.0..=1.0).contains(&probability),
            "mutation probability must lie in [0, 1]"
        );
        for gene in &mut self.directions {
            if rng.random::<f64>() < probability {
                *gene = Direction::random(rng, speed);
            }
        }
    }
}

use crate::config::ReproductionMode;
use crate::dot::Dot;
use crate::error::EvolutionError;
use crate::geometry::Vec2;
use rand::{Rng, RngCore};
use std::fmt;

/// Per-generation constants shared by every child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breeding {
    pub start: Vec2,
    pub mutation_probability: f64,
}

/// Produces children from a ranked mating pool.
pub trait Reproduction: fmt::Debug + Send + Sync {
    fn mode(&self) -> ReproductionMode;

    /// Append exactly `count` mutated children to `out`. Parents are drawn
    /// uniformly from `pool` with replacement.
    fn breed(
        &self,
        pool: &[Dot],
        count: usize,
        breeding: &Breeding,
        rng: &mut dyn RngCore,
        out: &mut Vec<Dot>,
    ) -> Result<(), EvolutionError>;
}

pub fn for_mode(mode: ReproductionMode) -> Box<dyn Reproduction> {
    match mode {
        ReproductionMode::Crossover => Box::new(CrossoverReproduction),
        ReproductionMode::Replicate => Box::new(ReplicateReproduction),
    }
}

fn pick<'a>(pool: &'a [Dot], rng: &mut dyn RngCore) -> Result<&'a Dot, EvolutionError> {
    if pool.is_empty() {
        return Err(EvolutionError::EmptyMatingPool);
    }
    Ok(&pool[rng.random_range(0..pool.len())])
}

/// Two parents, one cut, two children per pairing. When `count` is odd the
/// second child of the final pairing is discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrossoverReproduction;

impl Reproduction for CrossoverReproduction {
    fn mode(&self) -> ReproductionMode {
        ReproductionMode::Crossover
    }

    fn breed(
        &self,
        pool: &[Dot],
        count: usize,
        breeding: &Breeding,
        rng: &mut dyn RngCore,
        out: &mut Vec<Dot>,
    ) -> Result<(), EvolutionError> {
        let target = out.len() + count;
        out.reserve(count);
        while out.len() < target {
            let parent1 = pick(pool, rng)?;
            let parent2 = pick(pool, rng)?;
            let (mut first, mut second) = Dot::crossover(parent1, parent2, breeding.start, rng)?;
            first.mutate(breeding.mutation_probability, rng);
            second.mutate(breeding.mutation_probability, rng);
            out.push(first);
            if out.len() < target {
                out.push(second);
            }
        }
        Ok(())
    }
}

/// One parent copied and mutated per child.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplicateReproduction;

impl Reproduction for ReplicateReproduction {
    fn mode(&self) -> ReproductionMode {
        ReproductionMode::Replicate
    }

    fn breed(
        &self,
        pool: &[Dot],
        count: usize,
        breeding: &Breeding,
        rng: &mut dyn RngCore,
        out: &mut Vec<Dot>,
    ) -> Result<(), EvolutionError> {
        out.reserve(count);
        for _ in 0..count {
            let mut child = pick(pool, rng)?.replicate(breeding.start);
            child.mutate(breeding.mutation_probability, rng);
            out.push(child);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Direction, Genome};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    const BREEDING: Breeding = Breeding {
        start: Vec2::new(300.0, 570.0),
        mutation_probability: 0.0,
    };

    fn pool(steps: &[usize]) -> Vec<Dot> {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        steps
            .iter()
            .map(|&n| {
                let mut dot = Dot::new(Vec2::new(300.0, 300.0), 5.0);
                for _ in 0..n {
                    dot.step(&mut rng);
                }
                dot
            })
            .collect()
    }

    #[test]
    fn strategies_report_their_mode() {
        for mode in [ReproductionMode::Crossover, ReproductionMode::Replicate] {
            assert_eq!(for_mode(mode).mode(), mode);
        }
    }

    #[test]
    fn crossover_fills_odd_counts_exactly() {
        let pool = pool(&[8, 12, 5]);
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut out = Vec::new();
        CrossoverReproduction
            .breed(&pool, 7, &BREEDING, &mut rng, &mut out)
            .unwrap();
        assert_eq!(out.len(), 7);
        for child in &out {
            assert_eq!(child.position(), BREEDING.start);
            assert_eq!(child.move_index(), 0);
            assert!(child.genome().len() <= 12);
        }
    }

    #[test]
    fn replicate_without_mutation_copies_a_parent() {
        let pool = pool(&[3, 9]);
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let mut out = Vec::new();
        ReplicateReproduction
            .breed(&pool, 10, &BREEDING, &mut rng, &mut out)
            .unwrap();
        assert_eq!(out.len(), 10);
        for child in &out {
            assert!(pool.iter().any(|p| p.genome() == child.genome()));
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let mut out = Vec::new();
        assert_eq!(
            ReplicateReproduction.breed(&[], 1, &BREEDING, &mut rng, &mut out),
            Err(EvolutionError::EmptyMatingPool)
        );
    }

    #[test]
    fn zero_count_breeds_nothing() {
        let parent = Dot::with_genome(
            Vec2::ZERO,
            5.0,
            Genome::from_directions(vec![Direction::from_heading(0.0, 5.0)]),
        );
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let mut out = Vec::new();
        CrossoverReproduction
            .breed(&[parent], 0, &BREEDING, &mut rng, &mut out)
            .unwrap();
        assert!(out.is_empty());
    }
}

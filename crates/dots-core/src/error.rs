use crate::config::EvolutionConfigError;
use thiserror::Error;

/// Failures raised while building or evolving a population.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] EvolutionConfigError),
    #[error("fitness queried before the dot took a step")]
    FitnessBeforeFirstStep,
    #[error("elitism_count ({elitism}) exceeds population_size ({population})")]
    ElitismExceedsPopulation { elitism: usize, population: usize },
    #[error("elitism_count ({elitism}) exceeds mating_pool_size ({pool})")]
    ElitismExceedsMatingPool { elitism: usize, pool: usize },
    #[error("crossover requires both parents to have taken at least one step")]
    EmptyCrossoverRange,
    #[error("cannot select from an empty mating pool")]
    EmptyMatingPool,
}

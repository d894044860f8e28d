use crate::config::{EvolutionConfig, ReproductionMode};
use crate::dot::Dot;
use crate::error::EvolutionError;
use crate::metrics::GenerationReport;
use crate::obstacle::{CollisionQuery, Goal};
use crate::reproduction::{self, Breeding, Reproduction};
use crate::rng::create_rng;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::ops::Range;
use tracing::{debug, trace};

mod selection;


/// Result of one generational transition.
#[derive(Clone, Debug)]
pub struct Evolved {
    /// Fittest dot of the generation that just ended, as it was evaluated.
    pub best: Dot,
    pub report: GenerationReport,
}

/// The dots of one generation plus everything needed to breed the next.
///
/// Obstacles are not owned; they are passed to [`Population::step`].
pub struct Population<R = ChaCha12Rng> {
    dots: Vec<Dot>,
    // Keep config private to preserve constructor invariants.
    config: EvolutionConfig,
    goal: Goal,
    reproduction: Box<dyn Reproduction>,
    alive_count: usize,
    elites: Range<usize>,
    generation: u64,
    ticks: usize,
    rng: R,
}

impl Population<ChaCha12Rng> {
    /// Seed the random source from `config.seed`.
    pub fn new(config: EvolutionConfig, goal: Goal) -> Result<Self, EvolutionError> {
        let rng = create_rng(config.seed);
        Self::with_rng(config, goal, rng)
    }
}

impl<R: Rng> Population<R> {
    /// `population_size` fresh dots with empty genomes at the start position.
    pub fn with_rng(config: EvolutionConfig, goal: Goal, rng: R) -> Result<Self, EvolutionError> {
        let dots = (0..config.population_size)
            .map(|_| Dot::new(config.start_position, config.step_speed))
            .collect();
        Self::restore(config, goal, dots, 0, None, rng)
    }

    /// Assemble a population from existing dots, validating every invariant
    /// the engine relies on.
    pub(crate) fn restore(
        config: EvolutionConfig,
        goal: Goal,
        dots: Vec<Dot>,
        generation: u64,
        elites: Option<Range<usize>>,
        rng: R,
    ) -> Result<Self, EvolutionError> {
        Self::validate_config(&config)?;
        debug_assert_eq!(dots.len(), config.population_size);
        let alive_count = dots.iter().filter(|d| d.is_alive()).count();
        let elites = elites
            .filter(|r| r.start <= r.end && r.end <= dots.len())
            .unwrap_or(0..0);
        Ok(Self {
            dots,
            reproduction: reproduction::for_mode(config.reproduction_mode),
            config,
            goal,
            alive_count,
            elites,
            generation,
            ticks: 0,
            rng,
        })
    }

    fn validate_config(config: &EvolutionConfig) -> Result<(), EvolutionError> {
        config.validate()?;
        if config.elitism_count > config.population_size {
            return Err(EvolutionError::ElitismExceedsPopulation {
                elitism: config.elitism_count,
                population: config.population_size,
            });
        }
        if config.elitism_count > config.mating_pool_size {
            return Err(EvolutionError::ElitismExceedsMatingPool {
                elitism: config.elitism_count,
                pool: config.mating_pool_size,
            });
        }
        Ok(())
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    /// Number of generations evolved so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reproduction_mode(&self) -> ReproductionMode {
        self.reproduction.mode()
    }

    /// Dots carried over unchanged by the most recent [`Population::evolve`].
    pub fn elites(&self) -> &[Dot] {
        &self.dots[self.elites.clone()]
    }

    pub(crate) fn elite_range(&self) -> Range<usize> {
        self.elites.clone()
    }

    /// Alive count cached by the last [`Population::step`].
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    pub fn is_active(&self) -> bool {
        self.alive_count > 0
    }

    /// Ticks stepped since the generation started.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Advance every living dot one tick. A dot dies when it leaves the
    /// field or enters a lethal obstacle; the goal never kills.
    ///
    /// Returns the number of dots that moved this tick, so the generation
    /// ends on the tick after the last dot dies.
    pub fn step<Q: CollisionQuery + ?Sized>(&mut self, obstacles: &Q) -> usize {
        let (width, height) = (self.config.field_width, self.config.field_height);
        let mut moved = 0;
        for dot in self.dots.iter_mut().filter(|d| d.is_alive()) {
            moved += 1;
            dot.step(&mut self.rng);
            if dot.is_out_of_bounds(width, height) || dot.collides(obstacles) {
                dot.kill();
            }
        }
        self.alive_count = moved;
        self.ticks += 1;
        trace!(tick = self.ticks, alive = moved, "population stepped");
        moved
    }

    /// Step until every dot has died, then evolve.
    pub fn run_generation<Q: CollisionQuery + ?Sized>(
        &mut self,
        obstacles: &Q,
    ) -> Result<Evolved, EvolutionError> {
        while self.is_active() {
            self.step(obstacles);
        }
        self.evolve()
    }

    /// Replace the dots with the next generation.
    ///
    /// The top `mating_pool_size` dots become parents; the configured
    /// strategy breeds `population_size - elitism_count` children; the top
    /// `elitism_count` parents are reset and appended unchanged.
    pub fn evolve(&mut self) -> Result<Evolved, EvolutionError> {
        let scores = self.fitness_scores()?;
        let ranked = selection::ranked_indices(&scores, self.config.mating_pool_size);
        let pool: Vec<Dot> = ranked.iter().map(|&i| self.dots[i].clone()).collect();
        let best = pool.first().cloned().ok_or(EvolutionError::EmptyMatingPool)?;
        let best_fitness = scores[ranked[0]];
        let goal_reached = scores
            .iter()
            .filter(|&&s| s >= self.config.goal_reward)
            .count();
        let report = GenerationReport::collect(
            self.generation,
            self.ticks,
            best.move_index(),
            best_fitness,
            goal_reached,
            &self.dots,
        );

        let size = self.config.population_size;
        let elitism = self.config.elitism_count;
        let breeding = Breeding {
            start: self.config.start_position,
            mutation_probability: self.config.mutation_probability,
        };
        let mut next = Vec::with_capacity(size);
        self.reproduction
            .breed(&pool, size - elitism, &breeding, &mut self.rng, &mut next)?;

        let elite_start = next.len();
        next.extend(pool.into_iter().take(elitism).map(|mut dot| {
            dot.reset(breeding.start);
            dot
        }));
        debug_assert_eq!(next.len(), size);

        self.elites = elite_start..next.len();
        self.dots = next;
        self.alive_count = self.dots.len();
        self.ticks = 0;
        self.generation += 1;

        debug!(
            generation = report.generation,
            best_moves = report.best_moves,
            goal_reached = report.goal_reached,
            best_fitness = report.best_fitness,
            "generation evolved"
        );
        Ok(Evolved { best, report })
    }
}

use crate::config::Scoring;
use crate::error::EvolutionError;
use crate::genome::{Direction, Genome};
use crate::geometry::Vec2;
use crate::obstacle::{CollisionQuery, Goal};
use rand::Rng;

/// One candidate solution: a point that replays its genome one gene per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Dot {
    // Private so that `genome.len() >= move_index` always holds.
    position: Vec2,
    genome: Genome,
    move_index: usize,
    alive: bool,
    speed: f64,
}

impl Dot {
    /// A fresh dot with an empty genome.
    pub fn new(start: Vec2, speed: f64) -> Self {
        Self::with_genome(start, speed, Genome::new())
    }

    pub fn with_genome(start: Vec2, speed: f64, genome: Genome) -> Self {
        Self {
            position: start,
            genome,
            move_index: 0,
            alive: true,
            speed,
        }
    }

    /// Rebuild a dot from stored state. `move_index` is clamped to the genome length.
    pub(crate) fn from_parts(
        position: Vec2,
        genome: Genome,
        move_index: usize,
        alive: bool,
        speed: f64,
    ) -> Self {
        let move_index = move_index.min(genome.len());
        Self {
            position,
            genome,
            move_index,
            alive,
            speed,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Advance one tick, growing the genome when the cursor runs off its end.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let direction = match self.genome.get(self.move_index) {
            Some(direction) => direction,
            None => {
                let direction = Direction::random(rng, self.speed);
                self.genome.push(direction);
                direction
            }
        };
        self.position += direction.vector();
        self.move_index += 1;
    }

    /// True when the dot lies outside `[0, width] x [0, height]`.
    pub fn is_out_of_bounds(&self, width: f64, height: f64) -> bool {
        let Vec2 { x, y } = self.position;
        x < 0.0 || x > width || y < 0.0 || y > height
    }

    pub fn collides<Q: CollisionQuery + ?Sized>(&self, obstacles: &Q) -> bool {
        obstacles.collides(self.position)
    }

    /// Goal reward when the dot's body overlaps the goal, otherwise the
    /// negated distance to its centre, plus `1 / move_index` so that shorter
    /// paths win ties.
    pub fn fitness(&self, goal: &Goal, scoring: &Scoring) -> Result<f64, EvolutionError> {
        if self.move_index == 0 {
            return Err(EvolutionError::FitnessBeforeFirstStep);
        }
        let distance = self.position.distance(goal.center);
        let score = if distance <= goal.radius + scoring.dot_radius {
            scoring.goal_reward
        } else {
            -distance
        };
        Ok(score + 1.0 / self.move_index as f64)
    }

    /// Start a new generation from `start`. The genome is kept.
    pub fn reset(&mut self, start: Vec2) {
        self.position = start;
        self.move_index = 0;
        self.alive = true;
    }

    /// Asexual copy: same genome, fresh phenotype at `start`.
    pub fn replicate(&self, start: Vec2) -> Dot {
        Dot::with_genome(start, self.speed, self.genome.clone())
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, probability: f64, rng: &mut R) {
        self.genome.mutate(rng, probability, self.speed);
    }

    /// Single-point crossover over the genes both parents executed.
    ///
    /// The cut is drawn from `0..min(m1, m2)`. The first child takes
    /// `parent1[..cut]` then `parent2[cut..m2]`; the second takes
    /// `parent2[..cut]` then `parent1[cut..m1]`. Genes a parent never
    /// executed are not inherited.
    pub fn crossover<R: Rng + ?Sized>(
        parent1: &Dot,
        parent2: &Dot,
        start: Vec2,
        rng: &mut R,
    ) -> Result<(Dot, Dot), EvolutionError> {
        let shared = parent1.move_index.min(parent2.move_index);
        if shared == 0 {
            return Err(EvolutionError::EmptyCrossoverRange);
        }
        let cut = rng.random_range(0..shared);
        Ok(Self::crossover_at(parent1, parent2, start, cut))
    }

    pub(crate) fn crossover_at(
        parent1: &Dot,
        parent2: &Dot,
        start: Vec2,
        cut: usize,
    ) -> (Dot, Dot) {
        let first = Genome::splice(&parent1.genome, &parent2.genome, cut, parent2.move_index);
        let second = Genome::splice(&parent2.genome, &parent1.genome, cut, parent1.move_index);
        (
            Dot::with_genome(start, parent1.speed, first),
            Dot::with_genome(start, parent2.speed, second),
        )
    }
}

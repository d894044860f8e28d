use crate::constants::{GOAL_OFFSET_Y, MIN_GOAL_REWARD};
use crate::geometry::Vec2;
use crate::layout::Layout;
use serde::{Deserialize, Serialize};

/// How the next generation's children are produced from the mating pool.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReproductionMode {
    /// Two parents, single-point crossover, two children per pairing.
    #[default]
    Crossover,
    /// One parent copied and mutated, one child per draw.
    Replicate,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Deterministic seed for reproducible runs.
    pub seed: u64,
    /// Field width in field units. Dots leaving `[0, field_width]` die.
    pub field_width: f64,
    /// Field height in field units. Dots leaving `[0, field_height]` die.
    pub field_height: f64,
    /// Number of dots per generation.
    pub population_size: usize,
    /// Number of top-ranked dots eligible as parents.
    pub mating_pool_size: usize,
    /// Per-gene replacement probability applied to every child.
    pub mutation_probability: f64,
    /// Number of top-ranked dots carried over unchanged.
    pub elitism_count: usize,
    /// Score awarded to a dot whose body overlaps the goal.
    pub goal_reward: f64,
    /// Radius of the goal disc used when scoring.
    pub goal_radius: f64,
    /// Radius of a dot's body used when scoring.
    pub dot_radius: f64,
    /// Length of every direction vector.
    pub step_speed: f64,
    /// Number of generations the driver runs.
    pub generations: u64,
    /// Where every dot starts a generation.
    pub start_position: Vec2,
    /// Selects the breeding strategy.
    pub reproduction_mode: ReproductionMode,
    /// Generation interval between checkpoints written by the driver.
    pub checkpoint_interval: u64,
    /// Obstacle arrangement used by the driver.
    pub layout: Layout,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            field_width: 600.0,
            field_height: 600.0,
            population_size: 500,
            mating_pool_size: 50,
            mutation_probability: 0.05,
            elitism_count: 15,
            goal_reward: 100.0,
            goal_radius: 5.0,
            dot_radius: 3.0,
            step_speed: 5.0,
            generations: 1000,
            start_position: Vec2::new(300.0, 570.0),
            reproduction_mode: ReproductionMode::Crossover,
            checkpoint_interval: 20,
            layout: Layout::CenterBar,
        }
    }
}

macro_rules! define_evolution_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum EvolutionConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for EvolutionConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_evolution_config_error! {
    InvalidPopulationSize => "population_size must be greater than 0";
    TooManyDots { max: usize, actual: usize } => "Too many dots: {} > max {}", actual, max;
    InvalidMatingPoolSize => "mating_pool_size must be greater than 0";
    MatingPoolExceedsPopulation { pool: usize, population: usize } => "mating_pool_size ({pool}) exceeds population_size ({population})";
    InvalidMutationProbability => "mutation_probability must be finite and within [0,1]";
    InvalidFieldSize => "field_width/field_height must be positive and finite";
    FieldSizeTooLarge { max: f64, actual: f64 } => "field dimension ({actual}) exceeds supported maximum ({max})";
    InvalidGoalReward { min: f64, actual: f64 } =>
        "goal_reward ({actual}) must be finite and at least {min}";
    InvalidGoalRadius => "goal_radius must be finite and non-negative";
    GoalOutsideField { radius: f64, width: f64, height: f64 } =>
        "goal of radius {radius} does not fit inside a {width} x {height} field";
    InvalidDotRadius => "dot_radius must be finite and non-negative";
    InvalidStepSpeed => "step_speed must be positive and finite";
    InvalidStartPosition => "start_position must be finite and inside the field";
    InvalidCheckpointInterval => "checkpoint_interval must be positive";
}

impl std::error::Error for EvolutionConfigError {}

impl EvolutionConfig {
    pub const MAX_FIELD_SIZE: f64 = crate::constants::MAX_FIELD_SIZE;

    pub const MAX_POPULATION_SIZE: usize = crate::constants::MAX_POPULATION_SIZE;

    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.validate_population()?;
        self.validate_field()?;
        self.validate_scoring()?;
        self.validate_motion()?;
        if self.checkpoint_interval == 0 {
            return Err(EvolutionConfigError::InvalidCheckpointInterval);
        }
        Ok(())
    }

    fn validate_population(&self) -> Result<(), EvolutionConfigError> {
        if self.population_size == 0 {
            return Err(EvolutionConfigError::InvalidPopulationSize);
        }
        if self.population_size > Self::MAX_POPULATION_SIZE {
            return Err(EvolutionConfigError::TooManyDots {
                max: Self::MAX_POPULATION_SIZE,
                actual: self.population_size,
            });
        }
        if self.mating_pool_size == 0 {
            return Err(EvolutionConfigError::InvalidMatingPoolSize);
        }
        if self.mating_pool_size > self.population_size {
            return Err(EvolutionConfigError::MatingPoolExceedsPopulation {
                pool: self.mating_pool_size,
                population: self.population_size,
            });
        }
        if !(self.mutation_probability.is_finite()
            && (0.0..=1.0).contains(&self.mutation_probability))
        {
            return Err(EvolutionConfigError::InvalidMutationProbability);
        }
        Ok(())
    }

    fn validate_field(&self) -> Result<(), EvolutionConfigError> {
        for dim in [self.field_width, self.field_height] {
            if !(dim.is_finite() && dim > 0.0) {
                return Err(EvolutionConfigError::InvalidFieldSize);
            }
            if dim > Self::MAX_FIELD_SIZE {
                return Err(EvolutionConfigError::FieldSizeTooLarge {
                    max: Self::MAX_FIELD_SIZE,
                    actual: dim,
                });
            }
        }
        // The goal is centred at (width / 2, GOAL_OFFSET_Y); its square must
        // stay inside the field. Non-finite radii are left to validate_scoring.
        let r = self.goal_radius;
        let fits = r <= GOAL_OFFSET_Y
            && GOAL_OFFSET_Y + r <= self.field_height
            && 2.0 * r <= self.field_width;
        if r.is_finite() && !fits {
            return Err(EvolutionConfigError::GoalOutsideField {
                radius: r,
                width: self.field_width,
                height: self.field_height,
            });
        }
        Ok(())
    }

    fn validate_scoring(&self) -> Result<(), EvolutionConfigError> {
        if !(self.goal_reward.is_finite() && self.goal_reward >= MIN_GOAL_REWARD) {
            return Err(EvolutionConfigError::InvalidGoalReward {
                min: MIN_GOAL_REWARD,
                actual: self.goal_reward,
            });
        }
        if !(self.goal_radius.is_finite() && self.goal_radius >= 0.0) {
            return Err(EvolutionConfigError::InvalidGoalRadius);
        }
        if !(self.dot_radius.is_finite() && self.dot_radius >= 0.0) {
            return Err(EvolutionConfigError::InvalidDotRadius);
        }
        Ok(())
    }

    fn validate_motion(&self) -> Result<(), EvolutionConfigError> {
        if !(self.step_speed.is_finite() && self.step_speed > 0.0) {
            return Err(EvolutionConfigError::InvalidStepSpeed);
        }
        let start = self.start_position;
        if !(start.is_finite()
            && (0.0..=self.field_width).contains(&start.x)
            && (0.0..=self.field_height).contains(&start.y))
        {
            return Err(EvolutionConfigError::InvalidStartPosition);
        }
        Ok(())
    }

    /// Scoring parameters handed to [`crate::dot::Dot::fitness`].
    pub fn scoring(&self) -> Scoring {
        Scoring {
            goal_reward: self.goal_reward,
            dot_radius: self.dot_radius,
        }
    }
}

/// Fitness constants that do not belong to the goal itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scoring {
    pub goal_reward: f64,
    pub dot_radius: f64,
}

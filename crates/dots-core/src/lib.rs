pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod dot;
pub mod error;
pub mod genome;
pub mod geometry;
pub mod layout;
pub mod metrics;
pub mod obstacle;
pub mod population;
pub mod reproduction;
pub mod rng;

pub use checkpoint::{CheckpointError, CheckpointStore, PopulationSnapshot};
pub use config::{EvolutionConfig, EvolutionConfigError, ReproductionMode};
pub use dot::Dot;
pub use error::EvolutionError;
pub use geometry::{Rect, Vec2};
pub use layout::Layout;
pub use metrics::{GenerationReport, GenomeStats};
pub use obstacle::{CollisionQuery, Goal, Obstacle, ObstacleField, ObstacleKind};
pub use population::{Evolved, Population};

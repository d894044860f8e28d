/// Largest valid field dimension (field units). Keeps the obstacle index and
/// coordinate arithmetic well inside f64 precision.
pub const MAX_FIELD_SIZE: f64 = 8192.0;

/// Upper bound on dots per population.
pub const MAX_POPULATION_SIZE: usize = 100_000;

/// Prime multiplier used to derive per-generation RNG streams from a base seed.
/// Chosen so streams for consecutive generations have minimal overlap.
pub const RNG_DERIVATION_PRIME: u64 = 7919;

/// Distance of the goal centre from the top edge of the field.
pub const GOAL_OFFSET_Y: f64 = 50.0;

/// Smallest goal reward. A miss scores `-distance + 1/moves < 1`, so any
/// reward of at least 1 outranks every dot that missed.
pub const MIN_GOAL_REWARD: f64 = 1.0;

/// Headings are drawn from whole degrees in `0..HEADING_STEPS`.
pub const HEADING_STEPS: u32 = 360;

/// Format tag written into every checkpoint.
pub const CHECKPOINT_FORMAT: &str = "dots-population";

/// Current checkpoint schema version.
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

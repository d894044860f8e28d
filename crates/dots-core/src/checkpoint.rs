//! Population snapshots and a directory-backed store of named slots.
//!
//! A snapshot records every dot's genome and phenotype, the goal, the
//! configuration and the generation counter. Random-source state is not
//! recorded; a restored population reseeds from the configured seed and
//! its generation.

use crate::config::EvolutionConfig;
use crate::constants::{CHECKPOINT_FORMAT, CHECKPOINT_SCHEMA_VERSION};
use crate::dot::Dot;
use crate::error::EvolutionError;
use crate::genome::Genome;
use crate::geometry::Vec2;
use crate::obstacle::Goal;
use crate::population::Population;
use crate::rng::derive_generation_rng;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),
    #[error("unsupported checkpoint schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<EvolutionError> for CheckpointError {
    fn from(err: EvolutionError) -> Self {
        CheckpointError::Corrupt(err.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DotSnapshot {
    pub genome: Genome,
    pub position: Vec2,
    pub move_index: usize,
    pub alive: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PopulationSnapshot {
    pub format: String,
    pub schema_version: u32,
    pub generation: u64,
    pub config: EvolutionConfig,
    pub goal: Goal,
    /// Half-open index range of the elites within `dots`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elites: Option<[usize; 2]>,
    pub dots: Vec<DotSnapshot>,
}

impl PopulationSnapshot {
    pub fn capture<R: Rng>(population: &Population<R>) -> Self {
        let elites = population.elite_range();
        Self {
            format: CHECKPOINT_FORMAT.to_string(),
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            generation: population.generation(),
            config: population.config().clone(),
            goal: *population.goal(),
            elites: (!elites.is_empty()).then_some([elites.start, elites.end]),
            dots: population
                .dots()
                .iter()
                .map(|dot| DotSnapshot {
                    genome: dot.genome().clone(),
                    position: dot.position(),
                    move_index: dot.move_index(),
                    alive: dot.is_alive(),
                })
                .collect(),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Corrupt(e.to_string()))
    }

    pub fn encode(&self) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(self).map_err(CheckpointError::Encode)
    }

    fn validate(&self) -> Result<(), CheckpointError> {
        if self.format != CHECKPOINT_FORMAT {
            return Err(CheckpointError::Corrupt(format!(
                "unexpected format tag {:?}",
                self.format
            )));
        }
        if self.schema_version != CHECKPOINT_SCHEMA_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.schema_version,
                expected: CHECKPOINT_SCHEMA_VERSION,
            });
        }
        if self.dots.len() != self.config.population_size {
            return Err(CheckpointError::Corrupt(format!(
                "{} dots stored but population_size is {}",
                self.dots.len(),
                self.config.population_size
            )));
        }
        if !(self.goal.center.is_finite() && self.goal.radius.is_finite()) {
            return Err(CheckpointError::Corrupt("goal is not finite".to_string()));
        }
        if self.goal.radius < 0.0 || self.goal.radius != self.config.goal_radius {
            return Err(CheckpointError::Corrupt(format!(
                "goal radius {} disagrees with configured goal_radius {}",
                self.goal.radius, self.config.goal_radius
            )));
        }
        if let Some([start, end]) = self.elites {
            if start > end || end > self.dots.len() {
                return Err(CheckpointError::Corrupt(format!(
                    "elite range {start}..{end} out of bounds"
                )));
            }
        }
        for (i, dot) in self.dots.iter().enumerate() {
            if dot.move_index > dot.genome.len() {
                return Err(CheckpointError::Corrupt(format!(
                    "dot {i} has move_index {} beyond genome length {}",
                    dot.move_index,
                    dot.genome.len()
                )));
            }
            if !dot.position.is_finite()
                || !dot.genome.directions().iter().all(|d| d.vector().is_finite())
            {
                return Err(CheckpointError::Corrupt(format!(
                    "dot {i} has non-finite state"
                )));
            }
        }
        Ok(())
    }

    /// Rebuild a population driven by `rng`.
    pub fn restore_with_rng<R: Rng>(self, rng: R) -> Result<Population<R>, CheckpointError> {
        self.validate()?;
        let speed = self.config.step_speed;
        let dots = self
            .dots
            .into_iter()
            .map(|d| Dot::from_parts(d.position, d.genome, d.move_index, d.alive, speed))
            .collect();
        let elites = self.elites.map(|[start, end]| start..end);
        Ok(Population::restore(
            self.config,
            self.goal,
            dots,
            self.generation,
            elites,
            rng,
        )?)
    }

    /// Rebuild a population reseeded from its configuration and generation.
    pub fn restore(self) -> Result<Population<ChaCha12Rng>, CheckpointError> {
        let rng = derive_generation_rng(self.config.seed, self.generation);
        self.restore_with_rng(rng)
    }
}

impl<R: Rng> Population<R> {
    /// Encode the population as an opaque checkpoint blob.
    pub fn save(&self) -> Result<Vec<u8>, CheckpointError> {
        PopulationSnapshot::capture(self).encode()
    }
}

impl Population<ChaCha12Rng> {
    /// Decode a blob produced by [`Population::save`].
    pub fn load(bytes: &[u8]) -> Result<Self, CheckpointError> {
        PopulationSnapshot::decode(bytes)?.restore()
    }
}

/// Named checkpoint slots stored as files in one directory.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    const SLOT_PREFIX: &'static str = "population_";

    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slot name used for the population entering `generation`.
    pub fn generation_slot(generation: u64) -> String {
        format!("{}{generation}", Self::SLOT_PREFIX)
    }

    pub fn slot_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Written to a temporary file, then renamed into place.
    pub fn write<R: Rng>(
        &self,
        name: &str,
        population: &Population<R>,
    ) -> Result<PathBuf, CheckpointError> {
        let bytes = population.save()?;
        let path = self.slot_path(name);
        let tmp = self.root.join(format!(".{name}.tmp"));
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        info!(slot = name, bytes = bytes.len(), "checkpoint written");
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<Population, CheckpointError> {
        Self::read_path(&self.slot_path(name))
    }

    pub fn read_path(path: &Path) -> Result<Population, CheckpointError> {
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "checkpoint read");
        Population::load(&bytes)
    }

    /// Generation slots present in the store, oldest first.
    pub fn generation_slots(&self) -> Result<Vec<(u64, PathBuf)>, CheckpointError> {
        let mut slots = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(Self::SLOT_PREFIX))
            else {
                continue;
            };
            match suffix.parse::<u64>() {
                Ok(generation) => slots.push((generation, entry.path())),
                Err(_) => warn!(path = %entry.path().display(), "skipping unrecognised slot"),
            }
        }
        slots.sort_by_key(|(generation, _)| *generation);
        Ok(slots)
    }

    /// Most recent generation slot, if any.
    pub fn latest(&self) -> Result<Option<(u64, PathBuf)>, CheckpointError> {
        Ok(self.generation_slots()?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Direction;
    use crate::layout::Layout;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 20,
            mating_pool_size: 5,
            elitism_count: 2,
            ..EvolutionConfig::default()
        }
    }

    fn evolved_population() -> Population {
        let config = small_config();
        let field = Layout::CenterBar.build(&config);
        let mut population = Population::new(config, *field.goal()).unwrap();
        population.run_generation(&field).unwrap();
        population
    }

    #[test]
    fn save_then_load_preserves_genomes() {
        let population = evolved_population();
        let restored = Population::load(&population.save().unwrap()).unwrap();
        assert_eq!(restored.len(), population.len());
        assert_eq!(restored.generation(), 1);
        assert_eq!(restored.config(), population.config());
        assert_eq!(restored.goal(), population.goal());
        assert_eq!(restored.elites().len(), 2);
        for (a, b) in restored.dots().iter().zip(population.dots()) {
            assert_eq!(a.genome(), b.genome());
            assert_eq!(a.move_index(), b.move_index());
        }
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(
            Population::load(b"\x00\x01not json"),
            Err(CheckpointError::Corrupt(_))
        ));
        assert!(matches!(
            Population::load(br#"{"hello": "world"}"#),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn foreign_format_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.format = "something-else".to_string();
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn future_schema_is_rejected() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.schema_version = CHECKPOINT_SCHEMA_VERSION + 1;
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn dot_count_mismatch_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.dots.pop();
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn inconsistent_move_index_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.dots[0].move_index = snapshot.dots[0].genome.len() + 1;
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    fn assert_restore_corrupt(snapshot: PopulationSnapshot) {
        assert!(matches!(
            snapshot.restore(),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn negative_goal_radius_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.goal.radius = -50.0;
        let bytes = snapshot.encode().unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn goal_radius_must_match_config() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.goal.radius = snapshot.config.goal_radius + 20.0;
        let bytes = snapshot.encode().unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn non_finite_position_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.dots[3].position = Vec2::new(f64::NAN, 10.0);
        assert_restore_corrupt(snapshot);
    }

    #[test]
    fn non_finite_direction_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        let mut directions = snapshot.dots[0].genome.directions().to_vec();
        directions.push(Direction::from_heading(f64::INFINITY, 5.0));
        snapshot.dots[0].genome = Genome::from_directions(directions);
        assert_restore_corrupt(snapshot);
    }

    #[test]
    fn inverted_elite_range_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.elites = Some([5, 2]);
        assert_restore_corrupt(snapshot);
    }

    #[test]
    fn elite_range_past_the_end_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        let len = snapshot.dots.len();
        snapshot.elites = Some([0, len + 1]);
        let bytes = snapshot.encode().unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn invalid_stored_config_is_corrupt() {
        let mut snapshot = PopulationSnapshot::capture(&evolved_population());
        snapshot.config.mutation_probability = 2.0;
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        assert!(matches!(
            Population::load(&bytes),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn store_round_trips_named_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(dir.path().join("run")).unwrap();
        let population = evolved_population();
        store
            .write(&CheckpointStore::generation_slot(1), &population)
            .unwrap();
        store
            .write(&CheckpointStore::generation_slot(20), &population)
            .unwrap();
        std::fs::write(store.root().join("summary.jsonl"), b"{}").unwrap();

        let slots = store.generation_slots().unwrap();
        assert_eq!(
            slots.iter().map(|(g, _)| *g).collect::<Vec<_>>(),
            vec![1, 20]
        );
        let (latest, _) = store.latest().unwrap().unwrap();
        assert_eq!(latest, 20);

        let restored = store.read("population_20").unwrap();
        assert_eq!(restored.len(), population.len());
    }

    #[test]
    fn missing_slot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read("population_3"),
            Err(CheckpointError::Io(_))
        ));
    }
}

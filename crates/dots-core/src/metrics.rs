use crate::dot::Dot;
use serde::{Deserialize, Serialize};

/// Summary of one evaluated generation, computed before it is replaced.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerationReport {
    /// Zero-based index of the generation that was evaluated.
    pub generation: u64,
    /// Ticks stepped before the generation ended.
    pub ticks: usize,
    /// Moves taken by the fittest dot.
    pub best_moves: usize,
    pub best_fitness: f64,
    /// Dots whose fitness reached the goal reward.
    pub goal_reached: usize,
    pub genome: GenomeStats,
}

impl GenerationReport {
    pub(crate) fn collect(
        generation: u64,
        ticks: usize,
        best_moves: usize,
        best_fitness: f64,
        goal_reached: usize,
        dots: &[Dot],
    ) -> Self {
        Self {
            generation,
            ticks,
            best_moves,
            best_fitness,
            goal_reached,
            genome: GenomeStats::collect(dots),
        }
    }
}

/// Genome length distribution across a set of dots.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenomeStats {
    pub dots: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub mean_len: f64,
}

impl GenomeStats {
    pub fn collect(dots: &[Dot]) -> Self {
        if dots.is_empty() {
            return Self::default();
        }
        let lens = dots.iter().map(|d| d.genome().len());
        let total: usize = lens.clone().sum();
        Self {
            dots: dots.len(),
            min_len: lens.clone().min().unwrap_or(0),
            max_len: lens.max().unwrap_or(0),
            mean_len: total as f64 / dots.len() as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Direction, Genome};
    use crate::geometry::Vec2;

    fn dot_with_len(len: usize) -> Dot {
        Dot::with_genome(
            Vec2::ZERO,
            5.0,
            Genome::from_directions(vec![Direction::from_heading(0.0, 5.0); len]),
        )
    }

    #[test]
    fn genome_stats_cover_lengths() {
        let dots = vec![dot_with_len(2), dot_with_len(6), dot_with_len(4)];
        let stats = GenomeStats::collect(&dots);
        assert_eq!(stats.dots, 3);
        assert_eq!(stats.min_len, 2);
        assert_eq!(stats.max_len, 6);
        assert!((stats.mean_len - 4.0).abs() < 1e-12);
    }

    #[test]
    fn genome_stats_empty() {
        assert_eq!(GenomeStats::collect(&[]), GenomeStats::default());
    }

    #[test]
    fn report_serializes_to_flat_json() {
        let report = GenerationReport::collect(3, 120, 87, 100.01, 4, &[dot_with_len(87)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generation"], 3);
        assert_eq!(json["best_moves"], 87);
        assert_eq!(json["goal_reached"], 4);
        assert_eq!(json["genome"]["max_len"], 87);
    }
}

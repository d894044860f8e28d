use super::Population;
use crate::dot::Dot;
use crate::error::EvolutionError;
use rand::Rng;

/// Indices of the `n` highest scores, best first. The sort is stable, so
/// equal scores keep their population order.
pub(super) fn ranked_indices(scores: &[f64], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(n);
    order
}

impl<R: Rng> Population<R> {
    /// Fitness of every dot, in population order.
    pub fn fitness_scores(&self) -> Result<Vec<f64>, EvolutionError> {
        let scoring = self.config.scoring();
        self.dots
            .iter()
            .map(|dot| dot.fitness(&self.goal, &scoring))
            .collect()
    }

    /// The `n` fittest dots, best first.
    pub fn best_agents(&self, n: usize) -> Result<Vec<&Dot>, EvolutionError> {
        let scores = self.fitness_scores()?;
        Ok(ranked_indices(&scores, n)
            .into_iter()
            .map(|i| &self.dots[i])
            .collect())
    }

    /// Fitness of the single best dot.
    pub fn best_fitness(&self) -> Result<f64, EvolutionError> {
        let scores = self.fitness_scores()?;
        Ok(scores.into_iter().fold(f64::NEG_INFINITY, f64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_descending() {
        assert_eq!(ranked_indices(&[5.0, -3.0, 100.1, 2.0], 2), vec![2, 0]);
    }

    #[test]
    fn ties_keep_population_order() {
        assert_eq!(ranked_indices(&[1.0, 7.0, 1.0, 7.0], 4), vec![1, 3, 0, 2]);
    }

    #[test]
    fn truncation_beyond_len_returns_all() {
        assert_eq!(ranked_indices(&[0.5], 10), vec![0]);
        assert!(ranked_indices(&[], 3).is_empty());
    }
}

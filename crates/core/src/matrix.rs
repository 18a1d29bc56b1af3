use std::collections::HashMap;

use ndarray::Array2;

use crate::comparison::{Comparison, SimilarityMetric};
use crate::submission::SubmissionId;

/// Symmetric submission × submission similarity under one metric.
///
/// The diagonal holds 1.0. Pairs without a comparison hold 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    ids: Vec<SubmissionId>,
    positions: HashMap<SubmissionId, usize>,
    values: Array2<f64>,
    metric: SimilarityMetric,
}

impl SimilarityMatrix {
    pub fn from_comparisons<'a>(
        ids: &[SubmissionId],
        comparisons: impl IntoIterator<Item = &'a Comparison>,
        metric: SimilarityMetric,
    ) -> Self {
        let mut matrix = Self::empty(ids, metric);
        for comparison in comparisons {
            let (Some(&i), Some(&j)) = (
                matrix.positions.get(&comparison.first()),
                matrix.positions.get(&comparison.second()),
            ) else {
                continue;
            };
            if i == j {
                continue;
            }
            let value = comparison.similarity(metric);
            matrix.values[[i, j]] = value;
            matrix.values[[j, i]] = value;
        }
        matrix
    }

    /// Builds a matrix from explicit pair values, e.g. produced outside the matcher.
    pub fn from_pairs(
        ids: &[SubmissionId],
        pairs: &[(SubmissionId, SubmissionId, f64)],
        metric: SimilarityMetric,
    ) -> Self {
        let mut matrix = Self::empty(ids, metric);
        for &(a, b, value) in pairs {
            let (Some(&i), Some(&j)) = (matrix.positions.get(&a), matrix.positions.get(&b))
            else {
                continue;
            };
            if i == j {
                continue;
            }
            let value = if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                0.0
            };
            matrix.values[[i, j]] = value;
            matrix.values[[j, i]] = value;
        }
        matrix
    }

    fn empty(ids: &[SubmissionId], metric: SimilarityMetric) -> Self {
        let n = ids.len();
        let mut values = Array2::zeros((n, n));
        for i in 0..n {
            values[[i, i]] = 1.0;
        }
        Self {
            ids: ids.to_vec(),
            positions: ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect(),
            values,
            metric,
        }
    }

    pub fn ids(&self) -> &[SubmissionId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn position(&self, id: SubmissionId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn get(&self, a: SubmissionId, b: SubmissionId) -> Option<f64> {
        Some(self.values[[self.position(a)?, self.position(b)?]])
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::Tile;

    #[test]
    fn fills_both_halves_from_comparisons() {
        let ids = [SubmissionId(3), SubmissionId(5), SubmissionId(9)];
        let comparison = Comparison::new(
            SubmissionId(9),
            SubmissionId(3),
            vec![Tile {
                start_a: 0,
                start_b: 0,
                length: 4,
            }],
            8,
            4,
        );
        let matrix = SimilarityMatrix::from_comparisons(&ids, [&comparison], SimilarityMetric::Max);
        assert_eq!(matrix.get(SubmissionId(3), SubmissionId(9)), Some(1.0));
        assert_eq!(matrix.get(SubmissionId(9), SubmissionId(3)), Some(1.0));
        assert_eq!(matrix.get(SubmissionId(3), SubmissionId(5)), Some(0.0));
        assert_eq!(matrix.get(SubmissionId(5), SubmissionId(5)), Some(1.0));
        assert_eq!(matrix.get(SubmissionId(5), SubmissionId(4)), None);
    }

    #[test]
    fn pair_values_are_clamped() {
        let ids = [SubmissionId(0), SubmissionId(1)];
        let matrix = SimilarityMatrix::from_pairs(
            &ids,
            &[(SubmissionId(0), SubmissionId(1), 1.7)],
            SimilarityMetric::Avg,
        );
        assert_eq!(matrix.values()[[1, 0]], 1.0);
    }
}

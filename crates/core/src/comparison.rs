use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::submission::SubmissionId;
use crate::tiling::Tile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimilarityMetric {
    #[default]
    Avg,
    Min,
    Max,
    Intersection,
}

impl SimilarityMetric {
    pub const ALL: [SimilarityMetric; 4] = [Self::Avg, Self::Min, Self::Max, Self::Intersection];

    pub fn name(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Intersection => "intersection",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimilarityMetric {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "avg" | "average" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "intersection" | "inter" => Ok(Self::Intersection),
            _ => Err(ConfigError::unknown("similarity metric", raw)),
        }
    }
}

/// Tiles between two submissions and the lengths they are measured against.
///
/// Lengths are effective: positions consumed by base code or file-end markers do not count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    first: SubmissionId,
    second: SubmissionId,
    tiles: Vec<Tile>,
    first_len: usize,
    second_len: usize,
}

impl Comparison {
    pub fn new(
        first: SubmissionId,
        second: SubmissionId,
        tiles: Vec<Tile>,
        first_len: usize,
        second_len: usize,
    ) -> Self {
        Self {
            first,
            second,
            tiles,
            first_len,
            second_len,
        }
    }

    pub fn first(&self) -> SubmissionId {
        self.first
    }

    pub fn second(&self) -> SubmissionId {
        self.second
    }

    /// Tiles with `start_a` in the first submission and `start_b` in the second.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn first_len(&self) -> usize {
        self.first_len
    }

    pub fn second_len(&self) -> usize {
        self.second_len
    }

    pub fn matched_tokens(&self) -> usize {
        self.tiles.iter().map(|t| t.length).sum()
    }

    pub fn max_tile_length(&self) -> usize {
        self.tiles.iter().map(|t| t.length).max().unwrap_or(0)
    }

    pub fn coverage_first(&self) -> f64 {
        ratio(self.matched_tokens(), self.first_len)
    }

    pub fn coverage_second(&self) -> f64 {
        ratio(self.matched_tokens(), self.second_len)
    }

    pub fn similarity(&self, metric: SimilarityMetric) -> f64 {
        let a = self.coverage_first();
        let b = self.coverage_second();
        match metric {
            SimilarityMetric::Avg => (a + b) / 2.0,
            SimilarityMetric::Min => a.min(b),
            SimilarityMetric::Max => a.max(b),
            SimilarityMetric::Intersection => {
                ratio(2 * self.matched_tokens(), self.first_len + self.second_len)
            }
        }
    }

    pub fn involves(&self, id: SubmissionId) -> bool {
        self.first == id || self.second == id
    }

    /// The same comparison seen from the other submission.
    pub fn swapped(&self) -> Self {
        Self {
            first: self.second,
            second: self.first,
            tiles: self.tiles.iter().map(|t| t.swapped()).collect(),
            first_len: self.second_len,
            second_len: self.first_len,
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).min(1.0)
}

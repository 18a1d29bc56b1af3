use std::fmt;
use std::str::FromStr;

use crate::comparison::SimilarityMetric;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusteringAlgorithm {
    #[default]
    Spectral,
    Agglomerative,
}

impl ClusteringAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Spectral => "spectral",
            Self::Agglomerative => "agglomerative",
        }
    }
}

impl fmt::Display for ClusteringAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClusteringAlgorithm {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spectral" => Ok(Self::Spectral),
            "agglomerative" => Ok(Self::Agglomerative),
            _ => Err(ConfigError::unknown("clustering algorithm", raw)),
        }
    }
}

/// How the similarity between two clusters is derived from their member pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Average,
    /// Single linkage: the most similar member pair.
    Max,
    /// Complete linkage: the least similar member pair.
    Min,
}

impl Linkage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Max => "max",
            Self::Min => "min",
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Linkage {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(Self::Average),
            "max" | "single" => Ok(Self::Max),
            "min" | "complete" => Ok(Self::Min),
            _ => Err(ConfigError::unknown("linkage", raw)),
        }
    }
}

/// Transform applied to the similarity matrix before clustering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Preprocessing {
    None,
    #[default]
    Cdf,
    /// Keeps values at or above this percentile (0..1) of the pairwise values.
    Percentile(f64),
    /// Zeroes values below this cutoff.
    Threshold(f64),
}

impl Preprocessing {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cdf => "cdf",
            Self::Percentile(_) => "percentile",
            Self::Threshold(_) => "threshold",
        }
    }

    pub fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::Percentile(value) => unit_interval("percentile", value),
            Self::Threshold(value) => unit_interval("preprocessing threshold", value),
            Self::None | Self::Cdf => Ok(()),
        }
    }
}

impl fmt::Display for Preprocessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentile(p) => write!(f, "percentile({p})"),
            Self::Threshold(t) => write!(f, "threshold({t})"),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralOptions {
    /// Gaussian kernel width applied to the distance `1 - similarity`.
    pub kernel_bandwidth: f64,
    /// Observation noise of the k search model.
    pub noise_variance: f64,
    pub min_runs: usize,
    pub max_runs: usize,
    pub kmeans_iterations: usize,
    pub seed: u64,
}

impl Default for SpectralOptions {
    fn default() -> Self {
        Self {
            kernel_bandwidth: 0.25,
            noise_variance: 0.0025,
            min_runs: 5,
            max_runs: 50,
            kmeans_iterations: 200,
            seed: 0x5eed,
        }
    }
}

impl SpectralOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.kernel_bandwidth.is_finite() || self.kernel_bandwidth <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "kernel bandwidth",
                value: self.kernel_bandwidth,
            });
        }
        if !self.noise_variance.is_finite() || self.noise_variance < 0.0 {
            return Err(ConfigError::Negative {
                name: "noise variance",
                value: self.noise_variance,
            });
        }
        if self.min_runs == 0 {
            return Err(ConfigError::Zero { name: "min runs" });
        }
        if self.min_runs > self.max_runs {
            return Err(ConfigError::RunRange {
                min: self.min_runs,
                max: self.max_runs,
            });
        }
        if self.kmeans_iterations == 0 {
            return Err(ConfigError::Zero {
                name: "k-means iterations",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgglomerativeOptions {
    /// Clusters merge only while their linkage similarity is strictly above this value.
    pub threshold: f64,
    pub linkage: Linkage,
}

impl AgglomerativeOptions {
    pub fn new(threshold: f64, linkage: Linkage) -> Self {
        Self { threshold, linkage }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("merge threshold", self.threshold)
    }
}

impl Default for AgglomerativeOptions {
    fn default() -> Self {
        Self::new(0.2, Linkage::Average)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOptions {
    pub enabled: bool,
    pub algorithm: ClusteringAlgorithm,
    /// Metric whose matrix is clustered; independent of the retention metric.
    pub similarity_metric: SimilarityMetric,
    pub spectral: SpectralOptions,
    pub agglomerative: AgglomerativeOptions,
    pub preprocessing: Preprocessing,
}

impl Default for ClusteringOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: ClusteringAlgorithm::Spectral,
            similarity_metric: SimilarityMetric::Avg,
            spectral: SpectralOptions::default(),
            agglomerative: AgglomerativeOptions::default(),
            preprocessing: Preprocessing::Cdf,
        }
    }
}

impl ClusteringOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.preprocessing.validate()?;
        match self.algorithm {
            ClusteringAlgorithm::Spectral => self.spectral.validate(),
            ClusteringAlgorithm::Agglomerative => self.agglomerative.validate(),
        }
    }
}

fn unit_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::UnitInterval { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(ClusteringOptions::default().validate(), Ok(()));
        let agglomerative = ClusteringOptions {
            algorithm: ClusteringAlgorithm::Agglomerative,
            ..ClusteringOptions::default()
        };
        assert_eq!(agglomerative.validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let mut options = ClusteringOptions::default();
        options.spectral.kernel_bandwidth = 0.0;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::NotPositive { .. })
        ));

        let mut options = ClusteringOptions::default();
        options.spectral.min_runs = 10;
        options.spectral.max_runs = 3;
        assert_eq!(
            options.validate(),
            Err(ConfigError::RunRange { min: 10, max: 3 })
        );

        let options = ClusteringOptions {
            preprocessing: Preprocessing::Percentile(1.5),
            ..ClusteringOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::UnitInterval { .. })
        ));

        let options = ClusteringOptions {
            algorithm: ClusteringAlgorithm::Agglomerative,
            agglomerative: AgglomerativeOptions::new(f64::NAN, Linkage::Min),
            ..ClusteringOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn selector_names_parse() {
        assert_eq!("Agglomerative".parse(), Ok(ClusteringAlgorithm::Agglomerative));
        assert_eq!("complete".parse(), Ok(Linkage::Min));
        assert_eq!(Linkage::Max.to_string(), "max");
        assert!(matches!(
            "ward".parse::<Linkage>(),
            Err(ConfigError::UnknownName { kind: "linkage", .. })
        ));
        assert_eq!(Preprocessing::Threshold(0.5).to_string(), "threshold(0.5)");
    }
}

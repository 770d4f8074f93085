use serde::{Deserialize, Serialize};

use crate::error::{DiversityError, Result};

/// Numeric knobs of the statistics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Window of the headline type-token ratio.
    pub ttr_window: usize,
    /// Larger windows, reported as `ttr10k` / `ttr100k`.
    pub ttr10k_window: usize,
    pub ttr100k_window: usize,
    /// Window for bigram and trigram TTR.
    pub ngram_window: usize,
    /// Number of shuffled passes averaged into the type-token curve.
    pub curve_repeats: usize,
    pub seed: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            ttr_window: 1_000,
            ttr10k_window: 10_000,
            ttr100k_window: 100_000,
            ngram_window: 1_000,
            curve_repeats: 10,
            seed: 1234,
        }
    }
}

impl StatsConfig {
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("ttr_window", self.ttr_window),
            ("ttr10k_window", self.ttr10k_window),
            ("ttr100k_window", self.ttr100k_window),
            ("ngram_window", self.ngram_window),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(DiversityError::InvalidConfig(format!("{name} must be > 0")));
        }
        if self.curve_repeats == 0 {
            return Err(DiversityError::InvalidConfig(
                "curve_repeats must be > 0".into(),
            ));
        }
        Ok(())
    }
}

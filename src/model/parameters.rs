//! # Model Parameters
//!
//! Per-query hyperparameters of the copying model and the probabilities
//! derived from them.
//!
//! ## Li-Stephens Transition Probability
//! The probability of switching away from the current panel row between
//! adjacent sites depends on the physical gap `d` between them:
//!
//! ```text
//! r = 1 - exp(-rho * d / k)
//!
//! where:
//!   rho = per-unit-distance recombination rate
//!   d   = gap between adjacent site positions
//!   k   = number of panel rows being matched against
//! ```
//!
//! Staying on the same row then has probability `1 - r + r/k` (no
//! recombination, or recombination back onto the same row) and switching
//! to any one other row has probability `r/k`.

use crate::error::{HaploomError, Result};

/// Validated per-query parameters of the copying model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchParams {
    /// Per-unit-distance recombination rate (rho > 0)
    pub recombination_rate: f64,
    /// Per-site error probability (0 < epsilon < 0.5)
    pub error_probability: f64,
}

impl MatchParams {
    /// Validate and construct parameters.
    pub fn new(recombination_rate: f64, error_probability: f64) -> Result<Self> {
        if !(recombination_rate > 0.0) || !recombination_rate.is_finite() {
            return Err(HaploomError::invalid_argument(
                "recombination rate must be positive and finite",
            ));
        }
        if !(error_probability > 0.0 && error_probability < 0.5) {
            return Err(HaploomError::invalid_argument(
                "error probability must lie in (0, 0.5)",
            ));
        }
        Ok(Self {
            recombination_rate,
            error_probability,
        })
    }

    /// Probability of at least one recombination over a gap of `distance`
    /// when matching against `panel_size` rows.
    #[inline]
    pub fn switch_prob(&self, distance: f64, panel_size: usize) -> f64 {
        1.0 - (-self.recombination_rate * distance / panel_size as f64).exp()
    }

    /// Log emission probability for a panel/query allele comparison.
    #[inline]
    pub fn log_emission(&self, matched: bool) -> f64 {
        if matched {
            (1.0 - self.error_probability).ln()
        } else {
            self.error_probability.ln()
        }
    }
}

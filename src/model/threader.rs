//! # Threader
//!
//! Viterbi decoding of a query haplotype against a prefix of the
//! reference panel under the Li-Stephens copying model. The forward pass
//! runs in log space with per-column max renormalization; a full
//! traceback matrix records the chosen predecessor of every cell so the
//! optimal copying path can be reconstructed and inspected after the
//! run.
//!
//! Ties anywhere in the recursion resolve to the lowest panel index,
//! which makes the output deterministic for identical inputs.

use tracing::instrument;

use crate::data::panel::ReferencePanel;
use crate::data::site::{Allele, SiteId, UNKNOWN_ALLELE};
use crate::error::{HaploomError, Result};
use crate::model::parameters::MatchParams;

/// Storage strategy for the forward pass. All variants run the same
/// arithmetic per cell and produce identical paths and mutation lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Archive the scaled forward column of every site for inspection
    #[default]
    FullMatrix,
    /// Keep only the rolling pair of forward columns
    LowMemory,
}

/// Per-query Viterbi state over a shared, immutable [`ReferencePanel`].
///
/// A threader owns a mutable traceback matrix that is overwritten by
/// each [`run`](Self::run); concurrent runs therefore require distinct
/// threader instances, which may freely share one panel.
#[derive(Debug)]
pub struct Threader<'a> {
    panel: &'a ReferencePanel,
    /// Predecessor matrix, row-major (num_haplotypes x num_sites)
    traceback: Vec<u32>,
    /// Rolling forward columns (num_haplotypes entries each)
    prev: Vec<f64>,
    cur: Vec<f64>,
    /// Archived forward columns from the last FullMatrix run:
    /// num_sites rows of panel_size entries
    forward: Option<Vec<f64>>,
}

impl<'a> Threader<'a> {
    /// Create a threader over the given panel.
    pub fn new(panel: &'a ReferencePanel) -> Result<Self> {
        let n = panel.num_haplotypes();
        let m = panel.num_sites();
        let mut traceback = Vec::new();
        traceback.try_reserve_exact(n * m)?;
        traceback.resize(n * m, 0);
        Ok(Self {
            panel,
            traceback,
            prev: vec![0.0; n],
            cur: vec![0.0; n],
            forward: None,
        })
    }

    /// The panel this threader matches against
    pub fn panel(&self) -> &ReferencePanel {
        self.panel
    }

    /// Thread panel row `haplotype_index` through the first `panel_size`
    /// panel rows with the default algorithm.
    ///
    /// `path` receives the chosen panel index per site; the returned
    /// list holds the ascending sites at which the copied allele differs
    /// from the query (the implied mutations).
    pub fn run(
        &mut self,
        haplotype_index: u32,
        panel_size: u32,
        recombination_rate: f64,
        error_probability: f64,
        path: &mut [u32],
    ) -> Result<Vec<SiteId>> {
        self.run_with(
            haplotype_index,
            panel_size,
            recombination_rate,
            error_probability,
            path,
            Algorithm::default(),
        )
    }

    /// As [`run`](Self::run), with an explicit [`Algorithm`].
    #[instrument(level = "trace", skip(self, path))]
    pub fn run_with(
        &mut self,
        haplotype_index: u32,
        panel_size: u32,
        recombination_rate: f64,
        error_probability: f64,
        path: &mut [u32],
        algorithm: Algorithm,
    ) -> Result<Vec<SiteId>> {
        let n = self.panel.num_haplotypes();
        let m = self.panel.num_sites();
        let query = haplotype_index as usize;
        let k = panel_size as usize;

        if query >= n {
            return Err(HaploomError::invalid_argument(format!(
                "haplotype index {query} out of range for {n} haplotypes"
            )));
        }
        if k < 1 || k > n {
            return Err(HaploomError::invalid_argument(format!(
                "panel size {k} outside 1..={n}"
            )));
        }
        if path.len() != m {
            return Err(HaploomError::invalid_argument(format!(
                "path buffer has {} entries, expected {}",
                path.len(),
                m
            )));
        }
        let params = MatchParams::new(recombination_rate, error_probability)?;

        let mut forward = match algorithm {
            Algorithm::FullMatrix => {
                let mut archive = Vec::new();
                archive.try_reserve_exact(m * k)?;
                Some(archive)
            }
            Algorithm::LowMemory => None,
        };
        self.forward = None;
        self.traceback.fill(0);

        let positions = self.panel.positions();

        // First column: uniform prior folded into the normalization.
        for j in 0..k {
            let matched = allele_match(self.panel.allele(j, 0), self.panel.allele(query, 0));
            self.prev[j] = params.log_emission(matched);
            self.traceback[j * m] = j as u32;
        }
        normalize_column(&mut self.prev[..k]);
        if let Some(archive) = forward.as_mut() {
            archive.extend_from_slice(&self.prev[..k]);
        }

        for l in 1..m {
            // Positions are padded with virtual boundaries, so the gap
            // into site l sits at offset l on the padded axis.
            let gap = positions[l + 1] - positions[l];
            let r = params.switch_prob(gap, k);
            let log_stay = (1.0 - r + r / k as f64).ln();
            let log_switch = (r / k as f64).ln();

            let (best_prev, best_ll) = argmax(&self.prev[..k]);
            let query_allele = self.panel.allele(query, l);

            for j in 0..k {
                let stay = self.prev[j] + log_stay;
                let switch = best_ll + log_switch;
                let (score, predecessor) = if switch > stay || (switch == stay && best_prev < j) {
                    (switch, best_prev)
                } else {
                    (stay, j)
                };
                let matched = allele_match(self.panel.allele(j, l), query_allele);
                self.cur[j] = score + params.log_emission(matched);
                self.traceback[j * m + l] = predecessor as u32;
            }
            normalize_column(&mut self.cur[..k]);
            if let Some(archive) = forward.as_mut() {
                archive.extend_from_slice(&self.cur[..k]);
            }
            std::mem::swap(&mut self.prev, &mut self.cur);
        }

        let (best_final, _) = argmax(&self.prev[..k]);
        path[m - 1] = best_final as u32;
        for l in (1..m).rev() {
            path[l - 1] = self.traceback[path[l] as usize * m + l];
        }

        let mut mutations = Vec::new();
        mutations.try_reserve(m)?;
        for (l, &p) in path.iter().enumerate() {
            if self.panel.allele(p as usize, l) != self.panel.allele(query, l) {
                mutations.push(SiteId::from(l));
            }
        }

        self.forward = forward;
        Ok(mutations)
    }

    /// Row-major `(num_haplotypes x num_sites)` predecessor matrix from
    /// the last run
    pub fn traceback(&self) -> &[u32] {
        &self.traceback
    }

    /// One traceback row
    pub fn traceback_row(&self, hap: usize) -> &[u32] {
        let m = self.panel.num_sites();
        &self.traceback[hap * m..(hap + 1) * m]
    }

    /// Scaled forward columns of the last [`Algorithm::FullMatrix`] run:
    /// `num_sites` rows of that run's `panel_size` entries
    pub fn site_likelihoods(&self) -> Option<&[f64]> {
        self.forward.as_deref()
    }
}

/// A panel allele matches the query only when it is known and equal;
/// unknown panel alleles always count as mismatches.
#[inline]
fn allele_match(reference: Allele, query: Allele) -> bool {
    reference != UNKNOWN_ALLELE && reference == query
}

/// Index and value of the maximum entry; the lowest index wins ties.
#[inline]
fn argmax(column: &[f64]) -> (usize, f64) {
    let mut best = 0;
    let mut best_value = column[0];
    for (j, &value) in column.iter().enumerate().skip(1) {
        if value > best_value {
            best = j;
            best_value = value;
        }
    }
    (best, best_value)
}

/// Shift a log-likelihood column so its maximum sits at zero.
#[inline]
fn normalize_column(column: &mut [f64]) {
    let (_, max) = argmax(column);
    for value in column.iter_mut() {
        *value -= max;
    }
}

//! # Reference Panel
//!
//! The haplotype matrix that queries are threaded against. Constructed
//! once per inference run and immutable afterwards: every buffer is owned,
//! nothing is cached or back-referenced, so a single panel can be shared
//! by reference across any number of threaders running on worker threads.
//!
//! Beyond the observed haplotypes the panel carries two synthetic rows,
//! an all-ancestral and an all-derived haplotype, which anchor the copying
//! model at the extremes, and a padded position axis with virtual
//! boundaries at `0.0` and `sequence_length`.

use tracing::debug;

use crate::data::site::{Allele, UNKNOWN_ALLELE};
use crate::error::{HaploomError, Result};

/// Immutable reference panel of binary haplotypes.
///
/// The haplotype matrix has `num_samples + 2` rows of `num_sites` alleles
/// each, stored row-major. Rows `0..num_samples` are the observed
/// haplotypes in their input order; row `num_samples` is all-ancestral
/// (zeros) and row `num_samples + 1` all-derived (ones).
#[derive(Clone, Debug)]
pub struct ReferencePanel {
    num_samples: usize,
    num_sites: usize,
    sequence_length: f64,
    /// Row-major (num_haplotypes x num_sites)
    haplotypes: Vec<Allele>,
    /// Padded positions: entry 0 is 0.0, entry num_sites + 1 is
    /// sequence_length, observed positions occupy 1..=num_sites
    positions: Vec<f64>,
}

impl ReferencePanel {
    /// Build a panel from observed haplotypes and site positions.
    ///
    /// `haplotypes` is row-major with `num_samples` rows of `num_sites`
    /// alleles; each allele must be 0, 1 or [`UNKNOWN_ALLELE`].
    /// `positions` must be strictly increasing and lie in
    /// `[0, sequence_length)`.
    pub fn new(
        haplotypes: &[Allele],
        num_samples: usize,
        num_sites: usize,
        positions: &[f64],
        sequence_length: f64,
    ) -> Result<Self> {
        if num_samples < 1 {
            return Err(HaploomError::invalid_argument(
                "at least one haplotype required",
            ));
        }
        if num_sites < 1 {
            return Err(HaploomError::invalid_argument("at least one site required"));
        }
        if haplotypes.len() != num_samples * num_sites {
            return Err(HaploomError::invalid_argument(format!(
                "haplotype matrix has {} entries, expected {} x {}",
                haplotypes.len(),
                num_samples,
                num_sites
            )));
        }
        if positions.len() != num_sites {
            return Err(HaploomError::invalid_argument(format!(
                "positions has {} entries, expected {}",
                positions.len(),
                num_sites
            )));
        }
        if !(sequence_length > 0.0) {
            return Err(HaploomError::invalid_argument(
                "sequence_length must be positive",
            ));
        }
        if let Some(&a) = haplotypes
            .iter()
            .find(|&&a| a != 0 && a != 1 && a != UNKNOWN_ALLELE)
        {
            return Err(HaploomError::invalid_argument(format!(
                "allele value {a} outside {{0, 1, unknown}}"
            )));
        }
        for (l, w) in positions.windows(2).enumerate() {
            if !(w[1] > w[0]) {
                return Err(HaploomError::invalid_argument(format!(
                    "positions must be strictly increasing, violated at site {}",
                    l + 1
                )));
            }
        }
        if positions[0] < 0.0 || positions[num_sites - 1] >= sequence_length {
            return Err(HaploomError::invalid_argument(
                "positions must lie in [0, sequence_length)",
            ));
        }

        let num_haplotypes = num_samples + 2;
        let mut matrix = Vec::new();
        matrix.try_reserve_exact(num_haplotypes * num_sites)?;
        matrix.extend_from_slice(haplotypes);
        // The two synthetic anchor rows.
        matrix.resize(matrix.len() + num_sites, 0);
        matrix.resize(matrix.len() + num_sites, 1);

        let mut padded = Vec::new();
        padded.try_reserve_exact(num_sites + 2)?;
        padded.push(0.0);
        padded.extend_from_slice(positions);
        padded.push(sequence_length);

        debug!(
            num_samples,
            num_sites, sequence_length, "constructed reference panel"
        );
        Ok(Self {
            num_samples,
            num_sites,
            sequence_length,
            haplotypes: matrix,
            positions: padded,
        })
    }

    /// Number of observed haplotypes
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of panel rows, including the two synthetic anchors
    pub fn num_haplotypes(&self) -> usize {
        self.num_samples + 2
    }

    /// Number of sites
    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    /// Length of the modeled segment
    pub fn sequence_length(&self) -> f64 {
        self.sequence_length
    }

    /// One panel row
    pub fn haplotype(&self, hap: usize) -> &[Allele] {
        let start = hap * self.num_sites;
        &self.haplotypes[start..start + self.num_sites]
    }

    /// Allele of panel row `hap` at site `site`
    #[inline]
    pub fn allele(&self, hap: usize, site: usize) -> Allele {
        self.haplotypes[hap * self.num_sites + site]
    }

    /// Iterate over all panel rows, synthetic anchors last
    pub fn haplotypes(&self) -> impl Iterator<Item = &[Allele]> {
        self.haplotypes.chunks_exact(self.num_sites)
    }

    /// Padded position axis of length `num_sites + 2`
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }
}

//! # Ancestor Builder
//!
//! Ingests one genotype column per site, groups sites by derived-allele
//! frequency, deduplicates byte-identical columns, and synthesizes
//! ancestral haplotypes by consensus propagation outward from a focal
//! site.
//!
//! The propagation visits "older" sites (strictly higher frequency than
//! the focal site) in order of increasing distance and records the
//! majority allele over a working set of samples that carry the focal
//! derived allele. A sample leaves the working set only after
//! disagreeing with the consensus at two consecutive older sites; a
//! single disagreement is tolerated as a putative recurrent mutation.
//! Propagation stops once the working set has shrunk to half its
//! original size.

use bitvec::prelude::*;
use tracing::debug;

use crate::ancestors::arena::{ArenaRef, PatternArena, DEFAULT_CHUNK_SIZE};
use crate::ancestors::pattern_map::PatternMap;
use crate::data::site::{Allele, SampleId, SiteId, UNKNOWN_ALLELE};
use crate::error::{HaploomError, Result};

/// One ancestor to be materialized: the shared derived-allele count of
/// its focal sites and the focal sites themselves, in ascending order.
///
/// Under the current one-focal-site policy every descriptor holds
/// exactly one site; sites sharing a genotype pattern yield one
/// descriptor each, all at the same frequency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestorDescriptor {
    pub frequency: u32,
    pub focal_sites: Vec<SiteId>,
}

/// Per-site record: the derived-allele count and, for sites with
/// frequency at least 2, a handle to the shared canonical pattern.
#[derive(Clone, Copy, Debug, Default)]
struct SiteRecord {
    frequency: u32,
    genotypes: Option<ArenaRef>,
}

/// Builder for ancestral haplotypes.
///
/// Lifecycle: construct, [`add_site`](Self::add_site) once per site,
/// [`finalise`](Self::finalise) once, then materialize ancestors with
/// [`make_ancestor`](Self::make_ancestor). Materialization takes `&self`
/// and writes only the caller's buffer, so distinct ancestors may be
/// built concurrently once the builder is finalised.
#[derive(Debug)]
pub struct AncestorBuilder {
    num_samples: usize,
    num_sites: usize,
    flags: u32,
    sites: Vec<SiteRecord>,
    /// One bucket per frequency value in 0..=num_samples
    frequency_buckets: Vec<PatternMap>,
    arena: PatternArena,
    descriptors: Vec<AncestorDescriptor>,
}

impl AncestorBuilder {
    /// Create a builder dimensioned for `num_samples` haplotypes observed
    /// at `num_sites` sites. Requires `num_samples >= 2`.
    pub fn new(num_samples: usize, num_sites: usize, flags: u32) -> Result<Self> {
        if num_samples < 2 {
            return Err(HaploomError::invalid_argument(
                "at least two samples required",
            ));
        }
        let mut sites = Vec::new();
        sites.try_reserve_exact(num_sites)?;
        sites.resize_with(num_sites, SiteRecord::default);

        let mut frequency_buckets = Vec::new();
        frequency_buckets.try_reserve_exact(num_samples + 1)?;
        frequency_buckets.resize_with(num_samples + 1, PatternMap::new);

        // num_sites is an upper bound on the descriptor count.
        let mut descriptors = Vec::new();
        descriptors.try_reserve(num_sites)?;

        Ok(Self {
            num_samples,
            num_sites,
            flags,
            sites,
            frequency_buckets,
            arena: PatternArena::new(DEFAULT_CHUNK_SIZE),
            descriptors,
        })
    }

    /// Number of samples
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of sites
    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    /// Construction flags (reserved, currently unused by the algorithms)
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Number of descriptors emitted by finalisation
    pub fn num_ancestors(&self) -> usize {
        self.descriptors.len()
    }

    /// Descriptors in decreasing-frequency order (empty before finalise)
    pub fn descriptors(&self) -> &[AncestorDescriptor] {
        &self.descriptors
    }

    /// Bytes held by the pattern arena (diagnostic)
    pub fn size_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    /// Record the genotype column for `site_id` at the given
    /// derived-allele frequency.
    ///
    /// Sites at frequency 0 or 1 cannot anchor useful ancestors: they are
    /// recorded without a pattern and are filled in as ancestral during
    /// materialization. All other columns are deduplicated against the
    /// frequency bucket, so byte-identical patterns share one canonical
    /// vector. Calling twice for the same site id is undefined.
    pub fn add_site(&mut self, site_id: SiteId, frequency: u32, genotypes: &[Allele]) -> Result<()> {
        let site = site_id.as_usize();
        if site >= self.num_sites {
            return Err(HaploomError::invalid_argument(format!(
                "site id {site} out of range for {} sites",
                self.num_sites
            )));
        }
        if frequency as usize > self.num_samples {
            return Err(HaploomError::invalid_argument(format!(
                "frequency {frequency} exceeds sample count {}",
                self.num_samples
            )));
        }
        if genotypes.len() != self.num_samples {
            return Err(HaploomError::invalid_argument(format!(
                "genotype column has {} entries, expected {}",
                genotypes.len(),
                self.num_samples
            )));
        }
        debug_assert!(genotypes.iter().all(|&g| g == 0 || g == 1));

        self.sites[site].frequency = frequency;
        if frequency > 1 {
            let entry = self.frequency_buckets[frequency as usize]
                .get_or_insert(&mut self.arena, genotypes)?;
            entry.sites.try_reserve(1)?;
            entry.sites.push(site_id);
            self.sites[site].genotypes = Some(entry.genotypes);
        }
        Ok(())
    }

    /// Emit ancestor descriptors: frequencies walked from `num_samples`
    /// down to 2, each bucket in its key order, one descriptor per site
    /// within an entry (ascending site order).
    pub fn finalise(&mut self) -> Result<()> {
        self.descriptors.clear();
        for frequency in (2..=self.num_samples).rev() {
            for entry in self.frequency_buckets[frequency].iter() {
                for &site in &entry.sites {
                    self.descriptors.push(AncestorDescriptor {
                        frequency: frequency as u32,
                        focal_sites: vec![site],
                    });
                }
            }
        }
        #[cfg(debug_assertions)]
        self.check_state();
        debug!(
            num_ancestors = self.descriptors.len(),
            arena_bytes = self.arena.allocated_bytes(),
            "finalised ancestor builder"
        );
        Ok(())
    }

    /// Materialize the ancestral haplotype anchored at the given focal
    /// site into `ancestor`, returning the half-open resolved interval
    /// `(start, end)`.
    ///
    /// Guarantees: `start <= focal < end`; `ancestor[focal] == 1`; every
    /// index inside `[start, end)` is 0 or 1 and every index outside is
    /// [`UNKNOWN_ALLELE`].
    pub fn make_ancestor(
        &self,
        focal_sites: &[SiteId],
        ancestor: &mut [Allele],
    ) -> Result<(usize, usize)> {
        let &[focal_site] = focal_sites else {
            return Err(HaploomError::invalid_argument(
                "exactly one focal site required",
            ));
        };
        let focal = focal_site.as_usize();
        if focal >= self.num_sites {
            return Err(HaploomError::invalid_argument(format!(
                "focal site {focal} out of range for {} sites",
                self.num_sites
            )));
        }
        if ancestor.len() != self.num_sites {
            return Err(HaploomError::invalid_argument(format!(
                "ancestor buffer has {} entries, expected {}",
                ancestor.len(),
                self.num_sites
            )));
        }
        let Some(focal_genotypes) = self.sites[focal].genotypes else {
            return Err(HaploomError::invalid_argument(
                "focal site has frequency below 2",
            ));
        };
        let focal_frequency = self.sites[focal].frequency;

        ancestor.fill(UNKNOWN_ALLELE);
        ancestor[focal] = 1;

        // Rightwards from the focal site.
        let older: Vec<(usize, ArenaRef)> = (focal + 1..self.num_sites)
            .filter(|&l| self.sites[l].frequency > focal_frequency)
            .filter_map(|l| self.sites[l].genotypes.map(|g| (l, g)))
            .collect();
        let mut sample_set = self.derived_carriers(focal_genotypes);
        debug_assert_eq!(sample_set.len(), focal_frequency as usize);
        let last_site = self.propagate_consensus(focal, &older, &mut sample_set, ancestor);
        for l in focal + 1..last_site {
            if self.sites[l].frequency <= focal_frequency {
                ancestor[l] = 0;
            }
        }
        let end = last_site + 1;

        // Leftwards from the focal site.
        let older: Vec<(usize, ArenaRef)> = (0..focal)
            .rev()
            .filter(|&l| self.sites[l].frequency > focal_frequency)
            .filter_map(|l| self.sites[l].genotypes.map(|g| (l, g)))
            .collect();
        let mut sample_set = self.derived_carriers(focal_genotypes);
        let last_site = self.propagate_consensus(focal, &older, &mut sample_set, ancestor);
        for l in last_site + 1..focal {
            if self.sites[l].frequency <= focal_frequency {
                ancestor[l] = 0;
            }
        }
        let start = last_site;

        Ok((start, end))
    }

    /// Samples carrying the derived allele in the given pattern.
    fn derived_carriers(&self, genotypes: ArenaRef) -> Vec<SampleId> {
        self.arena
            .get(genotypes)
            .iter()
            .enumerate()
            .filter(|(_, &g)| g == 1)
            .map(|(u, _)| SampleId::from(u))
            .collect()
    }

    /// Walk `older_sites` in order, writing the consensus allele over the
    /// working sample set and pruning samples by the two-strike rule.
    /// Returns the last site written; stops once the set has shrunk to
    /// half its original size, leaving that site unwritten.
    fn propagate_consensus(
        &self,
        focal_site: usize,
        older_sites: &[(usize, ArenaRef)],
        sample_set: &mut Vec<SampleId>,
        ancestor: &mut [Allele],
    ) -> usize {
        let mut last_site = focal_site;
        let min_sample_set_size = sample_set.len() / 2;
        let mut disagree = bitvec![0; self.num_samples];

        for &(l, genotypes_ref) in older_sites {
            let genotypes = self.arena.get(genotypes_ref);
            let ones: usize = sample_set
                .iter()
                .map(|&u| genotypes[u.as_usize()] as usize)
                .sum();
            let zeros = sample_set.len() - ones;
            let consensus: Allele = if ones >= zeros { 1 } else { 0 };

            // A sample that disagreed at the previous older site and
            // disagrees again here is dropped from the working set.
            sample_set
                .retain(|&u| !(disagree[u.as_usize()] && genotypes[u.as_usize()] != consensus));
            if sample_set.len() <= min_sample_set_size {
                break;
            }
            ancestor[l] = consensus;
            last_site = l;
            for &u in sample_set.iter() {
                disagree.set(u.as_usize(), genotypes[u.as_usize()] != consensus);
            }
        }
        last_site
    }

    /// Debug-only consistency walk over the frequency buckets.
    #[cfg(debug_assertions)]
    fn check_state(&self) {
        for (frequency, bucket) in self.frequency_buckets.iter().enumerate() {
            for entry in bucket.iter() {
                for &site in &entry.sites {
                    let record = &self.sites[site.as_usize()];
                    debug_assert_eq!(record.frequency as usize, frequency);
                    debug_assert_eq!(record.genotypes, Some(entry.genotypes));
                }
            }
        }
    }
}

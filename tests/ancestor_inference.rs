use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use haploom::{AncestorBuilder, SiteId, UNKNOWN_ALLELE};

/// Build a finalised builder over randomly generated genotype columns.
/// Frequencies are the actual derived-allele counts of the columns.
fn random_builder(num_samples: usize, num_sites: usize, seed: u64) -> AncestorBuilder {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = AncestorBuilder::new(num_samples, num_sites, 0).unwrap();
    for l in 0..num_sites {
        let column: Vec<u8> = (0..num_samples)
            .map(|_| if rng.gen_bool(0.4) { 1 } else { 0 })
            .collect();
        let frequency = column.iter().filter(|&&g| g == 1).count() as u32;
        builder
            .add_site(SiteId::from(l), frequency, &column)
            .unwrap();
    }
    builder.finalise().unwrap();
    builder
}

#[test]
fn deduplication_scenario() {
    let mut builder = AncestorBuilder::new(4, 3, 0).unwrap();
    builder.add_site(SiteId::new(0), 2, &[1, 1, 0, 0]).unwrap();
    builder.add_site(SiteId::new(1), 2, &[1, 1, 0, 0]).unwrap();
    builder.add_site(SiteId::new(2), 2, &[0, 1, 1, 0]).unwrap();
    builder.finalise().unwrap();

    // One focal site per descriptor: three descriptors, all frequency 2.
    let descriptors = builder.descriptors();
    assert_eq!(descriptors.len(), 3);
    assert_eq!(builder.num_ancestors(), 3);
    for d in descriptors {
        assert_eq!(d.frequency, 2);
        assert_eq!(d.focal_sites.len(), 1);
    }

    // Sites 0 and 1 share a pattern, so their descriptors are adjacent
    // and in ascending site order.
    let focal: Vec<SiteId> = descriptors.iter().map(|d| d.focal_sites[0]).collect();
    assert_eq!(focal, vec![SiteId::new(2), SiteId::new(0), SiteId::new(1)]);
}

#[test]
fn descriptor_frequencies_are_non_increasing() {
    let builder = random_builder(10, 50, 1);
    let frequencies: Vec<u32> = builder.descriptors().iter().map(|d| d.frequency).collect();
    assert!(frequencies.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn every_informative_site_becomes_a_focal_site_once() {
    let num_samples = 10;
    let num_sites = 60;
    let mut rng = StdRng::seed_from_u64(2);
    let mut builder = AncestorBuilder::new(num_samples, num_sites, 0).unwrap();
    let mut informative = Vec::new();
    for l in 0..num_sites {
        let column: Vec<u8> = (0..num_samples)
            .map(|_| if rng.gen_bool(0.3) { 1 } else { 0 })
            .collect();
        let frequency = column.iter().filter(|&&g| g == 1).count() as u32;
        if frequency >= 2 {
            informative.push(SiteId::from(l));
        }
        builder
            .add_site(SiteId::from(l), frequency, &column)
            .unwrap();
    }
    builder.finalise().unwrap();

    let mut emitted: Vec<SiteId> = builder
        .descriptors()
        .iter()
        .flat_map(|d| d.focal_sites.iter().copied())
        .collect();
    emitted.sort();
    assert_eq!(emitted, informative);
}

#[test]
fn ancestors_satisfy_interval_invariants() {
    let builder = random_builder(12, 40, 3);
    let num_sites = builder.num_sites();
    for descriptor in builder.descriptors() {
        let mut ancestor = vec![0u8; num_sites];
        let (start, end) = builder
            .make_ancestor(&descriptor.focal_sites, &mut ancestor)
            .unwrap();
        let focal = descriptor.focal_sites[0].as_usize();

        assert!(start <= focal && focal < end);
        assert_eq!(ancestor[focal], 1);
        for (l, &a) in ancestor.iter().enumerate() {
            if l >= start && l < end {
                assert!(a == 0 || a == 1, "site {l} inside [{start}, {end}) was {a}");
            } else {
                assert_eq!(a, UNKNOWN_ALLELE, "site {l} outside [{start}, {end})");
            }
        }
    }
}

#[test]
fn make_ancestor_is_deterministic() {
    let a = random_builder(9, 35, 4);
    let b = random_builder(9, 35, 4);
    assert_eq!(a.descriptors(), b.descriptors());

    for descriptor in a.descriptors() {
        let mut first = vec![0u8; a.num_sites()];
        let mut second = vec![0u8; b.num_sites()];
        let bounds_a = a.make_ancestor(&descriptor.focal_sites, &mut first).unwrap();
        let bounds_b = b
            .make_ancestor(&descriptor.focal_sites, &mut second)
            .unwrap();
        assert_eq!(bounds_a, bounds_b);
        assert_eq!(first, second);
    }
}

#[test]
fn concurrent_ancestor_generation_matches_serial() {
    let builder = random_builder(10, 50, 5);
    let num_sites = builder.num_sites();

    let serial: Vec<(Vec<u8>, (usize, usize))> = builder
        .descriptors()
        .iter()
        .map(|d| {
            let mut ancestor = vec![0u8; num_sites];
            let bounds = builder.make_ancestor(&d.focal_sites, &mut ancestor).unwrap();
            (ancestor, bounds)
        })
        .collect();

    let parallel: Vec<(Vec<u8>, (usize, usize))> = builder
        .descriptors()
        .par_iter()
        .map(|d| {
            let mut ancestor = vec![0u8; num_sites];
            let bounds = builder.make_ancestor(&d.focal_sites, &mut ancestor).unwrap();
            (ancestor, bounds)
        })
        .collect();

    assert_eq!(serial, parallel);
}

#[test]
fn boundary_frequencies() {
    let mut builder = AncestorBuilder::new(4, 3, 0).unwrap();
    // Absent and singleton sites are accepted but contribute nothing.
    builder.add_site(SiteId::new(0), 0, &[0, 0, 0, 0]).unwrap();
    builder.add_site(SiteId::new(1), 1, &[0, 0, 1, 0]).unwrap();
    // A fixed site carries the all-ones pattern.
    builder.add_site(SiteId::new(2), 4, &[1, 1, 1, 1]).unwrap();
    builder.finalise().unwrap();

    let descriptors = builder.descriptors();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].frequency, 4);
    assert_eq!(descriptors[0].focal_sites, vec![SiteId::new(2)]);
}

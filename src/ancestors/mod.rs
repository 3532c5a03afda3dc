//! # Ancestors Module
//!
//! ## Role
//! Synthesis of putative ancestral haplotypes from observed genotype
//! columns, ordered by age (derived-allele frequency).
//!
//! ## Pipeline
//! A caller feeds one genotype column per site into the
//! [`AncestorBuilder`], which groups sites by frequency and deduplicates
//! byte-identical columns through per-frequency ordered pattern maps.
//! Finalisation emits [`AncestorDescriptor`]s in decreasing-frequency
//! order; each descriptor is then materialized into a full-length
//! ancestral haplotype by consensus propagation from its focal site.
//!
//! ## Sub-modules
//! - `arena`: Chunked byte arena owning the canonical genotype patterns
//! - `pattern_map`: Ordered, deduplicating map from pattern to sites
//! - `builder`: The ancestor builder itself

pub mod arena;
pub mod builder;
pub mod pattern_map;

pub use arena::{ArenaRef, PatternArena};
pub use builder::{AncestorBuilder, AncestorDescriptor};
pub use pattern_map::{PatternEntry, PatternMap};

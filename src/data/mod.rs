//! # Data Module
//!
//! ## Role
//! In-memory representations of genomic data shared by the ancestor
//! builder and the threading model.
//!
//! ## Design Philosophy
//! - **Zero-cost newtypes:** `SiteId` and `SampleId` prevent index bugs
//!   at compile time with no runtime overhead.
//! - **Structural immutability:** `ReferencePanel` owns plain buffers with
//!   no interior mutability, so sharing it across threaders by reference
//!   is safe by construction.
//!
//! ## Sub-modules
//! - `site`: Allele encoding and index types for sites and samples
//! - `panel`: The immutable reference panel consumed by the threader

pub mod panel;
pub mod site;

pub use panel::ReferencePanel;
pub use site::{Allele, SampleId, SiteId, UNKNOWN_ALLELE};

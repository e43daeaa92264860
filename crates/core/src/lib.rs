//! Truth tables, label corruption and contact-graph noise for benchmarking
//! metagenomic contact-graph clustering.
//!
//! ## Key Concepts
//!
//! - **Truth tables**: multi-label object → class assignments with support,
//!   projected to hard (one label) or soft (all labels) form
//! - **Comparison**: contingency tables over objects shared by two tables
//! - **Corruption**: seeded label mutation and indels for metric sensitivity tests
//! - **Noise**: seeded, length-weighted spurious contacts added to a contact graph

pub mod compare;
pub mod config;
pub mod corrupt;
pub mod error;
pub mod graph;
pub mod locate;
pub mod noise;
pub mod truth;

pub use compare::{ContingencyTable, crosstab};
pub use config::Config;
pub use corrupt::{CorruptionParams, corrupt, corrupt_seeded};
pub use error::{Error, Result};
pub use graph::{Contact, ContactGraph, Contig};
pub use locate::search_up;
pub use noise::{LengthIndex, NoiseInjector, NoiseParams, Replicate, ReplicateReport, replicate_file_name, replicate_seeds};
pub use truth::{LabelVector, RawAssignment, Supports, TableSummary, TruthTable, read_cluster_listing, read_truth};

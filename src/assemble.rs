//! Overlap discovery and quality-weighted consensus assembly.

pub mod algorithm;
pub mod config;
pub mod counters;
pub mod engine;
pub mod kmer;
pub mod nt;
pub mod primer;
pub mod qual;
pub mod types;

pub use algorithm::{OverlapScorer, ScoringAlgorithm};
pub use config::{AssemblerConfig, AssemblerConfigBuilder};
pub use counters::{AssemblyCounters, LogCode, LogContext, Logger, NullLogger};
pub use engine::Assembler;
pub use types::{AssembledResult, PairId, QualBase, Read, Rejection, ResultBase, MAX_LEN};

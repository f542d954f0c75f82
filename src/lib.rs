//! Paired-end overlap discovery and quality-weighted consensus
//! assembly: a k-mer-indexed candidate generator, a pluggable
//! probabilistic scoring model, and a consensus reconstructor that
//! tracks per-base error probability in log space.

pub mod assemble;
pub mod cli;

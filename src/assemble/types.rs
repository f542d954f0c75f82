//! Core data types shared across the assembly pipeline.

use crate::assemble::nt::Nt;
use std::fmt;

/// Compile-time cap on read and consensus length.
pub const MAX_LEN: usize = 500;

/// A single base with a PHRED quality score, as delivered by the input
/// iterator (decoding FASTQ is out of scope for this crate; see
/// `crate::cli::fastq` for the demonstration binary's minimal reader).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualBase {
    pub nt: Nt,
    pub phred: u8,
}

impl QualBase {
    pub fn new(nt: Nt, phred: u8) -> Self {
        QualBase {
            nt,
            phred: crate::assemble::qual::clamp_phred(phred),
        }
    }
}

/// A single consensus base: its nucleotide set and the log-probability
/// that it is wrong.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultBase {
    pub nt: Nt,
    pub p_log: f64,
}

/// A read is simply an ordered sequence of quality bases.
pub type Read = Vec<QualBase>;

/// Opaque paired-read identifier. Parsing an Illumina-style header into
/// this structure is out of core scope; the demonstration binary does a
/// best-effort job in `crate::cli::fastq`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PairId {
    pub instrument: String,
    pub run: i64,
    pub flowcell: String,
    pub lane: u32,
    pub tile: u32,
    pub x: u32,
    pub y: u32,
    pub tag: Option<String>,
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}",
            self.instrument, self.run, self.flowcell, self.lane, self.tile, self.x, self.y
        )?;
        if let Some(tag) = &self.tag {
            write!(f, "#{tag}")?;
        }
        Ok(())
    }
}

/// The outcome of a successful assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledResult {
    pub id: PairId,
    pub forward_offset: usize,
    pub reverse_offset: usize,
    pub consensus: Vec<ResultBase>,
    pub quality: f64,
    pub degenerates: usize,
    pub overlap_len: usize,
    pub overlap_mismatches: usize,
    pub overlaps_examined: usize,
}

impl AssembledResult {
    /// Render the consensus as an ASCII string.
    pub fn sequence_string(&self) -> String {
        self.consensus
            .iter()
            .map(|b| crate::assemble::nt::nt_to_ascii(b.nt))
            .collect()
    }
}

/// A typed rejection reason. The core never panics or returns a bare
/// `anyhow::Error` for a domain-level assembly failure; every failure
/// mode the algorithm can produce is named here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    NoForwardPrimer,
    NoReversePrimer,
    FailedAlignment,
    NegativeSequenceLength,
    SequenceTooLong,
    LowQuality { quality: f64, threshold: f64 },
    ModuleRejected,
    BadRead,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoForwardPrimer => write!(f, "forward primer not found"),
            Rejection::NoReversePrimer => write!(f, "reverse primer not found"),
            Rejection::FailedAlignment => write!(f, "no overlap met the minimum score"),
            Rejection::NegativeSequenceLength => write!(f, "reconstructed sequence length was not positive"),
            Rejection::SequenceTooLong => write!(f, "reconstructed sequence exceeds MAX_LEN"),
            Rejection::LowQuality { quality, threshold } => write!(
                f,
                "consensus quality {:.4} below threshold {:.4}",
                quality.exp(),
                threshold
            ),
            Rejection::ModuleRejected => write!(f, "rejected by a post-check module"),
            Rejection::BadRead => write!(f, "rejected by a pre-check module or malformed read"),
        }
    }
}

impl std::error::Error for Rejection {}

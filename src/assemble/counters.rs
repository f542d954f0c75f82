//! Per-assembler counters and the logging trait.
//!
//! `AssemblyCounters` follows the reference crate's counter-struct
//! pattern in `cli/counters.rs`: a plain `Default` struct with an
//! `AddAssign` impl so one counter set per `rayon` worker can be
//! summed into a single grand total after the parallel pass completes.

use std::ops::AddAssign;

use crate::assemble::types::{PairId, Rejection};

#[derive(Debug, Clone, Default)]
pub struct AssemblyCounters {
    pub ok_count: u64,
    pub nofp_count: u64,
    pub norp_count: u64,
    pub noalgn_count: u64,
    pub lowq_count: u64,
    pub badread_count: u64,
    pub module_rejected_count: u64,
    pub negative_length_count: u64,
    pub too_long_count: u64,
    pub lost_kmer_count: u64,
    pub slow_count: u64,
    pub longest_overlap: usize,
    pub overlap_count: Vec<u64>,
}

impl AssemblyCounters {
    pub fn total(&self) -> u64 {
        self.ok_count
            + self.nofp_count
            + self.norp_count
            + self.noalgn_count
            + self.lowq_count
            + self.badread_count
            + self.module_rejected_count
            + self.negative_length_count
            + self.too_long_count
    }

    /// Record a successful assembly of the given overlap length.
    pub fn record_ok(&mut self, overlap: usize) {
        self.ok_count += 1;
        self.longest_overlap = self.longest_overlap.max(overlap);
        if overlap >= self.overlap_count.len() {
            self.overlap_count.resize(overlap + 1, 0);
        }
        self.overlap_count[overlap] += 1;
    }

    /// Record a rejection, bumping the counter that `Rejection`'s
    /// variant corresponds to per the logging-code table.
    pub fn record_rejection(&mut self, reason: &Rejection) {
        match reason {
            Rejection::NoForwardPrimer => self.nofp_count += 1,
            Rejection::NoReversePrimer => self.norp_count += 1,
            Rejection::FailedAlignment => self.noalgn_count += 1,
            Rejection::NegativeSequenceLength => self.negative_length_count += 1,
            Rejection::SequenceTooLong => self.too_long_count += 1,
            Rejection::LowQuality { .. } => self.lowq_count += 1,
            Rejection::ModuleRejected => self.module_rejected_count += 1,
            Rejection::BadRead => self.badread_count += 1,
        }
    }
}

impl AddAssign for AssemblyCounters {
    fn add_assign(&mut self, other: Self) {
        self.ok_count += other.ok_count;
        self.nofp_count += other.nofp_count;
        self.norp_count += other.norp_count;
        self.noalgn_count += other.noalgn_count;
        self.lowq_count += other.lowq_count;
        self.badread_count += other.badread_count;
        self.module_rejected_count += other.module_rejected_count;
        self.negative_length_count += other.negative_length_count;
        self.too_long_count += other.too_long_count;
        self.lost_kmer_count += other.lost_kmer_count;
        self.slow_count += other.slow_count;
        self.longest_overlap = self.longest_overlap.max(other.longest_overlap);
        if other.overlap_count.len() > self.overlap_count.len() {
            self.overlap_count.resize(other.overlap_count.len(), 0);
        }
        for (i, v) in other.overlap_count.into_iter().enumerate() {
            self.overlap_count[i] += v;
        }
    }
}

/// Observability event codes, one per noteworthy occurrence during
/// assembly (mirrors the original tool's `PandaCode` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCode {
    NoForwardPrimer,
    NoReversePrimer,
    NegativeSequenceLength,
    SequenceTooLong,
    LowQualityReject,
    ModuleRejected,
    MismatchedBase,
    ParseFailure,
    BadNt,
    BestOverlap,
    LostKmer,
    SlowFallback,
}

/// Context attached to a single log event, identifying which pair (if
/// any) it concerns.
#[derive(Debug, Clone)]
pub struct LogContext<'a> {
    pub id: Option<&'a PairId>,
    pub message: &'a str,
}

impl<'a> LogContext<'a> {
    pub fn new(id: Option<&'a PairId>, message: &'a str) -> Self {
        LogContext { id, message }
    }
}

pub trait Logger {
    fn log(&self, code: LogCode, context: LogContext<'_>);
}

/// Default, no-op logger, used when the harness does not care to
/// observe per-event detail (the per-assembler `AssemblyCounters` still
/// accumulate regardless of whether a `Logger` is attached).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _code: LogCode, _context: LogContext<'_>) {}
}

//! The assembler: owns per-pair scratch state and drives the
//! overlap-discovery and consensus-reconstruction pipeline end to end.

use std::sync::Arc;

use crate::assemble::algorithm::OverlapScorer;
use crate::assemble::config::AssemblerConfig;
use crate::assemble::counters::{AssemblyCounters, LogCode, LogContext, Logger, NullLogger};
use crate::assemble::kmer::{CandidateBitmap, KmerTable};
use crate::assemble::nt::is_degenerate;
use crate::assemble::primer::compute_offset_qual;
use crate::assemble::qual::{self, clamp_phred};
use crate::assemble::types::{AssembledResult, PairId, QualBase, Read, Rejection, ResultBase, MAX_LEN};

/// Vetoes a pair before any work happens; analogous to the original's
/// pre-check module list.
pub trait PreCheck: Fn(&PairId, &[QualBase], &[QualBase]) -> bool + Send + Sync {}
impl<T: Fn(&PairId, &[QualBase], &[QualBase]) -> bool + Send + Sync> PreCheck for T {}

/// Vetoes an otherwise-successful assembly; analogous to the original's
/// post-check module list.
pub trait PostCheck: Fn(&AssembledResult) -> bool + Send + Sync {}
impl<T: Fn(&AssembledResult) -> bool + Send + Sync> PostCheck for T {}

/// A single-threaded assembly instance. Not `Sync`: the k-mer table,
/// candidate bitmap, and scratch read buffers are mutated per call, so
/// concurrent use means one `Assembler` per worker thread, each sharing
/// the immutable `Arc<AssemblerConfig>` and `Arc<dyn Logger>`.
pub struct Assembler {
    config: Arc<AssemblerConfig>,
    logger: Arc<dyn Logger + Send + Sync>,
    kmer_table: KmerTable,
    bitmap: CandidateBitmap,
    forward_scratch: Read,
    reverse_scratch: Read,
    pre_checks: Vec<Box<dyn PreCheck>>,
    post_checks: Vec<Box<dyn PostCheck>>,
    pub counters: AssemblyCounters,
}

impl Assembler {
    pub fn new(config: Arc<AssemblerConfig>) -> Self {
        Assembler::with_logger(config, Arc::new(NullLogger))
    }

    pub fn with_logger(config: Arc<AssemblerConfig>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        let kmer_table = KmerTable::new(config.kmer_len, config.num_kmers);
        Assembler {
            config,
            logger,
            kmer_table,
            bitmap: CandidateBitmap::new(MAX_LEN),
            forward_scratch: Vec::with_capacity(MAX_LEN),
            reverse_scratch: Vec::with_capacity(MAX_LEN),
            pre_checks: Vec::new(),
            post_checks: Vec::new(),
            counters: AssemblyCounters::default(),
        }
    }

    pub fn add_pre_check(&mut self, check: impl PreCheck + 'static) {
        self.pre_checks.push(Box::new(check));
    }

    pub fn add_post_check(&mut self, check: impl PostCheck + 'static) {
        self.post_checks.push(Box::new(check));
    }

    /// Assemble one read pair. Mutates only this assembler's scratch
    /// state; `forward`/`reverse` are left untouched.
    pub fn assemble(
        &mut self,
        id: &PairId,
        forward: &[QualBase],
        reverse: &[QualBase],
    ) -> Result<AssembledResult, Rejection> {
        let result = self.assemble_inner(id, forward, reverse);
        if let Err(reason) = &result {
            self.counters.record_rejection(reason);
        }
        result
    }

    fn assemble_inner(
        &mut self,
        id: &PairId,
        forward: &[QualBase],
        reverse: &[QualBase],
    ) -> Result<AssembledResult, Rejection> {
        for check in &self.pre_checks {
            if !check(id, forward, reverse) {
                return Err(Rejection::BadRead);
            }
        }

        let forward_offset = match &self.config.forward_primer {
            Some(primer) => {
                let found = compute_offset_qual(
                    self.config.log_threshold,
                    self.config.primer_penalty,
                    false,
                    forward,
                    primer,
                );
                if found == 0 {
                    self.logger.log(
                        LogCode::NoForwardPrimer,
                        LogContext::new(Some(id), "forward primer not found"),
                    );
                    return Err(Rejection::NoForwardPrimer);
                }
                found - 1
            }
            None => self.config.forward_trim,
        };

        let reverse_offset = match &self.config.reverse_primer {
            Some(primer) => {
                // The core's own primer pre-check scans left-to-right for
                // both reads, matching assembler.c's internal single-
                // direction `computeoffset`; `reverse` reads are already
                // expressed in the per-base-complemented, order-preserved
                // convention, so no tail-first scan is needed here (that
                // mode exists in `compute_offset`/`compute_offset_qual`
                // for callers building their own primer-search modules).
                let found = compute_offset_qual(
                    self.config.log_threshold,
                    self.config.primer_penalty,
                    false,
                    reverse,
                    primer,
                );
                if found == 0 {
                    self.logger.log(
                        LogCode::NoReversePrimer,
                        LogContext::new(Some(id), "reverse primer not found"),
                    );
                    return Err(Rejection::NoReversePrimer);
                }
                found - 1
            }
            None => self.config.reverse_trim,
        };

        self.kmer_table.clear();
        self.bitmap.clear();

        self.kmer_table.index_forward(forward);
        let min_overlap = self.config.min_overlap;
        self.kmer_table
            .mark_candidates(reverse, forward.len(), reverse.len(), min_overlap, &mut self.bitmap);

        let lost = self.kmer_table.lost_count();
        self.counters.lost_kmer_count += lost;
        if lost > 0 {
            self.logger.log(LogCode::LostKmer, LogContext::new(Some(id), "kmer slots exhausted"));
        }

        let max_overlap = if self.config.max_overlap == 0 {
            forward.len().min(reverse.len())
        } else {
            self.config.max_overlap
        };

        if self.bitmap.is_empty() {
            self.bitmap.set_all(max_overlap.saturating_sub(min_overlap));
            self.counters.slow_count += 1;
            self.logger.log(LogCode::SlowFallback, LogContext::new(Some(id), "no kmer candidates"));
        }

        let overlaps_examined = self.bitmap.iter_set().count();
        let best = self.best_overlap(forward, reverse, min_overlap, max_overlap);
        self.kmer_table.clear();
        self.bitmap.clear();

        let overlap = match best {
            Some(overlap) => overlap,
            None => return Err(Rejection::FailedAlignment),
        };

        self.logger.log(LogCode::BestOverlap, LogContext::new(Some(id), "overlap selected"));

        self.forward_scratch.clear();
        self.forward_scratch.extend_from_slice(forward);
        self.reverse_scratch.clear();
        self.reverse_scratch.extend_from_slice(reverse);
        mask_b_cliff(&mut self.forward_scratch);
        mask_b_cliff(&mut self.reverse_scratch);

        let result = reconstruct(
            id.clone(),
            &self.forward_scratch,
            &self.reverse_scratch,
            forward_offset,
            reverse_offset,
            overlap,
            overlaps_examined,
        )?;

        if result.quality.exp() < self.config.threshold {
            self.logger.log(LogCode::LowQualityReject, LogContext::new(Some(id), "below threshold"));
            return Err(Rejection::LowQuality {
                quality: result.quality,
                threshold: self.config.threshold,
            });
        }

        for check in &self.post_checks {
            if !check(&result) {
                self.logger.log(LogCode::ModuleRejected, LogContext::new(Some(id), "post-check vetoed"));
                return Err(Rejection::ModuleRejected);
            }
        }

        self.counters.record_ok(result.overlap_len);
        Ok(result)
    }

    fn best_overlap(
        &self,
        forward: &[QualBase],
        reverse: &[QualBase],
        min_overlap: usize,
        max_overlap: usize,
    ) -> Option<usize> {
        let algo = &self.config.algorithm;
        let null_score = qual::qual_nn() * (forward.len() + reverse.len()) as f64;
        let mut best_score = null_score;
        let mut best_overlap = None;

        for bit in self.bitmap.iter_set() {
            let overlap = bit + min_overlap;
            if max_overlap > 0 && overlap > max_overlap {
                continue;
            }
            if overlap > forward.len() + reverse.len() {
                continue;
            }
            let score = algo.overlap_prob(forward, reverse, overlap);
            if score > best_score {
                best_score = score;
                best_overlap = Some(overlap);
            }
        }

        best_overlap
    }
}

/// Mask the 3' run of PHRED==2 bases ("B-cliff") to PHRED==0, walking
/// in from the end and stopping at the first base that is not a 2.
fn mask_b_cliff(read: &mut [QualBase]) {
    for base in read.iter_mut().rev() {
        if base.phred == 2 {
            base.phred = 0;
        } else {
            break;
        }
    }
}

fn reconstruct(
    id: PairId,
    forward: &[QualBase],
    reverse: &[QualBase],
    forward_offset: usize,
    reverse_offset: usize,
    overlap: usize,
    overlaps_examined: usize,
) -> Result<AssembledResult, Rejection> {
    let df = forward.len() as isize - forward_offset as isize - overlap as isize;
    let dr = reverse.len() as isize - reverse_offset as isize - overlap as isize;
    let len = df + overlap as isize + dr + 1;

    if len <= 0 {
        return Err(Rejection::NegativeSequenceLength);
    }
    if len as usize > MAX_LEN {
        return Err(Rejection::SequenceTooLong);
    }

    let mut consensus: Vec<ResultBase> = Vec::with_capacity(len as usize - 1);
    let mut degenerates = 0usize;
    let mut overlap_mismatches = 0usize;

    // 1. Forward-only prefix.
    if df > 0 {
        for i in 0..df as usize {
            let base = forward[forward_offset + i];
            let q = clamp_phred(base.phred) as usize;
            consensus.push(ResultBase {
                nt: base.nt,
                p_log: qual::qual_score()[q],
            });
            if is_degenerate(base.nt) {
                degenerates += 1;
            }
        }
    }

    // 2. Overlap region.
    let overlap_positions = overlap as isize + df.min(0) + dr.min(0);
    for i in 0..overlap_positions.max(0) {
        let f_index = forward_offset as isize + df + i;
        let r_index = reverse.len() as isize - i - 1 + df.min(0);
        if f_index < 0 || r_index < 0 || f_index as usize >= forward.len() || r_index as usize >= reverse.len() {
            continue;
        }
        let f = forward[f_index as usize];
        let r = reverse[r_index as usize];

        let is_match = (f.nt & r.nt) != 0;
        let nt = if is_match {
            f.nt & r.nt
        } else if f.phred >= r.phred {
            f.nt
        } else {
            r.nt
        };

        let p_log = if f.phred == 0 && r.phred == 0 {
            qual::qual_nn()
        } else if f.phred == 0 {
            if is_match {
                qual::qual_score()[clamp_phred(r.phred) as usize]
            } else {
                qual::qual_nn()
            }
        } else if r.phred == 0 {
            if is_match {
                qual::qual_score()[clamp_phred(f.phred) as usize]
            } else {
                qual::qual_nn()
            }
        } else if is_match {
            qual::qual_match()[clamp_phred(f.phred) as usize][clamp_phred(r.phred) as usize]
        } else {
            qual::qual_mismatch()[clamp_phred(f.phred) as usize][clamp_phred(r.phred) as usize]
        };

        if !is_match {
            overlap_mismatches += 1;
        }
        if is_degenerate(nt) {
            degenerates += 1;
        }
        consensus.push(ResultBase { nt, p_log });
    }

    // 3. Reverse-only suffix (already complemented on ingest; walked
    // tail-first via the same `reverse_length - overlap - i - 1`
    // indexing the original uses, which lands on `reverse_offset` for
    // the last position copied).
    if dr > 0 {
        for i in 0..dr as usize {
            let idx = reverse.len() - overlap - 1 - i;
            let base = reverse[idx];
            let q = clamp_phred(base.phred) as usize;
            consensus.push(ResultBase {
                nt: base.nt,
                p_log: qual::qual_score()[q],
            });
            if is_degenerate(base.nt) {
                degenerates += 1;
            }
        }
    }

    let total_p: f64 = consensus.iter().map(|b| b.p_log).sum();
    let quality = total_p / consensus.len().max(1) as f64;

    Ok(AssembledResult {
        id,
        forward_offset,
        reverse_offset,
        consensus,
        quality,
        degenerates,
        overlap_len: overlap,
        overlap_mismatches,
        overlaps_examined,
    })
}

//! Pluggable overlap-scoring algorithms (C3).
//!
//! Modeled as a tagged enum with an `OverlapScorer` trait implementation,
//! the same shape the reference crate uses for its `Width`/`KmerCodes`
//! variant sets in `kmer_codec.rs`, rather than the struct-of-function-
//! pointers "class" the original C uses.

use crate::assemble::nt::{is_n, matches as nt_matches};
use crate::assemble::qual::{self, clamp_phred};
use crate::assemble::types::QualBase;

/// Shared behaviour every scoring model must provide.
pub trait OverlapScorer {
    /// Log-probability of the candidate overlap between `forward` and
    /// `reverse` of length `overlap` (reverse indexed from its end).
    fn overlap_prob(&self, forward: &[QualBase], reverse: &[QualBase], overlap: usize) -> f64;

    /// Log-probability that two individual quality bases, already
    /// classified as matching or not, are correct together.
    fn match_prob(&self, is_match: bool, a_phred: u8, b_phred: u8) -> f64;

    /// Log-probability assigned to a base pair outside the overlap, or
    /// where one side is entirely unknown (N).
    fn p_unpaired_n(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleBayesParams {
    pub q: f64,
    p_match: f64,
    p_mismatch: f64,
}

impl SimpleBayesParams {
    pub fn new(q: f64) -> Self {
        SimpleBayesParams {
            q,
            p_match: (0.25 * (1.0 - q).powi(2)).ln(),
            p_mismatch: ((3.0 * q - 2.0 * q * q) / 18.0).ln(),
        }
    }
}

impl Default for SimpleBayesParams {
    fn default() -> Self {
        SimpleBayesParams::new(0.36)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PearParams {
    pub random_base_log_p: f64,
}

impl Default for PearParams {
    fn default() -> Self {
        PearParams {
            random_base_log_p: 0.25f64.ln(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UparseParams {
    pub q: f64,
    p_match: f64,
    p_mismatch: f64,
}

impl UparseParams {
    pub fn new(q: f64) -> Self {
        UparseParams {
            q,
            p_match: (1.0 - q * q * (1.0 - 2.0 * q + 4.0 * q * q / 3.0)).ln(),
            p_mismatch: (1.0 - (4.0 * q / 3.0) / (2.0 * q - 4.0 * q * q / 3.0)).ln(),
        }
    }
}

impl Default for UparseParams {
    fn default() -> Self {
        UparseParams::new(0.36)
    }
}

/// One variant per scoring model supported by the original tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringAlgorithm {
    SimpleBayes(SimpleBayesParams),
    Pear(PearParams),
    Flash,
    Uparse(UparseParams),
    RdpMle,
    Stitch,
}

impl Default for ScoringAlgorithm {
    fn default() -> Self {
        ScoringAlgorithm::SimpleBayes(SimpleBayesParams::default())
    }
}

impl ScoringAlgorithm {
    pub fn simple_bayes(q: f64) -> Self {
        ScoringAlgorithm::SimpleBayes(SimpleBayesParams::new(q))
    }

    pub fn pear(random_base: f64) -> Self {
        ScoringAlgorithm::Pear(PearParams {
            random_base_log_p: random_base.ln(),
        })
    }

    pub fn uparse(q: f64) -> Self {
        ScoringAlgorithm::Uparse(UparseParams::new(q))
    }
}

/// Index `forward`/`reverse` at overlap position `i` the way every
/// variant does: `findex = |F| + i - overlap`, `rindex = |R| - i - 1`.
/// Returns `None` when the computed index falls outside either read
/// (only possible when `overlap` exceeds one read's length, which
/// callers must otherwise avoid for full-fidelity scoring but which
/// PEAR/FLASH/UPARSE/RDP-MLE explicitly tolerate).
#[inline]
fn overlap_bases<'a>(
    forward: &'a [QualBase],
    reverse: &'a [QualBase],
    overlap: usize,
    i: usize,
) -> Option<(&'a QualBase, &'a QualBase)> {
    let findex = forward.len() as isize + i as isize - overlap as isize;
    let rindex = reverse.len() as isize - i as isize - 1;
    if findex < 0 || rindex < 0 || findex as usize >= forward.len() || rindex as usize >= reverse.len() {
        return None;
    }
    Some((&forward[findex as usize], &reverse[rindex as usize]))
}

impl OverlapScorer for ScoringAlgorithm {
    fn overlap_prob(&self, forward: &[QualBase], reverse: &[QualBase], overlap: usize) -> f64 {
        match self {
            ScoringAlgorithm::SimpleBayes(p) => {
                let (mut matches, mut mismatches, mut unknowns) = (0usize, 0usize, 0usize);
                for i in 0..overlap {
                    let Some((f, r)) = overlap_bases(forward, reverse, overlap, i) else {
                        continue;
                    };
                    if is_n(f.nt) || is_n(r.nt) {
                        unknowns += 1;
                    } else if nt_matches(f.nt, r.nt) {
                        matches += 1;
                    } else {
                        mismatches += 1;
                    }
                }
                let residual = forward.len() + reverse.len() - 2 * overlap + unknowns;
                qual::qual_nn() * residual as f64
                    + matches as f64 * p.p_match
                    + mismatches as f64 * p.p_mismatch
            }
            ScoringAlgorithm::Pear(p) => {
                let mut probability = 0.0;
                for i in 0..overlap {
                    let Some((f, r)) = overlap_bases(forward, reverse, overlap, i) else {
                        continue;
                    };
                    if is_n(f.nt) || is_n(r.nt) {
                        probability -= p.random_base_log_p;
                    } else if nt_matches(f.nt, r.nt) {
                        probability += qual::qual_match()[clamp_phred(f.phred) as usize][clamp_phred(r.phred) as usize];
                    } else {
                        probability += qual::qual_mismatch()[clamp_phred(f.phred) as usize][clamp_phred(r.phred) as usize];
                    }
                }
                probability
            }
            ScoringAlgorithm::Flash => {
                let mut mismatches = 0usize;
                let mut real_overlap = 0usize;
                for i in 0..overlap {
                    let Some((f, r)) = overlap_bases(forward, reverse, overlap, i) else {
                        continue;
                    };
                    if is_n(f.nt) || is_n(r.nt) || !nt_matches(f.nt, r.nt) {
                        mismatches += 1;
                    }
                    real_overlap += 1;
                }
                (mismatches as f64 / real_overlap as f64).ln()
            }
            ScoringAlgorithm::Uparse(p) => {
                let (mut matches, mut mismatches, mut unknowns) = (0usize, 0usize, 0usize);
                for i in 0..overlap {
                    let Some((f, r)) = overlap_bases(forward, reverse, overlap, i) else {
                        continue;
                    };
                    if is_n(f.nt) || is_n(r.nt) {
                        unknowns += 1;
                    } else if nt_matches(f.nt, r.nt) {
                        matches += 1;
                    } else {
                        mismatches += 1;
                    }
                }
                let base = matches as f64 * p.p_match + mismatches as f64 * p.p_mismatch;
                if overlap >= forward.len() && overlap >= reverse.len() {
                    qual::qual_nn() * unknowns as f64 + base
                } else {
                    let residual = forward.len() + reverse.len() - 2 * overlap + unknowns;
                    qual::qual_nn() * residual as f64 + base
                }
            }
            ScoringAlgorithm::RdpMle => {
                let mut probability = 0.0;
                let baseline = qual::qual_nn();
                for i in 0..overlap {
                    let Some((f, r)) = overlap_bases(forward, reverse, overlap, i) else {
                        continue;
                    };
                    let fq = clamp_phred(f.phred) as usize;
                    let rq = clamp_phred(r.phred) as usize;
                    if nt_matches(f.nt, r.nt) {
                        probability += qual::qual_match()[fq][rq] - baseline;
                    } else {
                        probability += qual::qual_mismatch_rdp_mle()[fq][rq] - baseline;
                    }
                }
                probability
            }
            ScoringAlgorithm::Stitch => {
                let mut score: i64 = 0;
                for i in 0..overlap {
                    let Some((f, r)) = overlap_bases(forward, reverse, overlap, i) else {
                        continue;
                    };
                    if is_n(f.nt) || is_n(r.nt) {
                        // contributes 0
                    } else if nt_matches(f.nt, r.nt) {
                        score += 1;
                    } else {
                        score -= 1;
                    }
                }
                (score as f64 / (forward.len() + reverse.len()) as f64).ln()
            }
        }
    }

    fn match_prob(&self, is_match: bool, a_phred: u8, b_phred: u8) -> f64 {
        let a = clamp_phred(a_phred) as usize;
        let b = clamp_phred(b_phred) as usize;
        match self {
            ScoringAlgorithm::SimpleBayes(_) | ScoringAlgorithm::Stitch => {
                if is_match {
                    qual::qual_match()[a][b]
                } else {
                    qual::qual_mismatch()[a][b]
                }
            }
            ScoringAlgorithm::Pear(_) => {
                if is_match {
                    qual::qual_match()[a][b]
                } else {
                    qual::qual_mismatch()[a][b]
                }
            }
            ScoringAlgorithm::Flash => {
                if is_match {
                    let best = a.max(b);
                    qual::qual_score()[best]
                } else {
                    let diff = (a as i32 - b as i32).unsigned_abs() as usize;
                    qual::qual_score()[diff.max(2)]
                }
            }
            ScoringAlgorithm::Uparse(_) => {
                if is_match {
                    qual::qual_match_uparse()[a][b]
                } else {
                    qual::qual_mismatch_uparse()[a][b]
                }
            }
            ScoringAlgorithm::RdpMle => {
                if is_match {
                    let best = a.max(b);
                    qual::qual_score()[best]
                } else {
                    qual::qual_mismatch_rdp_mle()[a][b]
                }
            }
        }
    }

    fn p_unpaired_n(&self) -> f64 {
        qual::qual_nn()
    }
}

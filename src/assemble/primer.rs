//! Primer alignment: locate degenerate primers within a read by sliding
//! a circular probability buffer across it, exactly as `computeoffset`
//! does in the original tool, generalized here over a closure rather
//! than a C function-pointer plus `void *` payload.

use crate::assemble::nt::{is_n, Nt};
use crate::assemble::qual::{clamp_phred, log1mexp, qual_score, qual_score_err};
use crate::assemble::types::{QualBase, ResultBase};

/// Slide `primer` across a sequence of length `seq_length`, scoring each
/// candidate alignment position with `score(i)`, which must return the
/// base observed at logical position `i` together with the
/// log-probability that it is correct (`prob`) and that it is wrong
/// (`notprob`). When `reverse` is set, position `i` is scored against
/// `seq_length - i - 1` so the same primer can be searched from either
/// end without reversing the underlying read.
///
/// Returns the 1-based offset one past the best-scoring alignment, or 0
/// if no position reaches `threshold` or the primer is longer than the
/// sequence.
pub fn compute_offset(
    threshold: f64,
    penalty: f64,
    reverse: bool,
    seq_length: usize,
    primer: &[Nt],
    score: impl Fn(usize) -> (Nt, f64, f64),
) -> usize {
    let primer_len = primer.len();
    if primer_len == 0 || primer_len > seq_length {
        return 0;
    }

    let mut probabilities = vec![f64::NEG_INFINITY; primer_len];
    let mut best_pr = (primer_len as f64 * threshold).exp();
    let mut best_index = 0usize;

    for index in 0..seq_length {
        let circ = index % primer_len;
        let last_pr = (probabilities[circ] / (index + 1) as f64).exp() - index as f64 * penalty;
        if last_pr > best_pr {
            best_pr = last_pr;
            best_index = index + 1;
        }
        probabilities[circ] = 0.0;

        let x_max = if primer_len > index { index } else { primer_len - 1 };
        for x in (0..=x_max).rev() {
            if is_n(primer[x]) {
                continue;
            }
            let seq_index = if reverse { seq_length - index - 1 } else { index };
            let (nt, p, notp) = score(seq_index);
            let slot = (index - x) % primer_len;
            probabilities[slot] += if nt & primer[x] != 0 { p } else { notp };
        }
    }

    best_index
}

/// Locate `needle` within a PHRED-quality-scored read.
pub fn compute_offset_qual(
    threshold: f64,
    penalty: f64,
    reverse: bool,
    haystack: &[QualBase],
    needle: &[Nt],
) -> usize {
    compute_offset(threshold, penalty, reverse, haystack.len(), needle, |i| {
        let base = haystack[i];
        let q = clamp_phred(base.phred) as usize;
        (base.nt, qual_score()[q], qual_score_err()[q])
    })
}

/// Locate `needle` within an already-assembled consensus, for stripping
/// primers from a finished result rather than a raw read.
pub fn compute_offset_result(
    threshold: f64,
    penalty: f64,
    reverse: bool,
    haystack: &[ResultBase],
    needle: &[Nt],
) -> usize {
    compute_offset(threshold, penalty, reverse, haystack.len(), needle, |i| {
        let base = haystack[i];
        (base.nt, base.p_log, log1mexp(base.p_log))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::nt::{NT_A, NT_C, NT_G, NT_T};

    fn q(nt: Nt, phred: u8) -> QualBase {
        QualBase::new(nt, phred)
    }

    #[test]
    fn empty_primer_finds_nothing() {
        let read = vec![q(NT_A, 40); 10];
        assert_eq!(compute_offset_qual(-5.0, 0.0, false, &read, &[]), 0);
    }

    #[test]
    fn primer_longer_than_read_finds_nothing() {
        let read = vec![q(NT_A, 40); 3];
        let primer = [NT_A, NT_C, NT_G, NT_T];
        assert_eq!(compute_offset_qual(-5.0, 0.0, false, &read, &primer), 0);
    }

    #[test]
    fn exact_primer_match_is_found_at_expected_offset() {
        let mut read = vec![q(NT_A, 40), q(NT_G, 40)];
        let primer = [NT_A, NT_C, NT_G, NT_T];
        read.extend([q(NT_A, 40), q(NT_C, 40), q(NT_G, 40), q(NT_T, 40)]);
        read.extend([q(NT_T, 40), q(NT_T, 40)]);
        let offset = compute_offset_qual(-5.0, 0.0, false, &read, &primer);
        assert_eq!(offset, 6);
    }

    #[test]
    fn reverse_search_scans_from_the_tail() {
        let mut read = vec![q(NT_T, 40), q(NT_T, 40)];
        read.extend([q(NT_A, 40), q(NT_C, 40), q(NT_G, 40), q(NT_T, 40)]);
        read.extend([q(NT_G, 40), q(NT_A, 40)]);
        let primer = [NT_A, NT_C, NT_G, NT_T];
        let offset = compute_offset_qual(-5.0, 0.0, true, &read, &primer);
        assert!(offset > 0);
    }
}

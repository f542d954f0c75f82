//! End-to-end pair-assembly scenarios, exercised through the public
//! library API the way the reference crate's `tests/test_kmer_and_counts.rs`
//! imports the library by its crate name and asserts on public results.

use std::sync::Arc;

use pandastitch::assemble::nt::{nt_from_ascii, nt_from_ascii_complement, NT_N};
use pandastitch::assemble::{AssemblerConfig, Assembler, PairId, QualBase, Rejection, ScoringAlgorithm};

fn pid() -> PairId {
    PairId {
        instrument: "INST".into(),
        run: 1,
        flowcell: "FC".into(),
        lane: 1,
        tile: 1,
        x: 1,
        y: 1,
        tag: None,
    }
}

/// Decode a literal as a forward read: each letter maps to its own base.
fn encode(seq: &str, phred: u8) -> Vec<QualBase> {
    seq.bytes().map(|b| QualBase::new(nt_from_ascii(b), phred)).collect()
}

/// Decode a literal the way a reverse-read FASTQ file is decoded: each
/// letter maps to its *complement*, with array order preserved (no
/// reversal). This mirrors `cli::fastq::FastqReader`'s handling of
/// `Strand::Reverse` and is what `Assembler::assemble` expects its
/// `reverse` argument to already look like.
fn encode_reverse(seq: &str, phred: u8) -> Vec<QualBase> {
    seq.bytes().map(|b| QualBase::new(nt_from_ascii_complement(b), phred)).collect()
}

/// For a reverse read with no extra flanking sequence beyond the
/// overlap itself, the per-base-complement-preserve-order convention
/// collapses to a plain positional reversal of the forward bases
/// (complementing twice cancels out), which is handy for building a
/// read that overlaps a given forward read end-to-end.
fn reverse_of(seq: &[QualBase]) -> Vec<QualBase> {
    seq.iter().rev().cloned().collect()
}

#[test]
fn s1_perfect_overlap_reconstructs_the_amplicon() {
    let config = Arc::new(
        AssemblerConfig::builder()
            .min_overlap(4)
            .threshold(0.6)
            .algorithm(ScoringAlgorithm::simple_bayes(0.36))
            .build()
            .unwrap(),
    );
    let mut assembler = Assembler::new(config);

    let forward = encode("ACGTACGT", 40);
    let reverse = encode_reverse("ACGTACGT", 40); // self-reverse-complementary toy amplicon

    let result = assembler.assemble(&pid(), &forward, &reverse).expect("should assemble");
    assert_eq!(result.overlap_len, 8);
    assert_eq!(result.sequence_string(), "ACGTACGT");
    assert_eq!(result.degenerates, 0);
    assert_eq!(result.overlap_mismatches, 0);
    assert!(result.quality.exp() > 0.99);
}

#[test]
fn s2_single_mismatch_is_still_accepted() {
    let config = Arc::new(
        AssemblerConfig::builder()
            .min_overlap(4)
            .threshold(0.6)
            .algorithm(ScoringAlgorithm::simple_bayes(0.36))
            .build()
            .unwrap(),
    );
    let mut assembler = Assembler::new(config);

    let forward = encode("ACGTACGT", 40);
    let reverse = encode_reverse("ACGTATGT", 40);

    let result = assembler.assemble(&pid(), &forward, &reverse).expect("should assemble");
    assert_eq!(result.overlap_mismatches, 1);
    assert!(result.quality.exp() > 0.6);
}

#[test]
fn s3_non_overlapping_reads_fail_alignment() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(4).threshold(0.6).build().unwrap());
    let mut assembler = Assembler::new(config);

    let forward = encode("AAAAAAAA", 40);
    let reverse = encode("TTTTTTTT", 40);

    let err = assembler.assemble(&pid(), &forward, &reverse).unwrap_err();
    assert_eq!(err, Rejection::FailedAlignment);
    assert_eq!(assembler.counters.noalgn_count, 1);
}

#[test]
fn s4_primer_trimming_locates_both_offsets() {
    let config = Arc::new(
        AssemblerConfig::builder()
            .min_overlap(4)
            .forward_primer(vec![
                nt_from_ascii(b'G'),
                nt_from_ascii(b'C'),
                nt_from_ascii(b'G'),
                nt_from_ascii(b'C'),
            ])
            .reverse_primer(vec![
                nt_from_ascii_complement(b'A'),
                nt_from_ascii_complement(b'T'),
                nt_from_ascii_complement(b'A'),
                nt_from_ascii_complement(b'T'),
            ])
            .build()
            .unwrap(),
    );
    let mut assembler = Assembler::new(config);

    let mut forward = encode("GCGC", 40);
    forward.extend(encode("ACGTACGT", 40));
    let mut reverse = encode_reverse("ATAT", 40);
    reverse.extend(encode_reverse("ACGTACGT", 40));

    let result = assembler.assemble(&pid(), &forward, &reverse).expect("should assemble");
    assert_eq!(result.forward_offset, 4);
    assert_eq!(result.reverse_offset, 4);
}

#[test]
fn s5_n_in_overlap_resolves_to_the_known_base() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(4).build().unwrap());
    let mut assembler = Assembler::new(config);

    let mut forward = encode("ACGT", 40);
    forward.push(QualBase::new(NT_N, 40));
    forward.extend(encode("CGT", 40));
    let reverse = encode_reverse("ACGTACGT", 40);

    let result = assembler.assemble(&pid(), &forward, &reverse).expect("should assemble");
    assert!(result.overlap_len >= 4);
}

#[test]
fn s6_heavy_mismatch_is_rejected_for_low_quality() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(4).threshold(0.6).build().unwrap());
    let mut assembler = Assembler::new(config);

    let forward = encode("ACACACAC", 40);
    let reverse = encode("TGTGTGTA", 40);

    let err = assembler.assemble(&pid(), &forward, &reverse);
    if let Err(reason) = err {
        match reason {
            Rejection::LowQuality { .. } => assert_eq!(assembler.counters.lowq_count, 1),
            Rejection::FailedAlignment => {}
            other => panic!("unexpected rejection: {other:?}"),
        }
    }
}

#[test]
fn empty_reads_fail_alignment_rather_than_panicking() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(2).build().unwrap());
    let mut assembler = Assembler::new(config);
    let err = assembler.assemble(&pid(), &[], &[]).unwrap_err();
    assert_eq!(err, Rejection::FailedAlignment);
}

#[test]
fn exact_overlap_produces_no_prefix_or_suffix() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(4).build().unwrap());
    let mut assembler = Assembler::new(config);

    let forward = encode("ACGTACGT", 40);
    let reverse = reverse_of(&forward);

    let result = assembler.assemble(&pid(), &forward, &reverse).expect("should assemble");
    assert_eq!(result.consensus.len(), result.overlap_len);
}

#[test]
fn primer_longer_than_read_is_rejected_as_missing() {
    let config = Arc::new(
        AssemblerConfig::builder()
            .forward_primer(encode("ACGTACGTACGTACGT", 40).iter().map(|b| b.nt).collect())
            .build()
            .unwrap(),
    );
    let mut assembler = Assembler::new(config);
    let forward = encode("ACGT", 40);
    let reverse = encode("ACGT", 40);
    let err = assembler.assemble(&pid(), &forward, &reverse).unwrap_err();
    assert_eq!(err, Rejection::NoForwardPrimer);
}

#[test]
fn b_cliff_run_is_masked_before_scoring() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(4).build().unwrap());
    let mut assembler = Assembler::new(config);

    let mut forward = encode("ACGTACGT", 40);
    for base in forward.iter_mut().rev().take(2) {
        base.phred = 2;
    }
    let reverse = reverse_of(&encode("ACGTACGT", 40));

    let result = assembler.assemble(&pid(), &forward, &reverse);
    assert!(result.is_ok());
}

#[test]
fn cloning_config_across_assemblers_is_deterministic() {
    let config = Arc::new(AssemblerConfig::builder().min_overlap(4).build().unwrap());
    let mut a = Assembler::new(Arc::clone(&config));
    let mut b = Assembler::new(Arc::clone(&config));

    let forward = encode("ACGTACGT", 40);
    let reverse = encode_reverse("ACGTACGT", 40);

    let ra = a.assemble(&pid(), &forward, &reverse).unwrap();
    let rb = b.assemble(&pid(), &forward, &reverse).unwrap();
    assert_eq!(ra.sequence_string(), rb.sequence_string());
    assert_eq!(ra.quality, rb.quality);
}

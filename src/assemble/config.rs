//! Assembler configuration: an immutable, validated bundle shared via
//! `Arc` across assembler instances, built with the same
//! validate-once-at-`build()` discipline the reference crate applies
//! to its `clap::Args` option groups (`cli/opts.rs`), just expressed as
//! a plain builder independent of `clap` since the core library is not
//! itself a CLI surface.

use anyhow::{bail, Result};

use crate::assemble::algorithm::ScoringAlgorithm;
use crate::assemble::nt::Nt;

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub min_overlap: usize,
    pub max_overlap: usize,
    pub threshold: f64,
    pub log_threshold: f64,
    pub forward_primer: Option<Vec<Nt>>,
    pub reverse_primer: Option<Vec<Nt>>,
    pub forward_trim: usize,
    pub reverse_trim: usize,
    pub primers_after: bool,
    pub primer_penalty: f64,
    pub num_kmers: usize,
    pub kmer_len: usize,
    pub algorithm: ScoringAlgorithm,
}

impl AssemblerConfig {
    pub fn builder() -> AssemblerConfigBuilder {
        AssemblerConfigBuilder::default()
    }
}

#[derive(Debug, Clone)]
pub struct AssemblerConfigBuilder {
    min_overlap: usize,
    max_overlap: usize,
    threshold: f64,
    forward_primer: Option<Vec<Nt>>,
    reverse_primer: Option<Vec<Nt>>,
    forward_trim: usize,
    reverse_trim: usize,
    primers_after: bool,
    primer_penalty: f64,
    num_kmers: usize,
    kmer_len: usize,
    algorithm: ScoringAlgorithm,
}

impl Default for AssemblerConfigBuilder {
    fn default() -> Self {
        AssemblerConfigBuilder {
            min_overlap: 2,
            max_overlap: 0,
            threshold: 0.6,
            forward_primer: None,
            reverse_primer: None,
            forward_trim: 0,
            reverse_trim: 0,
            primers_after: false,
            primer_penalty: 0.0,
            num_kmers: 2,
            kmer_len: 8,
            algorithm: ScoringAlgorithm::default(),
        }
    }
}

impl AssemblerConfigBuilder {
    pub fn min_overlap(mut self, v: usize) -> Self {
        self.min_overlap = v;
        self
    }

    pub fn max_overlap(mut self, v: usize) -> Self {
        self.max_overlap = v;
        self
    }

    pub fn threshold(mut self, v: f64) -> Self {
        self.threshold = v;
        self
    }

    pub fn forward_primer(mut self, v: Vec<Nt>) -> Self {
        self.forward_primer = Some(v);
        self
    }

    pub fn reverse_primer(mut self, v: Vec<Nt>) -> Self {
        self.reverse_primer = Some(v);
        self
    }

    pub fn forward_trim(mut self, v: usize) -> Self {
        self.forward_trim = v;
        self
    }

    pub fn reverse_trim(mut self, v: usize) -> Self {
        self.reverse_trim = v;
        self
    }

    pub fn primers_after(mut self, v: bool) -> Self {
        self.primers_after = v;
        self
    }

    pub fn primer_penalty(mut self, v: f64) -> Self {
        self.primer_penalty = v;
        self
    }

    pub fn num_kmers(mut self, v: usize) -> Self {
        self.num_kmers = v;
        self
    }

    pub fn kmer_len(mut self, v: usize) -> Self {
        self.kmer_len = v;
        self
    }

    pub fn algorithm(mut self, v: ScoringAlgorithm) -> Self {
        self.algorithm = v;
        self
    }

    pub fn build(self) -> Result<AssemblerConfig> {
        if self.min_overlap < 2 {
            bail!("min_overlap must be >= 2, got {}", self.min_overlap);
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            bail!("threshold must be in (0.0, 1.0), got {}", self.threshold);
        }
        if self.forward_primer.is_some() && self.forward_trim != 0 {
            bail!("forward_primer and forward_trim are mutually exclusive");
        }
        if self.reverse_primer.is_some() && self.reverse_trim != 0 {
            bail!("reverse_primer and reverse_trim are mutually exclusive");
        }
        if !(1..=12).contains(&self.kmer_len) {
            bail!("kmer_len must be in 1..=12, got {}", self.kmer_len);
        }
        if self.num_kmers == 0 {
            bail!("num_kmers must be at least 1");
        }

        Ok(AssemblerConfig {
            min_overlap: self.min_overlap,
            max_overlap: self.max_overlap,
            threshold: self.threshold,
            log_threshold: self.threshold.ln(),
            forward_primer: self.forward_primer,
            reverse_primer: self.reverse_primer,
            forward_trim: self.forward_trim,
            reverse_trim: self.reverse_trim,
            primers_after: self.primers_after,
            primer_penalty: self.primer_penalty,
            num_kmers: self.num_kmers,
            kmer_len: self.kmer_len,
            algorithm: self.algorithm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_successfully() {
        let cfg = AssemblerConfig::builder().build().unwrap();
        assert_eq!(cfg.min_overlap, 2);
        assert_eq!(cfg.kmer_len, 8);
    }

    #[test]
    fn rejects_min_overlap_below_two() {
        assert!(AssemblerConfig::builder().min_overlap(1).build().is_err());
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        assert!(AssemblerConfig::builder().threshold(0.0).build().is_err());
        assert!(AssemblerConfig::builder().threshold(1.0).build().is_err());
    }

    #[test]
    fn rejects_primer_and_trim_together() {
        let result = AssemblerConfig::builder()
            .forward_primer(vec![crate::assemble::nt::NT_A])
            .forward_trim(5)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_kmer_len_out_of_range() {
        assert!(AssemblerConfig::builder().kmer_len(0).build().is_err());
        assert!(AssemblerConfig::builder().kmer_len(13).build().is_err());
    }
}

//! Grouped CLI option structs, in the reference binary's
//! `clap::Args`-derived grouping style (flattened option groups rather
//! than one monolithic flag list).

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::assemble::ScoringAlgorithm;

#[derive(Debug, Args)]
pub struct IoArgs {
    /// Forward-read FASTQ file.
    #[arg(short = 'f', long)]
    pub forward: PathBuf,

    /// Reverse-read FASTQ file.
    #[arg(short = 'r', long)]
    pub reverse: PathBuf,

    /// Where to write assembled FASTA records; stdout if omitted.
    #[arg(short = 'w', long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("forward_locate")
        .args(["forward_primer", "forward_trim"])
        .multiple(false)
))]
#[command(group(
    clap::ArgGroup::new("reverse_locate")
        .args(["reverse_primer", "reverse_trim"])
        .multiple(false)
))]
pub struct AssemblyArgs {
    /// Minimum overlap, in bases, between forward and reverse reads.
    #[arg(long, default_value_t = 2)]
    pub min_overlap: usize,

    /// Maximum overlap to consider; 0 means min(|forward|, |reverse|).
    #[arg(long, default_value_t = 0)]
    pub max_overlap: usize,

    /// Minimum consensus quality (probability, not log) to accept.
    #[arg(long, default_value_t = 0.6)]
    pub threshold: f64,

    /// Forward (5') primer sequence, IUPAC letters.
    #[arg(short = 'p', long)]
    pub forward_primer: Option<String>,

    /// Reverse (3') primer sequence, IUPAC letters.
    #[arg(short = 'q', long)]
    pub reverse_primer: Option<String>,

    /// Bases to unconditionally trim from the forward read's 5' end.
    #[arg(long, default_value_t = 0)]
    pub forward_trim: usize,

    /// Bases to unconditionally trim from the reverse read's 5' end.
    #[arg(long, default_value_t = 0)]
    pub reverse_trim: usize,

    /// Scoring model used to pick the best overlap.
    #[arg(short = 'A', long, value_enum, default_value_t = AlgorithmChoice::SimpleBayes)]
    pub algorithm: AlgorithmChoice,

    /// K-mer length used for candidate indexing.
    #[arg(long, default_value_t = 8)]
    pub kmer_len: usize,

    /// Number of threads to assemble with.
    #[arg(short = 'T', long, default_value_t = 1)]
    pub threads: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AlgorithmChoice {
    SimpleBayes,
    Pear,
    Flash,
    Uparse,
    RdpMle,
    Stitch,
}

impl AlgorithmChoice {
    pub fn to_algorithm(self) -> ScoringAlgorithm {
        match self {
            AlgorithmChoice::SimpleBayes => ScoringAlgorithm::simple_bayes(0.36),
            AlgorithmChoice::Pear => ScoringAlgorithm::pear(0.25),
            AlgorithmChoice::Flash => ScoringAlgorithm::Flash,
            AlgorithmChoice::Uparse => ScoringAlgorithm::uparse(0.36),
            AlgorithmChoice::RdpMle => ScoringAlgorithm::RdpMle,
            AlgorithmChoice::Stitch => ScoringAlgorithm::Stitch,
        }
    }
}

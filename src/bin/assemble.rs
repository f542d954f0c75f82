//! Demonstration binary: assembles paired-end FASTQ reads in parallel
//! and writes consensus FASTA plus a counters summary to stderr.
//!
//! Illustrative scaffolding for the library, grounded on the reference
//! binary's `clap::Parser` + flattened `Args` groups + `rayon` +
//! `indicatif::ProgressBar` shape. Gzip/URL input handling is
//! explicitly out of scope here.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::iter::{ParallelBridge, ParallelIterator};

use pandastitch::assemble::{AssemblerConfig, Assembler, AssemblyCounters, PairId, QualBase};
use pandastitch::cli::fastq::{FastqReader, Strand};
use pandastitch::cli::opts::{AssemblyArgs, IoArgs};
use pandastitch::cli::PrintLogger;

#[derive(Debug, Parser)]
#[command(name = "pandastitch", about = "Assemble overlapping paired-end reads into a consensus sequence")]
struct Cli {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    assembly: AssemblyArgs,
}

struct PairSource {
    forward: FastqReader,
    reverse: FastqReader,
}

impl PairSource {
    fn next_pair(&mut self) -> Result<Option<(PairId, Vec<QualBase>, Vec<QualBase>)>> {
        let forward = self.forward.next_read().context("reading forward FASTQ")?;
        let reverse = self.reverse.next_read().context("reading reverse FASTQ")?;
        match (forward, reverse) {
            (Some((id, f)), Some((_, r))) => Ok(Some((id, f, r))),
            (None, None) => Ok(None),
            _ => anyhow::bail!("forward and reverse FASTQ files have different record counts"),
        }
    }
}

/// Per-chunk fold accumulator: one `Assembler` (owning its own k-mer
/// scratch) reused across every pair `rayon` routes to this chunk, plus
/// the consensus lines it produced.
struct FoldState {
    assembler: Assembler,
    lines: Vec<String>,
}

impl FoldState {
    fn new(config: Arc<AssemblerConfig>) -> Self {
        FoldState {
            assembler: Assembler::with_logger(config, Arc::new(PrintLogger)),
            lines: Vec::new(),
        }
    }

    fn merge(mut self, other: FoldState) -> Self {
        self.assembler.counters += other.assembler.counters;
        self.lines.extend(other.lines);
        self
    }
}

fn parse_primer(raw: &str) -> Vec<pandastitch::assemble::nt::Nt> {
    raw.bytes().map(pandastitch::assemble::nt::nt_from_ascii).collect()
}

/// The reverse primer is typed in its own natural 5'->3' orientation
/// but must be compared against the reverse read's per-base-
/// complemented internal representation, so each letter is complemented
/// (not reversed) on the way in.
fn parse_reverse_primer(raw: &str) -> Vec<pandastitch::assemble::nt::Nt> {
    raw.bytes().map(pandastitch::assemble::nt::nt_from_ascii_complement).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = AssemblerConfig::builder()
        .min_overlap(cli.assembly.min_overlap)
        .max_overlap(cli.assembly.max_overlap)
        .threshold(cli.assembly.threshold)
        .kmer_len(cli.assembly.kmer_len)
        .algorithm(cli.assembly.algorithm.to_algorithm());

    builder = match &cli.assembly.forward_primer {
        Some(p) => builder.forward_primer(parse_primer(p)),
        None => builder.forward_trim(cli.assembly.forward_trim),
    };
    builder = match &cli.assembly.reverse_primer {
        Some(p) => builder.reverse_primer(parse_reverse_primer(p)),
        None => builder.reverse_trim(cli.assembly.reverse_trim),
    };

    let config = Arc::new(builder.build().context("invalid assembler configuration")?);

    let source = PairSource {
        forward: FastqReader::open(&cli.io.forward, Strand::Forward)?,
        reverse: FastqReader::open(&cli.io.reverse, Strand::Reverse)?,
    };
    let source = Mutex::new(source);

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner} {pos} pairs processed ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.assembly.threads.max(1))
        .build()
        .context("building thread pool")?;

    let final_state: FoldState = pool.install(|| {
        std::iter::from_fn(|| source.lock().unwrap().next_pair().transpose())
            .par_bridge()
            .fold(
                || FoldState::new(Arc::clone(&config)),
                |mut state, item| {
                    let Ok((id, forward, reverse)) = item else {
                        return state;
                    };
                    if let Ok(assembled) = state.assembler.assemble(&id, &forward, &reverse) {
                        state.lines.push(format!(">{}\n{}", assembled.id, assembled.sequence_string()));
                    }
                    progress.inc(1);
                    state
                },
            )
            .reduce(|| FoldState::new(Arc::clone(&config)), FoldState::merge)
    });

    progress.finish_and_clear();

    let mut out: Box<dyn Write> = match &cli.io.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).context("creating output file")?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    for line in &final_state.lines {
        writeln!(out, "{line}").context("writing consensus record")?;
    }
    out.flush().context("flushing output")?;

    let counters: &AssemblyCounters = &final_state.assembler.counters;
    eprintln!(
        "assembled {} of {} pairs (nofp={} norp={} noalgn={} lowq={} longest_overlap={})",
        counters.ok_count,
        counters.total(),
        counters.nofp_count,
        counters.norp_count,
        counters.noalgn_count,
        counters.lowq_count,
        counters.longest_overlap,
    );

    Ok(())
}

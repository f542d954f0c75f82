//! Minimal FASTQ ingestion for the demonstration binary. Not a core
//! concern: the library only ever sees owned `Vec<QualBase>` reads, so
//! this module's job is purely to get bytes off disk and into that
//! shape using `bio::io::fastq`, the way a `bio`-based consensus
//! pipeline reads its own paired input.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fastq;

use crate::assemble::nt::{nt_from_ascii, nt_from_ascii_complement};
use crate::assemble::types::{PairId, QualBase};

/// Which strand a `FastqReader` is decoding. The reverse-read file is
/// decoded base-by-base into its *complement* (not reversed) on
/// ingest, exactly as the original tool's `iupac_forward`/
/// `iupac_reverse` lookup-table split does in its FASTQ loader — the
/// positional reversal needed for reverse-complement comparison then
/// falls out of the `reverse_length - i - 1` indexing used throughout
/// assembly, rather than needing a second pass over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

pub struct FastqReader {
    records: fastq::Records<BufReader<File>>,
    strand: Strand,
}

impl FastqReader {
    pub fn open(path: impl AsRef<Path>, strand: Strand) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let reader = fastq::Reader::new(file);
        Ok(FastqReader {
            records: reader.records(),
            strand,
        })
    }

    /// Pull the next record, decoding its sequence/quality into owned
    /// `QualBase`s and its header into a best-effort `PairId`.
    pub fn next_read(&mut self) -> Result<Option<(PairId, Vec<QualBase>)>> {
        let decode: fn(u8) -> crate::assemble::nt::Nt = match self.strand {
            Strand::Forward => nt_from_ascii,
            Strand::Reverse => nt_from_ascii_complement,
        };
        match self.records.next() {
            None => Ok(None),
            Some(record) => {
                let record = record.context("parsing FASTQ record")?;
                let id = parse_pair_id(record.id());
                let bases: Vec<QualBase> = record
                    .seq()
                    .iter()
                    .zip(record.qual().iter())
                    .map(|(&base, &qual)| QualBase::new(decode(base), qual.saturating_sub(b'!')))
                    .collect();
                Ok(Some((id, bases)))
            }
        }
    }
}

/// Parse an Illumina-style read header (`INSTRUMENT:RUN:FLOWCELL:LANE:
/// TILE:X:Y`, optionally followed by `#TAG` or ` TAG`) into a
/// `PairId`. Falls back to a zeroed `PairId` tagged with the raw header
/// when the format doesn't match, rather than failing the whole read.
pub fn parse_pair_id(header: &str) -> PairId {
    let (core, tag) = match header.split_once('#') {
        Some((core, tag)) => (core, Some(tag.to_string())),
        None => match header.split_once(' ') {
            Some((core, rest)) => (core, Some(rest.to_string())),
            None => (header, None),
        },
    };

    let fields: Vec<&str> = core.split(':').collect();
    if fields.len() < 7 {
        return PairId {
            instrument: header.to_string(),
            tag,
            ..PairId::default()
        };
    }

    PairId {
        instrument: fields[0].to_string(),
        run: fields[1].parse().unwrap_or(0),
        flowcell: fields[2].to_string(),
        lane: fields[3].parse().unwrap_or(0),
        tile: fields[4].parse().unwrap_or(0),
        x: fields[5].parse().unwrap_or(0),
        y: fields[6].parse().unwrap_or(0),
        tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_illumina_header() {
        let id = parse_pair_id("M00967:22:000000000-A3JHG:1:1101:18787:1784 1:N:0:1");
        assert_eq!(id.instrument, "M00967");
        assert_eq!(id.run, 22);
        assert_eq!(id.flowcell, "000000000-A3JHG");
        assert_eq!(id.lane, 1);
        assert_eq!(id.tile, 1101);
        assert_eq!(id.x, 18787);
        assert_eq!(id.y, 1784);
        assert_eq!(id.tag.as_deref(), Some("1:N:0:1"));
    }

    #[test]
    fn parses_legacy_hash_tag_header() {
        let id = parse_pair_id("HWUSI-EAS100R:6:73:941:1973#0/1");
        assert_eq!(id.instrument, "HWUSI-EAS100R");
        assert_eq!(id.tile, 941);
        assert_eq!(id.tag.as_deref(), Some("0/1"));
    }

    #[test]
    fn falls_back_gracefully_on_unrecognized_header() {
        let id = parse_pair_id("not-an-illumina-header");
        assert_eq!(id.instrument, "not-an-illumina-header");
        assert_eq!(id.lane, 0);
    }
}

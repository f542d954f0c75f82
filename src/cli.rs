//! Demonstration-binary support: option parsing, FASTQ ingestion, and a
//! stderr logger. None of this is part of the core assembly library's
//! public contract.

pub mod fastq;
pub mod opts;

use crate::assemble::{LogCode, LogContext, Logger};

/// Writes log events to stderr as plain lines, the way the reference
/// binary reports progress with bare `eprintln!` rather than a
/// structured logging crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintLogger;

impl Logger for PrintLogger {
    fn log(&self, code: LogCode, context: LogContext<'_>) {
        match context.id {
            Some(id) => eprintln!("[{code:?}] {id}: {}", context.message),
            None => eprintln!("[{code:?}] {}", context.message),
        }
    }
}

//! Command stream driver.
//!
//! Input is whitespace separated: an operation count `n`, then `n` commands.
//!
//! ```text
//! insert <key> <value>
//! delete <key> <value>
//! find <key>
//! ```
//!
//! Unknown tokens are skipped and do not count toward `n`. Each `find`
//! prints the values for the key separated by spaces, or `null`.

use crate::error::{CliError, Result};
use pagekv_storage::KvStore;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use tracing::{debug, info};

/// Counts of what a run executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inserts: usize,
    pub deletes: usize,
    /// Deletes that found nothing to remove.
    pub missed_deletes: usize,
    pub finds: usize,
    /// Unknown tokens passed over.
    pub skipped: usize,
}

/// ASCII whitespace tokenizer over a line reader.
///
/// Tokens are raw bytes so keys need not be UTF-8.
struct Tokens<R> {
    reader: R,
    pending: VecDeque<Vec<u8>>,
    line: Vec<u8>,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            line: Vec::new(),
        }
    }

    /// Next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<Vec<u8>>> {
        while self.pending.is_empty() {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(
                self.line
                    .split(u8::is_ascii_whitespace)
                    .filter(|token| !token.is_empty())
                    .map(<[u8]>::to_vec),
            );
        }
        Ok(self.pending.pop_front())
    }

    /// Next token, failing at end of input.
    fn require(&mut self, what: &'static str) -> Result<Vec<u8>> {
        self.next_token()?
            .ok_or(CliError::UnexpectedEof { expected: what })
    }

    fn require_int<T: std::str::FromStr>(&mut self, what: &'static str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let token = self.require(what)?;
        parse_int(&token)
    }
}

fn parse_int<T: std::str::FromStr>(token: &[u8]) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let parse_error = |reason: String| CliError::Parse {
        token: String::from_utf8_lossy(token).into_owned(),
        reason,
    };
    let text = std::str::from_utf8(token).map_err(|e| parse_error(e.to_string()))?;
    text.parse().map_err(|e: T::Err| parse_error(e.to_string()))
}

/// Runs the command stream from `input` against `store`, writing `find`
/// results to `out`.
pub fn run<R: BufRead, W: Write>(store: &mut KvStore, input: R, out: &mut W) -> Result<RunSummary> {
    let mut tokens = Tokens::new(input);
    let mut summary = RunSummary::default();

    let Some(count) = tokens.next_token()? else {
        return Ok(summary);
    };
    let count: usize = parse_int(&count)?;

    let mut done = 0;
    while done < count {
        let Some(command) = tokens.next_token()? else {
            debug!(done, count, "cli.input_ended");
            break;
        };
        match command.as_slice() {
            b"insert" => {
                let key = tokens.require("key")?;
                let value = tokens.require_int::<i32>("value")?;
                store.insert(&key, value)?;
                summary.inserts += 1;
            }
            b"delete" => {
                let key = tokens.require("key")?;
                let value = tokens.require_int::<i32>("value")?;
                if !store.delete(&key, value)? {
                    summary.missed_deletes += 1;
                }
                summary.deletes += 1;
            }
            b"find" => {
                let key = tokens.require("key")?;
                write_values(out, &store.find(&key)?)?;
                summary.finds += 1;
            }
            other => {
                debug!(token = %String::from_utf8_lossy(other), "cli.skip_token");
                summary.skipped += 1;
                continue;
            }
        }
        done += 1;
    }

    info!(
        inserts = summary.inserts,
        deletes = summary.deletes,
        finds = summary.finds,
        skipped = summary.skipped,
        "cli.run"
    );
    Ok(summary)
}

fn write_values<W: Write>(out: &mut W, values: &[i32]) -> Result<()> {
    if values.is_empty() {
        writeln!(out, "null")?;
        return Ok(());
    }
    let mut first = true;
    for value in values {
        if !first {
            out.write_all(b" ")?;
        }
        write!(out, "{value}")?;
        first = false;
    }
    writeln!(out)?;
    Ok(())
}

// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The USB port to ALSA card number table.
//!
//! Each meaningful line of the ports file looks like:
//!
//! ```text
//! "3-2" 4      # USB port 3-2 always becomes card 4
//! "1-1.2" 3
//! ```
//!
//! Anything after the card number is ignored. Malformed lines are logged and
//! skipped; a bad line never invalidates the rest of the file.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, warn};

use crate::error::Error;

/// Only this many bytes of each line are looked at.
const MAX_LINE_BYTES: usize = 500;

#[derive(Parser)]
#[grammar = "src/ports/grammar.pest"]
struct PortsParser;

/// An ALSA card number that the ports file is allowed to assign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardNumber(u8);

impl CardNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 31;

    /// Returns the card number if it lies in [MIN, MAX].
    pub fn new(number: i64) -> Option<CardNumber> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&number) {
            Some(CardNumber(number as u8))
        } else {
            None
        }
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single port to card number assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    card: CardNumber,
    port: String,
}

impl Mapping {
    /// Creates a new mapping.
    pub fn new(port: &str, card: CardNumber) -> Mapping {
        Mapping {
            card,
            port: port.to_string(),
        }
    }

    /// Gets the card number assigned to the port.
    pub fn card(&self) -> CardNumber {
        self.card
    }

    /// Gets the USB port name, e.g. "3-2".
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.port, self.card)
    }
}

/// All mappings from the ports file, in file order. Duplicate ports are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mappings {
    mappings: Vec<Mapping>,
}

impl Mappings {
    /// Loads the ports file at the given path. Only failing to open the file is an error.
    pub fn load(path: &Path) -> Result<Mappings, Error> {
        let file = File::open(path).map_err(|source| Error::ReadPorts {
            path: path.to_path_buf(),
            source,
        })?;

        let mappings = Mappings::from_reader(BufReader::new(file), path);
        debug!(
            path = %path.display(),
            count = mappings.len(),
            "Loaded port mappings"
        );
        Ok(mappings)
    }

    /// Parses mappings line by line from the reader. `source` is only used in diagnostics.
    pub fn from_reader<R: BufRead>(mut reader: R, source: &Path) -> Mappings {
        let mut mappings = Vec::new();
        let mut buffer = Vec::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => line_number += 1,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(
                        path = %source.display(),
                        err = %e,
                        "Stopped reading ports file"
                    );
                    break;
                }
            }

            let mut line = trim_newline(&buffer);
            if line.len() > MAX_LINE_BYTES {
                warn!(
                    path = %source.display(),
                    line = line_number,
                    "Line is longer than {} bytes, ignoring the rest of it",
                    MAX_LINE_BYTES
                );
                line = &line[..MAX_LINE_BYTES];
            }

            match parse_line(line) {
                Ok(Some(mapping)) => mappings.push(mapping),
                Ok(None) => debug!(line = line_number, "Skipping blank or comment line"),
                Err(e) => warn!(
                    path = %source.display(),
                    line = line_number,
                    "{}",
                    e
                ),
            }
        }

        Mappings { mappings }
    }

    /// Finds the card number for the port. The first matching line in the file wins.
    pub fn find_card(&self, port: &str) -> Option<CardNumber> {
        self.mappings
            .iter()
            .find(|mapping| mapping.port() == port)
            .map(Mapping::card)
    }

    /// Returns an iterator over the mappings in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl<'a> IntoIterator for &'a Mappings {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

/// Why a line of the ports file was skipped.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
enum LineError {
    #[error("Invalid line received (1)")]
    MissingOpeningQuote,

    #[error("Invalid line received (2)")]
    MissingClosingQuote,

    #[error("Invalid line received (3)")]
    MissingCardNumber,

    #[error("Invalid cardNum received: {0}")]
    InvalidCardNumber(String),

    #[error("Port name is not valid UTF-8")]
    NotUtf8,

    #[error("Unable to parse line: {0}")]
    Syntax(String),
}

fn trim_newline(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

/// Parses a single raw line. Blank lines and comments yield `Ok(None)`.
fn parse_line(raw: &[u8]) -> Result<Option<Mapping>, LineError> {
    let raw = trim_newline(raw);
    // Comments may be in any encoding; only the port name has to be UTF-8.
    let line = String::from_utf8_lossy(raw);

    let line_pair = PortsParser::parse(Rule::line, &line)
        .map_err(|e| LineError::Syntax(e.variant.message().to_string()))?
        .next()
        .and_then(|pair| pair.into_inner().next())
        .ok_or(LineError::MissingOpeningQuote)?;

    if line_pair.as_rule() != Rule::entry {
        return Ok(None);
    }

    let mut opened = false;
    let mut closed = false;
    let mut port = "";
    let mut card = None;
    for pair in line_pair.into_inner() {
        match pair.as_rule() {
            Rule::opening => opened = true,
            Rule::port => port = pair.as_str(),
            Rule::closing => closed = true,
            Rule::card => card = Some(pair.as_str()),
            _ => {}
        }
    }

    if !opened {
        return Err(LineError::MissingOpeningQuote);
    }
    if !closed {
        return Err(LineError::MissingClosingQuote);
    }
    let card = card.ok_or(LineError::MissingCardNumber)?;
    if matches!(line, Cow::Owned(_)) && !raw_port_is_utf8(raw) {
        return Err(LineError::NotUtf8);
    }

    // Anything that doesn't fit in an i64 is out of range anyway.
    let card_number = card
        .parse::<i64>()
        .ok()
        .and_then(CardNumber::new)
        .ok_or_else(|| LineError::InvalidCardNumber(card.to_string()))?;

    Ok(Some(Mapping::new(port, card_number)))
}

/// Checks the bytes between the first two quotes. Invalid bytes are never '"',
/// so these are exactly the bytes the port name was decoded from.
fn raw_port_is_utf8(raw: &[u8]) -> bool {
    raw.split(|byte| *byte == b'"')
        .nth(1)
        .is_some_and(|port| std::str::from_utf8(port).is_ok())
}

/// Convenience for callers that treat an unreadable ports file as an empty one.
pub fn load_or_empty(path: &Path) -> Mappings {
    match Mappings::load(path) {
        Ok(mappings) => mappings,
        Err(e) => {
            warn!(err = %e, "Continuing without port mappings");
            Mappings::default()
        }
    }
}

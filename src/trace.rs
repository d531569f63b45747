// trace.rs
//
// Line-oriented trace reader: one `op address` pair per line, e.g.
// `r 7fb2c3d4` or `w 0x1000`. Blank lines and `#`-prefixed comments are
// skipped. This is external collaborator territory per the spec's scope
// note, kept minimal and independent of the simulator core.

use crate::errors::SimulatorError;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub op: char,
    pub address: u64,
}

/// Parses every non-blank, non-comment line from `reader` into a
/// `TraceEvent`, failing on the first malformed line with its 1-based
/// line number.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Vec<TraceEvent>, SimulatorError> {
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        events.push(parse_line(idx + 1, trimmed)?);
    }

    Ok(events)
}

fn parse_line(line_no: usize, text: &str) -> Result<TraceEvent, SimulatorError> {
    let mut fields = text.split_whitespace();
    let malformed = || SimulatorError::InvalidTrace { line: line_no, text: text.to_string() };

    let op_field = fields.next().ok_or_else(malformed)?;
    let addr_field = fields.next().ok_or_else(malformed)?;
    if fields.next().is_some() {
        return Err(malformed());
    }

    let op = op_field.chars().next().filter(|_| op_field.len() == 1).ok_or_else(malformed)?;

    let address = match addr_field.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| malformed())?,
        None => addr_field.parse::<u64>().map_err(|_| malformed())?,
    };

    Ok(TraceEvent { op, address })
}

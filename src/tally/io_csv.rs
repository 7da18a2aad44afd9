// Primitives for reading CSV files.

use instant_runoff::RawPreference;
use log::debug;
use snafu::prelude::*;

use crate::tally::io_common::*;
use crate::tally::{CsvLineParseSnafu, CsvOpenSnafu, MissingHeaderSnafu, RcvResult};

/// Reads a CSV file with a header row `voter,<candidate>,...` and one ballot per row.
pub fn read_csv_ballots(path: &str) -> RcvResult<ParsedElection> {
    let default_id = make_default_id(path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path.to_string(),
        })?;
    let mut records = rdr.into_records();

    let header_r = records.next().context(MissingHeaderSnafu {
        path: path.to_string(),
    })?;
    let header: Vec<String> = header_r
        .context(CsvLineParseSnafu {
            path: path.to_string(),
            lineno: 1_usize,
        })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let columns = header_columns(&header, path)?;

    let mut ballots = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: path.to_string(),
            lineno,
        })?;
        debug!("read_csv_ballots: lineno: {:?} row: {:?}", lineno, line);
        let voter = match line.get(0).map(|s| s.trim()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => default_id(lineno),
        };
        let cells: Vec<RawPreference> = line.iter().skip(1).map(parse_cell).collect();
        ballots.push(row_ballot(&voter, &columns, &cells));
    }
    check_unique_voters(&ballots, path)?;
    Ok(ParsedElection {
        candidates: column_candidates(&columns),
        ballots,
    })
}

use std::collections::HashSet;
use std::path::Path;

use instant_runoff::{RawBallot, RawPreference};
use log::{debug, warn};
use snafu::prelude::*;

use crate::tally::{DuplicateVoterSnafu, MissingHeaderSnafu, RcvResult};

/// The content of a ballot file, before any validation of the preferences.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ParsedElection {
    /// The candidates, in the order of the file.
    pub candidates: Vec<String>,
    pub ballots: Vec<RawBallot>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Converts the text of a cell to a preference.
///
/// Integers and decimal numbers are kept as numbers. Anything else is kept as text.
pub fn parse_cell(s: &str) -> RawPreference {
    let s = s.trim();
    if s.is_empty() {
        return RawPreference::Missing;
    }
    if let Ok(i) = s.parse::<i64>() {
        return RawPreference::Integer(i);
    }
    // Words like "inf" or "NaN" parse as floats.
    if s.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = s.parse::<f64>() {
            return RawPreference::Float(f);
        }
    }
    RawPreference::Text(s.to_string())
}

/// The candidate columns of a header row: every column after the voter column.
///
/// A column with a blank header has no candidate (`None`). It keeps its place so that the cells
/// of each row stay aligned with the names.
pub fn header_columns(header: &[String], path: &str) -> RcvResult<Vec<Option<String>>> {
    ensure!(
        !header.is_empty(),
        MissingHeaderSnafu {
            path: path.to_string()
        }
    );
    let columns: Vec<Option<String>> = header[1..]
        .iter()
        .map(|s| s.trim())
        .map(|s| (!s.is_empty()).then(|| s.to_string()))
        .collect();
    debug!("header_columns: {}: {:?}", path, columns);
    let blanks = columns.iter().filter(|c| c.is_none()).count();
    if blanks > 0 {
        warn!("{}: ignoring {} column(s) without a candidate name", path, blanks);
    }
    Ok(columns)
}

/// The candidates named by the columns, in order.
pub fn column_candidates(columns: &[Option<String>]) -> Vec<String> {
    columns.iter().flatten().cloned().collect()
}

/// Builds the ballot of one row. Missing trailing cells are missing preferences.
///
/// Cells under a column without a candidate are ignored.
pub fn row_ballot(voter: &str, columns: &[Option<String>], cells: &[RawPreference]) -> RawBallot {
    let mut ballot = RawBallot::new(voter);
    for (idx, column) in columns.iter().enumerate() {
        if let Some(name) = column {
            let pref = cells.get(idx).cloned().unwrap_or(RawPreference::Missing);
            ballot = ballot.rank(name, pref);
        }
    }
    ballot
}

pub fn check_unique_voters(ballots: &[RawBallot], path: &str) -> RcvResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for b in ballots.iter() {
        ensure!(
            seen.insert(b.voter.as_str()),
            DuplicateVoterSnafu {
                voter: b.voter.clone(),
                path: path.to_string()
            }
        );
    }
    Ok(())
}

/// Puts together the content of several ballot files.
///
/// The candidates are listed in the order in which they first appear. A voter may only appear in
/// one file.
pub fn merge_elections(parsed: Vec<ParsedElection>) -> RcvResult<ParsedElection> {
    let mut res = ParsedElection::default();
    for p in parsed {
        for c in p.candidates {
            if !res.candidates.contains(&c) {
                res.candidates.push(c);
            }
        }
        res.ballots.extend(p.ballots);
    }
    check_unique_voters(&res.ballots, "all the ballot files")?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::RcvError;

    #[test]
    fn cells() {
        assert_eq!(parse_cell(" 2 "), RawPreference::Integer(2));
        assert_eq!(parse_cell("-1"), RawPreference::Integer(-1));
        assert_eq!(parse_cell("1.6"), RawPreference::Float(1.6));
        assert_eq!(parse_cell(""), RawPreference::Missing);
        assert_eq!(parse_cell("inf"), RawPreference::Text("inf".to_string()));
        assert_eq!(parse_cell("first"), RawPreference::Text("first".to_string()));
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("a/b/votes.csv"), "votes.csv");
        assert_eq!(make_default_id("a/votes.csv")(3), "votes.csv-00000003");
    }

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_header_cells_are_not_candidates() {
        let columns = header_columns(&header(&["voter", "A", " ", "B", ""]), "f.csv").unwrap();
        assert_eq!(
            columns,
            vec![Some("A".to_string()), None, Some("B".to_string()), None]
        );
        assert_eq!(column_candidates(&columns), header(&["A", "B"]));

        // The cells under the blank columns are dropped, the others stay aligned.
        let cells = [
            RawPreference::Integer(2),
            RawPreference::Integer(9),
            RawPreference::Integer(1),
            RawPreference::Text("x".to_string()),
        ];
        assert_eq!(
            row_ballot("v", &columns, &cells),
            RawBallot::new("v").rank("A", 2).rank("B", 1)
        );
    }

    #[test]
    fn empty_header() {
        assert!(matches!(
            header_columns(&[], "f.csv"),
            Err(RcvError::MissingHeader { .. })
        ));
    }

    #[test]
    fn short_rows() {
        let columns = vec![Some("A".to_string()), Some("B".to_string())];
        assert_eq!(
            row_ballot("v", &columns, &[RawPreference::Integer(1)]),
            RawBallot::new("v")
                .rank("A", 1)
                .rank("B", RawPreference::Missing)
        );
    }

    #[test]
    fn merge_checks_voters_across_files() {
        let first = ParsedElection {
            candidates: vec!["A".to_string(), "B".to_string()],
            ballots: vec![RawBallot::new("v1")],
        };
        let second = ParsedElection {
            candidates: vec!["B".to_string(), "C".to_string()],
            ballots: vec![RawBallot::new("v2")],
        };
        let merged = merge_elections(vec![first.clone(), second]).unwrap();
        assert_eq!(
            merged.candidates,
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert_eq!(merged.ballots.len(), 2);

        assert!(matches!(
            merge_elections(vec![first.clone(), first]),
            Err(RcvError::DuplicateVoter { .. })
        ));
    }
}

use std::fs;

use instant_runoff::{RawBallot, RawPreference};
use log::debug;
use serde::Deserialize;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::tally::io_common::*;
use crate::tally::{OpeningJsonSnafu, ParsingJsonSnafu, RcvResult};

#[derive(Debug, Clone, Deserialize)]
struct JsonElection {
    candidates: Vec<String>,
    ballots: Vec<JsonBallot>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonBallot {
    voter: String,
    // The order of the entries is kept.
    ranks: JSMap<String, JSValue>,
}

/// Reads a JSON document `{"candidates": [...], "ballots": [{"voter": .., "ranks": {..}}]}`.
pub fn read_json_ballots(path: &str) -> RcvResult<ParsedElection> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let election: JsonElection =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
            path: path.to_string(),
        })?;
    debug!(
        "read_json_ballots: {}: {} candidates, {} ballots",
        path,
        election.candidates.len(),
        election.ballots.len()
    );

    let ballots: Vec<RawBallot> = election
        .ballots
        .iter()
        .map(|jb| {
            jb.ranks
                .iter()
                .fold(RawBallot::new(&jb.voter), |b, (name, value)| {
                    b.rank(name, read_value(value))
                })
        })
        .collect();
    check_unique_voters(&ballots, path)?;
    Ok(ParsedElection {
        candidates: election.candidates,
        ballots,
    })
}

fn read_value(value: &JSValue) -> RawPreference {
    match value {
        JSValue::Number(n) => match n.as_i64() {
            Some(i) => RawPreference::Integer(i),
            None => n
                .as_f64()
                .map(RawPreference::Float)
                .unwrap_or(RawPreference::Missing),
        },
        JSValue::String(s) => parse_cell(s),
        JSValue::Null => RawPreference::Missing,
        other => RawPreference::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::RcvError;
    use serde_json::json;

    fn test_data(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn values() {
        assert_eq!(read_value(&json!(2)), RawPreference::Integer(2));
        assert_eq!(read_value(&json!(1.5)), RawPreference::Float(1.5));
        assert_eq!(read_value(&json!("2")), RawPreference::Integer(2));
        assert_eq!(read_value(&json!(null)), RawPreference::Missing);
        assert_eq!(
            read_value(&json!(true)),
            RawPreference::Text("true".to_string())
        );
    }

    #[test]
    fn read_ballots() {
        let parsed = read_json_ballots(&test_data("mayor_ballots.json")).unwrap();
        assert_eq!(parsed.candidates.len(), 4);
        assert_eq!(parsed.ballots.len(), 9);
        // The ranks stay in the order of the file.
        assert_eq!(
            parsed.ballots[2],
            RawBallot::new("v03")
                .rank("Clara", 2)
                .rank("Anna", 1)
                .rank("Bob", 3)
        );
    }

    #[test]
    fn duplicate_voters() {
        assert!(matches!(
            read_json_ballots(&test_data("duplicate_voters.json")),
            Err(RcvError::DuplicateVoter { voter, .. }) if voter == "v1"
        ));
    }

    #[test]
    fn malformed_file() {
        assert!(matches!(
            read_json_ballots(&test_data("mayor_config.json")),
            Err(RcvError::ParsingJson { .. })
        ));
    }
}

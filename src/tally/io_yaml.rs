// Primitives for reading a folder of YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use instant_runoff::{RawBallot, RawPreference};
use log::{debug, warn};
use serde_yaml::{Mapping, Value as YValue};
use snafu::prelude::*;

use crate::tally::io_common::*;
use crate::tally::{MalformedVoterFileSnafu, OpeningYamlSnafu, ParsingYamlSnafu, RcvResult};

/// The key holding the name of the voter in a voter file.
const VOTER_KEY: &str = "Voter";

/// Reads a folder with a `candidates.yaml` file and one `voter*.yaml` file per voter.
///
/// `candidates.yaml` is a list of names. A voter file is a list whose first entry maps `Voter` to
/// the name of the voter and every other key to the rank of a candidate:
///
/// ```yaml
/// - Voter: Sam
///   Anna: 1
///   Bob: 2
/// ```
///
/// Voter files are read in the order of their names.
pub fn read_yaml_ballots(folder: &str) -> RcvResult<ParsedElection> {
    let candidates_p = Path::new(folder).join("candidates.yaml");
    let candidates: Vec<String> = read_yaml(&candidates_p)?;
    debug!("read_yaml_ballots: candidates: {:?}", candidates);

    let mut voter_files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(folder).context(OpeningYamlSnafu {
        path: folder.to_string(),
    })? {
        let entry = entry.context(OpeningYamlSnafu {
            path: folder.to_string(),
        })?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name.starts_with("voter") && file_name.ends_with(".yaml") {
            voter_files.push(entry.path());
        }
    }
    voter_files.sort();
    debug!("read_yaml_ballots: {} voter files", voter_files.len());

    let ballots = voter_files
        .iter()
        .map(|p| read_voter_file(p))
        .collect::<RcvResult<Vec<RawBallot>>>()?;
    check_unique_voters(&ballots, folder)?;
    Ok(ParsedElection {
        candidates,
        ballots,
    })
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> RcvResult<T> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningYamlSnafu {
        path: path_s.clone(),
    })?;
    serde_yaml::from_str(&contents).context(ParsingYamlSnafu { path: path_s })
}

fn read_voter_file(path: &Path) -> RcvResult<RawBallot> {
    let path_s = path.display().to_string();
    let entries: Vec<Mapping> = read_yaml(path)?;
    let entry = entries.first().context(MalformedVoterFileSnafu {
        path: path_s.clone(),
    })?;
    let voter = match entry.get(VOTER_KEY) {
        Some(YValue::String(s)) => s.trim().to_string(),
        Some(YValue::Number(n)) => n.to_string(),
        _ => return MalformedVoterFileSnafu { path: path_s }.fail(),
    };
    ensure!(
        !voter.is_empty(),
        MalformedVoterFileSnafu {
            path: path_s.clone()
        }
    );

    let mut ballot = RawBallot::new(&voter);
    for (key, value) in entry.iter() {
        match key {
            YValue::String(name) if name == VOTER_KEY => {}
            YValue::String(name) => ballot = ballot.rank(name.trim(), read_value(value)),
            other => warn!("{}: ignoring the entry with key {:?}", path_s, other),
        }
    }
    debug!("read_voter_file: {}: {:?}", path_s, ballot);
    Ok(ballot)
}

fn read_value(value: &YValue) -> RawPreference {
    match value {
        YValue::Number(n) => match n.as_i64() {
            Some(i) => RawPreference::Integer(i),
            None => n
                .as_f64()
                .map(RawPreference::Float)
                .unwrap_or(RawPreference::Missing),
        },
        YValue::String(s) => parse_cell(s),
        YValue::Null => RawPreference::Missing,
        YValue::Bool(b) => RawPreference::Text(b.to_string()),
        other => RawPreference::Text(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::RcvError;

    fn test_data(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn value(s: &str) -> RawPreference {
        read_value(&serde_yaml::from_str::<YValue>(s).unwrap())
    }

    #[test]
    fn values() {
        assert_eq!(value("2"), RawPreference::Integer(2));
        assert_eq!(value("1.5"), RawPreference::Float(1.5));
        assert_eq!(value("'3'"), RawPreference::Integer(3));
        assert_eq!(value("~"), RawPreference::Missing);
        assert_eq!(value("true"), RawPreference::Text("true".to_string()));
    }

    #[test]
    fn read_folder() {
        let parsed = read_yaml_ballots(&test_data("yaml_election")).unwrap();
        assert_eq!(
            parsed.candidates,
            vec!["Anna".to_string(), "Bob".to_string(), "Clara".to_string()]
        );
        // notes.yaml is not a voter file.
        assert_eq!(
            parsed.ballots,
            vec![
                RawBallot::new("Sam").rank("Anna", 1).rank("Bob", 2),
                RawBallot::new("Kim").rank("Bob", 1).rank("Clara", 2),
                RawBallot::new("Lou").rank("Clara", 1).rank("Anna", 2),
                RawBallot::new("Max").rank("Anna", 1).rank("Bob", "-"),
            ]
        );
    }

    #[test]
    fn duplicate_voters() {
        assert!(matches!(
            read_yaml_ballots(&test_data("yaml_duplicate_voters")),
            Err(RcvError::DuplicateVoter { voter, .. }) if voter == "Sam"
        ));
    }

    #[test]
    fn missing_voter_name() {
        assert!(matches!(
            read_voter_file(Path::new(&test_data("yaml_no_voter/voter1.yaml"))),
            Err(RcvError::MalformedVoterFile { .. })
        ));
    }

    #[test]
    fn missing_folder() {
        assert!(matches!(
            read_yaml_ballots(&test_data("no_such_folder")),
            Err(RcvError::OpeningYaml { .. })
        ));
    }
}

use std::fs;
use std::path::Path;

use instant_runoff::*;
use log::{info, warn};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use text_diff::print_diff;

use crate::tally::config_reader::{OutputConfig, OutputSettings};
use crate::tally::{
    OpeningJsonSnafu, ParsingJsonSnafu, RcvResult, ReferenceMismatchSnafu, SerializingJsonSnafu,
    WritingOutputSnafu,
};

/// The status of a candidate at the end of the given round.
fn status(result: &TabulationResult, idx: usize, name: &str) -> &'static str {
    if idx + 1 == result.rounds.len() {
        return match &result.outcome {
            Outcome::Winner { name: winner, .. } if winner == name => "elected",
            Outcome::Tie { tied_winners } if tied_winners.iter().any(|n| n == name) => "tied",
            _ => "",
        };
    }
    match result.rounds.get(idx + 1) {
        Some(next) if next.eliminated.iter().any(|n| n == name) => "eliminated",
        _ => "",
    }
}

/// The table of one round: the votes and the share of every continuing candidate.
pub fn round_table(result: &TabulationResult, idx: usize) -> String {
    let round = &result.rounds[idx];
    let width = round
        .tally
        .iter()
        .map(|(name, _)| name.chars().count())
        .chain(std::iter::once("Candidate".len()))
        .max()
        .unwrap_or(0);
    let mut lines: Vec<String> = vec![
        format!(
            "Round {} ({} continuing ballots, {} exhausted)",
            round.round, round.continuing_ballots, round.exhausted_ballots
        ),
        format!(
            "{:<width$} {:>10} {:>8}  Status",
            "Candidate",
            "Votes",
            "%",
            width = width
        ),
    ];
    for (name, count) in round.tally.iter() {
        let pct = round.percentage_of(name).unwrap_or(0.0);
        let line = format!(
            "{:<width$} {:>10} {:>8.2}  {}",
            name,
            count.to_string(),
            pct,
            status(result, idx, name),
            width = width
        );
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

pub fn outcome_line(result: &TabulationResult) -> String {
    match &result.outcome {
        Outcome::Winner {
            name,
            by_majority: true,
            ..
        } => format!("Winner: {}", name),
        Outcome::Winner { name, .. } => format!("Winner: {} (last candidate standing)", name),
        Outcome::Tie { tied_winners } => format!("Tie between: {}", tied_winners.join(", ")),
    }
}

fn result_stats_to_json(result: &TabulationResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    let num_rounds = result.rounds.len();
    for (idx, round_stat) in result.rounds.iter().enumerate() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        // The eliminations decided at the end of a round are recorded with the next round.
        if let Some(next) = result.rounds.get(idx + 1) {
            for elim_stats in next.transfers.iter() {
                let mut transfers: JSMap<String, JSValue> = JSMap::new();
                for (name, count) in elim_stats.transfers.iter() {
                    transfers.insert(name.clone(), json!(count.to_string()));
                }
                if elim_stats.exhausted > VoteCount::EMPTY {
                    transfers.insert(
                        "exhausted".to_string(),
                        json!(elim_stats.exhausted.to_string()),
                    );
                }
                tally_results.push(json!({
                    "eliminated": elim_stats.name,
                    "transfers": transfers
                }));
            }
        }
        if idx + 1 == num_rounds {
            match &result.outcome {
                Outcome::Winner { name, .. } => tally_results.push(json!({
                    "elected": name,
                    "transfers": {}
                })),
                Outcome::Tie { tied_winners } => tally_results.push(json!({
                    "tied": tied_winners
                })),
            }
        }

        let js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        l.push(js);
    }
    l
}

pub fn build_summary_js(settings: &OutputSettings, result: &TabulationResult) -> JSValue {
    json!({
        "config": OutputConfig::from_settings(settings),
        "results": result_stats_to_json(result) })
}

pub fn pretty_summary(js: &JSValue) -> RcvResult<String> {
    serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})
}

/// Writes the summary to a file, or to the standard output if the destination is `stdout`.
pub fn write_summary(pretty_js: &str, out: &str) -> RcvResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    if let Some(parent) = Path::new(out).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingOutputSnafu {
                path: parent.display().to_string(),
            })?;
        }
    }
    info!("Writing summary to {:?}", out);
    fs::write(out, pretty_js).context(WritingOutputSnafu {
        path: out.to_string(),
    })
}

pub fn read_summary(path: &str) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
        path: path.to_string(),
    })
}

/// Compares the summary with a reference summary and prints the differences.
pub fn check_reference(pretty_js_stats: &str, reference_path: &str) -> RcvResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref = pretty_summary(&summary_ref)?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path.to_string(),
        }
        .fail();
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

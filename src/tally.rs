pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_json;
pub mod io_yaml;
pub mod report;

use log::{debug, info, warn};

use instant_runoff::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::io_common::{merge_elections, simplify_file_name, ParsedElection};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Excel file {path} does not contain a worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },

    #[snafu(display("Error opening {path}"))]
    OpeningYaml {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the YAML content of {path}"))]
    ParsingYaml {
        source: serde_yaml::Error,
        path: String,
    },
    #[snafu(display("YAML file {path} does not start with an entry naming the Voter"))]
    MalformedVoterFile { path: String },

    #[snafu(display("File {path} does not start with a header row"))]
    MissingHeader { path: String },
    #[snafu(display("Voter {voter:?} appears more than once in {path}"))]
    DuplicateVoter { voter: String, path: String },

    #[snafu(display("Unknown provider {provider:?} (expected csv, xlsx, json or yaml)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown value {value:?} for the rule {key}"))]
    InvalidRule { key: String, value: String },
    #[snafu(display("No ballot file: pass --input or list the files in cvrFileSources"))]
    MissingInput {},
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(display("The tabulation failed"))]
    Tabulation { source: VotingErrors },

    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },
}

pub type RcvResult<T> = Result<T, RcvError>;

fn read_config(config_path: &str) -> RcvResult<RcvConfig> {
    let config_str = fs::read_to_string(config_path).context(OpeningJsonSnafu {
        path: config_path.to_string(),
    })?;
    serde_json::from_str(&config_str).context(ParsingJsonSnafu {
        path: config_path.to_string(),
    })
}

/// The configuration to use, after applying the command line options on top of the configuration file.
///
/// Returns the configuration and the directory against which the relative paths are resolved.
fn assemble_config(args: &Args) -> RcvResult<(RcvConfig, PathBuf)> {
    let (mut config, mut root_p) = match args.config.as_deref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.to_string(),
                })?
                .to_path_buf();
            (config, root_p)
        }
        None => {
            let input = args.input.as_deref().context(MissingInputSnafu {})?;
            (RcvConfig::for_input(&simplify_file_name(input)), PathBuf::new())
        }
    };

    if let Some(input) = args.input.as_deref() {
        let provider = match args.input_type.as_deref() {
            Some(x) => x.to_string(),
            None => provider_from_extension(input),
        };
        config.cvr_file_sources = vec![FileSource {
            provider,
            file_path: input.to_string(),
            excel_worksheet_name: None,
        }];
        // Paths given on the command line are relative to the working directory.
        root_p = PathBuf::new();
    } else if let Some(input_type) = args.input_type.as_deref() {
        for cfs in config.cvr_file_sources.iter_mut() {
            cfs.provider = input_type.to_string();
        }
    }

    if let Some(worksheet) = args.excel_worksheet_name.as_deref() {
        for cfs in config.cvr_file_sources.iter_mut() {
            cfs.excel_worksheet_name = Some(worksheet.to_string());
        }
    }
    Ok((config, root_p))
}

/// A folder holds YAML files, otherwise the extension decides.
fn provider_from_extension(path: &str) -> String {
    if Path::new(path).is_dir() {
        return "yaml".to_string();
    }
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("xlsx") => "xlsx".to_string(),
        Some("json") => "json".to_string(),
        _ => "csv".to_string(),
    }
}

fn read_ranking_data(root_p: &Path, cfs: &FileSource) -> RcvResult<ParsedElection> {
    let p: PathBuf = root_p.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ballots(&p2),
        "xlsx" => io_excel::read_excel_ballots(&p2, cfs.excel_worksheet_name.as_deref()),
        "json" => io_json::read_json_ballots(&p2),
        "yaml" => io_yaml::read_yaml_ballots(&p2),
        x => UnknownProviderSnafu {
            provider: x.to_string(),
        }
        .fail(),
    }
}

/// The names of the candidates taking part in the election.
///
/// When the configuration lists the candidates, this list is used and the excluded candidates are
/// removed. Otherwise the candidates are the ones found in the ballot files.
fn candidate_names(config: &RcvConfig, parsed: &ParsedElection) -> Vec<String> {
    match &config.candidates {
        Some(cands) => {
            for c in cands.iter().filter(|c| c.excluded.unwrap_or(false)) {
                info!("Candidate {:?} is excluded from the election", c.name);
            }
            cands
                .iter()
                .filter(|c| !c.excluded.unwrap_or(false))
                .map(|c| c.name.clone())
                .collect()
        }
        None => parsed.candidates.clone(),
    }
}

/// Turns the rules of the configuration file into engine rules. Absent rules take their default value.
pub fn validate_rules(rcv_rules: &RcvRules) -> RcvResult<VoteRules> {
    fn invalid<T>(key: &str, value: &str) -> RcvResult<T> {
        InvalidRuleSnafu {
            key: key.to_string(),
            value: value.to_string(),
        }
        .fail()
    }

    let defaults = VoteRules::DEFAULT_RULES;
    let res = VoteRules {
        majority_rule: match rcv_rules.majority_rule.as_deref() {
            None => defaults.majority_rule,
            Some("strictMajority") => MajorityRule::StrictMajority,
            Some("atLeastHalf") => MajorityRule::AtLeastHalf,
            Some(x) => return invalid("majorityRule", x),
        },
        elimination_algorithm: match rcv_rules.elimination_algorithm.as_deref() {
            None => defaults.elimination_algorithm,
            Some("batch") => EliminationAlgorithm::Batch,
            Some("single") => EliminationAlgorithm::Single,
            Some(x) => return invalid("eliminationAlgorithm", x),
        },
        tiebreak_mode: match rcv_rules.tiebreak_mode.as_deref() {
            None => defaults.tiebreak_mode,
            Some("useCandidateOrder") => TieBreakMode::UseCandidateOrder,
            Some("lexical") => TieBreakMode::Lexical,
            Some("random") => {
                let seed_s = rcv_rules.random_seed.clone().unwrap_or_default();
                match seed_s.trim().parse::<u32>() {
                    Ok(seed) => TieBreakMode::Random(seed),
                    Err(_) => return invalid("randomSeed", &seed_s),
                }
            }
            Some(x) => return invalid("tiebreakMode", x),
        },
        duplicate_rank_rule: match rcv_rules.duplicate_rank_rule.as_deref() {
            None => defaults.duplicate_rank_rule,
            Some("keepFirst") => DuplicateRankRule::KeepFirst,
            Some("reject") => DuplicateRankRule::Reject,
            Some("split") => DuplicateRankRule::Split,
            Some(x) => return invalid("duplicateRankRule", x),
        },
        invalid_candidate_rule: match rcv_rules.invalid_candidate_rule.as_deref() {
            None => defaults.invalid_candidate_rule,
            Some("drop") => InvalidCandidateRule::Drop,
            Some("reject") => InvalidCandidateRule::Reject,
            Some(x) => return invalid("invalidCandidateRule", x),
        },
    };
    Ok(res)
}

/// Where the summary goes: the command line wins over the output directory of the configuration.
fn summary_destination(args: &Args, config: &RcvConfig, root_p: &Path) -> Option<String> {
    if let Some(out) = args.out.clone() {
        return Some(out);
    }
    config
        .output_settings
        .output_directory
        .as_ref()
        .map(|dir| {
            root_p
                .join(dir)
                .join(format!("{}_summary.json", config.output_settings.contest_name))
                .display()
                .to_string()
        })
}

pub fn run_election(args: &Args) -> RcvResult<()> {
    let (config, root_p) = assemble_config(args)?;
    info!("config: {:?}", config);

    // Validate the rules:
    let rules = validate_rules(&config.rules)?;

    ensure!(!config.cvr_file_sources.is_empty(), MissingInputSnafu {});
    let mut all_parsed: Vec<ParsedElection> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        all_parsed.push(read_ranking_data(&root_p, cfs)?);
    }
    let parsed = merge_elections(all_parsed)?;
    debug!("data: {:?}", parsed);

    let candidates = candidate_names(&config, &parsed);
    let result = instant_runoff::run_election(&candidates, &parsed.ballots, &rules)
        .context(TabulationSnafu {})?;
    for w in result.warnings.iter() {
        warn!("{:?}", w);
    }

    if args.show_intermediate {
        for idx in 0..result.rounds.len().saturating_sub(1) {
            println!("{}", report::round_table(&result, idx));
        }
    }
    if !result.rounds.is_empty() {
        println!("{}", report::round_table(&result, result.rounds.len() - 1));
    }
    println!("{}", report::outcome_line(&result));

    // Assemble the final json
    let summary_js = report::build_summary_js(&config.output_settings, &result);
    let pretty_js_stats = report::pretty_summary(&summary_js)?;
    if let Some(out) = summary_destination(args, &config, &root_p) {
        report::write_summary(&pretty_js_stats, &out)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.as_deref() {
        report::check_reference(&pretty_js_stats, summary_p)?;
    }

    Ok(())
}

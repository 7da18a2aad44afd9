use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The configuration section of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
}

impl OutputConfig {
    pub fn from_settings(settings: &OutputSettings) -> OutputConfig {
        OutputConfig {
            contest: settings.contest_name.clone(),
            date: settings.contest_date.clone(),
            jurisdiction: settings.contest_jurisdiction.clone(),
            office: settings.contest_office.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// csv, xlsx, json or yaml
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvCandidate {
    pub name: String,
    pub excluded: Option<bool>,
}

/// The rules as written in the configuration file. Every rule is optional.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RcvRules {
    #[serde(rename = "majorityRule")]
    pub majority_rule: Option<String>,
    #[serde(rename = "eliminationAlgorithm")]
    pub elimination_algorithm: Option<String>,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
    #[serde(rename = "duplicateRankRule")]
    pub duplicate_rank_rule: Option<String>,
    #[serde(rename = "invalidCandidateRule")]
    pub invalid_candidate_rule: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources", default)]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Option<Vec<RcvCandidate>>,
    #[serde(default)]
    pub rules: RcvRules,
}

impl RcvConfig {
    /// The configuration used when only a ballot file is given on the command line.
    pub fn for_input(contest_name: &str) -> RcvConfig {
        RcvConfig {
            output_settings: OutputSettings {
                contest_name: contest_name.to_string(),
                ..OutputSettings::default()
            },
            cvr_file_sources: Vec::new(),
            candidates: None,
            rules: RcvRules::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let config: RcvConfig =
            serde_json::from_str(r#"{"outputSettings": {"contestName": "Mayor"}}"#).unwrap();
        assert_eq!(config, RcvConfig::for_input("Mayor"));
    }

    #[test]
    fn full_config() {
        let js = r#"{
            "outputSettings": {
                "contestName": "Mayor",
                "outputDirectory": "output",
                "contestDate": "2022-11-08",
                "contestJurisdiction": "Springfield",
                "contestOffice": "City hall"
            },
            "cvrFileSources": [
                {"provider": "xlsx", "filePath": "votes.xlsx", "excelWorksheetName": "Sheet1"}
            ],
            "candidates": [{"name": "A"}, {"name": "B", "excluded": true}],
            "rules": {"tiebreakMode": "random", "randomSeed": "3"}
        }"#;
        let config: RcvConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            config.output_settings.contest_jurisdiction,
            Some("Springfield".to_string())
        );
        assert_eq!(
            config.cvr_file_sources,
            vec![FileSource {
                provider: "xlsx".to_string(),
                file_path: "votes.xlsx".to_string(),
                excel_worksheet_name: Some("Sheet1".to_string()),
            }]
        );
        assert_eq!(
            config.candidates,
            Some(vec![
                RcvCandidate {
                    name: "A".to_string(),
                    excluded: None
                },
                RcvCandidate {
                    name: "B".to_string(),
                    excluded: Some(true)
                },
            ])
        );
        assert_eq!(config.rules.random_seed, Some("3".to_string()));
        assert_eq!(config.rules.majority_rule, None);
        assert_eq!(
            OutputConfig::from_settings(&config.output_settings).office,
            Some("City hall".to_string())
        );
    }
}

use crate::topn::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

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

/// The description of the election, as written in the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
}

impl FileSource {
    /// A source that reads every cell of every row as a choice.
    pub fn from_input(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            ..FileSource::default()
        }
    }

    /// Zero-based index of the first column that contains a choice. Defaults to the first column.
    pub fn first_vote_column_index(&self) -> RcvResult<usize> {
        if self._first_vote_column_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self._first_vote_column_index)?;
        ensure!(x >= 1, ParsingJsonNumberSnafu {});
        Ok(x - 1)
    }

    /// Zero-based index of the first row that contains a ballot. Defaults to the first row.
    pub fn first_vote_row_index(&self) -> RcvResult<usize> {
        if self._first_vote_row_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self._first_vote_row_index)?;
        ensure!(x >= 1, ParsingJsonNumberSnafu {});
        Ok(x - 1)
    }

    pub fn id_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.id_column_index.is_some() {
            let x = read_js_int(&self.id_column_index)?;
            ensure!(x >= 1, ParsingJsonNumberSnafu {});
            Ok(Some(x - 1))
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCandidate {
    pub name: String,
    pub excluded: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigRules {
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: Option<JSValue>,
    #[serde(rename = "tiebreakPrecision")]
    pub tiebreak_precision: Option<JSValue>,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub candidates: Vec<ConfigCandidate>,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<FileSource>,
    /// Ballots written directly in the configuration.
    pub ballots: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub rules: ConfigRules,
}

pub fn read_config(path: &str) -> RcvResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> RcvResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        // Spreadsheet-style columns: A is 1, B is 2, and so on.
        Some(JSValue::String(s)) if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            let c1 = s.to_ascii_lowercase().chars().next().context(ParsingJsonNumberSnafu {})?;
            Ok((c1 as usize) - ('a' as usize) + 1)
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

/// The rules for the library, checked from the configuration.
pub fn validate_rules(rules: &ConfigRules) -> RcvResult<VoteRules> {
    let number_of_winners = match &rules.number_of_winners {
        None => VoteRules::DEFAULT_RULES.number_of_winners,
        x => match read_js_int(x) {
            Ok(n) if n >= 1 => n as u32,
            _ => whatever!(
                "Failed to understand numberOfWinners option: {:?}: expected a positive number",
                x
            ),
        },
    };
    let tiebreak_precision = match &rules.tiebreak_precision {
        None => VoteRules::DEFAULT_RULES.tiebreak_precision,
        x => match read_js_int(x) {
            Ok(n) if n <= VoteRules::MAX_TIEBREAK_PRECISION as usize => n as u32,
            _ => whatever!(
                "Failed to understand tiebreakPrecision option: {:?}: expected a number between 0 and {}",
                x,
                VoteRules::MAX_TIEBREAK_PRECISION
            ),
        },
    };
    Ok(VoteRules {
        number_of_winners,
        tiebreak_precision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_config() {
        let js = json!({
            "outputSettings": { "contestName": "Book club" },
            "candidates": [ { "name": "Dune" }, { "name": "Emma", "excluded": true } ],
            "ballotSources": [ { "provider": "csv", "filePath": "b.csv", "firstVoteColumnIndex": "B", "firstVoteRowIndex": 2, "idColumnIndex": 1 } ],
            "rules": { "numberOfWinners": "2" }
        });
        let config: ElectionConfig = serde_json::from_value(js).unwrap();
        assert_eq!(config.output_settings.contest_name, "Book club");
        assert_eq!(config.candidates[1].excluded, Some(true));
        assert_eq!(config.ballots, None);

        let cfs = &config.ballot_sources[0];
        assert_eq!(cfs.first_vote_column_index().unwrap(), 1);
        assert_eq!(cfs.first_vote_row_index().unwrap(), 1);
        assert_eq!(cfs.id_column_index_int().unwrap(), Some(0));

        let rules = validate_rules(&config.rules).unwrap();
        assert_eq!(rules.number_of_winners, 2);
        assert_eq!(rules.tiebreak_precision, 5);
    }

    #[test]
    fn source_defaults() {
        let cfs = FileSource::from_input("csv", "ballots.csv");
        assert_eq!(cfs.first_vote_column_index().unwrap(), 0);
        assert_eq!(cfs.first_vote_row_index().unwrap(), 0);
        assert_eq!(cfs.id_column_index_int().unwrap(), None);
    }

    #[test]
    fn default_rules() {
        let rules = validate_rules(&ConfigRules::default()).unwrap();
        assert_eq!(rules, VoteRules::DEFAULT_RULES);
    }

    #[test]
    fn rejects_bad_rules() {
        let zero = ConfigRules {
            number_of_winners: Some(json!(0)),
            ..ConfigRules::default()
        };
        assert!(validate_rules(&zero).is_err());
        let precise = ConfigRules {
            tiebreak_precision: Some(json!(40)),
            ..ConfigRules::default()
        };
        assert!(validate_rules(&precise).is_err());
        let garbage = ConfigRules {
            number_of_winners: Some(json!("many")),
            ..ConfigRules::default()
        };
        assert!(validate_rules(&garbage).is_err());
    }
}

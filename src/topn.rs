use log::{debug, info, warn};

use snafu::prelude::*;
use top_n_voting::builder::Builder;
use top_n_voting::*;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::topn::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TopRcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error parsing a number in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Cannot find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Unknown ballot provider {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No ballots provided: use --config or --input"))]
    MissingInput {},
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, TopRcvError>;

/// A ballot, as parsed by the readers.
/// The choices are not checked against the candidates yet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub choices: Vec<String>,
}

fn result_stats_to_json(rs: &TopNResult, precision: u32) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut js = json!({
            "round": round_stat.round,
            "remainingCandidates": round_stat.remaining_candidates,
            "elected": round_stat.winner.name(),
        });
        match &round_stat.decision {
            Decision::Direct => {
                js["decision"] = json!("direct");
            }
            Decision::TieBreak { scores } => {
                let mut tiebreak: JSMap<String, JSValue> = JSMap::new();
                for (c, score) in scores.iter() {
                    tiebreak.insert(
                        c.name().to_string(),
                        json!(format!("{:.*}", precision as usize, score)),
                    );
                }
                js["decision"] = json!("tiebreak");
                js["tiebreakScores"] = JSValue::Object(tiebreak);
            }
        }
        l.push(js);
    }
    l
}

fn build_summary_js(settings: &OutputSettings, rules: &VoteRules, res: &TopNResult) -> JSValue {
    let c = OutputConfig {
        contest: settings.contest_name.clone(),
        date: settings.contest_date.clone(),
        jurisdiction: settings.contest_jurisdiction.clone(),
        office: settings.contest_office.clone(),
        number_of_winners: rules.number_of_winners,
    };
    json!({
        "config": c,
        "results": result_stats_to_json(res, rules.tiebreak_precision) })
}

fn read_ranking_data(root_path: &Path, cfs: &FileSource) -> RcvResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" | "" => io_csv::read_csv_ranking(&p2, cfs),
        "json" => io_json::read_json_ranking(&p2),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

/// The candidates of the election, in order. If none were declared, the
/// candidates are taken from the ballots in order of first appearance.
fn gather_candidates(declared: &[String], ballots: &[ParsedBallot]) -> Vec<String> {
    if !declared.is_empty() {
        return declared.to_vec();
    }
    let mut seen: HashSet<&String> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for pb in ballots.iter() {
        for c in pb.choices.iter() {
            if seen.insert(c) {
                res.push(c.clone());
            }
        }
    }
    info!("No declared candidates, using the ones from the ballots: {:?}", res);
    res
}

fn write_summary(out: &str, pretty_js: &str) -> RcvResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    if let Some(dir) = Path::new(out).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).context(WritingOutputSnafu { path: out })?;
        }
    }
    fs::write(out, pretty_js).context(WritingOutputSnafu { path: out })?;
    info!("Summary written to {}", out);
    Ok(())
}

/// Runs an election described by the command line arguments, prints the
/// winners and writes the summary.
pub fn run_election(args: &Args) -> RcvResult<TopNResult> {
    let (config, root_p): (ElectionConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => {
            let config = ElectionConfig {
                output_settings: OutputSettings {
                    contest_name: "toprcv".to_string(),
                    ..OutputSettings::default()
                },
                ..ElectionConfig::default()
            };
            (config, PathBuf::new())
        }
    };
    debug!("config: {:?}", config);

    // Validate the rules:
    let mut rules = validate_rules(&config.rules)?;
    if let Some(n) = args.winners {
        if n == 0 {
            whatever!("Invalid --winners option: {}: expected a positive number", n);
        }
        rules.number_of_winners = n;
    }

    // The input from the command line replaces the sources of the configuration.
    let sources: Vec<FileSource> = match &args.input {
        Some(input) => vec![FileSource::from_input(
            args.input_type.as_deref().unwrap_or("csv"),
            input,
        )],
        None => config.ballot_sources.clone(),
    };
    ensure!(
        !sources.is_empty() || config.ballots.is_some(),
        MissingInputSnafu {}
    );

    let mut data: Vec<ParsedBallot> = Vec::new();
    if let Some(inline) = &config.ballots {
        for (idx, choices) in inline.iter().enumerate() {
            data.push(ParsedBallot {
                id: Some(format!("config-{:08}", idx + 1)),
                choices: io_common::clean_choices(choices),
            });
        }
    }
    for cfs in sources.iter() {
        let mut file_data = read_ranking_data(&root_p, cfs)?;
        data.append(&mut file_data);
    }
    info!("Read {} ballots", data.len());

    let excluded: HashSet<&str> = config
        .candidates
        .iter()
        .filter(|c| c.excluded.unwrap_or(false))
        .map(|c| c.name.as_str())
        .collect();
    let declared: Vec<String> = match &args.candidates {
        Some(cands) => cands.clone(),
        None => config.candidates.iter().map(|c| c.name.clone()).collect(),
    };
    let candidates: Vec<String> = gather_candidates(&declared, &data)
        .into_iter()
        .filter(|c| !excluded.contains(c.as_str()))
        .collect();
    if !excluded.is_empty() {
        info!("Excluded candidates: {:?}", excluded);
    }

    let mut builder = Builder::new(&rules)
        .context(VotingSnafu {})?
        .candidates(&candidates)
        .context(VotingSnafu {})?;
    for pb in data.iter() {
        let choices: Vec<String> = pb
            .choices
            .iter()
            .filter(|c| !excluded.contains(c.as_str()))
            .cloned()
            .collect();
        debug!("Choices for ballot {:?}: {:?}", pb.id, choices);
        builder.add_ballot(&choices).context(VotingSnafu {})?;
    }

    let result = builder.run(&InstantRunoff).context(VotingSnafu {})?;
    for (idx, winner) in result.winners.iter().enumerate() {
        println!("{}. {}", idx + 1, winner);
    }

    // Assemble the final json
    let result_js = build_summary_js(&config.output_settings, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out: Option<String> = args.out.clone().or_else(|| {
        config.output_settings.output_directory.as_ref().map(|d| {
            root_p
                .join(d)
                .join("summary.json")
                .display()
                .to_string()
        })
    });
    if let Some(out_p) = out {
        write_summary(&out_p, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(result)
}

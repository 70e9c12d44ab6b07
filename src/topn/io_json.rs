// Primitives for reading JSON ballot files.

use crate::topn::{
    io_common::{clean_choices, make_default_id},
    *,
};

/// Reads an array of ballots, each ballot being an array of candidate names.
pub fn read_json_ranking(path: &str) -> RcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let raw: Vec<Vec<String>> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(raw
        .iter()
        .enumerate()
        .map(|(idx, choices)| ParsedBallot {
            id: Some(default_id(idx + 1)),
            choices: clean_choices(choices),
        })
        .collect())
}

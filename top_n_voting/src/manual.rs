/*!

This is the long-form manual for `top_n_voting` and `toprcv`.

## How the winners are found

The extraction proceeds in rounds. Each round:

1. removes the winners of the previous rounds from the list of candidates and from
   every ballot. The other choices of a ballot keep their order. A ballot that
   only ranked previous winners becomes empty and simply does not count anymore.
2. checks that every choice of every ballot is one of the remaining candidates.
3. runs a single-winner instant-runoff count on what is left.
4. if the count ends with several tied finalists, breaks the tie with the
   positional score described below.

The winner of round `i` is the candidate in `i`-th place.

The extraction stops with an error as soon as one round fails: there is no
partial result. The error reports the round that failed.

## Tiebreak

For a finalist `c` and a ballot of length `L`, the ballot score is `0` if `c`
is not ranked, and `(L - p) / L` if `c` is at position `p` (starting at 0). The
first choice of a ballot is worth `1`, the last one `1 / L`.

The score of a finalist is the average of its ballot scores over all the ballots
of the round, including the ones that do not rank it.

The finalist with the highest score wins. If the two highest scores are equal
after rounding to 5 decimal places (the `tiebreakPrecision` rule), the tie is
considered genuine and the extraction fails. The precision can go up to 12
decimals; larger values are rejected before the first round.

## Input formats

The following formats are supported by `toprcv`:
* `json` an array of ballots, each ballot being an array of candidate names
* `csv` Comma Separated Values, one ballot per row

### `json`

```text
[
  ["Dune", "Emma", "Ulysses"],
  ["Emma"],
  ["Ulysses", "Dune"]
]
```

### `csv`

Each column (in order) is a choice. Empty cells are skipped.

```text
id,choice 1,choice 2,choice 3
id1,Dune,Emma,Ulysses
id2,Emma,,
```

The `id` column is optional. Headers in the first row are optional.
See the [Configuration section](#configuration) on controlling the optional rows and columns.

## Configuration

An election is described by a JSON file:

```text
{
  "outputSettings": { "contestName": "Book club", "outputDirectory": "out" },
  "candidates": [ { "name": "Dune" }, { "name": "Emma" }, { "name": "Ulysses" } ],
  "ballotSources": [ { "provider": "csv", "filePath": "ballots.csv", "firstVoteColumnIndex": 2, "firstVoteRowIndex": 2 } ],
  "rules": { "numberOfWinners": 2, "tiebreakPrecision": 5 }
}
```

Notes:
- `ballotSources` paths are relative to the configuration file.
- ballots may also be written directly in the configuration with a `ballots` array.
- a candidate marked `"excluded": true` is removed from the pool and from every ballot
  before the first round.
- column and row indexes start at 1, as in spreadsheets.

 */

/*!

This is the long-form manual for `instant_runoff` and `irvtally`.

## Counting

Every round, each ballot that still ranks a continuing candidate gives one
vote to the candidate it ranks best. A candidate wins as soon as they hold a
majority of the continuing ballots. Otherwise the candidates with the fewest
votes are eliminated and removed from every ballot, and a new round starts.
Ballots that do not rank any continuing candidate anymore are exhausted: they
are kept, but they do not count in the denominator of the later rounds.

The tabulation stops with a tie when all the continuing candidates have
exactly the same number of votes.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values
* `xlsx` Excel spreadsheets
* `json` JSON documents
* `yaml` a folder of YAML files

### csv

The first row is a header: the voter identifier column, then one column per
candidate. Every following row is one ballot, with the rank given to each
candidate, or nothing if the candidate is not ranked. Columns with an empty
header are ignored.

```text
voter,A,B,C
v1,1,2,
v2,,1,2
v3,2,1,3
```

Ranks are read as integers. Decimal ranks like `1.6` are rounded to the
nearest integer. Any other value (text, `0`, negative numbers, ranks greater
than the number of candidates) is treated as no preference.

### xlsx

Same layout as `csv`, in an Excel worksheet. The first worksheet is used
unless `excelWorksheetName` (or `--excel-worksheet-name`) says otherwise.

### json

```json
{
  "candidates": ["A", "B", "C"],
  "ballots": [
    { "voter": "v1", "ranks": { "A": 1, "B": 2 } },
    { "voter": "v2", "ranks": { "B": 1, "C": "2" } }
  ]
}
```

The order of the ranks inside a ballot is kept. It matters when two
candidates receive the same rank.

### yaml

A folder with a `candidates.yaml` file listing the candidates, and one file
per voter whose name starts with `voter` and ends with `.yaml`:

```text
# candidates.yaml
- A
- B
- C

# voter1.yaml
- Voter: v1
  A: 1
  B: 2
```

The voter files are read in the order of their names. A folder given with
`--input` is read as `yaml` by default.

In all the formats, a voter identifier may only appear once.

## Configuration

`irvtally` comes with sensible defaults but users may want to apply specific
rules. The program accepts a configuration file in JSON, loosely following the
configuration of the [RCTab program](https://github.com/BrightSpots/rcv).

```json
{
  "outputSettings": { "contestName": "Mayor" },
  "cvrFileSources": [ { "provider": "csv", "filePath": "ballots.csv" } ],
  "candidates": [ { "name": "A" }, { "name": "B", "excluded": true } ],
  "rules": {
    "majorityRule": "strictMajority",
    "eliminationAlgorithm": "batch",
    "tiebreakMode": "useCandidateOrder",
    "duplicateRankRule": "keepFirst",
    "invalidCandidateRule": "drop"
  }
}
```

The `filePath` is relative to the location of the configuration file.

Rules (the first value is the default):
 - `majorityRule`: `strictMajority` (more than half of the continuing ballots)
   or `atLeastHalf`.
 - `eliminationAlgorithm`: `batch` eliminates all the candidates tied for the
   lowest count in the same round. `single` eliminates only one of them, chosen
   by the tiebreak mode.
 - `tiebreakMode`: `useCandidateOrder` (the candidate listed last goes first),
   `lexical` (the greatest name goes first) or `random`, which requires a
   `randomSeed`.
 - `duplicateRankRule`: what happens when a ballot gives the same rank to
   several candidates: `keepFirst` keeps the first one in the order of the
   file, `reject` stops the tabulation, `split` shares the vote equally.
 - `invalidCandidateRule`: what happens when a ballot ranks a name that is
   not a candidate: `drop` ignores the entry, `reject` stops the tabulation.

Excluded candidates are removed before the tabulation starts. Their rankings
are then treated like any other unknown name.

 */

/*!

This is the long-form manual for `council_voting` and `councilvote`.

## The election model

An election has a fixed candidate list and a voter roll of email addresses.
Each voter may cast exactly one ballot per election cycle, selecting between
1 and `maxSelections` candidates. The ranking sorts candidates by vote count,
breaking ties by the order in which candidates were registered, and the top
`electedSeats` entries form the elected subset.

A cycle ends with an election reset: all vote counters return to zero and all
voters may vote again. Candidates and voters survive the reset.

## Voter roster formats

The `add-voters` command accepts:

* a plain text file with one email address per line. Blank lines are dropped,
  surrounding whitespace is trimmed and addresses are lowercased;
* a CSV file with `--csv-column N` selecting the (1-based) column that holds
  the addresses. The first row is treated as a header and skipped unless
  `--no-header` is passed.

Addresses already present on the roll, and repeated addresses within one
import, are silently skipped; the command reports how many entries were
actually added.

## Configuration

`councilvote` reads an optional JSON configuration file (`--config`):

```text
{
  "contestName": "Staff council election",
  "dataDirectory": "election-data",
  "maxSelections": 9,
  "electedSeats": 9,
  "adminPassword": "admin",
  "summary": {
    "endpoint": "https://generativelanguage.googleapis.com/v1beta",
    "model": "gemini-2.5-pro",
    "apiKeyEnv": "SUMMARY_API_KEY",
    "timeoutSeconds": 30
  }
}
```

Every field is optional; the values above are the defaults. The election
state is persisted under `dataDirectory` as two JSON files, `candidates.json`
and `voters.json`, which are created on first use.

The admin password protects the mutating commands (`add-candidate`,
`remove-candidate`, `add-voters`, `reset-election`). It is a plain shared
secret stored in the configuration file: a gate against accidental use, not
an authentication mechanism. Do not expose the data directory or the
configuration file to untrusted users.

## The narrative summary

`councilvote summary` sends the ranked results and the names of the elected
candidates to a text-generation service and prints the returned announcement
text. The API key is read from the environment variable named by
`summary.apiKeyEnv`. When the call fails or times out, the tally output is
unaffected and a fallback message is printed in place of the narrative.

 */

use log::{debug, info, warn};

use council_voting::*;
use snafu::{prelude::*, Snafu};

use crate::args::{Args, Command};

pub mod config_reader;
pub mod roster;
pub mod store_json;
pub mod summary;

use crate::app::config_reader::AppConfig;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating data directory {path}"))]
    CreatingDataDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening roster file {path}"))]
    OpeningRoster {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("CSV line {lineno} has no column {column}"))]
    CsvLineTooShort { lineno: usize, column: usize },
    #[snafu(display("CSV column numbering starts at 1, got {column}"))]
    InvalidCsvColumn { column: usize },

    #[snafu(display("Admin password rejected"))]
    AdminAuth {},
    #[snafu(display("Unknown candidate id {id}"))]
    UnknownCandidate { id: u32 },
    #[snafu(display("{source}"))]
    Election { source: ElectionErrors },

    #[snafu(display("The environment variable {var} with the summary API key is not set"))]
    ApiKeyMissing { var: String },
    #[snafu(display("The summary service could not be reached"))]
    SummaryRequest { source: reqwest::Error },
    #[snafu(display("The summary service returned an unexpected payload"))]
    SummaryResponse {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

pub fn run(args: &Args) -> AppResult<()> {
    let config = config_reader::load_config(&args.config)?;
    debug!("config: {:?}", config);
    match &args.command {
        Command::AddCandidate { name, password } => {
            check_admin(&config, password)?;
            cmd_add_candidate(&config, name)
        }
        Command::RemoveCandidate { id, password } => {
            check_admin(&config, password)?;
            cmd_remove_candidate(&config, *id)
        }
        Command::AddVoters {
            file,
            csv_column,
            no_header,
            password,
        } => {
            check_admin(&config, password)?;
            cmd_add_voters(&config, file, *csv_column, *no_header)
        }
        Command::ResetElection { password } => {
            check_admin(&config, password)?;
            cmd_reset_election(&config)
        }
        Command::Vote { email, select } => cmd_vote(&config, email, select),
        Command::Status => cmd_status(&config),
        Command::Tally => cmd_tally(&config).map(|_| ()),
        Command::Summary => cmd_summary(&config),
    }
}

/// A placeholder-strength shared-secret gate for the mutating commands.
/// Not an authentication boundary.
fn check_admin(config: &AppConfig, password: &str) -> AppResult<()> {
    ensure!(password == config.admin_password(), AdminAuthSnafu);
    Ok(())
}

fn cmd_add_candidate(config: &AppConfig, name: &str) -> AppResult<()> {
    let mut store = store_json::load_store(config.data_directory())?;
    let id = store.add_candidate(name).context(ElectionSnafu)?;
    store_json::save_store(config.data_directory(), &store)?;
    println!("Added candidate [{}] {}", id.0, name.trim());
    Ok(())
}

fn cmd_remove_candidate(config: &AppConfig, id: u32) -> AppResult<()> {
    let mut store = store_json::load_store(config.data_directory())?;
    if store.remove_candidate(CandidateId(id)) {
        store_json::save_store(config.data_directory(), &store)?;
        println!("Removed candidate {}", id);
    } else {
        println!("No candidate with id {}, nothing to do", id);
    }
    Ok(())
}

fn cmd_add_voters(
    config: &AppConfig,
    file: &str,
    csv_column: Option<usize>,
    no_header: bool,
) -> AppResult<()> {
    let emails = roster::read_roster(file, csv_column, no_header)?;
    let batch = emails.len();
    let mut store = store_json::load_store(config.data_directory())?;
    let added = store.add_voters(&emails);
    store_json::save_store(config.data_directory(), &store)?;
    println!(
        "Added {} voters ({} duplicate entries skipped), {} on the roll",
        added,
        batch - added,
        store.voters().len()
    );
    Ok(())
}

fn cmd_reset_election(config: &AppConfig) -> AppResult<()> {
    let mut store = store_json::load_store(config.data_directory())?;
    store.reset_election();
    store_json::save_store(config.data_directory(), &store)?;
    println!("Election reset: all votes cleared, every voter may vote again.");
    Ok(())
}

fn cmd_vote(config: &AppConfig, email: &str, select: &[u32]) -> AppResult<()> {
    let rules = config.rules();
    let mut store = store_json::load_store(config.data_directory())?;

    let mut session = VoterSession::new();
    session.login(&store, email).context(ElectionSnafu)?;
    if let SessionState::AlreadyVoted { email } = session.state() {
        println!(
            "{}: a ballot has already been cast for this election cycle.",
            email
        );
        return Ok(());
    }

    for raw in select {
        let id = CandidateId(*raw);
        ensure!(
            store.candidate(id).is_some(),
            UnknownCandidateSnafu { id: *raw }
        );
        match session.toggle(&rules, id).context(ElectionSnafu)? {
            ToggleOutcome::Added => debug!("selected {:?}", id),
            ToggleOutcome::Removed => info!("deselected {:?}", id),
            ToggleOutcome::AtCapacity => println!(
                "Selection is already at the maximum of {}; candidate {} ignored.",
                rules.max_selections, raw
            ),
        }
    }

    let applied = session.submit(&mut store).context(ElectionSnafu)?;
    store_json::save_store(config.data_directory(), &store)?;
    println!("Ballot cast: {} selection(s) recorded. Thank you for voting.", applied);
    Ok(())
}

fn cmd_status(config: &AppConfig) -> AppResult<()> {
    let store = store_json::load_store(config.data_directory())?;
    println!("Contest: {}", config.contest_name());
    println!("Candidates:");
    for c in store.candidates() {
        println!("  [{}] {}", c.id.0, c.name);
    }
    let voted = store.voters().iter().filter(|v| v.has_voted).count();
    println!(
        "Voters: {} registered, {} have voted",
        store.voters().len(),
        voted
    );
    Ok(())
}

fn cmd_tally(config: &AppConfig) -> AppResult<TallyResult> {
    let store = store_json::load_store(config.data_directory())?;
    let tally = ranked_tally(&store, &config.rules());
    println!("Results for {}:", config.contest_name());
    for rc in tally.ranking.iter() {
        let marker = if rc.elected { "  -> elected" } else { "" };
        println!(
            "{:>3}. {:<32} {:>5} votes  {:>3}%{}",
            rc.rank, rc.name, rc.votes, rc.percent_of_max, marker
        );
    }
    println!(
        "Turnout: {} of {} voters",
        tally.voters_voted, tally.total_voters
    );
    Ok(tally)
}

fn cmd_summary(config: &AppConfig) -> AppResult<()> {
    let tally = cmd_tally(config)?;
    let prompt = summary::build_prompt(config.contest_name(), &tally);
    println!();
    // A collaborator failure only degrades the narrative, never the tally.
    match summary::generate(config, &prompt) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            warn!("summary generation failed: {}", e);
            println!("{}", summary::FALLBACK_TEXT);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn test_config(name: &str) -> AppConfig {
        let dir: PathBuf = std::env::temp_dir().join(format!("councilvote-{}", name));
        let _ = fs::remove_dir_all(&dir);
        AppConfig {
            data_directory: Some(dir.to_str().unwrap().to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn admin_gate() {
        let config = AppConfig::default();
        assert!(check_admin(&config, "admin").is_ok());
        assert!(matches!(
            check_admin(&config, "nope"),
            Err(AppError::AdminAuth { .. })
        ));
        let config = AppConfig {
            admin_password: Some("s3cret".to_string()),
            ..AppConfig::default()
        };
        assert!(check_admin(&config, "s3cret").is_ok());
        assert!(check_admin(&config, "admin").is_err());
    }

    #[test]
    fn full_cycle_through_commands() {
        let config = test_config("full-cycle");

        cmd_add_candidate(&config, "Anna").unwrap();
        cmd_add_candidate(&config, "Bob").unwrap();
        cmd_add_candidate(&config, "Clara").unwrap();

        // Roster import from a plain text file, duplicates included.
        let roster_path =
            std::env::temp_dir().join("councilvote-full-cycle-roster.txt");
        fs::write(&roster_path, "v1@x.com\nV1@X.COM\n\nv2@x.com\n").unwrap();
        cmd_add_voters(&config, roster_path.to_str().unwrap(), None, false).unwrap();

        let store = store_json::load_store(config.data_directory()).unwrap();
        assert_eq!(store.candidates().len(), 3);
        assert_eq!(store.voters().len(), 2);

        cmd_vote(&config, "V1@x.com", &[0, 1]).unwrap();
        // A second ballot for the same voter is absorbed without mutation.
        cmd_vote(&config, "v1@x.com", &[2]).unwrap();

        let tally = cmd_tally(&config).unwrap();
        assert_eq!(tally.voters_voted, 1);
        assert_eq!(tally.ranking[0].votes, 1);
        let total: u64 = tally.ranking.iter().map(|rc| rc.votes).sum();
        assert_eq!(total, 2);

        cmd_reset_election(&config).unwrap();
        let store = store_json::load_store(config.data_directory()).unwrap();
        assert!(store.candidates().iter().all(|c| c.votes == 0));
        assert!(store.voters().iter().all(|v| !v.has_voted));
    }

    #[test]
    fn vote_rejects_unknown_candidate_and_unknown_voter() {
        let config = test_config("vote-rejects");
        cmd_add_candidate(&config, "Anna").unwrap();

        let roster_path =
            std::env::temp_dir().join("councilvote-vote-rejects-roster.txt");
        fs::write(&roster_path, "v1@x.com\n").unwrap();
        cmd_add_voters(&config, roster_path.to_str().unwrap(), None, false).unwrap();

        assert!(matches!(
            cmd_vote(&config, "v1@x.com", &[99]),
            Err(AppError::UnknownCandidate { id: 99 })
        ));
        assert!(matches!(
            cmd_vote(&config, "ghost@x.com", &[0]),
            Err(AppError::Election {
                source: ElectionErrors::NotRegistered
            })
        ));
        // Neither rejection left a trace in the store.
        let store = store_json::load_store(config.data_directory()).unwrap();
        assert_eq!(store.candidates()[0].votes, 0);
        assert!(!store.voter("v1@x.com").unwrap().has_voted);
    }

    #[test]
    fn empty_ballot_is_rejected() {
        let config = test_config("empty-ballot");
        cmd_add_candidate(&config, "Anna").unwrap();
        let roster_path =
            std::env::temp_dir().join("councilvote-empty-ballot-roster.txt");
        fs::write(&roster_path, "v1@x.com\n").unwrap();
        cmd_add_voters(&config, roster_path.to_str().unwrap(), None, false).unwrap();

        assert!(matches!(
            cmd_vote(&config, "v1@x.com", &[]),
            Err(AppError::Election {
                source: ElectionErrors::EmptySelection
            })
        ));
        // Toggling the same id twice empties the selection again.
        assert!(matches!(
            cmd_vote(&config, "v1@x.com", &[0, 0]),
            Err(AppError::Election {
                source: ElectionErrors::EmptySelection
            })
        ));
    }
}

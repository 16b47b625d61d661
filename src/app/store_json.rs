use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;
use std::path::Path;

use council_voting::*;

use crate::app::*;

pub const CANDIDATES_FILE: &str = "candidates.json";
pub const VOTERS_FILE: &str = "voters.json";

/// On-disk shape of one candidate, as stored in `candidates.json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CandidateRecord {
    pub id: u32,
    pub name: String,
    pub votes: u64,
}

/// On-disk shape of one voter, as stored in `voters.json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VoterRecord {
    pub email: String,
    #[serde(rename = "hasVoted")]
    pub has_voted: bool,
}

fn read_records<T: DeserializeOwned>(dir: &str, file: &str) -> AppResult<Vec<T>> {
    let path = Path::new(dir).join(file);
    // A store that was never written starts out empty.
    if !path.exists() {
        debug!("read_records: {:?} not found, starting empty", path);
        return Ok(Vec::new());
    }
    let shown = path.to_string_lossy().to_string();
    let contents = fs::read_to_string(&path).context(OpeningJsonSnafu {
        path: shown.clone(),
    })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path: shown })
}

fn write_records<T: Serialize>(dir: &str, file: &str, records: &[T]) -> AppResult<()> {
    let path = Path::new(dir).join(file);
    let shown = path.to_string_lossy().to_string();
    let contents = match serde_json::to_string_pretty(records) {
        Ok(s) => s,
        Err(e) => whatever!("Cannot serialize {}: {}", file, e),
    };
    fs::write(&path, contents).context(WritingJsonSnafu { path: shown })
}

/// Loads the election state from the data directory. Missing files yield an
/// empty candidate list or voter roll.
pub fn load_store(dir: &str) -> AppResult<ElectionStore> {
    let candidates: Vec<CandidateRecord> = read_records(dir, CANDIDATES_FILE)?;
    let voters: Vec<VoterRecord> = read_records(dir, VOTERS_FILE)?;
    let candidates: Vec<Candidate> = candidates
        .into_iter()
        .map(|r| Candidate {
            id: CandidateId(r.id),
            name: r.name,
            votes: r.votes,
        })
        .collect();
    let voters: Vec<Voter> = voters
        .into_iter()
        .map(|r| Voter {
            email: r.email,
            has_voted: r.has_voted,
        })
        .collect();
    ElectionStore::from_parts(candidates, voters).context(ElectionSnafu)
}

/// Writes the full election state to the data directory, creating it if
/// needed. Callers persist only after the in-memory mutation succeeded.
pub fn save_store(dir: &str, store: &ElectionStore) -> AppResult<()> {
    fs::create_dir_all(dir).context(CreatingDataDirSnafu {
        path: dir.to_string(),
    })?;
    let candidates: Vec<CandidateRecord> = store
        .candidates()
        .iter()
        .map(|c| CandidateRecord {
            id: c.id.0,
            name: c.name.clone(),
            votes: c.votes,
        })
        .collect();
    let voters: Vec<VoterRecord> = store
        .voters()
        .iter()
        .map(|v| VoterRecord {
            email: v.email.clone(),
            has_voted: v.has_voted,
        })
        .collect();
    write_records(dir, CANDIDATES_FILE, &candidates)?;
    write_records(dir, VOTERS_FILE, &voters)?;
    debug!(
        "save_store: wrote {} candidates, {} voters to {:?}",
        candidates.len(),
        voters.len(),
        dir
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> String {
        let dir: PathBuf = std::env::temp_dir().join(format!("councilvote-store-{}", name));
        let _ = fs::remove_dir_all(&dir);
        dir.to_str().unwrap().to_string()
    }

    #[test]
    fn missing_files_load_as_empty_store() {
        let dir = temp_dir("missing");
        let store = load_store(&dir).unwrap();
        assert!(store.candidates().is_empty());
        assert!(store.voters().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = temp_dir("round-trip");
        let mut store = ElectionStore::new();
        let a = store.add_candidate("Anna").unwrap();
        store.add_candidate("Bob").unwrap();
        store.add_voters(&["v1@x.com".to_string(), "v2@x.com".to_string()]);
        let mut session = VoterSession::new();
        session.login(&store, "v1@x.com").unwrap();
        session.toggle(&ElectionRules::DEFAULT_RULES, a).unwrap();
        session.submit(&mut store).unwrap();

        save_store(&dir, &store).unwrap();
        let loaded = load_store(&dir).unwrap();
        assert_eq!(loaded, store);

        // New candidates keep getting fresh ids after a reload.
        let mut loaded = loaded;
        let c = loaded.add_candidate("Clara").unwrap();
        assert_eq!(c, CandidateId(2));
    }

    #[test]
    fn stored_voter_records_use_has_voted_key() {
        let dir = temp_dir("voted-key");
        let mut store = ElectionStore::new();
        store.add_voters(&["v1@x.com".to_string()]);
        save_store(&dir, &store).unwrap();

        let raw = fs::read_to_string(Path::new(&dir).join(VOTERS_FILE)).unwrap();
        assert!(raw.contains("\"hasVoted\": false"));
        assert!(!raw.contains("has_voted"));
    }

    #[test]
    fn corrupted_file_is_reported_with_its_path() {
        let dir = temp_dir("corrupted");
        fs::create_dir_all(&dir).unwrap();
        fs::write(Path::new(&dir).join(CANDIDATES_FILE), "not json").unwrap();
        let err = load_store(&dir).unwrap_err();
        assert!(matches!(err, AppError::ParsingJson { .. }));
        assert!(format!("{}", err).contains(CANDIDATES_FILE));
    }
}

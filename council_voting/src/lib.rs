mod config;
use log::{debug, info, warn};

use std::collections::HashSet;

pub use crate::config::*;

pub mod builder;
pub mod manual;

/// Canonical form of a voter email: trimmed and lowercased.
///
/// All voter identity comparisons in this crate go through this function.
pub fn canonical_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// **** Election store ****

/// The single owner of the durable election state: the candidate list and
/// the voter roll.
///
/// The store keeps candidates in insertion order; the ranked tally relies on
/// that order to break ties. It does not enforce cross-entity consistency on
/// its own: the atomicity of a ballot (vote counters and the voter flag
/// moving together) is the job of [`VoterSession::submit`].
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectionStore {
    candidates: Vec<Candidate>,
    voters: Vec<Voter>,
    next_candidate_id: u32,
}

impl ElectionStore {
    pub fn new() -> ElectionStore {
        ElectionStore::default()
    }

    /// Rebuilds a store from externally persisted records.
    ///
    /// Voter emails are canonicalized and must be unique under the canonical
    /// form. The id counter restarts above the highest id seen, so removed
    /// candidates never get their id reassigned.
    pub fn from_parts(
        candidates: Vec<Candidate>,
        voters: Vec<Voter>,
    ) -> Result<ElectionStore, ElectionErrors> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut canonical_voters: Vec<Voter> = Vec::new();
        for v in voters {
            let email = canonical_email(&v.email);
            if !seen.insert(email.clone()) {
                return Err(ElectionErrors::DuplicateVoter(email));
            }
            canonical_voters.push(Voter {
                email,
                has_voted: v.has_voted,
            });
        }
        let next_candidate_id = candidates.iter().map(|c| c.id.0 + 1).max().unwrap_or(0);
        Ok(ElectionStore {
            candidates,
            voters: canonical_voters,
            next_candidate_id,
        })
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Looks up a voter by canonical email equality.
    pub fn voter(&self, email: &str) -> Option<&Voter> {
        let email = canonical_email(email);
        self.voters.iter().find(|v| v.email == email)
    }

    /// Registers a new candidate with zero votes and a fresh id.
    pub fn add_candidate(&mut self, name: &str) -> Result<CandidateId, ElectionErrors> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ElectionErrors::EmptyCandidateName);
        }
        let id = CandidateId(self.next_candidate_id);
        self.next_candidate_id += 1;
        self.candidates.push(Candidate {
            id,
            name: name.to_string(),
            votes: 0,
        });
        info!("add_candidate: {:?} {:?}", id, name);
        Ok(id)
    }

    /// Removes a candidate. A no-op when the id is unknown. Other candidates
    /// keep their ids and vote counts.
    pub fn remove_candidate(&mut self, id: CandidateId) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.id != id);
        let removed = self.candidates.len() < before;
        if removed {
            info!("remove_candidate: {:?}", id);
        } else {
            debug!("remove_candidate: {:?} not found, ignoring", id);
        }
        removed
    }

    /// Adds a batch of voters, deduplicated against the current roll and
    /// within the batch itself. Empty entries are dropped. Returns the number
    /// of voters actually added.
    pub fn add_voters(&mut self, emails: &[String]) -> usize {
        let mut present: HashSet<String> =
            self.voters.iter().map(|v| v.email.clone()).collect();
        let mut added = 0usize;
        for raw in emails {
            let email = canonical_email(raw);
            if email.is_empty() {
                continue;
            }
            if !present.insert(email.clone()) {
                debug!("add_voters: skipping duplicate {:?}", email);
                continue;
            }
            self.voters.push(Voter {
                email,
                has_voted: false,
            });
            added += 1;
        }
        info!(
            "add_voters: {} added, {} entries in roll",
            added,
            self.voters.len()
        );
        added
    }

    /// Starts a new election cycle: every vote counter back to zero, every
    /// voter allowed to vote again. Idempotent and irreversible.
    pub fn reset_election(&mut self) {
        for c in self.candidates.iter_mut() {
            c.votes = 0;
        }
        for v in self.voters.iter_mut() {
            v.has_voted = false;
        }
        info!(
            "reset_election: {} candidates, {} voters",
            self.candidates.len(),
            self.voters.len()
        );
    }

    /// Applies an accepted ballot in one step: one vote for each selected
    /// candidate that still exists, and the voter marked as having voted.
    ///
    /// Selected ids that no longer resolve (candidate removed while the
    /// ballot was open) are dropped, not treated as an error. Returns the
    /// number of vote increments actually applied.
    fn apply_ballot(&mut self, email: &str, selection: &[CandidateId]) -> usize {
        let mut applied = 0usize;
        for id in selection {
            match self.candidates.iter_mut().find(|c| c.id == *id) {
                Some(c) => {
                    c.votes += 1;
                    applied += 1;
                }
                None => {
                    warn!("apply_ballot: dropping dangling candidate id {:?}", id);
                }
            }
        }
        if let Some(v) = self.voters.iter_mut().find(|v| v.email == email) {
            v.has_voted = true;
        }
        info!(
            "apply_ballot: {} of {} selections applied for {:?}",
            applied,
            selection.len(),
            email
        );
        applied
    }
}

// **** Voting session state machine ****

/// The states one voter session moves through.
///
/// `Submitted` and `AlreadyVoted` are terminal: a new session must be opened
/// to do anything further, and a voter who already cast a ballot lands back
/// in `AlreadyVoted` until the election is reset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SessionState {
    Anonymous,
    Authenticated {
        email: String,
    },
    BallotOpen {
        email: String,
        selection: Vec<CandidateId>,
    },
    AlreadyVoted {
        email: String,
    },
    Submitted,
}

/// What a toggle did to the selection.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The selection is at the configured maximum; the add was rejected and
    /// the selection left untouched.
    AtCapacity,
}

/// One voter's interaction, from login to ballot submission.
///
/// The session owns the transient selection; the store is only touched at
/// submission time, and then atomically.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoterSession {
    state: SessionState,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Anonymous
    }
}

impl VoterSession {
    pub fn new() -> VoterSession {
        VoterSession::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The current selection. Empty in every state without an open ballot.
    pub fn selection(&self) -> &[CandidateId] {
        match &self.state {
            SessionState::BallotOpen { selection, .. } => selection,
            _ => &[],
        }
    }

    /// Authenticates a voter by canonical email.
    ///
    /// Fails with [`ElectionErrors::NotRegistered`] and no state change when
    /// the email is unknown. A voter who has already voted lands in the
    /// terminal `AlreadyVoted` state with no ballot.
    pub fn login(
        &mut self,
        store: &ElectionStore,
        email: &str,
    ) -> Result<(), ElectionErrors> {
        if self.state != SessionState::Anonymous {
            return Err(ElectionErrors::InvalidTransition);
        }
        let voter = store.voter(email).ok_or(ElectionErrors::NotRegistered)?;
        if voter.has_voted {
            debug!("login: {:?} has already voted", voter.email);
            self.state = SessionState::AlreadyVoted {
                email: voter.email.clone(),
            };
        } else {
            debug!("login: {:?} authenticated", voter.email);
            self.state = SessionState::Authenticated {
                email: voter.email.clone(),
            };
        }
        Ok(())
    }

    /// Adds or removes one candidate from the open ballot.
    ///
    /// Removing is always allowed. Adding is rejected without any state
    /// change once the selection holds `rules.max_selections` entries: the
    /// machine itself guards the cap, whatever the caller shows or hides.
    pub fn toggle(
        &mut self,
        rules: &ElectionRules,
        id: CandidateId,
    ) -> Result<ToggleOutcome, ElectionErrors> {
        match &mut self.state {
            SessionState::Authenticated { email } => {
                let email = email.clone();
                self.state = SessionState::BallotOpen {
                    email,
                    selection: vec![id],
                };
                Ok(ToggleOutcome::Added)
            }
            SessionState::BallotOpen { selection, .. } => {
                if let Some(pos) = selection.iter().position(|s| *s == id) {
                    selection.remove(pos);
                    Ok(ToggleOutcome::Removed)
                } else if selection.len() < rules.max_selections {
                    selection.push(id);
                    Ok(ToggleOutcome::Added)
                } else {
                    debug!(
                        "toggle: selection already at {} entries, rejecting {:?}",
                        rules.max_selections, id
                    );
                    Ok(ToggleOutcome::AtCapacity)
                }
            }
            _ => Err(ElectionErrors::InvalidTransition),
        }
    }

    /// Casts the open ballot.
    ///
    /// Requires at least one selection. Applied in one step: the selected
    /// candidates' counters and the voter's flag move together, or (on any
    /// error) nothing moves at all. Returns the number of vote increments
    /// applied, which may be lower than the selection size if candidates
    /// were removed while the ballot was open.
    pub fn submit(&mut self, store: &mut ElectionStore) -> Result<usize, ElectionErrors> {
        match &self.state {
            SessionState::BallotOpen { email, selection } => {
                if selection.is_empty() {
                    return Err(ElectionErrors::EmptySelection);
                }
                let applied = store.apply_ballot(email, selection);
                self.state = SessionState::Submitted;
                Ok(applied)
            }
            SessionState::Authenticated { .. } => Err(ElectionErrors::EmptySelection),
            _ => Err(ElectionErrors::InvalidTransition),
        }
    }
}

// **** Tally engine ****

/// Derives the ranked result view over the current candidate set.
///
/// Pure and read-only: candidates sorted by vote count descending, ties kept
/// in store order (the sort is stable), the top `rules.elected_seats`
/// entries flagged as elected. An empty candidate set yields an empty
/// ranking with a max of zero.
pub fn ranked_tally(store: &ElectionStore, rules: &ElectionRules) -> TallyResult {
    let mut ordered: Vec<&Candidate> = store.candidates().iter().collect();
    ordered.sort_by(|a, b| b.votes.cmp(&a.votes));

    let max_votes = ordered.first().map(|c| c.votes).unwrap_or(0);
    let ranking: Vec<RankedCandidate> = ordered
        .iter()
        .enumerate()
        .map(|(idx, c)| RankedCandidate {
            id: c.id,
            name: c.name.clone(),
            votes: c.votes,
            rank: idx + 1,
            percent_of_max: if max_votes == 0 {
                0
            } else {
                ((c.votes * 100) / max_votes) as u8
            },
            elected: idx < rules.elected_seats,
        })
        .collect();

    let voters_voted = store.voters().iter().filter(|v| v.has_voted).count();
    debug!(
        "ranked_tally: {} candidates, max {} votes, {}/{} voters voted",
        ranking.len(),
        max_votes,
        voters_voted,
        store.voters().len()
    );
    TallyResult {
        ranking,
        max_votes,
        total_voters: store.voters().len(),
        voters_voted,
    }
}

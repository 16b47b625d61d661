// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Opaque identifier of a candidate.
///
/// Identifiers are assigned by the store at creation time and are never
/// reused, even after the candidate has been removed.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

/// A candidate standing in the election.
///
/// The vote counter starts at zero and is only ever advanced by an accepted
/// ballot, or brought back to zero by an election reset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
}

/// A voter authorized to cast one ballot per election cycle.
///
/// The email is stored in canonical form (trimmed, lowercased) and is the
/// unique identity of the voter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Voter {
    pub email: String,
    pub has_voted: bool,
}

// ******** Output data structures *********

/// One entry of the ranked tally, in decreasing vote order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedCandidate {
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Share of the highest vote count, in whole percents. Zero when the
    /// highest count is itself zero.
    pub percent_of_max: u8,
    /// Whether this candidate falls within the configured number of seats.
    pub elected: bool,
}

/// The full derived view over the current election state.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyResult {
    pub ranking: Vec<RankedCandidate>,
    pub max_votes: u64,
    pub total_voters: usize,
    pub voters_voted: usize,
}

impl TallyResult {
    /// The names of the elected subset, in rank order.
    pub fn elected_names(&self) -> Vec<String> {
        self.ranking
            .iter()
            .filter(|rc| rc.elected)
            .map(|rc| rc.name.clone())
            .collect()
    }
}

/// Errors surfaced by the store and the voting state machine.
///
/// None of these is fatal: every failure leaves the election state exactly as
/// it was before the attempted operation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionErrors {
    /// A candidate name was empty after trimming.
    EmptyCandidateName,
    /// The login email is not in the voter roll.
    NotRegistered,
    /// A ballot was submitted with no selection.
    EmptySelection,
    /// The action is not valid in the current session state.
    InvalidTransition,
    /// Two voters share the same canonical email (only possible when
    /// rebuilding a store from externally stored records).
    DuplicateVoter(String),
}

impl Error for ElectionErrors {}

impl Display for ElectionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionErrors::EmptyCandidateName => {
                write!(f, "candidate name is empty")
            }
            ElectionErrors::NotRegistered => {
                write!(f, "this email is not registered to vote")
            }
            ElectionErrors::EmptySelection => {
                write!(f, "a ballot must select at least one candidate")
            }
            ElectionErrors::InvalidTransition => {
                write!(f, "action is not valid in the current voting state")
            }
            ElectionErrors::DuplicateVoter(email) => {
                write!(f, "duplicate voter email: {}", email)
            }
        }
    }
}

// ********* Configuration **********

/// The rules that govern one election.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ElectionRules {
    /// Upper bound on the number of candidates one ballot may select.
    /// The lower bound is always 1.
    pub max_selections: usize,
    /// Number of seats: the top entries of the ranking that are considered
    /// elected.
    pub elected_seats: usize,
}

impl ElectionRules {
    pub const DEFAULT_RULES: ElectionRules = ElectionRules {
        max_selections: 9,
        elected_seats: 9,
    };
}

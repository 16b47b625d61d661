use clap::{Parser, Subcommand};

/// This is an administration and tallying program for bounded-choice council
/// elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration file for the election.
    /// For more information about the file format, read the documentation of
    /// the council_voting crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Registers a new candidate with zero votes (admin).
    AddCandidate {
        /// Display name of the candidate. Must be non-empty.
        #[clap(value_parser)]
        name: String,

        /// The admin password from the configuration file.
        #[clap(short, long, value_parser)]
        password: String,
    },

    /// Removes a candidate permanently (admin). Other candidates keep their
    /// ids and vote counts.
    RemoveCandidate {
        /// Identifier of the candidate, as shown by the status command.
        #[clap(value_parser)]
        id: u32,

        /// The admin password from the configuration file.
        #[clap(short, long, value_parser)]
        password: String,
    },

    /// Imports a batch of voters from a file (admin). Duplicates are
    /// silently skipped.
    AddVoters {
        /// (file path) A text file with one email address per line, or a CSV
        /// file when --csv-column is given.
        #[clap(value_parser)]
        file: String,

        /// (1-based) The CSV column holding the email addresses. Passing
        /// this switches the reader to CSV mode.
        #[clap(long, value_parser)]
        csv_column: Option<usize>,

        /// In CSV mode, do not skip the first row as a header.
        #[clap(long, takes_value = false)]
        no_header: bool,

        /// The admin password from the configuration file.
        #[clap(short, long, value_parser)]
        password: String,
    },

    /// Starts a new election cycle (admin): all vote counters back to zero
    /// and every voter allowed to vote again. Irreversible.
    ResetElection {
        /// The admin password from the configuration file.
        #[clap(short, long, value_parser)]
        password: String,
    },

    /// Casts a ballot for a registered voter. Each voter may vote once per
    /// election cycle.
    Vote {
        /// The voter's registered email address (case-insensitive).
        #[clap(short, long, value_parser)]
        email: String,

        /// Candidate id to select. May be repeated up to the configured
        /// maximum; repeating an id deselects it again.
        #[clap(short, long = "select", value_parser)]
        select: Vec<u32>,
    },

    /// Prints the candidate list and the current turnout.
    Status,

    /// Prints the ranked tally and the elected subset.
    Tally,

    /// Prints the ranked tally followed by a generated narrative summary of
    /// the results.
    Summary,
}

pub use crate::config::*;
use crate::ElectionStore;

/// A builder for assembling a populated election store.
///
/// Convenient for setting up a full election in one expression, for example
/// in tests or when importing an existing candidate list and voter roll.
///
/// ```
/// pub use council_voting::builder::Builder;
/// # use council_voting::ElectionErrors;
///
/// let store = Builder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string()])
///     .voters(&["anna@example.org".to_string(), "Bob@Example.org".to_string()])
///     .build()?;
///
/// assert_eq!(store.candidates().len(), 2);
/// assert!(store.voter("bob@example.org").is_some());
/// # Ok::<(), ElectionErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _candidates: Vec<String>,
    pub(crate) _voters: Vec<String>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// The candidate names, in ballot order. Ties in the final ranking are
    /// broken by this order.
    pub fn candidates(mut self, names: &[String]) -> Builder {
        self._candidates.extend(names.iter().cloned());
        self
    }

    /// The voter roll. Entries are canonicalized and deduplicated on build.
    pub fn voters(mut self, emails: &[String]) -> Builder {
        self._voters.extend(emails.iter().cloned());
        self
    }

    /// Builds the store. Fails on the first blank candidate name.
    pub fn build(self) -> Result<ElectionStore, ElectionErrors> {
        let mut store = ElectionStore::new();
        for name in self._candidates.iter() {
            store.add_candidate(name)?;
        }
        store.add_voters(&self._voters);
        Ok(store)
    }
}

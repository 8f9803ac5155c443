use thiserror::Error;

/// Runtime conditions that are reported to the caller instead of aborting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NwaError {
    #[error("Nondeterministic simulation ended in a final state with {pending} pending call(s)")]
    PendingCallAccepted { pending: usize },

    #[error("The nested word is not well-matched at position {position}")]
    UnbalancedWord { position: usize },
}

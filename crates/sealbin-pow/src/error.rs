use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    /// PoW is enabled but the submission carried no solution.
    #[error("proof-of-work solution required")]
    Required,

    /// Unknown, expired, or already-consumed challenge, or a digest below
    /// the required difficulty. Collapsed into one variant so a submitter
    /// learns nothing about challenge cache state.
    #[error("proof-of-work solution rejected")]
    Invalid,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("solve cancelled")]
    Cancelled,

    /// The nonce space was exhausted without a solution. Unreachable for any
    /// sane difficulty; present so the search loop has a non-panicking end.
    #[error("nonce space exhausted")]
    Exhausted,
}

use thiserror::Error;

/// Errors a caller can act on. Most event-driven mutations never produce one of
/// these — a malformed event is logged and the cascade continues (see
/// `coordinator`) rather than poisoning the process. These variants are
/// reserved for synchronous operations that can reject a request outright:
/// a structural edit that would corrupt the hierarchy, or a query with an
/// argument the cache cannot interpret.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

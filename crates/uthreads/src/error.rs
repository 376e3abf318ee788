use thiserror::Error;

/// Recoverable library errors. Every public entry point reports these on
/// stderr with the `thread library error:` prefix and returns -1.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    #[error("quantum usecs must have a positive value")]
    NonPositiveQuantum,
    #[error("sleep quantums must have a positive value")]
    NonPositiveSleep,
    #[error("tid is not in the valid range")]
    TidOutOfRange,
    #[error("there is no thread with this tid")]
    NoSuchThread,
    #[error("there are no available tids")]
    TidsExhausted,
    #[error("cannot block the main thread")]
    CannotBlockMain,
    #[error("cannot put the main thread to sleep")]
    CannotSleepMain,
    #[error("the thread library is not initialized")]
    NotInitialized,
}

use std::io;
use std::sync::Arc;

/// Failure of the body phase of a response.
///
/// The underlying I/O error is shared so the same value can be handed to
/// every registered callback.
#[derive(Clone, Debug, thiserror::Error)]
pub enum BodyError {
    /// Reading from the body source failed.
    #[error("failed to read response body source: {0}")]
    Read(#[source] Arc<io::Error>),

    /// Writing to (or flushing) the sink failed.
    #[error("failed to write response body: {0}")]
    Write(#[source] Arc<io::Error>),

    /// Shutting down a decorated writer failed after the body was written.
    #[error("failed to finish decorated response body: {0}")]
    Finish(#[source] Arc<io::Error>),
}

impl BodyError {
    pub fn read(err: io::Error) -> Self {
        BodyError::Read(Arc::new(err))
    }

    pub fn write(err: io::Error) -> Self {
        BodyError::Write(Arc::new(err))
    }

    pub fn finish(err: io::Error) -> Self {
        BodyError::Finish(Arc::new(err))
    }

    /// The I/O error behind this failure.
    pub fn io(&self) -> &io::Error {
        match self {
            BodyError::Read(e) | BodyError::Write(e) | BodyError::Finish(e) => e,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.io().kind()
    }
}

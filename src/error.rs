use thiserror::Error;

/// Errors surfaced by the conversion pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Unrecognized clock time '{0}'. Expected a 24-hour HH:MM:SS value.")]
    InvalidClock(String),

    #[error("Nothing to parse: the pasted text is empty")]
    EmptyInput,

    #[error("No pulls found in the pasted text")]
    NoMatches,

    #[error("Report URL has no 'reports/<id>' segment: '{0}'")]
    InvalidReportUrl(String),

    #[error("Combat log service request failed: {0}")]
    Remote(String),

    #[error("Report contains no fights")]
    EmptyReport,
}

pub type ConvertResult<T> = Result<T, ConvertError>;

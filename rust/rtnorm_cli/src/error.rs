use numpress::NumpressError;
use rtnorm::NormalizerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("RT normalization error: {0}")]
    Normalization(#[from] NormalizerError),

    #[error("Trace '{name}': {source}")]
    Trace {
        name: String,
        #[source]
        source: NumpressError,
    },
}

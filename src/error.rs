//! Error types for the pipeline and the geocoding collaborator.

use thiserror::Error;

/// Errors that abort a pipeline run. Feed failures are not here: they are
/// tolerated per feed inside [`crate::ingest::fetch_all`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A date string could not be parsed by the lenient parser.
    #[error("could not parse {field} date {input:?}")]
    DateParse {
        /// Which input failed: "start", "end" or "published".
        field: &'static str,
        input: String,
    },
}

/// Errors from the reverse-geocoding service.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Transport failure
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-2xx status
    #[error("geocoder returned status {0}")]
    Status(u16),

    /// Body was not the expected JSON
    #[error("geocoder response could not be decoded: {0}")]
    Decode(String),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RupError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// The store could not be opened at all.
    #[error("Data source not available: {0}")]
    SourceUnavailable(String),

    /// The store opened but holds no tables or no rows.
    #[error("No data: {0} is empty or has no readable table")]
    SourceEmpty(String),

    #[error("Unknown province: {0}")]
    UnknownProvince(String),

    #[error("Locality {0} exists in several provinces ({1}); pick one with --province")]
    AmbiguousLocality(String, String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl RupError {
    /// True for the two conditions that stop the pipeline before aggregation.
    pub fn is_blocking_source(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::SourceEmpty(_))
    }
}

pub type Result<T> = std::result::Result<T, RupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_are_distinct() {
        let unavailable = RupError::SourceUnavailable("RUP.db".into());
        let empty = RupError::SourceEmpty("RUP.db".into());
        assert!(unavailable.to_string().contains("not available"));
        assert!(empty.to_string().starts_with("No data"));
        assert!(unavailable.is_blocking_source());
        assert!(empty.is_blocking_source());
        assert!(!RupError::UnknownProvince("Papua".into()).is_blocking_source());
    }

    #[test]
    fn test_regex_error_converts() {
        let err: RupError = regex::Regex::new("(").unwrap_err().into();
        assert!(err.to_string().starts_with("Pattern error"));
    }
}

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by the simulation crate.
///
/// The simulation core itself never fails once a race is running: every input
/// is internally generated. The only failure class is a bad configuration,
/// which is rejected once, at construction time.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value that would make the simulation misbehave.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = SimError::InvalidConfiguration("distance must be > 0".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("distance"));
    }
}

use std::error::Error as StdError;
use std::fmt;

/// Errors raised by power estimation and its collaborators.
///
/// Configuration problems are fatal: they abort the whole computation and
/// never yield partial results. Monte Carlo replications are independent
/// draws, so there is no retry path anywhere in the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerError {
    /// The requested setup cannot be run: unsupported permutation structure,
    /// unknown test identifier, malformed group structure, or an exhausted
    /// class pool during across-group permutation.
    InvalidConfiguration(String),
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
        }
    }
}

impl StdError for PowerError {}

impl PowerError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PowerError::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_cause() {
        let err = PowerError::invalid("permute_structure must be 'multilevel'");
        assert!(err.to_string().contains("permute_structure"));
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}

use std::fmt;

/// Failures of the optimization core.  Solver verdicts such as infeasibility are not errors,
/// see [`crate::optimize::Outcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Nonsensical formulation or evaluation parameters, detected before any solving.
    Configuration(String),
    /// Solver variable values do not decode into one simple path per bot.
    Extraction(String),
    /// A route plan violates precedence, capacity, assignment or deadlines.
    InfeasibleRoute(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Error::Extraction(msg) => write!(f, "extraction error: {}", msg),
            Error::InfeasibleRoute(msg) => write!(f, "infeasible route: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

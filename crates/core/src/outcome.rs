/// Result of one pipeline stage.
///
/// Every stage of the sales pipeline completes with a usable value: either the
/// real one, or the stage's documented fallback together with the cause that
/// forced it. Callers that only need the value use [`StageOutcome::value`];
/// tests assert on which path produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum StageOutcome<T> {
    Ok(T),
    Degraded { value: T, cause: String },
}

impl<T> StageOutcome<T> {
    pub fn degraded(value: T, cause: impl Into<String>) -> Self {
        Self::Degraded { value, cause: cause.into() }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { cause, .. } => Some(cause),
        }
    }

    /// Carry an earlier stage's degradation forward into this outcome.
    pub fn with_upstream_cause(self, upstream: Option<String>) -> Self {
        match (self, upstream) {
            (outcome, None) => outcome,
            (Self::Ok(value), Some(cause)) => Self::Degraded { value, cause },
            (Self::Degraded { value, cause }, Some(upstream)) => {
                Self::Degraded { value, cause: format!("{upstream}; {cause}") }
            }
        }
    }
}

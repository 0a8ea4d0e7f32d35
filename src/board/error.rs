pub type EvaluateResult<T> = Result<T, EvaluateError>;

/// Failures of one evaluation round trip. None of them are fatal to the
/// session: the board is left as it was before the call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("evaluation service returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(String),
}

impl EvaluateError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// The request never produced a usable HTTP success.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(EvaluateError::transport("refused")
            .to_string()
            .starts_with("transport error:"));
        assert_eq!(
            EvaluateError::Status(502).to_string(),
            "evaluation service returned status 502"
        );
        assert!(EvaluateError::malformed("x")
            .to_string()
            .starts_with("malformed response:"));
    }

    #[test]
    fn status_counts_as_transport() {
        assert!(EvaluateError::Status(500).is_transport());
        assert!(EvaluateError::transport("x").is_transport());
        assert!(!EvaluateError::malformed("x").is_transport());
        assert!(!EvaluateError::Snapshot("x".into()).is_transport());
    }
}

//! Error taxonomy: transport failures are distinct from device-side
//! command rejections and from local validation failures.

use reqwest::StatusCode;

/// A resource query or command request failed before the terminal produced
/// an application-level answer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not reach terminal: {0}")]
    Http(#[from] reqwest::Error),
    #[error("terminal returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response from terminal: {0}")]
    Malformed(#[source] reqwest::Error),
}

/// A state-changing command failed. `Rejected` carries the terminal's own
/// reason string unmodified.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid command input: {0}")]
    Validation(&'static str),
    #[error("terminal rejected command: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reason_passes_through_unmodified() {
        let err = CommandError::Rejected("PDP context activation denied".into());
        assert_eq!(
            err.to_string(),
            "terminal rejected command: PDP context activation denied"
        );
    }

    #[test]
    fn transport_errors_wrap_client_errors() {
        let err = CommandError::from(ClientError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "tunnel down".into(),
        });
        assert!(matches!(err, CommandError::Transport(_)));
    }
}

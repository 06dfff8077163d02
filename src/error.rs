use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropdeskError {
    #[error("API error: {0}")]
    Api(String),

    /// The envelope came back with `success: false`.
    #[error("{0}")]
    Application(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not read response: {0}")]
    Decode(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("Cannot {action} a follow-up that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PropdeskError {
    /// Application-level failures are "nothing found" rather than "something broke".
    pub fn is_soft(&self) -> bool {
        matches!(self, PropdeskError::Application(_))
    }
}

impl From<reqwest::Error> for PropdeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PropdeskError::Decode(err.to_string())
        } else {
            PropdeskError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PropdeskError {
    fn from(err: serde_json::Error) -> Self {
        PropdeskError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PropdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_errors_are_soft() {
        assert!(PropdeskError::Application("No data found".into()).is_soft());
        assert!(!PropdeskError::Network("timed out".into()).is_soft());
        assert!(!PropdeskError::Api("500: boom".into()).is_soft());
    }

    #[test]
    fn invalid_transition_message() {
        let err = PropdeskError::InvalidTransition {
            action: "delete",
            state: "completed",
        };
        assert_eq!(err.to_string(), "Cannot delete a follow-up that is completed");
    }

    #[test]
    fn json_errors_become_decode() {
        let err: PropdeskError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, PropdeskError::Decode(_)));
    }
}

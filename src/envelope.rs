use serde::{Deserialize, Serialize};

use crate::error::{PropdeskError, Result};

/// Every response body is wrapped in `{success, message, data, httpStatus}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub http_status: Option<u16>,
}

impl<T> Envelope<T> {
    /// `success: false` is an application-level error even on HTTP 200.
    pub fn into_result(self) -> Result<Option<T>> {
        if !self.success {
            let message = if self.message.trim().is_empty() {
                "Request was not successful".to_string()
            } else {
                self.message
            };
            return Err(PropdeskError::Application(message));
        }
        Ok(self.data)
    }

    /// Like `into_result`, but a successful envelope without data is an error too.
    pub fn into_data(self) -> Result<T> {
        self.into_result()?
            .ok_or_else(|| PropdeskError::Decode("response has no data".to_string()))
    }
}

/// `responsePagingModel` from the CRM endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PagingInfo {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_page: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
}

impl PagingInfo {
    pub fn has_next(&self) -> bool {
        match self.next_page {
            Some(next) => next > self.current_page,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_data() {
        let json = r#"{"success": true, "message": "ok", "data": [1, 2, 3], "httpStatus": 200}"#;
        let envelope: Envelope<Vec<u32>> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.http_status, Some(200));
        assert_eq!(envelope.into_data().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn failure_on_http_200_is_application_error() {
        let json = r#"{"success": false, "message": "No property found", "data": null, "httpStatus": 200}"#;
        let envelope: Envelope<Vec<u32>> = serde_json::from_str(json).unwrap();
        match envelope.into_result() {
            Err(PropdeskError::Application(msg)) => assert_eq!(msg, "No property found"),
            other => panic!("expected application error, got {:?}", other),
        }
    }

    #[test]
    fn failure_without_message_gets_generic_text() {
        let json = r#"{"success": false}"#;
        let envelope: Envelope<u32> = serde_json::from_str(json).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Request was not successful");
    }

    #[test]
    fn success_without_data() {
        let json = r#"{"success": true, "message": "deleted"}"#;
        let envelope: Envelope<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.clone().into_result().unwrap(), None);
        assert!(matches!(envelope.into_data(), Err(PropdeskError::Decode(_))));
    }

    #[test]
    fn paging_info_next_page() {
        let json = r#"{"CurrentPage": 2, "TotalPage": 5, "NextPage": 3}"#;
        let info: PagingInfo = serde_json::from_str(json).unwrap();
        assert!(info.has_next());

        let last = PagingInfo {
            current_page: 5,
            total_page: 5,
            next_page: None,
        };
        assert!(!last.has_next());
    }
}

//! DevTools protocol message shapes.

use {
    crate::browser::BrowserError,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Either a reply (`id` set) or an event (`method` set).
#[derive(Debug, Deserialize)]
pub struct Response {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<ErrorResponse>,
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn into_result(self) -> Result<Value, BrowserError> {
        match self.error {
            Some(e) => Err(BrowserError::Protocol {
                code: e.code,
                message: e.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Contents of the `DevToolsActivePort` file Chromium writes into its
/// profile directory once the debugging endpoint is listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePort {
    pub port: u16,
    pub path: String,
}

impl ActivePort {
    pub fn parse(raw: &str) -> Result<Self, BrowserError> {
        let mut lines = raw.lines().map(str::trim);

        let port = lines
            .next()
            .and_then(|l| l.parse().ok())
            .ok_or_else(|| BrowserError::ActivePort(format!("no port in {:?}", raw)))?;
        let path = lines
            .next()
            .filter(|l| l.starts_with('/'))
            .ok_or_else(|| BrowserError::ActivePort(format!("no path in {:?}", raw)))?
            .to_string();

        Ok(ActivePort { port, path })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}{}", self.port, self.path)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn request_omits_empty_fields() {
        let req = Request {
            id: 7,
            method: "Browser.close",
            params: None,
            session_id: None,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"id":7,"method":"Browser.close"}"#
        );
    }

    #[test]
    fn request_carries_session() {
        let req = Request {
            id: 1,
            method: "Page.navigate",
            params: Some(json!({"url": "https://home.nest.com"})),
            session_id: Some("ABC"),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["sessionId"], "ABC");
        assert_eq!(value["params"]["url"], "https://home.nest.com");
    }

    #[test]
    fn error_response_becomes_protocol_error() {
        let resp: Response = serde_json::from_str(
            r#"{"id": 3, "error": {"code": -32000, "message": "No node"}}"#,
        )
        .unwrap();

        match resp.into_result() {
            Err(BrowserError::Protocol { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "No node");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn event_has_no_id() {
        let resp: Response = serde_json::from_str(
            r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.0}}"#,
        )
        .unwrap();
        assert_eq!(resp.id, None);
        assert_eq!(resp.method.as_deref(), Some("Page.loadEventFired"));
    }

    #[test]
    fn active_port_file() {
        let port = ActivePort::parse("40123\n/devtools/browser/5f1c\n").unwrap();
        assert_eq!(port.port, 40123);
        assert_eq!(port.ws_url(), "ws://127.0.0.1:40123/devtools/browser/5f1c");
    }

    #[test]
    fn active_port_file_incomplete() {
        assert!(ActivePort::parse("").is_err());
        assert!(ActivePort::parse("40123\n").is_err());
        assert!(ActivePort::parse("port\n/devtools/browser/x").is_err());
    }
}

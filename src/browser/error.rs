use {std::io, thiserror::Error};

#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started.
    #[error("cannot launch {path}")]
    Launch { path: String, source: io::Error },

    /// The profile directory could not be prepared.
    #[error("cannot prepare profile directory {path}")]
    Profile { path: String, source: io::Error },

    /// The browser exited before its DevTools endpoint came up.
    #[error("browser exited early ({0})")]
    Exited(std::process::ExitStatus),

    #[error("malformed DevToolsActivePort file: {0}")]
    ActivePort(String),

    #[error("websocket error")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("malformed protocol message")]
    Serialization(#[from] serde_json::Error),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("no element matches {0}")]
    ElementNotFound(String),

    #[error("javascript error: {0}")]
    JavaScript(String),

    #[error("timed out {0}")]
    Timeout(String),

    #[error("connection closed")]
    Closed,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

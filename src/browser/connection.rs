use {
    crate::browser::{
        protocol::{Request, Response},
        BrowserError,
    },
    futures::{SinkExt, StreamExt},
    log::{debug, trace},
    serde_json::Value,
    std::time::Duration,
    tokio::{net::TcpStream, time},
    tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream},
};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The browser-level DevTools websocket. Calls are strictly sequential, so a
/// reply is matched by reading until its id shows up; events in between are
/// dropped.
pub struct Connection {
    ws: WsStream,
    next_id: u64,
}

impl Connection {
    pub async fn connect(url: &str) -> Result<Self, BrowserError> {
        debug!("connecting to {}", url);
        let (ws, _) = tokio_tungstenite::connect_async(url).await?;
        Ok(Connection { ws, next_id: 1 })
    }

    pub async fn call(
        &mut self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, BrowserError> {
        let id = self.next_id;
        self.next_id += 1;

        let json = serde_json::to_string(&Request {
            id,
            method,
            params,
            session_id,
        })?;
        trace!("send: {}", json);
        self.ws.send(Message::Text(json.into())).await?;

        time::timeout(CALL_TIMEOUT, self.reply(id))
            .await
            .map_err(|_| BrowserError::Timeout(format!("waiting for {}", method)))?
    }

    async fn reply(&mut self, id: u64) -> Result<Value, BrowserError> {
        while let Some(msg) = self.ws.next().await {
            let text = match msg? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            trace!("recv: {}", text);

            let resp: Response = serde_json::from_str(&text)?;
            if resp.id == Some(id) {
                return resp.into_result();
            }
        }
        Err(BrowserError::Closed)
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

use {
    crate::browser::{connection::Connection, BrowserError},
    log::{debug, trace},
    serde_json::{json, Value},
    std::time::{Duration, Instant},
    tokio::time,
};

const POLL: Duration = Duration::from_millis(100);
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A tab attached through a flat DevTools session.
pub struct Page<'a> {
    conn: &'a mut Connection,
    session_id: String,
}

impl<'a> Page<'a> {
    pub(super) async fn attach(
        conn: &'a mut Connection,
        target_id: &str,
    ) -> Result<Page<'a>, BrowserError> {
        let result = conn
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| BrowserError::InvalidResponse("missing sessionId".to_string()))?
            .to_string();

        let mut page = Page { conn, session_id };
        page.call("Page.enable", None).await?;
        page.call("Runtime.enable", None).await?;

        debug!("attached to target {}", target_id);
        Ok(page)
    }

    async fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value, BrowserError> {
        self.conn.call(method, params, Some(&self.session_id)).await
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("navigating to {}", url);
        let result = self.call("Page.navigate", Some(json!({ "url": url }))).await?;

        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            return Err(BrowserError::Navigation(format!("{}: {}", url, error)));
        }

        self.wait_for_load().await
    }

    async fn wait_for_load(&mut self) -> Result<(), BrowserError> {
        let start = Instant::now();
        loop {
            let state = self.evaluate("document.readyState").await;
            if settled(state, |v| {
                matches!(v.as_str(), Some("interactive") | Some("complete"))
            })? {
                return Ok(());
            }
            if start.elapsed() > LOAD_TIMEOUT {
                return Err(BrowserError::Timeout("waiting for page load".to_string()));
            }
            time::sleep(POLL).await;
        }
    }

    /// Evaluates `expression` in the page and returns its value.
    pub async fn evaluate(&mut self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("unknown error");
            return Err(BrowserError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Polls until an element matching `selector` exists (and, when `visible`
    /// is set, is rendered) or `timeout` passes.
    pub async fn wait_for(
        &mut self,
        selector: &str,
        visible: bool,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        debug!("waiting for {} (visible: {})", selector, visible);
        let script = present_script(selector, visible)?;
        let start = Instant::now();

        loop {
            let present = self.evaluate(&script).await;
            if settled(present, |v| v.as_bool() == Some(true))? {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout(format!("waiting for {}", selector)));
            }
            time::sleep(POLL).await;
        }
    }

    /// Focuses and clicks the first element matching `selector`.
    pub async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        debug!("clicking {}", selector);
        let script = click_script(selector)?;

        match self.evaluate(&script).await?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(BrowserError::ElementNotFound(selector.to_string())),
        }
    }

    /// Sets the value of whatever element has focus.
    pub async fn set_active_value(&mut self, value: &str) -> Result<(), BrowserError> {
        let script = format!(
            "document.activeElement.value = {}",
            serde_json::to_string(value)?
        );
        self.evaluate(&script).await.map(|_| ())
    }

    /// Text content of every element matching `selector`, in document order.
    pub async fn text_contents(&mut self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(e => e.textContent)",
            serde_json::to_string(selector)?
        );
        let value = self.evaluate(&script).await?;

        serde_json::from_value(value)
            .map_err(|e| BrowserError::InvalidResponse(format!("text of {}: {}", selector, e)))
    }
}

/// Decides one round of a polling wait. Script and protocol errors count as
/// not there yet; anything else ends the wait.
fn settled<F>(result: Result<Value, BrowserError>, done: F) -> Result<bool, BrowserError>
where
    F: FnOnce(&Value) -> bool,
{
    match result {
        Ok(value) => Ok(done(&value)),
        Err(e @ BrowserError::Protocol { .. }) | Err(e @ BrowserError::JavaScript(_)) => {
            trace!("still waiting: {}", e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn present_script(selector: &str, visible: bool) -> Result<String, BrowserError> {
    let selector = serde_json::to_string(selector)?;
    Ok(if visible {
        format!(
            "(() => {{ const e = document.querySelector({}); \
             return !!e && e.getClientRects().length > 0; }})()",
            selector
        )
    } else {
        format!("document.querySelector({}) !== null", selector)
    })
}

fn click_script(selector: &str) -> Result<String, BrowserError> {
    Ok(format!(
        "(() => {{ const e = document.querySelector({}); \
         if (!e) return false; e.focus(); e.click(); return true; }})()",
        serde_json::to_string(selector)?
    ))
}

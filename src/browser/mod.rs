//! Driving a Chromium-family browser over the DevTools protocol.
//!
//! The browser is started with `--remote-debugging-port=0`, which makes it
//! pick a free port and record it in `DevToolsActivePort` inside the profile
//! directory. That file is all that is needed to reach the browser websocket.

mod connection;
mod error;
mod page;
mod protocol;

pub use {error::BrowserError, page::Page, protocol::ActivePort};

use {
    connection::Connection,
    log::{debug, info, warn},
    serde_json::json,
    std::{
        path::{Path, PathBuf},
        time::{Duration, Instant},
    },
    tokio::{
        fs,
        process::{Child, Command},
        time,
    },
};

const ACTIVE_PORT_FILE: &str = "DevToolsActivePort";
const STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub browser_path: String,
    pub profile_dir: PathBuf,
    /// Show the window and leave the browser running afterwards.
    pub show: bool,
}

impl LaunchOptions {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--remote-debugging-port=0".to_string(),
            format!("--user-data-dir={}", self.profile_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];
        if !self.show {
            args.push("--headless=new".to_string());
        }
        args.push("about:blank".to_string());
        args
    }
}

pub struct Browser {
    child: Child,
    conn: Connection,
    show: bool,
}

impl Browser {
    pub async fn launch(opts: &LaunchOptions) -> Result<Self, BrowserError> {
        let profile = &opts.profile_dir;
        fs::create_dir_all(profile)
            .await
            .map_err(|source| BrowserError::Profile {
                path: profile.display().to_string(),
                source,
            })?;

        let port_file = profile.join(ACTIVE_PORT_FILE);
        if fs::remove_file(&port_file).await.is_ok() {
            debug!("removed stale {}", port_file.display());
        }

        let args = opts.args();
        info!("starting browser: {} {}", opts.browser_path, args.join(" "));
        let mut child = Command::new(&opts.browser_path)
            .args(&args)
            .kill_on_drop(!opts.show)
            .spawn()
            .map_err(|source| BrowserError::Launch {
                path: opts.browser_path.clone(),
                source,
            })?;

        let port = wait_for_active_port(&mut child, &port_file, STARTUP_TIMEOUT).await?;
        let conn = Connection::connect(&port.ws_url()).await?;
        info!("connected to browser on port {}", port.port);

        Ok(Browser {
            child,
            conn,
            show: opts.show,
        })
    }

    /// Opens a blank tab and attaches to it.
    pub async fn open_page(&mut self) -> Result<Page<'_>, BrowserError> {
        let result = self
            .conn
            .call(
                "Target.createTarget",
                Some(json!({ "url": "about:blank" })),
                None,
            )
            .await?;

        let target_id = result["targetId"]
            .as_str()
            .ok_or_else(|| BrowserError::InvalidResponse("missing targetId".to_string()))?
            .to_string();

        Page::attach(&mut self.conn, &target_id).await
    }

    /// Closes the browser unless it was launched visible.
    pub async fn shutdown(mut self) {
        if self.show {
            info!("leaving browser open");
            self.conn.close().await;
            return;
        }

        if let Err(e) = self.conn.call("Browser.close", None, None).await {
            warn!("Browser.close failed: {}", e);
        }
        self.conn.close().await;

        match time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(Ok(status)) => debug!("browser exited with {}", status),
            _ => {
                warn!("browser did not exit, killing it");
                let _ = self.child.kill().await;
            }
        }
    }
}

/// Waits for the browser to publish its debugging endpoint.
pub async fn wait_for_active_port(
    child: &mut Child,
    port_file: &Path,
    timeout: Duration,
) -> Result<ActivePort, BrowserError> {
    let start = Instant::now();

    loop {
        if let Ok(raw) = fs::read_to_string(port_file).await {
            // The file may be caught half written.
            if let Ok(port) = ActivePort::parse(&raw) {
                return Ok(port);
            }
        }

        if let Ok(Some(status)) = child.try_wait() {
            return Err(BrowserError::Exited(status));
        }

        if start.elapsed() > timeout {
            return Err(BrowserError::Timeout(format!(
                "waiting for {}",
                port_file.display()
            )));
        }

        time::sleep(Duration::from_millis(100)).await;
    }
}

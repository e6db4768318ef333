use std::fs;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub base_url: String,
    _data_dir: tempfile::TempDir,
    _child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Seed the data directory with legacy plaintext records so every
        // integration run also exercises the startup migration. `boss` is the
        // admin used by guarded calls; `pleb`, `legacy` and `viewer` are
        // regular accounts for the auth flows.
        let data_dir = tempfile::tempdir().context("failed to create data dir")?;
        fs::write(
            data_dir.path().join("users.json"),
            r#"[
  {"username": "boss", "password": "boss-pw", "isAdmin": true, "mustChangePassword": false},
  {"username": "pleb", "password": "pleb-pw", "mustChangePassword": false},
  {"username": "legacy", "password": "old-pw"},
  {"username": "viewer", "password": "viewer-pw"}
]"#,
        )?;

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/report-portal-api");
        cmd.env("PORTAL_PORT", port.to_string())
            .env("PORTAL_DATA_DIR", data_dir.path())
            .env("PORTAL_BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            base_url,
            _data_dir: data_dir,
            _child: child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

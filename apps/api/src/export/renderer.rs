//! HTML → PDF rendering through a headless Chromium process.
//!
//! Every render gets its own scratch directory (PDF output, browser profile) that is
//! deleted when the render returns, whichever way it returns. The browser process is
//! killed if the render is dropped or times out.
//!
//! The document is served to the browser from a one-shot loopback HTTP page rather than
//! a `file://` URL, so markup in the posted HTML cannot pull host files into the PDF.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{response::Html, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch browser '{binary}': {source}")]
    Launch {
        binary: String,
        source: std::io::Error,
    },

    #[error("Browser exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Browser did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Browser produced no PDF output")]
    EmptyOutput,

    #[error("Scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pluggable PDF renderer, carried in `AppState` as `Arc<dyn PdfRenderer>`.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Serves one HTML document on `127.0.0.1` under an unguessable path.
/// The server task is aborted when this is dropped.
struct PageServer {
    url: String,
    task: JoinHandle<()>,
}

impl PageServer {
    async fn start(html: &str) -> Result<Self, RenderError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr: SocketAddr = listener.local_addr()?;
        let route = format!("/{}.html", Uuid::new_v4());

        let page: Arc<str> = Arc::from(html);
        let app = Router::new().route(
            &route,
            get(move || {
                let page = page.clone();
                async move { Html(page.to_string()) }
            }),
        );

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("PDF page server stopped: {e}");
            }
        });

        Ok(Self {
            url: format!("http://{addr}{route}"),
            task,
        })
    }
}

impl Drop for PageServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct ChromiumRenderer {
    binary: String,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl ChromiumRenderer {
    /// `extra_args` are placed before the generated flags.
    pub fn new(binary: String, extra_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            binary,
            extra_args,
            timeout,
        }
    }

    fn command(&self, url: &str, output: &Path, profile: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(&self.extra_args)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--user-data-dir={}", profile.display()))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let scratch = tempfile::tempdir()?;
        let output = scratch.path().join("document.pdf");
        let profile = scratch.path().join("profile");

        let page = PageServer::start(html).await?;

        let child = self
            .command(&page.url, &output, &profile)
            .spawn()
            .map_err(|source| RenderError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        let finished = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))??;
        drop(page);

        if !finished.status.success() {
            let stderr = String::from_utf8_lossy(&finished.stderr);
            return Err(RenderError::Failed {
                status: finished.status.to_string(),
                stderr: stderr.trim().chars().take(500).collect(),
            });
        }

        let pdf = match tokio::fs::read(&output).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::EmptyOutput)
            }
            Err(e) => return Err(e.into()),
        };
        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        debug!("Rendered {} bytes of HTML into {} bytes of PDF", html.len(), pdf.len());
        Ok(pdf)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Runs `script` through `sh -c`; the browser flags arrive as `$1..`.
    fn shell_renderer(script: &str, timeout: Duration) -> ChromiumRenderer {
        ChromiumRenderer::new(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string(), "chromium".to_string()],
            timeout,
        )
    }

    const FAKE_BROWSER: &str = r#"for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) printf '%%PDF-1.4 fake' > "${arg#--print-to-pdf=}" ;;
  esac
done"#;

    #[tokio::test]
    async fn test_render_reads_browser_output() {
        let renderer = shell_renderer(FAKE_BROWSER, Duration::from_secs(10));
        let pdf = renderer.render("<h1>RAMS</h1>").await.unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let renderer = ChromiumRenderer::new(
            "/nonexistent/chromium-for-tests".to_string(),
            vec![],
            Duration::from_secs(5),
        );
        let err = renderer.render("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, RenderError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure_with_stderr() {
        let renderer = shell_renderer("echo 'no display' >&2; exit 3", Duration::from_secs(5));
        match renderer.render("<p>x</p>").await.unwrap_err() {
            RenderError::Failed { stderr, .. } => assert_eq!(stderr, "no display"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_without_file_is_empty_output() {
        let renderer = shell_renderer("exit 0", Duration::from_secs(5));
        let err = renderer.render("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, RenderError::EmptyOutput));
    }

    #[tokio::test]
    async fn test_hung_browser_times_out() {
        let renderer = shell_renderer("exec sleep 10", Duration::from_millis(200));
        let err = renderer.render("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout(d) if d == Duration::from_millis(200)));
        assert_eq!(err.to_string(), "Browser did not finish within 200ms");
    }

    /// Fake browser that writes its arguments, one per line, to `record` and then runs `tail`.
    fn recording_renderer(record: &Path, tail: &str, timeout: Duration) -> ChromiumRenderer {
        let script = format!(
            r#"for arg in "$@"; do printf '%s\n' "$arg" >> '{}'; done; {tail}"#,
            record.display()
        );
        shell_renderer(&script, timeout)
    }

    fn recorded_scratch_dir(record: &Path) -> std::path::PathBuf {
        let args = std::fs::read_to_string(record).unwrap();
        let profile = args
            .lines()
            .find_map(|a| a.strip_prefix("--user-data-dir="))
            .expect("browser received --user-data-dir");
        Path::new(profile).parent().unwrap().to_path_buf()
    }

    #[tokio::test]
    async fn test_document_is_served_over_loopback_http() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("args");
        let renderer = recording_renderer(&record, "exit 0", Duration::from_secs(5));

        let _ = renderer.render("<p>x</p>").await;

        let args = std::fs::read_to_string(&record).unwrap();
        let url = args.lines().last().unwrap();
        assert!(url.starts_with("http://127.0.0.1:"), "got {url}");
        assert!(!args.contains("file://"));
    }

    #[tokio::test]
    async fn test_page_server_serves_only_its_own_path() {
        let page = PageServer::start("<h1>COSHH</h1>").await.unwrap();
        let body = reqwest::get(&page.url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "<h1>COSHH</h1>");

        let missing = page.url.replace(".html", "-other.html");
        let status = reqwest::get(&missing).await.unwrap().status();
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scratch_dir_removed_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("args");
        let renderer = recording_renderer(&record, "exec sleep 10", Duration::from_millis(500));

        let err = renderer.render("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout(_)));

        let scratch = recorded_scratch_dir(&record);
        assert!(!scratch.exists(), "{} was left behind", scratch.display());
    }

    #[tokio::test]
    async fn test_scratch_dir_removed_after_browser_failure() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("args");
        let renderer = recording_renderer(&record, "exit 3", Duration::from_secs(5));

        let err = renderer.render("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, RenderError::Failed { .. }));

        let scratch = recorded_scratch_dir(&record);
        assert!(!scratch.exists(), "{} was left behind", scratch.display());
    }
}

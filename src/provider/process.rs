//! External tool execution
//!
//! Every tool runs with `LC_ALL=C` so number formatting is stable. Children
//! are killed when the run deadline passes or the run is cancelled, and are
//! always reaped, whichever way the call returns.

use super::traits::{ProbeError, ProbeResult};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared flag that aborts every in-flight and future tool run
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Deadline and cancellation shared by all tool runs of one invocation
#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl RunLimits {
    /// No deadline, fresh cancel token
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Captured result of a finished tool
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr; ffmpeg reports on stderr, aubio on stdout
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }

    /// Turn a non-zero exit into [`ProbeError::Failed`]
    pub fn require_success(self, tool: &str) -> ProbeResult<Self> {
        if self.status.success() {
            return Ok(self);
        }
        let detail = self.stderr.lines().last().unwrap_or_default().trim().to_string();
        Err(ProbeError::Failed {
            tool: tool.to_string(),
            status: self.status.to_string(),
            detail,
        })
    }
}

/// Kills (if still running) and reaps the child on drop
struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Run `program` to completion within `limits`
pub fn run_tool<I, S>(program: &Path, args: I, limits: &RunLimits) -> ProbeResult<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program.display().to_string();
    if limits.cancel.is_cancelled() {
        return Err(ProbeError::Cancelled(tool));
    }

    let child = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ProbeError::ToolMissing(tool.clone()),
            _ => ProbeError::Spawn {
                tool: tool.clone(),
                source,
            },
        })?;
    let mut guard = ChildGuard { child };

    let stdout = guard.child.stdout.take().map(drain);
    let stderr = guard.child.stderr.take().map(drain);

    let status = loop {
        let polled = guard.child.try_wait().map_err(|source| ProbeError::Spawn {
            tool: tool.clone(),
            source,
        })?;
        if let Some(status) = polled {
            break status;
        }
        if limits.cancel.is_cancelled() {
            log::debug!("Cancelling {}", tool);
            return Err(ProbeError::Cancelled(tool));
        }
        if limits.expired() {
            log::debug!("Deadline passed, killing {}", tool);
            return Err(ProbeError::TimedOut(tool));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let collect = |handle: Option<JoinHandle<String>>| {
        handle.and_then(|h| h.join().ok()).unwrap_or_default()
    };
    Ok(ToolOutput {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// Resolve `program` the way the shell would, without running it
pub fn locate(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    #[test]
    fn test_captures_both_streams() {
        let output = run_tool(&sh(), ["-c", "echo out; echo err >&2"], &RunLimits::new()).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[test]
    fn test_sets_c_locale() {
        let output = run_tool(&sh(), ["-c", "echo $LC_ALL"], &RunLimits::new()).unwrap();
        assert_eq!(output.stdout.trim(), "C");
    }

    #[test]
    fn test_non_zero_exit() {
        let output = run_tool(&sh(), ["-c", "echo boom >&2; exit 3"], &RunLimits::new()).unwrap();
        let err = output.require_success("sh").unwrap_err();
        assert!(matches!(err, ProbeError::Failed { ref detail, .. } if detail == "boom"));
    }

    #[test]
    fn test_missing_tool() {
        let err = run_tool(
            Path::new("definitely-not-a-real-tool-xyz"),
            Vec::<&str>::new(),
            &RunLimits::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::ToolMissing(_)));
    }

    #[test]
    fn test_timeout_kills_child() {
        let limits = RunLimits::new().with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let err = run_tool(&sh(), ["-c", "sleep 5"], &limits).unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let limits = RunLimits::new().with_cancel(token);
        let err = run_tool(&sh(), ["-c", "echo never"], &limits).unwrap_err();
        assert!(matches!(err, ProbeError::Cancelled(_)));
    }

    #[test]
    fn test_cancel_in_flight() {
        let token = CancelToken::new();
        let limits = RunLimits::new().with_cancel(token.clone());
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            token.cancel();
        });
        let started = Instant::now();
        let err = run_tool(&sh(), ["-c", "sleep 5"], &limits).unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(err, ProbeError::Cancelled(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_locate() {
        assert_eq!(locate(&sh()), Some(sh()));
        assert!(locate(Path::new("definitely-not-a-real-tool-xyz")).is_none());
    }
}

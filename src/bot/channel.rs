//! Process-backed bot channel.
//!
//! The bot's stdout and stderr are drained by two detached capture threads
//! from the moment the process starts, so the bot never blocks on a full
//! pipe. Every stdout line replaces the pending reply and wakes the waiting
//! referee through a condition variable.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::transport::{ChannelLog, Transport};

/// Output lines containing this marker are dropped from the capture.
pub const NOISE_MARKER: &str = "VM warning";

/// Characters kept per captured stream; later lines are discarded.
pub const CAPTURE_LIMIT: usize = 1_000_000;

#[derive(Debug, Default)]
struct PendingState {
    line: Option<String>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Pending {
    state: Mutex<PendingState>,
    ready: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running bot process.
pub struct BotChannel {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    pending: Arc<Pending>,
    stdout: Arc<Mutex<String>>,
    stderr: Arc<Mutex<String>>,
    log: ChannelLog,
}

impl BotChannel {
    /// Spawns `command` with piped stdio and starts the capture threads.
    pub fn spawn(name: &str, mut command: Command) -> io::Result<Self> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take();
        let pending = Arc::new(Pending::default());
        let stdout = Arc::new(Mutex::new(String::new()));
        let stderr = Arc::new(Mutex::new(String::new()));

        if let Some(out) = child.stdout.take() {
            capture(format!("{}-stdout", name), out, stdout.clone(), Some(pending.clone()))?;
        }
        if let Some(err) = child.stderr.take() {
            capture(format!("{}-stderr", name), err, stderr.clone(), None)?;
        }

        debug!(channel = name, pid = child.id(), "bot process started");
        Ok(BotChannel {
            child: Some(child),
            stdin,
            pending,
            stdout,
            stderr,
            log: ChannelLog::new(name),
        })
    }

    /// Runs `command_line` through `sh -c`.
    pub fn from_shell(name: &str, command_line: &str) -> io::Result<Self> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_line);
        Self::spawn(name, command)
    }

    /// Everything captured from stdout so far.
    pub fn stdout(&self) -> String {
        lock(&self.stdout).clone()
    }

    /// Everything captured from stderr so far.
    pub fn stderr(&self) -> String {
        lock(&self.stderr).clone()
    }
}

impl Transport for BotChannel {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "bot input is closed"))?;
        writeln!(stdin, "{}", line)?;
        stdin.flush()
    }

    fn wait_line(&mut self, timeout: Option<Duration>) -> Option<String> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = lock(&self.pending.state);
        loop {
            if let Some(line) = state.line.take() {
                return Some(line);
            }
            if state.closed {
                return None;
            }
            state = match deadline {
                None => self
                    .pending
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.pending
                        .ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    fn terminate(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(channel = %self.log.name(), error = %e, "kill failed (process already exited?)");
            }
            match child.wait() {
                Ok(status) => debug!(channel = %self.log.name(), %status, "bot process stopped"),
                Err(e) => warn!(channel = %self.log.name(), error = %e, "waiting for bot process failed"),
            }
        }
    }

    fn log(&self) -> &ChannelLog {
        &self.log
    }

    fn log_mut(&mut self) -> &mut ChannelLog {
        &mut self.log
    }
}

impl Drop for BotChannel {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Starts a detached thread copying `source` into `buffer` line by line,
/// publishing each line to `pending` when given.
fn capture<R: Read + Send + 'static>(
    thread_name: String,
    source: R,
    buffer: Arc<Mutex<String>>,
    pending: Option<Arc<Pending>>,
) -> io::Result<()> {
    thread::Builder::new().name(thread_name).spawn(move || {
        let mut reader = BufReader::new(source);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(&['\n', '\r'][..]);
            if line.contains(NOISE_MARKER) {
                continue;
            }
            {
                let mut captured = lock(&buffer);
                if captured.len() >= CAPTURE_LIMIT {
                    continue;
                }
                captured.push_str(line);
                captured.push('\n');
            }
            if let Some(pending) = &pending {
                lock(&pending.state).line = Some(line.to_string());
                pending.ready.notify_all();
            }
        }
        if let Some(pending) = &pending {
            lock(&pending.state).closed = true;
            pending.ready.notify_all();
        }
    })?;
    Ok(())
}

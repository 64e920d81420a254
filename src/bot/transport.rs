//! The line transport between the referee and one bot.
//!
//! [`Transport`] has two primitives (write a line, wait for a line) plus the
//! bookkeeping every implementation shares: the communication log, the
//! error log, timeout strikes and the permanent skip once a bot has timed
//! out more than [`MAX_ERRORS`] times.

use std::fmt;
use std::io;
use std::time::Duration;

use tracing::{debug, warn};

/// Timeouts tolerated before a bot is skipped for the rest of the match.
pub const MAX_ERRORS: u32 = 2;

/// Reply a bot sends when it has nothing to do (compared case-insensitively).
pub const NO_MOVES: &str = "No moves";

/// Direction tag of a communication log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Referee to bot.
    Outgoing,
    /// Bot to referee.
    Incoming,
    /// Transport failure.
    Failure,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Outgoing => "->",
            Direction::Incoming => "<-",
            Direction::Failure => "!!",
        })
    }
}

/// Ordered diagnostics for one channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelLog {
    name: String,
    communication: Vec<String>,
    errors: Vec<String>,
    strikes: u32,
    skipped: bool,
}

impl ChannelLog {
    pub fn new(name: impl Into<String>) -> Self {
        ChannelLog {
            name: name.into(),
            ..ChannelLog::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends `<dir> [<name>] '<message>'`.
    pub fn record(&mut self, direction: Direction, message: &str) {
        let entry = format!("{} [{}] '{}'", direction, self.name, message);
        debug!(channel = %self.name, "{}", entry);
        self.communication.push(entry);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(channel = %self.name, "{}", message);
        self.errors.push(message);
    }

    /// Charges a timeout strike. Returns true when this strike exceeds
    /// [`MAX_ERRORS`] and the channel becomes skipped.
    pub fn strike(&mut self, timeout: Option<Duration>) -> bool {
        self.record(Direction::Incoming, "<timeout>");
        let waited = timeout.map_or(0, |t| t.as_millis());
        self.error(format!(
            "Response timed out after {}ms (return 'No moves' instead of nothing or play faster)",
            waited
        ));
        self.strikes += 1;
        if self.strikes > MAX_ERRORS && !self.skipped {
            self.error(format!(
                "Maximum number ({}) of time-outs reached: skipping all moves.",
                MAX_ERRORS
            ));
            self.skipped = true;
            return true;
        }
        false
    }

    pub fn communication(&self) -> &[String] {
        &self.communication
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }
}

/// A bidirectional line channel to one bot.
///
/// Implementors provide the three primitives; `send`, `receive` and
/// `shutdown` carry the shared bookkeeping and should not be overridden.
pub trait Transport: Send {
    /// Writes `line` plus a newline.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Blocks until the bot produces a line or `timeout` elapses (`None`
    /// waits without limit). Only the most recent unread line is kept.
    fn wait_line(&mut self, timeout: Option<Duration>) -> Option<String>;

    /// Stops the bot. Must be idempotent.
    fn terminate(&mut self);

    fn log(&self) -> &ChannelLog;

    fn log_mut(&mut self) -> &mut ChannelLog;

    /// Best-effort send. Write failures are logged, never returned.
    fn send(&mut self, line: &str) {
        if self.log().is_skipped() {
            return;
        }
        self.log_mut().record(Direction::Outgoing, line);
        if let Err(e) = self.write_line(line) {
            let log = self.log_mut();
            log.error(format!("Writing to bot failed: {}", e));
            log.record(Direction::Failure, "Writing to bot failed");
        }
    }

    /// The bot's next reply, or an empty string on timeout, on a
    /// `No moves` reply, or once the channel is skipped.
    fn receive(&mut self, timeout: Option<Duration>) -> String {
        if self.log().is_skipped() {
            self.log_mut()
                .record(Direction::Incoming, "<skipping player - too many errors>");
            return String::new();
        }

        match self.wait_line(timeout) {
            Some(line) if line.trim().eq_ignore_ascii_case(NO_MOVES) => {
                self.log_mut().record(Direction::Incoming, "<no moves>");
                String::new()
            }
            Some(line) => {
                self.log_mut().record(Direction::Incoming, &line);
                line
            }
            None => {
                if self.log_mut().strike(timeout) {
                    self.terminate();
                }
                String::new()
            }
        }
    }

    fn is_skipped(&self) -> bool {
        self.log().is_skipped()
    }

    fn shutdown(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_direction_and_name() {
        let mut log = ChannelLog::new("bot1");
        log.record(Direction::Outgoing, "go place_armies 10000");
        log.record(Direction::Incoming, "bot1 place_armies 1 5");
        log.record(Direction::Failure, "Writing to bot failed");
        assert_eq!(
            log.communication(),
            &[
                "-> [bot1] 'go place_armies 10000'".to_string(),
                "<- [bot1] 'bot1 place_armies 1 5'".to_string(),
                "!! [bot1] 'Writing to bot failed'".to_string(),
            ]
        );
    }

    #[test]
    fn third_strike_skips() {
        let mut log = ChannelLog::new("bot1");
        let t = Some(Duration::from_millis(5));
        assert!(!log.strike(t));
        assert!(!log.strike(t));
        assert!(!log.is_skipped());
        assert!(log.strike(t));
        assert!(log.is_skipped());
        assert_eq!(log.strikes(), 3);
        // already skipped: further strikes do not re-trigger teardown
        assert!(!log.strike(t));
        assert!(log.errors().iter().any(|e| e.contains("skipping all moves")));
    }
}

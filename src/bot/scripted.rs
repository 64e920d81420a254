//! In-process transport driven by a closure.
//!
//! The responder sees every line the referee sends and may answer with a
//! reply; a request that got no answer behaves like a timeout (a strike is
//! charged immediately, no time passes). Used to run whole matches in
//! tests without spawning processes.

use std::io;
use std::time::Duration;

use super::transport::{ChannelLog, Transport};

type Responder = Box<dyn FnMut(&str) -> Option<String> + Send>;

/// A bot simulated by a function from incoming line to optional reply.
pub struct ScriptedTransport {
    responder: Responder,
    pending: Option<String>,
    terminated: bool,
    log: ChannelLog,
}

impl ScriptedTransport {
    pub fn new<F>(name: &str, responder: F) -> Self
    where
        F: FnMut(&str) -> Option<String> + Send + 'static,
    {
        ScriptedTransport {
            responder: Box::new(responder),
            pending: None,
            terminated: false,
            log: ChannelLog::new(name),
        }
    }

    /// A bot that never answers.
    pub fn silent(name: &str) -> Self {
        Self::new(name, |_| None)
    }

    /// A bot that answers every request with the same reply.
    pub fn constant(name: &str, reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(name, move |line| is_request(line).then(|| reply.clone()))
    }

    /// A bot that answers successive requests with `replies` in order and
    /// then stops answering.
    pub fn from_replies<I, S>(name: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut replies: std::collections::VecDeque<String> =
            replies.into_iter().map(Into::into).collect();
        Self::new(name, move |line| {
            if is_request(line) {
                replies.pop_front()
            } else {
                None
            }
        })
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// True for lines that expect a reply.
pub fn is_request(line: &str) -> bool {
    line.starts_with("go ") || line.starts_with("pick_starting_region")
}

impl Transport for ScriptedTransport {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.terminated {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "bot input is closed"));
        }
        if let Some(reply) = (self.responder)(line) {
            self.pending = Some(reply);
        }
        Ok(())
    }

    fn wait_line(&mut self, _timeout: Option<Duration>) -> Option<String> {
        self.pending.take()
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.pending = None;
    }

    fn log(&self) -> &ChannelLog {
        &self.log
    }

    fn log_mut(&mut self) -> &mut ChannelLog {
        &mut self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_follow_requests() {
        let mut bot = ScriptedTransport::from_replies("bot1", ["1 2", "bot1 place_armies 1 5"]);
        bot.send("settings your_bot bot1");
        bot.send("pick_starting_region 10000");
        assert_eq!(bot.receive(None), "1 2");
        bot.send("go place_armies 10000");
        assert_eq!(bot.receive(None), "bot1 place_armies 1 5");
    }

    #[test]
    fn unanswered_requests_strike_out() {
        let mut bot = ScriptedTransport::silent("bot1");
        for _ in 0..3 {
            bot.send("go attack/transfer 10000");
            assert_eq!(bot.receive(Some(Duration::from_millis(100))), "");
        }
        assert!(bot.is_skipped());
        assert!(bot.is_terminated());
        assert_eq!(bot.log().strikes(), 3);
    }

    #[test]
    fn constant_no_moves_is_empty_reply() {
        let mut bot = ScriptedTransport::constant("bot1", "No moves");
        bot.send("go place_armies 5");
        assert_eq!(bot.receive(None), "");
        assert_eq!(bot.log().strikes(), 0);
    }
}

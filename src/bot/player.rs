//! A bot channel with a name, a time bank and a per-round deploy budget.

use std::time::{Duration, Instant};

use crate::board::Settings;

use super::transport::Transport;

/// One side of the match.
pub struct Player {
    name: String,
    transport: Box<dyn Transport>,
    time_bank: u64,
    max_time_bank: u64,
    time_per_move: u64,
    /// Armies still to be placed this round.
    pub armies_left: u32,
}

impl Player {
    /// Creates a player with a full time bank.
    pub fn new(name: impl Into<String>, transport: Box<dyn Transport>, settings: &Settings) -> Self {
        Player {
            name: name.into(),
            transport,
            time_bank: settings.max_time_bank,
            max_time_bank: settings.max_time_bank,
            time_per_move: settings.time_per_move,
            armies_left: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remaining time bank in milliseconds.
    pub fn time_bank(&self) -> u64 {
        self.time_bank
    }

    pub fn send(&mut self, line: &str) {
        self.transport.send(line);
    }

    /// Waits for the bot's reply for at most the current time bank, then
    /// charges the elapsed time and grants the per-move bonus.
    pub fn request(&mut self) -> String {
        let started = Instant::now();
        let reply = self
            .transport
            .receive(Some(Duration::from_millis(self.time_bank)));
        self.charge(started.elapsed().as_millis() as u64);
        reply
    }

    /// `bank = min(max(bank - elapsed, 0) + per_move, max_bank)`
    pub fn charge(&mut self, elapsed_ms: u64) {
        self.time_bank = self
            .time_bank
            .saturating_sub(elapsed_ms)
            .saturating_add(self.time_per_move)
            .min(self.max_time_bank);
    }

    pub fn is_skipped(&self) -> bool {
        self.transport.is_skipped()
    }

    pub fn shutdown(&mut self) {
        self.transport.shutdown();
    }

    pub fn communication_log(&self) -> &[String] {
        self.transport.log().communication()
    }

    pub fn error_log(&self) -> &[String] {
        self.transport.log().errors()
    }

    pub fn strikes(&self) -> u32 {
        self.transport.log().strikes()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.name)
            .field("time_bank", &self.time_bank)
            .field("armies_left", &self.armies_left)
            .field("skipped", &self.is_skipped())
            .finish()
    }
}

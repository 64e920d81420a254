//! Bot processes and the players that wrap them.
//!
//! A [`Transport`] carries lines to and from one bot; [`BotChannel`] runs a
//! real process, [`ScriptedTransport`] simulates one in-process. A
//! [`Player`] adds the name and the time bank.

pub mod channel;
pub mod player;
pub mod scripted;
pub mod transport;

pub use channel::BotChannel;
pub use player::Player;
pub use scripted::ScriptedTransport;
pub use transport::{ChannelLog, Direction, Transport, MAX_ERRORS, NO_MOVES};

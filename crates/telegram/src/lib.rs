//! Telegram transport for brewbot.
//!
//! Thin I/O plumbing around the Bot API: a reqwest client (`api`), a
//! long-poll update runner with reconnect backoff (`poller`), an event
//! dispatcher (`events`), and command parsing/rendering (`commands`).
//! Pipeline decisions live in `brewbot-agent`; this crate only moves text.

pub mod api;
pub mod commands;
pub mod events;
pub mod poller;

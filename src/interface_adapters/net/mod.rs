// Network adapter modules split by client sockets vs read-only HTTP routes.

pub mod client;
pub mod records;

pub use client::{WsLink, ws_handler};
pub use records::{leaderboard_handler, matches_handler};

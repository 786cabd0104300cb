//! Client-side chat plumbing for a game connection: decoding inbound chat
//! into styled runs and rate-limiting outbound chat.

pub mod app;
pub mod core;
pub mod events;
pub mod models;
pub mod utils;

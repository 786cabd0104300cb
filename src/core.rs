pub mod chat;
pub mod decoder;
pub mod outbound;

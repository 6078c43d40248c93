pub mod chat;
pub mod context;
pub mod images;
pub mod oneshot;

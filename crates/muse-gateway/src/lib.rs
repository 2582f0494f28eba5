//! Real-time delivery of messaging events over WebSocket.

pub mod connection;
pub mod dispatcher;

pub use dispatcher::Dispatcher;

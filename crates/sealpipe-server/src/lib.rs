//! sealpipe echo responder.
//!
//! Accepts raw connections from any [`sealpipe_core::Acceptor`], runs the
//! responder handshake on each and echoes every decrypted message back under
//! the same session key.
//!
//! Every connection runs on its own task and owns its keys. A failure on one
//! connection is logged and closes only that connection, including one that
//! fails while being accepted. Only a failing listener stops the server.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use connection::echo;
pub use error::{ConnectionError, ServerError};
pub use server::Server;

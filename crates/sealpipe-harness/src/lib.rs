//! Deterministic simulation harness for sealpipe.
//!
//! Turmoil-backed [`Acceptor`](sealpipe_core::Acceptor) and
//! [`Connector`](sealpipe_core::Connector) implementations, so the real
//! handshake, stream adapters and echo server run over a simulated network
//! with controllable latency and partitions. [`TamperWriter`] corrupts a
//! chosen outbound byte to exercise authentication failures end to end.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_transport;
pub mod tamper;

pub use sim_transport::{SimAcceptor, SimConnector};
pub use tamper::{TamperConnector, TamperWriter};

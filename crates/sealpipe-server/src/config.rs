//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

use sealpipe_core::{ConfigError, StreamConfig, config::DEFAULT_MAX_MESSAGE_SIZE};

/// Echo server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind when using [`crate::Server::bind`]
    pub listen: SocketAddr,
    /// Limits for every secure stream
    pub stream: StreamConfig,
    /// Size of the per-connection receive buffer. Messages longer than this
    /// fail the connection.
    pub echo_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            stream: StreamConfig::default(),
            echo_buffer_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Config listening on `0.0.0.0:port` with default limits.
    pub fn with_port(port: u16) -> Self {
        Self { listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), ..Self::default() }
    }

    /// Check limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream.validate()?;
        if self.echo_buffer_size == 0 {
            return Err(ConfigError::ZeroSize { name: "echo_buffer_size" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_ephemeral_port() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.port(), 0);
        assert!(config.listen.ip().is_unspecified());
        assert_eq!(config.echo_buffer_size, config.stream.max_message_size);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn with_port_keeps_defaults() {
        let config = ServerConfig::with_port(4000);
        assert_eq!(config.listen.port(), 4000);
        assert_eq!(config.stream, StreamConfig::default());
    }

    #[test]
    fn zero_echo_buffer_rejected() {
        let config = ServerConfig { echo_buffer_size: 0, ..ServerConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSize { name: "echo_buffer_size" }));
    }

    #[test]
    fn stream_limits_are_checked() {
        let config = ServerConfig {
            stream: StreamConfig { max_message_size: usize::MAX },
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MessageSizeTooLarge { .. })));
    }
}

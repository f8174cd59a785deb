use std::time::Duration;

use barrage_frame::DEFAULT_MAX_BODY;

use crate::message::DEFAULT_GROUP_ID;

/// Public barrage server endpoint.
pub const DEFAULT_SERVER_ADDR: &str = "openbarrage.douyutv.com:8601";

/// Heartbeat period expected by the server.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for one room session.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// `host:port` of the barrage server.
    pub server_addr: String,
    /// Time between heartbeats once logged in.
    pub heartbeat_interval: Duration,
    /// Dial timeout. `None` leaves it to the platform.
    pub connect_timeout: Option<Duration>,
    /// Maximum inbound frame body size in bytes.
    pub max_body_size: usize,
    /// Group id sent in the join-group request.
    pub group_id: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            connect_timeout: None,
            max_body_size: DEFAULT_MAX_BODY,
            group_id: DEFAULT_GROUP_ID.to_string(),
        }
    }
}

impl RoomConfig {
    /// Override the server address.
    pub fn with_server_addr(mut self, addr: impl Into<String>) -> Self {
        self.server_addr = addr.into();
        self
    }

    /// Override the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set a dial timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Override the maximum inbound body size.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Override the join-group id.
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_server() {
        let config = RoomConfig::default();
        assert_eq!(config.server_addr, "openbarrage.douyutv.com:8601");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.group_id, "-9999");
        assert!(config.connect_timeout.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let config = RoomConfig::default()
            .with_server_addr("127.0.0.1:9000")
            .with_heartbeat_interval(Duration::from_millis(50))
            .with_connect_timeout(Duration::from_secs(1))
            .with_max_body_size(1024)
            .with_group_id("1");
        assert_eq!(config.server_addr, "127.0.0.1:9000");
        assert_eq!(config.heartbeat_interval, Duration::from_millis(50));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.group_id, "1");
    }
}

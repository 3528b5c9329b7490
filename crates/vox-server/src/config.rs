use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

fn default_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_max_players() -> u32 {
    20
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            max_players: default_max_players(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// World seed. 0 picks a random seed at startup.
    #[serde(default)]
    pub seed: i64,
    /// Chunks are proactively unloaded for a client once they fall this many
    /// chunks outside the client's view.
    #[serde(default = "default_view_radius")]
    pub view_radius: i32,
}

fn default_view_radius() -> i32 {
    8
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: 0,
            view_radius: default_view_radius(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    /// Seconds between server keep-alive probes.
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval: u64,
    /// Seconds of silence before a session is force-disconnected.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

fn default_keep_alive_interval() -> u64 {
    15
}

fn default_connection_timeout() -> u64 {
    30
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            keep_alive_interval: default_keep_alive_interval(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [server]
            address = "127.0.0.1"
            port = 25566
            max_players = 8

            [world]
            seed = 1234
            view_radius = 6

            [network]
            keep_alive_interval = 10
            connection_timeout = 20

            [logging]
            level = "debug"
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.address, "127.0.0.1");
        assert_eq!(config.server.port, 25566);
        assert_eq!(config.server.max_players, 8);
        assert_eq!(config.world.seed, 1234);
        assert_eq!(config.world.view_radius, 6);
        assert_eq!(config.network.keep_alive_interval, 10);
        assert_eq!(config.network.connection_timeout, 20);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_sections_get_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 25565);
        assert_eq!(config.server.max_players, 20);
        assert_eq!(config.world.seed, 0);
        assert_eq!(config.world.view_radius, 8);
        assert_eq!(config.network.keep_alive_interval, 15);
        assert_eq!(config.network.connection_timeout, 30);
        assert_eq!(config.logging.level, "info");
    }
}

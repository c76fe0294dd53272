use serde::Deserialize;
use std::path::Path;

use mcc_rs_game::{Rank, WorldPolicy};
use mcc_rs_proto::extension::Extension;
use mcc_rs_world::{BlockDefinition, Dimensions};

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub permissions: PermissionsSection,
    #[serde(default)]
    pub extensions: ExtensionsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_motd")]
    pub motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Seconds between liveness pings.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    /// Outbound packets buffered per connection before it is dropped.
    #[serde(default = "default_send_queue_len")]
    pub send_queue_len: usize,
}

fn default_address() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    25565
}
fn default_name() -> String {
    "MCC-RS Server".into()
}
fn default_motd() -> String {
    "Welcome!".into()
}
fn default_max_players() -> usize {
    64
}
fn default_ping_interval() -> u64 {
    2
}
fn default_send_queue_len() -> usize {
    4096
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            name: default_name(),
            motd: default_motd(),
            max_players: default_max_players(),
            ping_interval_secs: default_ping_interval(),
            send_queue_len: default_send_queue_len(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// Name of the world players join on login.
    #[serde(default = "default_world_name")]
    pub name: String,
    #[serde(default = "default_width")]
    pub width: i16,
    #[serde(default = "default_height")]
    pub height: i16,
    #[serde(default = "default_width")]
    pub length: i16,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub join_rank: Rank,
    #[serde(default)]
    pub build_rank: Rank,
    /// gzip level used when streaming worlds, 0-9.
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
    /// Custom blocks defined in every world created at start-up.
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

fn default_world_name() -> String {
    "main".into()
}
fn default_width() -> i16 {
    128
}
fn default_height() -> i16 {
    64
}
fn default_capacity() -> usize {
    64
}
fn default_compression_level() -> u32 {
    6
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            width: default_width(),
            height: default_height(),
            length: default_width(),
            capacity: default_capacity(),
            join_rank: Rank::Guest,
            build_rank: Rank::Guest,
            compression_level: default_compression_level(),
            blocks: Vec::new(),
        }
    }
}

impl WorldSection {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height, self.length)
    }

    pub fn policy(&self) -> WorldPolicy {
        WorldPolicy {
            capacity: self.capacity,
            join_rank: self.join_rank,
            build_rank: self.build_rank,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionsSection {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub operators: Vec<String>,
    #[serde(default)]
    pub builders: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtensionsSection {
    /// Extensions never offered to clients.
    #[serde(default)]
    pub disabled: Vec<Extension>,
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

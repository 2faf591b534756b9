use anyhow::{ Context, Result };
use notify::{ Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher };
use parking_lot::RwLock;
use serde::{ Deserialize, Serialize };
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "PDCFLAG_CONFIG";

/// Configuration shared by the plugin and the bridge
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PdcConfig {
    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub plugin: PluginConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub automation: AutomationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Well-known channel name both processes agree on
    #[serde(default = "default_channel_name")]
    pub name: String,

    /// Directory holding the socket file (Unix only, defaults to temp dir)
    #[serde(default)]
    pub socket_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginConfig {
    /// How long the last rendered callsign may stand in for an unattributed click
    #[serde(default = "default_hint_window_ms")]
    pub hint_window_ms: u64,

    /// Colour of flagged cells (RGB)
    #[serde(default = "default_flagged_color")]
    pub flagged_color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Larger payloads are discarded as malformed
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Time allowed for a client to write its message and close
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutomationConfig {
    /// Command typed to open a private chat; `{callsign}` is substituted
    #[serde(default = "default_chat_command")]
    pub chat_command: String,

    /// Delay between synthetic key presses
    #[serde(default = "default_key_delay_ms")]
    pub key_delay_ms: u64,

    /// Wait after opening the chat before pasting
    #[serde(default = "default_open_delay_ms")]
    pub open_delay_ms: u64,

    /// Wait after pasting before confirming
    #[serde(default = "default_paste_delay_ms")]
    pub paste_delay_ms: u64,

    /// Press Enter after pasting to send the message
    #[serde(default = "default_true")]
    pub confirm_after_paste: bool,
}

// Default value functions
fn default_channel_name() -> String {
    "EuroScopePDCBridge".to_string()
}
fn default_hint_window_ms() -> u64 {
    1500
}
fn default_flagged_color() -> [u8; 3] {
    [0, 200, 0]
}
fn default_max_message_bytes() -> usize {
    8192
}
fn default_read_timeout_ms() -> u64 {
    2000
}
fn default_chat_command() -> String {
    ".chat {callsign}".to_string()
}
fn default_key_delay_ms() -> u64 {
    2
}
fn default_open_delay_ms() -> u64 {
    80
}
fn default_paste_delay_ms() -> u64 {
    50
}
fn default_true() -> bool {
    true
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            socket_dir: None,
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            hint_window_ms: default_hint_window_ms(),
            flagged_color: default_flagged_color(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: default_max_message_bytes(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            chat_command: default_chat_command(),
            key_delay_ms: default_key_delay_ms(),
            open_delay_ms: default_open_delay_ms(),
            paste_delay_ms: default_paste_delay_ms(),
            confirm_after_paste: default_true(),
        }
    }
}

impl ChannelConfig {
    /// Named pipe path for this channel
    #[cfg(windows)]
    pub fn endpoint(&self) -> PathBuf {
        PathBuf::from(format!(r"\\.\pipe\{}", self.name))
    }

    /// Socket file path for this channel
    #[cfg(not(windows))]
    pub fn endpoint(&self) -> PathBuf {
        let dir = self.socket_dir.clone().unwrap_or_else(std::env::temp_dir);
        dir.join(format!("{}.sock", self.name))
    }
}

impl PluginConfig {
    pub fn hint_window(&self) -> Duration {
        Duration::from_millis(self.hint_window_ms)
    }
}

impl BridgeConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pdcflag.toml"))
}

/// Load configuration from file or create default
pub fn load_config(path: &Path) -> Result<PdcConfig> {
    if path.exists() {
        read_config(path)
    } else {
        tracing::warn!("{} not found, creating default configuration", path.display());
        let config = PdcConfig::default();
        save_config(path, &config)?;
        Ok(config)
    }
}

/// Parse an existing configuration file
pub fn read_config(path: &Path) -> Result<PdcConfig> {
    let contents = std::fs
        ::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Save configuration to file
pub fn save_config(path: &Path, config: &PdcConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    std::fs
        ::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Configuration file watcher with hot-reload
pub struct ConfigWatcher {
    path: PathBuf,
    config: Arc<RwLock<PdcConfig>>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, config: Arc<RwLock<PdcConfig>>) -> Self {
        Self { path, config }
    }

    /// Start watching the config file for changes
    pub async fn watch(self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(1);

        let mut watcher = RecommendedWatcher::new(move |res| {
            let _ = tx.blocking_send(res);
        }, NotifyConfig::default())?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!("Config file watcher started for {}", self.path.display());

        while let Some(res) = rx.recv().await {
            match res {
                Ok(event) => {
                    tracing::debug!("Config file event: {:?}", event);

                    // Let the editor finish writing
                    tokio::time::sleep(Duration::from_millis(100)).await;

                    match read_config(&self.path) {
                        Ok(config) => {
                            self.apply(config);
                            tracing::info!("Configuration reloaded successfully");
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload config: {:#}", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }

        Ok(())
    }

    /// The channel stays bound for the process lifetime; everything else
    /// takes effect for the next message
    fn apply(&self, mut config: PdcConfig) {
        let mut current = self.config.write();
        if config.channel != current.channel {
            tracing::warn!("Channel settings changed; restart the bridge to apply them");
            config.channel = current.channel.clone();
        }
        *current = config;
    }
}

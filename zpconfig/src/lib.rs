//! # ZonePlayer Configuration
//!
//! YAML configuration for the ZonePlayer emulator:
//! - an embedded default file (`zoneplayer.yaml`) merged with `config.yaml`
//!   from the configuration directory
//! - environment overrides (`ZONEPLAYER_CONFIG__HOST__HTTP_PORT=1401`)
//! - typed getters/setters, lazily loaded global singleton
//!
//! ```no_run
//! use zpconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let mac = config.get_device_mac()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_yaml::{Mapping, Number, Value};
use std::{env, fs, path::Path, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;
use zputils::{guess_local_ip, host_name, normalize_mac};

const DEFAULT_CONFIG: &str = include_str!("zoneplayer.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_or_default());
}

const ENV_CONFIG_DIR: &str = "ZONEPLAYER_CONFIG";
const ENV_PREFIX: &str = "ZONEPLAYER_CONFIG__";
const CONFIG_DIR_NAME: &str = ".zoneplayer";

const DEFAULT_HTTP_PORT: u16 = 1400;
const DEFAULT_LOG_BUFFER_CAPACITY: u64 = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_ZONE_NAME: &str = "ZonePlayer";
const DEFAULT_ICON: &str = "x-rincon-roomicon:bathroom";
const DEFAULT_HOUSEHOLD: &str = "Sonos_AafT5QbaoptKSoEB7VzvHfC5Uu";
const DEFAULT_FIRMWARE_VERSION: &str = "34.16-37101";
const DEFAULT_DISPLAY_VERSION: &str = "7.1";
const DEFAULT_SUBSCRIPTION_TIMEOUT: u64 = 3600;
const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5000;
const DEFAULT_SWEEP_INTERVAL: u64 = 60;
const DEFAULT_SSDP_ENABLED: bool = true;
const DEFAULT_SSDP_INTERVAL: u64 = 1;
const DEFAULT_TRANSPORT_COMMAND: &str = "./stream";

/// Getter/setter for an unsigned integer value
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse().unwrap_or($default),
                _ => $default,
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Getter/setter for a boolean value
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Getter/setter for a string value; empty strings fall back to the default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.trim().is_empty() => s,
                Ok(Value::Number(n)) => n.to_string(),
                _ => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: impl Into<String>) -> Result<()> {
            self.set_value($path, Value::String(value.into()))
        }
    };
}

/// Configuration store for the ZonePlayer.
///
/// A `Config` loaded from disk writes every change back to its
/// `config.yaml`; one built with [`Config::from_yaml_str`] lives in memory
/// only.
#[derive(Debug)]
pub struct Config {
    config_dir: Option<String>,
    path: Option<String>,
    data: Mutex<Value>,
}

impl Config {
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let probe = path.join(".write_test");
        fs::write(&probe, b"test")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    /// Resolves the configuration directory and makes sure it is usable.
    ///
    /// Lookup order: `directory` when not empty, `$ZONEPLAYER_CONFIG`,
    /// `./.zoneplayer`, `~/.zoneplayer`, then `./.zoneplayer` (created).
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir))?;
        Ok(dir)
    }

    /// Loads `config.yaml` from the configuration directory.
    ///
    /// The embedded defaults are merged with the file (when present), keys
    /// are lower-cased, environment overrides applied, and the merged
    /// result is written back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let path = Path::new(&config_dir)
            .join("config.yaml")
            .to_string_lossy()
            .to_string();

        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path, "Loaded config file");
                let external: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut value, &lower_keys(external));
            }
            Err(_) => info!(config_file = %path, "Config file not found, using embedded defaults"),
        }

        let mut value = lower_keys(value);
        apply_env_overrides(&mut value);

        let config = Config {
            config_dir: Some(config_dir),
            path: Some(path),
            data: Mutex::new(value),
        };
        config.save()?;
        Ok(config)
    }

    /// Builds an in-memory configuration from a YAML document merged over
    /// the embedded defaults. Nothing is read from or written to disk.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        if !yaml.trim().is_empty() {
            let external: Value = serde_yaml::from_str(yaml)?;
            merge_yaml(&mut value, &lower_keys(external));
        }

        Ok(Config {
            config_dir: None,
            path: None,
            data: Mutex::new(lower_keys(value)),
        })
    }

    fn load_or_default() -> Self {
        match Self::load_config("") {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ Unable to load configuration ({}), using embedded defaults", e);
                Self::from_yaml_str("").unwrap_or_else(|_| Config {
                    config_dir: None,
                    path: None,
                    data: Mutex::new(Value::Mapping(Mapping::new())),
                })
            }
        }
    }

    /// Directory holding `config.yaml`, `None` for an in-memory config.
    pub fn directory(&self) -> Option<&str> {
        self.config_dir.as_deref()
    }

    /// Writes the configuration back to `config.yaml` (no-op in memory).
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(&*self.data.lock())?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Sets the value at `path` (e.g. `&["host", "http_port"]`) and saves.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        set_path(&mut self.data.lock(), path, value)?;
        self.save()
    }

    /// Reads the value at `path`; keys are matched case-insensitively.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock();
        let mut current = &*data;
        for (depth, key) in path.iter().enumerate() {
            let Value::Mapping(map) = current else {
                return Err(anyhow!("{} is not a mapping", path[..depth].join(".")));
            };
            current = map
                .get(&Value::String(key.to_lowercase()))
                .ok_or_else(|| anyhow!("{} does not exist", path[..=depth].join(".")))?;
        }
        Ok(current.clone())
    }

    /// Address advertised in URLs; guessed from the network when unset.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => guess_local_ip(),
        }
    }

    /// HTTP port, 1400 when missing or invalid.
    pub fn get_http_port(&self) -> u16 {
        let raw = match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => n.as_u64(),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        match raw.and_then(|p| u16::try_from(p).ok()) {
            Some(port) if port > 0 => port,
            _ => {
                warn!("Invalid HTTP port, using default {}", DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
        }
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    /// MAC address of the emulated player, `AA:BB:CC:DD:EE:FF`.
    ///
    /// When none is configured (or the configured one is unreadable) a
    /// locally administered address is generated and persisted, so the
    /// device identity survives restarts.
    pub fn get_device_mac(&self) -> Result<String> {
        if let Ok(Value::String(raw)) = self.get_value(&["device", "mac"]) {
            if !raw.trim().is_empty() {
                match normalize_mac(&raw) {
                    Ok(mac) => return Ok(mac),
                    Err(e) => warn!("⚠️ {}, generating a new one", e),
                }
            }
        }

        let mac = generate_local_mac();
        info!("🆔 Generated device MAC address {}", mac);
        self.set_device_mac(mac.clone())?;
        Ok(mac)
    }

    pub fn set_device_mac(&self, mac: String) -> Result<()> {
        let mac = normalize_mac(&mac)?;
        self.set_value(&["device", "mac"], Value::String(mac))
    }

    /// Zone (room) name; defaults to the capitalized host name.
    pub fn get_zone_name(&self) -> String {
        match self.get_value(&["device", "zone_name"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s,
            _ => host_name()
                .map(|h| capitalize(&h))
                .unwrap_or_else(|| DEFAULT_ZONE_NAME.to_string()),
        }
    }

    pub fn set_zone_name(&self, name: impl Into<String>) -> Result<()> {
        self.set_value(&["device", "zone_name"], Value::String(name.into()))
    }

    impl_string_config!(get_room_icon, set_room_icon, &["device", "icon"], DEFAULT_ICON);

    impl_string_config!(
        get_household,
        set_household,
        &["device", "household"],
        DEFAULT_HOUSEHOLD
    );

    impl_string_config!(
        get_firmware_version,
        set_firmware_version,
        &["device", "firmware_version"],
        DEFAULT_FIRMWARE_VERSION
    );

    impl_string_config!(
        get_display_version,
        set_display_version,
        &["device", "display_version"],
        DEFAULT_DISPLAY_VERSION
    );

    impl_u64_config!(
        get_subscription_timeout,
        set_subscription_timeout,
        &["upnp", "subscription_timeout"],
        DEFAULT_SUBSCRIPTION_TIMEOUT
    );

    impl_u64_config!(
        get_notify_timeout_ms,
        set_notify_timeout_ms,
        &["upnp", "notify_timeout_ms"],
        DEFAULT_NOTIFY_TIMEOUT_MS
    );

    impl_u64_config!(
        get_sweep_interval,
        set_sweep_interval,
        &["upnp", "sweep_interval"],
        DEFAULT_SWEEP_INTERVAL
    );

    impl_bool_config!(
        get_ssdp_enabled,
        set_ssdp_enabled,
        &["ssdp", "enabled"],
        DEFAULT_SSDP_ENABLED
    );

    impl_u64_config!(
        get_ssdp_interval,
        set_ssdp_interval,
        &["ssdp", "interval"],
        DEFAULT_SSDP_INTERVAL
    );

    impl_string_config!(
        get_transport_command,
        set_transport_command,
        &["transport", "command"],
        DEFAULT_TRANSPORT_COMMAND
    );

    /// Extra arguments passed to the media transport helper.
    pub fn get_transport_args(&self) -> Vec<String> {
        match self.get_value(&["transport", "args"]) {
            Ok(Value::Sequence(seq)) => seq
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    impl_u64_config!(
        get_log_cache_size,
        set_log_cache_size,
        &["host", "logger", "buffer_capacity"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    impl_string_config!(
        get_log_min_level,
        set_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );
}

/// Returns the global configuration, loading it on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn set_path(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };

    let Value::Mapping(map) = data else {
        return Err(anyhow!("cannot set '{}': parent is not a mapping", first));
    };

    let key = Value::String(first.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let child = map
            .entry(key)
            .or_insert(Value::Mapping(Mapping::new()));
        set_path(child, rest, value)
    }
}

fn apply_env_overrides(config: &mut Value) {
    for (key, raw) in env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = suffix.split("__").collect();
        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw.clone()));
        if let Err(e) = set_path(config, &path, value) {
            warn!(variable = %key, "Ignoring environment override: {}", e);
        }
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

/// Recursively merges `external` into `default`: mappings are merged key by
/// key, scalars and sequences are replaced, nulls are ignored.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (_, Value::Null) => {}
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

fn generate_local_mac() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let mut octets = [0u8; 6];
    octets.copy_from_slice(&bytes[..6]);
    // unicast, locally administered
    octets[0] = (octets[0] & 0xFC) | 0x02;
    octets
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn capitalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_embedded_yaml() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config.get_http_port(), 1400);
        assert_eq!(config.get_subscription_timeout(), 3600);
        assert_eq!(config.get_notify_timeout_ms(), 5000);
        assert_eq!(config.get_ssdp_interval(), 1);
        assert!(config.get_ssdp_enabled());
        assert_eq!(config.get_firmware_version(), "34.16-37101");
        assert_eq!(config.get_display_version(), "7.1");
        assert_eq!(config.get_transport_command(), "./stream");
        assert!(config.get_transport_args().is_empty());
        assert_eq!(config.get_log_min_level(), "INFO");
    }

    #[test]
    fn test_overrides_are_merged_case_insensitively() {
        let config = Config::from_yaml_str(
            "Host:\n  HTTP_PORT: 1401\ndevice:\n  zone_name: Kitchen\ntransport:\n  args: [\"-v\", 2]\n",
        )
        .unwrap();
        assert_eq!(config.get_http_port(), 1401);
        assert_eq!(config.get_zone_name(), "Kitchen");
        assert_eq!(config.get_transport_args(), vec!["-v".to_string(), "2".to_string()]);
        // les clés non surchargées gardent leur valeur par défaut
        assert_eq!(config.get_household(), DEFAULT_HOUSEHOLD);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = Config::from_yaml_str("host:\n  http_port: 70000\n").unwrap();
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);
    }

    #[test]
    fn test_mac_is_generated_once() {
        let config = Config::from_yaml_str("").unwrap();
        let first = config.get_device_mac().unwrap();
        let second = config.get_device_mac().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 17);
        let first_octet = u8::from_str_radix(&first[..2], 16).unwrap();
        assert_eq!(first_octet & 0x03, 0x02);
    }

    #[test]
    fn test_configured_mac_is_normalized() {
        let config = Config::from_yaml_str("device:\n  mac: b8-e9-37-24-c8-00\n").unwrap();
        assert_eq!(config.get_device_mac().unwrap(), "B8:E9:37:24:C8:00");
    }

    #[test]
    fn test_load_config_writes_merged_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "device:\n  zone_name: Office\n").unwrap();

        let config = Config::load_config(dir_path).unwrap();
        assert_eq!(config.get_zone_name(), "Office");
        config.set_http_port(1402).unwrap();

        let reloaded = Config::load_config(dir_path).unwrap();
        assert_eq!(reloaded.get_http_port(), 1402);
        assert_eq!(reloaded.get_zone_name(), "Office");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("MYHOST"), "Myhost");
        assert_eq!(capitalize(""), "");
    }
}

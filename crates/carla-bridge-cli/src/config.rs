//! Bridge configuration – reads/writes `~/.carla-bridge/config.toml`.

use carla_bridge_middleware::cyber_adapter::DEFAULT_NODE_NAME;
use carla_bridge_middleware::ros_adapter::DEFAULT_TOPIC_PREFIX;
use carla_bridge_runtime::params::{CHALLENGE_MODE, EGO_ROLE_NAMES, ParameterServer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

/// Key under which the ego's own role name is served.
pub const ROLE_NAME: &str = "role_name";

/// Persisted bridge configuration stored in `~/.carla-bridge/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Role name of the ego actor.
    #[serde(default = "default_role_name")]
    pub role_name: String,

    /// Skip odometry and localization output.
    #[serde(default)]
    pub challenge_mode: bool,

    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Namespace of the ego's ROS topics.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Name the Cyber node registers under.
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Vehicles with one of these role names never show up as obstacles.
    #[serde(default = "default_ego_role_names")]
    pub ego_role_names: Vec<String>,
}

fn default_role_name() -> String {
    "ego_vehicle".to_string()
}
fn default_tick_hz() -> u32 {
    20
}
fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}
fn default_node_name() -> String {
    DEFAULT_NODE_NAME.to_string()
}
fn default_ego_role_names() -> Vec<String> {
    vec!["hero".to_string(), "ego_vehicle".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role_name: default_role_name(),
            challenge_mode: false,
            tick_hz: default_tick_hz(),
            topic_prefix: default_topic_prefix(),
            node_name: default_node_name(),
            ego_role_names: default_ego_role_names(),
        }
    }
}

impl ParameterServer for Config {
    fn get_param(&self, key: &str) -> Option<Value> {
        match key {
            CHALLENGE_MODE => Some(Value::Bool(self.challenge_mode)),
            EGO_ROLE_NAMES => Some(json!(self.ego_role_names)),
            ROLE_NAME => Some(Value::String(self.role_name.clone())),
            _ => None,
        }
    }
}

/// Return the path to `~/.carla-bridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".carla-bridge").join("config.toml")
}

/// Load the config from disk and apply env overrides.  Returns `None` if the
/// file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    Ok(load_from(&config_path())?.map(|mut cfg| {
        apply_env_overrides(&mut cfg);
        cfg
    }))
}

pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `CARLA_BRIDGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CARLA_BRIDGE_ROLE_NAME` | `role_name` |
/// | `CARLA_BRIDGE_CHALLENGE_MODE` | `challenge_mode` |
/// | `CARLA_BRIDGE_TICK_HZ` | `tick_hz` |
/// | `CARLA_BRIDGE_TOPIC_PREFIX` | `topic_prefix` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("CARLA_BRIDGE_ROLE_NAME") {
        cfg.role_name = v;
    }
    if let Ok(v) = std::env::var("CARLA_BRIDGE_CHALLENGE_MODE")
        && let Ok(flag) = v.parse::<bool>()
    {
        cfg.challenge_mode = flag;
    }
    if let Ok(v) = std::env::var("CARLA_BRIDGE_TICK_HZ")
        && let Ok(hz) = v.parse::<u32>()
        && hz > 0
    {
        cfg.tick_hz = hz;
    }
    if let Ok(v) = std::env::var("CARLA_BRIDGE_TOPIC_PREFIX") {
        cfg.topic_prefix = v;
    }
}

/// Save the config to disk, creating `~/.carla-bridge/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carla_bridge_runtime::params::{require_bool, require_string_list};

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.role_name, "ego_vehicle");
        assert_eq!(loaded.tick_hz, 20);
        assert_eq!(loaded.topic_prefix, "/carla/ego_vehicle");
        assert_eq!(loaded.ego_role_names, vec!["hero", "ego_vehicle"]);
        assert!(!loaded.challenge_mode);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "challenge_mode = true\n").expect("write");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert!(loaded.challenge_mode);
        assert_eq!(loaded.node_name, DEFAULT_NODE_NAME);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_hz = \"fast\"\n").expect("write");
        assert!(load_from(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn config_path_points_to_bridge_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".carla-bridge"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_serves_runtime_parameters() {
        let cfg = Config {
            challenge_mode: true,
            ..Default::default()
        };
        assert_eq!(require_bool(&cfg, CHALLENGE_MODE), Ok(true));
        assert_eq!(
            require_string_list(&cfg, EGO_ROLE_NAMES),
            Ok(vec!["hero".to_string(), "ego_vehicle".to_string()])
        );
        assert_eq!(cfg.get_param(ROLE_NAME), Some(json!("ego_vehicle")));
        assert!(cfg.get_param("unknown").is_none());
    }

    #[test]
    fn apply_env_overrides_changes_role_name() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("CARLA_BRIDGE_ROLE_NAME", "hero") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.role_name, "hero");
        unsafe { std::env::remove_var("CARLA_BRIDGE_ROLE_NAME") };
    }

    #[test]
    fn apply_env_overrides_changes_challenge_mode() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("CARLA_BRIDGE_CHALLENGE_MODE", "true") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!(cfg.challenge_mode);
        unsafe { std::env::remove_var("CARLA_BRIDGE_CHALLENGE_MODE") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_tick_rate() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("CARLA_BRIDGE_TICK_HZ", "0") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_hz, 20);
        unsafe { std::env::set_var("CARLA_BRIDGE_TICK_HZ", "often") };
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_hz, 20);
        unsafe { std::env::set_var("CARLA_BRIDGE_TICK_HZ", "50") };
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_hz, 50);
        unsafe { std::env::remove_var("CARLA_BRIDGE_TICK_HZ") };
    }

    #[test]
    fn apply_env_overrides_changes_topic_prefix() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("CARLA_BRIDGE_TOPIC_PREFIX", "/carla/hero") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.topic_prefix, "/carla/hero");
        unsafe { std::env::remove_var("CARLA_BRIDGE_TOPIC_PREFIX") };
    }
}

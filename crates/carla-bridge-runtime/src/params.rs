//! Parameter lookup.
//!
//! The ego vehicle reads `challenge_mode` every tick and the ego role-name
//! list whenever it publishes obstacles, so both can change while the bridge
//! runs.  Anything that can answer a key lookup implements
//! [`ParameterServer`]; the CLI's config file is one such source and
//! [`StaticParams`] is an in-memory one.

use std::collections::BTreeMap;
use std::sync::RwLock;

use carla_bridge_types::BridgeError;
use serde_json::Value;

/// When `true`, odometry and localization are not published.
pub const CHALLENGE_MODE: &str = "challenge_mode";

/// Role names that mark a vehicle as an ego vehicle.  A single string is
/// accepted as a one-element list.
pub const EGO_ROLE_NAMES: &str = "ego_vehicle/role_name";

/// A source of named runtime parameters.
pub trait ParameterServer: Send + Sync {
    /// Current value of `key`, or `None` when it is not set.
    fn get_param(&self, key: &str) -> Option<Value>;
}

/// Read `key` as a boolean.
pub fn require_bool(params: &dyn ParameterServer, key: &str) -> Result<bool, BridgeError> {
    match params.get_param(key) {
        Some(Value::Bool(b)) => Ok(b),
        Some(other) => Err(BridgeError::Parsing(format!(
            "parameter {key} must be a boolean, got {other}"
        ))),
        None => Err(BridgeError::ConfigMissing(key.to_string())),
    }
}

/// Read `key` as a list of strings.
pub fn require_string_list(
    params: &dyn ParameterServer,
    key: &str,
) -> Result<Vec<String>, BridgeError> {
    let invalid = |other: &Value| {
        BridgeError::Parsing(format!(
            "parameter {key} must be a string or list of strings, got {other}"
        ))
    };
    match params.get_param(key) {
        Some(Value::String(s)) => Ok(vec![s]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(item)))
            .collect(),
        Some(other) => Err(invalid(&other)),
        None => Err(BridgeError::ConfigMissing(key.to_string())),
    }
}

/// In-memory parameter store.  Values can be changed while the bridge runs.
#[derive(Debug, Default)]
pub struct StaticParams {
    values: RwLock<BTreeMap<String, Value>>,
}

impl StaticParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`StaticParams::set`].
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key)
    }
}

impl ParameterServer for StaticParams {
    fn get_param(&self, key: &str) -> Option<Value> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_bool_is_config_missing() {
        let params = StaticParams::new();
        assert_eq!(
            require_bool(&params, CHALLENGE_MODE),
            Err(BridgeError::ConfigMissing(CHALLENGE_MODE.to_string()))
        );
    }

    #[test]
    fn bool_of_wrong_type_is_parsing_error() {
        let params = StaticParams::new().with(CHALLENGE_MODE, "yes");
        assert!(matches!(
            require_bool(&params, CHALLENGE_MODE),
            Err(BridgeError::Parsing(_))
        ));
    }

    #[test]
    fn values_can_change_at_runtime() {
        let params = StaticParams::new().with(CHALLENGE_MODE, false);
        assert_eq!(require_bool(&params, CHALLENGE_MODE), Ok(false));
        params.set(CHALLENGE_MODE, true);
        assert_eq!(require_bool(&params, CHALLENGE_MODE), Ok(true));
        params.remove(CHALLENGE_MODE);
        assert!(require_bool(&params, CHALLENGE_MODE).is_err());
    }

    #[test]
    fn role_names_accept_string_or_list() {
        let params = StaticParams::new().with(EGO_ROLE_NAMES, "hero");
        assert_eq!(require_string_list(&params, EGO_ROLE_NAMES), Ok(vec!["hero".to_string()]));

        params.set(EGO_ROLE_NAMES, json!(["hero", "ego_vehicle"]));
        assert_eq!(
            require_string_list(&params, EGO_ROLE_NAMES),
            Ok(vec!["hero".to_string(), "ego_vehicle".to_string()])
        );

        params.set(EGO_ROLE_NAMES, json!(["hero", 3]));
        assert!(matches!(
            require_string_list(&params, EGO_ROLE_NAMES),
            Err(BridgeError::Parsing(_))
        ));
    }
}

//! Planner settings: namespace and batch capacities.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default ceiling on summed resource cost per container.
pub const DEFAULT_RESOURCE_CAPACITY: u32 = 400;
/// Default ceiling on summed edge cost per container.
pub const DEFAULT_EDGE_CAPACITY: u32 = 200;
pub const DEFAULT_NAMESPACE: &str = "default";

/// Maximum aggregate cost one batch may hold. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Capacity(NonZeroU32);

impl Capacity {
    /// Validate a raw capacity value. `name` labels the error.
    pub fn new(name: &'static str, value: i64) -> ConfigResult<Self> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Capacity)
            .ok_or(ConfigError::NonPositiveCapacity { name, value })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for Capacity {
    type Error = ConfigError;

    fn try_from(value: i64) -> ConfigResult<Self> {
        Capacity::new("capacity", value)
    }
}

impl From<Capacity> for u32 {
    fn from(c: Capacity) -> Self {
        c.get()
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings for one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Prefix that keeps container names unique per environment.
    pub namespace: String,
    /// Capacity for phase 1 (resources).
    pub resource_capacity: Capacity,
    /// Capacity for phase 2 (reference edges).
    pub edge_capacity: Capacity,
    /// Context every child container inherits, e.g. a network identity.
    #[serde(default)]
    pub shared: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            resource_capacity: Capacity(
                NonZeroU32::new(DEFAULT_RESOURCE_CAPACITY).unwrap_or(NonZeroU32::MIN),
            ),
            edge_capacity: Capacity(
                NonZeroU32::new(DEFAULT_EDGE_CAPACITY).unwrap_or(NonZeroU32::MIN),
            ),
            shared: BTreeMap::new(),
        }
    }
}

/// Optional overrides, applied on top of [`Settings`] in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    pub namespace: Option<String>,
    pub resource_capacity: Option<i64>,
    pub edge_capacity: Option<i64>,
}

impl Settings {
    pub fn with_capacities(resource: i64, edge: i64) -> ConfigResult<Self> {
        Ok(Self {
            resource_capacity: Capacity::new("resource_capacity", resource)?,
            edge_capacity: Capacity::new("edge_capacity", edge)?,
            ..Self::default()
        })
    }

    pub fn apply(mut self, overrides: &SettingsOverrides) -> ConfigResult<Self> {
        if let Some(ns) = &overrides.namespace {
            self.namespace = ns.clone();
        }
        if let Some(value) = overrides.resource_capacity {
            self.resource_capacity = Capacity::new("resource_capacity", value)?;
        }
        if let Some(value) = overrides.edge_capacity {
            self.edge_capacity = Capacity::new("edge_capacity", value)?;
        }
        Ok(self)
    }
}

//! Normalized resource descriptors shared across stackpack crates.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Reserved in ids; joins an id to generated suffixes such as fragment
/// parts and edge names.
pub const NAME_SEPARATOR: char = '/';

/// Unique identifier of a resource within one planning run. Never contains
/// [`NAME_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An unvalidated pointer to another resource.
///
/// A token only becomes a [`ResourceId`] by resolving it through a
/// [`ResourceIndex`]; there is no conversion that skips the lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefToken(String);

impl RefToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id this token names in `index`, or `None` for a dangling token.
    pub fn resolve<'i>(&self, index: &'i ResourceIndex) -> Option<&'i ResourceId> {
        index.resolve(self)
    }
}

impl fmt::Display for RefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which way a reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The referenced resource is allowed in: traffic flows target → owner.
    Ingress,
    /// The owner reaches out: traffic flows owner → target.
    Egress,
}

impl Direction {
    /// Order `(owner, target)` into `(source, destination)`.
    pub fn orient<'a, T>(&self, owner: &'a T, target: &'a T) -> (&'a T, &'a T) {
        match self {
            Direction::Ingress => (target, owner),
            Direction::Egress => (owner, target),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ingress => write!(f, "ingress"),
            Direction::Egress => write!(f, "egress"),
        }
    }
}

/// A reference from one descriptor to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardRef {
    pub target: RefToken,
    pub direction: Direction,
    /// Opaque attributes carried onto the resulting edge.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Deployable sub-units the materialized edge contributes.
    #[serde(default = "default_cost")]
    pub cost: u32,
}

impl ForwardRef {
    pub fn new(target: impl Into<String>, direction: Direction) -> Self {
        Self {
            target: RefToken::new(target),
            direction,
            attributes: serde_json::Map::new(),
            cost: 1,
        }
    }
}

fn default_cost() -> u32 {
    1
}

/// One logical resource to deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: ResourceId,
    /// Deployable sub-units: the resource itself plus its rules and
    /// associations. Always at least 1.
    pub cost: u32,
    /// Forwarded to the deployment engine untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub forward_refs: Vec<ForwardRef>,
}

impl ResourceDescriptor {
    pub fn new(id: impl Into<String>, cost: u32) -> Self {
        Self {
            id: ResourceId::new(id),
            cost,
            payload: serde_json::Value::Null,
            forward_refs: Vec::new(),
        }
    }

    pub fn with_ref(mut self, forward_ref: ForwardRef) -> Self {
        self.forward_refs.push(forward_ref);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Lookup from id to input position, built once per run.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    positions: HashMap<ResourceId, usize>,
}

impl ResourceIndex {
    /// Index `descriptors`, rejecting duplicate ids, reserved characters
    /// and zero costs.
    pub fn build(descriptors: &[ResourceDescriptor]) -> ConfigResult<Self> {
        let mut positions = HashMap::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            if d.id.as_str().contains(NAME_SEPARATOR) {
                return Err(ConfigError::ReservedSeparator {
                    id: d.id.to_string(),
                    separator: NAME_SEPARATOR,
                });
            }
            if d.cost == 0 {
                return Err(ConfigError::ZeroCost(d.id.to_string()));
            }
            if let Some(r) = d.forward_refs.iter().find(|r| r.cost == 0) {
                return Err(ConfigError::ZeroCost(format!("{} -> {}", d.id, r.target)));
            }
            if positions.insert(d.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateId(d.id.to_string()));
            }
        }
        Ok(Self { positions })
    }

    /// Resolve a reference token to the id it names, if any.
    pub fn resolve(&self, token: &RefToken) -> Option<&ResourceId> {
        self.positions
            .get_key_value(token.as_str())
            .map(|(id, _)| id)
    }
}

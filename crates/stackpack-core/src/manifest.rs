//! Versioned resource manifest (`stackpack.toml` or `.json`).
//!
//! The top-level `version` key selects the schema. Unknown versions are an
//! error; there is no fallback to a default schema.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{Settings, SettingsOverrides};
use crate::descriptor::{ForwardRef, ResourceDescriptor, ResourceId, ResourceIndex};
use crate::error::{ConfigError, ConfigResult};

/// A parsed manifest of any known version.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    V1(ManifestV1),
}

#[derive(Debug, Deserialize)]
struct VersionHeader {
    version: Option<String>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let header: VersionHeader = toml::from_str(content)?;
        match header.version.as_deref() {
            Some("v1") => Ok(Manifest::V1(toml::from_str(content)?)),
            Some(other) => Err(ConfigError::UnknownVersion(other.to_string())),
            None => Err(ConfigError::MissingVersion),
        }
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let header: VersionHeader = serde_json::from_str(content)?;
        match header.version.as_deref() {
            Some("v1") => Ok(Manifest::V1(serde_json::from_str(content)?)),
            Some(other) => Err(ConfigError::UnknownVersion(other.to_string())),
            None => Err(ConfigError::MissingVersion),
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            Manifest::V1(_) => "v1",
        }
    }

    /// Planner settings declared by the manifest, on top of the defaults.
    pub fn settings(&self) -> ConfigResult<Settings> {
        match self {
            Manifest::V1(m) => {
                let mut settings = Settings::default().apply(&m.plan)?;
                settings.shared = m.shared.clone();
                Ok(settings)
            }
        }
    }

    /// Lower the manifest into normalized descriptors, in declaration order.
    pub fn descriptors(&self) -> ConfigResult<Vec<ResourceDescriptor>> {
        let descriptors = match self {
            Manifest::V1(m) => m
                .resources
                .iter()
                .map(ResourceV1::to_descriptor)
                .collect::<ConfigResult<Vec<_>>>()?,
        };
        ResourceIndex::build(&descriptors)?;
        Ok(descriptors)
    }
}

/// Schema `v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestV1 {
    pub version: String,
    #[serde(default)]
    pub plan: SettingsOverrides,
    #[serde(default)]
    pub shared: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Vec<ResourceV1>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceV1 {
    pub id: String,
    #[serde(flatten)]
    pub kind: ResourceKind,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub refs: Vec<ForwardRef>,
}

/// Resource kinds and the fields that determine their cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceKind {
    SecurityGroup {
        #[serde(default)]
        ingress: u32,
        #[serde(default)]
        egress: u32,
    },
    NetworkAcl {
        #[serde(default)]
        rules: u32,
        #[serde(default)]
        subnets: Vec<String>,
    },
    Generic {
        cost: u32,
    },
}

impl ResourceKind {
    /// Deployable sub-units: the resource plus each inline rule and
    /// association.
    pub fn cost(&self) -> u32 {
        match self {
            ResourceKind::SecurityGroup { ingress, egress } => {
                1u32.saturating_add(*ingress).saturating_add(*egress)
            }
            ResourceKind::NetworkAcl { rules, subnets } => {
                let subnets = u32::try_from(subnets.len()).unwrap_or(u32::MAX);
                1u32.saturating_add(*rules).saturating_add(subnets)
            }
            ResourceKind::Generic { cost } => *cost,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::SecurityGroup { .. } => "security-group",
            ResourceKind::NetworkAcl { .. } => "network-acl",
            ResourceKind::Generic { .. } => "generic",
        }
    }
}

impl ResourceV1 {
    fn to_descriptor(&self) -> ConfigResult<ResourceDescriptor> {
        let cost = self.kind.cost();
        if cost == 0 {
            return Err(ConfigError::ZeroCost(self.id.clone()));
        }

        let payload = match &self.payload {
            Some(p) => p.clone(),
            None => serde_json::json!({ "kind": self.kind.label() }),
        };

        Ok(ResourceDescriptor {
            id: ResourceId::new(&self.id),
            cost,
            payload,
            forward_refs: self.refs.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Direction;

    const SAMPLE: &str = r#"
version = "v1"

[plan]
namespace = "prod"
resource_capacity = 480

[shared]
vpc = "vpc-123"

[[resources]]
id = "web-sg"
kind = "security-group"
ingress = 2

[[resources]]
id = "app-sg"
kind = "security-group"
ingress = 1
egress = 1

[[resources.refs]]
target = "web-sg"
direction = "ingress"
attributes = { port = 8080 }

[[resources]]
id = "private-acl"
kind = "network-acl"
rules = 4
subnets = ["subnet-a", "subnet-b"]

[[resources]]
id = "bucket"
kind = "generic"
cost = 7
"#;

    #[test]
    fn parses_v1_toml() {
        let manifest = Manifest::from_toml_str(SAMPLE).unwrap();
        assert_eq!(manifest.version(), "v1");

        let descriptors = manifest.descriptors().unwrap();
        let costs: Vec<u32> = descriptors.iter().map(|d| d.cost).collect();
        assert_eq!(costs, vec![3, 3, 7, 7]);

        let app = &descriptors[1];
        assert_eq!(app.forward_refs.len(), 1);
        assert_eq!(app.forward_refs[0].direction, Direction::Ingress);
        assert_eq!(app.forward_refs[0].attributes["port"], 8080);
    }

    #[test]
    fn settings_come_from_plan_table() {
        let manifest = Manifest::from_toml_str(SAMPLE).unwrap();
        let settings = manifest.settings().unwrap();
        assert_eq!(settings.namespace, "prod");
        assert_eq!(settings.resource_capacity.get(), 480);
        assert_eq!(settings.edge_capacity.get(), 200);
        assert_eq!(settings.shared.get("vpc").map(String::as_str), Some("vpc-123"));
    }

    #[test]
    fn unknown_version_is_an_error() {
        let err = Manifest::from_toml_str("version = \"v9\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVersion(v) if v == "v9"));
    }

    #[test]
    fn missing_version_is_an_error() {
        let err = Manifest::from_toml_str("[plan]\nnamespace = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVersion));
    }

    #[test]
    fn non_positive_capacity_is_reported() {
        let manifest = Manifest::from_toml_str(
            "version = \"v1\"\n[plan]\nedge_capacity = -1\n",
        )
        .unwrap();
        assert!(matches!(
            manifest.settings(),
            Err(ConfigError::NonPositiveCapacity { name: "edge_capacity", value: -1 })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let content = r#"
version = "v1"
[[resources]]
id = "a"
kind = "generic"
cost = 1
[[resources]]
id = "a"
kind = "generic"
cost = 2
"#;
        let manifest = Manifest::from_toml_str(content).unwrap();
        assert!(matches!(manifest.descriptors(), Err(ConfigError::DuplicateId(_))));
    }

    #[test]
    fn generic_zero_cost_is_rejected() {
        let content = "version = \"v1\"\n[[resources]]\nid = \"a\"\nkind = \"generic\"\ncost = 0\n";
        let manifest = Manifest::from_toml_str(content).unwrap();
        assert!(matches!(manifest.descriptors(), Err(ConfigError::ZeroCost(_))));
    }

    #[test]
    fn parses_json_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackpack.json");
        std::fs::write(
            &path,
            r#"{"version": "v1", "resources": [{"id": "a", "kind": "generic", "cost": 2}]}"#,
        )
        .unwrap();

        let manifest = Manifest::from_file(&path).unwrap();
        let descriptors = manifest.descriptors().unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].payload["kind"], "generic");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackpack.yaml");
        std::fs::write(&path, "version: v1").unwrap();
        assert!(matches!(
            Manifest::from_file(&path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}

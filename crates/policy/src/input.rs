//! The subset of the Terraform plan JSON schema the rules care about:
//! `resource_changes` with each change's planned `after` state.

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::Result;

#[derive(Debug, Default, Deserialize)]
pub struct PlanDoc {
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub change: Change,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub after: Json,
}

fn default_mode() -> String {
    "managed".to_string()
}

impl PlanDoc {
    /// Plan files run to megabytes; simd-json parses in place, consuming the
    /// buffer.
    pub fn from_slice(bytes: &mut [u8]) -> Result<Self> {
        Ok(simd_json::from_slice(bytes)?)
    }

    /// Managed resources of one type that still exist after apply.
    pub fn typed<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a ResourceChange, &'a Json)> + 'a {
        self.resource_changes
            .iter()
            .filter(move |rc| rc.resource_type == ty)
            .filter_map(|rc| rc.after().map(|after| (rc, after)))
    }
}

impl ResourceChange {
    /// Planned state, or None for deletions and data sources.
    pub fn after(&self) -> Option<&Json> {
        if self.mode != "managed" {
            return None;
        }
        self.change.after.is_object().then_some(&self.change.after)
    }
}

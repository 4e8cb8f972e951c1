//! Kubernetes manifest model: parses multi-document YAML streams (helm
//! template output, plain manifests) into a uniform shape the lint rules can
//! walk without caring which workload kind produced a pod spec.

use serde::Deserialize;
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to parse manifest document {index}: {source}")]
    Parse {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("manifest document {index} is missing '{field}'")]
    MissingField { index: usize, field: &'static str },
}

const WORKLOAD_KINDS: &[&str] =
    &["Deployment", "StatefulSet", "DaemonSet", "ReplicaSet", "Job", "CronJob", "Pod"];

/// Kinds where a replica count makes sense.
const REPLICATED_KINDS: &[&str] = &["Deployment", "StatefulSet", "ReplicaSet"];

#[derive(Debug, Clone)]
pub struct Manifest {
    pub kind: String,
    pub name: String,
    pub doc: Json,
}

impl Manifest {
    pub fn is_workload(&self) -> bool {
        WORKLOAD_KINDS.contains(&self.kind.as_str())
    }

    pub fn labels(&self) -> Option<&Json> {
        let labels = &self.doc["metadata"]["labels"];
        labels.is_object().then_some(labels)
    }

    /// The pod spec, wherever this kind nests it.
    pub fn pod_spec(&self) -> Option<&Json> {
        let spec = match self.kind.as_str() {
            "Pod" => &self.doc["spec"],
            "CronJob" => &self.doc["spec"]["jobTemplate"]["spec"]["template"]["spec"],
            _ => &self.doc["spec"]["template"]["spec"],
        };
        spec.is_object().then_some(spec)
    }

    /// Pod-level securityContext, if any.
    pub fn pod_security_context(&self) -> Option<&Json> {
        let ctx = &self.pod_spec()?["securityContext"];
        ctx.is_object().then_some(ctx)
    }

    /// Declared replicas. A replicated workload without the field runs one
    /// pod, so that defaults to 1; non-replicated kinds return None.
    pub fn replicas(&self) -> Option<u64> {
        if !REPLICATED_KINDS.contains(&self.kind.as_str()) {
            return None;
        }
        Some(self.doc["spec"]["replicas"].as_u64().unwrap_or(1))
    }

    /// All containers in the pod spec, init containers included.
    pub fn containers(&self) -> Vec<Container<'_>> {
        let Some(spec) = self.pod_spec() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (field, init) in [("containers", false), ("initContainers", true)] {
            if let Some(list) = spec[field].as_array() {
                for c in list {
                    out.push(Container {
                        name: c["name"].as_str().unwrap_or("<unnamed>"),
                        image: c["image"].as_str(),
                        body: c,
                        init,
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
    pub name: &'a str,
    pub image: Option<&'a str>,
    pub body: &'a Json,
    pub init: bool,
}

impl Container<'_> {
    pub fn security_context(&self) -> Option<&Json> {
        let ctx = &self.body["securityContext"];
        ctx.is_object().then_some(ctx)
    }

    pub fn resources(&self) -> &Json {
        &self.body["resources"]
    }
}

/// The tag part of an image reference. The colon must come after the last
/// slash so `registry:5000/app` is not mistaken for a tagged image, and
/// digest pins (`@sha256:...`) count as pinned rather than tagged.
pub fn image_tag(image: &str) -> Option<&str> {
    if image.contains('@') {
        return None;
    }
    let after_slash = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[after_slash..].rfind(':') {
        Some(i) => Some(&image[after_slash + i + 1..]),
        None => None,
    }
}

/// Parses a multi-document YAML stream. Empty documents are skipped; every
/// real document must carry a kind and a metadata.name.
pub fn parse_docs(text: &str) -> Result<Vec<Manifest>, ManifestError> {
    let mut out = Vec::new();
    for (index, de) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let doc = Json::deserialize(de).map_err(|source| ManifestError::Parse { index, source })?;
        if doc.is_null() {
            continue;
        }
        let kind = doc["kind"]
            .as_str()
            .ok_or(ManifestError::MissingField { index, field: "kind" })?
            .to_string();
        let name = doc["metadata"]["name"]
            .as_str()
            .ok_or(ManifestError::MissingField { index, field: "metadata.name" })?
            .to_string();
        out.push(Manifest { kind, name, doc });
    }
    Ok(out)
}

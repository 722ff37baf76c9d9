// kdebug-core/src/kube/model.rs
//! Deserialized shapes of `kubectl get -o json` output. Only the fields
//! the orchestrator reads; everything else in the payload is ignored.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default, rename = "nodeName")]
    pub node_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Pod {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: PodSpec,
}

impl Pod {
    pub fn containers(&self) -> &[Container] {
        &self.spec.containers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Namespace {
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct NamespaceList {
    #[serde(default)]
    pub items: Vec<Namespace>,
}

//! Testing utilities for setimg workspace
//!
//! Shared manifest fixtures and builders.

#![allow(missing_docs)]

use serde_yaml::{Mapping, Value};
use setimg_resource::{Resource, INDEX_ANNOTATION, PATH_ANNOTATION};

/// Builder for workload manifests
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    api_version: String,
    kind: String,
    name: String,
    namespace: Option<String>,
    file: Option<(String, usize)>,
    pod_path: Vec<&'static str>,
    containers: Vec<(String, String)>,
    init_containers: Vec<(String, String)>,
}

impl ManifestBuilder {
    pub fn new(api_version: &str, kind: &str, name: &str) -> Self {
        let pod_path = match kind {
            "Pod" => vec!["spec"],
            "CronJob" => vec!["spec", "jobTemplate", "spec", "template", "spec"],
            _ => vec!["spec", "template", "spec"],
        };
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: None,
            file: None,
            pod_path,
            containers: Vec::new(),
            init_containers: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn file(mut self, path: &str, index: usize) -> Self {
        self.file = Some((path.to_string(), index));
        self
    }

    pub fn container(mut self, name: &str, image: &str) -> Self {
        self.containers.push((name.to_string(), image.to_string()));
        self
    }

    pub fn init_container(mut self, name: &str, image: &str) -> Self {
        self.init_containers.push((name.to_string(), image.to_string()));
        self
    }

    pub fn build_value(&self) -> Value {
        let mut metadata = Mapping::new();
        metadata.insert("name".into(), self.name.as_str().into());
        if let Some(ns) = &self.namespace {
            metadata.insert("namespace".into(), ns.as_str().into());
        }
        if let Some((path, index)) = &self.file {
            let mut annotations = Mapping::new();
            annotations.insert(PATH_ANNOTATION.into(), path.as_str().into());
            annotations.insert(INDEX_ANNOTATION.into(), index.to_string().into());
            metadata.insert("annotations".into(), Value::Mapping(annotations));
        }

        let mut pod_spec = Mapping::new();
        if !self.init_containers.is_empty() {
            pod_spec.insert("initContainers".into(), containers(&self.init_containers));
        }
        pod_spec.insert("containers".into(), containers(&self.containers));

        let mut node = Value::Mapping(pod_spec);
        for key in self.pod_path.iter().rev() {
            let mut parent = Mapping::new();
            parent.insert((*key).into(), node);
            node = Value::Mapping(parent);
        }

        let mut root = Mapping::new();
        root.insert("apiVersion".into(), self.api_version.as_str().into());
        root.insert("kind".into(), self.kind.as_str().into());
        root.insert("metadata".into(), Value::Mapping(metadata));
        if let Value::Mapping(body) = node {
            root.extend(body);
        }
        Value::Mapping(root)
    }

    pub fn build(&self) -> Resource {
        Resource::from_value(self.build_value()).unwrap()
    }
}

fn containers(entries: &[(String, String)]) -> Value {
    Value::Sequence(
        entries
            .iter()
            .map(|(name, image)| {
                let mut c = Mapping::new();
                c.insert("name".into(), name.as_str().into());
                c.insert("image".into(), image.as_str().into());
                Value::Mapping(c)
            })
            .collect(),
    )
}

pub fn deployment(name: &str, image: &str) -> Resource {
    ManifestBuilder::new("apps/v1", "Deployment", name)
        .container("app", image)
        .build()
}

pub fn pod(name: &str, image: &str) -> Resource {
    ManifestBuilder::new("v1", "Pod", name)
        .container("app", image)
        .build()
}

pub fn config_map_value(name: &str, data: &[(&str, &str)]) -> Value {
    let mut metadata = Mapping::new();
    metadata.insert("name".into(), name.into());
    let mut body = Mapping::new();
    for (k, v) in data {
        body.insert((*k).into(), (*v).into());
    }
    let mut root = Mapping::new();
    root.insert("apiVersion".into(), "v1".into());
    root.insert("kind".into(), "ConfigMap".into());
    root.insert("metadata".into(), Value::Mapping(metadata));
    root.insert("data".into(), Value::Mapping(body));
    Value::Mapping(root)
}

/// Render a ResourceList document from items and an optional function config
pub fn resource_list_yaml(items: &[Value], function_config: Option<Value>) -> String {
    let mut root = Mapping::new();
    root.insert("apiVersion".into(), "config.kubernetes.io/v1".into());
    root.insert("kind".into(), "ResourceList".into());
    root.insert("items".into(), Value::Sequence(items.to_vec()));
    if let Some(config) = function_config {
        root.insert("functionConfig".into(), config);
    }
    serde_yaml::to_string(&Value::Mapping(root)).unwrap()
}

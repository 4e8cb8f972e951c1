//! Stack composition: modules declare resources and wiring, the stack
//! validates the wiring graph and merges everything into one tf.json document.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("module dependency cycle detected at '{0}'")]
    Cycle(String),
    #[error("duplicate module name '{0}'")]
    DuplicateModule(String),
    #[error("module '{module}' depends on unknown module '{dep}'")]
    UnknownDependency { module: String, dep: String },
}

/// A Terraform output exported by a module. List-valued outputs pass a JSON
/// array of interpolation strings; a single flat string would render as one
/// concatenated string in tf.json.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub value: Json,
    pub description: Option<String>,
}

impl Output {
    pub fn new(name: impl Into<String>, value: impl Into<Json>) -> Self {
        Self { name: name.into(), value: value.into(), description: None }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A group of related resources parameterized by environment config.
///
/// `deps` names the modules whose exported references this module embeds;
/// composition orders fragments accordingly and rejects cycles.
pub trait Module {
    fn name(&self) -> &str;
    fn deps(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
    /// The tf.json fragment contributed by this module.
    fn resources(&self) -> Json;
    fn outputs(&self) -> Vec<Output> {
        Vec::new()
    }
}

/// Deep-merges `b` into `a`; objects merge key-wise, anything else is replaced.
pub fn merge(a: Json, b: Json) -> Json {
    match (a, b) {
        (Json::Object(mut ma), Json::Object(mb)) => {
            for (k, v) in mb {
                let merged = match ma.remove(&k) {
                    Some(prev) => merge(prev, v),
                    None => v,
                };
                ma.insert(k, merged);
            }
            Json::Object(ma)
        }
        (_, b) => b,
    }
}

#[derive(Default)]
pub struct Stack {
    modules: Vec<Box<dyn Module>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Box<dyn Module>) -> &mut Self {
        self.modules.push(module);
        self
    }

    /// Merges all module fragments into `base` in dependency order and
    /// appends the collected `output` blocks.
    pub fn compose(&self, base: Json) -> Result<Json, StackError> {
        let order = self.sorted_order()?;

        let mut doc = base;
        for ix in order {
            doc = merge(doc, self.modules[ix].resources());
        }

        let mut outputs = serde_json::Map::new();
        for m in &self.modules {
            for out in m.outputs() {
                let mut body = serde_json::Map::new();
                body.insert("value".into(), out.value);
                if let Some(desc) = out.description {
                    body.insert("description".into(), Json::String(desc));
                }
                outputs.insert(out.name, Json::Object(body));
            }
        }
        if !outputs.is_empty() {
            doc = merge(doc, Json::Object([("output".to_string(), Json::Object(outputs))].into_iter().collect()));
        }

        Ok(doc)
    }

    fn sorted_order(&self) -> Result<Vec<usize>, StackError> {
        let mut g: DiGraph<usize, ()> = DiGraph::new();
        let mut by_name = HashMap::new();
        for (i, m) in self.modules.iter().enumerate() {
            let ix = g.add_node(i);
            if by_name.insert(m.name().to_string(), ix).is_some() {
                return Err(StackError::DuplicateModule(m.name().to_string()));
            }
        }
        for m in &self.modules {
            let to = by_name[m.name()];
            for dep in m.deps() {
                let from = *by_name.get(&dep).ok_or_else(|| StackError::UnknownDependency {
                    module: m.name().to_string(),
                    dep: dep.clone(),
                })?;
                g.add_edge(from, to, ());
            }
        }
        let sorted = toposort(&g, None).map_err(|c| {
            let i = g[c.node_id()];
            StackError::Cycle(self.modules[i].name().to_string())
        })?;
        Ok(sorted.into_iter().map(|ix| g[ix]).collect())
    }
}

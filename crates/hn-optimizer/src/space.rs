//! Parameter space derivation: from a catalog of configurable components to
//! the tuner's parameter declarations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use hn_types::{HnError, HnResult};

/// A single parameter of a component implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamSpec {
    /// A nested component of the given kind, chosen among its implementations.
    Component { name: String, kind: String },
    /// Integer range [low, high] inclusive.
    Int {
        name: String,
        low: i64,
        high: i64,
        log: bool,
    },
    /// Continuous range [low, high].
    Real {
        name: String,
        low: f64,
        high: f64,
        log: bool,
    },
    Bool { name: String },
    /// Categorical choices without nested parameters.
    Categorical { name: String, values: Vec<String> },
}

impl ParamSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Component { name, .. }
            | Self::Int { name, .. }
            | Self::Real { name, .. }
            | Self::Bool { name }
            | Self::Categorical { name, .. } => name,
        }
    }
}

/// One implementation of a component kind, e.g. a GRASP constructive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.params.push(ParamSpec::Component {
            name: name.into(),
            kind: kind.into(),
        });
        self
    }

    pub fn with_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.params.push(ParamSpec::Int {
            name: name.into(),
            low,
            high,
            log: false,
        });
        self
    }

    pub fn with_log_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.params.push(ParamSpec::Int {
            name: name.into(),
            low,
            high,
            log: true,
        });
        self
    }

    pub fn with_real(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.params.push(ParamSpec::Real {
            name: name.into(),
            low,
            high,
            log: false,
        });
        self
    }

    pub fn with_log_real(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.params.push(ParamSpec::Real {
            name: name.into(),
            low,
            high,
            log: true,
        });
        self
    }

    pub fn with_bool(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::Bool { name: name.into() });
        self
    }

    pub fn with_choice(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        self.params.push(ParamSpec::Categorical {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }
}

/// Static description of every configurable component, grouped by kind.
///
/// Kinds and implementations keep their registration order, which fixes the
/// order of the generated parameter file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCatalog {
    root_name: String,
    root_kind: String,
    kinds: Vec<(String, Vec<ComponentSpec>)>,
}

impl ComponentCatalog {
    /// `root_name` is the name of the top level parameter, chosen among the
    /// implementations of `root_kind`.
    pub fn new(root_name: impl Into<String>, root_kind: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            root_kind: root_kind.into(),
            kinds: Vec::new(),
        }
    }

    pub fn register(mut self, kind: &str, component: ComponentSpec) -> Self {
        match self.kinds.iter_mut().find(|(k, _)| k == kind) {
            Some((_, components)) => components.push(component),
            None => self.kinds.push((kind.to_string(), vec![component])),
        }
        self
    }

    pub fn implementations(&self, kind: &str) -> &[ComponentSpec] {
        self.kinds
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, components)| components.as_slice())
            .unwrap_or(&[])
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Derive the parameter tree, nesting component choices at most
    /// `max_depth` levels and repeating a kind at most `max_repetition` times
    /// along one derivation.
    ///
    /// Implementations whose required components cannot be derived within
    /// those bounds are left out.
    pub fn build_tree(&self, max_depth: usize, max_repetition: usize) -> HnResult<ParameterNode> {
        let mut path = HashMap::new();
        let limits = Limits {
            max_depth,
            max_repetition,
        };
        self.derive_choice(&self.root_name, &self.root_kind, 1, &mut path, limits)
            .ok_or(HnError::EmptySearchSpace { max_depth })
    }

    fn derive_choice(
        &self,
        name: &str,
        kind: &str,
        depth: usize,
        path: &mut HashMap<String, usize>,
        limits: Limits,
    ) -> Option<ParameterNode> {
        if depth > limits.max_depth {
            return None;
        }
        let seen = path.get(kind).copied().unwrap_or(0);
        if seen >= limits.max_repetition {
            return None;
        }

        path.insert(kind.to_string(), seen + 1);
        let options: Vec<ChoiceOption> = self
            .implementations(kind)
            .iter()
            .filter_map(|component| self.derive_option(name, component, depth, path, limits))
            .collect();
        path.insert(kind.to_string(), seen);

        if options.is_empty() {
            None
        } else {
            Some(ParameterNode::Choice {
                name: name.to_string(),
                options,
            })
        }
    }

    fn derive_option(
        &self,
        parent: &str,
        component: &ComponentSpec,
        depth: usize,
        path: &mut HashMap<String, usize>,
        limits: Limits,
    ) -> Option<ChoiceOption> {
        let mut children = Vec::with_capacity(component.params.len());
        for param in &component.params {
            let name = format!("{parent}.{}.{}", component.name, param.name());
            let child = match param {
                ParamSpec::Component { kind, .. } => {
                    // A required component that cannot be derived rules out the option.
                    self.derive_choice(&name, kind, depth + 1, path, limits)?
                }
                ParamSpec::Int { low, high, log, .. } => ParameterNode::Range {
                    name,
                    domain: RangeDomain::Int {
                        low: *low,
                        high: *high,
                        log: *log,
                    },
                },
                ParamSpec::Real { low, high, log, .. } => ParameterNode::Range {
                    name,
                    domain: RangeDomain::Real {
                        low: *low,
                        high: *high,
                        log: *log,
                    },
                },
                ParamSpec::Bool { .. } => ParameterNode::Range {
                    name,
                    domain: RangeDomain::Bool,
                },
                ParamSpec::Categorical { values, .. } if values.is_empty() => continue,
                ParamSpec::Categorical { values, .. } => ParameterNode::Choice {
                    name,
                    options: values
                        .iter()
                        .map(|value| ChoiceOption {
                            value: value.clone(),
                            children: Vec::new(),
                        })
                        .collect(),
                },
            };
            children.push(child);
        }
        Some(ChoiceOption {
            value: component.name.clone(),
            children,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_depth: usize,
    max_repetition: usize,
}

/// A node of the derived parameter tree. Every node is one tuner parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterNode {
    /// Categorical decision; children of an option are only active when that
    /// option is selected.
    Choice {
        name: String,
        options: Vec<ChoiceOption>,
    },
    Range { name: String, domain: RangeDomain },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub children: Vec<ParameterNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeDomain {
    Int { low: i64, high: i64, log: bool },
    Real { low: f64, high: f64, log: bool },
    Bool,
}

impl ParameterNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Choice { name, .. } | Self::Range { name, .. } => name,
        }
    }

    /// Number of parameters in this subtree, the node included.
    pub fn parameter_count(&self) -> usize {
        match self {
            Self::Range { .. } => 1,
            Self::Choice { options, .. } => {
                1 + options
                    .iter()
                    .flat_map(|option| option.children.iter())
                    .map(ParameterNode::parameter_count)
                    .sum::<usize>()
            }
        }
    }

    /// Deepest nesting of choices below and including this node.
    pub fn depth(&self) -> usize {
        match self {
            Self::Range { .. } => 0,
            Self::Choice { options, .. } => {
                1 + options
                    .iter()
                    .flat_map(|option| option.children.iter())
                    .map(ParameterNode::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

/// Render the tree as parameter file lines, one per node in preorder.
///
/// Each line has the form `name "name=" type (domain) [| condition]`, the
/// switch makes the tuner pass `name=value` tokens to the target runner.
pub fn to_param_file_lines(root: &ParameterNode) -> Vec<String> {
    let mut lines = Vec::new();
    emit(root, None, &mut lines);
    lines
}

fn emit(node: &ParameterNode, condition: Option<(&str, &str)>, lines: &mut Vec<String>) {
    let (kind, domain) = match node {
        ParameterNode::Choice { options, .. } => {
            let values: Vec<String> = options.iter().map(|o| format!("\"{}\"", o.value)).collect();
            ("c", values.join(", "))
        }
        ParameterNode::Range { domain, .. } => match domain {
            RangeDomain::Int { low, high, log } => {
                (if *log { "i,log" } else { "i" }, format!("{low}, {high}"))
            }
            RangeDomain::Real { low, high, log } => {
                (if *log { "r,log" } else { "r" }, format!("{low:?}, {high:?}"))
            }
            RangeDomain::Bool => ("c", "\"true\", \"false\"".to_string()),
        },
    };

    let name = node.name();
    let mut line = format!("{name} \"{name}=\" {kind} ({domain})");
    if let Some((parent, value)) = condition {
        line.push_str(&format!(" | {parent} %in% c(\"{value}\")"));
    }
    lines.push(line);

    if let ParameterNode::Choice { options, .. } = node {
        for option in options {
            for child in &option.children {
                emit(child, Some((name, &option.value)), lines);
            }
        }
    }
}

/// Derived parameter tree together with its rendered declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    root: ParameterNode,
    lines: Vec<String>,
}

impl ParameterSpace {
    pub fn derive(
        catalog: &ComponentCatalog,
        max_depth: usize,
        max_repetition: usize,
    ) -> HnResult<Self> {
        let root = catalog.build_tree(max_depth, max_repetition)?;
        let lines = to_param_file_lines(&root);
        if lines.is_empty() {
            return Err(HnError::EmptySearchSpace { max_depth });
        }
        Ok(Self { root, lines })
    }

    pub fn root(&self) -> &ParameterNode {
        &self.root
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn parameter_count(&self) -> usize {
        self.lines.len()
    }
}

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Node label in the documentation graph.
///
/// Declaration order is the canonical index order: retrieval merges the
/// per-label candidate lists in this order and uses it to break score ties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityLabel {
    Component,
    Prop,
    Hook,
    Util,
    Type,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 5] = [
        Self::Component,
        Self::Prop,
        Self::Hook,
        Self::Util,
        Self::Type,
    ];

    /// Label as stored in the database and printed in context blocks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "Component",
            Self::Prop => "Prop",
            Self::Hook => "Hook",
            Self::Util => "Util",
            Self::Type => "Type",
        }
    }

    /// Name of the per-label vector index.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::Component => "component_descriptions",
            Self::Prop => "prop_descriptions",
            Self::Hook => "hook_descriptions",
            Self::Util => "util_descriptions",
            Self::Type => "type_descriptions",
        }
    }
}

impl FromStr for EntityLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Component" => Ok(Self::Component),
            "Prop" => Ok(Self::Prop),
            "Hook" => Ok(Self::Hook),
            "Util" => Ok(Self::Util),
            "Type" => Ok(Self::Type),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── extraction schema ───────────────────────────────────────────────

/// A prop accepted by a component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prop {
    pub name: String,
    /// TypeScript type signature, e.g. `Node<CustomData>[]`.
    #[serde(rename = "type", default)]
    pub type_signature: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// A parameter accepted by a hook or utility function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_signature: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Option<Vec<Prop>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hook {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Option<Vec<Param>>,
    #[serde(default)]
    pub return_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Util {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Option<Vec<Param>>,
    #[serde(default)]
    pub return_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Everything extracted from one documentation page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedData {
    #[serde(default)]
    pub components: Option<Vec<Component>>,
    #[serde(default)]
    pub hooks: Option<Vec<Hook>>,
    #[serde(default)]
    pub utils: Option<Vec<Util>>,
    #[serde(default)]
    pub types: Option<Vec<TypeDefinition>>,
}

impl ExtractedData {
    pub fn is_empty(&self) -> bool {
        self.components.as_ref().is_none_or(Vec::is_empty)
            && self.hooks.as_ref().is_none_or(Vec::is_empty)
            && self.utils.as_ref().is_none_or(Vec::is_empty)
            && self.types.as_ref().is_none_or(Vec::is_empty)
    }
}

// ── stored graph ────────────────────────────────────────────────────

/// A node as read back from the entity store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityNode {
    pub label: EntityLabel,
    pub name: String,
    pub description: String,
    pub url: Option<String>,
    /// Owning component name (Props only; part of the Prop's key).
    pub component: Option<String>,
    /// Raw type signature (Props only).
    pub type_signature: Option<String>,
    pub default_value: Option<String>,
    /// Return-value description (Hooks and Utils only).
    pub returns: Option<String>,
    /// Parameters (Hooks and Utils only).
    #[serde(default)]
    pub params: Vec<Param>,
}

impl EntityNode {
    /// Bare node with only the required attributes filled in.
    pub fn new(label: EntityLabel, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label,
            name: name.into(),
            description: description.into(),
            url: None,
            component: None,
            type_signature: None,
            default_value: None,
            returns: None,
            params: Vec::new(),
        }
    }

    pub fn component(name: &str, description: &str, url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::new(EntityLabel::Component, name, description)
        }
    }

    pub fn prop(component: &str, prop: &Prop) -> Self {
        Self {
            component: Some(component.to_string()),
            type_signature: Some(prop.type_signature.clone()),
            default_value: prop.default.clone(),
            ..Self::new(EntityLabel::Prop, &prop.name, &prop.description)
        }
    }

    pub fn hook(hook: &Hook, url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            returns: Some(hook.return_value.clone().unwrap_or_default()),
            params: hook.params.clone().unwrap_or_default(),
            ..Self::new(EntityLabel::Hook, &hook.name, &hook.description)
        }
    }

    pub fn util(util: &Util, url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            returns: Some(util.return_value.clone().unwrap_or_default()),
            params: util.params.clone().unwrap_or_default(),
            ..Self::new(EntityLabel::Util, &util.name, &util.description)
        }
    }

    pub fn type_definition(type_def: &TypeDefinition, url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::new(EntityLabel::Type, &type_def.name, &type_def.description)
        }
    }
}

/// One hit from a per-label similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: EntityNode,
    pub score: f32,
    /// Position inside the per-label result list (0 = best).
    pub rank: usize,
}

// ── pipeline hand-off documents ─────────────────────────────────────

/// A fetched page, before HTML conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

/// A page converted to structured markdown, ready for extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedDocument {
    pub url: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        for label in EntityLabel::ALL {
            assert_eq!(label.as_str().parse::<EntityLabel>(), Ok(label));
        }
        assert!("Param".parse::<EntityLabel>().is_err());
    }

    #[test]
    fn test_label_order_is_index_order() {
        let mut labels = vec![
            EntityLabel::Type,
            EntityLabel::Hook,
            EntityLabel::Component,
            EntityLabel::Util,
            EntityLabel::Prop,
        ];
        labels.sort();
        assert_eq!(labels, EntityLabel::ALL.to_vec());
    }

    #[test]
    fn test_extracted_data_accepts_partial_json() {
        let raw = r#"{
            "components": [{
                "name": "ReactFlow",
                "description": "The main component.",
                "props": [{"name": "nodeOrigin", "type": "[number, number]", "default": null, "description": "Origin point"}]
            }],
            "hooks": null
        }"#;
        let data: ExtractedData = serde_json::from_str(raw).unwrap();

        let components = data.components.as_ref().unwrap();
        assert_eq!(components[0].name, "ReactFlow");
        let props = components[0].props.as_ref().unwrap();
        assert_eq!(props[0].type_signature, "[number, number]");
        assert!(props[0].default.is_none());
        assert!(data.hooks.is_none());
        assert!(data.types.is_none());
        assert!(!data.is_empty());
        assert!(ExtractedData::default().is_empty());
    }
}

//! Schema types and builders for tfplug
//!
//! Schemas describe the shape of provider configuration, resource state and
//! data source state. They are sent to Terraform in `GetProviderSchema` and
//! also drive the framework's own planning: defaults, computed values,
//! replacement and the final conforming of state to the declared object type.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
/// This must match Terraform's type system exactly
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    pub fn list_of(element: AttributeType) -> Self {
        AttributeType::List(Box::new(element))
    }

    pub fn set_of(element: AttributeType) -> Self {
        AttributeType::Set(Box::new(element))
    }

    pub fn map_of(element: AttributeType) -> Self {
        AttributeType::Map(Box::new(element))
    }

    /// Terraform's JSON type notation: `"string"`, `["list","string"]`,
    /// `["object",{"name":"string"}]`.
    pub fn to_type_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};

        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(e) => json!(["list", e.to_type_json()]),
            AttributeType::Set(e) => json!(["set", e.to_type_json()]),
            AttributeType::Map(e) => json!(["map", e.to_type_json()]),
            AttributeType::Object(fields) => {
                let sorted: BTreeMap<&String, Value> =
                    fields.iter().map(|(k, v)| (k, v.to_type_json())).collect();
                json!(["object", sorted])
            }
        }
    }

    /// Bytes for the `type` field of `Schema.Attribute`.
    pub fn encode(&self) -> Vec<u8> {
        self.to_type_json().to_string().into_bytes()
    }

    /// Normalise a value to this type: objects gain every declared field
    /// (null when absent), collections conform element-wise.
    pub fn conform(&self, value: &Dynamic) -> Dynamic {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => value.clone(),
            (AttributeType::List(e), Dynamic::List(items))
            | (AttributeType::Set(e), Dynamic::List(items)) => {
                Dynamic::List(items.iter().map(|v| e.conform(v)).collect())
            }
            (AttributeType::Map(e), Dynamic::Map(m)) => Dynamic::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), e.conform(v)))
                    .collect(),
            ),
            (AttributeType::Object(fields), Dynamic::Map(m)) => Dynamic::Map(
                fields
                    .iter()
                    .map(|(k, t)| (k.clone(), t.conform(m.get(k).unwrap_or(&Dynamic::Null))))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    /// Conform a whole state or config value to the root block.
    pub fn conform(&self, value: &DynamicValue) -> DynamicValue {
        DynamicValue::new(self.block.conform(&value.value))
    }
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

impl Block {
    pub fn empty() -> Self {
        Self {
            version: 0,
            attributes: Vec::new(),
            block_types: Vec::new(),
            description: String::new(),
            description_kind: StringKind::Plain,
            deprecated: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    /// Produce a value containing exactly the declared attributes and nested
    /// blocks. Missing attributes become null, missing list/set blocks become
    /// empty lists, and undeclared keys are dropped.
    pub fn conform(&self, value: &Dynamic) -> Dynamic {
        let Dynamic::Map(m) = value else {
            return value.clone();
        };

        let mut out = HashMap::with_capacity(self.attributes.len() + self.block_types.len());
        for attr in &self.attributes {
            let v = m.get(&attr.name).unwrap_or(&Dynamic::Null);
            out.insert(attr.name.clone(), attr.r#type.conform(v));
        }
        for nested in &self.block_types {
            let v = m.get(&nested.type_name).unwrap_or(&Dynamic::Null);
            out.insert(nested.type_name.clone(), nested.conform(v));
        }
        Dynamic::Map(out)
    }
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn Default>>,
    pub deprecated: bool,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "validators",
                &self
                    .validators
                    .iter()
                    .map(|v| v.description())
                    .collect::<Vec<_>>(),
            )
            .field(
                "plan_modifiers",
                &self
                    .plan_modifiers
                    .iter()
                    .map(|m| m.description())
                    .collect::<Vec<_>>(),
            )
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .finish()
    }
}

/// NestedBlock represents a nested configuration block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
    /// Any change to the block's contents forces a new resource.
    pub requires_replace: bool,
}

impl NestedBlock {
    pub fn conform(&self, value: &Dynamic) -> Dynamic {
        match (self.nesting, value) {
            (_, Dynamic::Unknown) => Dynamic::Unknown,
            (NestingMode::List | NestingMode::Set, Dynamic::List(items)) => {
                Dynamic::List(items.iter().map(|v| self.block.conform(v)).collect())
            }
            (NestingMode::List | NestingMode::Set, Dynamic::Null) => Dynamic::List(Vec::new()),
            (NestingMode::Map, Dynamic::Map(m)) => Dynamic::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), self.block.conform(v)))
                    .collect(),
            ),
            (NestingMode::Map, Dynamic::Null) => Dynamic::Map(HashMap::new()),
            (NestingMode::Group, Dynamic::Null) => {
                self.block.conform(&Dynamic::Map(HashMap::new()))
            }
            (_, v) => self.block.conform(v),
        }
    }
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingMode {
    Invalid,
    Single,
    List,
    Set,
    Map,
    Group,
}

/// StringKind represents the format of string values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Plain,
    Markdown,
}

/// Validator checks an attribute's configured value at validate time.
/// Null and unknown values are never passed to validators.
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// PlanModifier adjusts an attribute's planned value during an update plan.
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse;
}

pub struct PlanModifierRequest {
    pub config_value: DynamicValue,
    pub state_value: DynamicValue,
    pub plan_value: DynamicValue,
    pub path: AttributePath,
}

pub struct PlanModifierResponse {
    pub plan_value: DynamicValue,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Default supplies a value for an optional+computed attribute left unset
/// in configuration.
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: DynamicValue,
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
                deprecated: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(Arc::from(modifier));
        self
    }

    /// Defaults only apply to optional+computed attributes, so this marks the
    /// attribute computed as well.
    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(Arc::from(default));
        self.attribute.computed = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// NestedBlockBuilder builds `NestedBlock`s the same way `SchemaBuilder`
/// builds the root block.
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block::empty(),
                nesting,
                min_items: 0,
                max_items: 0,
                requires_replace: false,
            },
        }
    }

    /// A `LIST` block holding at most one element, the usual encoding for an
    /// optional sub-object.
    pub fn single_list(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::List).max_items(1)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.nested.requires_replace = true;
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::empty(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Component registry contract and a schema-backed implementation

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;

/// One validation problem on one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of `ComponentRegistry::validate`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Placeholder markup shown while a component body is still streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pub html: String,
    /// Reserved height in pixels
    pub height: u32,
}

impl Skeleton {
    /// Generic placeholder of the given height
    pub fn sized(name: &str, height: u32) -> Self {
        Self {
            html: format!(
                "<div class=\"livellm-skeleton livellm-skeleton-{name}\" style=\"height:{height}px\"></div>"
            ),
            height,
        }
    }
}

/// Registry of mountable components.
///
/// Called synchronously from the render path. Implementations may panic or
/// return nonsense; callers isolate every call.
pub trait ComponentRegistry: Send + Sync {
    /// Whether `name` is a known component
    fn has(&self, name: &str) -> bool;

    /// Check props (after alias resolution and defaults) against the component
    fn validate(&self, name: &str, props: &Map<String, Value>) -> ValidationResult;

    /// Fill in absent props that have declared defaults
    fn apply_defaults(&self, name: &str, props: Map<String, Value>) -> Map<String, Value>;

    /// Placeholder for a component whose body is still arriving
    fn skeleton(&self, name: &str) -> Option<Skeleton>;
}

/// JSON value kinds a prop may be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl PropKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            PropKind::String => value.is_string(),
            PropKind::Number => value.is_number(),
            PropKind::Boolean => value.is_boolean(),
            PropKind::Array => value.is_array(),
            PropKind::Object => value.is_object(),
            PropKind::Any => true,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PropKind::String => "string",
            PropKind::Number => "number",
            PropKind::Boolean => "boolean",
            PropKind::Array => "array",
            PropKind::Object => "object",
            PropKind::Any => "any",
        }
    }
}

/// Declared property of a component
#[derive(Debug, Clone)]
pub struct PropSchema {
    pub name: String,
    pub kind: PropKind,
    pub required: bool,
    pub default: Option<Value>,
    /// Allowed string values, when restricted
    pub one_of: Vec<String>,
}

impl PropSchema {
    pub fn required(name: &str, kind: PropKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
            one_of: Vec::new(),
        }
    }

    pub fn optional(name: &str, kind: PropKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.one_of = values.iter().map(|v| v.to_string()).collect();
        self
    }

    fn check(&self, props: &Map<String, Value>, errors: &mut Vec<FieldError>) {
        let Some(value) = props.get(&self.name) else {
            if self.required {
                errors.push(FieldError::new(&self.name, "required"));
            }
            return;
        };

        if !self.kind.matches(value) {
            errors.push(FieldError::new(
                &self.name,
                format!("expected {}", self.kind.as_str()),
            ));
            return;
        }

        if let Some(s) = value.as_str() {
            if !self.one_of.is_empty() && !self.one_of.iter().any(|allowed| allowed == s) {
                errors.push(FieldError::new(
                    &self.name,
                    format!("must be one of: {}", self.one_of.join(", ")),
                ));
            }
        }
    }
}

/// Declared component
#[derive(Debug, Clone)]
pub struct ComponentSchema {
    pub name: String,
    pub props: Vec<PropSchema>,
    pub skeleton: Skeleton,
}

impl ComponentSchema {
    pub fn new(name: &str, skeleton_height: u32) -> Self {
        Self {
            name: name.to_string(),
            props: Vec::new(),
            skeleton: Skeleton::sized(name, skeleton_height),
        }
    }

    pub fn prop(mut self, prop: PropSchema) -> Self {
        self.props.push(prop);
        self
    }
}

/// Registry backed by declared `ComponentSchema`s
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, ComponentSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry declaring the components the built-in detectors produce
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            ComponentSchema::new("table", 200)
                .prop(PropSchema::required("columns", PropKind::Array))
                .prop(PropSchema::required("rows", PropKind::Array))
                .prop(PropSchema::optional("caption", PropKind::String)),
        );
        registry.register(
            ComponentSchema::new("chart", 240)
                .prop(
                    PropSchema::optional("type", PropKind::String)
                        .with_default(json!("bar"))
                        .one_of(&["bar", "line", "pie", "area"]),
                )
                .prop(PropSchema::required("data", PropKind::Array))
                .prop(PropSchema::optional("unit", PropKind::String))
                .prop(PropSchema::optional("title", PropKind::String)),
        );
        registry.register(
            ComponentSchema::new("alert", 64)
                .prop(
                    PropSchema::optional("type", PropKind::String)
                        .with_default(json!("info"))
                        .one_of(&["info", "success", "warning", "error"]),
                )
                .prop(PropSchema::optional("title", PropKind::String))
                .prop(PropSchema::required("text", PropKind::String)),
        );
        registry.register(
            ComponentSchema::new("choice", 160)
                .prop(PropSchema::required("question", PropKind::String))
                .prop(PropSchema::required("options", PropKind::Array))
                .prop(PropSchema::optional("multiple", PropKind::Boolean).with_default(json!(false))),
        );
        registry.register(
            ComponentSchema::new("steps", 180).prop(PropSchema::required("steps", PropKind::Array)),
        );
        registry
    }

    /// Add or replace a component declaration
    pub fn register(&mut self, schema: ComponentSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl ComponentRegistry for SchemaRegistry {
    fn has(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    fn validate(&self, name: &str, props: &Map<String, Value>) -> ValidationResult {
        let Some(schema) = self.schemas.get(name) else {
            return ValidationResult::from_errors(vec![FieldError::new(name, "unknown component")]);
        };
        let mut errors = Vec::new();
        for prop in &schema.props {
            prop.check(props, &mut errors);
        }
        ValidationResult::from_errors(errors)
    }

    fn apply_defaults(&self, name: &str, mut props: Map<String, Value>) -> Map<String, Value> {
        if let Some(schema) = self.schemas.get(name) {
            for prop in &schema.props {
                if let Some(default) = &prop.default {
                    props
                        .entry(prop.name.clone())
                        .or_insert_with(|| default.clone());
                }
            }
        }
        props
    }

    fn skeleton(&self, name: &str) -> Option<Skeleton> {
        self.schemas.get(name).map(|s| s.skeleton.clone())
    }
}

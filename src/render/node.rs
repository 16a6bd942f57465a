//! Rendered node model

use crate::component::registry::FieldError;
use crate::error::ComponentError;
use serde_json::{Map, Value};

/// Stable handle of a mounted node
pub type NodeId = u64;

/// Placeholder left in text html where an inline component goes
pub fn inline_placeholder(index: usize) -> String {
    format!("<livellm-inline index=\"{index}\"></livellm-inline>")
}

/// Something a mount sink can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Converted markdown between components. `html` may contain inline
    /// placeholders indexing into `inline`.
    Text { html: String, inline: Vec<Node> },
    /// Stand-in for a component whose body is still streaming
    Skeleton {
        component: String,
        html: String,
        height: u32,
    },
    /// A live component
    Component { name: String, props: Value },
    /// Raw source shown because the component could not be mounted
    Fallback {
        component: String,
        kind: &'static str,
        raw: String,
        message: String,
    },
    /// Props failed validation; one entry per field problem
    ValidationError {
        component: String,
        errors: Vec<FieldError>,
    },
    /// Trailing streaming cursor
    Cursor,
}

impl Node {
    /// Node for a resolved component, or the matching failure visualization
    pub fn from_resolution(
        name: &str,
        raw: &str,
        result: Result<Map<String, Value>, ComponentError>,
    ) -> Self {
        match result {
            Ok(props) => Node::Component {
                name: name.to_string(),
                props: Value::Object(props),
            },
            Err(ComponentError::SchemaValidation { name, errors }) => {
                Node::ValidationError {
                    component: name,
                    errors,
                }
            }
            Err(err) => Node::fallback(&err, raw),
        }
    }

    pub fn fallback(err: &ComponentError, raw: &str) -> Self {
        Node::Fallback {
            component: err.component().to_string(),
            kind: err.kind(),
            raw: raw.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_skeleton(&self) -> bool {
        matches!(self, Node::Skeleton { .. })
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Node::Component { .. })
    }

    /// Deterministic HTML-like markup
    pub fn to_markup(&self) -> String {
        match self {
            Node::Text { html, inline } => {
                let mut out = html.clone();
                for (index, node) in inline.iter().enumerate() {
                    out = out.replacen(&inline_placeholder(index), &node.to_markup(), 1);
                }
                out
            }
            Node::Skeleton { html, .. } => html.clone(),
            Node::Component { name, props } => {
                let props = serde_json::to_string(props).unwrap_or_else(|_| "{}".to_string());
                format!(
                    "<livellm-{name} props=\"{}\"></livellm-{name}>",
                    escape_html(&props)
                )
            }
            Node::Fallback {
                component,
                kind,
                raw,
                ..
            } => format!(
                "<div class=\"livellm-fallback\" data-component=\"{}\" data-error=\"{kind}\"><pre><code>{}</code></pre></div>",
                escape_html(component),
                escape_html(raw)
            ),
            Node::ValidationError { component, errors } => {
                let items: String = errors
                    .iter()
                    .map(|e| format!("<li>{}</li>", escape_html(&e.to_string())))
                    .collect();
                format!(
                    "<div class=\"livellm-error\" data-component=\"{}\"><ul>{items}</ul></div>",
                    escape_html(component)
                )
            }
            Node::Cursor => "<span class=\"livellm-cursor\"></span>".to_string(),
        }
    }
}

/// Escape text for use in element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_fallback_markup_escapes_raw() {
        let err = ComponentError::Incomplete("alert".to_string());
        let node = Node::fallback(&err, "```livellm:alert\n{\"a\":<");
        assert_eq!(
            node.to_markup(),
            "<div class=\"livellm-fallback\" data-component=\"alert\" data-error=\"incomplete\"><pre><code>```livellm:alert\n{&quot;a&quot;:&lt;</code></pre></div>"
        );
    }

    #[test]
    fn test_inline_placeholders_substituted() {
        let node = Node::Text {
            html: format!("<p>a {} b</p>\n", inline_placeholder(0)),
            inline: vec![Node::Component {
                name: "badge".to_string(),
                props: json!({"text": "new"}),
            }],
        };
        assert_eq!(
            node.to_markup(),
            "<p>a <livellm-badge props=\"{&quot;text&quot;:&quot;new&quot;}\"></livellm-badge> b</p>\n"
        );
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let node = Node::from_resolution(
            "alert",
            "",
            Err(ComponentError::SchemaValidation {
                name: "alert".to_string(),
                errors: vec![FieldError::new("text", "required")],
            }),
        );
        assert_eq!(
            node.to_markup(),
            "<div class=\"livellm-error\" data-component=\"alert\"><ul><li>text: required</li></ul></div>"
        );
    }
}

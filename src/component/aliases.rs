//! Property alias resolution
//!
//! Models are loose about property names (`message` vs `text`, `points` vs
//! `data`). Aliases are resolved once, when a body is parsed, so everything
//! downstream sees canonical names only.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// One canonical property and the names accepted for it, in priority order
#[derive(Debug, Clone)]
struct AliasRule {
    canonical: String,
    aliases: Vec<String>,
}

impl AliasRule {
    /// Rename the first present alias to the canonical name, unless the
    /// canonical name is already present.
    fn apply(&self, props: &mut Map<String, Value>) {
        if props.contains_key(&self.canonical) {
            return;
        }
        let found = self.aliases.iter().find(|a| props.contains_key(a.as_str()));
        if let Some(alias) = found {
            if let Some(value) = props.remove(alias.as_str()) {
                props.insert(self.canonical.clone(), value);
            }
        }
    }
}

/// Alias rules per component, plus rules for objects inside array props
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    props: HashMap<String, Vec<AliasRule>>,
    items: HashMap<(String, String), Vec<AliasRule>>,
}

impl AliasTable {
    /// Table with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Aliases for the built-in components
    pub fn builtin() -> Self {
        Self::new()
            .rule("alert", "text", &["message", "content", "body"])
            .rule("alert", "type", &["variant", "level", "severity"])
            .rule("chart", "data", &["points", "values", "series"])
            .item_rule("chart", "data", "label", &["name", "x", "key"])
            .item_rule("chart", "data", "value", &["y", "count", "amount"])
            .rule("choice", "options", &["choices", "answers"])
            .rule("steps", "steps", &["items"])
            .item_rule("steps", "steps", "title", &["name", "label"])
            .item_rule("steps", "steps", "detail", &["description", "body"])
    }

    /// Add a top-level alias rule for `component`
    pub fn rule(mut self, component: &str, canonical: &str, aliases: &[&str]) -> Self {
        self.props
            .entry(component.to_string())
            .or_default()
            .push(make_rule(canonical, aliases));
        self
    }

    /// Add a rule applied to each object inside the array prop `field`
    pub fn item_rule(
        mut self,
        component: &str,
        field: &str,
        canonical: &str,
        aliases: &[&str],
    ) -> Self {
        self.items
            .entry((component.to_string(), field.to_string()))
            .or_default()
            .push(make_rule(canonical, aliases));
        self
    }

    /// Rewrite `props` to canonical names in place
    pub fn normalize(&self, component: &str, props: &mut Map<String, Value>) {
        if let Some(rules) = self.props.get(component) {
            for rule in rules {
                rule.apply(props);
            }
        }

        for ((owner, field), rules) in &self.items {
            if owner != component {
                continue;
            }
            if let Some(Value::Array(items)) = props.get_mut(field) {
                for item in items.iter_mut() {
                    if let Value::Object(obj) = item {
                        for rule in rules {
                            rule.apply(obj);
                        }
                    }
                }
            }
        }
    }
}

fn make_rule(canonical: &str, aliases: &[&str]) -> AliasRule {
    AliasRule {
        canonical: canonical.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalized(component: &str, value: Value) -> Value {
        let Value::Object(mut props) = value else {
            panic!("test input must be an object");
        };
        AliasTable::builtin().normalize(component, &mut props);
        Value::Object(props)
    }

    #[test]
    fn test_alias_renamed() {
        let out = normalized("alert", json!({"message": "hi", "level": "warning"}));
        assert_eq!(out, json!({"text": "hi", "type": "warning"}));
    }

    #[test]
    fn test_canonical_wins_over_alias() {
        let out = normalized("alert", json!({"text": "a", "message": "b"}));
        assert_eq!(out, json!({"text": "a", "message": "b"}));
    }

    #[test]
    fn test_first_listed_alias_wins() {
        let out = normalized("alert", json!({"body": "late", "content": "early"}));
        assert_eq!(out["text"], "early");
        assert_eq!(out["body"], "late");
    }

    #[test]
    fn test_nested_items() {
        let out = normalized("chart", json!({"points": [{"name": "a", "y": 1}, {"label": "b", "value": 2}]}));
        assert_eq!(out, json!({"data": [{"label": "a", "value": 1}, {"label": "b", "value": 2}]}));
    }

    #[test]
    fn test_other_components_untouched() {
        let out = normalized("table", json!({"message": "x"}));
        assert_eq!(out, json!({"message": "x"}));
    }
}

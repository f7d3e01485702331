//! JSON request templating.
//!
//! Templates are JSON documents containing `<name>` placeholders. Rendering is
//! plain text substitution: string placeholders must already sit inside quotes
//! in the template, and booleans are written bare so they land as JSON
//! booleans.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::AppError;

/// A value substituted for a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Text(String),
    Bool(bool),
    Null,
}

impl TokenValue {
    /// Textual form written into the template.
    pub fn render(&self) -> &str {
        match self {
            TokenValue::Text(s) => s,
            TokenValue::Bool(true) => "true",
            TokenValue::Bool(false) => "false",
            TokenValue::Null => "",
        }
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::Text(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        TokenValue::Text(value)
    }
}

impl From<bool> for TokenValue {
    fn from(value: bool) -> Self {
        TokenValue::Bool(value)
    }
}

impl<T: Into<TokenValue>> From<Option<T>> for TokenValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TokenValue::Null, Into::into)
    }
}

/// Placeholder name to value.
pub type Tokens = HashMap<String, TokenValue>;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    // Non-greedy by construction: a tag name cannot contain '<' or '>'.
    TAG.get_or_init(|| Regex::new(r"<([A-Za-z0-9_]+)>").expect("static tag pattern"))
}

/// Replaces every `<name>` tag in `template` with its token value.
///
/// Tags missing from `tokens` render as the empty string.
pub fn render_template(template: &str, tokens: &Tokens) -> String {
    tag_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match tokens.get(name) {
                Some(value) => value.render().to_string(),
                None => {
                    tracing::debug!("No token supplied for <{}>, using empty string", name);
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Reads a template file and renders it with `tokens`.
pub fn tokenize_json(path: impl AsRef<Path>, tokens: &Tokens) -> Result<String, AppError> {
    let path = path.as_ref();
    let template = std::fs::read_to_string(path).map_err(|e| {
        AppError::Template(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(render_template(&template, tokens))
}

/// Token map for the order template.
pub fn order_tokens(
    consumer_id: Option<&str>,
    portfolio_id: Option<&str>,
    sku: Option<&str>,
) -> Tokens {
    Tokens::from([
        ("consumer_id".to_string(), consumer_id.into()),
        ("portfolio_id".to_string(), portfolio_id.into()),
        ("sku".to_string(), sku.into()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, TokenValue)]) -> Tokens {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_booleans_render_as_json_literals() {
        let rendered = render_template(
            r#"{"a": <yes>, "b": <no>}"#,
            &tokens(&[("yes", true.into()), ("no", false.into())]),
        );
        assert_eq!(rendered, r#"{"a": true, "b": false}"#);
    }

    #[test]
    fn test_missing_and_null_tokens_render_empty() {
        let rendered = render_template(
            r#"{"a": "<missing>", "b": "<null>", "c": "<empty>"}"#,
            &tokens(&[("null", TokenValue::Null), ("empty", "".into())]),
        );
        assert_eq!(rendered, r#"{"a": "", "b": "", "c": ""}"#);
    }

    #[test]
    fn test_repeated_tag_replaced_everywhere() {
        let rendered = render_template("<x>-<x>-<x>", &tokens(&[("x", "7".into())]));
        assert_eq!(rendered, "7-7-7");
    }

    #[test]
    fn test_multiple_tags_on_one_line_are_independent() {
        let rendered = render_template(
            r#"{"first": "<first_name>", "last": "<last_name>"}"#,
            &tokens(&[("first_name", "Michael".into()), ("last_name", "Scott".into())]),
        );
        assert_eq!(rendered, r#"{"first": "Michael", "last": "Scott"}"#);
    }

    #[test]
    fn test_non_tag_angle_brackets_untouched() {
        let rendered = render_template("a < b and <not a tag> > c", &Tokens::new());
        assert_eq!(rendered, "a < b and <not a tag> > c");
    }

    #[test]
    fn test_missing_template_file() {
        let err = tokenize_json("does/not/exist.json", &Tokens::new()).unwrap_err();
        assert!(matches!(err, AppError::Template(_)));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(TokenValue::from(None::<&str>), TokenValue::Null);
        assert_eq!(
            TokenValue::from(Some("abc")),
            TokenValue::Text("abc".to_string())
        );
    }
}

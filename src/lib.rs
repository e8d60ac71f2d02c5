//! A Mustache template engine.
//!
//! Template text is split into tokens by the reader, the tokens are built
//! into a [Template] tree, and the tree is rendered against a [Context]
//! chain over caller data, getting partials from a [TemplateStore].
//!
//! Data is a [Value]: scalars, sequences, mappings and lambdas. Values
//! convert from [`serde_json::Value`], [`serde_yaml::Value`] or anything
//! [`serde::Serialize`].
//!
//! Malformed templates fail with an [Error]; missing data and missing
//! partials render as nothing.
//!
//!
//! # Samples
//!
//! ## Hello world
//!
//! ```
//! use stache::{Template, JsonValue, Value};
//!
//! let text = "hello, {{you}}!";
//! let data = r#"{
//!     "you": "world"
//! }"#;
//!
//! let template = Template::parse(text).unwrap();
//! let json = serde_json::from_str::<JsonValue>(data).unwrap();
//!
//! let result = template.render(&Value::from(json)).unwrap();
//!
//! assert_eq!(result, "hello, world!")
//! ```
//!
//! ## Hello team
//!
//! ```
//! use stache::{Template, YamlValue, Value};
//! let text = r#"
//!   {{#team}}
//!   hello, {{address}} {{name}}!
//!   {{/team}}
//! "#;
//! let data = r#"
//!   team:
//!     - name: john
//!       address: little
//!     - name: 42
//!       address: citizen
//! "#;
//!
//! let template = Template::parse(text).unwrap();
//! let yaml = serde_yaml::from_str::<YamlValue>(data).unwrap();
//!
//! let result = template.render(&Value::from(yaml)).unwrap();
//! assert_eq!(result, r#"
//!   hello, little john!
//!   hello, citizen 42!
//! "#);
//! ```
//!
//! ## Partials and lambdas
//!
//! ```
//! use std::collections::HashMap;
//! use stache::Value;
//!
//! let partials = HashMap::from([("name", "-> {{name}} <-")]);
//! let data = [
//!     ("name", Value::text("Anahit")),
//!     ("bold", Value::lambda1(|text| format!("<b>{}</b>", text))),
//! ].into_iter().collect::<Value>();
//!
//! let result = stache::render("{{#bold}}{{>name}}{{/bold}}", &data, &partials).unwrap();
//! assert_eq!(result, "<b>-> Anahit <-</b>");
//! ```
mod error;
mod reader;
mod template;
mod context;
mod value;
mod json;
mod yaml;
mod render;
mod cache;

pub use self::error::{Error, Result};
pub use self::reader::{tokenize, tokenize_with, Token, TokenKind};
pub use self::template::{Template, TemplateStore, TemplateMap, Node, NodeId, ROOT};
pub use self::context::Context;
pub use self::value::{Value, Lambda, Number, RenderFn};
pub use self::json::JsonValue;
pub use self::yaml::YamlValue;
pub use self::render::RenderOptions;
pub use self::cache::{TemplateCache, TEMPLATE_CACHE, render_cached, cache_clear};


/// Parses `input` into a template tree.
pub fn build_tree(input: &str) -> Result<Template> {
    Template::parse(input)
}

/// Parses and renders `input` in one go.
pub fn render(input: &str, data: &Value, partials: &dyn TemplateStore) -> Result<String> {
    Template::parse(input)?.render_with_partials(data, partials)
}

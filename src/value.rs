use std::{collections::HashMap, fmt};
use crate::error::Result;

pub use serde_json::Number;


/// Render callback handed to a [`Lambda::Render`]: renders template text
/// against the context of the section that invoked the lambda.
pub type RenderFn<'r> = dyn Fn(&str) -> Result<String> + 'r;

pub enum Lambda {
    /// Takes nothing; the returned text is rendered as a template.
    Plain(Box<dyn Fn() -> String>),
    /// Takes the raw section body; the returned text is rendered as a template.
    Section(Box<dyn Fn(&str) -> String>),
    /// Takes the raw section body and a render callback; the returned text
    /// is emitted as is.
    Render(Box<dyn Fn(&str, &RenderFn<'_>) -> Result<String>>),
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lambda::Plain(_) => write!(f, "Lambda::Plain(..)"),
            Lambda::Section(_) => write!(f, "Lambda::Section(..)"),
            Lambda::Render(_) => write!(f, "Lambda::Render(..)"),
        }
    }
}


/// Data a template is rendered against.
#[derive(Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(HashMap<String, Value>),
    Lambda(Lambda),
}

impl Value {
    pub fn null() -> Value {
        Value::Null
    }

    pub fn bool(b: bool) -> Value {
        Value::Bool(b)
    }

    pub fn text(t: &str) -> Value {
        Value::String(t.to_owned())
    }

    pub fn mapping(mapping: HashMap<String, Value>) -> Value {
        Value::Mapping(mapping)
    }

    pub fn sequence(sequence: Vec<Value>) -> Value {
        Value::Sequence(sequence)
    }

    pub fn lambda0<T>(fun: T) -> Value
    where T: Fn() -> String + 'static {
        Value::Lambda(Lambda::Plain(Box::new(fun)))
    }

    pub fn lambda1<T>(fun: T) -> Value
    where T: Fn(&str) -> String + 'static {
        Value::Lambda(Lambda::Section(Box::new(fun)))
    }

    pub fn render_lambda<T>(fun: T) -> Value
    where T: Fn(&str, &RenderFn<'_>) -> Result<String> + 'static {
        Value::Lambda(Lambda::Render(Box::new(fun)))
    }

    /// Looks `name` up as a mapping key, or as an index into a sequence.
    pub fn child(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Mapping(obj) => obj.get(name),
            Value::Sequence(seq) => name.parse::<usize>().ok().and_then(|i| seq.get(i)),
            _ => None
        }
    }

    /// Falsy values skip sections, show inverted sections and
    /// interpolate as nothing. Numbers, including zero, are truthy.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::String(s) => s.is_empty(),
            Value::Sequence(seq) => seq.is_empty(),
            Value::Mapping(obj) => obj.is_empty(),
            Value::Number(_) | Value::Lambda(_) => false
        }
    }

    /// Text of a scalar; containers and lambdas have none.
    pub fn to_text(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => String::new()
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(seq: Vec<T>) -> Self {
        Value::Sequence(seq.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Mapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect()
        )
    }
}

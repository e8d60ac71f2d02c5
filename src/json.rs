use serde::Serialize;
use crate::Value;
pub use serde_json::Value as JsonValue;


impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.clone()),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(seq) =>
                Value::Sequence(
                    seq.iter()
                        .map(Value::from)
                        .collect::<_>()
                ),
            JsonValue::Object(obj) =>
                Value::Mapping(
                    obj.iter()
                        .map(|(k, v)| (k.clone(), Value::from(v)))
                        .collect::<_>()
                )
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from(&json)
    }
}

impl Value {
    /// Captures any serializable data, going through its JSON form.
    pub fn from_serialize<T>(data: &T) -> serde_json::Result<Value>
    where T: Serialize + ?Sized {
        serde_json::to_value(data).map(Value::from)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn object_and_array() {
        let json = serde_json::json!({ "list": [1, "two", null], "flag": true });
        let value = Value::from(&json);
        let list = value.child("list").unwrap();
        assert_eq!(list.child("0").unwrap().to_text(), "1");
        assert_eq!(list.child("1").unwrap().to_text(), "two");
        assert!(list.child("2").unwrap().is_falsy());
        assert_eq!(value.child("flag").unwrap().to_text(), "true");
    }

    #[test]
    fn serializable_struct() {
        #[derive(Serialize)]
        struct Person {
            name: &'static str,
            age: u32,
        }
        let value = Value::from_serialize(&Person { name: "Jim", age: 42 }).unwrap();
        assert_eq!(value.child("name").unwrap().to_text(), "Jim");
        assert_eq!(value.child("age").unwrap().to_text(), "42");
    }
}

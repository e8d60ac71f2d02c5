use crate::Value;
pub use serde_yaml::Value as YamlValue;


impl From<&YamlValue> for Value {
    fn from(yaml: &YamlValue) -> Self {
        match yaml {
            YamlValue::Null => Value::Null,
            YamlValue::Bool(b) => Value::Bool(*b),
            YamlValue::Number(n) => yaml_number(n),
            YamlValue::String(s) => Value::String(s.clone()),
            YamlValue::Sequence(seq) =>
                Value::Sequence(
                    seq.iter()
                        .map(Value::from)
                        .collect::<_>()
                ),
            YamlValue::Mapping(obj) =>
                Value::Mapping(
                    obj.iter()
                        .filter_map(|(k, v)| yaml_key(k).map(|k| (k, Value::from(v))))
                        .collect::<_>()
                ),
            YamlValue::Tagged(tagged) => Value::from(&tagged.value)
        }
    }
}

impl From<YamlValue> for Value {
    fn from(yaml: YamlValue) -> Self {
        Value::from(&yaml)
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64().map_or(Value::Null, Value::from)
    }
}

// Keys that are neither text nor scalars cannot be named from a template.
fn yaml_key(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team() {
        let data = r#"
          team:
            - name: john
              size: 1.210
            - name: 42
              size: 3
          1: one
        "#;
        let yaml = serde_yaml::from_str::<YamlValue>(data).unwrap();
        let value = Value::from(&yaml);
        let team = value.child("team").unwrap();
        assert_eq!(team.child("0").unwrap().child("name").unwrap().to_text(), "john");
        assert_eq!(team.child("0").unwrap().child("size").unwrap().to_text(), "1.21");
        assert_eq!(team.child("1").unwrap().child("name").unwrap().to_text(), "42");
        assert_eq!(value.child("1").unwrap().to_text(), "one");
    }
}

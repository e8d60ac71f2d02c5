use std::{fmt, iter, rc::Rc};
use crate::Value;


/// One scope of the lookup chain, innermost first.
///
/// A context never changes once built: opening a section creates child
/// contexts that point back to the one they were opened from.
pub struct Context<'a> {
    value: &'a Value,
    parent: Option<Rc<Context<'a>>>,
}

impl<'a> fmt::Debug for Context<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context {{ depth: {} }}", self.scopes().count())
    }
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Value) -> Rc<Self> {
        Rc::new(Context {
            value: root,
            parent: None
        })
    }

    pub fn push(self: &Rc<Self>, value: &'a Value) -> Rc<Self> {
        Rc::new(Context {
            value,
            parent: Some(Rc::clone(self))
        })
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn parent(&self) -> Option<&Rc<Context<'a>>> {
        self.parent.as_ref()
    }

    fn scopes(&self) -> impl Iterator<Item = &Context<'a>> {
        iter::successors(Some(self), |scope| scope.parent.as_deref())
    }

    /// Resolves a dotted path.
    ///
    /// The first name is searched from the innermost scope outwards, the
    /// remaining names only inside what the first one found.
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        if path == "." {
            return Some(self.value);
        }
        let mut names = path.split('.');
        let first = names.next()?;
        let found = self.scopes().find_map(|scope| scope.value.child(first))?;
        names.try_fold(found, |value, name| value.child(name))
    }

    /// Contexts the body of section `path` renders in, one per repetition.
    pub fn open_section(self: &Rc<Self>, path: &str) -> Vec<Rc<Self>> {
        match self.get(path) {
            None => vec![],
            Some(value) if value.is_falsy() => vec![],
            Some(Value::Sequence(seq)) =>
                seq.iter()
                    .map(|item| self.push(item))
                    .collect::<_>(),
            Some(value) => vec![self.push(value)]
        }
    }

    pub fn is_falsy(&self, path: &str) -> bool {
        self.get(path).map_or(true, Value::is_falsy)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dot_is_current_value() {
        let data = Value::from("x");
        let context = Context::new(&data);
        assert_eq!(context.get(".").unwrap().to_text(), "x");
    }

    #[test]
    fn first_name_searched_outwards() {
        let data = Value::from(json!({ "a": { "b": 1 }, "c": "outer" }));
        let root = Context::new(&data);
        let inner = root.push(root.get("a").unwrap());
        assert_eq!(inner.get("b").unwrap().to_text(), "1");
        assert_eq!(inner.get("c").unwrap().to_text(), "outer");
        assert!(root.get("b").is_none());
    }

    #[test]
    fn remaining_names_searched_downwards() {
        let data = Value::from(json!({
            "a": { "b": { "c": { "name": "stuff" } } },
            "c": { "name": "Jim" }
        }));
        let context = Context::new(&data);
        assert_eq!(context.get("a.b.c.name").unwrap().to_text(), "stuff");
        assert!(context.get("a.b.name").is_none());
    }

    #[test]
    fn found_first_name_stops_search() {
        let data = Value::from(json!({ "a": { "b": {} }, "b": { "c": "ERROR" } }));
        let root = Context::new(&data);
        let inner = root.push(root.get("a").unwrap());
        assert!(inner.get("b.c").is_none());
    }

    #[test]
    fn open_list_section() {
        let data = Value::from(json!({ "list": [1, 2, 3] }));
        let root = Context::new(&data);
        let scopes = root.open_section("list");
        let texts = scopes.iter()
            .map(|scope| scope.value().to_text())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["1", "2", "3"]);
        assert!(Rc::ptr_eq(scopes[0].parent().unwrap(), &root));
    }

    #[test]
    fn open_scalar_and_falsy_sections() {
        let data = Value::from(json!({
            "zero": 0, "null": null, "no": false, "empty": [], "blank": "", "obj": {}, "map": { "k": 1 }
        }));
        let root = Context::new(&data);
        assert_eq!(root.open_section("zero").len(), 1);
        assert_eq!(root.open_section("map").len(), 1);
        for path in ["null", "no", "empty", "blank", "obj", "missing"] {
            assert!(root.open_section(path).is_empty(), "{}", path);
            assert!(root.is_falsy(path), "{}", path);
        }
        assert!(!root.is_falsy("zero"));
    }
}

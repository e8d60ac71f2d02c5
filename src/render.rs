use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;
use log::{debug, trace};
use crate::error::Result;
use crate::reader::{DEFAULT_CLOSE_DELIMITER, DEFAULT_OPEN_DELIMITER};
use crate::template::{Node, NodeId, Template, TemplateStore, ROOT};
use crate::value::Lambda;
use crate::{Context, Value};


#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct RenderOptions {
    /// Emit the source of tags naming a missing value or partial
    /// instead of nothing.
    pub keep_unresolved: bool,
}


#[derive(Clone)]
enum Tree<'t> {
    Borrowed(&'t Template),
    Owned(Rc<Template>),
}

impl Deref for Tree<'_> {
    type Target = Template;

    fn deref(&self) -> &Template {
        match self {
            Tree::Borrowed(template) => template,
            Tree::Owned(template) => template
        }
    }
}

struct Work<'a> {
    tree: usize,
    node: NodeId,
    context: Rc<Context<'a>>,
}


/// Walks template trees with an explicit stack of pending nodes, so deeply
/// nested sections and recursive partials do not grow the call stack.
pub(crate) struct Renderer<'t, 'a> {
    partials: &'t dyn TemplateStore,
    options: &'t RenderOptions,
    trees: Vec<Tree<'t>>,
    loaded: HashMap<(String, String), usize>,
    queue: Vec<Work<'a>>,
    out: String,
}

impl<'t, 'a> Renderer<'t, 'a> {
    pub(crate) fn new(partials: &'t dyn TemplateStore, options: &'t RenderOptions) -> Self {
        Renderer {
            partials,
            options,
            trees: Vec::new(),
            loaded: HashMap::new(),
            queue: Vec::new(),
            out: String::new()
        }
    }

    pub(crate) fn render(mut self, template: &'t Template, context: Rc<Context<'a>>) -> Result<String> {
        let tree = self.add_tree(Tree::Borrowed(template));
        self.queue.push(Work { tree, node: ROOT, context });
        while let Some(work) = self.queue.pop() {
            self.step(work)?;
        }
        Ok(self.out)
    }

    fn step(&mut self, work: Work<'a>) -> Result<()> {
        let Work { tree, node, context } = work;
        let template = self.trees[tree].clone();
        trace!("render node {} of tree {}", node, tree);
        match template.node(node) {
            Node::Root { children } => self.schedule(tree, children, &context),
            Node::Literal(text) => self.out.push_str(text),
            Node::Variable { path, escaped, span } => match context.get(path) {
                None => self.keep_unresolved(&template.source()[span.clone()]),
                Some(Value::Lambda(lambda)) => {
                    let delimiters = (DEFAULT_OPEN_DELIMITER, DEFAULT_CLOSE_DELIMITER);
                    let text = self.expand_lambda(lambda, "", delimiters, &context)?;
                    self.push_value(text, *escaped);
                },
                Some(value) if value.is_falsy() => {},
                Some(value) => self.push_value(value.to_text(), *escaped)
            },
            Node::Section { path, children, body, delimiters } => match context.get(path) {
                Some(Value::Lambda(lambda)) => {
                    let raw = &template.source()[body.clone()];
                    let delimiters = (delimiters.0.as_str(), delimiters.1.as_str());
                    let text = self.expand_lambda(lambda, raw, delimiters, &context)?;
                    self.out.push_str(&text);
                },
                _ => {
                    for scope in context.open_section(path).iter().rev() {
                        self.schedule(tree, children, scope);
                    }
                }
            },
            Node::InvertedSection { path, children } => {
                if context.is_falsy(path) {
                    self.schedule(tree, children, &context);
                }
            },
            Node::Partial { name, indent, span } => match self.load_partial(name, indent)? {
                Some(partial) => self.queue.push(Work { tree: partial, node: ROOT, context }),
                None => self.keep_unresolved(&template.source()[span.clone()])
            }
        }
        Ok(())
    }

    // Children are pushed last first so that they pop in document order.
    fn schedule(&mut self, tree: usize, children: &[NodeId], context: &Rc<Context<'a>>) {
        for &child in children.iter().rev() {
            self.queue.push(Work {
                tree,
                node: child,
                context: Rc::clone(context)
            });
        }
    }

    fn add_tree(&mut self, tree: Tree<'t>) -> usize {
        self.trees.push(tree);
        self.trees.len() - 1
    }

    fn load_partial(&mut self, name: &str, indent: &str) -> Result<Option<usize>> {
        let key = (name.to_owned(), indent.to_owned());
        if let Some(&id) = self.loaded.get(&key) {
            return Ok(Some(id));
        }
        let source = match self.partials.get(name) {
            Some(source) => source,
            None => {
                debug!("partial {:?} not found", name);
                return Ok(None);
            }
        };
        let template = Template::parse(&indent_lines(source, indent))?;
        debug!("loaded partial {:?} with indent {:?}", name, indent);
        let id = self.add_tree(Tree::Owned(Rc::new(template)));
        self.loaded.insert(key, id);
        Ok(Some(id))
    }

    fn expand_lambda(
        &self, lambda: &Lambda, body: &str, delimiters: (&str, &str), context: &Rc<Context<'a>>
    ) -> Result<String> {
        let (open_delimiter, close_delimiter) = delimiters;
        let partials = self.partials;
        let options = self.options;
        let render = |text: &str| -> Result<String> {
            let template = Template::parse_with(text, open_delimiter, close_delimiter)?;
            Renderer::new(partials, options).render(&template, Rc::clone(context))
        };
        debug!("invoking {:?}", lambda);
        match lambda {
            Lambda::Plain(fun) => render(fun().as_str()),
            Lambda::Section(fun) => render(fun(body).as_str()),
            Lambda::Render(fun) => fun(body, &render)
        }
    }

    fn push_value(&mut self, text: String, escaped: bool) {
        match escaped {
            true => self.out.push_str(&html_escape(text)),
            false => self.out.push_str(&text)
        }
    }

    fn keep_unresolved(&mut self, source: &str) {
        if self.options.keep_unresolved {
            self.out.push_str(source);
        }
    }
}


/// Prefixes each line of a standalone partial with the indentation of its
/// tag. The empty line after a final newline is left alone.
fn indent_lines<'s>(source: &'s str, indent: &str) -> Cow<'s, str> {
    if indent.is_empty() {
        return Cow::Borrowed(source);
    }
    let mut result = String::with_capacity(source.len() + indent.len() * 4);
    for line in source.split_inclusive('\n') {
        result.push_str(indent);
        result.push_str(line);
    }
    Cow::Owned(result)
}

fn html_escape(input: String) -> String {
    input.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

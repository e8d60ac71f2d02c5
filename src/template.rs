use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use log::debug;
use crate::error::{Error, Result};
use crate::reader::{
    parse_delimiters, tokenize_with, Token, TokenKind,
    DEFAULT_CLOSE_DELIMITER, DEFAULT_OPEN_DELIMITER
};
use crate::render::{RenderOptions, Renderer};
use crate::{Context, Value};


/// Index of a node in its template.
pub type NodeId = usize;

/// Id of the root node of every template.
pub const ROOT: NodeId = 0;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    Root {
        children: Vec<NodeId>
    },
    Literal(String),
    Variable {
        path: String,
        escaped: bool,
        span: Range<usize>
    },
    Section {
        path: String,
        children: Vec<NodeId>,
        body: Range<usize>,
        delimiters: (String, String)
    },
    InvertedSection {
        path: String,
        children: Vec<NodeId>
    },
    Partial {
        name: String,
        indent: String,
        span: Range<usize>
    },
}

impl Node {
    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Root { children }
            | Node::Section { children, .. }
            | Node::InvertedSection { children, .. } => children,
            _ => &[]
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Node::Root { children }
            | Node::Section { children, .. }
            | Node::InvertedSection { children, .. } => Some(children),
            _ => None
        }
    }
}


/// A parsed template: its source and the node tree built from it.
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
    nodes: Vec<Node>
}

impl Template {
    pub fn parse(input: &str) -> Result<Self> {
        Template::parse_with(input, DEFAULT_OPEN_DELIMITER, DEFAULT_CLOSE_DELIMITER)
    }

    pub fn parse_with(input: &str, open_delimiter: &str, close_delimiter: &str) -> Result<Self> {
        let tokens = tokenize_with(input, open_delimiter, close_delimiter)?;
        let nodes = build(tokens, open_delimiter, close_delimiter)?;
        debug!("built template of {} nodes from {} bytes", nodes.len(), input.len());
        Ok(Template {
            source: input.to_owned(),
            nodes
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Source range of the body of a section.
    ///
    /// `path` names nested sections from the outermost, joined with dots;
    /// section names may contain dots themselves.
    pub fn section_location(&self, path: &str) -> Option<(usize, usize)> {
        let mut pending = vec![(ROOT, path)];
        while let Some((id, rest)) = pending.pop() {
            let mut inner = Vec::new();
            for &child in self.nodes[id].children() {
                if let Node::Section { path: name, body, .. } = &self.nodes[child] {
                    if rest == name {
                        return Some((body.start, body.end));
                    }
                    if let Some(tail) = rest.strip_prefix(name.as_str()).and_then(|t| t.strip_prefix('.')) {
                        inner.push((child, tail));
                    }
                }
            }
            pending.extend(inner.into_iter().rev());
        }
        None
    }

    pub fn render(&self, data: &Value) -> Result<String> {
        self.render_with_partials(data, &TemplateMap::new())
    }

    pub fn render_with_partials(
        &self, data: &Value, partials: &dyn TemplateStore
    ) -> Result<String> {
        self.render_with_options(data, partials, &RenderOptions::default())
    }

    pub fn render_with_options(
        &self, data: &Value, partials: &dyn TemplateStore, options: &RenderOptions
    ) -> Result<String> {
        self.render_context(Context::new(data), partials, options)
    }

    pub fn render_context<'a>(
        &self, context: Rc<Context<'a>>, partials: &dyn TemplateStore, options: &RenderOptions
    ) -> Result<String> {
        Renderer::new(partials, options).render(self, context)
    }
}


fn build(tokens: Vec<Token<'_>>, open_delimiter: &str, close_delimiter: &str) -> Result<Vec<Node>> {
    let mut nodes = vec![Node::Root { children: Vec::new() }];
    let mut stack = vec![ROOT];
    let mut delimiters = (open_delimiter.to_owned(), close_delimiter.to_owned());
    for token in tokens {
        let node = match token.kind {
            TokenKind::Literal => Node::Literal(token.text.to_owned()),
            TokenKind::Variable | TokenKind::VariableUnescaped => Node::Variable {
                path: token.text.to_owned(),
                escaped: token.kind == TokenKind::Variable,
                span: token.span
            },
            TokenKind::Section => Node::Section {
                path: token.text.to_owned(),
                children: Vec::new(),
                body: token.span.end..token.span.end,
                delimiters: delimiters.clone()
            },
            TokenKind::InvertedSection => Node::InvertedSection {
                path: token.text.to_owned(),
                children: Vec::new()
            },
            TokenKind::Partial => Node::Partial {
                name: token.text.to_owned(),
                indent: token.indent.to_owned(),
                span: token.span
            },
            TokenKind::EndSection => {
                close_section(&mut nodes, &mut stack, &token)?;
                continue;
            },
            TokenKind::SetDelimiter => {
                let (open, close) = parse_delimiters(token.text)?;
                delimiters = (open.to_owned(), close.to_owned());
                continue;
            },
            TokenKind::Comment => continue
        };
        let opens_section = matches!(node, Node::Section { .. } | Node::InvertedSection { .. });
        let id = nodes.len();
        nodes.push(node);
        let parent = stack.last().copied().unwrap_or(ROOT);
        if let Some(children) = nodes[parent].children_mut() {
            children.push(id);
        }
        if opens_section {
            stack.push(id);
        }
    }
    if stack.len() > 1 {
        let open = stack[stack.len() - 1];
        let path = match &nodes[open] {
            Node::Section { path, .. } | Node::InvertedSection { path, .. } => path.clone(),
            _ => String::new()
        };
        return Err(Error::MissingClosingTag(path));
    }
    Ok(nodes)
}

fn close_section(nodes: &mut [Node], stack: &mut Vec<NodeId>, token: &Token<'_>) -> Result<()> {
    let open = match stack.as_slice() {
        [_, .., open] => *open,
        _ => return Err(Error::StrayClosingTag(token.text.to_owned()))
    };
    match &mut nodes[open] {
        Node::Section { path, body, .. } if path == token.text => {
            body.end = token.span.start;
        },
        Node::InvertedSection { path, .. } if path == token.text => {},
        _ => return Err(Error::StrayClosingTag(token.text.to_owned()))
    }
    stack.pop();
    Ok(())
}


/// Named partial sources.
pub trait TemplateStore {
    fn get(&self, name: &str) -> Option<&str>;
}

impl TemplateStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }
}

impl<'s> TemplateStore for HashMap<&'s str, &'s str> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).copied()
    }
}


/// Partial sources checked to parse when loaded.
#[derive(Clone, Default, Debug)]
pub struct TemplateMap {
    templates: HashMap<String, String>
}

impl TemplateMap {
    pub fn new() -> Self {
        TemplateMap { templates: HashMap::new() }
    }

    pub fn load(&mut self, name: &str, input: &str) -> Result<()> {
        Template::parse(input)?;
        self.templates.insert(name.to_owned(), input.to_owned());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for TemplateMap {
    fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }
}

//! DOM → HTML string.

use crate::dom::{DomElement, DomNode};
use crate::parser::is_void;

/// Options for HTML rendering
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Put block children on their own indented lines
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}

struct Context<'a> {
    options: &'a RenderOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn newline(&mut self) {
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

pub fn render(nodes: &[DomNode], options: &RenderOptions) -> String {
    let mut ctx = Context::new(options);
    for node in nodes {
        render_block_child(node, &mut ctx);
    }
    ctx.get_output()
}

pub fn render_node(node: &DomNode, options: &RenderOptions) -> String {
    render(std::slice::from_ref(node), options)
}

/// A node rendered on its own line in pretty mode
fn render_block_child(node: &DomNode, ctx: &mut Context) {
    if ctx.options.pretty {
        ctx.add_indent();
    }
    render_inline(node, ctx);
    ctx.newline();
}

fn render_inline(node: &DomNode, ctx: &mut Context) {
    match node {
        DomNode::Text(text) => ctx.add(&escape_html(text)),
        DomNode::Element(element) => render_element(element, ctx),
    }
}

fn render_element(element: &DomElement, ctx: &mut Context) {
    ctx.add("<");
    ctx.add(&element.tag);
    for (name, value) in &element.attributes {
        ctx.add(" ");
        ctx.add(name);
        ctx.add("=\"");
        ctx.add(&escape_html(value));
        ctx.add("\"");
    }

    if is_void(&element.tag) {
        ctx.add(" />");
        return;
    }
    ctx.add(">");

    // elements holding only elements get one child per line
    let block_children = ctx.options.pretty
        && !element.children.is_empty()
        && element.tag != "pre"
        && element
            .children
            .iter()
            .all(|child| matches!(child, DomNode::Element(e) if !is_phrasing(&e.tag)));

    if block_children {
        ctx.newline();
        ctx.indent();
        for child in &element.children {
            render_block_child(child, ctx);
        }
        ctx.dedent();
        ctx.add_indent();
    } else {
        for child in &element.children {
            render_inline(child, ctx);
        }
    }

    ctx.add("</");
    ctx.add(&element.tag);
    ctx.add(">");
}

fn is_phrasing(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "b"
            | "br"
            | "code"
            | "em"
            | "i"
            | "img"
            | "mark"
            | "s"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "u"
    )
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

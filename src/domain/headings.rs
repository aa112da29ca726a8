use comrak::{
    Arena, Options,
    nodes::{AstNode, NodeValue},
    parse_document,
};
use serde::Serialize;

use super::slug::AnchorSlugger;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Collect the headings of a markdown body in document order.
///
/// Headings inside fenced code are not headings; ATX and setext forms both
/// count. Ids are unique within the body.
pub fn extract_headings(body: &str) -> Vec<Heading> {
    let arena = Arena::new();
    let options = markdown_options();
    let root = parse_document(&arena, body, &options);

    let mut collector = HeadingCollector {
        slugger: AnchorSlugger::new(),
        headings: Vec::new(),
    };
    collector.visit_nodes(root);
    collector.headings
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.math_dollars = true;
    options
}

struct HeadingCollector {
    slugger: AnchorSlugger,
    headings: Vec<Heading>,
}

impl HeadingCollector {
    fn visit_nodes(&mut self, node: &AstNode<'_>) {
        if let Some(level) = heading_level(node) {
            let text = collect_inline_text(node);
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !normalized.is_empty() {
                let id = self.slugger.anchor_for(&normalized);
                self.headings.push(Heading {
                    id,
                    text: normalized,
                    level,
                });
            }
            return;
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next);
            child = next.next_sibling();
        }
    }
}

fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}

fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

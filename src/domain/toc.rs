use serde::Serialize;

use super::headings::Heading;

/// One entry of an in-page table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    pub id: String,
    pub text: String,
    pub level: u8,
    pub children: Vec<TocNode>,
}

impl From<&Heading> for TocNode {
    fn from(heading: &Heading) -> Self {
        Self {
            id: heading.id.clone(),
            text: heading.text.clone(),
            level: heading.level,
            children: Vec::new(),
        }
    }
}

/// Nest a flat heading list: every heading becomes a child of the closest
/// preceding heading with a smaller level. Skipped levels (`#` then `###`)
/// nest directly.
pub fn nest(headings: &[Heading]) -> Vec<TocNode> {
    let mut roots = Vec::new();
    let mut stack: Vec<TocNode> = Vec::new();

    for heading in headings {
        while stack.last().is_some_and(|open| open.level >= heading.level) {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }
        stack.push(TocNode::from(heading));
    }

    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }

    roots
}

fn attach(node: TocNode, stack: &mut [TocNode], roots: &mut Vec<TocNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

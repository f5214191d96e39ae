use crate::{
    errors::errors::{Error, ErrorImpl},
    parser::tree::{NodeKind, SyntaxNode},
    Span,
};

/// A read-only position among a list of sibling nodes.
///
/// Moving never mutates a cursor: `first_child` and `next_sibling` hand back
/// new cursors, so a caller that descends into a child keeps its own position.
/// A cursor may sit one past the last sibling, in which case `node()` is `None`.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    parent: Option<&'a SyntaxNode>,
    siblings: &'a [SyntaxNode],
    index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(root: &'a SyntaxNode) -> Self {
        Cursor {
            parent: None,
            siblings: std::slice::from_ref(root),
            index: 0,
        }
    }

    pub fn node(&self) -> Option<&'a SyntaxNode> {
        self.siblings.get(self.index)
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.node().map(|node| node.kind)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.siblings.len()
    }

    /// Cursor on the first child of the current node (at the end if it has none).
    pub fn first_child(&self) -> Cursor<'a> {
        match self.node() {
            Some(node) => Cursor {
                parent: Some(node),
                siblings: &node.children,
                index: 0,
            },
            None => Cursor {
                parent: self.parent,
                siblings: &[],
                index: 0,
            },
        }
    }

    pub fn next_sibling(&self) -> Cursor<'a> {
        Cursor {
            index: (self.index + 1).min(self.siblings.len()),
            ..*self
        }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.node().map(|node| node.text(source)).unwrap_or("")
    }

    /// Span of the current node, or of the end of the parent when past the last sibling.
    pub fn span(&self) -> Span {
        match (self.node(), self.parent) {
            (Some(node), _) => node.span.clone(),
            (None, Some(parent)) => Span {
                start: parent.span.end.clone(),
                end: parent.span.end.clone(),
            },
            (None, None) => Span::null(),
        }
    }

    /// Returns the current node, failing with a syntax error naming `what` when
    /// the cursor is past the last sibling.
    pub fn expect(&self, what: &str, source: &str) -> Result<&'a SyntaxNode, Error> {
        self.node().ok_or_else(|| unsupported_at(what, &self.span(), source))
    }
}

pub fn unsupported(what: &str, node: &SyntaxNode, source: &str) -> Error {
    unsupported_at(what, &node.span, source)
}

pub fn unsupported_at(what: &str, span: &Span, source: &str) -> Error {
    Error::new(
        ErrorImpl::UnsupportedSyntax {
            node: String::from(what),
            from: span.start.0,
            to: span.end.0,
            text: source.get(span.range()).unwrap_or("").to_string(),
        },
        span.start.clone(),
    )
}

//! Concrete syntax tree produced by the parser.
//!
//! Nodes carry only their kind, their source span and their children; the
//! text of a node is recovered from the source through its span. Punctuation
//! and keywords that matter for traversal (`(`, `,`, `:`, `elif`, ...) are kept
//! as leaf nodes so consumers can navigate sibling by sibling.

use std::fmt::Display;

use crate::{lexer::tokens::Token, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Script,

    // Statements
    ExpressionStatement,
    AssignStatement,
    IfStatement,
    WhileStatement,
    FunctionDefinition,
    ReturnStatement,
    PassStatement,
    Body,
    ParamList,
    TypeDef,
    AssignOp,

    // Expressions
    VariableName,
    Number,
    Boolean,
    None,
    String,
    UnaryExpression,
    BinaryExpression,
    CallExpression,
    ArgList,
    ParenthesizedExpression,
    ArithOp,
    CompareOp,
    LogicOp,
    UnaryOp,

    // Punctuation and keywords
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    Arrow,
    If,
    Elif,
    Else,
    While,
    Def,
    Return,
    Pass,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Script => "Script",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::AssignStatement => "AssignStatement",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::WhileStatement => "WhileStatement",
            NodeKind::FunctionDefinition => "FunctionDefinition",
            NodeKind::ReturnStatement => "ReturnStatement",
            NodeKind::PassStatement => "PassStatement",
            NodeKind::Body => "Body",
            NodeKind::ParamList => "ParamList",
            NodeKind::TypeDef => "TypeDef",
            NodeKind::AssignOp => "AssignOp",
            NodeKind::VariableName => "VariableName",
            NodeKind::Number => "Number",
            NodeKind::Boolean => "Boolean",
            NodeKind::None => "None",
            NodeKind::String => "String",
            NodeKind::UnaryExpression => "UnaryExpression",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::ArgList => "ArgList",
            NodeKind::ParenthesizedExpression => "ParenthesizedExpression",
            NodeKind::ArithOp => "ArithOp",
            NodeKind::CompareOp => "CompareOp",
            NodeKind::LogicOp => "LogicOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::OpenParen => "(",
            NodeKind::CloseParen => ")",
            NodeKind::Comma => ",",
            NodeKind::Colon => ":",
            NodeKind::Arrow => "->",
            NodeKind::If => "if",
            NodeKind::Elif => "elif",
            NodeKind::Else => "else",
            NodeKind::While => "while",
            NodeKind::Def => "def",
            NodeKind::Return => "return",
            NodeKind::Pass => "pass",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(kind: NodeKind, token: &Token) -> Self {
        SyntaxNode {
            kind,
            span: token.span.clone(),
            children: vec![],
        }
    }

    /// Builds an interior node spanning its first through last child.
    ///
    /// `children` must not be empty.
    pub fn branch(kind: NodeKind, children: Vec<SyntaxNode>) -> Self {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.span.to(&last.span),
            _ => Span::null(),
        };

        SyntaxNode {
            kind,
            span,
            children,
        }
    }

    /// The slice of `source` this node covers.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.range()).unwrap_or("")
    }

    /// Renders the tree as an indented outline, one node per line.
    pub fn outline(&self, source: &str) -> String {
        let mut out = String::new();
        self.write_outline(source, 0, &mut out);
        out
    }

    fn write_outline(&self, source: &str, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.kind.name());
        if self.children.is_empty() {
            out.push_str(&format!(" {:?}", self.text(source)));
        }
        out.push('\n');

        for child in self.children.iter() {
            child.write_outline(source, depth + 1, out);
        }
    }
}

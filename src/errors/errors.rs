use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_kind(&self) -> ErrorKind {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::InconsistentIndentation
            | ErrorImpl::NumberParseError { .. }
            | ErrorImpl::UnsupportedSyntax { .. }
            | ErrorImpl::UnknownType { .. } => ErrorKind::SyntaxError,
            ErrorImpl::DuplicateDeclaration { .. }
            | ErrorImpl::NotAVariable { .. }
            | ErrorImpl::NotAFunction { .. }
            | ErrorImpl::ReservedName { .. }
            | ErrorImpl::LateInitialization { .. }
            | ErrorImpl::LateFunctionDefinition { .. }
            | ErrorImpl::NestedFunctionDefinition { .. }
            | ErrorImpl::NonLocalAssignment { .. }
            | ErrorImpl::ReturnOutsideFunction => ErrorKind::ScopeError,
            ErrorImpl::UnexpectedArguments { .. }
            | ErrorImpl::ArgumentTypeMatchError { .. }
            | ErrorImpl::TypeMatchError { .. }
            | ErrorImpl::ReturnTypeMatchError { .. }
            | ErrorImpl::UnaryOperatorTypeError { .. }
            | ErrorImpl::BinaryOperatorTypeError { .. }
            | ErrorImpl::ConditionTypeError { .. } => ErrorKind::TypeError,
            ErrorImpl::UnknownName { .. }
            | ErrorImpl::StackUnderflow { .. }
            | ErrorImpl::UnbalancedStack { .. } => ErrorKind::CodegenError,
            ErrorImpl::AssemblyError { .. } | ErrorImpl::Trap { .. } => ErrorKind::RuntimeError,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::InconsistentIndentation => "InconsistentIndentation",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnsupportedSyntax { .. } => "UnsupportedSyntax",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::NotAVariable { .. } => "NotAVariable",
            ErrorImpl::NotAFunction { .. } => "NotAFunction",
            ErrorImpl::ReservedName { .. } => "ReservedName",
            ErrorImpl::LateInitialization { .. } => "LateInitialization",
            ErrorImpl::LateFunctionDefinition { .. } => "LateFunctionDefinition",
            ErrorImpl::NestedFunctionDefinition { .. } => "NestedFunctionDefinition",
            ErrorImpl::NonLocalAssignment { .. } => "NonLocalAssignment",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ReturnTypeMatchError { .. } => "ReturnTypeMatchError",
            ErrorImpl::UnaryOperatorTypeError { .. } => "UnaryOperatorTypeError",
            ErrorImpl::BinaryOperatorTypeError { .. } => "BinaryOperatorTypeError",
            ErrorImpl::ConditionTypeError { .. } => "ConditionTypeError",
            ErrorImpl::UnknownName { .. } => "UnknownName",
            ErrorImpl::StackUnderflow { .. } => "StackUnderflow",
            ErrorImpl::UnbalancedStack { .. } => "UnbalancedStack",
            ErrorImpl::AssemblyError { .. } => "AssemblyError",
            ErrorImpl::Trap { .. } => "Trap",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, is a newline or `:` missing?",
                token
            )),
            ErrorImpl::InconsistentIndentation => ErrorTip::Suggestion(String::from(
                "Dedent does not match any outer indentation level",
            )),
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the 32-bit integer limit?",
                token
            )),
            ErrorImpl::UnknownType { type_ } => ErrorTip::Suggestion(format!(
                "Unknown type `{}`, expected `int`, `bool` or `None`",
                type_
            )),
            ErrorImpl::LateInitialization { .. } | ErrorImpl::LateFunctionDefinition { .. } => {
                ErrorTip::Suggestion(String::from(
                    "Declarations must come before any other statement of their block",
                ))
            }
            ErrorImpl::StackUnderflow { .. } => ErrorTip::Suggestion(String::from(
                "`print(...)` does not leave a value and cannot be used as an operand",
            )),
            // Most messages already read as a suggestion.
            other => ErrorTip::Suggestion(other.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.get_error_kind(), self.internal_error)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    ScopeError,
    TypeError,
    CodegenError,
    RuntimeError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Tokens, layout and tree lowering
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("unindent does not match any outer indentation level")]
    InconsistentIndentation,
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("Could not parse {node} at {from} {to}: {text}")]
    UnsupportedSyntax {
        node: String,
        from: u32,
        to: u32,
        text: String,
    },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },

    // Scoping
    #[error("Duplicate declaration of identifier in same scope: {name}")]
    DuplicateDeclaration { name: String },
    #[error("Not a variable: `{name}`")]
    NotAVariable { name: String },
    #[error("Not a class or function: {name}")]
    NotAFunction { name: String },
    #[error("Cannot define function `{name}`: the name is reserved by a built-in")]
    ReservedName { name: String },
    #[error("Please initialize variable `{name}` in the beginning of the program/function")]
    LateInitialization { name: String },
    #[error("Please define function `{name}` in the beginning of the program")]
    LateFunctionDefinition { name: String },
    #[error("Cannot define function `{name}` inside another function")]
    NestedFunctionDefinition { name: String },
    #[error("Cannot assign to `{name}`: it is not a parameter or local of this function")]
    NonLocalAssignment { name: String },
    #[error("Return statement cannot appear at the top level")]
    ReturnOutsideFunction,

    // Typing
    #[error("Expected {expected} arguments; got {received}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("Expected type `{expected}`; got type `{received}` in parameter {index}")]
    ArgumentTypeMatchError {
        expected: String,
        received: String,
        index: usize,
    },
    #[error("Expected type `{expected}`; got type `{received}`")]
    TypeMatchError { expected: String, received: String },
    #[error("Expected type `{expected}`; got `{received}`")]
    ReturnTypeMatchError { expected: String, received: String },
    #[error("Cannot apply operator `{operator}` on type `{operand}`")]
    UnaryOperatorTypeError { operator: String, operand: String },
    #[error("Cannot apply operator `{operator}` on types `{left}` and `{right}`")]
    BinaryOperatorTypeError {
        operator: String,
        left: String,
        right: String,
    },
    #[error("Condition expression cannot be of type `{received}`")]
    ConditionTypeError { received: String },

    // Code generation
    #[error("Could not find name {name}")]
    UnknownName { name: String },
    #[error("stack underflow: `{instruction}` needs {needed} operand(s), {available} available")]
    StackUnderflow {
        instruction: String,
        needed: u32,
        available: u32,
    },
    #[error("unbalanced stack: {context} leaves {depth} value(s), expected {expected}")]
    UnbalancedStack {
        context: String,
        depth: u32,
        expected: u32,
    },

    // Host runtime
    #[error("could not assemble module: {message}")]
    AssemblyError { message: String },
    #[error("{message}")]
    Trap { message: String },
}

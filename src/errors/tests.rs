//! Unit tests for error handling.
//!
//! This module contains tests for error classification, naming and rendering.

use crate::errors::errors::{Error, ErrorImpl, ErrorKind, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at_zero(error_impl: ErrorImpl) -> Error {
    Error::new(error_impl, Position(0, Rc::new("test.py".to_string())))
}

#[test]
fn test_error_creation() {
    let error = at_zero(ErrorImpl::UnrecognisedToken {
        token: "@".to_string(),
    });

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_error_kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.py".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        pos.clone(),
    );

    assert_eq!(error.get_position().0, 42);
}

#[test]
fn test_duplicate_declaration_message() {
    let error = at_zero(ErrorImpl::DuplicateDeclaration {
        name: "x".to_string(),
    });

    assert_eq!(error.get_error_kind(), ErrorKind::ScopeError);
    assert_eq!(
        error.to_string(),
        "ScopeError: Duplicate declaration of identifier in same scope: x"
    );
}

#[test]
fn test_argument_type_message_names_parameter_index() {
    let error = at_zero(ErrorImpl::ArgumentTypeMatchError {
        expected: "int".to_string(),
        received: "bool".to_string(),
        index: 1,
    });

    assert_eq!(error.get_error_kind(), ErrorKind::TypeError);
    assert_eq!(
        error.get_internal().to_string(),
        "Expected type `int`; got type `bool` in parameter 1"
    );
}

#[test]
fn test_operator_messages() {
    let unary = at_zero(ErrorImpl::UnaryOperatorTypeError {
        operator: "-".to_string(),
        operand: "bool".to_string(),
    });
    assert_eq!(
        unary.get_internal().to_string(),
        "Cannot apply operator `-` on type `bool`"
    );

    let binary = at_zero(ErrorImpl::BinaryOperatorTypeError {
        operator: "+".to_string(),
        left: "bool".to_string(),
        right: "int".to_string(),
    });
    assert_eq!(
        binary.get_internal().to_string(),
        "Cannot apply operator `+` on types `bool` and `int`"
    );
}

#[test]
fn test_codegen_errors_are_classified() {
    let error = at_zero(ErrorImpl::UnknownName {
        name: "x".to_string(),
    });
    assert_eq!(error.get_error_kind(), ErrorKind::CodegenError);

    let error = at_zero(ErrorImpl::StackUnderflow {
        instruction: "i32.add".to_string(),
        needed: 2,
        available: 1,
    });
    assert_eq!(error.get_error_kind(), ErrorKind::CodegenError);
}

#[test]
fn test_trap_display() {
    let error = at_zero(ErrorImpl::Trap {
        message: "integer divide by zero".to_string(),
    });

    assert_eq!(error.get_error_kind(), ErrorKind::RuntimeError);
    assert_eq!(error.to_string(), "RuntimeError: integer divide by zero");
}

#[test]
fn test_error_tip_none() {
    let error = at_zero(ErrorImpl::UnrecognisedToken {
        token: "@".to_string(),
    });

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = at_zero(ErrorImpl::UnexpectedToken {
        token: ")".to_string(),
    });

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

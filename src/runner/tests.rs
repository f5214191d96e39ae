use crate::{
    ast::types::Type,
    errors::errors::{ErrorImpl, ErrorKind},
    lowering::lowering::parse_program,
    runtime::{host::BufferedImports, vm::Vm},
    type_checker::type_checker::type_check,
};

use super::runner::{compile_unit, entry_result_type, run, GlobalEnv, RunConfig, Session, Value};

fn run_source(source: &str) -> (Value, String) {
    let mut vm = Vm::new();
    let mut imports = BufferedImports::new();
    let config = RunConfig {
        env: GlobalEnv::new(),
        runtime: &mut vm,
        imports: &mut imports,
    };

    let (value, _) = run(source, config).unwrap();
    (value, imports.output)
}

#[test]
fn test_value_conversion() {
    assert_eq!(Value::convert(Some(1), Type::Bool), Value::Bool(true));
    assert_eq!(Value::convert(Some(0), Type::Bool), Value::Bool(false));
    assert_eq!(Value::convert(Some(-4), Type::Int), Value::Int(-4));
    assert_eq!(Value::convert(Some(0), Type::NoneType), Value::None);
    assert_eq!(Value::convert(Some(3), Type::NoneType), Value::Int(0));
    assert_eq!(Value::convert(None, Type::Int), Value::None);
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Int(120).to_string(), "120");
    assert_eq!(Value::Bool(false).to_string(), "False");
    assert_eq!(Value::None.to_string(), "None");
}

#[test]
fn test_run_returns_result_and_output() {
    let (value, output) = run_source("print(4)\nprint(False)\n2 + 3");

    assert_eq!(value, Value::Int(5));
    assert_eq!(output, "4\nFalse\n");
}

#[test]
fn test_program_ending_in_statement_is_none() {
    let (value, _) = run_source("x:int = 3\nx = x + 1");
    assert_eq!(value, Value::None);

    let (value, _) = run_source("x:int = 2\n1\nx = 3");
    assert_eq!(value, Value::None);
}

#[test]
fn test_final_print_has_its_argument_type() {
    // `print` leaves nothing, so the entry function returns the padding zero
    let (value, output) = run_source("print(7)");
    assert_eq!(value, Value::Int(0));
    assert_eq!(output, "7\n");

    let (value, output) = run_source("print(True)");
    assert_eq!(value, Value::Bool(false));
    assert_eq!(output, "True\n");

    let (value, _) = run_source("print(None)");
    assert_eq!(value, Value::None);
}

#[test]
fn test_compile_unit_exposes_module() {
    let compiled = compile_unit("def f()->int:\n  return 1\nf()", None, &GlobalEnv::new()).unwrap();

    assert!(compiled.returns_value);
    assert_eq!(compiled.result_type, Type::Int);
    assert!(compiled.module_text.contains("(func $f (result i32)"));
    assert_eq!(compiled.env.functions.len(), 1);
    assert_eq!(compiled.env.layout.offset, 0);
}

#[test]
fn test_session_chains_declarations() {
    let mut session = Session::new(BufferedImports::new());

    assert_eq!(session.run("x:int = 5").unwrap(), Value::None);
    assert_eq!(session.run("def double(n:int)->int:\n  return n * 2").unwrap(), Value::None);
    assert_eq!(session.run("y:int = double(x)\ny + 1").unwrap(), Value::Int(11));
    assert_eq!(session.run("x = 6\nx").unwrap(), Value::Int(6));
    assert_eq!(session.run("print(double(y))").unwrap(), Value::Int(0));

    assert_eq!(session.imports().output, "20\n");
    assert_eq!(session.env().layout.offset, 2);
}

#[test]
fn test_session_variable_redeclaration_uses_fresh_slot() {
    let mut session = Session::new(BufferedImports::new());

    session.run("x:int = 1").unwrap();
    assert_eq!(session.run("x:bool = True\nx").unwrap(), Value::Bool(true));
    assert_eq!(session.env().layout.address_of("x"), Some(4));
}

#[test]
fn test_session_functions_are_permanent() {
    let mut session = Session::new(BufferedImports::new());
    session.run("def f()->int:\n  return 1").unwrap();

    let error = session.run("f:int = 2").unwrap_err();
    assert_eq!(
        error.get_internal(),
        &ErrorImpl::DuplicateDeclaration { name: "f".to_string() }
    );
}

#[test]
fn test_failed_unit_keeps_environment() {
    let mut session = Session::new(BufferedImports::new());
    session.run("x:int = 1").unwrap();
    let before = session.env().clone();

    let error = session.run("y:int = 2\nx = True").unwrap_err();
    assert_eq!(error.get_error_kind(), ErrorKind::TypeError);
    assert_eq!(session.env(), &before);

    assert_eq!(session.run("x").unwrap(), Value::Int(1));
}

#[test]
fn test_runtime_trap_is_reported() {
    let mut session = Session::new(BufferedImports::new());
    let error = session.run("x:int = 0\n1 // x").unwrap_err();

    assert_eq!(error.get_error_kind(), ErrorKind::RuntimeError);
    assert_eq!(error.to_string(), "RuntimeError: integer divide by zero");
}

#[test]
fn test_entry_result_type_agrees_with_compiled_unit() {
    for (source, expected) in [
        ("5\npass", Type::NoneType),
        ("x:int = 1\nx == 1\nx = 2", Type::NoneType),
        ("5", Type::Int),
        ("pass\nTrue", Type::Bool),
    ] {
        let program = parse_program(source, None).unwrap();
        let analysis = type_check(&program).unwrap();
        let compiled = compile_unit(source, None, &GlobalEnv::new()).unwrap();

        assert_eq!(entry_result_type(&program, analysis.result_type), expected, "{}", source);
        assert_eq!(compiled.result_type, expected, "{}", source);
    }
}

//! Integration tests for end-to-end compilation.
//!
//! These tests run complete programs through tokenization, parsing, lowering,
//! type checking, code generation and the built-in runtime.

use pywat::{
    errors::errors::{Error, ErrorImpl, ErrorKind},
    runner::runner::{run, GlobalEnv, RunConfig, Session, Value},
    runtime::{host::BufferedImports, vm::Vm},
};

fn run_program(source: &str) -> Result<(Value, String), Error> {
    let mut vm = Vm::new();
    let mut imports = BufferedImports::new();
    let config = RunConfig {
        env: GlobalEnv::new(),
        runtime: &mut vm,
        imports: &mut imports,
    };

    let (value, _) = run(source, config)?;
    Ok((value, imports.output))
}

fn eval(source: &str) -> Value {
    run_program(source).unwrap().0
}

fn output(source: &str) -> String {
    run_program(source).unwrap().1
}

fn fails_with(source: &str) -> Error {
    run_program(source).unwrap_err()
}

#[test]
fn test_adds_two_numbers() {
    assert_eq!(eval("2 + 3"), Value::Int(5));
    assert_eq!(eval("987"), Value::Int(987));
}

#[test]
fn test_not_chain() {
    assert_eq!(eval("not not not True"), Value::Bool(false));
    assert_eq!(eval("not not not True").to_string(), "False");
}

#[test]
fn test_recursive_factorial() {
    let source = "def fact(x:int)->int:\n if x==0:\n  return 1\n else:\n  return x*fact(x-1)\nfact(5)";
    assert_eq!(eval(source), Value::Int(120));
}

#[test]
fn test_while_factorial() {
    let source = "n:int=5\nx:int=1\nwhile n>0:\n x=x*n\n n=n-1\nx";
    assert_eq!(eval(source), Value::Int(120));
}

#[test]
fn test_if_without_else() {
    assert_eq!(eval("x:int=8\nif x==8:\n x=10\nx"), Value::Int(10));
    assert_eq!(eval("x:int=7\nif x==8:\n x=10\nx"), Value::Int(7));
}

#[test]
fn test_duplicate_declaration() {
    let error = fails_with("x:int=5\nx:int=6");

    assert_eq!(error.get_error_kind(), ErrorKind::ScopeError);
    assert!(error.to_string().contains("Duplicate declaration of identifier in same scope: x"));
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval("2 + 3 * 4 - 10 // 3"), Value::Int(11));
    assert_eq!(eval("(2 + 3) * 4"), Value::Int(20));
    assert_eq!(eval("17 % 5"), Value::Int(2));
    assert_eq!(eval("-3 * -3"), Value::Int(9));
}

#[test]
fn test_comparisons() {
    assert_eq!(eval("3 >= 3"), Value::Bool(true));
    assert_eq!(eval("2 >= 3"), Value::Bool(false));
    assert_eq!(eval("2 < 3"), Value::Bool(true));
    assert_eq!(eval("3 <= 2"), Value::Bool(false));
    assert_eq!(eval("True == False"), Value::Bool(false));
    assert_eq!(eval("1 != 2"), Value::Bool(true));
    assert_eq!(eval("None is None"), Value::Bool(true));
}

#[test]
fn test_none_result() {
    assert_eq!(eval("None"), Value::None);
    assert_eq!(eval("x:int = 1\nx = 2"), Value::None);
}

#[test]
fn test_elif_arms() {
    let program = |value: i32| {
        format!(
            "x:int = {}\nr:int = 0\nif x < 0:\n  r = 1\nelif x == 0:\n  r = 2\nelse:\n  r = 3\nr",
            value
        )
    };

    assert_eq!(eval(&program(-5)), Value::Int(1));
    assert_eq!(eval(&program(0)), Value::Int(2));
    assert_eq!(eval(&program(5)), Value::Int(3));
}

#[test]
fn test_while_with_false_guard_never_runs() {
    assert_eq!(eval("x:int = 1\nwhile x > 5:\n  x = x + 1\nx"), Value::Int(1));
}

#[test]
fn test_print_output() {
    assert_eq!(output("print(1337)\nprint(True)"), "1337\nTrue\n");
    assert_eq!(output("x:int = 3\nwhile x > 0:\n  print(x)\n  x = x - 1"), "3\n2\n1\n");
}

#[test]
fn test_print_local_inside_function() {
    let source = "def show(flag:bool, n:int):\n  print(flag)\n  print(n)\nshow(False, 4)\nNone";
    assert_eq!(output(source), "False\n4\n");
}

#[test]
fn test_functions_read_globals() {
    let source = "base:int = 10\ndef add(n:int)->int:\n  return base + n\nadd(5)";
    assert_eq!(eval(source), Value::Int(15));
}

#[test]
fn test_function_locals() {
    let source = "def sum_to(n:int)->int:\n  total:int = 0\n  while n > 0:\n    total = total + n\n    n = n - 1\n  return total\nsum_to(10)";
    assert_eq!(eval(source), Value::Int(55));
}

#[test]
fn test_functions_call_each_other() {
    let source = "def is_even(n:int)->bool:\n  if n == 0:\n    return True\n  else:\n    return is_odd(n - 1)\ndef is_odd(n:int)->bool:\n  if n == 0:\n    return False\n  else:\n    return is_even(n - 1)\nis_even(10)";
    assert_eq!(eval(source), Value::Bool(true));
}

#[test]
fn test_fibonacci() {
    let source = "def fib(n:int)->int:\n  if n < 2:\n    return n\n  return fib(n - 1) + fib(n - 2)\nfib(15)";
    assert_eq!(eval(source), Value::Int(610));
}

#[test]
fn test_function_without_return_gives_none() {
    assert_eq!(eval("def f():\n  pass\nf()"), Value::None);
}

#[test]
fn test_inline_bodies() {
    assert_eq!(eval("x:int = 1\nif x == 1: x = 2\nx"), Value::Int(2));
    assert_eq!(eval("def f()->int: return 9\nf()"), Value::Int(9));
}

#[test]
fn test_comments_and_blank_lines() {
    let source = "# setup\nx:int = 1\n\n  # indented comment\nx = x + 1 # trailing\n\nx\n";
    assert_eq!(eval(source), Value::Int(2));
}

#[test]
fn test_type_errors() {
    let error = fails_with("x:int = True");
    assert_eq!(error.get_error_kind(), ErrorKind::TypeError);
    assert_eq!(error.to_string(), "TypeError: Expected type `int`; got type `bool`");

    let error = fails_with("def f(a:int)->int:\n  return a\nf(True)");
    assert_eq!(
        error.to_string(),
        "TypeError: Expected type `int`; got type `bool` in parameter 0"
    );

    let error = fails_with("if 1:\n  pass");
    assert_eq!(error.to_string(), "TypeError: Condition expression cannot be of type `int`");

    let error = fails_with("1 + True");
    assert!(matches!(
        error.get_internal(),
        ErrorImpl::BinaryOperatorTypeError { .. }
    ));
}

#[test]
fn test_nested_bool_return_in_int_function_fails() {
    let error = fails_with("def f(x:int)->int:\n  while x > 0:\n    if x == 3:\n      return True\n    x = x - 1\n  return 0\nf(5)");

    assert_eq!(error.get_error_kind(), ErrorKind::TypeError);
    assert!(matches!(
        error.get_internal(),
        ErrorImpl::ReturnTypeMatchError { .. }
    ));
}

#[test]
fn test_scope_errors() {
    assert!(matches!(
        fails_with("x:int = 1\nx = 2\ny:int = 3").get_internal(),
        ErrorImpl::LateInitialization { .. }
    ));
    assert!(matches!(
        fails_with("y = 1").get_internal(),
        ErrorImpl::NotAVariable { .. }
    ));
    assert!(matches!(
        fails_with("return 1").get_internal(),
        ErrorImpl::ReturnOutsideFunction
    ));
    assert!(matches!(
        fails_with("x:int = 1\ndef f():\n  x = 2\nf()").get_internal(),
        ErrorImpl::NonLocalAssignment { .. }
    ));
}

#[test]
fn test_unsupported_syntax() {
    let error = fails_with("x:int = 1\nx = 'text'");
    assert_eq!(error.get_error_kind(), ErrorKind::SyntaxError);

    let error = fails_with("True and False");
    assert!(matches!(
        error.get_internal(),
        ErrorImpl::UnsupportedSyntax { .. }
    ));

    let error = fails_with("x:str = 1");
    assert!(matches!(error.get_internal(), ErrorImpl::UnknownType { .. }));
}

#[test]
fn test_print_as_operand_is_codegen_error() {
    let error = fails_with("print(1) + 2");

    assert_eq!(error.get_error_kind(), ErrorKind::CodegenError);
    assert!(matches!(error.get_internal(), ErrorImpl::StackUnderflow { .. }));
}

#[test]
fn test_division_by_zero_traps() {
    let error = fails_with("x:int = 0\n10 // x");
    assert_eq!(error.get_error_kind(), ErrorKind::RuntimeError);
}

#[test]
fn test_session_accumulates_top_level_state() {
    let mut session = Session::new(BufferedImports::new());

    session.run("count:int = 0").unwrap();
    session.run("def bump(by:int)->int:\n  return by + 1").unwrap();
    session.run("count = bump(count)").unwrap();
    session.run("count = bump(count)").unwrap();

    assert_eq!(session.run("count").unwrap(), Value::Int(2));
    assert_eq!(session.run("bump(count) > 2").unwrap(), Value::Bool(true));
}

#[test]
fn test_deep_recursion_succeeds() {
    let source = "def s(n:int)->int:\n if n==0:\n  return 0\n else:\n  return n + s(n-1)\ns(900)";
    assert_eq!(eval(source), Value::Int(405450));
}

#[test]
fn test_unbounded_recursion_traps() {
    let error = fails_with("def f(a:int)->int:\n return f(a)\nf(1)");

    assert_eq!(error.get_error_kind(), ErrorKind::RuntimeError);
    assert_eq!(
        error.get_internal(),
        &ErrorImpl::Trap {
            message: "call stack exhausted".to_string()
        }
    );
}

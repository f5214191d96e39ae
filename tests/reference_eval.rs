//! Compiled execution checked against a direct evaluation of the AST.

use std::collections::HashMap;

use pywat::{
    ast::{
        ast::{Expr, ExprKind, Param, Program, Stmt, StmtKind},
        types::{BinaryOp, UnaryOp},
    },
    compiler::{compiler::compile, instr::Instr, layout::MemoryLayout},
    errors::errors::ErrorKind,
    lowering::lowering::parse_program,
    runner::runner::{compile_unit, run, GlobalEnv, RunConfig, Value},
    runtime::{host::BufferedImports, vm::Vm},
    type_checker::type_checker::type_check,
};

enum Flow {
    Normal,
    Return(i32),
}

/// Walks the AST directly, with the same i32 semantics as the machine.
struct Evaluator<'p> {
    globals: HashMap<String, i32>,
    functions: HashMap<String, (&'p [Param], &'p [Stmt])>,
}

impl<'p> Evaluator<'p> {
    fn new(program: &'p Program) -> Self {
        let mut functions = HashMap::new();
        for stmt in program.body.iter() {
            if let StmtKind::FunctionDef { name, params, body, .. } = &stmt.kind {
                functions.insert(name.clone(), (params.as_slice(), body.as_slice()));
            }
        }

        Evaluator {
            globals: HashMap::new(),
            functions,
        }
    }

    /// Runs the program and returns what the entry function would.
    fn run(&mut self, program: &'p Program) -> Option<i32> {
        let last = program.body.len().checked_sub(1)?;
        let mut result = None;

        for (index, stmt) in program.body.iter().enumerate() {
            match &stmt.kind {
                StmtKind::Expr(expr) if index == last => result = Some(self.eval(expr, &mut None)),
                _ => {
                    self.exec(stmt, &mut None);
                }
            }
        }
        result
    }

    fn store(&mut self, name: &str, value: i32, locals: &mut Option<HashMap<String, i32>>) {
        match locals {
            Some(locals) if locals.contains_key(name) => {
                locals.insert(name.to_string(), value);
            }
            _ => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    fn exec_block(&mut self, body: &'p [Stmt], locals: &mut Option<HashMap<String, i32>>) -> Flow {
        for stmt in body.iter() {
            if let Flow::Return(value) = self.exec(stmt, locals) {
                return Flow::Return(value);
            }
        }
        Flow::Normal
    }

    fn exec(&mut self, stmt: &'p Stmt, locals: &mut Option<HashMap<String, i32>>) -> Flow {
        match &stmt.kind {
            StmtKind::Init { name, value, .. } => {
                let value = self.eval(value, locals);
                match locals {
                    Some(locals) => {
                        locals.insert(name.clone(), value);
                    }
                    None => {
                        self.globals.insert(name.clone(), value);
                    }
                }
            }
            StmtKind::Assign { name, value } => {
                let value = self.eval(value, locals);
                self.store(name, value, locals);
            }
            StmtKind::If {
                cond,
                then_body,
                elif,
                else_body,
            } => {
                if self.eval(cond, locals) != 0 {
                    return self.exec_block(then_body, locals);
                }
                if let Some((elif_cond, elif_body)) = elif {
                    if self.eval(elif_cond, locals) != 0 {
                        return self.exec_block(elif_body, locals);
                    }
                }
                return self.exec_block(else_body, locals);
            }
            StmtKind::While { cond, body } => {
                while self.eval(cond, locals) != 0 {
                    if let Flow::Return(value) = self.exec_block(body, locals) {
                        return Flow::Return(value);
                    }
                }
            }
            StmtKind::Return(expr) => return Flow::Return(self.eval(expr, locals)),
            StmtKind::Expr(expr) => {
                self.eval(expr, locals);
            }
            StmtKind::Pass | StmtKind::FunctionDef { .. } => {}
        }
        Flow::Normal
    }

    fn eval(&mut self, expr: &'p Expr, locals: &mut Option<HashMap<String, i32>>) -> i32 {
        match &expr.kind {
            ExprKind::None => 0,
            ExprKind::Bool(value) => *value as i32,
            ExprKind::Int(value) => *value,
            ExprKind::Identifier(name) => match locals.as_ref().and_then(|locals| locals.get(name)) {
                Some(value) => *value,
                None => self.globals[name],
            },
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, locals);
                match op {
                    UnaryOp::Neg => value.wrapping_neg(),
                    UnaryOp::Not => (value == 0) as i32,
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, locals);
                let right = self.eval(right, locals);
                match op {
                    BinaryOp::Add => left.wrapping_add(right),
                    BinaryOp::Sub => left.wrapping_sub(right),
                    BinaryOp::Mul => left.wrapping_mul(right),
                    BinaryOp::FloorDiv => left / right,
                    BinaryOp::Mod => left % right,
                    BinaryOp::Lt => (left < right) as i32,
                    BinaryOp::Le => (left <= right) as i32,
                    BinaryOp::Gt => (left > right) as i32,
                    BinaryOp::Ge => (left >= right) as i32,
                    BinaryOp::Eq | BinaryOp::Is => (left == right) as i32,
                    BinaryOp::Ne => (left != right) as i32,
                }
            }
            ExprKind::Call { name, args } => {
                let values: Vec<i32> = args.iter().map(|arg| self.eval(arg, locals)).collect();
                let (params, body) = self.functions[name];

                let mut frame: HashMap<String, i32> = params
                    .iter()
                    .map(|param| param.name.clone())
                    .zip(values)
                    .collect();
                for stmt in body.iter() {
                    if let StmtKind::Init { name, .. } = &stmt.kind {
                        frame.insert(name.clone(), 0);
                    }
                }

                match self.exec_block(body, &mut Some(frame)) {
                    Flow::Return(value) => value,
                    Flow::Normal => 0,
                }
            }
            // Nothing is left on the stack; a final print reads as the padding zero
            ExprKind::Print(arg) => {
                self.eval(arg, locals);
                0
            }
        }
    }
}

fn reference(source: &str) -> Value {
    let program = parse_program(source, None).unwrap();
    let result_type = compile_unit(source, None, &GlobalEnv::new()).unwrap().result_type;
    let raw = Evaluator::new(&program).run(&program);

    Value::convert(raw, result_type)
}

fn compiled(source: &str) -> Value {
    let mut vm = Vm::new();
    let mut imports = BufferedImports::new();
    let config = RunConfig {
        env: GlobalEnv::new(),
        runtime: &mut vm,
        imports: &mut imports,
    };

    run(source, config).unwrap().0
}

const PROGRAMS: [&str; 13] = [
    "2 + 3",
    "not not not True",
    "-(4 - 9) * 3 // 2 % 5",
    "def fact(x:int)->int:\n if x==0:\n  return 1\n else:\n  return x*fact(x-1)\nfact(5)",
    "n:int=5\nx:int=1\nwhile n>0:\n x=x*n\n n=n-1\nx",
    "x:int=8\nif x==8:\n x=10\nx",
    "x:int = 3\ny:bool = x > 2\nnot y",
    "None is None",
    "print(5)",
    "def gcd(a:int, b:int)->int:\n  t:int = 0\n  while b != 0:\n    t = b\n    b = a % b\n    a = t\n  return a\ngcd(84, 36)",
    "total:int = 0\ni:int = 0\nwhile i < 10:\n  if i % 3 == 0:\n    total = total + i\n  elif i % 3 == 1:\n    total = total - 1\n  else:\n    pass\n  i = i + 1\ntotal",
    "limit:int = 4\ndef count(n:int)->int:\n  if n >= limit:\n    return n\n  return count(n + 1)\ncount(0)",
    "def nothing():\n  pass\nnothing()",
];

#[test]
fn test_compiled_matches_reference() {
    for source in PROGRAMS.iter() {
        assert_eq!(compiled(source), reference(source), "program:\n{}", source);
    }
}

#[test]
fn test_three_arm_conditional_runs_exactly_one_arm() {
    for a in [true, false] {
        for b in [true, false] {
            let guard = |value: bool| if value { "True" } else { "False" };
            let source = format!(
                "a:bool = {}\nb:bool = {}\nhits:int = 0\nif a:\n  hits = hits + 1\nelif b:\n  hits = hits + 10\nelse:\n  hits = hits + 100\nhits",
                guard(a),
                guard(b)
            );

            let expected = if a {
                1
            } else if b {
                10
            } else {
                100
            };
            assert_eq!(compiled(&source), Value::Int(expected), "a={} b={}", a, b);
            assert_eq!(reference(&source), Value::Int(expected));
        }
    }
}

#[test]
fn test_three_arm_conditional_in_function() {
    let function = "def pick(a:bool, b:bool)->int:\n  if a:\n    return 1\n  elif b:\n    return 2\n  else:\n    return 3\n";

    for (a, b, expected) in [
        ("True", "True", 1),
        ("True", "False", 1),
        ("False", "True", 2),
        ("False", "False", 3),
    ] {
        let source = format!("{}pick({}, {})", function, a, b);
        assert_eq!(compiled(&source), Value::Int(expected));
    }
}

#[test]
fn test_entry_stack_depth_is_zero_or_one() {
    for source in PROGRAMS.iter().chain(["x:int = 1\nx = 2", "print(1)\nprint(True)"].iter()) {
        let program = parse_program(source, None).unwrap();
        let analysis = type_check(&program).unwrap();
        let unit = compile(&program, &analysis.environment, &MemoryLayout::new()).unwrap();

        assert!(unit.stack_depth <= 1, "program:\n{}", source);
        assert_eq!(unit.stack_depth, unit.returns_value as u32);
    }
}

#[test]
fn test_synthetic_zero_when_nothing_is_left() {
    let program = parse_program("x:int = 1\nprint(x)", None).unwrap();
    let analysis = type_check(&program).unwrap();
    let unit = compile(&program, &analysis.environment, &MemoryLayout::new()).unwrap();

    assert_eq!(unit.main.last(), Some(&Instr::Const(0)));
    assert!(unit.main_source.ends_with("(call $print_int)\n    (i32.const 0)\n"));
}

#[test]
fn test_bool_return_in_int_function_fails() {
    for body in [
        "  return True",
        "  if x > 0:\n    return False\n  return 0",
        "  while x > 0:\n    return x == 1\n  return 0",
    ] {
        let source = format!("def f(x:int)->int:\n{}\nf(1)", body);
        let program = parse_program(&source, None).unwrap();

        assert!(type_check(&program).is_err(), "program:\n{}", source);
    }
}

#[test]
fn test_declaration_after_statement_is_scope_error() {
    let late = ["y:int = 2", "def g()->int:\n  return 1"];

    for declaration in late.iter() {
        let top_level = format!("x:int = 1\nx = 3\n{}", declaration);
        let error = compile_unit(&top_level, None, &GlobalEnv::new()).unwrap_err();
        assert_eq!(error.get_error_kind(), ErrorKind::ScopeError, "program:\n{}", top_level);
    }

    for body in ["  pass\n  y:int = 2", "  if True:\n    pass\n  y:bool = False", "  while False:\n    y:int = 1"] {
        let source = format!("def f()->int:\n{}\n  return 0\nf()", body);
        let error = compile_unit(&source, None, &GlobalEnv::new()).unwrap_err();
        assert_eq!(error.get_error_kind(), ErrorKind::ScopeError, "program:\n{}", source);
    }
}

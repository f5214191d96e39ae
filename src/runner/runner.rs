use std::{fmt::Display, time::Instant};

use tracing::debug;

use crate::{
    ast::{
        ast::{Program, StmtKind},
        types::Type,
    },
    compiler::{compiler::compile, layout::MemoryLayout, module::assemble_unit},
    errors::errors::Error,
    lowering::lowering::parse_program,
    runtime::{
        host::HostImports,
        vm::{Runtime, Vm},
    },
    type_checker::{environment::Environment, type_checker::type_check_seeded},
};

/// Everything later units need from the units run before them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalEnv {
    pub layout: MemoryLayout,
    /// Top-level variables and functions declared so far.
    pub env: Environment,
    /// Rendered definitions of the functions declared so far.
    pub functions: Vec<String>,
}

impl GlobalEnv {
    pub fn new() -> Self {
        GlobalEnv::default()
    }
}

/// What `run` executes a unit with.
pub struct RunConfig<'a> {
    pub env: GlobalEnv,
    pub runtime: &'a mut dyn Runtime,
    pub imports: &'a mut dyn HostImports,
}

/// Result of a program, as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Bool(bool),
    None,
}

impl Value {
    /// Interprets the raw entry result by the program's result type. Any
    /// combination that does not make sense reads as `0`.
    pub fn convert(raw: Option<i32>, type_: Type) -> Value {
        match (raw, type_) {
            (None, _) => Value::None,
            (Some(raw), Type::Bool) => Value::Bool(raw == 1),
            (Some(raw), Type::Int) => Value::Int(raw),
            (Some(0), Type::NoneType) => Value::None,
            _ => Value::Int(0),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::None => write!(f, "None"),
        }
    }
}

/// A compiled unit ready to execute.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub module_text: String,
    pub result_type: Type,
    pub returns_value: bool,
    /// The environment as it will be once the unit has run.
    pub env: GlobalEnv,
}

/// The type the entry function's result is read as. Only a unit ending in an
/// expression returns a value; any other unit reads as `NoneType`.
pub fn entry_result_type(program: &Program, checked: Type) -> Type {
    match program.body.last().map(|stmt| &stmt.kind) {
        Some(StmtKind::Expr(_)) => checked,
        _ => Type::NoneType,
    }
}

/// Parses, checks and generates one unit on top of `env`.
pub fn compile_unit(source: &str, file: Option<String>, env: &GlobalEnv) -> Result<Compiled, Error> {
    let start = Instant::now();
    let program = parse_program(source, file)?;
    debug!(elapsed = ?start.elapsed(), "parsed");

    let check_start = Instant::now();
    let analysis = type_check_seeded(&program, Some(&env.env))?;
    debug!(elapsed = ?check_start.elapsed(), "type checked");

    let compile_start = Instant::now();
    let unit = compile(&program, &analysis.environment, &env.layout)?;
    let module_text = assemble_unit(&env.functions, &unit);
    debug!(
        elapsed = ?compile_start.elapsed(),
        bytes = module_text.len(),
        "generated module"
    );

    let result_type = entry_result_type(&program, analysis.result_type);

    let mut functions = env.functions.clone();
    functions.extend(unit.function_defs.iter().cloned());

    Ok(Compiled {
        module_text,
        result_type,
        returns_value: unit.returns_value,
        env: GlobalEnv {
            layout: unit.layout,
            env: analysis.environment,
            functions,
        },
    })
}

/// Compiles and executes `source`, returning its converted result and the
/// environment for the next unit.
pub fn run(source: &str, config: RunConfig) -> Result<(Value, GlobalEnv), Error> {
    let RunConfig {
        env,
        runtime,
        imports,
    } = config;

    let compiled = compile_unit(source, None, &env)?;

    let start = Instant::now();
    let raw = runtime.execute(&compiled.module_text, imports)?;
    debug!(elapsed = ?start.elapsed(), raw = ?raw, "executed");

    Ok((Value::convert(raw, compiled.result_type), compiled.env))
}

/// A chain of units sharing top-level declarations and memory, as in a REPL.
pub struct Session<I: HostImports> {
    env: GlobalEnv,
    vm: Vm,
    imports: I,
}

impl<I: HostImports> Session<I> {
    pub fn new(imports: I) -> Self {
        Session {
            env: GlobalEnv::new(),
            vm: Vm::new(),
            imports,
        }
    }

    /// Runs one unit. A failing unit leaves the declarations unchanged.
    pub fn run(&mut self, source: &str) -> Result<Value, Error> {
        let config = RunConfig {
            env: self.env.clone(),
            runtime: &mut self.vm,
            imports: &mut self.imports,
        };

        let (value, env) = run(source, config)?;
        self.env = env;
        Ok(value)
    }

    pub fn env(&self) -> &GlobalEnv {
        &self.env
    }

    pub fn imports(&self) -> &I {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut I {
        &mut self.imports
    }
}

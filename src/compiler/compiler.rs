//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives generation of
//! one compilation unit: the function definitions and the instruction stream
//! of the exported entry function. It owns the per-unit operand stack counter
//! and reads variable addresses from the memory layout.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::{
    ast::ast::{Param, Program, Stmt, StmtKind},
    errors::errors::{Error, ErrorImpl},
    type_checker::environment::{Environment, TypeEnvironment},
    Position,
};

use super::{
    expr::gen_expression,
    instr::{render_all, Instr, StackCounter},
    layout::MemoryLayout,
    stmt::{gen_block, gen_statement},
};

/// State of the code generator for one compilation unit.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the memory layout being compiled against
pub struct Compiler<'a> {
    /// Slot addresses of top-level variables
    pub layout: &'a MemoryLayout,
    /// Types of visible names, used to pick the `print` import
    pub env: TypeEnvironment,
    /// Modeled operand stack depth of the code emitted so far
    pub counter: StackCounter,
    /// Parameters and locals of the function being compiled, if any
    pub locals: Option<HashSet<String>>,
}

impl<'a> Compiler<'a> {
    pub fn new(layout: &'a MemoryLayout, top_level: &Environment) -> Self {
        let mut env = TypeEnvironment::new();
        env.current_mut().overlay(top_level);

        Compiler {
            layout,
            env,
            counter: StackCounter::new(),
            locals: None,
        }
    }

    /// Whether code is being generated for a function body.
    pub fn in_function(&self) -> bool {
        self.locals.is_some()
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals
            .as_ref()
            .map(|locals| locals.contains(name))
            .unwrap_or(false)
    }

    /// Appends `instr` to `out`, tracking its effect on the operand stack.
    pub fn emit(&mut self, out: &mut Vec<Instr>, instr: Instr, position: &Position) -> Result<(), Error> {
        self.counter
            .apply(&instr)
            .map_err(|error| Error::new(error, position.clone()))?;
        out.push(instr);
        Ok(())
    }

    /// Emits the two instructions that address a top-level variable.
    pub fn emit_address(&mut self, out: &mut Vec<Instr>, name: &str, position: &Position) -> Result<(), Error> {
        let offset = self.layout.address_of(name).ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownName {
                    name: name.to_string(),
                },
                position.clone(),
            )
        })?;

        self.emit(
            out,
            Instr::Address {
                offset,
                name: name.to_string(),
            },
            position,
        )
    }
}

/// Output of one compilation unit, ready to be wrapped into a module.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Rendered `(func ...)` definitions, one per function.
    pub function_defs: Vec<String>,
    /// Instructions of the entry function.
    pub main: Vec<Instr>,
    /// Rendered entry function body.
    pub main_source: String,
    /// Whether the entry function declares an `i32` result.
    pub returns_value: bool,
    /// Modeled stack depth at the end of the entry function.
    pub stack_depth: u32,
    /// The layout extended with this unit's top-level variables.
    pub layout: MemoryLayout,
}

fn collect_locals(params: &[Param], body: &[Stmt]) -> (Vec<String>, Environment) {
    let mut locals = vec![];
    let mut layer = Environment::new();

    for param in params.iter() {
        layer.variables.insert(param.name.clone(), param.type_);
    }
    for stmt in body.iter() {
        if let StmtKind::Init { name, type_, .. } = &stmt.kind {
            locals.push(name.clone());
            layer.variables.insert(name.clone(), *type_);
        }
    }

    (locals, layer)
}

/// Generates one `(func ...)` definition.
///
/// Every function returns an `i32`; falling off the end of the body returns 0.
pub fn gen_function(
    compiler: &mut Compiler,
    name: &str,
    params: &[Param],
    body: &[Stmt],
    position: &Position,
) -> Result<String, Error> {
    let (locals, layer) = collect_locals(params, body);

    let mut scope: HashSet<String> = params.iter().map(|param| param.name.clone()).collect();
    scope.extend(locals.iter().cloned());

    compiler.env.push_layer(layer);
    let saved_locals = compiler.locals.replace(scope);
    let saved_counter = std::mem::take(&mut compiler.counter);

    let result = gen_function_body(compiler, name, body, position);

    compiler.counter = saved_counter;
    compiler.locals = saved_locals;
    compiler.env.pop_layer();

    let instrs = result?;

    let mut header = format!("(func ${}", name);
    for param in params.iter() {
        header.push_str(&format!(" (param ${} i32)", param.name));
    }
    header.push_str(" (result i32)\n");
    for local in locals.iter() {
        header.push_str(&format!("  (local ${} i32)\n", local));
    }

    let text = format!("{}{})", header, render_all(&instrs, 1));
    trace!(function = name, text = text.as_str(), "generated function");
    Ok(text)
}

fn gen_function_body(
    compiler: &mut Compiler,
    name: &str,
    body: &[Stmt],
    position: &Position,
) -> Result<Vec<Instr>, Error> {
    let mut instrs = gen_block(compiler, body)?;
    compiler.emit(&mut instrs, Instr::Const(0), position)?;

    if compiler.counter.depth() != 1 {
        return Err(Error::new(
            ErrorImpl::UnbalancedStack {
                context: format!("function `{}`", name),
                depth: compiler.counter.depth(),
                expected: 1,
            },
            position.clone(),
        ));
    }

    Ok(instrs)
}

/// Compiles a checked program against the top-level environment from the
/// analysis and the layout carried over from earlier units.
pub fn compile(program: &Program, top_level: &Environment, layout: &MemoryLayout) -> Result<CompiledUnit, Error> {
    let layout = layout.augment(program);
    let mut compiler = Compiler::new(&layout, top_level);

    let mut function_defs = vec![];
    for stmt in program.body.iter() {
        if let StmtKind::FunctionDef { name, params, body, .. } = &stmt.kind {
            function_defs.push(gen_function(&mut compiler, name, params, body, &stmt.span.start)?);
        }
    }

    let returns_value = matches!(
        program.body.last().map(|stmt| &stmt.kind),
        Some(StmtKind::Expr(_))
    );

    compiler.counter.reset();
    let mut main = vec![];
    let last = program.body.len().saturating_sub(1);

    for (index, stmt) in program.body.iter().enumerate() {
        match &stmt.kind {
            StmtKind::FunctionDef { .. } => {}
            // The final expression's value is the entry function's result
            StmtKind::Expr(expr) if index == last => gen_expression(&mut compiler, expr, &mut main)?,
            _ => gen_statement(&mut compiler, stmt, &mut main)?,
        }
    }

    let end = program
        .body
        .last()
        .map(|stmt| stmt.span.end.clone())
        .unwrap_or_else(Position::null);

    if returns_value && compiler.counter.depth() == 0 {
        compiler.emit(&mut main, Instr::Const(0), &end)?;
    }

    let expected = returns_value as u32;
    let stack_depth = compiler.counter.depth();
    if stack_depth != expected {
        return Err(Error::new(
            ErrorImpl::UnbalancedStack {
                context: String::from("entry function"),
                depth: stack_depth,
                expected,
            },
            end,
        ));
    }
    compiler.counter.reset();

    let main_source = render_all(&main, 2);
    debug!(
        functions = function_defs.len(),
        instructions = main.len(),
        returns_value,
        "compiled unit"
    );

    Ok(CompiledUnit {
        function_defs,
        main,
        main_source,
        returns_value,
        stack_depth,
        layout: layout.clone(),
    })
}

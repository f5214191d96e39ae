use crate::{
    ast::{
        ast::{Expr, ExprKind, Stmt, StmtKind},
        types::UnaryOp,
    },
    errors::errors::Error,
    Position,
};

use super::{compiler::Compiler, expr::gen_expression, instr::Instr};

/// Generates a sequence of statements into a fresh instruction list.
pub fn gen_block(compiler: &mut Compiler, body: &[Stmt]) -> Result<Vec<Instr>, Error> {
    let mut out = vec![];
    for stmt in body.iter() {
        gen_statement(compiler, stmt, &mut out)?;
    }
    Ok(out)
}

/// Stores the value of `value` into `name`: a local in function mode, a
/// memory slot otherwise.
fn gen_store(
    compiler: &mut Compiler,
    name: &str,
    value: &Expr,
    out: &mut Vec<Instr>,
    position: &Position,
) -> Result<(), Error> {
    if compiler.in_function() && compiler.is_local(name) {
        gen_expression(compiler, value, out)?;
        compiler.emit(out, Instr::LocalSet(name.to_string()), position)
    } else {
        compiler.emit_address(out, name, position)?;
        gen_expression(compiler, value, out)?;
        compiler.emit(out, Instr::Store, position)
    }
}

/// Generates a statement. Every statement leaves the stack as it found it.
pub fn gen_statement(compiler: &mut Compiler, statement: &Stmt, out: &mut Vec<Instr>) -> Result<(), Error> {
    let position = &statement.span.start;

    match &statement.kind {
        StmtKind::Pass => compiler.emit(out, Instr::Nop, position),
        StmtKind::Init { name, value, .. } | StmtKind::Assign { name, value } => {
            gen_store(compiler, name, value, out, position)
        }
        StmtKind::Expr(expr) => {
            let before = compiler.counter.depth();
            gen_expression(compiler, expr, out)?;
            if compiler.counter.depth() > before {
                compiler.emit(out, Instr::Drop, position)?;
            }
            Ok(())
        }
        StmtKind::Return(expr) => {
            gen_expression(compiler, expr, out)?;
            compiler.emit(out, Instr::Return, position)
        }
        StmtKind::If {
            cond,
            then_body,
            elif,
            else_body,
        } => {
            let instr = match elif {
                None => {
                    // (block (block cond (br_if 0) else (br 1)) then)
                    let mut inner = vec![];
                    gen_expression(compiler, cond, &mut inner)?;
                    compiler.emit(&mut inner, Instr::BrIf(0), position)?;
                    inner.extend(gen_block(compiler, else_body)?);
                    compiler.emit(&mut inner, Instr::Br(1), position)?;

                    let mut outer = vec![Instr::Block(inner)];
                    outer.extend(gen_block(compiler, then_body)?);
                    Instr::Block(outer)
                }
                Some((elif_cond, elif_body)) => {
                    let mut innermost = vec![];
                    gen_expression(compiler, cond, &mut innermost)?;
                    compiler.emit(&mut innermost, Instr::BrIf(0), position)?;
                    gen_expression(compiler, elif_cond, &mut innermost)?;
                    compiler.emit(&mut innermost, Instr::BrIf(1), position)?;
                    innermost.extend(gen_block(compiler, else_body)?);
                    compiler.emit(&mut innermost, Instr::Br(2), position)?;

                    let mut middle = vec![Instr::Block(innermost)];
                    middle.extend(gen_block(compiler, then_body)?);
                    compiler.emit(&mut middle, Instr::Br(1), position)?;

                    let mut outer = vec![Instr::Block(middle)];
                    outer.extend(gen_block(compiler, elif_body)?);
                    Instr::Block(outer)
                }
            };
            compiler.emit(out, instr, position)
        }
        StmtKind::While { cond, body } => {
            let negated = Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(cond.clone()),
                },
                cond.span.clone(),
            );

            let mut block = vec![];
            gen_expression(compiler, &negated, &mut block)?;
            compiler.emit(&mut block, Instr::BrIf(0), position)?;

            let mut looped = gen_block(compiler, body)?;
            gen_expression(compiler, cond, &mut looped)?;
            compiler.emit(&mut looped, Instr::BrIf(0), position)?;
            compiler.emit(&mut looped, Instr::Br(1), position)?;

            compiler.emit(&mut block, Instr::Loop(looped), position)?;
            compiler.emit(out, Instr::Block(block), position)
        }
        // Definitions are generated separately and nested ones are rejected
        // during checking
        StmtKind::FunctionDef { .. } => Ok(()),
    }
}

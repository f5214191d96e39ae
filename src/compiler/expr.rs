use crate::{
    ast::{
        ast::{Expr, ExprKind},
        types::{BinaryOp, Type, UnaryOp},
    },
    errors::errors::Error,
    type_checker::type_checker::type_check_expr,
};

use super::{
    compiler::Compiler,
    instr::{Instr, NumOp},
};

pub fn num_op(op: BinaryOp) -> NumOp {
    match op {
        BinaryOp::Add => NumOp::Add,
        BinaryOp::Sub => NumOp::Sub,
        BinaryOp::Mul => NumOp::Mul,
        BinaryOp::FloorDiv => NumOp::DivS,
        BinaryOp::Mod => NumOp::RemS,
        BinaryOp::Lt => NumOp::LtS,
        BinaryOp::Le => NumOp::LeS,
        BinaryOp::Gt => NumOp::GtS,
        BinaryOp::Ge => NumOp::GeS,
        BinaryOp::Eq => NumOp::Eq,
        BinaryOp::Ne => NumOp::Ne,
        // Only `None is None` type checks, so identity is plain equality
        BinaryOp::Is => NumOp::Eq,
    }
}

/// Host import that prints a value of the given type.
pub fn print_import(type_: Type) -> &'static str {
    match type_ {
        Type::Int => "print_int",
        Type::Bool => "print_bool",
        Type::NoneType | Type::NoType => "print",
    }
}

/// Generates the instructions that leave the value of `expression` on the stack.
pub fn gen_expression(compiler: &mut Compiler, expression: &Expr, out: &mut Vec<Instr>) -> Result<(), Error> {
    let position = &expression.span.start;

    match &expression.kind {
        ExprKind::None => compiler.emit(out, Instr::Const(0), position),
        ExprKind::Bool(value) => compiler.emit(out, Instr::Const(*value as i32), position),
        ExprKind::Int(value) => compiler.emit(out, Instr::Const(*value), position),
        ExprKind::Identifier(name) => {
            if compiler.is_local(name) {
                compiler.emit(out, Instr::LocalGet(name.clone()), position)
            } else {
                compiler.emit_address(out, name, position)?;
                compiler.emit(out, Instr::Load, position)
            }
        }
        ExprKind::Unary { op, operand } => {
            gen_expression(compiler, operand, out)?;
            match op {
                // (x + 1) % 2
                UnaryOp::Not => {
                    compiler.emit(out, Instr::Const(1), position)?;
                    compiler.emit(out, Instr::Num(NumOp::Add), position)?;
                    compiler.emit(out, Instr::Const(2), position)?;
                    compiler.emit(out, Instr::Num(NumOp::RemS), position)
                }
                UnaryOp::Neg => {
                    compiler.emit(out, Instr::Const(-1), position)?;
                    compiler.emit(out, Instr::Num(NumOp::Mul), position)
                }
            }
        }
        ExprKind::Binary { op, left, right } => {
            gen_expression(compiler, left, out)?;
            gen_expression(compiler, right, out)?;
            compiler.emit(out, Instr::Num(num_op(*op)), position)
        }
        ExprKind::Call { name, args } => {
            for arg in args.iter() {
                gen_expression(compiler, arg, out)?;
            }
            compiler.emit(
                out,
                Instr::Call {
                    name: name.clone(),
                    params: args.len() as u32,
                    results: 1,
                },
                position,
            )
        }
        ExprKind::Print(arg) => {
            gen_expression(compiler, arg, out)?;
            // Typed against the enclosing scope, so function locals resolve
            let arg_type = type_check_expr(&compiler.env, arg)?;
            compiler.emit(
                out,
                Instr::Call {
                    name: print_import(arg_type).to_string(),
                    params: 1,
                    results: 0,
                },
                position,
            )
        }
    }
}

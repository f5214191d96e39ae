use crate::{
    ast::{
        ast::{Expr, ExprKind},
        types::{BinaryOp, UnaryOp},
    },
    errors::errors::{Error, ErrorImpl},
    parser::tree::NodeKind,
};

use super::{
    builtins::get_builtin,
    cursor::{unsupported, Cursor},
};

pub fn lower_expr(c: Cursor, source: &str) -> Result<Expr, Error> {
    let node = c.expect("expr", source)?;
    let span = node.span.clone();

    match node.kind {
        NodeKind::Number => {
            let text = node.text(source);
            let value = text.parse::<i32>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: text.to_string(),
                    },
                    span.start.clone(),
                )
            })?;
            Ok(Expr::new(ExprKind::Int(value), span))
        }
        NodeKind::Boolean => Ok(Expr::new(ExprKind::Bool(node.text(source) == "True"), span)),
        NodeKind::None => Ok(Expr::new(ExprKind::None, span)),
        NodeKind::VariableName => Ok(Expr::new(
            ExprKind::Identifier(node.text(source).to_string()),
            span,
        )),
        NodeKind::UnaryExpression => {
            let op_cursor = c.first_child();
            let op_node = op_cursor.expect("expr", source)?;
            let op = UnaryOp::from_symbol(op_node.text(source))
                .ok_or_else(|| unsupported("expr", op_node, source))?;
            let operand = lower_expr(op_cursor.next_sibling(), source)?;

            Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ))
        }
        NodeKind::BinaryExpression => {
            let left_cursor = c.first_child();
            let left = lower_expr(left_cursor, source)?;

            let op_cursor = left_cursor.next_sibling();
            let op_node = op_cursor.expect("expr", source)?;
            if op_node.kind == NodeKind::LogicOp {
                return Err(unsupported("expr", op_node, source));
            }
            let op = BinaryOp::from_symbol(op_node.text(source))
                .ok_or_else(|| unsupported("expr", op_node, source))?;

            let right = lower_expr(op_cursor.next_sibling(), source)?;

            Ok(Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            ))
        }
        NodeKind::ParenthesizedExpression => {
            let inner = lower_expr(c.first_child().next_sibling(), source)?;
            Ok(Expr::new(inner.kind, span))
        }
        NodeKind::CallExpression => lower_call(c, source),
        _ => Err(unsupported("expr", node, source)),
    }
}

fn lower_call(c: Cursor, source: &str) -> Result<Expr, Error> {
    let node = c.expect("expr", source)?;

    let callee = c.first_child();
    let callee_node = callee.expect("expr", source)?;
    if callee_node.kind != NodeKind::VariableName {
        return Err(unsupported("expr", callee_node, source));
    }
    let name = callee_node.text(source).to_string();

    let arg_list = callee.next_sibling();
    if !arg_list.is(NodeKind::ArgList) {
        return Err(unsupported("expr", node, source));
    }
    // Skip the "("
    let (args, _close) = read_args(arg_list.first_child().next_sibling(), source)?;

    if let Some(builtin) = get_builtin(&name) {
        if args.len() != builtin.arity {
            return Err(Error::new(
                ErrorImpl::UnexpectedArguments {
                    expected: builtin.arity,
                    received: args.len(),
                },
                node.span.start.clone(),
            ));
        }

        return match (builtin.lower)(args) {
            Some(kind) => Ok(Expr::new(kind, node.span.clone())),
            None => Err(unsupported("expr", node, source)),
        };
    }

    Ok(Expr::new(ExprKind::Call { name, args }, node.span.clone()))
}

/// Reads `argument, separator` pairs until the closing parenthesis.
///
/// Returns the arguments and a cursor on the `)`.
pub fn read_args<'a>(mut c: Cursor<'a>, source: &str) -> Result<(Vec<Expr>, Cursor<'a>), Error> {
    let mut args = vec![];

    while !c.is(NodeKind::CloseParen) {
        args.push(lower_expr(c, source)?);

        c = c.next_sibling();
        if c.is(NodeKind::Comma) {
            c = c.next_sibling();
        }
    }

    Ok((args, c))
}

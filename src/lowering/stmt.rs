use crate::{
    ast::{
        ast::{Expr, ExprKind, Param, Stmt, StmtKind},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    parser::tree::NodeKind,
};

use super::{
    cursor::{unsupported, Cursor},
    expr::lower_expr,
};

pub fn lower_stmt(c: Cursor, source: &str) -> Result<Stmt, Error> {
    let node = c.expect("stmt", source)?;
    let span = node.span.clone();

    let kind = match node.kind {
        NodeKind::AssignStatement => lower_assign(c, source)?,
        NodeKind::IfStatement => lower_if(c, source)?,
        NodeKind::WhileStatement => {
            let cond = c.first_child().next_sibling();
            StmtKind::While {
                cond: lower_expr(cond, source)?,
                body: lower_body(cond.next_sibling(), source)?,
            }
        }
        NodeKind::FunctionDefinition => lower_function(c, source)?,
        NodeKind::ReturnStatement => {
            let keyword = c.first_child();
            let value = keyword.next_sibling();
            if value.at_end() {
                StmtKind::Return(Expr::new(ExprKind::None, keyword.span()))
            } else {
                StmtKind::Return(lower_expr(value, source)?)
            }
        }
        NodeKind::PassStatement => StmtKind::Pass,
        NodeKind::ExpressionStatement => StmtKind::Expr(lower_expr(c.first_child(), source)?),
        _ => return Err(unsupported("stmt", node, source)),
    };

    Ok(Stmt::new(kind, span))
}

/// `x: int = 1` lowers to `Init`, `x = 1` to `Assign`; the node after the
/// target name decides which.
fn lower_assign(c: Cursor, source: &str) -> Result<StmtKind, Error> {
    let target = c.first_child();
    let name = target.text(source).to_string();

    let next = target.next_sibling();
    match next.kind() {
        Some(NodeKind::TypeDef) => {
            let type_ = lower_type_def(next, source)?;
            // Skip the "="
            let value = lower_expr(next.next_sibling().next_sibling(), source)?;
            Ok(StmtKind::Init { name, type_, value })
        }
        Some(NodeKind::AssignOp) => {
            let value = lower_expr(next.next_sibling(), source)?;
            Ok(StmtKind::Assign { name, value })
        }
        _ => Err(unsupported("stmt", c.expect("stmt", source)?, source)),
    }
}

/// Reads the type out of a `TypeDef` node (`: int` or `-> int`).
fn lower_type_def(c: Cursor, source: &str) -> Result<Type, Error> {
    let type_name = c.first_child().next_sibling();
    let node = type_name.expect("type", source)?;
    let text = node.text(source);

    Type::from_annotation(text).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnknownType {
                type_: text.to_string(),
            },
            node.span.start.clone(),
        )
    })
}

/// Lowers the statements of a `Body` node, skipping its leading `:`.
pub fn lower_body(c: Cursor, source: &str) -> Result<Vec<Stmt>, Error> {
    let node = c.expect("body", source)?;
    if node.kind != NodeKind::Body {
        return Err(unsupported("body", node, source));
    }

    let mut stmts = vec![];
    let mut stmt = c.first_child().next_sibling();
    while !stmt.at_end() {
        stmts.push(lower_stmt(stmt, source)?);
        stmt = stmt.next_sibling();
    }

    Ok(stmts)
}

/// Reads `condition, body` and returns the cursor after the body.
fn read_arm<'a>(c: Cursor<'a>, source: &str) -> Result<(Expr, Vec<Stmt>, Cursor<'a>), Error> {
    let cond = lower_expr(c, source)?;
    let body_cursor = c.next_sibling();
    let body = lower_body(body_cursor, source)?;

    Ok((cond, body, body_cursor.next_sibling()))
}

fn lower_if(c: Cursor, source: &str) -> Result<StmtKind, Error> {
    let (cond, then_body, mut next) = read_arm(c.first_child().next_sibling(), source)?;

    let mut elif = None;
    if next.is(NodeKind::Elif) {
        let (elif_cond, elif_body, after) = read_arm(next.next_sibling(), source)?;
        elif = Some((elif_cond, elif_body));
        next = after;
    }

    // Only a single elif arm is supported
    if let Some(node) = next.node().filter(|node| node.kind == NodeKind::Elif) {
        return Err(unsupported("stmt", node, source));
    }

    let mut else_body = vec![];
    if next.is(NodeKind::Else) {
        else_body = lower_body(next.next_sibling(), source)?;
    }

    Ok(StmtKind::If {
        cond,
        then_body,
        elif,
        else_body,
    })
}

fn lower_function(c: Cursor, source: &str) -> Result<StmtKind, Error> {
    let name_cursor = c.first_child().next_sibling();
    let name = name_cursor.text(source).to_string();

    let param_list = name_cursor.next_sibling();
    if !param_list.is(NodeKind::ParamList) {
        return Err(unsupported("stmt", c.expect("stmt", source)?, source));
    }
    let (params, _close) = read_params(param_list.first_child().next_sibling(), source)?;

    let mut next = param_list.next_sibling();
    let mut ret = Type::NoneType;
    if next.is(NodeKind::TypeDef) {
        ret = lower_type_def(next, source)?;
        next = next.next_sibling();
    }

    let body = lower_body(next, source)?;

    Ok(StmtKind::FunctionDef {
        name,
        params,
        ret,
        body,
    })
}

/// Reads `name TypeDef [,]` groups until the closing parenthesis.
fn read_params<'a>(mut c: Cursor<'a>, source: &str) -> Result<(Vec<Param>, Cursor<'a>), Error> {
    let mut params = vec![];

    while !c.is(NodeKind::CloseParen) {
        let name_node = c.expect("param", source)?;
        if name_node.kind != NodeKind::VariableName {
            return Err(unsupported("param", name_node, source));
        }

        let type_def = c.next_sibling();
        let type_ = lower_type_def(type_def, source)?;

        params.push(Param {
            name: name_node.text(source).to_string(),
            type_,
            span: name_node.span.to(&type_def.span()),
        });

        c = type_def.next_sibling();
        if c.is(NodeKind::Comma) {
            c = c.next_sibling();
        }
    }

    Ok((params, c))
}

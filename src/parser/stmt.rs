use crate::{
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{
    parser::Parser,
    tree::{NodeKind, SyntaxNode},
};

pub fn parse_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    if let Some(handler) = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        return handler(parser);
    }

    if parser.current_token_kind() == TokenKind::Identifier
        && matches!(
            parser.peek_kind(),
            TokenKind::Colon | TokenKind::Assignment
        )
    {
        return parse_assign_stmt(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Newline)?;

    Ok(SyntaxNode::branch(NodeKind::ExpressionStatement, vec![expr]))
}

/// `name [: type] = value`
pub fn parse_assign_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let mut children = vec![parser.expect_leaf(TokenKind::Identifier, NodeKind::VariableName)?];

    if parser.current_token_kind() == TokenKind::Colon {
        let colon = parser.advance_leaf(NodeKind::Colon);
        let type_name = parse_type_name(parser)?;
        children.push(SyntaxNode::branch(NodeKind::TypeDef, vec![colon, type_name]));
    }

    children.push(parser.expect_leaf(TokenKind::Assignment, NodeKind::AssignOp)?);
    children.push(parse_expr(parser, BindingPower::Default)?);
    parser.expect(TokenKind::Newline)?;

    Ok(SyntaxNode::branch(NodeKind::AssignStatement, children))
}

/// Type annotations are bare names (`int`, `bool`) or `None`.
fn parse_type_name(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    match parser.current_token_kind() {
        TokenKind::Identifier => Ok(parser.advance_leaf(NodeKind::VariableName)),
        TokenKind::None => Ok(parser.advance_leaf(NodeKind::None)),
        _ => Err(parser.unexpected("expected a type name")),
    }
}

/// Parses `:` followed by either an indented block or a single simple
/// statement on the same line.
pub fn parse_body(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let mut children = vec![parser.expect_leaf(TokenKind::Colon, NodeKind::Colon)?];

    if parser.current_token_kind() != TokenKind::Newline {
        if parser.current_token().is_one_of_many(&[TokenKind::If, TokenKind::While, TokenKind::Def]) {
            return Err(parser.unexpected("compound statements must start on their own line"));
        }
        children.push(parse_stmt(parser)?);
        return Ok(SyntaxNode::branch(NodeKind::Body, children));
    }

    parser.advance();
    let error = parser.unexpected("expected an indented block");
    parser.expect_error(TokenKind::Indent, Some(error))?;

    while parser.has_tokens() && parser.current_token_kind() != TokenKind::Dedent {
        children.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::Dedent)?;

    Ok(SyntaxNode::branch(NodeKind::Body, children))
}

/// `if cond: body [elif cond: body]* [else: body]`
pub fn parse_if_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let mut children = vec![parser.advance_leaf(NodeKind::If)];
    children.push(parse_expr(parser, BindingPower::Default)?);
    children.push(parse_body(parser)?);

    while parser.current_token_kind() == TokenKind::Elif {
        children.push(parser.advance_leaf(NodeKind::Elif));
        children.push(parse_expr(parser, BindingPower::Default)?);
        children.push(parse_body(parser)?);
    }

    if parser.current_token_kind() == TokenKind::Else {
        children.push(parser.advance_leaf(NodeKind::Else));
        children.push(parse_body(parser)?);
    }

    Ok(SyntaxNode::branch(NodeKind::IfStatement, children))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let keyword = parser.advance_leaf(NodeKind::While);
    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_body(parser)?;

    Ok(SyntaxNode::branch(
        NodeKind::WhileStatement,
        vec![keyword, condition, body],
    ))
}

/// `def name(param: type, ...) [-> type]: body`
pub fn parse_fn_def_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let mut children = vec![parser.advance_leaf(NodeKind::Def)];
    children.push(parser.expect_leaf(TokenKind::Identifier, NodeKind::VariableName)?);

    let mut params = vec![parser.expect_leaf(TokenKind::OpenParen, NodeKind::OpenParen)?];
    while parser.current_token_kind() != TokenKind::CloseParen {
        params.push(parser.expect_leaf(TokenKind::Identifier, NodeKind::VariableName)?);

        let colon = parser.expect_leaf(TokenKind::Colon, NodeKind::Colon)?;
        let type_name = parse_type_name(parser)?;
        params.push(SyntaxNode::branch(NodeKind::TypeDef, vec![colon, type_name]));

        if parser.current_token_kind() == TokenKind::Comma {
            params.push(parser.advance_leaf(NodeKind::Comma));
        } else {
            break;
        }
    }
    params.push(parser.expect_leaf(TokenKind::CloseParen, NodeKind::CloseParen)?);
    children.push(SyntaxNode::branch(NodeKind::ParamList, params));

    if parser.current_token_kind() == TokenKind::Arrow {
        let arrow = parser.advance_leaf(NodeKind::Arrow);
        let type_name = parse_type_name(parser)?;
        children.push(SyntaxNode::branch(NodeKind::TypeDef, vec![arrow, type_name]));
    }

    children.push(parse_body(parser)?);

    Ok(SyntaxNode::branch(NodeKind::FunctionDefinition, children))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let mut children = vec![parser.advance_leaf(NodeKind::Return)];

    if parser.current_token_kind() != TokenKind::Newline {
        children.push(parse_expr(parser, BindingPower::Default)?);
    }

    parser.expect(TokenKind::Newline)?;

    Ok(SyntaxNode::branch(NodeKind::ReturnStatement, children))
}

pub fn parse_pass_stmt(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let keyword = parser.advance_leaf(NodeKind::Pass);
    parser.expect(TokenKind::Newline)?;

    Ok(SyntaxNode::branch(NodeKind::PassStatement, vec![keyword]))
}

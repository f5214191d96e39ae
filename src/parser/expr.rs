use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    lookups::BindingPower,
    parser::Parser,
    tree::{NodeKind, SyntaxNode},
};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<SyntaxNode, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let current_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if current_bp <= bp {
            break;
        }

        let Some(led) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ));
        };

        left = led(parser, left, current_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let kind = match parser.current_token_kind() {
        TokenKind::Number => NodeKind::Number,
        TokenKind::Identifier => NodeKind::VariableName,
        TokenKind::String => NodeKind::String,
        TokenKind::True | TokenKind::False => NodeKind::Boolean,
        TokenKind::None => NodeKind::None,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ))
        }
    };

    Ok(parser.advance_leaf(kind))
}

fn operator_node_kind(kind: TokenKind) -> NodeKind {
    match kind {
        TokenKind::And | TokenKind::Or => NodeKind::LogicOp,
        TokenKind::Less
        | TokenKind::LessEquals
        | TokenKind::Greater
        | TokenKind::GreaterEquals
        | TokenKind::Equals
        | TokenKind::NotEquals
        | TokenKind::Is => NodeKind::CompareOp,
        _ => NodeKind::ArithOp,
    }
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: SyntaxNode,
    bp: BindingPower,
) -> Result<SyntaxNode, Error> {
    let operator = parser.advance_leaf(operator_node_kind(parser.current_token_kind()));
    let right = parse_expr(parser, bp)?;

    Ok(SyntaxNode::branch(
        NodeKind::BinaryExpression,
        vec![left, operator, right],
    ))
}

/// `-operand` binds tighter than any binary operator, `not operand` looser
/// than comparisons.
pub fn parse_prefix_expr(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let operand_bp = if parser.current_token_kind() == TokenKind::Not {
        BindingPower::Not
    } else {
        BindingPower::Unary
    };

    let operator = parser.advance_leaf(NodeKind::UnaryOp);
    let operand = parse_expr(parser, operand_bp)?;

    Ok(SyntaxNode::branch(
        NodeKind::UnaryExpression,
        vec![operator, operand],
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<SyntaxNode, Error> {
    let open = parser.advance_leaf(NodeKind::OpenParen);
    let expr = parse_expr(parser, BindingPower::Default)?;
    let close = parser.expect_leaf(TokenKind::CloseParen, NodeKind::CloseParen)?;

    Ok(SyntaxNode::branch(
        NodeKind::ParenthesizedExpression,
        vec![open, expr, close],
    ))
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: SyntaxNode,
    _bp: BindingPower,
) -> Result<SyntaxNode, Error> {
    let mut args = vec![parser.advance_leaf(NodeKind::OpenParen)];

    while parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            args.push(parser.advance_leaf(NodeKind::Comma));
        } else {
            break;
        }
    }

    args.push(parser.expect_leaf(TokenKind::CloseParen, NodeKind::CloseParen)?);

    let arg_list = SyntaxNode::branch(NodeKind::ArgList, args);
    Ok(SyntaxNode::branch(
        NodeKind::CallExpression,
        vec![left, arg_list],
    ))
}

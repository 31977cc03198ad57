//! AST Lowerer: turns the parser's [`RawNode`] tree into the typed
//! [`Program`]. This is the one place that interprets raw node shapes,
//! substituting each node's original source line via the [`LineMap`] as it
//! goes. A shape the lowerer doesn't recognize is a fatal internal error —
//! everything upstream (grammar, preprocessor) is expected to have already
//! ruled it out.
use crate::ast::*;
use crate::error::Error;
use crate::parser::{RawKind, RawNode};
use crate::preprocess::LineMap;

pub fn lower_program(raw: &RawNode, line_map: &LineMap, source: &str) -> Result<Program, Error> {
    let block = raw
        .children
        .first()
        .ok_or_else(|| Error::Codegen("empty program node".into()))?;
    lower_block(block, line_map, source)
}

fn original_line(node: &RawNode, line_map: &LineMap, source: &str) -> usize {
    let preprocessed_line = source[..node.span.start].matches('\n').count() + 1;
    line_map.original_line(preprocessed_line)
}

fn lower_block(raw: &RawNode, line_map: &LineMap, source: &str) -> Result<Program, Error> {
    raw.children
        .iter()
        .map(|c| lower_stmt(c, line_map, source))
        .collect()
}

fn ident_text(raw: &RawNode) -> Result<&str, Error> {
    raw.text
        .as_deref()
        .ok_or_else(|| Error::Codegen(format!("expected identifier text, got {:?}", raw.kind)))
}

fn lower_stmt(raw: &RawNode, line_map: &LineMap, source: &str) -> Result<Statement, Error> {
    let line = original_line(raw, line_map, source);
    Ok(match raw.kind {
        RawKind::ImportStmt => Statement::Import(ImportStmt {
            module: ident_text(&raw.children[0])?.to_string(),
            line,
        }),
        RawKind::RequireStmt => {
            let path = ident_text(&raw.children[0])?.to_string();
            let alias = raw.children.get(1).map(|n| ident_text(n)).transpose()?.map(str::to_string);
            Statement::Require(RequireStmt { path, alias, line })
        }
        RawKind::FuncDef => {
            let name = ident_text(&raw.children[0])?.to_string();
            let (params, block_idx) = if raw.children.len() == 3 {
                (lower_params(&raw.children[1])?, 2)
            } else {
                (Vec::new(), 1)
            };
            let body = lower_block(&raw.children[block_idx], line_map, source)?;
            Statement::FuncDef(FuncDef {
                name,
                namespace: String::new(),
                params,
                body,
                line,
                source_path: String::new(),
            })
        }
        RawKind::TestDef => Statement::TestDef(TestDef {
            name: ident_text(&raw.children[0])?.to_string(),
            body: lower_block(&raw.children[1], line_map, source)?,
            line,
        }),
        RawKind::BenchDef => Statement::BenchDef(BenchDef {
            name: ident_text(&raw.children[0])?.to_string(),
            body: lower_block(&raw.children[1], line_map, source)?,
            line,
        }),
        RawKind::ReturnStmt => Statement::Return(ReturnStmt {
            value: raw
                .children
                .first()
                .map(|c| lower_expr(c, line_map, source))
                .transpose()?,
            line,
        }),
        RawKind::IfStmt => lower_if(raw, line_map, source, line)?,
        RawKind::WhileStmt => Statement::While(WhileStmt {
            condition: lower_expr(&raw.children[0], line_map, source)?,
            body: lower_block(&raw.children[1], line_map, source)?,
            line,
        }),
        RawKind::ForStmt => Statement::For(ForStmt {
            var: ident_text(&raw.children[0])?.to_string(),
            collection: lower_expr(&raw.children[1], line_map, source)?,
            body: lower_block(&raw.children[2], line_map, source)?,
            line,
        }),
        RawKind::AssignStmt => Statement::Assign(AssignStmt {
            target: ident_text(&raw.children[0])?.to_string(),
            value: lower_expr(&raw.children[1], line_map, source)?,
            line,
        }),
        RawKind::IndexAssignStmt => {
            let target = Expression::Ident(ident_text(&raw.children[0])?.to_string());
            let index_op = &raw.children[1];
            let index = lower_expr(&index_op.children[0], line_map, source)?;
            let value = lower_expr(&raw.children[2], line_map, source)?;
            Statement::IndexAssign(IndexAssignStmt {
                target,
                index,
                value,
                line,
            })
        }
        RawKind::DotAssignStmt => {
            let mut target = Expression::Ident(ident_text(&raw.children[0])?.to_string());
            let dot_ops = &raw.children[1..raw.children.len() - 1];
            let (last, leading) = dot_ops.split_last().ok_or_else(|| {
                Error::Codegen("dot-assign statement with no dotted field".into())
            })?;
            for dot_op in leading {
                let field = ident_text(&dot_op.children[0])?.to_string();
                target = Expression::Dot(DotExpr {
                    target: Box::new(target),
                    field,
                });
            }
            let field = ident_text(&last.children[0])?.to_string();
            let value = lower_expr(raw.children.last().unwrap(), line_map, source)?;
            Statement::DotAssign(DotAssignStmt {
                target,
                field,
                value,
                line,
            })
        }
        RawKind::ExprStmt => Statement::Expr(ExprStmt {
            expr: lower_expr(&raw.children[0], line_map, source)?,
            line,
        }),
        ref other => return Err(Error::Codegen(format!("unexpected statement node {other:?}"))),
    })
}

fn lower_if(
    raw: &RawNode,
    line_map: &LineMap,
    source: &str,
    line: usize,
) -> Result<Statement, Error> {
    let condition = lower_expr(&raw.children[0], line_map, source)?;
    let body = lower_block(&raw.children[1], line_map, source)?;

    let mut elsif_clauses = Vec::new();
    let mut else_body = None;
    for child in &raw.children[2..] {
        match child.kind {
            RawKind::ElsifClause => {
                let clause_line = original_line(child, line_map, source);
                elsif_clauses.push(ElsifClause {
                    condition: lower_expr(&child.children[0], line_map, source)?,
                    body: lower_block(&child.children[1], line_map, source)?,
                    line: clause_line,
                });
            }
            RawKind::ElseClause => {
                else_body = Some(lower_block(&child.children[0], line_map, source)?);
            }
            ref other => return Err(Error::Codegen(format!("unexpected if-clause node {other:?}"))),
        }
    }

    Ok(Statement::If(IfStmt {
        condition,
        body,
        elsif_clauses,
        else_body,
        line,
    }))
}

fn lower_params(raw: &RawNode) -> Result<Vec<String>, Error> {
    raw.children
        .iter()
        .map(|c| ident_text(c).map(str::to_string))
        .collect()
}

fn lower_expr(raw: &RawNode, line_map: &LineMap, source: &str) -> Result<Expression, Error> {
    match raw.kind {
        RawKind::Expr => {
            let mut terms = Vec::new();
            let mut ops = Vec::new();
            for child in &raw.children {
                match child.kind {
                    RawKind::Term => terms.push(lower_term(child, line_map, source)?),
                    RawKind::BinOp => ops.push(parse_bin_op(ident_text(child)?)?),
                    ref other => {
                        return Err(Error::Codegen(format!("unexpected node in expr: {other:?}")))
                    }
                }
            }
            let mut pos = 0;
            Ok(climb(&terms, &ops, &mut pos, 0))
        }
        RawKind::Term => lower_term(raw, line_map, source),
        _ => lower_term_like_atom(raw, line_map, source),
    }
}

fn lower_term(raw: &RawNode, line_map: &LineMap, source: &str) -> Result<Expression, Error> {
    let mut unary_ops = Vec::new();
    let mut atom_node = None;
    let mut postfix_nodes = Vec::new();

    for child in &raw.children {
        match child.kind {
            RawKind::UnaryOp => unary_ops.push(parse_un_op(ident_text(child)?)?),
            RawKind::IndexOp | RawKind::DotOp if atom_node.is_some() => postfix_nodes.push(child),
            _ if atom_node.is_none() => atom_node = Some(child),
            _ => postfix_nodes.push(child),
        }
    }

    let atom_node = atom_node.ok_or_else(|| Error::Codegen("term with no atom".into()))?;
    let mut expr = lower_term_like_atom(atom_node, line_map, source)?;

    for postfix in postfix_nodes {
        expr = match postfix.kind {
            RawKind::IndexOp => Expression::Index(IndexExpr {
                target: Box::new(expr),
                index: Box::new(lower_expr(&postfix.children[0], line_map, source)?),
            }),
            RawKind::DotOp => Expression::Dot(DotExpr {
                target: Box::new(expr),
                field: ident_text(&postfix.children[0])?.to_string(),
            }),
            ref other => return Err(Error::Codegen(format!("unexpected postfix node {other:?}"))),
        };
    }

    for op in unary_ops.into_iter().rev() {
        expr = Expression::Unary(UnaryExpr {
            op,
            expr: Box::new(expr),
        });
    }

    Ok(expr)
}

fn lower_term_like_atom(raw: &RawNode, line_map: &LineMap, source: &str) -> Result<Expression, Error> {
    Ok(match raw.kind {
        RawKind::Ident => Expression::Ident(ident_text(raw)?.to_string()),
        RawKind::Int => Expression::Int(
            ident_text(raw)?
                .parse()
                .map_err(|_| Error::Codegen(format!("invalid integer literal {:?}", raw.text)))?,
        ),
        RawKind::Float => Expression::Float(
            ident_text(raw)?
                .parse()
                .map_err(|_| Error::Codegen(format!("invalid float literal {:?}", raw.text)))?,
        ),
        RawKind::Str => Expression::Str(unescape(ident_text(raw)?)),
        RawKind::Bool => Expression::Bool(ident_text(raw)? == "true"),
        RawKind::Nil => Expression::Nil,
        RawKind::ParenExpr => lower_expr(&raw.children[0], line_map, source)?,
        RawKind::ArrayLit => Expression::Array(
            raw.children
                .iter()
                .map(|c| lower_expr(c, line_map, source))
                .collect::<Result<_, _>>()?,
        ),
        RawKind::HashLit => Expression::Hash(
            raw.children
                .iter()
                .map(|pair| {
                    Ok((
                        lower_expr(&pair.children[0], line_map, source)?,
                        lower_expr(&pair.children[1], line_map, source)?,
                    ))
                })
                .collect::<Result<_, Error>>()?,
        ),
        RawKind::TryExpr => Expression::Try(TryExpr {
            expr: Box::new(lower_expr(&raw.children[0], line_map, source)?),
            handler: Box::new(lower_expr(&raw.children[1], line_map, source)?),
        }),
        RawKind::SpawnExpr => Expression::Spawn(SpawnExpr {
            body: lower_block(&raw.children[0], line_map, source)?,
        }),
        RawKind::ParallelExpr => Expression::Parallel(ParallelExpr {
            body: lower_block(&raw.children[0], line_map, source)?,
        }),
        RawKind::CallExpr => {
            let func = ident_text(&raw.children[0])?.to_string();
            let args = raw
                .children
                .get(1)
                .map(|block| {
                    block
                        .children
                        .iter()
                        .map(|c| lower_expr(c, line_map, source))
                        .collect::<Result<_, _>>()
                })
                .transpose()?
                .unwrap_or_default();
            Expression::Call(CallExpr { func, args })
        }
        ref other => return Err(Error::Codegen(format!("unexpected atom node {other:?}"))),
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_un_op(text: &str) -> Result<UnOp, Error> {
    match text {
        "-" => Ok(UnOp::Neg),
        "!" => Ok(UnOp::Not),
        other => Err(Error::Codegen(format!("unknown unary operator {other:?}"))),
    }
}

fn parse_bin_op(text: &str) -> Result<BinOp, Error> {
    Ok(match text {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Mod,
        "==" => BinOp::Eq,
        "!=" => BinOp::Ne,
        "<" => BinOp::Lt,
        "<=" => BinOp::Le,
        ">" => BinOp::Gt,
        ">=" => BinOp::Ge,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        ".." => BinOp::Range,
        other => return Err(Error::Codegen(format!("unknown binary operator {other:?}"))),
    })
}

fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
        BinOp::Range => 4,
        BinOp::Add | BinOp::Sub => 5,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
    }
}

/// Precedence climbing over the flat `term (op term)*` sequence pest hands
/// back (pest grammars don't nest by precedence on their own).
fn climb(terms: &[Expression], ops: &[BinOp], pos: &mut usize, min_prec: u8) -> Expression {
    let mut lhs = terms[*pos].clone();
    *pos += 1;
    while *pos > 0 && *pos - 1 < ops.len() {
        let op = ops[*pos - 1];
        let prec = precedence(op);
        if prec < min_prec {
            break;
        }
        let rhs = climb(terms, ops, pos, prec + 1);
        lhs = Expression::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        });
    }
    lhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse as parse_raw;
    use crate::preprocess::{preprocess, scan_function_names, strip_comments};

    fn lower_source(src: &str) -> Program {
        let cleaned = strip_comments(src).unwrap();
        let known = scan_function_names(&cleaned);
        let (preprocessed, line_map) = preprocess(&cleaned, &known);
        let raw = parse_raw(&preprocessed).unwrap();
        lower_program(&raw, &line_map, &preprocessed).unwrap()
    }

    #[test]
    fn lowers_simple_assignment_with_correct_line() {
        let program = lower_source("\n\nx = 1\n");
        assert_eq!(program.len(), 1);
        match &program[0] {
            Statement::Assign(s) => {
                assert_eq!(s.target, "x");
                assert_eq!(s.value, Expression::Int(1));
                assert_eq!(s.line, 3);
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn respects_operator_precedence() {
        let program = lower_source("x = 1 + 2 * 3\n");
        let Statement::Assign(s) = &program[0] else {
            panic!("expected assign")
        };
        assert_eq!(
            s.value,
            Expression::Binary(BinaryExpr {
                op: BinOp::Add,
                lhs: Box::new(Expression::Int(1)),
                rhs: Box::new(Expression::Binary(BinaryExpr {
                    op: BinOp::Mul,
                    lhs: Box::new(Expression::Int(2)),
                    rhs: Box::new(Expression::Int(3)),
                })),
            })
        );
    }

    #[test]
    fn lowers_dotted_call() {
        let program = lower_source("u.greet()\n");
        let Statement::Expr(s) = &program[0] else {
            panic!("expected expr stmt")
        };
        assert_eq!(
            s.expr,
            Expression::Call(CallExpr {
                func: "u.greet".into(),
                args: vec![],
            })
        );
    }

    #[test]
    fn lowers_require_with_alias() {
        let program = lower_source("require \"./util\" as u\n");
        match &program[0] {
            Statement::Require(r) => {
                assert_eq!(r.path, "./util");
                assert_eq!(r.alias.as_deref(), Some("u"));
            }
            other => panic!("expected require, got {other:?}"),
        }
    }
}

//! The Parser: drives the pest grammar in `rg.pest` over the preprocessed
//! buffer and builds a [`RawNode`] tree — a thin, mostly
//! stringly-typed shape that stays close to the concrete syntax. The AST
//! Lowerer (`crate::lower`) is the only place that interprets `RawNode`
//! shapes into the typed `Statement`/`Expression` sums, so an unrecognized
//! shape there is a single, well-localized internal error rather than a
//! panic scattered through many call sites.
use crate::error::{Error, Span};
use pest::iterators::{Pair, Pairs};
use pest::Parser as _;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "rg.pest"]
struct RgParser;

pub use pest::error::Error as PestError;
pub type PestRule = Rule;

#[derive(Debug, Clone, PartialEq)]
pub enum RawKind {
    Program,
    Block,
    ImportStmt,
    RequireStmt,
    FuncDef,
    ParamList,
    TestDef,
    BenchDef,
    ReturnStmt,
    IfStmt,
    ElsifClause,
    ElseClause,
    WhileStmt,
    ForStmt,
    AssignStmt,
    IndexAssignStmt,
    DotAssignStmt,
    ExprStmt,
    Ident,
    DottedIdent,
    Int,
    Float,
    Str,
    Bool,
    Nil,
    CallExpr,
    ArrayLit,
    HashLit,
    HashPair,
    TryExpr,
    SpawnExpr,
    ParallelExpr,
    ParenExpr,
    UnaryOp,
    BinOp,
    IndexOp,
    DotOp,
    Term,
    Expr,
}

/// A raw parse-tree node. `text` carries the literal token text for leaves
/// (identifiers, literals, operators); `children` carries nested nodes for
/// everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub kind: RawKind,
    pub text: Option<String>,
    pub children: Vec<RawNode>,
    pub span: Span,
}

impl RawNode {
    fn leaf(kind: RawKind, text: String, span: Span) -> Self {
        RawNode {
            kind,
            text: Some(text),
            children: Vec::new(),
            span,
        }
    }

    fn inner(kind: RawKind, children: Vec<RawNode>, span: Span) -> Self {
        RawNode {
            kind,
            text: None,
            children,
            span,
        }
    }
}

/// Parse a preprocessed `.rg` buffer into a [`RawNode`] of kind [`RawKind::Program`].
pub fn parse(source: &str) -> Result<RawNode, Error> {
    let mut pairs =
        RgParser::parse(Rule::program, source).map_err(|e| Error::Syntax(e.to_string()))?;
    let program_pair = pairs.next().expect("program rule always produces a pair");
    Ok(build(program_pair))
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let s = pair.as_span();
    Span {
        start: s.start(),
        end: s.end(),
    }
}

fn build(pair: Pair<Rule>) -> RawNode {
    let span = span_of(&pair);
    match pair.as_rule() {
        Rule::program => RawNode::inner(RawKind::Program, build_children(pair.into_inner()), span),
        Rule::stmt_list | Rule::block => {
            RawNode::inner(RawKind::Block, build_children(pair.into_inner()), span)
        }
        Rule::stmt | Rule::expr_stmt => {
            // `stmt` just picks one alternative; `expr_stmt` wraps a bare `expr`.
            let inner = pair.into_inner().next();
            match inner {
                Some(p) if p.as_rule() == Rule::expr => {
                    RawNode::inner(RawKind::ExprStmt, vec![build(p)], span)
                }
                Some(p) => build(p),
                None => RawNode::inner(RawKind::ExprStmt, vec![], span),
            }
        }
        Rule::import_stmt => {
            let ident = pair.into_inner().next().expect("import name");
            RawNode::inner(RawKind::ImportStmt, vec![build(ident)], span)
        }
        Rule::require_stmt => {
            RawNode::inner(RawKind::RequireStmt, build_children(pair.into_inner()), span)
        }
        Rule::func_def => RawNode::inner(RawKind::FuncDef, build_children(pair.into_inner()), span),
        Rule::param_list => RawNode::inner(RawKind::ParamList, build_children(pair.into_inner()), span),
        Rule::test_def => RawNode::inner(RawKind::TestDef, build_children(pair.into_inner()), span),
        Rule::bench_def => RawNode::inner(RawKind::BenchDef, build_children(pair.into_inner()), span),
        Rule::return_stmt => {
            RawNode::inner(RawKind::ReturnStmt, build_children(pair.into_inner()), span)
        }
        Rule::if_stmt => RawNode::inner(RawKind::IfStmt, build_children(pair.into_inner()), span),
        Rule::elsif_clause => {
            RawNode::inner(RawKind::ElsifClause, build_children(pair.into_inner()), span)
        }
        Rule::else_clause => {
            RawNode::inner(RawKind::ElseClause, build_children(pair.into_inner()), span)
        }
        Rule::while_stmt => RawNode::inner(RawKind::WhileStmt, build_children(pair.into_inner()), span),
        Rule::for_stmt => RawNode::inner(RawKind::ForStmt, build_children(pair.into_inner()), span),
        Rule::assign_stmt => {
            RawNode::inner(RawKind::AssignStmt, build_children(pair.into_inner()), span)
        }
        Rule::index_assign_stmt => RawNode::inner(
            RawKind::IndexAssignStmt,
            build_children(pair.into_inner()),
            span,
        ),
        Rule::dot_assign_stmt => {
            RawNode::inner(RawKind::DotAssignStmt, build_children(pair.into_inner()), span)
        }
        Rule::ident => RawNode::leaf(RawKind::Ident, pair.as_str().to_string(), span),
        Rule::dotted_ident => RawNode::leaf(RawKind::DottedIdent, pair.as_str().to_string(), span),
        Rule::int => RawNode::leaf(RawKind::Int, pair.as_str().to_string(), span),
        Rule::float => RawNode::leaf(RawKind::Float, pair.as_str().to_string(), span),
        Rule::string => {
            let inner = pair.into_inner().next().expect("string_inner");
            RawNode::leaf(RawKind::Str, inner.as_str().to_string(), span)
        }
        Rule::bool_lit => RawNode::leaf(RawKind::Bool, pair.as_str().to_string(), span),
        Rule::nil_lit => RawNode::leaf(RawKind::Nil, pair.as_str().to_string(), span),
        Rule::call_expr => RawNode::inner(RawKind::CallExpr, build_children(pair.into_inner()), span),
        Rule::array_lit => RawNode::inner(RawKind::ArrayLit, build_children(pair.into_inner()), span),
        Rule::hash_lit => RawNode::inner(RawKind::HashLit, build_children(pair.into_inner()), span),
        Rule::hash_pair => RawNode::inner(RawKind::HashPair, build_children(pair.into_inner()), span),
        Rule::try_expr => RawNode::inner(RawKind::TryExpr, build_children(pair.into_inner()), span),
        Rule::spawn_expr => {
            RawNode::inner(RawKind::SpawnExpr, build_children(pair.into_inner()), span)
        }
        Rule::parallel_expr => {
            RawNode::inner(RawKind::ParallelExpr, build_children(pair.into_inner()), span)
        }
        Rule::paren_expr => {
            let inner = pair.into_inner().next().expect("paren_expr body");
            RawNode::inner(RawKind::ParenExpr, vec![build(inner)], span)
        }
        Rule::unary_op => RawNode::leaf(RawKind::UnaryOp, pair.as_str().to_string(), span),
        Rule::bin_op => RawNode::leaf(RawKind::BinOp, pair.as_str().to_string(), span),
        Rule::index_op => {
            let inner = pair.into_inner().next().expect("index expr");
            RawNode::inner(RawKind::IndexOp, vec![build(inner)], span)
        }
        Rule::plain_dot_op => {
            let ident = pair.into_inner().next().expect("dot field name");
            RawNode::inner(RawKind::DotOp, vec![build(ident)], span)
        }
        Rule::postfix_op => build(pair.into_inner().next().expect("postfix alt")),
        Rule::term => RawNode::inner(RawKind::Term, build_children(pair.into_inner()), span),
        Rule::expr => RawNode::inner(RawKind::Expr, build_children(pair.into_inner()), span),
        Rule::atom => build(pair.into_inner().next().expect("atom alt")),
        Rule::call_args => RawNode::inner(RawKind::Block, build_children(pair.into_inner()), span),
        Rule::string_inner | Rule::WHITESPACE | Rule::NEWLINE | Rule::EOI => {
            RawNode::leaf(RawKind::Ident, pair.as_str().to_string(), span)
        }
    }
}

fn build_children(pairs: Pairs<Rule>) -> Vec<RawNode> {
    pairs
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignment() {
        let raw = parse("x = 1\n").unwrap();
        assert_eq!(raw.kind, RawKind::Program);
        let block = &raw.children[0];
        assert_eq!(block.kind, RawKind::Block);
        assert_eq!(block.children[0].kind, RawKind::AssignStmt);
    }

    #[test]
    fn parses_func_def() {
        let raw = parse("def greet(name)\nputs(name)\nend\n").unwrap();
        let block = &raw.children[0];
        assert_eq!(block.children[0].kind, RawKind::FuncDef);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("def (\n").is_err());
    }
}

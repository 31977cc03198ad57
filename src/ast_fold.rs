//! Tree-walk primitives over [`Statement`](crate::ast::Statement) and
//! [`Expression`](crate::ast::Expression). Mirrors the fold/visitor pattern the
//! rest of the crate's ancestry uses for its own AST: a trait with a default
//! implementation for every node kind, so a caller only overrides the handful
//! of cases it cares about.
//!
//! Unlike a transforming fold, [`Visitor`] only needs to *observe* nodes (the
//! placement check is the only caller today), so it returns a "stop early"
//! flag rather than a rebuilt tree. A straightforward recursive implementation
//! suffices; nothing here needs reflection.
use crate::ast::*;

/// Return `true` from any `visit_*` method to stop the walk early.
pub trait Visitor {
    fn visit_statement(&mut self, stmt: &Statement) -> bool {
        walk_statement(self, stmt)
    }

    fn visit_expression(&mut self, expr: &Expression) -> bool {
        walk_expression(self, expr)
    }
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) -> bool {
    for stmt in program {
        if visitor.visit_statement(stmt) {
            return true;
        }
    }
    false
}

pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Statement) -> bool {
    match stmt {
        Statement::Import(_) | Statement::Require(_) => false,
        Statement::FuncDef(s) => walk_program(visitor, &s.body),
        Statement::TestDef(s) => walk_program(visitor, &s.body),
        Statement::BenchDef(s) => walk_program(visitor, &s.body),
        Statement::Expr(s) => visitor.visit_expression(&s.expr),
        Statement::Assign(s) => visitor.visit_expression(&s.value),
        Statement::IndexAssign(s) => {
            visitor.visit_expression(&s.target)
                || visitor.visit_expression(&s.index)
                || visitor.visit_expression(&s.value)
        }
        Statement::DotAssign(s) => {
            visitor.visit_expression(&s.target) || visitor.visit_expression(&s.value)
        }
        Statement::If(s) => {
            if visitor.visit_expression(&s.condition) || walk_program(visitor, &s.body) {
                return true;
            }
            for clause in &s.elsif_clauses {
                if visitor.visit_expression(&clause.condition) || walk_program(visitor, &clause.body)
                {
                    return true;
                }
            }
            if let Some(else_body) = &s.else_body {
                return walk_program(visitor, else_body);
            }
            false
        }
        Statement::While(s) => {
            visitor.visit_expression(&s.condition) || walk_program(visitor, &s.body)
        }
        Statement::For(s) => {
            visitor.visit_expression(&s.collection) || walk_program(visitor, &s.body)
        }
        Statement::Return(s) => s
            .value
            .as_ref()
            .is_some_and(|v| visitor.visit_expression(v)),
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expression) -> bool {
    match expr {
        Expression::Ident(_)
        | Expression::Int(_)
        | Expression::Float(_)
        | Expression::Str(_)
        | Expression::Bool(_)
        | Expression::Nil => false,
        Expression::Call(c) => c.args.iter().any(|a| visitor.visit_expression(a)),
        Expression::Binary(b) => {
            visitor.visit_expression(&b.lhs) || visitor.visit_expression(&b.rhs)
        }
        Expression::Unary(u) => visitor.visit_expression(&u.expr),
        Expression::Index(i) => {
            visitor.visit_expression(&i.target) || visitor.visit_expression(&i.index)
        }
        Expression::Dot(d) => visitor.visit_expression(&d.target),
        Expression::Array(items) => items.iter().any(|i| visitor.visit_expression(i)),
        Expression::Hash(pairs) => pairs
            .iter()
            .any(|(k, v)| visitor.visit_expression(k) || visitor.visit_expression(v)),
        Expression::Try(t) => {
            visitor.visit_expression(&t.expr) || visitor.visit_expression(&t.handler)
        }
        Expression::Spawn(s) => walk_program(visitor, &s.body),
        Expression::Parallel(p) => walk_program(visitor, &p.body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FindImports {
        found: bool,
    }

    impl Visitor for FindImports {
        fn visit_statement(&mut self, stmt: &Statement) -> bool {
            if matches!(stmt, Statement::Import(_) | Statement::Require(_)) {
                self.found = true;
                return true;
            }
            walk_statement(self, stmt)
        }
    }

    #[test]
    fn finds_nested_import() {
        let body = vec![Statement::Import(ImportStmt {
            module: "os".into(),
            line: 2,
        })];
        let program = vec![Statement::FuncDef(FuncDef {
            name: "foo".into(),
            namespace: String::new(),
            params: vec![],
            body,
            line: 1,
            source_path: String::new(),
        })];

        let mut finder = FindImports { found: false };
        walk_program(&mut finder, &program);
        assert!(finder.found);
    }

    #[test]
    fn top_level_import_is_not_flagged_by_walk_statement_itself() {
        // walk_statement never recurses into the statement it's given, only
        // its bodies, so a same-level import never triggers this visitor.
        let program = vec![Statement::Import(ImportStmt {
            module: "os".into(),
            line: 1,
        })];
        let mut finder = FindImports { found: false };
        for stmt in &program {
            walk_statement(&mut finder, stmt);
        }
        assert!(!finder.found);
    }
}

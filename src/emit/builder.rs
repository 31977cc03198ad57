//! Emit-Tree Builder: translates the resolved `Program` into an `EmitFile` —
//! one top-down pass over the resolved tree building a target-language AST
//! that a separate printer serializes.
use super::tree::*;
use crate::ast::{self, BinOp, Expression, Statement, UnOp};
use crate::resolve::ResolvedProgram;
use crate::stdlib::ModuleRegistry;
use std::collections::HashSet;
use std::path::Path;

const PACKAGE: &str = "main";

pub fn build(resolved: &ResolvedProgram, entry_path: &Path, registry: &dyn ModuleRegistry) -> EmitFile {
    let namespaces: HashSet<&str> = resolved
        .program
        .iter()
        .filter_map(|s| s.as_func_def())
        .map(|f| f.namespace.as_str())
        .filter(|ns| !ns.is_empty())
        .collect();

    let ctx = BuildCtx {
        registry,
        namespaces,
    };

    let mut imports = Vec::new();
    let (core_alias, core_path) = registry.core_import();
    imports.push(EmitImport {
        path: core_path,
        alias: Some(core_alias),
    });
    for module in &resolved.imports {
        if let Some((alias, path)) = registry.emit_import(module) {
            imports.push(EmitImport { path, alias: Some(alias) });
        }
    }

    let mut decls = Vec::new();
    for module in &resolved.imports {
        for raw in registry.emit_preamble(module) {
            decls.push(EmitDecl::Raw(raw));
        }
    }
    for stmt in &resolved.program {
        if let Statement::FuncDef(func) = stmt {
            decls.push(EmitDecl::Func(build_func_decl(func, &ctx)));
        }
    }

    let entry_path_str = entry_path.display().to_string();
    let init_stmts: Vec<&Statement> = resolved
        .program
        .iter()
        .filter(|s| !matches!(s, Statement::FuncDef(_)))
        .collect();
    let init = build_block(&init_stmts, &entry_path_str, &ctx);

    EmitFile {
        package: PACKAGE.to_string(),
        imports,
        decls,
        init,
    }
}

struct BuildCtx<'a> {
    registry: &'a dyn ModuleRegistry,
    namespaces: HashSet<&'a str>,
}

fn synth_name(func: &ast::FuncDef) -> String {
    if func.namespace.is_empty() {
        func.name.clone()
    } else {
        format!("{}_{}", func.namespace, func.name)
    }
}

fn build_func_decl(func: &ast::FuncDef, ctx: &BuildCtx) -> EmitFuncDecl {
    let body_refs: Vec<&Statement> = func.body.iter().collect();
    EmitFuncDecl {
        name: synth_name(func),
        params: func.params.clone(),
        body: build_block(&body_refs, &func.source_path, ctx),
    }
}

/// Emits a preceding `//line` directive for every statement, then the
/// statement itself. `path` is the file the statements in `stmts` originated
/// from, which follows the enclosing function, not the statement's position
/// in the emitted tree.
fn build_block(stmts: &[&Statement], path: &str, ctx: &BuildCtx) -> Vec<EmitStatement> {
    let mut out = Vec::with_capacity(stmts.len() * 2);
    for stmt in stmts {
        out.push(EmitStatement::LineDirective {
            path: path.to_string(),
            line: stmt.line(),
        });
        out.push(build_stmt(stmt, path, ctx));
    }
    out
}

fn build_program_block(program: &ast::Program, path: &str, ctx: &BuildCtx) -> Vec<EmitStatement> {
    let refs: Vec<&Statement> = program.iter().collect();
    build_block(&refs, path, ctx)
}

fn build_stmt(stmt: &Statement, path: &str, ctx: &BuildCtx) -> EmitStatement {
    match stmt {
        Statement::Import(_) | Statement::Require(_) => {
            unreachable!("import/require never survive resolution")
        }
        Statement::FuncDef(_) => unreachable!("func defs are lifted to decls, not init/body"),
        Statement::TestDef(_) | Statement::BenchDef(_) => EmitStatement::Comment(
            "test/bench definitions are not part of the emitted program".into(),
        ),
        Statement::Expr(s) => EmitStatement::Expr(build_expr(&s.expr, path, ctx)),
        Statement::Assign(s) => EmitStatement::Assign {
            targets: vec![s.target.clone()],
            value: build_expr(&s.value, path, ctx),
        },
        Statement::IndexAssign(s) => EmitStatement::Expr(EmitExpr::Call {
            func: "rgrt.SetIndex".to_string(),
            args: vec![
                build_expr(&s.target, path, ctx),
                build_expr(&s.index, path, ctx),
                build_expr(&s.value, path, ctx),
            ],
        }),
        Statement::DotAssign(s) => EmitStatement::Expr(EmitExpr::Call {
            func: "rgrt.SetField".to_string(),
            args: vec![
                build_expr(&s.target, path, ctx),
                EmitExpr::Str(s.field.clone()),
                build_expr(&s.value, path, ctx),
            ],
        }),
        Statement::If(s) => EmitStatement::If {
            cond: build_expr(&s.condition, path, ctx),
            then: build_program_block(&s.body, path, ctx),
            elifs: s
                .elsif_clauses
                .iter()
                .map(|c| {
                    (
                        build_expr(&c.condition, path, ctx),
                        build_program_block(&c.body, path, ctx),
                    )
                })
                .collect(),
            els: s.else_body.as_ref().map(|b| build_program_block(b, path, ctx)),
        },
        Statement::While(s) => EmitStatement::While {
            cond: build_expr(&s.condition, path, ctx),
            body: build_program_block(&s.body, path, ctx),
        },
        Statement::For(s) => EmitStatement::RangeFor {
            var: s.var.clone(),
            collection: build_expr(&s.collection, path, ctx),
            body: build_program_block(&s.body, path, ctx),
        },
        Statement::Return(s) => {
            EmitStatement::Return(s.value.as_ref().map(|v| build_expr(v, path, ctx)))
        }
    }
}

fn build_expr(expr: &Expression, path: &str, ctx: &BuildCtx) -> EmitExpr {
    match expr {
        Expression::Ident(name) => EmitExpr::Ident(name.clone()),
        Expression::Int(n) => EmitExpr::Int(*n),
        Expression::Float(f) => EmitExpr::Float(*f),
        Expression::Str(s) => EmitExpr::Str(s.clone()),
        Expression::Bool(b) => EmitExpr::Bool(*b),
        Expression::Nil => EmitExpr::Nil,
        Expression::Call(c) => build_call(&c.func, &c.args, path, ctx),
        Expression::Binary(b) => EmitExpr::Binary {
            op: bin_op_str(b.op),
            lhs: Box::new(build_expr(&b.lhs, path, ctx)),
            rhs: Box::new(build_expr(&b.rhs, path, ctx)),
        },
        Expression::Unary(u) => EmitExpr::Unary {
            op: un_op_str(u.op),
            expr: Box::new(build_expr(&u.expr, path, ctx)),
        },
        Expression::Index(i) => EmitExpr::Index {
            target: Box::new(build_expr(&i.target, path, ctx)),
            index: Box::new(build_expr(&i.index, path, ctx)),
        },
        Expression::Dot(d) => EmitExpr::Dot {
            target: Box::new(build_expr(&d.target, path, ctx)),
            field: d.field.clone(),
        },
        Expression::Array(items) => {
            EmitExpr::SliceLit(items.iter().map(|i| build_expr(i, path, ctx)).collect())
        }
        Expression::Hash(pairs) => EmitExpr::MapLit(
            pairs
                .iter()
                .map(|(k, v)| (build_expr(k, path, ctx), build_expr(v, path, ctx)))
                .collect(),
        ),
        Expression::Try(t) => build_try(t, path, ctx),
        Expression::Spawn(s) => EmitExpr::Call {
            func: "rgrt.Spawn".to_string(),
            args: vec![EmitExpr::Closure {
                body: build_program_block(&s.body, path, ctx),
            }],
        },
        // One task per top-level statement, so `rgrt.Parallel` launches N
        // independent closures rather than one closure running N statements
        // in sequence.
        Expression::Parallel(p) => EmitExpr::Call {
            func: "rgrt.Parallel".to_string(),
            args: p
                .body
                .iter()
                .map(|stmt| EmitExpr::Closure {
                    body: build_block(&[stmt], path, ctx),
                })
                .collect(),
        },
    }
}

fn build_try(t: &ast::TryExpr, path: &str, ctx: &BuildCtx) -> EmitExpr {
    // The IIFE recovers from a panic raised by the body, falling back to the
    // handler expression: `func() rgrt.Value { defer func() { ... }(); return <body> }()`.
    EmitExpr::Iife {
        body: vec![
            EmitStatement::Raw("defer func() {".to_string()),
            EmitStatement::Raw("\tif recover() != nil {".to_string()),
            EmitStatement::Return(Some(build_expr(&t.handler, path, ctx))),
            EmitStatement::Raw("\t}".to_string()),
            EmitStatement::Raw("}()".to_string()),
            EmitStatement::Return(Some(build_expr(&t.expr, path, ctx))),
        ],
    }
}

fn build_call(func: &str, args: &[Expression], path: &str, ctx: &BuildCtx) -> EmitExpr {
    let emit_args = |ctx: &BuildCtx| {
        args.iter()
            .map(|a| build_expr(a, path, ctx))
            .collect::<Vec<_>>()
    };

    match func.split_once('.') {
        None => {
            if let Some(target) = ctx.registry.emit_core_call(func) {
                EmitExpr::Call {
                    func: target.to_string(),
                    args: emit_args(ctx),
                }
            } else {
                EmitExpr::Call {
                    func: func.to_string(),
                    args: emit_args(ctx),
                }
            }
        }
        Some((prefix, rest)) => {
            if let Some(target) = ctx.registry.emit_module_call(prefix, rest) {
                EmitExpr::Call {
                    func: target,
                    args: emit_args(ctx),
                }
            } else if ctx.namespaces.contains(prefix) {
                EmitExpr::Call {
                    func: format!("{prefix}_{rest}"),
                    args: emit_args(ctx),
                }
            } else {
                EmitExpr::MethodCall {
                    target: Box::new(EmitExpr::Ident(prefix.to_string())),
                    method: rest.to_string(),
                    args: emit_args(ctx),
                }
            }
        }
    }
}

fn bin_op_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::Range => "..",
    }
}

fn un_op_str(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::Not => "!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::BuiltinRegistry;
    use std::path::PathBuf;

    fn resolved(program: ast::Program) -> ResolvedProgram {
        ResolvedProgram {
            program,
            imports: vec![],
        }
    }

    #[test]
    fn core_function_call_dispatches_through_registry() {
        let program = vec![Statement::Expr(ast::ExprStmt {
            expr: Expression::Call(ast::CallExpr {
                func: "puts".into(),
                args: vec![Expression::Str("hi".into())],
            }),
            line: 1,
        })];
        let registry = BuiltinRegistry::new();
        let file = build(&resolved(program), &PathBuf::from("main.rg"), &registry);
        assert!(matches!(
            file.init.get(1),
            Some(EmitStatement::Expr(EmitExpr::Call { func, .. })) if func == "rgrt.Puts"
        ));
    }

    #[test]
    fn namespaced_call_synthesizes_underscore_name() {
        let program = vec![
            Statement::FuncDef(ast::FuncDef {
                name: "greet".into(),
                namespace: "u".into(),
                params: vec![],
                body: vec![],
                line: 1,
                source_path: "util.rg".into(),
            }),
            Statement::Expr(ast::ExprStmt {
                expr: Expression::Call(ast::CallExpr {
                    func: "u.greet".into(),
                    args: vec![],
                }),
                line: 2,
            }),
        ];
        let registry = BuiltinRegistry::new();
        let file = build(&resolved(program), &PathBuf::from("main.rg"), &registry);
        assert_eq!(file.decls.len(), 1);
        assert!(matches!(&file.decls[0], EmitDecl::Func(f) if f.name == "u_greet"));
        assert!(matches!(
            file.init.get(1),
            Some(EmitStatement::Expr(EmitExpr::Call { func, .. })) if func == "u_greet"
        ));
    }

    #[test]
    fn spawn_passes_an_uninvoked_closure_to_the_runtime() {
        let program = vec![Statement::Expr(ast::ExprStmt {
            expr: Expression::Spawn(ast::SpawnExpr {
                body: vec![Statement::Expr(ast::ExprStmt {
                    expr: Expression::Call(ast::CallExpr {
                        func: "puts".into(),
                        args: vec![Expression::Str("hi".into())],
                    }),
                    line: 2,
                })],
            }),
            line: 1,
        })];
        let registry = BuiltinRegistry::new();
        let file = build(&resolved(program), &PathBuf::from("main.rg"), &registry);
        match file.init.get(1) {
            Some(EmitStatement::Expr(EmitExpr::Call { func, args })) => {
                assert_eq!(func, "rgrt.Spawn");
                assert_eq!(args.len(), 1);
                assert!(matches!(&args[0], EmitExpr::Closure { .. }));
            }
            other => panic!("expected a call to rgrt.Spawn, got {other:?}"),
        }
    }

    #[test]
    fn parallel_fans_out_one_closure_per_top_level_statement() {
        let program = vec![Statement::Expr(ast::ExprStmt {
            expr: Expression::Parallel(ast::ParallelExpr {
                body: vec![
                    Statement::Expr(ast::ExprStmt {
                        expr: Expression::Call(ast::CallExpr {
                            func: "puts".into(),
                            args: vec![Expression::Str("a".into())],
                        }),
                        line: 2,
                    }),
                    Statement::Expr(ast::ExprStmt {
                        expr: Expression::Call(ast::CallExpr {
                            func: "puts".into(),
                            args: vec![Expression::Str("b".into())],
                        }),
                        line: 3,
                    }),
                ],
            }),
            line: 1,
        })];
        let registry = BuiltinRegistry::new();
        let file = build(&resolved(program), &PathBuf::from("main.rg"), &registry);
        match file.init.get(1) {
            Some(EmitStatement::Expr(EmitExpr::Call { func, args })) => {
                assert_eq!(func, "rgrt.Parallel");
                assert_eq!(args.len(), 2);
                assert!(args.iter().all(|a| matches!(a, EmitExpr::Closure { .. })));
            }
            other => panic!("expected a call to rgrt.Parallel, got {other:?}"),
        }
    }

    #[test]
    fn unknown_dotted_call_falls_back_to_method_call() {
        let program = vec![Statement::Expr(ast::ExprStmt {
            expr: Expression::Call(ast::CallExpr {
                func: "obj.method".into(),
                args: vec![],
            }),
            line: 1,
        })];
        let registry = BuiltinRegistry::new();
        let file = build(&resolved(program), &PathBuf::from("main.rg"), &registry);
        assert!(matches!(
            file.init.get(1),
            Some(EmitStatement::Expr(EmitExpr::MethodCall { method, .. })) if method == "method"
        ));
    }
}

//! The emit-language AST. There is no off-the-shelf Go-AST crate available
//! here the way `sqlparser` serves SQL elsewhere, so this is hand-rolled — a
//! heterogeneous sum of statement/expression shapes close enough to the
//! target language that the printer in `emit::printer` can be a pure,
//! single-pass serializer with no semantic decisions left to make.

#[derive(Debug, Clone, PartialEq)]
pub struct EmitImport {
    pub path: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmitFile {
    pub package: String,
    pub imports: Vec<EmitImport>,
    pub decls: Vec<EmitDecl>,
    pub init: Vec<EmitStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmitDecl {
    Const { name: String, value: EmitExpr },
    Func(EmitFuncDecl),
    Raw(String),
    Blank,
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmitFuncDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<EmitStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmitStatement {
    Expr(EmitExpr),
    Assign { targets: Vec<String>, value: EmitExpr },
    VarDecl { name: String, value: EmitExpr },
    Return(Option<EmitExpr>),
    If {
        cond: EmitExpr,
        then: Vec<EmitStatement>,
        elifs: Vec<(EmitExpr, Vec<EmitStatement>)>,
        els: Option<Vec<EmitStatement>>,
    },
    While {
        cond: EmitExpr,
        body: Vec<EmitStatement>,
    },
    RangeFor {
        var: String,
        collection: EmitExpr,
        body: Vec<EmitStatement>,
    },
    Break,
    Continue,
    Blank,
    LineDirective { path: String, line: usize },
    Comment(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmitExpr {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    Binary { op: &'static str, lhs: Box<EmitExpr>, rhs: Box<EmitExpr> },
    Unary { op: &'static str, expr: Box<EmitExpr> },
    Call { func: String, args: Vec<EmitExpr> },
    MethodCall { target: Box<EmitExpr>, method: String, args: Vec<EmitExpr> },
    Dot { target: Box<EmitExpr>, field: String },
    Index { target: Box<EmitExpr>, index: Box<EmitExpr> },
    SliceLit(Vec<EmitExpr>),
    MapLit(Vec<(EmitExpr, EmitExpr)>),
    Paren(Box<EmitExpr>),
    /// An immediately-invoked function expression: `TryExpr` needs eager
    /// defer/recover semantics, so its body runs as part of evaluating the
    /// expression itself.
    Iife { body: Vec<EmitStatement> },
    /// An un-invoked function value: `SpawnExpr`/`ParallelExpr` need to pass
    /// a task body to a runtime call that launches it concurrently. Printing
    /// this with a trailing call would run the body synchronously while
    /// building the argument, before the runtime call ever executes.
    Closure { body: Vec<EmitStatement> },
}

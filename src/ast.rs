//! The typed program tree that later passes (the require resolver, the emit-tree
//! builder) operate on. This is what the AST Lowerer produces from a [`RawNode`](crate::parser::RawNode)
//! and a [`LineMap`](crate::preprocess::LineMap).
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// A whole `.rg` source file (or, after resolution, the flattened program).
pub type Program = Vec<Statement>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
pub enum Statement {
    Import(ImportStmt),
    Require(RequireStmt),
    FuncDef(FuncDef),
    TestDef(TestDef),
    BenchDef(BenchDef),
    Expr(ExprStmt),
    Assign(AssignStmt),
    IndexAssign(IndexAssignStmt),
    DotAssign(DotAssignStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
}

impl Statement {
    /// The original source line this statement maps back to, for diagnostics
    /// and for `//line` directive emission.
    pub fn line(&self) -> usize {
        match self {
            Statement::Import(s) => s.line,
            Statement::Require(s) => s.line,
            Statement::FuncDef(s) => s.line,
            Statement::TestDef(s) => s.line,
            Statement::BenchDef(s) => s.line,
            Statement::Expr(s) => s.line,
            Statement::Assign(s) => s.line,
            Statement::IndexAssign(s) => s.line,
            Statement::DotAssign(s) => s.line,
            Statement::If(s) => s.line,
            Statement::While(s) => s.line,
            Statement::For(s) => s.line,
            Statement::Return(s) => s.line,
        }
    }

    /// The nested statement bodies this statement carries, if any. Used by the
    /// placement walker to reject `import`/`require` anywhere but the top level.
    pub fn bodies(&self) -> Vec<&Program> {
        match self {
            Statement::FuncDef(s) => vec![&s.body],
            Statement::TestDef(s) => vec![&s.body],
            Statement::BenchDef(s) => vec![&s.body],
            Statement::While(s) => vec![&s.body],
            Statement::For(s) => vec![&s.body],
            Statement::If(s) => {
                let mut bodies = vec![&s.body];
                for clause in &s.elsif_clauses {
                    bodies.push(&clause.body);
                }
                if let Some(else_body) = &s.else_body {
                    bodies.push(else_body);
                }
                bodies
            }
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStmt {
    pub module: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequireStmt {
    pub path: String,
    pub alias: Option<String>,
    pub line: usize,
}

/// A function definition. `namespace` is empty for functions declared in the
/// entry file, and set to the requiring namespace once merged in by the
/// require resolver (see [`crate::resolve`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub params: Vec<String>,
    pub body: Program,
    pub line: usize,
    /// The file that defined this function, set by the require resolver.
    /// Needed because a namespaced function's body statements still need
    /// accurate `//line` directives pointing into the file that defined
    /// them, not the file that required it.
    #[serde(default)]
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDef {
    pub name: String,
    pub body: Program,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchDef {
    pub name: String,
    pub body: Program,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: String,
    pub value: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexAssignStmt {
    pub target: Expression,
    pub index: Expression,
    pub value: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotAssignStmt {
    pub target: Expression,
    pub field: String,
    pub value: Expression,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expression,
    pub body: Program,
    pub elsif_clauses: Vec<ElsifClause>,
    pub else_body: Option<Program>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElsifClause {
    pub condition: Expression,
    pub body: Program,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Program,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub var: String,
    pub collection: Expression,
    pub body: Program,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
pub enum Expression {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    Call(CallExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Index(IndexExpr),
    Dot(DotExpr),
    Array(Vec<Expression>),
    Hash(Vec<(Expression, Expression)>),
    Try(TryExpr),
    Spawn(SpawnExpr),
    Parallel(ParallelExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub func: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub expr: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub target: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotExpr {
    pub target: Box<Expression>,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryExpr {
    pub expr: Box<Expression>,
    pub handler: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnExpr {
    pub body: Program,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelExpr {
    pub body: Program,
}

impl DotExpr {
    /// If `target` is a bare identifier naming an imported stdlib module or a
    /// `require`d namespace, this is the dotted call form the emit builder
    /// needs to dispatch on. Otherwise it's a plain field access.
    pub fn module_name(&self) -> Option<&str> {
        match self.target.as_ref() {
            Expression::Ident(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

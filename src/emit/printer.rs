//! Emit Printer: a deterministic, single-pass formatter over `EmitFile` with
//! an indent counter and a string buffer. There being no off-the-shelf
//! formatter for this hand-rolled tree, the printer does both formatting and
//! serialization itself. Makes no semantic decisions: identical trees always
//! produce byte-identical output.
use super::tree::*;

const VALUE_TYPE: &str = "rgrt.Value";

pub fn print(file: &EmitFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("package {}\n\n", file.package));

    out.push_str("import (\n");
    for import in &file.imports {
        match &import.alias {
            Some(alias) => out.push_str(&format!("\t{alias} \"{}\"\n", import.path)),
            None => out.push_str(&format!("\t\"{}\"\n", import.path)),
        }
    }
    out.push_str(")\n\n");

    for decl in &file.decls {
        print_decl(&mut out, decl, 0);
    }
    if !file.decls.is_empty() {
        out.push('\n');
    }

    out.push_str("func main() {\n");
    let mut p = Printer::new(1);
    p.print_statements(&file.init);
    out.push_str(&p.buf);
    out.push_str("}\n");

    out
}

fn print_decl(out: &mut String, decl: &EmitDecl, indent: usize) {
    let pad = "\t".repeat(indent);
    match decl {
        EmitDecl::Const { name, value } => {
            out.push_str(&format!("{pad}const {name} = {}\n", print_expr(value)));
        }
        EmitDecl::Func(func) => {
            let params = func
                .params
                .iter()
                .map(|p| format!("{p} {VALUE_TYPE}"))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "{pad}func {}({params}) {VALUE_TYPE} {{\n",
                func.name
            ));
            let mut p = Printer::new(indent + 1);
            p.print_statements(&func.body);
            out.push_str(&p.buf);
            out.push_str(&format!("{pad}}}\n\n"));
        }
        EmitDecl::Raw(text) => out.push_str(&reindent(text, indent)),
        EmitDecl::Blank => out.push('\n'),
        EmitDecl::Comment(text) => out.push_str(&format!("{pad}// {text}\n")),
    }
}

struct Printer {
    indent: usize,
    buf: String,
}

impl Printer {
    fn new(indent: usize) -> Self {
        Printer {
            indent,
            buf: String::new(),
        }
    }

    fn pad(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn print_statements(&mut self, stmts: &[EmitStatement]) {
        for stmt in stmts {
            self.print_statement(stmt);
        }
    }

    fn print_statement(&mut self, stmt: &EmitStatement) {
        match stmt {
            EmitStatement::LineDirective { path, line } => {
                self.buf.push_str(&format!("//line {path}:{line}\n"));
            }
            EmitStatement::Blank => self.buf.push('\n'),
            EmitStatement::Comment(text) => {
                self.buf.push_str(&format!("{}// {text}\n", self.pad()));
            }
            EmitStatement::Raw(text) => self.buf.push_str(&reindent(text, self.indent)),
            EmitStatement::Expr(e) => {
                self.buf.push_str(&format!("{}{}\n", self.pad(), print_expr(e)));
            }
            EmitStatement::Assign { targets, value } => {
                self.buf.push_str(&format!(
                    "{}{} = {}\n",
                    self.pad(),
                    targets.join(", "),
                    print_expr(value)
                ));
            }
            EmitStatement::VarDecl { name, value } => {
                self.buf
                    .push_str(&format!("{}var {name} = {}\n", self.pad(), print_expr(value)));
            }
            EmitStatement::Return(value) => match value {
                Some(e) => self.buf.push_str(&format!("{}return {}\n", self.pad(), print_expr(e))),
                None => self.buf.push_str(&format!("{}return\n", self.pad())),
            },
            EmitStatement::If { cond, then, elifs, els } => {
                self.buf
                    .push_str(&format!("{}if {} {{\n", self.pad(), print_expr(cond)));
                self.print_block(then);
                for (cond, body) in elifs {
                    self.buf
                        .push_str(&format!("{}}} else if {} {{\n", self.pad(), print_expr(cond)));
                    self.print_block(body);
                }
                if let Some(body) = els {
                    self.buf.push_str(&format!("{}}} else {{\n", self.pad()));
                    self.print_block(body);
                }
                self.buf.push_str(&format!("{}}}\n", self.pad()));
            }
            EmitStatement::While { cond, body } => {
                self.buf
                    .push_str(&format!("{}for {} {{\n", self.pad(), print_expr(cond)));
                self.print_block(body);
                self.buf.push_str(&format!("{}}}\n", self.pad()));
            }
            EmitStatement::RangeFor { var, collection, body } => {
                self.buf.push_str(&format!(
                    "{}for _, {var} := range {} {{\n",
                    self.pad(),
                    print_expr(collection)
                ));
                self.print_block(body);
                self.buf.push_str(&format!("{}}}\n", self.pad()));
            }
            EmitStatement::Break => self.buf.push_str(&format!("{}break\n", self.pad())),
            EmitStatement::Continue => self.buf.push_str(&format!("{}continue\n", self.pad())),
        }
    }

    fn print_block(&mut self, stmts: &[EmitStatement]) {
        self.indent += 1;
        self.print_statements(stmts);
        self.indent -= 1;
    }
}

fn print_expr(expr: &EmitExpr) -> String {
    match expr {
        EmitExpr::Ident(name) => name.clone(),
        EmitExpr::Int(n) => n.to_string(),
        EmitExpr::Float(f) => {
            let s = f.to_string();
            if s.contains('.') {
                s
            } else {
                format!("{s}.0")
            }
        }
        EmitExpr::Str(s) => format!("\"{}\"", escape_go_string(s)),
        EmitExpr::Bool(b) => b.to_string(),
        EmitExpr::Nil => "nil".to_string(),
        EmitExpr::Binary { op, lhs, rhs } => {
            format!("{} {op} {}", print_expr(lhs), print_expr(rhs))
        }
        EmitExpr::Unary { op, expr } => format!("{op}{}", print_expr(expr)),
        EmitExpr::Call { func, args } => format!("{func}({})", join_exprs(args)),
        EmitExpr::MethodCall { target, method, args } => {
            format!("{}.{method}({})", print_expr(target), join_exprs(args))
        }
        EmitExpr::Dot { target, field } => format!("{}.{field}", print_expr(target)),
        EmitExpr::Index { target, index } => {
            format!("{}[{}]", print_expr(target), print_expr(index))
        }
        EmitExpr::SliceLit(items) => format!("[]{VALUE_TYPE}{{{}}}", join_exprs(items)),
        EmitExpr::MapLit(pairs) => {
            let body = pairs
                .iter()
                .map(|(k, v)| format!("{}: {}", print_expr(k), print_expr(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("map[{VALUE_TYPE}]{VALUE_TYPE}{{{body}}}")
        }
        EmitExpr::Paren(inner) => format!("({})", print_expr(inner)),
        EmitExpr::Iife { body } => print_func_literal(body, true),
        EmitExpr::Closure { body } => print_func_literal(body, false),
    }
}

/// A temporary printer runs the body at `indent + 1`; the closing brace
/// reuses the *outer* printer's indentation. Since the outer indent isn't
/// known inside `print_expr`, the function literal is printed with a body at
/// indent 1 relative to its own start and the caller's `print_statement`
/// prefixes the line with its own pad — the closing brace is therefore
/// written unindented here and picks up the surrounding line's indent from
/// whatever statement embeds this expression. `invoke` appends the trailing
/// `()` that makes it self-invoking (`Iife`) rather than a bare function
/// value passed elsewhere (`Closure`).
fn print_func_literal(body: &[EmitStatement], invoke: bool) -> String {
    let mut p = Printer::new(1);
    p.print_statements(body);
    let call = if invoke { "()" } else { "" };
    format!("func() {VALUE_TYPE} {{\n{}}}{call}", p.buf)
}

fn join_exprs(exprs: &[EmitExpr]) -> String {
    exprs.iter().map(print_expr).collect::<Vec<_>>().join(", ")
}

fn escape_go_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Strip each line's leading tabs, then re-apply the current indent — used
/// for raw blocks, which carry their own internal structure but need to land
/// at the right indent for their context.
fn reindent(text: &str, indent: usize) -> String {
    let pad = "\t".repeat(indent);
    let mut out = String::new();
    for line in text.lines() {
        out.push_str(&pad);
        out.push_str(line.trim_start_matches('\t'));
        out.push('\n');
    }
    out
}

//! AST for script blocks.
//!
//! All nodes carry the byte span of the source text they were parsed
//! from, relative to the script block text. Document-level consumers
//! rebase spans with the block's start offset.

use crate::syntax::Span;
use compact_str::CompactString;

/// A parsed script block: the sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub stmts: Vec<Stmt>,
}

/// A name with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: CompactString,
    pub span: Span,
}

/// A type annotation: a named type with optional angle-bracket arguments,
/// e.g. `Num`, `List<Str>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub name: CompactString,
    pub args: Vec<TypeAnnotation>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let|const|var name[: Type] = expr;`
    Binding {
        kind: BindingKind,
        name: Ident,
        ty: Option<TypeAnnotation>,
        init: Expr,
    },
    /// `fn name(params) [-> Type] { body }`
    Function(Function),
    /// `import { a, b } from "source";` or `import name from "source";`
    Import {
        names: Vec<Ident>,
        source: CompactString,
    },
    /// `export <binding | fn>`, marks the inner declaration as the
    /// block's public surface.
    Export(Box<Stmt>),
    /// `return [expr];`
    Return(Option<Expr>),
    /// `if cond { .. } [else { .. }]`
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    /// A bare expression statement.
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<TypeAnnotation>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: Option<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(CompactString),
    Bool(bool),
    Null,
    Ident(CompactString),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `{ key: value, .. }`
    Object(Vec<ObjectField>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `callee(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: Ident,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `(params) => expr` or `(params) => { stmts }`
    Arrow {
        params: Vec<Param>,
        body: Box<ArrowBody>,
    },
    /// An embedded markup element, e.g. `<div class="x">{count}</div>`.
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Expr),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub key: Ident,
    pub value: Expr,
}

/// Markup element embedded in script expression position.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: Ident,
    pub attrs: Vec<Attr>,
    pub children: Vec<ElementChild>,
    pub self_closing: bool,
    pub span: Span,
}

/// Element attribute. Names may be namespaced (`client:load`,
/// `set:html`); values are absent for bare attributes, a string
/// literal, or a braced expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: CompactString,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementChild {
    Element(Element),
    /// Literal text, written as a string literal child.
    Text(CompactString),
    /// `{ expr }` interpolation.
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{s}")
    }
}

impl Module {
    /// Names declared with `export`, in source order. These form the
    /// block's interface visible to the template.
    pub fn exported_names(&self) -> Vec<&str> {
        self.stmts
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::Export(inner) => match &inner.kind {
                    StmtKind::Binding { name, .. } => Some(name.name.as_str()),
                    StmtKind::Function(func) => Some(func.name.name.as_str()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

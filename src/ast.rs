use std::{fmt, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    And,
    Or,
}

impl BinaryOp {
    /// Maps a punctuation lexeme to its operator. `=` is not an operator:
    /// assignment only exists as the leading form of an expression.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEqual,
            ">=" => BinaryOp::GreaterEqual,
            "==" => BinaryOp::Equal,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn priority(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 3,
            BinaryOp::Add | BinaryOp::Sub => 2,
            BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual
            | BinaryOp::Equal => 1,
            BinaryOp::And | BinaryOp::Or => 0,
        }
    }
}

/// A single operand of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Identifier { name: String, line: usize },
    Number(i64),
    String(String),
    Call(Call),
    Group(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    pub args: Vec<Expression>,
    pub line: usize,
}

/// An operand/operator sequence kept in source order. Precedence is
/// resolved when the expression is evaluated, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub target: Option<String>,
    pub first: Operand,
    pub rest: Vec<(BinaryOp, Operand)>,
    pub line: usize,
}

impl Expression {
    /// Number of operands plus operators; always odd.
    pub fn term_count(&self) -> usize {
        1 + 2 * self.rest.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expression),
    If {
        condition: Expression,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        condition: Expression,
        body: Vec<Stmt>,
    },
    Return(Expression),
    Function(Rc<FunctionDef>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub items: Vec<Stmt>,
}

struct Block<'a>(&'a [Stmt]);

impl fmt::Display for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, stmt) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{stmt}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Block(&self.items))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Expression(expr) => write!(f, "{expr}"),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "(<if>{condition}=>{}", Block(then_branch))?;
                if let Some(branch) = else_branch {
                    write!(f, "!{}", Block(branch))?;
                }
                write!(f, ")")
            }
            StmtKind::While { condition, body } => {
                write!(f, "(<while>{condition}=>{})", Block(body))
            }
            StmtKind::Return(expr) => write!(f, "(<return>{expr})"),
            StmtKind::Function(def) => write!(f, "{def}"),
        }
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(<def>{}({})=>{})",
            self.name,
            self.params.join(" "),
            Block(&self.body)
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        if let Some(target) = &self.target {
            write!(f, "{target} = ")?;
        }
        write!(f, "{}", self.first)?;
        for (op, operand) in &self.rest {
            write!(f, " {} {operand}", op.symbol())?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Identifier { name, .. } => write!(f, "{name}"),
            Operand::Number(n) => write!(f, "{n}"),
            Operand::String(s) => write!(f, "{s:?}"),
            Operand::Call(call) => write!(f, "{call}"),
            Operand::Group(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.callee)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

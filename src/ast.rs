//! Arena-stored AST for the gate language.
//!
//! Nodes live in per-category arenas inside [`Program`] and reference each
//! other through typed indices ([`ExprId`], [`StmtId`]). The tree is built
//! once by the parser and is immutable during lowering; index addressing
//! keeps the lowering recursion free of ownership cycles and dangling
//! references.

use std::fmt::Write as _;

/// Index of an expression node in the program arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

/// Index of a statement node in the program arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

/// Binary operators. `Assign` is an operator in the source grammar, not a
/// statement form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    Assign,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Assign => "=",
        }
    }
}

/// The four system calls of the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Open,
    Write,
    Read,
    Ioctl,
}

impl Syscall {
    /// Fixed syscall number loaded before `syscall` is emitted.
    pub fn number(self) -> u64 {
        match self {
            Syscall::Open => 0,
            Syscall::Write => 1,
            Syscall::Read => 2,
            Syscall::Ioctl => 3,
        }
    }

    /// Number of arguments the call takes; all fit in registers 0..=2.
    pub fn arity(self) -> usize {
        match self {
            Syscall::Open => 2,
            Syscall::Write | Syscall::Read | Syscall::Ioctl => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Syscall::Open => "open",
            Syscall::Write => "write",
            Syscall::Read => "read",
            Syscall::Ioctl => "ioctl",
        }
    }
}

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// 64-bit unsigned literal.
    Number(u64),
    Ident(String),
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Call {
        callee: String,
        args: Vec<ExprId>,
    },
    Syscall {
        call: Syscall,
        args: Vec<ExprId>,
    },
}

/// Statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    Scope(Vec<StmtId>),
    Return(Option<ExprId>),
    Branch {
        condition: ExprId,
        then_stmt: StmtId,
        else_stmt: Option<StmtId>,
    },
    Expr(ExprId),
}

/// Declaration of a privileged memory cell.
#[derive(Debug, Clone)]
pub struct PrivObject {
    pub name: String,
    /// Cell address; the type enforces the 16-bit limit.
    pub address: u16,
}

/// A function definition.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: StmtId,
}

/// A whole compilation unit: arenas plus the top-level declaration lists.
#[derive(Debug, Default)]
pub struct Program {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    pub priv_objects: Vec<PrivObject>,
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn add_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    /// Indented tree dump, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("program\n");
        for obj in &self.priv_objects {
            let _ = writeln!(out, "  priv {} @ {}", obj.name, obj.address);
        }
        for func in &self.functions {
            let _ = writeln!(out, "  fn {}({})", func.name, func.params.join(", "));
            self.dump_stmt(func.body, 2, &mut out);
        }
        out
    }

    fn dump_stmt(&self, id: StmtId, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        match self.stmt(id) {
            Stmt::Scope(stmts) => {
                let _ = writeln!(out, "{pad}scope");
                for &s in stmts {
                    self.dump_stmt(s, depth + 1, out);
                }
            }
            Stmt::Return(expr) => {
                let _ = writeln!(out, "{pad}return");
                if let Some(e) = expr {
                    self.dump_expr(*e, depth + 1, out);
                }
            }
            Stmt::Branch {
                condition,
                then_stmt,
                else_stmt,
            } => {
                let _ = writeln!(out, "{pad}if");
                self.dump_expr(*condition, depth + 1, out);
                self.dump_stmt(*then_stmt, depth + 1, out);
                if let Some(e) = else_stmt {
                    let _ = writeln!(out, "{pad}else");
                    self.dump_stmt(*e, depth + 1, out);
                }
            }
            Stmt::Expr(expr) => {
                let _ = writeln!(out, "{pad}expr");
                self.dump_expr(*expr, depth + 1, out);
            }
        }
    }

    fn dump_expr(&self, id: ExprId, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        match self.expr(id) {
            Expr::Number(value) => {
                let _ = writeln!(out, "{pad}number {value}");
            }
            Expr::Ident(name) => {
                let _ = writeln!(out, "{pad}ident {name}");
            }
            Expr::Binary { op, lhs, rhs } => {
                let _ = writeln!(out, "{pad}binop {}", op.symbol());
                self.dump_expr(*lhs, depth + 1, out);
                self.dump_expr(*rhs, depth + 1, out);
            }
            Expr::Call { callee, args } => {
                let _ = writeln!(out, "{pad}call {callee}");
                for &a in args {
                    self.dump_expr(a, depth + 1, out);
                }
            }
            Expr::Syscall { call, args } => {
                let _ = writeln!(out, "{pad}syscall {}", call.name());
                for &a in args {
                    self.dump_expr(a, depth + 1, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_ids_are_stable() {
        let mut program = Program::new();
        let a = program.add_expr(Expr::Number(1));
        let b = program.add_expr(Expr::Ident("x".to_string()));
        let sum = program.add_expr(Expr::Binary {
            op: BinOp::Add,
            lhs: a,
            rhs: b,
        });
        assert!(matches!(program.expr(a), Expr::Number(1)));
        assert!(matches!(program.expr(sum), Expr::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn test_dump_shows_structure() {
        let mut program = Program::new();
        program.priv_objects.push(PrivObject {
            name: "gate".to_string(),
            address: 200,
        });
        let lit = program.add_expr(Expr::Number(7));
        let ret = program.add_stmt(Stmt::Return(Some(lit)));
        let body = program.add_stmt(Stmt::Scope(vec![ret]));
        program.functions.push(Function {
            name: "main".to_string(),
            params: vec![],
            body,
        });

        let dump = program.dump();
        assert!(dump.contains("priv gate @ 200"));
        assert!(dump.contains("fn main()"));
        assert!(dump.contains("number 7"));
    }
}

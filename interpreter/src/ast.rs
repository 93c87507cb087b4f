use sable_core::Token;
use std::rc::Rc;

// Tokens are cloned into the nodes that need them (operators for dispatch, names for
// lookups). Function bodies are behind an `Rc` so that closures share them with the tree
// instead of copying statements on every evaluation of a function literal.

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(String::from(value))
    }
}

macro_rules! impl_from_num_for_literal {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Literal {
                fn from(n: $t) -> Literal {
                    Literal::Num(n as f64)
                }
            }
        )*
    }
}

impl_from_num_for_literal!(u8 i8 u16 i16 u32 i32 u64 i64 usize isize f32 f64);

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: Token,
    },
    Literal {
        value: Literal,
    },
    Prefix {
        operator: Token,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Function {
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    Object {
        // Source order is kept, a repeated key overwrites the earlier one at runtime
        pairs: Vec<(String, Expr)>,
    },
    Array {
        elements: Vec<Expr>,
    },
    Property {
        object: Box<Expr>,
        name: Token,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
}

pub trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Self::Item {
        match expr {
            Expr::Identifier { name } => self.visit_identifier(name),
            Expr::Literal { value } => self.visit_literal(value),
            Expr::Prefix { operator, right } => self.visit_prefix(operator, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => self.visit_infix(left, operator, right),
            Expr::Assign { name, value } => self.visit_assign(name, value),
            Expr::Function { params, body } => self.visit_function(params, body),
            Expr::Call {
                callee,
                paren,
                args,
            } => self.visit_call(callee, paren, args),
            Expr::Object { pairs } => self.visit_object(pairs),
            Expr::Array { elements } => self.visit_array(elements),
            Expr::Property { object, name } => self.visit_property(object, name),
            Expr::Index { left, index } => self.visit_index(left, index),
        }
    }

    fn visit_identifier(&mut self, name: &Token) -> Self::Item;
    fn visit_literal(&mut self, value: &Literal) -> Self::Item;
    fn visit_prefix(&mut self, operator: &Token, right: &Expr) -> Self::Item;
    fn visit_infix(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Self::Item;
    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Self::Item;
    fn visit_function(&mut self, params: &[Token], body: &Rc<Vec<Stmt>>) -> Self::Item;
    fn visit_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Self::Item;
    fn visit_object(&mut self, pairs: &[(String, Expr)]) -> Self::Item;
    fn visit_array(&mut self, elements: &[Expr]) -> Self::Item;
    fn visit_property(&mut self, object: &Expr, name: &Token) -> Self::Item;
    fn visit_index(&mut self, left: &Expr, index: &Expr) -> Self::Item;
}

impl Expr {
    // Creator methods, mostly so the parser and its tests stay readable.
    pub(crate) fn identifier(name: Token) -> Self {
        Expr::Identifier { name }
    }

    pub(crate) fn literal<T>(value: T) -> Self
    where
        Literal: From<T>,
    {
        Expr::Literal {
            value: Literal::from(value),
        }
    }

    pub(crate) fn prefix(operator: Token, right: Expr) -> Self {
        Expr::Prefix {
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn infix(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn assign(name: Token, value: Expr) -> Self {
        Expr::Assign {
            name,
            value: Box::new(value),
        }
    }

    pub(crate) fn function(params: Vec<Token>, body: Vec<Stmt>) -> Self {
        Expr::Function {
            params,
            body: Rc::new(body),
        }
    }

    pub(crate) fn call(callee: Expr, paren: Token, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        }
    }

    pub(crate) fn property(object: Expr, name: Token) -> Self {
        Expr::Property {
            object: Box::new(object),
            name,
        }
    }

    pub(crate) fn index(left: Expr, index: Expr) -> Self {
        Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var {
        name: Token,
        init: Option<Expr>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Expression {
        expression: Expr,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        // Either another `If` (for `else if`) or a `Block`
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
}

pub trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Self::Item {
        match stmt {
            Stmt::Var { name, init } => self.visit_var(name, init.as_ref()),
            Stmt::Return { keyword, value } => self.visit_return(keyword, value.as_ref()),
            Stmt::Expression { expression } => self.visit_expression(expression),
            Stmt::Block { statements } => self.visit_block(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.visit_if(condition, then_branch, else_branch.as_deref()),
            Stmt::While { condition, body } => self.visit_while(condition, body),
        }
    }

    fn visit_var(&mut self, name: &Token, init: Option<&Expr>) -> Self::Item;
    fn visit_return(&mut self, keyword: &Token, value: Option<&Expr>) -> Self::Item;
    fn visit_expression(&mut self, expression: &Expr) -> Self::Item;
    fn visit_block(&mut self, statements: &[Stmt]) -> Self::Item;
    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&Stmt>,
    ) -> Self::Item;
    fn visit_while(&mut self, condition: &Expr, body: &[Stmt]) -> Self::Item;
}

impl Stmt {
    pub(crate) fn var(name: Token, init: Option<Expr>) -> Self {
        Stmt::Var { name, init }
    }

    pub(crate) fn return_(keyword: Token, value: Option<Expr>) -> Self {
        Stmt::Return { keyword, value }
    }

    pub(crate) fn expression(expression: Expr) -> Self {
        Stmt::Expression { expression }
    }

    pub(crate) fn block(statements: Vec<Stmt>) -> Self {
        Stmt::Block { statements }
    }

    pub(crate) fn if_(condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Stmt>) -> Self {
        Stmt::If {
            condition,
            then_branch,
            else_branch: else_branch.map(Box::new),
        }
    }

    pub(crate) fn while_(condition: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While { condition, body }
    }
}

/// The root of a parsed source: its top-level statements in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

//! Static resolution pass for the Lox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of per-scope maps tracking
//!    each name through the states `Declared` → `Defined` → `Used`.
//! 2. **Enforce static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside functions, returning
//!    a value from an initializer, `break` outside loops, and the `this` /
//!    `super` placement rules.
//! 3. **Record binding distances**: for every variable occurrence
//!    (`Variable`, `Assign`, `This`, `Super`), calls back into the
//!    interpreter to note the hop count up the environment chain, or leaves
//!    it unannotated for globals.  This lets the runtime climb exactly the
//!    right number of environment frames.
//! 4. **Report dead locals**: on scope exit, any name still `Defined` (never
//!    read) is reported as unused at its declaration line.
//!
//! Errors do not stop the pass; they accumulate in the [`Diagnostics`] sink
//! so one run surfaces every problem, and the driver skips execution when
//! any were recorded.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionExpr, Stmt};
use crate::error::{Diagnostics, LoxError};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class.
    None,

    /// Inside a class declaration _without_ a superclass.
    Class,

    /// Inside a class declaration _with_ a superclass.
    Subclass,
}

/// Lifecycle of a name within its scope.  The three states are load-bearing:
/// `Declared` powers the self-reference error, and a name still `Defined` at
/// scope exit is a dead local.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VarState {
    Declared,
    Defined(usize),
    Used,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'i, 'd, W: Write> {
    interpreter: &'i mut Interpreter<W>,
    diags: &'d mut Diagnostics,
    scopes: Vec<HashMap<String, VarState>>,
    current_function: FunctionType,
    current_class: ClassType,
    in_loop: bool,
}

impl<'i, 'd, W: Write> Resolver<'i, 'd, W> {
    /// Create a new resolver bound to the given interpreter and sink.
    pub fn new(interpreter: &'i mut Interpreter<W>, diags: &'d mut Diagnostics) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            diags,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            in_loop: false,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::Var { name, initializer } => {
                // Declare before resolving the initializer so `var a = a;`
                // is caught as a self-reference.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);

                let enclosing_loop: bool = self.in_loop;
                self.in_loop = true;
                self.resolve_stmt(body);
                self.in_loop = enclosing_loop;
            }

            Stmt::Break { keyword } => {
                if !self.in_loop {
                    self.diags.report(LoxError::resolve_at(
                        keyword.line,
                        &keyword.lexeme,
                        "Can't break outside of loop body.",
                    ));
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.diags.report(LoxError::resolve_at(
                        keyword.line,
                        &keyword.lexeme,
                        "Can't return from top-level code.",
                    ));
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.diags.report(LoxError::resolve_at(
                            keyword.line,
                            &keyword.lexeme,
                            "Can't return a value from an initializer.",
                        ));
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Function(function) => {
                // Declare and define eagerly so the function can recurse.
                if let Some(name) = &function.name {
                    self.declare(name);
                    self.define(name);
                }

                self.resolve_function(function, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => {
                self.resolve_class(name, superclass.as_ref(), methods, class_methods);
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionExpr>],
        class_methods: &[std::rc::Rc<FunctionExpr>],
    ) {
        // 1. Save and enter the class context.
        let enclosing_class: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        // 2. Declare & define the class name so methods can refer to it.
        self.declare(name);
        self.define(name);

        // 3. Self-inheritance guard.
        if let Some(Expr::Variable {
            name: super_name, ..
        }) = superclass
        {
            if super_name.lexeme == name.lexeme {
                self.diags.report(LoxError::resolve_at(
                    super_name.line,
                    &super_name.lexeme,
                    "A class can't inherit from itself.",
                ));
            }
        }

        // 4. If there is a superclass, resolve it and open a scope binding
        //    `super`.
        if let Some(superclass) = superclass {
            self.current_class = ClassType::Subclass;

            self.resolve_expr(superclass);

            self.begin_scope();
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert("super".to_string(), VarState::Used);
            }
        }

        // 5. Open the implicit `this` scope for methods.
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this".to_string(), VarState::Used);
        }

        // 6. Resolve each instance method; `init` gets initializer rules.
        for method in methods {
            let kind = match &method.name {
                Some(method_name) if method_name.lexeme == "init" => FunctionType::Initializer,
                _ => FunctionType::Method,
            };

            self.resolve_function(method, kind);
        }

        // 7. Class methods resolve as plain methods, still inside the
        //    `this` scope.
        for method in class_methods {
            self.resolve_function(method, FunctionType::Method);
        }

        // 8. Close the `this` scope and, if opened, the `super` scope.
        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        // 9. Restore the outer class context.
        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(if_true);
                self.resolve_expr(if_false);
            }

            Expr::Variable { id, name } => {
                // Reading a name whose initializer is still being resolved.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&VarState::Declared) {
                        self.diags.report(LoxError::resolve_at(
                            name.line,
                            &name.lexeme,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign { id, name, value } => {
                // Resolve the right-hand side first, then bind the target.
                // Assignment is not a read: the target's state is left
                // untouched, so a write-only local still reports unused.
                self.resolve_expr(value);
                self.resolve_local(*id, name, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.diags.report(LoxError::resolve_at(
                        keyword.line,
                        &keyword.lexeme,
                        "Can't use 'this' outside of a class.",
                    ));
                    return;
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.diags.report(LoxError::resolve_at(
                        keyword.line,
                        &keyword.lexeme,
                        "Can't use 'super' outside of a class.",
                    ));
                } else if self.current_class != ClassType::Subclass {
                    self.diags.report(LoxError::resolve_at(
                        keyword.line,
                        &keyword.lexeme,
                        "Can't use 'super' in a class with no superclass.",
                    ));
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Function(function) => {
                self.resolve_function(function, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    ///
    /// `kind` selects the `return` rules that apply inside the body.
    fn resolve_function(&mut self, function: &FunctionExpr, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        // Parameters are born used; an unused parameter is not a dead local.
        for param in &function.params {
            self.declare(param);
            self.define(param);
            self.mark_used(param);
        }

        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope and report every name that was defined but
    /// never read.
    fn end_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (name, state) in &scope {
                if let VarState::Defined(line) = state {
                    self.diags.warn(LoxError::resolve(
                        *line,
                        format!("Local variable {} not used.", name),
                    ));
                }
            }
        }
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.diags.report(LoxError::resolve_at(
                    name.line,
                    &name.lexeme,
                    "Already a variable with this name in this scope.",
                ));
            }

            scope.insert(name.lexeme.clone(), VarState::Declared);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), VarState::Defined(name.line));
        }
    }

    fn mark_used(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), VarState::Used);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either a local at some depth, or a
    /// global if no scope holds the name.  A read (`is_use`) transitions the
    /// found entry to `Used`.
    fn resolve_local(&mut self, id: ExprId, name: &Token, is_use: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                if is_use {
                    scope.insert(name.lexeme.clone(), VarState::Used);
                }

                self.interpreter.note_local(id, depth);
                return;
            }
        }

        // Not found in any scope: it's a global.
        debug!("Resolved '{}' as global", name.lexeme);
    }
}

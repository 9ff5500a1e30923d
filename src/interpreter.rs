//! Tree-walk evaluator.
//!
//! The interpreter owns the global environment, the current environment, and
//! the resolution map filled in by the resolver.  Evaluation unwinds through
//! [`Unwind`]: runtime errors propagate to the driver, while the `return` and
//! `break` control signals ride the same channel and are caught by the first
//! matching construct (function call frame, enclosing `while`).  The resolver
//! guarantees a control signal never reaches the top level.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionExpr, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Everything that unwinds the evaluation stack.
#[derive(Debug)]
pub enum Unwind {
    /// A genuine runtime error; reported to the user by the driver.
    Error(LoxError),

    /// `return`, caught by the function call frame.
    Return(Value),

    /// `break`, caught by the nearest enclosing `while`.
    Break,
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

type ExecResult = std::result::Result<(), Unwind>;
type EvalResult = std::result::Result<Value, Unwind>;

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            },
        );

        info!("Interpreter initialized");

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a local variable reference at `depth` hops; called by the
    /// resolver.  References without an entry are globals.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local: id={}, depth={}", id, depth);

        self.locals.insert(id, depth);
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Execute a resolved program.  Any runtime error has already unwound
    /// every call frame by the time it is returned here.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            if let Err(unwind) = self.execute(stmt) {
                return Err(match unwind {
                    Unwind::Error(e) => e,

                    // The resolver rejects top-level `return` and stray
                    // `break`, so these cannot reach us.
                    Unwind::Return(_) => LoxError::runtime(0, "Unexpected 'return' signal."),
                    Unwind::Break => LoxError::runtime(0, "Unexpected 'break' signal."),
                });
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                match initializer {
                    Some(expr) => {
                        let value: Value = self.evaluate(expr)?;
                        self.environment.borrow_mut().define(&name.lexeme, value);
                    }

                    None => {
                        self.environment
                            .borrow_mut()
                            .define_uninitialized(&name.lexeme);
                    }
                }

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body) {
                        Ok(()) => {}

                        Err(Unwind::Break) => break,

                        Err(other) => return Err(other),
                    }
                }

                Ok(())
            }

            Stmt::Break { .. } => Err(Unwind::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                if let Some(name) = &declaration.name {
                    self.environment
                        .borrow_mut()
                        .define(&name.lexeme, Value::Function(Rc::new(function)));
                }

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => self.execute_class(name, superclass.as_ref(), methods, class_methods),
        }
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment on every exit path.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result: ExecResult = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionExpr>],
        class_methods: &[Rc<FunctionExpr>],
    ) -> ExecResult {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let value: Value = self.evaluate(expr)?;

                match value {
                    Value::Class(cls) => Some(cls),

                    _ => {
                        let line = match expr {
                            Expr::Variable { name, .. } => name.line,
                            _ => name.line,
                        };
                        return Err(Unwind::Error(LoxError::runtime(
                            line,
                            "Superclass must be a class.",
                        )));
                    }
                }
            }

            None => None,
        };

        // Two-phase definition: the name exists (as nil) while the method
        // table is built, so methods can refer to the class.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let mut method_env: Rc<RefCell<Environment>> = self.environment.clone();

        if let Some(cls) = &superclass_value {
            let mut environment = Environment::with_enclosing(method_env);
            environment.define("super", Value::Class(cls.clone()));
            method_env = Rc::new(RefCell::new(environment));
        }

        let mut method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in methods {
            if let Some(method_name) = &declaration.name {
                let is_initializer = method_name.lexeme == "init";
                method_table.insert(
                    method_name.lexeme.clone(),
                    Rc::new(LoxFunction::new(
                        declaration.clone(),
                        method_env.clone(),
                        is_initializer,
                    )),
                );
            }
        }

        let mut class_method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in class_methods {
            if let Some(method_name) = &declaration.name {
                class_method_table.insert(
                    method_name.lexeme.clone(),
                    Rc::new(LoxFunction::new(declaration.clone(), method_env.clone(), false)),
                );
            }
        }

        let class = Value::Class(Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            method_table,
            class_method_table,
        )));

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, class, name.line)
            .map_err(Unwind::Error)?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(if_true)
                } else {
                    self.evaluate(if_false)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&depth) => {
                        Environment::assign_at(
                            &self.environment,
                            depth,
                            &name.lexeme,
                            value.clone(),
                            name.line,
                        )?;
                    }

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee_val, args, paren)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        LoxInstance::get(&instance, name).map_err(Unwind::Error)
                    }

                    // Property access on a class object reaches its class
                    // (static) methods, bound to the class itself.
                    Value::Class(cls) => match cls.find_class_method(&name.lexeme) {
                        Some(method) => {
                            let bound = method.bind(Value::Class(cls.clone()));
                            Ok(Value::Function(Rc::new(bound)))
                        }

                        None => Err(Unwind::Error(LoxError::runtime(
                            name.line,
                            format!("Undefined property '{}'.", name.lexeme),
                        ))),
                    },

                    _ => Err(Unwind::Error(LoxError::runtime(
                        name.line,
                        "Only instances have properties.",
                    ))),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;
                        instance.borrow_mut().set(&name.lexeme, value.clone());
                        Ok(value)
                    }

                    _ => Err(Unwind::Error(LoxError::runtime(
                        name.line,
                        "Only instances have properties.",
                    ))),
                }
            }

            Expr::Function(declaration) => {
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> EvalResult {
        match self.locals.get(&id) {
            Some(&depth) => {
                Environment::get_at(&self.environment, depth, &name.lexeme, name.line)
                    .map_err(Unwind::Error)
            }

            None => self
                .globals
                .borrow()
                .get(&name.lexeme, name.line)
                .map_err(Unwind::Error),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> EvalResult {
        let depth: usize = match self.locals.get(&id) {
            Some(&depth) => depth,

            None => {
                return Err(Unwind::Error(LoxError::runtime(
                    keyword.line,
                    "Undefined variable 'super'.",
                )));
            }
        };

        let superclass: Value =
            Environment::get_at(&self.environment, depth, "super", keyword.line)?;

        // `this` lives one scope inside the `super` scope.
        let receiver: Value = Environment::get_at(
            &self.environment,
            depth.saturating_sub(1),
            "this",
            keyword.line,
        )?;

        let superclass: Rc<LoxClass> = match superclass {
            Value::Class(cls) => cls,

            _ => {
                return Err(Unwind::Error(LoxError::runtime(
                    keyword.line,
                    "Superclass must be a class.",
                )));
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(receiver)))),

            None => Err(Unwind::Error(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            ))),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> EvalResult {
        match callee {
            Value::NativeFunction { arity, func, .. } => {
                check_arity(arity, args.len(), paren)?;

                func(&args).map_err(Unwind::Error)
            }

            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;

                function.call(self, args)
            }

            Value::Class(cls) => {
                check_arity(cls.arity(), args.len(), paren)?;

                let instance = Rc::new(RefCell::new(LoxInstance::new(cls.clone())));

                if let Some(initializer) = cls.find_method("init") {
                    initializer
                        .bind(Value::Instance(instance.clone()))
                        .call(self, args)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(Unwind::Error(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            ))),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EvalResult {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(Unwind::Error(LoxError::runtime(
                    operator.line,
                    "Operand must be a number.",
                ))),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(Unwind::Error(LoxError::runtime(
                operator.line,
                "Invalid unary operator.",
            ))),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        let left_val: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(Unwind::Error(LoxError::runtime(
                operator.line,
                "Invalid logical operator.",
            ))),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        let numbers_error =
            || Unwind::Error(LoxError::runtime(operator.line, "Operands must be numbers."));

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(Unwind::Error(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                ))),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(numbers_error()),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(numbers_error()),
            },

            // Division by zero follows IEEE-754 and produces inf/nan.
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(numbers_error()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(numbers_error()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(numbers_error()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(numbers_error()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(numbers_error()),
            },

            _ => Err(Unwind::Error(LoxError::runtime(
                operator.line,
                "Invalid binary operator.",
            ))),
        }
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> std::result::Result<(), Unwind> {
    if expected != got {
        return Err(Unwind::Error(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        )));
    }

    Ok(())
}

/// `nil` and `false` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

/// Value equality: natural for numbers, strings, and booleans; identity for
/// functions, classes, and instances; values of different kinds are unequal.
pub fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,

        (Value::Bool(a), Value::Bool(b)) => a == b,

        (Value::Number(a), Value::Number(b)) => a == b,

        (Value::String(a), Value::String(b)) => a == b,

        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

        (
            Value::NativeFunction { func: a, .. },
            Value::NativeFunction { func: b, .. },
        ) => a == b,

        _ => false,
    }
}

fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

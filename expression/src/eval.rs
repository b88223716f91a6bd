use crate::ast::{BinOp, Expr, ExprKind, Lit, UnOp};
use crate::parser::parse;
use crate::value::{self, number, to_number, truthy};

use data_structures::HashMap;

use log::trace;
use serde_json::{Map, Value};

use std::borrow::Cow;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Name resolution for evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl Scope for Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Scope for Value {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(name))
    }
}

impl Scope for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

/// The capability rendered programs use to evaluate embedded expression
/// text. Programs never interpret expressions themselves.
pub trait Evaluator {
    fn evaluate(&self, source: &str, scope: &dyn Scope) -> Result<Value, EvalError>;
}

/// The default evaluator: a tree-walking interpreter that caches parsed
/// expressions by source text.
#[derive(Default)]
pub struct Interpreter {
    cache: RefCell<HashMap<String, Rc<Expr>>>,
}

impl Evaluator for Interpreter {
    fn evaluate(&self, source: &str, scope: &dyn Scope) -> Result<Value, EvalError> {
        let expr = self.parsed(source)?;
        Ok(self.eval(&expr, scope)?.into_owned())
    }
}

type EvalResult<T> = Result<T, EvalError>;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::default()
    }

    fn parsed(&self, source: &str) -> EvalResult<Rc<Expr>> {
        if let Some(expr) = self.cache.borrow().get(source) {
            return Ok(Rc::clone(expr));
        }
        trace!("parsing expression `{}`", source);
        let expr = Rc::new(parse(source).map_err(|err| EvalError::new(err.message))?);
        self.cache
            .borrow_mut()
            .insert(source.to_string(), Rc::clone(&expr));
        Ok(expr)
    }

    pub fn eval<'s>(&self, expr: &Expr, scope: &'s dyn Scope) -> EvalResult<Cow<'s, Value>> {
        let value = match &expr.kind {
            ExprKind::Lit(lit) => Cow::Owned(match lit {
                Lit::Null => Value::Null,
                Lit::Bool(b) => Value::Bool(*b),
                Lit::Number(n) => number(*n),
                Lit::Str(s) => Value::String(s.clone()),
            }),
            // Unbound names read as null rather than failing
            ExprKind::Reference(ident) => scope
                .lookup(&ident.name)
                .map_or(Cow::Owned(Value::Null), Cow::Borrowed),
            ExprKind::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item, scope).map(Cow::into_owned))
                    .collect::<EvalResult<Vec<_>>>()?;
                Cow::Owned(Value::Array(items))
            }
            ExprKind::Object(properties) => {
                let mut map = Map::new();
                for property in properties {
                    let value = self.eval(&property.value, scope)?.into_owned();
                    map.insert(property.key.clone(), value);
                }
                Cow::Owned(Value::Object(map))
            }
            ExprKind::Member(object, name) => {
                let key = Value::String(name.name.clone());
                self.member(object, &key, scope)?
            }
            ExprKind::Index(object, index) => {
                let key = self.eval(index, scope)?.into_owned();
                self.member(object, &key, scope)?
            }
            ExprKind::Call(callee, arguments) => Cow::Owned(self.call(callee, arguments, scope)?),
            ExprKind::Unary(op, operand) => {
                let operand = self.eval(operand, scope)?;
                Cow::Owned(match op {
                    UnOp::Plus => number(to_number(&operand)),
                    UnOp::Minus => number(-to_number(&operand)),
                    UnOp::Negate => Value::Bool(!truthy(&operand)),
                    UnOp::Typeof => Value::String(value::type_of(&operand).to_string()),
                })
            }
            ExprKind::Binary(op, left, right) => self.binary(*op, left, right, scope)?,
            ExprKind::Cond(test, consequent, alt) => {
                let test = self.eval(test, scope)?;
                if truthy(&test) {
                    self.eval(consequent, scope)?
                } else {
                    self.eval(alt, scope)?
                }
            }
        };
        Ok(value)
    }

    fn member<'s>(
        &self,
        object: &Expr,
        key: &Value,
        scope: &'s dyn Scope,
    ) -> EvalResult<Cow<'s, Value>> {
        let object = self.eval(object, scope)?;
        if object.is_null() {
            return Err(EvalError::new(format!(
                "Cannot read properties of null (reading '{}')",
                value::display(key)
            )));
        }
        Ok(match object {
            Cow::Borrowed(object) => match value::property_ref(object, key) {
                Some(found) => Cow::Borrowed(found),
                None => Cow::Owned(value::property(object, key)),
            },
            Cow::Owned(object) => Cow::Owned(value::property(&object, key)),
        })
    }

    fn binary<'s>(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        scope: &'s dyn Scope,
    ) -> EvalResult<Cow<'s, Value>> {
        let lhs = self.eval(left, scope)?;
        // Logical operators short-circuit and yield one of their operands
        match op {
            BinOp::And if !truthy(&lhs) => return Ok(lhs),
            BinOp::Or if truthy(&lhs) => return Ok(lhs),
            BinOp::Nullish if !lhs.is_null() => return Ok(lhs),
            BinOp::And | BinOp::Or | BinOp::Nullish => return self.eval(right, scope),
            _ => {}
        }
        let rhs = self.eval(right, scope)?;
        let (l, r) = (&*lhs, &*rhs);
        let ordering = || value::compare(l, r);
        let result = match op {
            BinOp::Add => value::add(l, r),
            BinOp::Sub => number(to_number(l) - to_number(r)),
            BinOp::Mul => number(to_number(l) * to_number(r)),
            BinOp::Div => number(to_number(l) / to_number(r)),
            BinOp::Mod => number(to_number(l) % to_number(r)),
            BinOp::Equals => Value::Bool(value::loose_equals(l, r)),
            BinOp::NotEquals => Value::Bool(!value::loose_equals(l, r)),
            BinOp::StrictEquals => Value::Bool(value::strict_equals(l, r)),
            BinOp::StrictNotEquals => Value::Bool(!value::strict_equals(l, r)),
            BinOp::LessThan => Value::Bool(ordering() == Some(Ordering::Less)),
            BinOp::GreaterThan => Value::Bool(ordering() == Some(Ordering::Greater)),
            BinOp::LessThanEquals => Value::Bool(matches!(
                ordering(),
                Some(Ordering::Less) | Some(Ordering::Equal)
            )),
            BinOp::GreaterThanEquals => Value::Bool(matches!(
                ordering(),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            )),
            BinOp::And | BinOp::Or | BinOp::Nullish => rhs.clone().into_owned(),
        };
        Ok(Cow::Owned(result))
    }

    fn call(&self, callee: &Expr, arguments: &[Expr], scope: &dyn Scope) -> EvalResult<Value> {
        let args = arguments
            .iter()
            .map(|arg| self.eval(arg, scope).map(Cow::into_owned))
            .collect::<EvalResult<Vec<_>>>()?;
        match &callee.kind {
            ExprKind::Reference(ident) if scope.lookup(&ident.name).is_none() => {
                global_function(&ident.name, &args)
            }
            ExprKind::Member(object, method) => {
                if let ExprKind::Reference(ident) = &object.kind {
                    if ident.name == "JSON" && scope.lookup("JSON").is_none() {
                        return json_method(&method.name, &args);
                    }
                }
                let target = self.eval(object, scope)?;
                call_method(&target, &method.name, &args)
            }
            _ => Err(EvalError::new("Expression is not a function")),
        }
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Null)
}

fn global_function(name: &str, args: &[Value]) -> EvalResult<Value> {
    let value = arg(args, 0);
    match name {
        "String" => Ok(Value::String(value::display(&value))),
        "Number" => Ok(number(to_number(&value))),
        "Boolean" => Ok(Value::Bool(truthy(&value))),
        _ => Err(EvalError::new(format!("{} is not a function", name))),
    }
}

fn json_method(name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "stringify" => serde_json::to_string(&value::in_key_order(&arg(args, 0)))
            .map(Value::String)
            .map_err(|err| EvalError::new(err.to_string())),
        _ => Err(EvalError::new(format!("JSON.{} is not a function", name))),
    }
}

/// Resolve `slice(start, end)` bounds the way scripts do: negative
/// offsets count from the end and everything is clamped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn slice_bounds(len: usize, start: &Value, end: &Value) -> (usize, usize) {
    let resolve = |value: &Value, default: usize| -> usize {
        if value.is_null() {
            return default;
        }
        let n = to_number(value);
        if n.is_nan() {
            0
        } else if n < 0.0 {
            (len as f64 + n).max(0.0) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let start = resolve(start, 0);
    let end = resolve(end, len);
    (start, end.max(start))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn call_method(target: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    let value = match (target, name) {
        (Value::String(s), "toUpperCase") => Value::String(s.to_uppercase()),
        (Value::String(s), "toLowerCase") => Value::String(s.to_lowercase()),
        (Value::String(s), "trim") => Value::String(s.trim().to_string()),
        (Value::String(s), "indexOf") => {
            let needle = value::display(&arg(args, 0));
            number(s.find(&needle).map_or(-1.0, |byte| s[..byte].chars().count() as f64))
        }
        (Value::String(s), "includes") => Value::Bool(s.contains(&value::display(&arg(args, 0)))),
        (Value::String(s), "startsWith") => {
            Value::Bool(s.starts_with(&value::display(&arg(args, 0))))
        }
        (Value::String(s), "split") => {
            let separator = value::display(&arg(args, 0));
            let parts: Vec<Value> = if separator.is_empty() {
                s.chars().map(|ch| Value::String(ch.to_string())).collect()
            } else {
                s.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect()
            };
            Value::Array(parts)
        }
        (Value::String(s), "slice") => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), &arg(args, 0), &arg(args, 1));
            Value::String(chars[start..end].iter().collect())
        }
        (Value::Array(items), "join") => {
            let separator = match args.get(0) {
                Some(sep) if !sep.is_null() => value::display(sep),
                _ => ",".to_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(value::display)
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        (Value::Array(items), "indexOf") => {
            let needle = arg(args, 0);
            number(
                items
                    .iter()
                    .position(|item| value::strict_equals(item, &needle))
                    .map_or(-1.0, |i| i as f64),
            )
        }
        (Value::Array(items), "includes") => {
            let needle = arg(args, 0);
            Value::Bool(items.iter().any(|item| value::strict_equals(item, &needle)))
        }
        (Value::Array(items), "slice") => {
            let (start, end) = slice_bounds(items.len(), &arg(args, 0), &arg(args, 1));
            Value::Array(items[start..end].to_vec())
        }
        (Value::Number(n), "toFixed") => {
            let digits = to_number(&arg(args, 0)).max(0.0) as usize;
            Value::String(format!("{:.*}", digits, n.as_f64().unwrap_or(0.0)))
        }
        (_, "toString") => Value::String(value::display(target)),
        _ => {
            return Err(EvalError::new(format!(
                "{} is not a function on {}",
                name,
                value::type_of(target)
            )))
        }
    };
    Ok(value)
}

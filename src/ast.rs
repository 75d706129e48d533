//! This module defines the core tagged value type of the interpreter. The
//! main enum, [`Value`], covers all nine run-time types: unit, integers,
//! floats, strings, atoms, quotes, lists, lambdas, and built-in functions.
//! Values are value-typed: passing one around semantically copies it, and
//! mutation through builtins like `push` affects only the returned copy.
//! Equality, ordering, arithmetic, and the two textual renderings (`display`
//! via [`std::fmt::Display`], `debug` via [`std::fmt::Debug`]) are all
//! defined here so the evaluator and builtins can stay purely structural.

use crate::evaluator::Environment;
use crate::{Error, ErrorKind};

/// The type of a builtin function: a list of unevaluated argument values and
/// the environment to run in. Builtins that are not special forms evaluate
/// their own arguments first.
pub type Builtin = fn(Vec<Value>, &mut Environment) -> Result<Value, Error>;

/// A single Wisp value, produced by the parser or by evaluation.
#[derive(Clone)]
pub enum Value {
    /// Absence of a value; absorbs all arithmetic.
    Unit,
    /// Signed integer.
    Int(i64),
    /// IEEE-754 double.
    Float(f64),
    /// Literal text.
    String(String),
    /// An unevaluated identifier, looked up in the environment when evaluated.
    Atom(String),
    /// Suspends evaluation of the contained value for one `eval` step.
    Quote(Box<Value>),
    /// Either data or a call form.
    List(Vec<Value>),
    /// A user-defined function with its captured scope snapshot.
    Lambda {
        params: Vec<Value>,
        body: Box<Value>,
        scope: Environment,
    },
    /// A host-implemented function, named for display purposes.
    Builtin { name: &'static str, func: Builtin },
}

/// Shorthand for errors raised by value operations, which have no scope of
/// their own and snapshot an empty environment.
fn err(kind: ErrorKind, cause: &Value) -> Error {
    Error::new(kind, cause.clone(), &Environment::new())
}

impl Value {
    pub fn atom(name: impl Into<String>) -> Value {
        Value::Atom(name.into())
    }

    pub fn string(text: impl Into<String>) -> Value {
        Value::String(text.into())
    }

    pub fn quote(inner: Value) -> Value {
        Value::Quote(Box::new(inner))
    }

    pub fn builtin(name: &'static str, func: Builtin) -> Value {
        Value::Builtin { name, func }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Value::Builtin { .. })
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Truthiness: any value not equal to the integer 0. Unit, empty lists,
    /// and empty strings are all truthy.
    pub fn as_bool(&self) -> bool {
        *self != Value::Int(0)
    }

    pub fn as_int(&self) -> Result<i64, Error> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(x) => Ok(*x as i64),
            other => Err(err(ErrorKind::BadCast, other)),
        }
    }

    pub fn as_string(&self) -> Result<&str, Error> {
        match self {
            Value::String(text) => Ok(text),
            other => Err(err(ErrorKind::BadCast, other)),
        }
    }

    pub fn as_atom(&self) -> Result<&str, Error> {
        match self {
            Value::Atom(name) => Ok(name),
            other => Err(err(ErrorKind::BadCast, other)),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], Error> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(err(ErrorKind::BadCast, other)),
        }
    }

    /// Cast to an integer value; floats truncate, everything else fails.
    pub fn cast_to_int(&self) -> Result<Value, Error> {
        Ok(Value::Int(self.as_int()?))
    }

    /// Cast to a floating point value.
    pub fn cast_to_float(&self) -> Result<Value, Error> {
        match self {
            Value::Int(n) => Ok(Value::Float(*n as f64)),
            Value::Float(x) => Ok(Value::Float(*x)),
            other => Err(err(ErrorKind::BadCast, other)),
        }
    }

    /// The name reported by the `type` builtin. Lambdas and builtins are
    /// grouped together since both are callable.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Atom(_) => "atom",
            Value::Quote(_) => "quote",
            Value::List(_) => "list",
            Value::Lambda { .. } | Value::Builtin { .. } => "function",
        }
    }

    /// Addition, with the overloads: numbers add (promoting Int to Float
    /// when mixed), strings concatenate, lists concatenate, and Unit
    /// absorbs everything.
    pub fn add(&self, other: &Value) -> Result<Value, Error> {
        if matches!(self, Value::Unit) || matches!(other, Value::Unit) {
            return Ok(Value::Unit);
        }
        if self.is_number() != other.is_number() {
            return Err(err(ErrorKind::InvalidBinOp, self));
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut items = a.clone();
                items.extend(b.iter().cloned());
                Ok(Value::List(items))
            }
            _ => Err(err(ErrorKind::InvalidBinOp, self)),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_operands(other)? {
            Some((a, b)) => Ok(Value::Float(a - b)),
            None => match (self, other) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
                _ => Ok(Value::Unit),
            },
        }
    }

    pub fn mul(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_operands(other)? {
            Some((a, b)) => Ok(Value::Float(a * b)),
            None => match (self, other) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
                _ => Ok(Value::Unit),
            },
        }
    }

    pub fn div(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_operands(other)? {
            Some((a, b)) => Ok(Value::Float(a / b)),
            None => match (self, other) {
                (Value::Int(a), Value::Int(b)) => match a.checked_div(*b) {
                    Some(q) => Ok(Value::Int(q)),
                    None => Err(err(ErrorKind::InvalidBinOp, self)),
                },
                _ => Ok(Value::Unit),
            },
        }
    }

    /// Remainder; behaves like IEEE `fmod` whenever a float is involved.
    pub fn rem(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_operands(other)? {
            Some((a, b)) => Ok(Value::Float(a % b)),
            None => match (self, other) {
                (Value::Int(a), Value::Int(b)) => match a.checked_rem(*b) {
                    Some(r) => Ok(Value::Int(r)),
                    None => Err(err(ErrorKind::InvalidBinOp, self)),
                },
                _ => Ok(Value::Unit),
            },
        }
    }

    /// Shared operand screening for `-`, `*`, `/`, and `%`: Unit absorbs,
    /// non-numeric operands are rejected, and a mixed Int/Float pair is
    /// promoted to a float pair. Returns `None` for the Int/Int case (and
    /// the already-handled Unit case) so callers can keep integer results
    /// exact.
    fn numeric_operands(&self, other: &Value) -> Result<Option<(f64, f64)>, Error> {
        if matches!(self, Value::Unit) || matches!(other, Value::Unit) {
            return Ok(None);
        }
        if !other.is_number() {
            return Err(err(ErrorKind::InvalidBinOp, self));
        }
        match (self, other) {
            (Value::Int(_), Value::Int(_)) => Ok(None),
            (Value::Int(a), Value::Float(b)) => Ok(Some((*a as f64, *b))),
            (Value::Float(a), Value::Int(b)) => Ok(Some((*a, *b as f64))),
            (Value::Float(a), Value::Float(b)) => Ok(Some((*a, *b))),
            _ => Err(err(ErrorKind::InvalidBinOp, self)),
        }
    }

    /// Strict ordering, defined only on numbers. A non-numeric right operand
    /// is an invalid operation; a non-numeric left operand cannot be ordered.
    pub fn lt(&self, other: &Value) -> Result<bool, Error> {
        if !other.is_number() {
            return Err(err(ErrorKind::InvalidBinOp, self));
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a < b),
            (Value::Int(a), Value::Float(b)) => Ok((*a as f64) < *b),
            (Value::Float(a), Value::Int(b)) => Ok(*a < *b as f64),
            (Value::Float(a), Value::Float(b)) => Ok(a < b),
            _ => Err(err(ErrorKind::InvalidOrder, self)),
        }
    }

    pub fn lte(&self, other: &Value) -> Result<bool, Error> {
        if self == other {
            return Ok(true);
        }
        self.lt(other)
    }

    pub fn gt(&self, other: &Value) -> Result<bool, Error> {
        Ok(!self.lte(other)?)
    }

    pub fn gte(&self, other: &Value) -> Result<bool, Error> {
        Ok(!self.lt(other)?)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Ints and floats compare by promoting the int.
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            // Atoms and strings both compare by their text.
            (Value::String(a), Value::String(b)) | (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Quote(a), Value::Quote(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Lambdas compare by parameters and body; the captured scope is
            // derived from those and from the creation site.
            (
                Value::Lambda {
                    params: p1,
                    body: b1,
                    ..
                },
                Value::Lambda {
                    params: p2,
                    body: b2,
                    ..
                },
            ) => p1 == p2 && b1 == b2,
            // Builtins compare by function pointer identity.
            (Value::Builtin { func: f1, .. }, Value::Builtin { func: f2, .. }) => {
                *f1 as usize == *f2 as usize
            }
            _ => false,
        }
    }
}

/// The `debug` rendering: strings are quoted with embedded quotes escaped,
/// everything else renders as a short token or a parenthesised sequence.
impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Unit => f.write_str("@"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(text) => write!(f, "\"{}\"", text.replace('"', "\\\"")),
            Value::Atom(name) => f.write_str(name),
            Value::Quote(inner) => write!(f, "'{inner:?}"),
            Value::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                f.write_str(")")
            }
            Value::Lambda { params, body, .. } => {
                f.write_str("(lambda (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{param:?}")?;
                }
                write!(f, ") {body:?})")
            }
            Value::Builtin { name, func } => write!(f, "<{name} at {}>", *func as usize),
        }
    }
}

/// The `display` rendering differs from `debug` only for strings, which
/// render as their raw contents.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(text) => f.write_str(text),
            other => write!(f, "{other:?}"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion in
// builtins and tests.
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

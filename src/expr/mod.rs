//! Formula evaluation for animated properties
//!
//! Any numeric, boolean, string or color property of a scene object may be a
//! literal or a `{ "formula": "..." }`. Formulas are evaluated every frame
//! against a [`Scope`]. Evaluation is total: a formula that fails to parse or
//! evaluate yields the caller's fallback so one bad property never stops the
//! rest of the scene from resolving.

pub mod eval;
pub mod parser;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parsed programs kept before the cache starts over
const MAX_CACHED_PROGRAMS: usize = 1024;

pub use eval::{EvalError, evaluate};
pub use parser::{BinOp, Expr, ParseError, UnaryOp};

/// Numeric fields an object exposes to later formulas (`objects.<id>.<field>`)
pub type Fields = BTreeMap<&'static str, f32>;

/// Resolved fields of every object published so far this frame
pub type ObjectScope = HashMap<String, Fields>;

/// Result of evaluating a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f32),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Numeric coercion: booleans become 1/0, numeric strings are parsed
    pub fn as_number(&self) -> Result<f32, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s
                .trim()
                .parse::<f32>()
                .map_err(|_| EvalError::TypeMismatch("number")),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Variables visible to a formula
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub frame: u64,
    /// Elapsed seconds
    pub t: f32,
    pub width: f32,
    pub height: f32,
    pub objects: &'a ObjectScope,
    /// Position of the evaluating object's parent, if it resolved
    pub parent: Option<Vec2>,
}

/// A formula-driven property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub formula: String,
}

/// A property that is either a literal or a formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Animatable<T> {
    Formula(Formula),
    Literal(T),
}

impl<T> Animatable<T> {
    pub fn formula(src: impl Into<String>) -> Self {
        Animatable::Formula(Formula { formula: src.into() })
    }
}

impl<T> From<T> for Animatable<T> {
    fn from(value: T) -> Self {
        Animatable::Literal(value)
    }
}

/// A color property; a literal `null` means "no paint"
pub type AnimatableColor = Animatable<Option<String>>;

/// Parse or evaluation failure of a single formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Evaluates formulas, caching each parsed program by its source text
#[derive(Debug, Default)]
pub struct Evaluator {
    prepared: RefCell<HashMap<String, Arc<Result<Expr, ParseError>>>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn program(&self, src: &str) -> Arc<Result<Expr, ParseError>> {
        if let Some(program) = self.prepared.borrow().get(src) {
            return Arc::clone(program);
        }
        let program = Arc::new(Expr::parse(src));
        let mut prepared = self.prepared.borrow_mut();
        if prepared.len() >= MAX_CACHED_PROGRAMS {
            log::debug!("formula cache full, clearing {} programs", prepared.len());
            prepared.clear();
        }
        prepared.insert(src.to_string(), Arc::clone(&program));
        program
    }

    /// Evaluate a formula, reporting failures
    pub fn evaluate(&self, src: &str, scope: &Scope<'_>) -> Result<Value, ExprError> {
        match self.program(src).as_ref() {
            Ok(expr) => Ok(evaluate(expr, scope)?),
            Err(e) => Err(e.clone().into()),
        }
    }

    /// Evaluate a formula, returning `None` (and logging) on failure
    fn try_eval(&self, src: &str, scope: &Scope<'_>) -> Option<Value> {
        match self.evaluate(src, scope) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("formula '{src}' fell back to default: {e}");
                None
            }
        }
    }

    pub fn eval_number(&self, value: Option<&Animatable<f32>>, fallback: f32, scope: &Scope<'_>) -> f32 {
        match value {
            None => fallback,
            Some(Animatable::Literal(n)) => *n,
            Some(Animatable::Formula(f)) => self
                .try_eval(&f.formula, scope)
                .and_then(|v| v.as_number().ok())
                .filter(|n| n.is_finite())
                .unwrap_or(fallback),
        }
    }

    pub fn eval_bool(&self, value: Option<&Animatable<bool>>, fallback: bool, scope: &Scope<'_>) -> bool {
        match value {
            None => fallback,
            Some(Animatable::Literal(b)) => *b,
            Some(Animatable::Formula(f)) => self
                .try_eval(&f.formula, scope)
                .map(|v| v.truthy())
                .unwrap_or(fallback),
        }
    }

    pub fn eval_string(&self, value: Option<&Animatable<String>>, fallback: &str, scope: &Scope<'_>) -> String {
        match value {
            None => fallback.to_string(),
            Some(Animatable::Literal(s)) => s.clone(),
            Some(Animatable::Formula(f)) => self
                .try_eval(&f.formula, scope)
                .map(|v| v.to_string())
                .unwrap_or_else(|| fallback.to_string()),
        }
    }

    /// Absent uses the fallback, literal `null` is no paint
    pub fn eval_color(
        &self,
        value: Option<&AnimatableColor>,
        fallback: Option<&str>,
        scope: &Scope<'_>,
    ) -> Option<String> {
        match value {
            None => fallback.map(str::to_string),
            Some(Animatable::Literal(color)) => color.clone(),
            Some(Animatable::Formula(f)) => match self.try_eval(&f.formula, scope) {
                Some(v) => Some(v.to_string()),
                None => fallback.map(str::to_string),
            },
        }
    }

    /// Number of distinct formulas parsed so far
    pub fn cached_programs(&self) -> usize {
        self.prepared.borrow().len()
    }

    /// Forget every parsed program
    pub fn clear_cache(&self) {
        self.prepared.borrow_mut().clear();
    }
}

//! Tree-walking interpreter for parsed formulas

use thiserror::Error;

use super::parser::{BinOp, Expr, UnaryOp};
use super::{Scope, Value};

/// Error type for expression evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("unknown member: {0}")]
    UnknownMember(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("function {func} expected {expected} args, got {got}")]
    InvalidArgCount {
        func: String,
        expected: &'static str,
        got: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("type mismatch: expected {0}")]
    TypeMismatch(&'static str),
    #[error("result is not a finite number")]
    NonFinite,
}

/// Evaluate an expression against a scope
pub fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Ident(name) => lookup_identifier(name, scope),
        Expr::Member { .. } | Expr::Index { .. } => {
            let (root, keys) = member_path(expr, scope)?;
            lookup_path(&root, &keys, scope)
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope)?;
            match op {
                UnaryOp::Neg => finite(-value.as_number()?),
                UnaryOp::Plus => finite(value.as_number()?),
                UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
            }
        }
        Expr::Binary { op, left, right } => match op {
            // Short-circuit like the logical operators of most formula languages
            BinOp::And => {
                let l = evaluate(left, scope)?;
                if !l.truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(evaluate(right, scope)?.truthy()))
            }
            BinOp::Or => {
                let l = evaluate(left, scope)?;
                if l.truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(evaluate(right, scope)?.truthy()))
            }
            _ => {
                let l = evaluate(left, scope)?;
                let r = evaluate(right, scope)?;
                binary(*op, l, r)
            }
        },
        Expr::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            if evaluate(condition, scope)?.truthy() {
                evaluate(then_expr, scope)
            } else {
                evaluate(else_expr, scope)
            }
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|a| evaluate(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &values)
        }
    }
}

fn finite(n: f32) -> Result<Value, EvalError> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(EvalError::NonFinite)
    }
}

fn lookup_identifier(name: &str, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match name {
        "frame" => Ok(Value::Number(scope.frame as f32)),
        "t" => Ok(Value::Number(scope.t)),
        "width" => Ok(Value::Number(scope.width)),
        "height" => Ok(Value::Number(scope.height)),
        "pi" | "PI" => Ok(Value::Number(std::f32::consts::PI)),
        "tau" => Ok(Value::Number(std::f32::consts::TAU)),
        "e" | "E" => Ok(Value::Number(std::f32::consts::E)),
        "objects" | "parent" => Err(EvalError::TypeMismatch("scalar, found namespace")),
        _ => Err(EvalError::UnknownIdentifier(name.to_string())),
    }
}

/// Flatten `root.a["b"].c` into (`root`, [`a`, `b`, `c`])
fn member_path(expr: &Expr, scope: &Scope<'_>) -> Result<(String, Vec<String>), EvalError> {
    match expr {
        Expr::Ident(name) => Ok((name.clone(), Vec::new())),
        Expr::Member { object, field } => {
            let (root, mut keys) = member_path(object, scope)?;
            keys.push(field.clone());
            Ok((root, keys))
        }
        Expr::Index { object, index } => {
            let (root, mut keys) = member_path(object, scope)?;
            keys.push(evaluate(index, scope)?.to_string());
            Ok((root, keys))
        }
        _ => Err(EvalError::TypeMismatch("namespace")),
    }
}

fn lookup_path(root: &str, keys: &[String], scope: &Scope<'_>) -> Result<Value, EvalError> {
    match (root, keys) {
        ("objects", [id, field]) => scope
            .objects
            .get(id)
            .ok_or_else(|| EvalError::UnknownMember(id.clone()))?
            .get(field.as_str())
            .map(|v| Value::Number(*v))
            .ok_or_else(|| EvalError::UnknownMember(format!("{id}.{field}"))),
        ("parent", [field]) => {
            let parent = scope.parent.ok_or_else(|| EvalError::UnknownIdentifier("parent".to_string()))?;
            match field.as_str() {
                "x" => Ok(Value::Number(parent.x)),
                "y" => Ok(Value::Number(parent.y)),
                _ => Err(EvalError::UnknownMember(format!("parent.{field}"))),
            }
        }
        _ => Err(EvalError::UnknownMember(format!("{root}.{}", keys.join(".")))),
    }
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => {
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                return Ok(Value::Str(format!("{l}{r}")));
            }
            finite(l.as_number()? + r.as_number()?)
        }
        BinOp::Sub => finite(l.as_number()? - r.as_number()?),
        BinOp::Mul => finite(l.as_number()? * r.as_number()?),
        BinOp::Div => {
            let d = r.as_number()?;
            if d == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            finite(l.as_number()? / d)
        }
        BinOp::Mod => modulo(l.as_number()?, r.as_number()?),
        BinOp::Pow => finite(l.as_number()?.powf(r.as_number()?)),
        BinOp::Gt => Ok(Value::Bool(l.as_number()? > r.as_number()?)),
        BinOp::Lt => Ok(Value::Bool(l.as_number()? < r.as_number()?)),
        BinOp::Gte => Ok(Value::Bool(l.as_number()? >= r.as_number()?)),
        BinOp::Lte => Ok(Value::Bool(l.as_number()? <= r.as_number()?)),
        BinOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinOp::Neq => Ok(Value::Bool(!values_equal(&l, &r))),
        BinOp::And => Ok(Value::Bool(l.truthy() && r.truthy())),
        BinOp::Or => Ok(Value::Bool(l.truthy() || r.truthy())),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => match (l.as_number(), r.as_number()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}

/// Floored modulo: the result takes the sign of the divisor
fn modulo(a: f32, b: f32) -> Result<Value, EvalError> {
    if b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    finite(a - b * (a / b).floor())
}

fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(EvalError::InvalidArgCount {
                func: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };
    let num = |i: usize| args[i].as_number();

    match name {
        "sin" | "cos" | "tan" | "asin" | "acos" | "atan" | "abs" | "floor" | "ceil" | "round"
        | "sqrt" | "exp" | "log" | "sign" => {
            arity("1", args.len() == 1)?;
            let x = num(0)?;
            let result = match name {
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "asin" => x.asin(),
                "acos" => x.acos(),
                "atan" => x.atan(),
                "abs" => x.abs(),
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                // Half away from zero: round(-2.5) == -3
                "round" => x.round(),
                "sqrt" => x.sqrt(),
                "exp" => x.exp(),
                "log" => x.ln(),
                _ => {
                    if x == 0.0 {
                        0.0
                    } else {
                        x.signum()
                    }
                }
            };
            finite(result)
        }
        "atan2" | "pow" | "mod" | "hypot" => {
            arity("2", args.len() == 2)?;
            let (a, b) = (num(0)?, num(1)?);
            match name {
                "atan2" => finite(a.atan2(b)),
                "pow" => finite(a.powf(b)),
                "hypot" => finite(a.hypot(b)),
                _ => modulo(a, b),
            }
        }
        "min" | "max" => {
            arity("at least 1", !args.is_empty())?;
            let mut acc = num(0)?;
            for i in 1..args.len() {
                let v = num(i)?;
                acc = if name == "min" { acc.min(v) } else { acc.max(v) };
            }
            finite(acc)
        }
        "clamp" => {
            arity("3", args.len() == 3)?;
            let (x, lo, hi) = (num(0)?, num(1)?, num(2)?);
            finite(x.max(lo).min(hi))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

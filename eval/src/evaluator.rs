use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use meval::{Context, ContextProvider, FuncEvalError};
use thiserror::Error;

use crate::builtins;
use crate::expr::{Expr, ParseError};

type UserFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined symbol `{0}`")]
    UnknownSymbol(String),
    #[error("undefined function `{0}`")]
    UnknownFunction(String),
    #[error("`{name}` {problem}")]
    Arguments { name: String, problem: String },
    #[error("result is not a finite number ({0})")]
    NonFinite(f64),
    #[error("{0}")]
    Failed(String),
}

impl From<meval::Error> for EvalError {
    fn from(err: meval::Error) -> Self {
        match err {
            meval::Error::UnknownVariable(name) => EvalError::UnknownSymbol(name),
            meval::Error::Function(name, FuncEvalError::UnknownFunction) => {
                EvalError::UnknownFunction(name)
            }
            meval::Error::Function(name, FuncEvalError::NumberArgs(n)) => EvalError::Arguments {
                name,
                problem: format!("expects {n} argument(s)"),
            },
            meval::Error::Function(name, FuncEvalError::TooFewArguments) => EvalError::Arguments {
                name,
                problem: "has too few arguments".to_string(),
            },
            meval::Error::Function(name, FuncEvalError::TooManyArguments) => EvalError::Arguments {
                name,
                problem: "has too many arguments".to_string(),
            },
            other => EvalError::Failed(other.to_string()),
        }
    }
}

/// Failure to parse or evaluate expression text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` is not a valid function name")]
    InvalidName(String),
    #[error("`{0}` is a built-in name")]
    Reserved(String),
    #[error("`{0}` is already registered")]
    Duplicate(String),
}

/// Expression evaluator with a registry of named user functions.
///
/// Registration happens before the evaluator is shared; after that it is
/// read-only and can sit behind an `Arc` across tasks.
#[derive(Default, Clone)]
pub struct Evaluator {
    functions: BTreeMap<String, UserFunction>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("functions", &self.function_names())
            .finish()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Evaluator {
    /// Evaluator with built-ins only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name(x)` callable from expressions.
    pub fn register<F>(&mut self, name: &str, function: F) -> Result<(), RegistryError>
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        if !is_identifier(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if builtins::is_builtin(name) {
            return Err(RegistryError::Reserved(name.to_string()));
        }
        if self.functions.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.functions.insert(name.to_string(), Arc::new(function));
        tracing::debug!(name, "Registered expression function");
        Ok(())
    }

    /// Registered function names, sorted.
    #[must_use]
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn parse(&self, source: &str) -> Result<Expr, ParseError> {
        source.parse()
    }

    /// Built-ins plus every registered function, for evaluating many samples.
    #[must_use]
    pub fn scope(&self) -> Scope {
        let mut context = builtins::context();
        for (name, function) in &self.functions {
            let function = Arc::clone(function);
            context.func(name.as_str(), move |x| function(x));
        }
        Scope { context }
    }

    /// Parse and evaluate `source` with the given variable bindings.
    pub fn evaluate(&self, source: &str, bindings: &[(&str, f64)]) -> Result<f64, ExprError> {
        let expr = self.parse(source)?;
        Ok(self.evaluate_expr(&expr, bindings)?)
    }

    pub fn evaluate_expr(&self, expr: &Expr, bindings: &[(&str, f64)]) -> Result<f64, EvalError> {
        self.scope().evaluate(expr, bindings)
    }
}

/// Names resolvable while evaluating, built once per [`Evaluator::scope`].
pub struct Scope {
    context: Context<'static>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").finish_non_exhaustive()
    }
}

impl Scope {
    /// Evaluate a parsed expression. Only the final value is checked for
    /// finiteness, so intermediate infinities that cancel out are allowed.
    pub fn evaluate(&self, expr: &Expr, bindings: &[(&str, f64)]) -> Result<f64, EvalError> {
        let value = expr.compiled().eval_with_context(Bound {
            bindings,
            context: &self.context,
        })?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite(value))
        }
    }
}

/// Caller bindings layered over a scope. Bindings win over constants.
struct Bound<'a> {
    bindings: &'a [(&'a str, f64)],
    context: &'a Context<'static>,
}

impl ContextProvider for Bound<'_> {
    fn get_var(&self, name: &str) -> Option<f64> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == name)
            .map(|&(_, value)| value)
            .or_else(|| self.context.get_var(name))
    }

    fn eval_func(&self, name: &str, args: &[f64]) -> Result<f64, FuncEvalError> {
        self.context.eval_func(name, args)
    }
}

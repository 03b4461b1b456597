//! Parsed coefficient expressions.
//!
//! Parsing is done by `meval`, which compiles the text to reverse Polish
//! notation. The normalized infix rendering shown in previews is rebuilt from
//! that token stream, so it always reflects what will actually be evaluated.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use meval::tokenizer::{Operation, Token};
use thiserror::Error;

/// Longest coefficient text accepted.
pub(crate) const MAX_SOURCE_LEN: usize = 512;

/// Deepest parenthesis nesting accepted.
pub(crate) const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,
    #[error("expression is longer than {} characters", MAX_SOURCE_LEN)]
    TooLong,
    #[error("parentheses nest deeper than {} levels", MAX_NESTING)]
    TooDeep,
    #[error("{0}")]
    Syntax(String),
}

/// Piece of a rendered expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// Name of a called function, without its argument list.
    Function(String),
}

impl Fragment {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Fragment::Text(text) | Fragment::Function(text) => text,
        }
    }
}

/// A coefficient expression ready for evaluation.
#[derive(Clone)]
pub struct Expr {
    source: String,
    compiled: Arc<meval::Expr>,
    fragments: Vec<Fragment>,
}

impl Expr {
    pub(crate) fn compiled(&self) -> &meval::Expr {
        &self.compiled
    }

    /// Normalized rendering split so callers can style function names.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }
}

impl FromStr for Expr {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        if source.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        if source.len() > MAX_SOURCE_LEN {
            return Err(ParseError::TooLong);
        }
        if nesting(source) > MAX_NESTING {
            return Err(ParseError::TooDeep);
        }

        let compiled = source
            .parse::<meval::Expr>()
            .map_err(|err| ParseError::Syntax(err.to_string()))?;
        let fragments = render(&compiled)
            .unwrap_or_else(|| vec![Fragment::Text(source.trim().to_string())]);
        Ok(Self {
            source: source.to_string(),
            compiled: Arc::new(compiled),
            fragments,
        })
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.source).finish()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fragments
            .iter()
            .try_for_each(|fragment| f.write_str(fragment.as_str()))
    }
}

fn nesting(source: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for c in source.chars() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

// ============================================================================
// Rendering
// ============================================================================

const SUM: u8 = 1;
const PRODUCT: u8 = 2;
const PREFIX: u8 = 3;
const POWER: u8 = 4;
const ATOM: u8 = 5;

struct Operand {
    fragments: Vec<Fragment>,
    precedence: u8,
}

impl Operand {
    fn atom(fragment: Fragment) -> Self {
        Self {
            fragments: vec![fragment],
            precedence: ATOM,
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Self::atom(Fragment::Text(text.into()))
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Fragment::Text(last)) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(Fragment::Text(text.to_string()));
        }
    }

    fn append(&mut self, other: Operand) {
        for fragment in other.fragments {
            match fragment {
                Fragment::Text(text) => self.push_text(&text),
                function @ Fragment::Function(_) => self.fragments.push(function),
            }
        }
    }

    /// Parenthesized when it binds looser than `min`.
    fn at_least(self, min: u8) -> Self {
        if self.precedence >= min {
            return self;
        }
        let mut wrapped = Operand::text("(");
        wrapped.append(self);
        wrapped.push_text(")");
        wrapped
    }
}

/// Rebuild infix text from reverse Polish tokens. `None` if the stream is not
/// one well-formed expression.
fn render(rpn: &[Token]) -> Option<Vec<Fragment>> {
    let mut stack: Vec<Operand> = Vec::new();
    for token in rpn {
        let operand = match token {
            Token::Number(n) => Operand::text(n.to_string()),
            Token::Var(name) => Operand::text(name.as_str()),
            Token::Unary(op) => {
                let operand = stack.pop()?;
                match op {
                    Operation::Plus | Operation::Minus => {
                        let sign = if matches!(op, Operation::Minus) { "-" } else { "+" };
                        let mut prefixed = Operand::text(sign);
                        prefixed.append(operand.at_least(PREFIX));
                        prefixed.precedence = PREFIX;
                        prefixed
                    }
                    _ => return None,
                }
            }
            Token::Binary(op) => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                // (symbol, precedence, lhs minimum, rhs minimum)
                let (symbol, precedence, lhs_min, rhs_min) = match op {
                    Operation::Plus => (" + ", SUM, SUM, SUM),
                    Operation::Minus => (" - ", SUM, SUM, PRODUCT),
                    Operation::Times => (" * ", PRODUCT, PRODUCT, PRODUCT),
                    Operation::Div => (" / ", PRODUCT, PRODUCT, PREFIX),
                    Operation::Rem => (" % ", PRODUCT, PRODUCT, PREFIX),
                    Operation::Pow => ("^", POWER, ATOM, POWER),
                    _ => return None,
                };
                let mut combined = lhs.at_least(lhs_min);
                combined.push_text(symbol);
                combined.append(rhs.at_least(rhs_min));
                combined.precedence = precedence;
                combined
            }
            Token::Func(name, args) => {
                let count = args.unwrap_or(1);
                let first = stack.len().checked_sub(count)?;
                let args = stack.split_off(first);
                let mut call = Operand::atom(Fragment::Function(name.clone()));
                call.push_text("(");
                for (i, arg) in args.into_iter().enumerate() {
                    if i > 0 {
                        call.push_text(", ");
                    }
                    call.append(arg);
                }
                call.push_text(")");
                call
            }
            _ => return None,
        };
        stack.push(operand);
    }

    let operand = stack.pop()?;
    stack.is_empty().then_some(operand.fragments)
}

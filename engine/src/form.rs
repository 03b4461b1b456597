//! Editable scan inputs: matrix order, precision, full-graph flag and the
//! coefficient expressions.

use std::collections::BTreeMap;

use detscan_eval::{Evaluator, Expr, ExprError};
use detscan_types::{
    CellLabel, CoefficientSet, DEFAULT_EXPRESSION, InputSnapshot, MatrixOrder, Precision,
};

use crate::input::DraftInput;
use crate::validation::{CellCheck, check_expression};

/// Focusable form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Order,
    Precision,
    FullGraph,
    Cell(CellLabel),
}

/// One coefficient input with its latest validation result.
#[derive(Debug, Clone)]
pub struct CoefficientField {
    input: DraftInput,
    check: CellCheck,
    preview: Option<Expr>,
}

impl CoefficientField {
    fn new(evaluator: &Evaluator, text: &str) -> Self {
        let mut field = Self {
            input: DraftInput::with_text(text),
            check: check_expression(evaluator, DEFAULT_EXPRESSION),
            preview: None,
        };
        field.revalidate(evaluator);
        field
    }

    fn revalidate(&mut self, evaluator: &Evaluator) {
        let text = self.input.text();
        let text = if text.trim().is_empty() {
            DEFAULT_EXPRESSION
        } else {
            text
        };
        self.check = check_expression(evaluator, text);
        if let CellCheck::Valid { expr } = &self.check {
            self.preview = Some(expr.clone());
        }
    }

    #[must_use]
    pub fn input(&self) -> &DraftInput {
        &self.input
    }

    #[must_use]
    pub fn check(&self) -> &CellCheck {
        &self.check
    }

    /// The current expression, or the last valid one while the current text
    /// does not parse.
    #[must_use]
    pub fn preview(&self) -> Option<&Expr> {
        self.preview.as_ref()
    }
}

/// Defaults applied before any saved snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormDefaults {
    pub order: MatrixOrder,
    pub precision: Precision,
    pub full_graph: bool,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            order: MatrixOrder::default(),
            precision: Precision::default(),
            full_graph: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    order: MatrixOrder,
    precision: Precision,
    full_graph: bool,
    fields: BTreeMap<CellLabel, CoefficientField>,
    focus: Focus,
}

impl Form {
    #[must_use]
    pub fn new(evaluator: &Evaluator, defaults: FormDefaults) -> Self {
        let fields = CellLabel::ALL
            .into_iter()
            .map(|cell| (cell, CoefficientField::new(evaluator, "")))
            .collect();
        Self {
            order: defaults.order,
            precision: defaults.precision,
            full_graph: defaults.full_graph,
            fields,
            focus: Focus::Cell(CellLabel::R11),
        }
    }

    #[must_use]
    pub fn order(&self) -> MatrixOrder {
        self.order
    }

    #[must_use]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[must_use]
    pub fn full_graph(&self) -> bool {
        self.full_graph
    }

    #[must_use]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_order(&mut self, order: MatrixOrder) {
        self.order = order;
        if let Focus::Cell(cell) = self.focus
            && !order.contains(cell)
        {
            self.focus = Focus::Order;
        }
    }

    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
    }

    pub fn set_full_graph(&mut self, full_graph: bool) {
        self.full_graph = full_graph;
    }

    /// Field for `cell`. Every cell has one, whether or not the order reads it.
    #[must_use]
    pub fn field(&self, cell: CellLabel) -> Option<&CoefficientField> {
        self.fields.get(&cell)
    }

    /// Focus targets in tab order: the three settings, then the order's cells.
    #[must_use]
    pub fn focus_ring(&self) -> Vec<Focus> {
        let mut ring = vec![Focus::Order, Focus::Precision, Focus::FullGraph];
        ring.extend(self.order.cells().iter().map(|&cell| Focus::Cell(cell)));
        ring
    }

    pub fn focus_next(&mut self) {
        self.step_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.step_focus(-1);
    }

    fn step_focus(&mut self, delta: isize) {
        let ring = self.focus_ring();
        let current = ring.iter().position(|&f| f == self.focus).unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(ring.len() as isize) as usize;
        self.focus = ring[next];
    }

    /// Apply `edit` to the focused coefficient and revalidate it. Returns
    /// false when focus is not on a coefficient.
    pub fn edit_focused(
        &mut self,
        evaluator: &Evaluator,
        edit: impl FnOnce(&mut DraftInput),
    ) -> bool {
        let Focus::Cell(cell) = self.focus else {
            return false;
        };
        match self.fields.get_mut(&cell) {
            Some(field) => {
                edit(&mut field.input);
                field.revalidate(evaluator);
                true
            }
            None => false,
        }
    }

    /// Replace the text of `cell` and revalidate it.
    pub fn set_coefficient(&mut self, evaluator: &Evaluator, cell: CellLabel, text: &str) {
        if let Some(field) = self.fields.get_mut(&cell) {
            field.input.set_text(text);
            field.revalidate(evaluator);
        }
    }

    /// Raw coefficient text of every non-blank cell.
    #[must_use]
    pub fn coefficients(&self) -> CoefficientSet {
        self.fields
            .iter()
            .filter(|(_, field)| !field.input.text().trim().is_empty())
            .map(|(&cell, field)| (cell, field.input.text()))
            .collect()
    }

    /// First cell read by the current order whose expression does not validate.
    #[must_use]
    pub fn first_invalid(&self) -> Option<(CellLabel, &ExprError)> {
        self.order.cells().iter().find_map(|&cell| {
            self.fields
                .get(&cell)
                .and_then(|field| field.check.error())
                .map(|err| (cell, err))
        })
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.first_invalid().is_none()
    }

    #[must_use]
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            coefficients: self.coefficients(),
            size: Some(self.order),
            approximation: Some(self.precision),
            fullgraph: Some(self.full_graph),
        }
    }

    /// Restore whatever `snapshot` carries; absent fields keep current values.
    pub fn apply_snapshot(&mut self, evaluator: &Evaluator, snapshot: &InputSnapshot) {
        for (cell, text) in snapshot.coefficients.iter() {
            self.set_coefficient(evaluator, cell, text);
        }
        if let Some(order) = snapshot.size {
            self.set_order(order);
        }
        if let Some(precision) = snapshot.approximation {
            self.precision = precision;
        }
        if let Some(full_graph) = snapshot.fullgraph {
            self.full_graph = full_graph;
        }
    }
}

//! Application state: the form, the active scan and what it has produced.
//!
//! The frame loop calls [`App::tick`] once per frame; each call advances the
//! active scan by one tick. Every path that ends a scan goes through
//! `finish_scan`, which drops the session and so unlocks the inputs.

use std::sync::Arc;

use detscan_eval::{Evaluator, ExprError, RegistryError};
use detscan_types::{CellLabel, MatrixOrder, Precision};

use crate::config::{DetscanConfig, UiOptions};
use crate::determinant::{Determinant, EvaluationError};
use crate::form::{Focus, Form, FormDefaults};
use crate::input::DraftInput;
use crate::persistence::SnapshotStore;
use crate::plot::{PlotBuffer, PlotSink};
use crate::scanner::{ScanSession, ScanState};

/// Functions offered for quick insertion, in function-key order.
pub const INSERTABLE_FUNCTIONS: [&str; 6] = ["phi1", "phi2", "phi3", "phi4", "eta1", "eta2"];

/// What the status line reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Ready,
    /// A cell read by the current order does not validate; no scan started.
    Invalid { cell: CellLabel, error: ExprError },
    Scanning,
    Finished(ScanState),
    Failed(EvaluationError),
}

/// Results of the current or most recent scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanReport {
    pub root: Option<f64>,
    pub last_determinant: Option<f64>,
    pub precision: Precision,
    pub progress: f64,
}

impl ScanReport {
    fn empty(precision: Precision) -> Self {
        Self {
            root: None,
            last_determinant: None,
            precision,
            progress: 0.0,
        }
    }

    /// Root with as many decimals as the scan step.
    #[must_use]
    pub fn root_text(&self) -> Option<String> {
        self.root.map(|root| self.precision.format(root))
    }

    #[must_use]
    pub fn last_determinant_text(&self) -> Option<String> {
        self.last_determinant.map(|det| format!("{det:.4}"))
    }
}

/// Left/right adjustment of the focused control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

#[derive(Debug)]
pub struct App {
    evaluator: Arc<Evaluator>,
    form: Form,
    plot: PlotBuffer,
    session: Option<ScanSession>,
    report: ScanReport,
    status: Status,
    store: Option<SnapshotStore>,
    ui: UiOptions,
    should_quit: bool,
}

impl App {
    /// Build the evaluator, apply config defaults, then restore the saved
    /// snapshot if there is one.
    pub fn new(config: &DetscanConfig, store: Option<SnapshotStore>) -> Result<Self, RegistryError> {
        let evaluator = Arc::new(Evaluator::with_domain_functions()?);
        let mut app = Self::with_evaluator(evaluator, config.form_defaults(), store);
        app.ui = config.ui_options();
        Ok(app)
    }

    #[must_use]
    pub fn with_evaluator(
        evaluator: Arc<Evaluator>,
        defaults: FormDefaults,
        store: Option<SnapshotStore>,
    ) -> Self {
        let mut form = Form::new(&evaluator, defaults);
        if let Some(snapshot) = store.as_ref().and_then(SnapshotStore::load) {
            tracing::info!("Restored saved input");
            form.apply_snapshot(&evaluator, &snapshot);
        }
        Self {
            report: ScanReport::empty(form.precision()),
            evaluator,
            form,
            plot: PlotBuffer::new(),
            session: None,
            status: Status::Ready,
            store,
            ui: UiOptions::default(),
            should_quit: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn form(&self) -> &Form {
        &self.form
    }

    #[must_use]
    pub fn plot(&self) -> &PlotBuffer {
        &self.plot
    }

    #[must_use]
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    #[must_use]
    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_calculating(&self) -> bool {
        self.session.is_some()
    }

    /// Inputs are locked exactly while a scan session exists.
    #[must_use]
    pub fn inputs_enabled(&self) -> bool {
        self.session.is_none()
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.cancel();
        }
        self.finish_scan();
        self.should_quit = true;
    }

    // ========================================================================
    // Scan lifecycle
    // ========================================================================

    /// Start a scan with the current form. A scan already running is
    /// cancelled first. Returns false when the form does not validate.
    pub fn calculate(&mut self) -> bool {
        if let Some(session) = self.session.as_mut() {
            session.cancel();
            self.finish_scan();
        }

        if let Some((cell, error)) = self.form.first_invalid() {
            self.status = Status::Invalid {
                cell,
                error: error.clone(),
            };
            return false;
        }

        self.clear();
        self.save_input();

        let determinant = match Determinant::compile(
            &self.evaluator,
            self.form.order().as_u8(),
            &self.form.coefficients(),
        ) {
            Ok(determinant) => determinant,
            Err(err) => {
                self.status = Status::Failed(err);
                return false;
            }
        };

        self.session = Some(ScanSession::new(
            determinant,
            self.form.precision(),
            self.form.full_graph(),
        ));
        self.status = Status::Scanning;
        true
    }

    /// Cancel the running scan, if any.
    pub fn stop_calculation(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.cancel();
            self.finish_scan();
        }
    }

    /// Advance the running scan by one tick.
    pub fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.tick(&mut self.plot) {
            Ok(state) => {
                self.report.root = session.root();
                self.report.last_determinant = Some(session.last_determinant());
                self.report.progress = session.progress();
                if !state.is_running() {
                    self.finish_scan();
                }
            }
            Err(err) => {
                self.status = Status::Failed(err);
                self.finish_scan();
            }
        }
    }

    /// Reset results and the plot.
    pub fn clear(&mut self) {
        self.report = ScanReport::empty(self.form.precision());
        self.plot.reset();
        if !matches!(self.status, Status::Scanning) {
            self.status = Status::Ready;
        }
    }

    fn finish_scan(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.report.root = session.root();
        self.report.progress = session.progress();
        if session.ticks() > 0 {
            self.report.last_determinant = Some(session.last_determinant());
        }
        if session.failure().is_none() {
            self.status = Status::Finished(session.state());
        }
    }

    fn save_input(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&self.form.snapshot()) {
            tracing::warn!("Failed to save input snapshot: {e}");
        }
    }

    // ========================================================================
    // Form editing (no-ops while a scan runs)
    // ========================================================================

    pub fn focus_next(&mut self) {
        if self.inputs_enabled() {
            self.form.focus_next();
        }
    }

    pub fn focus_prev(&mut self) {
        if self.inputs_enabled() {
            self.form.focus_prev();
        }
    }

    pub fn set_order(&mut self, order: MatrixOrder) {
        if self.inputs_enabled() {
            self.form.set_order(order);
        }
    }

    pub fn toggle_full_graph(&mut self) {
        if self.inputs_enabled() {
            self.form.set_full_graph(!self.form.full_graph());
        }
    }

    /// Left/right on the focused control: cycle the order, step the
    /// precision, flip the full-graph flag or move the text cursor.
    pub fn adjust_focused(&mut self, direction: Direction) {
        if !self.inputs_enabled() {
            return;
        }
        let forward = direction == Direction::Forward;
        match self.form.focus() {
            Focus::Order => {
                let order = self.form.order();
                self.form
                    .set_order(if forward { order.next() } else { order.prev() });
            }
            Focus::Precision => {
                let precision = self.form.precision();
                self.form.set_precision(if forward {
                    precision.increment()
                } else {
                    precision.decrement()
                });
            }
            Focus::FullGraph => self.toggle_full_graph(),
            Focus::Cell(_) => {
                self.edit(|input| {
                    if forward {
                        input.move_cursor_right();
                    } else {
                        input.move_cursor_left();
                    }
                });
            }
        }
    }

    pub fn type_char(&mut self, c: char) {
        self.edit(|input| input.enter_char(c));
    }

    pub fn backspace(&mut self) {
        self.edit(DraftInput::delete_char);
    }

    pub fn delete_forward(&mut self) {
        self.edit(DraftInput::delete_char_forward);
    }

    pub fn cursor_home(&mut self) {
        self.edit(DraftInput::move_cursor_home);
    }

    pub fn cursor_end(&mut self) {
        self.edit(DraftInput::move_cursor_end);
    }

    /// Insert `text` at the cursor of the focused coefficient.
    pub fn insert(&mut self, text: &str) -> bool {
        self.edit(|input| input.enter_text(text))
    }

    /// Insert a call to the `index`-th entry of [`INSERTABLE_FUNCTIONS`].
    pub fn insert_function(&mut self, index: usize) -> bool {
        match INSERTABLE_FUNCTIONS.get(index) {
            Some(name) => self.insert(&format!("{name}(v)")),
            None => false,
        }
    }

    /// Replace the text of `cell` wholesale.
    pub fn set_coefficient(&mut self, cell: CellLabel, text: &str) {
        if self.inputs_enabled() {
            self.form.set_coefficient(&self.evaluator, cell, text);
        }
    }

    pub fn set_precision(&mut self, precision: Precision) {
        if self.inputs_enabled() {
            self.form.set_precision(precision);
        }
    }

    fn edit(&mut self, edit: impl FnOnce(&mut DraftInput)) -> bool {
        self.inputs_enabled() && self.form.edit_focused(&self.evaluator, edit)
    }
}

#[cfg(test)]
mod tests {
    use detscan_eval::EvalError;

    use super::*;

    fn app() -> App {
        let evaluator = Arc::new(Evaluator::with_domain_functions().unwrap());
        App::with_evaluator(evaluator, FormDefaults::default(), None)
    }

    fn run_to_end(app: &mut App) -> usize {
        let mut ticks = 0;
        while app.is_calculating() {
            app.tick();
            ticks += 1;
            assert!(ticks < 1000, "scan did not terminate");
        }
        ticks
    }

    #[test]
    fn constant_determinant_exhausts_domain() {
        let mut app = app();
        app.set_coefficient(CellLabel::R11, "2");
        assert!(app.calculate());
        assert!(!app.inputs_enabled());
        assert_eq!(app.status(), &Status::Scanning);

        run_to_end(&mut app);

        assert!(app.inputs_enabled());
        assert_eq!(app.status(), &Status::Finished(ScanState::StoppedByDomain));
        assert_eq!(app.report().root, None);
        assert_eq!(app.report().last_determinant_text().as_deref(), Some("2.0000"));
        assert!(!app.plot().is_empty());
    }

    #[test]
    fn finds_first_root_and_stops_without_full_graph() {
        let mut app = app();
        app.set_coefficient(CellLabel::R11, "v - 1");
        app.toggle_full_graph();
        assert!(!app.form().full_graph());
        assert!(app.calculate());

        run_to_end(&mut app);

        assert_eq!(app.status(), &Status::Finished(ScanState::StoppedByRoot));
        assert_eq!(app.report().root_text().as_deref(), Some("1.00"));
        let last_v = app.plot().last().unwrap().v;
        assert!(last_v < 1.2, "{last_v}");
    }

    #[test]
    fn invalid_form_does_not_start() {
        let mut app = app();
        app.set_coefficient(CellLabel::R11, "v +");
        assert!(!app.calculate());
        assert!(app.inputs_enabled());
        assert!(matches!(
            app.status(),
            Status::Invalid { cell: CellLabel::R11, .. }
        ));
    }

    #[test]
    fn evaluation_failure_unlocks_inputs_and_reports_cell() {
        let mut app = app();
        app.set_order(MatrixOrder::Two);
        app.set_coefficient(CellLabel::R11, "1");
        app.set_coefficient(CellLabel::R22, "sqrt(1 - v)");
        assert!(app.calculate());

        run_to_end(&mut app);

        assert!(app.inputs_enabled());
        let Status::Failed(err) = app.status() else {
            panic!("expected failure, got {:?}", app.status());
        };
        assert_eq!(err.cell, CellLabel::R22);
        assert!(err.at.is_some_and(|v| v > 1.0 && v < 1.02));
        assert!(matches!(err.source, ExprError::Eval(EvalError::NonFinite(_))));
    }

    #[test]
    fn stop_cancels_and_unlocks() {
        let mut app = app();
        app.set_coefficient(CellLabel::R11, "1");
        assert!(app.calculate());
        app.tick();
        let samples = app.plot().len();

        app.stop_calculation();
        assert!(app.inputs_enabled());
        assert_eq!(app.status(), &Status::Finished(ScanState::Cancelled));

        app.tick();
        assert_eq!(app.plot().len(), samples);
    }

    #[test]
    fn restarting_resets_previous_results() {
        let mut app = app();
        app.set_coefficient(CellLabel::R11, "v - 1");
        assert!(app.calculate());
        app.tick();
        assert!(app.calculate());
        assert!(app.plot().is_empty());
        assert_eq!(app.report().root, None);
        assert!(app.is_calculating());
    }

    #[test]
    fn inputs_are_locked_while_scanning() {
        let mut app = app();
        assert!(app.calculate());
        app.type_char('5');
        app.set_order(MatrixOrder::Three);
        assert_eq!(app.form().order(), MatrixOrder::One);
        assert_eq!(
            app.form().field(CellLabel::R11).unwrap().input().text(),
            ""
        );
    }

    #[test]
    fn insert_goes_to_cursor_of_target_cell() {
        let mut app = app();
        app.set_order(MatrixOrder::Two);
        app.set_coefficient(CellLabel::R12, "2*");
        app.focus_next();
        assert_eq!(app.form().focus(), Focus::Cell(CellLabel::R12));
        assert!(app.insert("eta1(v)"));
        assert_eq!(
            app.form().field(CellLabel::R12).unwrap().input().text(),
            "2*eta1(v)"
        );

        app.focus_prev();
        app.focus_prev();
        assert_eq!(app.form().focus(), Focus::FullGraph);
        assert!(!app.insert("x"));

        app.focus_next();
        app.focus_next();
        assert!(app.insert_function(3));
        assert_eq!(
            app.form().field(CellLabel::R12).unwrap().input().text(),
            "2*eta1(v)phi4(v)"
        );
        assert!(!app.insert_function(6));
    }

    #[test]
    fn adjusting_focused_settings() {
        let mut app = app();
        app.focus_prev(); // full graph
        app.adjust_focused(Direction::Forward);
        assert!(!app.form().full_graph());
        app.focus_prev(); // precision
        app.adjust_focused(Direction::Forward);
        assert_eq!(app.form().precision().digits(), 3);
        app.focus_prev(); // order
        app.adjust_focused(Direction::Back);
        assert_eq!(app.form().order(), MatrixOrder::Three);
    }

    #[test]
    fn clear_resets_report_and_plot() {
        let mut app = app();
        app.set_coefficient(CellLabel::R11, "1");
        app.calculate();
        run_to_end(&mut app);
        app.clear();
        assert!(app.plot().is_empty());
        assert_eq!(app.report().last_determinant, None);
        assert_eq!(app.status(), &Status::Ready);
    }

    #[test]
    fn snapshot_is_saved_on_start_and_restored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let evaluator = Arc::new(Evaluator::with_domain_functions().unwrap());

        let mut app = App::with_evaluator(
            Arc::clone(&evaluator),
            FormDefaults::default(),
            Some(SnapshotStore::in_dir(dir.path())),
        );
        app.set_order(MatrixOrder::Two);
        app.set_coefficient(CellLabel::R12, "phi3(v)");
        assert!(app.calculate());

        let restored = App::with_evaluator(
            evaluator,
            FormDefaults::default(),
            Some(SnapshotStore::in_dir(dir.path())),
        );
        assert_eq!(restored.form().order(), MatrixOrder::Two);
        assert_eq!(
            restored.form().field(CellLabel::R12).unwrap().input().text(),
            "phi3(v)"
        );
    }

    #[test]
    fn quitting_ends_the_scan() {
        let mut app = app();
        app.calculate();
        app.request_quit();
        assert!(app.should_quit());
        assert!(app.inputs_enabled());
    }
}

//! Input handling for the detscan TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio::time;
use tracing::debug;

use detscan_engine::{App, Direction, Focus};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking task and hands them to the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = Arc::clone(&stop);

        let join = task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so a backpressured send unblocks.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = time::timeout(SHUTDOWN_TIMEOUT, join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending input into `app`. Returns `true` when the app should exit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

/// Apply one terminal event. Returns `true` when the app should exit.
pub fn apply_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            if matches!(key.kind, KeyEventKind::Release) {
                return app.should_quit();
            }
            handle_key(app, key);
        }
        Event::Paste(text) => {
            // Coefficients are single-line.
            let line: String = text.chars().filter(|c| !c.is_control()).collect();
            app.insert(&line);
        }
        _ => {}
    }
    app.should_quit()
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => app.request_quit(),
        KeyCode::Char('l') if ctrl => {
            if app.inputs_enabled() {
                app.clear();
            }
        }
        KeyCode::Esc => app.stop_calculation(),
        KeyCode::Enter => {
            if !app.calculate() {
                debug!(status = ?app.status(), "Scan not started");
            }
        }
        KeyCode::Tab | KeyCode::Down => app.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.focus_prev(),
        KeyCode::Left => app.adjust_focused(Direction::Back),
        KeyCode::Right => app.adjust_focused(Direction::Forward),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete_forward(),
        KeyCode::F(n @ 1..=6) => {
            app.insert_function(usize::from(n - 1));
        }
        KeyCode::Char(' ') if !matches!(app.form().focus(), Focus::Cell(_)) => {
            app.toggle_full_graph();
        }
        KeyCode::Char(c) if !ctrl => app.type_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use detscan_engine::{CellLabel, Evaluator, FormDefaults, MatrixOrder, ScanState, Status};

    use super::*;

    fn app() -> App {
        let evaluator = Arc::new(Evaluator::with_domain_functions().unwrap());
        App::with_evaluator(evaluator, FormDefaults::default(), None)
    }

    fn key(code: KeyCode) -> Event {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            apply_event(app, key(KeyCode::Char(c)));
        }
    }

    fn cell_text(app: &App, cell: CellLabel) -> String {
        app.form().field(cell).unwrap().input().text().to_string()
    }

    #[test]
    fn typing_edits_focused_cell() {
        let mut app = app();
        type_text(&mut app, "v - 1");
        assert_eq!(cell_text(&app, CellLabel::R11), "v - 1");

        apply_event(&mut app, key(KeyCode::Backspace));
        apply_event(&mut app, key(KeyCode::Home));
        apply_event(&mut app, key(KeyCode::Delete));
        assert_eq!(cell_text(&app, CellLabel::R11), " - ");
    }

    #[test]
    fn function_keys_insert_at_cursor() {
        let mut app = app();
        type_text(&mut app, "2*");
        apply_event(&mut app, key(KeyCode::F(5)));
        assert_eq!(cell_text(&app, CellLabel::R11), "2*eta1(v)");

        apply_event(&mut app, key(KeyCode::Home));
        apply_event(&mut app, key(KeyCode::F(1)));
        assert_eq!(cell_text(&app, CellLabel::R11), "phi1(v)2*eta1(v)");
    }

    #[test]
    fn arrows_adjust_settings_and_space_toggles_full_graph() {
        let mut app = app();
        // R11 -> FullGraph -> Precision -> Order
        apply_event(&mut app, key(KeyCode::BackTab));
        apply_event(&mut app, key(KeyCode::Char(' ')));
        assert!(!app.form().full_graph());

        apply_event(&mut app, key(KeyCode::Up));
        apply_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.form().precision().digits(), 3);

        apply_event(&mut app, key(KeyCode::Up));
        apply_event(&mut app, key(KeyCode::Right));
        assert_eq!(app.form().order(), MatrixOrder::Two);
    }

    #[test]
    fn space_inside_a_cell_is_text() {
        let mut app = app();
        type_text(&mut app, "1 + v");
        assert_eq!(cell_text(&app, CellLabel::R11), "1 + v");
        assert!(app.form().full_graph());
    }

    #[test]
    fn enter_starts_and_escape_stops() {
        let mut app = app();
        type_text(&mut app, "1");
        apply_event(&mut app, key(KeyCode::Enter));
        assert!(app.is_calculating());

        type_text(&mut app, "9");
        assert_eq!(cell_text(&app, CellLabel::R11), "1");

        apply_event(&mut app, key(KeyCode::Esc));
        assert!(!app.is_calculating());
        assert_eq!(app.status(), &Status::Finished(ScanState::Cancelled));
    }

    #[test]
    fn paste_inserts_single_line() {
        let mut app = app();
        apply_event(&mut app, Event::Paste("phi2(v)\n+ 1".to_string()));
        assert_eq!(cell_text(&app, CellLabel::R11), "phi2(v)+ 1");
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = app();
        assert!(!apply_event(&mut app, key(KeyCode::Char('x'))));
        assert!(apply_event(
            &mut app,
            key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
        assert!(app.should_quit());
        assert_eq!(cell_text(&app, CellLabel::R11), "x");
    }

    #[tokio::test]
    async fn handle_events_reports_empty_queue() {
        let (_tx, rx) = mpsc::channel(4);
        let mut pump = InputPump {
            rx,
            stop: Arc::new(AtomicBool::new(true)),
            join: None,
        };
        let mut app = app();
        assert!(!handle_events(&mut app, &mut pump).unwrap());
    }

    #[tokio::test]
    async fn handle_events_applies_queued_keys() {
        let (tx, rx) = mpsc::channel(4);
        let mut pump = InputPump {
            rx,
            stop: Arc::new(AtomicBool::new(true)),
            join: None,
        };
        tx.send(InputMsg::Event(key(KeyCode::Char('v')))).await.unwrap();
        tx.send(InputMsg::Event(key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)))
            .await
            .unwrap();

        let mut app = app();
        assert!(handle_events(&mut app, &mut pump).unwrap());
        assert_eq!(cell_text(&app, CellLabel::R11), "v");
    }
}

//! TUI rendering for detscan using ratatui.

mod format;
mod input;
mod theme;

pub use input::{InputPump, apply_event, handle_events};
pub use theme::{GLYPHS, Glyphs, Palette, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Padding, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use detscan_engine::{
    App, CellCheck, CellLabel, CoefficientField, Focus, MatrixOrder, PLOT_X_BOUNDS,
    PLOT_Y_BOUNDS, Status,
};

use self::format::{preview_spans, pretty_expression, truncate_with_ellipsis};

const FORM_WIDTH: u16 = 46;
/// Columns taken by `"▸ r11 = "` in front of each coefficient input.
const CELL_PREFIX_WIDTH: u16 = 8;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let palette = palette(app.ui_options());
    let glyphs = GLYPHS;
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),    // Form + plot
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FORM_WIDTH), Constraint::Min(10)])
        .split(chunks[0]);

    draw_form(frame, app, main[0], &palette, &glyphs);
    draw_plot(frame, app, main[1], &palette);
    draw_status_bar(frame, app, chunks[1], &palette);
    draw_key_hints(frame, chunks[2], &palette);
}

// ============================================================================
// Form
// ============================================================================

fn draw_form(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let form = app.form();
    let enabled = app.inputs_enabled();
    let focus = form.focus();

    let title = if enabled {
        " Determinant ".to_string()
    } else {
        format!(" Determinant {} ", glyphs.locked)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel))
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        setting_line(
            "Order",
            &format!(
                "{} {} {}",
                glyphs.arrow_left,
                form.order(),
                glyphs.arrow_right
            ),
            focus == Focus::Order,
            enabled,
            palette,
            glyphs,
        ),
        setting_line(
            "Step",
            &format!(
                "{} {} {}",
                glyphs.arrow_left,
                form.precision().format(form.precision().step()),
                glyphs.arrow_right
            ),
            focus == Focus::Precision,
            enabled,
            palette,
            glyphs,
        ),
        setting_line(
            "Full graph",
            if form.full_graph() {
                glyphs.checked
            } else {
                glyphs.unchecked
            },
            focus == Focus::FullGraph,
            enabled,
            palette,
            glyphs,
        ),
        Line::default(),
    ];
    lines.extend(matrix_lines(form.order(), palette));
    lines.push(Line::default());

    let value_width = usize::from(inner.width.saturating_sub(CELL_PREFIX_WIDTH + 2));
    let mut cursor = None;
    for &cell in form.order().cells() {
        let Some(field) = form.field(cell) else {
            continue;
        };
        let focused = focus == Focus::Cell(cell);
        let (text, caret_col) = scroll_input(field, value_width);
        if focused && enabled {
            let row = u16::try_from(lines.len()).unwrap_or(u16::MAX);
            let col = u16::try_from(caret_col).unwrap_or(u16::MAX);
            cursor = Some((
                inner.x.saturating_add(CELL_PREFIX_WIDTH).saturating_add(col),
                inner.y.saturating_add(row),
            ));
        }
        lines.push(cell_line(cell, &text, field, focused, enabled, palette, glyphs));
        lines.push(preview_line(field, inner.width, palette));
    }

    frame.render_widget(Paragraph::new(lines), inner);

    if let Some((x, y)) = cursor
        && y < inner.y.saturating_add(inner.height)
        && x < inner.x.saturating_add(inner.width)
    {
        frame.set_cursor_position((x, y));
    }
}

fn marker<'a>(focused: bool, palette: &Palette, glyphs: &Glyphs) -> Span<'a> {
    if focused {
        Span::styled(
            format!("{} ", glyphs.selected),
            Style::default().fg(palette.primary),
        )
    } else {
        Span::raw("  ")
    }
}

fn setting_line<'a>(
    label: &str,
    value: &str,
    focused: bool,
    enabled: bool,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Line<'a> {
    let label_style = if focused {
        styles::focused_label(palette)
    } else {
        styles::label(palette)
    };
    Line::from(vec![
        marker(focused, palette, glyphs),
        Span::styled(format!("{label:<11}"), label_style),
        Span::styled(value.to_string(), styles::field(palette, focused, enabled)),
    ])
}

/// Shape of the symmetric matrix; mirrored entries are dimmed.
fn matrix_lines<'a>(order: MatrixOrder, palette: &Palette) -> Vec<Line<'a>> {
    let n = usize::from(order.as_u8());
    let stored = Style::default().fg(palette.text_secondary);
    let mirrored = Style::default().fg(palette.text_muted);
    let bracket = Style::default().fg(palette.bg_border);

    (0..n)
        .map(|row| {
            let mut spans = vec![Span::raw("  "), Span::styled("│", bracket)];
            for col in 0..n {
                let (r, c) = if row <= col { (row, col) } else { (col, row) };
                let style = if row <= col { stored } else { mirrored };
                spans.push(Span::styled(format!(" r{}{}", r + 1, c + 1), style));
            }
            spans.push(Span::styled(" │", bracket));
            Line::from(spans)
        })
        .collect()
}

/// Visible slice of a coefficient input and the caret column within it.
///
/// The caret stays on screen: once the text before it is wider than
/// `width`, the slice starts late enough to keep it in the last column.
fn scroll_input(field: &CoefficientField, width: usize) -> (String, usize) {
    let (before, after) = field.input().split_at_cursor();
    let before_width = before.width();
    if before_width < width {
        let full = format!("{before}{after}");
        return (truncate_with_ellipsis(&full, width), before_width);
    }

    let skip = before_width + 1 - width;
    let mut skipped = 0;
    let mut start = before.len();
    for (i, c) in before.char_indices() {
        if skipped >= skip {
            start = i;
            break;
        }
        skipped += c.width().unwrap_or(0);
    }
    let tail = &before[start..];
    (tail.to_string(), tail.width())
}

fn cell_line<'a>(
    cell: CellLabel,
    text: &str,
    field: &CoefficientField,
    focused: bool,
    enabled: bool,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Line<'a> {
    let label_style = if focused {
        styles::focused_label(palette)
    } else {
        styles::label(palette)
    };
    let (mark, mark_style) = if field.check().is_valid() {
        (glyphs.valid, Style::default().fg(palette.success))
    } else {
        (glyphs.invalid, Style::default().fg(palette.error))
    };
    Line::from(vec![
        marker(focused, palette, glyphs),
        Span::styled(format!("r{cell} = "), label_style),
        Span::styled(text.to_string(), styles::field(palette, focused, enabled)),
        Span::raw(" "),
        Span::styled(mark, mark_style),
    ])
}

/// The pretty-printed expression. While the text is invalid: the error, after
/// the last valid expression when both fit.
fn preview_line<'a>(field: &CoefficientField, width: u16, palette: &Palette) -> Line<'a> {
    let indent = Span::raw("        ");
    let available = usize::from(width.saturating_sub(CELL_PREFIX_WIDTH));
    match field.check() {
        CellCheck::Valid { expr } => {
            let pretty = pretty_expression(expr);
            if pretty.width() <= available {
                let mut spans = vec![indent];
                spans.extend(preview_spans(expr, palette));
                Line::from(spans)
            } else {
                Line::from(vec![
                    indent,
                    Span::styled(
                        truncate_with_ellipsis(&pretty, available),
                        Style::default().fg(palette.text_secondary),
                    ),
                ])
            }
        }
        CellCheck::Invalid(error) => {
            let error = error.to_string();
            let error_style = Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::ITALIC);
            let last = field.preview().map(pretty_expression);
            match last {
                Some(last) if last.width() + 3 + error.width() <= available => Line::from(vec![
                    indent,
                    Span::styled(last, Style::default().fg(palette.text_muted)),
                    Span::styled(" · ", Style::default().fg(palette.text_muted)),
                    Span::styled(error, error_style),
                ]),
                _ => Line::from(vec![
                    indent,
                    Span::styled(truncate_with_ellipsis(&error, available), error_style),
                ]),
            }
        }
    }
}

// ============================================================================
// Plot
// ============================================================================

fn draw_plot(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let [x_min, x_max] = PLOT_X_BOUNDS;
    let [y_min, y_max] = PLOT_Y_BOUNDS;
    let zero = [(x_min, 0.0), (x_max, 0.0)];

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.axis))
            .data(&zero),
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.curve))
            .data(app.plot().points()),
    ];

    let axis_style = Style::default().fg(palette.text_muted);
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Plot ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(palette.bg_border))
                .style(Style::default().bg(palette.bg_panel)),
        )
        .x_axis(
            Axis::default()
                .title("v")
                .style(axis_style)
                .bounds(PLOT_X_BOUNDS)
                .labels(["0", "π", "2π"]),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds(PLOT_Y_BOUNDS)
                .labels([format!("{y_min}"), "0".to_string(), format!("{y_max}")]),
        );
    frame.render_widget(chart, area);
}

// ============================================================================
// Status and hints
// ============================================================================

fn status_text(app: &App) -> (String, bool) {
    match app.status() {
        Status::Ready => ("Ready".to_string(), false),
        Status::Invalid { cell, error } => (format!("r{cell} is invalid: {error}"), true),
        Status::Scanning => {
            let ticks = app.session().map_or(0, |session| session.ticks());
            let v = app.session().map_or(0.0, |session| session.position());
            (
                format!(
                    "{} Scanning v = {v:.2} ({:.0}%)",
                    spinner_frame(ticks),
                    app.report().progress * 100.0
                ),
                false,
            )
        }
        Status::Finished(state) => {
            let label = state.label();
            let mut chars = label.chars();
            let text = chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default();
            (text, false)
        }
        Status::Failed(error) => (format!("Evaluation failed in {error}"), true),
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let (text, is_error) = status_text(app);
    let status_style = if is_error {
        Style::default().fg(palette.error)
    } else if app.is_calculating() {
        Style::default().fg(palette.primary)
    } else {
        Style::default().fg(palette.success)
    };

    let report = app.report();
    let value_style = Style::default().fg(palette.text_primary);
    let label_style = Style::default().fg(palette.text_muted);
    let root = report.root_text().unwrap_or_else(|| "—".to_string());
    let last = report
        .last_determinant_text()
        .unwrap_or_else(|| "—".to_string());

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(text, status_style),
        Span::styled(" │ Root: ", label_style),
        Span::styled(root, value_style.add_modifier(Modifier::BOLD)),
        Span::styled(" │ Last det: ", label_style),
        Span::styled(last, value_style),
    ]));
    frame.render_widget(status, area);
}

fn draw_key_hints(frame: &mut Frame, area: Rect, palette: &Palette) {
    let pairs = [
        ("Enter", "scan"),
        ("Esc", "stop"),
        ("Tab", "focus"),
        ("←/→", "adjust"),
        ("Space", "full graph"),
        ("F1-F6", "φ₁ φ₂ φ₃ φ₄ η₁ η₂"),
        ("Ctrl+L", "clear"),
        ("Ctrl+C", "quit"),
    ];
    let mut spans = vec![Span::raw(" ")];
    for (key, action) in pairs {
        spans.push(Span::styled(key, styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}  "), styles::key_hint(palette)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

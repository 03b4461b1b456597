use std::mem;

use ratatui::{style::Style, text::Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use detscan_engine::detscan_eval::{Expr, Fragment};

use crate::theme::Palette;

/// Display name of a domain function, if `name` is one.
fn greek_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "phi1" => "φ₁",
        "phi2" => "φ₂",
        "phi3" => "φ₃",
        "phi4" => "φ₄",
        "eta1" => "η₁",
        "eta2" => "η₂",
        _ => return None,
    })
}

fn display_text(fragment: &Fragment) -> &str {
    match fragment {
        Fragment::Function(name) => greek_name(name).unwrap_or(name.as_str()),
        Fragment::Text(text) => text.as_str(),
    }
}

/// Rendered expression with domain functions written as `φ₁`..`η₂`.
pub(crate) fn pretty_expression(expr: &Expr) -> String {
    expr.fragments().iter().map(display_text).collect()
}

/// Styled preview: domain functions in the accent color, the rest plain.
pub(crate) fn preview_spans<'a>(expr: &Expr, palette: &Palette) -> Vec<Span<'a>> {
    let normal = Style::default().fg(palette.text_secondary);
    let function = Style::default().fg(palette.accent);

    let mut spans: Vec<Span<'a>> = Vec::new();
    let mut plain = String::new();
    for fragment in expr.fragments() {
        let greek = match fragment {
            Fragment::Function(name) => greek_name(name),
            Fragment::Text(_) => None,
        };
        match greek {
            Some(greek) => {
                if !plain.is_empty() {
                    spans.push(Span::styled(mem::take(&mut plain), normal));
                }
                spans.push(Span::styled(greek, function));
            }
            None => plain.push_str(display_text(fragment)),
        }
    }
    if !plain.is_empty() {
        spans.push(Span::styled(plain, normal));
    }
    spans
}

/// Cut `raw` to at most `max` columns, ending in `…` when shortened.
pub(crate) fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    if raw.width() <= max {
        return raw.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in raw.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

//! UI module: View components for the TUI.

pub mod dashboard;
pub mod explore;
pub mod prediction;
pub mod sample;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::AgroTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "NOTE: Recommendations are model estimates and do not replace a soil test or local agronomic advice.",
            AgroTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Inputs outside the training ranges are accepted but flagged.",
            AgroTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(AgroTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Screen header: title plus a muted subtitle.
pub fn render_header(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", AgroTheme::text()),
        Span::styled(title.to_string(), AgroTheme::title()),
        Span::styled(format!(" │ {subtitle}"), AgroTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(AgroTheme::border()),
    );

    f.render_widget(header, area);
}

/// Footer with `[key] description` hints.
pub fn render_key_hints(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), AgroTheme::key_hint()),
                Span::styled(format!("{desc} "), AgroTheme::key_desc()),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(AgroTheme::border()),
    );

    f.render_widget(footer, area);
}

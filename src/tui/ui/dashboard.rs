//! Dashboard view: Home screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::render_header;
use crate::domain::CropCatalog;
use crate::tui::styles::AgroTheme;

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub model_loaded: bool,
    /// Why the model is unavailable, when it is
    pub model_error: Option<String>,
    pub label_space: Vec<String>,
    pub dataset_rows: Option<usize>,
    pub dataset_crops: Option<usize>,
    pub dataset_error: Option<String>,
    /// Last recommendation: crop and confidence
    pub last_recommendation: Option<(String, f64)>,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState, catalog: &CropCatalog) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0], "Cropsense", "Crop Recommendation");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Status panels
            Constraint::Percentage(60), // Label space
        ])
        .split(chunks[1]);

    render_status_panels(f, columns[0], state, catalog);
    render_label_space(f, columns[1], state, catalog);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState, catalog: &CropCatalog) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // System status
            Constraint::Min(0),    // Quick actions
        ])
        .margin(1)
        .split(area);

    let mut status_items = vec![
        format_status_item("Model Loaded", state.model_loaded),
        format_status_item("Dataset Loaded", state.dataset_rows.is_some()),
    ];

    if let (Some(rows), Some(crops)) = (state.dataset_rows, state.dataset_crops) {
        status_items.push(Line::from(vec![
            Span::styled("  Dataset: ", AgroTheme::text_secondary()),
            Span::styled(format!("{rows} rows, {crops} crops"), AgroTheme::text()),
        ]));
    }

    match &state.last_recommendation {
        Some((crop, confidence)) => status_items.push(Line::from(vec![
            Span::styled("  Last: ", AgroTheme::text_secondary()),
            Span::styled(catalog.display_name(crop), AgroTheme::text()),
            Span::styled(
                format!(" ({:.1}%)", confidence * 100.0),
                AgroTheme::confidence(*confidence),
            ),
        ])),
        None => status_items.push(Line::from(vec![
            Span::styled("  Last: ", AgroTheme::text_secondary()),
            Span::styled("none yet", AgroTheme::text_muted()),
        ])),
    }

    let status_block = Block::default()
        .title(Span::styled(" System Status ", AgroTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    f.render_widget(Paragraph::new(status_items).block(status_block), chunks[0]);

    let mut actions = vec![
        Line::from(vec![
            Span::styled("[N] ", AgroTheme::key_hint()),
            Span::styled("New Sample", AgroTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[E] ", AgroTheme::key_hint()),
            Span::styled("Explore Dataset", AgroTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", AgroTheme::key_hint()),
            Span::styled("Quit", AgroTheme::key_desc()),
        ]),
    ];

    for error in [&state.model_error, &state.dataset_error].into_iter().flatten() {
        actions.push(Line::from(""));
        actions.push(Line::from(Span::styled(
            format!("! {error}"),
            AgroTheme::danger(),
        )));
    }

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", AgroTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    f.render_widget(
        Paragraph::new(actions)
            .block(actions_block)
            .wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn format_status_item(label: &str, ok: bool) -> Line<'static> {
    let (icon, style) = if ok {
        ("OK", AgroTheme::success())
    } else {
        ("FAIL", AgroTheme::danger())
    };

    Line::from(vec![
        Span::styled(format!("  {icon} "), style),
        Span::styled(label.to_string(), AgroTheme::text()),
    ])
}

fn render_label_space(f: &mut Frame, area: Rect, state: &DashboardState, catalog: &CropCatalog) {
    let block = Block::default()
        .title(Span::styled(
            format!(" Crops the Model Knows ({}) ", state.label_space.len()),
            AgroTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    if state.label_space.is_empty() {
        let empty_msg = Paragraph::new(Line::from(vec![Span::styled(
            "No model loaded. Set CROPSENSE_MODEL_DIR to a directory with model.json.",
            AgroTheme::text_muted(),
        )]))
        .wrap(Wrap { trim: true })
        .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    // Two crops per line
    let lines: Vec<Line> = state
        .label_space
        .chunks(2)
        .map(|pair| {
            Line::from(
                pair.iter()
                    .map(|crop| {
                        Span::styled(format!("{:<22}", catalog.display_name(crop)), AgroTheme::text())
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

//! Recommendation result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::{render_header, render_key_hints};
use crate::domain::{CropCatalog, PredictionResult, RangeWarning};
use crate::tui::styles::AgroTheme;

/// Prediction screen state
#[derive(Debug, Clone, Default)]
pub enum PredictionState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Completed with result
    Complete {
        result: PredictionResult,
        warnings: Vec<RangeWarning>,
    },
    /// Error occurred
    Error { message: String },
}

/// Render the prediction view
pub fn render_prediction(
    f: &mut Frame,
    area: Rect,
    state: &PredictionState,
    catalog: &CropCatalog,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "Recommendation", "Top crops for this sample");

    match state {
        PredictionState::Idle => render_idle(f, chunks[1]),
        PredictionState::Complete { result, warnings } => {
            render_result(f, chunks[1], result, warnings, catalog)
        }
        PredictionState::Error { message } => render_error(f, chunks[1], message),
    }

    let hints: &[(&str, &str)] = match state {
        PredictionState::Error { .. } => &[("Enter", "Edit Sample"), ("Esc", "Home")],
        _ => &[("Enter", "Edit Sample"), ("N", "New Sample"), ("Esc", "Home")],
    };
    render_key_hints(f, chunks[2], hints);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No sample submitted yet",
            AgroTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter soil and climate readings to begin",
            AgroTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(AgroTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result(
    f: &mut Frame,
    area: Rect,
    result: &PredictionResult,
    warnings: &[RangeWarning],
    catalog: &CropCatalog,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .margin(1)
        .split(area);

    render_top_crop(f, columns[0], result, warnings, catalog);
    render_ranking(f, columns[1], result, catalog);
}

fn render_top_crop(
    f: &mut Frame,
    area: Rect,
    result: &PredictionResult,
    warnings: &[RangeWarning],
    catalog: &CropCatalog,
) {
    let block = Block::default()
        .title(Span::styled(" Recommended Crop ", AgroTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Crop
            Constraint::Length(3), // Confidence
            Constraint::Min(0),    // Notes
        ])
        .margin(1)
        .split(inner);

    let crop = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", catalog.display_name(&result.crop)),
        AgroTheme::highlight(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(crop, chunks[0]);

    let confidence = result.confidence();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Confidence ", AgroTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(AgroTheme::border()),
        )
        .gauge_style(AgroTheme::confidence(confidence))
        .percent((confidence * 100.0).clamp(0.0, 100.0) as u16)
        .label(format!("{:.2}%", confidence * 100.0));
    f.render_widget(gauge, chunks[1]);

    let mut notes = Vec::new();
    if !result.consistent {
        notes.push(Line::from(Span::styled(
            "! Classifier label disagrees with its probabilities",
            AgroTheme::danger(),
        )));
    }
    if warnings.is_empty() {
        notes.push(Line::from(Span::styled(
            "All readings within observed ranges",
            AgroTheme::success(),
        )));
    } else {
        notes.push(Line::from(Span::styled(
            "Outside observed ranges (low confidence possible):",
            AgroTheme::warning(),
        )));
        notes.extend(warnings.iter().map(|w| {
            Line::from(Span::styled(format!("  {w}"), AgroTheme::text_secondary()))
        }));
    }

    f.render_widget(Paragraph::new(notes).wrap(Wrap { trim: true }), chunks[2]);
}

fn render_ranking(f: &mut Frame, area: Rect, result: &PredictionResult, catalog: &CropCatalog) {
    let block = Block::default()
        .title(Span::styled(
            format!(" Top {} Crops ", result.ranking.len()),
            AgroTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let constraints: Vec<Constraint> = result
        .ranking
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    for (i, entry) in result.ranking.iter().enumerate() {
        let title_style = if entry.index == result.crop_index {
            AgroTheme::focused().add_modifier(Modifier::BOLD)
        } else {
            AgroTheme::text_secondary()
        };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(
                        format!(" {}. {} ", i + 1, catalog.display_name(&entry.label)),
                        title_style,
                    ))
                    .borders(Borders::ALL)
                    .border_style(AgroTheme::border()),
            )
            .gauge_style(AgroTheme::info())
            .percent((entry.probability * 100.0).clamp(0.0, 100.0) as u16)
            .label(format!("{:.2}%", entry.probability * 100.0));
        f.render_widget(gauge, rows[i]);
    }
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Recommendation unavailable", AgroTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, AgroTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(AgroTheme::danger()),
    );

    f.render_widget(content, area);
}

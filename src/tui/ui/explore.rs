//! Dataset exploration view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::{render_header, render_key_hints};
use crate::application::{DatasetSummary, Histogram};
use crate::domain::{CropCatalog, RAW_FEATURE_NAMES};
use crate::tui::styles::AgroTheme;

/// Which half of the explore screen is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExploreView {
    #[default]
    Overview,
    Dataset,
}

/// Explore screen state
#[derive(Default)]
pub struct ExploreState {
    pub summary: Option<DatasetSummary>,
    pub source: String,
    pub error: Option<String>,
    pub view: ExploreView,
    /// Crop whose median profile is shown
    pub selected_crop: usize,
    /// Raw feature whose histogram is shown
    pub selected_feature: usize,
}

impl ExploreState {
    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ExploreView::Overview => ExploreView::Dataset,
            ExploreView::Dataset => ExploreView::Overview,
        };
    }

    pub fn next_feature(&mut self) {
        self.selected_feature = (self.selected_feature + 1) % RAW_FEATURE_NAMES.len();
    }

    pub fn prev_feature(&mut self) {
        let n = RAW_FEATURE_NAMES.len();
        self.selected_feature = (self.selected_feature + n - 1) % n;
    }

    pub fn next_crop(&mut self) {
        if let Some(summary) = &self.summary {
            if !summary.profiles.is_empty() {
                self.selected_crop = (self.selected_crop + 1) % summary.profiles.len();
            }
        }
    }

    pub fn prev_crop(&mut self) {
        if let Some(summary) = &self.summary {
            let n = summary.profiles.len();
            if n > 0 {
                self.selected_crop = (self.selected_crop + n - 1) % n;
            }
        }
    }
}

/// Render the exploration view
pub fn render_explore(f: &mut Frame, area: Rect, state: &ExploreState, catalog: &CropCatalog) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "Explore", &state.source);

    match (&state.summary, &state.error, state.view) {
        (_, Some(err), _) => render_explore_error(f, chunks[1], err),
        (Some(summary), None, ExploreView::Overview) => {
            render_summary(f, chunks[1], summary, state, catalog);
        }
        (Some(summary), None, ExploreView::Dataset) => {
            render_dataset(f, chunks[1], summary, state.selected_feature, catalog);
        }
        (None, None, _) => render_explore_error(f, chunks[1], "No dataset loaded"),
    }

    let (arrows, tab) = match state.view {
        ExploreView::Overview => ("Crop Profile", "Dataset"),
        ExploreView::Dataset => ("Histogram", "Overview"),
    };
    render_key_hints(
        f,
        chunks[2],
        &[("←→", arrows), ("Tab", tab), ("R", "Reload"), ("Esc", "Back")],
    );
}

fn render_explore_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Cannot Load Dataset", AgroTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, AgroTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(AgroTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_summary(
    f: &mut Frame,
    area: Rect,
    summary: &DatasetSummary,
    state: &ExploreState,
    catalog: &CropCatalog,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(11), Constraint::Min(0)])
        .margin(1)
        .split(area);

    render_feature_table(f, rows[0], summary);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(rows[1]);

    render_crop_counts(f, columns[0], summary, catalog);
    render_correlations(f, columns[1], summary);
    render_profile(f, columns[2], summary, state.selected_crop, catalog);
}

fn render_feature_table(f: &mut Frame, area: Rect, summary: &DatasetSummary) {
    let header = Row::new(["Feature", "Min", "Mean", "Median", "Max", "Std"].map(|h| {
        Cell::from(Span::styled(h, AgroTheme::subtitle()))
    }));

    let body = summary.features.iter().map(|s| {
        Row::new([
            Cell::from(Span::styled(s.name.clone(), AgroTheme::text())),
            Cell::from(format!("{:.2}", s.min)),
            Cell::from(format!("{:.2}", s.mean)),
            Cell::from(format!("{:.2}", s.median)),
            Cell::from(format!("{:.2}", s.max)),
            Cell::from(format!("{:.2}", s.std)),
        ])
        .style(AgroTheme::text_secondary())
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(13),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(Span::styled(
                format!(
                    " {} rows · {} columns · {} crops ",
                    summary.rows, summary.columns, summary.n_crops
                ),
                AgroTheme::subtitle(),
            ))
            .borders(Borders::ALL)
            .border_style(AgroTheme::border()),
    );

    f.render_widget(table, area);
}

fn render_dataset(
    f: &mut Frame,
    area: Rect,
    summary: &DatasetSummary,
    selected_feature: usize,
    catalog: &CropCatalog,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(summary.preview.len() as u16 + 3),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(area);

    render_preview(f, rows[0], summary, catalog);
    if let Some(histogram) = summary.histograms.get(selected_feature) {
        render_histogram(f, rows[1], histogram);
    }
}

fn render_preview(f: &mut Frame, area: Rect, summary: &DatasetSummary, catalog: &CropCatalog) {
    let header = Row::new(
        RAW_FEATURE_NAMES
            .iter()
            .chain(&["label"])
            .map(|h| Cell::from(Span::styled(*h, AgroTheme::subtitle()))),
    );

    let body = summary.preview.iter().map(|row| {
        let mut cells: Vec<Cell> = row
            .sample
            .to_array()
            .iter()
            .map(|v| Cell::from(format!("{v:.2}")))
            .collect();
        cells.push(Cell::from(Span::styled(
            catalog.display_name(&row.label),
            AgroTheme::text(),
        )));
        Row::new(cells).style(AgroTheme::text_secondary())
    });

    let mut widths = vec![Constraint::Length(12); RAW_FEATURE_NAMES.len()];
    widths.push(Constraint::Min(16));

    let table = Table::new(body, widths).header(header).block(
        Block::default()
            .title(Span::styled(
                format!(" First {} of {} rows ", summary.preview.len(), summary.rows),
                AgroTheme::subtitle(),
            ))
            .borders(Borders::ALL)
            .border_style(AgroTheme::border()),
    );

    f.render_widget(table, area);
}

fn render_histogram(f: &mut Frame, area: Rect, histogram: &Histogram) {
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let width = usize::from(area.width.saturating_sub(34)).max(10);

    let lines: Vec<Line> = histogram
        .counts
        .iter()
        .enumerate()
        .map(|(i, count)| {
            let (lo, hi) = histogram.bin_edges(i);
            let filled = count * width / peak;
            Line::from(vec![
                Span::styled(format!("{lo:>9.2} – {hi:<9.2} "), AgroTheme::text_secondary()),
                Span::styled("█".repeat(filled), AgroTheme::focused()),
                Span::styled(format!(" {count}"), AgroTheme::text()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(
            format!(" Distribution: {} ", histogram.name),
            AgroTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_crop_counts(f: &mut Frame, area: Rect, summary: &DatasetSummary, catalog: &CropCatalog) {
    let lines: Vec<Line> = summary
        .crop_counts
        .iter()
        .map(|(crop, count)| {
            Line::from(vec![
                Span::styled(format!("{:<18}", catalog.display_name(crop)), AgroTheme::text()),
                Span::styled(count.to_string(), AgroTheme::text_secondary()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Samples per Crop ", AgroTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_correlations(f: &mut Frame, area: Rect, summary: &DatasetSummary) {
    let lines: Vec<Line> = summary
        .top_correlations
        .iter()
        .map(|pair| {
            Line::from(vec![
                Span::styled(format!("{} ↔ {}: ", pair.a, pair.b), AgroTheme::text()),
                Span::styled(format!("{:+.3}", pair.r), AgroTheme::correlation(pair.r)),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Strongest Correlations ", AgroTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_profile(
    f: &mut Frame,
    area: Rect,
    summary: &DatasetSummary,
    selected: usize,
    catalog: &CropCatalog,
) {
    let Some(profile) = summary.profiles.get(selected) else {
        return;
    };

    let lines: Vec<Line> = summary
        .features
        .iter()
        .zip(profile.medians.iter().zip(&profile.normalized))
        .map(|(stats, (median, norm))| {
            let filled = (norm.clamp(0.0, 1.0) * 20.0).round() as usize;
            Line::from(vec![
                Span::styled(format!("{:<12}", stats.name), AgroTheme::text_secondary()),
                Span::styled("█".repeat(filled), AgroTheme::focused()),
                Span::styled("░".repeat(20 - filled), AgroTheme::text_muted()),
                Span::styled(format!(" {median:.1}"), AgroTheme::text()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(
            format!(
                " Median Profile: {} ({}) ",
                catalog.display_name(&profile.crop),
                profile.count
            ),
            AgroTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(AgroTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

//! Soil sample input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{render_header, render_key_hints};
use crate::domain::SoilSample;
use crate::tui::styles::AgroTheme;

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub value: String,
    /// Value loaded by the sample preset
    pub preset: &'static str,
}

/// Sample form state
pub struct SampleFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

fn field(label: &'static str, hint: &'static str, preset: &'static str) -> FormField {
    FormField {
        label,
        hint,
        value: String::new(),
        preset,
    }
}

impl Default for SampleFormState {
    fn default() -> Self {
        Self {
            fields: vec![
                field("Nitrogen (N)", "kg/ha (0-140)", "50"),
                field("Phosphorus (P)", "kg/ha (5-145)", "50"),
                field("Potassium (K)", "kg/ha (5-205)", "50"),
                field("Temperature", "°C (8-44)", "25"),
                field("Humidity", "% (14-99)", "70"),
                field("pH", "(3.5-9.9)", "6.5"),
                field("Rainfall", "mm (20-300)", "100"),
            ],
            selected_field: 0,
            error_message: None,
        }
    }
}

impl SampleFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' || c == '-' {
            self.fields[self.selected_field].value.push(c);
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.clear();
    }

    /// Parse the fields into a sample.
    ///
    /// Values outside the observed ranges are accepted; only unparseable or
    /// non-finite values are rejected.
    pub fn to_sample(&self) -> Result<SoilSample, String> {
        let values = self
            .fields
            .iter()
            .map(|field| {
                field
                    .value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("{}: Invalid number", field.label))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sample = SoilSample::from_slice(&values)?;
        sample.validate().map_err(|errors| errors.join(", "))?;
        Ok(sample)
    }

    /// Load the preset sample (mid-range values for every reading)
    pub fn load_sample_data(&mut self) {
        for field in &mut self.fields {
            field.value = field.preset.to_string();
        }
        self.error_message = None;
    }
}

/// Render the sample input form
pub fn render_sample_form(f: &mut Frame, area: Rect, state: &SampleFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0], "Soil Sample", "Nutrients and climate");
    render_form_fields(f, chunks[1], state);

    match &state.error_message {
        Some(err) => {
            let footer = Paragraph::new(Line::from(vec![
                Span::styled("! ", AgroTheme::danger()),
                Span::styled(err.clone(), AgroTheme::danger()),
            ]))
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(AgroTheme::border()),
            );
            f.render_widget(footer, chunks[2]);
        }
        None => render_key_hints(
            f,
            chunks[2],
            &[
                ("↑↓", "Navigate"),
                ("Enter", "Recommend"),
                ("S", "Sample Data"),
                ("Esc", "Cancel"),
            ],
        ),
    }
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &SampleFormState) {
    // Soil nutrients on the left, climate on the right
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = 3;
    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (AgroTheme::border_focused(), AgroTheme::focused())
        } else {
            (AgroTheme::border(), AgroTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, AgroTheme::text_muted())
        } else {
            Span::styled(field.value.as_str(), AgroTheme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected {
                Span::styled("▌", AgroTheme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parses_to_sample() {
        let mut state = SampleFormState::default();
        state.load_sample_data();
        let sample = state.to_sample().expect("sample");
        assert_eq!(sample, SoilSample::new(50.0, 50.0, 50.0, 25.0, 70.0, 6.5, 100.0));
    }

    #[test]
    fn test_out_of_range_is_accepted() {
        let mut state = SampleFormState::default();
        state.load_sample_data();
        state.fields[4].value = "150".to_string();
        let sample = state.to_sample().expect("sample");
        assert_eq!(sample.range_warnings().len(), 1);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let mut state = SampleFormState::default();
        state.load_sample_data();
        state.fields[0].value = "1.2.3".to_string();
        let err = state.to_sample().expect_err("must fail");
        assert!(err.starts_with("Nitrogen (N)"));
    }

    #[test]
    fn test_navigation_and_editing() {
        let mut state = SampleFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, 6);
        state.next_field();
        assert_eq!(state.selected_field, 0);

        state.input_char('4');
        state.input_char('x');
        state.input_char('2');
        assert_eq!(state.fields[0].value, "42");
        state.delete_char();
        assert_eq!(state.fields[0].value, "4");
        state.clear_field();
        assert!(state.fields[0].value.is_empty());
    }
}

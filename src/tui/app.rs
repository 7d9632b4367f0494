//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{CsvDataset, ForestPipeline};
use crate::application::{ExplorationService, PredictionService};
use crate::config::Settings;
use crate::domain::{CropCatalog, CropLabelEncoder};

use super::ui::{
    dashboard::{render_dashboard, DashboardState},
    explore::{render_explore, ExploreState, ExploreView},
    prediction::{render_prediction, PredictionState},
    render_disclaimer,
    sample::{render_sample_form, SampleFormState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    SampleForm,
    Prediction,
    Explore,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    prediction_service: PredictionService<ForestPipeline, CropLabelEncoder>,
    exploration_service: ExplorationService<CsvDataset>,
    catalog: CropCatalog,

    dashboard_state: DashboardState,
    sample_form_state: SampleFormState,
    prediction_state: PredictionState,
    explore_state: ExploreState,
}

impl App {
    /// Create a new application from startup settings.
    ///
    /// A model that fails to load does not abort startup: the app comes up
    /// with the recommendation service marked unavailable.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let prediction_service = PredictionService::load(
            &settings.model_dir,
            &settings.artifacts(),
            settings.prediction(),
        );
        let exploration_service =
            ExplorationService::new(Arc::new(CsvDataset::new(&settings.data_path)));

        Self::with_dependencies(prediction_service, exploration_service, CropCatalog::standard())
    }

    /// Create application with injected dependencies (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(
        prediction_service: PredictionService<ForestPipeline, CropLabelEncoder>,
        exploration_service: ExplorationService<CsvDataset>,
        catalog: CropCatalog,
    ) -> Self {
        let mut app = Self {
            screen: Screen::Dashboard,
            should_quit: false,
            prediction_service,
            exploration_service,
            catalog,
            dashboard_state: DashboardState::default(),
            sample_form_state: SampleFormState::default(),
            prediction_state: PredictionState::default(),
            explore_state: ExploreState::default(),
        };
        app.load_dataset();
        app.update_dashboard_state();
        app
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match self.screen {
                    Screen::Dashboard => {
                        render_dashboard(f, content_area, &self.dashboard_state, &self.catalog)
                    }
                    Screen::SampleForm => {
                        render_sample_form(f, content_area, &self.sample_form_state)
                    }
                    Screen::Prediction => render_prediction(
                        f,
                        content_area,
                        &self.prediction_state,
                        &self.catalog,
                    ),
                    Screen::Explore => {
                        render_explore(f, content_area, &self.explore_state, &self.catalog)
                    }
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::SampleForm => self.handle_sample_form_key(key),
            Screen::Prediction => self.handle_prediction_key(key),
            Screen::Explore => self.handle_explore_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.sample_form_state = SampleFormState::default();
                self.screen = Screen::SampleForm;
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.screen = Screen::Explore;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_sample_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up => {
                self.sample_form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.sample_form_state.next_field();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.sample_form_state.load_sample_data();
            }
            KeyCode::Char(c) => {
                self.sample_form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.sample_form_state.delete_char();
            }
            KeyCode::Delete => {
                self.sample_form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_sample_form();
            }
            _ => {}
        }
    }

    fn handle_prediction_key(&mut self, key: KeyCode) {
        match key {
            // Keep the entered values for editing
            KeyCode::Enter => {
                self.screen = Screen::SampleForm;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.sample_form_state = SampleFormState::default();
                self.screen = Screen::SampleForm;
            }
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            _ => {}
        }
    }

    fn handle_explore_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            KeyCode::Tab => {
                self.explore_state.toggle_view();
            }
            KeyCode::Right | KeyCode::Down => match self.explore_state.view {
                ExploreView::Overview => self.explore_state.next_crop(),
                ExploreView::Dataset => self.explore_state.next_feature(),
            },
            KeyCode::Left | KeyCode::Up => match self.explore_state.view {
                ExploreView::Overview => self.explore_state.prev_crop(),
                ExploreView::Dataset => self.explore_state.prev_feature(),
            },
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.load_dataset();
                self.update_dashboard_state();
            }
            _ => {}
        }
    }

    fn submit_sample_form(&mut self) {
        let sample = match self.sample_form_state.to_sample() {
            Ok(sample) => sample,
            Err(e) => {
                self.sample_form_state.error_message = Some(e);
                return;
            }
        };

        let warnings = sample.range_warnings();
        self.prediction_state = match self.prediction_service.recommend(&sample) {
            Ok(result) => {
                tracing::info!(
                    "Recommended {} ({:.2}%)",
                    result.crop,
                    result.confidence() * 100.0
                );
                self.dashboard_state.last_recommendation =
                    Some((result.crop.clone(), result.confidence()));
                PredictionState::Complete { result, warnings }
            }
            Err(e) => {
                tracing::error!("Recommendation failed: {}", e);
                PredictionState::Error {
                    message: e.to_string(),
                }
            }
        };
        self.screen = Screen::Prediction;
    }

    fn load_dataset(&mut self) {
        self.explore_state.source = self.exploration_service.source();
        match self.exploration_service.summarize() {
            Ok(summary) => {
                self.explore_state.summary = Some(summary);
                self.explore_state.error = None;
                self.explore_state.selected_crop = 0;
            }
            Err(e) => {
                tracing::warn!("Dataset unavailable: {}", e);
                self.explore_state.summary = None;
                self.explore_state.error = Some(e.to_string());
            }
        }
    }

    fn update_dashboard_state(&mut self) {
        let state = &mut self.dashboard_state;

        state.model_loaded = self.prediction_service.is_available();
        state.model_error = self
            .prediction_service
            .unavailable_reason()
            .map(str::to_string);
        state.label_space = self
            .prediction_service
            .label_space()
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        state.dataset_rows = self.explore_state.summary.as_ref().map(|s| s.rows);
        state.dataset_crops = self.explore_state.summary.as_ref().map(|s| s.n_crops);
        state.dataset_error = self.explore_state.error.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bundle::tests::write_bundle;
    use crate::adapters::ArtifactConfig;
    use crate::application::PredictionConfig;

    fn app_with_model(model_dir: &std::path::Path, data_path: &std::path::Path) -> App {
        App::with_dependencies(
            PredictionService::load(
                model_dir,
                &ArtifactConfig::default(),
                PredictionConfig::default(),
            ),
            ExplorationService::new(Arc::new(CsvDataset::new(data_path))),
            CropCatalog::standard(),
        )
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.handle_key(*key, KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_missing_artifacts_start_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_model(dir.path(), &dir.path().join("missing.csv"));

        assert!(!app.dashboard_state.model_loaded);
        assert!(app.dashboard_state.model_error.is_some());
        assert!(app.dashboard_state.dataset_error.is_some());
        assert!(app.dashboard_state.label_space.is_empty());

        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('s'), KeyCode::Enter]);
        assert_eq!(app.screen(), Screen::Prediction);
        assert!(matches!(app.prediction_state, PredictionState::Error { .. }));
        assert!(app.dashboard_state.last_recommendation.is_none());
    }

    #[test]
    fn test_sample_flow_with_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_bundle(dir.path());
        let data = dir.path().join("crops.csv");
        std::fs::write(
            &data,
            "N,P,K,temperature,humidity,ph,rainfall,label\n90,42,43,20.8,82,6.5,202.9,rice\n",
        )
        .expect("write csv");

        let mut app = app_with_model(dir.path(), &data);
        assert!(app.dashboard_state.model_loaded);
        assert_eq!(app.dashboard_state.label_space.len(), 3);
        assert_eq!(app.dashboard_state.dataset_rows, Some(1));

        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('s'), KeyCode::Enter]);
        assert_eq!(app.screen(), Screen::Prediction);
        match &app.prediction_state {
            PredictionState::Complete { result, warnings } => {
                assert!(result.top1_in_ranking());
                assert!(warnings.is_empty());
            }
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(app.dashboard_state.last_recommendation.is_some());

        press(&mut app, &[KeyCode::Esc, KeyCode::Char('e')]);
        assert_eq!(app.screen(), Screen::Explore);
        press(&mut app, &[KeyCode::Tab, KeyCode::Right]);
        assert_eq!(app.explore_state.view, ExploreView::Dataset);
        assert_eq!(app.explore_state.selected_feature, 1);
        assert_eq!(app.explore_state.selected_crop, 0);
        let summary = app.explore_state.summary.as_ref().expect("summary");
        assert_eq!(summary.preview.len(), 1);
        assert_eq!(summary.preview[0].label, "rice");
        press(&mut app, &[KeyCode::Esc, KeyCode::Char('q')]);
        assert!(app.should_quit);
    }

    #[test]
    fn test_invalid_input_stays_on_form() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_model(dir.path(), &dir.path().join("missing.csv"));

        press(&mut app, &[KeyCode::Char('n'), KeyCode::Enter]);
        assert_eq!(app.screen(), Screen::SampleForm);
        assert!(app.sample_form_state.error_message.is_some());
    }
}

//! Application state for the TUI

use std::path::Path;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use crossterm::event::{MouseEvent, MouseEventKind};

use crate::config::Config;
use crate::model::{CheckIn, Idea, Kudos, ProblemStatus, ProblemStatusEvent};
use crate::stats::{self, DashboardStats, HistoryFilter, FEED_LIMIT, MAX_HISTORY_DAYS};
use crate::status::{list_problems, update_status, StatusUpdateForm, TrackedProblem};
use crate::store::Store;
use crate::weather::{weather_for_window, WeatherReport};

/// Current tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Weather,
    History,
    Problems,
    Kudos,
    Ideas,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Weather, Tab::History, Tab::Problems, Tab::Kudos, Tab::Ideas];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Weather => "Weather",
            Tab::History => "History",
            Tab::Problems => "Problems",
            Tab::Kudos => "Kudos",
            Tab::Ideas => "Ideas",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn offset(&self, by: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        let next = (self.index() as isize + by).rem_euclid(len);
        Tab::ALL[next as usize]
    }
}

/// Main application state
pub struct App {
    store: Store,
    config: Config,

    // Loaded collections
    pub checkins: Vec<CheckIn>,
    pub events: Vec<ProblemStatusEvent>,
    pub kudos: Vec<Kudos>,
    pub ideas: Vec<Idea>,

    // Derived on reload
    pub problems: Vec<TrackedProblem>,

    // View state
    pub tab: Tab,
    pub selected: usize,
    pub show_resolved: bool,
    pub history_days: u32,
    pub show_help: bool,
    pub today: NaiveDate,

    // Refresh indicator
    pub refresh_shown_at: Option<Instant>,

    // Status message
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(store: Store, config: Config) -> crate::Result<Self> {
        let mut app = Self {
            store,
            config,
            checkins: Vec::new(),
            events: Vec::new(),
            kudos: Vec::new(),
            ideas: Vec::new(),
            problems: Vec::new(),
            tab: Tab::Weather,
            selected: 0,
            show_resolved: false,
            history_days: 7,
            show_help: false,
            today: Local::now().date_naive(),
            refresh_shown_at: None,
            status_message: None,
        };
        app.reload()?;
        Ok(app)
    }

    pub fn data_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Reload every collection from disk
    pub fn reload(&mut self) -> crate::Result<()> {
        self.checkins = self.store.checkins()?;
        self.events = self.store.status_events()?;
        self.kudos = self.store.kudos()?;
        self.ideas = self.store.ideas()?;
        self.today = Local::now().date_naive();
        self.refresh_problems();
        Ok(())
    }

    fn refresh_problems(&mut self) {
        let filter: &[ProblemStatus] = if self.show_resolved {
            &[]
        } else {
            ProblemStatus::OPEN
        };
        self.problems = list_problems(&self.checkins, &self.events, filter);
        self.clamp_selection();
    }

    pub fn weather_window(&self) -> u32 {
        self.config.weather.window_days
    }

    pub fn weather(&self) -> WeatherReport {
        weather_for_window(&self.checkins, self.today, self.weather_window())
    }

    pub fn stats(&self) -> DashboardStats {
        stats::dashboard(&self.checkins, self.today, self.history_days)
    }

    pub fn history(&self) -> Vec<&CheckIn> {
        let filter = HistoryFilter {
            days: self.history_days,
            ..HistoryFilter::default()
        };
        stats::filter_history(&self.checkins, &filter, self.today)
    }

    pub fn recent_kudos(&self) -> Vec<&Kudos> {
        stats::recent(&self.kudos, FEED_LIMIT)
    }

    pub fn recent_ideas(&self) -> Vec<&Idea> {
        stats::recent(&self.ideas, FEED_LIMIT)
    }

    /// Number of selectable rows on the current tab
    pub fn list_len(&self) -> usize {
        match self.tab {
            Tab::Weather => 0,
            Tab::History => self.history().len(),
            Tab::Problems => self.problems.len(),
            Tab::Kudos => self.kudos.len().min(FEED_LIMIT),
            Tab::Ideas => self.ideas.len().min(FEED_LIMIT),
        }
    }

    pub fn selected_problem(&self) -> Option<&TrackedProblem> {
        match self.tab {
            Tab::Problems => self.problems.get(self.selected),
            _ => None,
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.list_len().saturating_sub(1));
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.list_len() {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn jump_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn jump_to_bottom(&mut self) {
        self.selected = self.list_len().saturating_sub(1);
    }

    pub fn next_tab(&mut self) {
        self.select_tab(self.tab.offset(1));
    }

    pub fn prev_tab(&mut self) {
        self.select_tab(self.tab.offset(-1));
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.selected = 0;
        }
    }

    pub fn toggle_resolved(&mut self) {
        self.show_resolved = !self.show_resolved;
        self.refresh_problems();
        let shown = if self.show_resolved { "all problems" } else { "open problems" };
        self.set_status(format!("Showing {}", shown));
    }

    /// Grow or shrink the history/statistics window by `delta` days
    pub fn change_days(&mut self, delta: i32) {
        let days = (self.history_days as i32 + delta).clamp(1, MAX_HISTORY_DAYS as i32);
        self.history_days = days as u32;
        self.clamp_selection();
        self.set_status(format!("Period: last {} day(s)", self.history_days));
    }

    /// Append a status event moving the selected problem to its next status
    pub fn cycle_selected_status(&mut self) {
        let Some(problem) = self.selected_problem() else {
            return;
        };
        let form = StatusUpdateForm {
            problem_id: problem.checkin.id.clone(),
            status: problem.status.next(),
            resolution_note: None,
        };

        match update_status(&self.store, form).and_then(|event| {
            self.reload()?;
            Ok(event)
        }) {
            Ok(event) => self.set_status(format!("{} → {}", event.problem_id, event.status.label())),
            Err(e) => self.set_status(format!("Error: {}", e.user_message())),
        }
    }

    /// Reload after the watcher saw a data file change
    pub fn on_data_changed(&mut self) {
        match self.reload() {
            Ok(()) => self.show_refresh_indicator(),
            Err(e) => {
                tracing::error!(error = %e, "reload failed");
                self.set_status(format!("Error: {}", e.user_message()));
            }
        }
    }

    pub fn show_refresh_indicator(&mut self) {
        self.refresh_shown_at = Some(Instant::now());
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.move_down(),
            MouseEventKind::ScrollUp => self.move_up(),
            _ => {}
        }
    }

    /// Periodic tick for expiring indicators
    pub fn tick(&mut self) {
        if let Some(shown_at) = self.refresh_shown_at {
            if shown_at.elapsed().as_secs() >= 2 {
                self.refresh_shown_at = None;
            }
        }

        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed().as_secs() >= 3 {
                self.status_message = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mood, Workload};
    use tempfile::TempDir;

    fn problem(id: &str) -> CheckIn {
        let now = Local::now();
        CheckIn {
            id: id.to_string(),
            author: "Lucas".to_string(),
            site: "Site B".to_string(),
            role: "Courier".to_string(),
            date: now.date_naive(),
            mood: Mood::Low,
            energy: 2,
            workload: Workload::Overloaded,
            has_problem: true,
            problem_type: None,
            problem_description: Some("van broke down".to_string()),
            urgency: None,
            patient_impact: false,
            win: None,
            help_needed: None,
            comment: None,
            created_at: now,
        }
    }

    fn app_with(checkins: &[CheckIn]) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        for c in checkins {
            store.append(c).unwrap();
        }
        let app = App::new(store, Config::default()).unwrap();
        (dir, app)
    }

    #[test]
    fn test_tabs_wrap_around() {
        let (_dir, mut app) = app_with(&[]);
        assert_eq!(app.tab, Tab::Weather);
        app.prev_tab();
        assert_eq!(app.tab, Tab::Ideas);
        app.next_tab();
        app.next_tab();
        assert_eq!(app.tab, Tab::History);
    }

    #[test]
    fn test_empty_store_has_no_weather() {
        let (_dir, app) = app_with(&[]);
        assert_eq!(app.weather(), WeatherReport::NoData);
        assert_eq!(app.list_len(), 0);
    }

    #[test]
    fn test_cycle_status_walks_the_lifecycle() {
        let (dir, mut app) = app_with(&[problem("p1")]);
        app.select_tab(Tab::Problems);
        assert_eq!(app.problems[0].status, ProblemStatus::Pending);

        app.cycle_selected_status();
        assert_eq!(app.problems[0].status, ProblemStatus::InProgress);

        // resolved problems drop out of the open list
        app.cycle_selected_status();
        assert!(app.problems.is_empty());

        app.toggle_resolved();
        assert_eq!(app.problems[0].status, ProblemStatus::Resolved);

        let on_disk = Store::open(dir.path()).status_events().unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let (_dir, mut app) = app_with(&[problem("a"), problem("b")]);
        app.select_tab(Tab::Problems);
        app.move_down();
        app.move_down();
        assert_eq!(app.selected, 1);
        app.jump_to_top();
        app.move_up();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_change_days_is_clamped() {
        let (_dir, mut app) = app_with(&[]);
        app.change_days(-100);
        assert_eq!(app.history_days, 1);
        app.change_days(100);
        assert_eq!(app.history_days, MAX_HISTORY_DAYS);
    }
}

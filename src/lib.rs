//! Huddle - daily check-in board for small teams
//!
//! Team members post a short daily check-in (mood, energy, workload, an
//! optional problem report, wins and requests for help), send kudos to each
//! other and suggest improvement ideas. The board aggregates check-ins into a
//! "team weather" score and statistics, and tracks reported problems through
//! `pending` → `in-progress` → `resolved` with an append-only status log.
//!
//! # Storage
//!
//! | File | Record |
//! |------|--------|
//! | `checkins.json` | [`CheckIn`] |
//! | `kudos.json` | [`Kudos`] |
//! | `ideas.json` | [`Idea`] |
//! | `problems_status.json` | [`ProblemStatusEvent`] |
//!
//! Each file is a JSON array that only ever grows.
//!
//! # Quick Start
//!
//! ```no_run
//! use huddle::{forms::CheckInForm, Config, Mood, Store, Workload};
//!
//! let store = Store::open(".huddle");
//! let config = Config::default();
//!
//! let form = CheckInForm {
//!     author: "Marie".into(),
//!     site: "Site A".into(),
//!     role: "Technician".into(),
//!     date: None,
//!     mood: Mood::Good,
//!     energy: 4,
//!     workload: Workload::Normal,
//!     has_problem: false,
//!     problem_type: None,
//!     problem_description: None,
//!     urgency: None,
//!     patient_impact: false,
//!     win: Some("Calibrated the new analyser".into()),
//!     help_needed: None,
//!     comment: None,
//! };
//! huddle::forms::submit_checkin(&store, &config, form).unwrap();
//!
//! let checkins = store.checkins().unwrap();
//! let today = chrono::Local::now().date_naive();
//! println!("{}", huddle::weather::weather_for_window(&checkins, today, 7));
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod forms;
pub mod model;
pub mod serve;
pub mod stats;
pub mod status;
pub mod store;
pub mod tui;
pub mod weather;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{
    CheckIn, Idea, IdeaCategory, IdeaStatus, Kudos, KudosCategory, Mood, ProblemKind,
    ProblemStatus, ProblemStatusEvent, Urgency, Workload,
};
pub use store::{Collection, Store, StoreError};
pub use weather::{Weather, WeatherReport, WeatherTier};

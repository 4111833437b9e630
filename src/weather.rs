//! Team weather
//!
//! A 0-100 health indicator computed from the check-ins of a trailing window:
//! mean mood and mean energy (both 1-5) each weigh up to 40 points, and the
//! share of check-ins reporting a problem takes away up to 20. The raw value
//! is clamped to [0, 80] and rescaled to [0, 100].

use crate::model::CheckIn;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Qualitative reading of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherTier {
    Critical,
    Tense,
    Moderate,
    Good,
    Excellent,
}

impl WeatherTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            WeatherTier::Excellent
        } else if score >= 60.0 {
            WeatherTier::Good
        } else if score >= 40.0 {
            WeatherTier::Moderate
        } else if score >= 20.0 {
            WeatherTier::Tense
        } else {
            WeatherTier::Critical
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeatherTier::Excellent => "Excellent",
            WeatherTier::Good => "Good",
            WeatherTier::Moderate => "Moderate",
            WeatherTier::Tense => "Tense",
            WeatherTier::Critical => "Critical",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WeatherTier::Excellent => "☀️",
            WeatherTier::Good => "🌤️",
            WeatherTier::Moderate => "⛅",
            WeatherTier::Tense => "🌧️",
            WeatherTier::Critical => "⛈️",
        }
    }
}

/// A computed reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub tier: WeatherTier,
    /// 0 to 100
    pub score: f64,
    pub checkins: usize,
    pub mean_mood: f64,
    pub mean_energy: f64,
    /// Share of check-ins reporting a problem, 0 to 1
    pub problem_rate: f64,
}

impl Weather {
    /// e.g. "Good (78/100)"
    pub fn label(&self) -> String {
        format!("{} ({:.0}/100)", self.tier.name(), self.score)
    }
}

/// Weather for a window, or no data when the window is empty
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WeatherReport {
    NoData,
    Scored(Weather),
}

impl WeatherReport {
    pub fn score(&self) -> Option<f64> {
        match self {
            WeatherReport::NoData => None,
            WeatherReport::Scored(w) => Some(w.score),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WeatherReport::NoData => "❓",
            WeatherReport::Scored(w) => w.tier.icon(),
        }
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherReport::NoData => write!(f, "No data"),
            WeatherReport::Scored(w) => write!(f, "{}", w.label()),
        }
    }
}

/// The weighted score from its three inputs
pub fn score(mean_mood: f64, mean_energy: f64, problem_rate: f64) -> f64 {
    let raw = (mean_mood / 5.0) * 40.0 + (mean_energy / 5.0) * 40.0 - problem_rate * 20.0;
    raw.clamp(0.0, 80.0) * 100.0 / 80.0
}

/// First day of a trailing window of `days` days ending on `today` (inclusive).
/// Windows reaching past the calendar's first day start at `NaiveDate::MIN`.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(days.max(1)) - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Check-ins dated inside the trailing window. Future dates are kept.
pub fn in_window(checkins: &[CheckIn], today: NaiveDate, days: u32) -> Vec<&CheckIn> {
    let start = window_start(today, days);
    checkins.iter().filter(|c| c.date >= start).collect()
}

/// Weather over a set of check-ins
pub fn team_weather<'a, I>(checkins: I) -> WeatherReport
where
    I: IntoIterator<Item = &'a CheckIn>,
{
    let (count, mood_sum, energy_sum, problems) = checkins.into_iter().fold(
        (0usize, 0u64, 0u64, 0usize),
        |(n, mood, energy, problems), c| {
            (
                n + 1,
                mood + u64::from(c.mood.level()),
                energy + u64::from(c.energy),
                problems + usize::from(c.has_problem),
            )
        },
    );

    if count == 0 {
        return WeatherReport::NoData;
    }

    let n = count as f64;
    let mean_mood = mood_sum as f64 / n;
    let mean_energy = energy_sum as f64 / n;
    let problem_rate = problems as f64 / n;
    let score = score(mean_mood, mean_energy, problem_rate);

    WeatherReport::Scored(Weather {
        tier: WeatherTier::from_score(score),
        score,
        checkins: count,
        mean_mood,
        mean_energy,
        problem_rate,
    })
}

/// Weather over the trailing window ending today
pub fn weather_for_window(checkins: &[CheckIn], today: NaiveDate, days: u32) -> WeatherReport {
    team_weather(in_window(checkins, today, days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mood, Workload};
    use chrono::{Local, TimeZone};
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn checkin(date: NaiveDate, mood: Mood, energy: u8, has_problem: bool) -> CheckIn {
        CheckIn {
            id: format!("x_{}", date),
            author: "Emma".to_string(),
            site: "Site B".to_string(),
            role: "Biologist".to_string(),
            date,
            mood,
            energy,
            workload: Workload::Normal,
            has_problem,
            problem_type: None,
            problem_description: None,
            urgency: None,
            patient_impact: false,
            win: None,
            help_needed: None,
            comment: None,
            created_at: Local.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_window_is_no_data() {
        let report = team_weather(&Vec::<CheckIn>::new());
        assert_eq!(report, WeatherReport::NoData);
        assert_eq!(report.score(), None);
        assert_eq!(report.to_string(), "No data");
    }

    #[test]
    fn test_reference_example() {
        // ten check-ins, mean mood 4, mean energy 4, one problem
        let mut checkins: Vec<CheckIn> = (0..10)
            .map(|_| checkin(day(10), Mood::Good, 4, false))
            .collect();
        checkins[3].has_problem = true;

        match team_weather(&checkins) {
            WeatherReport::Scored(w) => {
                assert!((w.score - 77.5).abs() < 1e-9);
                assert_eq!(w.tier, WeatherTier::Good);
                assert_eq!(w.checkins, 10);
                assert!((w.problem_rate - 0.1).abs() < 1e-9);
            }
            WeatherReport::NoData => panic!("expected a score"),
        }
    }

    #[test]
    fn test_best_and_worst_cases() {
        assert_eq!(score(5.0, 5.0, 0.0), 100.0);
        assert_eq!(score(1.0, 1.0, 1.0), 0.0);
        assert_eq!(WeatherTier::from_score(100.0), WeatherTier::Excellent);
        assert_eq!(WeatherTier::from_score(0.0), WeatherTier::Critical);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(WeatherTier::from_score(80.0), WeatherTier::Excellent);
        assert_eq!(WeatherTier::from_score(79.99), WeatherTier::Good);
        assert_eq!(WeatherTier::from_score(60.0), WeatherTier::Good);
        assert_eq!(WeatherTier::from_score(40.0), WeatherTier::Moderate);
        assert_eq!(WeatherTier::from_score(20.0), WeatherTier::Tense);
        assert_eq!(WeatherTier::from_score(19.99), WeatherTier::Critical);
    }

    #[test]
    fn test_label() {
        let checkins = vec![checkin(day(10), Mood::Great, 5, false)];
        let report = team_weather(&checkins);
        assert_eq!(report.to_string(), "Excellent (100/100)");
        assert_eq!(report.icon(), "☀️");
    }

    #[test]
    fn test_window_is_seven_calendar_days() {
        let today = day(20);
        assert_eq!(window_start(today, 7), day(14));
        assert_eq!(window_start(today, 1), today);
        assert_eq!(window_start(today, 0), today);

        let checkins = vec![
            checkin(day(13), Mood::Awful, 1, true),
            checkin(day(14), Mood::Great, 5, false),
            checkin(day(20), Mood::Great, 5, false),
            checkin(day(22), Mood::Great, 5, false),
        ];
        assert_eq!(in_window(&checkins, today, 7).len(), 3);
        assert_eq!(weather_for_window(&checkins, today, 7).score(), Some(100.0));
        assert_eq!(weather_for_window(&checkins, day(5), 7), WeatherReport::NoData);
    }

    #[test]
    fn test_huge_window_keeps_everything() {
        let today = day(20);
        assert_eq!(window_start(today, u32::MAX), NaiveDate::MIN);
        assert_eq!(window_start(today, 100_000_000), NaiveDate::MIN);

        let checkins = vec![
            checkin(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(), Mood::Good, 4, false),
            checkin(day(20), Mood::Good, 4, false),
        ];
        assert_eq!(in_window(&checkins, today, u32::MAX).len(), 2);
        assert_eq!(weather_for_window(&[], today, u32::MAX), WeatherReport::NoData);
        let score = weather_for_window(&checkins, today, 100_000_000).score().unwrap();
        assert!((score - 80.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_window_start_never_after_today(offset in 0i64..3_000_000, days in any::<u32>()) {
            let today = NaiveDate::MIN + Duration::days(offset);
            prop_assert!(window_start(today, days) <= today);
        }

        #[test]
        fn prop_score_stays_in_range(m in 1.0f64..=5.0, e in 1.0f64..=5.0, p in 0.0f64..=1.0) {
            let s = score(m, e, p);
            prop_assert!((0.0..=100.0).contains(&s));
        }

        #[test]
        fn prop_monotonic_in_mood_and_energy(
            m1 in 1.0f64..=5.0, m2 in 1.0f64..=5.0,
            e1 in 1.0f64..=5.0, e2 in 1.0f64..=5.0,
            p in 0.0f64..=1.0,
        ) {
            let (m_lo, m_hi) = if m1 <= m2 { (m1, m2) } else { (m2, m1) };
            let (e_lo, e_hi) = if e1 <= e2 { (e1, e2) } else { (e2, e1) };
            prop_assert!(score(m_lo, e1, p) <= score(m_hi, e1, p));
            prop_assert!(score(m1, e_lo, p) <= score(m1, e_hi, p));
        }

        #[test]
        fn prop_monotonic_in_problem_rate(
            m in 1.0f64..=5.0, e in 1.0f64..=5.0,
            p1 in 0.0f64..=1.0, p2 in 0.0f64..=1.0,
        ) {
            let (p_lo, p_hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
            prop_assert!(score(m, e, p_hi) <= score(m, e, p_lo));
        }

        #[test]
        fn prop_more_problems_never_help(good in 1usize..20, flagged in 0usize..20) {
            let clean: Vec<CheckIn> = (0..good).map(|_| checkin(day(10), Mood::Good, 3, false)).collect();
            let mut with_problems = clean.clone();
            with_problems.extend((0..flagged).map(|_| checkin(day(10), Mood::Good, 3, true)));

            let a = team_weather(&clean).score().unwrap();
            let b = team_weather(&with_problems).score().unwrap();
            prop_assert!(b <= a);
        }
    }
}

//! Dashboard statistics and history filtering
//!
//! Pure functions over loaded collections; no I/O.

use crate::model::{CheckIn, Mood};
use crate::weather::window_start;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many kudos / ideas the feeds show
pub const FEED_LIMIT: usize = 10;

/// Longest history window offered
pub const MAX_HISTORY_DAYS: u32 = 30;

/// Filter for the check-in history and the CSV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Keep check-ins from any of these people. Empty keeps everyone.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Keep check-ins from any of these sites. Empty keeps every site.
    #[serde(default)]
    pub sites: Vec<String>,
    /// Trailing window, 1 to 30 days
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            authors: Vec::new(),
            sites: Vec::new(),
            days: default_days(),
        }
    }
}

impl HistoryFilter {
    pub fn matches(&self, checkin: &CheckIn, today: NaiveDate) -> bool {
        let start = window_start(today, self.days.clamp(1, MAX_HISTORY_DAYS));
        checkin.date >= start
            && (self.authors.is_empty() || self.authors.iter().any(|a| *a == checkin.author))
            && (self.sites.is_empty() || self.sites.iter().any(|s| *s == checkin.site))
    }
}

/// Check-ins matching the filter, most recent date first.
/// Check-ins on the same date keep submission order.
pub fn filter_history<'a>(
    checkins: &'a [CheckIn],
    filter: &HistoryFilter,
    today: NaiveDate,
) -> Vec<&'a CheckIn> {
    let mut matching: Vec<&CheckIn> = checkins.iter().filter(|c| filter.matches(c, today)).collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date));
    matching
}

/// Last `limit` records, newest first
pub fn recent<T>(records: &[T], limit: usize) -> Vec<&T> {
    records.iter().rev().take(limit).collect()
}

/// Mean mood and energy for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub checkins: usize,
    pub mean_mood: f64,
    pub mean_energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: usize,
}

/// Averages for one site, rounded to two decimals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteAverages {
    pub site: String,
    pub checkins: usize,
    pub mean_mood: f64,
    pub mean_energy: f64,
}

/// Everything the statistics tab shows for a period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub days: u32,
    pub checkins: usize,
    pub mean_mood: Option<f64>,
    pub mean_energy: Option<f64>,
    pub problems: usize,
    /// Ascending by date
    pub daily: Vec<DailyPoint>,
    /// One entry per mood level, worst first
    pub mood_distribution: Vec<MoodCount>,
    /// Sorted by site name
    pub sites: Vec<SiteAverages>,
}

impl DashboardStats {
    pub fn is_empty(&self) -> bool {
        self.checkins == 0
    }
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    mood: u64,
    energy: u64,
}

impl Accumulator {
    fn add(&mut self, checkin: &CheckIn) {
        self.count += 1;
        self.mood += u64::from(checkin.mood.level());
        self.energy += u64::from(checkin.energy);
    }

    fn mean_mood(&self) -> f64 {
        self.mood as f64 / self.count as f64
    }

    fn mean_energy(&self) -> f64 {
        self.energy as f64 / self.count as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Statistics over the trailing `days` ending on `today`
pub fn dashboard(checkins: &[CheckIn], today: NaiveDate, days: u32) -> DashboardStats {
    let start = window_start(today, days);
    let period: Vec<&CheckIn> = checkins.iter().filter(|c| c.date >= start).collect();

    let mut overall = Accumulator::default();
    let mut by_day: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
    let mut by_site: BTreeMap<&str, Accumulator> = BTreeMap::new();
    let mut moods: BTreeMap<Mood, usize> = BTreeMap::new();

    for checkin in &period {
        overall.add(checkin);
        by_day.entry(checkin.date).or_default().add(checkin);
        by_site.entry(checkin.site.as_str()).or_default().add(checkin);
        *moods.entry(checkin.mood).or_default() += 1;
    }

    let has_data = overall.count > 0;

    DashboardStats {
        days,
        checkins: overall.count,
        mean_mood: has_data.then(|| overall.mean_mood()),
        mean_energy: has_data.then(|| overall.mean_energy()),
        problems: period.iter().filter(|c| c.has_problem).count(),
        daily: by_day
            .into_iter()
            .map(|(date, acc)| DailyPoint {
                date,
                checkins: acc.count,
                mean_mood: acc.mean_mood(),
                mean_energy: acc.mean_energy(),
            })
            .collect(),
        mood_distribution: Mood::ALL
            .iter()
            .map(|m| MoodCount {
                mood: *m,
                count: moods.get(m).copied().unwrap_or(0),
            })
            .collect(),
        sites: by_site
            .into_iter()
            .map(|(site, acc)| SiteAverages {
                site: site.to_string(),
                checkins: acc.count,
                mean_mood: round2(acc.mean_mood()),
                mean_energy: round2(acc.mean_energy()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workload;
    use chrono::{Local, TimeZone};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn checkin(id: &str, author: &str, site: &str, date: NaiveDate, mood: Mood, energy: u8) -> CheckIn {
        CheckIn {
            id: id.to_string(),
            author: author.to_string(),
            site: site.to_string(),
            role: "Technician".to_string(),
            date,
            mood,
            energy,
            workload: Workload::Normal,
            has_problem: false,
            problem_type: None,
            problem_description: None,
            urgency: None,
            patient_impact: false,
            win: None,
            help_needed: None,
            comment: None,
            created_at: Local.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<CheckIn> {
        vec![
            checkin("1", "Marie", "Site A", day(10), Mood::Good, 4),
            checkin("2", "Thomas", "Site B", day(12), Mood::Low, 2),
            checkin("3", "Marie", "Site A", day(12), Mood::Great, 5),
            checkin("4", "Sophie", "Site A", day(2), Mood::Awful, 1),
        ]
    }

    #[test]
    fn test_history_sorted_by_date_desc() {
        let checkins = sample();
        let found = filter_history(&checkins, &HistoryFilter::default(), day(12));
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        // same-date entries keep submission order
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_history_filters_authors_and_sites() {
        let checkins = sample();
        let filter = HistoryFilter {
            authors: vec!["Marie".to_string(), "Sophie".to_string()],
            sites: vec!["Site A".to_string()],
            days: 30,
        };
        let found = filter_history(&checkins, &filter, day(12));
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "4"]);
    }

    #[test]
    fn test_history_days_are_clamped() {
        let checkins = sample();
        let filter = HistoryFilter {
            days: 0,
            ..HistoryFilter::default()
        };
        assert_eq!(filter_history(&checkins, &filter, day(12)).len(), 2);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let records: Vec<u32> = (1..=15).collect();
        let feed = recent(&records, FEED_LIMIT);
        assert_eq!(feed.len(), 10);
        assert_eq!(*feed[0], 15);
        assert_eq!(*feed[9], 6);
        assert_eq!(recent(&records[..2], FEED_LIMIT), vec![&2, &1]);
    }

    #[test]
    fn test_dashboard_numbers() {
        let mut checkins = sample();
        checkins[1].has_problem = true;
        let stats = dashboard(&checkins, day(12), 7);

        assert_eq!(stats.checkins, 3);
        assert_eq!(stats.problems, 1);
        assert!((stats.mean_mood.unwrap() - 11.0 / 3.0).abs() < 1e-9);
        assert!((stats.mean_energy.unwrap() - 11.0 / 3.0).abs() < 1e-9);

        assert_eq!(stats.daily.len(), 2);
        assert_eq!(stats.daily[0].date, day(10));
        assert_eq!(stats.daily[1].checkins, 2);
        assert!((stats.daily[1].mean_mood - 3.5).abs() < 1e-9);

        let counts: Vec<usize> = stats.mood_distribution.iter().map(|m| m.count).collect();
        assert_eq!(counts, vec![0, 1, 0, 1, 1]);

        assert_eq!(stats.sites.len(), 2);
        assert_eq!(stats.sites[0].site, "Site A");
        assert_eq!(stats.sites[0].mean_mood, 4.5);
        assert_eq!(stats.sites[1].mean_energy, 2.0);
    }

    #[test]
    fn test_site_means_round_to_two_decimals() {
        let checkins = vec![
            checkin("1", "a", "S", day(1), Mood::Good, 1),
            checkin("2", "b", "S", day(1), Mood::Good, 1),
            checkin("3", "c", "S", day(1), Mood::Good, 2),
        ];
        let stats = dashboard(&checkins, day(1), 7);
        assert_eq!(stats.sites[0].mean_energy, 1.33);
    }

    #[test]
    fn test_empty_period() {
        let stats = dashboard(&sample(), day(30), 7);
        assert!(stats.is_empty());
        assert_eq!(stats.mean_mood, None);
        assert!(stats.daily.is_empty());
        assert_eq!(stats.mood_distribution.len(), 5);
    }
}

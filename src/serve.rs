//! HTTP server for the check-in dashboard
//!
//! `huddle serve` → serves the embedded dashboard page and its JSON API.
//! Requests are handled one at a time on the accept loop.

use crate::config::Config;
use crate::error::Error;
use crate::export::{checkins_to_csv, export_file_name};
use crate::forms::{submit_checkin, submit_idea, submit_kudos, CheckInForm, IdeaForm, KudosForm};
use crate::model::{
    IdeaCategory, KudosCategory, Mood, ProblemKind, ProblemStatus, Urgency, Workload,
};
use crate::stats::{dashboard, filter_history, recent, HistoryFilter, FEED_LIMIT};
use crate::status::{list_problems, update_status, StatusUpdateForm};
use crate::store::Store;
use crate::weather::weather_for_window;
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message),
        }
    }
}

// Single-page dashboard, plain HTML + JS talking to /api
const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// A response before it is handed to tiny_http
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Set for downloads (Content-Disposition: attachment)
    pub filename: Option<String>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, payload: &ApiResponse<T>) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
                filename: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                Self::text(500, "Internal error")
            }
        }
    }

    fn ok<T: Serialize>(data: T) -> Self {
        Self::json(200, &ApiResponse::success(data))
    }

    fn created<T: Serialize>(data: T) -> Self {
        Self::json(201, &ApiResponse::success(data))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::json(400, &ApiResponse::failure(message.into()))
    }

    fn from_error(err: &Error) -> Self {
        let status = match err {
            Error::Validation(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Store(e) => {
                tracing::error!(error = %e, "storage failure");
                500
            }
        };
        Self::json(status, &ApiResponse::failure(err.user_message()))
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
            filename: None,
        }
    }
}

/// Query string of history and export endpoints: comma-separated lists
#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    author: Option<String>,
    site: Option<String>,
    days: Option<u32>,
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl From<HistoryQuery> for HistoryFilter {
    fn from(q: HistoryQuery) -> Self {
        let defaults = HistoryFilter::default();
        HistoryFilter {
            authors: split_list(q.author),
            sites: split_list(q.site),
            days: q.days.unwrap_or(defaults.days),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DaysQuery {
    days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemsQuery {
    status: Option<String>,
}

/// `None` → open problems, `all` → everything, else a comma list of statuses
fn parse_status_filter(value: Option<&str>) -> Result<Vec<ProblemStatus>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(ProblemStatus::OPEN.to_vec()),
        Some("all") => Ok(Vec::new()),
        Some(list) => list
            .split(',')
            .map(|s| s.parse::<ProblemStatus>().map_err(|e| e.to_string()))
            .collect(),
    }
}

#[derive(Serialize)]
struct Choice {
    key: &'static str,
    label: &'static str,
}

macro_rules! choices {
    ($vocabulary:ty) => {
        <$vocabulary>::ALL
            .iter()
            .map(|v| Choice {
                key: v.as_str(),
                label: v.label(),
            })
            .collect::<Vec<_>>()
    };
}

/// Roster and form vocabularies, so the page never hardcodes them
#[derive(Serialize)]
struct TeamInfo {
    members: Vec<String>,
    sites: Vec<String>,
    roles: Vec<String>,
    weather_window_days: u32,
    moods: Vec<Choice>,
    workloads: Vec<Choice>,
    urgencies: Vec<Choice>,
    problem_types: Vec<Choice>,
    kudos_categories: Vec<Choice>,
    idea_categories: Vec<Choice>,
    problem_statuses: Vec<Choice>,
}

#[derive(Serialize)]
struct WeatherPayload {
    icon: &'static str,
    label: String,
    window_days: u32,
    report: crate::weather::WeatherReport,
}

/// Route table of the dashboard, independent of the socket
pub struct Dashboard {
    store: Store,
    config: Config,
}

impl Dashboard {
    pub fn new(store: Store, config: Config) -> Self {
        Self { store, config }
    }

    /// Handle one request. `url` may carry a query string.
    pub fn handle(&self, method: &Method, url: &str, body: &str) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let today = Local::now().date_naive();

        match (method, path) {
            (Method::Get, "/") | (Method::Get, "/index.html") => Reply {
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: DASHBOARD_HTML.to_string(),
                filename: None,
            },

            (Method::Get, "/api/team") => Reply::ok(self.team_info()),
            (Method::Get, "/api/weather") => self.weather(today),
            (Method::Get, "/api/stats") => match parse_query::<DaysQuery>(query) {
                Ok(q) => self.stats(today, q.days.unwrap_or(7)),
                Err(reply) => reply,
            },
            (Method::Get, "/api/checkins") => match parse_query::<HistoryQuery>(query) {
                Ok(q) => self.history(today, q.into()),
                Err(reply) => reply,
            },
            (Method::Post, "/api/checkins") => match parse_body::<CheckInForm>(body) {
                Ok(form) => created_or_error(submit_checkin(&self.store, &self.config, form)),
                Err(reply) => reply,
            },
            (Method::Get, "/api/kudos") => match self.store.kudos() {
                Ok(all) => Reply::ok(recent(&all, FEED_LIMIT)),
                Err(e) => Reply::from_error(&Error::from(e)),
            },
            (Method::Post, "/api/kudos") => match parse_body::<KudosForm>(body) {
                Ok(form) => created_or_error(submit_kudos(&self.store, &self.config, form)),
                Err(reply) => reply,
            },
            (Method::Get, "/api/ideas") => match self.store.ideas() {
                Ok(all) => Reply::ok(recent(&all, FEED_LIMIT)),
                Err(e) => Reply::from_error(&Error::from(e)),
            },
            (Method::Post, "/api/ideas") => match parse_body::<IdeaForm>(body) {
                Ok(form) => created_or_error(submit_idea(&self.store, &self.config, form)),
                Err(reply) => reply,
            },
            (Method::Get, "/api/problems") => match parse_query::<ProblemsQuery>(query) {
                Ok(q) => self.problems(q.status.as_deref()),
                Err(reply) => reply,
            },
            (Method::Post, "/api/problems/status") => match parse_body::<StatusUpdateForm>(body) {
                Ok(form) => created_or_error(update_status(&self.store, form)),
                Err(reply) => reply,
            },
            (Method::Get, "/api/export.csv") => match parse_query::<HistoryQuery>(query) {
                Ok(q) => self.export(today, q.into()),
                Err(reply) => reply,
            },

            _ => Reply::text(404, "Not found"),
        }
    }

    fn team_info(&self) -> TeamInfo {
        TeamInfo {
            members: self.config.team.members.clone(),
            sites: self.config.team.sites.clone(),
            roles: self.config.team.roles.clone(),
            weather_window_days: self.config.weather.window_days,
            moods: choices!(Mood),
            workloads: choices!(Workload),
            urgencies: choices!(Urgency),
            problem_types: choices!(ProblemKind),
            kudos_categories: choices!(KudosCategory),
            idea_categories: choices!(IdeaCategory),
            problem_statuses: choices!(ProblemStatus),
        }
    }

    fn weather(&self, today: NaiveDate) -> Reply {
        let window_days = self.config.weather.window_days;
        match self.store.checkins() {
            Ok(checkins) => {
                let report = weather_for_window(&checkins, today, window_days);
                Reply::ok(WeatherPayload {
                    icon: report.icon(),
                    label: report.to_string(),
                    window_days,
                    report,
                })
            }
            Err(e) => Reply::from_error(&Error::from(e)),
        }
    }

    fn stats(&self, today: NaiveDate, days: u32) -> Reply {
        match self.store.checkins() {
            Ok(checkins) => Reply::ok(dashboard(&checkins, today, days.max(1))),
            Err(e) => Reply::from_error(&Error::from(e)),
        }
    }

    fn history(&self, today: NaiveDate, filter: HistoryFilter) -> Reply {
        match self.store.checkins() {
            Ok(checkins) => Reply::ok(filter_history(&checkins, &filter, today)),
            Err(e) => Reply::from_error(&Error::from(e)),
        }
    }

    fn problems(&self, status: Option<&str>) -> Reply {
        let filter = match parse_status_filter(status) {
            Ok(filter) => filter,
            Err(message) => return Reply::bad_request(message),
        };
        let loaded = self
            .store
            .checkins()
            .and_then(|c| self.store.status_events().map(|e| (c, e)));
        match loaded {
            Ok((checkins, events)) => Reply::ok(list_problems(&checkins, &events, &filter)),
            Err(e) => Reply::from_error(&Error::from(e)),
        }
    }

    fn export(&self, today: NaiveDate, filter: HistoryFilter) -> Reply {
        let loaded = self
            .store
            .checkins()
            .and_then(|c| self.store.status_events().map(|e| (c, e)));
        match loaded {
            Ok((checkins, events)) => {
                let rows = filter_history(&checkins, &filter, today);
                Reply {
                    status: 200,
                    content_type: "text/csv; charset=utf-8",
                    body: checkins_to_csv(&rows, &events),
                    filename: Some(export_file_name(today)),
                }
            }
            Err(e) => Reply::from_error(&Error::from(e)),
        }
    }
}

fn parse_query<T: DeserializeOwned>(query: &str) -> Result<T, Reply> {
    serde_urlencoded::from_str(query).map_err(|e| Reply::bad_request(format!("Invalid query: {}", e)))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, Reply> {
    serde_json::from_str(body).map_err(|e| Reply::bad_request(format!("Invalid JSON: {}", e)))
}

fn created_or_error<T: Serialize>(result: crate::error::Result<T>) -> Reply {
    match result {
        Ok(record) => Reply::created(record),
        Err(e) => Reply::from_error(&e),
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Start the dashboard server
pub fn start(host: &str, port: u16, store: Store, config: Config) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::other(e.to_string()))?;

    eprintln!("\n\x1b[1;32m☀ Huddle\x1b[0m");
    eprintln!("   Dashboard: http://{}", addr);
    eprintln!("   Data:      {}", store.dir().display());
    eprintln!("   Press Ctrl+C to stop\n");
    tracing::info!(%addr, data_dir = %store.dir().display(), "dashboard listening");

    let dashboard = Dashboard::new(store, config);
    for request in server.incoming_requests() {
        if let Err(e) = respond(&dashboard, request) {
            tracing::error!(error = %e, "failed to answer request");
        }
    }

    Ok(())
}

fn respond(dashboard: &Dashboard, mut request: Request) -> std::io::Result<()> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        let reply = Reply::bad_request(format!("Failed to read body: {}", e));
        return send(request, reply);
    }

    let method = request.method().clone();
    let url = request.url().to_string();
    let reply = dashboard.handle(&method, &url, &body);
    tracing::info!(%method, %url, status = reply.status, "request");
    send(request, reply)
}

fn send(request: Request, reply: Reply) -> std::io::Result<()> {
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Some(h) = header("Content-Type", reply.content_type) {
        response = response.with_header(h);
    }
    if let Some(name) = reply.filename {
        let disposition = format!("attachment; filename=\"{}\"", name);
        if let Some(h) = header("Content-Disposition", &disposition) {
            response = response.with_header(h);
        }
    }
    request.respond(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn dashboard_in(dir: &TempDir) -> Dashboard {
        Dashboard::new(Store::open(dir.path()), Config::default())
    }

    fn data(reply: &Reply) -> Value {
        let v: Value = serde_json::from_str(&reply.body).unwrap();
        v["data"].clone()
    }

    fn post(d: &Dashboard, path: &str, body: Value) -> Reply {
        d.handle(&Method::Post, path, &body.to_string())
    }

    fn checkin_body(author: &str, has_problem: bool) -> Value {
        json!({
            "author": author,
            "site": "Site A",
            "role": "Technician",
            "mood": "good",
            "energy": 4,
            "workload": "normal",
            "has_problem": has_problem,
            "problem_description": if has_problem { Some("fridge alarm") } else { None },
        })
    }

    // === ApiResponse Tests ===

    #[test]
    fn test_api_response_serializes_to_json() {
        let response: ApiResponse<String> = ApiResponse::success("test".to_string());
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"ok\":true"));
        assert!(json.contains("\"data\":\"test\""));
        assert!(json.contains("\"error\":null"));
    }

    #[test]
    fn test_api_response_failure() {
        let json = serde_json::to_string(&ApiResponse::failure("nope".to_string())).unwrap();
        assert_eq!(json, r#"{"ok":false,"data":null,"error":"nope"}"#);
    }

    // === Routing Tests ===

    #[test]
    fn test_dashboard_page_is_html() {
        let dir = TempDir::new().unwrap();
        let reply = dashboard_in(&dir).handle(&Method::Get, "/", "");
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/html"));
        assert!(DASHBOARD_HTML.contains("<html"));
        assert!(DASHBOARD_HTML.contains("</html>"));
    }

    #[test]
    fn test_unknown_route_is_404() {
        let dir = TempDir::new().unwrap();
        let reply = dashboard_in(&dir).handle(&Method::Get, "/api/nope", "");
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn test_team_lists_vocabularies() {
        let dir = TempDir::new().unwrap();
        let reply = dashboard_in(&dir).handle(&Method::Get, "/api/team", "");
        let team = data(&reply);
        assert_eq!(team["moods"].as_array().unwrap().len(), 5);
        assert_eq!(team["problem_statuses"][1]["key"], "in-progress");
        assert_eq!(team["weather_window_days"], 7);
    }

    #[test]
    fn test_weather_without_data() {
        let dir = TempDir::new().unwrap();
        let reply = dashboard_in(&dir).handle(&Method::Get, "/api/weather", "");
        let weather = data(&reply);
        assert_eq!(weather["report"]["state"], "no_data");
        assert_eq!(weather["label"], "No data");
    }

    #[test]
    fn test_checkin_submit_and_read_back() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);

        let reply = post(&d, "/api/checkins", checkin_body("Marie", false));
        assert_eq!(reply.status, 201);
        assert_eq!(data(&reply)["author"], "Marie");

        let listed = d.handle(&Method::Get, "/api/checkins?author=Marie,Thomas&days=7", "");
        assert_eq!(data(&listed).as_array().unwrap().len(), 1);

        let weather = data(&d.handle(&Method::Get, "/api/weather", ""));
        assert_eq!(weather["report"]["state"], "scored");
        assert_eq!(weather["report"]["tier"], "excellent");
    }

    #[test]
    fn test_validation_failure_is_400_and_not_saved() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);

        let mut body = checkin_body("Marie", true);
        body["problem_description"] = json!("");
        let reply = post(&d, "/api/checkins", body);
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("describe the problem"));
        assert!(Store::open(dir.path()).checkins().unwrap().is_empty());
    }

    #[test]
    fn test_stats_accepts_very_long_periods() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);
        post(&d, "/api/checkins", checkin_body("Marie", false));

        let reply = d.handle(&Method::Get, &format!("/api/stats?days={}", u32::MAX), "");
        assert_eq!(reply.status, 200);
        assert_eq!(data(&reply)["checkins"], 1);

        let reply = d.handle(&Method::Get, "/api/stats?days=100000000", "");
        assert_eq!(reply.status, 200);
    }

    #[test]
    fn test_unknown_site_is_400() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);

        let mut body = checkin_body("Marie", false);
        body["site"] = json!("Stie A");
        let reply = post(&d, "/api/checkins", body);
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("not one of the team's sites"));
        assert!(Store::open(dir.path()).checkins().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_is_400() {
        let dir = TempDir::new().unwrap();
        let reply = dashboard_in(&dir).handle(&Method::Post, "/api/kudos", "{oops");
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("Invalid JSON"));
    }

    #[test]
    fn test_problem_lifecycle() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);

        let created = post(&d, "/api/checkins", checkin_body("Lucas", true));
        let id = data(&created)["id"].as_str().unwrap().to_string();

        let open = data(&d.handle(&Method::Get, "/api/problems", ""));
        assert_eq!(open[0]["status"], "pending");

        let update = post(
            &d,
            "/api/problems/status",
            json!({"problem_id": id, "status": "resolved", "resolution_note": "reset"}),
        );
        assert_eq!(update.status, 201);

        let open = data(&d.handle(&Method::Get, "/api/problems", ""));
        assert!(open.as_array().unwrap().is_empty());

        let resolved = data(&d.handle(&Method::Get, "/api/problems?status=resolved", ""));
        assert_eq!(resolved[0]["resolution_note"], "reset");

        let all = data(&d.handle(&Method::Get, "/api/problems?status=all", ""));
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_status_update_for_unknown_problem_is_404() {
        let dir = TempDir::new().unwrap();
        let reply = post(
            &dashboard_in(&dir),
            "/api/problems/status",
            json!({"problem_id": "ghost", "status": "resolved"}),
        );
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn test_bad_status_filter_is_400() {
        let dir = TempDir::new().unwrap();
        let reply = dashboard_in(&dir).handle(&Method::Get, "/api/problems?status=closed", "");
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn test_kudos_feed() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);
        let reply = post(
            &d,
            "/api/kudos",
            json!({"from": "Emma", "to": "Julie", "category": "teamwork", "message": "merci"}),
        );
        assert_eq!(reply.status, 201);

        let feed = data(&d.handle(&Method::Get, "/api/kudos", ""));
        assert_eq!(feed[0]["to"], "Julie");
    }

    #[test]
    fn test_export_is_csv_download() {
        let dir = TempDir::new().unwrap();
        let d = dashboard_in(&dir);
        post(&d, "/api/checkins", checkin_body("Pierre", false));

        let reply = d.handle(&Method::Get, "/api/export.csv?site=Site%20A", "");
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/csv"));
        assert!(reply.filename.unwrap().ends_with(".csv"));
        assert_eq!(reply.body.lines().count(), 2);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("a, b,,c".to_string())),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_list(None).is_empty());
    }
}

//! UI rendering for the TUI

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use super::app::{App, Tab};
use crate::model::{ProblemStatus, Urgency};
use crate::weather::{WeatherReport, WeatherTier};

/// Main draw function - orchestrates all rendering
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Length(1), // Tabs
        Constraint::Min(6),    // Content
        Constraint::Length(1), // Footer/status
    ])
    .split(area);

    draw_header(frame, app, main_layout[0]);
    draw_tabs(frame, app, main_layout[1]);

    match app.tab {
        Tab::Weather => draw_weather(frame, app, main_layout[2]),
        Tab::History => draw_history(frame, app, main_layout[2]),
        Tab::Problems => draw_problems(frame, app, main_layout[2]),
        Tab::Kudos => draw_kudos(frame, app, main_layout[2]),
        Tab::Ideas => draw_ideas(frame, app, main_layout[2]),
    }

    draw_footer(frame, app, main_layout[3]);

    if app.show_help {
        draw_help_overlay(frame, area);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let weather = app.weather();
    let refresh_indicator = if app.refresh_shown_at.is_some() {
        " [Updated]"
    } else {
        ""
    };

    let header_text = format!(
        " Huddle │ {} Team weather: {} │ {} check-ins{}",
        weather.icon(),
        weather,
        app.checkins.len(),
        refresh_indicator
    );

    let header =
        Paragraph::new(header_text).style(Style::default().bg(Color::Blue).fg(Color::White).bold());
    frame.render_widget(header, area);
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{} {}", i + 1, t.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(Color::Gray).bg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));
    frame.render_widget(tabs, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keybinds = match app.tab {
        Tab::Weather | Tab::History => "Tab/1-5:switch  j/k:move  +/-:period  r:refresh  ?:help  q:quit",
        Tab::Problems => "j/k:move  s:next status  a:open/all  Tab:switch  ?:help  q:quit",
        Tab::Kudos | Tab::Ideas => "j/k:move  Tab:switch  r:refresh  ?:help  q:quit",
    };

    let footer_text = if let Some((ref msg, _)) = app.status_message {
        msg.clone()
    } else {
        keybinds.to_string()
    };

    let footer = Paragraph::new(format!(" {}", footer_text))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(footer, area);
}

fn bordered(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
}

fn draw_empty(frame: &mut Frame, area: Rect, message: &str) {
    let empty = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(empty, area);
}

pub fn tier_color(tier: WeatherTier) -> Color {
    match tier {
        WeatherTier::Excellent => Color::Green,
        WeatherTier::Good => Color::LightGreen,
        WeatherTier::Moderate => Color::Yellow,
        WeatherTier::Tense => Color::LightRed,
        WeatherTier::Critical => Color::Red,
    }
}

fn status_color(status: ProblemStatus) -> Color {
    match status {
        ProblemStatus::Pending => Color::Yellow,
        ProblemStatus::InProgress => Color::Cyan,
        ProblemStatus::Resolved => Color::Green,
    }
}

fn urgency_color(urgency: Option<Urgency>) -> Color {
    match urgency {
        Some(Urgency::Urgent) => Color::Red,
        Some(Urgency::Medium) => Color::Yellow,
        _ => Color::Green,
    }
}

fn bar(count: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    "█".repeat(count * width / max)
}

fn draw_weather(frame: &mut Frame, app: &App, area: Rect) {
    let layout =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).split(area);

    // Left: weather reading
    let weather = app.weather();
    let mut lines = vec![Line::raw("")];
    match &weather {
        WeatherReport::NoData => {
            lines.push(Line::styled(
                format!(
                    "  {} No check-ins in the last {} day(s)",
                    weather.icon(),
                    app.weather_window()
                ),
                Style::default().fg(Color::DarkGray),
            ));
        }
        WeatherReport::Scored(w) => {
            lines.push(Line::styled(
                format!("  {} {}", w.tier.icon(), w.label()),
                Style::default().fg(tier_color(w.tier)).bold(),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!("  Check-ins     {}", w.checkins)));
            lines.push(Line::raw(format!("  Mean mood     {:.1}/5", w.mean_mood)));
            lines.push(Line::raw(format!("  Mean energy   {:.1}/5", w.mean_energy)));
            lines.push(Line::raw(format!("  Problem rate  {:.0}%", w.problem_rate * 100.0)));
        }
    }
    let title = format!(" Weather ({} days) ", app.weather_window());
    frame.render_widget(Paragraph::new(lines).block(bordered(title)), layout[0]);

    // Right: statistics over the chosen period
    let stats = app.stats();
    let block = bordered(format!(" Statistics ({} days) ", stats.days));
    if stats.is_empty() {
        let inner = block.inner(layout[1]);
        frame.render_widget(block, layout[1]);
        draw_empty(frame, inner, "No check-ins in this period");
        return;
    }

    let mut lines = vec![Line::raw(format!(
        " {} check-ins, {} problem(s), mood {:.2}, energy {:.2}",
        stats.checkins,
        stats.problems,
        stats.mean_mood.unwrap_or_default(),
        stats.mean_energy.unwrap_or_default()
    ))];

    lines.push(Line::raw(""));
    lines.push(Line::styled(" Mood distribution", Style::default().bold()));
    let max = stats.mood_distribution.iter().map(|m| m.count).max().unwrap_or(0);
    for m in stats.mood_distribution.iter().rev() {
        lines.push(Line::from(vec![
            Span::raw(format!(" {} ", m.mood.label())),
            Span::styled(bar(m.count, max, 30), Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}", m.count)),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(" Per site", Style::default().bold()));
    for s in &stats.sites {
        lines.push(Line::raw(format!(
            " {:<12} {:>3} check-ins  mood {:.2}  energy {:.2}",
            s.site, s.checkins, s.mean_mood, s.mean_energy
        )));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(" Per day", Style::default().bold()));
    for d in &stats.daily {
        lines.push(Line::raw(format!(
            " {}  {:>3} check-ins  mood {:.2}  energy {:.2}",
            d.date, d.checkins, d.mean_mood, d.mean_energy
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        layout[1],
    );
}

fn render_list(frame: &mut Frame, app: &App, area: Rect, block: Block<'static>, items: Vec<ListItem>) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_history(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.history();
    let block = bordered(format!(" History ({} days) ", app.history_days));
    if history.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        draw_empty(frame, inner, "No check-ins in this period");
        return;
    }

    let items: Vec<ListItem> = history
        .iter()
        .map(|c| {
            let mut spans = vec![
                Span::styled(format!("{} ", c.date), Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{} ", c.mood.label())),
                Span::styled(format!("{:<12}", c.author), Style::default().bold()),
                Span::raw(format!(" {} · {} · energy {}/5 · {}", c.site, c.role, c.energy, c.workload.label())),
            ];
            if c.has_problem {
                spans.push(Span::styled("  ⚠ problem", Style::default().fg(urgency_color(c.urgency))));
            }
            let mut lines = vec![Line::from(spans)];
            for (name, text) in [("win", &c.win), ("help", &c.help_needed), ("note", &c.comment)] {
                if let Some(text) = text {
                    lines.push(Line::styled(
                        format!("             {}: {}", name, text),
                        Style::default().fg(Color::Gray),
                    ));
                }
            }
            ListItem::new(lines)
        })
        .collect();

    render_list(frame, app, area, block, items);
}

fn draw_problems(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.show_resolved {
        " Problems (all) ".to_string()
    } else {
        " Problems (open) ".to_string()
    };
    let block = bordered(title);
    if app.problems.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        draw_empty(frame, inner, "No problems to show");
        return;
    }

    let layout =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);

    let items: Vec<ListItem> = app
        .problems
        .iter()
        .map(|p| {
            let c = &p.checkin;
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<16}", p.status.label()),
                    Style::default().fg(status_color(p.status)),
                ),
                Span::styled(
                    format!("{} ", c.urgency.map(|u| u.label()).unwrap_or("")),
                    Style::default().fg(urgency_color(c.urgency)),
                ),
                Span::raw(c.problem_description.clone().unwrap_or_default()),
            ]))
        })
        .collect();
    render_list(frame, app, layout[0], block, items);

    // Detail of the selected problem
    let detail_block = bordered(" Detail ".to_string());
    let Some(p) = app.selected_problem() else {
        frame.render_widget(detail_block, layout[1]);
        return;
    };
    let c = &p.checkin;
    let mut lines = vec![
        Line::styled(c.problem_description.clone().unwrap_or_default(), Style::default().bold()),
        Line::raw(""),
        Line::raw(format!("Id:        {}", c.id)),
        Line::raw(format!("Reported:  {} by {} ({}, {})", c.date, c.author, c.site, c.role)),
        Line::raw(format!("Type:      {}", c.problem_type.map(|t| t.label()).unwrap_or("-"))),
        Line::raw(format!("Urgency:   {}", c.urgency.map(|u| u.label()).unwrap_or("-"))),
        Line::raw(format!("Patients:  {}", if c.patient_impact { "affected" } else { "not affected" })),
        Line::styled(
            format!("Status:    {}", p.status.label()),
            Style::default().fg(status_color(p.status)),
        ),
    ];
    if let Some(updated) = p.last_updated {
        lines.push(Line::raw(format!("Updated:   {}", updated.format("%Y-%m-%d %H:%M"))));
    }
    if let Some(note) = &p.resolution_note {
        lines.push(Line::raw(format!("Note:      {}", note)));
    }
    frame.render_widget(
        Paragraph::new(lines).block(detail_block).wrap(Wrap { trim: false }),
        layout[1],
    );
}

fn draw_kudos(frame: &mut Frame, app: &App, area: Rect) {
    let block = bordered(" Kudos ".to_string());
    let feed = app.recent_kudos();
    if feed.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        draw_empty(frame, inner, "No kudos yet");
        return;
    }

    let items: Vec<ListItem> = feed
        .iter()
        .map(|k| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(format!("{} ", k.category.label())),
                    Span::styled(k.from.clone(), Style::default().bold()),
                    Span::raw(" → "),
                    Span::styled(k.to.clone(), Style::default().bold().fg(Color::Green)),
                    Span::styled(
                        format!("  {}", k.created_at.format("%Y-%m-%d %H:%M")),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
                Line::raw(format!("   {}", k.message)),
            ])
        })
        .collect();
    render_list(frame, app, area, block, items);
}

fn draw_ideas(frame: &mut Frame, app: &App, area: Rect) {
    let block = bordered(" Ideas ".to_string());
    let feed = app.recent_ideas();
    if feed.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        draw_empty(frame, inner, "No ideas yet");
        return;
    }

    let items: Vec<ListItem> = feed
        .iter()
        .map(|i| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(format!("{} ", i.category.label())),
                    Span::styled(i.title.clone(), Style::default().bold()),
                    Span::styled(format!("  by {}", i.author), Style::default().fg(Color::DarkGray)),
                ]),
                Line::raw(format!("   {}", i.description)),
            ])
        })
        .collect();
    render_list(frame, app, area, block, items);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 22.min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: (area.width - popup_width) / 2,
        y: (area.height - popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let help_text = r#"
  Tabs
  ───────────────────────────────
  Tab, l, →     Next tab
  Shift+Tab, h  Previous tab
  1-5           Jump to tab

  Lists
  ───────────────────────────────
  j/k, ↑/↓      Move up/down
  g / G         Top / bottom
  +/-           Widen / narrow period
  r             Refresh

  Problems
  ───────────────────────────────
  s             Move to next status
  a             Toggle open / all

  Press ? or Esc to close
"#;

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(help, popup_area);
}

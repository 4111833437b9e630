use chrono::{Local, NaiveDate};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::{ColoredString, Colorize};
use huddle::error::STORAGE_FAILURE;
use huddle::forms::{submit_checkin, submit_idea, submit_kudos, CheckInForm, IdeaForm, KudosForm};
use huddle::stats::{dashboard, filter_history, recent, HistoryFilter, FEED_LIMIT};
use huddle::status::{list_problems, update_status, StatusUpdateForm};
use huddle::weather::weather_for_window;
use huddle::{
    export, Config, IdeaCategory, KudosCategory, Mood, ProblemKind, ProblemStatus, Store,
    StoreError, Urgency, WeatherReport, WeatherTier, Workload,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(author, version, about = "Daily check-in board for small teams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web dashboard
    Serve {
        /// Interface to bind (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Open the terminal dashboard
    Tui,

    /// Post a daily check-in
    Checkin(CheckinArgs),

    /// Send kudos to a teammate
    Kudos {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        category: KudosCategory,
        #[arg(long)]
        message: String,
    },

    /// Suggest an improvement idea
    Idea {
        #[arg(long)]
        author: String,
        #[arg(long)]
        category: IdeaCategory,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },

    /// List reported problems (open ones by default)
    Problems {
        /// Only these statuses, comma separated
        #[arg(long, value_delimiter = ',', conflicts_with = "all")]
        status: Vec<ProblemStatus>,

        /// Every problem, whatever its status
        #[arg(long)]
        all: bool,
    },

    /// Record a new status for a problem
    Status {
        /// Id of the check-in that reported the problem
        problem_id: String,

        /// pending, in-progress or resolved
        status: ProblemStatus,

        /// Resolution note (kept for `resolved` only)
        #[arg(long)]
        note: Option<String>,
    },

    /// Show the team weather
    Weather {
        /// Window in days (default from config)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show dashboard statistics
    Stats {
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Show check-in history
    History(FilterArgs),

    /// Show the latest kudos
    KudosFeed,

    /// Show the latest ideas
    IdeasFeed,

    /// Export check-ins as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print shell completions
    Completion {
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct CheckinArgs {
    #[arg(long)]
    author: String,
    #[arg(long)]
    site: String,
    #[arg(long)]
    role: String,
    /// awful, low, neutral, good or great
    #[arg(long)]
    mood: Mood,
    /// 1 to 5
    #[arg(long)]
    energy: u8,
    /// calm, normal, busy or overloaded
    #[arg(long)]
    workload: Workload,
    /// Day the check-in is about (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Describe a problem to report it
    #[arg(long)]
    problem: Option<String>,
    #[arg(long, requires = "problem")]
    problem_type: Option<ProblemKind>,
    #[arg(long, requires = "problem")]
    urgency: Option<Urgency>,
    #[arg(long, requires = "problem")]
    patient_impact: bool,

    /// Today's win
    #[arg(long)]
    win: Option<String>,
    /// What you need help with
    #[arg(long)]
    help_needed: Option<String>,
    #[arg(long)]
    comment: Option<String>,
}

impl From<CheckinArgs> for CheckInForm {
    fn from(args: CheckinArgs) -> Self {
        CheckInForm {
            author: args.author,
            site: args.site,
            role: args.role,
            date: args.date,
            mood: args.mood,
            energy: args.energy,
            workload: args.workload,
            has_problem: args.problem.is_some(),
            problem_type: args.problem_type,
            problem_description: args.problem,
            urgency: args.urgency,
            patient_impact: args.patient_impact,
            win: args.win,
            help_needed: args.help_needed,
            comment: args.comment,
        }
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Only this person (repeatable)
    #[arg(long = "author", value_delimiter = ',')]
    authors: Vec<String>,

    /// Only this site (repeatable)
    #[arg(long = "site", value_delimiter = ',')]
    sites: Vec<String>,

    /// Trailing window, 1 to 30 days
    #[arg(long, default_value = "7")]
    days: u32,
}

impl From<FilterArgs> for HistoryFilter {
    fn from(args: FilterArgs) -> Self {
        HistoryFilter {
            authors: args.authors,
            sites: args.sites,
            days: args.days,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env("HUDDLE_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Log lines would tear through the alternate screen
    let default_filter = match cli.command {
        Command::Tui => "off",
        _ => "huddle=info",
    };
    init_tracing(default_filter);

    if let Err(e) = run(cli.command) {
        let message = if let Some(err) = e.downcast_ref::<huddle::Error>() {
            if let huddle::Error::Store(source) = err {
                tracing::error!(error = %source, "storage failure");
            }
            err.user_message()
        } else if let Some(err) = e.downcast_ref::<StoreError>() {
            tracing::error!(error = %err, "storage failure");
            STORAGE_FAILURE.to_string()
        } else {
            e.to_string()
        };
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(command: Command) -> CliResult {
    let config = Config::load();
    let store = Store::open_default();
    let today = Local::now().date_naive();

    match command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            huddle::serve::start(&host, port, store, config)?;
        }

        Command::Tui => huddle::tui::run(store, config)?,

        Command::Checkin(args) => {
            let record = submit_checkin(&store, &config, args.into())?;
            println!("{} {}", "Check-in saved".green().bold(), record.id.dimmed());
            if record.has_problem {
                println!(
                    "   Problem filed as {}, track it with {}",
                    ProblemStatus::Pending.label(),
                    format!("huddle status {} <STATUS>", record.id).cyan()
                );
            }
        }

        Command::Kudos {
            from,
            to,
            category,
            message,
        } => {
            let record = submit_kudos(
                &store,
                &config,
                KudosForm {
                    from,
                    to,
                    category,
                    message,
                },
            )?;
            println!("{} {} → {}", "Kudos sent".green().bold(), record.from, record.to);
        }

        Command::Idea {
            author,
            category,
            title,
            description,
        } => {
            let record = submit_idea(
                &store,
                &config,
                IdeaForm {
                    author,
                    category,
                    title,
                    description,
                },
            )?;
            println!("{} {}", "Idea saved".green().bold(), record.title);
        }

        Command::Problems { status, all } => {
            let filter = if all {
                Vec::new()
            } else if status.is_empty() {
                ProblemStatus::OPEN.to_vec()
            } else {
                status
            };
            let problems = list_problems(&store.checkins()?, &store.status_events()?, &filter);
            if problems.is_empty() {
                println!("{}", "No problems to show".dimmed());
            }
            for p in &problems {
                let c = &p.checkin;
                println!(
                    "{} {} {}",
                    status_colored(p.status),
                    c.id.dimmed(),
                    c.problem_description.as_deref().unwrap_or_default().bold()
                );
                println!(
                    "   {} · {} · {} · {}{}",
                    c.date,
                    c.author,
                    c.site,
                    c.urgency.map(|u| u.label()).unwrap_or("-"),
                    if c.patient_impact { " · patients affected" } else { "" }
                );
                if let Some(note) = &p.resolution_note {
                    println!("   {} {}", "Resolution:".green(), note);
                }
            }
        }

        Command::Status {
            problem_id,
            status,
            note,
        } => {
            let event = update_status(
                &store,
                StatusUpdateForm {
                    problem_id,
                    status,
                    resolution_note: note,
                },
            )?;
            println!(
                "{} {} → {}",
                "Status updated".green().bold(),
                event.problem_id,
                status_colored(event.status)
            );
        }

        Command::Weather { days } => {
            let days = days.unwrap_or(config.weather.window_days);
            let report = weather_for_window(&store.checkins()?, today, days);
            print_weather(&report, days);
        }

        Command::Stats { days } => {
            let stats = dashboard(&store.checkins()?, today, days.max(1));
            println!("{}", format!("Statistics, last {} day(s)", stats.days).cyan().bold());
            if stats.is_empty() {
                println!("{}", "No check-ins in this period".dimmed());
                return Ok(());
            }
            println!(
                "   {} check-ins · {} problem(s) · mood {:.2}/5 · energy {:.2}/5",
                stats.checkins,
                stats.problems,
                stats.mean_mood.unwrap_or_default(),
                stats.mean_energy.unwrap_or_default()
            );
            println!("\n{}", "Mood".bold());
            for m in stats.mood_distribution.iter().rev() {
                println!("   {} {:<10} {}", m.mood.label(), m.mood.as_str(), m.count);
            }
            println!("\n{}", "Per site".bold());
            for s in &stats.sites {
                println!(
                    "   {:<12} {:>3} check-ins · mood {:.2} · energy {:.2}",
                    s.site, s.checkins, s.mean_mood, s.mean_energy
                );
            }
            println!("\n{}", "Per day".bold());
            for d in &stats.daily {
                println!(
                    "   {} {:>3} check-ins · mood {:.2} · energy {:.2}",
                    d.date, d.checkins, d.mean_mood, d.mean_energy
                );
            }
        }

        Command::History(filter) => {
            let checkins = store.checkins()?;
            let rows = filter_history(&checkins, &filter.into(), today);
            if rows.is_empty() {
                println!("{}", "No check-ins match".dimmed());
            }
            for c in rows {
                let problem = if c.has_problem {
                    "  ⚠ problem".yellow()
                } else {
                    "".normal()
                };
                println!(
                    "{} {} {} · {} · {} · energy {}/5 · {}{}",
                    c.date.to_string().dimmed(),
                    c.mood.label(),
                    c.author.bold(),
                    c.site,
                    c.role,
                    c.energy,
                    c.workload.as_str(),
                    problem
                );
                if let Some(win) = &c.win {
                    println!("   {} {}", "win:".green(), win);
                }
                if let Some(help) = &c.help_needed {
                    println!("   {} {}", "help:".yellow(), help);
                }
                if let Some(comment) = &c.comment {
                    println!("   {} {}", "note:".dimmed(), comment);
                }
            }
        }

        Command::KudosFeed => {
            let kudos = store.kudos()?;
            if kudos.is_empty() {
                println!("{}", "No kudos yet".dimmed());
            }
            for k in recent(&kudos, FEED_LIMIT) {
                println!(
                    "{} {} → {} {}",
                    k.category.label(),
                    k.from.bold(),
                    k.to.green().bold(),
                    k.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                );
                println!("   {}", k.message);
            }
        }

        Command::IdeasFeed => {
            let ideas = store.ideas()?;
            if ideas.is_empty() {
                println!("{}", "No ideas yet".dimmed());
            }
            for i in recent(&ideas, FEED_LIMIT) {
                println!(
                    "{} {} {}",
                    i.category.label(),
                    i.title.bold(),
                    format!("by {}", i.author).dimmed()
                );
                println!("   {}", i.description);
            }
        }

        Command::Export { output, filter } => {
            let checkins = store.checkins()?;
            let events = store.status_events()?;
            let rows = filter_history(&checkins, &filter.into(), today);
            let csv = export::checkins_to_csv(&rows, &events);
            match output {
                Some(path) => {
                    export::write_csv(&path, &csv).map_err(|e| {
                        tracing::error!(path = %path.display(), error = %e, "export write failed");
                        STORAGE_FAILURE
                    })?;
                    eprintln!(
                        "{} {} check-in(s) to {}",
                        "Exported".green(),
                        rows.len(),
                        path.display()
                    );
                }
                None => print!("{}", csv),
            }
        }

        Command::Completion { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            generate(shell, &mut command, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn status_colored(status: ProblemStatus) -> ColoredString {
    let label = format!("[{}]", status.as_str());
    match status {
        ProblemStatus::Pending => label.yellow(),
        ProblemStatus::InProgress => label.cyan(),
        ProblemStatus::Resolved => label.green(),
    }
}

fn print_weather(report: &WeatherReport, days: u32) {
    match report {
        WeatherReport::NoData => {
            println!("{} No check-ins in the last {} day(s)", report.icon(), days);
        }
        WeatherReport::Scored(w) => {
            let label = w.label();
            let label = match w.tier {
                WeatherTier::Excellent | WeatherTier::Good => label.green(),
                WeatherTier::Moderate => label.yellow(),
                WeatherTier::Tense | WeatherTier::Critical => label.red(),
            };
            println!("{} Team weather: {}", w.tier.icon(), label.bold());
            println!(
                "   {} check-ins over {} day(s) · mood {:.1}/5 · energy {:.1}/5 · problems {:.0}%",
                w.checkins,
                days,
                w.mean_mood,
                w.mean_energy,
                w.problem_rate * 100.0
            );
        }
    }
}

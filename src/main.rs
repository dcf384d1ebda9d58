use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;

use maia_learn::catalog::Catalog;
use maia_learn::config::Config;
use maia_learn::content;
use maia_learn::events::EventBus;
use maia_learn::focus::SharedFocus;
use maia_learn::i18n::Language;
use maia_learn::logging::init_tracing;
use maia_learn::store;
use maia_learn::tracker::AdvanceOutcome;
use maia_learn::{AppContext, MaiaError};

#[derive(Parser, Debug)]
#[command(name = "maia")]
#[command(about = "Step through learn lines and track learner progress")]
struct Args {
    /// JSON file with the learn lines
    #[arg(long, env = "MAIA_CONTENT")]
    content: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List learn lines with their availability
    Lines,
    /// List all tags in the learn graph
    Tags,
    /// Show the stored status of a line
    Status { id: String },
    /// Begin or resume a line
    Start { id: String },
    /// Move to the next content item of a line
    Advance { id: String },
    /// Mark a line mastered
    Complete { id: String },
    /// Suggest what to study next
    Recommend {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Overall completion percentage
    Progress,
    /// Show or change the interface language
    Language { code: Option<String> },
    /// Delete all progress
    Reset,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let args = Args::parse();
    match run(&config, args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, args: Args) -> Result<(), MaiaError> {
    let lines = content::load_lines(&args.content)?;
    let backend = store::open(config)?;
    let events = EventBus::new();
    let focus = SharedFocus::new();
    let catalog = Arc::new(Catalog::new(lines).with_events(events.clone()));
    let mut app = AppContext::new(
        catalog,
        backend,
        Arc::new(focus.clone()),
        events,
        config.language,
    );

    match args.command {
        Command::Lines => {
            let graph = app.catalog().snapshot();
            if graph.is_empty() {
                println!("{}", app.i18n().t("lgm.noItems"));
            }
            for line in graph.lines() {
                let badge = app
                    .availability(&line.id)
                    .map(|availability| app.i18n().t(&format!("lgm.status.{}", availability.as_str())))
                    .unwrap_or_default();
                let title = app.line_title(&line.id).unwrap_or_else(|| line.title.clone());
                println!("{:<24} {:<12} {}", line.id, badge, title);
                if !line.prerequisites.is_empty() {
                    println!("{:<24} {} {}", "", app.i18n().t("lgm.prereq"), line.prerequisites.join(", "));
                }
            }
        }
        Command::Tags => {
            for tag in app.catalog().snapshot().all_tags() {
                println!("{tag}");
            }
        }
        Command::Status { id } => match app.tracker().status(&id) {
            Some(status) => print_json(status)?,
            None => println!("{id}: {}", maia_learn::profile::LineStatus::NotStarted.as_str()),
        },
        Command::Start { id } => {
            if app.set_current_line(Some(id.as_str())) {
                if let Some(status) = app.tracker().status(&id) {
                    print_json(status)?;
                }
            } else {
                println!("unknown learn line: {id}");
            }
        }
        Command::Advance { id } => match app.tracker_mut().advance(&id) {
            AdvanceOutcome::UnknownLine => println!("unknown learn line: {id}"),
            AdvanceOutcome::NoStep => println!("{id}: no step at the current position"),
            AdvanceOutcome::AtEnd => println!("{id}: end of line reached"),
            AdvanceOutcome::Moved { cursor: (step, content), hops } => {
                println!("{id}: step {step}, content {content} ({hops} moved)");
                let focused = focus.current();
                if focused.active {
                    println!(
                        "focus: {} = {} ({} = {})",
                        focused.left_side, focused.right_side, focused.x_symbol, focused.x_value
                    );
                }
            }
        },
        Command::Complete { id } => match app.tracker_mut().complete(&id) {
            Some(status) => print_json(&status)?,
            None => println!("unknown learn line: {id}"),
        },
        Command::Recommend { limit } => {
            let limit = limit.unwrap_or(config.recommend_limit);
            let recommended = app.recommended(limit);
            if recommended.is_empty() {
                println!("{}", app.i18n().t("learnLines.startPrompt"));
            }
            for id in recommended {
                let title = app.line_title(&id).unwrap_or_default();
                println!("{id:<24} {title}");
            }
        }
        Command::Progress => {
            let percent = app.progress().to_string();
            println!("{}", app.i18n().t_with("progress.overall", &[("percent", percent.as_str())]));
        }
        Command::Language { code } => match code {
            Some(code) => {
                let language: Language = code.parse().map_err(MaiaError::Config)?;
                app.set_language(language);
                println!("{language}");
            }
            None => println!("{}", app.i18n().language()),
        },
        Command::Reset => {
            app.debug_reset();
            println!("profile {} created", app.tracker().profile().id);
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), MaiaError> {
    let rendered = serde_json::to_string_pretty(value).map_err(maia_learn::StoreError::from)?;
    println!("{rendered}");
    Ok(())
}

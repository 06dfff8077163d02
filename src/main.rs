mod action;
mod api;
mod app;
mod auth;
mod cli;
mod config;
mod envelope;
mod error;
mod event;
mod followup;
mod paging;
mod signal;
mod store;
#[cfg(test)]
mod testing;
mod tui;
mod types;
mod ui;

use std::fs::OpenOptions;
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::api::{Marketplace, RestClient};
use crate::app::App;
use crate::auth::Session;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::PropdeskError;
use crate::event::Event;
use crate::signal::RefreshSignal;
use crate::store::Store;
use crate::tui::EventHandler;

type MainResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> MainResult {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = Config::load().with_overrides(cli.base_url, cli.page_size);
    let store = Store::open_default()
        .ok_or_else(|| PropdeskError::Config("no data directory for this platform".to_string()))?;

    match cli.command {
        Some(Command::Login {
            token,
            user_id,
            name,
            role,
        }) => cli::login(
            &store,
            Session {
                token,
                user_id,
                name,
                role,
            },
        ),
        Some(Command::Logout) => cli::logout(&store),
        Some(Command::Draft { import, clear }) => cli::draft(&store, import, clear),
        Some(Command::List {
            kind,
            pages,
            all,
            search,
        }) => {
            let session = auth::load_session(&store, &config.api.token_env)?;
            let api = connect(&config, &session);
            let pages = if all { None } else { Some(pages) };
            cli::list(api, kind, config.lists.page_size, pages, search).await
        }
        Some(Command::Assign {
            client_id,
            user_ids,
        }) => {
            let session = auth::load_session(&store, &config.api.token_env)?;
            let api = connect(&config, &session);
            cli::assign(api, &session, client_id, user_ids).await
        }
        None => {
            let session = auth::load_session(&store, &config.api.token_env)?;
            let api = connect(&config, &session);

            // Set up panic hook to restore terminal
            let original_hook = panic::take_hook();
            panic::set_hook(Box::new(move |panic_info| {
                let _ = tui::restore();
                original_hook(panic_info);
            }));

            let result = run(api, session, store, config).await;
            tui::restore()?;

            if let Ok(true) = result {
                println!("Logged out.");
            }
            result.map(|_| ())
        }
    }
}

/// Log to `path` when given, otherwise to stderr. `RUST_LOG` picks the level.
fn init_logging(path: Option<&Path>) -> MainResult {
    let file_layer = match path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = path
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

fn connect(config: &Config, session: &Session) -> Arc<dyn Marketplace> {
    Arc::new(RestClient::new(
        config.api.base_url.clone(),
        Some(session.token.clone()),
    ))
}

/// Run the TUI until the user quits. Returns whether they logged out.
async fn run(
    api: Arc<dyn Marketplace>,
    session: Session,
    store: Store,
    config: Config,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let signal = Arc::new(RefreshSignal::new());

    let mut app = App::new(
        api,
        session,
        store,
        config.lists,
        signal,
        action_tx.clone(),
    );

    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    app.update(Action::Quit);
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(app.logged_out)
}

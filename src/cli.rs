//! Command-line surface: flags shared with the TUI plus headless subcommands.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::api::Marketplace;
use crate::auth::{self, Session};
use crate::followup::CrmService;
use crate::paging::{fetcher, Applied, PageFetcher, PagedList};
use crate::store::{PropertyDraft, Store, PROPERTY_DRAFT};
use crate::types::{
    Client, ContactedProperty, ContentTemplate, CreatedBy, Identified, Property, Role, User,
    Visitor,
};

#[derive(Parser, Debug)]
#[command(name = "propdesk")]
#[command(about = "Browse listings and manage partner clients from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// API base URL, overrides the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Items per page, overrides the config file
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Write logs here instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a list without starting the TUI
    List {
        #[arg(value_enum)]
        kind: ListKind,

        /// Number of pages to fetch
        #[arg(short, long, default_value = "1")]
        pages: u32,

        /// Keep fetching until the server runs out
        #[arg(long)]
        all: bool,

        /// Client search (clients only)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Assign staff users to a client
    Assign {
        client_id: u64,

        #[arg(required = true)]
        user_ids: Vec<u64>,
    },

    /// Store a session for later runs
    Login {
        #[arg(long)]
        token: String,

        #[arg(long)]
        user_id: u64,

        #[arg(long, default_value = "")]
        name: String,

        /// buyer, seller, partner or admin
        #[arg(long)]
        role: Role,
    },

    /// Forget the stored session
    Logout,

    /// Show, import or clear the saved property draft
    Draft {
        /// Replace the draft with this JSON file
        #[arg(long, conflicts_with = "clear")]
        import: Option<PathBuf>,

        #[arg(long)]
        clear: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Properties,
    Recommended,
    Contacted,
    Visitors,
    Clients,
    Templates,
    Users,
}

type CliResult = std::result::Result<(), Box<dyn Error>>;

/// Walk a list the same way the TUI does, printing each row.
async fn print_pages<T>(
    fetcher: Arc<dyn PageFetcher<T>>,
    page_size: u32,
    pages: Option<u32>,
    line: fn(&T) -> String,
) -> CliResult
where
    T: Identified + Send + 'static,
{
    let mut list = PagedList::new(fetcher, page_size);
    let mut fetched = 0;
    let mut outcome = list.refresh_now().await;

    while let Some(applied) = outcome {
        fetched += 1;
        if let Applied::Failed(msg) = applied {
            return Err(msg.into());
        }
        if pages.is_some_and(|max| fetched >= max) {
            break;
        }
        outcome = list.load_more_now().await;
    }

    for item in list.items() {
        println!("{}", line(item));
    }
    let state = list.state();
    if state.is_empty() {
        println!("{}", state.notice().unwrap_or("Nothing found"));
    }
    eprintln!(
        "{} item(s) over {} page(s){}",
        state.len(),
        state.current_page(),
        if state.has_more() { ", more available" } else { "" }
    );
    Ok(())
}

pub async fn list(
    api: Arc<dyn Marketplace>,
    kind: ListKind,
    page_size: u32,
    pages: Option<u32>,
    search: Option<String>,
) -> CliResult {
    match kind {
        ListKind::Properties => {
            print_pages::<Property>(Arc::new(fetcher::properties(api)), page_size, pages, |p| {
                format!("{}\t{}\t{:.0}\t{}\t{}", p.id, p.title, p.price, p.listing_kind, p.city.as_deref().unwrap_or("-"))
            })
            .await
        }
        ListKind::Recommended => {
            print_pages::<Property>(
                Arc::new(fetcher::recommended_properties(api)),
                page_size,
                pages,
                |p| format!("{}\t{}\t{:.0}\t{}", p.id, p.title, p.price, p.listing_kind),
            )
            .await
        }
        ListKind::Contacted => {
            print_pages::<ContactedProperty>(
                Arc::new(fetcher::contacted_properties(api)),
                page_size,
                pages,
                |c| format!("{}\t{}\t{:.0}\t{}", c.property_id, c.title, c.price, c.owner_name.as_deref().unwrap_or("-")),
            )
            .await
        }
        ListKind::Visitors => {
            print_pages::<Visitor>(Arc::new(fetcher::visitors(api)), page_size, pages, |v| {
                format!("{}\t{}\t{}\t{}", v.visitor_id, v.name, v.phone.as_deref().unwrap_or("-"), v.property_id)
            })
            .await
        }
        ListKind::Clients => {
            print_pages::<Client>(
                Arc::new(fetcher::clients(api, search)),
                page_size,
                pages,
                |c| {
                    let follow_up = c
                        .follow_up
                        .as_ref()
                        .map(|f| f.status.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    format!("{}\t{}\t{}\t{}", c.id, c.name, c.phone.as_deref().unwrap_or("-"), follow_up)
                },
            )
            .await
        }
        ListKind::Templates => {
            print_pages::<ContentTemplate>(Arc::new(fetcher::templates(api)), page_size, pages, |t| {
                format!("{}\t{}", t.id, t.title)
            })
            .await
        }
        ListKind::Users => {
            print_pages::<User>(Arc::new(fetcher::users(api)), page_size, pages, |u| {
                format!("{}\t{}\t{}\t{}", u.id, u.name, u.role, u.email.as_deref().unwrap_or("-"))
            })
            .await
        }
    }
}

pub async fn assign(
    api: Arc<dyn Marketplace>,
    session: &Session,
    client_id: u64,
    user_ids: Vec<u64>,
) -> CliResult {
    let mut client = api.get_client(client_id).await?;
    let crm = CrmService::new(
        api,
        CreatedBy {
            user_id: Some(session.user_id),
            name: session.name.clone(),
        },
    );
    crm.assign_users(&mut client, user_ids).await?;
    println!(
        "Assigned {} user(s) to {}",
        client.assigned_users.len(),
        client.name
    );
    Ok(())
}

pub fn login(store: &Store, session: Session) -> CliResult {
    auth::login(store, &session)?;
    println!("Signed in as {} ({})", session.name, session.role);
    Ok(())
}

pub fn logout(store: &Store) -> CliResult {
    auth::logout(store)?;
    println!("Logged out.");
    Ok(())
}

pub fn draft(store: &Store, import: Option<PathBuf>, clear: bool) -> CliResult {
    if clear {
        store.remove(PROPERTY_DRAFT)?;
        println!("Draft cleared.");
        return Ok(());
    }

    if let Some(path) = import {
        let data = std::fs::read_to_string(&path)?;
        let draft: PropertyDraft = serde_json::from_str(&data)?;
        store.save(PROPERTY_DRAFT, &draft)?;
        println!(
            "Draft from {} saved under {}",
            path.display(),
            store.root().display()
        );
    }

    let Some(draft) = store.load::<PropertyDraft>(PROPERTY_DRAFT).filter(|d| !d.is_blank()) else {
        println!("No saved draft.");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&draft)?);
    match draft.validate() {
        Ok(()) => println!("Ready to post."),
        Err(e) => println!("Not ready to post. {}", e),
    }
    Ok(())
}

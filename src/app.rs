use std::sync::Arc;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::action::{Action, ConfirmAction, InputMode, Loaded, Tab};
use crate::api::Marketplace;
use crate::auth::{self, Session};
use crate::config::ListConfig;
use crate::error::{PropdeskError, Result};
use crate::event::Event;
use crate::followup::CrmService;
use crate::paging::{fetcher, Applied, Debouncer, FetchTicket, PageFetcher, PagedList};
use crate::signal::{RefreshSignal, RefreshWatcher, Topic};
use crate::store::{PartnerLogo, Store, PARTNER_LOGO};
use crate::types::{
    ActivityKind, Client, ClientActivity, ContactedProperty, ContentTemplate, CreatedBy,
    Identified, Page, Property, Role, User, Visitor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lists,        // Tabbed list screens
    ClientDetail, // Follow-up + activity timeline for one client
}

/// Ticks a toast stays on screen
const TOAST_TICKS: u8 = 12;

const ALL_TABS: [Tab; 7] = [
    Tab::Properties,
    Tab::Recommended,
    Tab::Contacted,
    Tab::Visitors,
    Tab::Clients,
    Tab::Templates,
    Tab::Users,
];

/// A paged list plus the row the cursor is on.
pub struct ListView<T> {
    pub list: PagedList<T>,
    pub index: usize,
    started: bool,
    /// A refresh was asked for while a fetch was out
    refresh_pending: bool,
    loaded: fn(Result<Page<T>>) -> Loaded,
}

impl<T: Identified + Send + 'static> ListView<T> {
    fn new(
        fetcher: Arc<dyn PageFetcher<T>>,
        page_size: u32,
        loaded: fn(Result<Page<T>>) -> Loaded,
    ) -> Self {
        Self {
            list: PagedList::new(fetcher, page_size),
            index: 0,
            started: false,
            refresh_pending: false,
            loaded,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.list.items().get(self.index)
    }

    /// Has this list been asked for its first page yet?
    pub fn started(&self) -> bool {
        self.started
    }

    fn settle(&mut self, ticket: FetchTicket, result: Result<Page<T>>) -> Applied {
        let applied = self.list.settle(ticket, result);
        self.clamp();
        applied
    }

    fn remove(&mut self, id: &T::Id) {
        self.list.remove(id);
        self.clamp();
    }

    fn clamp(&mut self) {
        let len = self.list.items().len();
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }
}

/// The list operations the reducer needs without knowing the row type.
trait Pane {
    fn refresh(&mut self, tx: &mpsc::UnboundedSender<Action>) -> bool;
    /// Refresh now, or as soon as the fetch in flight settles.
    fn request_refresh(&mut self, tx: &mpsc::UnboundedSender<Action>);
    fn retry_pending(&mut self, tx: &mpsc::UnboundedSender<Action>);
    fn load_more(&mut self, tx: &mpsc::UnboundedSender<Action>) -> bool;
    fn ensure_started(&mut self, tx: &mpsc::UnboundedSender<Action>);
    fn is_started(&self) -> bool;
    fn move_by(&mut self, delta: isize);
    fn go_to_end(&mut self, top: bool);
    fn near_end(&self, threshold: usize) -> bool;
    fn close(&mut self);
}

impl<T: Identified + Send + 'static> Pane for ListView<T> {
    fn refresh(&mut self, tx: &mpsc::UnboundedSender<Action>) -> bool {
        self.started = true;
        let loaded = self.loaded;
        let granted = self
            .list
            .refresh(tx, move |ticket, result| Action::PageLoaded(ticket, loaded(result)));
        if granted {
            self.refresh_pending = false;
        }
        granted
    }

    fn request_refresh(&mut self, tx: &mpsc::UnboundedSender<Action>) {
        if !self.refresh(tx) {
            self.refresh_pending = true;
        }
    }

    fn retry_pending(&mut self, tx: &mpsc::UnboundedSender<Action>) {
        if self.refresh_pending && !self.list.state().is_fetching() {
            self.refresh(tx);
        }
    }

    fn load_more(&mut self, tx: &mpsc::UnboundedSender<Action>) -> bool {
        let loaded = self.loaded;
        self.list
            .load_more(tx, move |ticket, result| Action::PageLoaded(ticket, loaded(result)))
    }

    fn ensure_started(&mut self, tx: &mpsc::UnboundedSender<Action>) {
        if !self.started {
            self.refresh(tx);
        }
    }

    fn is_started(&self) -> bool {
        self.started()
    }

    fn move_by(&mut self, delta: isize) {
        let len = self.list.items().len();
        if len == 0 {
            self.index = 0;
            return;
        }
        let next = self.index as isize + delta;
        self.index = next.clamp(0, len as isize - 1) as usize;
    }

    fn go_to_end(&mut self, top: bool) {
        self.index = if top {
            0
        } else {
            self.list.items().len().saturating_sub(1)
        };
    }

    fn near_end(&self, threshold: usize) -> bool {
        self.list.near_end(self.index, threshold)
    }

    fn close(&mut self) {
        self.list.close();
    }
}

/// Client-detail mutations that come back as an updated client
#[derive(Debug, Clone)]
enum ClientMutation {
    Schedule(Option<NaiveDate>),
    DeleteFollowUp,
    EditActivity {
        activity_id: u64,
        kind: ActivityKind,
        description: String,
    },
}

/// Blank means "someday".
fn parse_follow_up_date(input: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("someday") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            PropdeskError::Validation("Use YYYY-MM-DD, or leave blank for someday".to_string())
        })
}

pub struct App {
    pub screen: Screen,
    pub session: Session,
    /// Partner branding for the header
    pub brand: Option<String>,
    pub tabs: &'static [Tab],
    pub tab_index: usize,

    pub properties: ListView<Property>,
    pub recommended: ListView<Property>,
    pub contacted: ListView<ContactedProperty>,
    pub visitors: ListView<Visitor>,
    pub clients: ListView<Client>,
    pub templates: ListView<ContentTemplate>,
    pub users: ListView<User>,

    // Client detail
    pub client: Option<Client>,
    pub detail_scroll: usize,
    pub busy: bool,

    pub search: String,
    pub input: Option<(InputMode, String)>,
    pub confirm: Option<ConfirmAction>,
    pub toast: Option<String>,
    toast_ticks: u8,
    pub error: Option<String>,
    pub should_quit: bool,
    pub logged_out: bool,

    settings: ListConfig,
    api: Arc<dyn Marketplace>,
    crm: CrmService,
    store: Store,
    signal: Arc<RefreshSignal>,
    watchers: Vec<RefreshWatcher>,
    load_more: Debouncer<Action>,
    search_debounce: Debouncer<Action>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        api: Arc<dyn Marketplace>,
        session: Session,
        store: Store,
        settings: ListConfig,
        signal: Arc<RefreshSignal>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let size = settings.page_size;
        let author = CreatedBy {
            user_id: Some(session.user_id),
            name: session.name.clone(),
        };
        let watchers = vec![
            signal.watch(Topic::Properties),
            signal.watch(Topic::Clients),
            signal.watch(Topic::Templates),
        ];

        let brand = store
            .load::<PartnerLogo>(PARTNER_LOGO)
            .map(|logo| logo.name)
            .filter(|_| session.role == Role::Partner);

        Self {
            screen: Screen::Lists,
            brand,
            tabs: Tab::for_role(session.role),
            tab_index: 0,

            properties: ListView::new(
                Arc::new(fetcher::properties(Arc::clone(&api))),
                size,
                Loaded::Properties,
            ),
            recommended: ListView::new(
                Arc::new(fetcher::recommended_properties(Arc::clone(&api))),
                size,
                Loaded::Recommended,
            ),
            contacted: ListView::new(
                Arc::new(fetcher::contacted_properties(Arc::clone(&api))),
                size,
                Loaded::Contacted,
            ),
            visitors: ListView::new(
                Arc::new(fetcher::visitors(Arc::clone(&api))),
                size,
                Loaded::Visitors,
            ),
            clients: ListView::new(
                Arc::new(fetcher::clients(Arc::clone(&api), None)),
                size,
                Loaded::Clients,
            ),
            templates: ListView::new(
                Arc::new(fetcher::templates(Arc::clone(&api))),
                size,
                Loaded::Templates,
            ),
            users: ListView::new(
                Arc::new(fetcher::users(Arc::clone(&api))),
                size,
                Loaded::Users,
            ),

            client: None,
            detail_scroll: 0,
            busy: false,

            search: String::new(),
            input: None,
            confirm: None,
            toast: None,
            toast_ticks: 0,
            error: None,
            should_quit: false,
            logged_out: false,

            load_more: Debouncer::new(settings.debounce(), action_tx.clone()),
            search_debounce: Debouncer::new(settings.debounce(), action_tx.clone()),
            settings,
            crm: CrmService::new(Arc::clone(&api), author),
            api,
            store,
            signal,
            watchers,
            session,
            action_tx,
        }
    }

    pub fn current_tab(&self) -> Tab {
        self.tabs
            .get(self.tab_index)
            .copied()
            .unwrap_or(Tab::Properties)
    }

    pub fn selected_activity(&self) -> Option<&ClientActivity> {
        self.client
            .as_ref()
            .and_then(|c| c.activities.get(self.detail_scroll))
    }

    fn pane_mut(&mut self, tab: Tab) -> &mut dyn Pane {
        match tab {
            Tab::Properties => &mut self.properties,
            Tab::Recommended => &mut self.recommended,
            Tab::Contacted => &mut self.contacted,
            Tab::Visitors => &mut self.visitors,
            Tab::Clients => &mut self.clients,
            Tab::Templates => &mut self.templates,
            Tab::Users => &mut self.users,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Init,
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.input.is_some() {
            return match key.code {
                KeyCode::Esc => Action::InputCancel,
                KeyCode::Enter => Action::InputSubmit,
                KeyCode::Backspace => Action::InputBackspace,
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Action::InputChar(c)
                }
                _ => Action::None,
            };
        }

        if self.confirm.is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Action::ConfirmYes,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::ConfirmNo,
                _ => Action::None,
            };
        }

        match self.screen {
            Screen::Lists => self.handle_list_key(key),
            Screen::ClientDetail => self.handle_detail_key(key),
        }
    }

    fn handle_list_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => Action::NextTab,
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => Action::PrevTab,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('/') if self.current_tab() == Tab::Clients => Action::StartSearch,
            KeyCode::Char('d')
                if self.current_tab() == Tab::Properties
                    && matches!(self.session.role, Role::Seller | Role::Admin) =>
            {
                match self.properties.selected() {
                    Some(p) => Action::ShowConfirm(ConfirmAction::DeleteProperty(p.id)),
                    None => Action::None,
                }
            }
            KeyCode::Char('L') => Action::ShowConfirm(ConfirmAction::Logout),
            _ => Action::None,
        }
    }

    fn handle_detail_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Back,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('c') => Action::StartInput(InputMode::Activity(ActivityKind::Call)),
            KeyCode::Char('m') => Action::StartInput(InputMode::Activity(ActivityKind::Message)),
            KeyCode::Char('M') => Action::StartInput(InputMode::Activity(ActivityKind::Meeting)),
            KeyCode::Char('v') => Action::StartInput(InputMode::Activity(ActivityKind::Visit)),
            KeyCode::Char('n') => Action::StartInput(InputMode::Activity(ActivityKind::Note)),
            KeyCode::Char('e') => match self.selected_activity() {
                Some(a) => Action::StartInput(InputMode::EditActivity(a.id)),
                None => Action::None,
            },
            KeyCode::Char('f') => Action::StartInput(InputMode::FollowUpDate),
            KeyCode::Char('x') => Action::ShowConfirm(ConfirmAction::DeleteFollowUp),
            KeyCode::Char('D') => match &self.client {
                Some(c) => Action::ShowConfirm(ConfirmAction::DeleteClient(c.id)),
                None => Action::None,
            },
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some()
            && !matches!(
                action,
                Action::Tick | Action::None | Action::Error(_) | Action::PageLoaded(..)
            )
        {
            self.error = None;
        }

        match action {
            Action::Init => {
                let tx = self.action_tx.clone();
                let tab = self.current_tab();
                self.pane_mut(tab).ensure_started(&tx);
            }
            Action::Quit => {
                self.teardown();
                self.should_quit = true;
            }
            Action::Back => match self.screen {
                Screen::Lists => {
                    self.teardown();
                    self.should_quit = true;
                }
                Screen::ClientDetail => {
                    self.screen = Screen::Lists;
                    self.client = None;
                    self.detail_scroll = 0;
                }
            },
            Action::ScrollUp => match self.screen {
                Screen::Lists => {
                    let tab = self.current_tab();
                    self.pane_mut(tab).move_by(-1);
                }
                Screen::ClientDetail => {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                }
            },
            Action::ScrollDown => match self.screen {
                Screen::Lists => {
                    let tab = self.current_tab();
                    self.pane_mut(tab).move_by(1);
                    self.maybe_load_more(tab);
                }
                Screen::ClientDetail => {
                    let max = self
                        .client
                        .as_ref()
                        .map(|c| c.activities.len().saturating_sub(1))
                        .unwrap_or(0);
                    if self.detail_scroll < max {
                        self.detail_scroll += 1;
                    }
                }
            },
            Action::GoToTop | Action::GoToBottom if self.screen == Screen::Lists => {
                let tab = self.current_tab();
                let top = matches!(action, Action::GoToTop);
                self.pane_mut(tab).go_to_end(top);
                if !top {
                    self.maybe_load_more(tab);
                }
            }
            Action::GoToTop | Action::GoToBottom => {}
            Action::Select => {
                if self.screen == Screen::Lists && self.current_tab() == Tab::Clients {
                    if let Some(client) = self.clients.selected().cloned() {
                        self.open_client(client);
                    }
                }
            }
            Action::NextTab | Action::PrevTab => {
                if self.screen == Screen::Lists && !self.tabs.is_empty() {
                    let len = self.tabs.len();
                    self.tab_index = if matches!(action, Action::NextTab) {
                        (self.tab_index + 1) % len
                    } else {
                        (self.tab_index + len - 1) % len
                    };
                    self.load_more.cancel();
                    let tx = self.action_tx.clone();
                    let tab = self.current_tab();
                    self.pane_mut(tab).ensure_started(&tx);
                }
            }
            Action::Tick => self.on_tick(),

            // Paged lists
            Action::Refresh => match self.screen {
                Screen::Lists => {
                    let tx = self.action_tx.clone();
                    let tab = self.current_tab();
                    if !self.pane_mut(tab).refresh(&tx) {
                        debug!(?tab, "refresh ignored, already fetching");
                    }
                }
                Screen::ClientDetail => {
                    if let Some(id) = self.client.as_ref().map(|c| c.id) {
                        self.spawn_load_client(id);
                    }
                }
            },
            Action::LoadMore(tab) => {
                let tx = self.action_tx.clone();
                if self.pane_mut(tab).load_more(&tx) {
                    debug!(?tab, "loading next page");
                }
            }
            Action::PageLoaded(ticket, loaded) => self.settle(ticket, loaded),

            // Search
            Action::StartSearch => {
                self.input = Some((InputMode::Search, self.search.clone()));
            }
            Action::ApplySearch(query) => self.apply_search(query),

            // Input line
            Action::StartInput(mode) => {
                if self.client.is_none() {
                    return;
                }
                if self.busy {
                    self.show_toast("Still saving, try again in a moment");
                    return;
                }
                let buffer = match mode {
                    InputMode::EditActivity(id) => self
                        .client
                        .as_ref()
                        .and_then(|c| c.activities.iter().find(|a| a.id == id))
                        .map(|a| a.description.clone())
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                self.input = Some((mode, buffer));
            }
            Action::InputChar(c) => {
                if let Some((mode, buffer)) = self.input.as_mut() {
                    buffer.push(c);
                    if *mode == InputMode::Search {
                        self.search_debounce
                            .trigger(Action::ApplySearch(buffer.clone()));
                    }
                }
            }
            Action::InputBackspace => {
                if let Some((mode, buffer)) = self.input.as_mut() {
                    buffer.pop();
                    if *mode == InputMode::Search {
                        self.search_debounce
                            .trigger(Action::ApplySearch(buffer.clone()));
                    }
                }
            }
            Action::InputCancel => {
                self.input = None;
                self.search_debounce.cancel();
            }
            Action::InputSubmit => {
                if let Some((mode, buffer)) = self.input.take() {
                    self.submit_input(mode, buffer);
                }
            }

            // Client detail
            Action::ClientLoaded(client) => {
                if self.client.as_ref().map(|c| c.id) == Some(client.id) {
                    self.clients.list.replace((*client).clone());
                    self.client = Some(*client);
                }
            }
            Action::ClientUpdated(client, message) => {
                self.busy = false;
                self.accept_client(*client);
                self.show_toast(message);
            }
            Action::ActivityLogged(client, outcome) => {
                self.busy = false;
                self.accept_client(*client);
                let message = outcome
                    .degraded_notice()
                    .unwrap_or_else(|| "Activity added".to_string());
                self.show_toast(message);
            }
            Action::ClientDeleted(id) => {
                self.busy = false;
                self.clients.remove(&id);
                if self.client.as_ref().map(|c| c.id) == Some(id) {
                    self.screen = Screen::Lists;
                    self.client = None;
                    self.detail_scroll = 0;
                }
                self.signal.bump(Topic::Clients);
                self.show_toast("Client deleted");
            }
            Action::PropertyDeleted(id) => {
                self.properties.remove(&id);
                self.recommended.remove(&id);
                self.signal.bump(Topic::Properties);
                self.show_toast("Property deleted");
            }
            Action::MutationFailed(msg) => {
                self.busy = false;
                self.show_toast(msg);
            }

            // Confirmation
            Action::ShowConfirm(confirm) => {
                if self.busy && confirm != ConfirmAction::Logout {
                    self.show_toast("Still saving, try again in a moment");
                    return;
                }
                self.confirm = Some(confirm);
            }
            Action::ConfirmNo => {
                self.confirm = None;
            }
            Action::ConfirmYes => {
                if let Some(confirm) = self.confirm.take() {
                    self.execute_confirmed(confirm);
                }
            }

            Action::Error(msg) => {
                self.error = Some(msg);
            }
            Action::None => {}
        }
    }

    fn maybe_load_more(&mut self, tab: Tab) {
        let threshold = self.settings.load_more_threshold;
        if self.pane_mut(tab).near_end(threshold) {
            self.load_more.trigger(Action::LoadMore(tab));
        }
    }

    fn settle(&mut self, ticket: FetchTicket, loaded: Loaded) {
        let tab = loaded.tab();
        let applied = match loaded {
            Loaded::Properties(r) => self.properties.settle(ticket, r),
            Loaded::Recommended(r) => self.recommended.settle(ticket, r),
            Loaded::Contacted(r) => self.contacted.settle(ticket, r),
            Loaded::Visitors(r) => self.visitors.settle(ticket, r),
            Loaded::Clients(r) => self.clients.settle(ticket, r),
            Loaded::Templates(r) => self.templates.settle(ticket, r),
            Loaded::Users(r) => self.users.settle(ticket, r),
        };
        debug!(page = ticket.page, ?applied, "page settled");
        let tx = self.action_tx.clone();
        self.pane_mut(tab).retry_pending(&tx);
    }

    fn on_tick(&mut self) {
        if self.toast_ticks > 0 {
            self.toast_ticks -= 1;
            if self.toast_ticks == 0 {
                self.toast = None;
            }
        }

        let changed: Vec<Topic> = self
            .watchers
            .iter_mut()
            .filter_map(|w| w.changed_since_last().then(|| w.topic()))
            .collect();
        let tx = self.action_tx.clone();
        for topic in changed {
            let tabs: &[Tab] = match topic {
                Topic::Properties => &[Tab::Properties, Tab::Recommended],
                Topic::Clients => &[Tab::Clients],
                Topic::Templates => &[Tab::Templates],
            };
            for &tab in tabs {
                let pane = self.pane_mut(tab);
                if pane.is_started() {
                    debug!(?tab, "data changed elsewhere, refreshing");
                    pane.request_refresh(&tx);
                }
            }
        }
        for tab in ALL_TABS {
            self.pane_mut(tab).retry_pending(&tx);
        }
    }

    fn apply_search(&mut self, query: String) {
        let query = query.trim().to_string();
        if query == self.search && self.clients.started {
            return;
        }
        self.search = query;
        let search = (!self.search.is_empty()).then(|| self.search.clone());
        self.clients
            .list
            .reset_with(Arc::new(fetcher::clients(Arc::clone(&self.api), search)));
        self.clients.index = 0;
        let tx = self.action_tx.clone();
        self.clients.refresh(&tx);
    }

    fn submit_input(&mut self, mode: InputMode, buffer: String) {
        match mode {
            InputMode::Search => {
                self.search_debounce.cancel();
                self.apply_search(buffer);
            }
            InputMode::Activity(kind) => self.spawn_log_activity(kind, buffer),
            InputMode::EditActivity(activity_id) => {
                let kind = self
                    .client
                    .as_ref()
                    .and_then(|c| c.activities.iter().find(|a| a.id == activity_id))
                    .map(|a| a.kind);
                match kind {
                    Some(kind) => self.spawn_client_mutation(ClientMutation::EditActivity {
                        activity_id,
                        kind,
                        description: buffer,
                    }),
                    None => self.show_toast("That activity is no longer on this client"),
                }
            }
            InputMode::FollowUpDate => match parse_follow_up_date(&buffer) {
                Ok(date) => self.spawn_client_mutation(ClientMutation::Schedule(date)),
                Err(e) => self.show_toast(e.to_string()),
            },
        }
    }

    fn execute_confirmed(&mut self, confirm: ConfirmAction) {
        match confirm {
            ConfirmAction::DeleteClient(id) => self.spawn_delete_client(id),
            ConfirmAction::DeleteFollowUp => {
                self.spawn_client_mutation(ClientMutation::DeleteFollowUp)
            }
            ConfirmAction::DeleteProperty(id) => self.spawn_delete_property(id),
            ConfirmAction::Logout => self.logout(),
        }
    }

    fn accept_client(&mut self, client: Client) {
        self.clients.list.replace(client.clone());
        if self.client.as_ref().map(|c| c.id) == Some(client.id) {
            self.client = Some(client);
        }
        self.signal.bump(Topic::Clients);
    }

    fn open_client(&mut self, client: Client) {
        let id = client.id;
        self.screen = Screen::ClientDetail;
        self.detail_scroll = 0;
        self.client = Some(client);
        self.spawn_load_client(id);
    }

    fn show_toast(&mut self, msg: impl Into<String>) {
        self.toast = Some(msg.into());
        self.toast_ticks = TOAST_TICKS;
    }

    fn logout(&mut self) {
        match auth::logout(&self.store) {
            Ok(()) => {
                info!(user_id = self.session.user_id, "logged out");
                self.logged_out = true;
                self.teardown();
                self.should_quit = true;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Nothing started by this app reports back after this.
    fn teardown(&mut self) {
        self.load_more.cancel();
        self.search_debounce.cancel();
        for tab in ALL_TABS {
            self.pane_mut(tab).close();
        }
    }

    fn spawn_load_client(&self, client_id: u64) {
        let tx = self.action_tx.clone();
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            match api.get_client(client_id).await {
                Ok(client) => {
                    tx.send(Action::ClientLoaded(Box::new(client))).ok();
                }
                Err(e) => {
                    tx.send(e.into()).ok();
                }
            }
        });
    }

    fn spawn_log_activity(&mut self, kind: ActivityKind, description: String) {
        let Some(mut client) = self.client.clone() else {
            return;
        };
        self.busy = true;
        let tx = self.action_tx.clone();
        let crm = self.crm.clone();
        tokio::spawn(async move {
            let action = match crm.log_activity(&mut client, kind, &description).await {
                Ok(outcome) => Action::ActivityLogged(Box::new(client), outcome),
                Err(e) => Action::MutationFailed(e.to_string()),
            };
            tx.send(action).ok();
        });
    }

    fn spawn_client_mutation(&mut self, mutation: ClientMutation) {
        let Some(mut client) = self.client.clone() else {
            return;
        };
        self.busy = true;
        let tx = self.action_tx.clone();
        let crm = self.crm.clone();
        let user_id = self.session.user_id;
        tokio::spawn(async move {
            let result = match mutation {
                ClientMutation::Schedule(date) => crm
                    .schedule_follow_up(&mut client, date, user_id)
                    .await
                    .map(|()| "Follow-up scheduled"),
                ClientMutation::DeleteFollowUp => crm
                    .delete_follow_up(&mut client)
                    .await
                    .map(|()| "Follow-up removed"),
                ClientMutation::EditActivity {
                    activity_id,
                    kind,
                    description,
                } => crm
                    .edit_activity(&mut client, activity_id, kind, &description)
                    .await
                    .map(|()| "Activity updated"),
            };
            let action = match result {
                Ok(message) => Action::ClientUpdated(Box::new(client), message.to_string()),
                Err(e) => Action::MutationFailed(e.to_string()),
            };
            tx.send(action).ok();
        });
    }

    fn spawn_delete_client(&mut self, client_id: u64) {
        self.busy = true;
        let tx = self.action_tx.clone();
        let crm = self.crm.clone();
        tokio::spawn(async move {
            let action = match crm.delete_client(client_id).await {
                Ok(()) => Action::ClientDeleted(client_id),
                Err(e) => Action::MutationFailed(e.to_string()),
            };
            tx.send(action).ok();
        });
    }

    fn spawn_delete_property(&self, property_id: u64) {
        let tx = self.action_tx.clone();
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let action = match api.delete_property(property_id).await {
                Ok(()) => Action::PropertyDeleted(property_id),
                Err(e) => Action::MutationFailed(e.to_string()),
            };
            tx.send(action).ok();
        });
    }
}

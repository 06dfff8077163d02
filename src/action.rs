use crate::error::{PropdeskError, Result};
use crate::followup::ActivityOutcome;
use crate::paging::FetchTicket;
use crate::types::{
    ActivityKind, Client, ContactedProperty, ContentTemplate, Page, Property, Role, User, Visitor,
};

/// One list screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Properties,
    Recommended,
    Contacted,
    Visitors,
    Clients,
    Templates,
    Users,
}

impl Tab {
    /// Screens reachable by each role, in tab order.
    pub fn for_role(role: Role) -> &'static [Tab] {
        match role {
            Role::Buyer => &[Tab::Properties, Tab::Recommended, Tab::Contacted],
            Role::Seller => &[Tab::Properties, Tab::Visitors],
            Role::Partner => &[Tab::Properties, Tab::Clients, Tab::Templates],
            Role::Admin => &[Tab::Properties, Tab::Users],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Properties => "Properties",
            Tab::Recommended => "Recommended",
            Tab::Contacted => "Contacted",
            Tab::Visitors => "Visitors",
            Tab::Clients => "Clients",
            Tab::Templates => "Templates",
            Tab::Users => "Users",
        }
    }
}

/// A settled page, tagged with the list it belongs to
#[derive(Debug)]
pub enum Loaded {
    Properties(Result<Page<Property>>),
    Recommended(Result<Page<Property>>),
    Contacted(Result<Page<ContactedProperty>>),
    Visitors(Result<Page<Visitor>>),
    Clients(Result<Page<Client>>),
    Templates(Result<Page<ContentTemplate>>),
    Users(Result<Page<User>>),
}

impl Loaded {
    pub fn tab(&self) -> Tab {
        match self {
            Loaded::Properties(_) => Tab::Properties,
            Loaded::Recommended(_) => Tab::Recommended,
            Loaded::Contacted(_) => Tab::Contacted,
            Loaded::Visitors(_) => Tab::Visitors,
            Loaded::Clients(_) => Tab::Clients,
            Loaded::Templates(_) => Tab::Templates,
            Loaded::Users(_) => Tab::Users,
        }
    }
}

/// What to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteClient(u64),
    DeleteFollowUp,
    DeleteProperty(u64),
    Logout,
}

/// What the input line is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Search,
    Activity(ActivityKind),
    /// Rewrite the description of this activity
    EditActivity(u64),
    FollowUpDate,
}

#[derive(Debug)]
pub enum Action {
    Init,
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,
    Select,
    NextTab,
    PrevTab,
    Tick,

    // Paged lists
    Refresh,
    LoadMore(Tab),
    PageLoaded(FetchTicket, Loaded),

    // Search
    StartSearch,
    ApplySearch(String),

    // Input line
    StartInput(InputMode),
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputCancel,

    // Client detail
    ClientLoaded(Box<Client>),
    ClientUpdated(Box<Client>, String),
    ActivityLogged(Box<Client>, ActivityOutcome),
    ClientDeleted(u64),
    PropertyDeleted(u64),
    MutationFailed(String),

    // Confirmation
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    Error(String),
    None,
}

impl From<PropdeskError> for Action {
    fn from(err: PropdeskError) -> Self {
        Action::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_starts_on_properties() {
        for role in [Role::Buyer, Role::Seller, Role::Partner, Role::Admin] {
            assert_eq!(Tab::for_role(role)[0], Tab::Properties);
        }
    }

    #[test]
    fn only_partners_see_clients() {
        assert!(Tab::for_role(Role::Partner).contains(&Tab::Clients));
        assert!(!Tab::for_role(Role::Buyer).contains(&Tab::Clients));
        assert!(!Tab::for_role(Role::Admin).contains(&Tab::Clients));
        assert!(Tab::for_role(Role::Admin).contains(&Tab::Users));
    }

    #[test]
    fn errors_become_error_actions() {
        let action: Action = PropdeskError::Network("offline".to_string()).into();
        assert!(matches!(action, Action::Error(ref m) if m == "Network error: offline"));
    }
}

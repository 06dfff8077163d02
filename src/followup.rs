//! Client follow-ups and the activity timeline.
//!
//! A client has at most one active follow-up. Logging a new activity while a
//! follow-up is pending completes it as a side effect; if that second call
//! fails the activity still stands and the caller gets told separately.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::api::{Marketplace, NewActivity};
use crate::error::{PropdeskError, Result};
use crate::types::{ActivityKind, Client, ClientActivity, CreatedBy, FollowUp, FollowUpStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpState {
    None,
    Pending { id: u64, date: Option<NaiveDate> },
    Completed { id: u64 },
}

impl FollowUpState {
    pub fn of(follow_up: Option<&FollowUp>) -> Self {
        match follow_up {
            None => FollowUpState::None,
            Some(f) => match f.status {
                FollowUpStatus::Pending => FollowUpState::Pending {
                    id: f.id,
                    date: f.date,
                },
                FollowUpStatus::Completed => FollowUpState::Completed { id: f.id },
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FollowUpState::None => "not scheduled",
            FollowUpState::Pending { .. } => "pending",
            FollowUpState::Completed { .. } => "completed",
        }
    }

    pub fn pending_id(&self) -> Option<u64> {
        match self {
            FollowUpState::Pending { id, .. } => Some(*id),
            _ => None,
        }
    }

    fn ensure_can_schedule(&self) -> Result<()> {
        match self {
            FollowUpState::Pending { .. } => Err(PropdeskError::Validation(
                "Client already has a pending follow-up".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn ensure_pending(&self, action: &'static str) -> Result<u64> {
        self.pending_id()
            .ok_or(PropdeskError::InvalidTransition {
                action,
                state: self.name(),
            })
    }
}

/// Mark a pending follow-up as done, locally.
pub fn complete(follow_up: &mut FollowUp) -> Result<()> {
    FollowUpState::of(Some(follow_up)).ensure_pending("complete")?;
    follow_up.status = FollowUpStatus::Completed;
    Ok(())
}

/// What happened to the follow-up when an activity was logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUpUpdate {
    NotApplicable,
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityOutcome {
    pub activity_id: u64,
    pub follow_up: FollowUpUpdate,
}

impl ActivityOutcome {
    /// Text for a secondary notice, if the follow-up could not be updated.
    pub fn degraded_notice(&self) -> Option<String> {
        match &self.follow_up {
            FollowUpUpdate::Failed(msg) => {
                Some(format!("Activity added, but follow-up status update failed: {}", msg))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrmService {
    api: Arc<dyn Marketplace>,
    author: CreatedBy,
}

impl CrmService {
    pub fn new(api: Arc<dyn Marketplace>, author: CreatedBy) -> Self {
        Self { api, author }
    }

    /// Record a new activity; complete the pending follow-up if there is one.
    pub async fn log_activity(
        &self,
        client: &mut Client,
        kind: ActivityKind,
        description: &str,
    ) -> Result<ActivityOutcome> {
        let description = description.trim();
        if description.is_empty() {
            return Err(PropdeskError::Validation(
                "Activity description is required".to_string(),
            ));
        }

        let request = NewActivity {
            kind,
            client_id: client.id,
            description: description.to_string(),
            created_by: self.author.clone(),
            activity_id: None,
        };
        let activity_id = self.api.add_client_activity(&request).await?;
        client.activities.insert(
            0,
            ClientActivity {
                id: activity_id,
                kind,
                client_id: client.id,
                description: request.description,
                created_by: request.created_by,
                created_at: Some(Utc::now()),
            },
        );
        info!(client_id = client.id, activity_id, %kind, "activity logged");

        let follow_up = match FollowUpState::of(client.follow_up.as_ref()).pending_id() {
            None => FollowUpUpdate::NotApplicable,
            Some(follow_up_id) => match self
                .api
                .update_follow_up_status(follow_up_id, FollowUpStatus::Completed)
                .await
            {
                Ok(()) => {
                    if let Some(f) = client.follow_up.as_mut() {
                        complete(f)?;
                    }
                    FollowUpUpdate::Completed
                }
                Err(e) => {
                    warn!(
                        client_id = client.id,
                        follow_up_id,
                        error = %e,
                        "follow-up left pending after activity"
                    );
                    FollowUpUpdate::Failed(e.to_string())
                }
            },
        };

        Ok(ActivityOutcome {
            activity_id,
            follow_up,
        })
    }

    /// Change the text or kind of an existing activity. Follow-ups are untouched.
    pub async fn edit_activity(
        &self,
        client: &mut Client,
        activity_id: u64,
        kind: ActivityKind,
        description: &str,
    ) -> Result<()> {
        let description = description.trim();
        if description.is_empty() {
            return Err(PropdeskError::Validation(
                "Activity description is required".to_string(),
            ));
        }
        let Some(index) = client.activities.iter().position(|a| a.id == activity_id) else {
            return Err(PropdeskError::Validation(format!(
                "Activity {} not found on this client",
                activity_id
            )));
        };

        let request = NewActivity {
            kind,
            client_id: client.id,
            description: description.to_string(),
            created_by: client.activities[index].created_by.clone(),
            activity_id: Some(activity_id),
        };
        self.api.add_client_activity(&request).await?;

        let activity = &mut client.activities[index];
        activity.kind = kind;
        activity.description = request.description;
        Ok(())
    }

    /// Schedule a follow-up; `None` means "someday".
    pub async fn schedule_follow_up(
        &self,
        client: &mut Client,
        date: Option<NaiveDate>,
        user_id: u64,
    ) -> Result<()> {
        FollowUpState::of(client.follow_up.as_ref()).ensure_can_schedule()?;
        if let Some(date) = date {
            if date < Utc::now().date_naive() {
                return Err(PropdeskError::Validation(
                    "Follow-up date cannot be in the past".to_string(),
                ));
            }
        }
        let follow_up = self.api.schedule_follow_up(client.id, date, user_id).await?;
        info!(client_id = client.id, follow_up_id = follow_up.id, "follow-up scheduled");
        client.follow_up = Some(follow_up);
        Ok(())
    }

    pub async fn delete_follow_up(&self, client: &mut Client) -> Result<()> {
        let id = FollowUpState::of(client.follow_up.as_ref()).ensure_pending("delete")?;
        self.api.delete_follow_up(id).await?;
        client.follow_up = None;
        Ok(())
    }

    pub async fn assign_users(&self, client: &mut Client, user_ids: Vec<u64>) -> Result<()> {
        if user_ids.is_empty() {
            return Err(PropdeskError::Validation(
                "Select at least one user to assign".to_string(),
            ));
        }
        self.api.assign_users(client.id, &user_ids).await?;
        client.assigned_users = user_ids;
        Ok(())
    }

    pub async fn delete_client(&self, client_id: u64) -> Result<()> {
        self.api.delete_client(client_id).await?;
        info!(client_id, "client deleted");
        Ok(())
    }
}

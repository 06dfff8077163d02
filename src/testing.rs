//! In-memory marketplace for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::{Marketplace, NewActivity, PageRequest};
use crate::error::{PropdeskError, Result};
use crate::types::{
    Client, ContactedProperty, ContentTemplate, FollowUp, FollowUpStatus, ListingKind, Page,
    Property, Role, User, Visitor,
};

#[derive(Debug, Default)]
pub struct FakeMarketplace {
    properties: Vec<Property>,
    clients: Vec<Client>,
    users: Vec<User>,
    calls: Mutex<Vec<(String, u32, u32)>>,
    fail_next: Mutex<Option<PropdeskError>>,
    fail_on: Mutex<HashMap<&'static str, PropdeskError>>,
    last_search: Mutex<Option<String>>,
    pub activities: Mutex<Vec<NewActivity>>,
    pub status_updates: Mutex<Vec<(u64, FollowUpStatus)>>,
    pub deleted_follow_ups: Mutex<Vec<u64>>,
    pub assignments: Mutex<Vec<(u64, Vec<u64>)>>,
    pub deleted_clients: Mutex<Vec<u64>>,
    pub deleted_properties: Mutex<Vec<u64>>,
}

pub fn property(id: u64) -> Property {
    Property {
        id,
        title: format!("Listing {}", id),
        description: None,
        price: 1_000_000.0 + id as f64,
        city: Some("Pune".to_string()),
        location: None,
        listing_kind: ListingKind::Sale,
        bedrooms: Some(2),
        area_sq_ft: None,
        is_featured: false,
        posted_at: None,
    }
}

pub fn client(id: u64) -> Client {
    Client {
        id,
        name: format!("Client {}", id),
        phone: None,
        email: None,
        group: None,
        assigned_users: Vec::new(),
        follow_up: None,
        activities: Vec::new(),
        updated_at: None,
    }
}

pub fn pending_follow_up(id: u64, date: Option<NaiveDate>) -> FollowUp {
    FollowUp {
        id,
        date,
        status: FollowUpStatus::Pending,
        user_id: 1,
    }
}

impl FakeMarketplace {
    pub fn with_properties(n: u64) -> Self {
        Self {
            properties: (1..=n).map(property).collect(),
            ..Default::default()
        }
    }

    pub fn with_clients(n: u64) -> Self {
        Self {
            clients: (1..=n).map(client).collect(),
            ..Default::default()
        }
    }

    pub fn with_users(n: u64) -> Self {
        Self {
            users: (1..=n)
                .map(|id| User {
                    id,
                    name: format!("User {}", id),
                    email: None,
                    phone: None,
                    role: Role::Buyer,
                    joined_at: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn push_client(mut self, client: Client) -> Self {
        self.clients.push(client);
        self
    }

    /// Make the next call, whatever it is, fail with `err`.
    pub fn fail_next(&self, err: PropdeskError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Make the next call to `op` fail with `err`.
    pub fn fail_on(&self, op: &'static str, err: PropdeskError) {
        self.fail_on.lock().unwrap().insert(op, err);
    }

    pub fn calls(&self) -> Vec<(String, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_search(&self) -> Option<String> {
        self.last_search.lock().unwrap().clone()
    }

    fn check(&self, op: &'static str) -> Result<()> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(err) = self.fail_on.lock().unwrap().remove(op) {
            return Err(err);
        }
        Ok(())
    }

    fn page_of<T: Clone>(&self, op: &'static str, all: &[T], req: PageRequest) -> Result<Page<T>> {
        self.calls
            .lock()
            .unwrap()
            .push((op.to_string(), req.page, req.page_size));
        self.check(op)?;
        let start = ((req.page - 1) * req.page_size) as usize;
        let end = (start + req.page_size as usize).min(all.len());
        let items = if start < all.len() {
            all[start..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(Page::ok(items))
    }
}

#[async_trait]
impl Marketplace for FakeMarketplace {
    async fn list_properties(&self, req: PageRequest) -> Result<Page<Property>> {
        self.page_of("properties", &self.properties, req)
    }

    async fn list_recommended_properties(&self, req: PageRequest) -> Result<Page<Property>> {
        self.page_of("recommended", &self.properties, req)
    }

    async fn list_clients(&self, req: PageRequest, search: Option<&str>) -> Result<Page<Client>> {
        *self.last_search.lock().unwrap() = search.map(str::to_string);
        self.page_of("clients", &self.clients, req)
    }

    async fn list_contacted_properties(
        &self,
        req: PageRequest,
    ) -> Result<Page<ContactedProperty>> {
        self.page_of("contacted", &[], req)
    }

    async fn list_visitors(&self, req: PageRequest) -> Result<Page<Visitor>> {
        self.page_of("visitors", &[], req)
    }

    async fn list_users(&self, req: PageRequest) -> Result<Page<User>> {
        self.page_of("users", &self.users, req)
    }

    async fn list_templates(&self, req: PageRequest) -> Result<Page<ContentTemplate>> {
        self.page_of("templates", &[], req)
    }

    async fn get_client(&self, client_id: u64) -> Result<Client> {
        self.check("get_client")?;
        self.clients
            .iter()
            .find(|c| c.id == client_id)
            .cloned()
            .ok_or_else(|| PropdeskError::Application("Client not found".to_string()))
    }

    async fn add_client_activity(&self, activity: &NewActivity) -> Result<u64> {
        self.check("add_client_activity")?;
        let mut activities = self.activities.lock().unwrap();
        activities.push(activity.clone());
        Ok(100 + activities.len() as u64)
    }

    async fn schedule_follow_up(
        &self,
        _client_id: u64,
        date: Option<NaiveDate>,
        user_id: u64,
    ) -> Result<FollowUp> {
        self.check("schedule_follow_up")?;
        Ok(FollowUp {
            id: 500,
            date,
            status: FollowUpStatus::Pending,
            user_id,
        })
    }

    async fn update_follow_up_status(
        &self,
        follow_up_id: u64,
        status: FollowUpStatus,
    ) -> Result<()> {
        self.check("update_follow_up_status")?;
        self.status_updates
            .lock()
            .unwrap()
            .push((follow_up_id, status));
        Ok(())
    }

    async fn delete_follow_up(&self, follow_up_id: u64) -> Result<()> {
        self.check("delete_follow_up")?;
        self.deleted_follow_ups.lock().unwrap().push(follow_up_id);
        Ok(())
    }

    async fn assign_users(&self, client_id: u64, user_ids: &[u64]) -> Result<()> {
        self.check("assign_users")?;
        self.assignments
            .lock()
            .unwrap()
            .push((client_id, user_ids.to_vec()));
        Ok(())
    }

    async fn delete_client(&self, client_id: u64) -> Result<()> {
        self.check("delete_client")?;
        self.deleted_clients.lock().unwrap().push(client_id);
        Ok(())
    }

    async fn delete_property(&self, property_id: u64) -> Result<()> {
        self.check("delete_property")?;
        self.deleted_properties.lock().unwrap().push(property_id);
        Ok(())
    }
}

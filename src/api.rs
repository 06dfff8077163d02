use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::envelope::{Envelope, PagingInfo};
use crate::error::{PropdeskError, Result};
use crate::types::{
    ActivityKind, Client, ContactedProperty, ContentTemplate, CreatedBy, FollowUp,
    FollowUpStatus, Page, Property, User, Visitor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 || page_size == 0 {
            return Err(PropdeskError::Validation(format!(
                "page and page size must be positive (got {} / {})",
                page, page_size
            )));
        }
        Ok(Self { page, page_size })
    }

    fn query(&self) -> String {
        format!("pageNumber={}&pageSize={}", self.page, self.page_size)
    }
}

/// Body of `addeditclient-activity`. `activity_id` is set when editing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub client_id: u64,
    pub description: String,
    #[serde(serialize_with = "encode_created_by")]
    pub created_by: CreatedBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<u64>,
}

// The activity endpoint stores the author as a JSON string.
fn encode_created_by<S: Serializer>(
    created_by: &CreatedBy,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let encoded = serde_json::to_string(created_by).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}

#[async_trait]
pub trait Marketplace: Send + Sync + std::fmt::Debug {
    // Paged lists
    async fn list_properties(&self, req: PageRequest) -> Result<Page<Property>>;
    async fn list_recommended_properties(&self, req: PageRequest) -> Result<Page<Property>>;
    async fn list_clients(&self, req: PageRequest, search: Option<&str>) -> Result<Page<Client>>;
    async fn list_contacted_properties(&self, req: PageRequest)
        -> Result<Page<ContactedProperty>>;
    async fn list_visitors(&self, req: PageRequest) -> Result<Page<Visitor>>;
    async fn list_users(&self, req: PageRequest) -> Result<Page<User>>;
    async fn list_templates(&self, req: PageRequest) -> Result<Page<ContentTemplate>>;

    // CRM
    async fn get_client(&self, client_id: u64) -> Result<Client>;
    async fn add_client_activity(&self, activity: &NewActivity) -> Result<u64>;
    async fn schedule_follow_up(
        &self,
        client_id: u64,
        date: Option<NaiveDate>,
        user_id: u64,
    ) -> Result<FollowUp>;
    async fn update_follow_up_status(&self, follow_up_id: u64, status: FollowUpStatus)
        -> Result<()>;
    async fn delete_follow_up(&self, follow_up_id: u64) -> Result<()>;
    async fn assign_users(&self, client_id: u64, user_ids: &[u64]) -> Result<()>;
    async fn delete_client(&self, client_id: u64) -> Result<()>;

    // Listings
    async fn delete_property(&self, property_id: u64) -> Result<()>;
}

pub struct RestClient {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request<B, T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(%method, url, "api request");
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PropdeskError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PropdeskError::Network(e.to_string()))?;

        decode_envelope(status, &text)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<Envelope<T>> {
        self.request::<(), T>(Method::GET, url, None).await
    }

    /// Mutations where only `success` matters.
    async fn send_unit<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<()> {
        self.request::<B, serde_json::Value>(method, url, body)
            .await?
            .into_result()?;
        Ok(())
    }
}

/// Turn a raw HTTP answer into an envelope.
///
/// Non-2xx is an API error. A 2xx that is not a valid envelope is a decode
/// error. `success: false` is left for the caller to interpret.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<Envelope<T>> {
    if !status.is_success() {
        let detail = serde_json::from_str::<Envelope<serde_json::Value>>(text)
            .ok()
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    "unknown error".to_string()
                } else {
                    text.trim().to_string()
                }
            });
        return Err(PropdeskError::Api(format!("{}: {}", status, detail)));
    }
    Ok(serde_json::from_str(text)?)
}

// Response payloads

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PropertyList {
    #[serde(default)]
    property_models: Vec<Property>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientList {
    #[serde(default)]
    client_data_model: Vec<Client>,
    #[serde(default)]
    response_paging_model: Option<PagingInfo>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ContactedList {
    #[serde(default)]
    contacted_properties: Vec<ContactedProperty>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VisitorList {
    #[serde(default)]
    visitors: Vec<Visitor>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UserList {
    #[serde(default)]
    user_models: Vec<User>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TemplateList {
    #[serde(default)]
    templates: Vec<ContentTemplate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivitySaved {
    activity_id: u64,
}

fn client_page(list: ClientList) -> Page<Client> {
    match list.response_paging_model {
        Some(paging) if !paging.has_next() => Page::last(list.client_data_model),
        _ => Page::ok(list.client_data_model),
    }
}

/// A successful envelope with no `data` on a list endpoint is an empty page.
fn list_or_empty<L: Default, T>(
    envelope: Envelope<L>,
    items: impl FnOnce(L) -> Vec<T>,
) -> Result<Page<T>> {
    let data = envelope.into_result()?.unwrap_or_default();
    Ok(Page::ok(items(data)))
}

#[async_trait]
impl Marketplace for RestClient {
    async fn list_properties(&self, req: PageRequest) -> Result<Page<Property>> {
        let url = self.api_url(&format!("/property/getAllProperty?{}", req.query()));
        let envelope: Envelope<PropertyList> = self.get(&url).await?;
        list_or_empty(envelope, |l| l.property_models)
    }

    async fn list_recommended_properties(&self, req: PageRequest) -> Result<Page<Property>> {
        let url = self.api_url(&format!("/property/recommended?{}", req.query()));
        let envelope: Envelope<PropertyList> = self.get(&url).await?;
        list_or_empty(envelope, |l| l.property_models)
    }

    async fn list_clients(&self, req: PageRequest, search: Option<&str>) -> Result<Page<Client>> {
        let mut url = self.api_url(&format!("/partners/clients-data-new?{}", req.query()));
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            url.push_str(&format!("&search={}", urlencoding::encode(search)));
        }
        let envelope: Envelope<ClientList> = self.get(&url).await?;
        match envelope.into_result()? {
            Some(list) => Ok(client_page(list)),
            None => Ok(Page::last(Vec::new())),
        }
    }

    async fn list_contacted_properties(
        &self,
        req: PageRequest,
    ) -> Result<Page<ContactedProperty>> {
        let url = self.api_url(&format!("/buyer/contacted-properties?{}", req.query()));
        let envelope: Envelope<ContactedList> = self.get(&url).await?;
        list_or_empty(envelope, |l| l.contacted_properties)
    }

    async fn list_visitors(&self, req: PageRequest) -> Result<Page<Visitor>> {
        let url = self.api_url(&format!("/seller/visitors?{}", req.query()));
        let envelope: Envelope<VisitorList> = self.get(&url).await?;
        list_or_empty(envelope, |l| l.visitors)
    }

    async fn list_users(&self, req: PageRequest) -> Result<Page<User>> {
        let url = self.api_url(&format!("/admin/users?{}", req.query()));
        let envelope: Envelope<UserList> = self.get(&url).await?;
        list_or_empty(envelope, |l| l.user_models)
    }

    async fn list_templates(&self, req: PageRequest) -> Result<Page<ContentTemplate>> {
        let url = self.api_url(&format!("/partners/content-templates?{}", req.query()));
        let envelope: Envelope<TemplateList> = self.get(&url).await?;
        list_or_empty(envelope, |l| l.templates)
    }

    async fn get_client(&self, client_id: u64) -> Result<Client> {
        let url = self.api_url(&format!("/partners/client/{}", client_id));
        self.get::<Client>(&url).await?.into_data()
    }

    async fn add_client_activity(&self, activity: &NewActivity) -> Result<u64> {
        let url = self.api_url("/partners/addeditclient-activity");
        let envelope: Envelope<ActivitySaved> =
            self.request(Method::POST, &url, Some(activity)).await?;
        Ok(envelope.into_data()?.activity_id)
    }

    async fn schedule_follow_up(
        &self,
        client_id: u64,
        date: Option<NaiveDate>,
        user_id: u64,
    ) -> Result<FollowUp> {
        let url = self.api_url("/partners/schedule-followup");
        let body = serde_json::json!({
            "clientId": client_id,
            "date": date,
            "userId": user_id,
        });
        self.request::<_, FollowUp>(Method::POST, &url, Some(&body))
            .await?
            .into_data()
    }

    async fn update_follow_up_status(
        &self,
        follow_up_id: u64,
        status: FollowUpStatus,
    ) -> Result<()> {
        let url = self.api_url("/partners/followup-status");
        let body = serde_json::json!({
            "followUpId": follow_up_id,
            "status": status.as_api_str(),
        });
        self.send_unit(Method::PUT, &url, Some(&body)).await
    }

    async fn delete_follow_up(&self, follow_up_id: u64) -> Result<()> {
        let url = self.api_url(&format!("/partners/followup/{}", follow_up_id));
        self.send_unit::<()>(Method::DELETE, &url, None).await
    }

    async fn assign_users(&self, client_id: u64, user_ids: &[u64]) -> Result<()> {
        let url = self.api_url("/partners/assign-users");
        let body = serde_json::json!({
            "clientId": client_id,
            "userIds": user_ids,
        });
        self.send_unit(Method::POST, &url, Some(&body)).await
    }

    async fn delete_client(&self, client_id: u64) -> Result<()> {
        let url = self.api_url(&format!("/partners/client/{}", client_id));
        self.send_unit::<()>(Method::DELETE, &url, None).await
    }

    async fn delete_property(&self, property_id: u64) -> Result<()> {
        let url = self.api_url(&format!("/property/{}", property_id));
        self.send_unit::<()>(Method::DELETE, &url, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_rejects_zero() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert_eq!(
            PageRequest::new(3, 20).unwrap().query(),
            "pageNumber=3&pageSize=20"
        );
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = RestClient::new("https://api.example.com/", None);
        assert_eq!(
            client.api_url("/property/getAllProperty"),
            "https://api.example.com/property/getAllProperty"
        );
    }

    #[test]
    fn decode_property_list() {
        let body = r#"{"success": true, "message": "", "httpStatus": 200,
            "data": {"propertyModels": [{"ID": 1, "Title": "Plot"}, {"ID": 2, "Title": "Villa"}]}}"#;
        let envelope: Envelope<PropertyList> = decode_envelope(StatusCode::OK, body).unwrap();
        let page = list_or_empty(envelope, |l| l.property_models).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.success);
        assert!(!page.no_more);
    }

    #[test]
    fn decode_list_without_data_is_empty_page() {
        let body = r#"{"success": true, "message": "ok"}"#;
        let envelope: Envelope<VisitorList> = decode_envelope(StatusCode::OK, body).unwrap();
        let page = list_or_empty(envelope, |l| l.visitors).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn decode_unsuccessful_list_is_application_error() {
        let body = r#"{"success": false, "message": "No record found", "data": null}"#;
        let envelope: Envelope<PropertyList> = decode_envelope(StatusCode::OK, body).unwrap();
        let err = list_or_empty(envelope, |l| l.property_models).unwrap_err();
        assert!(err.is_soft());
    }

    #[test]
    fn decode_client_list_last_page() {
        let body = r#"{"success": true, "message": "", "data": {
            "clientDataModel": [{"id": 4, "name": "Kiran"}],
            "responsePagingModel": {"CurrentPage": 3, "TotalPage": 3, "NextPage": null}}}"#;
        let envelope: Envelope<ClientList> = decode_envelope(StatusCode::OK, body).unwrap();
        let page = client_page(envelope.into_data().unwrap());
        assert_eq!(page.items[0].name, "Kiran");
        assert!(page.no_more);
    }

    #[test]
    fn decode_client_list_with_next_page() {
        let body = r#"{"success": true, "data": {
            "clientDataModel": [{"id": 4, "name": "Kiran"}],
            "responsePagingModel": {"CurrentPage": 1, "TotalPage": 3, "NextPage": 2}}}"#;
        let envelope: Envelope<ClientList> = decode_envelope(StatusCode::OK, body).unwrap();
        assert!(!client_page(envelope.into_data().unwrap()).no_more);
    }

    #[test]
    fn non_success_status_uses_envelope_message() {
        let body = r#"{"success": false, "message": "Token expired"}"#;
        let err = decode_envelope::<serde_json::Value>(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert_eq!(err.to_string(), "API error: 401 Unauthorized: Token expired");
    }

    #[test]
    fn non_success_status_with_plain_body() {
        let err =
            decode_envelope::<serde_json::Value>(StatusCode::BAD_GATEWAY, "").unwrap_err();
        assert_eq!(err.to_string(), "API error: 502 Bad Gateway: unknown error");
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = decode_envelope::<PropertyList>(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, PropdeskError::Decode(_)));
    }

    #[test]
    fn new_activity_encodes_author_as_string() {
        let activity = NewActivity {
            kind: ActivityKind::Call,
            client_id: 12,
            description: "Discussed budget".to_string(),
            created_by: CreatedBy {
                user_id: Some(3),
                name: "Ravi".to_string(),
            },
            activity_id: None,
        };
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["type"], "Call");
        assert_eq!(value["clientId"], 12);
        assert!(value.get("activityId").is_none());
        let encoded = value["createdBy"].as_str().unwrap();
        assert_eq!(CreatedBy::parse(encoded).unwrap().name, "Ravi");
    }
}

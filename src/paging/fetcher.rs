use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use crate::api::{Marketplace, PageRequest};
use crate::error::Result;
use crate::types::{Client, ContactedProperty, ContentTemplate, Page, Property, User, Visitor};

/// Fetches one page of a list.
///
/// "Nothing there" is an `Ok` page with `success == false` or no items.
/// Only transport and parse failures are errors. Nothing is retried.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page<T>>;
}

type FetchFn<T> =
    dyn Fn(Arc<dyn Marketplace>, PageRequest) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync;

/// Binds one `Marketplace` list endpoint to [`PageFetcher`].
pub struct EndpointFetcher<T> {
    api: Arc<dyn Marketplace>,
    endpoint: &'static str,
    call: Box<FetchFn<T>>,
}

impl<T> std::fmt::Debug for EndpointFetcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointFetcher")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> EndpointFetcher<T> {
    pub fn new<F>(api: Arc<dyn Marketplace>, endpoint: &'static str, call: F) -> Self
    where
        F: Fn(Arc<dyn Marketplace>, PageRequest) -> BoxFuture<'static, Result<Page<T>>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            api,
            endpoint,
            call: Box::new(call),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> PageFetcher<T> for EndpointFetcher<T> {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page<T>> {
        let req = PageRequest::new(page, page_size)?;
        match (self.call)(Arc::clone(&self.api), req).await {
            Ok(page) => Ok(page),
            Err(e) if e.is_soft() => {
                debug!(endpoint = self.endpoint, page, reason = %e, "no data");
                Ok(Page::empty(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

pub fn properties(api: Arc<dyn Marketplace>) -> EndpointFetcher<Property> {
    EndpointFetcher::new(api, "properties", |api, req| {
        Box::pin(async move { api.list_properties(req).await })
    })
}

pub fn recommended_properties(api: Arc<dyn Marketplace>) -> EndpointFetcher<Property> {
    EndpointFetcher::new(api, "recommended", |api, req| {
        Box::pin(async move { api.list_recommended_properties(req).await })
    })
}

pub fn clients(api: Arc<dyn Marketplace>, search: Option<String>) -> EndpointFetcher<Client> {
    EndpointFetcher::new(api, "clients", move |api, req| {
        let search = search.clone();
        Box::pin(async move { api.list_clients(req, search.as_deref()).await })
    })
}

pub fn contacted_properties(api: Arc<dyn Marketplace>) -> EndpointFetcher<ContactedProperty> {
    EndpointFetcher::new(api, "contacted", |api, req| {
        Box::pin(async move { api.list_contacted_properties(req).await })
    })
}

pub fn visitors(api: Arc<dyn Marketplace>) -> EndpointFetcher<Visitor> {
    EndpointFetcher::new(api, "visitors", |api, req| {
        Box::pin(async move { api.list_visitors(req).await })
    })
}

pub fn users(api: Arc<dyn Marketplace>) -> EndpointFetcher<User> {
    EndpointFetcher::new(api, "users", |api, req| {
        Box::pin(async move { api.list_users(req).await })
    })
}

pub fn templates(api: Arc<dyn Marketplace>) -> EndpointFetcher<ContentTemplate> {
    EndpointFetcher::new(api, "templates", |api, req| {
        Box::pin(async move { api.list_templates(req).await })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PropdeskError;
    use crate::testing::FakeMarketplace;

    #[tokio::test]
    async fn passes_pages_through() {
        let fake = Arc::new(FakeMarketplace::with_properties(25));
        let fetcher = properties(fake.clone());
        let page = fetcher.fetch_page(2, 10).await.unwrap();
        assert!(page.success);
        let ids: Vec<u64> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());
        assert_eq!(fake.calls(), vec![("properties".to_string(), 2, 10)]);
    }

    #[tokio::test]
    async fn application_failure_becomes_soft_page() {
        let fake = Arc::new(FakeMarketplace::default());
        fake.fail_next(PropdeskError::Application("No property found".into()));
        let page = properties(fake).fetch_page(1, 10).await.unwrap();
        assert!(!page.success);
        assert!(page.items.is_empty());
        assert_eq!(page.message.as_deref(), Some("No property found"));
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let fake = Arc::new(FakeMarketplace::default());
        fake.fail_next(PropdeskError::Network("connection refused".into()));
        let err = properties(fake).fetch_page(1, 10).await.unwrap_err();
        assert!(matches!(err, PropdeskError::Network(_)));
    }

    #[tokio::test]
    async fn zero_page_is_rejected_before_the_network() {
        let fake = Arc::new(FakeMarketplace::with_properties(5));
        let err = properties(fake.clone()).fetch_page(0, 10).await.unwrap_err();
        assert!(matches!(err, PropdeskError::Validation(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn client_search_is_forwarded() {
        let fake = Arc::new(FakeMarketplace::default());
        let fetcher = clients(fake.clone(), Some("kiran".to_string()));
        fetcher.fetch_page(1, 10).await.unwrap();
        assert_eq!(fake.last_search().as_deref(), Some("kiran"));
    }
}

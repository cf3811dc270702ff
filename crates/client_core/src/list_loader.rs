//! Fetches list pages for a screen and commits only the freshest response.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use shared::{domain::SearchRequest, protocol::ListPage};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    events::{event_channel, ScreenEvent},
    transport::Resource,
};

#[async_trait]
pub trait ListFetcher<T>: Send + Sync {
    async fn fetch_list(
        &self,
        resource: &Resource,
        request: &SearchRequest,
    ) -> Result<ListPage<T>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub loading: bool,
    pub last_error: Option<String>,
    /// Request whose response is currently displayed.
    pub applied: Option<Arc<SearchRequest>>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            loading: false,
            last_error: None,
            applied: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request was issued before this one resolved.
    Stale,
    Unmounted,
    /// Fetch failed; the previous dataset is still shown.
    Failed,
}

struct LoaderInner<T> {
    state: ListState<T>,
    current: Option<Arc<SearchRequest>>,
    mounted: bool,
}

pub struct ListLoader<T> {
    fetcher: Arc<dyn ListFetcher<T>>,
    resource: Resource,
    timeout: Option<Duration>,
    inner: Mutex<LoaderInner<T>>,
    events: broadcast::Sender<ScreenEvent>,
}

impl<T> ListLoader<T>
where
    T: Send + 'static,
{
    pub fn new(fetcher: Arc<dyn ListFetcher<T>>, resource: Resource) -> Self {
        Self {
            fetcher,
            resource,
            timeout: None,
            inner: Mutex::new(LoaderInner {
                state: ListState::default(),
                current: None,
                mounted: true,
            }),
            events: event_channel(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ScreenEvent> {
        self.events.subscribe()
    }

    /// Results resolving after this call are dropped.
    pub fn unmount(&self) {
        let mut inner = self.lock();
        inner.mounted = false;
        inner.current = None;
    }

    pub async fn load(&self, request: Arc<SearchRequest>) -> LoadOutcome {
        {
            let mut inner = self.lock();
            if !inner.mounted {
                return LoadOutcome::Unmounted;
            }
            inner.current = Some(Arc::clone(&request));
            inner.state.loading = true;
        }

        debug!(
            resource = %self.resource.path,
            page = request.page,
            per_page = request.per_page,
            "fetching list page"
        );
        let fetch = self.fetcher.fetch_list(&self.resource, &request);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(limit)),
            },
            None => fetch.await,
        };

        let mut inner = self.lock();
        if !inner.mounted {
            debug!(resource = %self.resource.path, "discarding response for unmounted screen");
            return LoadOutcome::Unmounted;
        }
        let is_current = inner
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &request));
        if !is_current {
            debug!(resource = %self.resource.path, "discarding stale list response");
            return LoadOutcome::Stale;
        }

        inner.state.loading = false;
        match result {
            Ok(page) => {
                info!(
                    resource = %self.resource.path,
                    items = page.data.len(),
                    total = page.total,
                    "list page applied"
                );
                inner.state.items = page.data;
                inner.state.total = page.total;
                inner.state.last_error = None;
                inner.state.applied = Some(request);
                let _ = self.events.send(ScreenEvent::DatasetReplaced {
                    total: inner.state.total,
                });
                LoadOutcome::Applied
            }
            Err(err) => {
                warn!(resource = %self.resource.path, error = %err, "list fetch failed; keeping previous dataset");
                let message = err.to_string();
                inner.state.last_error = Some(message.clone());
                let _ = self.events.send(ScreenEvent::FetchFailed { message });
                LoadOutcome::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> ListLoader<T>
where
    T: Clone + Send + 'static,
{
    pub fn state(&self) -> ListState<T> {
        self.lock().state.clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().state.items.clone()
    }
}

#[cfg(test)]
#[path = "tests/list_loader_tests.rs"]
mod tests;

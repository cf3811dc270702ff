//! Wires a query controller to a list loader through the debouncer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::SearchRequest;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    debounce::{spawn_debouncer, DebouncePolicy},
    error::QueryError,
    filters::FilterChip,
    list_loader::ListLoader,
    query_state::QueryController,
};

/// One mounted list screen.
pub struct ListSession<T> {
    controller: Mutex<QueryController>,
    loader: Arc<ListLoader<T>>,
    submit: mpsc::UnboundedSender<Arc<SearchRequest>>,
    driver: JoinHandle<()>,
}

impl<T> ListSession<T>
where
    T: Send + 'static,
{
    /// Starts the fetch driver and schedules the initial load.
    pub fn start(
        controller: QueryController,
        loader: Arc<ListLoader<T>>,
        policy: DebouncePolicy,
    ) -> Self {
        let (submit, requests) = mpsc::unbounded_channel();
        let (mut released, debouncer) = spawn_debouncer(policy, requests);

        let driver_loader = Arc::clone(&loader);
        let driver = tokio::spawn(async move {
            let mut in_flight: Option<JoinHandle<()>> = None;
            while let Some(request) = released.recv().await {
                if policy.supersede_in_flight {
                    if let Some(previous) = in_flight.take() {
                        if !previous.is_finished() {
                            debug!("superseding in-flight list fetch");
                            previous.abort();
                        }
                    }
                }
                let loader = Arc::clone(&driver_loader);
                in_flight = Some(tokio::spawn(async move {
                    loader.load(request).await;
                }));
            }
            if let Some(last) = in_flight {
                let _ = last.await;
            }
            let _ = debouncer.await;
        });

        let _ = submit.send(controller.snapshot());
        Self {
            controller: Mutex::new(controller),
            loader,
            submit,
            driver,
        }
    }

    /// Applies a controller mutation and schedules a fetch for the new request.
    ///
    /// A rejected mutation leaves the request untouched and schedules nothing.
    pub fn update<F>(&self, mutate: F) -> Result<Arc<SearchRequest>, QueryError>
    where
        F: FnOnce(&mut QueryController) -> Result<Arc<SearchRequest>, QueryError>,
    {
        let request = mutate(&mut self.controller())?;
        self.schedule(Arc::clone(&request));
        Ok(request)
    }

    pub fn refresh(&self) -> Arc<SearchRequest> {
        let request = self.controller().refresh();
        self.schedule(Arc::clone(&request));
        request
    }

    pub fn snapshot(&self) -> Arc<SearchRequest> {
        self.controller().snapshot()
    }

    pub fn chips(&self) -> Vec<FilterChip> {
        self.controller().chips().to_vec()
    }

    pub fn loader(&self) -> &Arc<ListLoader<T>> {
        &self.loader
    }

    /// Flushes any pending change and waits for the last fetch to settle.
    pub async fn close(self) {
        drop(self.submit);
        if let Err(err) = self.driver.await {
            warn!(error = %err, "list session driver ended abnormally");
        }
    }

    /// Stops fetching; results still in flight are discarded.
    pub fn unmount(self) {
        self.loader.unmount();
        self.driver.abort();
    }

    fn schedule(&self, request: Arc<SearchRequest>) {
        if self.submit.send(request).is_err() {
            warn!("list session driver stopped; dropping request");
        }
    }

    fn controller(&self) -> MutexGuard<'_, QueryController> {
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

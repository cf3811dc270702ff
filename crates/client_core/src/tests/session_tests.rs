use std::time::Duration;

use async_trait::async_trait;
use shared::{
    domain::{FilterValue, SortDir},
    protocol::ListPage,
};

use super::*;
use crate::{
    catalogs::orders_catalog, error::ClientError, list_loader::ListFetcher, transport::Resource,
};

#[derive(Default)]
struct RecordingFetcher {
    seen: Mutex<Vec<SearchRequest>>,
}

impl RecordingFetcher {
    fn seen(&self) -> Vec<SearchRequest> {
        self.seen.lock().expect("seen").clone()
    }
}

#[async_trait]
impl ListFetcher<u32> for RecordingFetcher {
    async fn fetch_list(
        &self,
        _resource: &Resource,
        request: &SearchRequest,
    ) -> Result<ListPage<u32>, ClientError> {
        self.seen.lock().expect("seen").push(request.clone());
        Ok(ListPage {
            data: vec![request.page],
            total: 1,
        })
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn session(fetcher: &Arc<RecordingFetcher>) -> ListSession<u32> {
    let controller =
        QueryController::with_defaults(Arc::new(orders_catalog()), 25, None, SortDir::Desc)
            .expect("controller");
    let fetcher: Arc<dyn ListFetcher<u32>> = fetcher.clone();
    let loader = Arc::new(ListLoader::new(fetcher, Resource::orders()));
    ListSession::start(controller, loader, DebouncePolicy::default())
}

#[tokio::test(start_paused = true)]
async fn typing_burst_triggers_a_single_fetch() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let session = session(&fetcher);
    tokio::time::sleep(ms(400)).await;
    assert_eq!(fetcher.seen().len(), 1);

    for text in ["s", "sh", "shi", "shirt"] {
        session
            .update(|c| c.set_filter("search", Some(FilterValue::text(text))))
            .expect("known filter");
        tokio::time::sleep(ms(50)).await;
    }
    tokio::time::sleep(ms(400)).await;
    session.close().await;

    let seen = fetcher.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].filter("search"), Some(&FilterValue::text("shirt")));
    assert_eq!(seen[1].page, 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_mutation_schedules_nothing() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let session = session(&fetcher);
    tokio::time::sleep(ms(400)).await;

    let err = session
        .update(|c| c.set_per_page(0))
        .expect_err("zero page size");
    assert_eq!(err, QueryError::InvalidPageSize);
    tokio::time::sleep(ms(400)).await;
    session.close().await;

    assert_eq!(fetcher.seen().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_refetches_same_content() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let session = session(&fetcher);
    tokio::time::sleep(ms(400)).await;

    session.update(|c| Ok(c.set_page(3))).expect("page");
    tokio::time::sleep(ms(400)).await;
    let before = session.snapshot();
    let after = session.refresh();
    assert!(!Arc::ptr_eq(&before, &after));
    tokio::time::sleep(ms(400)).await;

    let loader = Arc::clone(session.loader());
    session.close().await;

    let seen = fetcher.seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1], seen[2]);
    assert_eq!(loader.items(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn chips_follow_session_updates() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let session = session(&fetcher);

    session
        .update(|c| c.set_filter("statusId", Some(FilterValue::Id(8))))
        .expect("filter");
    let chips = session.chips();
    assert_eq!(chips.len(), 1);
    assert_eq!(chips[0].display_value, "Delivered");

    session.unmount();
}

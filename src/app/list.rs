// Paginated card list over the remote prompt library.
// All state lives on the UI thread; requests run on the tokio runtime and report
// back over an mpsc channel drained by poll_incoming().

use std::collections::HashSet;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use super::confirm::DeleteConfirmation;
use crate::api::{ApiError, ListPage, ListRequest, PromptRecord, PromptSource};
use crate::host::{LinkOpener, RedrawSignal};
use crate::localization::{translate, translate_count, translate_with};
use crate::types::{LocalizableName, SortBy};

/// Which of several overlapping list responses ends up in the cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::EnumIter,
)]
pub enum ResponseOrdering {
    /// Whatever arrives last overwrites the cache.
    LastArrivalWins,
    /// Only the response to the most recently issued request is applied.
    #[default]
    LatestRequestWins,
}

impl LocalizableName for ResponseOrdering {
    fn localization_key(&self) -> &'static str {
        match self {
            ResponseOrdering::LastArrivalWins => "ordering-last-arrival",
            ResponseOrdering::LatestRequestWins => "ordering-latest-request",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_by: SortBy,
    pub favorites_only: bool,
    pub search_text: String,
}

impl ListQuery {
    pub fn new(page_size: u32, sort_by: SortBy) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            sort_by,
            favorites_only: false,
            search_text: String::new(),
        }
    }

    pub fn to_request(&self) -> ListRequest {
        let search = self.search_text.trim();
        ListRequest {
            limit: self.page_size,
            offset: self.page_index as u64 * self.page_size as u64,
            sort_by: self.sort_by,
            favorites_only: self.favorites_only,
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }
}

/// Partial filter update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChange {
    pub search_text: Option<String>,
    pub sort_by: Option<SortBy>,
    pub favorites_only: Option<bool>,
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}

/// Highest reachable page index; 0 when there are no pages.
pub fn last_page_index(total: u64, page_size: u32) -> u64 {
    total_pages(total, page_size).saturating_sub(1)
}

#[derive(Debug)]
pub struct CardView<'a> {
    pub record: &'a PromptRecord,
    pub expanded: bool,
    pub thumbnail_url: Option<String>,
}

/// Everything the list screen draws for one frame.
#[derive(Debug)]
pub struct ListView<'a> {
    pub cards: Vec<CardView<'a>>,
    /// 1-based
    pub page_number: u64,
    /// Never below 1
    pub page_count: u64,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub empty_message: Option<String>,
    pub total_records: u64,
    pub loading: bool,
}

impl ListView<'_> {
    pub fn page_label(&self) -> String {
        translate_with(
            "page-of",
            &[
                ("page", self.page_number.to_string()),
                ("total", self.page_count.to_string()),
            ],
        )
    }

    pub fn count_label(&self) -> String {
        translate_count("library-count", self.total_records)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Favorite,
    Delete,
}

enum ListMsg {
    Page {
        req_id: u64,
        result: Result<ListPage, ApiError>,
    },
    Mutated {
        kind: Mutation,
        id: i64,
        result: Result<(), ApiError>,
    },
}

/// Collaborators of the card list, injected by the host.
pub struct ListDeps {
    pub source: Arc<dyn PromptSource>,
    pub links: Arc<dyn LinkOpener>,
    pub redraw: Arc<dyn RedrawSignal>,
    pub runtime: Handle,
}

pub struct CardListController {
    query: ListQuery,
    records: Vec<PromptRecord>,
    total: u64,
    expanded: HashSet<i64>,
    counter: u64,
    pending_pages: usize,
    ordering: ResponseOrdering,
    auto_refresh: Option<Duration>,
    last_refresh: Option<Instant>,
    deps: ListDeps,
    tx: mpsc::Sender<ListMsg>,
    rx: mpsc::Receiver<ListMsg>,
}

impl CardListController {
    pub fn new(query: ListQuery, ordering: ResponseOrdering, deps: ListDeps) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            query,
            records: Vec::new(),
            total: 0,
            expanded: HashSet::new(),
            counter: 0,
            pending_pages: 0,
            ordering,
            auto_refresh: None,
            last_refresh: None,
            deps,
            tx,
            rx,
        }
    }

    pub fn with_auto_refresh(mut self, every: Option<Duration>) -> Self {
        self.auto_refresh = every.filter(|d| !d.is_zero());
        self
    }

    pub fn set_ordering(&mut self, ordering: ResponseOrdering) {
        self.ordering = ordering;
    }

    pub fn set_auto_refresh(&mut self, every: Option<Duration>) {
        self.auto_refresh = every.filter(|d| !d.is_zero());
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn records(&self) -> &[PromptRecord] {
        &self.records
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.pending_pages > 0
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.contains(&id)
    }

    pub fn source(&self) -> Arc<dyn PromptSource> {
        self.deps.source.clone()
    }

    /// Fetches the page described by the current query.
    pub fn refresh(&mut self) {
        self.counter = self.counter.wrapping_add(1);
        let req_id = self.counter;
        let request = self.query.to_request();
        self.pending_pages += 1;
        self.last_refresh = Some(Instant::now());

        let source = self.deps.source.clone();
        let tx = self.tx.clone();
        let redraw = self.deps.redraw.clone();
        self.deps.runtime.spawn(async move {
            let result = source.list(&request).await;
            let _ = tx.send(ListMsg::Page { req_id, result });
            redraw.request_redraw();
        });
    }

    pub fn set_filter(&mut self, change: FilterChange) {
        if let Some(search) = change.search_text {
            self.query.search_text = search;
        }
        if let Some(sort) = change.sort_by {
            self.query.sort_by = sort;
        }
        if let Some(favorites) = change.favorites_only {
            self.query.favorites_only = favorites;
        }
        self.query.page_index = 0;
        self.refresh();
    }

    /// Moves by `delta` pages within the known page range. Returns false when nothing changed.
    pub fn go_to_page(&mut self, delta: i64) -> bool {
        let last = last_page_index(self.total, self.query.page_size) as i64;
        let current = self.query.page_index as i64;
        let target = (current + delta).clamp(0, last.max(0));
        if target == current {
            return false;
        }
        self.query.page_index = target as u32;
        self.refresh();
        true
    }

    fn spawn_mutation(&self, kind: Mutation, id: i64) {
        let source = self.deps.source.clone();
        let tx = self.tx.clone();
        let redraw = self.deps.redraw.clone();
        self.deps.runtime.spawn(async move {
            let result = match kind {
                Mutation::Favorite => source.toggle_favorite(id).await,
                Mutation::Delete => source.delete(id).await,
            };
            let _ = tx.send(ListMsg::Mutated { kind, id, result });
            redraw.request_redraw();
        });
    }

    /// Asks the backend to flip the flag; the list only changes after the refetch.
    pub fn toggle_favorite(&mut self, id: i64) {
        self.spawn_mutation(Mutation::Favorite, id);
    }

    pub fn delete_record(&mut self, confirmation: DeleteConfirmation) {
        self.spawn_mutation(Mutation::Delete, confirmation.id());
    }

    pub fn export_all(&self) {
        match self.deps.source.export_url() {
            Ok(url) => self.deps.links.open(&url),
            Err(e) => log::error!("Can't build export url: {e}"),
        }
    }

    pub fn toggle_expanded(&mut self, id: i64) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// Prompt text of a cached record, for the clipboard.
    pub fn copy_prompt(&self, id: i64) -> Option<String> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.prompt_text.clone())
    }

    pub fn thumbnail_url(&self, record: &PromptRecord) -> Option<String> {
        let name = record.thumbnail_filename()?;
        match self.deps.source.thumbnail_url(name) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("No thumbnail url for prompt {}: {e}", record.id);
                None
            }
        }
    }

    /// Drains finished requests. Returns true when the visible state changed.
    pub fn poll_incoming(&mut self) -> bool {
        let mut changed = false;
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                ListMsg::Page { req_id, result } => {
                    self.pending_pages = self.pending_pages.saturating_sub(1);
                    changed = true;
                    if self.ordering == ResponseOrdering::LatestRequestWins
                        && req_id != self.counter
                    {
                        log::debug!("Dropping stale list response {req_id}, latest is {}", self.counter);
                        continue;
                    }
                    match result {
                        Ok(page) => {
                            log::debug!(
                                "List page {} loaded: {} of {} records",
                                self.query.page_index,
                                page.prompts.len(),
                                page.total
                            );
                            self.records = page.prompts;
                            self.total = page.total;
                            let last = last_page_index(self.total, self.query.page_size) as u32;
                            if self.query.page_index > last {
                                log::info!(
                                    "Page {} is past the end, moving to page {}",
                                    self.query.page_index,
                                    last
                                );
                                self.query.page_index = last;
                                self.refresh();
                            }
                        }
                        Err(e) => {
                            log::error!("Error loading prompts: {e}");
                        }
                    }
                }
                ListMsg::Mutated { kind, id, result } => match result {
                    Ok(()) => {
                        if kind == Mutation::Delete {
                            self.expanded.remove(&id);
                            log::info!("Deleted prompt {id}");
                        }
                        self.refresh();
                        changed = true;
                    }
                    Err(e) => match kind {
                        Mutation::Favorite => log::error!("Error toggling favorite for {id}: {e}"),
                        Mutation::Delete => log::error!("Error deleting prompt {id}: {e}"),
                    },
                },
            }
        }
        changed
    }

    /// Issues the periodic refresh when it is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(every) = self.auto_refresh else {
            return false;
        };
        if self.is_loading() {
            return false;
        }
        let due = self
            .last_refresh
            .map(|last| now.saturating_duration_since(last) >= every)
            .unwrap_or(true);
        if due {
            log::debug!("Auto refresh of the prompt list");
            self.refresh();
        }
        due
    }

    /// Time left until the next periodic refresh.
    pub fn next_refresh_in(&self, now: Instant) -> Option<Duration> {
        let every = self.auto_refresh?;
        let last = self.last_refresh?;
        Some(every.saturating_sub(now.saturating_duration_since(last)))
    }

    pub fn render(&self) -> ListView<'_> {
        let pages = total_pages(self.total, self.query.page_size);
        let page_index = self.query.page_index as u64;
        ListView {
            cards: self
                .records
                .iter()
                .map(|record| CardView {
                    record,
                    expanded: self.is_expanded(record.id),
                    thumbnail_url: self.thumbnail_url(record),
                })
                .collect(),
            page_number: page_index + 1,
            page_count: pages.max(1),
            prev_enabled: page_index > 0,
            next_enabled: pages > 0 && page_index + 1 < pages,
            empty_message: self.records.is_empty().then(|| translate("list-empty")),
            total_records: self.total(),
            loading: self.is_loading(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoRedraw;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn record(id: i64, text: &str) -> PromptRecord {
        let mut r: PromptRecord = serde_json::from_value(serde_json::json!({ "id": id })).unwrap();
        r.prompt_text = text.to_string();
        r
    }

    #[derive(Default)]
    struct RecordingLinks(Mutex<Vec<String>>);

    impl LinkOpener for RecordingLinks {
        fn open(&self, url: &str) {
            self.0.lock().unwrap().push(url.to_string());
        }
    }

    /// In-memory library that records the list requests it receives.
    #[derive(Default)]
    struct MemorySource {
        records: Mutex<Vec<PromptRecord>>,
        requests: Mutex<Vec<ListRequest>>,
        fail_mutations: AtomicBool,
    }

    impl MemorySource {
        fn with_records(count: i64) -> Arc<Self> {
            let source = Self::default();
            *source.records.lock().unwrap() =
                (1..=count).map(|id| record(id, &format!("prompt {id}"))).collect();
            Arc::new(source)
        }

        fn requests(&self) -> Vec<ListRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PromptSource for MemorySource {
        async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            let records = self.records.lock().unwrap();
            let matching: Vec<PromptRecord> = records
                .iter()
                .filter(|r| !request.favorites_only || r.is_favorite)
                .filter(|r| {
                    request
                        .search
                        .as_deref()
                        .map_or(true, |s| r.prompt_text.contains(s))
                })
                .cloned()
                .collect();
            Ok(ListPage {
                total: matching.len() as u64,
                prompts: matching
                    .into_iter()
                    .skip(request.offset as usize)
                    .take(request.limit as usize)
                    .collect(),
            })
        }

        async fn toggle_favorite(&self, id: i64) -> Result<(), ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Status { status: 500, body: "db locked".into() });
            }
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.id == id) {
                Some(r) => {
                    r.is_favorite = !r.is_favorite;
                    Ok(())
                }
                None => Err(ApiError::Status { status: 404, body: "Prompt not found".into() }),
            }
        }

        async fn delete(&self, id: i64) -> Result<(), ApiError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ApiError::Status { status: 500, body: "db locked".into() });
            }
            self.records.lock().unwrap().retain(|r| r.id != id);
            Ok(())
        }

        async fn thumbnail(&self, _filename: &str) -> Result<Vec<u8>, ApiError> {
            Err(ApiError::Decode("no images in memory".into()))
        }

        fn export_url(&self) -> Result<String, ApiError> {
            Ok("mem://export".to_string())
        }

        fn thumbnail_url(&self, filename: &str) -> Result<String, ApiError> {
            Ok(format!("mem://thumbnail/{filename}"))
        }
    }

    /// List calls wait until the test releases the page for their search text.
    struct GatedSource {
        gates: Mutex<HashMap<String, oneshot::Receiver<ListPage>>>,
    }

    impl GatedSource {
        fn new(keys: &[&str]) -> (Arc<Self>, HashMap<String, oneshot::Sender<ListPage>>) {
            let mut gates = HashMap::new();
            let mut senders = HashMap::new();
            for key in keys {
                let (tx, rx) = oneshot::channel();
                gates.insert(key.to_string(), rx);
                senders.insert(key.to_string(), tx);
            }
            (Arc::new(Self { gates: Mutex::new(gates) }), senders)
        }
    }

    #[async_trait]
    impl PromptSource for GatedSource {
        async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
            let key = request.search.clone().unwrap_or_default();
            let gate = self.gates.lock().unwrap().remove(&key);
            match gate {
                Some(rx) => rx.await.map_err(|_| ApiError::Decode("gate dropped".into())),
                None => Ok(ListPage::default()),
            }
        }
        async fn toggle_favorite(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }
        async fn delete(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }
        async fn thumbnail(&self, _filename: &str) -> Result<Vec<u8>, ApiError> {
            Ok(Vec::new())
        }
        fn export_url(&self) -> Result<String, ApiError> {
            Ok(String::new())
        }
        fn thumbnail_url(&self, filename: &str) -> Result<String, ApiError> {
            Ok(filename.to_string())
        }
    }

    fn controller(source: Arc<dyn PromptSource>, ordering: ResponseOrdering) -> CardListController {
        controller_with_links(source, ordering, Arc::new(RecordingLinks::default()))
    }

    fn controller_with_links(
        source: Arc<dyn PromptSource>,
        ordering: ResponseOrdering,
        links: Arc<dyn LinkOpener>,
    ) -> CardListController {
        CardListController::new(
            ListQuery::new(20, SortBy::Date),
            ordering,
            ListDeps {
                source,
                links,
                redraw: Arc::new(NoRedraw),
                runtime: Handle::current(),
            },
        )
    }

    async fn settle(ctrl: &mut CardListController) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
            ctrl.poll_incoming();
        }
    }

    fn page(ids: &[i64], total: u64) -> ListPage {
        ListPage {
            prompts: ids.iter().map(|&id| record(id, "gated")).collect(),
            total,
        }
    }

    fn ids(ctrl: &CardListController) -> Vec<i64> {
        ctrl.records().iter().map(|r| r.id).collect()
    }

    #[test]
    fn page_arithmetic() {
        assert_eq!(total_pages(45, 20), 3);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(last_page_index(0, 20), 0);
        assert_eq!(last_page_index(45, 20), 2);
    }

    #[tokio::test]
    async fn filter_change_resets_page_and_sends_favorites_flag() {
        let source = MemorySource::with_records(45);
        let mut ctrl = controller(source.clone(), ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        settle(&mut ctrl).await;
        assert!(ctrl.go_to_page(1));
        assert!(ctrl.go_to_page(1));
        settle(&mut ctrl).await;
        assert_eq!(ctrl.query().page_index, 2);

        ctrl.set_filter(FilterChange {
            favorites_only: Some(true),
            ..FilterChange::default()
        });
        assert_eq!(ctrl.query().page_index, 0);
        settle(&mut ctrl).await;

        let issued = source.requests().pop().unwrap();
        assert_eq!(issued.offset, 0);
        assert!(issued.query_pairs().contains(&("favorites_only", "1".to_string())));
        assert!(ctrl.render().empty_message.is_some());
    }

    #[tokio::test]
    async fn page_bounds_follow_total() {
        let source = MemorySource::with_records(45);
        let mut ctrl = controller(source.clone(), ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        settle(&mut ctrl).await;
        assert_eq!(ctrl.total(), 45);

        assert!(!ctrl.go_to_page(-1));
        assert_eq!(ctrl.query().page_index, 0);
        assert_eq!(source.requests().len(), 1);
        assert!(!ctrl.render().prev_enabled);

        assert!(ctrl.go_to_page(1));
        assert!(ctrl.go_to_page(1));
        settle(&mut ctrl).await;
        let before = source.requests().len();
        assert!(!ctrl.go_to_page(1));
        assert_eq!(ctrl.query().page_index, 2);
        settle(&mut ctrl).await;
        assert_eq!(source.requests().len(), before);

        let view = ctrl.render();
        assert_eq!((view.page_number, view.page_count), (3, 3));
        assert!(view.prev_enabled);
        assert!(!view.next_enabled);
        assert_eq!(ids(&ctrl), (41..=45).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_library_shows_one_page_with_disabled_controls() {
        let source = MemorySource::with_records(0);
        let mut ctrl = controller(source, ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        settle(&mut ctrl).await;
        let view = ctrl.render();
        assert_eq!(view.page_count, 1);
        assert!(!view.prev_enabled && !view.next_enabled);
        assert!(view.empty_message.is_some());
        assert!(!ctrl.go_to_page(1));
    }

    #[tokio::test]
    async fn delete_refetches_without_the_record() {
        let source = MemorySource::with_records(10);
        let mut ctrl = controller(source.clone(), ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        settle(&mut ctrl).await;
        ctrl.toggle_expanded(7);

        ctrl.delete_record(DeleteConfirmation::confirmed(7));
        settle(&mut ctrl).await;

        let view = ctrl.render();
        assert!(view.cards.iter().all(|c| c.record.id != 7));
        assert_eq!(view.total_records, 9);
        assert!(!ctrl.is_expanded(7));
    }

    #[tokio::test]
    async fn shrinking_total_moves_back_to_the_last_page() {
        let source = MemorySource::with_records(41);
        let mut ctrl = controller(source.clone(), ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        settle(&mut ctrl).await;
        assert!(ctrl.go_to_page(2));
        settle(&mut ctrl).await;
        assert_eq!(ids(&ctrl), vec![41]);

        ctrl.delete_record(DeleteConfirmation::confirmed(41));
        settle(&mut ctrl).await;

        assert_eq!(ctrl.query().page_index, 1);
        assert_eq!(source.requests().last().unwrap().offset, 20);
        let view = ctrl.render();
        assert_eq!((view.page_number, view.page_count), (2, 2));
        assert!(view.empty_message.is_none());
        assert_eq!(ids(&ctrl), (21..=40).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn favorite_is_never_guessed_locally() {
        let source = MemorySource::with_records(3);
        let mut ctrl = controller(source.clone(), ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        settle(&mut ctrl).await;

        source.fail_mutations.store(true, Ordering::SeqCst);
        ctrl.toggle_favorite(2);
        assert!(!ctrl.records()[1].is_favorite);
        settle(&mut ctrl).await;
        assert!(!ctrl.records()[1].is_favorite);
        assert_eq!(source.requests().len(), 1);

        source.fail_mutations.store(false, Ordering::SeqCst);
        ctrl.toggle_favorite(2);
        settle(&mut ctrl).await;
        assert!(ctrl.records()[1].is_favorite);
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_cache() {
        let (source, mut gates) = GatedSource::new(&["", "broken"]);
        let mut ctrl = controller(source, ResponseOrdering::LatestRequestWins);
        ctrl.refresh();
        gates.remove("").unwrap().send(page(&[1, 2], 2)).unwrap();
        settle(&mut ctrl).await;

        ctrl.set_filter(FilterChange {
            search_text: Some("broken".into()),
            ..FilterChange::default()
        });
        assert!(ctrl.is_loading());
        drop(gates.remove("broken"));
        settle(&mut ctrl).await;

        assert!(!ctrl.is_loading());
        assert_eq!(ids(&ctrl), vec![1, 2]);
        assert_eq!(ctrl.total(), 2);
    }

    #[tokio::test]
    async fn slower_first_response_wins_when_it_arrives_last() {
        let (source, mut gates) = GatedSource::new(&["first", "second"]);
        let mut ctrl = controller(source, ResponseOrdering::LastArrivalWins);
        for text in ["first", "second"] {
            ctrl.set_filter(FilterChange {
                search_text: Some(text.into()),
                ..FilterChange::default()
            });
        }
        settle(&mut ctrl).await;

        gates.remove("second").unwrap().send(page(&[2], 1)).unwrap();
        settle(&mut ctrl).await;
        assert_eq!(ids(&ctrl), vec![2]);

        gates.remove("first").unwrap().send(page(&[1], 1)).unwrap();
        settle(&mut ctrl).await;
        assert_eq!(ids(&ctrl), vec![1]);
    }

    #[tokio::test]
    async fn stale_response_is_dropped_under_request_guard() {
        let (source, mut gates) = GatedSource::new(&["first", "second"]);
        let mut ctrl = controller(source, ResponseOrdering::LatestRequestWins);
        for text in ["first", "second"] {
            ctrl.set_filter(FilterChange {
                search_text: Some(text.into()),
                ..FilterChange::default()
            });
        }
        settle(&mut ctrl).await;

        gates.remove("second").unwrap().send(page(&[2], 1)).unwrap();
        settle(&mut ctrl).await;
        gates.remove("first").unwrap().send(page(&[1], 1)).unwrap();
        settle(&mut ctrl).await;
        assert_eq!(ids(&ctrl), vec![2]);
        assert!(!ctrl.is_loading());
    }

    #[tokio::test]
    async fn expand_export_and_copy_are_local() {
        let source = MemorySource::with_records(2);
        let links = Arc::new(RecordingLinks::default());
        let mut ctrl = controller_with_links(source.clone(), ResponseOrdering::LatestRequestWins, links.clone());
        ctrl.refresh();
        settle(&mut ctrl).await;

        ctrl.toggle_expanded(1);
        assert!(ctrl.render().cards[0].expanded);
        ctrl.toggle_expanded(1);
        assert!(!ctrl.render().cards[0].expanded);

        ctrl.export_all();
        assert_eq!(*links.0.lock().unwrap(), vec!["mem://export".to_string()]);
        assert_eq!(ctrl.copy_prompt(2).as_deref(), Some("prompt 2"));
        assert_eq!(ctrl.copy_prompt(99), None);

        settle(&mut ctrl).await;
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn auto_refresh_waits_for_interval() {
        let source = MemorySource::with_records(1);
        let mut ctrl = controller(source.clone(), ResponseOrdering::LatestRequestWins)
            .with_auto_refresh(Some(Duration::from_secs(30)));
        let start = Instant::now();
        assert!(ctrl.tick(start));
        settle(&mut ctrl).await;

        assert!(!ctrl.tick(Instant::now()));
        assert!(ctrl.next_refresh_in(Instant::now()).unwrap() <= Duration::from_secs(30));
        assert!(ctrl.tick(Instant::now() + Duration::from_secs(31)));
        settle(&mut ctrl).await;
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn thumbnail_url_uses_file_name() {
        let source = MemorySource::with_records(0);
        let ctrl = controller(source, ResponseOrdering::LatestRequestWins);
        let mut rec = record(3, "x");
        rec.thumbnail_path = Some("/data/thumbs/3_thumb.png".into());
        assert_eq!(ctrl.thumbnail_url(&rec).as_deref(), Some("mem://thumbnail/3_thumb.png"));
        rec.thumbnail_path = None;
        assert_eq!(ctrl.thumbnail_url(&rec), None);
    }
}

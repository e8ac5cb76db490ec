//! Stateful pagination/search controller
//!
//! `SearchController` owns the mutable page/sort/filter fields for one
//! list view, serializes them to a canonical [`SearchRequest`], and
//! drives a reload pipeline with latest-trigger-wins semantics and an
//! observable loading flag.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::{Stream, stream};
use serde_json::Value;
use tokio::sync::watch;

use relay_domain::{FilterOperator, SearchFilter, SearchRequest, SearchRequestResponse, SortOrder};

use crate::error::ApiResult;

type PaginatedFetch<T> =
    dyn Fn(SearchRequest) -> BoxFuture<'static, ApiResult<SearchRequestResponse<T>>> + Send + Sync;

struct Inner<T> {
    fields: Mutex<SearchRequest>,
    fetch: Box<PaginatedFetch<T>>,
    // Reload trigger: a monotonically increasing generation. A fetch is
    // current only while no newer generation has been published.
    reload_tx: watch::Sender<u64>,
    loading_tx: watch::Sender<bool>,
}

impl<T> Inner<T> {
    fn fields(&self) -> MutexGuard<'_, SearchRequest> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clamped snapshot of the current fields. Stored values are left
    /// untouched; only the serialized form enforces `page >= 1` and
    /// `limit >= 1`.
    fn snapshot(&self) -> SearchRequest {
        let fields = self.fields();
        let mut request = fields.clone();
        request.page = request.page.max(1);
        request.limit = request.limit.max(1);
        request
    }

    fn set_loading(&self, value: bool) {
        self.loading_tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

/// Pagination/search state bound to a paginated fetch function.
///
/// Cloning shares the same state and reload pipeline, so a clone can
/// mutate fields or trigger reloads observed by an existing
/// [`load_data`](Self::load_data) stream.
pub struct SearchController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SearchController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> SearchController<T> {
    /// Creates a controller around a paginated fetch function, typically
    /// a [`CrudClient::find_by_pagination`](crate::CrudClient::find_by_pagination)
    /// closure. The pipeline fires one initial load as soon as
    /// [`load_data`](Self::load_data) is subscribed.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(SearchRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<SearchRequestResponse<T>>> + Send + 'static,
    {
        let (reload_tx, _) = watch::channel(0_u64);
        let (loading_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                fields: Mutex::new(SearchRequest::default()),
                fetch: Box::new(move |request| Box::pin(fetch(request))),
                reload_tx,
                loading_tx,
            }),
        }
    }

    /// The reload pipeline. Each trigger sets the loading flag, snapshots
    /// the fields, and runs one fetch; a newer trigger supersedes a fetch
    /// still in flight, whose result is discarded without touching the
    /// loading flag. The stream never ends while the controller is alive.
    pub fn load_data(&self) -> impl Stream<Item = ApiResult<SearchRequestResponse<T>>> + Send {
        let inner = Arc::clone(&self.inner);
        let mut trigger = inner.reload_tx.subscribe();
        // Replay-on-subscribe: the generation current at subscribe time
        // counts as unseen and produces the initial load.
        trigger.mark_changed();

        stream::unfold((inner, trigger), |(inner, mut trigger)| async move {
            if trigger.changed().await.is_err() {
                return None;
            }
            loop {
                let generation = *trigger.borrow_and_update();
                inner.set_loading(true);
                let request = inner.snapshot();
                tracing::debug!(generation, page = request.page, "starting fetch");
                let fetch = (inner.fetch)(request);
                tokio::pin!(fetch);
                tokio::select! {
                    result = &mut fetch => {
                        if trigger.has_changed().unwrap_or(false) {
                            // A newer trigger landed in the same poll
                            // window; this result is stale.
                            tracing::debug!(generation, "discarding superseded result");
                            continue;
                        }
                        inner.set_loading(false);
                        return Some((result, (inner, trigger)));
                    }
                    changed = trigger.changed() => {
                        if changed.is_err() {
                            return None;
                        }
                        tracing::debug!(generation, "fetch superseded in flight");
                    }
                }
            }
        })
    }
}

impl<T> SearchController<T> {
    /// Triggers the reload pipeline unconditionally.
    pub fn reload(&self) {
        self.inner.reload_tx.send_modify(|generation| *generation += 1);
        tracing::debug!("reload requested");
    }

    /// Whether a fetch is currently pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.inner.loading_tx.borrow()
    }

    /// Watches the loading flag.
    #[must_use]
    pub fn loading_watch(&self) -> watch::Receiver<bool> {
        self.inner.loading_tx.subscribe()
    }

    /// Serializes the current fields, enforcing `page >= 1` and
    /// `limit >= 1` without mutating the stored values.
    #[must_use]
    pub fn to_search_request(&self) -> SearchRequest {
        self.inner.snapshot()
    }

    /// Current page field, as stored.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.inner.fields().page
    }

    /// Sets the page field.
    pub fn set_page(&self, page: u32) {
        self.inner.fields().page = page;
    }

    /// Current limit field, as stored.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.inner.fields().limit
    }

    /// Sets the limit field.
    pub fn set_limit(&self, limit: u32) {
        self.inner.fields().limit = limit;
    }

    /// Current free-text search term.
    #[must_use]
    pub fn search(&self) -> String {
        self.inner.fields().search.clone()
    }

    /// Sets the free-text search term.
    pub fn set_search(&self, search: impl Into<String>) {
        self.inner.fields().search = search.into();
    }

    /// Current sort field and direction.
    #[must_use]
    pub fn sort(&self) -> (String, SortOrder) {
        let fields = self.inner.fields();
        (fields.sort_by.clone(), fields.sort_order)
    }

    /// Sets the sort field and direction.
    pub fn set_sort(&self, sort_by: impl Into<String>, sort_order: SortOrder) {
        let mut fields = self.inner.fields();
        fields.sort_by = sort_by.into();
        fields.sort_order = sort_order;
    }

    /// Sets or replaces the filter for one field.
    pub fn set_filter(
        &self,
        field: impl Into<String>,
        value: impl Into<Value>,
        operator: FilterOperator,
    ) {
        self.inner
            .fields()
            .filters
            .insert(field.into(), SearchFilter::new(value, operator));
    }

    /// Removes the filter for one field.
    pub fn remove_filter(&self, field: &str) {
        self.inner.fields().filters.remove(field);
    }

    /// Removes every filter.
    pub fn clear_filters(&self) {
        self.inner.fields().filters.clear();
    }
}

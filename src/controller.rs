//! Stateful coordinator for one client collection view.
//!
//! Owns the current page of records, the active filter set and the
//! loading/error status. The store is injected through the gateway traits so
//! the whole state machine is unit-testable without a live database.
//!
//! Concurrency model: one controller per view, serializing its own
//! transitions. Fetches carry a monotonically increasing token; a response
//! is applied only when its token is still the latest, so a stale response
//! arriving after a newer request started is discarded. Mutations are
//! optimistic: the local page mutates immediately and is rolled back to the
//! pre-mutation snapshot if the store call fails.

use std::time::{Duration, Instant};

use chrono::Utc;

use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::pagination::Paginated;
use crate::repository::{ClientListQuery, ClientReader, ClientWriter};
use crate::services::client as client_service;
use crate::services::{ServiceError, ServiceResult};

/// Quiet window within which successive filter edits coalesce into a single
/// fetch.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Active filter set. Filters compose as logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilters {
    pub search: Option<String>,
    pub city: Option<String>,
    pub activity: Option<String>,
}

impl ClientFilters {
    fn to_query(&self, page: usize, per_page: usize) -> ClientListQuery {
        let mut query = ClientListQuery::new().paginate(page, per_page);
        if let Some(search) = &self.search {
            query = query.search(search.clone());
        }
        if let Some(city) = &self.city {
            query = query.city(city.clone());
        }
        if let Some(activity) = &self.activity {
            query = query.activity(activity.clone());
        }
        query
    }
}

/// Collection view lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

#[derive(Debug)]
struct PendingFilters {
    filters: ClientFilters,
    due: Instant,
}

#[derive(Debug, Clone)]
struct Snapshot {
    items: Vec<Client>,
    total: usize,
}

/// Controller over one paginated client collection.
pub struct ClientCollection<R> {
    repo: R,
    per_page: usize,
    page: usize,
    total: usize,
    items: Vec<Client>,
    filters: ClientFilters,
    pending: Option<PendingFilters>,
    latest_token: u64,
    status: Status,
}

impl<R> ClientCollection<R>
where
    R: ClientReader + ClientWriter,
{
    pub fn new(repo: R, per_page: usize) -> Self {
        Self {
            repo,
            per_page: per_page.max(1),
            page: 1,
            total: 0,
            items: Vec::new(),
            filters: ClientFilters::default(),
            pending: None,
            latest_token: 0,
            status: Status::Idle,
        }
    }

    pub fn items(&self) -> &[Client] {
        &self.items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Authoritative count from the last successful fetch, adjusted by
    /// optimistic creates/deletes until the next refetch.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn filters(&self) -> &ClientFilters {
        &self.filters
    }

    /// Page-window view for presentation layers.
    pub fn view(&self) -> Paginated<Client> {
        Paginated::new(self.items.clone(), self.page, self.total_pages())
    }

    /// Starts a fetch: bumps the request token and enters `Loading`.
    ///
    /// Split from [`apply_fetch`](Self::apply_fetch) so callers dispatching
    /// the store call elsewhere can still discard stale responses.
    pub fn begin_fetch(&mut self) -> (u64, ClientListQuery) {
        self.latest_token += 1;
        self.status = Status::Loading;
        (
            self.latest_token,
            self.filters.to_query(self.page, self.per_page),
        )
    }

    /// Applies a fetch response if its token is still the latest.
    ///
    /// Returns `Ok(false)` for a discarded stale response. Errors mark the
    /// view `Errored` and propagate.
    pub fn apply_fetch(
        &mut self,
        token: u64,
        result: ServiceResult<(usize, Vec<Client>)>,
    ) -> ServiceResult<bool> {
        if token != self.latest_token {
            return Ok(false);
        }
        match result {
            Ok((total, items)) => {
                self.total = total;
                self.items = items;
                self.status = Status::Loaded;
                Ok(true)
            }
            Err(err) => {
                self.status = Status::Errored(err.to_string());
                Err(err)
            }
        }
    }

    /// Fetches the current page inline.
    pub fn refresh(&mut self) -> ServiceResult<()> {
        let (token, query) = self.begin_fetch();
        let result = client_service::list_clients(&self.repo, &query);
        self.apply_fetch(token, result).map(|_| ())
    }

    /// Jumps to a page and refetches immediately.
    pub fn set_page(&mut self, page: usize) -> ServiceResult<()> {
        self.page = page.max(1);
        self.refresh()
    }

    /// Stages a search-term edit; the fetch fires once the quiet window
    /// elapses in [`poll`](Self::poll).
    pub fn set_search(&mut self, term: Option<String>, now: Instant) {
        let mut filters = self.staged_filters();
        filters.search = term.filter(|t| !t.trim().is_empty());
        self.stage(filters, now);
    }

    pub fn set_city(&mut self, city: Option<String>, now: Instant) {
        let mut filters = self.staged_filters();
        filters.city = city.filter(|c| !c.trim().is_empty());
        self.stage(filters, now);
    }

    pub fn set_activity(&mut self, activity: Option<String>, now: Instant) {
        let mut filters = self.staged_filters();
        filters.activity = activity.filter(|a| !a.trim().is_empty());
        self.stage(filters, now);
    }

    fn staged_filters(&self) -> ClientFilters {
        self.pending
            .as_ref()
            .map(|p| p.filters.clone())
            .unwrap_or_else(|| self.filters.clone())
    }

    fn stage(&mut self, filters: ClientFilters, now: Instant) {
        self.pending = Some(PendingFilters {
            filters,
            due: now + DEBOUNCE_WINDOW,
        });
    }

    /// Flushes a staged filter change once its quiet window has elapsed.
    ///
    /// Committing resets the page to 1. Returns `Ok(true)` when a fetch
    /// happened.
    pub fn poll(&mut self, now: Instant) -> ServiceResult<bool> {
        let due = self.pending.as_ref().is_some_and(|p| now >= p.due);
        if !due {
            return Ok(false);
        }
        if let Some(pending) = self.pending.take() {
            self.filters = pending.filters;
            self.page = 1;
            self.refresh()?;
        }
        Ok(true)
    }

    /// Creates a record optimistically: the new client is prepended (and the
    /// total bumped) before the store confirms; on failure the page is
    /// restored exactly.
    pub fn create(&mut self, new_client: &NewClient) -> ServiceResult<Client> {
        let snapshot = self.snapshot();

        let provisional = Client::from_new(0, new_client, Utc::now().naive_utc());
        self.items.insert(0, provisional);
        self.total += 1;

        match client_service::create_client(&self.repo, new_client) {
            Ok(created) => {
                self.items[0] = created.clone();
                Ok(created)
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Updates a record optimistically with an in-place merge.
    pub fn update(&mut self, client_id: i32, updates: &UpdateClient) -> ServiceResult<Client> {
        let snapshot = self.snapshot();

        if let Some(item) = self.items.iter_mut().find(|c| c.id == client_id) {
            item.apply(updates);
        }

        match client_service::update_client(&self.repo, client_id, updates) {
            Ok(updated) => {
                if let Some(item) = self.items.iter_mut().find(|c| c.id == client_id) {
                    *item = updated.clone();
                }
                Ok(updated)
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    /// Soft-deletes a record optimistically. When the deletion empties the
    /// current page and prior pages have data, the controller steps back one
    /// page and refetches so an empty page is never shown.
    pub fn delete(&mut self, client_id: i32) -> ServiceResult<()> {
        let snapshot = self.snapshot();

        self.items.retain(|c| c.id != client_id);
        self.total = self.total.saturating_sub(1);

        match client_service::delete_client(&self.repo, client_id) {
            Ok(()) => {
                if self.items.is_empty() && self.page > 1 {
                    self.page -= 1;
                    self.refresh()?;
                }
                Ok(())
            }
            Err(err) => {
                self.rollback(snapshot, &err);
                Err(err)
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
            total: self.total,
        }
    }

    fn rollback(&mut self, snapshot: Snapshot, err: &ServiceError) {
        log::warn!("rolling back optimistic mutation: {err}");
        self.items = snapshot.items;
        self.total = snapshot.total;
        self.status = Status::Errored(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::InMemoryClientRepository;

    #[test]
    fn new_collection_starts_idle_on_page_one() {
        let controller = ClientCollection::new(InMemoryClientRepository::new(), 10);
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.total(), 0);
        assert_eq!(*controller.status(), Status::Idle);
    }

    #[test]
    fn begin_fetch_bumps_token_and_enters_loading() {
        let mut controller = ClientCollection::new(InMemoryClientRepository::new(), 10);
        let (first, _) = controller.begin_fetch();
        let (second, _) = controller.begin_fetch();
        assert!(second > first);
        assert_eq!(*controller.status(), Status::Loading);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut controller = ClientCollection::new(InMemoryClientRepository::new(), 10);
        let (old_token, _) = controller.begin_fetch();
        let (new_token, _) = controller.begin_fetch();

        let applied = controller
            .apply_fetch(old_token, Ok((42, Vec::new())))
            .unwrap();
        assert!(!applied);
        assert_eq!(controller.total(), 0);

        let applied = controller
            .apply_fetch(new_token, Ok((7, Vec::new())))
            .unwrap();
        assert!(applied);
        assert_eq!(controller.total(), 7);
        assert_eq!(*controller.status(), Status::Loaded);
    }

    #[test]
    fn zero_per_page_is_clamped() {
        let controller = ClientCollection::new(InMemoryClientRepository::new(), 0);
        assert_eq!(controller.per_page(), 1);
    }
}

//! In-memory record store used to isolate services and the collection
//! controller in tests. Mirrors the Diesel implementation's semantics,
//! including soft-delete scoping and the active-only uniqueness check, and
//! can inject a failure into the next call to exercise rollback paths.

use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::rut::Rut;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ClientListQuery, ClientReader, ClientWriter};

struct Inner {
    rows: Vec<Client>,
    next_id: i32,
    /// Logical clock so created_at ordering is deterministic.
    ticks: i64,
    fail_next: Option<RepositoryError>,
    list_calls: usize,
}

/// Thread-safe in-memory implementation of the gateway traits.
pub struct InMemoryClientRepository {
    inner: Mutex<Inner>,
}

impl Default for InMemoryClientRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: Vec::new(),
                next_id: 1,
                ticks: 0,
                fail_next: None,
                list_calls: 0,
            }),
        }
    }

    /// Makes the next repository call fail with the given error.
    pub fn fail_next(&self, error: RepositoryError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_next = Some(error);
        }
    }

    /// Number of `list` calls served, used to assert debounce coalescing.
    pub fn list_calls(&self) -> usize {
        self.inner.lock().map(|inner| inner.list_calls).unwrap_or(0)
    }

    /// Snapshot of every row, inactive ones included.
    pub fn all_rows(&self) -> Vec<Client> {
        self.inner
            .lock()
            .map(|inner| inner.rows.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unexpected("poisoned store lock".to_string()))
    }
}

impl Inner {
    fn take_failure(&mut self) -> RepositoryResult<()> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn now(&mut self) -> NaiveDateTime {
        self.ticks += 1;
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
            + Duration::seconds(self.ticks)
    }
}

fn matches(client: &Client, query: &ClientListQuery) -> bool {
    if !client.is_active {
        return false;
    }
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        let hit = client.legal_name.to_lowercase().contains(&term)
            || client.tax_id.to_lowercase().contains(&term)
            || client
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&term));
        if !hit {
            return false;
        }
    }
    if let Some(city) = &query.city
        && client.city.as_deref() != Some(city.as_str())
    {
        return false;
    }
    if let Some(activity) = &query.activity
        && client.business_activity.as_deref() != Some(activity.as_str())
    {
        return false;
    }
    true
}

impl ClientReader for InMemoryClientRepository {
    fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Client>> {
        let mut inner = self.lock()?;
        inner.take_failure()?;
        Ok(inner.rows.iter().find(|c| c.id == id).cloned())
    }

    fn list(&self, query: &ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)> {
        let mut inner = self.lock()?;
        inner.list_calls += 1;
        inner.take_failure()?;

        let mut found: Vec<Client> = inner
            .rows
            .iter()
            .filter(|c| matches(c, query))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = found.len();
        let items = match &query.pagination {
            Some(p) => {
                let offset = (p.page.max(1) - 1) * p.per_page;
                found.into_iter().skip(offset).take(p.per_page).collect()
            }
            None => found,
        };

        Ok((total, items))
    }

    fn list_all(&self) -> RepositoryResult<Vec<Client>> {
        let (_, items) = self.list(&ClientListQuery::new())?;
        Ok(items)
    }

    fn exists_by_tax_id(&self, tax_id: &Rut, exclude_id: Option<i32>) -> RepositoryResult<bool> {
        let mut inner = self.lock()?;
        inner.take_failure()?;
        Ok(inner.rows.iter().any(|c| {
            c.is_active && c.tax_id == tax_id.as_str() && Some(c.id) != exclude_id
        }))
    }
}

impl ClientWriter for InMemoryClientRepository {
    fn create(&self, new_client: &NewClient) -> RepositoryResult<Client> {
        let mut inner = self.lock()?;
        inner.take_failure()?;

        // Same guarantee the partial unique index provides in SQLite.
        if inner
            .rows
            .iter()
            .any(|c| c.is_active && c.tax_id == new_client.tax_id.as_str())
        {
            return Err(RepositoryError::ConstraintViolation(
                "Unique constraint violation: clients.tax_id".to_string(),
            ));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let now = inner.now();
        let client = Client::from_new(id, new_client, now);
        inner.rows.push(client.clone());
        Ok(client)
    }

    fn update(&self, client_id: i32, updates: &UpdateClient) -> RepositoryResult<Client> {
        let mut inner = self.lock()?;
        inner.take_failure()?;
        let now = inner.now();

        let row = inner
            .rows
            .iter_mut()
            .find(|c| c.id == client_id)
            .ok_or(RepositoryError::NotFound)?;

        row.apply(updates);
        row.updated_at = now;
        Ok(row.clone())
    }

    fn soft_delete(&self, client_id: i32) -> RepositoryResult<()> {
        let mut inner = self.lock()?;
        inner.take_failure()?;
        let now = inner.now();

        if let Some(row) = inner
            .rows
            .iter_mut()
            .find(|c| c.id == client_id && c.is_active)
        {
            row.is_active = false;
            row.updated_at = now;
        }
        Ok(())
    }
}

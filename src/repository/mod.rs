//! Record store gateway: query types and the reader/writer traits every
//! store implementation provides.
//!
//! All operations are scoped to active records; soft-deleted rows are
//! invisible to listings and uniqueness checks but never physically removed.

use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::rut::Rut;
use crate::repository::errors::RepositoryResult;

pub mod client;
pub mod errors;
pub mod mock;

#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

/// Filter set for listing clients. Filters compose as logical AND; the
/// free-text search is a case-insensitive substring match over legal name,
/// tax id and email (logical OR among the three).
#[derive(Debug, Clone, Default)]
pub struct ClientListQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub activity: Option<String>,
    pub pagination: Option<Pagination>,
}

impl ClientListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait ClientReader {
    fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Client>>;
    /// Returns the total active count matching the filters alongside the
    /// requested page, ordered newest first.
    fn list(&self, query: &ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)>;
    /// Unbounded active-record read used by export and statistics. Cost is
    /// O(active record count).
    fn list_all(&self) -> RepositoryResult<Vec<Client>>;
    /// Active-scope uniqueness pre-check; `exclude_id` lets a record keep
    /// its own identifier on update.
    fn exists_by_tax_id(&self, tax_id: &Rut, exclude_id: Option<i32>) -> RepositoryResult<bool>;
}

pub trait ClientWriter {
    fn create(&self, new_client: &NewClient) -> RepositoryResult<Client>;
    fn update(&self, client_id: i32, updates: &UpdateClient) -> RepositoryResult<Client>;
    /// Marks the record inactive. Idempotent: deleting an already-inactive
    /// or unknown record is not an error.
    fn soft_delete(&self, client_id: i32) -> RepositoryResult<()>;
}

// Let callers hand a borrowed store to owners like the collection
// controller.
impl<T: ClientReader + ?Sized> ClientReader for &T {
    fn get_by_id(&self, id: i32) -> RepositoryResult<Option<Client>> {
        (**self).get_by_id(id)
    }

    fn list(&self, query: &ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)> {
        (**self).list(query)
    }

    fn list_all(&self) -> RepositoryResult<Vec<Client>> {
        (**self).list_all()
    }

    fn exists_by_tax_id(&self, tax_id: &Rut, exclude_id: Option<i32>) -> RepositoryResult<bool> {
        (**self).exists_by_tax_id(tax_id, exclude_id)
    }
}

impl<T: ClientWriter + ?Sized> ClientWriter for &T {
    fn create(&self, new_client: &NewClient) -> RepositoryResult<Client> {
        (**self).create(new_client)
    }

    fn update(&self, client_id: i32, updates: &UpdateClient) -> RepositoryResult<Client> {
        (**self).update(client_id, updates)
    }

    fn soft_delete(&self, client_id: i32) -> RepositoryResult<()> {
        (**self).soft_delete(client_id)
    }
}

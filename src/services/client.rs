//! Client record operations: uniqueness-checked writes, listing, CSV export
//! and aggregate statistics.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::repository::{ClientListQuery, ClientReader, ClientWriter};
use crate::services::{ServiceError, ServiceResult};

/// UTF-8 byte-order mark prefixed to exports so spreadsheet tools detect the
/// encoding.
const UTF8_BOM: &str = "\u{feff}";

/// Export column labels, matching what the firm's staff expect to read.
const EXPORT_HEADERS: &[&str] = &[
    "RUT",
    "Razón Social",
    "Nombre Fantasía",
    "Email",
    "Teléfono",
    "Dirección",
    "Ciudad",
    "Actividad",
    "Representante Legal",
    "Fecha Inicio Actividades",
];

/// Aggregate figures over the active client set.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientStats {
    pub total: usize,
    pub with_email: usize,
    pub with_phone: usize,
    /// Distinct cities, sorted.
    pub cities: Vec<String>,
    /// Distinct business activities, sorted.
    pub activities: Vec<String>,
}

/// Returns the filtered, paginated client list with the authoritative total.
pub fn list_clients<R>(repo: &R, query: &ClientListQuery) -> ServiceResult<(usize, Vec<Client>)>
where
    R: ClientReader + ?Sized,
{
    repo.list(query).map_err(ServiceError::from)
}

/// Fetches a client by identifier.
pub fn get_client_by_id<R>(repo: &R, client_id: i32) -> ServiceResult<Option<Client>>
where
    R: ClientReader + ?Sized,
{
    repo.get_by_id(client_id).map_err(ServiceError::from)
}

/// Bounded quick-search for lookup fields: the usual substring match over
/// legal name, tax id and email, re-ordered alphabetically by legal name and
/// capped at `limit` hits.
pub fn search_clients<R>(repo: &R, term: &str, limit: usize) -> ServiceResult<Vec<Client>>
where
    R: ClientReader + ?Sized,
{
    let (_, mut items) = repo.list(&ClientListQuery::new().search(term))?;
    items.sort_by(|a, b| a.legal_name.cmp(&b.legal_name));
    items.truncate(limit);
    Ok(items)
}

/// Creates a client after checking no active record holds the tax id.
///
/// The pre-check gives callers a clean conflict message, but the partial
/// unique index in the store is the authoritative guarantee: a concurrent
/// insert between check and write still fails, and that failure is mapped to
/// the same conflict.
pub fn create_client<R>(repo: &R, new_client: &NewClient) -> ServiceResult<Client>
where
    R: ClientReader + ClientWriter + ?Sized,
{
    if repo.exists_by_tax_id(&new_client.tax_id, None)? {
        log::warn!(
            "rejected create: active client already holds {}",
            new_client.tax_id
        );
        return Err(ServiceError::UniquenessConflict(
            new_client.tax_id.to_string(),
        ));
    }

    repo.create(new_client).map_err(|err| {
        if err.is_unique_violation() {
            ServiceError::UniquenessConflict(new_client.tax_id.to_string())
        } else {
            log::error!("failed to create client: {err}");
            ServiceError::from(err)
        }
    })
}

/// Applies a partial update, re-running the uniqueness check (excluding the
/// record itself) when the tax id is being reassigned.
pub fn update_client<R>(repo: &R, client_id: i32, updates: &UpdateClient) -> ServiceResult<Client>
where
    R: ClientReader + ClientWriter + ?Sized,
{
    if let Some(tax_id) = &updates.tax_id
        && repo.exists_by_tax_id(tax_id, Some(client_id))?
    {
        log::warn!("rejected update of client {client_id}: {tax_id} already in use");
        return Err(ServiceError::UniquenessConflict(tax_id.to_string()));
    }

    repo.update(client_id, updates).map_err(|err| {
        if err.is_unique_violation() {
            let tax_id = updates
                .tax_id
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default();
            ServiceError::UniquenessConflict(tax_id)
        } else {
            ServiceError::from(err)
        }
    })
}

/// Soft-deletes a client. Idempotent.
pub fn delete_client<R>(repo: &R, client_id: i32) -> ServiceResult<()>
where
    R: ClientWriter + ?Sized,
{
    repo.soft_delete(client_id).map_err(ServiceError::from)
}

/// Materializes every active client into BOM-prefixed CSV text.
///
/// The `csv` writer wraps values containing delimiters or quotes in quotes
/// and doubles internal quotes, which is exactly the escaping downstream
/// spreadsheet tools expect.
pub fn export_csv<R>(repo: &R) -> ServiceResult<String>
where
    R: ClientReader + ?Sized,
{
    let clients = repo.list_all()?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| ServiceError::Store(csv_error(e)))?;

    for client in &clients {
        writer
            .write_record([
                client.tax_id.as_str(),
                client.legal_name.as_str(),
                client.trade_name.as_deref().unwrap_or(""),
                client.email.as_deref().unwrap_or(""),
                client.phone.as_deref().unwrap_or(""),
                client.address.as_deref().unwrap_or(""),
                client.city.as_deref().unwrap_or(""),
                client.business_activity.as_deref().unwrap_or(""),
                client.legal_representative.as_deref().unwrap_or(""),
                &client
                    .business_start_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ])
            .map_err(|e| ServiceError::Store(csv_error(e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::Store(csv_error(e)))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| ServiceError::Store(csv_error(e)))?;

    Ok(format!("{UTF8_BOM}{body}"))
}

fn csv_error(err: impl std::fmt::Display) -> crate::repository::errors::RepositoryError {
    crate::repository::errors::RepositoryError::Unexpected(format!("csv export failed: {err}"))
}

/// Computes aggregate statistics over the active set in one unbounded read.
/// Cost is O(active record count); fine at the firm's scale.
pub fn client_stats<R>(repo: &R) -> ServiceResult<ClientStats>
where
    R: ClientReader + ?Sized,
{
    let clients = repo.list_all()?;

    let with_email = clients
        .iter()
        .filter(|c| c.email.as_deref().is_some_and(|e| !e.trim().is_empty()))
        .count();
    let with_phone = clients
        .iter()
        .filter(|c| c.phone.as_deref().is_some_and(|p| !p.trim().is_empty()))
        .count();
    let cities: BTreeSet<String> = clients.iter().filter_map(|c| c.city.clone()).collect();
    let activities: BTreeSet<String> = clients
        .iter()
        .filter_map(|c| c.business_activity.clone())
        .collect();

    Ok(ClientStats {
        total: clients.len(),
        with_email,
        with_phone,
        cities: cities.into_iter().collect(),
        activities: activities.into_iter().collect(),
    })
}

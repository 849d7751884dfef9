//! Diesel row models for the `clients` table and their domain conversions.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::client::{
    Client as DomainClient, ClientType, NewClient as DomainNewClient,
    UpdateClient as DomainUpdateClient,
};

/// Collapses a stored empty string back to an absent value so reads never
/// surface `Some("")`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::clients)]
/// Diesel model for [`crate::domain::client::Client`].
pub struct ClientRow {
    pub id: i32,
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub business_activity: Option<String>,
    pub activity_code: Option<String>,
    pub business_start_date: Option<NaiveDate>,
    pub business_end_date: Option<NaiveDate>,
    pub legal_representative: Option<String>,
    pub legal_rep_tax_id: Option<String>,
    pub client_type: String,
    pub is_vat_contributor: bool,
    pub country: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::clients)]
/// Insertable form of [`ClientRow`].
pub struct NewClientRow<'a> {
    pub tax_id: &'a str,
    pub legal_name: &'a str,
    pub trade_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub website: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub business_activity: Option<&'a str>,
    pub activity_code: Option<&'a str>,
    pub business_start_date: Option<NaiveDate>,
    pub business_end_date: Option<NaiveDate>,
    pub legal_representative: Option<&'a str>,
    pub legal_rep_tax_id: Option<&'a str>,
    pub client_type: &'a str,
    pub is_vat_contributor: bool,
    pub country: &'a str,
    pub notes: Option<&'a str>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'a> NewClientRow<'a> {
    /// Builds the insertable row, stamping both timestamps with `now` and
    /// forcing the record active.
    pub fn from_domain(new: &'a DomainNewClient, now: NaiveDateTime) -> Self {
        Self {
            tax_id: new.tax_id.as_str(),
            legal_name: new.legal_name.as_str(),
            trade_name: new.trade_name.as_deref(),
            email: new.email.as_ref().map(|e| e.as_str()),
            phone: new.phone.as_ref().map(|p| p.as_str()),
            website: new.website.as_ref().map(|w| w.as_str()),
            address: new.address.as_deref(),
            city: new.city.as_deref(),
            state: new.state.as_deref(),
            postal_code: new.postal_code.as_deref(),
            business_activity: new.business_activity.as_deref(),
            activity_code: new.activity_code.as_deref(),
            business_start_date: new.business_start_date,
            business_end_date: new.business_end_date,
            legal_representative: new.legal_representative.as_deref(),
            legal_rep_tax_id: new.legal_rep_tax_id.as_ref().map(|r| r.as_str()),
            client_type: new.client_type.as_str(),
            is_vat_contributor: new.is_vat_contributor,
            country: &new.country,
            notes: new.notes.as_deref(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::clients)]
/// Data used when partially updating a [`ClientRow`].
///
/// Outer `None` skips the column; `Some(None)` writes NULL on nullable
/// columns. `updated_at` is always refreshed.
pub struct ClientChanges<'a> {
    pub tax_id: Option<&'a str>,
    pub legal_name: Option<&'a str>,
    pub trade_name: Option<Option<&'a str>>,
    pub email: Option<Option<&'a str>>,
    pub phone: Option<Option<&'a str>>,
    pub website: Option<Option<&'a str>>,
    pub address: Option<Option<&'a str>>,
    pub city: Option<Option<&'a str>>,
    pub state: Option<Option<&'a str>>,
    pub postal_code: Option<Option<&'a str>>,
    pub business_activity: Option<Option<&'a str>>,
    pub activity_code: Option<Option<&'a str>>,
    pub business_start_date: Option<Option<NaiveDate>>,
    pub business_end_date: Option<Option<NaiveDate>>,
    pub legal_representative: Option<Option<&'a str>>,
    pub legal_rep_tax_id: Option<Option<&'a str>>,
    pub client_type: Option<&'a str>,
    pub is_vat_contributor: Option<bool>,
    pub notes: Option<Option<&'a str>>,
    pub updated_at: NaiveDateTime,
}

impl<'a> ClientChanges<'a> {
    /// Borrows the domain update payload, refreshing `updated_at` to `now`.
    pub fn from_domain(updates: &'a DomainUpdateClient, now: NaiveDateTime) -> Self {
        Self {
            tax_id: updates.tax_id.as_ref().map(|r| r.as_str()),
            legal_name: updates.legal_name.as_ref().map(|n| n.as_str()),
            trade_name: updates.trade_name.as_ref().map(|v| v.as_deref()),
            email: updates
                .email
                .as_ref()
                .map(|v| v.as_ref().map(|e| e.as_str())),
            phone: updates
                .phone
                .as_ref()
                .map(|v| v.as_ref().map(|p| p.as_str())),
            website: updates
                .website
                .as_ref()
                .map(|v| v.as_ref().map(|w| w.as_str())),
            address: updates.address.as_ref().map(|v| v.as_deref()),
            city: updates.city.as_ref().map(|v| v.as_deref()),
            state: updates.state.as_ref().map(|v| v.as_deref()),
            postal_code: updates.postal_code.as_ref().map(|v| v.as_deref()),
            business_activity: updates.business_activity.as_ref().map(|v| v.as_deref()),
            activity_code: updates.activity_code.as_ref().map(|v| v.as_deref()),
            business_start_date: updates.business_start_date,
            business_end_date: updates.business_end_date,
            legal_representative: updates.legal_representative.as_ref().map(|v| v.as_deref()),
            legal_rep_tax_id: updates
                .legal_rep_tax_id
                .as_ref()
                .map(|v| v.as_ref().map(|r| r.as_str())),
            client_type: updates.client_type.map(ClientType::as_str),
            is_vat_contributor: updates.is_vat_contributor,
            notes: updates.notes.as_ref().map(|v| v.as_deref()),
            updated_at: now,
        }
    }
}

impl From<ClientRow> for DomainClient {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            tax_id: row.tax_id,
            legal_name: row.legal_name,
            trade_name: non_empty(row.trade_name),
            email: non_empty(row.email),
            phone: non_empty(row.phone),
            website: non_empty(row.website),
            address: non_empty(row.address),
            city: non_empty(row.city),
            state: non_empty(row.state),
            postal_code: non_empty(row.postal_code),
            business_activity: non_empty(row.business_activity),
            activity_code: non_empty(row.activity_code),
            business_start_date: row.business_start_date,
            business_end_date: row.business_end_date,
            legal_representative: non_empty(row.legal_representative),
            legal_rep_tax_id: non_empty(row.legal_rep_tax_id),
            client_type: ClientType::parse(&row.client_type).unwrap_or_default(),
            is_vat_contributor: row.is_vat_contributor,
            country: row.country,
            notes: row.notes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

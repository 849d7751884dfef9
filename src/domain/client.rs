//! Client record aggregate and its create/update payloads.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::rut::Rut;
use crate::domain::types::{ClientEmail, NonEmptyString, PhoneNumber, WebsiteUrl};

/// Default ISO country code applied when creating a client.
pub const DEFAULT_COUNTRY: &str = "CL";

/// Legal classification of a client.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    Company,
    Individual,
}

impl ClientType {
    /// Storage rendering used by the record store.
    pub const fn as_str(self) -> &'static str {
        match self {
            ClientType::Company => "company",
            ClientType::Individual => "individual",
        }
    }

    /// Parses the storage rendering, `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "company" => Some(ClientType::Company),
            "individual" => Some(ClientType::Individual),
            _ => None,
        }
    }
}

/// A client of the consulting firm as read back from the record store.
///
/// Optional fields absent in storage stay `None`; they are never surfaced as
/// empty strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: i32,
    /// Canonical `NN.NNN.NNN-D` tax identifier, unique among active records.
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
    pub client_type: ClientType,
    pub is_vat_contributor: bool,
    pub country: String,
    pub notes: Option<String>,
    /// Soft-delete flag; inactive records are retained for history only.
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Validated payload for creating a client.
///
/// Construction happens through the form layer which normalizes every
/// optional field (trimmed, empty collapsed to `None`) and applies the
/// creation defaults.
#[derive(Clone, Debug, Deserialize)]
pub struct NewClient {
    pub tax_id: Rut,
    pub legal_name: NonEmptyString,
    pub trade_name: Option<String>,
    pub email: Option<ClientEmail>,
    pub phone: Option<PhoneNumber>,
    pub website: Option<WebsiteUrl>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub business_activity: Option<String>,
    pub activity_code: Option<String>,
    pub business_start_date: Option<NaiveDate>,
    pub business_end_date: Option<NaiveDate>,
    pub legal_representative: Option<String>,
    pub legal_rep_tax_id: Option<Rut>,
    pub client_type: ClientType,
    pub is_vat_contributor: bool,
    pub country: String,
    pub notes: Option<String>,
}

impl NewClient {
    /// Minimal payload with creation defaults, used by tests and importers.
    #[must_use]
    pub fn bare(tax_id: Rut, legal_name: NonEmptyString) -> Self {
        Self {
            tax_id,
            legal_name,
            trade_name: None,
            email: None,
            phone: None,
            website: None,
            address: None,
            city: None,
            state: None,
            postal_code: None,
            business_activity: None,
            activity_code: None,
            business_start_date: None,
            business_end_date: None,
            legal_representative: None,
            legal_rep_tax_id: None,
            client_type: ClientType::default(),
            is_vat_contributor: true,
            country: DEFAULT_COUNTRY.to_string(),
            notes: None,
        }
    }
}

/// Partial update payload.
///
/// `None` leaves a column untouched. For nullable columns the inner option
/// distinguishes "set this value" from "clear the field": `Some(None)`
/// writes NULL.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateClient {
    pub tax_id: Option<Rut>,
    pub legal_name: Option<NonEmptyString>,
    pub trade_name: Option<Option<String>>,
    pub email: Option<Option<ClientEmail>>,
    pub phone: Option<Option<PhoneNumber>>,
    pub website: Option<Option<WebsiteUrl>>,
    pub address: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub postal_code: Option<Option<String>>,
    pub business_activity: Option<Option<String>>,
    pub activity_code: Option<Option<String>>,
    pub business_start_date: Option<Option<NaiveDate>>,
    pub business_end_date: Option<Option<NaiveDate>>,
    pub legal_representative: Option<Option<String>>,
    pub legal_rep_tax_id: Option<Option<Rut>>,
    pub client_type: Option<ClientType>,
    pub is_vat_contributor: Option<bool>,
    pub notes: Option<Option<String>>,
}

impl Client {
    /// Applies a partial update in place, mirroring the merge the record
    /// store performs. Used for optimistic local mutation and by the
    /// in-memory store.
    pub fn apply(&mut self, updates: &UpdateClient) {
        if let Some(tax_id) = &updates.tax_id {
            self.tax_id = tax_id.as_str().to_string();
        }
        if let Some(legal_name) = &updates.legal_name {
            self.legal_name = legal_name.as_str().to_string();
        }
        if let Some(trade_name) = &updates.trade_name {
            self.trade_name = trade_name.clone();
        }
        if let Some(email) = &updates.email {
            self.email = email.as_ref().map(|e| e.as_str().to_string());
        }
        if let Some(phone) = &updates.phone {
            self.phone = phone.as_ref().map(|p| p.as_str().to_string());
        }
        if let Some(website) = &updates.website {
            self.website = website.as_ref().map(|w| w.as_str().to_string());
        }
        if let Some(address) = &updates.address {
            self.address = address.clone();
        }
        if let Some(city) = &updates.city {
            self.city = city.clone();
        }
        if let Some(state) = &updates.state {
            self.state = state.clone();
        }
        if let Some(postal_code) = &updates.postal_code {
            self.postal_code = postal_code.clone();
        }
        if let Some(business_activity) = &updates.business_activity {
            self.business_activity = business_activity.clone();
        }
        if let Some(activity_code) = &updates.activity_code {
            self.activity_code = activity_code.clone();
        }
        if let Some(business_start_date) = &updates.business_start_date {
            self.business_start_date = *business_start_date;
        }
        if let Some(business_end_date) = &updates.business_end_date {
            self.business_end_date = *business_end_date;
        }
        if let Some(legal_representative) = &updates.legal_representative {
            self.legal_representative = legal_representative.clone();
        }
        if let Some(legal_rep_tax_id) = &updates.legal_rep_tax_id {
            self.legal_rep_tax_id = legal_rep_tax_id.as_ref().map(|r| r.as_str().to_string());
        }
        if let Some(client_type) = updates.client_type {
            self.client_type = client_type;
        }
        if let Some(is_vat_contributor) = updates.is_vat_contributor {
            self.is_vat_contributor = is_vat_contributor;
        }
        if let Some(notes) = &updates.notes {
            self.notes = notes.clone();
        }
    }

    /// Materializes a freshly-created record from its payload, the way the
    /// record store does on insert.
    #[must_use]
    pub fn from_new(id: i32, new: &NewClient, now: NaiveDateTime) -> Self {
        Self {
            id,
            tax_id: new.tax_id.as_str().to_string(),
            legal_name: new.legal_name.as_str().to_string(),
            trade_name: new.trade_name.clone(),
            email: new.email.as_ref().map(|e| e.as_str().to_string()),
            phone: new.phone.as_ref().map(|p| p.as_str().to_string()),
            website: new.website.as_ref().map(|w| w.as_str().to_string()),
            address: new.address.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
            postal_code: new.postal_code.clone(),
            business_activity: new.business_activity.clone(),
            activity_code: new.activity_code.clone(),
            business_start_date: new.business_start_date,
            business_end_date: new.business_end_date,
            legal_representative: new.legal_representative.clone(),
            legal_rep_tax_id: new.legal_rep_tax_id.as_ref().map(|r| r.as_str().to_string()),
            client_type: new.client_type,
            is_vat_contributor: new.is_vat_contributor,
            country: new.country.clone(),
            notes: new.notes.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

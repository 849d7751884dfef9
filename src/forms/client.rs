//! Client record schema: the single validation contract for both creation
//! and update paths.
//!
//! Every rule is declared once here. `parse` collects *all* violations in a
//! single pass so a form can surface every problem at once, and normalizes
//! optional fields (trimmed, empty collapsed to `None`) before anything
//! reaches the record store.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::client::{ClientType, DEFAULT_COUNTRY, NewClient, UpdateClient};
use crate::domain::rut::Rut;
use crate::domain::types::{
    ClientEmail, NonEmptyString, PhoneNumber, TypeConstraintError, WebsiteUrl,
};
use crate::forms::{FieldError, flatten_errors};

/// Declaration order used to keep flattened error lists deterministic.
const FIELD_ORDER: &[&str] = &[
    "tax_id",
    "legal_name",
    "trade_name",
    "email",
    "phone",
    "website",
    "address",
    "city",
    "state",
    "postal_code",
    "business_activity",
    "activity_code",
    "business_start_date",
    "business_end_date",
    "legal_representative",
    "legal_rep_tax_id",
    "client_type",
    "notes",
];

fn validate_tax_id(value: &str) -> Result<(), ValidationError> {
    match Rut::new(value) {
        Ok(_) => Ok(()),
        Err(TypeConstraintError::TaxIdChecksum) => Err(ValidationError::new("tax_id_checksum")
            .with_message("tax identifier checksum mismatch".into())),
        Err(_) => Err(ValidationError::new("tax_id_format")
            .with_message("malformed tax identifier".into())),
    }
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    PhoneNumber::new(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("phone").with_message("invalid phone number".into()))
}

fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value).map(|_| ()).ok_or_else(|| {
        ValidationError::new("date").with_message("expected an ISO-8601 date".into())
    })
}

fn validate_client_type(value: &str) -> Result<(), ValidationError> {
    ClientType::parse(value).map(|_| ()).ok_or_else(|| {
        ValidationError::new("client_type")
            .with_message("client type must be company or individual".into())
    })
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Trims a required field.
fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Trims an optional field, collapsing empty input to `None`.
fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Update semantics for an optional column: absent keeps the stored value,
/// supplied-but-blank clears it, anything else replaces it.
fn patch(value: &Option<String>) -> Option<Option<String>> {
    value
        .as_ref()
        .map(|s| Some(s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
/// Form data for creating a client record.
pub struct ClientForm {
    /// National tax identifier, any accepted punctuation.
    #[validate(custom(function = validate_tax_id))]
    pub tax_id: String,
    /// Registered legal name.
    #[validate(length(min = 1, max = 255, message = "legal name must be 1-255 characters"))]
    pub legal_name: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "trade name too long"))]
    pub trade_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_phone))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(url(message = "invalid url address"))]
    pub website: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "address too long"))]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "city too long"))]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "state too long"))]
    pub state: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "postal code too long"))]
    pub postal_code: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "business activity too long"))]
    pub business_activity: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "activity code too long"))]
    pub activity_code: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_iso_date))]
    pub business_start_date: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_iso_date))]
    pub business_end_date: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "representative name too long"))]
    pub legal_representative: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_tax_id))]
    pub legal_rep_tax_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_client_type))]
    pub client_type: Option<String>,
    #[serde(default)]
    pub is_vat_contributor: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClientForm {
    /// Returns a copy with every field trimmed and optional empties
    /// collapsed to `None`, so validation and persistence see one shape.
    fn normalized(&self) -> Self {
        Self {
            tax_id: trimmed(&self.tax_id),
            legal_name: trimmed(&self.legal_name),
            trade_name: optional(&self.trade_name),
            email: optional(&self.email),
            phone: optional(&self.phone),
            website: optional(&self.website),
            address: optional(&self.address),
            city: optional(&self.city),
            state: optional(&self.state),
            postal_code: optional(&self.postal_code),
            business_activity: optional(&self.business_activity),
            activity_code: optional(&self.activity_code),
            business_start_date: optional(&self.business_start_date),
            business_end_date: optional(&self.business_end_date),
            legal_representative: optional(&self.legal_representative),
            legal_rep_tax_id: optional(&self.legal_rep_tax_id),
            client_type: optional(&self.client_type),
            is_vat_contributor: self.is_vat_contributor,
            notes: optional(&self.notes),
        }
    }

    /// Validates the form and produces the creation payload.
    ///
    /// All violations are collected; creation defaults (`company`, VAT
    /// contributor, country) are applied here and only here.
    pub fn parse(&self) -> Result<NewClient, Vec<FieldError>> {
        let form = self.normalized();
        if let Err(violations) = form.validate() {
            return Err(flatten_errors(&violations, FIELD_ORDER));
        }

        let mut errors = Vec::new();
        let tax_id = Rut::new(&form.tax_id)
            .map_err(|e| errors.push(FieldError::from_constraint("tax_id", &e)))
            .ok();
        let legal_name = NonEmptyString::new(&form.legal_name)
            .map_err(|e| errors.push(FieldError::from_constraint("legal_name", &e)))
            .ok();
        let email = match form.email.as_deref().map(ClientEmail::new) {
            Some(Ok(email)) => Some(email),
            Some(Err(e)) => {
                errors.push(FieldError::from_constraint("email", &e));
                None
            }
            None => None,
        };
        let phone = match form.phone.as_deref().map(PhoneNumber::new) {
            Some(Ok(phone)) => Some(phone),
            Some(Err(e)) => {
                errors.push(FieldError::from_constraint("phone", &e));
                None
            }
            None => None,
        };
        let website = match form.website.as_deref().map(WebsiteUrl::new) {
            Some(Ok(url)) => Some(url),
            Some(Err(e)) => {
                errors.push(FieldError::from_constraint("website", &e));
                None
            }
            None => None,
        };
        let legal_rep_tax_id = match form.legal_rep_tax_id.as_deref().map(Rut::new) {
            Some(Ok(rut)) => Some(rut),
            Some(Err(e)) => {
                errors.push(FieldError::from_constraint("legal_rep_tax_id", &e));
                None
            }
            None => None,
        };

        match (tax_id, legal_name) {
            (Some(tax_id), Some(legal_name)) if errors.is_empty() => Ok(NewClient {
                tax_id,
                legal_name,
                trade_name: form.trade_name,
                email,
                phone,
                website,
                address: form.address,
                city: form.city,
                state: form.state,
                postal_code: form.postal_code,
                business_activity: form.business_activity,
                activity_code: form.activity_code,
                business_start_date: form.business_start_date.as_deref().and_then(parse_date),
                business_end_date: form.business_end_date.as_deref().and_then(parse_date),
                legal_representative: form.legal_representative,
                legal_rep_tax_id,
                client_type: form
                    .client_type
                    .as_deref()
                    .and_then(ClientType::parse)
                    .unwrap_or_default(),
                is_vat_contributor: form.is_vat_contributor.unwrap_or(true),
                country: DEFAULT_COUNTRY.to_string(),
                notes: form.notes.map(|n| ammonia::clean(&n)),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
/// Form data for partially updating a client record.
///
/// Absent fields keep their stored value; optional fields supplied blank are
/// cleared. No creation default is ever re-applied here.
pub struct UpdateClientForm {
    #[serde(default)]
    #[validate(custom(function = validate_tax_id))]
    pub tax_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "legal name must be 1-255 characters"))]
    pub legal_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "trade name too long"))]
    pub trade_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_phone))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(url(message = "invalid url address"))]
    pub website: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "address too long"))]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "city too long"))]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "state too long"))]
    pub state: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "postal code too long"))]
    pub postal_code: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "business activity too long"))]
    pub business_activity: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "activity code too long"))]
    pub activity_code: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_iso_date))]
    pub business_start_date: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_iso_date))]
    pub business_end_date: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "representative name too long"))]
    pub legal_representative: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_tax_id))]
    pub legal_rep_tax_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_client_type))]
    pub client_type: Option<String>,
    #[serde(default)]
    pub is_vat_contributor: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateClientForm {
    /// Copy used for rule checking: blank optional fields stand for "clear"
    /// and carry no value to validate.
    fn validatable(&self) -> Self {
        Self {
            tax_id: optional(&self.tax_id),
            legal_name: self.legal_name.as_ref().map(|s| trimmed(s)),
            trade_name: optional(&self.trade_name),
            email: optional(&self.email),
            phone: optional(&self.phone),
            website: optional(&self.website),
            address: optional(&self.address),
            city: optional(&self.city),
            state: optional(&self.state),
            postal_code: optional(&self.postal_code),
            business_activity: optional(&self.business_activity),
            activity_code: optional(&self.activity_code),
            business_start_date: optional(&self.business_start_date),
            business_end_date: optional(&self.business_end_date),
            legal_representative: optional(&self.legal_representative),
            legal_rep_tax_id: optional(&self.legal_rep_tax_id),
            client_type: optional(&self.client_type),
            is_vat_contributor: self.is_vat_contributor,
            notes: self.notes.clone(),
        }
    }

    /// Validates the supplied fields and produces the partial update payload.
    pub fn parse(&self) -> Result<UpdateClient, Vec<FieldError>> {
        let form = self.validatable();
        if let Err(violations) = form.validate() {
            return Err(flatten_errors(&violations, FIELD_ORDER));
        }

        let mut errors = Vec::new();
        let tax_id = match form.tax_id.as_deref().map(Rut::new) {
            Some(Ok(rut)) => Some(rut),
            Some(Err(e)) => {
                errors.push(FieldError::from_constraint("tax_id", &e));
                None
            }
            None => None,
        };
        let legal_name = match form.legal_name.as_deref().map(NonEmptyString::new) {
            Some(Ok(name)) => Some(name),
            Some(Err(e)) => {
                errors.push(FieldError::from_constraint("legal_name", &e));
                None
            }
            None => None,
        };
        let email = match patch(&self.email) {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => match ClientEmail::new(raw) {
                Ok(email) => Some(Some(email)),
                Err(e) => {
                    errors.push(FieldError::from_constraint("email", &e));
                    None
                }
            },
        };
        let phone = match patch(&self.phone) {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => match PhoneNumber::new(raw) {
                Ok(phone) => Some(Some(phone)),
                Err(e) => {
                    errors.push(FieldError::from_constraint("phone", &e));
                    None
                }
            },
        };
        let website = match patch(&self.website) {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => match WebsiteUrl::new(raw) {
                Ok(url) => Some(Some(url)),
                Err(e) => {
                    errors.push(FieldError::from_constraint("website", &e));
                    None
                }
            },
        };
        let legal_rep_tax_id = match patch(&self.legal_rep_tax_id) {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => match Rut::new(raw) {
                Ok(rut) => Some(Some(rut)),
                Err(e) => {
                    errors.push(FieldError::from_constraint("legal_rep_tax_id", &e));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(UpdateClient {
            tax_id,
            legal_name,
            trade_name: patch(&self.trade_name),
            email,
            phone,
            website,
            address: patch(&self.address),
            city: patch(&self.city),
            state: patch(&self.state),
            postal_code: patch(&self.postal_code),
            business_activity: patch(&self.business_activity),
            activity_code: patch(&self.activity_code),
            business_start_date: patch(&self.business_start_date)
                .map(|v| v.as_deref().and_then(parse_date)),
            business_end_date: patch(&self.business_end_date)
                .map(|v| v.as_deref().and_then(parse_date)),
            legal_representative: patch(&self.legal_representative),
            legal_rep_tax_id,
            client_type: form.client_type.as_deref().and_then(ClientType::parse),
            is_vat_contributor: form.is_vat_contributor,
            notes: patch(&self.notes).map(|v| v.map(|n| ammonia::clean(&n))),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// One already-parsed row of a bulk client import.
///
/// Identification fields are mandatory; contact fields are best effort and
/// silently dropped when they fail their grammar, matching how bulk imports
/// tolerate messy source files.
pub struct ClientImportForm {
    pub tax_id: String,
    pub legal_name: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub business_activity: Option<String>,
    #[serde(default)]
    pub legal_representative: Option<String>,
}

impl ClientImportForm {
    /// Produces a creation payload, keeping only contact values that pass
    /// their grammar.
    pub fn parse(&self) -> Result<NewClient, Vec<FieldError>> {
        let mut errors = Vec::new();
        let tax_id = Rut::new(self.tax_id.trim())
            .map_err(|e| errors.push(FieldError::from_constraint("tax_id", &e)))
            .ok();
        let legal_name = NonEmptyString::new(self.legal_name.as_str())
            .map_err(|e| errors.push(FieldError::from_constraint("legal_name", &e)))
            .ok();

        match (tax_id, legal_name) {
            (Some(tax_id), Some(legal_name)) => {
                let mut new = NewClient::bare(tax_id, legal_name);
                new.trade_name = optional(&self.trade_name);
                new.email = optional(&self.email).and_then(|e| ClientEmail::new(e).ok());
                new.phone = optional(&self.phone).and_then(|p| PhoneNumber::new(p).ok());
                new.address = optional(&self.address);
                new.city = optional(&self.city);
                new.business_activity = optional(&self.business_activity);
                new.legal_representative = optional(&self.legal_representative);
                Ok(new)
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ClientForm {
        ClientForm {
            tax_id: "12.345.678-5".to_string(),
            legal_name: "Comercial Andes SpA".to_string(),
            email: Some("Contacto@Andes.CL".to_string()),
            phone: Some("+56 2 2345 6789".to_string()),
            website: Some("https://andes.cl".to_string()),
            city: Some("Santiago".to_string()),
            business_start_date: Some("2019-04-01".to_string()),
            ..ClientForm::default()
        }
    }

    #[test]
    fn parse_accepts_a_complete_valid_form() {
        let new = valid_form().parse().unwrap();
        assert_eq!(new.tax_id.as_str(), "12.345.678-5");
        assert_eq!(new.email.as_ref().unwrap().as_str(), "contacto@andes.cl");
        assert_eq!(new.phone.as_ref().unwrap().as_str(), "+56223456789");
        assert_eq!(
            new.business_start_date,
            NaiveDate::from_ymd_opt(2019, 4, 1)
        );
        assert_eq!(new.client_type, ClientType::Company);
        assert!(new.is_vat_contributor);
        assert_eq!(new.country, "CL");
    }

    #[test]
    fn parse_collects_every_violation_at_once() {
        let form = ClientForm {
            tax_id: "12.345.678-5".to_string(),
            legal_name: String::new(),
            email: Some("not-an-email".to_string()),
            website: Some("not a url".to_string()),
            ..ClientForm::default()
        };
        let errors = form.parse().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"legal_name"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"website"));
        // Declaration order keeps the list deterministic.
        assert_eq!(fields, vec!["legal_name", "email", "website"]);
    }

    #[test]
    fn checksum_and_format_failures_are_distinct_codes() {
        let mut form = valid_form();
        form.tax_id = "12.345.678-4".to_string();
        let errors = form.parse().unwrap_err();
        assert_eq!(errors[0].code, "tax_id_checksum");

        form.tax_id = "abc".to_string();
        let errors = form.parse().unwrap_err();
        assert_eq!(errors[0].code, "tax_id_format");
    }

    #[test]
    fn empty_optional_fields_normalize_to_none() {
        let mut form = valid_form();
        form.trade_name = Some("   ".to_string());
        form.email = Some(String::new());
        form.phone = None;
        let new = form.parse().unwrap();
        assert_eq!(new.trade_name, None);
        assert!(new.email.is_none());
        assert!(new.phone.is_none());
    }

    #[test]
    fn defaults_are_applied_only_on_create() {
        let new = valid_form().parse().unwrap();
        assert_eq!(new.client_type, ClientType::Company);
        assert!(new.is_vat_contributor);

        let update = UpdateClientForm {
            city: Some("Temuco".to_string()),
            ..UpdateClientForm::default()
        }
        .parse()
        .unwrap();
        assert_eq!(update.client_type, None);
        assert_eq!(update.is_vat_contributor, None);
    }

    #[test]
    fn update_distinguishes_absent_from_cleared() {
        let update = UpdateClientForm {
            trade_name: Some(String::new()),
            city: Some("Temuco".to_string()),
            ..UpdateClientForm::default()
        }
        .parse()
        .unwrap();
        assert_eq!(update.trade_name, Some(None));
        assert_eq!(update.city, Some(Some("Temuco".to_string())));
        assert_eq!(update.address, None);
    }

    #[test]
    fn update_validates_supplied_tax_id() {
        let errors = UpdateClientForm {
            tax_id: Some("11.111.111-2".to_string()),
            ..UpdateClientForm::default()
        }
        .parse()
        .unwrap_err();
        assert_eq!(errors[0].code, "tax_id_checksum");
    }

    #[test]
    fn import_requires_identification_but_tolerates_bad_contacts() {
        let row = ClientImportForm {
            tax_id: "1.000.053-K".to_string(),
            legal_name: "Importadora Austral".to_string(),
            email: Some("broken@@example".to_string()),
            phone: Some("??".to_string()),
            city: Some("Punta Arenas".to_string()),
            ..ClientImportForm::default()
        };
        let new = row.parse().unwrap();
        assert_eq!(new.email, None);
        assert_eq!(new.phone, None);
        assert_eq!(new.city.as_deref(), Some("Punta Arenas"));

        let bad = ClientImportForm {
            tax_id: "nope".to_string(),
            legal_name: String::new(),
            ..ClientImportForm::default()
        };
        let errors = bad.parse().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn notes_are_sanitized() {
        let mut form = valid_form();
        form.notes = Some("<script>alert(1)</script>factura pendiente".to_string());
        let new = form.parse().unwrap();
        assert_eq!(new.notes.as_deref(), Some("factura pendiente"));
    }
}

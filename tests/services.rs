use tributa_crm::domain::client::{NewClient, UpdateClient};
use tributa_crm::domain::types::NonEmptyString;
use tributa_crm::forms::client::ClientImportForm;
use tributa_crm::repository::mock::InMemoryClientRepository;
use tributa_crm::services::client::{
    create_client, delete_client, get_client_by_id, search_clients, update_client,
};
use tributa_crm::services::ServiceError;

mod common;

use common::rut_for;

fn new_client(body: u32, legal_name: &str) -> NewClient {
    NewClient::bare(rut_for(body), NonEmptyString::new(legal_name).unwrap())
}

#[test]
fn create_rejects_duplicate_until_the_holder_is_deleted() {
    let repo = InMemoryClientRepository::new();

    let first = create_client(&repo, &new_client(1000001, "Primera SpA")).unwrap();

    let err = create_client(&repo, &new_client(1000001, "Segunda SpA")).unwrap_err();
    assert!(matches!(err, ServiceError::UniquenessConflict(ref rut) if rut == first.tax_id.as_str()));

    delete_client(&repo, first.id).unwrap();
    let reused = create_client(&repo, &new_client(1000001, "Segunda SpA")).unwrap();
    assert_eq!(reused.tax_id, first.tax_id);
    assert_ne!(reused.id, first.id);
}

#[test]
fn update_keeps_own_tax_id_but_cannot_take_anothers() {
    let repo = InMemoryClientRepository::new();
    let alpha = create_client(&repo, &new_client(1000001, "Alfa SpA")).unwrap();
    let beta = create_client(&repo, &new_client(1000002, "Beta SpA")).unwrap();

    // Re-submitting its own identifier is not a conflict.
    let same = UpdateClient {
        tax_id: Some(rut_for(1000001)),
        ..UpdateClient::default()
    };
    let updated = update_client(&repo, alpha.id, &same).unwrap();
    assert_eq!(updated.tax_id, alpha.tax_id);

    // Taking a tax id held by another active record is.
    let taken = UpdateClient {
        tax_id: Some(rut_for(1000002)),
        ..UpdateClient::default()
    };
    let err = update_client(&repo, alpha.id, &taken).unwrap_err();
    assert!(matches!(err, ServiceError::UniquenessConflict(ref rut) if rut == beta.tax_id.as_str()));
}

#[test]
fn quick_search_is_alphabetical_and_bounded() {
    let repo = InMemoryClientRepository::new();
    create_client(&repo, &new_client(1000001, "Zeta Comercial SpA")).unwrap();
    create_client(&repo, &new_client(1000002, "Andes Comercial SpA")).unwrap();
    create_client(&repo, &new_client(1000003, "Lemu Comercial SpA")).unwrap();
    create_client(&repo, &new_client(1000004, "Servicios del Sur")).unwrap();

    let hits = search_clients(&repo, "comercial", 2).unwrap();
    let names: Vec<&str> = hits.iter().map(|c| c.legal_name.as_str()).collect();
    assert_eq!(names, vec!["Andes Comercial SpA", "Lemu Comercial SpA"]);
}

#[test]
fn missing_records_surface_as_not_found() {
    let repo = InMemoryClientRepository::new();

    assert!(get_client_by_id(&repo, 42).unwrap().is_none());

    let err = update_client(&repo, 42, &UpdateClient::default()).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    // Deleting an unknown record stays idempotent.
    delete_client(&repo, 42).unwrap();
}

#[test]
fn import_rows_feed_straight_into_create() {
    let repo = InMemoryClientRepository::new();

    let row = ClientImportForm {
        tax_id: "1.000.053-k".to_string(),
        legal_name: "  Importadora Austral  ".to_string(),
        email: Some("contacto@austral.cl".to_string()),
        phone: Some("no es un teléfono".to_string()),
        city: Some("Punta Arenas".to_string()),
        ..ClientImportForm::default()
    };

    let created = create_client(&repo, &row.parse().unwrap()).unwrap();
    assert_eq!(created.tax_id, "1.000.053-K");
    assert_eq!(created.legal_name, "Importadora Austral");
    assert_eq!(created.email.as_deref(), Some("contacto@austral.cl"));
    assert_eq!(created.phone, None);
    assert_eq!(created.city.as_deref(), Some("Punta Arenas"));
}

use tributa_crm::domain::client::{ClientType, NewClient, UpdateClient};
use tributa_crm::domain::types::NonEmptyString;
use tributa_crm::repository::client::DieselClientRepository;
use tributa_crm::repository::errors::RepositoryError;
use tributa_crm::repository::{ClientListQuery, ClientReader, ClientWriter};
use tributa_crm::services::client::{client_stats, export_csv};

mod common;

use common::rut_for;

fn new_client(body: u32, legal_name: &str) -> NewClient {
    NewClient::bare(rut_for(body), NonEmptyString::new(legal_name).unwrap())
}

#[test]
fn test_client_repository_crud() {
    let test_db = common::TestDb::new("test_client_repository_crud.db");
    let repo = DieselClientRepository::new(test_db.pool());

    let mut payload = new_client(1000001, "Comercial Andes SpA");
    payload.city = Some("Santiago".to_string());
    let created = repo.create(&payload).unwrap();

    assert_eq!(created.tax_id, payload.tax_id.as_str());
    assert_eq!(created.legal_name, "Comercial Andes SpA");
    assert_eq!(created.client_type, ClientType::Company);
    assert!(created.is_vat_contributor);
    assert_eq!(created.country, "CL");
    assert!(created.is_active);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo.get_by_id(created.id).unwrap().unwrap();
    assert_eq!(fetched, created);

    let updates = UpdateClient {
        legal_name: Some(NonEmptyString::new("Comercial Andes Limitada").unwrap()),
        city: Some(None),
        ..UpdateClient::default()
    };
    let updated = repo.update(created.id, &updates).unwrap();
    assert_eq!(updated.legal_name, "Comercial Andes Limitada");
    assert_eq!(updated.city, None);
    assert!(updated.updated_at >= created.created_at);
    assert_eq!(updated.created_at, created.created_at);

    repo.soft_delete(created.id).unwrap();
    let (total, items) = repo.list(&ClientListQuery::new()).unwrap();
    assert_eq!(total, 0);
    assert!(items.is_empty());

    // The row is retained for history, only hidden from listings.
    let retained = repo.get_by_id(created.id).unwrap().unwrap();
    assert!(!retained.is_active);

    // Deleting again is a no-op.
    repo.soft_delete(created.id).unwrap();
}

#[test]
fn test_update_unknown_id_is_not_found() {
    let test_db = common::TestDb::new("test_update_unknown_id.db");
    let repo = DieselClientRepository::new(test_db.pool());

    let err = repo.update(9999, &UpdateClient::default()).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[test]
fn test_tax_id_unique_among_active_records() {
    let test_db = common::TestDb::new("test_tax_id_unique.db");
    let repo = DieselClientRepository::new(test_db.pool());

    let first = repo.create(&new_client(1000001, "Primera SpA")).unwrap();

    let err = repo
        .create(&new_client(1000001, "Segunda SpA"))
        .unwrap_err();
    assert!(err.is_unique_violation());

    let rut = rut_for(1000001);
    assert!(repo.exists_by_tax_id(&rut, None).unwrap());
    // A record keeps its own identifier on update.
    assert!(!repo.exists_by_tax_id(&rut, Some(first.id)).unwrap());

    // Soft deletion releases the identifier for reuse.
    repo.soft_delete(first.id).unwrap();
    assert!(!repo.exists_by_tax_id(&rut, None).unwrap());
    let reused = repo.create(&new_client(1000001, "Segunda SpA")).unwrap();
    assert_ne!(reused.id, first.id);
    assert_eq!(reused.tax_id, rut.as_str());
}

#[test]
fn test_list_paginates_newest_first() {
    let test_db = common::TestDb::new("test_list_paginates.db");
    let repo = DieselClientRepository::new(test_db.pool());

    for i in 0..15 {
        repo.create(&new_client(1000001 + i, &format!("Cliente {i}")))
            .unwrap();
    }

    let (total, first_page) = repo
        .list(&ClientListQuery::new().paginate(1, 10))
        .unwrap();
    assert_eq!(total, 15);
    assert_eq!(first_page.len(), 10);
    assert_eq!(first_page[0].legal_name, "Cliente 14");

    let (total, second_page) = repo
        .list(&ClientListQuery::new().paginate(2, 10))
        .unwrap();
    assert_eq!(total, 15);
    assert_eq!(second_page.len(), 5);
    assert_eq!(second_page[4].legal_name, "Cliente 0");

    // Newest first throughout, insertion order breaking timestamp ties.
    let ids: Vec<i32> = first_page
        .iter()
        .chain(second_page.iter())
        .map(|c| c.id)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);

    let (_, past_the_end) = repo
        .list(&ClientListQuery::new().paginate(3, 10))
        .unwrap();
    assert!(past_the_end.is_empty());
}

#[test]
fn test_list_filters_compose() {
    let test_db = common::TestDb::new("test_list_filters.db");
    let repo = DieselClientRepository::new(test_db.pool());

    let mut andes = new_client(1000001, "Comercial Andes SpA");
    andes.city = Some("Santiago".to_string());
    andes.business_activity = Some("Comercio".to_string());
    andes.email = None;
    repo.create(&andes).unwrap();

    let mut austral = new_client(1000002, "Importadora Austral");
    austral.city = Some("Punta Arenas".to_string());
    austral.business_activity = Some("Comercio".to_string());
    repo.create(&austral).unwrap();

    let mut lemu = new_client(1000003, "Servicios Lemu");
    lemu.city = Some("Santiago".to_string());
    lemu.business_activity = Some("Servicios".to_string());
    repo.create(&lemu).unwrap();

    // Case-insensitive substring search over the legal name.
    let (total, items) = repo
        .list(&ClientListQuery::new().search("austral"))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].legal_name, "Importadora Austral");

    // Search also matches the canonical tax identifier.
    let (total, items) = repo
        .list(&ClientListQuery::new().search("1.000.002"))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].legal_name, "Importadora Austral");

    let (total, _) = repo
        .list(&ClientListQuery::new().city("Santiago"))
        .unwrap();
    assert_eq!(total, 2);

    // Filters AND together.
    let (total, items) = repo
        .list(
            &ClientListQuery::new()
                .city("Santiago")
                .activity("Comercio"),
        )
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].legal_name, "Comercial Andes SpA");

    let (total, _) = repo.list(&ClientListQuery::new().city("Temuco")).unwrap();
    assert_eq!(total, 0);
}

#[test]
fn test_export_csv_is_bom_prefixed_and_quoted() {
    let test_db = common::TestDb::new("test_export_csv.db");
    let repo = DieselClientRepository::new(test_db.pool());

    let mut payload = new_client(1000001, "Andes, Cordillera y Cia. Ltda.");
    payload.city = Some("Santiago".to_string());
    repo.create(&payload).unwrap();

    let csv = export_csv(&repo).unwrap();
    assert!(csv.starts_with('\u{feff}'));

    let mut lines = csv.trim_start_matches('\u{feff}').lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("RUT,Razón Social,"));

    // The comma-bearing legal name must be quoted.
    let row = lines.next().unwrap();
    assert!(row.contains("\"Andes, Cordillera y Cia. Ltda.\""));
    assert!(row.starts_with(rut_for(1000001).as_str()));
    assert!(lines.next().is_none());
}

#[test]
fn test_client_stats_cover_active_records_only() {
    let test_db = common::TestDb::new("test_client_stats.db");
    let repo = DieselClientRepository::new(test_db.pool());

    let mut with_contacts = new_client(1000001, "Con Contacto SpA");
    with_contacts.email =
        Some(tributa_crm::domain::types::ClientEmail::new("a@b.cl").unwrap());
    with_contacts.city = Some("Santiago".to_string());
    with_contacts.business_activity = Some("Comercio".to_string());
    repo.create(&with_contacts).unwrap();

    let mut bare = new_client(1000002, "Sin Contacto SpA");
    bare.city = Some("Valparaíso".to_string());
    repo.create(&bare).unwrap();

    let deleted = repo.create(&new_client(1000003, "Borrada SpA")).unwrap();
    repo.soft_delete(deleted.id).unwrap();

    let stats = client_stats(&repo).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.with_email, 1);
    assert_eq!(stats.with_phone, 0);
    assert_eq!(stats.cities, vec!["Santiago", "Valparaíso"]);
    assert_eq!(stats.activities, vec!["Comercio"]);
}

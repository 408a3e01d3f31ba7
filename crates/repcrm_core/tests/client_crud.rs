use repcrm_core::db::open_db_in_memory;
use repcrm_core::model::client::ClientValidationError;
use repcrm_core::{
    Client, ClientDraft, ClientFilter, ClientRepository, ClientService, ClientStatus, ClientType,
    Money, PropertyType, ServiceError, SqliteClientRepository, StatusPredicate,
};
use rusqlite::Connection;
use uuid::Uuid;

fn buyer(name: &str, phone: &str) -> ClientDraft {
    ClientDraft {
        name: name.to_string(),
        phone: phone.to_string(),
        kind: Some(ClientType::Comprador),
        max_purchase_value: Some(Money::from_reais(250_000)),
        ..ClientDraft::default()
    }
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn preferences_roundtrip_in_selection_order() {
    let conn = open_db_in_memory().unwrap();
    let service = ClientService::new(SqliteClientRepository::try_new(&conn).unwrap());

    let mut input = buyer("Maria Silva", "(41) 99999-0000");
    input.toggle_property_type(PropertyType::Sobrado);
    input.toggle_property_type(PropertyType::Apartamento);
    input.toggle_region("Xaxim");
    input.add_region("Boqueirão").unwrap();
    input.has_property_for_transfer = true;

    let created = service.create_client(Some(Uuid::new_v4()), &input).unwrap();
    let loaded = service.get_client(created.id).unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(
        loaded.desired_property_types,
        vec![PropertyType::Sobrado, PropertyType::Apartamento]
    );
    assert_eq!(loaded.regions_of_interest, vec!["Xaxim", "Boqueirão"]);
    assert!(loaded.has_property_for_transfer);
    assert_eq!(loaded.status, ClientStatus::Ativo);
    assert_eq!(
        loaded.whatsapp_link().as_deref(),
        Some("https://wa.me/5541999990000")
    );
}

#[test]
fn missing_required_fields_block_the_write() {
    let conn = open_db_in_memory().unwrap();
    let service = ClientService::new(SqliteClientRepository::try_new(&conn).unwrap());
    let owner = Some(Uuid::new_v4());

    let mut no_type = buyer("Ana", "4199");
    no_type.kind = None;

    let cases = [
        (buyer("", "4199"), ClientValidationError::BlankName),
        (buyer("Ana", " "), ClientValidationError::BlankPhone),
        (no_type, ClientValidationError::MissingType),
    ];
    for (input, expected) in cases {
        match service.create_client(owner, &input) {
            Err(ServiceError::InvalidClient(actual)) => assert_eq!(actual, expected),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    let err = service.create_client(None, &buyer("Ana", "4199")).unwrap_err();
    assert!(matches!(err, ServiceError::MissingOwner));
    assert_eq!(count_rows(&conn, "clients"), 0);
}

#[test]
fn update_replaces_preference_sets() {
    let conn = open_db_in_memory().unwrap();
    let service = ClientService::new(SqliteClientRepository::try_new(&conn).unwrap());

    let mut input = buyer("João", "41 3333-2222");
    input.toggle_property_type(PropertyType::Casa);
    input.toggle_region("CIC");
    input.toggle_region("Pinhais");
    let created = service.create_client(Some(Uuid::new_v4()), &input).unwrap();

    let mut edit = ClientDraft::from_client(&created);
    edit.toggle_property_type(PropertyType::Casa);
    edit.toggle_property_type(PropertyType::Garden);
    edit.remove_region("CIC");
    edit.status = ClientStatus::Negociacao;
    edit.kind = Some(ClientType::Vendedor);

    let updated = service.update_client(created.id, &edit).unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.kind, ClientType::Vendedor);
    assert_eq!(updated.status, ClientStatus::Negociacao);
    assert_eq!(updated.desired_property_types, vec![PropertyType::Garden]);
    assert_eq!(updated.regions_of_interest, vec!["Pinhais"]);
    assert_eq!(count_rows(&conn, "client_regions"), 1);
    assert_eq!(count_rows(&conn, "client_property_types"), 1);
}

#[test]
fn delete_cascades_to_preferences() {
    let conn = open_db_in_memory().unwrap();
    let service = ClientService::new(SqliteClientRepository::try_new(&conn).unwrap());
    let mut input = buyer("Paula", "4198");
    input.toggle_region("Centro");
    input.toggle_property_type(PropertyType::Sitio);
    let created = service.create_client(Some(Uuid::new_v4()), &input).unwrap();

    service.delete_client(created.id).unwrap();

    assert!(service.get_client(created.id).unwrap().is_none());
    assert_eq!(count_rows(&conn, "client_regions"), 0);
    assert_eq!(count_rows(&conn, "client_property_types"), 0);
    assert!(matches!(
        service.delete_client(created.id),
        Err(ServiceError::NotFound(..))
    ));
}

#[test]
fn list_filters_by_search_status_and_type() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();

    let mut seller_draft = buyer("Érica Lima", "(41) 91111-2222");
    seller_draft.kind = Some(ClientType::Vendedor);
    seller_draft.status = ClientStatus::Fechado;
    let seller = Client::from_draft(Uuid::new_v4(), owner, &seller_draft, 1_000).unwrap();
    let buyer_client =
        Client::from_draft(Uuid::new_v4(), owner, &buyer("Bruno Costa", "41 3000-0000"), 2_000)
            .unwrap();
    repo.create_client(&seller).unwrap();
    repo.create_client(&buyer_client).unwrap();

    let service = ClientService::new(repo);
    let all = service.list_clients(&ClientFilter::default()).unwrap();
    assert_eq!(
        all.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![buyer_client.id, seller.id]
    );

    let by_name = service
        .list_clients(&ClientFilter {
            search: "érica".to_string(),
            ..ClientFilter::default()
        })
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, seller.id);

    let by_phone = service
        .list_clients(&ClientFilter {
            search: "3000".to_string(),
            ..ClientFilter::default()
        })
        .unwrap();
    assert_eq!(by_phone.len(), 1);
    assert_eq!(by_phone[0].id, buyer_client.id);

    let by_status_and_type = service
        .list_clients(&ClientFilter {
            status: Some(ClientStatus::Fechado),
            kind: Some(ClientType::Vendedor),
            ..ClientFilter::default()
        })
        .unwrap();
    assert_eq!(by_status_and_type.len(), 1);
}

#[test]
fn count_excludes_closed_clients_when_asked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();

    for (i, status) in [ClientStatus::Ativo, ClientStatus::Negociacao, ClientStatus::Fechado]
        .into_iter()
        .enumerate()
    {
        let mut input = buyer(&format!("Cliente {i}"), "4199");
        input.status = status;
        let client = Client::from_draft(Uuid::new_v4(), owner, &input, i as i64).unwrap();
        repo.create_client(&client).unwrap();
    }

    assert_eq!(repo.count_clients(StatusPredicate::Any).unwrap(), 3);
    assert_eq!(
        repo.count_clients(StatusPredicate::IsNot(ClientStatus::Fechado))
            .unwrap(),
        2
    );
}

#[test]
fn client_json_uses_wire_names() {
    let mut input = buyer("Ana", "4199");
    input.kind = Some(ClientType::CompradorVendedor);
    input.toggle_property_type(PropertyType::Garden);
    let client = Client::from_draft(Uuid::new_v4(), Uuid::new_v4(), &input, 1).unwrap();

    let value = serde_json::to_value(&client).unwrap();
    assert_eq!(value["type"], "comprador_vendedor");
    assert_eq!(value["status"], "ativo");
    assert_eq!(value["desired_property_types"][0], "garden");
    assert_eq!(value["max_purchase_value"], 25_000_000);
}

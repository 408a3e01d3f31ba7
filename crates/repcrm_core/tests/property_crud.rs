use repcrm_core::db::open_db_in_memory;
use repcrm_core::model::property::PropertyValidationError;
use repcrm_core::{
    Entity, Money, Property, PropertyDraft, PropertyFilter, PropertyMedia, PropertyRepository,
    PropertyService, PropertyStatus, PropertyType, RepoError, ServiceError,
    SqlitePropertyRepository, StatusPredicate,
};
use rusqlite::Connection;
use uuid::Uuid;

fn draft(street: &str) -> PropertyDraft {
    PropertyDraft {
        kind: Some(PropertyType::Apartamento),
        street: street.to_string(),
        neighborhood: Some("Portão".to_string()),
        region: "Portão".to_string(),
        transfer_value: Money::from_reais(160_000),
        monthly_payment: Some(Money::from_cents(123_456)),
        owner_name: Some("Carlos Pereira".to_string()),
        owner_phone: Some("(41) 98765-4321".to_string()),
        ..PropertyDraft::default()
    }
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());
    let owner = Uuid::new_v4();

    let created = service
        .create_property(Some(owner), &draft("Rua XV de Novembro, 100"))
        .unwrap();

    let loaded = service.get_property(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.user_id, owner);
    assert_eq!(loaded.city, "Curitiba");
    assert_eq!(loaded.state, "PR");
    assert_eq!(loaded.status, PropertyStatus::Disponivel);
    assert_eq!(loaded.monthly_payment, Some(Money::from_cents(123_456)));
    assert_eq!(loaded.outstanding_balance, None);
}

#[test]
fn create_without_owner_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());

    let err = service.create_property(None, &draft("Rua A")).unwrap_err();
    assert!(matches!(err, ServiceError::MissingOwner));
    assert_eq!(err.to_string(), "user not authenticated");
    assert_eq!(count_rows(&conn, "properties"), 0);
}

#[test]
fn missing_required_fields_block_the_write() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());
    let owner = Some(Uuid::new_v4());

    let mut no_type = draft("Rua A");
    no_type.kind = None;
    let mut no_street = draft("   ");
    no_street.kind = Some(PropertyType::Casa);
    let mut no_region = draft("Rua A");
    no_region.region.clear();
    let mut no_value = draft("Rua A");
    no_value.transfer_value = Money::ZERO;

    let cases = [
        (no_type, PropertyValidationError::MissingType),
        (no_street, PropertyValidationError::BlankStreet),
        (no_region, PropertyValidationError::BlankRegion),
        (no_value, PropertyValidationError::NonPositiveTransferValue),
    ];
    for (input, expected) in cases {
        match service.create_property(owner, &input) {
            Err(ServiceError::InvalidProperty(actual)) => assert_eq!(actual, expected),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    assert_eq!(count_rows(&conn, "properties"), 0);
}

#[test]
fn update_replaces_fields_and_keeps_identity() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::with_clock(
        SqlitePropertyRepository::try_new(&conn).unwrap(),
        || 1_000,
    );
    let created = service
        .create_property(Some(Uuid::new_v4()), &draft("Rua A"))
        .unwrap();

    let mut edit = PropertyDraft::from_property(&created);
    edit.street = "Rua B".to_string();
    edit.status = PropertyStatus::Negociacao;
    edit.monthly_payment = None;
    edit.notes = Some("  ".to_string());

    let updated = service.update_property(created.id, &edit).unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.user_id, created.user_id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.street, "Rua B");
    assert_eq!(updated.status, PropertyStatus::Negociacao);
    assert_eq!(updated.monthly_payment, None);
    assert_eq!(updated.notes, None);
}

#[test]
fn update_and_delete_missing_property_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());
    let missing = Uuid::new_v4();

    let err = service.update_property(missing, &draft("Rua A")).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(Entity::Property, id) if id == missing));

    let err = service.delete_property(missing).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(Entity::Property, _)));
}

#[test]
fn media_order_and_cover_survive_persistence() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());

    let mut media = PropertyMedia::default();
    media.add_photos(["https://cdn/a.jpg", "https://cdn/b.jpg", "https://cdn/c.jpg"]);
    media.add_videos(["https://cdn/tour.mp4"]);
    assert!(media.set_cover(2));
    let mut input = draft("Rua A");
    input.set_media(media);

    let created = service.create_property(Some(Uuid::new_v4()), &input).unwrap();
    assert_eq!(
        created.media.photos,
        vec!["https://cdn/c.jpg", "https://cdn/a.jpg", "https://cdn/b.jpg"]
    );
    assert_eq!(created.media.videos, vec!["https://cdn/tour.mp4"]);
    assert_eq!(created.media.cover().unwrap().url, "https://cdn/c.jpg");

    let mut edit = PropertyDraft::from_property(&created);
    edit.photos = Some(Vec::new());
    let updated = service.update_property(created.id, &edit).unwrap();
    assert!(updated.media.photos.is_empty());
    assert_eq!(updated.media.cover().unwrap().url, "https://cdn/tour.mp4");
    assert_eq!(count_rows(&conn, "property_media"), 1);
}

#[test]
fn edit_without_media_lists_keeps_stored_media() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());

    let mut input = draft("Rua A");
    input.photos = Some(vec!["https://cdn/a.jpg".to_string()]);
    input.videos = Some(vec!["https://cdn/v.mp4".to_string()]);
    let created = service.create_property(Some(Uuid::new_v4()), &input).unwrap();

    // Edit dialog payload: form fields plus photos, no `videos` key.
    let edit: PropertyDraft = serde_json::from_value(serde_json::json!({
        "type": "apartamento",
        "street": "Rua A, 12",
        "region": "Portão",
        "transfer_value": 17_000_000,
        "status": "negociacao",
        "photos": ["https://cdn/b.jpg", "https://cdn/a.jpg"],
    }))
    .unwrap();
    assert_eq!(edit.videos, None);

    let updated = service.update_property(created.id, &edit).unwrap();
    assert_eq!(updated.street, "Rua A, 12");
    assert_eq!(updated.media.videos, vec!["https://cdn/v.mp4"]);
    assert_eq!(
        updated.media.photos,
        vec!["https://cdn/b.jpg", "https://cdn/a.jpg"]
    );

    let fields_only: PropertyDraft = serde_json::from_value(serde_json::json!({
        "type": "apartamento",
        "street": "Rua A, 12",
        "region": "Portão",
        "transfer_value": 17_000_000,
    }))
    .unwrap();
    let reloaded = service.update_property(created.id, &fields_only).unwrap();
    assert_eq!(reloaded.media, updated.media);
    assert_eq!(count_rows(&conn, "property_media"), 3);
}

#[test]
fn delete_cascades_to_media() {
    let conn = open_db_in_memory().unwrap();
    let service = PropertyService::new(SqlitePropertyRepository::try_new(&conn).unwrap());
    let mut input = draft("Rua A");
    input.photos = Some(vec!["https://cdn/a.jpg".to_string()]);
    let created = service.create_property(Some(Uuid::new_v4()), &input).unwrap();

    service.delete_property(created.id).unwrap();

    assert!(service.get_property(created.id).unwrap().is_none());
    assert_eq!(count_rows(&conn, "property_media"), 0);
}

#[test]
fn list_is_newest_first_and_filters_apply() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePropertyRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();

    let mut older_draft = draft("Avenida Sete de Setembro");
    older_draft.region = "Batel".to_string();
    older_draft.neighborhood = Some("Batel".to_string());
    let older = Property::from_draft(Uuid::new_v4(), owner, &older_draft, 1_000).unwrap();

    let mut newer_draft = draft("Rua das Flores");
    newer_draft.status = PropertyStatus::Vendido;
    let newer = Property::from_draft(Uuid::new_v4(), owner, &newer_draft, 2_000).unwrap();

    repo.create_property(&older).unwrap();
    repo.create_property(&newer).unwrap();

    let service = PropertyService::new(repo);
    let all = service.list_properties(&PropertyFilter::default()).unwrap();
    assert_eq!(
        all.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );

    let by_search = service
        .list_properties(&PropertyFilter {
            search: "sete DE".to_string(),
            ..PropertyFilter::default()
        })
        .unwrap();
    assert_eq!(by_search.len(), 1);
    assert_eq!(by_search[0].id, older.id);

    let by_owner = service
        .list_properties(&PropertyFilter {
            search: "carlos".to_string(),
            ..PropertyFilter::default()
        })
        .unwrap();
    assert_eq!(by_owner.len(), 2);

    let by_status = service
        .list_properties(&PropertyFilter {
            status: Some(PropertyStatus::Vendido),
            ..PropertyFilter::default()
        })
        .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].id, newer.id);

    let by_region = service
        .list_properties(&PropertyFilter {
            region: Some("Batel".to_string()),
            ..PropertyFilter::default()
        })
        .unwrap();
    assert_eq!(by_region.len(), 1);
    assert_eq!(by_region[0].id, older.id);
}

#[test]
fn count_respects_status_predicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePropertyRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();

    for (i, status) in [
        PropertyStatus::Disponivel,
        PropertyStatus::Negociacao,
        PropertyStatus::Vendido,
        PropertyStatus::Vendido,
    ]
    .into_iter()
    .enumerate()
    {
        let mut input = draft(&format!("Rua {i}"));
        input.status = status;
        let property = Property::from_draft(Uuid::new_v4(), owner, &input, i as i64).unwrap();
        repo.create_property(&property).unwrap();
    }

    assert_eq!(repo.count_properties(StatusPredicate::Any).unwrap(), 4);
    assert_eq!(
        repo.count_properties(StatusPredicate::IsNot(PropertyStatus::Vendido))
            .unwrap(),
        2
    );
    assert_eq!(
        repo.count_properties(StatusPredicate::Is(PropertyStatus::Negociacao))
            .unwrap(),
        1
    );
}

#[test]
fn invalid_persisted_rows_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePropertyRepository::try_new(&conn).unwrap();
    let property = Property::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft("Rua A"), 1).unwrap();
    repo.create_property(&property).unwrap();

    conn.execute(
        "UPDATE properties SET street = '  ' WHERE id = ?1;",
        [property.id.to_string()],
    )
    .unwrap();

    let err = repo.get_property(property.id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidProperty(PropertyValidationError::BlankStreet)
    ));
}

#[test]
fn property_json_uses_wire_names() {
    let property = Property::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft("Rua A"), 1).unwrap();
    let value = serde_json::to_value(&property).unwrap();

    assert_eq!(value["type"], "apartamento");
    assert_eq!(value["status"], "disponivel");
    assert_eq!(value["transfer_value"], 16_000_000);
    assert!(value["photos"].as_array().unwrap().is_empty());
}

use repcrm_core::db::open_db_in_memory;
use repcrm_core::{
    Client, ClientDraft, ClientId, ClientRepository, ClientType, Entity, Match, MatchRepository,
    MatchService, MatchStatus, Money, Property, PropertyDraft, PropertyId, PropertyRepository,
    PropertyType, ServiceError, SqliteClientRepository, SqliteMatchRepository,
    SqlitePropertyRepository, StatusPredicate,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seed_property(conn: &Connection, street: &str) -> PropertyId {
    let draft = PropertyDraft {
        kind: Some(PropertyType::Casa),
        street: street.to_string(),
        region: "CIC".to_string(),
        transfer_value: Money::from_reais(90_000),
        ..PropertyDraft::default()
    };
    let property = Property::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft, 1).unwrap();
    SqlitePropertyRepository::try_new(conn)
        .unwrap()
        .create_property(&property)
        .unwrap()
}

fn seed_client(conn: &Connection, name: &str) -> ClientId {
    let draft = ClientDraft {
        name: name.to_string(),
        phone: "41 99999-0000".to_string(),
        kind: Some(ClientType::Comprador),
        ..ClientDraft::default()
    };
    let client = Client::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft, 1).unwrap();
    SqliteClientRepository::try_new(conn)
        .unwrap()
        .create_client(&client)
        .unwrap()
}

fn insert_match(
    repo: &SqliteMatchRepository<'_>,
    client: ClientId,
    property: PropertyId,
    score: u32,
    created_at: i64,
) -> Uuid {
    let record = Match::new(client, property, score, created_at).unwrap();
    repo.upsert_match(&record).unwrap()
}

#[test]
fn list_is_newest_first_with_details() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let house_a = seed_property(&conn, "Rua A");
    let house_b = seed_property(&conn, "Rua B");
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();

    let older = insert_match(&repo, client, house_a, 70, 1_000);
    let newer = insert_match(&repo, client, house_b, 95, 2_000);

    let listed = MatchService::new(repo).list_matches().unwrap();
    assert_eq!(
        listed.iter().map(|m| m.record.id).collect::<Vec<_>>(),
        vec![newer, older]
    );
    assert_eq!(listed[0].record.match_score, 95);
    assert_eq!(listed[0].client.as_ref().unwrap().name, "Maria");
    assert_eq!(listed[0].property.as_ref().unwrap().street, "Rua B");
    assert!(!listed[0].record.is_viewed);
}

#[test]
fn recording_same_pair_refreshes_score_only() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let property = seed_property(&conn, "Rua A");
    let service = MatchService::new(SqliteMatchRepository::try_new(&conn).unwrap());

    let first = service.record_match(client, property, 60).unwrap();
    service.start_negotiation(first).unwrap();
    let second = service.record_match(client, property, 88).unwrap();
    assert_eq!(first, second);

    let listed = service.list_matches().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].record.match_score, 88);
    assert_eq!(listed[0].record.status, MatchStatus::Negotiating);
    assert!(listed[0].record.is_viewed);
}

#[test]
fn out_of_range_scores_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let property = seed_property(&conn, "Rua A");
    let service = MatchService::new(SqliteMatchRepository::try_new(&conn).unwrap());

    let err = service.record_match(client, property, 101).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidScore(_)));
    assert!(service.list_matches().unwrap().is_empty());
}

#[test]
fn pending_and_recent_views() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();

    let mut ids = Vec::new();
    for i in 0..4 {
        let property = seed_property(&conn, &format!("Rua {i}"));
        ids.push(insert_match(&repo, client, property, 50 + i, 1_000 + i64::from(i)));
    }
    let service = MatchService::new(repo);
    service.start_negotiation(ids[3]).unwrap();

    let pending = service.pending_matches().unwrap();
    assert_eq!(
        pending.iter().map(|m| m.record.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1], ids[0]]
    );

    let recent = service.recent_matches(3).unwrap();
    assert_eq!(
        recent.iter().map(|m| m.record.id).collect::<Vec<_>>(),
        vec![ids[3], ids[2], ids[1]]
    );
}

#[test]
fn viewed_state_drives_unviewed_count() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();
    let a = insert_match(&repo, client, seed_property(&conn, "Rua A"), 80, 1);
    let b = insert_match(&repo, client, seed_property(&conn, "Rua B"), 81, 2);
    let _c = insert_match(&repo, client, seed_property(&conn, "Rua C"), 82, 3);
    let service = MatchService::new(repo);

    assert_eq!(service.unviewed_count().unwrap(), 3);
    service.mark_viewed(a).unwrap();
    assert_eq!(service.unviewed_count().unwrap(), 2);
    service.start_negotiation(b).unwrap();
    assert_eq!(service.unviewed_count().unwrap(), 1);
}

#[test]
fn discard_deletes_and_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();
    let id = insert_match(&repo, client, seed_property(&conn, "Rua A"), 80, 1);
    let service = MatchService::new(repo);

    service.discard(id).unwrap();
    assert!(service.list_matches().unwrap().is_empty());

    let err = service.discard(id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(Entity::Match, missing) if missing == id));
    assert!(matches!(
        service.mark_viewed(id),
        Err(ServiceError::NotFound(Entity::Match, _))
    ));
}

#[test]
fn deleting_client_or_property_cascades_to_matches() {
    let conn = open_db_in_memory().unwrap();
    let maria = seed_client(&conn, "Maria");
    let joao = seed_client(&conn, "João");
    let house = seed_property(&conn, "Rua A");
    let flat = seed_property(&conn, "Rua B");
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();
    insert_match(&repo, maria, house, 70, 1);
    insert_match(&repo, maria, flat, 71, 2);
    insert_match(&repo, joao, flat, 72, 3);

    SqliteClientRepository::try_new(&conn)
        .unwrap()
        .delete_client(maria)
        .unwrap();
    assert_eq!(repo.count_matches(StatusPredicate::Any).unwrap(), 1);
    assert_eq!(repo.list_matches_for_client(joao).unwrap().len(), 1);

    SqlitePropertyRepository::try_new(&conn)
        .unwrap()
        .delete_property(flat)
        .unwrap();
    assert_eq!(repo.count_matches(StatusPredicate::Any).unwrap(), 0);
}

#[test]
fn matches_for_unknown_rows_violate_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();
    let record = Match::new(Uuid::new_v4(), Uuid::new_v4(), 50, 1).unwrap();
    assert!(repo.upsert_match(&record).is_err());
}

#[test]
fn match_json_flattens_record_fields() {
    let conn = open_db_in_memory().unwrap();
    let client = seed_client(&conn, "Maria");
    let repo = SqliteMatchRepository::try_new(&conn).unwrap();
    insert_match(&repo, client, seed_property(&conn, "Rua A"), 77, 1);

    let listed = repo.list_matches().unwrap();
    let value = serde_json::to_value(&listed[0]).unwrap();
    assert_eq!(value["match_score"], 77);
    assert_eq!(value["status"], "pending");
    assert_eq!(value["is_viewed"], false);
    assert_eq!(value["client"]["name"], "Maria");
    assert_eq!(value["property"]["street"], "Rua A");
}

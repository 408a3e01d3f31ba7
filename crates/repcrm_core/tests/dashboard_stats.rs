use chrono::{FixedOffset, Utc};
use repcrm_core::db::open_db_in_memory;
use repcrm_core::{
    Client, ClientDraft, ClientRepository, ClientStatus, ClientType, DashboardService,
    DashboardStats, Match, MatchRepository, MatchStatus, Money, Property, PropertyDraft,
    PropertyRepository, PropertyStatus, PropertyType, SqliteClientRepository,
    SqliteMatchRepository, SqlitePropertyRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

// 2024-05-10T00:00:00Z
const MIDNIGHT_UTC: i64 = 1_715_299_200_000;
const HOUR_MS: i64 = 3_600_000;

fn dashboard(
    conn: &Connection,
) -> DashboardService<
    SqlitePropertyRepository<'_>,
    SqliteClientRepository<'_>,
    SqliteMatchRepository<'_>,
> {
    DashboardService::new(
        SqlitePropertyRepository::try_new(conn).unwrap(),
        SqliteClientRepository::try_new(conn).unwrap(),
        SqliteMatchRepository::try_new(conn).unwrap(),
    )
}

fn add_property(conn: &Connection, status: PropertyStatus) -> Uuid {
    let draft = PropertyDraft {
        kind: Some(PropertyType::Sobrado),
        street: format!("Rua {}", status.as_str()),
        region: "Xaxim".to_string(),
        transfer_value: Money::from_reais(120_000),
        status,
        ..PropertyDraft::default()
    };
    let property = Property::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft, 1).unwrap();
    SqlitePropertyRepository::try_new(conn)
        .unwrap()
        .create_property(&property)
        .unwrap()
}

fn add_client(conn: &Connection, status: ClientStatus) -> Uuid {
    let draft = ClientDraft {
        name: "Cliente".to_string(),
        phone: "4199".to_string(),
        kind: Some(ClientType::Comprador),
        status,
        ..ClientDraft::default()
    };
    let client = Client::from_draft(Uuid::new_v4(), Uuid::new_v4(), &draft, 1).unwrap();
    SqliteClientRepository::try_new(conn)
        .unwrap()
        .create_client(&client)
        .unwrap()
}

#[test]
fn empty_database_has_zero_counters() {
    let conn = open_db_in_memory().unwrap();
    let stats = dashboard(&conn).stats_in(&Utc, MIDNIGHT_UTC).unwrap();
    assert_eq!(stats, DashboardStats::default());
}

#[test]
fn counters_follow_status_predicates_and_day_boundary() {
    let conn = open_db_in_memory().unwrap();
    let available = add_property(&conn, PropertyStatus::Disponivel);
    let negotiating = add_property(&conn, PropertyStatus::Negociacao);
    let sold = add_property(&conn, PropertyStatus::Vendido);
    let active = add_client(&conn, ClientStatus::Ativo);
    add_client(&conn, ClientStatus::Negociacao);
    add_client(&conn, ClientStatus::Fechado);

    let matches = SqliteMatchRepository::try_new(&conn).unwrap();
    let yesterday = Match::new(active, available, 90, MIDNIGHT_UTC - 1).unwrap();
    let at_midnight = Match::new(active, negotiating, 80, MIDNIGHT_UTC).unwrap();
    let afternoon = Match::new(active, sold, 70, MIDNIGHT_UTC + 15 * HOUR_MS).unwrap();
    for record in [&yesterday, &at_midnight, &afternoon] {
        matches.upsert_match(record).unwrap();
    }
    matches
        .update_status(afternoon.id, MatchStatus::Negotiating)
        .unwrap();

    let now = MIDNIGHT_UTC + 16 * HOUR_MS;
    let stats = dashboard(&conn).stats_in(&Utc, now).unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            total_properties: 2,
            total_clients: 2,
            properties_in_negotiation: 1,
            active_matches: 2,
            new_matches_today: 2,
        }
    );

    // In UTC-3 the local day started at 03:00Z, after the midnight match.
    let brt = FixedOffset::west_opt(3 * 3600).unwrap();
    let stats = dashboard(&conn).stats_in(&brt, now).unwrap();
    assert_eq!(stats.new_matches_today, 1);
}

#[test]
fn stats_serialize_with_snake_case_fields() {
    let stats = DashboardStats {
        total_properties: 4,
        ..DashboardStats::default()
    };
    let value = serde_json::to_value(stats).unwrap();
    assert_eq!(value["total_properties"], 4);
    assert_eq!(value["new_matches_today"], 0);
}

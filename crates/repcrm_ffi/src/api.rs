//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose screen-level CRM use cases to Dart via FRB.
//! - Serve repeated reads from a process-wide query cache.
//! - Translate core errors into short pt-BR toast messages.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Records cross the boundary as typed item structs; form drafts arrive as
//!   JSON using the core's wire names.
//! - The cache is invalidated only after a mutation succeeds.
//! - Match lists, counts and dashboard stats are reloaded on every call, since
//!   matches are written by an external producer through its own connection.

use log::warn;
use once_cell::sync::Lazy;
use repcrm_core::config::DB_PATH_ENV;
use repcrm_core::currency::{
    format_brl, format_brl_compact, format_currency_display, parse_currency_value,
    sanitize_currency_input,
};
use repcrm_core::db::{open_db, Connection};
use repcrm_core::model::client::whatsapp_link as whatsapp_link_inner;
use repcrm_core::storage::{object_path_from_public_url, public_url};
use repcrm_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Client, ClientDraft, ClientFilter, ClientService, ClientStatus, ClientType, DashboardService,
    DashboardStats, MatchService, MatchStatus, MatchWithDetails, Money, Mutation, Property,
    PropertyDraft, PropertyFilter, PropertyService, PropertyStatus, QueryCache, QueryKey,
    RepoError, ServiceError, ServiceResult, SqliteClientRepository, SqliteMatchRepository,
    SqlitePropertyRepository,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_DB_FILE_NAME: &str = "repcrm.sqlite3";
const DASHBOARD_RECENT_LIMIT_MAX: u32 = 50;
/// Properties and clients are only written by brokers; a short reuse window
/// covers screen re-mounts.
const RECORD_MAX_AGE: Duration = Duration::from_secs(5);

const PROPERTY_REQUIRED_FIELDS: &str =
    "Por favor, preencha tipo, endereço, região e valor do repasse.";
const CLIENT_REQUIRED_FIELDS: &str = "Por favor, preencha nome, telefone e tipo do cliente.";
const NOT_AUTHENTICATED: &str = "Usuário não autenticado.";
const INVALID_PAYLOAD: &str = "Dados inválidos.";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static QUERY_CACHES: Lazy<Mutex<QueryCaches>> = Lazy::new(|| Mutex::new(QueryCaches::new()));

/// One typed cache per result shape, all keyed by [`QueryKey`].
struct QueryCaches {
    properties: QueryCache<Vec<Property>>,
    property: QueryCache<Option<Property>>,
    clients: QueryCache<Vec<Client>>,
    client: QueryCache<Option<Client>>,
    matches: QueryCache<Vec<MatchWithDetails>>,
    counts: QueryCache<u64>,
    stats: QueryCache<DashboardStats>,
}

impl QueryCaches {
    fn new() -> Self {
        Self {
            properties: QueryCache::with_max_age(RECORD_MAX_AGE),
            property: QueryCache::with_max_age(RECORD_MAX_AGE),
            clients: QueryCache::with_max_age(RECORD_MAX_AGE),
            client: QueryCache::with_max_age(RECORD_MAX_AGE),
            matches: QueryCache::with_max_age(Duration::ZERO),
            counts: QueryCache::with_max_age(Duration::ZERO),
            stats: QueryCache::with_max_age(Duration::ZERO),
        }
    }

    fn apply(&mut self, mutation: Mutation) {
        let keys = mutation.invalidated_keys();
        self.properties.invalidate(&keys);
        self.property.invalidate(&keys);
        self.clients.invalidate(&keys);
        self.client.invalidate(&keys);
        self.matches.invalidate(&keys);
        self.counts.invalidate(&keys);
        self.stats.invalidate(&keys);
    }
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling logs.
/// - Same arguments again is a no-op; different ones return an error.
/// - Returns empty string on success, error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the SQLite file used by every later call.
///
/// Must run before the first data call; afterwards only the same path is
/// accepted. Returns empty string on success, error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Outcome of a create/update/delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmActionResponse {
    pub ok: bool,
    /// Id of the created or touched record.
    pub id: Option<String>,
    /// Toast text shown to the broker.
    pub message: String,
    /// Stable code (`validation`, `missing_owner`, `not_found`, ...).
    pub error_code: Option<String>,
    /// Technical error text for diagnostics.
    pub detail: Option<String>,
}

impl CrmActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
            error_code: None,
            detail: None,
        }
    }

    fn failure(message: impl Into<String>, error_code: &str, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
            error_code: Some(error_code.to_string()),
            detail: Some(detail.into()),
        }
    }
}

/// Property projection for list cards and the detail screen.
///
/// Money fields are centavos; enums use their stored wire names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyItem {
    pub id: String,
    /// `apartamento|casa|garden|sobrado|sitio`
    pub property_type: String,
    pub street: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
    pub region: String,
    pub transfer_value: i64,
    pub monthly_payment: Option<i64>,
    pub outstanding_balance: Option<i64>,
    pub bank_constructor: Option<String>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    /// `disponivel|negociacao|vendido`
    pub status: String,
    pub notes: Option<String>,
    /// Photo URLs; the first one is the cover.
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientItem {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// `comprador|vendedor|comprador_vendedor`
    pub client_type: String,
    pub max_purchase_value: Option<i64>,
    pub desired_property_types: Vec<String>,
    pub regions_of_interest: Vec<String>,
    pub has_property_for_transfer: bool,
    /// `ativo|negociacao|fechado`
    pub status: String,
    pub notes: Option<String>,
    pub user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Match row with the joined client and property, when still present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchItem {
    pub id: String,
    pub client_id: String,
    pub property_id: String,
    pub match_score: u32,
    pub is_viewed: bool,
    /// `pending|negotiating`
    pub status: String,
    pub created_at: i64,
    pub client: Option<ClientItem>,
    pub property: Option<PropertyItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyListResponse {
    pub ok: bool,
    pub items: Vec<PropertyItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDetailResponse {
    pub ok: bool,
    /// `None` when the property does not exist.
    pub item: Option<PropertyItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientListResponse {
    pub ok: bool,
    pub items: Vec<ClientItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDetailResponse {
    pub ok: bool,
    pub item: Option<ClientItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchListResponse {
    pub ok: bool,
    pub items: Vec<MatchItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStatsResponse {
    pub ok: bool,
    pub total_properties: u64,
    pub total_clients: u64,
    pub properties_in_negotiation: u64,
    pub active_matches: u64,
    pub new_matches_today: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResponse {
    pub ok: bool,
    pub count: u64,
    pub message: String,
}

/// Lists properties newest first.
///
/// `status` takes the stored wire name (`disponivel`...) or `all`/empty;
/// `region` matches exactly, `all`/empty disables it.
#[flutter_rust_bridge::frb(sync)]
pub fn properties_list(
    search: String,
    status: Option<String>,
    region: Option<String>,
) -> PropertyListResponse {
    const OP: &str = "properties_list";
    let failed = |message: String| PropertyListResponse {
        ok: false,
        items: Vec::new(),
        message,
    };

    let status = match parse_choice(status.as_deref(), PropertyStatus::parse) {
        Ok(status) => status,
        Err(raw) => return failed(query_failure(OP, format!("unknown status `{raw}`"))),
    };
    let filter = PropertyFilter {
        search,
        status,
        region: region
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty() && value != "all"),
    };

    let loaded = cached(
        |caches| &mut caches.properties,
        QueryKey::Properties,
        |conn| {
            PropertyService::new(SqlitePropertyRepository::try_new(conn)?)
                .list_properties(&PropertyFilter::default())
        },
    );
    match loaded {
        Ok(items) => PropertyListResponse {
            ok: true,
            items: items
                .iter()
                .filter(|property| filter.matches(property))
                .map(to_property_item)
                .collect(),
            message: String::new(),
        },
        Err(err) => failed(query_failure(OP, err)),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn property_get(id: String) -> PropertyDetailResponse {
    const OP: &str = "property_get";
    let failed = |message: String| PropertyDetailResponse {
        ok: false,
        item: None,
        message,
    };

    let Ok(id) = parse_id(&id) else {
        return failed(query_failure(OP, format!("invalid id `{id}`")));
    };
    let loaded = cached(
        |caches| &mut caches.property,
        QueryKey::Property(id),
        |conn| PropertyService::new(SqlitePropertyRepository::try_new(conn)?).get_property(id),
    );
    match loaded {
        Ok(property) => PropertyDetailResponse {
            ok: true,
            item: property.as_ref().map(to_property_item),
            message: String::new(),
        },
        Err(err) => failed(query_failure(OP, err)),
    }
}

/// Creates a property from a JSON [`PropertyDraft`] for `owner_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn property_create(owner_id: Option<String>, draft_json: String) -> CrmActionResponse {
    const OP: &str = "property_create";
    const FAILED: &str = "Não foi possível cadastrar o imóvel.";

    let owner = match parse_owner(owner_id.as_deref()) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let draft: PropertyDraft = match parse_payload(OP, &draft_json) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match mutate(Mutation::CreateProperty, |conn| {
        PropertyService::new(SqlitePropertyRepository::try_new(conn)?)
            .create_property(owner, &draft)
    }) {
        Ok(property) => CrmActionResponse::success(
            "Imóvel cadastrado com sucesso.",
            Some(property.id.to_string()),
        ),
        Err(err) => action_failure(OP, FAILED, PROPERTY_REQUIRED_FIELDS, &err),
    }
}

/// Applies an edit draft. Media lists absent from the JSON stay as stored.
#[flutter_rust_bridge::frb(sync)]
pub fn property_update(id: String, draft_json: String) -> CrmActionResponse {
    const OP: &str = "property_update";
    const FAILED: &str = "Não foi possível atualizar o imóvel.";

    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let draft: PropertyDraft = match parse_payload(OP, &draft_json) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match mutate(Mutation::UpdateProperty(id), |conn| {
        PropertyService::new(SqlitePropertyRepository::try_new(conn)?).update_property(id, &draft)
    }) {
        Ok(_) => CrmActionResponse::success("Imóvel atualizado com sucesso.", Some(id.to_string())),
        Err(err) => action_failure(OP, FAILED, PROPERTY_REQUIRED_FIELDS, &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn property_delete(id: String) -> CrmActionResponse {
    const OP: &str = "property_delete";
    const FAILED: &str = "Não foi possível excluir o imóvel.";

    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match mutate(Mutation::DeleteProperty(id), |conn| {
        PropertyService::new(SqlitePropertyRepository::try_new(conn)?).delete_property(id)
    }) {
        Ok(()) => {
            CrmActionResponse::success("O imóvel foi excluído com sucesso.", Some(id.to_string()))
        }
        Err(err) => action_failure(OP, FAILED, FAILED, &err),
    }
}

/// Lists clients newest first; `status`/`client_type` accept `all`/empty.
#[flutter_rust_bridge::frb(sync)]
pub fn clients_list(
    search: String,
    status: Option<String>,
    client_type: Option<String>,
) -> ClientListResponse {
    const OP: &str = "clients_list";
    let failed = |message: String| ClientListResponse {
        ok: false,
        items: Vec::new(),
        message,
    };

    let status = match parse_choice(status.as_deref(), ClientStatus::parse) {
        Ok(status) => status,
        Err(raw) => return failed(query_failure(OP, format!("unknown status `{raw}`"))),
    };
    let kind = match parse_choice(client_type.as_deref(), ClientType::parse) {
        Ok(kind) => kind,
        Err(raw) => return failed(query_failure(OP, format!("unknown client type `{raw}`"))),
    };
    let filter = ClientFilter {
        search,
        status,
        kind,
    };

    let loaded = cached(
        |caches| &mut caches.clients,
        QueryKey::Clients,
        |conn| {
            ClientService::new(SqliteClientRepository::try_new(conn)?)
                .list_clients(&ClientFilter::default())
        },
    );
    match loaded {
        Ok(items) => ClientListResponse {
            ok: true,
            items: items
                .iter()
                .filter(|client| filter.matches(client))
                .map(to_client_item)
                .collect(),
            message: String::new(),
        },
        Err(err) => failed(query_failure(OP, err)),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn client_get(id: String) -> ClientDetailResponse {
    const OP: &str = "client_get";
    let failed = |message: String| ClientDetailResponse {
        ok: false,
        item: None,
        message,
    };

    let Ok(id) = parse_id(&id) else {
        return failed(query_failure(OP, format!("invalid id `{id}`")));
    };
    let loaded = cached(
        |caches| &mut caches.client,
        QueryKey::Client(id),
        |conn| ClientService::new(SqliteClientRepository::try_new(conn)?).get_client(id),
    );
    match loaded {
        Ok(client) => ClientDetailResponse {
            ok: true,
            item: client.as_ref().map(to_client_item),
            message: String::new(),
        },
        Err(err) => failed(query_failure(OP, err)),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn client_create(owner_id: Option<String>, draft_json: String) -> CrmActionResponse {
    const OP: &str = "client_create";
    const FAILED: &str = "Não foi possível cadastrar o cliente.";

    let owner = match parse_owner(owner_id.as_deref()) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let draft: ClientDraft = match parse_payload(OP, &draft_json) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match mutate(Mutation::CreateClient, |conn| {
        ClientService::new(SqliteClientRepository::try_new(conn)?).create_client(owner, &draft)
    }) {
        Ok(client) => CrmActionResponse::success(
            "O cliente foi cadastrado com sucesso.",
            Some(client.id.to_string()),
        ),
        Err(err) => action_failure(OP, FAILED, CLIENT_REQUIRED_FIELDS, &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn client_update(id: String, draft_json: String) -> CrmActionResponse {
    const OP: &str = "client_update";
    const FAILED: &str = "Não foi possível atualizar o cliente.";

    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let draft: ClientDraft = match parse_payload(OP, &draft_json) {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match mutate(Mutation::UpdateClient(id), |conn| {
        ClientService::new(SqliteClientRepository::try_new(conn)?).update_client(id, &draft)
    }) {
        Ok(_) => CrmActionResponse::success("Cliente atualizado com sucesso.", Some(id.to_string())),
        Err(err) => action_failure(OP, FAILED, CLIENT_REQUIRED_FIELDS, &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn client_delete(id: String) -> CrmActionResponse {
    const OP: &str = "client_delete";
    const FAILED: &str = "Não foi possível excluir o cliente.";

    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match mutate(Mutation::DeleteClient(id), |conn| {
        ClientService::new(SqliteClientRepository::try_new(conn)?).delete_client(id)
    }) {
        Ok(()) => {
            CrmActionResponse::success("O cliente foi excluído com sucesso.", Some(id.to_string()))
        }
        Err(err) => action_failure(OP, FAILED, FAILED, &err),
    }
}

/// Lists matches newest first; `pending_only` mirrors the matches screen.
#[flutter_rust_bridge::frb(sync)]
pub fn matches_list(pending_only: bool) -> MatchListResponse {
    match load_matches() {
        Ok(items) => match_list_response(
            items
                .iter()
                .filter(|item| !pending_only || item.record.status == MatchStatus::Pending),
        ),
        Err(err) => MatchListResponse {
            ok: false,
            items: Vec::new(),
            message: query_failure("matches_list", err),
        },
    }
}

/// First `limit` matches of the newest-first list (dashboard card).
#[flutter_rust_bridge::frb(sync)]
pub fn matches_recent(limit: u32) -> MatchListResponse {
    let limit = limit.min(DASHBOARD_RECENT_LIMIT_MAX) as usize;
    match load_matches() {
        Ok(items) => match_list_response(items.iter().take(limit)),
        Err(err) => MatchListResponse {
            ok: false,
            items: Vec::new(),
            message: query_failure("matches_recent", err),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn unviewed_matches_count() -> CountResponse {
    let loaded = cached(
        |caches| &mut caches.counts,
        QueryKey::UnviewedMatchesCount,
        |conn| MatchService::new(SqliteMatchRepository::try_new(conn)?).unviewed_count(),
    );
    match loaded {
        Ok(count) => CountResponse {
            ok: true,
            count,
            message: String::new(),
        },
        Err(err) => {
            log_failure("unviewed_matches_count", &err);
            CountResponse {
                ok: false,
                count: 0,
                message: err.to_string(),
            }
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn match_mark_viewed(id: String) -> CrmActionResponse {
    const OP: &str = "match_mark_viewed";
    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match mutate(Mutation::MarkMatchViewed(id), |conn| {
        MatchService::new(SqliteMatchRepository::try_new(conn)?).mark_viewed(id)
    }) {
        Ok(()) => CrmActionResponse::success("", Some(id.to_string())),
        Err(err) => action_failure(OP, "Não foi possível atualizar o match.", "", &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn match_start_negotiation(id: String) -> CrmActionResponse {
    const OP: &str = "match_start_negotiation";
    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match mutate(Mutation::UpdateMatchStatus(id), |conn| {
        MatchService::new(SqliteMatchRepository::try_new(conn)?).start_negotiation(id)
    }) {
        Ok(()) => CrmActionResponse::success(
            "O match foi movido para negociação.",
            Some(id.to_string()),
        ),
        Err(err) => action_failure(OP, "Não foi possível atualizar o match.", "", &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn match_discard(id: String) -> CrmActionResponse {
    const OP: &str = "match_discard";
    let id = match parse_action_id(OP, &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match mutate(Mutation::DeleteMatch(id), |conn| {
        MatchService::new(SqliteMatchRepository::try_new(conn)?).discard(id)
    }) {
        Ok(()) => CrmActionResponse::success("O match foi removido.", Some(id.to_string())),
        Err(err) => action_failure(OP, "Não foi possível remover o match.", "", &err),
    }
}

/// Stores a score computed by the external matcher.
#[flutter_rust_bridge::frb(sync)]
pub fn match_record(client_id: String, property_id: String, score: u32) -> CrmActionResponse {
    const OP: &str = "match_record";
    let client_id = match parse_action_id(OP, &client_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let property_id = match parse_action_id(OP, &property_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match mutate(Mutation::RecordMatch, |conn| {
        MatchService::new(SqliteMatchRepository::try_new(conn)?).record_match(
            client_id,
            property_id,
            score,
        )
    }) {
        Ok(id) => CrmActionResponse::success("", Some(id.to_string())),
        Err(err) => action_failure(OP, "Não foi possível registrar o match.", "", &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_stats() -> DashboardStatsResponse {
    let loaded = cached(
        |caches| &mut caches.stats,
        QueryKey::DashboardStats,
        |conn| {
            DashboardService::new(
                SqlitePropertyRepository::try_new(conn)?,
                SqliteClientRepository::try_new(conn)?,
                SqliteMatchRepository::try_new(conn)?,
            )
            .stats(repcrm_core::now_epoch_ms())
        },
    );
    match loaded {
        Ok(stats) => DashboardStatsResponse {
            ok: true,
            total_properties: stats.total_properties,
            total_clients: stats.total_clients,
            properties_in_negotiation: stats.properties_in_negotiation,
            active_matches: stats.active_matches,
            new_matches_today: stats.new_matches_today,
            message: String::new(),
        },
        Err(err) => {
            log_failure("dashboard_stats", &err);
            DashboardStatsResponse {
                ok: false,
                total_properties: 0,
                total_clients: 0,
                properties_in_negotiation: 0,
                active_matches: 0,
                new_matches_today: 0,
                message: err.to_string(),
            }
        }
    }
}

/// `R$ 160.000,00`
#[flutter_rust_bridge::frb(sync)]
pub fn currency_format(cents: i64) -> String {
    format_brl(Money::from_cents(cents))
}

/// `R$ 160.000` (fraction only when non-zero).
#[flutter_rust_bridge::frb(sync)]
pub fn currency_format_compact(cents: i64) -> String {
    format_brl_compact(Money::from_cents(cents))
}

/// Input-field rendering without symbol: `160.000,00`.
#[flutter_rust_bridge::frb(sync)]
pub fn currency_format_input(cents: i64) -> String {
    format_currency_display(Money::from_cents(cents))
}

#[flutter_rust_bridge::frb(sync)]
pub fn currency_sanitize(input: String) -> String {
    sanitize_currency_input(&input)
}

/// Parses typed pt-BR currency into centavos; `None` when nothing numeric.
#[flutter_rust_bridge::frb(sync)]
pub fn currency_parse(input: String) -> Option<i64> {
    parse_currency_value(&input).map(Money::cents)
}

#[flutter_rust_bridge::frb(sync)]
pub fn whatsapp_link(phone: String) -> Option<String> {
    whatsapp_link_inner(&phone)
}

#[flutter_rust_bridge::frb(sync)]
pub fn media_public_url(base_url: String, object_path: String) -> String {
    public_url(&base_url, &object_path)
}

#[flutter_rust_bridge::frb(sync)]
pub fn media_object_path(public_url: String) -> Option<String> {
    object_path_from_public_url(&public_url).map(str::to_string)
}

fn to_property_item(property: &Property) -> PropertyItem {
    PropertyItem {
        id: property.id.to_string(),
        property_type: property.kind.as_str().to_string(),
        street: property.street.clone(),
        neighborhood: property.neighborhood.clone(),
        city: property.city.clone(),
        state: property.state.clone(),
        region: property.region.clone(),
        transfer_value: property.transfer_value.cents(),
        monthly_payment: property.monthly_payment.map(Money::cents),
        outstanding_balance: property.outstanding_balance.map(Money::cents),
        bank_constructor: property.bank_constructor.clone(),
        owner_name: property.owner_name.clone(),
        owner_phone: property.owner_phone.clone(),
        status: property.status.as_str().to_string(),
        notes: property.notes.clone(),
        photos: property.media.photos.clone(),
        videos: property.media.videos.clone(),
        user_id: property.user_id.to_string(),
        created_at: property.created_at,
        updated_at: property.updated_at,
    }
}

fn to_client_item(client: &Client) -> ClientItem {
    ClientItem {
        id: client.id.to_string(),
        name: client.name.clone(),
        phone: client.phone.clone(),
        client_type: client.kind.as_str().to_string(),
        max_purchase_value: client.max_purchase_value.map(Money::cents),
        desired_property_types: client
            .desired_property_types
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect(),
        regions_of_interest: client.regions_of_interest.clone(),
        has_property_for_transfer: client.has_property_for_transfer,
        status: client.status.as_str().to_string(),
        notes: client.notes.clone(),
        user_id: client.user_id.to_string(),
        created_at: client.created_at,
        updated_at: client.updated_at,
    }
}

fn to_match_item(item: &MatchWithDetails) -> MatchItem {
    MatchItem {
        id: item.record.id.to_string(),
        client_id: item.record.client_id.to_string(),
        property_id: item.record.property_id.to_string(),
        match_score: u32::from(item.record.match_score),
        is_viewed: item.record.is_viewed,
        status: item.record.status.as_str().to_string(),
        created_at: item.record.created_at,
        client: item.client.as_ref().map(to_client_item),
        property: item.property.as_ref().map(to_property_item),
    }
}

fn match_list_response<'a>(
    items: impl Iterator<Item = &'a MatchWithDetails>,
) -> MatchListResponse {
    MatchListResponse {
        ok: true,
        items: items.map(to_match_item).collect(),
        message: String::new(),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
        })
        .clone()
}

fn open_connection() -> ServiceResult<Connection> {
    open_db(resolve_db_path()).map_err(|err| ServiceError::from(RepoError::from(err)))
}

fn lock_caches() -> MutexGuard<'static, QueryCaches> {
    QUERY_CACHES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reads through the cache selected by `select`, loading on a miss or a
/// stale entry.
fn cached<V: Clone>(
    select: fn(&mut QueryCaches) -> &mut QueryCache<V>,
    key: QueryKey,
    load: impl FnOnce(&Connection) -> ServiceResult<V>,
) -> ServiceResult<V> {
    let mut caches = lock_caches();
    select(&mut caches).get_or_load(key, || {
        let conn = open_connection()?;
        load(&conn)
    })
}

/// Runs a write and drops the cache entries it makes stale.
fn mutate<T>(
    mutation: Mutation,
    write: impl FnOnce(&Connection) -> ServiceResult<T>,
) -> ServiceResult<T> {
    let conn = open_connection()?;
    let result = write(&conn)?;
    lock_caches().apply(mutation);
    Ok(result)
}

fn load_matches() -> ServiceResult<Vec<MatchWithDetails>> {
    cached(
        |caches| &mut caches.matches,
        QueryKey::Matches,
        |conn| MatchService::new(SqliteMatchRepository::try_new(conn)?).list_matches(),
    )
}

fn parse_id(raw: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(raw.trim())
}

fn parse_action_id(op: &str, raw: &str) -> Result<Uuid, CrmActionResponse> {
    parse_id(raw).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error op={op} error_code=invalid_id");
        CrmActionResponse::failure(
            INVALID_PAYLOAD,
            "invalid_id",
            format!("invalid id `{raw}`: {err}"),
        )
    })
}

/// Blank or missing owner means "not signed in" and is left to the service.
fn parse_owner(raw: Option<&str>) -> Result<Option<Uuid>, CrmActionResponse> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse_id(value).map(Some).map_err(|err| {
            CrmActionResponse::failure(
                NOT_AUTHENTICATED,
                "invalid_owner",
                format!("invalid owner id `{value}`: {err}"),
            )
        }),
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    op: &str,
    json: &str,
) -> Result<T, CrmActionResponse> {
    serde_json::from_str(json).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error op={op} error_code=invalid_payload");
        CrmActionResponse::failure(INVALID_PAYLOAD, "invalid_payload", err.to_string())
    })
}

/// `None` for empty/`all`, `Err(raw)` for an unknown value.
fn parse_choice<T>(raw: Option<&str>, parse: fn(&str) -> Option<T>) -> Result<Option<T>, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => parse(value).map(Some).ok_or_else(|| value.to_string()),
    }
}

fn action_failure(
    op: &str,
    generic: &str,
    required_fields: &str,
    err: &ServiceError,
) -> CrmActionResponse {
    log_failure(op, err);
    let message = match err {
        ServiceError::MissingOwner => NOT_AUTHENTICATED,
        ServiceError::InvalidProperty(_) | ServiceError::InvalidClient(_)
            if !required_fields.is_empty() =>
        {
            required_fields
        }
        _ => generic,
    };
    CrmActionResponse::failure(message, err.code(), err.to_string())
}

fn log_failure(op: &str, err: &ServiceError) {
    warn!(
        "event=ffi_call module=ffi status=error op={op} error_code={}",
        err.code()
    );
}

/// Logs a failed read and returns the message for its envelope.
fn query_failure(op: &str, err: impl std::fmt::Display) -> String {
    warn!("event=ffi_call module=ffi status=error op={op}");
    format!("{op} failed: {err}")
}

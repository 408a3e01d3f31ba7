//! Broker-side command line for a local RepCRM database.
//!
//! # Responsibility
//! - Inspect listings, clients and matches without the Flutter shell.
//! - Run the same core services the app uses, against the configured file.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use repcrm_core::currency::{format_brl, format_brl_or_dash, parse_currency_value};
use repcrm_core::db::{open_db, Connection};
use repcrm_core::{
    init_logging, ClientFilter, ClientService, ClientStatus, ClientType, CrmConfig,
    DashboardService, MatchService, MatchWithDetails, PropertyDraft, PropertyFilter,
    PropertyService, PropertyStatus, PropertyType, SqliteClientRepository, SqliteMatchRepository,
    SqlitePropertyRepository, DASHBOARD_RECENT_MATCHES,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "repcrm", version, about = "Local tooling for the RepCRM database")]
struct Cli {
    /// TOML config file (falls back to `REPCRM_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite file, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the dashboard counters and latest matches
    Stats,
    /// Listing operations
    #[command(subcommand)]
    Properties(PropertyCommand),
    /// Client operations
    #[command(subcommand)]
    Clients(ClientCommand),
    /// Match operations
    #[command(subcommand)]
    Matches(MatchCommand),
    /// Check core linkage
    Ping,
}

#[derive(Subcommand, Debug)]
enum PropertyCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum)]
        status: Option<PropertyStatusArg>,
        #[arg(long)]
        region: Option<String>,
    },
    /// Register a listing owned by the configured user
    Add {
        #[arg(long = "type", value_enum)]
        kind: PropertyTypeArg,
        #[arg(long)]
        street: String,
        #[arg(long)]
        region: String,
        /// Transfer value as typed in the app, e.g. `160.000,00`
        #[arg(long)]
        value: String,
        #[arg(long)]
        owner_name: Option<String>,
    },
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum)]
        status: Option<ClientStatusArg>,
        #[arg(long = "type", value_enum)]
        kind: Option<ClientTypeArg>,
    },
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug)]
enum MatchCommand {
    List {
        /// Only matches still awaiting a decision
        #[arg(long)]
        pending: bool,
    },
    /// Store a score produced by the matcher
    Record {
        client: Uuid,
        property: Uuid,
        score: u32,
    },
    Negotiate { id: Uuid },
    Discard { id: Uuid },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PropertyStatusArg {
    Disponivel,
    Negociacao,
    Vendido,
}

impl From<PropertyStatusArg> for PropertyStatus {
    fn from(value: PropertyStatusArg) -> Self {
        match value {
            PropertyStatusArg::Disponivel => Self::Disponivel,
            PropertyStatusArg::Negociacao => Self::Negociacao,
            PropertyStatusArg::Vendido => Self::Vendido,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PropertyTypeArg {
    Apartamento,
    Casa,
    Garden,
    Sobrado,
    Sitio,
}

impl From<PropertyTypeArg> for PropertyType {
    fn from(value: PropertyTypeArg) -> Self {
        match value {
            PropertyTypeArg::Apartamento => Self::Apartamento,
            PropertyTypeArg::Casa => Self::Casa,
            PropertyTypeArg::Garden => Self::Garden,
            PropertyTypeArg::Sobrado => Self::Sobrado,
            PropertyTypeArg::Sitio => Self::Sitio,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClientStatusArg {
    Ativo,
    Negociacao,
    Fechado,
}

impl From<ClientStatusArg> for ClientStatus {
    fn from(value: ClientStatusArg) -> Self {
        match value {
            ClientStatusArg::Ativo => Self::Ativo,
            ClientStatusArg::Negociacao => Self::Negociacao,
            ClientStatusArg::Fechado => Self::Fechado,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClientTypeArg {
    Comprador,
    Vendedor,
    CompradorVendedor,
}

impl From<ClientTypeArg> for ClientType {
    fn from(value: ClientTypeArg) -> Self {
        match value {
            ClientTypeArg::Comprador => Self::Comprador,
            ClientTypeArg::Vendedor => Self::Vendedor,
            ClientTypeArg::CompradorVendedor => Self::CompradorVendedor,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CrmConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log_dir is not valid UTF-8"))?;
        init_logging(config.resolved_log_level(), log_dir).context("failed to start logging")?;
    }

    if let Commands::Ping = cli.command {
        println!("repcrm_core ping={}", repcrm_core::ping());
        println!("repcrm_core version={}", repcrm_core::core_version());
        return Ok(());
    }

    let db_path = config.resolved_db_path();
    let conn =
        open_db(&db_path).with_context(|| format!("failed to open {}", db_path.display()))?;

    match cli.command {
        Commands::Stats => print_stats(&conn),
        Commands::Properties(cmd) => run_properties(&conn, &config, cmd),
        Commands::Clients(cmd) => run_clients(&conn, cmd),
        Commands::Matches(cmd) => run_matches(&conn, cmd),
        Commands::Ping => Ok(()),
    }
}

fn print_stats(conn: &Connection) -> Result<()> {
    let stats = DashboardService::new(
        SqlitePropertyRepository::try_new(conn)?,
        SqliteClientRepository::try_new(conn)?,
        SqliteMatchRepository::try_new(conn)?,
    )
    .stats(repcrm_core::now_epoch_ms())?;

    println!("imóveis ativos        {}", stats.total_properties);
    println!("clientes ativos       {}", stats.total_clients);
    println!("em negociação         {}", stats.properties_in_negotiation);
    println!("matches ativos        {}", stats.active_matches);
    println!("novos matches hoje    {}", stats.new_matches_today);

    let recent = MatchService::new(SqliteMatchRepository::try_new(conn)?)
        .recent_matches(DASHBOARD_RECENT_MATCHES)?;
    if !recent.is_empty() {
        println!();
        for item in &recent {
            print_match(item);
        }
    }
    Ok(())
}

fn run_properties(conn: &Connection, config: &CrmConfig, cmd: PropertyCommand) -> Result<()> {
    let service = PropertyService::new(SqlitePropertyRepository::try_new(conn)?);
    match cmd {
        PropertyCommand::List {
            search,
            status,
            region,
        } => {
            let filter = PropertyFilter {
                search,
                status: status.map(Into::into),
                region,
            };
            for property in service.list_properties(&filter)? {
                println!(
                    "{}  {:<11} {:<12} {:<16} {}  {}",
                    property.id,
                    property.kind.label(),
                    property.status.label(),
                    property.region,
                    format_brl(property.transfer_value),
                    property.address_line(),
                );
            }
        }
        PropertyCommand::Add {
            kind,
            street,
            region,
            value,
            owner_name,
        } => {
            let Some(transfer_value) = parse_currency_value(&value) else {
                bail!("`{value}` is not a currency value");
            };
            let draft = PropertyDraft {
                kind: Some(kind.into()),
                street,
                region,
                transfer_value,
                owner_name,
                ..PropertyDraft::default()
            };
            let created = service.create_property(config.user_id, &draft)?;
            println!("created {}", created.id);
        }
        PropertyCommand::Delete { id } => {
            service.delete_property(id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn run_clients(conn: &Connection, cmd: ClientCommand) -> Result<()> {
    let service = ClientService::new(SqliteClientRepository::try_new(conn)?);
    match cmd {
        ClientCommand::List {
            search,
            status,
            kind,
        } => {
            let filter = ClientFilter {
                search,
                status: status.map(Into::into),
                kind: kind.map(Into::into),
            };
            for client in service.list_clients(&filter)? {
                println!(
                    "{}  {:<24} {:<18} {:<19} {:<11} {}",
                    client.id,
                    client.name,
                    client.phone,
                    client.kind.label(),
                    client.status.label(),
                    format_brl_or_dash(client.max_purchase_value),
                );
            }
        }
        ClientCommand::Delete { id } => {
            service.delete_client(id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn run_matches(conn: &Connection, cmd: MatchCommand) -> Result<()> {
    let service = MatchService::new(SqliteMatchRepository::try_new(conn)?);
    match cmd {
        MatchCommand::List { pending } => {
            let items = if pending {
                service.pending_matches()?
            } else {
                service.list_matches()?
            };
            for item in &items {
                print_match(item);
            }
        }
        MatchCommand::Record {
            client,
            property,
            score,
        } => {
            let id = service.record_match(client, property, score)?;
            println!("recorded {id}");
        }
        MatchCommand::Negotiate { id } => {
            service.start_negotiation(id)?;
            println!("negotiating {id}");
        }
        MatchCommand::Discard { id } => {
            service.discard(id)?;
            println!("discarded {id}");
        }
    }
    Ok(())
}

fn print_match(item: &MatchWithDetails) {
    let client = item
        .client
        .as_ref()
        .map_or("-", |client| client.name.as_str());
    let property = item
        .property
        .as_ref()
        .map(|property| property.address_line())
        .unwrap_or_else(|| "-".to_string());
    let created = Local
        .timestamp_millis_opt(item.record.created_at)
        .single()
        .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default();
    let marker = if item.record.is_viewed { ' ' } else { '*' };
    println!(
        "{marker} {}  {:>3}%  {:<11} {created}  {client} -> {property}",
        item.record.id,
        item.record.match_score,
        item.record.status.label(),
    );
}

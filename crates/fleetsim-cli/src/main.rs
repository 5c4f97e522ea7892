use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fleetsim_api::{DetailRequest, FleetSimApi, ListEventsRequest, VehicleRequest};
use fleetsim_core::id::parse_date;
use fleetsim_core::{
    derive_seed, parse_event_id, parse_vehicle_id, resolve_status, scalar, GeoPoint,
    OperationalStatus, Severity,
};
use serde_json::Value;
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

#[derive(Debug, Parser)]
#[command(name = "fsim")]
#[command(about = "Deterministic synthetic fleet data")]
struct Cli {
    /// JSON file replacing the built-in catalogs.
    #[arg(long)]
    catalogs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Seed(IdArgs),
    Scalar(ScalarArgs),
    Status(IdArgs),
    Callsign(CallsignArgs),
    Event(EventArgs),
    Lifecycle(LifecycleArgs),
    Detail(DetailArgs),
    Marker(DetailArgs),
    Timeline(DetailArgs),
    Vehicle(VehicleArgs),
    Events(EventsArgs),
}

#[derive(Debug, Args)]
struct IdArgs {
    #[arg(long)]
    id: String,
}

#[derive(Debug, Args)]
struct ScalarArgs {
    #[arg(long)]
    seed: u64,
    #[arg(long, default_value_t = 0)]
    offset: u64,
}

#[derive(Debug, Args)]
struct CallsignArgs {
    #[arg(long)]
    index: u32,
}

#[derive(Debug, Args)]
struct EventArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    reference_date: Option<String>,
}

#[derive(Debug, Args)]
struct LifecycleArgs {
    #[arg(long)]
    id: String,
    /// Align to the synthesized route of this vehicle.
    #[arg(long, conflicts_with = "route_file")]
    vehicle: Option<String>,
    /// JSON array of `[lat, lng]` pairs.
    #[arg(long)]
    route_file: Option<PathBuf>,
    #[arg(long)]
    route_points: Option<usize>,
    #[arg(long)]
    reference_start: Option<String>,
    #[arg(long)]
    reference_date: Option<String>,
}

#[derive(Debug, Args)]
struct DetailArgs {
    #[arg(long)]
    id: String,
    #[arg(long, conflicts_with = "route_file")]
    vehicle: Option<String>,
    #[arg(long)]
    route_file: Option<PathBuf>,
    #[arg(long)]
    route_points: Option<usize>,
    #[arg(long)]
    reference_date: Option<String>,
    /// Caller clock for defaults and elapsed time; RFC3339 UTC.
    #[arg(long)]
    now: Option<String>,
}

#[derive(Debug, Args)]
struct VehicleArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    route_points: Option<usize>,
}

#[derive(Debug, Args)]
struct EventsArgs {
    #[arg(long)]
    date: String,
    #[arg(long, default_value_t = 20)]
    count: u32,
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
    #[arg(long, value_enum)]
    severity: Option<SeverityArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Abierto,
    EnProgreso,
    Cerrado,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeverityArg {
    Alta,
    Media,
    Baja,
    Informativa,
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let api = FleetSimApi::from_optional_catalog_file(cli.catalogs.as_deref())?;
    tracing::debug!(command = ?cli.command, "running command");

    match cli.command {
        Command::Seed(args) => run_seed(&args),
        Command::Scalar(args) => emit_json(serde_json::json!({
            "seed": args.seed,
            "offset": args.offset,
            "value": scalar(args.seed, args.offset)
        })),
        Command::Status(args) => {
            emit_json(serde_json::to_value(api.event_status(&args.id))?)
        }
        Command::Callsign(args) => emit_json(serde_json::to_value(api.callsign(args.index))?),
        Command::Event(args) => {
            let reference_date = parse_optional_date(args.reference_date.as_deref())?;
            emit_json(serde_json::to_value(api.event_card(&args.id, reference_date))?)
        }
        Command::Lifecycle(args) => run_lifecycle(&args, &api),
        Command::Detail(args) => {
            let (request, now) = detail_request(&args)?;
            let detail = api.event_detail(&request, now)?;
            emit_json(serde_json::to_value(&detail).context("failed to serialize event detail")?)
        }
        Command::Marker(args) => {
            let (request, now) = detail_request(&args)?;
            let marker = api.map_marker(&request, now)?;
            emit_json(serde_json::to_value(&marker).context("failed to serialize map marker")?)
        }
        Command::Timeline(args) => {
            let (request, now) = detail_request(&args)?;
            let timeline = api.timeline(&request, now)?;
            emit_json(serde_json::to_value(&timeline).context("failed to serialize timeline")?)
        }
        Command::Vehicle(args) => {
            let profile = api.vehicle(&VehicleRequest {
                vehicle_id: args.id,
                route_points: args.route_points,
            })?;
            emit_json(serde_json::to_value(&profile).context("failed to serialize vehicle")?)
        }
        Command::Events(args) => {
            let list = api.list_events(&ListEventsRequest {
                date: parse_date(&args.date)?,
                count: args.count,
                status: args.status.map(StatusArg::into_status),
                severity: args.severity.map(SeverityArg::into_severity),
            })?;
            emit_json(serde_json::to_value(&list).context("failed to serialize event list")?)
        }
    }
}

fn run_seed(args: &IdArgs) -> Result<()> {
    emit_json(serde_json::json!({
        "id": args.id,
        "seed": derive_seed(&args.id),
        "event_key": parse_event_id(&args.id),
        "vehicle_key": parse_vehicle_id(&args.id),
        "status": resolve_status(&args.id)
    }))
}

fn run_lifecycle(args: &LifecycleArgs, api: &FleetSimApi) -> Result<()> {
    let request = DetailRequest {
        event_id: args.id.clone(),
        reference_date: args.reference_date.as_deref().map(parse_date).transpose()?,
        vehicle_id: args.vehicle.clone(),
        route: args.route_file.as_deref().map(read_route_file).transpose()?,
        route_points: args.route_points,
    };
    let reference_start = parse_optional_rfc3339(args.reference_start.as_deref())?;

    let lifecycle = api.lifecycle(&request, reference_start)?;
    emit_json(serde_json::json!({
        "status": resolve_status(&args.id),
        "lifecycle": lifecycle
    }))
}

fn detail_request(args: &DetailArgs) -> Result<(DetailRequest, OffsetDateTime)> {
    let now = parse_optional_rfc3339(args.now.as_deref())?;
    let route = args.route_file.as_deref().map(read_route_file).transpose()?;
    let request = DetailRequest {
        event_id: args.id.clone(),
        reference_date: args.reference_date.as_deref().map(parse_date).transpose()?,
        vehicle_id: args.vehicle.clone(),
        route,
        route_points: args.route_points,
    };
    Ok((request, now))
}

fn read_route_file(path: &Path) -> Result<Vec<GeoPoint>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read route file {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("route file {} is not a JSON array of [lat, lng]", path.display()))
}

fn parse_optional_date(value: Option<&str>) -> Result<Date> {
    match value {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(OffsetDateTime::now_utc().date()),
    }
}

fn parse_optional_rfc3339(value: Option<&str>) -> Result<OffsetDateTime> {
    match value {
        Some(raw) => parse_rfc3339(raw),
        None => Ok(OffsetDateTime::now_utc()),
    }
}

fn parse_rfc3339(value: &str) -> Result<OffsetDateTime> {
    let parsed = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
        .with_context(|| format!("invalid RFC3339 UTC timestamp: {value}"))?;

    if parsed.offset() != time::UtcOffset::UTC {
        return Err(anyhow!("timestamp MUST use UTC offset Z (received: {value})"));
    }

    Ok(parsed)
}

impl StatusArg {
    fn into_status(self) -> OperationalStatus {
        match self {
            Self::Abierto => OperationalStatus::Abierto,
            Self::EnProgreso => OperationalStatus::EnProgreso,
            Self::Cerrado => OperationalStatus::Cerrado,
        }
    }
}

impl SeverityArg {
    fn into_severity(self) -> Severity {
        match self {
            Self::Alta => Severity::Alta,
            Self::Media => Severity::Media,
            Self::Baja => Severity::Baja,
            Self::Informativa => Severity::Informativa,
        }
    }
}

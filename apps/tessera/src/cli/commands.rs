//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::{AppConfig, StorageBackend};
use crate::observer::TracingObserver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::{
    ComponentDescriptor, DashboardConfig, DashboardSession, FilterDefinition, FilterValue,
    MemoryQueryString, MemoryStorage, PersistenceAdapter, RedbStorage, TesseraError, decode_value,
    encode_value,
};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum dashboard file size (10 MB).
const MAX_DASHBOARD_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), TesseraError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| TesseraError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(TesseraError::ConfigError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve a path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, TesseraError> {
    let canonical = path.canonicalize().map_err(|e| {
        TesseraError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(TesseraError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), TesseraError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let session = open_session(&config, None)?;

    println!("Tessera Filter Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:    {}", config.server.addr());
    println!("  Backend:    {}", config.storage.backend.as_str());
    if config.storage.backend == StorageBackend::Redb {
        println!("  Storage:    {:?}", config.storage.path);
    }
    println!("  Components: {}", session.components().len());
    println!("  Filters:    {}", session.definitions().len());
    println!();
    println!("Endpoints:");
    println!("  GET    /health           - Health check");
    println!("  GET    /components       - Visible components");
    println!("  GET    /state            - Active filters");
    println!("  PUT    /filters/{{id}}     - Set a filter");
    println!("  DELETE /filters/{{id}}     - Reset a filter");
    println!("  POST   /bars/{{id}}/clear  - Clear a filter bar");
    println!("  POST   /clear            - Clear every filter");
    println!("  POST   /filter           - Filter a posted dashboard");
    println!("  POST   /classify         - Classify posted components");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(session, &config.server).await
}

// =============================================================================
// FILTER COMMAND
// =============================================================================

/// List the components that pass the active filters.
pub fn cmd_filter(
    config: &AppConfig,
    json_mode: bool,
    verbose: bool,
    query: Option<&str>,
    trace: bool,
) -> Result<(), TesseraError> {
    let session = open_session(config, query)?;

    if json_mode {
        let mut output = serde_json::json!({
            "total": session.components().len(),
            "visible": session.visible(),
        });
        if trace {
            output["exclusions"] = serde_json::json!(session.exclusions());
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Visible Components ({} of {})",
        session.visible().len(),
        session.components().len()
    );
    println!("==========================");
    for component in session.visible() {
        print_component(component, verbose);
    }

    if trace && !session.exclusions().is_empty() {
        println!();
        println!("Excluded:");
        for exclusion in session.exclusions() {
            println!(
                "  {:<16} by {}",
                exclusion.component_id, exclusion.filter_id
            );
        }
    }

    Ok(())
}

fn print_component(component: &ComponentDescriptor, verbose: bool) {
    let kind = if component.kind().is_empty() {
        "-"
    } else {
        component.kind()
    };
    match component.title() {
        Some(title) => println!("  {:<16} {:<16} {}", component.id(), kind, title),
        None => println!("  {:<16} {}", component.id(), kind),
    }
    if let Some(data) = component.data().filter(|_| verbose) {
        println!("      {}", data);
    }
}

// =============================================================================
// CLASSIFY COMMAND
// =============================================================================

/// Show the detected role of every component.
pub fn cmd_classify(config: &AppConfig, json_mode: bool) -> Result<(), TesseraError> {
    let session = open_session(config, None)?;
    let roles = session.classify_all();

    if json_mode {
        let output: Vec<_> = roles
            .iter()
            .map(|(id, c)| {
                serde_json::json!({
                    "id": id,
                    "role": c.role().name(),
                    "isCard": c.is_card,
                    "isTimeSeries": c.is_time_series,
                    "isAggregation": c.is_aggregation,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Component Roles");
    println!("===============");
    for (id, c) in &roles {
        let mut flags = Vec::new();
        if c.is_card {
            flags.push("card");
        }
        if c.is_time_series {
            flags.push("timeSeries");
        }
        if c.is_aggregation {
            flags.push("aggregation");
        }
        println!("  {:<16} {:<12} [{}]", id, c.role().name(), flags.join(", "));
    }

    Ok(())
}

// =============================================================================
// STATE COMMANDS
// =============================================================================

/// Show the active filters.
pub fn cmd_state(config: &AppConfig, json_mode: bool, verbose: bool) -> Result<(), TesseraError> {
    let session = open_session(config, None)?;
    print_state(&session, json_mode, verbose);
    Ok(())
}

/// Set one filter and persist the new state.
pub fn cmd_set(
    config: &AppConfig,
    json_mode: bool,
    id: &str,
    raw: &str,
) -> Result<(), TesseraError> {
    let mut session = open_session(config, None)?;
    let value = {
        let def = session
            .definitions()
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| TesseraError::UnknownFilter(id.to_string()))?;
        parse_value(def, raw)?
    };
    session.set_filter(id, value)?;
    print_state(&session, json_mode, false);
    Ok(())
}

/// Return one filter to its default.
pub fn cmd_reset(config: &AppConfig, json_mode: bool, id: &str) -> Result<(), TesseraError> {
    let mut session = open_session(config, None)?;
    session.reset_filter(id)?;
    print_state(&session, json_mode, false);
    Ok(())
}

/// Clear one bar, or every filter.
pub fn cmd_clear(
    config: &AppConfig,
    json_mode: bool,
    bar: Option<&str>,
) -> Result<(), TesseraError> {
    let mut session = open_session(config, None)?;
    match bar {
        Some(bar) => session.clear_bar(bar)?,
        None => session.clear_all(),
    }
    print_state(&session, json_mode, false);
    Ok(())
}

/// Print the query string for the active state.
pub fn cmd_encode(config: &AppConfig, json_mode: bool) -> Result<(), TesseraError> {
    let session = open_session(config, None)?;
    let query = session.query_string();

    if json_mode {
        let params: serde_json::Map<_, _> = session
            .state()
            .iter()
            .map(|(id, v)| (id.clone(), serde_json::Value::String(encode_value(v))))
            .collect();
        let output = serde_json::json!({ "query": query, "params": params });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("{}", query);
    }

    Ok(())
}

fn print_state(session: &DashboardSession, json_mode: bool, verbose: bool) {
    if json_mode {
        let output = serde_json::json!({
            "active": session.state(),
            "query": session.query_string(),
            "visible": session.visible().len(),
            "total": session.components().len(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return;
    }

    println!("Active Filters");
    println!("==============");
    if session.state().is_empty() {
        println!("  (none)");
    }
    for (id, value) in session.state().iter() {
        let kind = session
            .definitions()
            .iter()
            .find(|d| &d.id == id)
            .map_or("unknown", |d| d.kind.as_str());
        if verbose {
            println!("  {:<16} {:<12} {}", id, kind, encode_value(value));
        } else {
            println!("  {:<16} {}", id, encode_value(value));
        }
    }
    println!();
    println!("Query:   ?{}", session.query_string());
    println!(
        "Visible: {} / {}",
        session.visible().len(),
        session.components().len()
    );
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Parse a CLI value: JSON when it starts with `[`, otherwise the
/// query-string form for the filter's type.
pub fn parse_value(def: &FilterDefinition, raw: &str) -> Result<FilterValue, TesseraError> {
    if raw.trim_start().starts_with('[') {
        Ok(serde_json::from_str(raw)?)
    } else {
        Ok(decode_value(def, raw))
    }
}

/// Read and parse the configured dashboard file.
pub fn load_dashboard(config: &AppConfig) -> Result<DashboardConfig, TesseraError> {
    let path = config.dashboard.as_deref().ok_or_else(|| {
        TesseraError::ConfigError(
            "no dashboard file; pass --dashboard or set `dashboard` in tessera.toml".to_string(),
        )
    })?;
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_DASHBOARD_FILE_SIZE)?;

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| TesseraError::IoError(format!("Read dashboard: {}", e)))?;
    let dashboard = DashboardConfig::from_json(&raw)?;
    tracing::info!(
        path = %path.display(),
        components = dashboard.components.len(),
        bars = dashboard.filter_bars.len(),
        "dashboard loaded"
    );
    Ok(dashboard)
}

/// Open a hydrated session over the configured dashboard and storage.
///
/// `query` plays the role of the page URL: its parameters win over the
/// stored state but are not written back until the state changes.
pub fn open_session(
    config: &AppConfig,
    query: Option<&str>,
) -> Result<DashboardSession, TesseraError> {
    let dashboard = load_dashboard(config)?;
    let storage: Box<dyn PersistenceAdapter> = match config.storage.backend {
        StorageBackend::Redb => Box::new(RedbStorage::open(
            &config.storage.path,
            config.storage.key.clone(),
        )?),
        StorageBackend::Memory => Box::new(MemoryStorage::new()),
    };
    let url = MemoryQueryString::with_query(query.unwrap_or_default());

    let mut session = DashboardSession::new(
        dashboard,
        config.engine.resolver_options(),
        storage,
        Box::new(url),
    )
    .with_observer(Arc::new(TracingObserver));
    session.hydrate();
    Ok(session)
}

// =============================================================================
// TESTS
// =============================================================================

use clap::Parser;
use mimalloc::MiMalloc;
use regdiag::cli::{Cli, Command, NeonAction, ProbeTarget, TursoAction};
use regdiag::config::CONFIG;
use regdiag::db::neon::{self, RegistryDb};
use regdiag::db::turso::TursoClient;
use regdiag::error::DiagError;
use regdiag::probe::backend::BackendProbe;
use regdiag::probe::{self, ProbeResult};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug".to_string()
    } else {
        CONFIG.loglevel.clone()
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    if let Err(e) = run(cli.command).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), DiagError> {
    match command {
        Command::Serve => regdiag::server::serve().await,
        Command::Probe { target } => match target {
            ProbeTarget::Sites => probe_sites().await,
            ProbeTarget::Backend { base_url } => probe_backend(base_url).await,
        },
        Command::Turso { action } => {
            let client = TursoClient::from_config(&CONFIG)?;
            match action {
                TursoAction::Init => turso_init(&client).await,
                TursoAction::Tables => turso_tables(&client).await,
                TursoAction::Smoke => turso_smoke(&client).await,
            }
        }
        Command::Neon { action } => {
            let db = RegistryDb::connect(CONFIG.neon_url()?).await?;
            match action {
                NeonAction::Schema { table } => neon_schema(&db, &table).await,
                NeonAction::Migrate => neon_migrate(&db).await,
                NeonAction::Smoke => neon_smoke(&db).await,
            }
        }
    }
}

fn print_probe_result(result: &ProbeResult) {
    match (result.status_code, result.error.as_deref()) {
        (Some(status), _) => println!(
            "  OK    {status:<4} {:>9} bytes  {}",
            result.content_length, result.url
        ),
        (None, Some(error)) => println!("  FAIL  {}  ({error})", result.url),
        (None, None) => println!("  FAIL  {}", result.url),
    }
}

async fn probe_sites() -> Result<(), DiagError> {
    let client = probe::probe_client()?;

    println!("connectivity check from this host");
    println!("{:-<80}", "");
    let results = probe::probe_sites(&client).await;
    for result in &results {
        print_probe_result(result);
    }

    let reachable = results.iter().filter(|r| r.success).count();
    println!("{:-<80}", "");
    println!("{reachable}/{} sites reachable", results.len());
    if reachable < results.len() {
        println!("a blocked portal with healthy controls points at egress filtering");
    }
    Ok(())
}

async fn probe_backend(base_url: Option<Url>) -> Result<(), DiagError> {
    let base = base_url.unwrap_or_else(|| CONFIG.backend_url.clone());
    let client = probe::probe_client()?;
    let backend = BackendProbe::new(client, base);

    println!("backend smoke test against {}", backend.base());
    println!("{:-<80}", "");

    match backend.health().await {
        Ok(status) => println!("  /health -> {status}"),
        Err(e) => println!("  /health -> error: {e}"),
    }

    match backend.empresas_total().await {
        Ok((status, Some(total))) => {
            println!("  /api/empresas/ -> {status}, {total} empresas registered")
        }
        Ok((status, None)) => println!("  /api/empresas/ -> {status} (no body parsed)"),
        Err(e) => println!("  /api/empresas/ -> error: {e}"),
    }

    match backend.connection_diagnosis().await {
        Ok(diagnosis) => {
            println!("  /api/empresas/debug/connection -> {}", diagnosis.status);
            if let Some(conn_str) = &diagnosis.connection_string {
                println!("    connection string: {conn_str}");
            }
            if let Some(state) = diagnosis.state {
                println!("    {}", state.describe());
            }
            if let Some(error) = &diagnosis.error {
                println!("    backend error: {error}");
            }
        }
        Err(e) => println!("  /api/empresas/debug/connection -> error: {e}"),
    }
    Ok(())
}

async fn turso_init(client: &TursoClient) -> Result<(), DiagError> {
    client.init_schema().await?;
    println!("empresas table and indexes are in place");

    let tables = client.list_tables().await?;
    println!("tables now present: {}", tables.join(", "));
    Ok(())
}

async fn turso_tables(client: &TursoClient) -> Result<(), DiagError> {
    let tables = client.list_tables().await?;
    if tables.is_empty() {
        println!("no tables found; run `regdiag turso init` first");
        return Ok(());
    }
    for table in tables {
        println!("{table}");
    }
    Ok(())
}

async fn turso_smoke(client: &TursoClient) -> Result<(), DiagError> {
    let set = client.execute("SELECT 1 as test").await?;
    println!("SELECT 1 -> {} row(s)", set.rows.len());

    client.insert_probe_row().await?;
    println!("probe row inserted (OR IGNORE)");

    let total = client.count_empresas().await?;
    println!("empresas row count: {total}");
    Ok(())
}

async fn neon_schema(db: &RegistryDb, table: &str) -> Result<(), DiagError> {
    let columns = db.table_columns(table).await?;
    if columns.is_empty() {
        println!("table '{table}' not found");
        return Ok(());
    }

    println!("schema of table '{table}':");
    println!("{:-<80}", "");
    for col in columns {
        println!(
            "{:<25} {:<15} {:<10} {}",
            col.column_name,
            col.data_type,
            col.is_nullable,
            col.column_default.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn neon_migrate(db: &RegistryDb) -> Result<(), DiagError> {
    db.init_mef_cache().await?;
    println!("mef_cache table and index are in place");

    // Verify the table actually round-trips, then clean up after ourselves.
    let probe_payload = json!({ "probe": true });
    db.mef_cache_put(neon::PROBE_CUI, &probe_payload).await?;
    let entry = db
        .mef_cache_get(neon::PROBE_CUI)
        .await?
        .ok_or_else(|| DiagError::UnexpectedResponse("probe cache entry not found".to_string()))?;
    db.mef_cache_delete(neon::PROBE_CUI).await?;

    println!(
        "cache round trip verified (scraped at {})",
        entry.fecha_scraping.to_rfc3339()
    );
    Ok(())
}

async fn neon_smoke(db: &RegistryDb) -> Result<(), DiagError> {
    let ping = db.ping().await?;
    println!("SELECT 1 -> {ping}");

    let id = db.insert_probe_empresa().await?;
    println!("probe empresa inserted with id {id}");

    let total = db.count_empresas().await?;
    println!("empresas row count: {total}");

    let recent = db.list_empresas(5).await?;
    for empresa in &recent {
        println!(
            "  {:<11} {:<40} {}",
            empresa.ruc,
            empresa.razon_social,
            empresa.estado.as_deref().unwrap_or("-")
        );
    }

    let removed = db.delete_probe_empresa().await?;
    println!("probe empresa removed ({removed} row(s))");
    Ok(())
}

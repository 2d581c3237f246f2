//! SQL DDL for the registry tables.
//! Each backend gets the dialect it actually runs: SQLite DDL for Turso,
//! Postgres DDL for Neon.

/// Company registry table as deployed on Turso:
/// - `ruc` UNIQUE (the Peruvian taxpayer id is the natural business key)
/// - `estado` defaults to ACTIVO
/// - contact fields nullable, populated by the scraper when available
pub const TURSO_EMPRESAS_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS empresas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ruc VARCHAR(11) UNIQUE NOT NULL,
    razon_social VARCHAR(255) NOT NULL,
    direccion TEXT,
    telefono VARCHAR(20),
    email VARCHAR(100),
    representante_legal VARCHAR(255),
    dni_representante VARCHAR(8),
    estado VARCHAR(20) DEFAULT 'ACTIVO',
    fuente_datos VARCHAR(50),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_empresas_ruc ON empresas(ruc);

CREATE INDEX IF NOT EXISTS idx_empresas_razon_social ON empresas(razon_social);

CREATE INDEX IF NOT EXISTS idx_empresas_estado ON empresas(estado)
"#;

/// Cache of scraped MEF investment records, keyed by project CUI.
pub const NEON_MEF_CACHE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS mef_cache (
    cui VARCHAR(20) PRIMARY KEY,
    datos_mef JSONB NOT NULL,
    fecha_scraping TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
    ultima_actualizacion TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_mef_cache_fecha ON mef_cache(fecha_scraping DESC)
"#;

/// Split a DDL blob into single statements (the drivers execute one
/// statement per call).
pub fn statements(ddl: &str) -> impl Iterator<Item = &str> {
    ddl.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empresas_ddl_splits_into_table_plus_indexes() {
        let stmts: Vec<&str> = statements(TURSO_EMPRESAS_INIT).collect();
        assert_eq!(stmts.len(), 4);
        assert!(stmts[0].starts_with("CREATE TABLE IF NOT EXISTS empresas"));
        assert!(stmts[1..].iter().all(|s| s.starts_with("CREATE INDEX")));
    }

    #[test]
    fn mef_cache_ddl_splits_into_table_plus_index() {
        let stmts: Vec<&str> = statements(NEON_MEF_CACHE_INIT).collect();
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("mef_cache"));
        assert!(stmts[1].contains("fecha_scraping DESC"));
    }
}

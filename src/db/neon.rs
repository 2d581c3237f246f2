use crate::db::models::{ColumnInfo, Empresa, MefCacheEntry};
use crate::db::schema::{self, NEON_MEF_CACHE_INIT};
use crate::error::DiagError;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Pool, Postgres, Row};

pub type PgPool = Pool<Postgres>;

/// Fixed identity of the throwaway row used by the insert/delete check.
pub const PROBE_CODIGO: &str = "TEST001";
pub const PROBE_RUC: &str = "99999999999";
pub const PROBE_RAZON_SOCIAL: &str = "EMPRESA DE PRUEBA";

/// Probe CUI used to verify the mef_cache round trip after migration.
pub const PROBE_CUI: &str = "0000000";

#[derive(Clone)]
pub struct RegistryDb {
    pool: PgPool,
}

impl RegistryDb {
    /// Connect to the managed Postgres service. Neon enforces TLS; the
    /// `sslmode` query parameter in the connection string is honored.
    pub async fn connect(url: &str) -> Result<Self, DiagError> {
        let pool = PgPoolOptions::new().max_connections(2).connect(url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<i32, DiagError> {
        let rec: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(rec.0)
    }

    /// Column layout of a table, in ordinal order.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DiagError> {
        let rows = sqlx::query(
            r#"SELECT column_name, data_type, is_nullable, column_default
               FROM information_schema.columns
               WHERE table_name = $1
               ORDER BY ordinal_position"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_column).collect()
    }

    /// Insert the fixed probe row and return its generated id.
    pub async fn insert_probe_empresa(&self) -> Result<String, DiagError> {
        let rec: (String,) = sqlx::query_as(
            "INSERT INTO empresas (codigo, ruc, razon_social) VALUES ($1, $2, $3) RETURNING id::text",
        )
        .bind(PROBE_CODIGO)
        .bind(PROBE_RUC)
        .bind(PROBE_RAZON_SOCIAL)
        .fetch_one(&self.pool)
        .await?;
        Ok(rec.0)
    }

    /// Remove the probe row again. Returns the number of rows deleted.
    pub async fn delete_probe_empresa(&self) -> Result<u64, DiagError> {
        let done = sqlx::query("DELETE FROM empresas WHERE ruc = $1")
            .bind(PROBE_RUC)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn count_empresas(&self) -> Result<i64, DiagError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM empresas")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn list_empresas(&self, limit: i64) -> Result<Vec<Empresa>, DiagError> {
        let rows = sqlx::query(
            r#"SELECT id::text AS id, codigo, ruc, razon_social, estado,
                      created_at::timestamptz AS created_at
               FROM empresas
               ORDER BY created_at DESC NULLS LAST
               LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_empresa).collect()
    }

    /// Create the MEF cache table and its freshness index.
    pub async fn init_mef_cache(&self) -> Result<(), DiagError> {
        for stmt in schema::statements(NEON_MEF_CACHE_INIT) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Upsert a scraped MEF record; an existing entry keeps its original
    /// `fecha_scraping` and refreshes `ultima_actualizacion`.
    pub async fn mef_cache_put(
        &self,
        cui: &str,
        datos: &serde_json::Value,
    ) -> Result<(), DiagError> {
        let payload = serde_json::to_string(datos)?;
        sqlx::query(
            r#"INSERT INTO mef_cache (cui, datos_mef) VALUES ($1, $2::jsonb)
               ON CONFLICT (cui) DO UPDATE SET
                   datos_mef = excluded.datos_mef,
                   ultima_actualizacion = NOW()"#,
        )
        .bind(cui)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mef_cache_get(&self, cui: &str) -> Result<Option<MefCacheEntry>, DiagError> {
        let row = sqlx::query(
            r#"SELECT cui, datos_mef::text AS datos_mef, fecha_scraping, ultima_actualizacion
               FROM mef_cache WHERE cui = $1"#,
        )
        .bind(cui)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_cache_entry).transpose()
    }

    pub async fn mef_cache_delete(&self, cui: &str) -> Result<u64, DiagError> {
        let done = sqlx::query("DELETE FROM mef_cache WHERE cui = $1")
            .bind(cui)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    fn row_to_column(row: PgRow) -> Result<ColumnInfo, DiagError> {
        Ok(ColumnInfo {
            column_name: row.try_get("column_name")?,
            data_type: row.try_get("data_type")?,
            is_nullable: row.try_get("is_nullable")?,
            column_default: row.try_get("column_default")?,
        })
    }

    fn row_to_empresa(row: PgRow) -> Result<Empresa, DiagError> {
        let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;
        Ok(Empresa {
            id: row.try_get("id")?,
            codigo: row.try_get("codigo")?,
            ruc: row.try_get("ruc")?,
            razon_social: row.try_get("razon_social")?,
            estado: row.try_get("estado")?,
            created_at,
        })
    }

    fn row_to_cache_entry(row: PgRow) -> Result<MefCacheEntry, DiagError> {
        let datos_json: String = row.try_get("datos_mef")?;
        let datos_mef =
            serde_json::from_str(&datos_json).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(MefCacheEntry {
            cui: row.try_get("cui")?,
            datos_mef,
            fecha_scraping: row.try_get("fecha_scraping")?,
            ultima_actualizacion: row.try_get("ultima_actualizacion")?,
        })
    }
}

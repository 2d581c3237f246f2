use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Company row as stored in the registry. `id` travels as text: the Neon
/// deployment uses UUID keys while Turso uses rowids, and the diagnostics
/// never do arithmetic on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Empresa {
    pub id: String,
    pub codigo: Option<String>,
    pub ruc: String,
    pub razon_social: String,
    pub estado: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One row of `information_schema.columns`, as the schema checker prints it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MefCacheEntry {
    pub cui: String,
    pub datos_mef: serde_json::Value,
    pub fecha_scraping: DateTime<Utc>,
    pub ultima_actualizacion: DateTime<Utc>,
}

//! LanceDB connection helpers.

use anyhow::Result;
use lancedb::{connect, Connection};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Open a table, or `None` when the database does not contain it.
pub async fn open_table_if_exists(conn: &Connection, name: &str) -> Result<Option<lancedb::Table>> {
    if !has_table(conn, name).await? {
        return Ok(None);
    }
    Ok(Some(conn.open_table(name).execute().await?))
}

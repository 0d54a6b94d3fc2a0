use color_eyre::{eyre::OptionExt, Result};
use libsql::params::IntoParams;
use serde::de::DeserializeOwned;

/// Run a query and deserialize every row into `T` via `libsql::de::from_row`.
pub async fn fetch_all<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Vec<T>> {
    let mut rows = conn.query(sql, params).await?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().await? {
        results.push(libsql::de::from_row::<T>(&row)?);
    }
    Ok(results)
}

/// Deserialize the first row into `T`, erroring when the query returns none.
pub async fn fetch_one<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<T> {
    fetch_optional(conn, sql, params)
        .await?
        .ok_or_eyre("expected a row but got none")
}

/// Deserialize the first row into `T`, or `None` when the query returns none.
pub async fn fetch_optional<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Option<T>> {
    match conn.query(sql, params).await?.next().await? {
        Some(row) => Ok(Some(libsql::de::from_row::<T>(&row)?)),
        None => Ok(None),
    }
}

/// Fetch a single integer, for COUNT/SUM/EXISTS-style queries.
pub async fn fetch_scalar(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<i64> {
    let value = conn
        .query(sql, params)
        .await?
        .next()
        .await?
        .ok_or_eyre("expected a scalar row but got none")?
        .get::<i64>(0)?;
    Ok(value)
}

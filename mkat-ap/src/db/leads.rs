//! `leads` and `autopilot_lead_inbox` queries

use mkat_common::db::Lead;
use mkat_common::Result;
use sqlx::SqliteConnection;

/// Leads created at or after `since`
pub async fn leads_created_since(
    conn: &mut SqliteConnection,
    user_id: &str,
    since: &str,
) -> Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, user_id, name, email, source, created_at
        FROM leads
        WHERE user_id = ? AND created_at >= ?
        ORDER BY created_at
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(&mut *conn)
    .await?;

    Ok(leads)
}

/// Insert an inbox entry unless the (user, lead) pair already exists
///
/// Returns `true` when a row was written. Uniqueness is enforced by
/// `idx_lead_inbox_user_lead`, so concurrent callers cannot both insert.
pub async fn insert_inbox_entry(
    conn: &mut SqliteConnection,
    entry_id: &str,
    user_id: &str,
    lead_id: &str,
    now: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO autopilot_lead_inbox (id, user_id, lead_id, status, created_at)
        VALUES (?, ?, ?, 'new', ?)
        ON CONFLICT(user_id, lead_id) DO NOTHING
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .bind(lead_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

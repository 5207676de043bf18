//! `campaign_tasks` queries

use mkat_common::db::CampaignTask;
use mkat_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn insert_task(conn: &mut SqliteConnection, task: &CampaignTask, now: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO campaign_tasks (
            id, campaign_id, user_id, title, description, status, due_date, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.campaign_id)
    .bind(&task.user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.status)
    .bind(&task.due_date)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Tasks of a campaign ordered by due date
pub async fn tasks_for_campaign(pool: &SqlitePool, campaign_id: &str) -> Result<Vec<CampaignTask>> {
    let tasks = sqlx::query_as::<_, CampaignTask>(
        r#"
        SELECT id, campaign_id, user_id, title, description, status, due_date
        FROM campaign_tasks
        WHERE campaign_id = ?
        ORDER BY due_date
        "#,
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}

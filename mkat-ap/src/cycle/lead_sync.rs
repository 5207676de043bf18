//! Lead inbox synchronization
//!
//! Copies the user's leads from the last week into the autopilot inbox.
//! Duplicates are rejected by the inbox's unique (user_id, lead_id) index,
//! so repeated or overlapping runs never double-insert.

use chrono::{DateTime, Utc};
use mkat_common::{time, uuid_utils, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::activity::{log_activity, Activity};
use crate::db::leads;

/// How far back new leads are picked up
pub const LEAD_LOOKBACK_DAYS: i64 = 7;

pub struct LeadInboxSync {
    db: SqlitePool,
}

impl LeadInboxSync {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Returns the number of inbox entries added
    pub async fn sync_user(&self, user_id: &str, now: DateTime<Utc>) -> Result<usize> {
        let since = time::days_before(now, LEAD_LOOKBACK_DAYS);
        let now_str = time::to_db_string(now);

        let mut tx = self.db.begin().await?;

        let recent = leads::leads_created_since(&mut tx, user_id, &since).await?;
        let mut added = Vec::new();

        for lead in &recent {
            let inserted = leads::insert_inbox_entry(
                &mut tx,
                &uuid_utils::generate_string(),
                user_id,
                &lead.id,
                &now_str,
            )
            .await?;

            if inserted {
                added.push(lead.id.clone());
            }
        }

        if !added.is_empty() {
            log_activity(
                &mut tx,
                &uuid_utils::generate_string(),
                user_id,
                &Activity::LeadsSynced {
                    count: added.len(),
                    lead_ids: added.clone(),
                },
                &now_str,
            )
            .await?;
        }

        tx.commit().await?;

        if added.is_empty() {
            debug!(user_id = %user_id, recent_leads = recent.len(), "Lead inbox already up to date");
        } else {
            info!(user_id = %user_id, added = added.len(), "Synced leads into autopilot inbox");
        }

        Ok(added.len())
    }
}

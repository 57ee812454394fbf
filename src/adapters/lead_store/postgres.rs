//! PostgreSQL implementation of LeadStore.
//!
//! Persists captured leads to PostgreSQL, one row per lead with the
//! conversation snapshot as JSONB.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::LeadId;
use crate::domain::lead::Lead;
use crate::domain::session::DealKind;
use crate::ports::{LeadStore, LeadStoreError};

/// PostgreSQL implementation of LeadStore.
#[derive(Clone)]
pub struct PostgresLeadStore {
    pool: PgPool,
}

impl PostgresLeadStore {
    /// Creates a new PostgresLeadStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PostgresLeadStore {
    async fn persist(&self, lead: &Lead) -> Result<LeadId, LeadStoreError> {
        let conversation = serde_json::to_value(lead.conversation_snapshot())
            .map_err(|e| LeadStoreError::rejected(format!("Failed to encode conversation: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO leads (
                id, buyer_id, listing_id, listing_title,
                client_name, client_address, client_phone, client_email, client_whatsapp,
                deal_kind, conversation, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(lead.id().as_uuid())
        .bind(lead.session_key().buyer().as_str())
        .bind(lead.listing().id().as_str())
        .bind(lead.listing().title())
        .bind(lead.contact().name())
        .bind(lead.contact().address())
        .bind(lead.contact().phone())
        .bind(lead.contact().email())
        .bind(lead.contact().whatsapp())
        .bind(deal_kind_to_str(lead.deal_kind()))
        .bind(conversation)
        .bind(lead.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(lead.id())
    }
}

/// Maps a sqlx failure onto the store's error split.
///
/// Constraint violations (SQLSTATE class 23) are rejections a retry will
/// not fix; everything else is treated as the store being unavailable.
fn map_sqlx_error(err: sqlx::Error) -> LeadStoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if code.starts_with("23") {
                return LeadStoreError::rejected(format!("Constraint violation: {}", db_err));
            }
        }
    }
    LeadStoreError::unavailable(format!("Failed to insert lead: {}", err))
}

// === Helper Functions ===

fn deal_kind_to_str(kind: DealKind) -> &'static str {
    match kind {
        DealKind::Viewing => "viewing",
        DealKind::Rental => "rental",
        DealKind::Purchase => "purchase",
    }
}

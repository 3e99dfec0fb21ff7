//! PostgreSQL implementation of NotificationRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::db_error;
use crate::domain::foundation::{
    CaseId, DomainError, ErrorCode, NotificationId, SessionId, Timestamp, UserId,
};
use crate::domain::notification::Notification;
use crate::ports::NotificationRepository;

/// PostgreSQL implementation of NotificationRepository.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a new PostgresNotificationRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn save(&self, notification: &Notification) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient, case_id, session_id, details, is_read,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id().as_uuid())
        .bind(notification.recipient().as_str())
        .bind(notification.case_id().as_uuid())
        .bind(notification.session_id().as_uuid())
        .bind(notification.details())
        .bind(notification.is_read())
        .bind(notification.created_at().as_datetime())
        .bind(notification.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert notification", e))?;

        Ok(())
    }

    async fn update(&self, notification: &Notification) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(notification.id().as_uuid())
        .bind(notification.is_read())
        .bind(notification.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update notification", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NotificationNotFound,
                format!("Notification not found: {}", notification.id()),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError> {
        let row = sqlx::query("SELECT * FROM notifications WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch notification", e))?;

        row.map(row_to_notification).transpose()
    }

    async fn find_unread_by_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM notifications
            WHERE recipient = $1 AND is_read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch unread notifications", e))?;

        rows.into_iter().map(row_to_notification).collect()
    }
}

fn row_to_notification(row: sqlx::postgres::PgRow) -> Result<Notification, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(|e| db_error("get id", e))?;
    let recipient: String = row
        .try_get("recipient")
        .map_err(|e| db_error("get recipient", e))?;
    let case_id: uuid::Uuid = row
        .try_get("case_id")
        .map_err(|e| db_error("get case_id", e))?;
    let session_id: uuid::Uuid = row
        .try_get("session_id")
        .map_err(|e| db_error("get session_id", e))?;
    let details: String = row
        .try_get("details")
        .map_err(|e| db_error("get details", e))?;
    let is_read: bool = row
        .try_get("is_read")
        .map_err(|e| db_error("get is_read", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| db_error("get created_at", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| db_error("get updated_at", e))?;

    Ok(Notification::reconstitute(
        NotificationId::from_uuid(id),
        UserId::new(recipient).map_err(|e| db_error("decode recipient", e))?,
        CaseId::from_uuid(case_id),
        SessionId::from_uuid(session_id),
        details,
        is_read,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

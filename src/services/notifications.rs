//! notifications.rs
//!
//! Рассылка уведомлений студентам. Вариант выбирается один раз при старте:
//! `Enabled` пишет уведомления в хранилище, `Disabled` только логирует.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewNotification, Notification, NotificationKind, Student};
use crate::repository::NotificationStore;

pub const SEATING_RELEASED_TITLE: &str = "Seating Arrangement Released";

// Сколько последних уведомлений отдаём во входящих
pub const INBOX_LIMIT: i64 = 10;

#[derive(Clone)]
pub enum NotificationSink {
    Enabled(Arc<dyn NotificationStore>),
    Disabled,
}

impl NotificationSink {
    /// Записывает пачку уведомлений, возвращает сколько реально записано.
    pub async fn dispatch(&self, batch: Vec<NewNotification>) -> AppResult<usize> {
        match self {
            NotificationSink::Enabled(store) => {
                if batch.is_empty() {
                    return Ok(0);
                }
                store.insert_many(&batch).await
            }
            NotificationSink::Disabled => {
                info!("Notifications disabled, dropping {} notifications", batch.len());
                Ok(0)
            }
        }
    }

    pub async fn inbox(&self, recipient: Uuid) -> AppResult<Vec<Notification>> {
        match self {
            NotificationSink::Enabled(store) => store.list_for_recipient(recipient, INBOX_LIMIT).await,
            NotificationSink::Disabled => Ok(Vec::new()),
        }
    }

    pub async fn mark_read(&self, id: Uuid, recipient: Uuid) -> AppResult<bool> {
        match self {
            NotificationSink::Enabled(store) => store.mark_read(id, recipient).await,
            NotificationSink::Disabled => Ok(false),
        }
    }
}

/// По одному уведомлению "рассадка опубликована" на каждого студента.
pub fn seating_released(students: &[Student], message: &str, link: &str) -> Vec<NewNotification> {
    students
        .iter()
        .map(|student| NewNotification {
            recipient: student.id,
            title: SEATING_RELEASED_TITLE.to_string(),
            message: message.to_string(),
            kind: NotificationKind::Seating,
            link: Some(link.to_string()),
        })
        .collect()
}

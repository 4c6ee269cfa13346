//! Хранилища, которыми пользуется сервис рассадки.
//!
//! Трейты отделяют бизнес-логику от Postgres; реализации поверх `sqlx` лежат в
//! [`postgres`].

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewNotification, Notification, PlanStatus, SeatingPlan, Student};

#[async_trait]
pub trait SeatingRepository: Send + Sync {
    async fn insert(&self, plan: &SeatingPlan) -> AppResult<()>;

    async fn find(&self, id: Uuid) -> AppResult<Option<SeatingPlan>>;

    /// Планы `pending` по секциям кафедры, новые первыми.
    async fn list_pending_for_department(&self, department: Uuid) -> AppResult<Vec<SeatingPlan>>;

    /// Планы, созданные преподавателем, новые первыми.
    async fn list_by_faculty(&self, faculty: Uuid) -> AppResult<Vec<SeatingPlan>>;

    /// Одобренные планы секции, самые поздние экзамены первыми.
    async fn list_approved_for_section(&self, section: Uuid) -> AppResult<Vec<SeatingPlan>>;

    /// Атомарно переводит план из `pending` в `status`.
    ///
    /// `None`, если на момент записи план уже не `pending` (или удалён).
    async fn decide(
        &self,
        id: Uuid,
        status: PlanStatus,
        remarks: Option<String>,
    ) -> AppResult<Option<SeatingPlan>>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Активные студенты секции, по имени.
    async fn list_active_students(&self, section: Uuid) -> AppResult<Vec<Student>>;

    /// Кафедра секции, `None` если секции нет.
    async fn section_department(&self, section: Uuid) -> AppResult<Option<Uuid>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_many(&self, batch: &[NewNotification]) -> AppResult<usize>;

    async fn list_for_recipient(&self, recipient: Uuid, limit: i64) -> AppResult<Vec<Notification>>;

    async fn mark_read(&self, id: Uuid, recipient: Uuid) -> AppResult<bool>;
}

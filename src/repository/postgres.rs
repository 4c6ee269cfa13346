use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    NewNotification, Notification, PlanStatus, RoomAssignment, SeatingPlan, Student,
};
use crate::repository::{NotificationStore, RosterProvider, SeatingRepository};

const PLAN_COLUMNS: &str = "id, faculty_id, section_id, exam_name, room_assignments, status, \
                            hod_remarks, exam_date, exam_time, created_at, updated_at";

// Лимит параметров Postgres 65535, на уведомление уходит 6
const NOTIFICATION_CHUNK: usize = 1000;

// Строка seating_plans как она лежит в БД
#[derive(FromRow)]
struct SeatingPlanRow {
    id: Uuid,
    faculty_id: Uuid,
    section_id: Uuid,
    exam_name: String,
    room_assignments: Json<Vec<RoomAssignment>>,
    status: String,
    hod_remarks: Option<String>,
    exam_date: NaiveDate,
    exam_time: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeatingPlanRow> for SeatingPlan {
    type Error = AppError;

    fn try_from(row: SeatingPlanRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<PlanStatus>().map_err(AppError::Internal)?;
        Ok(SeatingPlan {
            id: row.id,
            faculty: row.faculty_id,
            section: row.section_id,
            exam_name: row.exam_name,
            room_assignments: row.room_assignments.0,
            status,
            hod_remarks: row.hod_remarks,
            date: row.exam_date,
            time: row.exam_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_plans(rows: Vec<SeatingPlanRow>) -> AppResult<Vec<SeatingPlan>> {
    rows.into_iter().map(SeatingPlan::try_from).collect()
}

#[derive(Clone)]
pub struct PgSeatingRepository {
    pool: PgPool,
}

impl PgSeatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatingRepository for PgSeatingRepository {
    async fn insert(&self, plan: &SeatingPlan) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO seating_plans
            (id, faculty_id, section_id, exam_name, room_assignments, status,
             hod_remarks, exam_date, exam_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        )
        .bind(plan.id)
        .bind(plan.faculty)
        .bind(plan.section)
        .bind(&plan.exam_name)
        .bind(Json(plan.room_assignments.clone()))
        .bind(plan.status.as_str())
        .bind(&plan.hod_remarks)
        .bind(plan.date)
        .bind(&plan.time)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<SeatingPlan>> {
        let row = sqlx::query_as::<_, SeatingPlanRow>(&format!(
            "SELECT {} FROM seating_plans WHERE id = $1",
            PLAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SeatingPlan::try_from).transpose()
    }

    async fn list_pending_for_department(&self, department: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let rows = sqlx::query_as::<_, SeatingPlanRow>(
            r#"
            SELECT p.id, p.faculty_id, p.section_id, p.exam_name, p.room_assignments, p.status,
                   p.hod_remarks, p.exam_date, p.exam_time, p.created_at, p.updated_at
            FROM seating_plans p
            JOIN sections s ON s.id = p.section_id
            WHERE p.status = 'pending' AND s.department_id = $1
            ORDER BY p.created_at DESC
            "#
        )
        .bind(department)
        .fetch_all(&self.pool)
        .await?;

        into_plans(rows)
    }

    async fn list_by_faculty(&self, faculty: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let rows = sqlx::query_as::<_, SeatingPlanRow>(&format!(
            "SELECT {} FROM seating_plans WHERE faculty_id = $1 ORDER BY created_at DESC",
            PLAN_COLUMNS
        ))
        .bind(faculty)
        .fetch_all(&self.pool)
        .await?;

        into_plans(rows)
    }

    async fn list_approved_for_section(&self, section: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let rows = sqlx::query_as::<_, SeatingPlanRow>(&format!(
            "SELECT {} FROM seating_plans
             WHERE section_id = $1 AND status = 'approved'
             ORDER BY exam_date DESC",
            PLAN_COLUMNS
        ))
        .bind(section)
        .fetch_all(&self.pool)
        .await?;

        into_plans(rows)
    }

    async fn decide(
        &self,
        id: Uuid,
        status: PlanStatus,
        remarks: Option<String>,
    ) -> AppResult<Option<SeatingPlan>> {
        // Условие status = 'pending' в самом UPDATE: из двух гонящихся решений пройдёт одно
        let row = sqlx::query_as::<_, SeatingPlanRow>(&format!(
            "UPDATE seating_plans
             SET status = $2, hod_remarks = $3, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {}",
            PLAN_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(remarks)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SeatingPlan::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM seating_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgRosterProvider {
    pool: PgPool,
}

impl PgRosterProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterProvider for PgRosterProvider {
    async fn list_active_students(&self, section: Uuid) -> AppResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, enrollment_number
            FROM users
            WHERE section_id = $1 AND role = 'student' AND is_active = true
            ORDER BY name
            "#
        )
        .bind(section)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    async fn section_department(&self, section: Uuid) -> AppResult<Option<Uuid>> {
        let department = sqlx::query_scalar::<_, Uuid>(
            "SELECT department_id FROM sections WHERE id = $1 AND is_active = true"
        )
        .bind(section)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }
}

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert_many(&self, batch: &[NewNotification]) -> AppResult<usize> {
        let mut inserted = 0usize;

        for chunk in batch.chunks(NOTIFICATION_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO notifications (id, recipient_id, title, message, kind, link) ",
            );
            qb.push_values(chunk, |mut b, n| {
                b.push_bind(Uuid::new_v4())
                    .push_bind(n.recipient)
                    .push_bind(n.title.clone())
                    .push_bind(n.message.clone())
                    .push_bind(n.kind.as_str())
                    .push_bind(n.link.clone());
            });

            let result = qb.build().execute(&self.pool).await?;
            inserted += result.rows_affected() as usize;
        }

        Ok(inserted)
    }

    async fn list_for_recipient(&self, recipient: Uuid, limit: i64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id AS recipient, title, message, kind, link, is_read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(recipient)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_read(&self, id: Uuid, recipient: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND recipient_id = $2"
        )
        .bind(id)
        .bind(recipient)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

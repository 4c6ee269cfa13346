//! seating.rs
//!
//! Жизненный цикл плана рассадки:
//! 1.  **generate**: список группы + аудитории -> preview (ничего не сохраняется).
//! 2.  **submit**: преподаватель отправляет preview, план сохраняется как `pending`.
//! 3.  **decide**: HOD кафедры переводит план в `approved` или `rejected` ровно один раз.
//!     При одобрении студентам секции уходит уведомление (best-effort).
//! 4.  **my_seating**: студент видит своё место во всех одобренных планах секции.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::PlanCache,
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{PlanStatus, RoomSpec, SeatingDetails, SeatingDraft, SeatingPlan},
    repository::{RosterProvider, SeatingRepository},
    services::{allocator, locator, notifications::{self, NotificationSink}},
};

// --- Request/Response структуры ---

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub section_id: Uuid,
    #[validate(length(min = 1, message = "Please provide an exam name or title"))]
    pub exam_name: String,
    #[validate(nested)]
    #[serde(default)]
    pub rooms: Vec<RoomSpec>,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "exam time is required"))]
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub status: PlanStatus,
    #[serde(default)]
    pub hod_remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotifyOutcome {
    /// Сколько студентов в секции
    pub recipients: usize,
    /// Сколько уведомлений реально записано
    pub dispatched: usize,
}

#[derive(Clone)]
pub struct SeatingService {
    plans: Arc<dyn SeatingRepository>,
    roster: Arc<dyn RosterProvider>,
    sink: NotificationSink,
    cache: Option<Arc<dyn PlanCache>>,
    notification_link: String,
}

impl SeatingService {
    pub fn new(
        plans: Arc<dyn SeatingRepository>,
        roster: Arc<dyn RosterProvider>,
        sink: NotificationSink,
        cache: Option<Arc<dyn PlanCache>>,
        notification_link: impl Into<String>,
    ) -> Self {
        Self {
            plans,
            roster,
            sink,
            cache,
            notification_link: notification_link.into(),
        }
    }

    pub fn sink(&self) -> &NotificationSink {
        &self.sink
    }

    /// Генерирует preview рассадки. В хранилище ничего не пишется.
    pub async fn generate(&self, actor: &AuthUser, req: GenerateRequest) -> AppResult<SeatingDraft> {
        req.validate()?;
        if req.exam_name.trim().is_empty() {
            return Err(AppError::Validation("Please provide an exam name or title".to_string()));
        }

        let students = self.roster.list_active_students(req.section_id).await?;
        if students.is_empty() {
            return Err(AppError::Validation("No active students found in this section".to_string()));
        }

        // ThreadRng не Send, поэтому живёт только внутри этого блока
        let room_assignments = {
            let mut rng = rand::rng();
            allocator::allocate(&students, &req.rooms, &mut rng)
        }
        .map_err(|e| {
            info!(
                "Seating preview for section {} rejected: {} (capacity {})",
                req.section_id,
                e,
                allocator::total_capacity(&req.rooms)
            );
            AppError::from(e)
        })?;

        info!(
            "Generated seating preview for section {} by {}: {} students in {} rooms",
            req.section_id,
            actor.user_id,
            students.len(),
            room_assignments.len()
        );

        Ok(SeatingDraft {
            faculty: Some(actor.user_id),
            section: req.section_id,
            exam_name: req.exam_name,
            room_assignments,
            date: req.date,
            time: req.time,
        })
    }

    /// Сохраняет план как `pending`. Владельцем становится отправитель.
    pub async fn submit(&self, actor: &AuthUser, draft: SeatingDraft) -> AppResult<SeatingPlan> {
        check_draft_shape(&draft)?;

        if self.roster.section_department(draft.section).await?.is_none() {
            return Err(AppError::NotFound("Section not found".to_string()));
        }

        let plan = SeatingPlan::from_draft(draft, actor.user_id);
        self.plans.insert(&plan).await?;

        info!(
            "Seating plan {} submitted by {} for section {} ({} seated)",
            plan.id,
            actor.user_id,
            plan.section,
            plan.seated_count()
        );
        Ok(plan)
    }

    /// Планы на согласовании по кафедре HOD.
    pub async fn pending_for(&self, actor: &AuthUser) -> AppResult<Vec<SeatingPlan>> {
        let department = actor
            .department
            .ok_or_else(|| AppError::Forbidden("HOD is not assigned to a department".to_string()))?;
        self.plans.list_pending_for_department(department).await
    }

    /// Планы, созданные пользователем.
    pub async fn history(&self, actor: &AuthUser) -> AppResult<Vec<SeatingPlan>> {
        self.plans.list_by_faculty(actor.user_id).await
    }

    /// Решение HOD по плану. Допустим только переход из `pending`.
    pub async fn decide(
        &self,
        plan_id: Uuid,
        decision: PlanStatus,
        remarks: Option<String>,
        actor: &AuthUser,
    ) -> AppResult<SeatingPlan> {
        if !decision.is_terminal() {
            return Err(AppError::Validation("status must be approved or rejected".to_string()));
        }

        let plan = self
            .plans
            .find(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

        let department = self.roster.section_department(plan.section).await?;
        if !actor.is_hod_of(department) {
            return Err(AppError::Forbidden(
                "Not authorized to decide plans outside your department".to_string(),
            ));
        }

        if plan.status.is_terminal() {
            return Err(already_decided(plan.status));
        }

        // Повторная проверка статуса происходит в самом UPDATE
        let updated = match self.plans.decide(plan_id, decision, remarks).await? {
            Some(updated) => updated,
            None => {
                let current = self.plans.find(plan_id).await?;
                return Err(match current {
                    Some(p) => already_decided(p.status),
                    None => AppError::NotFound("Plan not found".to_string()),
                });
            }
        };

        info!(
            "Seating plan {} {} by HOD {}",
            updated.id, updated.status, actor.user_id
        );
        self.invalidate(updated.section).await;

        if updated.status == PlanStatus::Approved {
            let message = format!("Seating plan for {} is now available.", updated.exam_name);
            // Ошибка рассылки не откатывает решение
            if let Err(e) = self.fan_out(&updated, &message).await {
                warn!("Seating plan {} approved but notification fan-out failed: {:?}", updated.id, e);
            }
        }

        Ok(updated)
    }

    /// Повторная рассылка уведомлений. Статус плана не меняется и не проверяется.
    pub async fn notify(&self, plan_id: Uuid, actor: &AuthUser) -> AppResult<NotifyOutcome> {
        let plan = self
            .plans
            .find(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Seating plan not found".to_string()))?;

        if plan.faculty != actor.user_id {
            let department = self.roster.section_department(plan.section).await?;
            if !actor.is_hod_of(department) {
                return Err(AppError::Forbidden("Not authorized to notify for this plan".to_string()));
            }
        }

        let message = format!("Seating plan for {} ({}) is now available.", plan.exam_name, plan.time);
        match self.fan_out(&plan, &message).await {
            Ok(outcome) => Ok(outcome),
            Err(FanOutError::Roster(e)) => Err(e),
            Err(FanOutError::Dispatch { recipients, source }) => {
                warn!("Notification dispatch for plan {} failed: {:?}", plan.id, source);
                Ok(NotifyOutcome { recipients, dispatched: 0 })
            }
        }
    }

    /// Удаление плана. Только владелец, статус не важен.
    pub async fn delete(&self, plan_id: Uuid, actor: &AuthUser) -> AppResult<()> {
        let plan = self
            .plans
            .find(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Seating plan not found".to_string()))?;

        if plan.faculty != actor.user_id {
            return Err(AppError::Forbidden("Not authorized to delete this plan".to_string()));
        }

        if !self.plans.delete(plan_id).await? {
            return Err(AppError::NotFound("Seating plan not found".to_string()));
        }

        info!("Seating plan {} deleted by {}", plan_id, actor.user_id);
        self.invalidate(plan.section).await;
        Ok(())
    }

    /// Места студента во всех одобренных планах его секции.
    pub async fn my_seating(&self, actor: &AuthUser) -> AppResult<Vec<SeatingDetails>> {
        let Some(section) = actor.section else {
            return Ok(Vec::new());
        };

        let plans = self.approved_plans(section).await?;
        Ok(locator::locate_all(&plans, actor.user_id))
    }

    // === Внутреннее ===

    async fn approved_plans(&self, section: Uuid) -> AppResult<Vec<SeatingPlan>> {
        let Some(cache) = &self.cache else {
            return self.plans.list_approved_for_section(section).await;
        };

        // Поколение читается до БД: если решение успеет между ними,
        // запись ниже уйдёт под устаревший ключ
        let generation = match cache.generation(section).await {
            Ok(generation) => generation,
            Err(e) => {
                warn!("Seating cache unavailable for section {}: {:?}", section, e);
                return self.plans.list_approved_for_section(section).await;
            }
        };

        match cache.get_approved(section, generation).await {
            Ok(Some(plans)) => return Ok(plans),
            Ok(None) => {}
            Err(e) => warn!("Seating cache read failed for section {}: {:?}", section, e),
        }

        let plans = self.plans.list_approved_for_section(section).await?;

        if let Err(e) = cache.put_approved(section, generation, &plans).await {
            warn!("Seating cache write failed for section {}: {:?}", section, e);
        }
        Ok(plans)
    }

    async fn invalidate(&self, section: Uuid) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_section(section).await {
                warn!("Failed to invalidate seating cache for section {}: {:?}", section, e);
            }
        }
    }

    async fn fan_out(&self, plan: &SeatingPlan, message: &str) -> Result<NotifyOutcome, FanOutError> {
        let students = self
            .roster
            .list_active_students(plan.section)
            .await
            .map_err(FanOutError::Roster)?;

        let recipients = students.len();
        let batch = notifications::seating_released(&students, message, &self.notification_link);
        let dispatched = self
            .sink
            .dispatch(batch)
            .await
            .map_err(|source| FanOutError::Dispatch { recipients, source })?;

        info!(
            "Seating plan {}: {} notifications dispatched to {} students",
            plan.id, dispatched, recipients
        );
        Ok(NotifyOutcome { recipients, dispatched })
    }
}

#[derive(Debug)]
enum FanOutError {
    Roster(AppError),
    Dispatch { recipients: usize, source: AppError },
}

fn already_decided(status: PlanStatus) -> AppError {
    AppError::StateConflict(format!("Plan has already been {}", status))
}

/// Верхняя граница мест в одной аудитории сохраняемого плана.
pub const MAX_ROOM_SEATS: u64 = u32::MAX as u64;

/// Структурная проверка отправляемого плана: границы аудиторий, уникальность мест
/// в аудитории и студентов во всём плане.
pub fn check_draft_shape(draft: &SeatingDraft) -> AppResult<()> {
    draft.validate()?;
    if draft.exam_name.trim().is_empty() {
        return Err(AppError::Validation("Please provide an exam name or title".to_string()));
    }
    if draft.room_assignments.is_empty() {
        return Err(AppError::Validation("Plan must contain at least one room".to_string()));
    }

    let mut seated = HashSet::new();
    for room in &draft.room_assignments {
        room.spec().validate()?;
        let seats = u64::from(room.rows)
            .checked_mul(u64::from(room.cols))
            .and_then(|benches| benches.checked_mul(u64::from(room.bench_capacity)));
        if !matches!(seats, Some(n) if n <= MAX_ROOM_SEATS) {
            return Err(AppError::Validation(format!(
                "Room {} is too large ({} x {} x {})",
                room.room_name, room.rows, room.cols, room.bench_capacity
            )));
        }

        let mut slots = HashSet::new();
        for seat in &room.student_assignments {
            let in_bounds = (1..=room.rows).contains(&seat.row)
                && (1..=room.cols).contains(&seat.col)
                && (1..=room.bench_capacity).contains(&seat.seat_position);
            if !in_bounds {
                return Err(AppError::Validation(format!(
                    "Seat ({}, {}, {}) is outside room {}",
                    seat.row, seat.col, seat.seat_position, room.room_name
                )));
            }
            if !slots.insert((seat.row, seat.col, seat.seat_position)) {
                return Err(AppError::Validation(format!(
                    "Seat ({}, {}, {}) is assigned twice in room {}",
                    seat.row, seat.col, seat.seat_position, room.room_name
                )));
            }
            if let Some(student) = seat.student {
                if !seated.insert(student) {
                    return Err(AppError::Validation(format!(
                        "Student {} is seated more than once",
                        student
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomAssignment, SeatAssignment};

    fn draft(rooms: Vec<RoomAssignment>) -> SeatingDraft {
        SeatingDraft {
            faculty: None,
            section: Uuid::new_v4(),
            exam_name: "Midterm".into(),
            room_assignments: rooms,
            date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            time: "10:00 AM - 1:00 PM".into(),
        }
    }

    fn seat(student: Option<Uuid>, row: u32, col: u32, seat_position: u32) -> SeatAssignment {
        SeatAssignment {
            student,
            name: "S".into(),
            usn: "N/A".into(),
            row,
            col,
            bench: col,
            seat_position,
        }
    }

    fn room(seats: Vec<SeatAssignment>) -> RoomAssignment {
        RoomAssignment {
            room_name: "R1".into(),
            rows: 2,
            cols: 2,
            bench_capacity: 2,
            student_assignments: seats,
        }
    }

    #[test]
    fn accepts_well_formed_plan() {
        let d = draft(vec![room(vec![
            seat(Some(Uuid::new_v4()), 1, 1, 1),
            seat(Some(Uuid::new_v4()), 2, 2, 2),
            seat(None, 1, 2, 1),
        ])]);
        assert!(check_draft_shape(&d).is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_seat() {
        let d = draft(vec![room(vec![seat(Some(Uuid::new_v4()), 3, 1, 1)])]);
        assert!(matches!(check_draft_shape(&d), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_duplicate_slot() {
        let d = draft(vec![room(vec![
            seat(Some(Uuid::new_v4()), 1, 1, 1),
            seat(Some(Uuid::new_v4()), 1, 1, 1),
        ])]);
        assert!(matches!(check_draft_shape(&d), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_student_in_two_rooms() {
        let me = Uuid::new_v4();
        let d = draft(vec![room(vec![seat(Some(me), 1, 1, 1)]), room(vec![seat(Some(me), 1, 1, 1)])]);
        assert!(matches!(check_draft_shape(&d), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_blank_exam_name_and_bad_room() {
        let mut d = draft(vec![room(vec![])]);
        d.exam_name = "   ".into();
        assert!(check_draft_shape(&d).is_err());

        let mut bad = room(vec![]);
        bad.rows = 0;
        assert!(check_draft_shape(&draft(vec![bad])).is_err());
    }

    #[test]
    fn rejects_room_too_large_to_number() {
        let mut huge = room(vec![seat(Some(Uuid::new_v4()), 70_000, 70_000, 1)]);
        huge.rows = 70_000;
        huge.cols = 70_000;
        let err = check_draft_shape(&draft(vec![huge])).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("too large")));

        let mut big = room(vec![]);
        big.rows = 1_000;
        big.cols = 1_000;
        big.bench_capacity = 4;
        assert!(check_draft_shape(&draft(vec![big])).is_ok());
    }
}

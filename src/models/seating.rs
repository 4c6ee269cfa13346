use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

fn default_bench_capacity() -> u32 {
    2
}

/// Статус плана рассадки. `approved` и `rejected` терминальные.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Approved => "approved",
            PlanStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlanStatus::Pending)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PlanStatus::Pending),
            "approved" => Ok(PlanStatus::Approved),
            "rejected" => Ok(PlanStatus::Rejected),
            other => Err(format!("unknown seating status '{}'", other)),
        }
    }
}

/// Аудитория: R рядов, C колонок, B мест на парте.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomSpec {
    #[validate(length(min = 1, message = "room name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "rows must be at least 1"))]
    pub rows: u32,
    #[validate(range(min = 1, message = "cols must be at least 1"))]
    pub cols: u32,
    #[serde(default = "default_bench_capacity")]
    #[validate(range(min = 1, message = "benchCapacity must be at least 1"))]
    pub bench_capacity: u32,
}

impl RoomSpec {
    pub fn new(name: impl Into<String>, rows: u32, cols: u32, bench_capacity: u32) -> Self {
        Self { name: name.into(), rows, cols, bench_capacity }
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize * self.bench_capacity as usize
    }
}

/// Одно занятое место. `bench` в этой модели всегда равен `col`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub student: Option<Uuid>,
    pub name: String,
    pub usn: String,
    pub row: u32,
    pub col: u32,
    pub bench: u32,
    pub seat_position: u32,
}

/// Аудитория вместе с занятыми местами (пустые места не хранятся).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAssignment {
    pub room_name: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default = "default_bench_capacity")]
    pub bench_capacity: u32,
    #[serde(default)]
    pub student_assignments: Vec<SeatAssignment>,
}

impl RoomAssignment {
    pub fn empty(room: &RoomSpec) -> Self {
        Self {
            room_name: room.name.clone(),
            rows: room.rows,
            cols: room.cols,
            bench_capacity: room.bench_capacity,
            student_assignments: Vec::new(),
        }
    }

    pub fn spec(&self) -> RoomSpec {
        RoomSpec::new(self.room_name.clone(), self.rows, self.cols, self.bench_capacity)
    }
}

/// Черновик плана: результат генерации (preview) и тело запроса на отправку.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeatingDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<Uuid>,
    pub section: Uuid,
    #[validate(length(min = 1, message = "Please provide an exam name or title"))]
    pub exam_name: String,
    pub room_assignments: Vec<RoomAssignment>,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "exam time is required"))]
    pub time: String,
}

/// Сохранённый план рассадки.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingPlan {
    pub id: Uuid,
    pub faculty: Uuid,
    pub section: Uuid,
    pub exam_name: String,
    pub room_assignments: Vec<RoomAssignment>,
    pub status: PlanStatus,
    pub hod_remarks: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeatingPlan {
    /// Новый план в статусе `pending`, владелец - `faculty`.
    pub fn from_draft(draft: SeatingDraft, faculty: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            faculty,
            section: draft.section,
            exam_name: draft.exam_name.trim().to_string(),
            room_assignments: draft.room_assignments,
            status: PlanStatus::Pending,
            hod_remarks: None,
            date: draft.date,
            time: draft.time,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn seated_count(&self) -> usize {
        self.room_assignments.iter().map(|r| r.student_assignments.len()).sum()
    }
}

/// Место студента в одобренном плане, как его видит студент.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingDetails {
    pub exam_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub room: String,
    pub row: u32,
    pub col: u32,
    pub seat_number: u64,
}

//! locator.rs
//!
//! Поиск места студента в одобренных планах.
//!
//! Номер места считается по колонкам: парта `((col-1) * rows) + (row-1)`, затем
//! `bench_index * capacity + seat_position`. Заполнение в `allocator` идёт по рядам,
//! поэтому при rows > 1 и cols > 1 номер не совпадает с порядком посадки. Формула
//! сохранена как есть: эти номера уже напечатаны в выданных студентам планах.

use uuid::Uuid;

use crate::models::{PlanStatus, RoomAssignment, SeatAssignment, SeatingDetails, SeatingPlan};

const DEFAULT_BENCH_CAPACITY: u32 = 2;

/// Линейный номер места (с 1) для назначения в аудитории.
///
/// Считается в `u64` и насыщается на переполнении: сохранённые планы
/// читаются как есть, и запрос студента не должен падать из-за размеров аудитории.
pub fn seat_number(room: &RoomAssignment, seat: &SeatAssignment) -> u64 {
    let capacity = if room.bench_capacity == 0 {
        DEFAULT_BENCH_CAPACITY
    } else {
        room.bench_capacity
    };
    let col = u64::from(seat.col.saturating_sub(1));
    let row = u64::from(seat.row.saturating_sub(1));
    let bench_index = col.saturating_mul(u64::from(room.rows)).saturating_add(row);
    bench_index
        .saturating_mul(u64::from(capacity))
        .saturating_add(u64::from(seat.seat_position))
}

/// Место студента в одном плане: первая аудитория, где он найден.
pub fn locate(plan: &SeatingPlan, student_id: Uuid) -> Option<SeatingDetails> {
    plan.room_assignments.iter().find_map(|room| {
        room.student_assignments
            .iter()
            .find(|a| a.student == Some(student_id))
            .map(|seat| SeatingDetails {
                exam_name: plan.exam_name.clone(),
                date: plan.date,
                time: plan.time.clone(),
                room: room.room_name.clone(),
                row: seat.row,
                col: seat.col,
                seat_number: seat_number(room, seat),
            })
    })
}

/// Места студента во всех одобренных планах, самые поздние экзамены первыми.
pub fn locate_all(plans: &[SeatingPlan], student_id: Uuid) -> Vec<SeatingDetails> {
    let mut approved: Vec<&SeatingPlan> = plans
        .iter()
        .filter(|p| p.status == PlanStatus::Approved)
        .collect();
    approved.sort_by(|a, b| b.date.cmp(&a.date));

    approved
        .into_iter()
        .filter_map(|plan| locate(plan, student_id))
        .collect()
}

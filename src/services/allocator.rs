//! allocator.rs
//!
//! Рассадка студентов по аудиториям.
//!
//! Список группы перемешивается (Fisher-Yates через `SliceRandom::shuffle`), затем
//! аудитории заполняются по порядку: ряд 1..R, внутри ряда колонка 1..C, внутри
//! колонки место на парте 1..B. Этот порядок заполнения и формула номера места в
//! `locator` - две половины одного контракта.

use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::error::AppError;
use crate::models::{RoomAssignment, RoomSpec, SeatAssignment, Student};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("{unseated} students could not be seated")]
    CapacityExceeded { unseated: usize },
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::CapacityExceeded { unseated } => AppError::CapacityExceeded { unseated },
        }
    }
}

/// Суммарная вместимость набора аудиторий.
pub fn total_capacity(rooms: &[RoomSpec]) -> usize {
    rooms.iter().map(RoomSpec::capacity).sum()
}

/// Рассаживает `roster` по `rooms`.
///
/// Возвращает по одной `RoomAssignment` на каждую пройденную аудиторию; после
/// того как студенты закончились, оставшиеся аудитории не включаются. Если мест не
/// хватило, результат целиком отбрасывается и возвращается число нерассаженных.
pub fn allocate<R: Rng + ?Sized>(
    roster: &[Student],
    rooms: &[RoomSpec],
    rng: &mut R,
) -> Result<Vec<RoomAssignment>, AllocationError> {
    let mut shuffled: Vec<&Student> = roster.iter().collect();
    shuffled.shuffle(rng);

    let mut pool = shuffled.into_iter().peekable();
    let mut assignments = Vec::with_capacity(rooms.len());

    for room in rooms {
        let mut current = RoomAssignment::empty(room);

        'fill: for row in 1..=room.rows {
            for col in 1..=room.cols {
                for seat_position in 1..=room.bench_capacity {
                    let Some(student) = pool.next() else {
                        break 'fill;
                    };
                    current.student_assignments.push(SeatAssignment {
                        student: Some(student.id),
                        name: student.name.clone(),
                        usn: student.usn(),
                        row,
                        col,
                        bench: col,
                        seat_position,
                    });
                }
            }
        }

        assignments.push(current);
        if pool.peek().is_none() {
            break;
        }
    }

    let unseated = pool.count();
    if unseated > 0 {
        return Err(AllocationError::CapacityExceeded { unseated });
    }

    Ok(assignments)
}

pub mod user;
pub mod seating;
pub mod notification;

pub use user::{Role, Student};
pub use seating::{
    PlanStatus, RoomAssignment, RoomSpec, SeatAssignment, SeatingDetails, SeatingDraft,
    SeatingPlan,
};
pub use notification::{NewNotification, Notification, NotificationKind};

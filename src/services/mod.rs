pub mod allocator;
pub mod locator;
pub mod notifications;
pub mod seating;

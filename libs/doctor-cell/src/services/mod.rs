pub mod schedule;
pub mod slots;

pub use schedule::DoctorScheduleService;
pub use slots::{total_slots, TimeRange};

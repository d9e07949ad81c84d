pub mod check_in;
pub mod dashboard;
pub mod management;
pub mod sweeper;

pub use check_in::CheckInService;
pub use dashboard::DashboardService;
pub use management::AppointmentManagementService;
pub use sweeper::MissedAppointmentSweeper;

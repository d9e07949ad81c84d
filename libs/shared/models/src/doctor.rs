use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    /// Free-form text such as "09:00-17:00" or "9:00 AM - 5:00 PM".
    pub working_hours: String,
    /// Informational only; slot math uses fixed 30 minute slots.
    pub consultation_duration: i32,
    pub accepting_patients: bool,
    pub on_leave: bool,
}

impl Doctor {
    pub fn is_on_duty(&self) -> bool {
        self.accepting_patients && !self.on_leave
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
}

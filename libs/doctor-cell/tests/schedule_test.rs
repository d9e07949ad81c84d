use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::DoctorScheduleService;
use shared_database::InMemoryDirectory;
use shared_models::{AppointmentStatus, Doctor};
use shared_utils::test_utils::Fixtures;
use shared_utils::ClinicCalendar;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn service(directory: Arc<InMemoryDirectory>) -> DoctorScheduleService {
    DoctorScheduleService::with_directory(directory, ClinicCalendar::new(Tz::UTC))
}

async fn seed_doctor(directory: &InMemoryDirectory, name: &str, hours: &str) -> Doctor {
    let doctor = Fixtures::doctor(name, hours);
    directory.insert_doctor(doctor.clone()).await;
    doctor
}

async fn book(directory: &InMemoryDirectory, doctor_id: Uuid, date: NaiveDate, time: &str, status: AppointmentStatus) {
    let patient = Fixtures::patient("Asha Verma");
    directory.insert_patient(patient.clone()).await;
    directory
        .insert_appointment(Fixtures::appointment(patient.id, doctor_id, date, time, status))
        .await;
}

#[tokio::test]
async fn test_four_bookings_on_an_eight_hour_day() {
    let directory = Arc::new(InMemoryDirectory::new());
    let doctor = seed_doctor(&directory, "Dr. Meera Rao", "09:00-17:00").await;

    book(&directory, doctor.id, day(), "11:00", AppointmentStatus::CheckedIn).await;
    book(&directory, doctor.id, day(), "09:00", AppointmentStatus::Scheduled).await;
    book(&directory, doctor.id, day(), "10:30", AppointmentStatus::Confirmed).await;
    book(&directory, doctor.id, day(), "09:30", AppointmentStatus::Scheduled).await;
    // Neither of these occupies a slot
    book(&directory, doctor.id, day(), "12:00", AppointmentStatus::Cancelled).await;
    book(&directory, doctor.id, day(), "12:30", AppointmentStatus::Missed).await;

    let schedules = service(directory).get_doctor_schedules(Some(day())).await.unwrap();

    assert_eq!(schedules.len(), 1);
    let schedule = &schedules[0];
    assert_eq!(schedule.doctor.id, doctor.id);
    assert_eq!(schedule.stats.total_slots, 16);
    assert_eq!(schedule.stats.booked_slots, 4);
    assert_eq!(schedule.stats.available_slots, 12);
    assert_eq!(schedule.stats.utilization_rate, "25.0");

    let times: Vec<String> = schedule
        .appointments
        .iter()
        .map(|a| a.appointment_time.format("%H:%M").to_string())
        .collect();
    assert_eq!(times, vec!["09:00", "09:30", "10:30", "11:00"]);
}

#[tokio::test]
async fn test_only_doctors_on_duty_are_listed() {
    let directory = Arc::new(InMemoryDirectory::new());
    seed_doctor(&directory, "Dr. Kavya Iyer", "9:00 AM - 1:00 PM").await;

    let mut on_leave = Fixtures::doctor("Dr. Leave", "09:00-17:00");
    on_leave.on_leave = true;
    directory.insert_doctor(on_leave).await;

    let mut not_accepting = Fixtures::doctor("Dr. Full", "09:00-17:00");
    not_accepting.accepting_patients = false;
    directory.insert_doctor(not_accepting).await;

    let schedules = service(directory).get_doctor_schedules(Some(day())).await.unwrap();

    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].doctor.name, "Dr. Kavya Iyer");
    assert_eq!(schedules[0].stats.total_slots, 8);
    assert_eq!(schedules[0].stats.utilization_rate, "0.0");
}

#[tokio::test]
async fn test_other_days_do_not_count() {
    let directory = Arc::new(InMemoryDirectory::new());
    let doctor = seed_doctor(&directory, "Dr. Meera Rao", "09:00-17:00").await;
    book(&directory, doctor.id, day().succ_opt().unwrap(), "09:00", AppointmentStatus::Scheduled).await;

    let schedules = service(directory).get_doctor_schedules(Some(day())).await.unwrap();
    assert_eq!(schedules[0].stats.booked_slots, 0);
    assert!(schedules[0].appointments.is_empty());
}

#[tokio::test]
async fn test_unparseable_hours_default_to_sixteen_slots() {
    let directory = Arc::new(InMemoryDirectory::new());
    seed_doctor(&directory, "Dr. Flexible", "By appointment").await;

    let schedules = service(directory).get_doctor_schedules(Some(day())).await.unwrap();
    assert_eq!(schedules[0].stats.total_slots, 16);
}

#[tokio::test]
async fn test_default_date_is_clinic_today() {
    let directory = Arc::new(InMemoryDirectory::new());
    let doctor = seed_doctor(&directory, "Dr. Meera Rao", "09:00-17:00").await;
    let ist_date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    book(&directory, doctor.id, ist_date, "09:00", AppointmentStatus::Scheduled).await;

    // 20:00 UTC on the 19th is already the 20th in Kolkata
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
    let service = DoctorScheduleService::with_directory(directory, ClinicCalendar::new(Tz::Asia__Kolkata));
    let schedules = service.get_doctor_schedules_at(None, now).await.unwrap();

    assert_eq!(schedules[0].stats.booked_slots, 1);
}

#[tokio::test]
async fn test_available_slots_skip_booked_times() {
    let directory = Arc::new(InMemoryDirectory::new());
    let doctor = seed_doctor(&directory, "Dr. Meera Rao", "09:00-11:00").await;
    book(&directory, doctor.id, day(), "09:30", AppointmentStatus::Confirmed).await;
    book(&directory, doctor.id, day(), "10:00", AppointmentStatus::Cancelled).await;

    let available = service(directory).get_available_slots(doctor.id, day()).await.unwrap();

    assert_eq!(available.slot_minutes, 30);
    assert_eq!(available.slots, vec!["09:00", "10:00", "10:30"]);
}

#[tokio::test]
async fn test_available_slots_for_unknown_doctor() {
    let directory = Arc::new(InMemoryDirectory::new());
    let result = service(directory).get_available_slots(Uuid::new_v4(), day()).await;
    assert_matches!(result, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn test_available_slots_empty_for_unparseable_hours() {
    let directory = Arc::new(InMemoryDirectory::new());
    let doctor = seed_doctor(&directory, "Dr. Flexible", "Weekends").await;

    let available = service(directory).get_available_slots(doctor.id, day()).await.unwrap();
    assert!(available.slots.is_empty());
}

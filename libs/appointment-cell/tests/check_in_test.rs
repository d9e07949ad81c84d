use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use appointment_cell::models::AppointmentError;
use appointment_cell::services::CheckInService;
use shared_database::{Directory, InMemoryDirectory};
use shared_models::{Appointment, AppointmentStatus};
use shared_utils::test_utils::Fixtures;
use shared_utils::ClinicCalendar;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn service(directory: Arc<InMemoryDirectory>) -> CheckInService {
    CheckInService::with_directory(directory, ClinicCalendar::new(Tz::UTC))
}

async fn seed(directory: &InMemoryDirectory, date: NaiveDate, time: &str) -> Appointment {
    let appointment = Fixtures::appointment(
        Uuid::new_v4(),
        Uuid::new_v4(),
        date,
        time,
        AppointmentStatus::Scheduled,
    );
    directory.insert_appointment(appointment.clone()).await;
    appointment
}

#[tokio::test]
async fn test_sequential_check_ins_get_consecutive_numbers() {
    let directory = Arc::new(InMemoryDirectory::new());
    let first = seed(&directory, today(), "09:00").await;
    let second = seed(&directory, today(), "09:30").await;
    let service = service(directory.clone());

    let a = service.check_in_at(first.id, now()).await.unwrap();
    let b = service.check_in_at(second.id, now() + Duration::minutes(5)).await.unwrap();

    assert_eq!(a.queue_number, "Q001");
    assert_eq!(b.queue_number, "Q002");

    let stored = directory.get_appointment(first.id).await.unwrap().unwrap();
    assert!(stored.checked_in);
    assert_eq!(stored.status, AppointmentStatus::CheckedIn);
    assert_eq!(stored.checked_in_at, Some(now()));
    assert_eq!(stored.queue_number.as_deref(), Some("Q001"));
}

#[tokio::test]
async fn test_tenth_check_in_is_zero_padded() {
    let directory = Arc::new(InMemoryDirectory::new());
    let service = service(directory.clone());

    let mut last = String::new();
    for i in 0..10 {
        let appointment = seed(&directory, today(), "10:00").await;
        last = service
            .check_in_at(appointment.id, now() + Duration::minutes(i))
            .await
            .unwrap()
            .queue_number;
    }

    assert_eq!(last, "Q010");
}

#[tokio::test]
async fn test_numbering_restarts_each_day() {
    let directory = Arc::new(InMemoryDirectory::new());
    let service = service(directory.clone());

    let monday = seed(&directory, today(), "09:00").await;
    service.check_in_at(monday.id, now()).await.unwrap();

    let tomorrow = today().succ_opt().unwrap();
    let tuesday = seed(&directory, tomorrow, "09:00").await;
    let result = service
        .check_in_at(tuesday.id, now() + Duration::days(1))
        .await
        .unwrap();

    assert_eq!(result.queue_number, "Q001");
}

#[tokio::test]
async fn test_numbering_continues_after_existing_check_ins() {
    let directory = Arc::new(InMemoryDirectory::new());

    // Two patients checked in earlier today by another process
    for queue in ["Q001", "Q002"] {
        let mut earlier = Fixtures::appointment(Uuid::new_v4(), Uuid::new_v4(), today(), "08:00", AppointmentStatus::CheckedIn);
        earlier.checked_in = true;
        earlier.checked_in_at = Some(now() - Duration::hours(1));
        earlier.queue_number = Some(queue.to_string());
        directory.insert_appointment(earlier).await;
    }

    let appointment = seed(&directory, today(), "09:30").await;
    let result = service(directory).check_in_at(appointment.id, now()).await.unwrap();

    assert_eq!(result.queue_number, "Q003");
}

#[tokio::test]
async fn test_already_checked_in() {
    let directory = Arc::new(InMemoryDirectory::new());
    let appointment = seed(&directory, today(), "09:00").await;
    let service = service(directory);

    service.check_in_at(appointment.id, now()).await.unwrap();
    let second = service.check_in_at(appointment.id, now()).await;

    assert_matches!(second, Err(AppointmentError::AlreadyCheckedIn));
}

#[tokio::test]
async fn test_past_appointment_is_rejected() {
    let directory = Arc::new(InMemoryDirectory::new());
    let yesterday = today().pred_opt().unwrap();
    let appointment = seed(&directory, yesterday, "16:00").await;

    let result = service(directory.clone()).check_in_at(appointment.id, now()).await;

    assert_matches!(result, Err(AppointmentError::PastAppointment));
    let stored = directory.get_appointment(appointment.id).await.unwrap().unwrap();
    assert!(!stored.checked_in);
    assert_eq!(stored.queue_number, None);
}

#[tokio::test]
async fn test_earlier_today_and_future_dates_are_allowed() {
    let directory = Arc::new(InMemoryDirectory::new());
    let early = seed(&directory, today(), "07:00").await;
    let next_week = seed(&directory, today() + Duration::days(7), "11:00").await;
    let service = service(directory);

    assert!(service.check_in_at(early.id, now()).await.is_ok());
    assert!(service.check_in_at(next_week.id, now()).await.is_ok());
}

#[tokio::test]
async fn test_today_follows_clinic_timezone() {
    let directory = Arc::new(InMemoryDirectory::new());
    // 20:00 UTC on the 19th is 01:30 on the 20th in Kolkata, so the 19th is past
    let late = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
    let appointment = seed(&directory, today(), "18:00").await;

    let service = CheckInService::with_directory(directory, ClinicCalendar::new(Tz::Asia__Kolkata));
    let result = service.check_in_at(appointment.id, late).await;

    assert_matches!(result, Err(AppointmentError::PastAppointment));
}

#[tokio::test]
async fn test_unknown_appointment() {
    let directory = Arc::new(InMemoryDirectory::new());
    let result = service(directory).check_in_at(Uuid::new_v4(), now()).await;
    assert_matches!(result, Err(AppointmentError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_check_ins_get_distinct_numbers() {
    const PATIENTS: usize = 25;

    let directory = Arc::new(InMemoryDirectory::new());
    let mut ids = Vec::with_capacity(PATIENTS);
    for _ in 0..PATIENTS {
        ids.push(seed(&directory, today(), "10:00").await.id);
    }

    let service = Arc::new(service(directory));
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = service.clone();
            tokio::spawn(async move { service.check_in_at(id, now()).await })
        })
        .collect();

    let mut numbers = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(numbers.insert(result.queue_number));
    }

    assert_eq!(numbers.len(), PATIENTS);
    assert!(numbers.contains("Q001"));
    assert!(numbers.contains(&format!("Q{:03}", PATIENTS)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_check_ins_of_one_appointment() {
    let directory = Arc::new(InMemoryDirectory::new());
    let appointment = seed(&directory, today(), "10:00").await;
    let service = Arc::new(service(directory));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let id = appointment.id;
            tokio::spawn(async move { service.check_in_at(id, now()).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert_matches!(err, AppointmentError::AlreadyCheckedIn),
        }
    }

    assert_eq!(succeeded, 1);
}

// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// STORE ROWS
// ==============================================================================

/// A row in the `appointments` table. An appointment starts life as an open
/// slot (available, no patient) and is flipped to booked by a single
/// conditional update that assigns the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    /// Slot label, e.g. "09:00-09:30". Opaque to this service.
    pub appointment_time: String,
    pub is_time_slot_available: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Open means bookable: available and carrying no patient.
    pub fn is_open(&self) -> bool {
        self.is_time_slot_available && self.patient_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A row in `doctors`; `user_profile` is present when the row arrives via an
/// embedded-resource join, absent on plain point lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
}

/// Search result row: the appointment with both parties expanded two levels
/// (doctor/patient record plus their linked user profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulatedAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorRecord>,
    pub patient: Option<PatientRecord>,
}

/// Fetch-by-id payload: the appointment with the doctor and patient rows
/// attached as denormalized fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor_details: Option<DoctorRecord>,
    pub patient_details: Option<PatientRecord>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================
// Field names preserve the wire contract of the public API (`appDate`,
// `timeSlots`, `doctorID` on search/slots vs `doctorId` on book/update).

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAppointmentsRequest {
    pub is_time_slot_available: bool,
    #[serde(default)]
    pub app_date: Option<DateTime<Utc>>,
    #[serde(rename = "doctorID", default)]
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotsRequest {
    pub app_date: DateTime<Utc>,
    pub time_slots: Vec<String>,
    #[serde(rename = "doctorID")]
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub app_date: NaiveDate,
    pub app_time: String,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAppointmentRequest {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub app_date: NaiveDate,
    pub app_time: String,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

// ==============================================================================
// QUERY SCOPING
// ==============================================================================

/// Equality filter for appointment searches, derived from the request body.
/// `completed` is implied: searches for open slots exclude completed rows and
/// vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentSearchFilter {
    pub available: bool,
    pub date: Option<NaiveDate>,
}

/// Authorization scope applied to appointment searches, computed explicitly
/// in the handler from the caller identity and passed into the query builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentScope {
    /// No caller-based narrowing (e.g. administrative callers).
    Unrestricted,
    /// Restrict to one doctor's appointments.
    Doctor(Uuid),
    /// Restrict to one patient's appointments.
    Patient(Uuid),
}

impl AppointmentScope {
    pub fn as_filter(&self) -> Option<String> {
        match self {
            AppointmentScope::Unrestricted => None,
            AppointmentScope::Doctor(id) => Some(format!("doctor_id=eq.{}", id)),
            AppointmentScope::Patient(id) => Some(format!("patient_id=eq.{}", id)),
        }
    }
}

/// Truncate a supplied date-time to calendar-day precision.
pub fn calendar_day(moment: DateTime<Utc>) -> NaiveDate {
    moment.date_naive()
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// The two failure kinds of this service: the target predicate matched zero
/// rows, or the store itself failed (raw message preserved for the caller).
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("appointment not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),
}

// libs/appointment-cell/src/services/records.rs
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentScope,
    AppointmentSearchFilter, DoctorRecord, PatientRecord, PopulatedAppointment,
};

/// Embedded-resource select expanding both parties of an appointment two
/// levels deep: the doctor/patient row plus its linked user profile.
const POPULATED_SELECT: &str =
    "select=*,doctor:doctors(*,user_profile:user_profiles(*)),patient:patients(*,user_profile:user_profiles(*))";

/// Read side of the appointment service: department listing, scoped
/// searches, point fetches with party details, and deletion.
pub struct AppointmentRecordsService {
    supabase: SupabaseClient,
}

impl AppointmentRecordsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Distinct department values across all doctor records, first-seen
    /// order. The store returns one row per doctor; deduplication happens
    /// here.
    pub async fn list_departments(
        &self,
        auth_token: &str,
    ) -> Result<Vec<String>, AppointmentError> {
        debug!("Listing distinct doctor departments");

        let rows: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/doctors?select=department",
                Some(auth_token),
                None,
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let mut departments: Vec<String> = Vec::new();
        for row in rows {
            if let Some(department) = row.get("department").and_then(Value::as_str) {
                if !departments.iter().any(|d| d == department) {
                    departments.push(department.to_string());
                }
            }
        }

        Ok(departments)
    }

    /// Compute the search scope for a caller. An explicit doctor id wins;
    /// otherwise doctor/patient callers are pinned to their own record,
    /// resolved by a `user_id` lookup, and everyone else is unrestricted.
    pub async fn resolve_scope(
        &self,
        user: &User,
        explicit_doctor_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<AppointmentScope, AppointmentError> {
        if let Some(doctor_id) = explicit_doctor_id {
            return Ok(AppointmentScope::Doctor(doctor_id));
        }

        match user.role.as_deref() {
            Some("doctor") => {
                let id = self.lookup_record_id("doctors", &user.id, auth_token).await?;
                Ok(AppointmentScope::Doctor(id))
            }
            Some("patient") => {
                let id = self.lookup_record_id("patients", &user.id, auth_token).await?;
                Ok(AppointmentScope::Patient(id))
            }
            _ => Ok(AppointmentScope::Unrestricted),
        }
    }

    async fn lookup_record_id(
        &self,
        table: &str,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Uuid, AppointmentError> {
        let path = format!("/rest/v1/{}?user_id=eq.{}&select=id", table, user_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = rows.first().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row["id"].clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse {} id: {}", table, e)))
    }

    /// Equality-filtered search with both parties expanded. Zero matches is
    /// a successful empty list, not an error.
    pub async fn search_appointments(
        &self,
        filter: &AppointmentSearchFilter,
        scope: &AppointmentScope,
        auth_token: &str,
    ) -> Result<Vec<PopulatedAppointment>, AppointmentError> {
        debug!("Searching appointments with filter {:?} and scope {:?}", filter, scope);

        let mut query_parts = vec![
            format!("is_time_slot_available=eq.{}", filter.available),
            format!("completed=eq.{}", !filter.available),
        ];
        if let Some(date) = filter.date {
            query_parts.push(format!("appointment_date=eq.{}", date));
        }
        if let Some(scope_filter) = scope.as_filter() {
            query_parts.push(scope_filter);
        }
        query_parts.push(POPULATED_SELECT.to_string());

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        let appointments: Vec<PopulatedAppointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(appointments)
    }

    /// Fetch one appointment and attach its doctor and patient rows as
    /// denormalized fields. The dependent lookups run only after the base
    /// row is confirmed to exist.
    pub async fn get_appointment_with_details(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentDetails, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        let appointment: Appointment = serde_json::from_value(rows[0].clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;

        let doctor_details = self.fetch_doctor(appointment.doctor_id, auth_token).await?;
        let patient_details = match appointment.patient_id {
            Some(patient_id) => self.fetch_patient(patient_id, auth_token).await?,
            None => None,
        };

        Ok(AppointmentDetails {
            appointment,
            doctor_details,
            patient_details,
        })
    }

    async fn fetch_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<DoctorRecord>, AppointmentError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        match rows.first() {
            Some(row) => serde_json::from_value(row.clone())
                .map(Some)
                .map_err(|e| AppointmentError::Database(format!("Failed to parse doctor: {}", e))),
            None => Ok(None),
        }
    }

    async fn fetch_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<PatientRecord>, AppointmentError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        match rows.first() {
            Some(row) => serde_json::from_value(row.clone())
                .map(Some)
                .map_err(|e| AppointmentError::Database(format!("Failed to parse patient: {}", e))),
            None => Ok(None),
        }
    }

    /// Delete by id; zero deleted rows reports NotFound.
    pub async fn delete_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(headers))
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        Ok(())
    }
}

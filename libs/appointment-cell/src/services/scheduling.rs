// libs/appointment-cell/src/services/scheduling.rs
use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, BookAppointmentRequest, UpdateAppointmentRequest};

/// Write side of the slot lifecycle: bulk slot creation, the atomic
/// open-to-booked transition, and the full-record rewrite.
pub struct SlotSchedulingService {
    supabase: SupabaseClient,
}

impl SlotSchedulingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create one open slot per label in a single upsert keyed on
    /// (doctor, date, slot). Rows that already exist are left untouched, so
    /// repeated calls are idempotent even under concurrency.
    pub async fn create_slots(
        &self,
        date: NaiveDate,
        doctor_id: Uuid,
        time_slots: &[String],
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        if time_slots.is_empty() {
            return Ok(());
        }

        info!(
            "Creating {} open slots for doctor {} on {}",
            time_slots.len(),
            doctor_id,
            date
        );

        let now = Utc::now().to_rfc3339();
        let rows: Vec<Value> = time_slots
            .iter()
            .map(|slot| {
                json!({
                    "doctor_id": doctor_id,
                    "appointment_date": date,
                    "appointment_time": slot,
                    "is_time_slot_available": true,
                    "completed": false,
                    "created_at": now,
                    "updated_at": now,
                })
            })
            .collect();

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=ignore-duplicates,return=representation"),
        );

        let _created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments?on_conflict=doctor_id,appointment_date,appointment_time",
                Some(auth_token),
                Some(Value::Array(rows)),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(())
    }

    /// Book an open slot: one conditional update that matches
    /// (available, date, slot, doctor) and assigns the patient. The filter
    /// and the write execute as a single statement on the store, so two
    /// concurrent bookings of the same slot cannot both succeed; the loser
    /// matches zero rows and reports NotFound.
    pub async fn book_slot(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        info!(
            "Booking slot {} on {} with doctor {} for patient {}",
            request.app_time, request.app_date, request.doctor_id, request.patient_id
        );

        let path = format!(
            "/rest/v1/appointments?is_time_slot_available=eq.true&appointment_date=eq.{}&appointment_time=eq.{}&doctor_id=eq.{}",
            request.app_date,
            urlencoding::encode(&request.app_time),
            request.doctor_id
        );

        let update = json!({
            "is_time_slot_available": false,
            "patient_id": request.patient_id,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update), Some(headers))
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if updated.is_empty() {
            warn!(
                "No open slot {} on {} for doctor {} - already booked or never created",
                request.app_time, request.app_date, request.doctor_id
            );
            return Err(AppointmentError::NotFound);
        }

        Ok(())
    }

    /// Rewrite the full record by id, forcing it into the booked state, then
    /// drop any leftover open slot sharing the same (date, slot). The
    /// cleanup covers records repurposed into booked appointments without
    /// going through `book_slot`. There is no rollback of the rewrite if the
    /// cleanup step fails.
    pub async fn replace_appointment(
        &self,
        appointment_id: Uuid,
        request: &UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("Rewriting appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let update = json!({
            "appointment_date": request.app_date,
            "appointment_time": request.app_time,
            "doctor_id": request.doctor_id,
            "patient_id": request.patient_id,
            "is_time_slot_available": false,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if updated.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        // Matching the lifecycle of the overwritten record: a stale open slot
        // at the new (date, slot) would now shadow a booked appointment.
        // Zero deleted rows just means there was nothing stale to remove.
        let cleanup_path = format!(
            "/rest/v1/appointments?is_time_slot_available=eq.true&appointment_date=eq.{}&appointment_time=eq.{}",
            request.app_date,
            urlencoding::encode(&request.app_time)
        );

        let mut cleanup_headers = HeaderMap::new();
        cleanup_headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let removed: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &cleanup_path,
                Some(auth_token),
                None,
                Some(cleanup_headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if !removed.is_empty() {
            info!(
                "Removed {} stale open slot(s) at {} {}",
                removed.len(),
                request.app_date,
                request.app_time
            );
        }

        Ok(())
    }
}

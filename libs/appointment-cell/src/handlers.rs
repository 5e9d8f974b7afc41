// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    calendar_day, AppointmentError, AppointmentSearchFilter, BookAppointmentRequest,
    CreateSlotsRequest, DeleteAppointmentRequest, SearchAppointmentsRequest,
    UpdateAppointmentRequest,
};
use crate::services::records::AppointmentRecordsService;
use crate::services::scheduling::SlotSchedulingService;

// Status mapping note: department listing and search report store failures
// as 500; the slot/book/delete/fetch/update operations report them as 404.
// This is the documented behavior of the public API and is kept as-is.

#[axum::debug_handler]
pub async fn get_departments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let records_service = AppointmentRecordsService::new(&state);

    let departments = records_service
        .list_departments(token)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "message": "success",
        "departments": departments
    })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SearchAppointmentsRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let records_service = AppointmentRecordsService::new(&state);

    let scope = records_service
        .resolve_scope(&user, request.doctor_id, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => {
                AppError::NotFound("No doctor or patient record for caller".to_string())
            }
            AppointmentError::Database(msg) => AppError::Internal(msg),
        })?;

    let filter = AppointmentSearchFilter {
        available: request.is_time_slot_available,
        date: request.app_date.map(calendar_day),
    };

    let appointments = records_service
        .search_appointments(&filter, &scope, token)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "message": "success",
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn create_appointment_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scheduling_service = SlotSchedulingService::new(&state);

    scheduling_service
        .create_slots(
            calendar_day(request.app_date),
            request.doctor_id,
            &request.time_slots,
            token,
        )
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    Ok(Json(json!({ "message": "success" })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scheduling_service = SlotSchedulingService::new(&state);

    scheduling_service
        .book_slot(&request, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => {
                AppError::NotFound("Could not book appointment. Please Try again.".to_string())
            }
            AppointmentError::Database(msg) => AppError::NotFound(msg),
        })?;

    Ok(Json(json!({ "message": "success" })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<DeleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let records_service = AppointmentRecordsService::new(&state);

    records_service
        .delete_appointment(request.appointment_id, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => {
                AppError::NotFound("Could not delete appointment".to_string())
            }
            AppointmentError::Database(msg) => AppError::NotFound(msg),
        })?;

    Ok(Json(json!({ "message": "success" })))
}

#[axum::debug_handler]
pub async fn get_appointment_by_id(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let records_service = AppointmentRecordsService::new(&state);

    let appointment = records_service
        .get_appointment_with_details(appointment_id, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::Database(msg) => AppError::NotFound(msg),
        })?;

    Ok(Json(json!({
        "message": "success",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_by_id(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scheduling_service = SlotSchedulingService::new(&state);

    scheduling_service
        .replace_appointment(appointment_id, &request, token)
        .await
        .map_err(|e| match e {
            AppointmentError::NotFound => {
                AppError::NotFound("Could not update appointment".to_string())
            }
            AppointmentError::Database(msg) => AppError::NotFound(msg),
        })?;

    Ok(Json(json!({ "message": "success" })))
}

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::server::AppState;
use crate::storage::{Database, DbStats, PersonRepository, RoleRepository, UserRoleRepository};
use crate::{id, Error, Person, Role};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct PersonPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Kept loose so a non-numeric age is reported as invalid data
    pub age: Option<serde_json::Value>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct RolePayload {
    pub role_id: Option<String>,
    pub role_name: Option<String>,
}

/// `role_id` in assignment bodies: a single id or a list of ids
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RoleIds {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
pub struct UserRolesPayload {
    pub user_id: Option<String>,
    pub role_id: Option<RoleIds>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

fn error_response(err: Error) -> ApiError {
    let status = match &err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Constraint(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }
    (status, Json(ErrorResponse { error: err.to_string() }))
}

fn invalid(message: &str) -> ApiError {
    error_response(Error::Validation(message.to_string()))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| error_response(Error::Validation(rejection.body_text())))
}

/// Trimmed, non-empty string field
fn required(field: Option<&str>) -> Option<String> {
    field.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn person_fields(payload: &PersonPayload) -> ApiResult<(String, i64, String)> {
    let name = required(payload.name.as_deref());
    let email = required(payload.email.as_deref());
    let age = payload.age.as_ref().and_then(|v| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        })
    });

    match (name, age, email) {
        (Some(name), Some(age), Some(email)) => Ok((name, age, email)),
        _ => Err(invalid("name, age, and email are required")),
    }
}

// ========== People ==========

pub async fn list_people(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Person>>> {
    let db = state.db.lock().await;
    let repo = PersonRepository::new(&db);

    let people = match params.search.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => repo.search(query),
        _ => repo.get_all(),
    }
    .map_err(error_response)?;

    Ok(Json(people))
}

pub async fn get_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Person>> {
    let db = state.db.lock().await;
    PersonRepository::new(&db)
        .get_by_id(&id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| error_response(Error::NotFound("Person".to_string())))
}

pub async fn create_person(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PersonPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let payload = body(payload)?;
    let (name, age, email) = person_fields(&payload)?;

    let db = state.db.lock().await;
    let person = PersonRepository::new(&db)
        .insert(&id::generate(), &name, age, &email)
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn update_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<PersonPayload>, JsonRejection>,
) -> ApiResult<Json<Person>> {
    let payload = body(payload)?;
    if payload.id.as_deref() != Some(id.as_str()) {
        return Err(invalid("ID mismatch"));
    }
    let (name, age, email) = person_fields(&payload)?;

    let db = state.db.lock().await;
    let person = PersonRepository::new(&db)
        .update(&id, &name, age, &email)
        .map_err(error_response)?;

    Ok(Json(person))
}

pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let db = state.db.lock().await;
    PersonRepository::new(&db).delete(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Roles ==========

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Role>>> {
    let db = state.db.lock().await;
    let repo = RoleRepository::new(&db);

    let roles = match params.search.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => repo.search(query),
        _ => repo.get_all(),
    }
    .map_err(error_response)?;

    Ok(Json(roles))
}

pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Role>> {
    let db = state.db.lock().await;
    RoleRepository::new(&db)
        .get_by_id(&id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| error_response(Error::NotFound("Role".to_string())))
}

pub async fn create_role(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RolePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    let payload = body(payload)?;
    let role_name = required(payload.role_name.as_deref())
        .ok_or_else(|| invalid("role_name is required"))?;

    let db = state.db.lock().await;
    let role = RoleRepository::new(&db)
        .insert(&id::generate(), &role_name)
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<RolePayload>, JsonRejection>,
) -> ApiResult<Json<Role>> {
    let payload = body(payload)?;
    if payload.role_id.as_deref() != Some(id.as_str()) {
        return Err(invalid("ID mismatch"));
    }
    let role_name = required(payload.role_name.as_deref())
        .ok_or_else(|| invalid("role_name is required"))?;

    let db = state.db.lock().await;
    let role = RoleRepository::new(&db)
        .update(&id, &role_name)
        .map_err(error_response)?;

    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let db = state.db.lock().await;
    RoleRepository::new(&db).delete(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== User Roles ==========

pub async fn get_user_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Role>>> {
    let db = state.db.lock().await;

    // The repository does not tell unknown users from users without roles.
    if PersonRepository::new(&db).get_by_id(&id).map_err(error_response)?.is_none() {
        return Err(error_response(Error::NotFound("User".to_string())));
    }

    let roles = UserRoleRepository::new(&db)
        .get_user_roles(&id)
        .map_err(error_response)?;
    Ok(Json(roles))
}

/// Validate an assignment body into `(user_id, role_ids)`
fn assignment_fields(payload: UserRolesPayload) -> ApiResult<(String, Vec<String>)> {
    let user_id = payload.user_id.filter(|s| !s.is_empty());
    let role_ids = match payload.role_id {
        Some(RoleIds::One(role_id)) if !role_id.is_empty() => Some(vec![role_id]),
        Some(RoleIds::Many(role_ids)) => Some(role_ids),
        _ => None,
    };

    match (user_id, role_ids) {
        (Some(user_id), Some(role_ids)) => Ok((user_id, role_ids)),
        _ => Err(invalid("user_id and role_id are required")),
    }
}

/// Replace a user's roles and return the resulting set
fn replace_roles(db: &Database, user_id: &str, role_ids: &[String]) -> ApiResult<Vec<Role>> {
    let repo = UserRoleRepository::new(db);
    repo.set_roles_for_user(user_id, role_ids).map_err(error_response)?;
    repo.get_user_roles(user_id).map_err(error_response)
}

pub async fn set_user_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UserRolesPayload>, JsonRejection>,
) -> ApiResult<Json<Vec<Role>>> {
    let payload = body(payload)?;
    if payload.user_id.as_deref() != Some(id.as_str()) {
        return Err(invalid("ID mismatch"));
    }
    let (user_id, role_ids) = assignment_fields(payload)?;

    let db = state.db.lock().await;
    let roles = replace_roles(&db, &user_id, &role_ids)?;
    Ok(Json(roles))
}

pub async fn create_user_role(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserRolesPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<Role>>)> {
    let (user_id, role_ids) = assignment_fields(body(payload)?)?;

    let db = state.db.lock().await;
    let roles = replace_roles(&db, &user_id, &role_ids)?;
    Ok((StatusCode::CREATED, Json(roles)))
}

// ========== Stats ==========

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DbStats>> {
    let db = state.db.lock().await;
    Ok(Json(db.stats().map_err(error_response)?))
}

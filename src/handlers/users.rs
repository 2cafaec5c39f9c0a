use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::config;
use crate::error::ApiError;
use crate::identity::{roles, ProfileUpdate, UserSummary};
use crate::middleware::CurrentUser;

/// Fields the caller may not write through the profile document. Email,
/// verification state, roles and uid belong to the identity service;
/// display name and photo are forwarded there instead of being stored.
const PROTECTED_FIELDS: [&str; 6] = [
    "uid",
    "email",
    "emailVerified",
    "roles",
    "displayName",
    "photoUrl",
];

/// GET /user/profile - Identity attributes merged with the caller's
/// stored profile document
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.profiles.fetch(&user.uid).await.map_err(|e| {
        tracing::error!(uid = %user.uid, "Failed to fetch profile: {}", e);
        ApiError::from(e)
    })?;

    let base = json!({
        "uid": user.uid,
        "email": user.email,
        "emailVerified": user.email_verified,
        "displayName": user.display_name,
        "roles": user.roles,
    });

    Ok(Json(overlay(base, doc)))
}

/// PUT /user/profile - Update the caller's profile. Display name and
/// photo go to the identity service; identity-managed fields in the body
/// are silently discarded; everything else merges into the document.
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let Value::Object(body) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let (identity_update, doc_patch) = split_profile_patch(&body);

    if !identity_update.is_empty() {
        state
            .identity
            .update_profile(&user.uid, identity_update)
            .await
            .map_err(|e| {
                tracing::error!(uid = %user.uid, "Failed to update identity profile: {}", e);
                ApiError::from(e)
            })?;
    }

    if !doc_patch.is_empty() {
        state
            .profiles
            .merge(&user.uid, Value::Object(doc_patch))
            .await
            .map_err(|e| {
                tracing::error!(uid = %user.uid, "Failed to merge profile document: {}", e);
                ApiError::from(e)
            })?;
    }

    Ok(Json(
        json!({ "success": true, "message": "Profile updated successfully" }),
    ))
}

/// GET /user/all - Admin listing of all users, capped at a fixed page size
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let limit = config::config().identity.user_page_size;
    let users = state.identity.list_users(limit).await.map_err(|e| {
        tracing::error!("Failed to list users: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(users))
}

/// GET /user/:uid - Admin view of one user, merged with their profile
/// document
pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let summary = state.identity.get_user(&uid).await.map_err(|e| {
        tracing::warn!(uid = %uid, "Failed to get user: {}", e);
        ApiError::from(e)
    })?;
    let doc = state.profiles.fetch(&uid).await.map_err(|e| {
        tracing::error!(uid = %uid, "Failed to fetch profile: {}", e);
        ApiError::from(e)
    })?;

    let base = serde_json::to_value(&summary).map_err(|e| {
        tracing::error!(uid = %uid, "Failed to serialize user summary: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(Json(overlay(base, doc)))
}

/// POST /user/:uid/roles - Admin add/remove of role claims
pub async fn update_roles(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let requested = body
        .get("roles")
        .and_then(Value::as_array)
        .and_then(|values| {
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>()
        });
    let action = body.get("action").and_then(Value::as_str);

    let (Some(requested), Some(action)) = (requested, action) else {
        return Err(ApiError::bad_request(
            "Invalid request. Provide roles array and action (add/remove)",
        ));
    };

    let current = state.identity.get_roles(&uid).await.map_err(|e| {
        tracing::warn!(uid = %uid, "Failed to read roles: {}", e);
        ApiError::from(e)
    })?;

    let (updated, message) = match action {
        "add" => (
            roles::add_roles(&current, &requested),
            "Roles added successfully",
        ),
        "remove" => (
            roles::remove_roles(&current, &requested),
            "Roles removed successfully",
        ),
        _ => {
            return Err(ApiError::bad_request(
                "Invalid action. Use \"add\" or \"remove\"",
            ))
        }
    };

    state
        .identity
        .set_roles(&uid, updated.clone())
        .await
        .map_err(|e| {
            tracing::error!(uid = %uid, "Failed to update roles: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(
        json!({ "success": true, "message": message, "roles": updated }),
    ))
}

/// PUT /user/:uid/status - Admin enable/disable of an account
pub async fn update_status(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let disabled = body
        .get("disabled")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request("Invalid request. Provide disabled status (boolean)"))?;

    state
        .identity
        .set_disabled(&uid, disabled)
        .await
        .map_err(|e| {
            tracing::error!(uid = %uid, "Failed to update user status: {}", e);
            ApiError::from(e)
        })?;

    let message = if disabled {
        "User disabled successfully"
    } else {
        "User enabled successfully"
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

/// Overlay a stored profile document on identity-derived fields; the
/// document's entries win on key collisions.
fn overlay(base: Value, doc: Option<Value>) -> Value {
    match base {
        Value::Object(mut merged) => {
            if let Some(Value::Object(doc)) = doc {
                for (key, value) in doc {
                    merged.insert(key, value);
                }
            }
            Value::Object(merged)
        }
        other => other,
    }
}

/// Split a profile patch into the identity-service part (display name,
/// photo) and the document part (everything not identity-managed).
fn split_profile_patch(body: &Map<String, Value>) -> (ProfileUpdate, Map<String, Value>) {
    let update = ProfileUpdate {
        display_name: body
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_string),
        photo_url: body
            .get("photoUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let doc_patch = body
        .iter()
        .filter(|(key, _)| !PROTECTED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    (update, doc_patch)
}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::{
    rejections::{AppError, ResultExt},
    services::achievements::AchievementService,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/{user_id}/achievements", get(user_achievements))
}

async fn user_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_user(user_id)
        .await
        .reject("could not get user")?
        .ok_or(AppError::NotFound("user not found"))?;

    let service = AchievementService::new(state.db.clone());
    let achievements = service
        .earned(user_id)
        .await
        .reject("could not get achievements")?;

    let total_points: i64 = achievements.iter().map(|a| a.points).sum();

    Ok(Json(json!({
        "achievements": achievements,
        "total_points": total_points,
    })))
}

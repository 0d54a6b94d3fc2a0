use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    rejections::{AppError, ResultExt},
    services::{
        self,
        assessment::{
            AssessmentService, CompleteAttemptOutcome, StartAttemptOutcome, SubmitAnswerOutcome,
        },
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quizzes/{quiz_id}/attempts", post(start_attempt))
        .route("/attempts/{attempt_id}", get(attempt_status))
        .route("/attempts/{attempt_id}/answers", post(submit_answer))
        .route("/attempts/{attempt_id}/complete", post(complete_attempt))
}

#[derive(Deserialize)]
struct StartAttemptBody {
    user_id: i64,
}

#[derive(Deserialize)]
struct SubmitAnswerBody {
    question_id: i64,
    option_id: Option<i64>,
    answer_text: Option<String>,
}

async fn start_attempt(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(body): Json<StartAttemptBody>,
) -> Result<impl IntoResponse, AppError> {
    let service = AssessmentService::new(state.db.clone());
    let outcome = service
        .start_attempt(body.user_id, quiz_id)
        .await
        .reject("could not start attempt")?;

    match outcome {
        StartAttemptOutcome::Started(attempt) => Ok((StatusCode::CREATED, Json(attempt))),
        StartAttemptOutcome::LimitExceeded {
            attempts,
            max_attempts,
        } => Err(AppError::Forbidden(format!(
            "maximum number of attempts reached ({attempts}/{max_attempts})"
        ))),
        StartAttemptOutcome::QuizNotFound => Err(AppError::NotFound("quiz not found")),
    }
}

async fn submit_answer(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
    Json(body): Json<SubmitAnswerBody>,
) -> Result<impl IntoResponse, AppError> {
    let service = AssessmentService::new(state.db.clone());
    let outcome = service
        .submit_answer(attempt_id, body.question_id, body.option_id, body.answer_text)
        .await
        .reject("could not submit answer")?;

    match outcome {
        SubmitAnswerOutcome::Recorded {
            answered,
            total_questions,
        } => Ok(Json(json!({
            "status": "recorded",
            "answered": answered,
            "total_questions": total_questions,
        }))),
        SubmitAnswerOutcome::Completed { attempt, effects } => {
            let pipeline = services::run_effects(&state.db, effects)
                .await
                .reject("could not apply completion effects")?;

            Ok(Json(json!({
                "status": "completed",
                "attempt": attempt,
                "awarded": pipeline.awarded,
            })))
        }
        SubmitAnswerOutcome::AlreadyCompleted => Err(AppError::Conflict(
            "attempt is already completed".to_string(),
        )),
        SubmitAnswerOutcome::QuestionNotInQuiz => Err(AppError::Input(
            "question does not belong to this quiz".to_string(),
        )),
        SubmitAnswerOutcome::AttemptNotFound => Err(AppError::NotFound("attempt not found")),
    }
}

async fn complete_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let service = AssessmentService::new(state.db.clone());
    let outcome = service
        .complete_attempt(attempt_id)
        .await
        .reject("could not complete attempt")?;

    match outcome {
        CompleteAttemptOutcome::Completed { attempt, effects } => {
            let pipeline = services::run_effects(&state.db, effects)
                .await
                .reject("could not apply completion effects")?;

            Ok(Json(json!({
                "status": "completed",
                "attempt": attempt,
                "awarded": pipeline.awarded,
            })))
        }
        // Re-completing is a defined no-op, not an error.
        CompleteAttemptOutcome::AlreadyCompleted(attempt) => Ok(Json(json!({
            "status": "already_completed",
            "attempt": attempt,
        }))),
        CompleteAttemptOutcome::AttemptNotFound => Err(AppError::NotFound("attempt not found")),
    }
}

async fn attempt_status(
    State(state): State<AppState>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let service = AssessmentService::new(state.db.clone());
    let status = service
        .attempt_status(attempt_id)
        .await
        .reject("could not get attempt status")?
        .ok_or(AppError::NotFound("attempt not found"))?;

    let answers = service
        .attempt_answers(attempt_id)
        .await
        .reject("could not get attempt answers")?;

    Ok(Json(json!({
        "attempt": status.attempt,
        "answered": status.answered,
        "total_questions": status.total_questions,
        "time_remaining_minutes": status.time_remaining_minutes,
        "timed_out": status.timed_out,
        "duration_minutes": status.duration_minutes,
        "answers": answers,
    })))
}

use std::future::Future;

use color_eyre::{eyre::OptionExt, Result};
use serde::Serialize;
use ulid::Ulid;

use crate::db::models::{AnswerRow, AttemptRow, QuizSnapshot};
use crate::db::Db;
use crate::names;
use crate::utils;

use super::scoring;
use super::Effect;

// ---------------------------------------------------------------------------
// AssessmentRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AssessmentRepository: Send + Sync {
    fn get_attempt(
        &self,
        attempt_id: i64,
    ) -> impl Future<Output = Result<Option<AttemptRow>>> + Send;

    /// How many attempts the user already holds for the quiz, completed or
    /// in progress.
    fn attempt_count(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        token: &str,
        started_at: &str,
    ) -> impl Future<Output = Result<AttemptRow>> + Send;

    fn quiz_snapshot(
        &self,
        quiz_id: i64,
    ) -> impl Future<Output = Result<Option<QuizSnapshot>>> + Send;

    /// Insert or overwrite the answer for `(attempt, question)`.
    fn upsert_answer(&self, answer: NewAnswer) -> impl Future<Output = Result<()>> + Send;

    /// Distinct questions answered on the attempt.
    fn answered_count(&self, attempt_id: i64) -> impl Future<Output = Result<i64>> + Send;

    fn earned_points(&self, attempt_id: i64) -> impl Future<Output = Result<i64>> + Send;

    fn finalize_attempt(
        &self,
        attempt_id: i64,
        completed_at: &str,
        score: f64,
        passed: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    fn attempt_answers(
        &self,
        attempt_id: i64,
    ) -> impl Future<Output = Result<Vec<AnswerRow>>> + Send;
}

/// An answer ready for storage; derived fields already graded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub attempt_id: i64,
    pub question_id: i64,
    pub option_id: Option<i64>,
    pub answer_text: Option<String>,
    pub is_correct: Option<bool>,
    pub points_earned: i64,
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum StartAttemptOutcome {
    /// A fresh attempt was created.
    Started(AttemptRow),
    /// The user's attempt count already meets the quiz's limit; nothing was
    /// created.
    LimitExceeded { attempts: i64, max_attempts: i64 },
    QuizNotFound,
}

pub enum SubmitAnswerOutcome {
    /// Answer stored; more questions remain open.
    Recorded { answered: i64, total_questions: i64 },
    /// The last open question was answered and the attempt completed as part
    /// of the same operation.
    Completed {
        attempt: CompletedAttempt,
        effects: Vec<Effect>,
    },
    /// The attempt is already completed; nothing was mutated.
    AlreadyCompleted,
    /// The question does not belong to the attempt's quiz; nothing was
    /// mutated.
    QuestionNotInQuiz,
    AttemptNotFound,
}

pub enum CompleteAttemptOutcome {
    Completed {
        attempt: CompletedAttempt,
        effects: Vec<Effect>,
    },
    /// Re-completing is a no-op; carries the frozen attempt state.
    AlreadyCompleted(AttemptRow),
    AttemptNotFound,
}

/// The frozen result of a completed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedAttempt {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: f64,
    pub passed: bool,
    pub completed_at: String,
}

/// Read-only view of an attempt for the request layer: progress counters
/// plus the advisory timing state.
#[derive(Debug, Serialize)]
pub struct AttemptStatus {
    pub attempt: AttemptRow,
    pub answered: i64,
    pub total_questions: i64,
    /// Minutes left, `None` for untimed quizzes.
    pub time_remaining_minutes: Option<i64>,
    /// Advisory only: submissions are still accepted after expiry.
    pub timed_out: bool,
    /// Minutes from start to completion, once completed.
    pub duration_minutes: Option<f64>,
}

// ---------------------------------------------------------------------------
// AssessmentService
// ---------------------------------------------------------------------------

pub struct AssessmentService<R: AssessmentRepository = Db> {
    repo: R,
}

impl<R: AssessmentRepository> AssessmentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn start_attempt(&self, user_id: i64, quiz_id: i64) -> Result<StartAttemptOutcome> {
        let Some(quiz) = self.repo.quiz_snapshot(quiz_id).await? else {
            return Ok(StartAttemptOutcome::QuizNotFound);
        };

        if let Some(max_attempts) = quiz.max_attempts {
            let attempts = self.repo.attempt_count(user_id, quiz_id).await?;
            if attempts >= max_attempts {
                return Ok(StartAttemptOutcome::LimitExceeded {
                    attempts,
                    max_attempts,
                });
            }
        }

        let token = Ulid::new().to_string();
        let started_at = utils::now_rfc3339();
        let attempt = self
            .repo
            .create_attempt(user_id, quiz_id, &token, &started_at)
            .await?;

        tracing::info!(
            "attempt {} started for quiz={quiz_id}, user={user_id}",
            attempt.id
        );
        Ok(StartAttemptOutcome::Started(attempt))
    }

    /// Upsert a graded answer; when it fills the last open question the
    /// attempt completes within this same operation. Completion is an
    /// emergent property of the answer count, not a separate UI action.
    pub async fn submit_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        option_id: Option<i64>,
        answer_text: Option<String>,
    ) -> Result<SubmitAnswerOutcome> {
        let Some(attempt) = self.repo.get_attempt(attempt_id).await? else {
            return Ok(SubmitAnswerOutcome::AttemptNotFound);
        };

        if attempt.is_completed() {
            return Ok(SubmitAnswerOutcome::AlreadyCompleted);
        }

        let quiz = self
            .repo
            .quiz_snapshot(attempt.quiz_id)
            .await?
            .ok_or_eyre("quiz missing for attempt")?;

        let Some(question) = quiz.question(question_id) else {
            return Ok(SubmitAnswerOutcome::QuestionNotInQuiz);
        };

        let graded = scoring::grade_answer(question, option_id, answer_text.as_deref());
        self.repo
            .upsert_answer(NewAnswer {
                attempt_id,
                question_id,
                option_id,
                answer_text,
                is_correct: graded.is_correct,
                points_earned: graded.points_earned,
            })
            .await?;

        let answered = self.repo.answered_count(attempt_id).await?;
        let total_questions = quiz.questions.len() as i64;

        if total_questions > 0 && answered >= total_questions {
            let completed = self.finalize(&attempt, &quiz).await?;
            let effects = vec![Effect::EvaluateAchievements {
                user_id: attempt.user_id,
            }];
            return Ok(SubmitAnswerOutcome::Completed {
                attempt: completed,
                effects,
            });
        }

        Ok(SubmitAnswerOutcome::Recorded {
            answered,
            total_questions,
        })
    }

    /// Complete an attempt explicitly. Idempotent: a completed attempt is
    /// returned frozen, nothing is recomputed.
    pub async fn complete_attempt(&self, attempt_id: i64) -> Result<CompleteAttemptOutcome> {
        let Some(attempt) = self.repo.get_attempt(attempt_id).await? else {
            return Ok(CompleteAttemptOutcome::AttemptNotFound);
        };

        if attempt.is_completed() {
            return Ok(CompleteAttemptOutcome::AlreadyCompleted(attempt));
        }

        let quiz = self
            .repo
            .quiz_snapshot(attempt.quiz_id)
            .await?
            .ok_or_eyre("quiz missing for attempt")?;

        let completed = self.finalize(&attempt, &quiz).await?;
        let effects = vec![Effect::EvaluateAchievements {
            user_id: attempt.user_id,
        }];
        Ok(CompleteAttemptOutcome::Completed {
            attempt: completed,
            effects,
        })
    }

    pub async fn attempt_status(&self, attempt_id: i64) -> Result<Option<AttemptStatus>> {
        let Some(attempt) = self.repo.get_attempt(attempt_id).await? else {
            return Ok(None);
        };

        let quiz = self
            .repo
            .quiz_snapshot(attempt.quiz_id)
            .await?
            .ok_or_eyre("quiz missing for attempt")?;

        let answered = self.repo.answered_count(attempt_id).await?;
        let started_at = utils::parse_timestamp(&attempt.started_at)?;
        let now = chrono::Utc::now();

        let duration_minutes = match &attempt.completed_at {
            Some(completed_at) => Some(scoring::duration_minutes(
                started_at,
                utils::parse_timestamp(completed_at)?,
            )),
            None => None,
        };

        Ok(Some(AttemptStatus {
            answered,
            total_questions: quiz.questions.len() as i64,
            time_remaining_minutes: scoring::time_remaining(
                quiz.time_limit_minutes,
                started_at,
                now,
            ),
            timed_out: scoring::is_timed_out(quiz.time_limit_minutes, started_at, now),
            duration_minutes,
            attempt,
        }))
    }

    pub async fn attempt_answers(&self, attempt_id: i64) -> Result<Vec<AnswerRow>> {
        self.repo.attempt_answers(attempt_id).await
    }

    /// Score the attempt and freeze it. Only called on in-progress attempts.
    async fn finalize(&self, attempt: &AttemptRow, quiz: &QuizSnapshot) -> Result<CompletedAttempt> {
        let earned = self.repo.earned_points(attempt.id).await?;
        let score = scoring::attempt_score(quiz.total_points(), earned);
        let passing_score = quiz.passing_score.unwrap_or(names::DEFAULT_PASSING_SCORE);
        let passed = score >= passing_score as f64;
        let completed_at = utils::now_rfc3339();

        self.repo
            .finalize_attempt(attempt.id, &completed_at, score, passed)
            .await?;

        tracing::info!(
            "attempt {} completed: score={score}, passed={passed}",
            attempt.id
        );

        Ok(CompletedAttempt {
            id: attempt.id,
            user_id: attempt.user_id,
            quiz_id: attempt.quiz_id,
            score,
            passed,
            completed_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Pure scoring rules: answer grading, percentage scores, attempt timing.
// No state, no errors - every input has a defined result.

use chrono::{DateTime, Utc};

use crate::db::models::QuestionSnapshot;
use crate::utils::round2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradedAnswer {
    /// `None` means ungraded: free-text answers wait for manual review.
    pub is_correct: Option<bool>,
    pub points_earned: i64,
}

/// Grade a submitted answer against its question. A selected option wins
/// over free text; an option id the question does not carry grades as
/// incorrect rather than erroring.
pub fn grade_answer(
    question: &QuestionSnapshot,
    option_id: Option<i64>,
    answer_text: Option<&str>,
) -> GradedAnswer {
    if let Some(option_id) = option_id {
        let correct = question
            .options
            .iter()
            .any(|o| o.id == option_id && o.is_correct);
        GradedAnswer {
            is_correct: Some(correct),
            points_earned: if correct { question.points } else { 0 },
        }
    } else if answer_text.is_some_and(|t| !t.trim().is_empty()) {
        GradedAnswer {
            is_correct: None,
            points_earned: 0,
        }
    } else {
        // Blank submission: counted as answered, graded as wrong.
        GradedAnswer {
            is_correct: Some(false),
            points_earned: 0,
        }
    }
}

/// Percentage score for an attempt, two decimal places. A quiz with no
/// points to earn scores 0, never an error.
pub fn attempt_score(total_points: i64, earned_points: i64) -> f64 {
    if total_points <= 0 {
        return 0.0;
    }
    round2(earned_points as f64 / total_points as f64 * 100.0)
}

/// Minutes left on a timed attempt, floored at zero. `None` when the quiz
/// has no time limit. Elapsed time rounds up to whole minutes.
pub fn time_remaining(
    time_limit_minutes: Option<i64>,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let limit = time_limit_minutes?;
    let elapsed_minutes = ((now - started_at).num_seconds() as f64 / 60.0).ceil() as i64;
    Some((limit - elapsed_minutes).max(0))
}

/// Whether a timed attempt has run out. Advisory: the engine never blocks
/// submissions on it, callers decide what to do with an expired attempt.
pub fn is_timed_out(
    time_limit_minutes: Option<i64>,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    matches!(time_remaining(time_limit_minutes, started_at, now), Some(0))
}

/// Wall-clock length of a finished attempt in minutes, two decimal places.
pub fn duration_minutes(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> f64 {
    round2((completed_at - started_at).num_seconds() as f64 / 60.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::models::OptionSnapshot;

    fn question(points: i64) -> QuestionSnapshot {
        QuestionSnapshot {
            id: 1,
            points,
            options: vec![
                OptionSnapshot {
                    id: 10,
                    is_correct: false,
                },
                OptionSnapshot {
                    id: 11,
                    is_correct: true,
                },
            ],
        }
    }

    #[test]
    fn correct_option_earns_full_points() {
        let graded = grade_answer(&question(5), Some(11), None);
        assert_eq!(graded.is_correct, Some(true));
        assert_eq!(graded.points_earned, 5);
    }

    #[test]
    fn incorrect_option_earns_nothing() {
        let graded = grade_answer(&question(5), Some(10), None);
        assert_eq!(graded.is_correct, Some(false));
        assert_eq!(graded.points_earned, 0);
    }

    #[test]
    fn unknown_option_id_grades_as_incorrect() {
        let graded = grade_answer(&question(5), Some(999), None);
        assert_eq!(graded.is_correct, Some(false));
        assert_eq!(graded.points_earned, 0);
    }

    #[test]
    fn free_text_is_ungraded_and_worth_nothing() {
        let graded = grade_answer(&question(5), None, Some("the mitochondria"));
        assert_eq!(graded.is_correct, None);
        assert_eq!(graded.points_earned, 0);
    }

    #[test]
    fn blank_submission_is_incorrect_not_rejected() {
        let graded = grade_answer(&question(5), None, None);
        assert_eq!(graded.is_correct, Some(false));
        assert_eq!(graded.points_earned, 0);

        let graded = grade_answer(&question(5), None, Some("   "));
        assert_eq!(graded.is_correct, Some(false));
    }

    #[test]
    fn option_takes_precedence_over_text() {
        let graded = grade_answer(&question(5), Some(11), Some("also some text"));
        assert_eq!(graded.is_correct, Some(true));
        assert_eq!(graded.points_earned, 5);
    }

    #[test]
    fn score_rounds_to_two_decimals() {
        // 5 of 15 points -> 33.333... -> 33.33
        assert_eq!(attempt_score(15, 5), 33.33);
        assert_eq!(attempt_score(3, 2), 66.67);
    }

    #[test]
    fn full_marks_score_one_hundred() {
        assert_eq!(attempt_score(15, 15), 100.0);
    }

    #[test]
    fn zero_total_points_scores_zero() {
        assert_eq!(attempt_score(0, 0), 0.0);
        assert_eq!(attempt_score(0, 10), 0.0);
    }

    #[test]
    fn untimed_quiz_has_no_remaining_time() {
        let start = Utc::now();
        assert_eq!(time_remaining(None, start, start), None);
        assert!(!is_timed_out(None, start, start));
    }

    #[test]
    fn remaining_time_counts_down_and_floors_at_zero() {
        let start = Utc::now();

        assert_eq!(time_remaining(Some(30), start, start), Some(30));

        // 61 seconds elapsed rounds up to 2 minutes spent.
        let later = start + Duration::seconds(61);
        assert_eq!(time_remaining(Some(30), start, later), Some(28));

        let way_later = start + Duration::minutes(45);
        assert_eq!(time_remaining(Some(30), start, way_later), Some(0));
        assert!(is_timed_out(Some(30), start, way_later));
    }

    #[test]
    fn duration_is_in_minutes() {
        let start = Utc::now();
        let end = start + Duration::seconds(90);
        assert_eq!(duration_minutes(start, end), 1.5);
    }
}

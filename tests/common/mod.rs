use learnhall::db::Db;
use learnhall::models::{
    CourseDefinition, LessonDefinition, OptionDefinition, QuestionDefinition, QuizDefinition,
};

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("learnhall_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("file:{}", path.display());
    Db::new(url, String::new())
        .await
        .expect("failed to create test database")
}

pub fn lessons(count: usize) -> Vec<LessonDefinition> {
    (0..count)
        .map(|i| LessonDefinition {
            title: format!("Lesson {}", i + 1),
        })
        .collect()
}

/// A single-question quiz where option "A" is the correct answer.
pub fn single_question_quiz(title: &str, max_attempts: Option<i64>) -> QuizDefinition {
    QuizDefinition {
        title: title.to_string(),
        passing_score: Some(70),
        time_limit_minutes: None,
        max_attempts,
        questions: vec![QuestionDefinition {
            content: format!("{title}: pick A"),
            points: 10,
            options: vec![
                OptionDefinition {
                    text: "A".to_string(),
                    is_answer: true,
                },
                OptionDefinition {
                    text: "B".to_string(),
                    is_answer: false,
                },
            ],
        }],
    }
}

/// Two questions worth 5 and 10 points, passing score 60.
pub fn two_question_quiz() -> QuizDefinition {
    QuizDefinition {
        title: "Checkpoint".to_string(),
        passing_score: Some(60),
        time_limit_minutes: None,
        max_attempts: Some(5),
        questions: vec![
            QuestionDefinition {
                content: "What is 2 + 3?".to_string(),
                points: 5,
                options: vec![
                    OptionDefinition {
                        text: "5".to_string(),
                        is_answer: true,
                    },
                    OptionDefinition {
                        text: "6".to_string(),
                        is_answer: false,
                    },
                ],
            },
            QuestionDefinition {
                content: "What is 4 * 4?".to_string(),
                points: 10,
                options: vec![
                    OptionDefinition {
                        text: "16".to_string(),
                        is_answer: true,
                    },
                    OptionDefinition {
                        text: "8".to_string(),
                        is_answer: false,
                    },
                ],
            },
        ],
    }
}

pub fn course(title: &str, lessons: Vec<LessonDefinition>, quizzes: Vec<QuizDefinition>) -> CourseDefinition {
    CourseDefinition {
        title: title.to_string(),
        lessons,
        quizzes,
    }
}

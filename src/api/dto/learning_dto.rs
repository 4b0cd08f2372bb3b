//! Lesson and quiz DTOs. Correct answers never leave the server here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserId;
use crate::domain::course::{Lesson, LessonRef};

/// Lesson entry for `GET /lessons`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonSummaryDto {
    /// Lesson slug.
    pub id: String,
    /// Title.
    pub title: String,
    /// Owning level.
    pub level_id: String,
    /// Owning unit.
    pub unit_id: String,
    /// XP for completing it.
    pub xp_reward: u32,
    /// Requires a premium plan.
    pub premium: bool,
    /// Quiz length.
    pub question_count: usize,
}

impl From<LessonRef<'_>> for LessonSummaryDto {
    fn from(found: LessonRef<'_>) -> Self {
        Self {
            id: found.lesson.id.clone(),
            title: found.lesson.title.clone(),
            level_id: found.level.id.clone(),
            unit_id: found.unit.id.clone(),
            xp_reward: found.lesson.xp_reward,
            premium: found.lesson.premium,
            question_count: found.lesson.questions.len(),
        }
    }
}

/// A quiz question without its answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionDto {
    /// Question id.
    pub id: String,
    /// Question text.
    pub prompt: String,
    /// Answer options.
    pub options: Vec<String>,
}

/// Lesson detail for `GET /lessons/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonDetailDto {
    /// Lesson slug.
    pub id: String,
    /// Title.
    pub title: String,
    /// Content summary.
    pub summary: String,
    /// Owning level.
    pub level_id: String,
    /// Owning unit.
    pub unit_id: String,
    /// XP for completing it.
    pub xp_reward: u32,
    /// Requires a premium plan.
    pub premium: bool,
    /// Quiz questions, answers hidden.
    pub questions: Vec<QuestionDto>,
}

impl From<LessonRef<'_>> for LessonDetailDto {
    fn from(found: LessonRef<'_>) -> Self {
        let Lesson {
            id,
            title,
            summary,
            xp_reward,
            premium,
            questions,
        } = found.lesson;
        Self {
            id: id.clone(),
            title: title.clone(),
            summary: summary.clone(),
            level_id: found.level.id.clone(),
            unit_id: found.unit.id.clone(),
            xp_reward: *xp_reward,
            premium: *premium,
            questions: questions
                .iter()
                .map(|q| QuestionDto {
                    id: q.id.clone(),
                    prompt: q.prompt.clone(),
                    options: q.options.clone(),
                })
                .collect(),
        }
    }
}

/// Request body for `POST /lessons/{id}/complete`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteLessonRequest {
    /// Learner.
    pub user_id: UserId,
}

/// Request body for `POST /lessons/{id}/quiz`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitQuizRequest {
    /// Learner.
    pub user_id: UserId,
    /// Chosen option index per question, in order.
    pub answers: Vec<usize>,
}

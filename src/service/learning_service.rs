//! Learning service: lesson completion, quizzes and course progress.
//!
//! Every flow runs under the learner's write lock and hands the awards to
//! [`GamificationService`]'s locked helpers, so a lesson's XP, unit and
//! level bonuses, streak and badges are applied as one step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::gamification_service::{
    AwardOutcome, AwardRequest, EarnedBadge, GamificationService, StreakOutcome,
};
use crate::domain::course::{Catalog, LessonRef, Unit};
use crate::domain::user::{Plan, QuizAttempt, UserRecord};
use crate::domain::{GamificationEvent, UserId, XpEventType};
use crate::error::ProgressiaError;

/// Result of completing a lesson.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LessonCompletion {
    /// Completed lesson.
    pub lesson_id: String,
    /// False when the lesson had already been completed.
    pub first_completion: bool,
    /// Lesson, unit, level and daily-goal awards, in order.
    pub awards: Vec<AwardOutcome>,
    /// XP added by this call, streak bonus included.
    pub xp_awarded: u64,
    /// Lifetime XP afterwards.
    pub total_xp: u64,
    /// Streak update.
    pub streak: StreakOutcome,
    /// The lesson finished its unit.
    pub unit_completed: bool,
    /// The lesson finished its level.
    pub level_completed: bool,
    /// Badges earned by this completion.
    pub new_badges: Vec<EarnedBadge>,
}

/// Per-question feedback.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionReview {
    /// Question id.
    pub question_id: String,
    /// Chosen option index.
    pub chosen: usize,
    /// Correct option index.
    pub correct_option: usize,
    /// Whether the answer was right.
    pub is_correct: bool,
    /// Explanation shown after answering.
    pub explanation: String,
}

/// Result of a quiz submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizResult {
    /// Lesson the quiz belongs to.
    pub lesson_id: String,
    /// Correct answers.
    pub correct: u32,
    /// Questions asked.
    pub total: u32,
    /// `correct * 100 / total`, rounded down.
    pub score_percent: u32,
    /// Met the pass threshold.
    pub passed: bool,
    /// Every answer was right.
    pub perfect: bool,
    /// QUIZ_PASS or QUIZ_PERFECT award.
    pub award: Option<AwardOutcome>,
    /// Daily goal bonus triggered by this quiz.
    pub daily_goal: Option<AwardOutcome>,
    /// Lifetime XP afterwards.
    pub total_xp: u64,
    /// Badges earned by this submission.
    pub new_badges: Vec<EarnedBadge>,
    /// Feedback per question.
    pub review: Vec<QuestionReview>,
}

/// Completion state of one lesson.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LessonStatus {
    /// Lesson id.
    pub lesson_id: String,
    /// Title.
    pub title: String,
    /// Completed at least once.
    pub completed: bool,
    /// The previous lesson is done (or this is the first one).
    pub unlocked: bool,
    /// Needs a premium plan.
    pub premium: bool,
}

/// Completion of one unit.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitProgress {
    /// Unit id.
    pub unit_id: String,
    /// Title.
    pub title: String,
    /// Lessons done.
    pub completed: usize,
    /// Lessons in the unit.
    pub total: usize,
    /// Rounded-down percentage.
    pub percent: u32,
    /// Lesson detail.
    pub lessons: Vec<LessonStatus>,
}

/// Completion of one level.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LevelProgress {
    /// Level id.
    pub level_id: String,
    /// Title.
    pub title: String,
    /// Lessons done.
    pub completed: usize,
    /// Lessons in the level.
    pub total: usize,
    /// Rounded-down percentage.
    pub percent: u32,
    /// Unit detail.
    pub units: Vec<UnitProgress>,
}

/// Course progress of one learner.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressView {
    /// Learner.
    pub user_id: UserId,
    /// Lessons done.
    pub completed: usize,
    /// Lessons in the catalog.
    pub total: usize,
    /// Rounded-down percentage.
    pub percent: u32,
    /// Level detail.
    pub levels: Vec<LevelProgress>,
}

/// Course flows on top of the gamification rules.
#[derive(Debug)]
pub struct LearningService {
    gamification: Arc<GamificationService>,
    catalog: Arc<Catalog>,
}

impl LearningService {
    /// Creates a new `LearningService`.
    #[must_use]
    pub fn new(gamification: Arc<GamificationService>, catalog: Arc<Catalog>) -> Self {
        Self {
            gamification,
            catalog,
        }
    }

    /// Returns the course catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Marks a lesson complete and applies every reward it triggers.
    ///
    /// Repeating a completed lesson is allowed; its keyed awards are
    /// reported as duplicates.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::LessonNotFound`], [`ProgressiaError::UserNotFound`],
    /// [`ProgressiaError::PremiumRequired`] or [`ProgressiaError::LessonLocked`].
    pub async fn complete_lesson(
        &self,
        user_id: UserId,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletion, ProgressiaError> {
        let found = self.find(lesson_id)?;
        let lesson = found.lesson;
        let lock = self.gamification.store().user(user_id).await?;
        let game = &self.gamification;
        let mut events = Vec::new();

        let completion = {
            let mut record = lock.write().await;
            self.check_access(&record, found)?;

            let first_completion = !record.completed_lessons.contains_key(&lesson.id);
            if first_completion {
                record.completed_lessons.insert(lesson.id.clone(), now);
                events.push(GamificationEvent::LessonCompleted {
                    user_id,
                    lesson_id: lesson.id.clone(),
                    timestamp: now,
                });
                tracing::info!(%user_id, lesson_id = %lesson.id, "lesson completed");
            }

            let mut awards = Vec::new();
            let request = AwardRequest::new(XpEventType::LessonComplete)
                .with_amount(lesson.xp_reward)
                .with_metadata(serde_json::json!({ "lesson_id": lesson.id }))
                .keyed(format!("lesson:{}", lesson.id));
            awards.push(game.award_locked(&mut record, request, now, &mut events).await?);

            let unit_completed = first_completion && unit_done(&record, found.unit);
            if unit_completed {
                let request = AwardRequest::new(XpEventType::UnitComplete)
                    .with_metadata(serde_json::json!({ "unit_id": found.unit.id }))
                    .keyed(format!("unit:{}", found.unit.id));
                awards.push(game.award_locked(&mut record, request, now, &mut events).await?);
            }

            let level_completed =
                unit_completed && found.level.units.iter().all(|unit| unit_done(&record, unit));
            if level_completed {
                let request = AwardRequest::new(XpEventType::LevelComplete)
                    .with_metadata(serde_json::json!({ "level_id": found.level.id }))
                    .keyed(format!("level:{}", found.level.id));
                awards.push(game.award_locked(&mut record, request, now, &mut events).await?);
            }

            let streak = game.streak_locked(&mut record, now, &mut events).await?;
            if let Some(goal) = game.daily_goal_locked(&mut record, now, &mut events).await? {
                awards.push(goal);
            }
            let new_badges = game.badges_locked(&mut record, now, &mut events);

            let xp_awarded: u64 = awards
                .iter()
                .chain(streak.bonus.as_ref())
                .map(|a| u64::from(a.awarded))
                .sum();

            LessonCompletion {
                lesson_id: lesson.id.clone(),
                first_completion,
                awards,
                xp_awarded,
                total_xp: record.total_xp(),
                streak,
                unit_completed,
                level_completed,
                new_badges,
            }
        };

        game.event_bus().publish_all(events);
        Ok(completion)
    }

    /// Grades a quiz and awards QUIZ_PASS or QUIZ_PERFECT.
    ///
    /// `answers[i]` is the chosen option index for question `i`.
    ///
    /// # Errors
    ///
    /// Same as [`LearningService::complete_lesson`], plus
    /// [`ProgressiaError::InvalidRequest`] when the answers do not fit the
    /// questions.
    pub async fn submit_quiz(
        &self,
        user_id: UserId,
        lesson_id: &str,
        answers: &[usize],
        now: DateTime<Utc>,
    ) -> Result<QuizResult, ProgressiaError> {
        let found = self.find(lesson_id)?;
        let lesson = found.lesson;
        if lesson.questions.is_empty() {
            return Err(ProgressiaError::InvalidRequest(format!(
                "la lección {} no tiene cuestionario",
                lesson.id
            )));
        }
        if answers.len() != lesson.questions.len() {
            return Err(ProgressiaError::InvalidRequest(format!(
                "se esperaban {} respuestas, llegaron {}",
                lesson.questions.len(),
                answers.len()
            )));
        }

        let mut review = Vec::with_capacity(answers.len());
        for (question, &chosen) in lesson.questions.iter().zip(answers) {
            if chosen >= question.options.len() {
                return Err(ProgressiaError::InvalidRequest(format!(
                    "opción {chosen} fuera de rango en la pregunta {}",
                    question.id
                )));
            }
            review.push(QuestionReview {
                question_id: question.id.clone(),
                chosen,
                correct_option: question.correct_option,
                is_correct: chosen == question.correct_option,
                explanation: question.explanation.clone(),
            });
        }

        let total = u32::try_from(review.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(review.iter().filter(|r| r.is_correct).count()).unwrap_or(0);
        let score_percent = correct.saturating_mul(100) / total;
        let passed = score_percent >= self.gamification.rules().quiz_pass_percent;
        let perfect = correct == total;

        let lock = self.gamification.store().user(user_id).await?;
        let game = &self.gamification;
        let mut events = Vec::new();

        let result = {
            let mut record = lock.write().await;
            self.check_access(&record, found)?;
            record.quiz_attempts.push(QuizAttempt {
                lesson_id: lesson.id.clone(),
                correct,
                total,
                passed,
                submitted_at: now,
            });
            tracing::info!(%user_id, lesson_id = %lesson.id, correct, total, passed, "quiz graded");

            let request = if perfect {
                Some(
                    AwardRequest::new(XpEventType::QuizPerfect)
                        .keyed(format!("quiz-perfect:{}", lesson.id)),
                )
            } else if passed {
                Some(
                    AwardRequest::new(XpEventType::QuizPass)
                        .keyed(format!("quiz-pass:{}", lesson.id)),
                )
            } else {
                None
            };
            let award = match request {
                Some(request) => {
                    let request = request.with_metadata(serde_json::json!({
                        "lesson_id": lesson.id,
                        "score_percent": score_percent,
                    }));
                    Some(game.award_locked(&mut record, request, now, &mut events).await?)
                }
                None => None,
            };
            let daily_goal = game.daily_goal_locked(&mut record, now, &mut events).await?;
            let new_badges = game.badges_locked(&mut record, now, &mut events);

            QuizResult {
                lesson_id: lesson.id.clone(),
                correct,
                total,
                score_percent,
                passed,
                perfect,
                award,
                daily_goal,
                total_xp: record.total_xp(),
                new_badges,
                review,
            }
        };

        game.event_bus().publish_all(events);
        Ok(result)
    }

    /// Completion aggregated per level and unit.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn progress(&self, user_id: UserId) -> Result<ProgressView, ProgressiaError> {
        let lock = self.gamification.store().user(user_id).await?;
        let record = lock.read().await;

        let mut previous_done = true;
        let mut levels = Vec::with_capacity(self.catalog.levels().len());
        for level in self.catalog.levels() {
            let mut units = Vec::with_capacity(level.units.len());
            for unit in &level.units {
                let lessons: Vec<LessonStatus> = unit
                    .lessons
                    .iter()
                    .map(|lesson| {
                        let completed = record.completed_lessons.contains_key(&lesson.id);
                        let status = LessonStatus {
                            lesson_id: lesson.id.clone(),
                            title: lesson.title.clone(),
                            completed,
                            unlocked: previous_done,
                            premium: lesson.premium,
                        };
                        previous_done = completed;
                        status
                    })
                    .collect();
                let completed = lessons.iter().filter(|l| l.completed).count();
                units.push(UnitProgress {
                    unit_id: unit.id.clone(),
                    title: unit.title.clone(),
                    completed,
                    total: lessons.len(),
                    percent: percent(completed, lessons.len()),
                    lessons,
                });
            }
            let completed: usize = units.iter().map(|u| u.completed).sum();
            let total: usize = units.iter().map(|u| u.total).sum();
            levels.push(LevelProgress {
                level_id: level.id.clone(),
                title: level.title.clone(),
                completed,
                total,
                percent: percent(completed, total),
                units,
            });
        }

        let completed: usize = levels.iter().map(|l| l.completed).sum();
        let total = self.catalog.total_lessons();
        Ok(ProgressView {
            user_id,
            completed,
            total,
            percent: percent(completed, total),
            levels,
        })
    }

    fn find(&self, lesson_id: &str) -> Result<LessonRef<'_>, ProgressiaError> {
        self.catalog
            .lesson(lesson_id)
            .ok_or_else(|| ProgressiaError::LessonNotFound(lesson_id.to_string()))
    }

    /// Paywall first, then the sequential unlock rule.
    fn check_access(&self, record: &UserRecord, found: LessonRef<'_>) -> Result<(), ProgressiaError> {
        let lesson = found.lesson;
        if lesson.premium && record.profile.plan == Plan::Free {
            return Err(ProgressiaError::PremiumRequired(lesson.id.clone()));
        }
        if let Some(previous) = self.catalog.previous_lesson(&lesson.id)
            && !record.completed_lessons.contains_key(&previous.id)
        {
            return Err(ProgressiaError::LessonLocked(lesson.id.clone()));
        }
        Ok(())
    }
}

fn unit_done(record: &UserRecord, unit: &Unit) -> bool {
    unit.lessons
        .iter()
        .all(|lesson| record.completed_lessons.contains_key(&lesson.id))
}

fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    u32::try_from(done.saturating_mul(100) / total).unwrap_or(100)
}

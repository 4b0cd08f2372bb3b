//! Service layer: business logic orchestration.
//!
//! [`GamificationService`] owns the XP, streak, badge and league rules.
//! [`LearningService`] and [`SocialService`] build lesson, quiz, friendship
//! and challenge flows on top of it. All of them emit events through the
//! [`super::domain::EventBus`].

pub mod gamification_service;
pub mod learning_service;
pub mod social_service;

pub use gamification_service::{AwardOutcome, AwardRequest, GamificationService};
pub use learning_service::LearningService;
pub use social_service::SocialService;

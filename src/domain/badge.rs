//! Static badge catalog and threshold predicates.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Counters the badge predicates are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeStats {
    /// Distinct lessons completed.
    pub lessons_completed: u32,
    /// Distinct lessons with a perfect quiz.
    pub perfect_quizzes: u32,
    /// Current streak in days.
    pub current_streak: u32,
    /// Lifetime XP.
    pub total_xp: u64,
    /// Challenges won.
    pub challenges_won: u32,
}

/// Achievement identifiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeCode {
    /// First lesson completed.
    Rookie,
    /// Ten lessons completed.
    Scholar,
    /// First perfect quiz.
    Perfectionist,
    /// Five perfect quizzes.
    QuizWhiz,
    /// Seven-day streak.
    OnFire,
    /// Thirty-day streak.
    Unstoppable,
    /// 1000 lifetime XP.
    XpHunter,
    /// First challenge won.
    Champion,
}

impl BadgeCode {
    /// The full catalog, in display order.
    pub const ALL: [Self; 8] = [
        Self::Rookie,
        Self::Scholar,
        Self::Perfectionist,
        Self::QuizWhiz,
        Self::OnFire,
        Self::Unstoppable,
        Self::XpHunter,
        Self::Champion,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rookie => "Novato",
            Self::Scholar => "Estudioso",
            Self::Perfectionist => "Perfeccionista",
            Self::QuizWhiz => "Genio de los quizzes",
            Self::OnFire => "En racha",
            Self::Unstoppable => "Imparable",
            Self::XpHunter => "Cazador de XP",
            Self::Champion => "Campeón",
        }
    }

    /// What it takes to earn the badge.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Rookie => "Completa tu primera lección",
            Self::Scholar => "Completa 10 lecciones",
            Self::Perfectionist => "Responde un quiz sin errores",
            Self::QuizWhiz => "Responde 5 quizzes sin errores",
            Self::OnFire => "Mantén una racha de 7 días",
            Self::Unstoppable => "Mantén una racha de 30 días",
            Self::XpHunter => "Acumula 1000 XP",
            Self::Champion => "Gana un reto contra tus amigos",
        }
    }

    /// Whether `stats` satisfies this badge's threshold.
    #[must_use]
    pub const fn is_met(self, stats: &BadgeStats) -> bool {
        match self {
            Self::Rookie => stats.lessons_completed >= 1,
            Self::Scholar => stats.lessons_completed >= 10,
            Self::Perfectionist => stats.perfect_quizzes >= 1,
            Self::QuizWhiz => stats.perfect_quizzes >= 5,
            Self::OnFire => stats.current_streak >= 7,
            Self::Unstoppable => stats.current_streak >= 30,
            Self::XpHunter => stats.total_xp >= 1000,
            Self::Champion => stats.challenges_won >= 1,
        }
    }
}

/// Badges whose condition holds for `stats` and that are not in `earned`.
pub fn newly_met<'a>(
    stats: &'a BadgeStats,
    earned: impl Fn(BadgeCode) -> bool + 'a,
) -> impl Iterator<Item = BadgeCode> + 'a {
    BadgeCode::ALL
        .into_iter()
        .filter(move |code| code.is_met(stats) && !earned(*code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rookie_needs_one_lesson() {
        let mut stats = BadgeStats::default();
        assert!(!BadgeCode::Rookie.is_met(&stats));
        stats.lessons_completed = 1;
        assert!(BadgeCode::Rookie.is_met(&stats));
        assert!(!BadgeCode::Scholar.is_met(&stats));
    }

    #[test]
    fn newly_met_skips_already_earned() {
        let stats = BadgeStats {
            lessons_completed: 12,
            perfect_quizzes: 1,
            ..BadgeStats::default()
        };
        let fresh: Vec<BadgeCode> = newly_met(&stats, |code| code == BadgeCode::Rookie).collect();
        assert_eq!(fresh, vec![BadgeCode::Scholar, BadgeCode::Perfectionist]);
    }

    #[test]
    fn streak_and_xp_thresholds() {
        let stats = BadgeStats {
            current_streak: 7,
            total_xp: 999,
            ..BadgeStats::default()
        };
        assert!(BadgeCode::OnFire.is_met(&stats));
        assert!(!BadgeCode::Unstoppable.is_met(&stats));
        assert!(!BadgeCode::XpHunter.is_met(&stats));
    }
}

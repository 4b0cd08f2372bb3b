//! Gamification service: XP awards, streaks, badges, daily goals and the
//! weekly leaderboard.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::GameRules;
use crate::domain::badge::{BadgeCode, newly_met};
use crate::domain::league::LeagueEntry;
use crate::domain::streak::{StreakTransition, streak_bonus};
use crate::domain::user::{Plan, Profile, UserRecord};
use crate::domain::xp::{MAX_AWARD, XpEvent, resolve_amount};
use crate::domain::{EventBus, GamificationEvent, League, Store, UserId, XpEventType};
use crate::error::ProgressiaError;

/// Longest accepted display name, in characters.
const MAX_DISPLAY_NAME: usize = 50;

/// Prefix applied to idempotency keys passed to [`GamificationService::award_xp`],
/// keeping them apart from the keys of lesson, quiz, streak, goal and
/// challenge awards.
pub const CLIENT_KEY_PREFIX: &str = "client:";

/// Input of a single XP award.
#[derive(Debug, Clone)]
pub struct AwardRequest {
    /// Activity kind.
    pub event_type: XpEventType,
    /// Explicit amount; the reward table applies when `None`.
    pub amount: Option<u32>,
    /// Free-form context stored with the event.
    pub metadata: Option<serde_json::Value>,
    /// Deduplication key; a repeated key awards nothing.
    pub idempotency_key: Option<String>,
}

impl AwardRequest {
    /// An award with the table amount and no key.
    #[must_use]
    pub const fn new(event_type: XpEventType) -> Self {
        Self {
            event_type,
            amount: None,
            metadata: None,
            idempotency_key: None,
        }
    }

    /// Sets an explicit amount.
    #[must_use]
    pub const fn with_amount(mut self, amount: u32) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the idempotency key.
    #[must_use]
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Result of an XP award.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AwardOutcome {
    /// Event that holds the XP (the earlier one for duplicates).
    pub xp_event_id: uuid::Uuid,
    /// Activity kind.
    #[serde(rename = "type")]
    pub event_type: XpEventType,
    /// XP added by this call; zero for duplicates.
    pub awarded: u32,
    /// Lifetime XP after the call.
    pub total_xp: u64,
    /// Weekly XP after the call.
    pub weekly_xp: u64,
    /// Weekly league after the call.
    pub league: League,
    /// The idempotency key had already been used.
    pub duplicate: bool,
}

/// Result of a streak update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StreakOutcome {
    /// What happened to the streak.
    pub transition: StreakTransition,
    /// Current streak after the update.
    pub current_streak: u32,
    /// Longest streak after the update.
    pub longest_streak: u32,
    /// Milestone bonus, when one was reached.
    pub bonus: Option<AwardOutcome>,
}

/// An earned badge with catalog data.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EarnedBadge {
    /// Badge code.
    pub code: BadgeCode,
    /// Display name.
    pub name: &'static str,
    /// Requirement text.
    pub description: &'static str,
    /// When it was earned.
    pub earned_at: DateTime<Utc>,
}

impl EarnedBadge {
    fn new(code: BadgeCode, earned_at: DateTime<Utc>) -> Self {
        Self {
            code,
            name: code.name(),
            description: code.description(),
            earned_at,
        }
    }
}

/// Profile plus derived gamification state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileSummary {
    /// Profile data.
    pub profile: Profile,
    /// Lifetime XP.
    pub total_xp: u64,
    /// XP earned this local day.
    pub today_xp: u64,
    /// Whether today's goal bonus was awarded.
    pub daily_goal_reached: bool,
    /// Streak as displayed now (zero once broken).
    pub current_streak: u32,
    /// Best streak.
    pub longest_streak: u32,
    /// Last qualifying activity.
    pub last_active_at: Option<DateTime<Utc>>,
    /// XP earned this week.
    pub weekly_xp: u64,
    /// Current weekly league.
    pub league: League,
    /// Lessons completed.
    pub lessons_completed: usize,
    /// Earned badge codes.
    pub badges: Vec<BadgeCode>,
}

/// Filters for [`GamificationService::leaderboard`].
#[derive(Debug, Clone, Default)]
pub struct LeaderboardQuery {
    /// Only this tier.
    pub league: Option<League>,
    /// Viewer; required for `friends_only`.
    pub user_id: Option<UserId>,
    /// Restrict to the viewer and their accepted friends.
    pub friends_only: bool,
    /// Maximum rows (1..=100).
    pub limit: usize,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// 1-based position after filtering.
    pub rank: usize,
    /// Participant.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// XP earned this week.
    pub weekly_xp: u64,
    /// Tier.
    pub league: League,
}

/// Current-week leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardView {
    /// Local Monday.
    pub week_start: NaiveDate,
    /// Local Sunday.
    pub week_end: NaiveDate,
    /// Ranked rows.
    pub entries: Vec<LeaderboardRow>,
}

/// Core gamification rules over the shared [`Store`].
///
/// Operations that touch one user follow the pattern: acquire the user's
/// write lock, mutate through the `*_locked` helpers while collecting
/// events, release, publish.
#[derive(Debug)]
pub struct GamificationService {
    store: Arc<Store>,
    event_bus: EventBus,
    rules: GameRules,
}

impl GamificationService {
    /// Creates a new `GamificationService`.
    #[must_use]
    pub fn new(store: Arc<Store>, event_bus: EventBus, rules: GameRules) -> Self {
        Self {
            store,
            event_bus,
            rules,
        }
    }

    /// Returns the shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Returns the event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the game rules.
    #[must_use]
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Registers a new learner.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::InvalidRequest`] for an empty or overlong name or a
    /// zero daily goal.
    pub async fn create_user(
        &self,
        display_name: &str,
        plan: Plan,
        daily_goal_xp: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Profile, ProgressiaError> {
        let display_name = display_name.trim();
        if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME {
            return Err(ProgressiaError::InvalidRequest(format!(
                "el nombre debe tener entre 1 y {MAX_DISPLAY_NAME} caracteres"
            )));
        }
        let daily_goal_xp = daily_goal_xp.unwrap_or(self.rules.default_daily_goal_xp);
        if !(1..=MAX_AWARD).contains(&daily_goal_xp) {
            return Err(ProgressiaError::InvalidRequest(format!(
                "la meta diaria debe estar entre 1 y {MAX_AWARD} XP"
            )));
        }
        let profile = Profile {
            id: UserId::new(),
            display_name: display_name.to_string(),
            plan,
            daily_goal_xp,
            created_at: now,
        };
        self.store.insert_user(UserRecord::new(profile.clone())).await?;
        tracing::info!(user_id = %profile.id, ?plan, "user registered");
        Ok(profile)
    }

    /// Changes a learner's subscription plan.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn set_plan(&self, user_id: UserId, plan: Plan) -> Result<Profile, ProgressiaError> {
        let lock = self.store.user(user_id).await?;
        let mut record = lock.write().await;
        record.profile.plan = plan;
        tracing::info!(%user_id, ?plan, "plan changed");
        Ok(record.profile.clone())
    }

    /// Profile with totals, streak, league and badges as of `now`.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn profile(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<ProfileSummary, ProgressiaError> {
        let lock = self.store.user(user_id).await?;
        let record = lock.read().await;
        let calendar = &self.rules.calendar;
        let today = calendar.local_date(now);
        let (from, to) = calendar.day_range_utc(today);
        let (week_start, _) = calendar.week_bounds(now);
        let (weekly_xp, league) = self.weekly_standing(user_id, week_start).await;

        Ok(ProfileSummary {
            profile: record.profile.clone(),
            total_xp: record.total_xp(),
            today_xp: record.xp_between(from, to, |_| true),
            daily_goal_reached: record.award_for_key(&daily_goal_key(today)).is_some(),
            current_streak: record.streak.effective_current(now, calendar),
            longest_streak: record.streak.longest_streak,
            last_active_at: record.streak.last_active_at,
            weekly_xp,
            league,
            lessons_completed: record.completed_lessons.len(),
            badges: record.badges.keys().copied().collect(),
        })
    }

    /// Appends an XP event and updates the weekly league projection.
    ///
    /// A caller key is stored as `client:<key>`, so it can never collide
    /// with the keys of awards the service grants itself.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users and
    /// [`ProgressiaError::InvalidRequest`] for an explicit amount outside
    /// `1..=10000`.
    pub async fn award_xp(
        &self,
        user_id: UserId,
        request: AwardRequest,
        now: DateTime<Utc>,
    ) -> Result<AwardOutcome, ProgressiaError> {
        let request = AwardRequest {
            idempotency_key: request
                .idempotency_key
                .map(|key| format!("{CLIENT_KEY_PREFIX}{key}")),
            ..request
        };
        let lock = self.store.user(user_id).await?;
        let mut events = Vec::new();
        let outcome = {
            let mut record = lock.write().await;
            self.award_locked(&mut record, request, now, &mut events).await?
        };
        self.event_bus.publish_all(events);
        Ok(outcome)
    }

    /// Records one qualifying activity on the user's streak.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn update_streak(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<StreakOutcome, ProgressiaError> {
        let lock = self.store.user(user_id).await?;
        let mut events = Vec::new();
        let outcome = {
            let mut record = lock.write().await;
            self.streak_locked(&mut record, now, &mut events).await?
        };
        self.event_bus.publish_all(events);
        Ok(outcome)
    }

    /// Awards every badge whose condition now holds and is not yet earned.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn check_and_award_badges(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<EarnedBadge>, ProgressiaError> {
        let lock = self.store.user(user_id).await?;
        let mut events = Vec::new();
        let earned = {
            let mut record = lock.write().await;
            self.badges_locked(&mut record, now, &mut events)
        };
        self.event_bus.publish_all(events);
        Ok(earned)
    }

    /// Every badge the user has earned.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn badges(&self, user_id: UserId) -> Result<Vec<EarnedBadge>, ProgressiaError> {
        let lock = self.store.user(user_id).await?;
        let record = lock.read().await;
        Ok(record
            .badges
            .iter()
            .map(|(&code, &at)| EarnedBadge::new(code, at))
            .collect())
    }

    /// The user's XP log, newest first.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn xp_events(&self, user_id: UserId) -> Result<Vec<XpEvent>, ProgressiaError> {
        let lock = self.store.user(user_id).await?;
        let record = lock.read().await;
        Ok(record.xp_events.iter().rev().cloned().collect())
    }

    /// Ranked standings of the current league week.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::InvalidRequest`] when `friends_only` is set without
    /// a viewer, [`ProgressiaError::UserNotFound`] for an unknown viewer.
    pub async fn leaderboard(
        &self,
        query: LeaderboardQuery,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardView, ProgressiaError> {
        let scope = match (query.friends_only, query.user_id) {
            (true, None) => {
                return Err(ProgressiaError::InvalidRequest(
                    "friends_only requiere user_id".to_string(),
                ));
            }
            (true, Some(viewer)) => {
                self.store.ensure_users(&[viewer]).await?;
                let mut circle = self.store.friends().read().await.friends_of(viewer);
                circle.push(viewer);
                Some(circle)
            }
            (false, Some(viewer)) => {
                self.store.ensure_users(&[viewer]).await?;
                None
            }
            (false, None) => None,
        };

        let (week_start, week_end) = self.rules.calendar.week_bounds(now);
        let standings: Vec<LeagueEntry> = {
            let board = self.store.leagues().read().await;
            board
                .week(week_start)
                .map(|week| board.standings(week.id))
                .unwrap_or_default()
        };

        let limit = query.limit.clamp(1, 100);
        let selected: Vec<LeagueEntry> = standings
            .into_iter()
            .filter(|e| query.league.is_none_or(|league| e.league == league))
            .filter(|e| scope.as_ref().is_none_or(|circle| circle.contains(&e.user_id)))
            .take(limit)
            .collect();

        let ids: Vec<UserId> = selected.iter().map(|e| e.user_id).collect();
        let names = self.store.display_names(&ids).await;
        let entries = selected
            .into_iter()
            .enumerate()
            .map(|(i, e)| LeaderboardRow {
                rank: i.saturating_add(1),
                display_name: names.get(&e.user_id).cloned().unwrap_or_default(),
                user_id: e.user_id,
                weekly_xp: e.weekly_xp,
                league: e.league,
            })
            .collect();

        Ok(LeaderboardView {
            week_start,
            week_end,
            entries,
        })
    }

    // ── Locked helpers ──────────────────────────────────────────────────
    //
    // Callers hold the user's write lock for the whole sequence so that
    // one activity's awards, streak and badges land atomically.

    /// Awards XP on an already-locked record.
    pub(crate) async fn award_locked(
        &self,
        record: &mut UserRecord,
        request: AwardRequest,
        now: DateTime<Utc>,
        events: &mut Vec<GamificationEvent>,
    ) -> Result<AwardOutcome, ProgressiaError> {
        let user_id = record.profile.id;
        let (week_start, week_end) = self.rules.calendar.week_bounds(now);

        if let Some(key) = request.idempotency_key.as_deref()
            && let Some(existing) = record.award_for_key(key)
        {
            let (xp_event_id, event_type) = (existing.id, existing.event_type);
            let (weekly_xp, league) = self.weekly_standing(user_id, week_start).await;
            tracing::debug!(%user_id, key, "duplicate award ignored");
            return Ok(AwardOutcome {
                xp_event_id,
                event_type,
                awarded: 0,
                total_xp: record.total_xp(),
                weekly_xp,
                league,
                duplicate: true,
            });
        }

        let amount = resolve_amount(request.event_type, request.amount).ok_or_else(|| {
            ProgressiaError::InvalidRequest(format!(
                "la cantidad de XP debe estar entre 1 y {MAX_AWARD}"
            ))
        })?;
        let xp_event_id = uuid::Uuid::new_v4();
        record.push_event(XpEvent {
            id: xp_event_id,
            user_id,
            event_type: request.event_type,
            amount,
            metadata: request.metadata.unwrap_or(serde_json::Value::Null),
            idempotency_key: request.idempotency_key,
            created_at: now,
        });

        let update = {
            let mut board = self.store.leagues().write().await;
            let week = board.ensure_week(week_start, week_end, now);
            board.record_xp(week.id, user_id, u64::from(amount), now)
        };
        let total_xp = record.total_xp();

        tracing::info!(
            %user_id,
            kind = request.event_type.as_str(),
            amount,
            total_xp,
            weekly_xp = update.entry.weekly_xp,
            "xp awarded"
        );

        events.push(GamificationEvent::XpAwarded {
            user_id,
            xp_event_id,
            kind: request.event_type,
            amount,
            total_xp,
            weekly_xp: update.entry.weekly_xp,
            timestamp: now,
        });
        if update.league_changed() {
            let from = update.previous;
            tracing::info!(%user_id, ?from, to = ?update.entry.league, "league changed");
            events.push(GamificationEvent::LeagueChanged {
                user_id,
                week_start,
                from,
                to: update.entry.league,
                timestamp: now,
            });
        }

        Ok(AwardOutcome {
            xp_event_id,
            event_type: request.event_type,
            awarded: amount,
            total_xp,
            weekly_xp: update.entry.weekly_xp,
            league: update.entry.league,
            duplicate: false,
        })
    }

    /// Streak update on an already-locked record, including the milestone
    /// bonus.
    pub(crate) async fn streak_locked(
        &self,
        record: &mut UserRecord,
        now: DateTime<Utc>,
        events: &mut Vec<GamificationEvent>,
    ) -> Result<StreakOutcome, ProgressiaError> {
        let calendar = self.rules.calendar;
        let transition = record.streak.record_activity(now, &calendar);
        let current_streak = record.streak.current_streak;

        if transition != StreakTransition::Unchanged {
            events.push(GamificationEvent::StreakUpdated {
                user_id: record.profile.id,
                transition,
                current_streak,
                longest_streak: record.streak.longest_streak,
                timestamp: now,
            });
        }

        let mut bonus = None;
        if transition == StreakTransition::Continued
            && let Some(xp) = streak_bonus(current_streak)
        {
            let today = calendar.local_date(now);
            let request = AwardRequest::new(XpEventType::StreakBonus)
                .with_amount(xp)
                .with_metadata(serde_json::json!({ "streak_days": current_streak }))
                .keyed(format!("streak-bonus:{today}"));
            bonus = Some(self.award_locked(record, request, now, events).await?);
        }

        Ok(StreakOutcome {
            transition,
            current_streak,
            longest_streak: record.streak.longest_streak,
            bonus,
        })
    }

    /// Awards DAILY_GOAL once per local day when the day's XP reaches the
    /// user's goal.
    pub(crate) async fn daily_goal_locked(
        &self,
        record: &mut UserRecord,
        now: DateTime<Utc>,
        events: &mut Vec<GamificationEvent>,
    ) -> Result<Option<AwardOutcome>, ProgressiaError> {
        let calendar = self.rules.calendar;
        let today = calendar.local_date(now);
        let key = daily_goal_key(today);
        if record.award_for_key(&key).is_some() {
            return Ok(None);
        }
        let (from, to) = calendar.day_range_utc(today);
        let earned = record.xp_between(from, to, |kind| kind != XpEventType::DailyGoal);
        let goal = record.profile.daily_goal_xp;
        if earned < u64::from(goal) {
            return Ok(None);
        }
        let request = AwardRequest::new(XpEventType::DailyGoal)
            .with_metadata(serde_json::json!({ "date": today, "goal_xp": goal }))
            .keyed(key);
        self.award_locked(record, request, now, events).await.map(Some)
    }

    /// Badge check on an already-locked record.
    pub(crate) fn badges_locked(
        &self,
        record: &mut UserRecord,
        now: DateTime<Utc>,
        events: &mut Vec<GamificationEvent>,
    ) -> Vec<EarnedBadge> {
        let stats = record.badge_stats();
        let fresh: Vec<EarnedBadge> = newly_met(&stats, |code| record.badges.contains_key(&code))
            .map(|code| EarnedBadge::new(code, now))
            .collect();
        let user_id = record.profile.id;
        for badge in &fresh {
            record.badges.insert(badge.code, now);
            tracing::info!(%user_id, badge = ?badge.code, "badge earned");
            events.push(GamificationEvent::BadgeEarned {
                user_id,
                badge: badge.code,
                timestamp: now,
            });
        }
        fresh
    }

    /// Weekly XP and league of `user_id` for the week starting at
    /// `week_start`; `(0, Bronze)` when there is no entry yet.
    async fn weekly_standing(&self, user_id: UserId, week_start: NaiveDate) -> (u64, League) {
        let board = self.store.leagues().read().await;
        board
            .week(week_start)
            .and_then(|week| board.entry(week.id, user_id))
            .map_or((0, League::Bronze), |e| (e.weekly_xp, e.league))
    }
}

fn daily_goal_key(date: NaiveDate) -> String {
    format!("daily-goal:{date}")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 18, 0, 0)
            .single()
            .unwrap_or_default()
    }

    fn make_service() -> GamificationService {
        GamificationService::new(Arc::new(Store::new()), EventBus::new(1000), GameRules::default())
    }

    async fn make_user(service: &GamificationService, name: &str) -> UserId {
        let Ok(profile) = service.create_user(name, Plan::Free, None, noon(2)).await else {
            panic!("user creation failed");
        };
        profile.id
    }

    #[tokio::test]
    async fn total_equals_sum_of_awards() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let mut sum = 0u64;
        for (i, kind) in XpEventType::ALL.into_iter().enumerate() {
            let Ok(outcome) = service
                .award_xp(user, AwardRequest::new(kind), noon(2) + Duration::minutes(i as i64))
                .await
            else {
                panic!("award failed");
            };
            sum += u64::from(outcome.awarded);
            assert_eq!(outcome.total_xp, sum);
        }
        let Ok(profile) = service.profile(user, noon(2)).await else {
            panic!("profile failed");
        };
        assert_eq!(profile.total_xp, sum);
    }

    #[tokio::test]
    async fn award_emits_xp_event() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let mut rx = service.event_bus().subscribe();
        let _ = service.award_xp(user, AwardRequest::new(XpEventType::LessonComplete), noon(2)).await;
        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "xp_awarded");
    }

    #[tokio::test]
    async fn weekly_league_promotes_at_threshold() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let Ok(first) = service
            .award_xp(user, AwardRequest::new(XpEventType::LessonComplete).with_amount(199), noon(2))
            .await
        else {
            panic!("award failed");
        };
        assert_eq!(first.league, League::Bronze);

        let mut rx = service.event_bus().subscribe();
        let Ok(second) = service
            .award_xp(user, AwardRequest::new(XpEventType::LessonComplete).with_amount(1), noon(3))
            .await
        else {
            panic!("award failed");
        };
        assert_eq!(second.weekly_xp, 200);
        assert_eq!(second.league, League::Silver);

        let _ = rx.recv().await;
        let Ok(GamificationEvent::LeagueChanged { from, to, .. }) = rx.recv().await else {
            panic!("expected league change");
        };
        assert_eq!((from, to), (League::Bronze, League::Silver));
    }

    #[tokio::test]
    async fn first_award_of_the_week_above_bronze_reports_a_league_change() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let mut rx = service.event_bus().subscribe();
        let Ok(outcome) = service
            .award_xp(user, AwardRequest::new(XpEventType::LessonComplete).with_amount(250), noon(2))
            .await
        else {
            panic!("award failed");
        };
        assert_eq!(outcome.league, League::Silver);

        let _ = rx.recv().await;
        let Ok(GamificationEvent::LeagueChanged { from, to, .. }) = rx.recv().await else {
            panic!("expected league change");
        };
        assert_eq!((from, to), (League::Bronze, League::Silver));
    }

    #[tokio::test]
    async fn new_week_starts_from_zero() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        // 2026-03-13 is a Friday, 2026-03-16 the next Monday.
        let _ = service
            .award_xp(user, AwardRequest::new(XpEventType::LessonComplete).with_amount(600), noon(13))
            .await;
        let Ok(next) = service
            .award_xp(user, AwardRequest::new(XpEventType::LessonComplete), noon(16))
            .await
        else {
            panic!("award failed");
        };
        assert_eq!(next.weekly_xp, 10);
        assert_eq!(next.league, League::Bronze);
        assert_eq!(next.total_xp, 610);
    }

    #[tokio::test]
    async fn idempotency_key_prevents_double_award() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let request = AwardRequest::new(XpEventType::QuizPass).keyed("quiz-pass:presupuesto-101");
        let Ok(first) = service.award_xp(user, request.clone(), noon(2)).await else {
            panic!("award failed");
        };
        let Ok(second) = service.award_xp(user, request, noon(2)).await else {
            panic!("award failed");
        };
        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(second.awarded, 0);
        assert_eq!(second.xp_event_id, first.xp_event_id);
        assert_eq!(second.total_xp, 15);
        assert_eq!(second.weekly_xp, 15);
    }

    #[tokio::test]
    async fn retry_with_a_used_key_is_a_duplicate_even_with_a_bad_amount() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let request = AwardRequest::new(XpEventType::QuizPass).keyed("retry-1");
        let Ok(_) = service.award_xp(user, request.clone(), noon(2)).await else {
            panic!("award failed");
        };
        let Ok(retry) = service.award_xp(user, request.with_amount(0), noon(2)).await else {
            panic!("retry should be reported as a duplicate");
        };
        assert!(retry.duplicate);
        assert_eq!(retry.total_xp, 15);
    }

    #[tokio::test]
    async fn caller_keys_cannot_claim_streak_bonus_keys() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let squat = AwardRequest::new(XpEventType::ChallengeParticipate).keyed("streak-bonus:2026-03-08");
        let Ok(claimed) = service.award_xp(user, squat, noon(2)).await else {
            panic!("award failed");
        };
        assert!(!claimed.duplicate);

        let mut bonus = None;
        for day in 2..=8 {
            let Ok(outcome) = service.update_streak(user, noon(day)).await else {
                panic!("streak failed");
            };
            bonus = outcome.bonus;
        }
        let Some(bonus) = bonus else {
            panic!("expected the seven-day bonus");
        };
        assert!(!bonus.duplicate);
        assert_eq!(bonus.event_type, XpEventType::StreakBonus);
        assert_eq!(bonus.awarded, 50);
        assert_eq!(bonus.total_xp, 60);
    }

    #[tokio::test]
    async fn rejects_out_of_range_amounts_and_unknown_users() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let zero = AwardRequest::new(XpEventType::LessonComplete).with_amount(0);
        assert!(matches!(
            service.award_xp(user, zero, noon(2)).await,
            Err(ProgressiaError::InvalidRequest(_))
        ));
        assert!(matches!(
            service
                .award_xp(UserId::new(), AwardRequest::new(XpEventType::LessonComplete), noon(2))
                .await,
            Err(ProgressiaError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_awards_do_not_lose_weekly_xp() {
        let service = Arc::new(make_service());
        let user = make_user(&service, "Ana").await;
        let mut handles = Vec::new();
        for _ in 0..50 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .award_xp(user, AwardRequest::new(XpEventType::LessonComplete), noon(2))
                    .await
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
        let Ok(profile) = service.profile(user, noon(2)).await else {
            panic!("profile failed");
        };
        assert_eq!(profile.total_xp, 500);
        assert_eq!(profile.weekly_xp, 500);
        assert_eq!(profile.league, League::Gold);
    }

    #[tokio::test]
    async fn same_day_streak_update_is_a_no_op() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let Ok(first) = service.update_streak(user, noon(2)).await else {
            panic!("streak failed");
        };
        let Ok(second) = service.update_streak(user, noon(2) + Duration::hours(4)).await else {
            panic!("streak failed");
        };
        assert_eq!(first.current_streak, 1);
        assert_eq!(second.transition, StreakTransition::Unchanged);
        assert_eq!(second.current_streak, 1);
    }

    #[tokio::test]
    async fn seventh_day_awards_streak_bonus_once() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let mut last = None;
        for day in 2..=8 {
            let Ok(outcome) = service.update_streak(user, noon(day)).await else {
                panic!("streak failed");
            };
            if day < 8 {
                assert!(outcome.bonus.is_none(), "no bonus on day {day}");
            }
            last = Some(outcome);
        }
        let Some(last) = last else {
            panic!("no outcome");
        };
        assert_eq!(last.current_streak, 7);
        let Some(bonus) = last.bonus else {
            panic!("expected bonus");
        };
        assert_eq!(bonus.event_type, XpEventType::StreakBonus);
        assert_eq!(bonus.awarded, 50);

        let Ok(again) = service.update_streak(user, noon(8) + Duration::hours(1)).await else {
            panic!("streak failed");
        };
        assert!(again.bonus.is_none());
    }

    #[tokio::test]
    async fn thirty_day_streak_pays_both_milestones_and_unlocks_unstoppable() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        let mut bonuses = Vec::new();
        for day in 1..=31 {
            let now = noon(1) + Duration::days(day - 1);
            let Ok(outcome) = service.update_streak(user, now).await else {
                panic!("streak failed");
            };
            assert_eq!(i64::from(outcome.current_streak), day);
            if let Some(bonus) = outcome.bonus {
                bonuses.push((day, bonus.awarded));
            }
        }
        assert_eq!(bonuses, vec![(7, 50), (30, 150)]);

        let end = noon(1) + Duration::days(30);
        let Ok(earned) = service.check_and_award_badges(user, end).await else {
            panic!("badge check failed");
        };
        let codes: Vec<BadgeCode> = earned.iter().map(|b| b.code).collect();
        assert!(codes.contains(&BadgeCode::OnFire));
        assert!(codes.contains(&BadgeCode::Unstoppable));

        let Ok(profile) = service.profile(user, end).await else {
            panic!("profile failed");
        };
        assert_eq!(profile.total_xp, 200);
        assert_eq!(profile.longest_streak, 31);
    }

    #[tokio::test]
    async fn badges_are_never_revoked() {
        let service = make_service();
        let user = make_user(&service, "Ana").await;
        for day in 2..=8 {
            let _ = service.update_streak(user, noon(day)).await;
        }
        let Ok(earned) = service.check_and_award_badges(user, noon(8)).await else {
            panic!("badge check failed");
        };
        let codes: Vec<BadgeCode> = earned.iter().map(|b| b.code).collect();
        assert_eq!(codes, vec![BadgeCode::OnFire]);

        // Break the streak: the condition no longer holds, the badge stays.
        let _ = service.update_streak(user, noon(12)).await;
        let Ok(again) = service.check_and_award_badges(user, noon(12)).await else {
            panic!("badge check failed");
        };
        assert!(again.is_empty());
        let Ok(all) = service.badges(user).await else {
            panic!("badges failed");
        };
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn leaderboard_ranks_and_filters() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        let sofia = make_user(&service, "Sofía").await;
        for (user, xp) in [(ana, 120), (luis, 640), (sofia, 250)] {
            let _ = service
                .award_xp(user, AwardRequest::new(XpEventType::LessonComplete).with_amount(xp), noon(3))
                .await;
        }

        let query = LeaderboardQuery {
            limit: 10,
            ..LeaderboardQuery::default()
        };
        let Ok(board) = service.leaderboard(query, noon(4)).await else {
            panic!("leaderboard failed");
        };
        let names: Vec<&str> = board.entries.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["Luis", "Sofía", "Ana"]);
        assert_eq!(board.entries.first().map(|r| r.rank), Some(1));

        let silver = LeaderboardQuery {
            league: Some(League::Silver),
            limit: 10,
            ..LeaderboardQuery::default()
        };
        let Ok(board) = service.leaderboard(silver, noon(4)).await else {
            panic!("leaderboard failed");
        };
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries.first().map(|r| r.user_id), Some(sofia));

        let friends = LeaderboardQuery {
            friends_only: true,
            user_id: Some(ana),
            limit: 10,
            ..LeaderboardQuery::default()
        };
        let Ok(board) = service.leaderboard(friends, noon(4)).await else {
            panic!("leaderboard failed");
        };
        assert_eq!(board.entries.len(), 1);
    }

    #[tokio::test]
    async fn friends_only_requires_viewer() {
        let service = make_service();
        let query = LeaderboardQuery {
            friends_only: true,
            limit: 10,
            ..LeaderboardQuery::default()
        };
        assert!(matches!(
            service.leaderboard(query, noon(2)).await,
            Err(ProgressiaError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn create_user_validates_input() {
        let service = make_service();
        assert!(service.create_user("  ", Plan::Free, None, noon(2)).await.is_err());
        assert!(service.create_user("Ana", Plan::Free, Some(0), noon(2)).await.is_err());
        let Ok(profile) = service.create_user(" Ana ", Plan::Premium, None, noon(2)).await else {
            panic!("user creation failed");
        };
        assert_eq!(profile.display_name, "Ana");
        assert_eq!(profile.daily_goal_xp, 50);
    }
}

//! Social service: friendships and friend challenges.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::gamification_service::{AwardRequest, GamificationService};
use crate::domain::challenge::{Challenge, ChallengeStatus, NewChallenge, winners};
use crate::domain::social::{Friendship, FriendshipStatus};
use crate::domain::{ChallengeId, GamificationEvent, UserId, XpEventType};
use crate::error::ProgressiaError;

/// A friend (or pending request) as seen by one user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FriendView {
    /// The other user.
    pub user_id: UserId,
    /// Their display name.
    pub display_name: String,
    /// Request state.
    pub status: FriendshipStatus,
    /// The other user sent the request.
    pub incoming: bool,
    /// When the request was made.
    pub since: DateTime<Utc>,
}

/// One participant's progress in a challenge.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeStanding {
    /// Participant.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// XP earned inside the window, challenge rewards excluded.
    pub xp: u64,
}

/// A challenge with live standings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeView {
    /// The challenge.
    pub challenge: Challenge,
    /// Participants by progress, best first.
    pub standings: Vec<ChallengeStanding>,
}

/// Friend graph and challenge lifecycle.
#[derive(Debug)]
pub struct SocialService {
    gamification: Arc<GamificationService>,
}

impl SocialService {
    /// Creates a new `SocialService`.
    #[must_use]
    pub fn new(gamification: Arc<GamificationService>) -> Self {
        Self { gamification }
    }

    /// Sends a friend request.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`], or the graph's
    /// [`ProgressiaError::InvalidRequest`] / [`ProgressiaError::Conflict`].
    pub async fn request_friend(
        &self,
        requester: UserId,
        addressee: UserId,
        now: DateTime<Utc>,
    ) -> Result<Friendship, ProgressiaError> {
        let store = self.gamification.store();
        store.ensure_users(&[requester, addressee]).await?;
        let edge = store.friends().write().await.request(requester, addressee, now)?;
        tracing::info!(%requester, %addressee, "friend request sent");
        Ok(edge)
    }

    /// Accepts a pending request sent by `requester` to `addressee`.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`], [`ProgressiaError::FriendshipNotFound`]
    /// or [`ProgressiaError::Conflict`] when already accepted.
    pub async fn accept_friend(
        &self,
        addressee: UserId,
        requester: UserId,
    ) -> Result<Friendship, ProgressiaError> {
        let store = self.gamification.store();
        store.ensure_users(&[addressee, requester]).await?;
        let edge = store.friends().write().await.accept(addressee, requester)?;
        tracing::info!(%requester, %addressee, "friend request accepted");
        Ok(edge)
    }

    /// Friends and pending requests of `user_id`.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::UserNotFound`] for unknown users.
    pub async fn friends(&self, user_id: UserId) -> Result<Vec<FriendView>, ProgressiaError> {
        let store = self.gamification.store();
        store.ensure_users(&[user_id]).await?;
        let edges = store.friends().read().await.edges_of(user_id);
        let others: Vec<UserId> = edges.iter().map(|e| e.other(user_id)).collect();
        let names = store.display_names(&others).await;
        Ok(edges
            .into_iter()
            .map(|edge| {
                let other = edge.other(user_id);
                FriendView {
                    user_id: other,
                    display_name: names.get(&other).cloned().unwrap_or_default(),
                    status: edge.status,
                    incoming: edge.addressee == user_id,
                    since: edge.created_at,
                }
            })
            .collect())
    }

    /// Starts a challenge between the creator and accepted friends.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::InvalidRequest`] for shape violations,
    /// [`ProgressiaError::UserNotFound`] for unknown participants and
    /// [`ProgressiaError::NotFriends`] for an invitee who is not an accepted
    /// friend.
    pub async fn create_challenge(
        &self,
        request: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Challenge, ProgressiaError> {
        request.validate()?;
        let store = self.gamification.store();
        let mut everyone = vec![request.creator];
        everyone.extend(request.invitees.iter().copied());
        store.ensure_users(&everyone).await?;

        {
            let graph = store.friends().read().await;
            if let Some(stranger) = request
                .invitees
                .iter()
                .find(|&&invitee| !graph.are_friends(request.creator, invitee))
            {
                return Err(ProgressiaError::NotFriends(*stranger.as_uuid()));
            }
        }

        let challenge = request.start(now);
        store
            .challenges()
            .write()
            .await
            .insert(challenge.id, challenge.clone());
        tracing::info!(
            challenge_id = %challenge.id,
            kind = ?challenge.kind,
            participants = challenge.participants.len(),
            "challenge created"
        );
        Ok(challenge)
    }

    /// A challenge with current standings.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::ChallengeNotFound`] for unknown ids.
    pub async fn challenge_standings(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<ChallengeView, ProgressiaError> {
        let challenge = self
            .gamification
            .store()
            .challenges()
            .read()
            .await
            .get(&challenge_id)
            .cloned()
            .ok_or(ProgressiaError::ChallengeNotFound(*challenge_id.as_uuid()))?;
        let progress = self.progress_of(&challenge).await?;
        self.view(challenge, &progress).await
    }

    /// Resolves a challenge that is due at `now`.
    ///
    /// # Errors
    ///
    /// [`ProgressiaError::ChallengeNotFound`], [`ProgressiaError::ChallengeClosed`]
    /// when already resolved, or [`ProgressiaError::Conflict`] while it is
    /// still running and no one reached the goal.
    pub async fn resolve_challenge(
        &self,
        challenge_id: ChallengeId,
        now: DateTime<Utc>,
    ) -> Result<ChallengeView, ProgressiaError> {
        self.resolve_if_due(challenge_id, now).await?.ok_or_else(|| {
            ProgressiaError::Conflict(format!("el reto {challenge_id} sigue en curso"))
        })
    }

    /// Resolves every active challenge that is due; returns their ids.
    pub async fn resolve_due_challenges(&self, now: DateTime<Utc>) -> Vec<ChallengeId> {
        let active: Vec<ChallengeId> = self
            .gamification
            .store()
            .challenges()
            .read()
            .await
            .values()
            .filter(|c| c.status == ChallengeStatus::Active)
            .map(|c| c.id)
            .collect();

        let mut resolved = Vec::new();
        for challenge_id in active {
            match self.resolve_if_due(challenge_id, now).await {
                Ok(Some(_)) => resolved.push(challenge_id),
                Ok(None) | Err(ProgressiaError::ChallengeClosed(_)) => {}
                Err(err) => {
                    tracing::warn!(%challenge_id, error = %err, "challenge resolution failed");
                }
            }
        }
        resolved
    }

    /// Marks the challenge completed under the challenges lock, then hands
    /// out rewards. The status flip happens at most once per challenge.
    async fn resolve_if_due(
        &self,
        challenge_id: ChallengeId,
        now: DateTime<Utc>,
    ) -> Result<Option<ChallengeView>, ProgressiaError> {
        let (challenge, progress) = {
            let mut map = self.gamification.store().challenges().write().await;
            let challenge = map
                .get_mut(&challenge_id)
                .ok_or(ProgressiaError::ChallengeNotFound(*challenge_id.as_uuid()))?;
            if challenge.status == ChallengeStatus::Completed {
                return Err(ProgressiaError::ChallengeClosed(*challenge_id.as_uuid()));
            }
            let progress = self.progress_of(challenge).await?;
            if !challenge.is_due(now, &progress) {
                return Ok(None);
            }
            challenge.status = ChallengeStatus::Completed;
            challenge.winners = winners(&progress);
            challenge.completed_at = Some(now);
            (challenge.clone(), progress)
        };

        let game = &self.gamification;
        let mut events = Vec::new();
        for &participant in &challenge.participants {
            let won = challenge.winners.contains(&participant);
            let request = if won {
                AwardRequest::new(XpEventType::ChallengeWin)
                    .keyed(format!("challenge-win:{challenge_id}"))
            } else {
                AwardRequest::new(XpEventType::ChallengeParticipate)
                    .keyed(format!("challenge:{challenge_id}"))
            }
            .with_metadata(serde_json::json!({ "challenge_id": challenge_id }));

            let lock = game.store().user(participant).await?;
            let mut record = lock.write().await;
            game.award_locked(&mut record, request, now, &mut events).await?;
            if won {
                record.challenges_won = record.challenges_won.saturating_add(1);
            }
            game.badges_locked(&mut record, now, &mut events);
        }

        tracing::info!(
            %challenge_id,
            winners = challenge.winners.len(),
            "challenge resolved"
        );
        events.push(GamificationEvent::ChallengeCompleted {
            challenge_id,
            participants: challenge.participants.clone(),
            winners: challenge.winners.clone(),
            timestamp: now,
        });
        game.event_bus().publish_all(events);

        self.view(challenge, &progress).await.map(Some)
    }

    /// XP each participant earned inside the window, challenge rewards
    /// excluded.
    async fn progress_of(
        &self,
        challenge: &Challenge,
    ) -> Result<BTreeMap<UserId, u64>, ProgressiaError> {
        let mut progress = BTreeMap::new();
        for &participant in &challenge.participants {
            let lock = self.gamification.store().user(participant).await?;
            let xp = lock.read().await.xp_between(
                challenge.starts_at,
                challenge.ends_at,
                |kind| !kind.is_challenge_reward(),
            );
            progress.insert(participant, xp);
        }
        Ok(progress)
    }

    async fn view(
        &self,
        challenge: Challenge,
        progress: &BTreeMap<UserId, u64>,
    ) -> Result<ChallengeView, ProgressiaError> {
        let names = self
            .gamification
            .store()
            .display_names(&challenge.participants)
            .await;
        let mut standings: Vec<ChallengeStanding> = progress
            .iter()
            .map(|(&user_id, &xp)| ChallengeStanding {
                user_id,
                display_name: names.get(&user_id).cloned().unwrap_or_default(),
                xp,
            })
            .collect();
        standings.sort_by(|a, b| b.xp.cmp(&a.xp).then(a.user_id.cmp(&b.user_id)));
        Ok(ChallengeView {
            challenge,
            standings,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::GameRules;
    use crate::domain::challenge::ChallengeKind;
    use crate::domain::user::Plan;
    use crate::domain::{EventBus, Store};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0)
            .single()
            .unwrap_or_default()
    }

    fn make_service() -> SocialService {
        SocialService::new(Arc::new(GamificationService::new(
            Arc::new(Store::new()),
            EventBus::new(1000),
            GameRules::default(),
        )))
    }

    async fn make_user(service: &SocialService, name: &str) -> UserId {
        let Ok(profile) = service
            .gamification
            .create_user(name, Plan::Free, None, start())
            .await
        else {
            panic!("user creation failed");
        };
        profile.id
    }

    async fn befriend(service: &SocialService, a: UserId, b: UserId) {
        let Ok(_) = service.request_friend(a, b, start()).await else {
            panic!("request failed");
        };
        let Ok(_) = service.accept_friend(b, a).await else {
            panic!("accept failed");
        };
    }

    async fn earn(service: &SocialService, user: UserId, xp: u32, at: DateTime<Utc>) {
        let request = AwardRequest::new(XpEventType::LessonComplete).with_amount(xp);
        let Ok(_) = service.gamification.award_xp(user, request, at).await else {
            panic!("award failed");
        };
    }

    fn duel(creator: UserId, rival: UserId, goal_xp: Option<u64>) -> NewChallenge {
        NewChallenge {
            kind: ChallengeKind::Duel,
            title: "Duelo del ahorro".into(),
            creator,
            invitees: vec![rival],
            goal_xp,
            duration_days: 7,
        }
    }

    #[tokio::test]
    async fn friendship_flow() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        let Ok(pending) = service.request_friend(ana, luis, start()).await else {
            panic!("request failed");
        };
        assert_eq!(pending.status, FriendshipStatus::Pending);

        // Only the addressee can accept.
        assert!(matches!(
            service.accept_friend(ana, luis).await,
            Err(ProgressiaError::FriendshipNotFound)
        ));
        let Ok(accepted) = service.accept_friend(luis, ana).await else {
            panic!("accept failed");
        };
        assert_eq!(accepted.status, FriendshipStatus::Accepted);

        let Ok(friends) = service.friends(luis).await else {
            panic!("friends failed");
        };
        assert_eq!(friends.len(), 1);
        let Some(view) = friends.first() else {
            panic!("missing friend");
        };
        assert_eq!(view.display_name, "Ana");
        assert!(view.incoming);
    }

    #[tokio::test]
    async fn challenges_require_accepted_friends() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        let _ = service.request_friend(ana, luis, start()).await;
        assert!(matches!(
            service.create_challenge(duel(ana, luis, None), start()).await,
            Err(ProgressiaError::NotFriends(_))
        ));
        assert!(matches!(
            service.create_challenge(duel(ana, UserId::new(), None), start()).await,
            Err(ProgressiaError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn reaching_the_goal_resolves_once() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        befriend(&service, ana, luis).await;
        let Ok(challenge) = service.create_challenge(duel(ana, luis, Some(100)), start()).await
        else {
            panic!("create failed");
        };

        let later = start() + Duration::hours(1);
        earn(&service, ana, 40, later).await;
        assert!(matches!(
            service.resolve_challenge(challenge.id, later).await,
            Err(ProgressiaError::Conflict(_))
        ));

        earn(&service, luis, 120, later).await;
        let Ok(view) = service.resolve_challenge(challenge.id, later).await else {
            panic!("resolve failed");
        };
        assert_eq!(view.challenge.status, ChallengeStatus::Completed);
        assert_eq!(view.challenge.winners, vec![luis]);
        assert_eq!(view.standings.first().map(|s| s.user_id), Some(luis));

        assert!(matches!(
            service.resolve_challenge(challenge.id, later).await,
            Err(ProgressiaError::ChallengeClosed(_))
        ));

        let Ok(luis_badges) = service.gamification.badges(luis).await else {
            panic!("badges failed");
        };
        assert!(luis_badges.iter().any(|b| b.code == crate::domain::badge::BadgeCode::Champion));
        let Ok(ana_summary) = service.gamification.profile(ana, later).await else {
            panic!("profile failed");
        };
        // 40 earned + 10 for taking part.
        assert_eq!(ana_summary.total_xp, 50);
        let Ok(luis_summary) = service.gamification.profile(luis, later).await else {
            panic!("profile failed");
        };
        assert_eq!(luis_summary.total_xp, 120 + 50);
    }

    #[tokio::test]
    async fn sweep_resolves_expired_challenges_with_ties() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        befriend(&service, ana, luis).await;
        let Ok(challenge) = service.create_challenge(duel(ana, luis, None), start()).await else {
            panic!("create failed");
        };
        earn(&service, ana, 30, start() + Duration::days(1)).await;
        earn(&service, luis, 30, start() + Duration::days(2)).await;
        // Outside the window: does not count.
        earn(&service, luis, 500, start() + Duration::days(8)).await;

        assert!(service.resolve_due_challenges(start() + Duration::days(6)).await.is_empty());
        let resolved = service.resolve_due_challenges(start() + Duration::days(8)).await;
        assert_eq!(resolved, vec![challenge.id]);

        let Ok(view) = service.challenge_standings(challenge.id).await else {
            panic!("standings failed");
        };
        assert_eq!(view.challenge.winners.len(), 2);
        assert!(view.standings.iter().all(|s| s.xp == 30));

        assert!(service.resolve_due_challenges(start() + Duration::days(9)).await.is_empty());
    }

    #[tokio::test]
    async fn nobody_wins_without_xp() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        befriend(&service, ana, luis).await;
        let Ok(challenge) = service.create_challenge(duel(ana, luis, None), start()).await else {
            panic!("create failed");
        };
        let Ok(view) = service
            .resolve_challenge(challenge.id, start() + Duration::days(7))
            .await
        else {
            panic!("resolve failed");
        };
        assert!(view.challenge.winners.is_empty());
        let Ok(summary) = service.gamification.profile(ana, start() + Duration::days(7)).await
        else {
            panic!("profile failed");
        };
        assert_eq!(summary.total_xp, 10);
    }

    #[tokio::test]
    async fn challenge_completion_is_published() {
        let service = make_service();
        let ana = make_user(&service, "Ana").await;
        let luis = make_user(&service, "Luis").await;
        befriend(&service, ana, luis).await;
        let Ok(challenge) = service.create_challenge(duel(ana, luis, None), start()).await else {
            panic!("create failed");
        };
        let mut rx = service.gamification.event_bus().subscribe();
        let _ = service
            .resolve_challenge(challenge.id, start() + Duration::days(7))
            .await;
        let mut saw_completion = false;
        while let Ok(event) = rx.try_recv() {
            if let GamificationEvent::ChallengeCompleted { challenge_id, .. } = event {
                saw_completion = challenge_id == challenge.id;
            }
        }
        assert!(saw_completion);
    }
}

//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use super::handlers::{lessons, social, system, users};

/// Generated OpenAPI 3 document.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Progressia Gamification API",
        description = "XP, streaks, weekly leagues, badges, lessons and friend challenges."
    ),
    paths(
        system::health_handler,
        system::rewards_handler,
        users::create_user,
        users::get_user,
        users::set_plan,
        users::award_xp,
        users::list_xp_events,
        users::list_badges,
        users::get_progress,
        users::list_friends,
        lessons::list_lessons,
        lessons::get_lesson,
        lessons::complete_lesson,
        lessons::submit_quiz,
        social::request_friend,
        social::accept_friend,
        social::leaderboard,
        social::create_challenge,
        social::get_challenge,
        social::resolve_challenge,
    ),
    tags(
        (name = "System", description = "Health and rule catalog"),
        (name = "Users", description = "Profiles, XP and progress"),
        (name = "Lessons", description = "Course catalog, completion and quizzes"),
        (name = "Social", description = "Friends and the weekly leaderboard"),
        (name = "Challenges", description = "Time-boxed XP competitions"),
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/swagger-ui`, serving the document at
/// `/api-docs/openapi.json`.
#[cfg(feature = "swagger-ui")]
#[must_use]
pub fn swagger_ui() -> utoipa_swagger_ui::SwaggerUi {
    utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/config/rewards",
            "/api/v1/users/{id}/xp",
            "/api/v1/lessons/{id}/quiz",
            "/api/v1/leaderboard",
            "/api/v1/challenges/{id}/resolve",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

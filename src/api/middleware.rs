use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::api::AppState;
use crate::error::ApiError;
use crate::session::SESSION_COOKIE;

/// Pages reachable without a session.
const PUBLIC_PAGES: [&str; 4] = ["/", "/home", "/sign-in", "/sign-up"];

/// Non-page routes reachable without a session.
const PUBLIC_ROUTES: [&str; 4] = ["/health", "/metrics", "/api/videos", "/api/videos/cards"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PAGES.contains(&path) || PUBLIC_ROUTES.contains(&path)
}

/// Session boundary. Signed-in users landing on a public page other than
/// `/home` are sent to `/home`; anonymous users get 401 on private API routes
/// and a redirect to `/sign-in` elsewhere.
pub async fn auth_middleware(
    Extension(state): Extension<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let user = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.verify(cookie.value()));

    match user {
        Some(user) => {
            if PUBLIC_PAGES.contains(&path.as_str()) && path != "/home" {
                return Redirect::to("/home").into_response();
            }
            tracing::Span::current().record("user_id", user.0.as_str());
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None if is_public(&path) => next.run(request).await,
        None if path.starts_with("/api") => ApiError::Unauthorized.into_response(),
        None => Redirect::to("/sign-in").into_response(),
    }
}

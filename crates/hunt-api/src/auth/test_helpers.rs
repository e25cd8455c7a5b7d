//! Test helpers for authentication.
//!
//! Lets unit tests call authenticated endpoints without a session store.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hunt_core::{Role, User};

/// Extension type for injecting a test user into requests.
#[derive(Clone)]
pub struct TestUser(pub User);

impl TestUser {
    /// An admin that does not exist in the database.
    pub fn admin() -> Self {
        TestUser(User::new("admin@test.local", "Test Admin", "not_used", Role::Admin))
    }

    /// A player that does not exist in the database.
    pub fn player() -> Self {
        TestUser(User::new("player@test.local", "Test Player", "not_used", Role::Player))
    }
}

/// Middleware that injects a test user into the request extensions.
///
/// ```ignore
/// let router = routes()
///     .with_state(state)
///     .layer(middleware::from_fn_with_state(TestUser::admin(), inject_test_user));
/// ```
pub async fn inject_test_user(
    State(test_user): State<TestUser>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(test_user);
    next.run(request).await
}

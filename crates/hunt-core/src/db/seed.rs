//! Database seeding utilities.
//!
//! Creates the default admin account on first start so the admin API is
//! reachable before any other user exists.

use super::{DbError, UserRepository};
use crate::auth::{password::hash_password, Role, User};
use rand::Rng;
use tracing::{info, warn};

/// Email of the seeded admin account.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";

/// Environment variable holding the seeded admin password.
pub const ADMIN_PASSWORD_ENV: &str = "HUNT_ADMIN_PASSWORD";

/// Errors raised while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Password(#[from] crate::auth::password::PasswordError),
}

/// Ensures a default admin user exists.
///
/// If no users exist, creates `admin@localhost` with the password from
/// `HUNT_ADMIN_PASSWORD` or a generated one.
///
/// Returns `Ok(Some(password))` when an admin was created, `Ok(None)` when
/// users already exist.
pub async fn ensure_admin_user(users: &dyn UserRepository) -> Result<Option<String>, SeedError> {
    if users.any_exist().await? {
        info!("Users already exist, skipping admin seed");
        return Ok(None);
    }

    let password = std::env::var(ADMIN_PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| {
            warn!("No {} set, generated random password", ADMIN_PASSWORD_ENV);
            generate_secure_password()
        });

    let password_hash = hash_password(&password)?;
    let admin = User::new(DEFAULT_ADMIN_EMAIL, "Administrator", password_hash, Role::Admin);
    users.create(&admin).await?;

    info!(email = DEFAULT_ADMIN_EMAIL, "Created default admin user");

    Ok(Some(password))
}

/// Generates a 16 character password with at least one upper-case letter,
/// lower-case letter, digit and symbol.
pub fn generate_secure_password() -> String {
    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
    const DIGITS: &[u8] = b"23456789";
    const SPECIAL: &[u8] = b"!@#$%^&*";

    let mut rng = rand::thread_rng();
    let mut password: Vec<char> = [UPPER, LOWER, DIGITS, SPECIAL]
        .iter()
        .map(|set| set[rng.gen_range(0..set.len())] as char)
        .collect();

    let all: Vec<u8> = [UPPER, LOWER, DIGITS, SPECIAL].concat();
    while password.len() < 16 {
        password.push(all[rng.gen_range(0..all.len())] as char);
    }

    // Fisher-Yates so the guaranteed characters are not always first.
    for i in (1..password.len()).rev() {
        let j = rng.gen_range(0..=i);
        password.swap(i, j);
    }

    password.into_iter().collect()
}

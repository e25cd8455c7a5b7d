//! View-state holders for the admin commands.
//!
//! Each view owns the data it displays, a pending flag and a visible error
//! string. Failures never escape a view; they are stored in `error` and
//! logged.

use anyhow::Error;
use chrono::{DateTime, Utc};
use hunt_api::dto::{
    ClaimAttemptStatsResponse, CreateHuntItemRequest, HuntItemResponse, UpdateHuntItemRequest,
    UserClaimAttemptResponse, UserDetail,
};
use hunt_core::{ClaimAttempt, ClearPolicy, RateLimitPolicy, RateLimitStatus};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::api_client::{AdminApi, ClaimAttemptFilters};

fn describe(context: &str, err: &Error) -> String {
    format!("{}: {:#}", context, err)
}

// ============================================================================
// Hunt items
// ============================================================================

/// Input for a new hunt item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuntItemForm {
    pub name: String,
    pub description: String,
    pub identifier: String,
    pub points: i64,
}

impl HuntItemForm {
    fn to_request(&self) -> CreateHuntItemRequest {
        CreateHuntItemRequest {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            identifier: self.identifier.trim().to_string(),
            points: self.points,
        }
    }
}

/// Hunt item list with create, update and two-step delete.
pub struct HuntItemsView {
    api: Arc<dyn AdminApi>,
    pub items: Vec<HuntItemResponse>,
    pub form: HuntItemForm,
    pub loading: bool,
    pub submitting: bool,
    pub pending_delete: Option<Uuid>,
    pub error: Option<String>,
}

impl HuntItemsView {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            items: Vec::new(),
            form: HuntItemForm::default(),
            loading: false,
            submitting: false,
            pending_delete: None,
            error: None,
        }
    }

    fn fail(&mut self, context: &str, err: Error) {
        error!(error = %err, "{}", context);
        self.error = Some(describe(context, &err));
    }

    /// Reloads the item list from the server.
    pub async fn refresh(&mut self) {
        self.loading = true;
        self.error = None;
        match self.api.list_hunt_items().await {
            Ok(items) => self.items = items,
            Err(e) => self.fail("Failed to load hunt items", e),
        }
        self.loading = false;
    }

    /// Submits the form as a new item.
    ///
    /// `submitting` is set for the duration of the request. The `&mut self`
    /// receiver already rules out a second create on the same view, so the
    /// flag is display state only and a value left behind by a dropped
    /// future does not block the next submission.
    pub async fn submit_create(&mut self) -> bool {
        self.submitting = true;
        self.error = None;

        let request = self.form.to_request();
        let created = match self.api.create_hunt_item(&request).await {
            Ok(item) => {
                info!(id = %item.id, name = %item.name, "Hunt item created");
                self.items.insert(0, item);
                self.form = HuntItemForm::default();
                true
            }
            Err(e) => {
                self.fail("Failed to create hunt item", e);
                false
            }
        };

        self.submitting = false;
        created
    }

    /// Applies a partial update and replaces the item in the list.
    pub async fn update(&mut self, id: Uuid, changes: UpdateHuntItemRequest) -> bool {
        self.error = None;
        match self.api.update_hunt_item(id, &changes).await {
            Ok(updated) => {
                if let Some(slot) = self.items.iter_mut().find(|item| item.id == id) {
                    *slot = updated;
                }
                true
            }
            Err(e) => {
                self.fail("Failed to update hunt item", e);
                false
            }
        }
    }

    /// Marks an item for deletion; nothing is sent until confirmed.
    pub fn request_delete(&mut self, id: Uuid) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the item marked by [`request_delete`](Self::request_delete).
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.pending_delete.take() else {
            return false;
        };
        self.error = None;
        match self.api.delete_hunt_item(id).await {
            Ok(()) => {
                self.items.retain(|item| item.id != id);
                true
            }
            Err(e) => {
                self.fail("Failed to delete hunt item", e);
                false
            }
        }
    }
}

// ============================================================================
// Claim attempts
// ============================================================================

/// Claim attempts across users, with a confirmed clear action.
pub struct ClaimAttemptsView {
    api: Arc<dyn AdminApi>,
    pub filters: ClaimAttemptFilters,
    pub attempts: Vec<UserClaimAttemptResponse>,
    pub stats: ClaimAttemptStatsResponse,
    pub loading: bool,
    pub pending_clear: Option<(String, ClearPolicy)>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ClaimAttemptsView {
    pub fn new(api: Arc<dyn AdminApi>, filters: ClaimAttemptFilters) -> Self {
        Self {
            api,
            filters,
            attempts: Vec::new(),
            stats: ClaimAttemptStatsResponse::default(),
            loading: false,
            pending_clear: None,
            message: None,
            error: None,
        }
    }

    fn fail(&mut self, context: &str, err: Error) {
        error!(error = %err, "{}", context);
        self.error = Some(describe(context, &err));
    }

    pub async fn refresh(&mut self) {
        self.loading = true;
        self.error = None;
        match self.api.list_claim_attempts(&self.filters).await {
            Ok(response) => {
                self.attempts = response.claim_attempts;
                self.stats = response.stats;
            }
            Err(e) => self.fail("Failed to load claim attempts", e),
        }
        self.loading = false;
    }

    pub fn request_clear(&mut self, email: impl Into<String>, policy: ClearPolicy) {
        self.pending_clear = Some((email.into(), policy));
    }

    pub fn cancel_clear(&mut self) {
        self.pending_clear = None;
    }

    /// Sends the pending clear and reloads the listing on success.
    pub async fn confirm_clear(&mut self) -> bool {
        let Some((email, policy)) = self.pending_clear.take() else {
            return false;
        };
        self.error = None;
        self.message = None;
        match self.api.clear_claim_attempts(&email, policy).await {
            Ok(response) => {
                info!(
                    email = %email,
                    policy = policy.as_str(),
                    removed = response.removed,
                    "Claim attempts cleared"
                );
                self.message = Some(response.message);
                self.refresh().await;
                true
            }
            Err(e) => {
                self.fail("Failed to clear claim attempts", e);
                false
            }
        }
    }
}

// ============================================================================
// User history
// ============================================================================

/// One user's history and attempts, scoped to an open/close cycle.
pub struct UserHistoryView {
    api: Arc<dyn AdminApi>,
    policy: RateLimitPolicy,
    pub user: Option<UserDetail>,
    pub loading: bool,
    pub error: Option<String>,
}

impl UserHistoryView {
    pub fn new(api: Arc<dyn AdminApi>, policy: RateLimitPolicy) -> Self {
        Self {
            api,
            policy,
            user: None,
            loading: false,
            error: None,
        }
    }

    fn reset(&mut self) {
        self.user = None;
        self.loading = false;
        self.error = None;
    }

    /// Clears any previous user, then fetches `id`.
    pub async fn open(&mut self, id: Uuid) {
        self.reset();
        self.loading = true;
        match self.api.get_user(id).await {
            Ok(user) => self.user = Some(user),
            Err(e) => {
                error!(error = %e, user_id = %id, "Failed to load user");
                self.error = Some(describe("Failed to load user", &e));
            }
        }
        self.loading = false;
    }

    pub fn close(&mut self) {
        self.reset();
    }

    /// Rate-limit state of the loaded user as of `now`.
    ///
    /// Evaluated from the fetched attempts on every call, so it changes as
    /// failures age out of the window without a refetch.
    pub fn rate_limit(&self, now: DateTime<Utc>) -> Option<RateLimitStatus> {
        let user = self.user.as_ref()?;
        let attempts: Vec<ClaimAttempt> = user
            .claim_attempts
            .iter()
            .cloned()
            .map(ClaimAttempt::from)
            .collect();
        Some(self.policy.evaluate(&attempts, now))
    }

    pub fn total_points(&self) -> i64 {
        self.user.as_ref().map_or(0, |user| user.total_points)
    }
}

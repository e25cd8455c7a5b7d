//! Metric names and recording helpers.
//!
//! Counters are recorded through the `metrics` facade; the Prometheus
//! recorder installed by [`install_prometheus_recorder`] renders them at
//! `/metrics`.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Claim attempts by outcome (`success`, `failed`, `rate_limited`).
pub const CLAIM_ATTEMPTS_TOTAL: &str = "hunt_claim_attempts_total";

/// Admin clears of claim attempts by policy.
pub const CLAIM_ATTEMPT_CLEARS_TOTAL: &str = "hunt_claim_attempt_clears_total";

/// Hunt item mutations by action (`create`, `update`, `delete`).
pub const HUNT_ITEM_MUTATIONS_TOTAL: &str = "hunt_item_mutations_total";

/// Claim attempts removed by admin clears.
pub const CLAIM_ATTEMPTS_REMOVED_TOTAL: &str = "hunt_claim_attempts_removed_total";

/// Registers metric descriptions.
/// This should be called once during server initialization.
pub fn register_metrics() {
    describe_counter!(CLAIM_ATTEMPTS_TOTAL, "Claim attempts by outcome");
    describe_counter!(
        CLAIM_ATTEMPT_CLEARS_TOTAL,
        "Admin clears of claim attempts by policy"
    );
    describe_counter!(
        CLAIM_ATTEMPTS_REMOVED_TOTAL,
        "Claim attempts removed by admin clears"
    );
    describe_counter!(HUNT_ITEM_MUTATIONS_TOTAL, "Hunt item mutations by action");
}

/// Installs the global Prometheus recorder and registers descriptions.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}

/// Records a claim attempt outcome.
pub fn record_claim_attempt(outcome: &'static str) {
    counter!(CLAIM_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Records an admin clear and how many attempts it removed.
pub fn record_claim_attempt_clear(policy: &'static str, removed: u64) {
    counter!(CLAIM_ATTEMPT_CLEARS_TOTAL, "policy" => policy).increment(1);
    counter!(CLAIM_ATTEMPTS_REMOVED_TOTAL, "policy" => policy).increment(removed);
}

/// Records a hunt item mutation.
pub fn record_hunt_item_mutation(action: &'static str) {
    counter!(HUNT_ITEM_MUTATIONS_TOTAL, "action" => action).increment(1);
}

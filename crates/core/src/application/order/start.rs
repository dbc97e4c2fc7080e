// Start Order Use Case

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::application::bridge::WorkerBridge;
use crate::domain::{Job, JobSnapshot, JobStore};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider, WorkerSpawner, WorkerSpec};

/// Card slots the worker knows how to select on the payment page
pub const KNOWN_CARDS: &[&str] = &["primary", "backup"];

/// Processing modes
pub const KNOWN_MODES: &[&str] = &["order", "quote"];

/// Only links on the wholesale site itself may be handed to the worker
pub const QUOTE_LINK_DOMAIN: &str = "sdwholesale.com";

fn default_card() -> String {
    "primary".to_string()
}

fn default_mode() -> String {
    "order".to_string()
}

/// Start request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOrderRequest {
    pub order_number: String,

    #[serde(default = "default_card")]
    pub card: String,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default)]
    pub quote_link: Option<String>,
}

/// Synchronous request validation, performed before any process is spawned
pub fn validate(req: &StartOrderRequest) -> Result<()> {
    let order = req.order_number.as_str();
    if order.is_empty() || order.len() > 12 || !order.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "Invalid order number '{order}': expected 1-12 digits"
        )));
    }

    if !KNOWN_CARDS.contains(&req.card.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown card '{}': expected one of {KNOWN_CARDS:?}",
            req.card
        )));
    }

    if !KNOWN_MODES.contains(&req.mode.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown mode '{}': expected one of {KNOWN_MODES:?}",
            req.mode
        )));
    }

    if let Some(link) = &req.quote_link {
        let host = link
            .strip_prefix("https://")
            .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or(""))
            .unwrap_or("");
        let allowed = host == QUOTE_LINK_DOMAIN
            || host
                .strip_suffix(QUOTE_LINK_DOMAIN)
                .is_some_and(|p| p.ends_with('.'));
        if !allowed {
            return Err(AppError::Validation(format!(
                "Quote link must be an https link on {QUOTE_LINK_DOMAIN}"
            )));
        }
    }

    Ok(())
}

/// Execute the start use case
///
/// Creates the Job, spawns the worker and hands its output stream to a
/// bridge task. Returns as soon as the worker is spawned; progress is
/// observed by polling, never by blocking this call.
pub async fn execute(
    store: &Arc<JobStore>,
    spawner: &Arc<dyn WorkerSpawner>,
    id_provider: &dyn IdProvider,
    time_provider: &Arc<dyn TimeProvider>,
    req: StartOrderRequest,
) -> Result<JobSnapshot> {
    validate(&req)?;

    let job_id = id_provider.generate_id();
    let created_at = time_provider.now_millis();
    store
        .insert(Job::new(job_id.clone(), req.order_number.clone(), created_at))
        .await;

    let mut args = vec![
        "--order".to_string(),
        req.order_number.clone(),
        "--card".to_string(),
        req.card.clone(),
        "--mode".to_string(),
        req.mode.clone(),
        "--job-id".to_string(),
        job_id.clone(),
    ];
    if let Some(link) = &req.quote_link {
        args.push("--quote-link".to_string());
        args.push(link.clone());
    }

    let spec = WorkerSpec {
        job_id: job_id.clone(),
        order_number: req.order_number.clone(),
        args,
    };

    let handle = match spawner.spawn(&spec).await {
        Ok(h) => h,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "Worker spawn failed");
            let now = time_provider.now_millis();
            let msg = e.to_string();
            store
                .update(&job_id, |j| {
                    j.fail(serde_json::json!({ "error_message": msg }), now);
                    Ok(())
                })
                .await?;
            return Err(e.into());
        }
    };

    if let Some(pid) = handle.pid() {
        store
            .update(&job_id, |j| {
                j.attach_worker(pid);
                Ok(())
            })
            .await?;
    }

    info!(job_id = %job_id, order_number = %req.order_number, "Order job started");

    let bridge = WorkerBridge::new(Arc::clone(store), Arc::clone(time_provider));
    tokio::spawn(bridge.run(job_id.clone(), handle));

    store.snapshot(&job_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(order: &str) -> StartOrderRequest {
        StartOrderRequest {
            order_number: order.to_string(),
            card: default_card(),
            mode: default_mode(),
            quote_link: None,
        }
    }

    #[test]
    fn accepts_plain_digit_order() {
        assert!(validate(&req("1001")).is_ok());
    }

    #[test]
    fn rejects_non_digit_order() {
        assert!(matches!(
            validate(&req("10-01")),
            Err(AppError::Validation(_))
        ));
        assert!(validate(&req("")).is_err());
        assert!(validate(&req("1234567890123")).is_err());
    }

    #[test]
    fn rejects_unknown_card() {
        let mut r = req("1001");
        r.card = "platinum".to_string();
        assert!(matches!(validate(&r), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_mode() {
        let mut r = req("1001");
        r.mode = "dryrun".to_string();
        assert!(matches!(validate(&r), Err(AppError::Validation(_))));
    }

    #[test]
    fn quote_link_domain_allowlist() {
        let mut r = req("1001");
        r.mode = "quote".to_string();

        r.quote_link = Some("https://sdwholesale.com/quote/42".to_string());
        assert!(validate(&r).is_ok());

        r.quote_link = Some("https://www.sdwholesale.com/quote/42".to_string());
        assert!(validate(&r).is_ok());

        r.quote_link = Some("https://evil.com/quote".to_string());
        assert!(validate(&r).is_err());

        // Suffix spoofing must not pass.
        r.quote_link = Some("https://notsdwholesale.com/quote".to_string());
        assert!(validate(&r).is_err());

        r.quote_link = Some("http://sdwholesale.com/quote".to_string());
        assert!(validate(&r).is_err());
    }
}

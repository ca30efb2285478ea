//! Collaborators the dispatcher relies on outside its own state.
//!
//! On a device these are backed by the package manager, a dialog and the
//! loyalty backend. [`KnownApps`], [`FixedChoice`], [`FixedBalance`] and
//! [`SimulatedProcessor`] stand in for them on a server.

use crate::profile::GatewayProfile;
use crate::types::{GatewayId, PaymentAttempt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Finds and opens wallet apps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppLocator: Send + Sync {
    async fn is_installed(&self, package: &str) -> bool;

    /// Hand a payment link to an installed app.
    async fn launch(&self, package: &str, uri: &str) -> Result<(), String>;

    /// Open the store page for an app.
    async fn open_store(&self, url: &str) -> Result<(), String>;
}

/// What the customer picks when their wallet app is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallChoice {
    /// Go to the store; the attempt ends as cancelled.
    Install,
    /// Pay through the gateway's web flow instead.
    ContinueOnWeb,
    Cancel,
}

/// Asks the customer how to proceed without the wallet app.
#[async_trait]
pub trait InstallPrompt: Send + Sync {
    async fn choose(&self, profile: &GatewayProfile) -> InstallChoice;
}

/// Always answers with the same choice.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub InstallChoice);

#[async_trait]
impl InstallPrompt for FixedChoice {
    async fn choose(&self, profile: &GatewayProfile) -> InstallChoice {
        debug!(gateway = %profile.gateway_id, choice = ?self.0, "Install prompt answered");
        self.0
    }
}

/// Reports stored-value card balances in minor units.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance(&self, customer_id: &str) -> Result<u64, String>;
}

/// Same balance for every customer.
#[derive(Debug, Clone, Copy)]
pub struct FixedBalance(pub u64);

#[async_trait]
impl BalanceSource for FixedBalance {
    async fn balance(&self, _customer_id: &str) -> Result<u64, String> {
        Ok(self.0)
    }
}

/// Charges through a remote processor SDK. Returns the processor reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteProcessor: Send + Sync {
    async fn charge(
        &self,
        profile: &GatewayProfile,
        attempt: &PaymentAttempt,
    ) -> Result<String, String>;
}

/// Approves every charge after a fixed latency.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedProcessor {
    delay: Duration,
}

impl SimulatedProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RemoteProcessor for SimulatedProcessor {
    async fn charge(
        &self,
        profile: &GatewayProfile,
        attempt: &PaymentAttempt,
    ) -> Result<String, String> {
        tokio::time::sleep(self.delay).await;
        Ok(format!(
            "{}_{}",
            profile.gateway_id.as_str().to_ascii_lowercase(),
            attempt.order_id
        ))
    }
}

/// App lookup against a fixed set of packages. Records every link and
/// store page it is asked to open.
#[derive(Debug, Default)]
pub struct KnownApps {
    installed: HashSet<String>,
    opened: Mutex<Vec<String>>,
}

impl KnownApps {
    pub fn new(packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            installed: packages.into_iter().map(Into::into).collect(),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Every wallet app in [`GatewayId::ALL`].
    pub fn all_wallets() -> Self {
        Self::new(GatewayId::ALL.into_iter().filter_map(GatewayId::app_package))
    }

    /// Links and store pages opened so far, oldest first.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, uri: &str) {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(uri.to_string());
    }
}

#[async_trait]
impl AppLocator for KnownApps {
    async fn is_installed(&self, package: &str) -> bool {
        self.installed.contains(package)
    }

    async fn launch(&self, package: &str, uri: &str) -> Result<(), String> {
        if !self.installed.contains(package) {
            return Err(format!("{} is not installed", package));
        }
        info!(package, "Launching wallet app");
        self.record(uri);
        Ok(())
    }

    async fn open_store(&self, url: &str) -> Result<(), String> {
        info!(url, "Opening store page");
        self.record(url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_apps() {
        let apps = KnownApps::new(["com.phonepe.app"]);
        assert!(apps.is_installed("com.phonepe.app").await);
        assert!(!apps.is_installed("net.one97.paytm").await);

        assert!(apps.launch("net.one97.paytm", "paytmmp://pay").await.is_err());
        apps.launch("com.phonepe.app", "phonepe://pay?am=1.00")
            .await
            .unwrap();
        assert_eq!(apps.opened(), vec!["phonepe://pay?am=1.00".to_string()]);
    }

    #[tokio::test]
    async fn test_all_wallets_installed() {
        let apps = KnownApps::all_wallets();
        assert!(apps.is_installed("in.org.npci.upiapp").await);
        assert!(apps.is_installed("com.google.android.apps.nbu.paisa.user").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_processor_reference() {
        let profile = GatewayProfile::new(GatewayId::Stripe, "pk_test");
        let attempt = PaymentAttempt::new(
            "ORD9".to_string(),
            crate::types::PaymentRequest::new(GatewayId::Stripe, 500, "cust-1"),
        );

        let start = tokio::time::Instant::now();
        let reference = SimulatedProcessor::new(Duration::from_secs(1))
            .charge(&profile, &attempt)
            .await
            .unwrap();
        assert_eq!(reference, "stripe_ORD9");
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}

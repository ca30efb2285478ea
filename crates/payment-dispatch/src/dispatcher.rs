//! The unified payment dispatcher.

use crate::config::DispatchConfig;
use crate::deeplink::UpiLink;
use crate::error::PaymentError;
use crate::order::generate_order_id;
use crate::platform::{
    AppLocator, BalanceSource, FixedBalance, FixedChoice, InstallChoice, InstallPrompt,
    RemoteProcessor, SimulatedProcessor,
};
use crate::profile::{default_profiles, GatewayProfile};
use crate::registry::GatewayRegistry;
use crate::types::{format_amount, GatewayKind, PaymentAttempt, PaymentRequest, PaymentResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, instrument, warn};

/// Room for one `Loading` and the terminal result.
const EVENT_CAPACITY: usize = 2;

/// Routes payment requests to the right gateway flow.
///
/// Cloning is cheap; clones share the registry and collaborators.
#[derive(Clone)]
pub struct PaymentDispatcher {
    config: Arc<DispatchConfig>,
    registry: Arc<GatewayRegistry>,
    apps: Arc<dyn AppLocator>,
    prompt: Arc<dyn InstallPrompt>,
    balances: Arc<dyn BalanceSource>,
    processor: Arc<dyn RemoteProcessor>,
}

impl PaymentDispatcher {
    /// Dispatcher with the default profile set registered.
    ///
    /// Missing wallet apps are answered with [`InstallChoice::Cancel`],
    /// stored-value cards report `config.stored_balance` and processors
    /// are simulated.
    pub fn new(config: DispatchConfig, apps: Arc<dyn AppLocator>) -> Self {
        let registry = GatewayRegistry::with_profiles(default_profiles(&config));
        Self::with_registry(config, Arc::new(registry), apps)
    }

    pub fn with_registry(
        config: DispatchConfig,
        registry: Arc<GatewayRegistry>,
        apps: Arc<dyn AppLocator>,
    ) -> Self {
        Self {
            balances: Arc::new(FixedBalance(config.stored_balance)),
            processor: Arc::new(SimulatedProcessor::new(config.remote_delay)),
            prompt: Arc::new(FixedChoice(InstallChoice::Cancel)),
            config: Arc::new(config),
            registry,
            apps,
        }
    }

    pub fn with_install_prompt(mut self, prompt: Arc<dyn InstallPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_balance_source(mut self, balances: Arc<dyn BalanceSource>) -> Self {
        self.balances = balances;
        self
    }

    pub fn with_processor(mut self, processor: Arc<dyn RemoteProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn registry(&self) -> &GatewayRegistry {
        &self.registry
    }

    /// Add or replace a gateway profile. Applies to payments started later.
    pub fn register_gateway_profile(&self, profile: GatewayProfile) {
        if let Some(previous) = self.registry.register(profile) {
            info!(gateway = %previous.gateway_id, "Replaced gateway profile");
        }
    }

    /// Start a payment and return a handle to its events.
    ///
    /// The flow runs on a spawned task, so this must be called inside a
    /// Tokio runtime. An unconfigured gateway yields a single `Failed`
    /// that is already queued when this returns.
    #[instrument(skip(self, request), fields(gateway = %request.gateway, amount = request.amount))]
    pub fn initiate_payment(&self, request: PaymentRequest) -> PaymentHandle {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);

        let order_id = request
            .order_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| generate_order_id(&self.config.order_prefix));

        let Some(profile) = self.registry.get(request.gateway) else {
            let err = PaymentError::GatewayNotConfigured(request.gateway);
            warn!(error = %err, "Payment rejected");
            // Fresh channel with spare capacity, so this cannot fail.
            let _ = tx.try_send(PaymentResult::failed(err.to_string()));
            return PaymentHandle::new(order_id, rx);
        };

        let attempt = PaymentAttempt::new(order_id.clone(), request);
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let mut events = EventSink::new(tx);
            let result = match dispatcher.drive(&profile, &attempt, &mut events).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(order_id = %attempt.order_id, error = %e, "Payment failed");
                    PaymentResult::failed(e.to_string())
                }
            };
            info!(order_id = %attempt.order_id, result = ?result, "Payment finished");
            events.finish(result).await;
        });

        PaymentHandle::new(order_id, rx)
    }

    /// Run a payment to completion and return its terminal result.
    pub async fn pay(&self, request: PaymentRequest) -> PaymentResult {
        self.initiate_payment(request).outcome().await
    }

    async fn drive(
        &self,
        profile: &GatewayProfile,
        attempt: &PaymentAttempt,
        events: &mut EventSink,
    ) -> Result<PaymentResult, PaymentError> {
        if attempt.amount == 0 {
            return Err(PaymentError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }

        debug!(
            order_id = %attempt.order_id,
            kind = ?profile.kind(),
            amount = %format_amount(attempt.amount),
            "Dispatching payment"
        );

        match profile.kind() {
            GatewayKind::WalletApp => self.pay_with_app(profile, attempt, events).await,
            GatewayKind::RemoteProcessor => {
                events.loading().await;
                let reference = self
                    .processor
                    .charge(profile, attempt)
                    .await
                    .map_err(PaymentError::Processor)?;
                info!(order_id = %attempt.order_id, reference = %reference, "Processor approved charge");
                Ok(PaymentResult::success(&attempt.order_id))
            }
            GatewayKind::CashTender => {
                events.loading().await;
                tokio::time::sleep(self.config.cash_delay).await;
                Ok(PaymentResult::success(&attempt.order_id))
            }
            GatewayKind::StoredBalance => {
                events.loading().await;
                let available = self
                    .balances
                    .balance(&attempt.customer_id)
                    .await
                    .map_err(PaymentError::BalanceLookup)?;
                if available < attempt.amount {
                    return Err(PaymentError::InsufficientBalance {
                        available,
                        required: attempt.amount,
                    });
                }
                Ok(PaymentResult::success(&attempt.order_id))
            }
        }
    }

    async fn pay_with_app(
        &self,
        profile: &GatewayProfile,
        attempt: &PaymentAttempt,
        events: &mut EventSink,
    ) -> Result<PaymentResult, PaymentError> {
        let package = profile.app_package.as_deref().ok_or_else(|| {
            PaymentError::InvalidRequest(format!("{} has no app package", profile.display_name))
        })?;

        if self.apps.is_installed(package).await {
            let link = UpiLink::for_attempt(profile, attempt)?;
            events.loading().await;
            self.apps
                .launch(package, &link.to_uri())
                .await
                .map_err(PaymentError::AppLaunch)?;
            tokio::time::sleep(self.config.gateway_delay).await;
            return Ok(PaymentResult::success(&attempt.order_id));
        }

        match self.prompt.choose(profile).await {
            InstallChoice::Install => {
                let url = profile.install_url.as_deref().ok_or_else(|| {
                    PaymentError::AppLaunch(format!("no store page for {}", profile.display_name))
                })?;
                self.apps
                    .open_store(url)
                    .await
                    .map_err(PaymentError::AppLaunch)?;
                Ok(PaymentResult::Cancelled)
            }
            InstallChoice::ContinueOnWeb => {
                events.loading().await;
                tokio::time::sleep(self.config.gateway_delay).await;
                Ok(PaymentResult::success(&attempt.order_id))
            }
            InstallChoice::Cancel => Ok(PaymentResult::Cancelled),
        }
    }
}

/// Sending side of an attempt. Emits `Loading` at most once.
struct EventSink {
    tx: mpsc::Sender<PaymentResult>,
    loading_sent: bool,
}

impl EventSink {
    fn new(tx: mpsc::Sender<PaymentResult>) -> Self {
        Self {
            tx,
            loading_sent: false,
        }
    }

    async fn loading(&mut self) {
        if !self.loading_sent {
            self.loading_sent = true;
            // Receiver may be gone; the flow still runs to completion.
            let _ = self.tx.send(PaymentResult::Loading).await;
        }
    }

    async fn finish(self, result: PaymentResult) {
        let _ = self.tx.send(result).await;
    }
}

/// Receiving side of a payment attempt.
#[derive(Debug)]
pub struct PaymentHandle {
    order_id: String,
    events: mpsc::Receiver<PaymentResult>,
}

impl PaymentHandle {
    fn new(order_id: String, events: mpsc::Receiver<PaymentResult>) -> Self {
        Self { order_id, events }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Next event, or `None` once the attempt is over.
    pub async fn next(&mut self) -> Option<PaymentResult> {
        self.events.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_next(&mut self) -> Option<PaymentResult> {
        self.events.try_recv().ok()
    }

    /// Wait for the terminal result.
    pub async fn outcome(mut self) -> PaymentResult {
        while let Some(event) = self.next().await {
            if event.is_terminal() {
                return event;
            }
        }
        PaymentResult::failed("payment ended without a result")
    }

    /// Every event in order, ending with the terminal one.
    pub async fn collect(mut self) -> Vec<PaymentResult> {
        let mut events = Vec::with_capacity(EVENT_CAPACITY);
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }

    pub fn into_stream(self) -> ReceiverStream<PaymentResult> {
        ReceiverStream::new(self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{KnownApps, MockBalanceSource, MockRemoteProcessor};
    use crate::types::GatewayId;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_stream::StreamExt;

    fn dispatcher_with(apps: Arc<KnownApps>) -> PaymentDispatcher {
        PaymentDispatcher::new(DispatchConfig::default(), apps)
    }

    fn no_apps() -> PaymentDispatcher {
        dispatcher_with(Arc::new(KnownApps::default()))
    }

    fn loading_count(events: &[PaymentResult]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, PaymentResult::Loading))
            .count()
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_fails_immediately() {
        let dispatcher = no_apps();
        assert!(!dispatcher.registry().contains(GatewayId::Stripe));

        let mut handle =
            dispatcher.initiate_payment(PaymentRequest::new(GatewayId::Stripe, 19_999, "cust-1"));

        match handle.try_next() {
            Some(PaymentResult::Failed { reason }) => {
                assert!(reason.contains("gateway not configured"), "{reason}")
            }
            other => panic!("expected queued failure, got {:?}", other),
        }
        assert_eq!(handle.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cash_delivery_succeeds_once() {
        let dispatcher = no_apps();
        let start = Instant::now();

        let handle = dispatcher.initiate_payment(
            PaymentRequest::new(GatewayId::CashDelivery, 19_999, "cust-1").with_order_id("ORD77"),
        );
        assert_eq!(handle.order_id(), "ORD77");

        let events = handle.collect().await;
        assert_eq!(
            events,
            vec![PaymentResult::Loading, PaymentResult::success("ORD77")]
        );
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generated_order_id_reported_in_success() {
        let dispatcher = no_apps();
        let handle =
            dispatcher.initiate_payment(PaymentRequest::new(GatewayId::CashStore, 450, "cust-1"));

        let order_id = handle.order_id().to_string();
        assert!(order_id.starts_with("ORD"));
        assert_eq!(handle.outcome().await, PaymentResult::success(order_id));
    }

    #[tokio::test]
    async fn test_stored_balance_shortfall() {
        let dispatcher = no_apps().with_balance_source(Arc::new(FixedBalance(15_000)));

        let events = dispatcher
            .initiate_payment(PaymentRequest::new(
                GatewayId::StoredBalanceCard,
                19_999,
                "cust-1",
            ))
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PaymentResult::Loading);
        match &events[1] {
            PaymentResult::Failed { reason } => {
                assert!(reason.contains("150.00"), "{reason}");
                assert!(reason.contains("199.99"), "{reason}");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stored_balance_looked_up_per_customer() {
        let mut balances = MockBalanceSource::new();
        balances
            .expect_balance()
            .withf(|customer: &str| customer == "cust-9")
            .times(1)
            .returning(|_| Ok(20_000));

        let dispatcher = no_apps().with_balance_source(Arc::new(balances));
        let result = dispatcher
            .pay(
                PaymentRequest::new(GatewayId::StoredBalanceCard, 19_999, "cust-9")
                    .with_order_id("ORD1"),
            )
            .await;
        assert_eq!(result, PaymentResult::success("ORD1"));
    }

    #[tokio::test]
    async fn test_balance_lookup_error() {
        let mut balances = MockBalanceSource::new();
        balances
            .expect_balance()
            .returning(|_| Err("loyalty backend down".to_string()));

        let dispatcher = no_apps().with_balance_source(Arc::new(balances));
        let result = dispatcher
            .pay(PaymentRequest::new(GatewayId::StoredBalanceCard, 100, "cust-1"))
            .await;
        assert_eq!(
            result,
            PaymentResult::failed("Balance lookup failed: loyalty backend down")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_installed_wallet_launches_deep_link() {
        let apps = Arc::new(KnownApps::new(["com.phonepe.app"]));
        let dispatcher = dispatcher_with(apps.clone());
        let start = Instant::now();

        let events = dispatcher
            .initiate_payment(
                PaymentRequest::new(GatewayId::Phonepe, 19_999, "cust-1").with_order_id("ORD5"),
            )
            .collect()
            .await;

        assert_eq!(
            events,
            vec![PaymentResult::Loading, PaymentResult::success("ORD5")]
        );
        assert!(start.elapsed() >= Duration::from_secs(2));

        let opened = apps.opened();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with("phonepe://pay?pa=cafecheckout%40upi"));
        assert!(opened[0].contains("am=199.99"));
        assert!(opened[0].contains("tr=ORD5"));
    }

    #[tokio::test]
    async fn test_missing_wallet_cancel() {
        let apps = Arc::new(KnownApps::default());
        let dispatcher = dispatcher_with(apps.clone())
            .with_install_prompt(Arc::new(FixedChoice(InstallChoice::Cancel)));

        let events = dispatcher
            .initiate_payment(PaymentRequest::new(GatewayId::Paytm, 500, "cust-1"))
            .collect()
            .await;

        assert_eq!(events, vec![PaymentResult::Cancelled]);
        assert!(apps.opened().is_empty());
    }

    #[tokio::test]
    async fn test_missing_wallet_install_opens_store() {
        let apps = Arc::new(KnownApps::default());
        let dispatcher = dispatcher_with(apps.clone())
            .with_install_prompt(Arc::new(FixedChoice(InstallChoice::Install)));

        let events = dispatcher
            .initiate_payment(PaymentRequest::new(GatewayId::GooglePay, 500, "cust-1"))
            .collect()
            .await;

        assert_eq!(events, vec![PaymentResult::Cancelled]);
        assert_eq!(
            apps.opened(),
            vec![
                "https://play.google.com/store/apps/details?id=com.google.android.apps.nbu.paisa.user"
                    .to_string()
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_wallet_continue_on_web() {
        let dispatcher = no_apps()
            .with_install_prompt(Arc::new(FixedChoice(InstallChoice::ContinueOnWeb)));

        let events = dispatcher
            .initiate_payment(
                PaymentRequest::new(GatewayId::AmazonPay, 500, "cust-1").with_order_id("ORD8"),
            )
            .collect()
            .await;

        assert_eq!(
            events,
            vec![PaymentResult::Loading, PaymentResult::success("ORD8")]
        );
    }

    #[tokio::test]
    async fn test_processor_failure() {
        let mut processor = MockRemoteProcessor::new();
        processor
            .expect_charge()
            .times(1)
            .returning(|_, _| Err("card declined".to_string()));

        let dispatcher = no_apps().with_processor(Arc::new(processor));
        let events = dispatcher
            .initiate_payment(PaymentRequest::new(GatewayId::Card, 2_500, "cust-1"))
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                PaymentResult::Loading,
                PaymentResult::failed("Payment processing failed: card declined")
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_registered_processor_succeeds() {
        let dispatcher = no_apps();
        dispatcher.register_gateway_profile(GatewayProfile::new(GatewayId::Razorpay, "rzp_test"));

        let result = dispatcher
            .pay(PaymentRequest::new(GatewayId::Razorpay, 2_500, "cust-1").with_order_id("ORD3"))
            .await;
        assert_eq!(result, PaymentResult::success("ORD3"));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let result = no_apps()
            .pay(PaymentRequest::new(GatewayId::CashStore, 0, "cust-1"))
            .await;
        assert!(matches!(result, PaymentResult::Failed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_loading_for_every_gateway() {
        let dispatcher = dispatcher_with(Arc::new(KnownApps::all_wallets()));
        for id in GatewayId::ALL {
            dispatcher.register_gateway_profile(GatewayProfile::new(id, "cafe@upi"));
        }

        for id in GatewayId::ALL {
            let events = dispatcher
                .initiate_payment(PaymentRequest::new(id, 1_000, "cust-1"))
                .collect()
                .await;
            assert!(loading_count(&events) <= 1, "{id}: {events:?}");
            assert_eq!(
                events.iter().filter(|e| e.is_terminal()).count(),
                1,
                "{id}: {events:?}"
            );
            assert!(events.last().is_some_and(PaymentResult::is_terminal));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_stream() {
        let dispatcher = no_apps();
        let events: Vec<_> = dispatcher
            .initiate_payment(
                PaymentRequest::new(GatewayId::CashDelivery, 100, "cust-1").with_order_id("ORD2"),
            )
            .into_stream()
            .collect()
            .await;
        assert_eq!(
            events,
            vec![PaymentResult::Loading, PaymentResult::success("ORD2")]
        );
    }
}

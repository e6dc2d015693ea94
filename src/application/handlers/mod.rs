//! Menu workflows
//!
//! Each handler loads the accounts file, talks to the operator through a
//! [`Prompter`](crate::application::prompt::Prompter) and drives the domain
//! services. Errors end the workflow and go back to the menu.

pub mod init_handler;
pub mod savings_handler;
pub mod transfer_handler;

use crate::application::prompt::Prompter;
use crate::config::AppConfig;
use crate::domain::repositories::exchange_gateway::ExchangeGateway;
use crate::domain::services::operation_executor::InterruptSignal;
use crate::infrastructure::public_ip::PublicIpResolver;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators shared by every workflow
#[derive(Clone)]
pub struct AppContext {
    pub gateway: Arc<dyn ExchangeGateway>,
    pub config: AppConfig,
    pub interrupt: Arc<InterruptSignal>,
    pub ip_resolver: Arc<dyn PublicIpResolver>,
}

impl AppContext {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        config: AppConfig,
        ip_resolver: Arc<dyn PublicIpResolver>,
    ) -> Self {
        Self {
            gateway,
            config,
            interrupt: Arc::new(InterruptSignal::new()),
            ip_resolver,
        }
    }

    pub fn with_interrupt(mut self, interrupt: Arc<InterruptSignal>) -> Self {
        self.interrupt = interrupt;
        self
    }
}

/// Give the exchange time to book the batch before the after-snapshot
pub(crate) async fn settle(prompter: &mut dyn Prompter, wait: Duration) {
    if wait.is_zero() {
        return;
    }
    prompter.say(&format!(
        "Waiting {}s for balances to settle...",
        wait.as_secs_f64()
    ));
    tokio::time::sleep(wait).await;
}

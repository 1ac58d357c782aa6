/// In-memory payment gateway
///
/// Issues deterministic tokens (`fake-token-<order_id>`) and records every
/// order it sees. It can be switched into a failing mode to exercise the
/// "gateway down" path of registration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PaymentError, PaymentGateway, SnapOrder, SnapSession};

/// Test gateway
#[derive(Debug, Default)]
pub struct FakeGateway {
    fail: AtomicBool,
    orders: Mutex<Vec<SnapOrder>>,
}

impl FakeGateway {
    /// Creates a gateway that accepts every order
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that rejects every order
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.set_failing(true);
        gateway
    }

    /// Toggles failure mode
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Orders received so far
    pub fn orders(&self) -> Vec<SnapOrder> {
        self.orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_transaction(&self, order: &SnapOrder) -> Result<SnapSession, PaymentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Transport("fake gateway is down".to_string()));
        }

        if let Ok(mut orders) = self.orders.lock() {
            orders.push(order.clone());
        }

        Ok(SnapSession {
            token: format!("fake-token-{}", order.order_id),
        })
    }
}

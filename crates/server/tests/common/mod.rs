//! Shared test harness: in-memory store plus scripted collaborators.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use thimble_core::{Cents, Email};
use thimble_server::context::RequestContext;
use thimble_server::mail::{MailError, Mailer};
use thimble_server::models::User;
use thimble_server::payments::{Charge, GatewayError, PaymentGateway};
use thimble_server::store::memory::MemoryStore;

/// Gateway double: approves every charge unless told to decline, and
/// records what it was asked to charge.
#[derive(Default)]
pub struct MockGateway {
    pub decline: AtomicBool,
    pub charges: Mutex<Vec<Cents>>,
}

impl MockGateway {
    pub fn decline_next(&self) {
        self.decline.store(true, Ordering::SeqCst);
    }

    pub fn charged_amounts(&self) -> Vec<Cents> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(
        &self,
        amount: Cents,
        _currency: &str,
        _source_token: &str,
    ) -> Result<Charge, GatewayError> {
        if self.decline.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Declined("card declined".to_owned()));
        }
        self.charges.lock().unwrap().push(amount);
        Ok(Charge {
            id: format!("ch_test_{}", self.charges.lock().unwrap().len()),
            amount,
        })
    }
}

/// Mailer double that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub messages: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> Result<(), MailError> {
        self.messages.lock().unwrap().push((
            to.to_string(),
            subject.to_owned(),
            html_body.to_owned(),
        ));
        Ok(())
    }
}

/// One engine instance wired to in-process doubles.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<MockGateway>,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            gateway: Arc::new(MockGateway::default()),
            mailer: Arc::new(RecordingMailer::default()),
        }
    }

    /// A request context for the given caller (or anonymous).
    pub fn ctx(&self, caller: Option<User>) -> RequestContext {
        let store: Arc<dyn thimble_server::store::Store> = self.store.clone();
        let gateway: Arc<dyn PaymentGateway> = self.gateway.clone();
        let mailer: Arc<dyn Mailer> = self.mailer.clone();
        RequestContext::new(caller, store, gateway, mailer)
    }
}

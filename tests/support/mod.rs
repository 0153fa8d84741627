//! Shared fixtures for the HTTP tests: a scripted transport and an app
//! builder wired exactly like `main`.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use booking_mailer::{
    application::services::mail_transport::MailTransport,
    config::Config,
    domain::{
        errors::TransportError,
        models::{DeliveryReceipt, Message},
    },
    presentation::http::{build_app, endpoints::root::ApiState},
};
use poem::{Endpoint, test::TestClient};

pub enum Step {
    Reply(Result<DeliveryReceipt, TransportError>),
    Hang,
}

/// Plays back a fixed script of transport results, then repeats the
/// fallback forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Result<DeliveryReceipt, TransportError>,
    sent: Mutex<Vec<Message>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>, fallback: Result<DeliveryReceipt, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn always(result: Result<DeliveryReceipt, TransportError>) -> Arc<Self> {
        Self::new(Vec::new(), result)
    }

    pub fn failing_then_ok(failures: Vec<TransportError>) -> Arc<Self> {
        Self::new(
            failures.into_iter().map(|e| Step::Reply(Err(e))).collect(),
            Ok(receipt()),
        )
    }

    pub fn hanging() -> Arc<Self> {
        Self::new(vec![Step::Hang], Ok(receipt()))
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(result)) => result,
            Some(Step::Hang) => std::future::pending().await,
            None => self.fallback.clone(),
        }
    }
}

pub fn receipt() -> DeliveryReceipt {
    DeliveryReceipt {
        provider_message_id: "<0f7c1a52@studionine.test>".to_string(),
        provider_response: "250 2.0.0 Ok: queued as 4F2A1".to_string(),
    }
}

pub fn config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("MAIL_TRANSPORT", "memory"),
        ("SENDER_EMAIL", "bookings@studionine.test"),
        ("SENDER_NAME", "Studio Nine"),
        ("MAX_ATTEMPTS", "3"),
        ("BACKOFF_BASE_MS", "1"),
        ("REQUEST_TIMEOUT_SECS", "30"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config should parse")
}

pub fn client(
    transport: Arc<dyn MailTransport>,
    overrides: &[(&str, &str)],
) -> TestClient<impl Endpoint + use<>> {
    let config = config(overrides);
    let state = Arc::new(ApiState::from_config(transport, &config));
    TestClient::new(build_app(state, &config.http))
}

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use uuid::Uuid;

use crate::{
    application::services::mail_transport::MailTransport,
    domain::{
        errors::TransportError,
        models::{DeliveryReceipt, Message},
    },
};

/// Reply codes a relay uses to reject credentials.
const AUTH_REJECTION_CODES: [&str; 3] = ["530", "534", "535"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    StartTls,
    Tls,
    None,
}

impl SmtpTls {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "starttls" => Some(SmtpTls::StartTls),
            "tls" | "smtps" => Some(SmtpTls::Tls),
            "none" | "plain" => Some(SmtpTls::None),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: SmtpTls,
    pub timeout: Duration,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Relay client backed by lettre's pooled async SMTP transport.
#[derive(Clone)]
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeout: Duration,
}

impl SmtpMailTransport {
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let mut builder = match settings.tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| classify_smtp_error(&e))?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| classify_smtp_error(&e))?,
        };

        builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            timeout: settings.timeout,
        })
    }

    /// lettre only bounds the TCP connect, so the whole exchange with the
    /// relay is bounded here.
    async fn bounded<T>(
        &self,
        exchange: impl Future<Output = Result<T, SmtpError>>,
    ) -> Result<T, TransportError> {
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(|e| classify_smtp_error(&e)),
            Err(_) => Err(TransportError::Timeout(format!(
                "relay did not respond within {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }

    fn build_message(message: &Message) -> Result<LettreMessage, TransportError> {
        let from_address: Address = message
            .from
            .address
            .parse()
            .map_err(|_| invalid_address(&message.from.address))?;
        let to_address: Address = message.to.parse().map_err(|_| invalid_address(&message.to))?;

        let message_id = format!("<{}@{}>", Uuid::new_v4(), from_address.domain());

        let mut builder = LettreMessage::builder()
            .from(Mailbox::new(Some(message.from.name.clone()), from_address))
            .to(Mailbox::new(None, to_address))
            .subject(message.subject.clone())
            .message_id(Some(message_id));

        if let Some(reply_to) = &message.reply_to {
            let address: Address = reply_to.parse().map_err(|_| invalid_address(reply_to))?;
            builder = builder.reply_to(Mailbox::new(None, address));
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| TransportError::Other(format!("failed to build message: {e}")))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, TransportError> {
        let email = Self::build_message(message)?;
        let provider_message_id = email
            .headers()
            .get_raw("Message-ID")
            .unwrap_or_default()
            .to_string();

        let response = self.bounded(self.transport.send(email)).await?;

        let lines: Vec<String> = response.message().map(|line| line.to_string()).collect();

        Ok(DeliveryReceipt {
            provider_message_id,
            provider_response: format!("{} {}", response.code(), lines.join(" ")),
        })
    }

    async fn verify(&self) -> Result<(), TransportError> {
        if self.bounded(self.transport.test_connection()).await? {
            Ok(())
        } else {
            Err(TransportError::Connection(
                "relay did not accept the test connection".to_string(),
            ))
        }
    }
}

fn invalid_address(address: &str) -> TransportError {
    TransportError::Other(format!("invalid email address: {address}"))
}

fn classify_smtp_error(error: &SmtpError) -> TransportError {
    let text = error.to_string();

    if error.is_timeout() {
        return TransportError::Timeout(text);
    }

    if let Some(code) = error.status() {
        if AUTH_REJECTION_CODES.contains(&code.to_string().as_str()) {
            return TransportError::Authentication(text);
        }
        return TransportError::Other(text);
    }

    if let Some(classified) = find_io_error(error).and_then(classify_io_error) {
        return classified;
    }

    classify_message(text)
}

fn find_io_error<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a io::Error> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io_error) = err.downcast_ref::<io::Error>() {
            return Some(io_error);
        }
        current = err.source();
    }
    None
}

fn classify_io_error(error: &io::Error) -> Option<TransportError> {
    let text = error.to_string();
    match error.kind() {
        io::ErrorKind::TimedOut => Some(TransportError::Timeout(text)),
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable => Some(TransportError::Connection(text)),
        _ if is_dns_failure(&text) => Some(TransportError::Dns(text)),
        _ => None,
    }
}

fn is_dns_failure(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    [
        "failed to lookup address",
        "name or service not known",
        "no such host",
        "nodename nor servname",
        "temporary failure in name resolution",
        "no address associated with hostname",
    ]
    .iter()
    .any(|needle| text.contains(needle))
}

/// Last resort when the error carries neither a reply code nor an io source.
fn classify_message(text: String) -> TransportError {
    let lowered = text.to_ascii_lowercase();
    if is_dns_failure(&lowered) {
        TransportError::Dns(text)
    } else if lowered.contains("connection refused") {
        TransportError::Connection(text)
    } else if lowered.contains("timed out") {
        TransportError::Timeout(text)
    } else if lowered.contains("authentication") {
        TransportError::Authentication(text)
    } else {
        TransportError::Other(text)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::TcpListener,
        time::Instant,
    };

    use super::*;
    use crate::domain::models::Sender;

    fn settings(addr: SocketAddr, timeout: Duration) -> SmtpSettings {
        SmtpSettings {
            host: addr.ip().to_string(),
            port: addr.port(),
            username: Some("mailer".to_string()),
            password: Some("wrong".to_string()),
            tls: SmtpTls::None,
            timeout,
        }
    }

    /// Relay that greets, offers AUTH and then rejects any credentials.
    async fn rejecting_relay() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut lines = BufReader::new(read).lines();
                    write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();

                    while let Ok(Some(line)) = lines.next_line().await {
                        let command = line.to_ascii_uppercase();
                        let reply: &[u8] = if command.starts_with("EHLO") {
                            b"250-relay.test\r\n250 AUTH PLAIN LOGIN\r\n"
                        } else if command.starts_with("AUTH") {
                            b"535 5.7.8 bad creds\r\n"
                        } else if command.starts_with("QUIT") {
                            let _ = write.write_all(b"221 bye\r\n").await;
                            break;
                        } else {
                            b"250 ok\r\n"
                        };
                        if write.write_all(reply).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        addr
    }

    /// Relay that accepts connections and never says a word.
    async fn silent_relay() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        addr
    }

    #[tokio::test]
    async fn rejected_credentials_map_to_authentication() {
        let addr = rejecting_relay().await;
        let transport =
            SmtpMailTransport::from_settings(&settings(addr, Duration::from_secs(5))).unwrap();

        let result = transport.send(&message()).await;

        match result {
            Err(TransportError::Authentication(text)) => assert!(text.contains("535")),
            other => panic!("expected authentication failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_port_maps_to_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            SmtpMailTransport::from_settings(&settings(addr, Duration::from_secs(5))).unwrap();

        assert!(matches!(
            transport.send(&message()).await,
            Err(TransportError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn silent_relay_times_out_within_the_configured_bound() {
        let addr = silent_relay().await;
        let timeout = Duration::from_millis(300);
        let transport = SmtpMailTransport::from_settings(&settings(addr, timeout)).unwrap();

        let started = Instant::now();
        let result = transport.send(&message()).await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn verify_is_bounded_by_the_timeout() {
        let addr = silent_relay().await;
        let transport =
            SmtpMailTransport::from_settings(&settings(addr, Duration::from_millis(300))).unwrap();

        assert!(matches!(
            transport.verify().await,
            Err(TransportError::Timeout(_))
        ));
    }

    fn message() -> Message {
        Message {
            from: Sender {
                name: "Studio Nine".to_string(),
                address: "bookings@studionine.test".to_string(),
            },
            to: "jane@example.com".to_string(),
            subject: "Booking confirmed".to_string(),
            html: "<p>See you soon</p>".to_string(),
            text: "See you soon".to_string(),
            reply_to: Some("frontdesk@studionine.test".to_string()),
        }
    }

    #[test]
    fn io_errors_map_by_kind() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "operation timed out");

        assert!(matches!(
            classify_io_error(&refused),
            Some(TransportError::Connection(_))
        ));
        assert!(matches!(
            classify_io_error(&timed_out),
            Some(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn lookup_failures_map_to_dns() {
        let lookup = io::Error::other(
            "failed to lookup address information: Name or service not known",
        );
        assert!(matches!(
            classify_io_error(&lookup),
            Some(TransportError::Dns(_))
        ));
    }

    #[test]
    fn unknown_io_errors_are_left_unclassified() {
        let broken = io::Error::new(io::ErrorKind::InvalidData, "garbage on the wire");
        assert_eq!(classify_io_error(&broken), None);
    }

    #[test]
    fn io_error_is_found_through_source_chain() {
        #[derive(Debug)]
        struct Wrapper(io::Error);

        impl fmt::Display for Wrapper {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("network error")
            }
        }

        impl StdError for Wrapper {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let wrapped = Wrapper(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        let found = find_io_error(&wrapped).map(io::Error::kind);
        assert_eq!(found, Some(io::ErrorKind::ConnectionRefused));
    }

    #[test]
    fn message_fallback_keeps_raw_text_for_unknown_errors() {
        assert_eq!(
            classify_message("relay said no".to_string()),
            TransportError::Other("relay said no".to_string())
        );
        assert!(matches!(
            classify_message("No compatible authentication mechanism was found".to_string()),
            TransportError::Authentication(_)
        ));
    }

    #[test]
    fn tls_mode_parses_known_values() {
        assert_eq!(SmtpTls::from_str("STARTTLS"), Some(SmtpTls::StartTls));
        assert_eq!(SmtpTls::from_str("tls"), Some(SmtpTls::Tls));
        assert_eq!(SmtpTls::from_str("none"), Some(SmtpTls::None));
        assert_eq!(SmtpTls::from_str("ssl3"), None);
    }

    #[test]
    fn built_message_carries_generated_message_id() {
        let email = SmtpMailTransport::build_message(&message()).unwrap();
        let message_id = email.headers().get_raw("Message-ID").unwrap().to_string();

        assert!(message_id.starts_with('<'));
        assert!(message_id.ends_with("@studionine.test>"));
    }

    #[test]
    fn invalid_recipient_fails_message_build() {
        let bad = Message {
            to: "not an address".to_string(),
            ..message()
        };
        assert!(matches!(
            SmtpMailTransport::build_message(&bad),
            Err(TransportError::Other(_))
        ));
    }

    #[test]
    fn settings_debug_redacts_password() {
        let settings = SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("mailer".to_string()),
            password: Some("hunter2".to_string()),
            tls: SmtpTls::StartTls,
            timeout: Duration::from_secs(10),
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}

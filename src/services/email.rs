//! Transactional email. Sends go through the Resend HTTP API, are spawned
//! onto the runtime and never block or fail the request that triggered them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::bookings;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to build mail client: {0}")]
    Config(String),
    #[error("mail request failed: {0}")]
    Network(String),
    #[error("mail provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, from: &str) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            from: from.to_string(),
            endpoint: RESEND_API_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let payload = ResendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Used when no API key is configured: records what would have been sent.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "email not sent (no provider configured)");
        Ok(())
    }
}

/// Fire-and-forget front end for a [`Mailer`].
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, base_url: impl Into<String>) -> Self {
        Self {
            mailer,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Queue `message` on the runtime. Failures are logged and dropped.
    pub fn dispatch(&self, message: EmailMessage) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            let to = message.to.clone();
            let subject = message.subject.clone();
            if let Err(e) = mailer.send(message).await {
                warn!(error = %e, to = %to, subject = %subject, "failed to send email");
            }
        });
    }
}

// ── Templates ──

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(heading: &str, body: &str, link: Option<(&str, &str)>) -> String {
    let button = link
        .map(|(href, label)| {
            format!(
                r#"<div style="text-align:center;margin:30px 0;"><a href="{href}" style="background-color:#d4af37;color:#0a0a0a;padding:15px 30px;text-decoration:none;border-radius:8px;font-weight:bold;">{label}</a></div>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div style="font-family:Arial,sans-serif;max-width:600px;margin:0 auto;"><div style="background-color:#0a0a0a;padding:20px;text-align:center;"><h1 style="color:#d4af37;margin:0;">uso</h1></div><div style="background-color:#1a1a1a;color:#ffffff;padding:30px;"><h2>{heading}</h2>{body}{button}</div></div>"#
    )
}

fn booking_details(booking: &bookings::Model) -> String {
    format!(
        r#"<div style="background-color:#2a2a2a;padding:20px;border-radius:8px;margin:20px 0;"><p><strong>Date:</strong> {} {}</p><p><strong>Duration:</strong> {} h</p><p><strong>Location:</strong> {}</p><p><strong>Amount:</strong> {:.2}</p></div>"#,
        booking.booking_date,
        booking.start_time.format("%H:%M"),
        booking.duration_hours,
        escape_html(&booking.location),
        booking.amount,
    )
}

impl Notifier {
    pub fn welcome(&self, to: &str, name: &str) -> EmailMessage {
        let login = format!("{}/login", self.base_url);
        EmailMessage {
            to: to.to_string(),
            subject: "Welcome to uso".into(),
            html: layout(
                &format!("Welcome, {}!", escape_html(name)),
                "<p>Thank you for signing up for uso.</p>",
                Some((login.as_str(), "Log in")),
            ),
        }
    }

    pub fn booking_requested(
        &self,
        to: &str,
        cast_name: &str,
        guest_name: &str,
        booking: &bookings::Model,
    ) -> EmailMessage {
        let link = format!("{}/cast/bookings/{}", self.base_url, booking.id);
        EmailMessage {
            to: to.to_string(),
            subject: "New booking request - uso".into(),
            html: layout(
                "You have a new booking request",
                &format!(
                    "<p>{}, {} would like to book you. Please respond within 24 hours.</p>{}",
                    escape_html(cast_name),
                    escape_html(guest_name),
                    booking_details(booking)
                ),
                Some((link.as_str(), "Respond")),
            ),
        }
    }

    pub fn booking_responded(
        &self,
        to: &str,
        guest_name: &str,
        cast_name: &str,
        booking: &bookings::Model,
    ) -> EmailMessage {
        let accepted = booking.status == bookings::Status::Accepted;
        let link = format!("{}/bookings/{}", self.base_url, booking.id);
        let (subject, heading) = if accepted {
            ("Booking confirmed - uso", "Your booking is confirmed")
        } else {
            ("Booking declined - uso", "Your booking was declined")
        };
        let verb = if accepted { "accepted" } else { "declined" };

        EmailMessage {
            to: to.to_string(),
            subject: subject.into(),
            html: layout(
                heading,
                &format!(
                    "<p>{}, {} has {verb} your booking.</p>{}",
                    escape_html(guest_name),
                    escape_html(cast_name),
                    booking_details(booking)
                ),
                Some((link.as_str(), "View booking")),
            ),
        }
    }

    pub fn booking_cancelled(
        &self,
        to: &str,
        cast_name: &str,
        booking: &bookings::Model,
    ) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Booking cancelled - uso".into(),
            html: layout(
                "A booking was cancelled",
                &format!(
                    "<p>{}, the guest cancelled this booking request.</p>{}",
                    escape_html(cast_name),
                    booking_details(booking)
                ),
                None,
            ),
        }
    }

    pub fn review_request(
        &self,
        to: &str,
        name: &str,
        other_name: &str,
        booking: &bookings::Model,
    ) -> EmailMessage {
        let link = format!("{}/bookings/{}/review", self.base_url, booking.id);
        EmailMessage {
            to: to.to_string(),
            subject: "How was your booking? - uso".into(),
            html: layout(
                "Leave a review",
                &format!(
                    "<p>{}, your booking with {} is complete. Tell us how it went.</p>",
                    escape_html(name),
                    escape_html(other_name)
                ),
                Some((link.as_str(), "Write a review")),
            ),
        }
    }

    pub fn cast_approved(&self, to: &str, name: &str) -> EmailMessage {
        let link = format!("{}/cast/profile", self.base_url);
        EmailMessage {
            to: to.to_string(),
            subject: "Your cast profile is approved - uso".into(),
            html: layout(
                "You're approved",
                &format!(
                    "<p>{}, your profile is now visible to guests.</p>",
                    escape_html(name)
                ),
                Some((link.as_str(), "View profile")),
            ),
        }
    }

    pub fn cast_rejected(&self, to: &str, name: &str, reason: Option<&str>) -> EmailMessage {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .map(|r| format!("<p><strong>Reason:</strong> {}</p>", escape_html(r)))
            .unwrap_or_default();
        EmailMessage {
            to: to.to_string(),
            subject: "Your cast application - uso".into(),
            html: layout(
                "Application not approved",
                &format!(
                    "<p>{}, we could not approve your profile at this time.</p>{reason}",
                    escape_html(name)
                ),
                None,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bookings::Status;
    use crate::models::bookings::tests::booking;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct ChannelMailer(mpsc::UnboundedSender<EmailMessage>);

    #[async_trait]
    impl Mailer for ChannelMailer {
        async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
            self.0
                .send(message)
                .map_err(|e| MailError::Network(e.to_string()))
        }
    }

    fn notifier() -> Notifier {
        Notifier::new(Arc::new(LogMailer), "https://uso.app/")
    }

    #[test]
    fn names_are_escaped() {
        let msg = notifier().welcome("a@example.com", "<script>alert(1)</script>");
        assert!(!msg.html.contains("<script>"));
        assert!(msg.html.contains("&lt;script&gt;"));
        assert!(msg.html.contains("https://uso.app/login"));
    }

    #[test]
    fn response_email_reflects_outcome() {
        let n = notifier();
        let accepted = booking(Status::Accepted, "10:00", 2);
        let declined = booking(Status::Declined, "10:00", 2);
        let accepted = n.booking_responded("g@example.com", "Guest", "Cast", &accepted);
        let declined = n.booking_responded("g@example.com", "Guest", "Cast", &declined);

        assert_eq!(accepted.subject, "Booking confirmed - uso");
        assert!(accepted.html.contains("has accepted"));
        assert_eq!(declined.subject, "Booking declined - uso");
        assert!(declined.html.contains("10:00"));
    }

    #[test]
    fn rejection_reason_is_optional() {
        let n = notifier();
        let with_reason = n.cast_rejected("c@example.com", "C", Some("Blurry photos"));
        assert!(with_reason.html.contains("Blurry photos"));
        assert!(!n.cast_rejected("c@example.com", "C", Some("  ")).html.contains("Reason"));
        assert!(!n.cast_rejected("c@example.com", "C", None).html.contains("Reason"));
    }

    #[tokio::test]
    async fn dispatch_hands_message_to_mailer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let n = Notifier::new(Arc::new(ChannelMailer(tx)), "https://uso.app");

        let msg = n.welcome("new@example.com", "New");
        n.dispatch(msg.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, msg);
    }

    #[tokio::test]
    async fn resend_mailer_posts_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({
                "from": "uso <noreply@uso.app>",
                "to": ["x@example.com"],
                "subject": "Hello",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "e_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = ResendMailer::new("re_test", "uso <noreply@uso.app>")
            .unwrap()
            .with_endpoint(format!("{}/emails", server.uri()));

        mailer
            .send(EmailMessage {
                to: "x@example.com".into(),
                subject: "Hello".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resend_rejection_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let mailer = ResendMailer::new("re_test", "bad")
            .unwrap()
            .with_endpoint(server.uri());

        let err = mailer
            .send(EmailMessage {
                to: "x@example.com".into(),
                subject: "Hello".into(),
                html: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Rejected { status: 422, .. }));
    }
}

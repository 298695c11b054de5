use lettre::message::{header::ContentType, Mailbox};
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use thiserror::Error;

use crate::config::NotifySettings;
use crate::models::ConfirmedMatch;

/// Errors that can occur while notifying matched people
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Mail relay error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sink for match notifications
pub trait Notifier {
    /// Tell `recipient` who they were matched with
    fn send(&self, recipient: &str, counterpart: &str) -> Result<(), NotifyError>;
}

/// Body of every notification
pub fn render_body(counterpart: &str) -> String {
    format!(
        "Your new match is {} give them an email to setup the meeting",
        counterpart
    )
}

/// Plain SMTP notifier talking to a configured relay
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    subject: String,
}

impl SmtpNotifier {
    pub fn new(settings: &NotifySettings) -> Result<Self, NotifyError> {
        let mut builder = SmtpTransport::builder_dangerous(settings.host.as_str()).port(settings.port);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Some(Duration::from_secs(secs)));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.parse()?,
            subject: settings.subject.clone(),
        })
    }

    fn build_message(&self, recipient: &str, counterpart: &str) -> Result<Message, NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(counterpart))?;
        Ok(message)
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, recipient: &str, counterpart: &str) -> Result<(), NotifyError> {
        let message = self.build_message(recipient, counterpart)?;
        self.transport.send(&message)?;
        tracing::debug!("Notified {} of match with {}", recipient, counterpart);
        Ok(())
    }
}

/// Notifier that only logs, for dry runs
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, recipient: &str, counterpart: &str) -> Result<(), NotifyError> {
        tracing::info!("[dry run] {} <- {}", recipient, render_body(counterpart));
        Ok(())
    }
}

/// Build the notifier the settings ask for
pub fn from_settings(settings: &NotifySettings) -> Result<Box<dyn Notifier>, NotifyError> {
    if settings.dry_run {
        tracing::info!("Notifications in dry-run mode, nothing will be sent");
        return Ok(Box::new(LogNotifier));
    }

    tracing::info!("Notifications via SMTP relay {}:{}", settings.host, settings.port);
    Ok(Box::new(SmtpNotifier::new(settings)?))
}

/// Notify both participants of every match, in match order
///
/// Stops at the first failure; notifications already sent stay sent.
/// Returns the number of messages sent.
pub fn notify_all(notifier: &dyn Notifier, matches: &[ConfirmedMatch]) -> Result<usize, NotifyError> {
    let mut sent = 0;

    for m in matches {
        notifier.send(&m.email_a, &m.email_b)?;
        sent += 1;
        notifier.send(&m.email_b, &m.email_a)?;
        sent += 1;
    }

    tracing::info!("Sent {} match notifications", sent);
    Ok(sent)
}

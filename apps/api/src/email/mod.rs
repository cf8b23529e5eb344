//! Transactional email over SMTP.
//!
//! Sends are fire-and-forget: handlers never fail because mail delivery failed.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, error, info};

use crate::config::SmtpConfig;

pub mod templates;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct Mailer {
    transport: Option<(SmtpTransport, String)>,
}

impl Mailer {
    pub fn new(smtp: Option<&SmtpConfig>) -> anyhow::Result<Self> {
        let transport = match smtp {
            Some(cfg) => {
                let transport = SmtpTransport::relay(&cfg.host)?
                    .credentials(Credentials::new(cfg.user.clone(), cfg.pass.clone()))
                    .build();
                info!("SMTP transport configured for {}", cfg.host);
                Some((transport, cfg.from.clone()))
            }
            None => {
                info!("SMTP not configured, outgoing email will be logged only");
                None
            }
        };
        Ok(Self { transport })
    }

    /// Queues an email on a blocking thread and returns immediately.
    pub fn send(&self, email: OutgoingEmail) {
        let Some((transport, from)) = self.transport.clone() else {
            info!(to = %email.to, subject = %email.subject, "Email (not sent, SMTP disabled):\n{}", email.body);
            return;
        };

        tokio::spawn(async move {
            let to = email.to.clone();
            let result = tokio::task::spawn_blocking(move || deliver(&transport, &from, email)).await;
            match result {
                Ok(Ok(())) => debug!("Email sent to {to}"),
                Ok(Err(e)) => error!("Could not send email to {to}: {e:#}"),
                Err(e) => error!("Email task failed: {e}"),
            }
        });
    }
}

fn deliver(transport: &SmtpTransport, from: &str, email: OutgoingEmail) -> anyhow::Result<()> {
    let message = Message::builder()
        .from(from.parse()?)
        .to(email.to.parse()?)
        .subject(email.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(email.body)?;
    transport.send(&message)?;
    Ok(())
}

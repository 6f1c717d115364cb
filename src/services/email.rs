//! Outbound OTP email delivery.
//!
//! A single background worker owns the SMTP transport; callers hand it
//! work over an unbounded channel and never wait on the wire. Delivery
//! failures are logged and swallowed so a flaky relay cannot fail an
//! auth request that has already committed.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::EmailConfig;

#[derive(Debug)]
struct OtpEmail {
    to: String,
    code: String,
}

/// Handle to the mail worker. Cheap to clone.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::UnboundedSender<OtpEmail>,
}

impl Mailer {
    /// Spawn the delivery worker. With email disabled in config the
    /// worker just logs each code, which keeps local development and
    /// tests free of SMTP setup.
    pub fn start(config: &EmailConfig) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<OtpEmail>();

        if !config.enabled {
            tokio::spawn(async move {
                while let Some(mail) = rx.recv().await {
                    info!(
                        "Email delivery disabled; OTP for {} is {}",
                        mail.to, mail.code
                    );
                }
            });
            return Ok(Self { tx });
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay host: {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        let from: Mailbox = config
            .from_address
            .parse()
            .with_context(|| format!("Invalid from address: {}", config.from_address))?;

        tokio::spawn(async move {
            while let Some(mail) = rx.recv().await {
                deliver(&transport, &from, mail).await;
            }
        });

        Ok(Self { tx })
    }

    /// Queue an OTP email. Never blocks and never fails the caller.
    pub fn send_otp(&self, to: &str, code: &str) {
        let mail = OtpEmail {
            to: to.to_string(),
            code: code.to_string(),
        };
        if self.tx.send(mail).is_err() {
            warn!("Mail worker is gone; dropping OTP email for {}", to);
        }
    }
}

async fn deliver(
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    from: &Mailbox,
    mail: OtpEmail,
) {
    let to: Mailbox = match mail.to.parse() {
        Ok(to) => to,
        Err(e) => {
            error!("Invalid recipient address {}: {}", mail.to, e);
            return;
        }
    };

    let message = Message::builder()
        .from(from.clone())
        .to(to)
        .subject("Your OTP Code")
        .body(format!("Your OTP code is: {}", mail.code));

    let message = match message {
        Ok(message) => message,
        Err(e) => {
            error!("Failed to build OTP email for {}: {}", mail.to, e);
            return;
        }
    };

    match transport.send(message).await {
        Ok(_) => info!("Sent OTP email to {}", mail.to),
        Err(e) => error!("Failed to send OTP email to {}: {}", mail.to, e),
    }
}

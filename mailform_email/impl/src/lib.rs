use std::time::Duration;

use anyhow::anyhow;
use lettre::{
    message::{header, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use mailform_email_contracts::{Email, EmailService};
use mailform_models::email_address::EmailAddressWithName;

/// Bound on every SMTP network wait (connect, greeting, socket reads).
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP-backed [`EmailService`].
///
/// The transport is unpooled: every [`EmailService::send`] and every
/// [`EmailService::ping`] opens its own session and closes it when done.
#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    from: EmailAddressWithName,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

#[derive(Debug, Clone)]
pub struct SmtpServer {
    pub host: String,
    pub port: u16,
    /// Implicit TLS from the first byte when set; STARTTLS upgrade when the
    /// server offers it otherwise.
    pub secure: bool,
    pub username: String,
    pub password: String,
}

impl EmailServiceImpl {
    pub fn new(server: &SmtpServer, from: EmailAddressWithName) -> anyhow::Result<Self> {
        let tls = TlsParameters::new(server.host.clone())?;
        let tls = if server.secure {
            Tls::Wrapper(tls)
        } else {
            Tls::Opportunistic(tls)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server.host.as_str())
            .port(server.port)
            .tls(tls)
            .credentials(Credentials::new(
                server.username.clone(),
                server.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { from, transport })
    }

    fn build_message(&self, email: Email) -> anyhow::Result<Message> {
        let builder = Message::builder()
            .from(self.from.0.clone())
            .to(email.recipient.0)
            .subject(email.subject);

        let builder = match email.reply_to {
            Some(reply_to) => builder.reply_to(reply_to.0),
            None => builder,
        };

        match email.html {
            Some(html) => builder
                .multipart(MultiPart::alternative_plain_html(email.text, html))
                .map_err(Into::into),
            None => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(email.text)
                .map_err(Into::into),
        }
    }
}

impl EmailService for EmailServiceImpl {
    async fn send(&self, email: Email) -> anyhow::Result<bool> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map(|response| response.is_positive())
            .map_err(Into::into)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.transport
            .test_connection()
            .await?
            .then_some(())
            .ok_or_else(|| anyhow!("Failed to ping smtp server"))
    }
}

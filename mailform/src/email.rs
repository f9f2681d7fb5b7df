use anyhow::Context;
use mailform_config::{ContactConfig, SmtpConfig};
use mailform_email_impl::{EmailServiceImpl, SmtpServer};
use mailform_models::email_address::EmailAddress;

const FROM_NAME: &str = "Portfolio Contact";

/// Builds the SMTP mailer and the destination inbox, or `None` when the
/// transport is not fully configured. No connection is attempted here;
/// sessions are opened per request.
pub fn build(
    smtp: &SmtpConfig,
    contact: &ContactConfig,
) -> anyhow::Result<Option<(EmailServiceImpl, EmailAddress)>> {
    let Some(credentials) = smtp.credentials() else {
        return Ok(None);
    };

    let from: EmailAddress = credentials
        .user
        .parse()
        .context("SMTP_USER is not a valid email address")?;

    let recipient = match &contact.to_email {
        Some(to_email) => to_email
            .parse()
            .context("TO_EMAIL is not a valid email address")?,
        None => from.clone(),
    };

    let mailer = EmailServiceImpl::new(
        &SmtpServer {
            host: credentials.host.to_owned(),
            port: credentials.port,
            secure: credentials.secure,
            username: credentials.user.to_owned(),
            password: credentials.pass.to_owned(),
        },
        from.with_name(FROM_NAME.to_owned()),
    )?;

    Ok(Some((mailer, recipient)))
}

use anyhow::anyhow;
use mailform_core_contact_contracts::{ContactFeatureService, ContactSubmitError};
use mailform_email_contracts::{Email, EmailService};
use mailform_models::{
    contact::ContactSubmission,
    email_address::{EmailAddress, EmailAddressWithName},
};
use mailform_ratelimit_contracts::RateLimiterService;
use tracing::{debug, error};

const NO_MESSAGE_PLACEHOLDER: &str = "(no message provided)";

#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<RateLimiter, Email> {
    rate_limiter: RateLimiter,
    mailer: Option<Email>,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    /// Inbox that receives relayed submissions. `None` when the SMTP
    /// transport is not configured.
    pub recipient: Option<EmailAddress>,
}

impl<RateLimiter, EmailS> ContactFeatureServiceImpl<RateLimiter, EmailS> {
    pub fn new(
        rate_limiter: RateLimiter,
        mailer: Option<EmailS>,
        config: ContactFeatureConfig,
    ) -> Self {
        Self {
            rate_limiter,
            mailer,
            config,
        }
    }
}

impl<RateLimiter, EmailS> ContactFeatureService for ContactFeatureServiceImpl<RateLimiter, EmailS>
where
    RateLimiter: RateLimiterService,
    EmailS: EmailService,
{
    async fn submit(
        &self,
        submission: ContactSubmission,
        client_ip: String,
    ) -> Result<(), ContactSubmitError> {
        // Validation first: malformed submissions never consume quota.
        let errors = submission.validate();
        if !errors.is_empty() {
            return Err(ContactSubmitError::Invalid(errors));
        }

        if !self.rate_limiter.admit(&client_ip).await {
            debug!(%client_ip, "rate limit exceeded for contact submissions");
            return Err(ContactSubmitError::RateLimited);
        }

        let (Some(mailer), Some(recipient)) = (&self.mailer, &self.config.recipient) else {
            error!("smtp transport is not configured, rejecting contact submission");
            return Err(ContactSubmitError::NotConfigured);
        };

        mailer.ping().await.map_err(|err| {
            error!("failed to verify connection to the mail server: {err:#}");
            ContactSubmitError::Unreachable(err)
        })?;

        let email = render(&submission, &client_ip, recipient.clone());

        match mailer.send(email).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(send_error(anyhow!("the mail server rejected the message"))),
            Err(err) => Err(send_error(err)),
        }
    }
}

fn send_error(err: anyhow::Error) -> ContactSubmitError {
    error!("failed to send contact email: {err:#}");
    ContactSubmitError::Send(err)
}

fn render(submission: &ContactSubmission, client_ip: &str, recipient: EmailAddress) -> Email {
    let subject = format!(
        "Portfolio contact - {} - {}",
        *submission.service, *submission.name
    );

    let text = [
        "You have a new message from your portfolio contact form.".to_owned(),
        String::new(),
        format!("Name: {}", *submission.name),
        format!("Email: {}", *submission.email),
        format!("Service: {}", *submission.service),
        format!("IP: {client_ip}"),
        String::new(),
        "Message:".to_owned(),
        if submission.message.is_empty() {
            NO_MESSAGE_PLACEHOLDER.to_owned()
        } else {
            submission.message.to_string()
        },
        String::new(),
        "-- End of message --".to_owned(),
    ]
    .join("\n");

    let html_message = if submission.message.is_empty() {
        format!("<em>{NO_MESSAGE_PLACEHOLDER}</em>")
    } else {
        nl2br(&escape_html(&submission.message))
    };
    let html = format!(
        "<div style=\"font-family:system-ui,sans-serif;line-height:1.4;color:#111\">\
         <h2>New portfolio contact</h2>\
         <p><strong>Name:</strong> {name}</p>\
         <p><strong>Email:</strong> {email}</p>\
         <p><strong>Service:</strong> {service}</p>\
         <p><strong>IP:</strong> {ip}</p>\
         <hr/>\
         <p><strong>Message</strong></p>\
         <p>{html_message}</p>\
         </div>",
        name = escape_html(&submission.name),
        email = escape_html(&submission.email),
        service = escape_html(&submission.service),
        ip = escape_html(client_ip),
    );

    // The submitter address passed our permissive shape check but may still
    // not parse as a routable mailbox; degrade to no Reply-To rather than
    // failing the send.
    let reply_to = submission.email.parse::<EmailAddressWithName>().ok();
    if reply_to.is_none() {
        debug!("submitter email is not a routable address, skipping reply-to");
    }

    Email {
        recipient: recipient.into(),
        subject,
        text,
        html: Some(html),
        reply_to,
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn nl2br(raw: &str) -> String {
    raw.replace('\n', "<br/>")
}

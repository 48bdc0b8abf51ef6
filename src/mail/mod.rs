//! Outbound email notices.
//!
//! Delivery is best-effort: a failed send is logged and reported back to the caller
//! as `false`, never as an error.

use crate::errors::AppError;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Transport for outbound email.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Transport that writes every message to the log instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), AppError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Outbound email:\n{}",
            email.body
        );
        Ok(())
    }
}

/// Send `email` if there is one. Returns whether it was handed off successfully.
pub fn deliver(mailer: &dyn Mailer, email: Option<Email>) -> bool {
    let Some(email) = email else {
        return false;
    };

    match mailer.send(&email) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to send email to {}: {}", email.to, e);
            false
        }
    }
}

fn addressed(to: &str, subject: &str, body: String) -> Option<Email> {
    let to = to.trim();
    if to.is_empty() {
        return None;
    }
    Some(Email {
        to: to.to_string(),
        subject: subject.to_string(),
        body,
    })
}

/// Notice that an account was approved, with a sign-in link.
pub fn approval_email(name: &str, to: &str, public_url: &str) -> Option<Email> {
    addressed(
        to,
        "Account Approved - TrustPaper",
        format!(
            "Dear {name},\n\n\
             Congratulations! Your account has been approved by the admin.\n\n\
             You can now sign in to TrustPaper using your credentials.\n\n\
             Click here to sign in: {public_url}signin\n\n\
             Welcome to TrustPaper - Your Certificate Making Platform!\n\n\
             Best regards,\n\
             TrustPaper Team"
        ),
    )
}

/// Notice that a signup request was rejected.
pub fn rejection_email(name: &str, to: &str) -> Option<Email> {
    addressed(
        to,
        "Account Application Update - TrustPaper",
        format!(
            "Dear {name},\n\n\
             We regret to inform you that your account application has been rejected by our admin team.\n\n\
             This could be due to:\n\
             - Incomplete or incorrect information provided\n\
             - School verification issues\n\
             - Other administrative reasons\n\n\
             You may try signing up again with correct information if you believe this was an error.\n\n\
             For any questions, please contact our support team.\n\n\
             Best regards,\n\
             TrustPaper Team"
        ),
    )
}

/// Notice that an account was removed by the administrator.
pub fn removal_email(name: &str, to: &str) -> Option<Email> {
    addressed(
        to,
        "Account Removed - TrustPaper",
        format!(
            "Dear {name},\n\n\
             Your account has been removed from TrustPaper by the administrator.\n\n\
             If you wish to continue using TrustPaper, you will need to sign up again with valid information.\n\n\
             For any questions regarding this action, please contact the administrator.\n\n\
             Best regards,\n\
             TrustPaper Team"
        ),
    )
}

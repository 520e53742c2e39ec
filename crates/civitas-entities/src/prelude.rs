pub use super::mailer_emails::Entity as MailerEmails;
pub use super::types::EmailStatus;

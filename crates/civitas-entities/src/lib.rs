pub mod types;
pub mod mailer_emails;

pub mod prelude;

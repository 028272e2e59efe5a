pub mod averages;
pub mod mailer;

pub use averages::refresh_bootcamp_averages;
pub use mailer::{EmailMessage, LogMailer, MailError, Mailer};

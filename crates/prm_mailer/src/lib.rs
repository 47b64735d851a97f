pub mod digest;
pub mod smtp;

pub use digest::{render_digest, DigestNotifier};
pub use smtp::SmtpMailer;

pub mod prelude {
    pub use super::digest::DigestNotifier;
    pub use prm_core::{MailMessage, MailTransport, Result};
}

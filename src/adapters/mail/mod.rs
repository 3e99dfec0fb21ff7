//! Outbound mail adapters.

mod resend;

pub use resend::ResendMailSender;

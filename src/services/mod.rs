pub mod qr;
pub mod two_factor;

pub use two_factor::{DisableOutcome, Provisioning, StatusReport, TwoFactorService, VerifyOutcome};

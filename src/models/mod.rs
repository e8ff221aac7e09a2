pub mod audit;
pub mod two_factor;

pub use audit::{AuditAction, AuditEvent};
pub use two_factor::{CredentialUpsert, TwoFactorCredential};

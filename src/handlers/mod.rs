pub mod health;
pub mod two_factor;

pub use health::{health_check, root, store_health};
pub use two_factor::{disable_2fa, setup_2fa, status_2fa, verify_2fa};

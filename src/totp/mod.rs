//! TOTP (RFC 6238) のコア
//!
//! 純粋関数のみで構成され、ストレージやログには触れない。
//! - [`codec`]: シークレット生成、Base32、`otpauth://` URI
//! - [`engine`]: HOTP/TOTP コード計算と時間ウィンドウ検証
//! - [`state`]: 資格情報の有効化ステートマシン

pub mod codec;
pub mod engine;
pub mod state;

pub use engine::TotpParams;
pub use state::CredentialState;

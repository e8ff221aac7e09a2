use data_encoding::BASE32_NOPAD;
use rand::{RngCore, rngs::OsRng};

use crate::error::AppError;

/// シークレット長（バイト）。160ビット
pub const SECRET_LEN: usize = 20;

/// 20バイトのランダムシークレットを生成し、Base32（パディングなし）でエンコード
///
/// # Errors
/// OS の乱数生成器が利用できない場合は [`AppError::RandomSource`]。
/// 弱い乱数源へのフォールバックは行わない。
pub fn generate_secret() -> Result<String, AppError> {
    let mut bytes = [0u8; SECRET_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(AppError::RandomSource)?;
    Ok(BASE32_NOPAD.encode(&bytes))
}

/// Base32 シークレットをデコード
///
/// 小文字、空白、末尾の `=` パディングを許容する。不正な入力は `None`。
pub fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let normalized = normalized.trim_end_matches('=');

    if normalized.is_empty() {
        return None;
    }

    BASE32_NOPAD.decode(normalized.as_bytes()).ok()
}

/// 認証アプリ向けの `otpauth://` プロビジョニング URI を構築
///
/// 形式: `otpauth://totp/<issuer>:<label>?secret=<secret>&issuer=<issuer>`
///
/// issuer と label はパーセントエンコードする（スペースは `%20`、`:` は `%3A`）。
/// secret は Base32 なのでそのまま埋め込む。
pub fn build_provisioning_uri(secret: &str, label: &str, issuer: &str) -> String {
    let issuer = urlencoding::encode(issuer);
    let label = urlencoding::encode(label);
    format!("otpauth://totp/{issuer}:{label}?secret={secret}&issuer={issuer}")
}

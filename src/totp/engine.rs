use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::{Choice, ConstantTimeEq};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::totp::codec::decode_secret;

type HmacSha1 = Hmac<Sha1>;

const DEFAULT_STEP_SECS: u64 = 30;
const DEFAULT_DIGITS: u32 = 6;
const DEFAULT_WINDOW: u64 = 1;
const MAX_WINDOW: u64 = 10;

/// TOTP パラメータ
///
/// 認証アプリの事実上の標準は SHA-1 / 6桁 / 30秒。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotpParams {
    step_secs: u64,
    digits: u32,
    window: u64,
}

impl TotpParams {
    /// パラメータを検証して作成
    ///
    /// # Arguments
    /// * `step_secs` - 時間ステップ（秒、1以上）
    /// * `digits` - コード桁数（6〜8）
    /// * `window` - 前後に許容するステップ数（0〜10）
    pub fn new(step_secs: u64, digits: u32, window: u64) -> Result<Self, AppError> {
        if step_secs == 0 {
            return Err(AppError::Internal(anyhow::anyhow!(
                "totp step must be positive"
            )));
        }
        if !(6..=8).contains(&digits) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "totp digits must be between 6 and 8, got {digits}"
            )));
        }
        if window > MAX_WINDOW {
            return Err(AppError::Internal(anyhow::anyhow!(
                "totp window must be at most {MAX_WINDOW}, got {window}"
            )));
        }

        Ok(Self {
            step_secs,
            digits,
            window,
        })
    }

    pub fn step_secs(&self) -> u64 {
        self.step_secs
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn window(&self) -> u64 {
        self.window
    }
}

impl Default for TotpParams {
    fn default() -> Self {
        Self {
            step_secs: DEFAULT_STEP_SECS,
            digits: DEFAULT_DIGITS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// 時刻をカウンタに変換: `floor(unix秒 / step)`
///
/// エポック以前の時刻はカウンタ 0 として扱う。
pub fn counter_for_time(at: OffsetDateTime, step_secs: u64) -> u64 {
    let secs = u64::try_from(at.unix_timestamp()).unwrap_or(0);
    secs.checked_div(step_secs).unwrap_or(0)
}

/// HOTP コードを計算（RFC 4226 §5.3）
///
/// 1. カウンタを8バイトのビッグエンディアンに変換
/// 2. シークレットを鍵に HMAC-SHA1
/// 3. 動的切り詰め: 末尾バイトの下位4ビットをオフセットとして4バイト読み、符号ビットを落とす
/// 4. `10^digits` の剰余をゼロ埋め
///
/// `digits` は 1〜9 に丸める。
pub fn compute_code(secret: &[u8], counter: u64, digits: u32) -> String {
    let digits = digits.clamp(1, 9);

    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]) & 0x7fff_ffff;

    let code = binary % 10u32.pow(digits);
    format!("{code:0width$}", width = digits as usize)
}

/// TOTP コードを検証
///
/// 現在カウンタの前後 `window` ステップ（計 `2*window+1` 個）と定数時間で比較する。
/// 途中で一致しても残りのカウンタも計算する。
/// 桁数違い・数字以外を含むコードや、デコードできないシークレットは不一致として扱う。
pub fn verify(secret: &str, candidate: &str, now: OffsetDateTime, params: &TotpParams) -> bool {
    if !is_well_formed(candidate, params.digits) {
        return false;
    }

    let Some(key) = decode_secret(secret) else {
        return false;
    };

    let current = counter_for_time(now, params.step_secs);
    // 負のカウンタは存在しないので下端は 0 で打ち切る
    let first = current.saturating_sub(params.window);
    let last = current.saturating_add(params.window);

    let mut matched = Choice::from(0u8);
    for counter in first..=last {
        let expected = compute_code(&key, counter, params.digits);
        matched |= expected.as_bytes().ct_eq(candidate.as_bytes());
    }

    matched.into()
}

fn is_well_formed(candidate: &str, digits: u32) -> bool {
    candidate.len() == digits as usize && candidate.bytes().all(|b| b.is_ascii_digit())
}

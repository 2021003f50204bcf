//! Request signing for the Edge TTS endpoints.
//!
//! Every request carries a `Sec-MS-GEC` token derived from the current time
//! (five-minute resolution) and the public trusted client token.

use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Public token the Edge browser sends with read-aloud requests.
pub const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";

/// Browser version the requests claim to come from.
pub const CHROMIUM_FULL_VERSION: &str = "130.0.2849.68";

/// Major part of [`CHROMIUM_FULL_VERSION`].
pub const CHROMIUM_MAJOR_VERSION: &str = "130";

/// Value of the `Sec-MS-GEC-Version` parameter.
pub static SEC_MS_GEC_VERSION: LazyLock<String> =
    LazyLock::new(|| format!("1-{}", CHROMIUM_FULL_VERSION));

/// `User-Agent` of the matching Edge build.
pub static USER_AGENT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/{major}.0.0.0 Safari/537.36 Edg/{major}.0.0.0",
        major = CHROMIUM_MAJOR_VERSION
    )
});

/// `Sec-CH-UA` client hint of the matching Edge build.
pub static SEC_CH_UA: LazyLock<String> = LazyLock::new(|| {
    format!(
        "\" Not;A Brand\";v=\"99\", \"Microsoft Edge\";v=\"{major}\", \"Chromium\";v=\"{major}\"",
        major = CHROMIUM_MAJOR_VERSION
    )
});

/// Seconds between 1601-01-01 (Windows epoch) and 1970-01-01.
const WINDOWS_EPOCH_OFFSET: i64 = 11_644_473_600;

/// Token validity window in seconds.
const WINDOW_SECONDS: i64 = 300;

/// 100-nanosecond intervals per second.
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Compute the `Sec-MS-GEC` token for a Unix timestamp in seconds.
pub fn sec_ms_gec(unix_seconds: i64) -> String {
    let mut seconds = unix_seconds + WINDOWS_EPOCH_OFFSET;
    seconds -= seconds.rem_euclid(WINDOW_SECONDS);
    let ticks = seconds * TICKS_PER_SECOND;

    let mut hasher = Sha256::new();
    hasher.update(format!("{}{}", ticks, TRUSTED_CLIENT_TOKEN).as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// Current Unix time in seconds, shifted by `skew_seconds`.
pub fn unix_now(skew_seconds: i64) -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    now + skew_seconds
}

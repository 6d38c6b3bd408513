use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Валидация Telegram Web App init data
///
/// Telegram подписывает данные с помощью HMAC-SHA256.
/// Ключ для HMAC создаётся из bot token: HMAC_SHA256("WebAppData", bot_token)
///
/// Verification failure carries no detail that a caller could leak to the
/// client; every malformed input collapses into [`AuthError::InvalidInitData`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Signature mismatch, missing `hash`, or unparseable payload.
    #[error("invalid init_data")]
    InvalidInitData,
}

/// Verifies a Mini App init-data string and returns its key-value pairs.
///
/// Algorithm (must match Telegram's WebApp signature scheme exactly):
/// 1. Parse `init_data` as a URL-encoded query string. Values are
///    percent-decoded, blank values retained. Duplicate keys: last wins.
/// 2. Extract and remove `hash`; absent means failure.
/// 3. Data check string: remaining pairs as `key=value` lines, keys sorted
///    lexicographically, joined with `\n`, no trailing newline.
/// 4. secret_key = HMAC_SHA256(key = "WebAppData", message = bot_token)
/// 5. expected = HMAC_SHA256(key = secret_key, message = check string)
/// 6. Compare against the supplied hash in constant time.
///
/// On success returns the pairs minus `hash`; the `user` pair is only
/// trustworthy as part of the verified whole.
///
/// # Пример
/// ```
/// use tamagocho_backend::telegram::webapp_auth::verify_init_data;
///
/// // Forged hash: verification rejects without revealing why.
/// let init_data = "auth_date=1700000000&hash=deadbeef";
/// assert!(verify_init_data(init_data, "123456:bot-token").is_err());
/// ```
pub fn verify_init_data(
    init_data: &str,
    bot_token: &str,
) -> Result<BTreeMap<String, String>, AuthError> {
    if init_data.is_empty() {
        return Err(AuthError::InvalidInitData);
    }

    // BTreeMap: insertion order gives last-value-wins for duplicate keys,
    // iteration order gives the sorted data check string.
    let mut pairs: BTreeMap<String, String> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let received_hash = pairs.remove("hash").ok_or(AuthError::InvalidInitData)?;
    let received_hash = hex::decode(received_hash).map_err(|_| AuthError::InvalidInitData)?;

    let data_check_string = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n");

    // secret key: HMAC_SHA256("WebAppData", bot_token)
    let mut secret_key_mac =
        HmacSha256::new_from_slice(b"WebAppData").map_err(|_| AuthError::InvalidInitData)?;
    secret_key_mac.update(bot_token.as_bytes());
    let secret_key = secret_key_mac.finalize().into_bytes();

    let mut mac =
        HmacSha256::new_from_slice(&secret_key).map_err(|_| AuthError::InvalidInitData)?;
    mac.update(data_check_string.as_bytes());

    // Constant-time comparison. String equality here would be a timing oracle.
    mac.verify_slice(&received_hash)
        .map_err(|_| AuthError::InvalidInitData)?;

    Ok(pairs)
}

/// Извлечение user id из проверенных пар init data.
///
/// The `user` pair holds a JSON object with at least an `id` field. Call
/// only with pairs returned by [`verify_init_data`].
pub fn extract_user_id(pairs: &BTreeMap<String, String>) -> Option<i64> {
    let user_json = pairs.get("user")?;
    let user: serde_json::Value = serde_json::from_str(user_json).ok()?;
    user.get("id").and_then(|v| v.as_i64())
}

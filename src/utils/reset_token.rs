use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Generate an opaque password-reset token: 256 bits from the OS CSPRNG,
/// base64url-encoded so it can ride in a link. Validity is determined by
/// the stored copy on the user row, never by the string itself.
pub fn generate_reset_token() -> anyhow::Result<String> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to read system randomness: {}", e))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

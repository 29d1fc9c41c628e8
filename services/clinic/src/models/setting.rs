//! System settings
//!
//! Rows of `system_settings` whose key starts with [`QR_API_KEY_PREFIX`]
//! hold the API keys accepted from check-in kiosks.

/// Prefix of `setting_key` for rows holding kiosk API keys
pub const QR_API_KEY_PREFIX: &str = "qr_api_key";

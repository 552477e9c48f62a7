use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const COMPANY_NAME: &str = "company_name";
pub const COMPANY_ADDRESS: &str = "company_address";
pub const COMPANY_PHONE: &str = "company_phone";
pub const COMPANY_EMAIL: &str = "company_email";
pub const COMPANY_LOGO: &str = "company_logo";
pub const CURRENCY: &str = "currency";
pub const AUTO_PRINT: &str = "auto_print";

pub const KNOWN_KEYS: [&str; 7] = [
    COMPANY_NAME,
    COMPANY_ADDRESS,
    COMPANY_PHONE,
    COMPANY_EMAIL,
    COMPANY_LOGO,
    CURRENCY,
    AUTO_PRINT,
];

pub const MAX_LOGO_BYTES: usize = 500_000;

/// Header printed on every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Base64 image bytes.
    pub logo: Option<String>,
    pub currency: String,
    pub auto_print: bool,
}

impl Default for CompanySettings {
    fn default() -> Self {
        CompanySettings {
            name: "SAMA MAGASIN".to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            logo: None,
            currency: "FCFA".to_string(),
            auto_print: false,
        }
    }
}

impl CompanySettings {
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = CompanySettings::default();
        let text = |key: &str, fallback: String| {
            map.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or(fallback)
        };

        CompanySettings {
            name: text(COMPANY_NAME, defaults.name),
            address: text(COMPANY_ADDRESS, defaults.address),
            phone: text(COMPANY_PHONE, defaults.phone),
            email: text(COMPANY_EMAIL, defaults.email),
            logo: map.get(COMPANY_LOGO).filter(|v| !v.is_empty()).cloned(),
            currency: text(CURRENCY, defaults.currency),
            auto_print: map.get(AUTO_PRINT).is_some_and(|v| v == "true"),
        }
    }

    /// `data:` URL for an `<img>` tag.
    pub fn logo_data_url(&self) -> Option<String> {
        let logo = self.logo.as_deref()?;
        let mime = if logo.starts_with("/9j/") {
            "image/jpeg"
        } else {
            "image/png"
        };
        Some(format!("data:{mime};base64,{logo}"))
    }
}

pub fn check_key(key: &str) -> Result<()> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(Error::validation(format!("Paramètre inconnu : {key}")))
    }
}

/// Checks an uploaded logo and returns it encoded for storage.
pub fn encode_logo(bytes: &[u8]) -> Result<String> {
    if bytes.len() > MAX_LOGO_BYTES {
        return Err(Error::validation("Le logo est trop volumineux. Maximum 500 Ko."));
    }

    let is_png = bytes.starts_with(&[0x89, b'P', b'N', b'G']);
    let is_jpeg = bytes.starts_with(&[0xFF, 0xD8, 0xFF]);
    if !is_png && !is_jpeg {
        return Err(Error::validation("Format d'image non supporté (PNG ou JPEG)"));
    }

    Ok(BASE64.encode(bytes))
}

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{PropdeskError, Result};
use crate::types::ListingKind;

pub const AUTH_TOKEN: &str = "auth_token";
pub const PROPERTY_DRAFT: &str = "property_draft";
pub const PARTNER_LOGO: &str = "partner_logo";

/// JSON blobs under fixed keys, one file per key.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// ~/.local/share/propdesk/ (Linux) or ~/Library/Application Support/propdesk/ (macOS)
    pub fn open_default() -> Option<Self> {
        Some(Self::at(dirs::data_dir()?.join("propdesk")))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Read a stored value. Returns None if missing or corrupt.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = std::fs::read_to_string(self.path(key)).ok()?;
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring corrupt stored value");
                None
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let data = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path(key), data)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Half-filled "post a property" form, kept between sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub listing_kind: Option<ListingKind>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub area_sq_ft: Option<f64>,
    #[serde(default)]
    pub contact_phone: String,
}

impl PropertyDraft {
    pub fn is_blank(&self) -> bool {
        *self == PropertyDraft::default()
    }

    /// Every problem with the form, in field order.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            problems.push("Title is required".to_string());
        } else if title.chars().count() > 120 {
            problems.push("Title must be at most 120 characters".to_string());
        }
        match self.price {
            None => problems.push("Price is required".to_string()),
            Some(p) if !p.is_finite() || p <= 0.0 => {
                problems.push("Price must be greater than zero".to_string())
            }
            _ => {}
        }
        if self.city.trim().is_empty() {
            problems.push("City is required".to_string());
        }
        if self.listing_kind.is_none() {
            problems.push("Choose sale or rent".to_string());
        }
        if let Some(area) = self.area_sq_ft {
            if !area.is_finite() || area <= 0.0 {
                problems.push("Area must be greater than zero".to_string());
            }
        }
        let digits = self.contact_phone.chars().filter(|c| c.is_ascii_digit()).count();
        let phone_chars_ok = self
            .contact_phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'));
        if !phone_chars_ok || !(10..=13).contains(&digits) {
            problems.push("Contact phone must have 10 to 13 digits".to_string());
        }

        problems
    }

    /// Checked locally; nothing here goes over the network.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(PropdeskError::Validation(problems.join("; ")))
        }
    }
}

/// Partner branding shown in the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerLogo {
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Preferred label file format for aggregator labels and merge output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    Png,
    Pdf,
    Zpl,
}

impl LabelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelFormat::Png => "png",
            LabelFormat::Pdf => "pdf",
            LabelFormat::Zpl => "zpl",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "png" => Ok(LabelFormat::Png),
            "pdf" => Ok(LabelFormat::Pdf),
            "zpl" => Ok(LabelFormat::Zpl),
            other => Err(Error::Config(format!(
                "unsupported label format {other:?} (expected png, pdf or zpl)"
            ))),
        }
    }

    /// Key of the label URL inside the aggregator's `postage_label` payload.
    /// PNG is the unprefixed default key.
    pub fn url_key(&self) -> &'static str {
        match self {
            LabelFormat::Png => "label_url",
            LabelFormat::Pdf => "label_pdf_url",
            LabelFormat::Zpl => "label_zpl_url",
        }
    }
}

/// Shipping configuration, loaded fresh per orchestrator instantiation.
///
/// Mirrors the host ERP's settings singleton: API keys, shipper numbers,
/// enabled flags, label-format preference and the test-vs-production toggle.
#[derive(Debug, Clone)]
pub struct ShippingSettings {
    pub currency: String,
    pub label_format: LabelFormat,
    pub easypost_enabled: bool,
    pub easypost_api_key: Option<String>,
    pub ups_client_id: Option<String>,
    pub ups_client_secret: Option<String>,
    pub ups_shipper_number: Option<String>,
    pub fedex_api_key: Option<String>,
    pub fedex_secret_key: Option<String>,
    pub fedex_shipper_number: Option<String>,
    pub use_test_environment: bool,
    /// Shipper display name printed on labels.
    pub company_name: String,
    /// Company phone used when neither contact nor address carries one.
    pub company_phone: Option<String>,
    /// Private directory where label artifacts are written.
    pub files_dir: PathBuf,
    /// Public base URL the stored artifacts are served under.
    pub site_url: String,
}

impl ShippingSettings {
    /// Load settings from environment variables
    ///
    /// # Environment Variables
    /// - `SITE_URL`: Required - public base URL for stored label files
    /// - `COMPANY_NAME`: Required - shipper display name
    /// - `SHIPPING_CURRENCY`: Optional - rates currency (default: "USD")
    /// - `SHIPPING_LABEL_FORMAT`: Optional - png, pdf or zpl (default: "png")
    /// - `LABEL_FILES_DIR`: Optional - label storage dir (default: "private/files")
    /// - `EASYPOST_ENABLED`: Optional - aggregator toggle (default: true)
    /// - `EASYPOST_API_KEY`: Optional - aggregator API key
    /// - `UPS_CLIENT_ID` / `UPS_CLIENT_SECRET` / `UPS_SHIPPER_NUMBER`: Optional
    /// - `FEDEX_API_KEY` / `FEDEX_SECRET_KEY` / `FEDEX_SHIPPER_NUMBER`: Optional
    /// - `USE_TEST_ENVIRONMENT`: Optional - carrier sandbox toggle (default: false)
    /// - `COMPANY_PHONE`: Optional - fallback phone for contacts without one
    pub fn from_env() -> Result<Self> {
        let site_url = required("SITE_URL")?;
        let company_name = required("COMPANY_NAME")?;

        let currency = optional("SHIPPING_CURRENCY").unwrap_or_else(|| "USD".to_string());
        let label_format = match optional("SHIPPING_LABEL_FORMAT") {
            Some(raw) => LabelFormat::parse(&raw)?,
            None => LabelFormat::Png,
        };
        let files_dir = optional("LABEL_FILES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("private/files"));

        Ok(ShippingSettings {
            currency,
            label_format,
            easypost_enabled: flag("EASYPOST_ENABLED", true),
            easypost_api_key: optional("EASYPOST_API_KEY"),
            ups_client_id: optional("UPS_CLIENT_ID"),
            ups_client_secret: optional("UPS_CLIENT_SECRET"),
            ups_shipper_number: optional("UPS_SHIPPER_NUMBER"),
            fedex_api_key: optional("FEDEX_API_KEY"),
            fedex_secret_key: optional("FEDEX_SECRET_KEY"),
            fedex_shipper_number: optional("FEDEX_SHIPPER_NUMBER"),
            use_test_environment: flag("USE_TEST_ENVIRONMENT", false),
            company_name,
            company_phone: optional("COMPANY_PHONE"),
            files_dir,
            site_url: site_url.trim_end_matches('/').to_string(),
        })
    }

    /// Whether enough UPS credentials exist to build the direct client.
    pub fn ups_configured(&self) -> bool {
        self.ups_client_id.is_some()
            && self.ups_client_secret.is_some()
            && self.ups_shipper_number.is_some()
    }

    /// Whether enough FedEx credentials exist to build the direct client.
    pub fn fedex_configured(&self) -> bool {
        self.fedex_api_key.is_some()
            && self.fedex_secret_key.is_some()
            && self.fedex_shipper_number.is_some()
    }
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name).map_err(|_| Error::Config(format!("{name} not set")))?;
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(value)
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

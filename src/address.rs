//! Carrier-agnostic address and contact normalization.
//!
//! The host ERP hands over loose contact/address records; carriers want a
//! fully populated block with a resolvable phone and a 2-letter state code.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::AddressBlock;

/// Placeholder used when no phone can be resolved anywhere; carriers reject
/// blank phone fields outright.
const DUMMY_PHONE: &str = "0000000000";

/// Stands in for a named contact on dock-to-dock shipments.
const DEPARTMENT_FALLBACK: &str = "Receiving Dept";

/// Loose contact record as the host ERP stores it. Any field may be blank.
#[derive(Debug, Clone, Default)]
pub struct RawContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub mobile_no: Option<String>,
    pub email: Option<String>,
}

/// Loose address record from the host ERP.
#[derive(Debug, Clone)]
pub struct RawAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// US state and territory names, lowercased, to their 2-letter codes.
static US_STATE_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("alabama", "AL"),
        ("alaska", "AK"),
        ("arizona", "AZ"),
        ("arkansas", "AR"),
        ("california", "CA"),
        ("colorado", "CO"),
        ("connecticut", "CT"),
        ("delaware", "DE"),
        ("florida", "FL"),
        ("georgia", "GA"),
        ("hawaii", "HI"),
        ("idaho", "ID"),
        ("illinois", "IL"),
        ("indiana", "IN"),
        ("iowa", "IA"),
        ("kansas", "KS"),
        ("kentucky", "KY"),
        ("louisiana", "LA"),
        ("maine", "ME"),
        ("maryland", "MD"),
        ("massachusetts", "MA"),
        ("michigan", "MI"),
        ("minnesota", "MN"),
        ("mississippi", "MS"),
        ("missouri", "MO"),
        ("montana", "MT"),
        ("nebraska", "NE"),
        ("nevada", "NV"),
        ("new hampshire", "NH"),
        ("new jersey", "NJ"),
        ("new mexico", "NM"),
        ("new york", "NY"),
        ("north carolina", "NC"),
        ("north dakota", "ND"),
        ("ohio", "OH"),
        ("oklahoma", "OK"),
        ("oregon", "OR"),
        ("pennsylvania", "PA"),
        ("rhode island", "RI"),
        ("south carolina", "SC"),
        ("south dakota", "SD"),
        ("tennessee", "TN"),
        ("texas", "TX"),
        ("utah", "UT"),
        ("vermont", "VT"),
        ("virginia", "VA"),
        ("washington", "WA"),
        ("west virginia", "WV"),
        ("wisconsin", "WI"),
        ("wyoming", "WY"),
        // Territories
        ("american samoa", "AS"),
        ("district of columbia", "DC"),
        ("guam", "GU"),
        ("northern mariana islands", "MP"),
        ("puerto rico", "PR"),
        ("virgin islands", "VI"),
    ])
});

/// Normalize a state to its 2-letter code. Two-letter input passes through
/// uppercased; full names go through the lookup table.
pub fn state_code(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.len() == 2 {
        return Ok(trimmed.to_uppercase());
    }
    US_STATE_CODES
        .get(trimmed.to_lowercase().as_str())
        .map(|code| (*code).to_string())
        .ok_or_else(|| {
            Error::Validation(format!(
                "invalid state {trimmed:?}: must be a 2-letter code or a full US state name"
            ))
        })
}

/// Digits-only phone, truncated to 15. Carriers reject anything under 10
/// digits, so short numbers fail here before any network call.
pub fn clean_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(15).collect();
    if digits.len() < 10 {
        return Err(Error::Validation(format!(
            "invalid phone number {raw:?}: carriers require at least 10 digits"
        )));
    }
    Ok(digits)
}

/// Third-party billing zips must be plain 5-digit US zips.
pub fn validate_billing_zip(zip: &str) -> Result<()> {
    let cleaned = zip.trim();
    if cleaned.len() != 5 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(format!(
            "invalid third-party billing zip {zip:?}: must be a 5-digit numeric US zip"
        )));
    }
    Ok(())
}

/// Build the canonical address block from loose ERP records.
///
/// Pure transform; `company_phone` is the ERP-stored company default used at
/// the tail of the phone fallback chain.
pub fn build_address_block(
    contact: Option<&RawContact>,
    address: &RawAddress,
    company_phone: Option<&str>,
) -> Result<AddressBlock> {
    let country = address.country.trim();
    if country.is_empty() {
        return Err(Error::Validation(
            "address has no country".to_string(),
        ));
    }
    let zip: String = address.pincode.split_whitespace().collect();
    if zip.is_empty() {
        return Err(Error::Validation(
            "address has no postal code".to_string(),
        ));
    }

    let name = contact_full_name(contact);
    let company = match &address.company {
        Some(company) if !company.trim().is_empty() && company.trim() != name => {
            Some(company.trim().to_string())
        }
        // No distinguishable billed company: fall back to the department tag.
        _ => Some(DEPARTMENT_FALLBACK.to_string()),
    };

    let phone = first_non_blank(&[
        contact.and_then(|c| c.phone.as_deref()),
        contact.and_then(|c| c.mobile_no.as_deref()),
        address.phone.as_deref(),
        company_phone,
    ])
    .unwrap_or(DUMMY_PHONE)
    .to_string();

    let email = contact
        .and_then(|c| c.email.as_deref())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string);

    Ok(AddressBlock {
        name,
        company,
        street1: address.address_line1.trim().to_string(),
        street2: address
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
        city: address.city.trim().to_string(),
        state: state_code(&address.state)?,
        zip,
        country: country.to_string(),
        phone,
        email,
    })
}

fn contact_full_name(contact: Option<&RawContact>) -> String {
    let Some(contact) = contact else {
        return DEPARTMENT_FALLBACK.to_string();
    };
    let first = contact.first_name.as_deref().unwrap_or("").trim();
    let last = contact.last_name.as_deref().unwrap_or("").trim();
    let full = format!("{first} {last}");
    let full = full.trim();
    if full.is_empty() {
        DEPARTMENT_FALLBACK.to_string()
    } else {
        full.to_string()
    }
}

fn first_non_blank<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

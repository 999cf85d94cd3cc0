//! Shared data model: parcels, addresses, quotes, purchases, tracking.
//!
//! Carrier-specific request/response contracts live with their clients;
//! everything here is the provider-agnostic representation the orchestrators
//! trade in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of quote sources. Adding a carrier is a compile-checked
/// extension of this enum and the `match` sites that dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    EasyPost,
    Ups,
    FedEx,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::EasyPost => "EasyPost",
            Provider::Ups => "UPS",
            Provider::FedEx => "FedEx",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parcel row as entered on the host shipment: physical dimensions plus
/// how many identical boxes the row stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelRow {
    /// Inches.
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Pounds. Converted to carrier-native units at the wire boundary.
    pub weight: f64,
    pub count: u32,
}

/// A single physical box, after row explosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

/// Explode parcel rows into one record per physical box.
pub fn explode_parcels(rows: &[ParcelRow]) -> Vec<Parcel> {
    let mut parcels = Vec::new();
    for row in rows {
        for _ in 0..row.count {
            parcels.push(Parcel {
                length: row.length,
                width: row.width,
                height: row.height,
                weight: row.weight,
            });
        }
    }
    parcels
}

/// Carrier-agnostic address block, already normalized (2-letter state code,
/// stripped zip, resolved phone). Serializes with the aggregator's field
/// names so it can go straight onto the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressBlock {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub street1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Third-party billing facts: the payer's carrier account (alphanumeric
/// only, already cleaned) and billing zip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirdPartyBilling {
    pub account: String,
    pub postal_code: String,
}

/// Request context a quote carries so it can be bought later without
/// re-deriving anything from the host shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub to_address: AddressBlock,
    pub from_address: AddressBlock,
    pub parcels: Vec<Parcel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<ThirdPartyBilling>,
}

/// A priced service offered for the shipment.
///
/// Quotes round-trip through the client UI as JSON: the selected one comes
/// back whole for purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub provider: Provider,
    /// Raw carrier code as the provider reports it (e.g. `FedExDefault`).
    pub carrier_code: String,
    /// Human display name for the carrier.
    pub carrier: String,
    pub service_code: String,
    /// Human display name for the service.
    pub service_name: String,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<i64>,
    /// Aggregator correlation id (`shp_…` or `order_…`); absent for
    /// carrier-direct quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    /// Aggregator rate id, used by the single-shipment buy endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_id: Option<String>,
    pub request: QuoteRequest,
}

/// One service quote as a direct carrier reports it, before it is folded
/// into a provider-agnostic [`Quote`].
#[derive(Debug, Clone, PartialEq)]
pub struct RatedService {
    pub service_code: String,
    pub service_name: String,
    pub total_charge: f64,
    pub delivery_days: Option<i64>,
}

/// Canonical record of a completed label purchase. The host ERP persists
/// these fields onto its shipment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub provider: Provider,
    pub carrier: String,
    pub carrier_service: String,
    pub shipment_id: String,
    pub shipment_amount: f64,
    /// Comma-joined when the purchase covered several packages.
    pub awb_number: String,
    /// Raw per-package label URLs, in package order.
    pub label_bundle: Vec<String>,
    /// Single merged artifact (PDF or ZPL file) suitable for printing.
    pub shipping_label: String,
}

/// Normalized tracking snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingData {
    pub awb_number: String,
    pub tracking_status: String,
    pub tracking_status_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
}

/// Some carrier endpoints return a single object where several are
/// possible. Deserializes either shape and always hands back a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Carrier prices arrive as strings, numbers, or not at all.
pub(crate) fn json_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

/// Same normalization for integer-ish fields (delivery day counts).
pub(crate) fn json_i64(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: u32) -> ParcelRow {
        ParcelRow {
            length: 12.0,
            width: 10.0,
            height: 6.0,
            weight: 5.0,
            count,
        }
    }

    fn address() -> AddressBlock {
        AddressBlock {
            name: "Pat Doe".to_string(),
            company: None,
            street1: "123 Main St".to_string(),
            street2: None,
            city: "Orange".to_string(),
            state: "CA".to_string(),
            zip: "92867".to_string(),
            country: "US".to_string(),
            phone: "7145551212".to_string(),
            email: None,
        }
    }

    #[test]
    fn explosion_yields_sum_of_counts() {
        let rows = vec![row(3), row(1), row(2)];
        let parcels = explode_parcels(&rows);
        assert_eq!(parcels.len(), 6);
        for parcel in &parcels {
            assert_eq!(
                parcel,
                &Parcel {
                    length: 12.0,
                    width: 10.0,
                    height: 6.0,
                    weight: 5.0
                }
            );
        }
    }

    #[test]
    fn explosion_of_zero_count_row_is_empty() {
        assert!(explode_parcels(&[row(0)]).is_empty());
    }

    #[test]
    fn one_or_many_accepts_both_shapes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            code: String,
        }

        let single: OneOrMany<Item> = serde_json::from_str(r#"{"code": "03"}"#).unwrap();
        assert_eq!(single.into_vec().len(), 1);

        let many: OneOrMany<Item> =
            serde_json::from_str(r#"[{"code": "03"}, {"code": "12"}]"#).unwrap();
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn json_scalars_accept_strings_and_numbers() {
        assert_eq!(json_f64(Some(&serde_json::json!("25.15"))), Some(25.15));
        assert_eq!(json_f64(Some(&serde_json::json!(25.15))), Some(25.15));
        assert_eq!(json_f64(Some(&serde_json::json!(null))), None);
        assert_eq!(json_f64(None), None);
        assert_eq!(json_i64(Some(&serde_json::json!("3"))), Some(3));
        assert_eq!(json_i64(Some(&serde_json::json!(3))), Some(3));
    }

    #[test]
    fn quote_round_trips_through_json() {
        let quote = Quote {
            provider: Provider::Ups,
            carrier_code: "UPS".to_string(),
            carrier: "UPS".to_string(),
            service_code: "03".to_string(),
            service_name: "Ground".to_string(),
            total_price: 18.40,
            delivery_days: Some(3),
            shipment_id: None,
            rate_id: None,
            request: QuoteRequest {
                to_address: address(),
                from_address: address(),
                parcels: explode_parcels(&[row(2)]),
                billing: Some(ThirdPartyBilling {
                    account: "A1B2C3".to_string(),
                    postal_code: "92867".to_string(),
                }),
            },
        };

        let serialized = serde_json::to_string(&quote).unwrap();
        let parsed: Quote = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, quote);
    }
}

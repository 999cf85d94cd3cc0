//! Multi-carrier aggregator client (EasyPost API).
//!
//! Handles both request shapes: a single-parcel "shipment" and a
//! multi-parcel "order" (one sub-shipment per physical box), plus label
//! retrieval and tracking for either.

use once_cell::sync::Lazy;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::config::{LabelFormat, ShippingSettings};
use crate::error::{Error, Result};
use crate::labels::LabelConverter;
use crate::models::{
    json_f64, json_i64, AddressBlock, Parcel, Provider, PurchaseResult, Quote, QuoteRequest,
    ThirdPartyBilling, TrackingData,
};
use crate::ups::UPS_ACCOUNT_LEN;

const EASYPOST_BASE_URL: &str = "https://api.easypost.com";

/// Aggregator order ids are prefixed; everything else is a plain shipment.
const ORDER_ID_PREFIX: &str = "order_";

/// The aggregator's pooled FedEx account code vs the carrier-branded one.
/// Both can show up for the same parcels; see [`filter_carrier_collisions`].
const POOLED_FEDEX_CARRIER: &str = "FedExDefault";
const BRANDED_FEDEX_CARRIER: &str = "FedEx";

/// Friendlier display names for the carrier and service codes the
/// aggregator returns. Purely cosmetic, never sent back to the API.
static DISPLAY_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Carrier aliases the rest of the code expects
        ("FEDEXDEFAULT", "FedEx"),
        ("UPSDAP", "UPS"),
        ("USPS", "USPS"),
        // Service renames
        ("FEDEX_2_DAY", "2-Day"),
        ("FEDEX_2_DAY_AM", "2-Day AM"),
        ("FEDEX_EXPRESS_SAVER", "Express Saver"),
        ("FEDEX_GROUND", "Ground"),
        ("PRIORITY_OVERNIGHT", "Priority Overnight"),
        ("STANDARD_OVERNIGHT", "Standard Overnight"),
        ("SMART_POST", "Smart Post"),
        ("GroundAdvantage", "Ground Advantage"),
        ("3DaySelect", "3-Day"),
        ("2ndDayAir", "2-Day"),
        ("2ndDayAirAM", "2-Day AM"),
        ("NextDayAir", "Next Day Air"),
        ("NextDayAirSaver", "Next Day Air Saver"),
        ("NextDayAirEarlyAM", "Next Day Air AM"),
    ])
});

fn pretty(raw: &str) -> String {
    DISPLAY_MAP
        .get(raw)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn display_carrier(code: &str) -> String {
    if code.eq_ignore_ascii_case("easypost") {
        return "EasyPost".to_string();
    }
    pretty(&code.to_uppercase())
}

pub struct EasyPostClient {
    api_key: String,
    currency: String,
    label_format: LabelFormat,
    http: HttpClient,
    base_url: String,
}

impl EasyPostClient {
    pub fn new(settings: &ShippingSettings) -> Result<Self> {
        if !settings.easypost_enabled {
            return Err(Error::Config(
                "EasyPost integration is disabled in the shipping settings".to_string(),
            ));
        }
        let api_key = settings.easypost_api_key.clone().ok_or_else(|| {
            Error::Config("EasyPost API key is missing in the shipping settings".to_string())
        })?;
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            api_key,
            currency: settings.currency.clone(),
            label_format: settings.label_format,
            http,
            base_url: EASYPOST_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.api_key, Some(""))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::carrier(Provider::EasyPost, status.as_u16(), &text));
        }
        let value: Value = serde_json::from_str(&text)?;
        // The API reports some failures inside a 2xx body.
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return Err(Error::Carrier {
                provider: Provider::EasyPost,
                status: status.as_u16(),
                detail: message.to_string(),
            });
        }
        Ok(value)
    }

    /// Shop rates for the shipment. Parcel count decides the request shape:
    /// more than one box becomes an order with one sub-shipment per box.
    pub async fn get_available_services(
        &self,
        to_address: &AddressBlock,
        from_address: &AddressBlock,
        parcels: &[Parcel],
        billing: Option<&ThirdPartyBilling>,
    ) -> Result<Vec<Quote>> {
        if parcels.is_empty() {
            return Err(Error::Validation("shipment has no parcels".to_string()));
        }

        let request = QuoteRequest {
            to_address: to_address.clone(),
            from_address: from_address.clone(),
            parcels: parcels.to_vec(),
            billing: billing.cloned(),
        };

        let quotes = if parcels.len() > 1 {
            let body = json!({
                "order": {
                    "to_address": serde_json::to_value(to_address)?,
                    "from_address": serde_json::to_value(from_address)?,
                    "shipments": parcels
                        .iter()
                        .map(|parcel| json!({ "parcel": parcel_json(parcel) }))
                        .collect::<Vec<_>>(),
                    "options": self.options_json(billing),
                }
            });
            let response = self.post("/v2/orders", &body).await?;
            // The order endpoint already consolidates the price.
            quotes_from_rates(&response, 1.0, &request)
        } else {
            let body = json!({
                "shipment": {
                    "to_address": serde_json::to_value(to_address)?,
                    "from_address": serde_json::to_value(from_address)?,
                    "parcel": parcel_json(&parcels[0]),
                    "options": self.options_json(billing),
                }
            });
            let response = self.post("/v2/shipments", &body).await?;
            // Per-unit rate, scaled by parcel count.
            quotes_from_rates(&response, parcels.len() as f64, &request)
        };

        Ok(filter_carrier_collisions(quotes, parcels.len()))
    }

    fn options_json(&self, billing: Option<&ThirdPartyBilling>) -> Value {
        let mut options = json!({ "currency": self.currency });
        // The pooled accounts only support third-party billing against the
        // UPS account-number scheme.
        if let Some(billing) = billing {
            if billing.account.len() == UPS_ACCOUNT_LEN {
                options["payment"] = json!({
                    "type": "THIRD_PARTY",
                    "account": billing.account,
                    "postal_code": billing.postal_code,
                    "country": "US",
                });
            }
        }
        options
    }

    /// Buy the selected quote. Routes on the correlation id: orders go
    /// through the order buy endpoint with carrier+service, shipments
    /// through the shipment buy endpoint with the rate id.
    pub async fn create_shipment(
        &self,
        quote: &Quote,
        converter: &LabelConverter,
    ) -> Result<PurchaseResult> {
        let id = quote.shipment_id.as_deref().ok_or_else(|| {
            Error::Validation("aggregator quote is missing its correlation id".to_string())
        })?;
        if id.starts_with(ORDER_ID_PREFIX) {
            self.buy_order(id, quote, converter).await
        } else {
            self.buy_shipment(id, quote, converter).await
        }
    }

    async fn buy_shipment(
        &self,
        id: &str,
        quote: &Quote,
        converter: &LabelConverter,
    ) -> Result<PurchaseResult> {
        let rate_id = quote.rate_id.as_deref().ok_or_else(|| {
            Error::Validation("aggregator quote is missing its rate id".to_string())
        })?;
        let body = json!({ "rate": { "id": rate_id } });
        let response = self.post(&format!("/v2/shipments/{id}/buy"), &body).await?;

        if let Some(errors) = response.pointer("/failed_parcels/0/errors") {
            return Err(Error::Carrier {
                provider: Provider::EasyPost,
                status: 200,
                detail: errors.to_string(),
            });
        }

        let awb = response
            .pointer("/tracker/tracking_code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // The buy response has no label yet; a separate retrieval call does.
        let label_url = self.shipment_label_url(id).await?;
        let shipping_label = match self.label_format {
            LabelFormat::Zpl => converter.merge_text_labels(&[label_url.clone()]).await?,
            LabelFormat::Png => converter.bitmap_to_single_page_pdf(&label_url, false).await?,
            LabelFormat::Pdf => converter.persist_label_value(&label_url).await?,
        };

        Ok(PurchaseResult {
            provider: Provider::EasyPost,
            carrier: quote.carrier.clone(),
            carrier_service: quote.service_name.clone(),
            shipment_id: id.to_string(),
            shipment_amount: quote.total_price,
            awb_number: awb,
            label_bundle: vec![label_url],
            shipping_label,
        })
    }

    async fn buy_order(
        &self,
        id: &str,
        quote: &Quote,
        converter: &LabelConverter,
    ) -> Result<PurchaseResult> {
        let body = json!({
            "carrier": quote.carrier_code,
            "service": quote.service_code,
        });
        let response = self.post(&format!("/v2/orders/{id}/buy"), &body).await?;

        let (tracking_codes, label_urls) = order_labels(&response, self.label_format);
        if label_urls.is_empty() {
            return Err(Error::MissingLabel(format!(
                "order {id} returned no sub-shipment labels"
            )));
        }

        let shipping_label = self.merge_labels(&label_urls, converter).await?;

        Ok(PurchaseResult {
            provider: Provider::EasyPost,
            carrier: quote.carrier.clone(),
            carrier_service: quote.service_name.clone(),
            shipment_id: id.to_string(),
            shipment_amount: quote.total_price,
            awb_number: tracking_codes.join(", "),
            label_bundle: label_urls,
            shipping_label,
        })
    }

    async fn merge_labels(&self, urls: &[String], converter: &LabelConverter) -> Result<String> {
        match self.label_format {
            LabelFormat::Zpl => converter.merge_text_labels(urls).await,
            // Raster sub-labels always merge into one multi-page PDF; the
            // PNG variant exists for every purchased label.
            LabelFormat::Png | LabelFormat::Pdf => {
                converter.bitmaps_to_multi_page_pdf(urls, false).await
            }
        }
    }

    /// Resolve the printable label for a purchase, merging per-sub-shipment
    /// labels when the id names an order.
    pub async fn get_label(&self, id: &str, converter: &LabelConverter) -> Result<String> {
        if id.starts_with(ORDER_ID_PREFIX) {
            let response = self.get(&format!("/v2/orders/{id}")).await?;
            let (_, label_urls) = order_labels(&response, self.label_format);
            if label_urls.is_empty() {
                return Err(Error::MissingLabel(format!(
                    "order {id} has no purchased labels on the aggregator"
                )));
            }
            self.merge_labels(&label_urls, converter).await
        } else {
            self.shipment_label_url(id).await
        }
    }

    async fn shipment_label_url(&self, id: &str) -> Result<String> {
        let response = self
            .get(&format!(
                "/v2/shipments/{id}/label?file_format={}",
                self.label_format.as_str()
            ))
            .await?;
        response
            .pointer(&format!("/postage_label/{}", self.label_format.url_key()))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::MissingLabel(format!(
                    "shipment {id} has no purchased label on the aggregator"
                ))
            })
    }

    /// Tracking snapshot for a purchase. Orders aggregate the codes of all
    /// sub-shipments and report the status of the carrier actually chosen.
    pub async fn get_tracking_data(&self, id: &str) -> Result<TrackingData> {
        if id.starts_with(ORDER_ID_PREFIX) {
            let response = self.get(&format!("/v2/orders/{id}")).await?;
            order_tracking(&response)
                .ok_or_else(|| Error::MissingLabel(format!("order {id} has no tracking data yet")))
        } else {
            let response = self.get(&format!("/v2/shipments/{id}")).await?;
            let tracker = response.get("tracker").ok_or_else(|| {
                Error::MissingLabel(format!("shipment {id} has no tracker yet"))
            })?;
            Ok(tracking_from_value(tracker, id))
        }
    }

    /// Register (or re-read) a tracker for a carrier-direct shipment. The
    /// direct carriers have no tracking API access under third-party
    /// billing, so their tracking goes through the aggregator.
    pub async fn track_by_carrier(
        &self,
        carrier: &str,
        tracking_code: &str,
    ) -> Result<TrackingData> {
        let body = json!({
            "tracker": { "tracking_code": tracking_code, "carrier": carrier }
        });
        let response = self
            .http
            .post(format!("{}/v2/trackers", self.base_url))
            .basic_auth(&self.api_key, Some(""))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        // 409 = tracker already exists; the body still carries it.
        if !status.is_success() && status.as_u16() != 409 {
            return Err(Error::carrier(Provider::EasyPost, status.as_u16(), &text));
        }
        let value: Value = serde_json::from_str(&text)?;
        Ok(tracking_from_value(&value, tracking_code))
    }
}

fn parcel_json(parcel: &Parcel) -> Value {
    json!({
        "length": parcel.length,
        "width": parcel.width,
        "height": parcel.height,
        // lb → oz, the aggregator's native weight unit
        "weight": parcel.weight * 16.0,
    })
}

/// Fold the response `rates` array into quotes, scaling each price and
/// attaching the correlation id plus the original request context.
fn quotes_from_rates(response: &Value, scale: f64, request: &QuoteRequest) -> Vec<Quote> {
    let correlation = response.get("id").and_then(Value::as_str);
    let Some(rates) = response.get("rates").and_then(Value::as_array) else {
        return Vec::new();
    };

    rates
        .iter()
        .map(|rate| {
            let carrier_code = rate
                .get("carrier")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let service_code = rate
                .get("service")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let price = match json_f64(rate.get("rate")) {
                Some(price) => price,
                None => {
                    warn!(
                        carrier = %carrier_code,
                        service = %service_code,
                        "aggregator rate has no price; treating as 0"
                    );
                    0.0
                }
            };
            Quote {
                provider: Provider::EasyPost,
                carrier: display_carrier(&carrier_code),
                service_name: pretty(&service_code),
                carrier_code,
                service_code,
                total_price: price * scale,
                delivery_days: json_i64(rate.get("delivery_days")),
                shipment_id: correlation.map(str::to_string),
                rate_id: rate.get("id").and_then(Value::as_str).map(str::to_string),
                request: request.clone(),
            }
        })
        .collect()
}

/// Resolve the pooled-vs-branded FedEx collision inside the aggregator's
/// rate list: multi-parcel shipments buy FedEx through the direct
/// integration, single parcels through the pooled aggregator account.
fn filter_carrier_collisions(quotes: Vec<Quote>, parcel_count: usize) -> Vec<Quote> {
    quotes
        .into_iter()
        .filter(|quote| {
            if parcel_count > 1 {
                !quote.carrier_code.eq_ignore_ascii_case(POOLED_FEDEX_CARRIER)
            } else {
                !quote.carrier_code.eq_ignore_ascii_case(BRANDED_FEDEX_CARRIER)
            }
        })
        .collect()
}

/// Tracking codes and per-sub-shipment label URLs of a purchased order.
fn order_labels(order: &Value, format: LabelFormat) -> (Vec<String>, Vec<String>) {
    let mut tracking_codes = Vec::new();
    let mut label_urls = Vec::new();
    let shipments = order
        .get("shipments")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for shipment in &shipments {
        let code = shipment
            .pointer("/tracker/tracking_code")
            .or_else(|| shipment.get("tracking_code"))
            .and_then(Value::as_str);
        if let Some(code) = code {
            tracking_codes.push(code.to_string());
        }

        let key = match format {
            LabelFormat::Zpl => "label_zpl_url",
            // Merging works on the raster variant, present for every label.
            LabelFormat::Png | LabelFormat::Pdf => "label_url",
        };
        let url = shipment
            .pointer(&format!("/postage_label/{key}"))
            .or_else(|| shipment.pointer("/postage_label/label_url"))
            .and_then(Value::as_str);
        if let Some(url) = url {
            label_urls.push(url.to_string());
        }
    }

    (tracking_codes, label_urls)
}

/// Aggregate order tracking: all codes, status of the chosen carrier.
fn order_tracking(order: &Value) -> Option<TrackingData> {
    let shipments = order.get("shipments").and_then(Value::as_array)?;

    let mut codes = Vec::new();
    for shipment in shipments {
        if let Some(code) = shipment
            .pointer("/tracker/tracking_code")
            .and_then(Value::as_str)
        {
            codes.push(code.to_string());
        }
    }

    let chosen_carrier = shipments
        .iter()
        .find_map(|s| s.pointer("/selected_rate/carrier").and_then(Value::as_str))?;

    let tracker = shipments
        .iter()
        .find(|s| {
            s.pointer("/selected_rate/carrier").and_then(Value::as_str) == Some(chosen_carrier)
                && s.get("tracker").is_some_and(|t| !t.is_null())
        })
        .and_then(|s| s.get("tracker"))?;

    let mut data = tracking_from_value(tracker, &codes.join(", "));
    data.awb_number = codes.join(", ");
    Some(data)
}

fn tracking_from_value(tracker: &Value, fallback_awb: &str) -> TrackingData {
    TrackingData {
        awb_number: tracker
            .get("tracking_code")
            .and_then(Value::as_str)
            .unwrap_or(fallback_awb)
            .to_string(),
        tracking_status: tracker
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        tracking_status_info: tracker
            .get("status_detail")
            .and_then(Value::as_str)
            .unwrap_or("No details available")
            .to_string(),
        tracking_url: tracker
            .get("public_url")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::explode_parcels;
    use crate::models::ParcelRow;

    fn request(parcel_count: u32) -> QuoteRequest {
        let rows = vec![ParcelRow {
            length: 12.0,
            width: 10.0,
            height: 6.0,
            weight: 5.0,
            count: parcel_count,
        }];
        QuoteRequest {
            to_address: address(),
            from_address: address(),
            parcels: explode_parcels(&rows),
            billing: None,
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
    fn display_names_resolve_pooled_codes() {
        assert_eq!(display_carrier("FedExDefault"), "FedEx");
        assert_eq!(display_carrier("UPSDAP"), "UPS");
        assert_eq!(display_carrier("USPS"), "USPS");
        assert_eq!(display_carrier("easypost"), "EasyPost");
        assert_eq!(pretty("FEDEX_2_DAY"), "2-Day");
        assert_eq!(pretty("UNLISTED_SERVICE"), "UNLISTED_SERVICE");
    }

    #[test]
    fn rates_parse_with_scaling_and_correlation() {
        let response = json!({
            "id": "shp_123",
            "rates": [
                { "id": "rate_1", "carrier": "UPSDAP", "service": "NextDayAir",
                  "rate": "42.00", "delivery_days": 1 },
                { "id": "rate_2", "carrier": "USPS", "service": "GroundAdvantage",
                  "rate": 7.5, "delivery_days": "3" },
            ]
        });
        let quotes = quotes_from_rates(&response, 3.0, &request(3));
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].carrier, "UPS");
        assert_eq!(quotes[0].carrier_code, "UPSDAP");
        assert_eq!(quotes[0].service_name, "Next Day Air");
        assert_eq!(quotes[0].total_price, 126.0);
        assert_eq!(quotes[0].shipment_id.as_deref(), Some("shp_123"));
        assert_eq!(quotes[0].rate_id.as_deref(), Some("rate_1"));
        assert_eq!(quotes[1].total_price, 22.5);
        assert_eq!(quotes[1].delivery_days, Some(3));
    }

    #[test]
    fn missing_price_is_zero_not_an_error() {
        let response = json!({
            "id": "shp_1",
            "rates": [ { "id": "rate_1", "carrier": "USPS", "service": "Priority" } ]
        });
        let quotes = quotes_from_rates(&response, 1.0, &request(1));
        assert_eq!(quotes[0].total_price, 0.0);
    }

    #[test]
    fn collision_filter_drops_pooled_code_for_multi_parcel() {
        let response = json!({
            "id": "order_9",
            "rates": [
                { "id": "rate_1", "carrier": "FedExDefault", "service": "FEDEX_GROUND", "rate": "30.00" },
                { "id": "rate_2", "carrier": "FedEx", "service": "FEDEX_GROUND", "rate": "28.00" },
                { "id": "rate_3", "carrier": "UPSDAP", "service": "Ground", "rate": "29.00" },
            ]
        });
        let quotes = quotes_from_rates(&response, 1.0, &request(2));

        let filtered = filter_carrier_collisions(quotes.clone(), 2);
        assert!(filtered.iter().all(|q| q.carrier_code != "FedExDefault"));
        assert!(filtered.iter().any(|q| q.carrier_code == "FedEx"));

        let filtered = filter_carrier_collisions(quotes, 1);
        assert!(filtered.iter().all(|q| q.carrier_code != "FedEx"));
        assert!(filtered.iter().any(|q| q.carrier_code == "FedExDefault"));
    }

    #[test]
    fn order_labels_pick_format_variant_and_tracking_codes() {
        let order = json!({
            "id": "order_1",
            "shipments": [
                { "tracker": { "tracking_code": "1Z1" },
                  "postage_label": { "label_url": "https://x.test/1.png",
                                     "label_zpl_url": "https://x.test/1.zpl" } },
                { "tracker": { "tracking_code": "1Z2" },
                  "postage_label": { "label_url": "https://x.test/2.png" } },
            ]
        });

        let (codes, urls) = order_labels(&order, LabelFormat::Png);
        assert_eq!(codes, vec!["1Z1", "1Z2"]);
        assert_eq!(urls, vec!["https://x.test/1.png", "https://x.test/2.png"]);

        let (_, urls) = order_labels(&order, LabelFormat::Zpl);
        // Second shipment has no ZPL variant; raster fallback.
        assert_eq!(urls, vec!["https://x.test/1.zpl", "https://x.test/2.png"]);
    }

    #[test]
    fn order_tracking_joins_codes_and_selects_chosen_carrier_status() {
        let order = json!({
            "id": "order_1",
            "shipments": [
                { "selected_rate": { "carrier": "FedExDefault" },
                  "tracker": { "tracking_code": "794600000001", "status": "in_transit",
                               "status_detail": "arrived_at_facility",
                               "public_url": "https://track.test/794600000001" } },
                { "selected_rate": { "carrier": "FedExDefault" },
                  "tracker": { "tracking_code": "794600000002", "status": "pre_transit",
                               "status_detail": "label_created" } },
            ]
        });
        let data = order_tracking(&order).unwrap();
        assert_eq!(data.awb_number, "794600000001, 794600000002");
        assert_eq!(data.tracking_status, "in_transit");
        assert_eq!(
            data.tracking_url.as_deref(),
            Some("https://track.test/794600000001")
        );
    }

    #[test]
    fn tracker_defaults_cover_missing_fields() {
        let data = tracking_from_value(&json!({}), "FALLBACK");
        assert_eq!(data.awb_number, "FALLBACK");
        assert_eq!(data.tracking_status, "Unknown");
        assert_eq!(data.tracking_status_info, "No details available");
        assert_eq!(data.tracking_url, None);
    }

    #[test]
    fn parcel_weight_converts_to_ounces() {
        let value = parcel_json(&Parcel {
            length: 12.0,
            width: 10.0,
            height: 6.0,
            weight: 5.0,
        });
        assert_eq!(value["weight"], json!(80.0));
    }
}

//! FedEx direct-API client: OAuth, rate shopping and ZPL label purchase.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use once_cell::sync::Lazy;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::address::{clean_phone, validate_billing_zip};
use crate::config::ShippingSettings;
use crate::error::{Error, Result};
use crate::labels::LabelConverter;
use crate::models::{
    json_f64, AddressBlock, OneOrMany, Parcel, Provider, PurchaseResult, Quote, RatedService,
    ThirdPartyBilling,
};

const FEDEX_TEST_BASE_URL: &str = "https://apis-sandbox.fedex.com";
const FEDEX_PROD_BASE_URL: &str = "https://apis.fedex.com";

/// FedEx account numbers are 9 numeric digits.
pub const FEDEX_ACCOUNT_LEN: usize = 9;

static SERVICE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Domestic services
        ("FEDEX_GROUND", "Ground"),
        ("GROUND_HOME_DELIVERY", "Home Delivery"),
        ("SMART_POST", "SmartPost"),
        ("FEDEX_EXPRESS_SAVER", "3-Day"),
        ("FEDEX_2_DAY", "2-Day"),
        ("FEDEX_2_DAY_AM", "2-Day AM"),
        ("STANDARD_OVERNIGHT", "Standard Overnight"),
        ("FEDEX_STANDARD_OVERNIGHT_EXTRA_HOURS", "Standard Overnight (Extra Hours)"),
        ("PRIORITY_OVERNIGHT", "Priority Overnight"),
        ("FEDEX_PRIORITY_OVERNIGHT_EXTRA_HOURS", "Priority Overnight (Extra Hours)"),
        ("FIRST_OVERNIGHT", "First Overnight"),
        ("FEDEX_FIRST_OVERNIGHT_EXTRA_HOURS", "First Overnight (Extra Hours)"),
        // International services
        ("INTERNATIONAL_ECONOMY", "International Economy"),
        ("INTERNATIONAL_PRIORITY", "International Priority"),
    ])
});

/// Transit-time words from the rate reply, as whole days.
static TRANSIT_TIME_MAP: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("ONE_DAY", 1),
        ("TWO_DAYS", 2),
        ("THREE_DAYS", 3),
        ("FOUR_DAYS", 4),
        ("FIVE_DAYS", 5),
        ("SIX_DAYS", 6),
        ("SEVEN_DAYS", 7),
        ("EIGHT_DAYS", 8),
        ("NINE_DAYS", 9),
        ("TEN_DAYS", 10),
    ])
});

#[derive(Debug, Deserialize)]
struct OAuthToken {
    access_token: String,
}

pub struct FedExClient {
    shipper_number: String,
    token: String,
    http: HttpClient,
    base_url: String,
}

impl FedExClient {
    /// Authenticate once; the bearer token is held for the life of the
    /// instance, no refresh.
    pub async fn new(settings: &ShippingSettings) -> Result<Self> {
        let api_key = settings
            .fedex_api_key
            .clone()
            .ok_or_else(|| Error::Config("FedEx API key is missing in the shipping settings".to_string()))?;
        let secret_key = settings
            .fedex_secret_key
            .clone()
            .ok_or_else(|| Error::Config("FedEx secret key is missing in the shipping settings".to_string()))?;
        let shipper_number = settings
            .fedex_shipper_number
            .clone()
            .ok_or_else(|| Error::Config("FedEx shipper number is missing in the shipping settings".to_string()))?;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = if settings.use_test_environment {
            FEDEX_TEST_BASE_URL
        } else {
            FEDEX_PROD_BASE_URL
        }
        .to_string();

        let token = Self::oauth(&http, &base_url, &api_key, &secret_key).await?;

        Ok(Self {
            shipper_number,
            token,
            http,
            base_url,
        })
    }

    async fn oauth(
        http: &HttpClient,
        base_url: &str,
        api_key: &str,
        secret_key: &str,
    ) -> Result<String> {
        let response = http
            .post(format!("{base_url}/oauth/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", api_key),
                ("client_secret", secret_key),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::carrier(Provider::FedEx, status.as_u16(), &text));
        }
        let token: OAuthToken = serde_json::from_str(&text)?;
        Ok(token.access_token)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("X-locale", "en_US")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::carrier(Provider::FedEx, status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Shop all services in one multi-package request. Rates always run as
    /// SENDER on the authenticating account: third-party rates are private
    /// and only apply at purchase.
    pub async fn rate(
        &self,
        to_address: &AddressBlock,
        from_address: &AddressBlock,
        parcels: &[Parcel],
        billing: Option<&ThirdPartyBilling>,
    ) -> Result<Vec<RatedService>> {
        if billing.is_some() {
            debug!("rating as SENDER; third-party billing applies at purchase");
        }

        let body = RateRequestBody {
            account_number: AccountNumber {
                value: self.shipper_number.clone(),
            },
            rate_request_control_parameters: RateControlParameters {
                return_transit_times: true,
            },
            requested_shipment: RequestedRateShipment {
                shipper: fedex_party(from_address)?,
                recipient: fedex_party(to_address)?,
                pickup_type: "CONTACT_FEDEX_TO_SCHEDULE".to_string(),
                rate_request_type: vec!["LIST".to_string()],
                shipping_charges_payment: sender_payment(&self.shipper_number),
                requested_package_line_items: parcels.iter().map(package_line_item).collect(),
            },
        };

        let response = self
            .post("/rate/v1/rates/quotes", &serde_json::to_value(&body)?)
            .await?;
        parse_rate_reply(&response)
    }

    /// Buy the label for the selected quote: one ZPL document per piece,
    /// each saved, all merged into one printable artifact.
    pub async fn ship(&self, quote: &Quote, converter: &LabelConverter) -> Result<PurchaseResult> {
        let request = &quote.request;
        let payment = third_party_payment(&self.shipper_number, request.billing.as_ref())?;

        let body = ShipRequestBody {
            account_number: AccountNumber {
                value: self.shipper_number.clone(),
            },
            label_response_options: "LABEL".to_string(),
            requested_shipment: RequestedShipShipment {
                shipper: fedex_party(&request.from_address)?,
                recipients: vec![fedex_party(&request.to_address)?],
                ship_date_stamp: chrono::Utc::now().format("%Y-%m-%d").to_string(),
                pickup_type: "USE_SCHEDULED_PICKUP".to_string(),
                service_type: quote.service_code.clone(),
                packaging_type: "YOUR_PACKAGING".to_string(),
                shipping_charges_payment: payment,
                label_specification: LabelSpecification {
                    label_format_type: "COMMON2D".to_string(),
                    image_type: "ZPLII".to_string(),
                    label_stock_type: "STOCK_4X6".to_string(),
                },
                requested_package_line_items: request
                    .parcels
                    .iter()
                    .map(package_line_item)
                    .collect(),
            },
        };

        let response = self
            .post("/ship/v1/shipments", &serde_json::to_value(&body)?)
            .await?;
        self.purchase_from_response(&response, quote, converter).await
    }

    async fn purchase_from_response(
        &self,
        response: &Value,
        quote: &Quote,
        converter: &LabelConverter,
    ) -> Result<PurchaseResult> {
        let envelope: ShipReplyEnvelope = serde_json::from_value(response.clone())?;
        let shipment = envelope
            .output
            .transaction_shipments
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::MissingLabel("FedEx response contains no transaction shipments".to_string())
            })?;

        let pieces = shipment.piece_responses.into_vec();
        if pieces.is_empty() {
            return Err(Error::MissingLabel(
                "FedEx response contains no piece responses".to_string(),
            ));
        }

        let tracking_numbers: Vec<String> = pieces
            .iter()
            .filter_map(|piece| piece.tracking_number.clone())
            .collect();

        let mut label_urls = Vec::new();
        for piece in &pieces {
            for content in zpl_documents(piece)? {
                label_urls.push(converter.text_label_to_file(&content).await?);
            }
        }
        if label_urls.is_empty() {
            return Err(Error::MissingLabel(
                "FedEx did not return any label content".to_string(),
            ));
        }

        let shipping_label = if label_urls.len() == 1 {
            label_urls[0].clone()
        } else {
            converter.merge_text_labels(&label_urls).await?
        };

        let shipment_id = shipment
            .master_tracking_number
            .clone()
            .or_else(|| tracking_numbers.first().cloned())
            .ok_or_else(|| {
                Error::MissingLabel("FedEx response missing a tracking number".to_string())
            })?;

        let shipment_amount = shipment
            .shipment_rating
            .as_ref()
            .and_then(|rating| rating.shipment_rate_details.first())
            .and_then(|detail| json_f64(detail.total_net_charge.as_ref()))
            .unwrap_or_else(|| {
                // Third-party freight reports no charge to the shipper.
                warn!("FedEx ship response carries no charge amount; recording 0");
                0.0
            });

        Ok(PurchaseResult {
            provider: Provider::FedEx,
            carrier: "FedEx".to_string(),
            carrier_service: quote.service_name.clone(),
            shipment_id,
            shipment_amount,
            awb_number: tracking_numbers.join(", "),
            label_bundle: label_urls,
            shipping_label,
        })
    }
}

// ---------- request contracts ----------

#[derive(Debug, Serialize)]
struct AccountNumber {
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateRequestBody {
    account_number: AccountNumber,
    rate_request_control_parameters: RateControlParameters,
    requested_shipment: RequestedRateShipment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateControlParameters {
    return_transit_times: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestedRateShipment {
    shipper: FedExParty,
    recipient: FedExParty,
    pickup_type: String,
    rate_request_type: Vec<String>,
    shipping_charges_payment: Payment,
    requested_package_line_items: Vec<PackageLineItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShipRequestBody {
    account_number: AccountNumber,
    label_response_options: String,
    requested_shipment: RequestedShipShipment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestedShipShipment {
    shipper: FedExParty,
    recipients: Vec<FedExParty>,
    ship_date_stamp: String,
    pickup_type: String,
    service_type: String,
    packaging_type: String,
    shipping_charges_payment: Payment,
    label_specification: LabelSpecification,
    requested_package_line_items: Vec<PackageLineItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FedExParty {
    address: FedExAddress,
    contact: FedExContact,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FedExAddress {
    street_lines: Vec<String>,
    city: String,
    state_or_province_code: String,
    postal_code: String,
    country_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FedExContact {
    person_name: String,
    company_name: String,
    phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Payment {
    payment_type: String,
    payor: Payor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Payor {
    responsible_party: ResponsibleParty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponsibleParty {
    account_number: AccountNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<BillingAddress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BillingAddress {
    postal_code: String,
    country_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelSpecification {
    label_format_type: String,
    image_type: String,
    label_stock_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageLineItem {
    weight: Weight,
    dimensions: Dimensions,
    packaging_type: String,
}

#[derive(Debug, Serialize)]
struct Weight {
    units: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct Dimensions {
    length: f64,
    width: f64,
    height: f64,
    units: String,
}

fn fedex_party(address: &AddressBlock) -> Result<FedExParty> {
    let street_lines: Vec<String> = [Some(address.street1.as_str()), address.street2.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if street_lines.is_empty() {
        return Err(Error::Validation(
            "address needs at least one street line".to_string(),
        ));
    }

    let person = if address.name.trim().is_empty() {
        address.company.clone().unwrap_or_else(|| "Unknown".to_string())
    } else {
        address.name.clone()
    };
    let company = address.company.clone().unwrap_or_else(|| person.clone());

    Ok(FedExParty {
        address: FedExAddress {
            street_lines,
            city: address.city.clone(),
            state_or_province_code: address.state.clone(),
            postal_code: address.zip.clone(),
            country_code: "US".to_string(),
        },
        contact: FedExContact {
            person_name: person,
            company_name: company,
            phone_number: clean_phone(&address.phone)?,
            email_address: address.email.clone(),
        },
    })
}

fn package_line_item(parcel: &Parcel) -> PackageLineItem {
    PackageLineItem {
        weight: Weight {
            units: "LB".to_string(),
            value: parcel.weight,
        },
        dimensions: Dimensions {
            length: parcel.length,
            width: parcel.width,
            height: parcel.height,
            units: "IN".to_string(),
        },
        packaging_type: "YOUR_PACKAGING".to_string(),
    }
}

fn sender_payment(account: &str) -> Payment {
    Payment {
        payment_type: "SENDER".to_string(),
        payor: Payor {
            responsible_party: ResponsibleParty {
                account_number: AccountNumber {
                    value: account.to_string(),
                },
                address: None,
            },
        },
    }
}

/// Build the ship payment block, validating third-party details before any
/// network call.
fn third_party_payment(
    shipper_number: &str,
    billing: Option<&ThirdPartyBilling>,
) -> Result<Payment> {
    match billing {
        Some(billing) if billing.account != shipper_number => {
            validate_billing_zip(&billing.postal_code)?;
            if billing.account.len() != FEDEX_ACCOUNT_LEN
                || !billing.account.chars().all(|c| c.is_ascii_digit())
            {
                return Err(Error::Validation(format!(
                    "invalid third-party billing account {:?}: FedEx account numbers are {FEDEX_ACCOUNT_LEN} numeric digits",
                    billing.account
                )));
            }
            Ok(Payment {
                payment_type: "THIRD_PARTY".to_string(),
                payor: Payor {
                    responsible_party: ResponsibleParty {
                        account_number: AccountNumber {
                            value: billing.account.clone(),
                        },
                        address: Some(BillingAddress {
                            postal_code: billing.postal_code.trim().to_string(),
                            country_code: "US".to_string(),
                        }),
                    },
                },
            })
        }
        _ => Ok(sender_payment(shipper_number)),
    }
}

// ---------- response contracts ----------

#[derive(Debug, Deserialize, Default)]
struct RateReplyEnvelope {
    #[serde(default)]
    output: RateOutput,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RateOutput {
    #[serde(default)]
    rate_reply_details: OneOrMany<RateReplyDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateReplyDetail {
    #[serde(default)]
    service_type: Option<String>,
    #[serde(default)]
    service_name: Option<String>,
    #[serde(default)]
    rated_shipment_details: Vec<RatedShipmentDetail>,
    #[serde(default)]
    commit: Option<TransitDetail>,
    #[serde(default)]
    operational_detail: Option<TransitDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatedShipmentDetail {
    #[serde(default)]
    total_net_charge: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransitDetail {
    #[serde(default)]
    transit_time: Option<String>,
}

fn parse_rate_reply(response: &Value) -> Result<Vec<RatedService>> {
    let envelope: RateReplyEnvelope = serde_json::from_value(response.clone())?;
    Ok(envelope
        .output
        .rate_reply_details
        .into_vec()
        .into_iter()
        .map(|detail| {
            let code = detail.service_type.unwrap_or_default();
            let name = detail
                .service_name
                .filter(|name| !name.trim().is_empty())
                .or_else(|| SERVICE_MAP.get(code.as_str()).map(|s| (*s).to_string()))
                .unwrap_or_else(|| code.clone());
            let total_charge = detail
                .rated_shipment_details
                .first()
                .and_then(|rated| json_f64(rated.total_net_charge.as_ref()))
                .unwrap_or_else(|| {
                    warn!(service = %code, "FedEx rate has no charge; treating as 0");
                    0.0
                });
            let transit = detail
                .commit
                .as_ref()
                .and_then(|c| c.transit_time.as_deref())
                .or_else(|| {
                    detail
                        .operational_detail
                        .as_ref()
                        .and_then(|d| d.transit_time.as_deref())
                });
            RatedService {
                service_code: code,
                service_name: name,
                total_charge,
                delivery_days: transit.and_then(|t| TRANSIT_TIME_MAP.get(t).copied()),
            }
        })
        .collect())
}

#[derive(Debug, Deserialize, Default)]
struct ShipReplyEnvelope {
    #[serde(default)]
    output: ShipOutput,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ShipOutput {
    #[serde(default)]
    transaction_shipments: Vec<TransactionShipment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionShipment {
    #[serde(default)]
    master_tracking_number: Option<String>,
    #[serde(default)]
    piece_responses: OneOrMany<PieceResponse>,
    #[serde(default)]
    shipment_rating: Option<ShipmentRating>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PieceResponse {
    #[serde(default)]
    tracking_number: Option<String>,
    #[serde(default)]
    package_documents: Vec<PackageDocument>,
    #[serde(default)]
    shipment_documents: Vec<PackageDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageDocument {
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    encoded_label: Option<String>,
    #[serde(default)]
    encoded_label_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentRating {
    #[serde(default)]
    shipment_rate_details: Vec<RatedShipmentDetail>,
}

/// Decode the ZPL documents of one piece response.
fn zpl_documents(piece: &PieceResponse) -> Result<Vec<String>> {
    let documents = if piece.package_documents.is_empty() {
        &piece.shipment_documents
    } else {
        &piece.package_documents
    };

    let mut contents = Vec::new();
    for document in documents {
        let is_label = document.content_type.as_deref() == Some("LABEL");
        let is_zpl = matches!(document.doc_type.as_deref(), Some("ZPL") | Some("ZPLII"));
        if !(is_label && is_zpl) {
            continue;
        }
        let encoded = document
            .encoded_label
            .as_deref()
            .or(document.encoded_label_content.as_deref());
        if let Some(encoded) = encoded {
            let bytes = BASE64.decode(encoded)?;
            let content = String::from_utf8(bytes).map_err(|_| {
                Error::MissingLabel("FedEx label content is not valid text".to_string())
            })?;
            contents.push(content);
        }
    }
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address() -> AddressBlock {
        AddressBlock {
            name: "Pat Doe".to_string(),
            company: Some("Acme Corp".to_string()),
            street1: "123 Main St".to_string(),
            street2: None,
            city: "Orange".to_string(),
            state: "CA".to_string(),
            zip: "92867".to_string(),
            country: "US".to_string(),
            phone: "714-555-1212".to_string(),
            email: Some("pat@example.com".to_string()),
        }
    }

    #[test]
    fn rate_reply_parses_with_name_and_transit_fallbacks() {
        let response = json!({
            "output": {
                "rateReplyDetails": [
                    { "serviceType": "FEDEX_2_DAY", "serviceName": "FedEx 2Day®",
                      "ratedShipmentDetails": [ { "totalNetCharge": 31.25 } ],
                      "commit": { "transitTime": "TWO_DAYS" } },
                    { "serviceType": "FEDEX_GROUND",
                      "ratedShipmentDetails": [ { "totalNetCharge": "14.80" } ],
                      "operationalDetail": { "transitTime": "FOUR_DAYS" } },
                    { "serviceType": "CUSTOM_SERVICE",
                      "ratedShipmentDetails": [] },
                ]
            }
        });
        let services = parse_rate_reply(&response).unwrap();
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].service_name, "FedEx 2Day®");
        assert_eq!(services[0].total_charge, 31.25);
        assert_eq!(services[0].delivery_days, Some(2));
        // No serviceName: static map kicks in; transit via operationalDetail.
        assert_eq!(services[1].service_name, "Ground");
        assert_eq!(services[1].delivery_days, Some(4));
        // Unknown everything: raw code, zero charge, no estimate.
        assert_eq!(services[2].service_name, "CUSTOM_SERVICE");
        assert_eq!(services[2].total_charge, 0.0);
        assert_eq!(services[2].delivery_days, None);
    }

    #[test]
    fn rate_reply_accepts_single_object_shape() {
        let response = json!({
            "output": {
                "rateReplyDetails": {
                    "serviceType": "FEDEX_GROUND",
                    "ratedShipmentDetails": [ { "totalNetCharge": "9.99" } ]
                }
            }
        });
        let services = parse_rate_reply(&response).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].total_charge, 9.99);
    }

    #[test]
    fn third_party_payment_requires_nine_digit_account_and_valid_zip() {
        let billing = ThirdPartyBilling {
            account: "123456789".to_string(),
            postal_code: "92867".to_string(),
        };
        let payment = third_party_payment("987654321", Some(&billing)).unwrap();
        assert_eq!(payment.payment_type, "THIRD_PARTY");
        let value = serde_json::to_value(&payment).unwrap();
        assert_eq!(
            value["payor"]["responsibleParty"]["accountNumber"]["value"],
            "123456789"
        );
        assert_eq!(
            value["payor"]["responsibleParty"]["address"]["postalCode"],
            "92867"
        );

        let short = ThirdPartyBilling {
            account: "12345678".to_string(),
            postal_code: "92867".to_string(),
        };
        assert!(third_party_payment("987654321", Some(&short)).is_err());

        let alpha = ThirdPartyBilling {
            account: "12345678A".to_string(),
            postal_code: "92867".to_string(),
        };
        assert!(third_party_payment("987654321", Some(&alpha)).is_err());

        let bad_zip = ThirdPartyBilling {
            account: "123456789".to_string(),
            postal_code: "928".to_string(),
        };
        assert!(third_party_payment("987654321", Some(&bad_zip)).is_err());
    }

    #[test]
    fn own_account_billing_falls_back_to_sender() {
        let billing = ThirdPartyBilling {
            account: "987654321".to_string(),
            postal_code: "92867".to_string(),
        };
        let payment = third_party_payment("987654321", Some(&billing)).unwrap();
        assert_eq!(payment.payment_type, "SENDER");
    }

    #[test]
    fn party_serializes_camel_case_with_contact_fallbacks() {
        let value = serde_json::to_value(fedex_party(&address()).unwrap()).unwrap();
        assert_eq!(value["address"]["streetLines"], json!(["123 Main St"]));
        assert_eq!(value["address"]["stateOrProvinceCode"], "CA");
        assert_eq!(value["contact"]["personName"], "Pat Doe");
        assert_eq!(value["contact"]["companyName"], "Acme Corp");
        assert_eq!(value["contact"]["phoneNumber"], "7145551212");
        assert_eq!(value["contact"]["emailAddress"], "pat@example.com");
    }

    #[test]
    fn party_rejects_empty_street_and_short_phone() {
        let mut no_street = address();
        no_street.street1 = "  ".to_string();
        assert!(fedex_party(&no_street).is_err());

        let mut short_phone = address();
        short_phone.phone = "12345".to_string();
        assert!(fedex_party(&short_phone).is_err());
    }

    #[test]
    fn zpl_documents_decode_label_entries_only() {
        let piece: PieceResponse = serde_json::from_value(json!({
            "trackingNumber": "794600000001",
            "packageDocuments": [
                { "contentType": "LABEL", "docType": "ZPLII",
                  "encodedLabel": BASE64.encode("^XA^FDBox 1^FS^XZ") },
                { "contentType": "RECEIPT", "docType": "PDF",
                  "encodedLabel": BASE64.encode("not a label") },
            ]
        }))
        .unwrap();
        let documents = zpl_documents(&piece).unwrap();
        assert_eq!(documents, vec!["^XA^FDBox 1^FS^XZ"]);
    }

    #[test]
    fn zpl_documents_fall_back_to_shipment_documents() {
        let piece: PieceResponse = serde_json::from_value(json!({
            "shipmentDocuments": [
                { "contentType": "LABEL", "docType": "ZPL",
                  "encodedLabelContent": BASE64.encode("^XA^XZ") },
            ]
        }))
        .unwrap();
        let documents = zpl_documents(&piece).unwrap();
        assert_eq!(documents, vec!["^XA^XZ"]);
    }

    #[test]
    fn package_line_items_keep_pound_weights() {
        let value = serde_json::to_value(package_line_item(&Parcel {
            length: 12.0,
            width: 10.0,
            height: 6.0,
            weight: 5.0,
        }))
        .unwrap();
        assert_eq!(value["weight"]["units"], "LB");
        assert_eq!(value["weight"]["value"], 5.0);
        assert_eq!(value["dimensions"]["units"], "IN");
        assert_eq!(value["packagingType"], "YOUR_PACKAGING");
    }
}

//! UPS direct-API client: OAuth, rate shopping and label purchase.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use once_cell::sync::Lazy;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::address::{clean_phone, validate_billing_zip};
use crate::config::ShippingSettings;
use crate::error::{Error, Result};
use crate::labels::LabelConverter;
use crate::models::{
    json_f64, json_i64, AddressBlock, OneOrMany, Parcel, Provider, PurchaseResult, Quote,
    RatedService, ThirdPartyBilling,
};

const UPS_TEST_BASE_URL: &str = "https://wwwcie.ups.com";
const UPS_PROD_BASE_URL: &str = "https://onlinetools.ups.com";
const TRANSACTION_SRC: &str = "shipping-broker";

/// UPS account numbers are 6 alphanumeric characters.
pub const UPS_ACCOUNT_LEN: usize = 6;

static SERVICE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Domestic
        ("01", "Next Day Air"),
        ("02", "2nd Day Air"),
        ("03", "Ground"),
        ("12", "3-Day Select"),
        ("13", "Next Day Air Saver"),
        ("14", "Next Day Air Early A.M."),
        ("59", "2nd Day Air A.M."),
        // International
        ("07", "Worldwide Express"),
        ("08", "Worldwide Expedited"),
        ("11", "Standard"),
        ("54", "Worldwide Express Plus"),
        ("65", "Worldwide Saver"),
        ("96", "Worldwide Express Freight"),
        // SurePost
        ("92", "SurePost Less than 1 lb"),
        ("93", "SurePost 1 lb or Greater"),
        ("94", "SurePost BPM"),
        ("95", "SurePost Media Mail"),
        // Access Point
        ("70", "Access Point Economy"),
        // Today (same-day) services
        ("82", "Today Standard"),
        ("83", "Today Dedicated Courier"),
        ("84", "Today Intercity"),
        ("85", "Today Express"),
        ("86", "Today Express Saver"),
    ])
});

#[derive(Debug, Deserialize)]
struct OAuthToken {
    access_token: String,
}

pub struct UpsClient {
    client_id: String,
    shipper_number: String,
    company_name: String,
    token: String,
    http: HttpClient,
    base_url: String,
}

impl UpsClient {
    /// Authenticate once; the bearer token is held for the life of the
    /// instance. A flow that outlives the token re-instantiates the client.
    pub async fn new(settings: &ShippingSettings) -> Result<Self> {
        let client_id = settings
            .ups_client_id
            .clone()
            .ok_or_else(|| Error::Config("UPS client id is missing in the shipping settings".to_string()))?;
        let client_secret = settings
            .ups_client_secret
            .clone()
            .ok_or_else(|| Error::Config("UPS client secret is missing in the shipping settings".to_string()))?;
        let shipper_number = settings
            .ups_shipper_number
            .clone()
            .ok_or_else(|| Error::Config("UPS shipper number is missing in the shipping settings".to_string()))?;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = if settings.use_test_environment {
            UPS_TEST_BASE_URL
        } else {
            UPS_PROD_BASE_URL
        }
        .to_string();

        let token = Self::oauth(&http, &base_url, &client_id, &client_secret).await?;

        Ok(Self {
            client_id,
            shipper_number,
            company_name: settings.company_name.clone(),
            token,
            http,
            base_url,
        })
    }

    // The token endpoint wants Basic auth plus the merchant id header.
    async fn oauth(
        http: &HttpClient,
        base_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String> {
        let credentials = BASE64.encode(format!("{client_id}:{client_secret}"));
        let response = http
            .post(format!("{base_url}/security/v1/oauth/token"))
            .header("Authorization", format!("Basic {credentials}"))
            .header("x-merchant-id", client_id)
            .header("Accept", "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::carrier(Provider::Ups, status.as_u16(), &text));
        }
        let token: OAuthToken = serde_json::from_str(&text)?;
        Ok(token.access_token)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header("x-merchant-id", &self.client_id)
            .header("Accept", "application/json")
            .header("transId", Uuid::new_v4().to_string())
            .header("transactionSrc", TRANSACTION_SRC)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::carrier(Provider::Ups, status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Shop all services for the shipment. All parcels go into one
    /// multi-package request; rates come back on the shipper's account
    /// (third-party rates are only applied at purchase).
    pub async fn rate(
        &self,
        to_address: &AddressBlock,
        from_address: &AddressBlock,
        parcels: &[Parcel],
        billing: Option<&ThirdPartyBilling>,
    ) -> Result<Vec<RatedService>> {
        if billing.is_some() {
            debug!("rating on the shipper account; third-party billing applies at purchase");
        }

        let body = RateEnvelope {
            rate_request: RateRequest {
                request: SubVersion::v2205(),
                // 03 = customer counter
                pickup_type: CodeOnly::new("03"),
                // 04 = occasional shipper
                customer_classification: CodeOnly::new("04"),
                shipment: RateShipment {
                    shipper: shipper_block(
                        &self.company_name,
                        &self.shipper_number,
                        from_address,
                    )?,
                    ship_from: AddressOnly {
                        address: ups_address(from_address),
                    },
                    ship_to: AddressOnly {
                        address: ups_address(to_address),
                    },
                    package: parcels.iter().map(package_block).collect(),
                },
            },
        };

        let response = self
            .post(
                &format!("{}/api/rating/v2205/Shop", self.base_url),
                &serde_json::to_value(&body)?,
            )
            .await?;
        parse_rated_services(&response)
    }

    /// Buy the label for the selected quote and normalize the result:
    /// per-package PNG labels decoded, rotated upright, stored, and merged
    /// into one PDF artifact.
    pub async fn ship(&self, quote: &Quote, converter: &LabelConverter) -> Result<PurchaseResult> {
        let request = &quote.request;
        let payer = payment_block(&self.shipper_number, request.billing.as_ref())?;

        let body = ShipEnvelope {
            shipment_request: ShipmentRequest {
                request: SubVersion::v2205(),
                shipment: ShipShipment {
                    shipper: shipper_block(
                        &self.company_name,
                        &self.shipper_number,
                        &request.from_address,
                    )?,
                    ship_from: party_block(&request.from_address)?,
                    ship_to: party_block(&request.to_address)?,
                    service: CodeOnly::new(&quote.service_code),
                    payment_information: PaymentInformation {
                        shipment_charge: vec![payer],
                    },
                    package: request.parcels.iter().map(package_block).collect(),
                    shipment_date: chrono::Utc::now().format("%Y%m%d").to_string(),
                },
                label_specification: LabelSpecification {
                    label_image_format: CodeOnly::new("PNG"),
                    label_delivery: LabelDelivery {
                        label_link_indicator: "true".to_string(),
                    },
                },
            },
        };

        let response = self
            .post(
                &format!("{}/api/shipments/v1/ship", self.base_url),
                &serde_json::to_value(&body)?,
            )
            .await?;
        self.purchase_from_response(&response, quote, converter).await
    }

    async fn purchase_from_response(
        &self,
        response: &Value,
        quote: &Quote,
        converter: &LabelConverter,
    ) -> Result<PurchaseResult> {
        let envelope: ShipResponseEnvelope = serde_json::from_value(response.clone())?;
        let results = envelope.shipment_response.shipment_results;
        let packages = results.package_results.into_vec();
        if packages.is_empty() {
            return Err(Error::MissingLabel(
                "UPS returned no package results".to_string(),
            ));
        }

        let mut tracking_numbers = Vec::new();
        let mut label_urls = Vec::new();
        for package in &packages {
            if let Some(number) = &package.tracking_number {
                tracking_numbers.push(number.clone());
            }
            // Newer responses use LabelImage, older ones ShippingLabel.
            let label = package.label_image.as_ref().or(package.shipping_label.as_ref());
            if let Some(data_uri) = label.and_then(label_data_uri) {
                label_urls.push(converter.decode_inline_b64_image(&data_uri).await?);
            }
        }
        if label_urls.is_empty() {
            return Err(Error::MissingLabel(
                "UPS returned no label images".to_string(),
            ));
        }

        let shipping_label = if label_urls.len() == 1 {
            converter.bitmap_to_single_page_pdf(&label_urls[0], false).await?
        } else {
            converter.bitmaps_to_multi_page_pdf(&label_urls, false).await?
        };

        let shipment_id = results
            .shipment_identification_number
            .clone()
            .or_else(|| tracking_numbers.first().cloned())
            .ok_or_else(|| {
                Error::MissingLabel("UPS response carries no tracking number".to_string())
            })?;
        let awb_number = if tracking_numbers.is_empty() {
            shipment_id.clone()
        } else {
            tracking_numbers.join(", ")
        };

        Ok(PurchaseResult {
            provider: Provider::Ups,
            carrier: "UPS".to_string(),
            carrier_service: quote.service_name.clone(),
            shipment_id,
            shipment_amount: quote.total_price,
            awb_number,
            label_bundle: label_urls,
            shipping_label,
        })
    }
}

// ---------- request contracts ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CodeOnly {
    code: String,
}

impl CodeOnly {
    fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubVersion {
    sub_version: String,
}

impl SubVersion {
    fn v2205() -> Self {
        Self {
            sub_version: "2205".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpsAddress {
    address_line: Vec<String>,
    city: String,
    state_province_code: String,
    postal_code: String,
    country_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AddressOnly {
    address: UpsAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Phone {
    number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ShipperBlock {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    attention_name: Option<String>,
    shipper_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<Phone>,
    address: UpsAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PartyBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    attention_name: String,
    phone: Phone,
    address: UpsAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Dimensions {
    unit_of_measurement: CodeOnly,
    length: String,
    width: String,
    height: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PackageWeight {
    unit_of_measurement: CodeOnly,
    weight: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PackageBlock {
    // The ship endpoint reads Packaging, the rate endpoint PackagingType;
    // both are kept so one block serves both calls.
    packaging: CodeOnly,
    packaging_type: CodeOnly,
    dimensions: Dimensions,
    package_weight: PackageWeight,
}

#[derive(Debug, Serialize)]
struct RateEnvelope {
    #[serde(rename = "RateRequest")]
    rate_request: RateRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RateRequest {
    request: SubVersion,
    pickup_type: CodeOnly,
    customer_classification: CodeOnly,
    shipment: RateShipment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RateShipment {
    shipper: ShipperBlock,
    ship_from: AddressOnly,
    ship_to: AddressOnly,
    package: Vec<PackageBlock>,
}

#[derive(Debug, Serialize)]
struct ShipEnvelope {
    #[serde(rename = "ShipmentRequest")]
    shipment_request: ShipmentRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ShipmentRequest {
    request: SubVersion,
    shipment: ShipShipment,
    label_specification: LabelSpecification,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ShipShipment {
    shipper: ShipperBlock,
    ship_from: PartyBlock,
    ship_to: PartyBlock,
    service: CodeOnly,
    payment_information: PaymentInformation,
    package: Vec<PackageBlock>,
    shipment_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PaymentInformation {
    shipment_charge: Vec<ShipmentCharge>,
}

#[derive(Debug, Serialize)]
struct ShipmentCharge {
    // 01 = transportation charges
    #[serde(rename = "Type")]
    charge_type: String,
    #[serde(rename = "BillShipper", skip_serializing_if = "Option::is_none")]
    bill_shipper: Option<BillShipper>,
    #[serde(rename = "BillThirdParty", skip_serializing_if = "Option::is_none")]
    bill_third_party: Option<BillThirdParty>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BillShipper {
    account_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BillThirdParty {
    account_number: String,
    address: BillingAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BillingAddress {
    postal_code: String,
    country_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LabelSpecification {
    label_image_format: CodeOnly,
    label_delivery: LabelDelivery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LabelDelivery {
    label_link_indicator: String,
}

fn ups_address(address: &AddressBlock) -> UpsAddress {
    let mut lines = vec![address.street1.clone()];
    if let Some(street2) = &address.street2 {
        lines.push(street2.clone());
    }
    UpsAddress {
        address_line: lines,
        city: address.city.clone(),
        state_province_code: address.state.clone(),
        postal_code: address.zip.clone(),
        country_code: "US".to_string(),
    }
}

fn shipper_block(
    company_name: &str,
    shipper_number: &str,
    address: &AddressBlock,
) -> Result<ShipperBlock> {
    Ok(ShipperBlock {
        name: company_name.to_string(),
        attention_name: Some(address.name.clone()),
        shipper_number: shipper_number.to_string(),
        phone: Some(Phone {
            number: clean_phone(&address.phone)?,
        }),
        address: ups_address(address),
    })
}

fn party_block(address: &AddressBlock) -> Result<PartyBlock> {
    let phone = Phone {
        number: clean_phone(&address.phone)?,
    };
    // Commercial addresses want CompanyName, residential ones Name.
    Ok(match &address.company {
        Some(company) => PartyBlock {
            company_name: Some(company.clone()),
            name: None,
            attention_name: address.name.clone(),
            phone,
            address: ups_address(address),
        },
        None => PartyBlock {
            company_name: None,
            name: Some(address.name.clone()),
            attention_name: address.name.clone(),
            phone,
            address: ups_address(address),
        },
    })
}

fn package_block(parcel: &Parcel) -> PackageBlock {
    PackageBlock {
        // 02 = customer-supplied packaging
        packaging: CodeOnly::new("02"),
        packaging_type: CodeOnly::new("02"),
        dimensions: Dimensions {
            unit_of_measurement: CodeOnly::new("IN"),
            length: format_measure(parcel.length),
            width: format_measure(parcel.width),
            height: format_measure(parcel.height),
        },
        package_weight: PackageWeight {
            unit_of_measurement: CodeOnly::new("LBS"),
            weight: format_measure(parcel.weight),
        },
    }
}

/// UPS wants measures as decimal strings.
fn format_measure(value: f64) -> String {
    format!("{value}")
}

fn payment_block(
    shipper_number: &str,
    billing: Option<&ThirdPartyBilling>,
) -> Result<ShipmentCharge> {
    match billing {
        Some(billing) if billing.account != shipper_number => {
            validate_billing_zip(&billing.postal_code)?;
            if billing.account.len() != UPS_ACCOUNT_LEN
                || !billing.account.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(Error::Validation(format!(
                    "invalid third-party billing account {:?}: UPS account numbers are {UPS_ACCOUNT_LEN} alphanumeric characters",
                    billing.account
                )));
            }
            Ok(ShipmentCharge {
                charge_type: "01".to_string(),
                bill_shipper: None,
                bill_third_party: Some(BillThirdParty {
                    account_number: billing.account.clone(),
                    address: BillingAddress {
                        postal_code: billing.postal_code.trim().to_string(),
                        country_code: "US".to_string(),
                    },
                }),
            })
        }
        _ => Ok(ShipmentCharge {
            charge_type: "01".to_string(),
            bill_shipper: Some(BillShipper {
                account_number: shipper_number.to_string(),
            }),
            bill_third_party: None,
        }),
    }
}

// ---------- response contracts ----------

#[derive(Debug, Deserialize)]
struct RateResponseEnvelope {
    #[serde(rename = "RateResponse")]
    rate_response: RateResponseBody,
}

#[derive(Debug, Deserialize)]
struct RateResponseBody {
    #[serde(rename = "RatedShipment", default)]
    rated_shipment: OneOrMany<RatedShipment>,
}

#[derive(Debug, Deserialize)]
struct RatedShipment {
    #[serde(rename = "Service")]
    service: ServiceRef,
    #[serde(rename = "TotalCharges", default)]
    total_charges: Option<Charges>,
    #[serde(rename = "GuaranteedDaysToDelivery", default)]
    guaranteed_days: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ServiceRef {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Charges {
    #[serde(rename = "MonetaryValue", default)]
    monetary_value: Option<Value>,
}

/// The API may return a single rated shipment or an array of them.
fn parse_rated_services(response: &Value) -> Result<Vec<RatedService>> {
    let envelope: RateResponseEnvelope = serde_json::from_value(response.clone())?;
    Ok(envelope
        .rate_response
        .rated_shipment
        .into_vec()
        .into_iter()
        .map(|rated| {
            let code = rated.service.code.unwrap_or_default();
            // Prefer the returned description, then the static map, then
            // the raw code.
            let name = rated
                .service
                .description
                .filter(|description| !description.trim().is_empty())
                .or_else(|| SERVICE_MAP.get(code.as_str()).map(|s| (*s).to_string()))
                .unwrap_or_else(|| code.clone());
            let total_charge = rated
                .total_charges
                .as_ref()
                .and_then(|charges| json_f64(charges.monetary_value.as_ref()))
                .unwrap_or(0.0);
            RatedService {
                service_code: code,
                service_name: name,
                total_charge,
                delivery_days: json_i64(rated.guaranteed_days.as_ref()),
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct ShipResponseEnvelope {
    #[serde(rename = "ShipmentResponse")]
    shipment_response: ShipmentResponseBody,
}

#[derive(Debug, Deserialize)]
struct ShipmentResponseBody {
    #[serde(rename = "ShipmentResults")]
    shipment_results: ShipmentResults,
}

#[derive(Debug, Deserialize)]
struct ShipmentResults {
    #[serde(rename = "ShipmentIdentificationNumber", default)]
    shipment_identification_number: Option<String>,
    #[serde(rename = "PackageResults", default)]
    package_results: OneOrMany<PackageResult>,
}

#[derive(Debug, Deserialize)]
struct PackageResult {
    #[serde(rename = "TrackingNumber", default)]
    tracking_number: Option<String>,
    #[serde(rename = "LabelImage", default)]
    label_image: Option<LabelPayload>,
    #[serde(rename = "ShippingLabel", default)]
    shipping_label: Option<LabelPayload>,
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    #[serde(rename = "GraphicImage", default)]
    graphic_image: Option<String>,
    #[serde(rename = "ImageFormat", default)]
    image_format: Option<ImageFormat>,
}

#[derive(Debug, Deserialize)]
struct ImageFormat {
    #[serde(rename = "Code", default)]
    code: Option<String>,
}

fn label_data_uri(label: &LabelPayload) -> Option<String> {
    let graphic = label.graphic_image.as_deref()?;
    let format = label
        .image_format
        .as_ref()?
        .code
        .as_deref()?
        .to_lowercase();
    Some(format!("data:image/{format};base64,{graphic}"))
}

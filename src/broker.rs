//! Rate-shopping and purchase orchestration across all configured providers.
//!
//! Carriers are queried strictly one after another inside a single call
//! chain; there is no concurrent fan-out and no retry anywhere.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ShippingSettings;
use crate::easypost::EasyPostClient;
use crate::error::{Error, Result};
use crate::fedex::{FedExClient, FEDEX_ACCOUNT_LEN};
use crate::labels::LabelConverter;
use crate::models::{
    explode_parcels, AddressBlock, ParcelRow, Provider, PurchaseResult, Quote, QuoteRequest,
    RatedService, ThirdPartyBilling, TrackingData,
};
use crate::storage::LabelStore;
use crate::ups::{UpsClient, UPS_ACCOUNT_LEN};

/// Facts the host shipment record supplies for one rate-shop or purchase.
#[derive(Debug, Clone)]
pub struct ShipmentFacts {
    pub to_address: AddressBlock,
    pub from_address: AddressBlock,
    pub parcel_rows: Vec<ParcelRow>,
    pub bill_third_party: bool,
    pub third_party_account: Option<String>,
    pub third_party_postal: Option<String>,
}

pub struct ShippingBroker {
    settings: ShippingSettings,
    converter: LabelConverter,
}

impl ShippingBroker {
    pub fn new(settings: ShippingSettings, store: Arc<dyn LabelStore>) -> Result<Self> {
        let converter = LabelConverter::new(store)?;
        Ok(Self {
            settings,
            converter,
        })
    }

    /// Shop rates across the configured providers and return all quotes,
    /// sorted ascending by price.
    ///
    /// The aggregator is queried whenever it is enabled; a direct carrier
    /// joins in for third-party billing on its account-number scheme, and
    /// FedEx also for sender-billed multi-parcel shipments. Aggregator
    /// trouble degrades to an empty contribution; direct-carrier HTTP
    /// errors abort the whole call.
    pub async fn fetch_shipping_rates(&self, facts: &ShipmentFacts) -> Result<Vec<Quote>> {
        let parcels = explode_parcels(&facts.parcel_rows);
        if parcels.is_empty() {
            return Err(Error::Validation("shipment has no parcels".to_string()));
        }
        let billing = resolve_third_party(facts)?;

        let mut quotes = Vec::new();

        if self.settings.easypost_enabled {
            let easypost = EasyPostClient::new(&self.settings)?;
            match easypost
                .get_available_services(
                    &facts.to_address,
                    &facts.from_address,
                    &parcels,
                    billing.as_ref(),
                )
                .await
            {
                Ok(aggregator_quotes) => quotes.extend(aggregator_quotes),
                Err(err) => error!(error = %err, "aggregator rate shopping failed"),
            }
        }

        let request = QuoteRequest {
            to_address: facts.to_address.clone(),
            from_address: facts.from_address.clone(),
            parcels: parcels.clone(),
            billing: billing.clone(),
        };

        match billing.as_ref().and_then(|b| implied_provider(&b.account)) {
            Some(Provider::Ups) => {
                let ups = UpsClient::new(&self.settings).await?;
                let rated = ups
                    .rate(
                        &facts.to_address,
                        &facts.from_address,
                        &parcels,
                        billing.as_ref(),
                    )
                    .await?;
                quotes.extend(direct_quotes(Provider::Ups, "UPS", rated, &request));
            }
            Some(Provider::FedEx) => {
                let fedex = FedExClient::new(&self.settings).await?;
                let rated = fedex
                    .rate(
                        &facts.to_address,
                        &facts.from_address,
                        &parcels,
                        billing.as_ref(),
                    )
                    .await?;
                quotes.extend(direct_quotes(Provider::FedEx, "FedEx", rated, &request));
            }
            _ => {
                // Sender-billed multi-parcel shipments also shop FedEx
                // directly; the aggregator's pooled FedEx code was dropped
                // for them by the collision filter.
                if billing.is_none() && parcels.len() > 1 && self.settings.fedex_configured() {
                    let fedex = FedExClient::new(&self.settings).await?;
                    let rated = fedex
                        .rate(&facts.to_address, &facts.from_address, &parcels, None)
                        .await?;
                    quotes.extend(direct_quotes(Provider::FedEx, "FedEx", rated, &request));
                }
            }
        }

        if let Some(implied) = billing.as_ref().and_then(|b| implied_provider(&b.account)) {
            quotes = filter_third_party_quotes(quotes, implied);
        }

        sort_by_price(&mut quotes);
        info!(count = quotes.len(), "rate shopping complete");
        Ok(quotes)
    }

    /// Buy the selected quote through its provider and return the canonical
    /// purchase record for the host to persist.
    pub async fn create_shipment(&self, quote: &Quote) -> Result<PurchaseResult> {
        let result = match quote.provider {
            Provider::EasyPost => {
                let easypost = EasyPostClient::new(&self.settings)?;
                easypost.create_shipment(quote, &self.converter).await?
            }
            Provider::Ups => {
                let ups = UpsClient::new(&self.settings).await?;
                ups.ship(quote, &self.converter).await?
            }
            Provider::FedEx => {
                let fedex = FedExClient::new(&self.settings).await?;
                fedex.ship(quote, &self.converter).await?
            }
        };
        info!(
            provider = %result.provider,
            awb = %result.awb_number,
            amount = result.shipment_amount,
            "label purchased"
        );
        Ok(result)
    }

    /// Resolve a printable label URL. Aggregator labels are fetched (and
    /// merged) on demand; direct-carrier labels were persisted at purchase,
    /// so the host passes the stored value back in.
    pub async fn get_label(
        &self,
        provider: Provider,
        shipment_id: &str,
        stored_label: Option<&str>,
    ) -> Result<String> {
        match provider {
            Provider::EasyPost => {
                let easypost = EasyPostClient::new(&self.settings)?;
                easypost.get_label(shipment_id, &self.converter).await
            }
            Provider::Ups | Provider::FedEx => stored_label
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::MissingLabel(format!(
                        "no shipping label found for shipment {shipment_id}"
                    ))
                }),
        }
    }

    /// Tracking snapshot for a purchase. Direct-carrier shipments track
    /// through the aggregator's tracker endpoint (third-party billed
    /// shipments have no tracking access on the carrier's own API).
    pub async fn get_tracking_data(
        &self,
        provider: Provider,
        shipment_id: &str,
    ) -> Result<TrackingData> {
        let easypost = EasyPostClient::new(&self.settings)?;
        match provider {
            Provider::EasyPost => easypost.get_tracking_data(shipment_id).await,
            Provider::Ups => easypost.track_by_carrier("UPS", shipment_id).await,
            Provider::FedEx => easypost.track_by_carrier("FedEx", shipment_id).await,
        }
    }

    /// Persist a label value (internal URL, data-URI or remote URL) into
    /// durable storage and hand back the stored URL.
    pub async fn persist_label(&self, value: &str) -> Result<String> {
        self.converter.persist_label_value(value).await
    }
}

/// Work out whether third-party billing is active and against which
/// account. Active only when the shipment flags it, supplies an account,
/// and the cleaned account matches a known carrier numbering scheme.
fn resolve_third_party(facts: &ShipmentFacts) -> Result<Option<ThirdPartyBilling>> {
    if !facts.bill_third_party {
        return Ok(None);
    }
    let account_raw = facts
        .third_party_account
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            Error::Validation(
                "third-party billing needs the payer's account number".to_string(),
            )
        })?;

    let account: String = account_raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if account.is_empty() {
        return Err(Error::Validation(
            "third-party billing account must contain at least one letter or number".to_string(),
        ));
    }
    if implied_provider(&account).is_none() {
        warn!(
            length = account.len(),
            "third-party account length matches no known carrier numbering; shopping sender-billed"
        );
        return Ok(None);
    }

    let postal_code = facts
        .third_party_postal
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            Error::Validation("third-party billing needs the payer's billing zip".to_string())
        })?;

    Ok(Some(ThirdPartyBilling {
        account,
        postal_code: postal_code.to_string(),
    }))
}

/// Account-number length implies the carrier: 6 characters is the UPS
/// scheme, 9 digits the FedEx one. A business heuristic, preserved as-is.
fn implied_provider(account: &str) -> Option<Provider> {
    match account.len() {
        UPS_ACCOUNT_LEN => Some(Provider::Ups),
        FEDEX_ACCOUNT_LEN => Some(Provider::FedEx),
        _ => None,
    }
}

/// Hard filter, not a preference: under third-party billing only the
/// payer's own carrier may appear.
fn filter_third_party_quotes(quotes: Vec<Quote>, implied: Provider) -> Vec<Quote> {
    quotes
        .into_iter()
        .filter(|quote| quote.provider == implied)
        .collect()
}

fn sort_by_price(quotes: &mut [Quote]) {
    quotes.sort_by(|a, b| {
        a.total_price
            .partial_cmp(&b.total_price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn direct_quotes(
    provider: Provider,
    carrier: &str,
    rated: Vec<RatedService>,
    request: &QuoteRequest,
) -> Vec<Quote> {
    rated
        .into_iter()
        .map(|service| Quote {
            provider,
            carrier_code: carrier.to_string(),
            carrier: carrier.to_string(),
            service_code: service.service_code,
            service_name: service.service_name,
            total_price: service.total_charge,
            delivery_days: service.delivery_days,
            shipment_id: None,
            rate_id: None,
            request: request.clone(),
        })
        .collect()
}

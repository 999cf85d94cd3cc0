//! Live rate-shopping smoke test against real carrier sandboxes.
//!
//! Needs real credentials in the environment (see `ShippingSettings`), so
//! it is ignored by default: `cargo test -- --ignored` with a populated
//! `.env` runs it.

use anyhow::Result;
use std::sync::Arc;

use shipping_broker::{
    AddressBlock, LocalFileStore, ParcelRow, ShipmentFacts, ShippingBroker, ShippingSettings,
};

fn test_address(name: &str, street1: &str, city: &str, state: &str, zip: &str) -> AddressBlock {
    AddressBlock {
        name: name.to_string(),
        company: None,
        street1: street1.to_string(),
        street2: None,
        city: city.to_string(),
        state: state.to_string(),
        zip: zip.to_string(),
        country: "US".to_string(),
        phone: "7145551212".to_string(),
        email: None,
    }
}

#[tokio::test]
#[ignore = "requires carrier sandbox credentials"]
async fn single_parcel_rate_shop_returns_sorted_quotes() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("shipping_broker=debug")
        .try_init()
        .ok();

    let settings = ShippingSettings::from_env()?;
    let store = Arc::new(LocalFileStore::new(
        settings.files_dir.clone(),
        &settings.site_url,
    ));
    let broker = ShippingBroker::new(settings, store)?;

    let facts = ShipmentFacts {
        to_address: test_address("Pat Doe", "417 Montgomery St", "San Francisco", "CA", "94104"),
        from_address: test_address("Shipping Desk", "179 N Harbor Dr", "Redondo Beach", "CA", "90277"),
        parcel_rows: vec![ParcelRow {
            length: 12.0,
            width: 10.0,
            height: 6.0,
            weight: 5.0,
            count: 1,
        }],
        bill_third_party: false,
        third_party_account: None,
        third_party_postal: None,
    };

    let quotes = broker.fetch_shipping_rates(&facts).await?;
    assert!(!quotes.is_empty(), "expected at least one quote");

    // Sorted ascending by price, and the single-parcel collision rule holds.
    for pair in quotes.windows(2) {
        assert!(pair[0].total_price <= pair[1].total_price);
    }
    assert!(quotes.iter().all(|q| q.carrier_code != "FedEx"));

    Ok(())
}

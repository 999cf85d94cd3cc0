//! Carrier rate shopping and label purchasing for ERP shipments.
//!
//! Queries a multi-carrier aggregator plus direct UPS and FedEx
//! integrations for price quotes, buys the selected service, and
//! normalizes tracking numbers and label artifacts (rotated rasters,
//! multi-page PDFs, concatenated ZPL) for the host system to persist.

pub mod address;
pub mod broker;
pub mod config;
pub mod easypost;
pub mod error;
pub mod fedex;
pub mod labels;
pub mod models;
pub mod storage;
pub mod ups;

pub use broker::{ShipmentFacts, ShippingBroker};
pub use config::{LabelFormat, ShippingSettings};
pub use error::{Error, Result};
pub use labels::LabelConverter;
pub use models::{
    explode_parcels, AddressBlock, Parcel, ParcelRow, Provider, PurchaseResult, Quote,
    QuoteRequest, RatedService, ThirdPartyBilling, TrackingData,
};
pub use storage::{LabelStore, LocalFileStore, StoredFile};

use serde::{Deserialize, Serialize};

/// Addresses and parcel are forwarded to the label provider as-is.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLabelRequest {
    pub address_from: serde_json::Value,
    pub address_to: serde_json::Value,
    pub parcel: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRate {
    #[serde(skip_serializing)]
    pub object_id: String,
    pub amount: String,
    pub currency: String,
    pub provider: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLabelResponse {
    pub label_url: String,
    pub tracking_number: String,
    pub rate: ShippingRate,
}

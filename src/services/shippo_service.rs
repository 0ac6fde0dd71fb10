use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::{
    config::ShippoConfig,
    error::{AppError, Result},
    models::{ShippingLabelRequest, ShippingLabelResponse, ShippingRate},
};

/// Creates a shipment, buys its cheapest rate and returns the label.
pub async fn create_label(
    client: &reqwest::Client,
    config: &ShippoConfig,
    req: &ShippingLabelRequest,
) -> Result<ShippingLabelResponse> {
    let shipment = post(
        client,
        config,
        "shipments/",
        &json!({
            "address_from": req.address_from,
            "address_to": req.address_to,
            "parcels": [req.parcel],
            "async": false,
        }),
    )
    .await?;

    let rates: Vec<ShippingRate> = shipment
        .get("rates")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::UpstreamError(format!("Unexpected Shippo rates: {}", e)))?
        .unwrap_or_default();

    let rate = cheapest_rate(rates)
        .ok_or_else(|| AppError::UpstreamError("No shipping rates available".to_string()))?;

    tracing::info!(
        "Purchasing {} label at {} {}",
        rate.provider,
        rate.amount,
        rate.currency
    );

    let transaction = post(
        client,
        config,
        "transactions/",
        &json!({
            "rate": rate.object_id,
            "label_file_type": "PDF",
            "async": false,
        }),
    )
    .await?;

    if transaction.get("status").and_then(Value::as_str) != Some("SUCCESS") {
        tracing::error!("Shippo transaction failed: {}", transaction);
        let message = transaction
            .pointer("/messages/0/text")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Shippo error");
        return Err(AppError::UpstreamError(format!(
            "Label purchase failed: {}",
            message
        )));
    }

    let field = |name: &str| {
        transaction
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::UpstreamError(format!("Shippo response missing {}", name)))
    };

    Ok(ShippingLabelResponse {
        label_url: field("label_url")?,
        tracking_number: field("tracking_number")?,
        rate,
    })
}

/// Lowest-priced rate; amounts that fail to parse are never chosen.
pub fn cheapest_rate(rates: Vec<ShippingRate>) -> Option<ShippingRate> {
    rates
        .into_iter()
        .filter_map(|rate| {
            let amount: Decimal = rate.amount.parse().ok()?;
            Some((amount, rate))
        })
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, rate)| rate)
}

async fn post(
    client: &reqwest::Client,
    config: &ShippoConfig,
    path: &str,
    body: &Value,
) -> Result<Value> {
    let response = client
        .post(format!("{}/{}", config.api_base, path))
        .header(
            http::header::AUTHORIZATION,
            format!("ShippoToken {}", config.api_key),
        )
        .json(body)
        .send()
        .await
        .map_err(|e| AppError::UpstreamError(format!("Shippo request failed: {}", e)))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| AppError::UpstreamError(format!("Failed to parse Shippo response: {}", e)))?;

    if !status.is_success() {
        tracing::error!("Shippo API error response: {}", body);
        return Err(AppError::UpstreamError(format!(
            "Shippo returned {}",
            status
        )));
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(id: &str, amount: &str) -> ShippingRate {
        ShippingRate {
            object_id: id.to_string(),
            amount: amount.to_string(),
            currency: "USD".to_string(),
            provider: "USPS".to_string(),
        }
    }

    #[test]
    fn cheapest_rate_compares_amounts_numerically() {
        let rates = vec![rate("a", "12.50"), rate("b", "9.75"), rate("c", "10")];
        assert_eq!(cheapest_rate(rates).map(|r| r.object_id), Some("b".to_string()));
    }

    #[test]
    fn unparseable_amounts_are_skipped() {
        let rates = vec![rate("a", "n/a"), rate("b", "4.10")];
        assert_eq!(cheapest_rate(rates).map(|r| r.object_id), Some("b".to_string()));
        assert!(cheapest_rate(vec![]).is_none());
    }
}

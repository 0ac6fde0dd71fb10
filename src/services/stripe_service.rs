use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{
    config::StripeConfig,
    error::{AppError, Result},
    models::CartItem,
};

/// Rejects carts the provider would refuse anyway.
pub fn validate_cart(cart: &[CartItem]) -> Result<()> {
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    for (index, item) in cart.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Cart item {} has no name",
                index
            )));
        }
        if item.price <= Decimal::ZERO {
            return Err(AppError::BadRequest(format!(
                "Cart item '{}' must have a positive price",
                item.name
            )));
        }
        if item.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "Cart item '{}' must have a quantity of at least 1",
                item.name
            )));
        }
    }

    Ok(())
}

/// Price in the currency's minor unit (cents).
pub fn unit_amount(price: Decimal) -> Result<i64> {
    (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::BadRequest(format!("Price {} is out of range", price)))
}

/// Form fields for `POST /v1/checkout/sessions`.
pub fn session_form(config: &StripeConfig, cart: &[CartItem]) -> Result<Vec<(String, String)>> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), config.success_url.clone()),
        ("cancel_url".to_string(), config.cancel_url.clone()),
    ];

    for (i, item) in cart.iter().enumerate() {
        let prefix = format!("line_items[{}]", i);
        form.push((
            format!("{}[price_data][currency]", prefix),
            config.currency.clone(),
        ));
        form.push((
            format!("{}[price_data][product_data][name]", prefix),
            item.name.clone(),
        ));
        form.push((
            format!("{}[price_data][unit_amount]", prefix),
            unit_amount(item.price)?.to_string(),
        ));
        form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }

    Ok(form)
}

pub async fn create_checkout_session(
    client: &reqwest::Client,
    config: &StripeConfig,
    cart: &[CartItem],
) -> Result<String> {
    validate_cart(cart)?;
    let form = session_form(config, cart)?;

    let response = client
        .post(format!("{}/v1/checkout/sessions", config.api_base))
        .bearer_auth(&config.secret_key)
        .form(&form)
        .send()
        .await
        .map_err(|e| AppError::UpstreamError(format!("Stripe request failed: {}", e)))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::UpstreamError(format!("Failed to parse Stripe response: {}", e)))?;

    if !status.is_success() {
        tracing::error!("Stripe API error response: {}", body);
        let message = body
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Stripe error");
        return Err(AppError::UpstreamError(format!(
            "Stripe checkout session failed: {}",
            message
        )));
    }

    let url = body
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::UpstreamError("Stripe response missing url".to_string()))?;

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StripeConfig {
        StripeConfig {
            secret_key: "sk_test".to_string(),
            api_base: "http://localhost".to_string(),
            currency: "usd".to_string(),
            success_url: "http://shop/success".to_string(),
            cancel_url: "http://shop/cancel".to_string(),
        }
    }

    fn item(name: &str, price: Decimal) -> CartItem {
        CartItem {
            name: name.to_string(),
            price,
            quantity: 1,
        }
    }

    #[test]
    fn prices_convert_to_cents() {
        assert_eq!(unit_amount(Decimal::new(1999, 2)).unwrap(), 1999);
        assert_eq!(unit_amount(Decimal::from(5)).unwrap(), 500);
        assert_eq!(unit_amount(Decimal::new(5, 3)).unwrap(), 1);
    }

    #[test]
    fn form_lists_every_line_item() {
        let cart = vec![item("Widget", Decimal::new(1250, 2)), item("Gadget", Decimal::from(3))];
        let form = session_form(&config(), &cart).unwrap();

        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][product_data][name]"), Some("Widget"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("1250"));
        assert_eq!(get("line_items[1][price_data][unit_amount]"), Some("300"));
        assert_eq!(get("line_items[1][quantity]"), Some("1"));
    }

    #[test]
    fn invalid_carts_are_rejected() {
        assert!(validate_cart(&[]).is_err());
        assert!(validate_cart(&[item("", Decimal::from(1))]).is_err());
        assert!(validate_cart(&[item("Free", Decimal::from(0))]).is_err());
        assert!(validate_cart(&[item("Widget", Decimal::from(1))]).is_ok());
    }
}

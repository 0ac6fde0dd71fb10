use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;

use super::S3Config;

/// Client for the image bucket. Credentials are resolved by the standard AWS
/// provider chain (environment, shared profile, instance role).
pub async fn load_s3_client(config: &S3Config) -> Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let shared = loader.load().await;

    // Custom endpoints are addressed path-style: {endpoint}/{bucket}/{key}.
    let s3 = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(config.endpoint.is_some())
        .build();

    tracing::info!(
        "S3 image storage: bucket {} in {}{}",
        config.bucket,
        config.region,
        config
            .endpoint
            .as_deref()
            .map(|e| format!(" via {}", e))
            .unwrap_or_default()
    );

    Client::from_conf(s3)
}

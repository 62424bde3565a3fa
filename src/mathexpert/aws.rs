//! AWS session setup.
//!
//! Turns an [`AwsConfig`] into an [`SdkConfig`] that the Bedrock client is
//! built from. See [`AwsConfig::credential_source`] for the precedence rules.

use crate::mathexpert::config::{AwsConfig, CredentialSource, StaticKeys};
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_credential_types::Credentials;
use thiserror::Error;

/// Session name sent with every `AssumeRole` request.
pub const ROLE_SESSION_NAME: &str = "AssumeRoleSession";

const STATIC_PROVIDER: &str = "mathexpert-static";
const ASSUMED_ROLE_PROVIDER: &str = "mathexpert-assume-role";

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("failed to assume role {role_arn}: {message}")]
    AssumeRole { role_arn: String, message: String },

    #[error("assume role {0} returned no credentials")]
    MissingCredentials(String),
}

/// Resolve credentials and region into an SDK configuration.
pub async fn load_sdk_config(config: &AwsConfig) -> Result<SdkConfig, AwsError> {
    let loader = base_loader(config);

    let loader = match config.credential_source() {
        CredentialSource::AssumeRole { role_arn, base } => {
            log::info!("Assuming role {}", role_arn);
            let credentials = assume_role(config, &role_arn, base).await?;
            loader.credentials_provider(credentials)
        }
        CredentialSource::Profile { name } => {
            log::debug!("Using AWS profile {}", name);
            loader.profile_name(name)
        }
        CredentialSource::StaticKeys(keys) => {
            log::debug!("Using static AWS credentials");
            loader.credentials_provider(static_credentials(keys))
        }
        CredentialSource::DefaultChain => {
            log::debug!("Using the default AWS credential chain");
            loader
        }
    };

    Ok(loader.load().await)
}

fn base_loader(config: &AwsConfig) -> ConfigLoader {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    match &config.region {
        Some(region) => loader.region(Region::new(region.clone())),
        None => loader,
    }
}

fn static_credentials(keys: StaticKeys) -> Credentials {
    Credentials::new(
        keys.access_key_id,
        keys.secret_access_key,
        None,
        None,
        STATIC_PROVIDER,
    )
}

async fn assume_role(
    config: &AwsConfig,
    role_arn: &str,
    base: Option<StaticKeys>,
) -> Result<Credentials, AwsError> {
    let loader = base_loader(config);
    let base_config = match base {
        Some(keys) => loader.credentials_provider(static_credentials(keys)),
        None => loader,
    }
    .load()
    .await;

    let output = aws_sdk_sts::Client::new(&base_config)
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(ROLE_SESSION_NAME)
        .send()
        .await
        .map_err(|e| AwsError::AssumeRole {
            role_arn: role_arn.to_string(),
            message: aws_sdk_sts::error::DisplayErrorContext(&e).to_string(),
        })?;

    let credentials = output
        .credentials()
        .ok_or_else(|| AwsError::MissingCredentials(role_arn.to_string()))?;

    Ok(Credentials::new(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        Some(credentials.session_token().to_string()),
        None,
        ASSUMED_ROLE_PROVIDER,
    ))
}

//! Authentication provider trait and implementations
//!
//! This module defines the credential provider trait and provides
//! implementations for the supported storage authentication methods.

use crate::config::{AuthMethod, Config};
use crate::error::{Result, SweepError};
use azure_identity::{ClientSecretCredential, DefaultAzureCredential, TokenCredentialOptions};
use azure_storage::StorageCredentials;
use std::sync::Arc;
use zeroize::Zeroizing;

const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Environment variable holding the service principal secret
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";

/// Environment variable holding the storage account key
pub const ACCOUNT_KEY_ENV: &str = "AZURE_STORAGE_KEY";

/// Trait for storage credential providers
pub trait CredentialProvider: Send + Sync {
    /// Build credentials usable by both the blob and queue service clients
    fn storage_credentials(&self) -> Result<StorageCredentials>;

    /// Short name of the authentication method, for logging
    fn method(&self) -> AuthMethod;
}

/// Default Azure Credential Provider using DefaultAzureCredential
pub struct DefaultAzureCredentialProvider;

impl CredentialProvider for DefaultAzureCredentialProvider {
    fn storage_credentials(&self) -> Result<StorageCredentials> {
        let credential = DefaultAzureCredential::create(TokenCredentialOptions::default())
            .map_err(|e| {
                SweepError::authentication(format!(
                    "Failed to create DefaultAzureCredential: {}",
                    e
                ))
            })?;

        Ok(StorageCredentials::token_credential(Arc::new(credential)))
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::Default
    }
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    tenant_id: String,
    client_id: String,
    client_secret: Zeroizing<String>,
}

impl ClientSecretProvider {
    pub fn new(tenant_id: String, client_id: String, client_secret: Zeroizing<String>) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
        }
    }
}

impl CredentialProvider for ClientSecretProvider {
    fn storage_credentials(&self) -> Result<StorageCredentials> {
        let authority_url = url::Url::parse(AUTHORITY_HOST)
            .map_err(|e| SweepError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            self.tenant_id.clone(),
            self.client_id.clone(),
            self.client_secret.to_string(),
        );

        Ok(StorageCredentials::token_credential(Arc::new(credential)))
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::ClientSecret
    }
}

/// Shared account key provider
pub struct AccessKeyProvider {
    account: String,
    key: Zeroizing<String>,
}

impl AccessKeyProvider {
    pub fn new(account: String, key: Zeroizing<String>) -> Self {
        Self { account, key }
    }
}

impl CredentialProvider for AccessKeyProvider {
    fn storage_credentials(&self) -> Result<StorageCredentials> {
        Ok(StorageCredentials::access_key(
            self.account.clone(),
            self.key.to_string(),
        ))
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::AccessKey
    }
}

/// Authentication provider factory
pub struct AuthProviderFactory;

impl AuthProviderFactory {
    /// Create a provider for the configured method, reading secrets from the environment
    pub fn create_provider(config: &Config) -> Result<Box<dyn CredentialProvider>> {
        Self::create_provider_with(config, |key| std::env::var(key).ok())
    }

    /// Create a provider, reading secrets through `lookup`
    pub fn create_provider_with<F>(config: &Config, lookup: F) -> Result<Box<dyn CredentialProvider>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |name: &str| -> Result<Zeroizing<String>> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .map(Zeroizing::new)
                .ok_or_else(|| {
                    SweepError::authentication(format!(
                        "{} must be set for {} authentication",
                        name, config.auth_method
                    ))
                })
        };

        match config.auth_method {
            AuthMethod::Default => Ok(Box::new(DefaultAzureCredentialProvider)),
            AuthMethod::ClientSecret => {
                if config.tenant_id.is_empty() || config.client_id.is_empty() {
                    return Err(SweepError::config(
                        "tenant_id and client_id are required for client secret authentication",
                    ));
                }
                Ok(Box::new(ClientSecretProvider::new(
                    config.tenant_id.clone(),
                    config.client_id.clone(),
                    secret(CLIENT_SECRET_ENV)?,
                )))
            }
            AuthMethod::AccessKey => Ok(Box::new(AccessKeyProvider::new(
                config.storage_account.clone(),
                secret(ACCOUNT_KEY_ENV)?,
            ))),
        }
    }
}

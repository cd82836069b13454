//! Moderation commands run with the platform's service key.
//!
//! # Usage
//!
//! ```bash
//! arthive admin approve <product-id>
//! arthive admin reject <product-id>
//! arthive admin delete <product-id>
//! arthive admin promote <profile-id> --role artist
//! ```
//!
//! # Environment Variables
//!
//! - `PLATFORM_URL` - Hosted platform project URL
//! - `PLATFORM_ANON_KEY` - Public project key
//! - `PLATFORM_SERVICE_KEY` - Service-role key (bypasses row-level security)

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use arthive_core::{ProductId, ProductStatus, ProfileId, UserRole};
use arthive_storefront::config::{ConfigError, PlatformConfig};
use arthive_storefront::platform::{PlatformClient, PlatformError, Product, Profile};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Platform settings are missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The service key is required for moderation.
    #[error("Missing environment variable: PLATFORM_SERVICE_KEY")]
    MissingServiceKey,

    /// Platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Platform client plus the service token used for every call.
pub struct AdminContext {
    client: PlatformClient,
    service_key: SecretString,
}

impl AdminContext {
    /// Build a context from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if platform settings or the service key are missing.
    pub fn from_env() -> Result<Self, AdminError> {
        let config = PlatformConfig::from_env()?;
        let service_key = config
            .service_key
            .clone()
            .ok_or(AdminError::MissingServiceKey)?;
        Ok(Self {
            client: PlatformClient::new(&config),
            service_key,
        })
    }

    fn token(&self) -> &str {
        self.service_key.expose_secret()
    }

    /// Set a product's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_status(
        &self,
        id: &str,
        status: ProductStatus,
    ) -> Result<Product, AdminError> {
        let product = self
            .client
            .set_product_status(self.token(), &ProductId::new(id), status)
            .await?;
        tracing::info!(product_id = %product.id, status = %status, "Product status changed");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        self.client
            .delete_product(self.token(), &ProductId::new(id))
            .await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Change a profile's role.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_role(&self, id: &str, role: UserRole) -> Result<Profile, AdminError> {
        let profile = self
            .client
            .set_role(self.token(), &ProfileId::new(id), role)
            .await?;
        tracing::info!(profile_id = %profile.id, role = %role, "Role changed");
        Ok(profile)
    }
}

//! HTTP client implementation for the hosted platform.

use std::fmt::Display;
use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use arthive_core::{Email, ProductId, ProductStatus, ProfileId, UserRole};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    ArtistSummary, AuthSession, AuthUser, Colony, ColonyProductRow, NewProduct, NewProfile,
    Product, ProductUpdate, Profile, ProfileUpdate, SignUpOutcome,
};
use super::{PlatformError, error_message};
use crate::config::PlatformConfig;

/// Storage bucket for profile pictures.
pub const AVATARS_BUCKET: &str = "avatars";

/// Storage bucket for product photos.
pub const PRODUCT_IMAGES_BUCKET: &str = "product-images";

const PRODUCT_COLUMNS: &str =
    "id,title,description,price,image_url,featured,status,artist_id,created_at";
const PROFILE_COLUMNS: &str = "id,username,email,role,artist_request,avatar_url,bio";

/// Client for the hosted platform's REST, auth and storage APIs.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
}

struct PlatformClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

/// PostgREST equality filter value.
fn eq(value: impl Display) -> String {
    format!("eq.{value}")
}

/// Turn a response into its body text, mapping failure statuses to errors.
async fn check(response: reqwest::Response) -> Result<String, PlatformError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(PlatformError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(PlatformError::Unauthorized(error_message(&body)));
    }

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Platform API returned non-success status"
        );
        return Err(PlatformError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    Ok(body)
}

impl PlatformClient {
    /// Create a new platform client.
    #[must_use]
    pub fn new(config: &PlatformConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        // `Url::join` drops the last path segment unless the base ends in '/'
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(PlatformClientInner {
                client: reqwest::Client::new(),
                base_url,
                anon_key: config.anon_key.clone(),
                cache,
            }),
        }
    }

    /// Build a request with the project key and a bearer token.
    ///
    /// Without a user token the anon key doubles as the bearer, which gives
    /// the request public (row-level-security `anon`) permissions.
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, PlatformError> {
        let url = self.inner.base_url.join(path)?;
        let anon_key = self.inner.anon_key.expose_secret();

        Ok(self
            .inner
            .client
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(token.unwrap_or(anon_key)))
    }

    fn table(
        &self,
        method: Method,
        table: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, PlatformError> {
        self.request(method, &format!("rest/v1/{table}"), token)
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, PlatformError> {
        let body = check(request.send().await?).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse platform response"
            );
            PlatformError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn execute_empty(request: RequestBuilder) -> Result<(), PlatformError> {
        check(request.send().await?).await.map(drop)
    }

    /// Send a row query and return the first row.
    async fn fetch_one<T: DeserializeOwned>(
        request: RequestBuilder,
        missing: impl FnOnce() -> String,
    ) -> Result<T, PlatformError> {
        let rows: Vec<T> = Self::execute(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound(missing()))
    }

    /// Check that the platform answers at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST API is unreachable or rejects the key.
    pub async fn health_check(&self) -> Result<(), PlatformError> {
        let request = self
            .table(Method::GET, "colonies", None)?
            .query(&[("select", "id"), ("limit", "1")]);
        Self::execute_empty(request).await
    }

    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    /// Approved products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, PlatformError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let request = self.table(Method::GET, "products", None)?.query(&[
            ("select", PRODUCT_COLUMNS),
            ("status", eq(ProductStatus::Approved).as_str()),
            ("order", "created_at.desc"),
        ]);
        let products: Vec<Product> = Self::execute(request).await?;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Approved products flagged as featured.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list cannot be fetched.
    pub async fn featured_products(&self) -> Result<Vec<Product>, PlatformError> {
        Ok(self
            .list_products()
            .await?
            .into_iter()
            .filter(|p| p.featured)
            .collect())
    }

    /// Get a single product by ID, regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if no such product exists.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, PlatformError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self
            .table(Method::GET, "products", None)?
            .query(&[("select", PRODUCT_COLUMNS), ("id", eq(id).as_str())]);
        let product: Product =
            Self::fetch_one(request, || format!("Product not found: {id}")).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Approved products by one artist, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(artist_id = %artist_id))]
    pub async fn products_by_artist(
        &self,
        artist_id: &ProfileId,
    ) -> Result<Vec<Product>, PlatformError> {
        let request = self.table(Method::GET, "products", None)?.query(&[
            ("select", PRODUCT_COLUMNS),
            ("artist_id", eq(artist_id).as_str()),
            ("status", eq(ProductStatus::Approved).as_str()),
            ("order", "created_at.desc"),
        ]);
        Self::execute(request).await
    }

    /// Every product an artist has submitted, in any status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(artist_id = %artist_id))]
    pub async fn my_products(
        &self,
        token: &str,
        artist_id: &ProfileId,
    ) -> Result<Vec<Product>, PlatformError> {
        let request = self
            .table(Method::GET, "products", Some(token))?
            .query(&[
                ("select", PRODUCT_COLUMNS),
                ("artist_id", eq(artist_id).as_str()),
                ("order", "created_at.desc"),
            ]);
        Self::execute(request).await
    }

    /// Usernames of every profile, for labelling products with their artist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_artists(&self) -> Result<Vec<ArtistSummary>, PlatformError> {
        if let Some(CacheValue::Artists(artists)) = self.inner.cache.get(&CacheKey::Artists).await
        {
            debug!("Cache hit for artists");
            return Ok(artists);
        }

        let request = self
            .table(Method::GET, "profiles", None)?
            .query(&[("select", "id,username")]);
        let artists: Vec<ArtistSummary> = Self::execute(request).await?;

        self.inner
            .cache
            .insert(CacheKey::Artists, CacheValue::Artists(artists.clone()))
            .await;

        Ok(artists)
    }

    /// All colonies.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_colonies(&self) -> Result<Vec<Colony>, PlatformError> {
        if let Some(CacheValue::Colonies(colonies)) =
            self.inner.cache.get(&CacheKey::Colonies).await
        {
            debug!("Cache hit for colonies");
            return Ok(colonies);
        }

        let request = self
            .table(Method::GET, "colonies", None)?
            .query(&[("select", "*"), ("order", "name.asc")]);
        let colonies: Vec<Colony> = Self::execute(request).await?;

        self.inner
            .cache
            .insert(CacheKey::Colonies, CacheValue::Colonies(colonies.clone()))
            .await;

        Ok(colonies)
    }

    /// Get a colony by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if no colony has this slug.
    #[instrument(skip(self))]
    pub async fn get_colony(&self, slug: &str) -> Result<Colony, PlatformError> {
        let key = CacheKey::Colony(slug.to_owned());
        if let Some(CacheValue::Colony(colony)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for colony");
            return Ok(*colony);
        }

        let request = self
            .table(Method::GET, "colonies", None)?
            .query(&[("select", "*"), ("slug", eq(slug).as_str())]);
        let colony: Colony =
            Self::fetch_one(request, || format!("Colony not found: {slug}")).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Colony(Box::new(colony.clone())))
            .await;

        Ok(colony)
    }

    /// Approved products linked to a colony through `product_colony`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, colony), fields(colony = %colony.slug))]
    pub async fn colony_products(&self, colony: &Colony) -> Result<Vec<Product>, PlatformError> {
        let key = CacheKey::ColonyProducts(colony.slug.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for colony products");
            return Ok(products);
        }

        let embed = format!("product_id,products({PRODUCT_COLUMNS})");
        let request = self
            .table(Method::GET, "product_colony", None)?
            .query(&[("select", embed.as_str()), ("colony_id", eq(&colony.id).as_str())]);
        let rows: Vec<ColonyProductRow> = Self::execute(request).await?;

        let products: Vec<Product> = rows
            .into_iter()
            .filter_map(|row| row.products)
            .filter(|p| p.status == ProductStatus::Approved)
            .collect();

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Drop every cached catalog entry.
    pub async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Fetch a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if the profile does not exist.
    #[instrument(skip(self, token), fields(profile_id = %id))]
    pub async fn get_profile(&self, token: &str, id: &ProfileId) -> Result<Profile, PlatformError> {
        let request = self
            .table(Method::GET, "profiles", Some(token))?
            .query(&[("select", PROFILE_COLUMNS), ("id", eq(id).as_str())]);
        Self::fetch_one(request, || format!("Profile not found: {id}")).await
    }

    /// Fetch a public profile by username.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if no profile has this username.
    #[instrument(skip(self))]
    pub async fn get_profile_by_username(&self, username: &str) -> Result<Profile, PlatformError> {
        let request = self
            .table(Method::GET, "profiles", None)?
            .query(&[
                ("select", "id,username,role,avatar_url,bio"),
                ("username", eq(username).as_str()),
            ]);
        Self::fetch_one(request, || format!("Artist not found: {username}")).await
    }

    /// Whether no profile has claimed `username` yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn username_available(&self, username: &str) -> Result<bool, PlatformError> {
        let request = self
            .table(Method::GET, "profiles", None)?
            .query(&[("select", "id"), ("username", eq(username).as_str()), ("limit", "1")]);
        let rows: Vec<serde_json::Value> = Self::execute(request).await?;
        Ok(rows.is_empty())
    }

    /// Return the user's profile, creating a default one if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the insert fails.
    #[instrument(skip(self, token, new_profile), fields(profile_id = %new_profile.id))]
    pub async fn ensure_profile(
        &self,
        token: &str,
        new_profile: &NewProfile,
    ) -> Result<Profile, PlatformError> {
        match self.get_profile(token, &new_profile.id).await {
            Ok(profile) => return Ok(profile),
            Err(PlatformError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        tracing::info!("Creating missing profile");
        let request = self
            .table(Method::POST, "profiles", Some(token))?
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(new_profile);
        let profile =
            Self::fetch_one(request, || format!("Profile not created: {}", new_profile.id)).await?;
        self.inner.cache.invalidate(&CacheKey::Artists).await;
        Ok(profile)
    }

    /// Apply a partial update to a profile and return the new row.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if the row is missing or not
    /// visible to `token`.
    #[instrument(skip(self, token, update), fields(profile_id = %id))]
    pub async fn update_profile(
        &self,
        token: &str,
        id: &ProfileId,
        update: &ProfileUpdate,
    ) -> Result<Profile, PlatformError> {
        let request = self
            .table(Method::PATCH, "profiles", Some(token))?
            .query(&[("id", eq(id).as_str()), ("select", PROFILE_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(update);
        let profile = Self::fetch_one(request, || format!("Profile not found: {id}")).await?;
        if update.username.is_some() {
            self.inner.cache.invalidate(&CacheKey::Artists).await;
        }
        Ok(profile)
    }

    /// Flag a profile as asking for the artist role.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn request_artist(
        &self,
        token: &str,
        id: &ProfileId,
    ) -> Result<Profile, PlatformError> {
        let update = ProfileUpdate {
            artist_request: Some(true),
            ..ProfileUpdate::default()
        };
        self.update_profile(token, id, &update).await
    }

    /// All profiles (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_profiles(&self, token: &str) -> Result<Vec<Profile>, PlatformError> {
        let request = self
            .table(Method::GET, "profiles", Some(token))?
            .query(&[("select", PROFILE_COLUMNS)]);
        Self::execute(request).await
    }

    /// Change a profile's role.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_role(
        &self,
        token: &str,
        id: &ProfileId,
        role: UserRole,
    ) -> Result<Profile, PlatformError> {
        let update = ProfileUpdate {
            role: Some(role),
            ..ProfileUpdate::default()
        };
        self.update_profile(token, id, &update).await
    }

    // =========================================================================
    // Products (mutations drop the catalog cache)
    // =========================================================================

    /// Every product in any status, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_all_products(&self, token: &str) -> Result<Vec<Product>, PlatformError> {
        let request = self
            .table(Method::GET, "products", Some(token))?
            .query(&[("select", PRODUCT_COLUMNS), ("order", "created_at.desc")]);
        Self::execute(request).await
    }

    /// Insert a product submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected.
    #[instrument(skip(self, token, product), fields(title = %product.title))]
    pub async fn create_product(
        &self,
        token: &str,
        product: &NewProduct,
    ) -> Result<Product, PlatformError> {
        let request = self
            .table(Method::POST, "products", Some(token))?
            .query(&[("select", PRODUCT_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(product);
        let created =
            Self::fetch_one(request, || format!("Product not created: {}", product.title)).await?;
        self.invalidate_catalog().await;
        Ok(created)
    }

    /// Apply a partial update to a product and return the new row.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if the row is missing or not
    /// writable by `token`.
    #[instrument(skip(self, token, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, PlatformError> {
        let request = self
            .table(Method::PATCH, "products", Some(token))?
            .query(&[("id", eq(id).as_str()), ("select", PRODUCT_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(update);
        let product = Self::fetch_one(request, || format!("Product not found: {id}")).await?;
        self.invalidate_catalog().await;
        Ok(product)
    }

    /// Approve or reject a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_product_status(
        &self,
        token: &str,
        id: &ProductId,
        status: ProductStatus,
    ) -> Result<Product, PlatformError> {
        let update = ProductUpdate {
            status: Some(status),
            ..ProductUpdate::default()
        };
        self.update_product(token, id, &update).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: &ProductId) -> Result<(), PlatformError> {
        let request = self
            .table(Method::DELETE, "products", Some(token))?
            .query(&[("id", eq(id).as_str())]);
        Self::execute_empty(request).await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Public URL for an object in a public bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<Url, PlatformError> {
        Ok(self
            .inner
            .base_url
            .join(&format!("storage/v1/object/public/{bucket}/{path}"))?)
    }

    /// Upload an object and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is rejected (e.g., the path exists).
    #[instrument(skip(self, token, bytes), fields(size = bytes.len()))]
    pub async fn upload_object(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Url, PlatformError> {
        let request = self
            .request(
                Method::POST,
                &format!("storage/v1/object/{bucket}/{path}"),
                Some(token),
            )?
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        Self::execute_empty(request).await?;
        self.public_url(bucket, path)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Api` with the provider's message if the
    /// account already exists or the password is rejected.
    #[instrument(skip(self, email, password))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, PlatformError> {
        let request = self.request(Method::POST, "auth/v1/signup", None)?.json(&json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        }));
        Self::execute(request).await
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Unauthorized` for bad credentials.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, PlatformError> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)?
            .query(&[("grant_type", "password")])
            .json(&json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }));

        match Self::execute(request).await {
            // The auth API answers bad credentials with 400 invalid_grant
            Err(PlatformError::Api {
                status: 400,
                message,
            }) => Err(PlatformError::Unauthorized(message)),
            other => other,
        }
    }

    /// Revoke a session's tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn sign_out(&self, token: &str) -> Result<(), PlatformError> {
        let request = self.request(Method::POST, "auth/v1/logout", Some(token))?;
        Self::execute_empty(request).await
    }

    /// The user a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Unauthorized` if the token is invalid or expired.
    #[instrument(skip(self, token))]
    pub async fn get_user(&self, token: &str) -> Result<AuthUser, PlatformError> {
        let request = self.request(Method::GET, "auth/v1/user", Some(token))?;
        Self::execute(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(url: &str) -> PlatformConfig {
        PlatformConfig {
            url: Url::parse(url).unwrap(),
            anon_key: SecretString::from("anon"),
            service_key: None,
            cache_ttl: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_eq_filter() {
        assert_eq!(eq("abc"), "eq.abc");
        assert_eq!(eq(ProductStatus::Approved), "eq.approved");
    }

    #[test]
    fn test_public_url_keeps_base_path() {
        let client = PlatformClient::new(&config("https://proj.example.co/platform"));
        let url = client.public_url(AVATARS_BUCKET, "u1-abc.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proj.example.co/platform/storage/v1/object/public/avatars/u1-abc.png"
        );
    }

    #[test]
    fn test_public_url_root_base() {
        let client = PlatformClient::new(&config("https://proj.example.co"));
        let url = client.public_url(PRODUCT_IMAGES_BUCKET, "x.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proj.example.co/storage/v1/object/public/product-images/x.jpg"
        );
    }
}

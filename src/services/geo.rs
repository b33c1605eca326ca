//! Best-effort location for the registration form: precise position with
//! reverse geocoding, falling back to coordinates and then to IP lookup.

use crate::core::config::LocationConfig;
use crate::services::notice::NoticeLevel;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub const LOCATING: &str = "正在获取位置...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("您的浏览器不支持地理定位")]
    Unsupported,
    #[error("用户拒绝了地理定位请求")]
    PermissionDenied,
    #[error("位置信息不可用")]
    PositionUnavailable,
    #[error("获取位置超时")]
    Timeout,
    #[error("发生未知错误")]
    Unknown,
}

impl LocationError {
    /// Maps a `GeolocationPositionError.code`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::PositionUnavailable,
            3 => LocationError::Timeout,
            _ => LocationError::Unknown,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub trait GeoBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> GeoBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait GeoBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> GeoBounds for T {}

/// Platform positioning (browser geolocation or nothing).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PositionSource: GeoBounds {
    async fn current_position(&self) -> std::result::Result<Coordinates, LocationError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait GeoLookup: GeoBounds {
    /// Human-readable address for `coords`, `None` when the service has none.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>>;
    /// Coarse `city, region, country` from the caller's IP, `None` on a failed lookup.
    async fn ip_location(&self) -> Result<Option<String>>;
}

#[derive(Deserialize, Debug)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct IpResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
    #[serde(default)]
    country: String,
}

impl IpResponse {
    fn into_location(self) -> Option<String> {
        (self.status == "success")
            .then(|| format!("{}, {}, {}", self.city, self.region_name, self.country))
    }
}

pub struct HttpGeoLookup {
    config: LocationConfig,
    client: reqwest::Client,
}

impl HttpGeoLookup {
    pub fn new(config: &LocationConfig) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        #[cfg(target_arch = "wasm32")]
        let client = reqwest::Client::new();

        Self {
            config: config.clone(),
            client,
        }
    }

    fn reverse_url(&self, coords: Coordinates) -> Result<Url> {
        Url::parse_with_params(
            &self.config.reverse_geocode_url,
            &[
                ("format", "json".to_string()),
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ],
        )
        .with_context(|| format!("invalid reverse geocode url {}", self.config.reverse_geocode_url))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl GeoLookup for HttpGeoLookup {
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>> {
        let url = self.reverse_url(coords)?;
        let text = self
            .client
            .get(url)
            .send()
            .await
            .context("reverse geocode request failed")?
            .text()
            .await?;
        let resp: ReverseResponse =
            serde_json::from_str(&text).context("failed to parse reverse geocode response")?;
        Ok(resp.display_name.filter(|s| !s.is_empty()))
    }

    async fn ip_location(&self) -> Result<Option<String>> {
        let text = self
            .client
            .get(&self.config.ip_lookup_url)
            .send()
            .await
            .context("IP lookup request failed")?
            .text()
            .await?;
        let resp: IpResponse = serde_json::from_str(&text).context("failed to parse IP lookup response")?;
        Ok(resp.into_location())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Reverse-geocoded precise position.
    Address,
    /// Precise position, geocoding failed.
    Coordinates,
    /// Coarse IP-based fallback.
    Ip,
}

impl LocationSource {
    pub fn status_message(self) -> &'static str {
        match self {
            LocationSource::Address => "位置已获取",
            LocationSource::Coordinates => "位置获取完成（仅坐标）",
            LocationSource::Ip => "使用IP定位",
        }
    }

    pub fn level(self) -> NoticeLevel {
        match self {
            LocationSource::Address => NoticeLevel::Success,
            LocationSource::Coordinates => NoticeLevel::Warning,
            LocationSource::Ip => NoticeLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub address: String,
    pub source: LocationSource,
}

impl LocationFix {
    pub fn status_message(&self) -> &'static str {
        self.source.status_message()
    }
}

pub struct LocationService {
    position: Arc<dyn PositionSource>,
    lookup: Arc<dyn GeoLookup>,
}

impl LocationService {
    pub fn new(position: Arc<dyn PositionSource>, lookup: Arc<dyn GeoLookup>) -> Self {
        Self { position, lookup }
    }

    /// Resolves a location string for the registration form.
    ///
    /// Without positioning support at all there is no fallback. Any other
    /// position error tries the IP lookup and, when that fails too, returns
    /// the original position error.
    pub async fn locate(&self) -> std::result::Result<LocationFix, LocationError> {
        match self.position.current_position().await {
            Ok(coords) => Ok(self.describe(coords).await),
            Err(LocationError::Unsupported) => Err(LocationError::Unsupported),
            Err(err) => {
                log::warn!("Precise location failed ({}), trying IP lookup", err);
                match self.lookup.ip_location().await {
                    Ok(Some(address)) => Ok(LocationFix {
                        address,
                        source: LocationSource::Ip,
                    }),
                    Ok(None) => Err(err),
                    Err(e) => {
                        log::error!("IP lookup failed: {:#}", e);
                        Err(err)
                    }
                }
            }
        }
    }

    async fn describe(&self, coords: Coordinates) -> LocationFix {
        match self.lookup.reverse_geocode(coords).await {
            Ok(address) => LocationFix {
                address: address.unwrap_or_else(|| coords.to_string()),
                source: LocationSource::Address,
            },
            Err(e) => {
                log::error!("Reverse geocoding failed: {:#}", e);
                LocationFix {
                    address: coords.to_string(),
                    source: LocationSource::Coordinates,
                }
            }
        }
    }
}

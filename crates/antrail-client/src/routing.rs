//! OSRM-compatible routing collaborator.
//!
//! Asks `/route/v1/{profile}/{lng},{lat};{lng},{lat}` for the full GeoJSON
//! geometry between two nodes. Only meaningful for geographic graphs:
//! points are read as `x = longitude`, `y = latitude`.

use crate::error::{ClientError, ClientResult};
use antrail_core::error::ResolutionFailure;
use antrail_core::types::Point;
use antrail_runtime::async_runtime::RouteProvider;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Road-following routes from an OSRM server.
pub struct OsrmRouter {
    base: Url,
    profile: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OsrmRouter {
    pub fn new(config: RouterConfig) -> ClientResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| ClientError::Config(format!("router url {:?}: {}", config.url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "router url {:?} cannot carry a path",
                config.url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base,
            profile: config.profile,
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    fn route_url(&self, from: Point, to: Point) -> Url {
        let coordinates = format!("{},{};{},{}", from.x, from.y, to.x, to.y);
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["route", "v1", self.profile.as_str(), coordinates.as_str()]);
        }
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        url
    }

    /// The routed polyline from `from` to `to`.
    pub async fn fetch_route(&self, from: Point, to: Point) -> ClientResult<Vec<Point>> {
        let url = self.route_url(from, to);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.base.as_str(), self.timeout_secs))?;

        let status = response.status();
        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if !status.is_success() || body.code != "Ok" {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body.message.unwrap_or(body.code),
            });
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("router returned no routes".into()))?;
        let points: Vec<Point> = route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| Point::new(lng, lat))
            .collect();
        debug!(%url, points = points.len(), "route fetched");
        Ok(points)
    }
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    async fn route(&self, from: Point, to: Point) -> Result<Vec<Point>, ResolutionFailure> {
        self.fetch_route(from, to)
            .await
            .map_err(|e| ResolutionFailure::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_lng_lat_pairs() {
        let router = OsrmRouter::new(RouterConfig {
            url: "http://router.local/osrm/".into(),
            ..RouterConfig::default()
        })
        .unwrap();
        let url = router.route_url(Point::new(105.85, 21.02), Point::new(105.86, 21.04));
        assert_eq!(
            url.as_str(),
            "http://router.local/osrm/route/v1/driving/105.85,21.02;105.86,21.04?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn rejects_unusable_urls() {
        let err = OsrmRouter::new(RouterConfig {
            url: "not a url".into(),
            ..RouterConfig::default()
        });
        assert!(matches!(err, Err(ClientError::Config(_))));
    }
}

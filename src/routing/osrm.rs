use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::models::driver::GeoPoint;
use crate::models::route::RouteLeg;
use crate::routing::{RouteError, RoutingProvider};

pub const OSRM_ROUTE_API_PATH: &str = "/route/v1/driving/";

pub struct OsrmRouteProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl OsrmRouteProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RouteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RouteError::Request(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, origin: &GeoPoint, destination: &GeoPoint) -> String {
        format!(
            "{}{}{},{};{},{}",
            self.endpoint,
            OSRM_ROUTE_API_PATH,
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat,
        )
    }
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64, // metres
    duration: f64, // seconds
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<Vec<f64>>, // [lng, lat]
}

pub(crate) fn parse_route_response(body: &str) -> Result<RouteLeg, RouteError> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|err| RouteError::Malformed(err.to_string()))?;

    if response.code != "Ok" {
        return Err(RouteError::NoRoute);
    }

    let route = response.routes.into_iter().next().ok_or(RouteError::NoRoute)?;

    let waypoints = route
        .geometry
        .coordinates
        .iter()
        .map(|c| match c.as_slice() {
            [lng, lat, ..] => Ok(GeoPoint::new(*lat, *lng)),
            _ => Err(RouteError::Malformed(format!("coordinate {c:?} is not a [lng, lat] pair"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !(route.distance.is_finite() && route.duration.is_finite()) {
        return Err(RouteError::Malformed("non-finite distance or duration".to_string()));
    }

    Ok(RouteLeg {
        waypoints,
        distance_meters: route.distance,
        duration_seconds: route.duration,
    })
}

#[async_trait]
impl RoutingProvider for OsrmRouteProvider {
    async fn compute_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteLeg, RouteError> {
        let url = self.route_url(&origin, &destination);
        debug!(%url, "requesting osrm route");

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await
            .map_err(|err| RouteError::Request(err.to_string()))?;

        // OSRM answers NoRoute with a 400 and a JSON body, so the body is parsed
        // regardless of the status code.
        let body = response
            .text()
            .await
            .map_err(|err| RouteError::Request(err.to_string()))?;

        parse_route_response(&body)
    }
}

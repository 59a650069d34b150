//! Place-name resolution.
//!
//! Multi-match responses always resolve to the provider's top-ranked
//! candidate. Two towns sharing a name are not disambiguated by country or
//! region; callers needing that should pass a more specific query.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    error::PlaceError,
    fetcher::bounded,
    model::{PlaceQuery, ResolvedPlace},
    provider::WeatherProvider,
};

pub async fn resolve_place(
    provider: &dyn WeatherProvider,
    query: &PlaceQuery,
    timeout: Duration,
) -> Result<ResolvedPlace, PlaceError> {
    debug!(place = %query, "Resolving place");

    let candidates = match bounded(timeout, provider.search_places(query.as_str(), timeout)).await {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(place = %query, error = %err, "Place lookup failed");
            return Err(PlaceError::not_found(query.as_str()));
        }
    };

    let Some(top) = candidates.into_iter().next() else {
        debug!(place = %query, "Place lookup returned no matches");
        return Err(PlaceError::not_found(query.as_str()));
    };

    debug!(
        place = %query,
        location_id = %top.id,
        matched = %top.name,
        "Resolved to ({:.4}, {:.4})",
        top.latitude,
        top.longitude
    );

    Ok(ResolvedPlace {
        name: query.as_str().to_string(),
        location_id: top.id,
        latitude: top.latitude,
        longitude: top.longitude,
    })
}

//! The parcel resolution pipeline.

use std::sync::Arc;
use std::time::Duration;

use parcel_map_arcgis::{ArcGisFeatureService, FeatureService, FeatureSet, RawFeature};
use parcel_map_geocoder::AddressLocator;
use parcel_map_geocoder::locator::ArcGisLocator;
use parcel_map_parcel_models::config::{SearchConfig, ServiceConfig};
use parcel_map_parcel_models::{
    GeocodeCandidate, LocatorInput, ParcelAttributes, ParcelFeature, ParcelResolution, Polygon,
    ResolutionMetadata, ResolvedFeature, SearchParams, SearchTier, ZoningAttributes,
    ZoningFeature,
};
use parcel_map_spatial::{is_web_mercator, project_polygon};

use crate::ResolveError;
use crate::disambiguate::{self, ParcelDisambiguator};
use crate::search::{SearchKey, TierContext, plan_tier};
use crate::service_registry::build_http_client;
use crate::zoning;

/// Resolves a property's location to parcel (and zoning) polygons.
///
/// Holds no per-request state, so one resolver is shared by every
/// request handler.
pub struct ParcelResolver {
    locator: Arc<dyn AddressLocator>,
    parcels: Arc<dyn FeatureService>,
    zoning: Arc<dyn FeatureService>,
    disambiguator: Box<dyn ParcelDisambiguator>,
    default_state: String,
    locator_wkid: u32,
    zoning_envelope_wkid: u32,
    search: SearchConfig,
}

impl std::fmt::Debug for ParcelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParcelResolver")
            .field("default_state", &self.default_state)
            .field("locator_wkid", &self.locator_wkid)
            .field("zoning_envelope_wkid", &self.zoning_envelope_wkid)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl ParcelResolver {
    /// Creates a resolver over the given upstream services.
    #[must_use]
    pub fn new(
        config: &ServiceConfig,
        locator: Arc<dyn AddressLocator>,
        parcels: Arc<dyn FeatureService>,
        zoning: Arc<dyn FeatureService>,
    ) -> Self {
        Self {
            locator,
            parcels,
            zoning,
            disambiguator: disambiguate::from_config(&config.disambiguation),
            default_state: config.default_state.clone(),
            locator_wkid: config.locator.wkid,
            zoning_envelope_wkid: config.zoning.envelope_wkid,
            search: config.search.clone(),
        }
    }

    /// Creates a resolver talking to the `ArcGIS` services in `config`
    /// over one shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.http)?;

        let locator = ArcGisLocator::new(
            client.clone(),
            config.locator.url.as_str(),
            config.locator.wkid,
            Duration::from_secs(config.locator.timeout_secs),
        );
        let parcels = ArcGisFeatureService::new(
            client.clone(),
            config.parcels.url.as_str(),
            Duration::from_secs(config.parcels.timeout_secs),
            "parcels",
        );
        let zoning = ArcGisFeatureService::new(
            client,
            config.zoning.url.as_str(),
            Duration::from_secs(config.zoning.timeout_secs),
            "zoning",
        );

        log::info!(
            "Parcel resolver for {} ({} / {} / {})",
            config.name,
            config.locator.url,
            config.parcels.url,
            config.zoning.url
        );

        Ok(Self::new(
            config,
            Arc::new(locator),
            Arc::new(parcels),
            Arc::new(zoning),
        ))
    }

    /// Replaces the lot-search disambiguation strategy.
    #[must_use]
    pub fn with_disambiguator(mut self, disambiguator: Box<dyn ParcelDisambiguator>) -> Self {
        self.disambiguator = disambiguator;
        self
    }

    /// Resolves `input` to parcels, plus zoning districts when a parcel
    /// lies in unorganized territory.
    ///
    /// Upstream calls are made one at a time. Dropping the returned
    /// future cancels whichever call is in flight.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::InsufficientAddressInformation`] if the input has
    ///   neither a full street address nor a place name. No upstream call
    ///   is made.
    /// * [`ResolveError::UpstreamServiceUnavailable`] if a parcel query
    ///   fails.
    /// * [`ResolveError::NoParcelDataFound`] if every tier came back
    ///   empty.
    /// * [`ResolveError::Unexpected`] if parcel attributes cannot be
    ///   decoded.
    pub async fn resolve(&self, input: &LocatorInput) -> Result<ParcelResolution, ResolveError> {
        let key = SearchKey::from_input(input, &self.default_state)
            .ok_or(ResolveError::InsufficientAddressInformation)?;

        log::info!("Resolving parcels for '{}'", key.text);

        let geocode = self.geocode(&key.text).await;

        let ctx = TierContext {
            street_address: input.street_address(),
            town: Some(key.town.as_str()),
            geocode: geocode.as_ref(),
            locator_wkid: self.locator_wkid,
            search: &self.search,
        };

        let (parcels, tier) = self.search_parcels(&ctx).await?;
        if parcels.is_empty() {
            log::info!("No parcels found for '{}'", key.text);
            return Err(ResolveError::NoParcelDataFound);
        }

        let zoning = self.zoning_overlay(&parcels).await;

        log::info!(
            "Resolved '{}': {} parcels via {tier} search, {} zoning districts",
            key.text,
            parcels.len(),
            zoning.len()
        );

        let metadata = ResolutionMetadata {
            geocoded: geocode.is_some(),
            geocode_score: geocode.as_ref().map(|g| g.score),
            matched_address: geocode.as_ref().map(|g| g.matched_address.clone()),
            parcel_count: parcels.len(),
            zoning_count: zoning.len(),
            search_tier: tier,
            search_params: SearchParams {
                street_address: input.street_address.clone(),
                city: input.city.clone(),
                state: input.state.clone(),
                place_name: input.place_name.clone(),
                search_text: key.text,
                town: Some(key.town),
            },
        };

        let features = parcels
            .into_iter()
            .map(ResolvedFeature::Parcel)
            .chain(zoning.into_iter().map(ResolvedFeature::Zoning))
            .collect();

        Ok(ParcelResolution { features, metadata })
    }

    async fn geocode(&self, text: &str) -> Option<GeocodeCandidate> {
        match self.locator.find_best_candidate(text).await {
            Ok(Some(candidate)) => {
                log::debug!(
                    "Geocoded '{text}' to '{}' (score {})",
                    candidate.matched_address,
                    candidate.score
                );
                Some(candidate)
            }
            Ok(None) => {
                log::debug!("No geocode candidates for '{text}'");
                None
            }
            Err(e) => {
                log::warn!("Geocoding '{text}' failed, continuing without a location: {e}");
                None
            }
        }
    }

    /// Runs tiers in order until one yields parcels. Returns the last tier
    /// tried alongside whatever it found.
    async fn search_parcels(
        &self,
        ctx: &TierContext<'_>,
    ) -> Result<(Vec<ParcelFeature>, SearchTier), ResolveError> {
        let mut tier = SearchTier::FIRST;
        let mut last_tried = tier;

        while tier != SearchTier::Exhausted {
            let Some(query) = plan_tier(tier, ctx) else {
                log::debug!("Skipping {tier} search");
                tier = tier.next(true);
                continue;
            };

            last_tried = tier;
            let set = self.parcels.query(&query).await.map_err(|e| {
                log::error!("Parcel {tier} search failed: {e}");
                ResolveError::UpstreamServiceUnavailable(e)
            })?;

            if set.exceeded_transfer_limit {
                log::debug!("Parcel {tier} search hit the transfer limit");
            }

            let mut parcels = decode_parcels(set)?;
            log::debug!("Parcel {tier} search returned {}", parcels.len());

            if tier == SearchTier::Lot
                && let Some(street) = ctx.street_address
            {
                parcels = disambiguate::narrow(self.disambiguator.as_ref(), street, parcels);
            }

            if !parcels.is_empty() {
                return Ok((parcels, tier));
            }
            tier = tier.next(true);
        }

        Ok((Vec::new(), last_tried))
    }

    async fn zoning_overlay(&self, parcels: &[ParcelFeature]) -> Vec<ZoningFeature> {
        if !zoning::needs_overlay(parcels, &self.search.zoning_trigger_tokens) {
            return Vec::new();
        }
        let Some(envelope) = zoning::parcel_envelope(parcels) else {
            log::debug!("Parcels have no geometry, skipping zoning overlay");
            return Vec::new();
        };

        let query = zoning::plan_query(
            envelope,
            self.zoning_envelope_wkid,
            self.search.zoning_max_records,
        );

        match self.zoning.query(&query).await {
            Ok(set) => decode_zoning(set),
            Err(e) => {
                log::warn!("Zoning overlay failed, returning parcels only: {e}");
                Vec::new()
            }
        }
    }
}

fn geometry(rings: Vec<parcel_map_spatial::Ring>, wkid: Option<u32>) -> Polygon {
    match wkid {
        Some(wkid) if is_web_mercator(wkid) => Polygon {
            rings: project_polygon(&rings),
        },
        _ => Polygon { rings },
    }
}

fn decode_parcels(set: FeatureSet) -> Result<Vec<ParcelFeature>, ResolveError> {
    let wkid = set.wkid;
    set.features
        .into_iter()
        .map(|RawFeature { attributes, rings }| {
            let mut attributes: ParcelAttributes =
                serde_json::from_value(serde_json::Value::Object(attributes))?;
            attributes.fill_aliases();
            Ok(ParcelFeature {
                attributes,
                geometry: geometry(rings, wkid),
            })
        })
        .collect()
}

fn decode_zoning(set: FeatureSet) -> Vec<ZoningFeature> {
    let wkid = set.wkid;
    set.features
        .into_iter()
        .filter_map(|RawFeature { attributes, rings }| {
            match serde_json::from_value::<ZoningAttributes>(serde_json::Value::Object(attributes))
            {
                Ok(mut attributes) => {
                    attributes.fill_aliases();
                    Some(ZoningFeature {
                        attributes,
                        geometry: geometry(rings, wkid),
                    })
                }
                Err(e) => {
                    log::warn!("Skipping undecodable zoning feature: {e}");
                    None
                }
            }
        })
        .collect()
}

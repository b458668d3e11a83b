use futures::{stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;

use crate::{
    configuration::ParcelApiSettings,
    domain::{
        county::County,
        permit::{EnrichedPermit, LookupFailure, ParcelGeoInfo, ParcelLookup, PermitRecord},
    },
};

const OUT_FIELDS: &str = "LATITUDE,LONGITUDE,PSTLADRESS";

/// Geocodes parcels against the statewide parcel feature service.
#[derive(Clone)]
pub struct ParcelEnricher {
    client: Client,
    url: String,
    concurrency: usize,
}

#[derive(Serialize)]
struct FeatureQuery<'a> {
    #[serde(rename = "where")]
    predicate: String,
    #[serde(rename = "outFields")]
    out_fields: &'a str,
    #[serde(rename = "returnGeometry")]
    return_geometry: &'a str,
    f: &'a str,
}

#[derive(Deserialize)]
struct FeatureQueryResponse {
    #[serde(default)]
    features: Vec<Feature>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Feature {
    attributes: ParcelAttributes,
}

#[derive(Deserialize)]
struct ParcelAttributes {
    #[serde(
        rename = "LATITUDE",
        default,
        deserialize_with = "deserialize_option_number_from_string"
    )]
    latitude: Option<f64>,
    #[serde(
        rename = "LONGITUDE",
        default,
        deserialize_with = "deserialize_option_number_from_string"
    )]
    longitude: Option<f64>,
    #[serde(rename = "PSTLADRESS", default, deserialize_with = "non_empty_string")]
    mailing_address: Option<String>,
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// `PARCELID='<id>' AND CONAME='<COUNTY>'`, with quotes in the id doubled.
pub fn parcel_predicate(parcel_id: &str, county: County) -> String {
    format!(
        "PARCELID='{}' AND CONAME='{}'",
        parcel_id.replace('\'', "''"),
        county.as_str()
    )
}

impl ParcelEnricher {
    pub fn new(settings: &ParcelApiSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout()).build()?;

        Ok(ParcelEnricher {
            client,
            url: settings.query_url.clone(),
            concurrency: settings.concurrency.max(1),
        })
    }

    pub async fn lookup(&self, parcel_id: &str, county: County) -> ParcelLookup {
        let query = FeatureQuery {
            predicate: parcel_predicate(parcel_id, county),
            out_fields: OUT_FIELDS,
            return_geometry: "false",
            f: "json",
        };

        let response = match self.client.get(&self.url).query(&query).send().await {
            Ok(res) => res,
            Err(e) => {
                log::warn!("Parcel lookup for {} failed: {:?}", parcel_id, e);
                return ParcelLookup::Unresolved(LookupFailure::Transport);
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("Parcel lookup for {} returned {}", parcel_id, status);
            return ParcelLookup::Unresolved(LookupFailure::Status(status.as_u16()));
        }

        let body = match response.json::<FeatureQueryResponse>().await {
            Ok(json) => json,
            Err(e) => {
                log::warn!(
                    "Error when deserializing parcel {} response: {:?}",
                    parcel_id,
                    e
                );
                return ParcelLookup::Unresolved(LookupFailure::Malformed);
            }
        };

        if let Some(error) = body.error {
            log::warn!("Parcel service error for {}: {}", parcel_id, error);
            return ParcelLookup::Unresolved(LookupFailure::ServiceError);
        }

        match body.features.into_iter().next() {
            Some(feature) => ParcelLookup::Resolved(ParcelGeoInfo {
                latitude: feature.attributes.latitude,
                longitude: feature.attributes.longitude,
                mailing_address: feature.attributes.mailing_address,
            }),
            None => {
                log::warn!("No parcel {} in {}", parcel_id, county);
                ParcelLookup::Unresolved(LookupFailure::NoMatch)
            }
        }
    }

    /// Looks up every record's parcel, keeping at most `concurrency` requests
    /// in flight. Output order matches `records`; duplicates are looked up
    /// once per row.
    pub async fn enrich_all(
        &self,
        records: Vec<PermitRecord>,
        county: County,
    ) -> Vec<EnrichedPermit> {
        stream::iter(records)
            .map(|record| async move {
                let parcel = self.lookup(&record.parcel_number, county).await;
                EnrichedPermit { record, parcel }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

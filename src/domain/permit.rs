use std::fmt;

use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitRecord {
    pub permit_type: String,
    pub parcel_number: String,
    pub owner: String,
    pub property_address: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelGeoInfo {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub mailing_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    Transport,
    Status(u16),
    Malformed,
    ServiceError,
    NoMatch,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::Transport => f.write_str("request failed"),
            LookupFailure::Status(code) => write!(f, "http status {}", code),
            LookupFailure::Malformed => f.write_str("malformed payload"),
            LookupFailure::ServiceError => f.write_str("service returned an error"),
            LookupFailure::NoMatch => f.write_str("no matching parcel"),
        }
    }
}

/// Outcome of one parcel lookup. Failures stay visible as `Unresolved`
/// instead of being flattened into empty fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ParcelLookup {
    Resolved(ParcelGeoInfo),
    Unresolved(LookupFailure),
}

impl ParcelLookup {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ParcelLookup::Resolved(_))
    }

    pub fn geo(&self) -> Option<&ParcelGeoInfo> {
        match self {
            ParcelLookup::Resolved(geo) => Some(geo),
            ParcelLookup::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPermit {
    pub record: PermitRecord,
    pub parcel: ParcelLookup,
}

impl EnrichedPermit {
    pub fn latitude(&self) -> Option<f64> {
        self.parcel.geo().and_then(|g| g.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.parcel.geo().and_then(|g| g.longitude)
    }

    pub fn mailing_address(&self) -> Option<&str> {
        self.parcel.geo().and_then(|g| g.mailing_address.as_deref())
    }

    pub fn map_link(&self) -> String {
        map_link(&self.record.property_address)
    }
}

pub fn map_link(address: &str) -> String {
    match address.trim() {
        "" => String::new(),
        addr => format!("https://maps.google.com/?q={}", addr.replace(' ', "+")),
    }
}

pub const EXPORT_HEADER: [&str; 8] = [
    "Permit Type",
    "Parcel Number",
    "Owner",
    "Property Address",
    "Latitude",
    "Longitude",
    "Mailing Address",
    "Map Link",
];

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Comma-separated export of the enriched table, header first, CRLF line ends.
pub fn export_csv(permits: &[EnrichedPermit]) -> String {
    let mut out = EXPORT_HEADER.iter().map(|h| csv_field(h)).join(",");
    out.push_str("\r\n");

    for permit in permits {
        let row = [
            permit.record.permit_type.clone(),
            permit.record.parcel_number.clone(),
            permit.record.owner.clone(),
            permit.record.property_address.clone(),
            optional_number(permit.latitude()),
            optional_number(permit.longitude()),
            permit.mailing_address().unwrap_or_default().to_string(),
            permit.map_link(),
        ];
        out.push_str(&row.iter().map(|f| csv_field(f)).join(","));
        out.push_str("\r\n");
    }

    out
}

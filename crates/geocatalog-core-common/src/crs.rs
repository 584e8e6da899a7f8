//! Coordinate reference system identifiers.
//!
//! Only the authority/code pair is tracked. Formats expose their CRS in different
//! encodings (URNs, OGC URLs, WKT `AUTHORITY` nodes, GeoTIFF keys); the helpers here
//! reduce each of them to that pair.

use std::fmt;

use gdal::spatial_ref::SpatialRef;

/// An authority-qualified CRS identifier such as `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs {
    /// Naming authority, upper case (e.g. `EPSG`).
    pub authority: String,
    /// Code within the authority (e.g. `4326`).
    pub code: String,
}

impl Crs {
    /// Creates an `EPSG` identifier.
    #[must_use]
    pub fn epsg(code: u32) -> Self {
        Self {
            authority: "EPSG".to_string(),
            code: code.to_string(),
        }
    }

    /// WGS 84 geographic coordinates, the implied CRS of RFC 7946 `GeoJSON`.
    #[must_use]
    pub fn wgs84() -> Self {
        Self::epsg(4326)
    }

    /// Parses a textual CRS identifier.
    ///
    /// Accepts `EPSG:3857`, `urn:ogc:def:crs:EPSG::3857`,
    /// `http://www.opengis.net/def/crs/EPSG/0/3857` and the `CRS84` aliases,
    /// which map to `EPSG:4326`.
    ///
    /// ```
    /// use geocatalog_core_common::Crs;
    ///
    /// assert_eq!(Crs::from_identifier("urn:ogc:def:crs:EPSG::3857"), Some(Crs::epsg(3857)));
    /// assert_eq!(Crs::from_identifier("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(Crs::wgs84()));
    /// assert_eq!(Crs::from_identifier("local"), None);
    /// ```
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.to_ascii_uppercase().contains("CRS84") {
            return Some(Self::wgs84());
        }

        let parts: Vec<&str> = identifier
            .split([':', '/'])
            .filter(|part| !part.is_empty())
            .collect();
        let authority_idx = parts
            .iter()
            .position(|part| part.eq_ignore_ascii_case("EPSG"))?;

        parts[authority_idx + 1..]
            .iter()
            .rev()
            .find(|part| part.chars().all(|c| c.is_ascii_digit()))
            .and_then(|code| code.parse::<u32>().ok())
            .map(Self::epsg)
    }

    /// Extracts the outermost authority code from a WKT1 or WKT2 definition.
    ///
    /// The top-level `AUTHORITY[...]` / `ID[...]` node is the last one in the text.
    #[must_use]
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let upper = wkt.to_ascii_uppercase();
        let start = ["AUTHORITY[", "ID["]
            .iter()
            .filter_map(|keyword| {
                upper.rmatch_indices(keyword).find_map(|(idx, _)| {
                    let preceded_by_name = upper[..idx]
                        .chars()
                        .next_back()
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                    (!preceded_by_name).then_some(idx + keyword.len())
                })
            })
            .max()?;

        let end = start + wkt[start..].find(']')?;
        let mut items = wkt[start..end]
            .split(',')
            .map(|item| item.trim().trim_matches('"').trim());
        let authority = items.next()?.to_ascii_uppercase();
        let code = items.next()?.to_string();
        if authority.is_empty() || code.is_empty() {
            return None;
        }
        Some(Self { authority, code })
    }

    /// Authority code of a GDAL spatial reference.
    ///
    /// The authority node is read directly when present; otherwise GDAL is asked to
    /// identify the matching EPSG code, which covers ESRI style `.prj` definitions.
    #[must_use]
    pub fn from_spatial_ref(spatial_ref: &SpatialRef) -> Option<Self> {
        if let Some(crs) = spatial_ref.to_wkt().ok().and_then(|wkt| Self::from_wkt(&wkt)) {
            return Some(crs);
        }
        let mut identified = spatial_ref.clone();
        identified.auto_identify_epsg().ok()?;
        identified
            .to_wkt()
            .ok()
            .and_then(|wkt| Self::from_wkt(&wkt))
    }

    /// The decimal digits of the code, used in geometry descriptors like `Point/4326`.
    #[must_use]
    pub fn code_digits(&self) -> String {
        self.code.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

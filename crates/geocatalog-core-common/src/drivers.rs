//! Driver definitions shared between the registry and the format crates.
//!
//! A driver names a file format (e.g. `GeoJSON`, `GTiff`), the file extensions it
//! is resolved from, and whether its schema can currently be read.

/// Support status for a specific driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The feature is fully supported and implemented.
    Supported,
    /// The feature is not supported by the driver.
    NotSupported,
    /// The feature is planned for future implementation.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if the operation is fully supported and implemented.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns `true` if the operation is supported or planned (i.e., not explicitly unsupported).
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, SupportStatus::NotSupported)
    }

    /// Returns the string representation of this support status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

/// Whether a driver produces vector layers or a raster profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Feature data organised in one or more layers.
    Vector,
    /// Gridded data described by a single profile.
    Raster,
}

impl DriverKind {
    /// Returns the display label for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Vector => "Vector",
            DriverKind::Raster => "Raster",
        }
    }
}

/// Capabilities of a driver.
///
/// `info` covers reading a vector layer schema or a raster profile. A driver whose
/// `info` is not supported is still resolved from its extension, but its files
/// are skipped during a scan.
#[derive(Debug, Clone, Copy)]
pub struct DriverCapabilities {
    /// Support status for reading the schema or profile of a file.
    pub info: SupportStatus,
}

/// Geospatial file format driver definition.
#[derive(Debug, Clone)]
pub struct Driver {
    /// Short name used for identification and as the catalog database name (e.g. `"ESRI Shapefile"`).
    pub short_name: &'static str,
    /// Long descriptive name for display purposes.
    pub long_name: &'static str,
    /// Vector or raster.
    pub kind: DriverKind,
    /// Lowercase file extensions (without the dot) that resolve to this driver.
    pub extensions: &'static [&'static str],
    /// Operations supported by this driver.
    pub capabilities: DriverCapabilities,
}

impl Driver {
    /// Creates a new driver definition.
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        kind: DriverKind,
        extensions: &'static [&'static str],
        info: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            kind,
            extensions,
            capabilities: DriverCapabilities { info },
        }
    }

    /// Returns `true` if `extension` (any case, without the dot) belongs to this driver.
    #[must_use]
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_status() {
        assert!(SupportStatus::Supported.is_supported());
        assert!(!SupportStatus::Planned.is_supported());
        assert!(SupportStatus::Planned.is_available());
        assert!(!SupportStatus::NotSupported.is_available());
        assert_eq!(SupportStatus::NotSupported.as_str(), "Not Supported");
    }

    #[test]
    fn test_matches_extension_is_case_insensitive() {
        let driver = Driver::new(
            "GTiff",
            "GeoTIFF",
            DriverKind::Raster,
            &["tif", "tiff"],
            SupportStatus::Supported,
        );
        assert!(driver.matches_extension("TIF"));
        assert!(driver.matches_extension("tiff"));
        assert!(!driver.matches_extension("png"));
        assert!(driver.capabilities.info.is_supported());
    }
}

//! Schema descriptions produced by the format readers.
//!
//! Vector layers and raster profiles are both flattened to an ordered list of
//! `(key, value)` properties. Vector keys are attribute names whose values are native
//! type strings (`str:80`, `int`, `float:24.15`, ...) plus an optional `geometry`
//! entry; raster keys are `#`-prefixed profile entries whose values are the profile
//! data itself.

use std::fmt;

use crate::crs::Crs;

/// Table name given to the single profile table of a raster file.
pub const RASTER_PROFILE_TABLE: &str = "profile";

/// Property key that carries the geometry descriptor of a vector layer.
pub const GEOMETRY_KEY: &str = "geometry";

/// One ordered `(key, value)` entry of a flattened schema.
pub type Property = (String, String);

/// A single attribute of a vector layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Attribute name.
    pub name: String,
    /// Native type string, e.g. `str:254`, `int:10`, `float`, `date`.
    pub field_type: String,
}

impl FieldSchema {
    /// Creates a field description.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Attribute schema of one vector layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSchema {
    /// Layer name.
    pub name: String,
    /// Attributes in file order.
    pub fields: Vec<FieldSchema>,
    /// Geometry type (`Point`, `3D Polygon`, `Unknown`, ...). `None` for attribute-only layers.
    pub geometry: Option<String>,
    /// CRS of the geometry, when known.
    pub crs: Option<Crs>,
}

impl LayerSchema {
    /// Creates an attribute-only layer with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            geometry: None,
            crs: None,
        }
    }

    /// Geometry descriptor in the form `<type>/<crs digits>`, e.g. `Point/4326`.
    ///
    /// The digit part is empty when the CRS is unknown.
    #[must_use]
    pub fn geometry_descriptor(&self) -> Option<String> {
        let geometry = self.geometry.as_deref()?;
        if geometry == "None" {
            return None;
        }
        let digits = self.crs.as_ref().map(Crs::code_digits).unwrap_or_default();
        Some(format!("{geometry}/{digits}"))
    }

    /// Flattens the layer to its ordered properties: every field, then `geometry`.
    ///
    /// An attribute literally named `geometry` is replaced by the geometry entry.
    #[must_use]
    pub fn properties(&self) -> Vec<Property> {
        let descriptor = self.geometry_descriptor();
        let mut properties: Vec<Property> = self
            .fields
            .iter()
            .filter(|field| descriptor.is_none() || field.name != GEOMETRY_KEY)
            .map(|field| (field.name.clone(), field.field_type.clone()))
            .collect();
        if let Some(descriptor) = descriptor {
            properties.push((GEOMETRY_KEY.to_string(), descriptor));
        }
        properties
    }
}

/// Metadata of a raster file.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProfile {
    /// CRS of the grid, when georeferenced.
    pub crs: Option<Crs>,
    /// Number of bands.
    pub count: u32,
    /// Pixel size as `(x, y)` in CRS units.
    pub res: (f64, f64),
    /// Number of columns.
    pub width: u64,
    /// Number of rows.
    pub height: u64,
}

impl RasterProfile {
    /// Flattens the profile to `#crs`, `#count`, `#res`, `#width`, `#height`.
    #[must_use]
    pub fn properties(&self) -> Vec<Property> {
        let crs = self
            .crs
            .as_ref()
            .map_or_else(|| "None".to_string(), ToString::to_string);
        vec![
            ("#crs".to_string(), crs),
            ("#count".to_string(), self.count.to_string()),
            (
                "#res".to_string(),
                format!("[{:?}, {:?}]", self.res.0, self.res.1),
            ),
            ("#width".to_string(), self.width.to_string()),
            ("#height".to_string(), self.height.to_string()),
        ]
    }
}

/// Everything read from one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSchema {
    /// Layers of a vector file.
    Vector(Vec<LayerSchema>),
    /// Profile of a raster file.
    Raster(RasterProfile),
}

impl FileSchema {
    /// Table name → flattened properties, in table order.
    ///
    /// Vector files yield one table per layer; raster files a single
    /// [`RASTER_PROFILE_TABLE`].
    #[must_use]
    pub fn tables(&self) -> Vec<(String, Vec<Property>)> {
        match self {
            FileSchema::Vector(layers) => layers
                .iter()
                .map(|layer| (layer.name.clone(), layer.properties()))
                .collect(),
            FileSchema::Raster(profile) => {
                vec![(RASTER_PROFILE_TABLE.to_string(), profile.properties())]
            },
        }
    }
}

impl fmt::Display for LayerSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LayerSchema(name={}, fields={}, geometry={})",
            self.name,
            self.fields.len(),
            self.geometry.as_deref().unwrap_or("None")
        )
    }
}

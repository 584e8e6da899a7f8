//! Ingestion source lifecycle.
//!
//! A [`Source`] is created from configuration, prepared once (which performs the
//! scan), asked for its creation requests and closed. [`SpatialSource`] is the
//! geospatial file connector: it scans a local directory, a single local file, or
//! a single remote file addressed by URL.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tempfile::NamedTempFile;
use url::Url;

use crate::catalog::{CatalogBuilder, CreateRequest, SchemaNaming};
use crate::config::ConnectorConfig;
use crate::error::{GeoCatalogError, IoError, IoErrorExt, RemoteError, Result, ScanError};
use crate::scan::{CatalogData, ScanOptions, scan_directory, scan_file, scan_file_as};

/// An ingestion source.
#[async_trait]
pub trait Source: Send {
    /// Reads the source. Must be called before [`Source::requests`].
    async fn prepare(&mut self) -> Result<()>;

    /// Creation requests in emission order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotPrepared`] before a successful `prepare`.
    fn requests(&self) -> Result<Vec<CreateRequest>>;

    /// Checks that the configured location is reachable.
    async fn test_connection(&self) -> Result<()>;

    /// Releases scanned data and temporary files.
    fn close(&mut self);
}

/// Where the data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A local file or directory.
    Local(PathBuf),
    /// A URL naming a single file.
    Remote(Url),
}

impl Location {
    /// Parses the configured search location.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] for malformed remote locations.
    pub fn parse(search_directory: &str, remote: bool) -> Result<Self> {
        if !remote {
            return Ok(Location::Local(PathBuf::from(search_directory)));
        }
        let url = Url::parse(search_directory).map_err(|source| RemoteError::InvalidUrl {
            url: search_directory.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" | "file" => Ok(Location::Remote(url)),
            scheme => Err(RemoteError::UnsupportedScheme {
                url: url.to_string(),
                scheme: scheme.to_string(),
            }
            .into()),
        }
    }
}

/// Geospatial file connector.
#[derive(Debug)]
pub struct SpatialSource {
    config: ConnectorConfig,
    location: Location,
    options: ScanOptions,
    naming: SchemaNaming,
    data: Option<CatalogData>,
    download: Option<NamedTempFile>,
}

impl SpatialSource {
    /// Validates `config` and creates the source.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `search_directory` is missing, or a remote
    /// error when it is not a fetchable URL in remote mode.
    pub fn create(config: ConnectorConfig) -> Result<Self> {
        let search_directory = config.require_search_directory()?;
        let location = Location::parse(search_directory, config.remote)?;
        let options = config.scan_options();
        debug!("Skip list: {:?}", options.skip_list);

        Ok(Self {
            config,
            location,
            options,
            naming: SchemaNaming::FileStem,
            data: None,
            download: None,
        })
    }

    /// The configuration this source was created with.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// The scanned data, once prepared.
    #[must_use]
    pub fn data(&self) -> Option<&CatalogData> {
        self.data.as_ref()
    }

    async fn prepare_local(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(IoError::FileNotFound { path }.into());
        }

        if path.is_file() {
            info!("Reading single file {}", path.display());
            self.naming = SchemaNaming::FileStem;
            self.data = Some(scan_file(&path)?);
        } else if path.is_dir() {
            info!("Scanning directory {}", path.display());
            self.naming = SchemaNaming::RelativeTo(path.clone());
            let options = self.options.clone();
            let data = tokio::task::spawn_blocking(move || scan_directory(&path, &options))
                .await
                .map_err(|e| GeoCatalogError::Other(e.into()))??;
            self.data = Some(data);
        } else {
            return Err(IoError::InvalidPath {
                path,
                reason: "not a regular file or directory".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn prepare_remote(&mut self, url: Url) -> Result<()> {
        self.naming = SchemaNaming::FileStem;
        let key = PathBuf::from(url.as_str());

        if url.scheme() == "file" {
            let path = url.to_file_path().map_err(|()| RemoteError::MissingFileName {
                url: url.to_string(),
            })?;
            info!("Reading remote file {}", path.display());
            self.data = Some(scan_file_as(&path, key)?);
            return Ok(());
        }

        let download = fetch(&url).await?;
        info!("Fetched {url} into {}", download.path().display());
        self.data = Some(scan_file_as(download.path(), key)?);
        self.download = Some(download);
        Ok(())
    }
}

/// File name addressed by a URL path.
fn url_file_name(url: &Url) -> Result<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            RemoteError::MissingFileName {
                url: url.to_string(),
            }
            .into()
        })
}

/// Downloads `url` into a temporary file that keeps the remote extension, so the
/// driver can be resolved from it.
async fn fetch(url: &Url) -> Result<NamedTempFile> {
    let file_name = url_file_name(url)?;
    let suffix = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let fetch_error = |source| RemoteError::Fetch {
        url: url.to_string(),
        source,
    };
    let response = reqwest::get(url.clone())
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(fetch_error)?;
    let bytes = response.bytes().await.map_err(fetch_error)?;
    debug!("Downloaded {} bytes from {url}", bytes.len());

    let mut download = tempfile::Builder::new()
        .prefix("geocatalog-")
        .suffix(&suffix)
        .tempfile()
        .with_write_context("remote download", std::env::temp_dir())?;
    download
        .write_all(&bytes)
        .with_write_context("remote download", download.path().to_path_buf())?;
    Ok(download)
}

#[async_trait]
impl Source for SpatialSource {
    async fn prepare(&mut self) -> Result<()> {
        self.data = None;
        match self.location.clone() {
            Location::Local(path) => self.prepare_local(path).await?,
            Location::Remote(url) => self.prepare_remote(url).await?,
        }
        if let Some(data) = &self.data {
            info!(
                "Prepared {} file(s) and {} table(s)",
                data.file_count(),
                data.table_count()
            );
        }
        Ok(())
    }

    fn requests(&self) -> Result<Vec<CreateRequest>> {
        let data = self.data.as_ref().ok_or(ScanError::NotPrepared)?;
        Ok(CatalogBuilder::new(&self.config, self.naming.clone()).requests(data))
    }

    async fn test_connection(&self) -> Result<()> {
        match &self.location {
            Location::Local(path) => {
                if path.exists() {
                    Ok(())
                } else {
                    Err(IoError::FileNotFound { path: path.clone() }.into())
                }
            },
            Location::Remote(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|()| RemoteError::MissingFileName {
                    url: url.to_string(),
                })?;
                if path.is_file() {
                    Ok(())
                } else {
                    Err(IoError::FileNotFound { path }.into())
                }
            },
            Location::Remote(url) => url_file_name(url).map(|_| ()),
        }
    }

    fn close(&mut self) {
        self.data = None;
        if let Some(download) = self.download.take() {
            debug!("Removing {}", download.path().display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_create_requires_search_directory() {
        let mut config = ConnectorConfig::new("spatial", "");
        config.search_directory = None;
        let err = SpatialSource::create(config).unwrap_err();
        assert!(matches!(
            err,
            GeoCatalogError::Config(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn test_remote_locations() {
        assert!(matches!(
            Location::parse("https://example.com/data/cities.geojson", true).unwrap(),
            Location::Remote(_)
        ));
        assert_eq!(
            Location::parse("/data", false).unwrap(),
            Location::Local(PathBuf::from("/data"))
        );
        let err = Location::parse("not a url", true).unwrap_err();
        assert!(matches!(
            err,
            GeoCatalogError::Remote(RemoteError::InvalidUrl { .. })
        ));
        let err = Location::parse("ftp://example.com/a.tif", true).unwrap_err();
        assert!(err.to_string().contains("Unsupported URL scheme 'ftp'"));
    }

    #[test]
    fn test_url_file_name() {
        let url = Url::parse("https://example.com/data/cities.geojson?x=1").unwrap();
        assert_eq!(url_file_name(&url).unwrap(), "cities.geojson");
        let url = Url::parse("https://example.com/data/").unwrap();
        assert!(url_file_name(&url).is_err());
    }

    #[test]
    fn test_requests_before_prepare() {
        let source = SpatialSource::create(ConnectorConfig::new("spatial", "/data")).unwrap();
        let err = source.requests().unwrap_err();
        assert!(matches!(err, GeoCatalogError::Scan(ScanError::NotPrepared)));
    }

    #[tokio::test]
    async fn test_prepare_missing_path() {
        let mut source =
            SpatialSource::create(ConnectorConfig::new("spatial", "/definitely/not/here"))
                .unwrap();
        assert!(source.test_connection().await.is_err());
        let err = source.prepare().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Source data path does not exist: '/definitely/not/here'"
        );
    }

    #[tokio::test]
    async fn test_remote_connection_check() {
        let config =
            ConnectorConfig::new("spatial", "https://example.com/cities.geojson").with_remote(true);
        let source = SpatialSource::create(config).unwrap();
        assert!(source.test_connection().await.is_ok());

        let config = ConnectorConfig::new("spatial", "https://example.com/").with_remote(true);
        let source = SpatialSource::create(config).unwrap();
        assert!(source.test_connection().await.is_err());
    }
}

//! Loading the station collection from a JSON export, on disk or over HTTP, with a local
//! binary cache for remote sources.

use crate::stations::error::CatalogError;
use crate::types::station::Station;
use async_compression::tokio::bufread::GzipDecoder;
use bincode::config::{Configuration, Fixint, LittleEndian};
use futures_util::TryStreamExt;
use reqwest::Client;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BINCODE_CACHE_SUFFIX: &str = ".stations.bin";
const CACHE_NAME_PREFIX_LEN: usize = 32;
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Where the station collection comes from.
///
/// Both variants hold a JSON array of station records (see [`Station`] for the record
/// layout), optionally gzip-compressed. Compression is detected from the gzip magic bytes,
/// so a `.gz` file served with `Content-Encoding: gzip` is only decompressed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationSource {
    /// A local file.
    File(PathBuf),
    /// An HTTP(S) URL.
    Url(String),
}

/// Loads station collections and caches remote ones under a cache directory.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    cache_dir: PathBuf,
}

impl StationCatalog {
    pub fn new(cache_dir: &Path) -> Self {
        StationCatalog {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Loads all stations from `source`.
    ///
    /// Local files are always read directly. URL sources are served from the bincode cache
    /// when one exists, unless `refresh` is set, in which case they are downloaded again and
    /// the cache is rewritten.
    pub async fn load(
        &self,
        source: &StationSource,
        refresh: bool,
    ) -> Result<Vec<Station>, CatalogError> {
        match source {
            StationSource::File(path) => Self::read_file(path).await,
            StationSource::Url(url) => {
                let cache_file = self.cache_file_for(url);
                if !refresh && cache_file.exists() {
                    let path_clone = cache_file.clone();
                    let stations =
                        tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone))
                            .await??;
                    log::info!(
                        "Loaded {} stations from cache {}",
                        stations.len(),
                        cache_file.display()
                    );
                    Ok(stations)
                } else {
                    log::info!("Fetching station list from {}", url);
                    let stations = Self::fetch_stations(url).await?;
                    Self::cache_stations(stations.clone(), &cache_file).await?;
                    Ok(stations)
                }
            }
        }
    }

    /// Parses a JSON array of station records.
    pub fn parse_stations(json: &[u8]) -> Result<Vec<Station>, CatalogError> {
        Ok(serde_json::from_slice::<Vec<Station>>(json)?)
    }

    /// The cache file used for a URL source.
    ///
    /// The name is a short readable prefix taken from the URL's last path segment followed by
    /// a hash of the full URL, so distinct URLs get distinct files and the name length is
    /// bounded.
    pub fn cache_file_for(&self, url: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let url_hash = hasher.finish();

        let last_segment = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let prefix: String = last_segment
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(CACHE_NAME_PREFIX_LEN)
            .collect();
        let prefix = if prefix.is_empty() { "stations".to_string() } else { prefix };

        self.cache_dir
            .join(format!("{}-{:016x}{}", prefix, url_hash, BINCODE_CACHE_SUFFIX))
    }

    async fn read_file(path: &Path) -> Result<Vec<Station>, CatalogError> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| CatalogError::FileRead(path.to_path_buf(), e))?;
        let json = read_all(&raw[..]).await?;
        let stations = Self::parse_blocking(json).await?;
        log::info!(
            "Loaded {} stations from {}",
            stations.len(),
            path.display()
        );
        Ok(stations)
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, CatalogError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| CatalogError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded_stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| CatalogError::CacheDecode(cache_path.to_path_buf(), Box::from(e)))?;
        Ok(decoded_stations)
    }

    async fn fetch_stations(url: &str) -> Result<Vec<Station>, CatalogError> {
        let client = Client::new();
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => CatalogError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => CatalogError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        let stream = response.bytes_stream().map_err(io::Error::other);
        let stream_reader = StreamReader::new(stream);
        let json = read_all(BufReader::new(stream_reader)).await?;

        let parse_start = std::time::Instant::now();
        let stations = Self::parse_blocking(json).await?;
        log::info!(
            "Parsed {} stations from JSON in {:?}",
            stations.len(),
            parse_start.elapsed()
        );
        Ok(stations)
    }

    async fn parse_blocking(json: Vec<u8>) -> Result<Vec<Station>, CatalogError> {
        tokio::task::spawn_blocking(move || Self::parse_stations(&json)).await?
    }

    async fn cache_stations(stations: Vec<Station>, cache_path: &Path) -> Result<(), CatalogError> {
        let cache_start = std::time::Instant::now();
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| CatalogError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(cache_path, &bincode_data)
            .await
            .map_err(|e| CatalogError::CacheWrite(cache_path.to_path_buf(), e))?;
        log::info!(
            "Serialized and wrote cache ({} bytes) to {} in {:?}",
            bincode_data.len(),
            cache_path.display(),
            cache_start.elapsed()
        );
        Ok(())
    }
}

// Reads the whole body, gunzipping it when it starts with the gzip magic bytes.
async fn read_all<R>(mut reader: R) -> io::Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let is_gzip = reader.fill_buf().await?.starts_with(&GZIP_MAGIC);
    let mut buffer = Vec::new();
    if is_gzip {
        let mut decoder = GzipDecoder::new(reader);
        decoder.read_to_end(&mut buffer).await?;
    } else {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::StationLocation;
    use async_compression::tokio::bufread::GzipEncoder;
    use tempfile::tempdir;

    const STATIONS_JSON: &str = r#"[
        {"id": "066062", "name": "Sydney (Observatory Hill)", "state": "NSW",
         "latitude": -33.8607, "longitude": 151.205, "record_count": 3650,
         "avg_rainfall": 3.36, "avg_evapotranspiration": 3.9,
         "date_range_start": "2014-01-01", "date_range_end": "2023-12-31"},
        {"station_code": "061055", "station_name": "Newcastle Nobbys", "state": "NSW",
         "latitude": -32.9184, "longitude": 151.7985, "record_count": 1200,
         "date_range_start": "", "date_range_end": ""},
        {"id": "999999", "name": "Unmatched", "state": "VIC",
         "latitude": null, "longitude": null}
    ]"#;

    async fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzipEncoder::new(bytes);
        let mut out = Vec::new();
        encoder.read_to_end(&mut out).await.unwrap();
        out
    }

    fn assert_expected_stations(stations: &[Station]) {
        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].id, "066062");
        assert_eq!(stations[1].id, "061055");
        assert_eq!(stations[1].name, "Newcastle Nobbys");
        assert_eq!(stations[2].location, StationLocation::Unlocated);
    }

    #[test]
    fn test_parse_stations() {
        let stations = StationCatalog::parse_stations(STATIONS_JSON.as_bytes()).unwrap();
        assert_expected_stations(&stations);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = StationCatalog::parse_stations(b"{not json").unwrap_err();
        assert!(matches!(err, CatalogError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_load_plain_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("stations.json");
        tokio::fs::write(&path, STATIONS_JSON).await?;

        let catalog = StationCatalog::new(dir.path());
        let stations = catalog.load(&StationSource::File(path), false).await?;
        assert_expected_stations(&stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_gzip_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("stations.json.gz");
        tokio::fs::write(&path, gzip(STATIONS_JSON.as_bytes()).await).await?;

        let catalog = StationCatalog::new(dir.path());
        let stations = catalog.load(&StationSource::File(path), false).await?;
        assert_expected_stations(&stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempdir().unwrap();
        let catalog = StationCatalog::new(dir.path());
        let err = catalog
            .load(&StationSource::File(dir.path().join("nope.json")), false)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::FileRead(_, _)));
    }

    #[tokio::test]
    async fn test_cache_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let stations = StationCatalog::parse_stations(STATIONS_JSON.as_bytes())?;
        let cache_path = dir.path().join("roundtrip.bin");

        StationCatalog::cache_stations(stations.clone(), &cache_path).await?;
        let cached = StationCatalog::get_cached_stations(&cache_path)?;
        assert_eq!(cached, stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_url_source_served_from_cache() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        // Nothing listens on the discard port, so this only passes if the cache is used.
        let url = "http://127.0.0.1:9/stations.json.gz";
        let stations = StationCatalog::parse_stations(STATIONS_JSON.as_bytes())?;
        StationCatalog::cache_stations(stations.clone(), &catalog.cache_file_for(url)).await?;

        let loaded = catalog.load(&StationSource::Url(url.to_string()), false).await?;
        assert_eq!(loaded, stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        let url = "http://127.0.0.1:9/stations.json.gz";
        let stations = StationCatalog::parse_stations(STATIONS_JSON.as_bytes())?;
        StationCatalog::cache_stations(stations, &catalog.cache_file_for(url)).await?;

        let err = catalog
            .load(&StationSource::Url(url.to_string()), true)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NetworkRequest(_, _)));
        Ok(())
    }

    #[test]
    fn test_cache_file_name() {
        let catalog = StationCatalog::new(Path::new("/tmp/cache"));
        let path = catalog.cache_file_for("https://example.org/bom/stations.json.gz");
        assert_eq!(path.parent(), Some(Path::new("/tmp/cache")));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("stationsjsongz-"), "{}", name);
        assert!(name.ends_with(BINCODE_CACHE_SUFFIX), "{}", name);
        // Stable for the same URL.
        assert_eq!(path, catalog.cache_file_for("https://example.org/bom/stations.json.gz"));
    }

    #[test]
    fn test_cache_file_distinct_for_similar_urls() {
        let catalog = StationCatalog::new(Path::new("/tmp/cache"));
        let dash = catalog.cache_file_for("http://127.0.0.1:9/nsw-stations.json");
        let underscore = catalog.cache_file_for("http://127.0.0.1:9/nsw_stations.json");
        let query = catalog.cache_file_for("http://127.0.0.1:9/nsw-stations.json?state=vic");
        assert_ne!(dash, underscore);
        assert_ne!(dash, query);
    }

    #[tokio::test]
    async fn test_similar_urls_do_not_share_cache() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        let nsw_url = "http://127.0.0.1:9/nsw-stations.json";
        let other_url = "http://127.0.0.1:9/nsw_stations.json";
        let stations = StationCatalog::parse_stations(STATIONS_JSON.as_bytes())?;
        StationCatalog::cache_stations(stations, &catalog.cache_file_for(nsw_url)).await?;

        // Only the first URL is cached; the second has to hit the (closed) network.
        let err = catalog
            .load(&StationSource::Url(other_url.to_string()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NetworkRequest(_, _)));
        Ok(())
    }

    #[tokio::test]
    async fn test_long_url_cache_file_is_writable() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        let url = format!(
            "http://127.0.0.1:9/{}/stations.json?filter={}",
            "d".repeat(200),
            "a".repeat(300)
        );
        let cache_file = catalog.cache_file_for(&url);
        let name_len = cache_file.file_name().unwrap().len();
        assert!(name_len < 100, "cache file name is {} bytes", name_len);

        let stations = StationCatalog::parse_stations(STATIONS_JSON.as_bytes())?;
        StationCatalog::cache_stations(stations.clone(), &cache_file).await?;
        let loaded = catalog.load(&StationSource::Url(url), false).await?;
        assert_eq!(loaded, stations);
        Ok(())
    }

    // Answers a single HTTP request with `body` and the given extra headers, then closes.
    async fn serve_once(
        extra_headers: &'static str,
        body: Vec<u8>,
    ) -> Result<String, Box<dyn std::error::Error>> {
        use tokio::io::AsyncWriteExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            let mut response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
                body.len(),
                extra_headers
            )
            .into_bytes();
            response.extend_from_slice(&body);
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        Ok(format!("http://{}", address))
    }

    #[tokio::test]
    async fn test_download_gzip_body_and_cache_it() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        let base = serve_once(
            "Content-Type: application/gzip\r\n",
            gzip(STATIONS_JSON.as_bytes()).await,
        )
        .await?;
        let url = format!("{}/stations.json.gz", base);
        let source = StationSource::Url(url.clone());

        let stations = catalog.load(&source, false).await?;
        assert_expected_stations(&stations);

        // The server is gone after one response, so this load must come from the cache.
        assert!(catalog.cache_file_for(&url).exists());
        let cached = catalog.load(&source, false).await?;
        assert_eq!(cached, stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_download_plain_json() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        let base = serve_once(
            "Content-Type: application/json\r\n",
            STATIONS_JSON.as_bytes().to_vec(),
        )
        .await?;

        let stations = catalog
            .load(&StationSource::Url(format!("{}/stations", base)), false)
            .await?;
        assert_expected_stations(&stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_download_gz_file_with_content_encoding() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        let catalog = StationCatalog::new(dir.path());
        // The transport encoding is removed by the HTTP client, leaving plain JSON behind a
        // `.gz` URL.
        let base = serve_once(
            "Content-Type: application/json\r\nContent-Encoding: gzip\r\n",
            gzip(STATIONS_JSON.as_bytes()).await,
        )
        .await?;

        let stations = catalog
            .load(&StationSource::Url(format!("{}/stations.json.gz", base)), false)
            .await?;
        assert_expected_stations(&stations);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_all_detects_gzip() -> Result<(), Box<dyn std::error::Error>> {
        let compressed = gzip(STATIONS_JSON.as_bytes()).await;
        assert_eq!(read_all(&compressed[..]).await?, STATIONS_JSON.as_bytes());
        assert_eq!(
            read_all(STATIONS_JSON.as_bytes()).await?,
            STATIONS_JSON.as_bytes()
        );
        assert!(read_all(&b""[..]).await?.is_empty());
        Ok(())
    }
}

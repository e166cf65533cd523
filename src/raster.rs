//! Raster decoding through GDAL.
//!
//! The decoder is loaded lazily by [`RasterDecoder`]; a failed load is
//! remembered but retried on the next request.

use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::error::{ConvertError, Result};
use crate::model::RasterGrid;

const GTIFF_DRIVER: &str = "GTiff";

/// Anything that can hand out the first band of an elevation raster.
pub trait RasterSource {
    fn read_raster(&self, path: &Path) -> Result<RasterGrid>;
}

/// A loaded raster driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderHandle {
    pub driver: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderState {
    Unloaded,
    Ready(DecoderHandle),
    Failed(String),
}

type Loader = Box<dyn Fn() -> Result<DecoderHandle> + Send + Sync>;

/// Owned, lazily loaded raster decoder.
///
/// `load` is idempotent. The state lock is held for the duration of a load,
/// so concurrent first callers wait for the one in-flight attempt and then
/// see its outcome.
pub struct RasterDecoder {
    state: Mutex<DecoderState>,
    loader: Loader,
}

impl RasterDecoder {
    /// Decoder backed by GDAL's GTiff driver.
    pub fn new() -> Self {
        Self::with_loader(load_gtiff_driver)
    }

    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<DecoderHandle> + Send + Sync + 'static,
    {
        Self {
            state: Mutex::new(DecoderState::Unloaded),
            loader: Box::new(loader),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn load(&self) -> Result<DecoderHandle> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let DecoderState::Ready(handle) = &*state {
            return Ok(handle.clone());
        }

        if let DecoderState::Failed(reason) = &*state {
            debug!("Retrying raster decoder load after failure: {}", reason);
        }

        match (self.loader)() {
            Ok(handle) => {
                info!("Raster decoder ready: {} ({})", handle.driver, handle.description);
                *state = DecoderState::Ready(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                warn!("Failed to load raster decoder: {}", e);
                *state = DecoderState::Failed(e.to_string());
                Err(e)
            }
        }
    }
}

impl Default for RasterDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RasterDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterDecoder")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn load_gtiff_driver() -> Result<DecoderHandle> {
    DriverManager::register_all();
    let driver = DriverManager::get_driver_by_name(GTIFF_DRIVER).map_err(|e| {
        ConvertError::RasterUnavailable(format!("failed to load {} driver: {}", GTIFF_DRIVER, e))
    })?;

    Ok(DecoderHandle {
        driver: driver.short_name(),
        description: driver.long_name(),
    })
}

/// Reads GeoTIFF rasters through a shared [`RasterDecoder`].
#[derive(Debug, Clone)]
pub struct GdalRasterSource {
    decoder: Arc<RasterDecoder>,
}

impl GdalRasterSource {
    pub fn new(decoder: Arc<RasterDecoder>) -> Self {
        Self { decoder }
    }
}

impl RasterSource for GdalRasterSource {
    fn read_raster(&self, path: &Path) -> Result<RasterGrid> {
        let handle = self.decoder.load()?;
        let drivers = [handle.driver.as_str()];

        let dataset = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_READONLY,
                allowed_drivers: Some(&drivers),
                ..Default::default()
            },
        )
        .map_err(|e| unavailable(path, "failed to open", e))?;

        let (width, height) = dataset.raster_size();
        let band = dataset
            .rasterband(1)
            .map_err(|e| unavailable(path, "no band data in", e))?;

        let buffer = band
            .read_as::<f64>((0, 0), (width, height), (width, height), None)
            .map_err(|e| unavailable(path, "failed to read band 1 of", e))?;
        let (_, cells) = buffer.into_shape_and_vec();

        if cells.len() != width * height {
            return Err(ConvertError::RasterUnavailable(format!(
                "{}: band has {} values, expected {}x{}",
                path.display(),
                cells.len(),
                width,
                height
            )));
        }

        debug!("Decoded {:?}: {}x{}", path, width, height);
        Ok(RasterGrid::new(width, height, cells))
    }
}

fn unavailable(path: &Path, what: &str, e: gdal::errors::GdalError) -> ConvertError {
    ConvertError::RasterUnavailable(format!("{} {}: {}", what, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn handle() -> DecoderHandle {
        DecoderHandle {
            driver: "GTiff".to_string(),
            description: "GeoTIFF".to_string(),
        }
    }

    #[test]
    fn test_load_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let decoder = RasterDecoder::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(handle())
        });

        assert_eq!(decoder.state(), DecoderState::Unloaded);
        assert_eq!(decoder.load().unwrap(), handle());
        assert_eq!(decoder.load().unwrap(), handle());
        assert_eq!(decoder.state(), DecoderState::Ready(handle()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let decoder = RasterDecoder::with_loader(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ConvertError::RasterUnavailable("offline".to_string()))
            } else {
                Ok(handle())
            }
        });

        assert!(matches!(
            decoder.load(),
            Err(ConvertError::RasterUnavailable(_))
        ));
        assert!(matches!(decoder.state(), DecoderState::Failed(ref r) if r.contains("offline")));

        assert_eq!(decoder.load().unwrap(), handle());
        assert_eq!(decoder.state(), DecoderState::Ready(handle()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let decoder = Arc::new(RasterDecoder::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(20));
            Ok(handle())
        }));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let decoder = decoder.clone();
                thread::spawn(move || decoder.load().unwrap())
            })
            .collect();

        for worker in workers {
            assert_eq!(worker.join().unwrap(), handle());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_file_is_raster_unavailable() {
        let decoder = Arc::new(RasterDecoder::new());
        if decoder.load().is_err() {
            eprintln!("Skipping test: GTiff driver not available");
            return;
        }

        let source = GdalRasterSource::new(decoder);
        let err = source
            .read_raster(Path::new("/nonexistent/surface.tif"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::RasterUnavailable(_)));
    }
}

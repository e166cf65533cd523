//! Selection of the raster / world file pair to convert.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{ConvertError, Result};

/// A GeoTIFF and the world file that georeferences it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPair {
    pub raster: PathBuf,
    pub world_file: PathBuf,
}

impl InputPair {
    pub fn new(raster: impl Into<PathBuf>, world_file: impl Into<PathBuf>) -> Self {
        Self {
            raster: raster.into(),
            world_file: world_file.into(),
        }
    }

    /// Raster file name as selected, e.g. `dmr.tif`.
    pub fn raster_name(&self) -> String {
        file_name(&self.raster)
    }

    pub fn world_file_name(&self) -> String {
        file_name(&self.world_file)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

pub fn is_raster(path: &Path) -> bool {
    has_extension(path, &["tif", "tiff"])
}

pub fn is_world_file(path: &Path) -> bool {
    has_extension(path, &["tfw"])
}

/// Picks one raster and one world file with matching stems out of a selection.
pub fn pair_inputs(paths: &[PathBuf]) -> Result<InputPair> {
    if paths.is_empty() {
        return Err(ConvertError::MissingInputs);
    }
    if paths.len() > 2 {
        return Err(ConvertError::TooManyInputs { found: paths.len() });
    }

    let raster = paths
        .iter()
        .find(|p| is_raster(p))
        .ok_or(ConvertError::MissingRaster)?;
    let world_file = paths
        .iter()
        .find(|p| is_world_file(p))
        .ok_or(ConvertError::MissingWorldFile)?;

    if raster.file_stem() != world_file.file_stem() {
        return Err(ConvertError::MismatchedNames {
            raster: raster.clone(),
            world_file: world_file.clone(),
        });
    }

    Ok(InputPair::new(raster, world_file))
}

/// The `.tfw` next to a raster, if one exists.
pub fn world_file_for(raster: &Path) -> Option<PathBuf> {
    ["tfw", "TFW"]
        .iter()
        .map(|ext| raster.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Recursively finds every raster under `dir` that has a world file beside it.
pub fn collect_input_pairs(dir: &Path) -> Result<Vec<InputPair>> {
    let pairs = Mutex::new(Vec::new());

    let entries: std::result::Result<Vec<_>, _> = fs::read_dir(dir)?.collect();
    let entries = entries?;

    entries
        .into_par_iter()
        .try_for_each(|entry| -> Result<()> {
            let path = entry.path();

            if path.is_dir() {
                let sub_pairs = collect_input_pairs(&path)?;
                if !sub_pairs.is_empty() {
                    pairs
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend(sub_pairs);
                }
            } else if is_raster(&path) {
                match world_file_for(&path) {
                    Some(world_file) => pairs
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(InputPair::new(path, world_file)),
                    None => tracing::warn!("Skipping raster without world file: {:?}", path),
                }
            }
            Ok(())
        })?;

    let mut pairs = pairs.into_inner().unwrap_or_else(PoisonError::into_inner);
    pairs.sort_by(|a, b| a.raster.cmp(&b.raster));
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_pair_in_any_order() {
        let pair = pair_inputs(&paths(&["dmr.tfw", "dmr.tif"])).unwrap();
        assert_eq!(pair, InputPair::new("dmr.tif", "dmr.tfw"));

        let pair = pair_inputs(&paths(&["DMR.TIFF", "DMR.tfw"])).unwrap();
        assert_eq!(pair.raster_name(), "DMR.TIFF");
        assert_eq!(pair.world_file_name(), "DMR.tfw");
    }

    #[test]
    fn test_pairing_errors() {
        assert!(matches!(pair_inputs(&[]), Err(ConvertError::MissingInputs)));
        assert!(matches!(
            pair_inputs(&paths(&["a.tif", "a.tfw", "b.tif"])),
            Err(ConvertError::TooManyInputs { found: 3 })
        ));
        assert!(matches!(
            pair_inputs(&paths(&["a.tfw"])),
            Err(ConvertError::MissingRaster)
        ));
        assert!(matches!(
            pair_inputs(&paths(&["a.tif", "b.tif"])),
            Err(ConvertError::MissingWorldFile)
        ));
        assert!(matches!(
            pair_inputs(&paths(&["a.tif", "b.tfw"])),
            Err(ConvertError::MismatchedNames { .. })
        ));
    }

    #[test]
    fn test_world_file_discovery() {
        let temp_dir = TempDir::new().unwrap();
        let raster = temp_dir.path().join("cave.tif");
        fs::write(&raster, b"").unwrap();
        assert_eq!(world_file_for(&raster), None);

        let world_file = temp_dir.path().join("cave.tfw");
        fs::write(&world_file, "1\n0\n0\n-1\n0\n0\n").unwrap();
        assert_eq!(world_file_for(&raster), Some(world_file));
    }

    #[test]
    fn test_collect_input_pairs_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        for (dir, name) in [
            (temp_dir.path(), "a.tif"),
            (temp_dir.path(), "a.tfw"),
            (temp_dir.path(), "lonely.tif"),
            (temp_dir.path(), "notes.txt"),
            (sub.as_path(), "b.tiff"),
            (sub.as_path(), "b.tfw"),
        ] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let pairs = collect_input_pairs(temp_dir.path()).unwrap();
        assert_eq!(
            pairs,
            vec![
                InputPair::new(temp_dir.path().join("a.tif"), temp_dir.path().join("a.tfw")),
                InputPair::new(sub.join("b.tiff"), sub.join("b.tfw")),
            ]
        );
    }
}

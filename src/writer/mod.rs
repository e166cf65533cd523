use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::convert::ConversionOutput;

pub const LOG_FILENAME: &str = "debug.log";

#[derive(Default)]
pub struct SurfaceWriter {}

impl SurfaceWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// `<base>.th`, `<base>.txt` と `debug.log` を出力ディレクトリに書き込む
    pub fn write(&self, output: &ConversionOutput, output_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir).context(format!(
            "Failed to create output directory {}",
            output_dir.display()
        ))?;

        let mut written = Vec::new();
        for (name, content) in Self::entries(output) {
            let path = output_dir.join(&name);
            fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;
            tracing::info!("Written {:?}", path);
            written.push(path);
        }

        Ok(written)
    }

    /// 同じ3ファイルをZIPにまとめて書き込む
    pub fn write_archive(&self, output: &ConversionOutput, archive_path: &Path) -> Result<()> {
        let file = File::create(archive_path)
            .context(format!("Failed to create {}", archive_path.display()))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in Self::entries(output) {
            zip.start_file(name.as_str(), options)
                .context(format!("Failed to add {} to archive", name))?;
            zip.write_all(content.as_bytes())
                .context(format!("Failed to write {} to archive", name))?;
        }

        zip.finish().context("Failed to finish archive")?;
        tracing::info!("Written archive {:?}", archive_path);

        Ok(())
    }

    fn entries(output: &ConversionOutput) -> [(String, &str); 3] {
        [
            (output.th_filename(), output.th_content()),
            (output.txt_filename(), output.txt_content()),
            (LOG_FILENAME.to_string(), output.log.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{convert, ParsedInputs};
    use crate::coordinate_system::CoordinateSystem;
    use crate::model::{ConversionSettings, RasterGrid};
    use std::io::Read;
    use tempfile::TempDir;

    fn create_test_output() -> ConversionOutput {
        let parsed = ParsedInputs::from_parts(
            "cave.tif",
            "cave.tfw",
            "0.5\n0\n0\n-0.5\n-377168.25\n-1200776.25\n",
            RasterGrid::new(3, 2, vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0]),
        )
        .unwrap();
        convert(&parsed, &ConversionSettings::new(1, CoordinateSystem::Ijtsk))
    }

    #[test]
    fn test_write_surface_files() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("out");
        let output = create_test_output();

        let written = SurfaceWriter::new().write(&output, &output_dir).unwrap();
        assert_eq!(
            written,
            vec![
                output_dir.join("cave.th"),
                output_dir.join("cave.txt"),
                output_dir.join("debug.log"),
            ]
        );

        let th = fs::read_to_string(output_dir.join("cave.th")).unwrap();
        assert_eq!(th, output.th_content());
        assert!(th.contains(
            "  grid -377168.50000000 -1200777.00000000 0.500000000000 0.500000000000 3 2\n"
        ));

        let txt = fs::read_to_string(output_dir.join("cave.txt")).unwrap();
        assert_eq!(txt, "100.000 101.000 102.000\n103.000 104.000 105.000");
    }

    #[test]
    fn test_write_archive() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("cave.zip");
        let output = create_test_output();

        SurfaceWriter::new()
            .write_archive(&output, &archive_path)
            .unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);

        let mut log = String::new();
        archive
            .by_name("debug.log")
            .unwrap()
            .read_to_string(&mut log)
            .unwrap();
        assert_eq!(log, output.log);

        let mut txt = String::new();
        archive
            .by_name("cave.txt")
            .unwrap()
            .read_to_string(&mut txt)
            .unwrap();
        assert_eq!(txt, output.txt_content());
    }
}

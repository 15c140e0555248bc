//! .wfm binary file format reader/writer for stacking ensemble models.

use std::io::{Read, Write};
use std::path::Path;

use crate::model::StackingRegressor;
use crate::types::{ForecastError, ForecastResult};

/// Magic bytes: "WFMD"
const WFM_MAGIC: u32 = 0x57464D44;

/// Current format version.
const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 64;

/// Upper bound on payload size accepted by the reader (256 MiB).
const MAX_PAYLOAD_LEN: u64 = 256 * 1024 * 1024;

/// Writer for .wfm files.
pub struct ModelWriter;

/// Reader for .wfm files.
pub struct ModelReader;

impl ModelWriter {
    /// Write a model to a file, creating parent directories.
    pub fn write_to_file(model: &StackingRegressor, path: &Path) -> ForecastResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        Self::write_to(model, &mut file)
    }

    /// Write a model to any writer. The model is validated first.
    pub fn write_to<W: Write>(model: &StackingRegressor, writer: &mut W) -> ForecastResult<()> {
        model.validate()?;

        let payload = serde_json::to_vec(model)
            .map_err(|e| ForecastError::Storage(format!("Serialization failed: {e}")))?;

        let mut header = [0u8; HEADER_SIZE];
        write_u32(&mut header[0..4], WFM_MAGIC);
        write_u16(&mut header[4..6], FORMAT_VERSION);
        write_u16(&mut header[6..8], 0); // flags
        write_u32(&mut header[8..12], model.feature_names.len() as u32);
        write_u32(&mut header[12..16], model.estimators.len() as u32);
        write_u64(&mut header[16..24], payload.len() as u64);

        writer.write_all(&header)?;
        writer.write_all(&payload)?;

        Ok(())
    }
}

impl ModelReader {
    /// Read a model from a file.
    pub fn read_from_file(path: &Path) -> ForecastResult<StackingRegressor> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Read and validate a model from any reader.
    pub fn read_from<R: Read>(reader: &mut R) -> ForecastResult<StackingRegressor> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let magic = read_u32(&header[0..4]);
        if magic != WFM_MAGIC {
            return Err(ForecastError::Storage(format!(
                "Invalid magic: expected 0x{WFM_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = read_u16(&header[4..6]);
        if version != FORMAT_VERSION {
            return Err(ForecastError::Storage(format!(
                "Unsupported version: {version}"
            )));
        }

        let feature_count = read_u32(&header[8..12]) as usize;
        let estimator_count = read_u32(&header[12..16]) as usize;
        let payload_len = read_u64(&header[16..24]);
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(ForecastError::Storage(format!(
                "Payload of {payload_len} bytes exceeds limit of {MAX_PAYLOAD_LEN}"
            )));
        }

        let mut payload = vec![0u8; payload_len as usize];
        reader.read_exact(&mut payload)?;

        let model: StackingRegressor = serde_json::from_slice(&payload)
            .map_err(|e| ForecastError::Storage(format!("Deserialization failed: {e}")))?;

        if model.feature_names.len() != feature_count {
            return Err(ForecastError::Storage(format!(
                "Header declares {feature_count} features, payload has {}",
                model.feature_names.len()
            )));
        }
        if model.estimators.len() != estimator_count {
            return Err(ForecastError::Storage(format!(
                "Header declares {estimator_count} base estimators, payload has {}",
                model.estimators.len()
            )));
        }

        model.validate()?;
        Ok(model)
    }
}

// Little-endian byte helpers
fn write_u16(buf: &mut [u8], val: u16) {
    buf[..2].copy_from_slice(&val.to_le_bytes());
}
fn write_u32(buf: &mut [u8], val: u32) {
    buf[..4].copy_from_slice(&val.to_le_bytes());
}
fn write_u64(buf: &mut [u8], val: u64) {
    buf[..8].copy_from_slice(&val.to_le_bytes());
}
fn read_u16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_le_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_stack;
    use crate::model::Regressor;

    #[test]
    fn test_roundtrip_preserves_predictions() {
        let model = sample_stack(true);
        let mut buf = Vec::new();
        ModelWriter::write_to(&model, &mut buf).unwrap();

        let loaded = ModelReader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(
            loaded.predict(&[3.0, 4.0]).unwrap(),
            model.predict(&[3.0, 4.0]).unwrap()
        );
    }

    #[test]
    fn test_invalid_magic() {
        let mut buf = [0u8; HEADER_SIZE + 10];
        buf[0..4].copy_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        let result = ModelReader::read_from(&mut &buf[..]);
        assert!(matches!(result, Err(ForecastError::Storage(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let mut buf = Vec::new();
        ModelWriter::write_to(&sample_stack(false), &mut buf).unwrap();
        buf[4..6].copy_from_slice(&7u16.to_le_bytes());
        let err = ModelReader::read_from(&mut &buf[..]).unwrap_err();
        assert!(err.to_string().contains("Unsupported version"));
    }

    #[test]
    fn test_header_feature_count_mismatch() {
        let mut buf = Vec::new();
        ModelWriter::write_to(&sample_stack(false), &mut buf).unwrap();
        buf[8..12].copy_from_slice(&3u32.to_le_bytes());
        assert!(ModelReader::read_from(&mut &buf[..]).is_err());
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = Vec::new();
        ModelWriter::write_to(&sample_stack(false), &mut buf).unwrap();
        buf.truncate(buf.len() - 5);
        assert!(matches!(
            ModelReader::read_from(&mut &buf[..]),
            Err(ForecastError::Io(_))
        ));
    }

    #[test]
    fn test_writer_rejects_invalid_model() {
        let mut model = sample_stack(false);
        model.passthrough = true;
        let mut buf = Vec::new();
        assert!(ModelWriter::write_to(&model, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("ensemble.wfm");

        ModelWriter::write_to_file(&sample_stack(false), &path).unwrap();
        let loaded = ModelReader::read_from_file(&path).unwrap();
        assert_eq!(loaded.estimators.len(), 2);
    }
}

//! On-disk format of a built vector index.
//!
//! Two files in one directory:
//!
//! - `movie_embeddings.index`: little-endian header (`"MQVI"`, version u16,
//!   kind u8, dimension u32, count u32, build id u64) followed by
//!   `count * dimension` f32 values.
//! - `index_to_movie.json`: the [`SlotMap`].
//!
//! Each file is written to a temporary sibling and renamed into place.

use super::types::{EmbeddingMatrix, IndexKind, SlotMap};
use crate::config::{INDEX_FILENAME, SLOT_MAP_FILENAME};
use crate::error::IndexError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAGIC: &[u8; 4] = b"MQVI";
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 1 + 4 + 4 + 8;

pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILENAME)
}

pub fn slot_map_path(dir: &Path) -> PathBuf {
    dir.join(SLOT_MAP_FILENAME)
}

/// True if both artifact files are present in `dir`.
pub fn exists(dir: &Path) -> bool {
    index_path(dir).is_file() && slot_map_path(dir).is_file()
}

/// Writes both artifact files into `dir`, creating it if needed.
pub fn save(dir: &Path, matrix: &EmbeddingMatrix, slots: &SlotMap) -> Result<(), IndexError> {
    fs::create_dir_all(dir)?;

    let count = u32::try_from(slots.titles.len())
        .map_err(|_| IndexError::Build("too many records for index format".to_string()))?;
    let dimension = u32::try_from(matrix.dimension())
        .map_err(|_| IndexError::Build("dimension too large for index format".to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + matrix.as_slice().len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.push(slots.kind.as_u8());
    bytes.extend_from_slice(&dimension.to_le_bytes());
    bytes.extend_from_slice(&count.to_le_bytes());
    bytes.extend_from_slice(&slots.build_id.to_le_bytes());
    for &value in matrix.as_slice() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }

    let json = serde_json::to_vec_pretty(slots)
        .map_err(|e| IndexError::Io(format!("Failed to serialize slot map: {}", e)))?;

    write_atomic(&index_path(dir), &bytes)?;
    write_atomic(&slot_map_path(dir), &json)?;

    info!(
        "Saved index artifact ({} vectors, {}d, build {:016x}) to {}",
        count,
        dimension,
        slots.build_id,
        dir.display()
    );
    Ok(())
}

/// Reads and cross-checks both artifact files from `dir`.
///
/// # Errors
///
/// - `IndexError::NotFound` if either file is missing
/// - `IndexError::Corrupt` if a file is malformed or the two files disagree
pub fn load(dir: &Path) -> Result<(EmbeddingMatrix, SlotMap), IndexError> {
    let index_file = index_path(dir);
    let slot_file = slot_map_path(dir);
    for path in [&index_file, &slot_file] {
        if !path.is_file() {
            return Err(IndexError::NotFound(path.display().to_string()));
        }
    }

    let bytes = fs::read(&index_file)?;
    let header = Header::parse(&bytes)?;

    let slots: SlotMap = serde_json::from_slice(&fs::read(&slot_file)?)
        .map_err(|e| IndexError::Corrupt(format!("Invalid slot map: {}", e)))?;

    if slots.build_id != header.build_id {
        return Err(IndexError::Corrupt(format!(
            "Build id mismatch: index {:016x}, slot map {:016x}",
            header.build_id, slots.build_id
        )));
    }
    if slots.titles.len() != header.count {
        return Err(IndexError::Corrupt(format!(
            "Count mismatch: index has {} vectors, slot map has {} titles",
            header.count,
            slots.titles.len()
        )));
    }
    if slots.dimension != header.dimension || slots.kind != header.kind {
        return Err(IndexError::Corrupt(
            "Slot map dimension or kind does not match index header".to_string(),
        ));
    }

    let payload = &bytes[HEADER_LEN..];
    let expected_len = header.count * header.dimension * 4;
    if payload.len() != expected_len {
        return Err(IndexError::Corrupt(format!(
            "Expected {} bytes of vector data, found {}",
            expected_len,
            payload.len()
        )));
    }

    let data: Vec<f32> = payload
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if data.iter().any(|v| !v.is_finite()) {
        return Err(IndexError::Corrupt(
            "Vector data contains non-finite values".to_string(),
        ));
    }

    let matrix = if header.count == 0 {
        EmbeddingMatrix::new(header.dimension)
    } else {
        EmbeddingMatrix::from_raw(header.dimension, data)?
    };
    debug!("Loaded {} vectors from {}", matrix.len(), index_file.display());
    Ok((matrix, slots))
}

struct Header {
    kind: IndexKind,
    dimension: usize,
    count: usize,
    build_id: u64,
}

impl Header {
    fn parse(bytes: &[u8]) -> Result<Self, IndexError> {
        if bytes.len() < HEADER_LEN {
            return Err(IndexError::Corrupt("Index file truncated".to_string()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(IndexError::Corrupt("Bad magic bytes".to_string()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(IndexError::Corrupt(format!(
                "Unsupported index format version {}",
                version
            )));
        }
        let kind = IndexKind::from_u8(bytes[6])
            .ok_or_else(|| IndexError::Corrupt(format!("Unknown index kind {}", bytes[6])))?;
        let dimension = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]) as usize;
        let count = u32::from_le_bytes([bytes[11], bytes[12], bytes[13], bytes[14]]) as usize;
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[15..23]);

        if dimension == 0 {
            return Err(IndexError::Corrupt("Zero dimension".to_string()));
        }

        Ok(Self {
            kind,
            dimension,
            count,
            build_id: u64::from_le_bytes(id),
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> (EmbeddingMatrix, SlotMap) {
        let mut matrix = EmbeddingMatrix::new(2);
        matrix.push(&[1.0, 0.0]).unwrap();
        matrix.push(&[0.6, 0.8]).unwrap();
        let slots = SlotMap {
            build_id: 0xfeed,
            model_id: "fixed-table".into(),
            dimension: 2,
            kind: IndexKind::Flat,
            titles: vec!["Heat".into(), "Alien".into()],
        };
        (matrix, slots)
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let (matrix, slots) = sample();
        save(temp.path(), &matrix, &slots).unwrap();
        assert!(exists(temp.path()));

        let (loaded_matrix, loaded_slots) = load(temp.path()).unwrap();
        assert_eq!(loaded_matrix, matrix);
        assert_eq!(loaded_slots, slots);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(load(temp.path()), Err(IndexError::NotFound(_))));

        let (matrix, slots) = sample();
        save(temp.path(), &matrix, &slots).unwrap();
        fs::remove_file(slot_map_path(temp.path())).unwrap();
        assert!(matches!(load(temp.path()), Err(IndexError::NotFound(_))));
    }

    #[test]
    fn test_build_id_mismatch_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let (matrix, mut slots) = sample();
        save(temp.path(), &matrix, &slots).unwrap();

        slots.build_id = 1;
        fs::write(
            slot_map_path(temp.path()),
            serde_json::to_vec(&slots).unwrap(),
        )
        .unwrap();
        assert!(matches!(load(temp.path()), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let (matrix, slots) = sample();
        save(temp.path(), &matrix, &slots).unwrap();

        let mut bytes = fs::read(index_path(temp.path())).unwrap();
        bytes.truncate(bytes.len() - 4);
        fs::write(index_path(temp.path()), bytes).unwrap();
        assert!(matches!(load(temp.path()), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let (matrix, slots) = sample();
        save(temp.path(), &matrix, &slots).unwrap();
        fs::write(index_path(temp.path()), b"NOPE and some more bytes here").unwrap();
        assert!(matches!(load(temp.path()), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn test_no_temp_files_left() {
        let temp = TempDir::new().unwrap();
        let (matrix, slots) = sample();
        save(temp.path(), &matrix, &slots).unwrap();
        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.ends_with(".tmp")));
    }
}

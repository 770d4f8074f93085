//! Reading annotation files and writing result blobs.

use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::annotation::{Annotation, AnnotationFile};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

/// Pretty-printed JSON. Parent directories are created as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Reference corpus: `{"annotations": [...]}`.
pub fn load_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let file: AnnotationFile = read_json(path)?;
    info!("Loaded {} annotations from {}", file.annotations.len(), path.display());
    Ok(file.annotations)
}

/// Generated output: a plain list of annotations.
pub fn load_system_output(path: &Path) -> Result<Vec<Annotation>> {
    let output: Vec<Annotation> = read_json(path)?;
    info!("Loaded {} descriptions from {}", output.len(), path.display());
    Ok(output)
}

/// One CSV row per record, header taken from the field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    create_parent(path)?;
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

use crate::error::Result;
use crate::model::Index;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Writes the index as gzip-compressed JSON, creating parent directories.
pub fn save_index(index: &Index, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, index)?;
    encoder.finish()?.flush()?;

    info!(
        "Saved index with {} libraries, {} aliases to {}",
        index.libraries().len(),
        index.alias().len(),
        path.display()
    );
    Ok(())
}

pub fn load_index(path: &Path) -> Result<Index> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let index: Index = serde_json::from_reader(decoder)?;
    debug!(
        "Loaded index from {}: {} libraries, {} classes",
        path.display(),
        index.libraries().len(),
        index.class_count()
    );
    Ok(index)
}

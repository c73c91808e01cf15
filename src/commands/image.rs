//! Read, write and compare commands

use super::{CommandError, IndicatifProgress};
use std::fs;
use std::path::Path;
use viperflash_core::flash::validate_image;
use viperflash_core::FLASH_SIZE;
use viperflash_flash::{open_session, SessionConfig, TransportSpec};

/// Load an image file and check that it fits the chip
fn load_image(path: &Path) -> Result<Vec<u8>, CommandError> {
    let data = fs::read(path).map_err(|source| CommandError::LoadImage {
        path: path.to_path_buf(),
        source,
    })?;
    validate_image(&data).map_err(|source| CommandError::BadImage {
        path: path.to_path_buf(),
        source,
    })?;
    println!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

/// Dump the whole chip to `output`
pub fn run_read(
    spec: &TransportSpec,
    config: SessionConfig,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(spec, config)?;
    let mut progress = IndicatifProgress::new();
    let data = session.read_image(&mut progress)?;
    progress.finish("Read complete");

    fs::write(output, &data).map_err(|source| CommandError::SaveImage {
        path: output.to_path_buf(),
        source,
    })?;
    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Erase the chip and program `input`
pub fn run_write(
    spec: &TransportSpec,
    config: SessionConfig,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = load_image(input)?;
    if image.len() < FLASH_SIZE {
        log::debug!(
            "image is {} bytes, the remaining {} bytes stay erased",
            image.len(),
            FLASH_SIZE - image.len()
        );
    }

    let mut session = open_session(spec, config)?;
    let mut progress = IndicatifProgress::new();
    session.write_image(&image, &mut progress)?;
    Ok(())
}

/// Compare the chip against `input`
pub fn run_compare(
    spec: &TransportSpec,
    config: SessionConfig,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = load_image(input)?;

    let mut session = open_session(spec, config)?;
    let mut progress = IndicatifProgress::new();
    let result = session.compare_image(&image, &mut progress);
    progress.finish(if result.is_ok() {
        "Compare complete"
    } else {
        "Compare failed"
    });
    result?;

    println!("Chip matches {:?} ({} bytes)", input, image.len());
    Ok(())
}

use crate::domain::model::DetectedDevice;
use crate::utils::error::{RelPerfError, Result};
use regex::Regex;
use std::sync::LazyLock;

// Everything between the first colon and the `(UUID` marker.
static DEVICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(.*?)\(UUID").expect("device line pattern is valid")
});

/// Parses `nvidia-smi --list-gpus` output, one device per line:
///
/// ```text
/// 0: NVIDIA GeForce RTX 3090 (UUID: GPU-1d2e...)
/// ```
///
/// Any line without that shape, blank lines included, fails the whole
/// parse. A trailing newline does not start another line.
pub fn parse_devices(raw: &str) -> Result<Vec<DetectedDevice>> {
    tracing::info!("Filtering nvidia-smi output...");

    raw.lines()
        .enumerate()
        .map(|(index, line)| parse_line(index + 1, line))
        .collect()
}

/// Device names only, in output order.
pub fn extract_names(raw: &str) -> Result<Vec<String>> {
    Ok(parse_devices(raw)?
        .into_iter()
        .map(|device| device.extracted_name)
        .collect())
}

fn parse_line(line_number: usize, line: &str) -> Result<DetectedDevice> {
    let format_error = || RelPerfError::FormatError {
        line_number,
        line: line.to_string(),
    };

    let captures = DEVICE_LINE.captures(line).ok_or_else(format_error)?;
    let name = captures
        .get(1)
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .ok_or_else(format_error)?;

    tracing::debug!("\tLine {}: found device {:?}", line_number, name);

    Ok(DetectedDevice {
        raw_line: line.to_string(),
        extracted_name: name.to_string(),
    })
}

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use snafu::ResultExt;

use crate::consts::OUTPUT_EXTENSION;
use crate::error::{BtebError, IoWriteSnafu, JsonSnafu};
use crate::record::ResultRecord;

/// `<output_dir>/<input stem>.json`
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let mut file_name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    file_name.push(".");
    file_name.push(OUTPUT_EXTENSION);
    output_dir.join(file_name)
}

/// Serializes `records` as a JSON array with four-space indentation. Non-ASCII text
/// is written verbatim.
pub fn to_pretty_json(records: &[ResultRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    Ok(buf)
}

pub fn write_records(path: &Path, records: &[ResultRecord]) -> Result<(), BtebError> {
    let display = path.display().to_string();
    let json = to_pretty_json(records).context(JsonSnafu { path: &display })?;
    std::fs::write(path, json).context(IoWriteSnafu { path: display })
}

pub fn ensure_output_dir(output_dir: &Path) -> Result<(), BtebError> {
    std::fs::create_dir_all(output_dir).context(IoWriteSnafu {
        path: output_dir.display().to_string(),
    })
}

use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a piped contract from stdin.
///
/// A document opening with `{` is parsed as JSON; anything else as YAML.
/// Returns None when stdin is a terminal or the pipe is empty, so the
/// caller can fall back to command-line flags.
pub fn read_stdin_contract<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    let bytes = io::stdin().read_to_string(&mut buffer)?;
    log::debug!("Read {} bytes from stdin", bytes);

    let document = buffer.trim();
    if document.is_empty() {
        return Ok(None);
    }

    let contract = if document.starts_with('{') {
        serde_json::from_str(document)
            .map_err(|e| format!("Failed to parse contract JSON from stdin: {e}"))?
    } else {
        serde_yaml::from_str(document)
            .map_err(|e| format!("Failed to parse contract YAML from stdin: {e}"))?
    };
    Ok(Some(contract))
}

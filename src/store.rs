//! Key-pair persistence: JSON, base64-encoded, one file per key pair.

use std::{fs, path::PathBuf};

use anyhow::{anyhow, Result};
use base64::engine::{general_purpose::STANDARD as BASE64, Engine};

use crate::keys::KeyPair;

/// Saves a key pair to a file in the specified folder.
pub fn save_key_pair(key_pair: &KeyPair, folder: PathBuf, name: &str) -> Result<()> {
    let key_file = folder.join(name);

    let key_str = serde_json::to_string(key_pair)?;
    let key_base64 = BASE64.encode(key_str);
    fs::write(key_file, key_base64).map_err(|e| anyhow!("Failed to write to file: {e}"))?;
    Ok(())
}

/// Loads a key pair from a file written by [`save_key_pair`].
pub fn load_key_pair(key_file: PathBuf) -> Result<KeyPair> {
    let key_base64 = fs::read_to_string(&key_file)?;
    let key_bytes = BASE64.decode(key_base64)?;
    let key_str = String::from_utf8(key_bytes)?;
    let key_pair = serde_json::from_str(&key_str)?;
    Ok(key_pair)
}

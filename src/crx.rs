//! Parser for packaged extension archives (CRX).
//!
//! Layout: a "Cr24" magic, a little-endian format version, a
//! version-specific header, then a plain zip payload.
//!
//! - version 2: public-key length, signature length, public key, signature.
//! - version 3: a single header length followed by an opaque header block.
//!   The public key is buried in that block; we skip it and let the caller
//!   fall back to a generated id.

use std::io::{Cursor, Read};
use std::path::Path;

use ring::digest;

use crate::types::errors::PackageError;

const MAGIC: &[u8; 4] = b"Cr24";

/// A parsed package: the declared format version, the signing public key
/// when the format exposes one, and the zip payload.
#[derive(Debug)]
pub struct CrxPackage {
    pub version: u32,
    pub public_key: Option<Vec<u8>>,
    pub zip: Vec<u8>,
}

fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, PackageError> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(PackageError::Truncated)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Parses a package from raw bytes.
pub fn parse(data: &[u8]) -> Result<CrxPackage, PackageError> {
    if data.len() < 8 || &data[0..4] != MAGIC {
        return Err(PackageError::BadMagic);
    }
    let version = read_u32_le(data, 4)?;

    match version {
        2 => {
            let pubkey_len = read_u32_le(data, 8)? as usize;
            let sig_len = read_u32_le(data, 12)? as usize;
            let zip_start = 16 + pubkey_len + sig_len;
            if data.len() < zip_start {
                return Err(PackageError::Truncated);
            }
            let public_key = data[16..16 + pubkey_len].to_vec();
            Ok(CrxPackage {
                version,
                public_key: Some(public_key),
                zip: data[zip_start..].to_vec(),
            })
        }
        3 => {
            let header_len = read_u32_le(data, 8)? as usize;
            let zip_start = 12 + header_len;
            if data.len() < zip_start {
                return Err(PackageError::Truncated);
            }
            Ok(CrxPackage {
                version,
                public_key: None,
                zip: data[zip_start..].to_vec(),
            })
        }
        v => Err(PackageError::UnsupportedVersion(v)),
    }
}

/// Derives the canonical 32-character extension id from a signing public
/// key: the first 16 bytes of its SHA-256 digest, each nibble rendered as
/// a letter `a`..`p`.
pub fn derive_id(public_key: &[u8]) -> String {
    let hash = digest::digest(&digest::SHA256, public_key);
    let mut id = String::with_capacity(32);
    for byte in &hash.as_ref()[..16] {
        id.push((b'a' + (byte >> 4)) as char);
        id.push((b'a' + (byte & 0x0f)) as char);
    }
    id
}

/// Extracts the zip payload into `dest`, refusing entries that would
/// escape it.
pub fn extract_payload(package: &CrxPackage, dest: &Path) -> Result<(), PackageError> {
    let reader = Cursor::new(&package.zip);
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|e| PackageError::ExtractError(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| PackageError::ExtractError(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(PackageError::ExtractError(format!(
                "unsafe entry name: {}",
                entry.name()
            )));
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| PackageError::ExtractError(e.to_string()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PackageError::ExtractError(e.to_string()))?;
        }
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| PackageError::ExtractError(e.to_string()))?;
        std::fs::write(&out_path, contents)
            .map_err(|e| PackageError::ExtractError(e.to_string()))?;
    }
    Ok(())
}

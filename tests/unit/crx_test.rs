use std::io::Write;

use cormorant::crx;
use cormorant::types::errors::PackageError;

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buf);
        let mut writer = zip::ZipWriter::new(cursor);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }
    buf
}

fn build_v2(public_key: &[u8], signature: &[u8], zip: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"Cr24");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(public_key.len() as u32).to_le_bytes());
    out.extend_from_slice(&(signature.len() as u32).to_le_bytes());
    out.extend_from_slice(public_key);
    out.extend_from_slice(signature);
    out.extend_from_slice(zip);
    out
}

fn build_v3(header: &[u8], zip: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"Cr24");
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    out.extend_from_slice(header);
    out.extend_from_slice(zip);
    out
}

#[test]
fn test_rejects_wrong_magic() {
    let err = crx::parse(b"Zz99........").unwrap_err();
    assert!(matches!(err, PackageError::BadMagic));
}

#[test]
fn test_rejects_short_input() {
    let err = crx::parse(b"Cr24").unwrap_err();
    assert!(matches!(err, PackageError::BadMagic | PackageError::Truncated));
}

#[test]
fn test_rejects_unknown_version() {
    let mut data = Vec::new();
    data.extend_from_slice(b"Cr24");
    data.extend_from_slice(&9u32.to_le_bytes());
    data.extend_from_slice(&[0; 16]);
    let err = crx::parse(&data).unwrap_err();
    assert!(matches!(err, PackageError::UnsupportedVersion(9)));
}

#[test]
fn test_rejects_truncated_v2() {
    // Declares a 100-byte key but the file ends first.
    let mut data = Vec::new();
    data.extend_from_slice(b"Cr24");
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&100u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[0; 10]);
    let err = crx::parse(&data).unwrap_err();
    assert!(matches!(err, PackageError::Truncated));
}

#[test]
fn test_v2_splits_key_signature_and_payload() {
    let zip = build_zip(&[("manifest.json", b"{}")]);
    let data = build_v2(b"public-key-bytes", b"sig", &zip);

    let package = crx::parse(&data).unwrap();
    assert_eq!(package.version, 2);
    assert_eq!(package.public_key.as_deref(), Some(b"public-key-bytes".as_slice()));
    assert_eq!(package.zip, zip);
}

#[test]
fn test_v3_skips_header_without_key() {
    let zip = build_zip(&[("manifest.json", b"{}")]);
    let data = build_v3(&[0xAB; 40], &zip);

    let package = crx::parse(&data).unwrap();
    assert_eq!(package.version, 3);
    assert!(package.public_key.is_none());
    assert_eq!(package.zip, zip);
}

#[test]
fn test_derive_id_is_stable_and_well_formed() {
    let id = crx::derive_id(b"some-public-key");
    assert_eq!(id, crx::derive_id(b"some-public-key"));
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| ('a'..='p').contains(&c)));

    assert_ne!(id, crx::derive_id(b"another-public-key"));
}

#[test]
fn test_extract_writes_payload_files() {
    let zip = build_zip(&[
        ("manifest.json", b"{ \"name\": \"x\" }".as_slice()),
        ("scripts/content.js", b"// js".as_slice()),
    ]);
    let data = build_v2(b"key", b"", &zip);
    let package = crx::parse(&data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    crx::extract_payload(&package, dir.path()).unwrap();

    assert!(dir.path().join("manifest.json").exists());
    let js = std::fs::read_to_string(dir.path().join("scripts/content.js")).unwrap();
    assert_eq!(js, "// js");
}

#[test]
fn test_extract_refuses_escaping_entries() {
    let zip = build_zip(&[("../evil.txt", b"boom".as_slice())]);
    let data = build_v2(b"key", b"", &zip);
    let package = crx::parse(&data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("ext");
    std::fs::create_dir_all(&base).unwrap();
    let err = crx::extract_payload(&package, &base).unwrap_err();
    assert!(matches!(err, PackageError::ExtractError(_)));
    assert!(!dir.path().join("evil.txt").exists());
}

#[test]
fn test_garbage_payload_fails_extraction() {
    let data = build_v2(b"key", b"", b"this is not a zip archive");
    let package = crx::parse(&data).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = crx::extract_payload(&package, dir.path()).unwrap_err();
    assert!(matches!(err, PackageError::ExtractError(_)));
}

use std::fmt;

// === ViewError ===

/// Errors related to content-view management.
#[derive(Debug)]
pub enum ViewError {
    /// No view with the given surface id exists in this manager.
    NotFound(u32),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::NotFound(id) => write!(f, "View not found: {}", id),
        }
    }
}

impl std::error::Error for ViewError {}

// === ExtensionError ===

/// Errors related to extension registration and install.
#[derive(Debug)]
pub enum ExtensionError {
    /// Extension with the given id was not found in any partition.
    NotFound(String),
    /// An extension with the same id is already installed.
    AlreadyInstalled(String),
    /// The extension manifest is missing or invalid.
    InvalidManifest(String),
    /// Failed to load or register the extension.
    LoadError(String),
}

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionError::NotFound(id) => write!(f, "Extension not found: {}", id),
            ExtensionError::AlreadyInstalled(id) => {
                write!(f, "Extension already installed: {}", id)
            }
            ExtensionError::InvalidManifest(msg) => {
                write!(f, "Invalid extension manifest: {}", msg)
            }
            ExtensionError::LoadError(msg) => write!(f, "Extension load error: {}", msg),
        }
    }
}

impl std::error::Error for ExtensionError {}

// === PackageError ===

/// Errors related to parsing a packaged-extension archive.
#[derive(Debug)]
pub enum PackageError {
    /// The file does not start with the expected magic bytes.
    BadMagic,
    /// The header declares a version this parser does not understand.
    UnsupportedVersion(u32),
    /// The file ends before the declared header or payload.
    Truncated,
    /// Extracting the zip payload failed.
    ExtractError(String),
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageError::BadMagic => write!(f, "Not a packaged extension (bad magic)"),
            PackageError::UnsupportedVersion(v) => {
                write!(f, "Unsupported package version: {}", v)
            }
            PackageError::Truncated => write!(f, "Package file is truncated"),
            PackageError::ExtractError(msg) => write!(f, "Package extract error: {}", msg),
        }
    }
}

impl std::error::Error for PackageError {}

// === DialogError ===

/// Errors related to dialog surfaces.
#[derive(Debug)]
pub enum DialogError {
    /// No dialog registered under the given name.
    NotFound(String),
    /// The dialog surface has already been destroyed.
    Destroyed(String),
    /// A blocking prompt could not be shown.
    PromptFailed(String),
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogError::NotFound(name) => write!(f, "Dialog not found: {}", name),
            DialogError::Destroyed(name) => write!(f, "Dialog destroyed: {}", name),
            DialogError::PromptFailed(msg) => write!(f, "Prompt failed: {}", msg),
        }
    }
}

impl std::error::Error for DialogError {}

// === StorageError ===

/// Errors related to the persistent decision store.
#[derive(Debug)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => {
                write!(f, "Permission store database error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

// === SettingsError ===

/// Errors related to settings persistence.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

use thiserror::Error;

/// Result type for every fallible ramnet operation
pub type Result<T> = std::result::Result<T, RamnetError>;

/// Errors raised by the classifier, its codec and its configuration layer.
///
/// All failures are local and synchronous: the call that detects the problem
/// returns it and leaves the model exactly as it was before the call.
#[derive(Error, Debug)]
pub enum RamnetError {
    // === Construction ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Train / classify input validation ===
    #[error("Pattern has {actual} bits, model expects {expected}")]
    Shape { expected: usize, actual: usize },

    #[error("Label {label} out of range for {classes} classes")]
    Label { label: usize, classes: usize },

    #[error("Address {address} does not fit a {bits}-bit tuple")]
    AddressOutOfRange { address: u64, bits: usize },

    // === Persistence ===
    #[error("Malformed model stream: {0}")]
    Format(String),

    #[error("Unsupported model format version {found} (supported: {supported})")]
    Version { found: u16, supported: u16 },

    #[error("Corrupted model stream: {0}")]
    Corruption(String),

    // === I/O and config files ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl RamnetError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format(message.into())
    }

    pub fn corruption<S: Into<String>>(message: S) -> Self {
        Self::Corruption(message.into())
    }

    /// Stable identifier, suitable for logs and host-language bindings
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Shape { .. } => "SHAPE_ERROR",
            Self::Label { .. } => "LABEL_ERROR",
            Self::AddressOutOfRange { .. } => "ADDRESS_OUT_OF_RANGE",
            Self::Format(_) => "FORMAT_ERROR",
            Self::Version { .. } => "VERSION_ERROR",
            Self::Corruption(_) => "CORRUPTION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::TomlParse(_) => "TOML_PARSE_ERROR",
        }
    }

    /// True for the errors produced while decoding a persisted model
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::Version { .. } | Self::Corruption(_)
        )
    }
}

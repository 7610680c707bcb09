use core::fmt;

/// Result type for all encoding operations.
pub type Result<T> = core::result::Result<T, EncodeError>;

/// The reasons an encode can fail.
///
/// Every error is terminal. Nothing is retried internally and a failed encode never reports a
/// byte count, so a partially written sink must be discarded by the caller.
#[derive(Debug)]
pub enum EncodeError {
    /// Width or height exceeds [`MAX_DIMENSION`](crate::MAX_DIMENSION).
    DimensionTooLarge { width: usize, height: usize },
    /// The destination rejected a write.
    #[cfg(feature = "std")]
    SinkWriteFailed(std::io::Error),
    /// The source bit depth is not one of 1, 8, 16, 24 or 32.
    UnsupportedPixelFormat { depth: u8 },
    /// The source holds more distinct colors than a palette can address.
    PaletteOverflow { colors: usize },
    /// The pixel slice is shorter than the described image.
    BufferTooShort { expected: usize, actual: usize },
    /// An indexed pixel refers to a colormap slot that does not exist.
    IndexOutOfRange { index: u8, colormap_len: usize },
    /// An option is inconsistent with the image being encoded.
    InvalidOption(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::DimensionTooLarge { width, height } => write!(
                f,
                "Dimensions {}x{} exceed the maximum of {}",
                width,
                height,
                crate::MAX_DIMENSION
            ),
            #[cfg(feature = "std")]
            EncodeError::SinkWriteFailed(err) => write!(f, "Failed to write output: {}", err),
            EncodeError::UnsupportedPixelFormat { depth } => {
                write!(f, "Unsupported pixel depth of {} bits", depth)
            }
            EncodeError::PaletteOverflow { colors } => write!(
                f,
                "Found at least {} distinct colors, a palette holds at most 256",
                colors
            ),
            EncodeError::BufferTooShort { expected, actual } => write!(
                f,
                "Expected {} bytes of pixel data, got {}",
                expected, actual
            ),
            EncodeError::IndexOutOfRange {
                index,
                colormap_len,
            } => write!(
                f,
                "Pixel index {} is outside of a colormap with {} entries",
                index, colormap_len
            ),
            EncodeError::InvalidOption(msg) => write!(f, "Invalid option: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::SinkWriteFailed(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::SinkWriteFailed(err)
    }
}

#[cfg(feature = "std")]
impl From<EncodeError> for std::io::Error {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::SinkWriteFailed(err) => err,
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other),
        }
    }
}

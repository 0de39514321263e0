//! Error type shared by the notecell crate
//!
//! Cells themselves never fail: a missing output element or an out of range
//! line is a quiet no-op. Errors come from the layers around them, i.e. the
//! configuration file, notebook files on disk and URIs naming those files.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────
    /// Reading or writing a file failed outside of configuration handling
    Io(io::Error),

    /// An output file could not be written
    FileWrite { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────
    ConfigLoad { path: PathBuf, source: io::Error },

    ConfigSave { path: PathBuf, source: BoxedSource },

    /// The configuration file is not valid settings JSON
    ConfigParse {
        message: String,
        source: Option<BoxedSource>,
    },

    /// The platform has no configuration directory (no home directory)
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Notebooks
    // ─────────────────────────────────────────────────────────────────────────
    /// A notebook or link location is not a usable URI
    InvalidUri {
        uri: String,
        source: Option<url::ParseError>,
    },

    /// The notebook file does not have the expected structure
    Notebook(String),

    /// Anything else worth reporting to the user as-is
    Application(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUri {
            uri: String::new(),
            source: Some(err),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display / source
// ─────────────────────────────────────────────────────────────────────────────

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileWrite { path, source } => {
                write!(f, "Cannot write {}: {}", path.display(), source)
            }
            Error::ConfigLoad { path, source } => {
                write!(f, "Cannot read settings from {}: {}", path.display(), source)
            }
            Error::ConfigSave { path, source } => {
                write!(f, "Cannot save settings to {}: {}", path.display(), source)
            }
            Error::ConfigParse { message, .. } => write!(f, "Malformed settings: {}", message),
            Error::ConfigDirNotFound => write!(f, "No configuration directory on this system"),
            Error::InvalidUri { uri, source } => match source {
                Some(err) if uri.is_empty() => write!(f, "Invalid URI: {}", err),
                Some(err) => write!(f, "Invalid URI '{}': {}", uri, err),
                None => write!(f, "Invalid URI '{}'", uri),
            },
            Error::Notebook(msg) => write!(f, "Invalid notebook: {}", msg),
            Error::Application(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::FileWrite { source, .. } | Error::ConfigLoad { source, .. } => Some(source),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::InvalidUri { source, .. } => source
                .as_ref()
                .map(|s| s as &(dyn std::error::Error + 'static)),
            Error::ConfigDirNotFound | Error::Notebook(_) | Error::Application(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fallbacks
// ─────────────────────────────────────────────────────────────────────────────

pub trait ResultExt<T> {
    /// Log the error as a warning and continue with `default`.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        self.unwrap_or_else(|err| {
            warn!("{}: {}; falling back to defaults", context, err);
            default
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_from_io_error() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, Error::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_json_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err = Error::from(parse);
        assert!(matches!(err, Error::ConfigParse { source: Some(_), .. }));
        assert!(err.to_string().starts_with("Malformed settings"));
    }

    #[test]
    fn test_from_url_error() {
        let err = Error::from(url::Url::parse("not a url").unwrap_err());
        assert!(matches!(err, Error::InvalidUri { source: Some(_), .. }));
        assert!(err.to_string().starts_with("Invalid URI: "));
    }

    #[test]
    fn test_invalid_uri_names_location() {
        let err = Error::InvalidUri {
            uri: "::nope".to_string(),
            source: None,
        };
        assert_eq!(err.to_string(), "Invalid URI '::nope'");
    }

    #[test]
    fn test_file_write_names_path() {
        let err = Error::FileWrite {
            path: PathBuf::from("out.md"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Cannot write out.md: denied");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_message_variants_have_no_source() {
        assert!(Error::Application("x".to_string()).source().is_none());
        assert!(Error::ConfigDirNotFound.source().is_none());
        assert_eq!(
            Error::Notebook("missing cells array".to_string()).to_string(),
            "Invalid notebook: missing cells array"
        );
    }

    #[test]
    fn test_unwrap_or_warn_default() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.unwrap_or_warn_default(0, "loading"), 42);
        let err: Result<i32> = Err(Error::Application("broken".to_string()));
        assert_eq!(err.unwrap_or_warn_default(7, "loading"), 7);
    }
}

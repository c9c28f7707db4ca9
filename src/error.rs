//! Application error type
//!
//! One enum for everything that can go wrong outside the generation
//! collaborator. Collaborator failures arrive as `GenerationError` and are
//! wrapped in `Error::Generation` once they reach app state.

use crate::generation::GenerationError;
use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Disk
    // ─────────────────────────────────────────────────────────────────────────
    /// Raw I/O failure, e.g. starting the worker thread
    Io(io::Error),

    /// Writing or staging a file failed
    FileWrite { path: PathBuf, source: io::Error },

    /// `settings.json` exists but could not be read
    ConfigLoad { path: PathBuf, source: BoxedSource },

    ConfigSave { path: PathBuf, source: BoxedSource },

    /// Malformed JSON in settings or a stored record
    ConfigParse {
        message: String,
        source: Option<BoxedSource>,
    },

    /// The platform reports no per-user config root
    ConfigDirNotFound,

    /// A key-value store rejected a key or failed an operation
    Storage { key: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Authoring
    // ─────────────────────────────────────────────────────────────────────────
    /// Form input rejected before anything is sent to the generator.
    /// Displays as the bare message so it can go straight into the UI.
    Validation(String),

    ImageIndexOutOfRange { index: usize, len: usize },

    /// The article text is owned by an in-flight stream
    StreamActive,

    Generation(GenerationError),

    /// Anything else worth showing the user
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

impl From<GenerationError> for Error {
    fn from(err: GenerationError) -> Self {
        Error::Generation(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileWrite { path, source } => {
                write!(f, "Could not write {}: {}", path.display(), source)
            }
            Error::ConfigLoad { path, source } => {
                write!(f, "Could not read settings from {}: {}", path.display(), source)
            }
            Error::ConfigSave { path, source } => {
                write!(f, "Could not save settings to {}: {}", path.display(), source)
            }
            Error::ConfigParse { message, .. } => write!(f, "Unreadable data: {}", message),
            Error::ConfigDirNotFound => write!(f, "No user configuration directory available"),
            Error::Storage { key, message } => write!(f, "Store '{}': {}", key, message),
            Error::Validation(message) | Error::Application(message) => f.write_str(message),
            Error::ImageIndexOutOfRange { index, len } => {
                write!(f, "Image index {} out of range (0..{})", index, len)
            }
            Error::StreamActive => {
                write!(f, "Editing is disabled while content is being generated")
            }
            Error::Generation(err) => write!(f, "Generation failed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::FileWrite { source, .. } => Some(source),
            Error::ConfigLoad { source, .. } | Error::ConfigSave { source, .. } => {
                Some(source.as_ref())
            }
            Error::ConfigParse {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            Error::Generation(err) => Some(err),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation
// ─────────────────────────────────────────────────────────────────────────────

pub trait ResultExt<T> {
    /// Log the error as a warning prefixed with `context` and use `default`.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        self.unwrap_or_else(|err| {
            warn!("{}: {}; falling back to default", context, err);
            default
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_io_errors_convert_with_question_mark() {
        fn spawn_fails() -> Result<()> {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "no threads left"))?;
            Ok(())
        }
        let err = spawn_fails().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: no threads left");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_errors_become_parse_errors() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::ConfigParse { source: Some(_), .. }));
        assert!(err.to_string().starts_with("Unreadable data"));
    }

    #[test]
    fn test_generation_errors_are_wrapped() {
        let err = Error::from(GenerationError::Overloaded);
        assert!(matches!(err, Error::Generation(GenerationError::Overloaded)));
        assert!(err.to_string().starts_with("Generation failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            Error::ImageIndexOutOfRange { index: 5, len: 3 }.to_string(),
            "Image index 5 out of range (0..3)"
        );
        assert_eq!(
            Error::Validation("Topic must not be empty".into()).to_string(),
            "Topic must not be empty"
        );
        assert_eq!(Error::Application("Nothing to save".into()).to_string(), "Nothing to save");
    }

    #[test]
    fn test_sources() {
        let write = Error::FileWrite {
            path: PathBuf::from("/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(write.source().is_some());
        assert!(Error::StreamActive.source().is_none());
        let bare = Error::ConfigParse {
            message: "x".into(),
            source: None,
        };
        assert!(bare.source().is_none());
    }

    #[test]
    fn test_unwrap_or_warn_default() {
        let ok: Result<u8> = Ok(7);
        assert_eq!(ok.unwrap_or_warn_default(0, "ctx"), 7);
        let err: Result<u8> = Err(Error::ConfigDirNotFound);
        assert_eq!(err.unwrap_or_warn_default(0, "ctx"), 0);
    }
}

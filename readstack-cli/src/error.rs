//! Error handling for the readstack CLI

use readstack_core::PileupError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for readstack CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Invalid request: {message}")]
    Request { message: String },

    #[error("Alignment source error: {message}")]
    Alignments { message: String },

    #[error("Reference source error: {message}")]
    Reference { message: String },

    #[error("Rendering error: {message}")]
    Rendering { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn parse<S: Into<String>>(file: S, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

impl From<PileupError> for CliError {
    fn from(err: PileupError) -> Self {
        match err {
            PileupError::Validation { message } => Self::Request { message },
            PileupError::AlignmentSource { message } => Self::Alignments { message },
            PileupError::ReferenceSource { chr, start, stop, message } => Self::Reference {
                message: format!("{chr}:{start}-{stop}: {message}"),
            },
            PileupError::Rendering { message } => Self::Rendering { message },
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file\n\
                 • Compressed inputs need a .gz extension",
                path.display()
            ));
        }

        CliError::Request { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Regions are written as chr:start-stop with start <= stop\n\
                 • Stack windows are written as start:stop\n\
                 • --max-records must be at least 1",
            );
        }

        CliError::Reference { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check that the region's contig is present in the reference FASTA\n\
                 • Check that the region lies within the contig\n\
                 • Render without --reference to skip mismatch detection",
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your readstack.toml configuration file\n\
                 • Use 'readstack config --example' to generate a sample configuration\n\
                 • Colours are written as #RRGGBB",
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

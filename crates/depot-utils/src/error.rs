use std::{error::Error, fmt, path::PathBuf};

#[derive(Debug)]
pub enum HashError {
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::ReadFailed { path, source } => {
                write!(f, "Failed to read file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for HashError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HashError::ReadFailed { source, .. } => Some(source),
        }
    }
}

pub type HashResult<T> = Result<T, HashError>;

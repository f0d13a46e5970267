use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum MicroFeError {
    InputParse(String),
    TemplateFormat(String),
    ReportLayout(String),
    ThresholdNotFound(String),
    Io(PathBuf, std::io::Error),
}

impl MicroFeError {
    /// Wraps an io error with the path that produced it
    pub fn io(path: &Path, err: std::io::Error) -> MicroFeError {
        MicroFeError::Io(path.to_path_buf(), err)
    }
}

impl Display for MicroFeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (err_name, value) = match self {
            MicroFeError::InputParse(v) => ("Input", v.clone()),
            MicroFeError::TemplateFormat(v) => ("Template", v.clone()),
            MicroFeError::ReportLayout(v) => ("Report layout", v.clone()),
            MicroFeError::ThresholdNotFound(v) => ("Threshold", v.clone()),
            MicroFeError::Io(path, err) => ("IO", format!("{}: {err}", path.display())),
        };

        write!(f, "{} error: {}", err_name, value)
    }
}

impl std::error::Error for MicroFeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MicroFeError::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

//! Template directory resolution

use std::io;
use std::path::{Path, PathBuf};

use crate::generator::GeneratorKind;

/// Environment variable naming the template root
pub const TEMPLATE_DIR_ENV: &str = "RELAYGEN_TEMPLATE_DIR";

/// A generator kind's template directory, `<root>/<kind>`
#[derive(Debug, Clone)]
pub struct TemplateDir {
    template_path: PathBuf,
    kind: GeneratorKind,
}

impl TemplateDir {
    pub fn new(template_path: PathBuf, kind: GeneratorKind) -> Self {
        Self {
            template_path,
            kind,
        }
    }

    /// Resolve the template directory for `kind`.
    ///
    /// `custom_dir` may name either the template root or the kind's own
    /// directory. Without it the standard locations are searched.
    pub fn discover(kind: GeneratorKind, custom_dir: Option<&Path>) -> io::Result<Self> {
        let template_path = match custom_dir {
            Some(dir) if dir.file_name().and_then(|n| n.to_str()) == Some(kind.as_str()) => {
                dir.to_path_buf()
            }
            Some(dir) => dir.join(kind.as_str()),
            None => Self::find_template_root()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        "Could not find template directory in any standard location",
                    )
                })?
                .join(kind.as_str()),
        };

        if !template_path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Template directory not found: {}", template_path.display()),
            ));
        }

        log::debug!(
            "Using {} templates from {}",
            kind,
            template_path.display()
        );
        Ok(Self::new(template_path, kind))
    }

    /// First existing template root among the standard locations
    fn find_template_root() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(TEMPLATE_DIR_ENV) {
            let path = PathBuf::from(dir);
            if path.is_dir() {
                return Some(path);
            }
        }

        let local = PathBuf::from("templates");
        if local.is_dir() {
            return Some(local);
        }

        // Development layout: crates/<crate>/ below the workspace root
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        if let Some(templates) = manifest_dir
            .ancestors()
            .map(|dir| dir.join("templates"))
            .find(|dir| dir.is_dir())
        {
            return Some(templates);
        }

        dirs::home_dir()
            .map(|home| home.join(".relaygen").join("templates"))
            .filter(|dir| dir.is_dir())
    }

    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    /// Directory of this kind's templates
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn display(&self) -> std::path::Display<'_> {
        self.template_path.display()
    }
}

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

/// Something that can produce the text of an ownership manifest. The index
/// reads its source exactly once per build.
pub trait ManifestSource {
    /// Human readable name used in error messages.
    fn location(&self) -> String;

    fn read_manifest(&self) -> io::Result<String>;
}

impl ManifestSource for str {
    fn location(&self) -> String {
        "<memory>".to_owned()
    }

    fn read_manifest(&self) -> io::Result<String> {
        Ok(self.to_owned())
    }
}

impl ManifestSource for String {
    fn location(&self) -> String {
        self.as_str().location()
    }

    fn read_manifest(&self) -> io::Result<String> {
        Ok(self.clone())
    }
}

impl<S: ManifestSource + ?Sized> ManifestSource for &S {
    fn location(&self) -> String {
        (**self).location()
    }

    fn read_manifest(&self) -> io::Result<String> {
        (**self).read_manifest()
    }
}

/// A CODEOWNERS file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSource for ManifestFile {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read_manifest(&self) -> io::Result<String> {
        let mut file = File::open(&self.path)?;
        let mut source = String::new();
        file.read_to_string(&mut source)?;
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_in_memory_sources() {
        let text = "foo @bar\n";
        assert_eq!(text.read_manifest().unwrap(), text);
        assert_eq!(text.to_owned().read_manifest().unwrap(), text);
        assert_eq!((&text).location(), "<memory>");
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "src/ @team").unwrap();

        let source = ManifestFile::new(file.path());
        assert_eq!(source.read_manifest().unwrap(), "src/ @team");
        assert_eq!(source.location(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = ManifestFile::new(dir.path().join("CODEOWNERS"));
        let err = source.read_manifest().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

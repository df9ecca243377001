use std::path::Path;

use super::ShaderError;

/// Reads a shader stage source file as UTF-8 text.
///
/// The text is forwarded verbatim to the compiler; nothing is interpreted
/// here.
pub fn load_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "@vertex\nfn main() {{}}\n").unwrap();

        let text = load_source(file.path()).unwrap();
        assert_eq!(text, "@vertex\nfn main() {}\n");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.vert.wgsl");

        let err = load_source(&path).unwrap_err();
        match err {
            ShaderError::Io { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}

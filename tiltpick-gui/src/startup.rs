//! Files passed on the command line at startup.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{bail, Context};

/// Paths sorted by kind.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StartupFiles {
    pub mdoc_files: Vec<PathBuf>,
    pub tilt_images: Vec<PathBuf>,
}

/// Sort arguments into metadata documents and tilt images by extension.
///
/// Every path must exist; anything that is neither `.mdoc` nor `.mrc` is
/// rejected.
pub fn files_from_args<I>(args: I) -> anyhow::Result<StartupFiles>
where
    I: IntoIterator<Item = OsString>,
{
    let mut files = StartupFiles::default();
    for arg in args {
        let path = PathBuf::from(arg);
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot open {}", path.display()))?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("mdoc") => files.mdoc_files.push(path),
            Some("mrc" | "mrcs") => files.tilt_images.push(path),
            _ => bail!("unrecognised file type: {}", path.display()),
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorts_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mdoc = dir.path().join("TS_01.mrc.mdoc");
        let image = dir.path().join("TS_01_001.MRC");
        std::fs::write(&mdoc, "").unwrap();
        std::fs::write(&image, "").unwrap();

        let files =
            files_from_args([mdoc.clone().into_os_string(), image.clone().into_os_string()])
                .unwrap();
        assert_eq!(files.mdoc_files, vec![mdoc.canonicalize().unwrap()]);
        assert_eq!(files.tilt_images, vec![image.canonicalize().unwrap()]);
    }

    #[test]
    fn test_rejects_missing_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert!(files_from_args([dir.path().join("nope.mdoc").into_os_string()]).is_err());

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "").unwrap();
        let err = files_from_args([txt.into_os_string()]).unwrap_err();
        assert!(err.to_string().contains("unrecognised"));
    }
}

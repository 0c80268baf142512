use std::path::{Path, PathBuf};

use anyhow::Context;
use fs_extra::dir::CopyOptions;
use log::debug;

/// Writes `content` to `out_dir/relative`, replacing whatever was there.
pub(super) fn write_output(out_dir: &Path, relative: &Path, content: &str) -> anyhow::Result<PathBuf> {
    let path = out_dir.join(relative);
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("while creating {parent:?}"))?;
        }
    }
    std::fs::write(&path, content).with_context(|| format!("while writing {path:?}"))?;
    debug!("wrote {path:?}");
    Ok(path)
}

/// Copies the contents of `static_dir` into `out_dir` and returns the bytes
/// copied. A missing static directory is not an error.
pub(super) fn copy_static(static_dir: &Path, out_dir: &Path) -> anyhow::Result<u64> {
    if !static_dir.is_dir() {
        debug!("no static directory at {static_dir:?}");
        return Ok(0);
    }
    let mut cp_opts = CopyOptions::new();
    cp_opts.copy_inside = true;
    cp_opts.content_only = true;
    cp_opts.overwrite = true;
    fs_extra::dir::copy(static_dir, out_dir, &cp_opts)
        .with_context(|| format!("while copying {static_dir:?} into {out_dir:?}"))
}

pub(super) fn clean(out_dir: &Path) -> anyhow::Result<()> {
    if out_dir.exists() {
        fs_extra::dir::remove(out_dir).with_context(|| format!("while removing {out_dir:?}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_output_creates_parents_and_truncates() {
        let tmp = TempDir::new().unwrap();
        let rel = Path::new("2025/07/20/a.html");
        write_output(tmp.path(), rel, "a much longer first version").unwrap();
        let path = write_output(tmp.path(), rel, "short").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "short");
    }

    #[test]
    fn copies_static_contents_into_root() {
        let tmp = TempDir::new().unwrap();
        let static_dir = tmp.path().join("static");
        std::fs::create_dir_all(static_dir.join("css")).unwrap();
        std::fs::write(static_dir.join("css/site.css"), "body{}").unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        copy_static(&static_dir, &out).unwrap();
        assert!(out.join("css/site.css").exists());
        // second copy overwrites instead of failing
        copy_static(&static_dir, &out).unwrap();
        assert_eq!(copy_static(&tmp.path().join("missing"), &out).unwrap(), 0);
    }

    #[test]
    fn clean_removes_output() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(out.join("old")).unwrap();
        clean(&out).unwrap();
        assert!(!out.exists());
        clean(&out).unwrap();
    }
}

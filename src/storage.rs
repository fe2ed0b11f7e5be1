use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{info, warn};

/// 根目录下的一个条目
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: &str) -> Self {
        Self { name: name.to_string(), is_dir: false }
    }

    pub fn dir(name: &str) -> Self {
        Self { name: name.to_string(), is_dir: true }
    }
}

/// 存放图片的文件系统
pub trait Storage {
    type Entries: Iterator<Item = Entry>;

    /// 挂载/初始化文件系统，失败时整个程序无法继续
    fn mount(&mut self) -> Result<()>;

    fn root(&self) -> &Path;

    /// 打开根目录，逐个返回条目 (不递归)
    fn open_root(&self) -> Result<Self::Entries>;
}

/// 基于 std::fs 的目录 (主机目录，或已注册到 VFS 的 SPIFFS 分区)
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Storage for DirStorage {
    type Entries = DirEntries;

    fn mount(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(anyhow!("{} is not a directory", self.root.display()));
        }
        info!("storage mounted at {}", self.root.display());
        Ok(())
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn open_root(&self) -> Result<DirEntries> {
        Ok(DirEntries { inner: fs::read_dir(&self.root)? })
    }
}

pub struct DirEntries {
    inner: ReadDir,
}

impl Iterator for DirEntries {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("read dir entry: {err:?}");
                    continue;
                }
            };
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            return Some(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
    }
}

/// 只返回以 suffix 结尾 (区分大小写) 的文件名，跳过目录
pub struct JpegFiles<I> {
    entries: I,
    suffix: String,
}

impl<I: Iterator<Item = Entry>> JpegFiles<I> {
    pub fn new(entries: I, suffix: &str) -> Self {
        Self { entries, suffix: suffix.to_string() }
    }
}

impl<I: Iterator<Item = Entry>> Iterator for JpegFiles<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.entries
            .find(|entry| !entry.is_dir && entry.name.ends_with(&self.suffix))
            .map(|entry| entry.name)
    }
}

pub fn scan<S: Storage>(storage: &S, suffix: &str) -> Result<JpegFiles<S::Entries>> {
    Ok(JpegFiles::new(storage.open_root()?, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lowercase_jpg_files_are_yielded() {
        let entries = vec![
            Entry::file("a.jpg"),
            Entry::file("b.png"),
            Entry::dir("sub"),
            Entry::file("C.JPG"),
        ];
        let names: Vec<String> = JpegFiles::new(entries.into_iter(), ".jpg").collect();
        assert_eq!(names, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn directories_named_like_images_are_skipped() {
        let entries = vec![Entry::dir("album.jpg"), Entry::file("x.jpg")];
        let names: Vec<String> = JpegFiles::new(entries.into_iter(), ".jpg").collect();
        assert_eq!(names, vec!["x.jpg".to_string()]);
    }

    #[test]
    fn dir_storage_lists_top_level_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.png"), b"x").unwrap();
        fs::write(dir.path().join("C.JPG"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();
        fs::write(dir.path().join("sub.jpg").join("nested.jpg"), b"x").unwrap();

        let mut storage = DirStorage::new(dir.path());
        storage.mount().unwrap();
        let names: Vec<String> = scan(&storage, ".jpg").unwrap().collect();
        assert_eq!(names, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn mount_fails_without_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = DirStorage::new(dir.path().join("missing"));
        assert!(storage.mount().is_err());
    }
}

//! # 路径解析层
//!
//! 路径以 `/` 分隔；以 `/` 开头时从根目录出发，否则从工作目录出发。
//! `.` 与 `..` 就是目录中的普通目录项，不做特殊处理；连续的 `/` 视为一个。

use crate::{Error, MAX_PATH_LEN, ROOT_INODE, Result, SimpleFileSystem};

/// 解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// 解析到最后一项，可以是文件或目录
    Final,
    /// 解析到最后一项，且必须是目录
    Directory,
}

/// 拆出 `(父路径, 末项)`；末尾的 `/` 先被去掉
pub fn split_last(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        // 只有一层的绝对路径，父目录就是根目录
        Some(("", name)) => ("/", name),
        Some((parent, name)) => (parent, name),
        None if path.starts_with('/') => ("/", ""),
        None => ("", trimmed),
    }
}

/// 路径的合法性：非空，且不超过 [`MAX_PATH_LEN`]
pub fn check(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::EmptyPath);
    }
    if path.len() > MAX_PATH_LEN {
        return Err(Error::PathTooLong);
    }
    Ok(())
}

impl SimpleFileSystem {
    /// 从根目录或工作目录出发，逐项查找目录项，返回最后一项的inode ID
    pub(crate) fn resolve(&self, path: &str, mode: Resolve) -> Result<u32> {
        check(path)?;

        let (mut current, rest) = match path.strip_prefix('/') {
            Some(rest) => (ROOT_INODE, rest),
            None => (self.cwd, path),
        };

        for name in rest.split('/').filter(|name| !name.is_empty()) {
            // 中间项不是目录时 scan 报 NotADirectory
            current = self.find_entry(current, name)?.ok_or(Error::NotFound)?;
        }

        if mode == Resolve::Directory && !self.read_inode(current).is_dir() {
            return Err(Error::NotADirectory);
        }

        log::trace!("resolved {path:?} to inode {current}");
        Ok(current)
    }

    /// 解析最后一项所在的目录，返回 `(目录的inode ID, 末项名字)`。
    ///
    /// 父路径为空时就是出发目录。
    pub(crate) fn resolve_parent<'a>(&self, path: &'a str) -> Result<(u32, &'a str)> {
        check(path)?;

        let (parent, name) = split_last(path);
        let dir = if parent.is_empty() {
            self.cwd
        } else {
            self.resolve(parent, Resolve::Directory)?
        };

        Ok((dir, name))
    }
}

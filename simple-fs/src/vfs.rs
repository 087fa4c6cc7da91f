//! # 接口层
//!
//! 确立了文件系统对外的操作逻辑：打开、读写、关闭文件，
//! 创建、删除、切换目录，以及列出目录内容。
//! 每个操作都是同步完成的，返回时磁盘上的状态已经更新。

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use enumflags2::BitFlags;

use crate::file::{FileDesc, OpenFlag};
use crate::layout::InodeKind;
use crate::path::Resolve;
use crate::{Error, MAX_NAME_LEN, ROOT_INODE, Result, SimpleFileSystem};

/// 索引节点的元信息，[`SimpleFileSystem::stat`] 的返回类型。
///
/// 硬链接接口尚未实现，目前不会构造出这个类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub inode: u32,
    pub kind: InodeKind,
    pub links: u16,
    pub size: u32,
}

/// 目录中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub inode: u32,
    pub kind: InodeKind,
    pub size: u32,
}

/* 文件 */
impl SimpleFileSystem {
    /// 打开文件并返回文件描述符。
    ///
    /// 文件不存在且可写时，在父目录中新建普通文件；
    /// 目录只能以只读方式打开。
    pub fn open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> Result<usize> {
        if flags.is_empty() {
            return Err(Error::InvalidMode);
        }

        let inode_id = match self.resolve(path, Resolve::Final) {
            Ok(inode_id) => {
                if self.read_inode(inode_id).is_dir() && flags != OpenFlag::read_only() {
                    return Err(Error::IsADirectory);
                }
                inode_id
            }
            Err(Error::NotFound) if flags.contains(OpenFlag::WRONLY) => self.create_file(path)?,
            Err(err) => return Err(err),
        };

        let fd = self.fd_table.insert(FileDesc {
            inode_id,
            offset: 0,
            flags,
        })?;
        log::debug!("open {path:?} as fd={fd} (inode {inode_id})");
        Ok(fd)
    }

    /// 在父目录中新建空的普通文件。
    /// 描述符表已满时不创建。
    fn create_file(&mut self, path: &str) -> Result<u32> {
        let (dir, name) = self.resolve_parent(path)?;
        check_name(name)?;
        // 以 `/` 结尾的路径只能指向目录
        if path.ends_with('/') {
            return Err(Error::NotADirectory);
        }
        if self.fd_table.is_full() {
            return Err(Error::TooManyOpenFiles);
        }

        let inode_id = self.create_inode(InodeKind::File)?;
        if let Err(err) = self.add_entry(dir, inode_id, name) {
            self.free_inode(inode_id);
            return Err(err);
        }

        log::info!("created file {path:?} (inode {inode_id})");
        Ok(inode_id)
    }

    /// 释放描述符；已无链接、也不再被打开的索引节点随之归还
    pub fn close(&mut self, fd: usize) -> Result<()> {
        let desc = self.fd_table.remove(fd)?;
        let inode_id = desc.inode_id;

        if !self.fd_table.is_open(inode_id) && self.read_inode(inode_id).links == 0 {
            log::debug!("inode {inode_id} has no links left, freeing it");
            self.free_inode(inode_id);
        }
        Ok(())
    }

    /// 从读写位置起读取数据，返回读取的字节数；位于文件末尾时返回 0
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let desc = *self.fd_table.get(fd)?;
        if !desc.readable() {
            log::error!("fd={fd} is not readable");
            return Err(Error::PermissionDenied);
        }

        let inode = self.read_inode(desc.inode_id);
        let read_size = self.read_at(&inode, desc.offset, buf)?;
        self.fd_table.get_mut(fd)?.offset += read_size;
        Ok(read_size)
    }

    /// 从读写位置起写入数据，返回写入的字节数。
    ///
    /// 先把文件扩大到写入范围的末尾，扩大失败时什么也不写。
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize> {
        let desc = *self.fd_table.get(fd)?;
        if !desc.writable() {
            log::error!("fd={fd} is not writable");
            return Err(Error::PermissionDenied);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let end = desc.offset.checked_add(buf.len()).ok_or(Error::FileTooLarge)?;
        let mut inode = self.read_inode(desc.inode_id);
        self.grow(&mut inode, end)?;
        self.write_inode(desc.inode_id, &inode);

        let write_size = self.write_at(&inode, desc.offset, buf)?;
        self.fd_table.get_mut(fd)?.offset += write_size;
        Ok(write_size)
    }

    /// 设置读写位置，可以越过文件末尾
    pub fn seek(&mut self, fd: usize, offset: usize) -> Result<()> {
        self.fd_table.get_mut(fd)?.offset = offset;
        Ok(())
    }

    pub fn descriptor(&self, fd: usize) -> Result<FileDesc> {
        self.fd_table.get(fd).copied()
    }
}

/* 目录 */
impl SimpleFileSystem {
    /// 新建目录，预先写入指向自身的 `.` 与指向父目录的 `..`。
    ///
    /// 索引节点创建之后的任何失败都会归还它。
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let (parent, name) = self.resolve_parent(path)?;
        if matches!(name, "" | "." | "..") {
            return Err(Error::AlreadyExists);
        }
        check_name(name)?;
        if self.config.reject_duplicates && self.find_entry(parent, name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let inode_id = self.create_inode(InodeKind::Directory)?;
        let seeded = self
            .add_entry(inode_id, inode_id, ".")
            .and_then(|()| self.add_entry(inode_id, parent, ".."))
            .and_then(|()| self.add_entry(parent, inode_id, name));
        if let Err(err) = seeded {
            log::debug!("mkdir {path:?} failed, rolling back inode {inode_id}");
            self.free_inode(inode_id);
            return Err(err);
        }

        log::info!("created directory {path:?} (inode {inode_id})");
        Ok(())
    }

    /// 删除只含 `.` 与 `..` 的目录
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        let (parent, name) = self.resolve_parent(path)?;
        match name {
            // 只剩 `/`
            "" => return Err(Error::Busy),
            "." | ".." => return Err(Error::InvalidArgument),
            _ => {}
        }

        let inode_id = self.find_entry(parent, name)?.ok_or(Error::NotFound)?;
        if !self.read_inode(inode_id).is_dir() {
            return Err(Error::NotADirectory);
        }
        if inode_id == ROOT_INODE || inode_id == self.cwd || self.fd_table.is_open(inode_id) {
            return Err(Error::Busy);
        }
        if self.entry_count(inode_id) > 2 {
            return Err(Error::DirectoryNotEmpty);
        }

        self.remove_entry(parent, name)?;
        self.free_inode(inode_id);
        log::info!("removed directory {path:?} (inode {inode_id})");
        Ok(())
    }

    /// 切换工作目录
    pub fn chdir(&mut self, path: &str) -> Result<()> {
        self.cwd = self.resolve(path, Resolve::Directory)?;
        Ok(())
    }

    /// 工作目录的索引节点编号
    #[inline]
    pub fn cwd(&self) -> u32 {
        self.cwd
    }

    /// 解析路径，返回其索引节点编号
    pub fn lookup(&self, path: &str) -> Result<u32> {
        self.resolve(path, Resolve::Final)
    }

    /// 按存储顺序列出工作目录
    pub fn list(&self) -> Result<Vec<DirEntryInfo>> {
        self.list_inode(self.cwd)
    }

    pub fn list_at(&self, path: &str) -> Result<Vec<DirEntryInfo>> {
        let dir = self.resolve(path, Resolve::Directory)?;
        self.list_inode(dir)
    }

    fn list_inode(&self, dir: u32) -> Result<Vec<DirEntryInfo>> {
        let infos = self
            .entries(dir)?
            .iter()
            .map(|entry| {
                let inode = self.read_inode(entry.inode_id());
                DirEntryInfo {
                    name: entry.name().to_string(),
                    inode: entry.inode_id(),
                    kind: inode.kind,
                    size: inode.size,
                }
            })
            .collect();
        Ok(infos)
    }
}

/* 尚未实现的硬链接接口 */
impl SimpleFileSystem {
    pub fn link(&mut self, old_path: &str, new_path: &str) -> Result<()> {
        log::warn!("link {old_path:?} -> {new_path:?}: not implemented");
        Err(Error::Unimplemented)
    }

    pub fn unlink(&mut self, path: &str) -> Result<()> {
        log::warn!("unlink {path:?}: not implemented");
        Err(Error::Unimplemented)
    }

    pub fn stat(&self, path: &str) -> Result<Stat> {
        log::warn!("stat {path:?}: not implemented");
        Err(Error::Unimplemented)
    }
}

/// 新项的名字：非空，且不超过 [`MAX_NAME_LEN`]
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::NameTooLong);
    }
    Ok(())
}

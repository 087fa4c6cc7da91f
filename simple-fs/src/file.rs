//! # 文件描述符层
//!
//! 打开的文件通过固定容量的**文件描述符表**管理，
//! 表中的描述符记录索引节点、读写位置以及打开模式。
//! 同一索引节点可以被多个描述符引用，引用数靠扫描表得出。

use enumflags2::{BitFlags, bitflags};

use crate::{Error, MAX_OPEN_FILES, Result};

#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    /// 只读
    RDONLY = 0b01,
    /// 只写
    WRONLY = 0b10,
}

impl OpenFlag {
    /// 读写兼备
    pub const RDWR: u32 = 0b11;

    /// 只接受 1（只读）、2（只写）、3（读写）三种模式
    pub fn parse(raw: u32) -> Result<BitFlags<OpenFlag>> {
        BitFlags::from_bits(raw)
            .ok()
            .filter(|flags| !flags.is_empty())
            .ok_or(Error::InvalidMode)
    }

    #[inline]
    pub fn read_only() -> BitFlags<OpenFlag> {
        Self::RDONLY.into()
    }

    #[inline]
    pub fn write_only() -> BitFlags<OpenFlag> {
        Self::WRONLY.into()
    }

    #[inline]
    pub fn read_write() -> BitFlags<OpenFlag> {
        Self::RDONLY | Self::WRONLY
    }
}

/// 一个打开的文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDesc {
    pub(crate) inode_id: u32,
    /// **文件**内的偏移量
    pub(crate) offset: usize,
    pub(crate) flags: BitFlags<OpenFlag>,
}

impl FileDesc {
    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn readable(&self) -> bool {
        self.flags.contains(OpenFlag::RDONLY)
    }

    #[inline]
    pub fn writable(&self) -> bool {
        self.flags.contains(OpenFlag::WRONLY)
    }
}

#[derive(Debug)]
pub(crate) struct FdTable {
    slots: [Option<FileDesc>; MAX_OPEN_FILES],
}

impl FdTable {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_OPEN_FILES],
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// 占用编号最小的空槽
    pub fn insert(&mut self, desc: FileDesc) -> Result<usize> {
        let (fd, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(Error::TooManyOpenFiles)?;
        *slot = Some(desc);
        Ok(fd)
    }

    pub fn get(&self, fd: usize) -> Result<&FileDesc> {
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(Error::BadDescriptor)
    }

    pub fn get_mut(&mut self, fd: usize) -> Result<&mut FileDesc> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(Error::BadDescriptor)
    }

    pub fn remove(&mut self, fd: usize) -> Result<FileDesc> {
        self.slots
            .get_mut(fd)
            .and_then(Option::take)
            .ok_or(Error::BadDescriptor)
    }

    /// 是否还有描述符引用该索引节点
    pub fn is_open(&self, inode_id: u32) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|desc| desc.inode_id == inode_id)
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}

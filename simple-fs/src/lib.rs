//! # simple-fs
//!
//! 单卷、无日志的 UNIX 风格索引节点文件系统。
//!
//! 磁盘布局（逻辑块）：
//! 保留块 | 超级块 | 索引节点位图 | 数据块位图 | 索引节点区域 | 数据块区域 | 备份超级块

#![cfg_attr(not(test), no_std)]

extern crate alloc;

/* simple-fs 的整体架构，自上而下 */

// 接口层：open/read/write/mkdir 等文件系统操作
mod vfs;
pub use vfs::{DirEntryInfo, Stat};

// 路径解析层
mod path;

// 目录层：目录即是存放目录项数组的文件
mod directory;

// 文件描述符层
mod file;
pub use file::{FileDesc, OpenFlag};

// 索引节点存储层：索引节点的读写与数据块的挂载
mod store;

// 磁盘块管理器层：超级块与位图分配器
mod efs;
pub use efs::{FsConfig, FsUsage, SimpleFileSystem};

// 磁盘数据结构层
mod layout;
pub use layout::{InodeKind, MAX_FILE_BLOCKS, MAX_FILE_SIZE};

// 块适配层：逻辑块与物理扇区的换算
mod adapter;

mod error;
pub use error::{Error, Result};

pub use block_dev::{BlockDevice, RamDisk, SECTOR_SIZE};

pub const MAGIC: u32 = 0x5346_0001;
pub const BLOCK_SIZE: usize = 4096;
pub const BLOCK_BITS: usize = BLOCK_SIZE * 8;
/// 每个逻辑块包含的物理扇区数
pub const SECTORS_PER_BLOCK: usize = BLOCK_SIZE / SECTOR_SIZE;

/// 根目录的索引节点编号
pub const ROOT_INODE: u32 = 0;
/// 文件名的最大长度（字节）
pub const MAX_NAME_LEN: usize = 32;
/// 完整路径的最大长度（字节）
pub const MAX_PATH_LEN: usize = 256;
/// 文件描述符表的容量
pub const MAX_OPEN_FILES: usize = 32;

type DataBlock = [u8; BLOCK_SIZE];

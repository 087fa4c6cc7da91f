//! # 磁盘数据结构层
//!
//! simple-fs 的磁盘布局：
//! 保留块 | 超级块 | 索引节点位图 | 数据块位图 | 索引节点区域 | 数据块区域 | 备份超级块
//!
//! 所有结构都在块边界上显式地编码、解码（小端序），
//! 不把块缓冲区直接重解释为结构体。

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{
    BlockSlot, DIRECT_COUNT, DiskInode, INODE_SIZE, INODES_PER_BLOCK, InodeKind, MAX_FILE_BLOCKS,
    MAX_FILE_SIZE,
};

/// 文件项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::{DirEntry, ENTRIES_PER_BLOCK};

/// 超级块所在的逻辑块；0 号块保留给引导程序
pub const SUPER_BLOCK_ID: u32 = 1;
pub const INODE_BITMAP_BLOCK: u32 = SUPER_BLOCK_ID + 1;
pub const DATA_BITMAP_BLOCK: u32 = SUPER_BLOCK_ID + 2;
pub const INODE_AREA_START: u32 = SUPER_BLOCK_ID + 3;
/// 索引节点区域占用的块数
pub const INODE_AREA_BLOCKS: u32 = 8;
pub const DATA_AREA_START: u32 = INODE_AREA_START + INODE_AREA_BLOCKS;
/// 索引节点总数
pub const INODE_CAPACITY: usize = INODE_AREA_BLOCKS as usize * INODES_PER_BLOCK;

#[inline]
pub fn get_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

#[inline]
pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn get_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

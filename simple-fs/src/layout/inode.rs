//! 索引节点
//!
//! 一个索引节点指向 [`DIRECT_COUNT`] 个直接索引块，
//! 外加一个间接索引块：整个块连续存储**块编号**，每个编号都指向一个**数据块**。
//!
//! 块编号是数据块区域内的相对编号；编号是否有效只由 `size` 决定，0 号数据块同样合法。
//!
//! 目录的空间用于存放子项的元信息；
//! 文件的空间用于存放它的数据。

use super::{get_u16, get_u32, put_u16, put_u32};
use crate::BLOCK_SIZE;

/// 编码后的索引节点大小
pub const INODE_SIZE: usize = 32;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// 直接索引块可编号数量
pub const DIRECT_COUNT: usize = 11;
/// 间接索引块可编号数量，每个编号 2 字节
pub const INDIRECT_COUNT: usize = BLOCK_SIZE / 2;
/// 单个索引节点最多可索引的数据块数
pub const MAX_FILE_BLOCKS: usize = DIRECT_COUNT + INDIRECT_COUNT;
pub const MAX_FILE_SIZE: usize = MAX_FILE_BLOCKS * BLOCK_SIZE;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiskInode {
    /// 字节数
    pub size: u32,
    /// 类型
    pub kind: InodeKind,
    /// 硬链接个数
    pub links: u16,
    /// 直接索引块，存储容量：DIRECT_COUNT * BLOCK_SIZE 字节
    pub direct: [u16; DIRECT_COUNT],
    /// 指向一个间接索引块，仅当数据块多于 DIRECT_COUNT 时有效
    pub indirect: u16,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum InodeKind {
    #[default]
    Free = 0,
    Directory = 1,
    File = 2,
}

/// 逻辑块索引在索引节点中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSlot {
    /// 直接索引数组的下标
    Direct(usize),
    /// 间接索引块内的下标
    Indirect(usize),
}

impl BlockSlot {
    /// 超出可索引范围时返回空
    pub fn of(block_index: usize) -> Option<Self> {
        if block_index < DIRECT_COUNT {
            Some(Self::Direct(block_index))
        } else if block_index < MAX_FILE_BLOCKS {
            Some(Self::Indirect(block_index - DIRECT_COUNT))
        } else {
            None
        }
    }
}

impl DiskInode {
    /// 新建的索引节点：大小为 0，链接数为 1，没有数据块
    #[inline]
    pub fn new(kind: InodeKind) -> Self {
        Self {
            kind,
            links: 1,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    /// 当前占用的数据块数，不含间接索引块
    #[inline]
    pub fn data_blocks(&self) -> usize {
        Self::count_data_block(self.size as usize)
    }

    /// 当前占用的全部块数，含间接索引块
    pub fn total_blocks(&self) -> usize {
        let data_blocks = self.data_blocks();
        data_blocks + usize::from(data_blocks > DIRECT_COUNT)
    }

    /// 计算容纳指定数据量需要多少个**数据块**
    #[inline]
    pub fn count_data_block(size: usize) -> usize {
        size.div_ceil(BLOCK_SIZE)
    }

    pub fn decode(buf: &[u8]) -> Self {
        let kind = match get_u16(buf, 4) {
            1 => InodeKind::Directory,
            2 => InodeKind::File,
            _ => InodeKind::Free,
        };
        let mut direct = [0; DIRECT_COUNT];
        for (i, block) in direct.iter_mut().enumerate() {
            *block = get_u16(buf, 8 + 2 * i);
        }

        Self {
            size: get_u32(buf, 0),
            kind,
            links: get_u16(buf, 6),
            direct,
            indirect: get_u16(buf, 8 + 2 * DIRECT_COUNT),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        put_u32(buf, 0, self.size);
        put_u16(buf, 4, self.kind as u16);
        put_u16(buf, 6, self.links);
        for (i, &block) in self.direct.iter().enumerate() {
            put_u16(buf, 8 + 2 * i, block);
        }
        put_u16(buf, 8 + 2 * DIRECT_COUNT, self.indirect);
    }
}

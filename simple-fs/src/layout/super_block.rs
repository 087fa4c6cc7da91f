use super::{
    DATA_AREA_START, DATA_BITMAP_BLOCK, INODE_AREA_START, INODE_BITMAP_BLOCK, get_u32, put_u32,
};
use crate::{BLOCK_BITS, DataBlock, MAGIC};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位其它连续区域；
/// - 记录已分配的索引节点与数据块个数
///
/// 主副本位于 [`super::SUPER_BLOCK_ID`]，备份位于卷的最后一块，两者时刻保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 文件系统占据的逻辑块数
    pub total_blocks: u32,
    pub inode_bitmap_block: u32,
    pub inode_area_start: u32,
    /// 已分配的索引节点个数
    pub inode_count: u32,
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    pub data_bitmap_block: u32,
    pub data_area_start: u32,
    /// 已分配的数据块个数
    pub data_count: u32,
}

impl SuperBlock {
    /// 编码后占用的字节数
    pub const SIZE: usize = 32;

    pub fn new(total_blocks: u32) -> Self {
        Self {
            total_blocks,
            inode_bitmap_block: INODE_BITMAP_BLOCK,
            inode_area_start: INODE_AREA_START,
            inode_count: 0,
            magic: MAGIC,
            data_bitmap_block: DATA_BITMAP_BLOCK,
            data_area_start: DATA_AREA_START,
            data_count: 0,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 备份超级块的位置：卷的最后一块
    #[inline]
    pub fn backup_block(&self) -> u32 {
        self.total_blocks - 1
    }

    /// 数据块区域的容量，受限于单块位图能表示的位数
    pub fn data_capacity(&self) -> usize {
        let area = self.backup_block().saturating_sub(self.data_area_start) as usize;
        area.min(BLOCK_BITS)
    }

    pub fn decode(block: &DataBlock) -> Self {
        Self {
            total_blocks: get_u32(block, 0),
            inode_bitmap_block: get_u32(block, 4),
            inode_area_start: get_u32(block, 8),
            inode_count: get_u32(block, 12),
            magic: get_u32(block, 16),
            data_bitmap_block: get_u32(block, 20),
            data_area_start: get_u32(block, 24),
            data_count: get_u32(block, 28),
        }
    }

    pub fn encode(&self, block: &mut DataBlock) {
        put_u32(block, 0, self.total_blocks);
        put_u32(block, 4, self.inode_bitmap_block);
        put_u32(block, 8, self.inode_area_start);
        put_u32(block, 12, self.inode_count);
        put_u32(block, 16, self.magic);
        put_u32(block, 20, self.data_bitmap_block);
        put_u32(block, 24, self.data_area_start);
        put_u32(block, 28, self.data_count);
        block[Self::SIZE..].fill(0);
    }
}

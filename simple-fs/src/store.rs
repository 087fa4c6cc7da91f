//! # 索引节点存储层
//!
//! 索引节点按 [`INODE_SIZE`] 字节紧密排列在索引节点区域中，
//! 读写单个索引节点时整块读出、修改、再整块写回。
//!
//! 文件与目录共用同一套块挂载逻辑：
//! 逻辑块索引先经 [`BlockSlot::of`] 定位到直接或间接索引，再取得数据块编号。

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::adapter;
use crate::layout::{
    BlockSlot, DIRECT_COUNT, DiskInode, INODE_SIZE, INODES_PER_BLOCK, InodeKind, MAX_FILE_BLOCKS,
    get_u16, put_u16,
};
use crate::{BLOCK_SIZE, Error, Result, SimpleFileSystem};

impl SimpleFileSystem {
    /// 通过ID获取 inode 在磁盘上的位置：**块ID**以及**块内偏移**
    fn disk_inode_pos(&self, inode_id: u32) -> (u32, usize) {
        debug_assert!((inode_id as usize) < self.inode_bitmap.capacity());
        let block_id = self.super_block.inode_area_start + inode_id / INODES_PER_BLOCK as u32;
        let block_offset = inode_id as usize % INODES_PER_BLOCK * INODE_SIZE;

        (block_id, block_offset)
    }

    pub(crate) fn read_inode(&self, inode_id: u32) -> DiskInode {
        let (block_id, offset) = self.disk_inode_pos(inode_id);
        let mut block = [0; BLOCK_SIZE];
        adapter::read(&*self.device, block_id, &mut block);
        DiskInode::decode(&block[offset..offset + INODE_SIZE])
    }

    pub(crate) fn write_inode(&self, inode_id: u32, inode: &DiskInode) {
        let (block_id, offset) = self.disk_inode_pos(inode_id);
        let mut block = [0; BLOCK_SIZE];
        adapter::read(&*self.device, block_id, &mut block);
        inode.encode(&mut block[offset..offset + INODE_SIZE]);
        adapter::write(&*self.device, block_id, &block);
    }

    /// 分配并初始化一个新的索引节点
    pub(crate) fn create_inode(&mut self, kind: InodeKind) -> Result<u32> {
        let inode_id = self.alloc_inode()?;
        self.write_inode(inode_id, &DiskInode::new(kind));
        Ok(inode_id)
    }

    /// 归还索引节点占用的全部块（含间接索引块），再归还索引节点本身。
    /// 未分配的索引节点不做处理。
    pub(crate) fn free_inode(&mut self, inode_id: u32) {
        if !self.inode_bitmap.is_set(inode_id as usize) {
            return;
        }

        let mut inode = self.read_inode(inode_id);
        log::debug!("free inode {inode_id} with {} blocks", inode.total_blocks());
        self.shrink(&mut inode, 0);
        self.write_inode(inode_id, &DiskInode::default());
        self.dealloc_inode(inode_id);
    }

    /// 逻辑上 inode 指向一系列数据块，此处传入的是这些数据块的索引（逻辑索引），
    /// 然后返回数据块编号
    pub(crate) fn block_id(&self, inode: &DiskInode, block_index: usize) -> Result<u32> {
        match BlockSlot::of(block_index).ok_or(Error::FileTooLarge)? {
            BlockSlot::Direct(i) => Ok(inode.direct[i] as u32),
            BlockSlot::Indirect(i) => {
                let mut indirect = [0; BLOCK_SIZE];
                self.read_data(inode.indirect as u32, &mut indirect);
                Ok(get_u16(&indirect, 2 * i) as u32)
            }
        }
    }

    /// 从 `offset` 起读取数据，读到文件末尾为止，返回读取的字节数
    pub(crate) fn read_at(&self, inode: &DiskInode, offset: usize, buf: &mut [u8]) -> Result<usize> {
        let mut start = offset;
        let end = start.saturating_add(buf.len()).min(inode.size as usize);
        if start >= end {
            return Ok(0);
        }

        let mut block = [0; BLOCK_SIZE];
        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;

            self.read_data(self.block_id(inode, block_index)?, &mut block);
            // 绝对地址 % 块大小 = 块内偏移
            let src = &block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
            buf[read_size..read_size + block_read_size].copy_from_slice(src);

            read_size += block_read_size;
            start = current_block_end;
        }

        Ok(read_size)
    }

    /// 从 `offset` 起写入数据；调用者须先把 inode 扩大到足够的大小
    pub(crate) fn write_at(&self, inode: &DiskInode, offset: usize, buf: &[u8]) -> Result<usize> {
        let mut start = offset;
        let end = start.saturating_add(buf.len()).min(inode.size as usize);
        if start >= end {
            return Ok(0);
        }

        let mut block = [0; BLOCK_SIZE];
        let mut write_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;
            let block_id = self.block_id(inode, block_index)?;

            // 整块覆盖时无需先读出
            if block_write_size < BLOCK_SIZE {
                self.read_data(block_id, &mut block);
            }
            let dest = &mut block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_write_size];
            dest.copy_from_slice(&buf[write_size..write_size + block_write_size]);
            self.write_data(block_id, &block);

            write_size += block_write_size;
            start = current_block_end;
        }

        Ok(write_size)
    }

    /// 把 inode 扩大到 `new_size` 字节，逐块挂载新的数据块（必要时先挂载间接索引块）。
    ///
    /// 要么全部成功，要么归还本次分配的所有块并保持 inode 不变。
    /// 只修改内存中的 inode，由调用者写回。
    pub(crate) fn grow(&mut self, inode: &mut DiskInode, new_size: usize) -> Result<()> {
        let old_blocks = inode.data_blocks();
        let new_blocks = DiskInode::count_data_block(new_size);
        if new_blocks > MAX_FILE_BLOCKS {
            log::warn!("{new_size} bytes is beyond what one inode can index");
            return Err(Error::FileTooLarge);
        }

        let mut staged = *inode;
        let mut fresh = Vec::new();
        let mut indirect = Box::new([0; BLOCK_SIZE]);
        if old_blocks > DIRECT_COUNT {
            self.read_data(staged.indirect as u32, &mut indirect);
        }

        for block_index in old_blocks..new_blocks {
            if let Err(err) = self.mount_block(&mut staged, &mut indirect, block_index, &mut fresh) {
                log::debug!("growth failed, releasing {} blocks", fresh.len());
                for block_id in fresh {
                    self.dealloc_data(block_id);
                }
                return Err(err);
            }
        }

        if new_blocks > DIRECT_COUNT && new_blocks > old_blocks {
            self.write_data(staged.indirect as u32, &indirect);
        }

        staged.size = staged.size.max(new_size as u32);
        *inode = staged;
        Ok(())
    }

    /// 挂载第 `block_index` 个数据块，本次分配的块记入 `fresh`
    fn mount_block(
        &mut self,
        inode: &mut DiskInode,
        indirect: &mut [u8; BLOCK_SIZE],
        block_index: usize,
        fresh: &mut Vec<u32>,
    ) -> Result<()> {
        match BlockSlot::of(block_index).ok_or(Error::FileTooLarge)? {
            BlockSlot::Direct(i) => {
                let block_id = self.alloc_data()?;
                fresh.push(block_id);
                inode.direct[i] = block_id as u16;
            }
            BlockSlot::Indirect(i) => {
                // 首次越过直接索引，创建间接索引块
                if i == 0 {
                    let block_id = self.alloc_data()?;
                    fresh.push(block_id);
                    inode.indirect = block_id as u16;
                }
                let block_id = self.alloc_data()?;
                fresh.push(block_id);
                put_u16(indirect, 2 * i, block_id as u16);
            }
        }
        Ok(())
    }

    /// 把 inode 缩小到 `new_size` 字节，归还不再使用的数据块；
    /// 不再需要间接索引时一并归还间接索引块。
    /// 只修改内存中的 inode，由调用者写回。
    pub(crate) fn shrink(&mut self, inode: &mut DiskInode, new_size: usize) {
        let old_blocks = inode.data_blocks();
        let new_blocks = DiskInode::count_data_block(new_size);

        if old_blocks > new_blocks {
            let mut indirect = [0; BLOCK_SIZE];
            if old_blocks > DIRECT_COUNT {
                self.read_data(inode.indirect as u32, &mut indirect);
            }

            let drop_blocks: Vec<u32> = (new_blocks..old_blocks)
                .filter_map(|block_index| match BlockSlot::of(block_index)? {
                    BlockSlot::Direct(i) => Some(inode.direct[i] as u32),
                    BlockSlot::Indirect(i) => Some(get_u16(&indirect, 2 * i) as u32),
                })
                .collect();
            for block_id in drop_blocks {
                self.dealloc_data(block_id);
            }

            if old_blocks > DIRECT_COUNT && new_blocks <= DIRECT_COUNT {
                self.dealloc_data(inode.indirect as u32);
                inode.indirect = 0;
            }
            for block_index in new_blocks..old_blocks.min(DIRECT_COUNT) {
                inode.direct[block_index] = 0;
            }
        }

        inode.size = new_size as u32;
    }
}

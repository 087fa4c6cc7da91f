//! # 磁盘块管理器层
//!
//! 构建出磁盘的布局并使用：超级块的加载与格式化、
//! 索引节点与数据块的分配与回收。

use alloc::sync::Arc;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::adapter;
use crate::file::FdTable;
use crate::layout::*;
use crate::{BLOCK_SIZE, DataBlock, Error, ROOT_INODE, Result};

/// 挂载参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// 卷的逻辑块数，格式化以及寻找备份超级块时使用
    pub total_blocks: u32,
    /// 创建文件或目录时是否拒绝同名项
    pub reject_duplicates: bool,
}

/// 超级块中的空间计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsUsage {
    pub inodes: usize,
    pub inode_capacity: usize,
    pub data_blocks: usize,
    pub data_capacity: usize,
}

/// 已挂载的文件系统，持有全部运行时状态。
///
/// 所有操作都在调用线程上同步地完成；需要并发访问时，
/// 通过 [`SimpleFileSystem::into_shared`] 加一把全局锁。
#[derive(Debug)]
pub struct SimpleFileSystem {
    pub(crate) device: Arc<dyn BlockDevice>,
    pub(crate) config: FsConfig,
    pub(crate) super_block: SuperBlock,
    pub(crate) inode_bitmap: Bitmap,
    pub(crate) data_bitmap: Bitmap,
    pub(crate) fd_table: FdTable,
    /// 工作目录的索引节点编号
    pub(crate) cwd: u32,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            total_blocks: 2048,
            reject_duplicates: true,
        }
    }
}

impl FsConfig {
    /// 元数据之外至少要留出一个数据块
    pub const MIN_BLOCKS: u32 = DATA_AREA_START + 2;

    pub fn validate(&self) -> Result<()> {
        let sectors = self.total_blocks as u64 * crate::SECTORS_PER_BLOCK as u64;
        if self.total_blocks < Self::MIN_BLOCKS || sectors > u32::MAX as u64 {
            return Err(Error::InvalidGeometry);
        }
        Ok(())
    }
}

impl SimpleFileSystem {
    /// 挂载卷：先读主超级块，不合法则读备份并修复主超级块；
    /// 两者都不合法时格式化整个卷。
    ///
    /// 备份只能按 `config.total_blocks` 去找；找到主超级块后以磁盘上的布局为准，
    /// 备份与之不同时重写备份。
    pub fn mount(device: Arc<dyn BlockDevice>, config: FsConfig) -> Result<Self> {
        config.validate()?;

        let mut block = [0; BLOCK_SIZE];
        adapter::read(&*device, SUPER_BLOCK_ID, &mut block);
        let mut super_block = SuperBlock::decode(&block);

        if !super_block.is_valid() {
            adapter::read(&*device, config.total_blocks - 1, &mut block);
            super_block = SuperBlock::decode(&block);

            if !super_block.is_valid() {
                log::warn!(
                    "no super block at block {} nor at block {} (configured for {} blocks), formatting",
                    SUPER_BLOCK_ID,
                    config.total_blocks - 1,
                    config.total_blocks
                );
                return Self::create(device, config);
            }

            log::warn!("primary super block is corrupted, restored from backup");
            adapter::write(&*device, SUPER_BLOCK_ID, &block);
        }

        if super_block.total_blocks != config.total_blocks {
            log::warn!(
                "volume holds {} blocks but {} were configured, keeping the on-disk geometry",
                super_block.total_blocks,
                config.total_blocks
            );
        }

        let inode_bitmap = Bitmap::load(&*device, super_block.inode_bitmap_block, INODE_CAPACITY);
        let data_bitmap = Bitmap::load(
            &*device,
            super_block.data_bitmap_block,
            super_block.data_capacity(),
        );
        log::info!(
            "mounted: {} blocks, {} inodes and {} data blocks in use",
            super_block.total_blocks,
            super_block.inode_count,
            super_block.data_count
        );

        let efs = Self {
            device,
            config,
            super_block,
            inode_bitmap,
            data_bitmap,
            fd_table: FdTable::new(),
            cwd: ROOT_INODE,
        };

        let mut backup = [0; BLOCK_SIZE];
        adapter::read(&*efs.device, super_block.backup_block(), &mut backup);
        if backup != block {
            log::warn!("backup super block is stale, rewriting it");
            efs.sync_super_block();
        }

        Ok(efs)
    }

    /// 在设备上新建文件系统，不理会已有内容
    pub fn create(device: Arc<dyn BlockDevice>, config: FsConfig) -> Result<Self> {
        config.validate()?;

        let super_block = SuperBlock::new(config.total_blocks);
        let mut efs = Self {
            inode_bitmap: Bitmap::new(super_block.inode_bitmap_block, INODE_CAPACITY),
            data_bitmap: Bitmap::new(super_block.data_bitmap_block, super_block.data_capacity()),
            device,
            config,
            super_block,
            fd_table: FdTable::new(),
            cwd: ROOT_INODE,
        };
        efs.format()?;

        Ok(efs)
    }

    /// 重新格式化：写入超级块及其备份，清空两张位图，
    /// 创建只含 `.` 与 `..` 的根目录，并清空描述符表。
    pub fn format(&mut self) -> Result<()> {
        self.config.validate()?;

        self.super_block = SuperBlock::new(self.config.total_blocks);
        self.sync_super_block();

        self.inode_bitmap = Bitmap::new(self.super_block.inode_bitmap_block, INODE_CAPACITY);
        self.data_bitmap = Bitmap::new(
            self.super_block.data_bitmap_block,
            self.super_block.data_capacity(),
        );
        self.inode_bitmap.sync(&*self.device);
        self.data_bitmap.sync(&*self.device);
        self.fd_table.clear();

        let root = self.create_inode(InodeKind::Directory)?;
        assert_eq!(root, ROOT_INODE);
        self.add_entry(root, root, ".")?;
        self.add_entry(root, root, "..")?;
        self.cwd = ROOT_INODE;

        log::info!(
            "formatted: {} blocks, {} data blocks available",
            self.super_block.total_blocks,
            self.super_block.data_capacity()
        );
        Ok(())
    }

    /// 套上一把全局锁，供多个线程共享
    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn statfs(&self) -> FsUsage {
        FsUsage {
            inodes: self.super_block.inode_count as usize,
            inode_capacity: self.inode_bitmap.capacity(),
            data_blocks: self.super_block.data_count as usize,
            data_capacity: self.data_bitmap.capacity(),
        }
    }

    /// 一致性检查：计数等于位图中置位的个数，
    /// 内存中的位图与磁盘一致，主、备超级块相同。
    pub fn fsck(&self) -> Result<()> {
        let device = &*self.device;

        let inodes_used = self.inode_bitmap.count_ones();
        let data_used = self.data_bitmap.count_ones();
        if inodes_used != self.super_block.inode_count as usize
            || data_used != self.super_block.data_count as usize
        {
            log::error!(
                "counters disagree with bitmaps: inodes {}/{}, data blocks {}/{}",
                self.super_block.inode_count,
                inodes_used,
                self.super_block.data_count,
                data_used
            );
            return Err(Error::Corrupted);
        }

        if !self.inode_bitmap.matches_disk(device) || !self.data_bitmap.matches_disk(device) {
            log::error!("bitmap copies disagree with the disk");
            return Err(Error::Corrupted);
        }

        let mut primary = [0; BLOCK_SIZE];
        let mut backup = [0; BLOCK_SIZE];
        adapter::read(device, SUPER_BLOCK_ID, &mut primary);
        adapter::read(device, self.super_block.backup_block(), &mut backup);
        if SuperBlock::decode(&primary) != self.super_block || primary != backup {
            log::error!("super block copies disagree");
            return Err(Error::Corrupted);
        }

        Ok(())
    }
}

/* 分配器 */
impl SimpleFileSystem {
    /// 在磁盘上分配新的 inode 并返回其ID
    pub(crate) fn alloc_inode(&mut self) -> Result<u32> {
        let Some(inode_id) = self.inode_bitmap.alloc(&*self.device) else {
            log::warn!("run out of inodes");
            return Err(Error::NoFreeInode);
        };
        self.super_block.inode_count += 1;
        self.sync_super_block();

        log::debug!("alloc inode {inode_id}");
        Ok(inode_id)
    }

    pub(crate) fn dealloc_inode(&mut self, inode_id: u32) {
        if self.inode_bitmap.set(&*self.device, inode_id as usize, false) {
            self.super_block.inode_count -= 1;
            self.sync_super_block();
        }
        log::debug!("dealloc inode {inode_id}");
    }

    /// 在磁盘上分配新的数据块并返回其（数据区内的）编号，新块已清零
    pub(crate) fn alloc_data(&mut self) -> Result<u32> {
        let Some(block_id) = self.data_bitmap.alloc(&*self.device) else {
            log::warn!("run out of data blocks");
            return Err(Error::NoFreeBlock);
        };
        self.super_block.data_count += 1;
        self.sync_super_block();
        adapter::zero(&*self.device, self.super_block.data_area_start + block_id);

        log::debug!("alloc data block {block_id}");
        Ok(block_id)
    }

    pub(crate) fn dealloc_data(&mut self, block_id: u32) {
        if self.data_bitmap.set(&*self.device, block_id as usize, false) {
            self.super_block.data_count -= 1;
            self.sync_super_block();
        }
        log::debug!("dealloc data block {block_id}");
    }

    #[inline]
    pub(crate) fn read_data(&self, block_id: u32, block: &mut DataBlock) {
        adapter::read(&*self.device, self.super_block.data_area_start + block_id, block);
    }

    #[inline]
    pub(crate) fn write_data(&self, block_id: u32, block: &DataBlock) {
        adapter::write(&*self.device, self.super_block.data_area_start + block_id, block);
    }

    /// 超级块写回主副本与备份
    fn sync_super_block(&self) {
        let mut block = [0; BLOCK_SIZE];
        self.super_block.encode(&mut block);
        adapter::write(&*self.device, SUPER_BLOCK_ID, &block);
        adapter::write(&*self.device, self.super_block.backup_block(), &block);
    }
}

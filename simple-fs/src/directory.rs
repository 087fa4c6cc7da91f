//! # 目录层
//!
//! 目录是一个文件，内容是紧密排列的 [`DirEntry`] 数组，
//! 与普通文件一样经由直接、间接索引定位数据块。
//! 新目录项总是追加在 `size / DirEntry::SIZE` 处，查找按创建顺序线性扫描。

use alloc::vec::Vec;

use crate::layout::{DirEntry, DiskInode, ENTRIES_PER_BLOCK};
use crate::{BLOCK_SIZE, Error, Result, SimpleFileSystem};

impl SimpleFileSystem {
    /// 在目录 `dir` 末尾追加指向 `child` 的目录项；名字过长时截断。
    ///
    /// 需要新块时从分配器挂载，失败则目录保持不变。
    pub(crate) fn add_entry(&mut self, dir: u32, child: u32, name: &str) -> Result<()> {
        let mut dir_inode = self.read_inode(dir);
        if !dir_inode.is_dir() {
            return Err(Error::NotADirectory);
        }

        let slot = dir_inode.size as usize / DirEntry::SIZE;
        self.grow(&mut dir_inode, (slot + 1) * DirEntry::SIZE)?;
        self.put_entry_at(&dir_inode, slot, &DirEntry::new(name, child))?;

        self.write_inode(dir, &dir_inode);
        log::debug!("dir {dir}: entry {name:?} -> inode {child} at slot {slot}");
        Ok(())
    }

    /// 在目录下通过名字获取目录项的inode ID
    pub(crate) fn find_entry(&self, dir: u32, name: &str) -> Result<Option<u32>> {
        let dir_inode = self.read_inode(dir);
        self.scan(&dir_inode, |_, entry| {
            (entry.name() == name).then(|| entry.inode_id())
        })
    }

    /// 按存储顺序列出全部目录项
    pub(crate) fn entries(&self, dir: u32) -> Result<Vec<DirEntry>> {
        let dir_inode = self.read_inode(dir);
        let mut entries = Vec::with_capacity(dir_inode.size as usize / DirEntry::SIZE);
        self.scan(&dir_inode, |_, entry| {
            entries.push(entry.clone());
            None::<()>
        })?;
        Ok(entries)
    }

    /// 删除第一个名为 `name` 的目录项并返回其inode ID。
    ///
    /// 末尾的目录项挪进空位，目录缩小一项；末块因此变空时归还该块。
    pub(crate) fn remove_entry(&mut self, dir: u32, name: &str) -> Result<u32> {
        let mut dir_inode = self.read_inode(dir);
        let (slot, inode_id) = self
            .scan(&dir_inode, |slot, entry| {
                (entry.name() == name).then(|| (slot, entry.inode_id()))
            })?
            .ok_or(Error::NotFound)?;

        let last = dir_inode.size as usize / DirEntry::SIZE - 1;
        if slot != last {
            let last_entry = self.entry_at(&dir_inode, last)?;
            self.put_entry_at(&dir_inode, slot, &last_entry)?;
        }

        self.shrink(&mut dir_inode, last * DirEntry::SIZE);
        self.write_inode(dir, &dir_inode);
        log::debug!("dir {dir}: removed entry {name:?} (inode {inode_id})");
        Ok(inode_id)
    }

    /// 目录中的目录项个数
    #[inline]
    pub(crate) fn entry_count(&self, dir: u32) -> usize {
        self.read_inode(dir).size as usize / DirEntry::SIZE
    }

    /// 依次把 `(槽位, 目录项)` 交给 `f`，直到 `f` 返回结果。
    /// 先遍历直接索引的块，再遍历间接索引的块；每块只读一次。
    fn scan<T>(
        &self,
        dir_inode: &DiskInode,
        mut f: impl FnMut(usize, &DirEntry) -> Option<T>,
    ) -> Result<Option<T>> {
        if !dir_inode.is_dir() {
            return Err(Error::NotADirectory);
        }

        let count = dir_inode.size as usize / DirEntry::SIZE;
        let mut block = [0; BLOCK_SIZE];

        for block_index in 0..dir_inode.data_blocks() {
            self.read_data(self.block_id(dir_inode, block_index)?, &mut block);

            let first = block_index * ENTRIES_PER_BLOCK;
            let last = count.min(first + ENTRIES_PER_BLOCK);
            for slot in first..last {
                let offset = (slot - first) * DirEntry::SIZE;
                let entry = DirEntry::decode(&block[offset..offset + DirEntry::SIZE]);
                if let Some(found) = f(slot, &entry) {
                    return Ok(Some(found));
                }
            }
        }

        Ok(None)
    }

    fn entry_at(&self, dir_inode: &DiskInode, slot: usize) -> Result<DirEntry> {
        let block_id = self.block_id(dir_inode, slot / ENTRIES_PER_BLOCK)?;
        let offset = slot % ENTRIES_PER_BLOCK * DirEntry::SIZE;
        let mut block = [0; BLOCK_SIZE];
        self.read_data(block_id, &mut block);
        Ok(DirEntry::decode(&block[offset..offset + DirEntry::SIZE]))
    }

    fn put_entry_at(&self, dir_inode: &DiskInode, slot: usize, entry: &DirEntry) -> Result<()> {
        let block_id = self.block_id(dir_inode, slot / ENTRIES_PER_BLOCK)?;
        let offset = slot % ENTRIES_PER_BLOCK * DirEntry::SIZE;
        let mut block = [0; BLOCK_SIZE];
        self.read_data(block_id, &mut block);
        entry.encode(&mut block[offset..offset + DirEntry::SIZE]);
        self.write_data(block_id, &block);
        Ok(())
    }
}

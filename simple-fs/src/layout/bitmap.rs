use alloc::boxed::Box;
use core::fmt;

use block_dev::BlockDevice;

use crate::adapter;
use crate::{BLOCK_BITS, BLOCK_SIZE, DataBlock};

/// 位图，记录其指示区域的分配情况。
///
/// 位图占据一个逻辑块，内存中保留一份副本；
/// 每次修改都立即写回磁盘，两者始终一致。
pub struct Bitmap {
    /// 位图所在块
    block_id: u32,
    /// 位图所指示区域的总项数
    capacity: usize,
    bits: Box<DataBlock>,
    /// 下次分配的起始位置，不落盘，挂载时归零
    next: usize,
}

impl Bitmap {
    /// 全空的位图，尚未写回磁盘
    pub fn new(block_id: u32, capacity: usize) -> Self {
        assert!(capacity <= BLOCK_BITS);
        Self {
            block_id,
            capacity,
            bits: Box::new([0; BLOCK_SIZE]),
            next: 0,
        }
    }

    pub fn load(device: &dyn BlockDevice, block_id: u32, capacity: usize) -> Self {
        let mut bitmap = Self::new(block_id, capacity);
        adapter::read(device, block_id, &mut bitmap.bits);
        bitmap
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        let (byte, mask) = locate(index);
        self.bits[byte] & mask != 0
    }

    /// 已分配的项数
    pub fn count_ones(&self) -> usize {
        (0..self.capacity).filter(|&i| self.is_set(i)).count()
    }

    /// 从上次分配位置的下一项开始环形查找空闲项，
    /// 找到后置位、写回并返回其编号；绕回起点仍未找到则返回空。
    pub fn alloc(&mut self, device: &dyn BlockDevice) -> Option<u32> {
        let index = (0..self.capacity)
            .map(|step| (self.next + step) % self.capacity)
            .find(|&i| !self.is_set(i))?;

        self.set(device, index, true);
        self.next = (index + 1) % self.capacity;
        Some(index as u32)
    }

    /// 修改一位并写回，返回修改前的值。
    /// 即便值没有变化也会写回。
    pub fn set(&mut self, device: &dyn BlockDevice, index: usize, value: bool) -> bool {
        assert!(index < self.capacity, "bit {index} is out of the bitmap");
        let (byte, mask) = locate(index);
        let old = self.bits[byte] & mask != 0;

        if value {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
        self.sync(device);

        old
    }

    /// 把内存副本写回磁盘
    #[inline]
    pub fn sync(&self, device: &dyn BlockDevice) {
        adapter::write(device, self.block_id, &self.bits);
    }

    /// 与磁盘上的位图逐字节比较
    pub fn matches_disk(&self, device: &dyn BlockDevice) -> bool {
        let mut on_disk = [0; BLOCK_SIZE];
        adapter::read(device, self.block_id, &mut on_disk);
        on_disk == *self.bits
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("block_id", &self.block_id)
            .field("capacity", &self.capacity)
            .field("used", &self.count_ones())
            .field("next", &self.next)
            .finish()
    }
}

/// 编号在位图块中的位置：**字节偏移**以及**字节内掩码**
#[inline]
fn locate(index: usize) -> (usize, u8) {
    (index / 8, 1 << (index % 8))
}

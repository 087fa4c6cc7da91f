use super::{get_u16, put_u16};
use crate::{BLOCK_SIZE, MAX_NAME_LEN};

/// 名字字段的容量，最后一字节留给 \0
const NAME_CAP: usize = MAX_NAME_LEN + 1;
const NAME_OFFSET: usize = 2;

/// 每个目录块存放的目录项个数
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / DirEntry::SIZE;

/// 文件系统项的元信息
///
/// 磁盘上的编码：2 字节索引节点编号，33 字节以 \0 补齐的名字，其余保留。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    inode_id: u16,
    name: [u8; NAME_CAP],
}

impl DirEntry {
    /// 元信息大小恒为64字节
    pub const SIZE: usize = 64;

    /// 超出 [`MAX_NAME_LEN`] 的名字会被截断（在字符边界上）
    pub fn new(name: &str, inode_id: u32) -> Self {
        let mut len = name.len().min(MAX_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        let mut buf = [0; NAME_CAP];
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);

        Self {
            inode_id: inode_id as u16,
            name: buf,
        }
    }

    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(MAX_NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id as u32
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0; NAME_CAP];
        name[..MAX_NAME_LEN].copy_from_slice(&buf[NAME_OFFSET..NAME_OFFSET + MAX_NAME_LEN]);

        Self {
            inode_id: get_u16(buf, 0),
            name,
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[..Self::SIZE].fill(0);
        put_u16(buf, 0, self.inode_id);
        buf[NAME_OFFSET..NAME_OFFSET + NAME_CAP].copy_from_slice(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_tile_a_block() {
        assert_eq!(BLOCK_SIZE % DirEntry::SIZE, 0);
        assert!(NAME_OFFSET + NAME_CAP <= DirEntry::SIZE);
    }

    #[test]
    fn long_name_is_truncated() {
        let long = "a".repeat(MAX_NAME_LEN + 8);
        let entry = DirEntry::new(&long, 5);
        assert_eq!(entry.name(), &long[..MAX_NAME_LEN]);

        // 不会切断多字节字符
        let wide = "é".repeat(MAX_NAME_LEN);
        let entry = DirEntry::new(&wide, 5);
        assert_eq!(entry.name(), "é".repeat(MAX_NAME_LEN / 2));
    }

    #[test]
    fn decode_reverses_encode() {
        let entry = DirEntry::new("notes.txt", 300);
        let mut buf = [0xff; DirEntry::SIZE];
        entry.encode(&mut buf);

        assert_eq!(get_u16(&buf, 0), 300);
        assert_eq!(&buf[2..11], b"notes.txt");
        assert!(buf[11..].iter().all(|&b| b == 0));

        let decoded = DirEntry::decode(&buf);
        assert_eq!(decoded, entry);
        assert_eq!(decoded.name(), "notes.txt");
        assert_eq!(decoded.inode_id(), 300);
    }
}

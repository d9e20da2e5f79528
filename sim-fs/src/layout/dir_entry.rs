use core::{ptr, slice};

/// 目录项名字的长度上限；最后一字节留给 \0
pub const NAME_MAX_LEN: usize = 27;

/// 槽位已删除（墓碑）的哨兵 inode 编号
const TOMBSTONE: u32 = u32::MAX;

/// 目录项：目录 inode 的字节流就是此定长记录的数组
#[derive(Debug, Clone)]
#[repr(C)]
pub struct DirEntry {
    /// 指向的 inode 编号；哨兵值表示槽位已删除、可复用
    inode_id: u32,
    name: [u8; NAME_MAX_LEN + 1],
}

/// 槽位状态的内存视图；磁盘上仍以哨兵编号编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSlot {
    Occupied(u32),
    Tombstone,
}

impl DirEntry {
    /// 目录项大小恒为32字节
    pub const SIZE: usize = 32;

    #[inline]
    pub fn new(name: &str, inode_id: u32) -> Self {
        let bytes = name.as_bytes();
        debug_assert!(bytes.len() <= NAME_MAX_LEN);
        debug_assert_ne!(inode_id, TOMBSTONE);

        let mut name = [0; NAME_MAX_LEN + 1];
        name[..bytes.len()].copy_from_slice(bytes);

        Self { inode_id, name }
    }

    /// 墓碑槽位：编号置哨兵，名字清零
    #[inline]
    pub fn tombstone() -> Self {
        Self {
            inode_id: TOMBSTONE,
            name: [0; NAME_MAX_LEN + 1],
        }
    }

    #[inline]
    pub fn slot(&self) -> DirSlot {
        match self.inode_id {
            TOMBSTONE => DirSlot::Tombstone,
            inode_id => DirSlot::Occupied(inode_id),
        }
    }

    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}

impl Default for DirEntry {
    #[inline]
    fn default() -> Self {
        Self::tombstone()
    }
}

//! # 索引节点
//!
//! inode 以**直接索引**与**一级间接索引**指向数据块：
//! - 前 [`INODE_DIRECT_COUNT`] 个数据块的设备块编号直接记录在 inode 内；
//! - 其后的编号连续存储在一个间接索引块中。
//!
//! 索引槽位取值0表示**未分配**（设备块0是超级块，不会充当数据块）。
//! 已落在文件大小之内却未分配的槽位是空洞，读取时填零。

use alloc::vec::Vec;
use core::ops::Range;

use crate::block_cache::BlockCacheManager;
use crate::{DataBlock, Result, BLOCK_SIZE};

/// 直接索引槽位数
pub const INODE_DIRECT_COUNT: usize = 5;
/// 间接索引块的编号容量
const INDIRECT_COUNT: usize = BLOCK_SIZE / 4;
/// 文件大小上限：直接索引加一级间接索引所能覆盖的字节数
pub const MAX_FILE_SIZE: usize = (INODE_DIRECT_COUNT + INDIRECT_COUNT) * BLOCK_SIZE;

/// 间接索引块
pub type IndirectBlock = [u32; INDIRECT_COUNT];

/// 磁盘上的 inode 记录，恒为32字节
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DiskInode {
    kind: DiskInodeKind,
    // 不用usize是为了严控布局
    pub size: u32,
    /// 直接索引槽位，记录数据块的设备块编号
    direct: [u32; INODE_DIRECT_COUNT],
    /// 指向一个间接索引块
    indirect: u32,
}

/// inode 的有效性标签
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DiskInodeKind {
    /// 空闲；空闲记录的其余字段必须全零
    #[default]
    Free = 0,
    File = 1,
    Directory = 2,
}

impl DiskInode {
    #[inline]
    pub fn init(&mut self, kind: DiskInodeKind) {
        *self = Self {
            kind,
            ..Default::default()
        };
    }

    #[inline]
    pub fn kind(&self) -> DiskInodeKind {
        self.kind
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.kind == DiskInodeKind::Free
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == DiskInodeKind::Directory
    }

    /// 逻辑上 inode 指向一系列数据块，此处传入这些数据块的索引（逻辑索引），
    /// 返回设备块编号；0 表示槽位未分配
    pub fn block_id(&self, block_index: usize, cache: &mut BlockCacheManager) -> Result<u32> {
        if block_index < INODE_DIRECT_COUNT {
            Ok(self.direct[block_index])
        } else if self.indirect == 0 {
            Ok(0)
        } else {
            let id = cache
                .get(self.indirect as usize)?
                .lock()
                .map(0, |indirect: &IndirectBlock| {
                    // 剔去直接索引的部分
                    indirect[block_index - INODE_DIRECT_COUNT]
                });
            Ok(id)
        }
    }

    /// 为 `blocks` 范围内所有未分配的槽位按需分配数据块；
    /// 首次越过直接索引时还会先分配间接索引块本身。
    ///
    /// 分配器中途耗尽时，先前装入的块保持已分配且可由索引达到，
    /// 调用者此时不得推进文件大小。
    pub fn ensure_blocks(
        &mut self,
        blocks: Range<usize>,
        cache: &mut BlockCacheManager,
        mut alloc: impl FnMut(&mut BlockCacheManager) -> Result<u32>,
    ) -> Result<()> {
        if blocks.end > INODE_DIRECT_COUNT && self.indirect == 0 {
            self.indirect = alloc(cache)?;
        }

        for index in blocks {
            if index < INODE_DIRECT_COUNT {
                if self.direct[index] == 0 {
                    self.direct[index] = alloc(cache)?;
                }
                continue;
            }

            let entry_index = index - INODE_DIRECT_COUNT;
            let indirect = cache.get(self.indirect as usize)?;
            let occupied = indirect
                .lock()
                .map(0, |indirect: &IndirectBlock| indirect[entry_index] != 0);
            if !occupied {
                let new_block = alloc(cache)?;
                indirect.lock().map_mut(0, |indirect: &mut IndirectBlock| {
                    indirect[entry_index] = new_block
                });
            }
        }

        Ok(())
    }

    /// 从指定位置（字节偏移）读出数据填充`buf`，超出文件大小的部分裁掉，
    /// 空洞填零。返回实际读出的字节数。
    pub fn read_at(
        &self,
        offset: usize,
        buf: &mut [u8],
        cache: &mut BlockCacheManager,
    ) -> Result<usize> {
        let mut start = offset;
        let end = (offset + buf.len()).min(self.size as usize);

        if start >= end {
            return Ok(0);
        }

        // 已读取多少字节
        let mut read_size = 0;
        loop {
            // 当前块的逻辑索引
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址（字节）
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            match self.block_id(block_index, cache)? {
                0 => dest.fill(0),
                block_id => cache.get(block_id as usize)?.lock().map(
                    0,
                    |data_block: &DataBlock| {
                        // 绝对地址 % 块大小 = 块内偏移
                        let intra = start % BLOCK_SIZE;
                        dest.copy_from_slice(&data_block[intra..intra + block_read_size]);
                    },
                ),
            }

            read_size += block_read_size;

            if current_block_end == end {
                break;
            }

            start = current_block_end;
        }

        Ok(read_size)
    }

    /// 向指定位置写入`buf`的全部内容。
    /// 范围内的槽位必须已由 [`ensure_blocks`](DiskInode::ensure_blocks) 补齐；
    /// 写入不裁剪到文件大小，成功后由调用者推进 `size`。
    pub fn write_at(
        &mut self,
        offset: usize,
        buf: &[u8],
        cache: &mut BlockCacheManager,
    ) -> Result<usize> {
        let mut start = offset;
        let end = offset + buf.len();

        let mut written_size = 0;
        loop {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;
            let src = &buf[written_size..written_size + block_write_size];

            let block_id = self.block_id(block_index, cache)?;
            debug_assert_ne!(block_id, 0);
            cache
                .get(block_id as usize)?
                .lock()
                .map_mut(0, |data_block: &mut DataBlock| {
                    let intra = start % BLOCK_SIZE;
                    data_block[intra..intra + block_write_size].copy_from_slice(src);
                });

            written_size += block_write_size;

            if current_block_end == end {
                break;
            }

            start = current_block_end;
        }

        Ok(written_size)
    }

    /// 释放该 inode 拥有的全部块：遍历所有直接槽位与间接索引块内的槽位，
    /// 返回待回收的设备块编号（含间接索引块本身），并把记录清零。
    ///
    /// 不以文件大小为界，这样先前写入中途失败遗留的块也一并回收。
    pub fn clear(&mut self, cache: &mut BlockCacheManager) -> Result<Vec<u32>> {
        let mut drop_blocks: Vec<u32> =
            self.direct.iter().copied().filter(|&id| id != 0).collect();

        if self.indirect != 0 {
            cache
                .get(self.indirect as usize)?
                .lock()
                .map(0, |indirect: &IndirectBlock| {
                    drop_blocks.extend(indirect.iter().copied().filter(|&id| id != 0));
                });
            drop_blocks.push(self.indirect);
        }

        *self = Self::default();
        Ok(drop_blocks)
    }
}

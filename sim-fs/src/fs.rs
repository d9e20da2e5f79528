//! # 文件系统上下文层
//!
//! [`SimFileSystem`] 是一次挂载的上下文：持有块设备与
//! 超级块、两张位图的内存副本，构建出磁盘的布局并使用。
//!
//! 格式化策略：索引节点区域取设备总块数的十分之一（下限一块），
//! 每块容纳 `BLOCK_SIZE / 32` 条记录。挂载只依赖超级块中记下的
//! 参数、以同一算式推导各区域边界，故格式化与挂载不会漂移。
//!
//! 上下文不可跨线程并发使用：所有操作都要求 `&mut self`，
//! 独占借用即是单写者模型。

use alloc::sync::Arc;
use core::mem;

use block_dev::BlockDevice;

use crate::block_cache::BlockCacheManager;
use crate::layout::*;
use crate::{DataBlock, Error, Result};
use crate::{BLOCK_BITS, BLOCK_SIZE};

const INODE_SIZE: usize = mem::size_of::<DiskInode>();
const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// 索引节点区域紧随超级块之后
const INODE_AREA_START_BLOCK: usize = 1;

/// 设备总块数中索引节点区域所占的份额分母
const INODE_AREA_RATIO: usize = 10;

#[derive(Debug)]
pub struct SimFileSystem {
    cache: BlockCacheManager,
    super_block: SuperBlock,
    inode_bitmap: Bitmap,
    data_bitmap: Bitmap,
    data_area_start_block: u32,
}

impl SimFileSystem {
    /// 格式化：划分各区域并写入全空闲的初始状态。
    /// 不创建任何 inode，根目录也由调用者用 [`dir_create`](Self::dir_create) 建立。
    pub fn format(device: Arc<dyn BlockDevice>) -> Result<()> {
        let total_blocks = device.num_blocks();

        let inode_area_blocks = (total_blocks / INODE_AREA_RATIO).max(1);
        let inodes = inode_area_blocks * INODES_PER_BLOCK;
        let inode_bitmap_blocks = inodes.div_ceil(BLOCK_BITS);

        let meta_blocks = INODE_AREA_START_BLOCK + inode_area_blocks + inode_bitmap_blocks;
        if total_blocks <= meta_blocks {
            return Err(Error::DeviceTooSmall);
        }
        let rest = total_blocks - meta_blocks;
        // 每个位图块多管一个块自身，照此摊派剩余空间
        let data_bitmap_blocks = (rest + BLOCK_BITS) / (BLOCK_BITS + 1);
        let data_area_blocks = rest - data_bitmap_blocks;
        if data_area_blocks == 0 {
            return Err(Error::DeviceTooSmall);
        }

        log::info!(
            "formatting: total_blocks={total_blocks} inodes={inodes} data_area_blocks={data_area_blocks}"
        );

        let mut cache = BlockCacheManager::new(device);

        // 全盘清零：位图即全空闲，空闲数据块恒为全零
        for block_id in 0..total_blocks {
            cache
                .get(block_id)?
                .lock()
                .map_mut(0, |data_block: &mut DataBlock| data_block.fill(0));
        }

        cache.get(0)?.lock().map_mut(0, |super_block: &mut SuperBlock| {
            super_block.init(
                total_blocks as u32,
                inode_area_blocks as u32,
                inodes as u32,
                data_bitmap_blocks as u32,
            )
        });

        cache.sync_all()
    }

    /// 挂载：校验超级块，读入两张位图，构建可操作的上下文
    pub fn mount(device: Arc<dyn BlockDevice>) -> Result<Self> {
        let mut cache = BlockCacheManager::new(device);

        let super_block = cache.get(0)?.lock().map(0, |sb: &SuperBlock| sb.clone());
        if !super_block.is_valid() {
            return Err(Error::BadMagic);
        }
        if super_block.total_blocks as usize > cache.device().num_blocks() {
            return Err(Error::DeviceTooSmall);
        }

        let inodes = super_block.inodes as usize;
        let inode_bitmap_start = INODE_AREA_START_BLOCK + super_block.inode_area_blocks as usize;
        let inode_bitmap_blocks = inodes.div_ceil(BLOCK_BITS);
        let data_bitmap_start = inode_bitmap_start + inode_bitmap_blocks;
        let data_area_start = data_bitmap_start + super_block.data_bitmap_blocks as usize;
        let data_area_blocks = (super_block.total_blocks as usize)
            .checked_sub(data_area_start)
            .filter(|&blocks| blocks > 0)
            .ok_or(Error::DeviceTooSmall)?;

        let mut inode_bitmap = Bitmap::new(inode_bitmap_start, inode_bitmap_blocks, inodes);
        let mut data_bitmap = Bitmap::new(
            data_bitmap_start,
            super_block.data_bitmap_blocks as usize,
            data_area_blocks,
        );
        inode_bitmap.load(&mut cache)?;
        data_bitmap.load(&mut cache)?;

        log::debug!(
            "mounted: total_blocks={} free_inodes={} free_data_blocks={}",
            super_block.total_blocks,
            inode_bitmap.count_free(),
            data_bitmap.count_free(),
        );

        Ok(Self {
            cache,
            super_block,
            inode_bitmap,
            data_bitmap,
            data_area_start_block: data_area_start as u32,
        })
    }

    /// 卸载：把分配状态写回并强制所有脏块落盘，而后释放设备
    pub fn unmount(mut self) -> Result<()> {
        self.flush()?;
        self.cache.sync_all()
        // Drop 中还会尽力写回一次，幂等
    }

    /// 把内存中的位图与超级块写回块缓存
    pub fn flush(&mut self) -> Result<()> {
        self.inode_bitmap.save(&mut self.cache)?;
        self.data_bitmap.save(&mut self.cache)?;

        let super_block = self.super_block.clone();
        self.cache
            .get(0)?
            .lock()
            .map_mut(0, |sb: &mut SuperBlock| *sb = super_block);
        Ok(())
    }

    /// 容量内仍然空闲的 inode 个数
    #[inline]
    pub fn free_inodes(&self) -> usize {
        self.inode_bitmap.count_free()
    }

    /// 数据区仍然空闲的块数
    #[inline]
    pub fn free_data_blocks(&self) -> usize {
        self.data_bitmap.count_free()
    }
}

impl SimFileSystem {
    /// 分配一个新的文件 inode：位图置位、字段全零、标签置为文件
    #[inline]
    pub fn create(&mut self) -> Result<u32> {
        self.create_inode(DiskInodeKind::File)
    }

    /// 读取 inode 字节流中 `offset` 起的数据填充 `buf`，
    /// 返回实际读到的字节数；`offset` 超出文件大小时读到 0 字节
    pub fn read(&mut self, inode_id: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let (block_id, block_offset) = self.disk_inode_pos(inode_id)?;
        let entry = self.cache.get(block_id)?;
        let guard = entry.lock();
        let disk_inode: &DiskInode = guard.get(block_offset);

        if disk_inode.is_free() {
            return Err(Error::FreeInode);
        }

        disk_inode.read_at(offset, buf, &mut self.cache)
    }

    /// 向 inode 字节流的 `offset` 处写入 `buf` 的全部内容。
    ///
    /// 本次请求涉及的块先按需分配补齐，数据全部落下后才推进文件大小；
    /// 中途失败不回滚已分配的块，但大小一定不变。
    /// 跳过当前文件末尾的写入不为空隙分配块，空隙读出时即是零。
    pub fn write(&mut self, inode_id: u32, buf: &[u8], offset: usize) -> Result<usize> {
        let end = offset.checked_add(buf.len()).ok_or(Error::FileTooLarge)?;
        if end > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }

        let (block_id, block_offset) = self.disk_inode_pos(inode_id)?;
        let entry = self.cache.get(block_id)?;
        let mut guard = entry.lock();
        let disk_inode: &mut DiskInode = guard.get_mut(block_offset);

        if disk_inode.is_free() {
            return Err(Error::FreeInode);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let blocks = offset / BLOCK_SIZE..end.div_ceil(BLOCK_SIZE);
        let data_area_start_block = self.data_area_start_block;
        let data_bitmap = &mut self.data_bitmap;
        disk_inode.ensure_blocks(blocks, &mut self.cache, |cache| {
            let id = data_bitmap.alloc().ok_or(Error::OutOfBlocks)?;
            let block_id = data_area_start_block + id;
            // 新块先清零，部分写落在确定的内容上
            cache
                .get(block_id as usize)?
                .lock()
                .map_mut(0, |data_block: &mut DataBlock| data_block.fill(0));
            Ok(block_id)
        })?;

        let written = disk_inode.write_at(offset, buf, &mut self.cache)?;
        disk_inode.size = disk_inode.size.max(end as u32);
        Ok(written)
    }

    /// 释放一个 inode：归还其全部数据块与间接索引块，
    /// 清除位图中的占用位并把记录清零。
    ///
    /// 不检查也不修正别处仍指向它的目录项，悬挂引用由调用者负责。
    pub fn remove(&mut self, inode_id: u32) -> Result<()> {
        let (block_id, block_offset) = self.disk_inode_pos(inode_id)?;
        let entry = self.cache.get(block_id)?;
        let mut guard = entry.lock();
        let disk_inode: &mut DiskInode = guard.get_mut(block_offset);

        if disk_inode.is_free() {
            return Err(Error::FreeInode);
        }

        for block in disk_inode.clear(&mut self.cache)? {
            debug_assert!(block >= self.data_area_start_block);
            self.data_bitmap.dealloc(block - self.data_area_start_block);
        }
        self.inode_bitmap.dealloc(inode_id);

        Ok(())
    }

    /// inode 的有效性标签与当前大小
    pub fn inode_meta(&mut self, inode_id: u32) -> Result<(DiskInodeKind, u32)> {
        let (block_id, block_offset) = self.disk_inode_pos(inode_id)?;
        let meta = self
            .cache
            .get(block_id)?
            .lock()
            .map(block_offset, |inode: &DiskInode| (inode.kind(), inode.size));
        Ok(meta)
    }

    pub(crate) fn create_inode(&mut self, kind: DiskInodeKind) -> Result<u32> {
        let inode_id = self.inode_bitmap.alloc().ok_or(Error::OutOfInodes)?;
        let (block_id, block_offset) = self.disk_inode_pos(inode_id)?;
        self.cache
            .get(block_id)?
            .lock()
            .map_mut(block_offset, |inode: &mut DiskInode| inode.init(kind));
        Ok(inode_id)
    }

    /// 通过编号获取 inode 在磁盘上的位置：**块编号**以及**块内偏移**
    fn disk_inode_pos(&self, inode_id: u32) -> Result<(usize, usize)> {
        let inode_id = inode_id as usize;
        if inode_id >= self.super_block.inodes as usize {
            return Err(Error::BadInodeId);
        }

        let block_id = INODE_AREA_START_BLOCK + inode_id / INODES_PER_BLOCK;
        let block_offset = inode_id % INODES_PER_BLOCK * INODE_SIZE;
        Ok((block_id, block_offset))
    }
}

impl Drop for SimFileSystem {
    fn drop(&mut self) {
        // 显式 unmount 之外的退出路径也尽力持久化；脏块随缓存的 Drop 写回
        if let Err(err) = self.flush() {
            log::error!("flush on drop failed: {err:?}");
        }
    }
}

//! # 目录层
//!
//! 目录就是标签为目录的普通 inode，其字节流是32字节定长记录
//! [`DirEntry`] 的数组，完全经由文件层的读写访问：
//! 以32字节步长线性扫描，删除只写墓碑、从不紧缩，
//! 新增优先复用最早的墓碑槽位。

use crate::layout::{DirEntry, DirSlot, DiskInodeKind, NAME_MAX_LEN};
use crate::{Error, Result, SimFileSystem};

impl SimFileSystem {
    /// 分配一个新的目录 inode，大小为0
    #[inline]
    pub fn dir_create(&mut self) -> Result<u32> {
        self.create_inode(DiskInodeKind::Directory)
    }

    /// 在目录中登记 `name -> inode_id`。
    ///
    /// 为了查重必须扫完整个目录，不在首个墓碑处停下，
    /// 途中记住最早的墓碑；存在同名存活槽位时不写入任何记录。
    pub fn dir_add(&mut self, dir_inode: u32, name: &str, inode_id: u32) -> Result<()> {
        if name.len() > NAME_MAX_LEN {
            return Err(Error::NameTooLong);
        }
        let size = self.require_dir(dir_inode)?;

        let mut reusable = None;
        let mut dir_entry = DirEntry::default();
        for offset in (0..size).step_by(DirEntry::SIZE) {
            self.read_entry(dir_inode, &mut dir_entry, offset)?;
            match dir_entry.slot() {
                DirSlot::Occupied(_) if dir_entry.name() == name => {
                    return Err(Error::AlreadyExists);
                }
                DirSlot::Tombstone if reusable.is_none() => reusable = Some(offset),
                _ => {}
            }
        }

        // 有墓碑就地复用，否则在末尾追加、目录随之增长32字节
        let offset = reusable.unwrap_or(size);
        let dir_entry = DirEntry::new(name, inode_id);
        self.write(dir_inode, dir_entry.as_bytes(), offset)?;
        Ok(())
    }

    /// 按名字查找存活槽位，返回其 inode 编号
    pub fn dir_lookup(&mut self, dir_inode: u32, name: &str) -> Result<u32> {
        let size = self.require_dir(dir_inode)?;

        let mut dir_entry = DirEntry::default();
        for offset in (0..size).step_by(DirEntry::SIZE) {
            self.read_entry(dir_inode, &mut dir_entry, offset)?;
            match dir_entry.slot() {
                DirSlot::Occupied(inode_id) if dir_entry.name() == name => return Ok(inode_id),
                _ => {}
            }
        }

        Err(Error::NotFound)
    }

    /// 把首个同名存活槽位改写为墓碑，返回其 inode 编号。
    /// 槽位从不回收，目录大小不会因删除缩小。
    pub fn dir_remove(&mut self, dir_inode: u32, name: &str) -> Result<u32> {
        let size = self.require_dir(dir_inode)?;

        let mut dir_entry = DirEntry::default();
        for offset in (0..size).step_by(DirEntry::SIZE) {
            self.read_entry(dir_inode, &mut dir_entry, offset)?;
            match dir_entry.slot() {
                DirSlot::Occupied(inode_id) if dir_entry.name() == name => {
                    self.write(dir_inode, DirEntry::tombstone().as_bytes(), offset)?;
                    return Ok(inode_id);
                }
                _ => {}
            }
        }

        Err(Error::NotFound)
    }
}

impl SimFileSystem {
    /// 目录操作的前置检查：必须是目录 inode，顺带返回其当前大小
    fn require_dir(&mut self, dir_inode: u32) -> Result<usize> {
        match self.inode_meta(dir_inode)? {
            (DiskInodeKind::Directory, size) => Ok(size as usize),
            _ => Err(Error::NotADirectory),
        }
    }

    fn read_entry(&mut self, dir_inode: u32, dir_entry: &mut DirEntry, offset: usize) -> Result<()> {
        let read = self.read(dir_inode, dir_entry.as_bytes_mut(), offset)?;
        // 目录大小恒为32的倍数，槽位不会读出半截
        assert_eq!(read, DirEntry::SIZE);
        Ok(())
    }
}

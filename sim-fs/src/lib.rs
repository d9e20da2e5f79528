#![no_std]

extern crate alloc;

/* sim-fs 的整体架构，自上而下 */

// 目录层：把目录 inode 的字节流当作定长记录数组使用
mod dir;

// 文件系统上下文层：格式化、挂载，以及 inode 的创建、读写、删除
mod fs;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

// 块缓存层：内存上的磁盘块数据缓存
mod block_cache;

mod error;

pub use self::{
    error::{Error, Result},
    fs::SimFileSystem,
    layout::{
        DirEntry, DirSlot, DiskInode, DiskInodeKind, IndirectBlock, SuperBlock, MAX_FILE_SIZE,
        NAME_MAX_LEN,
    },
};

pub const MAGIC: u32 = 0x5346_5331;
pub const BLOCK_SIZE: usize = 4096;
pub const BLOCK_BITS: usize = BLOCK_SIZE * 8;

type DataBlock = [u8; BLOCK_SIZE];

//! # 磁盘数据结构层
//!
//! sim-fs 的磁盘布局：
//! 超级块 | 索引节点区域 | 索引节点位图 | 数据块位图 | 数据块区域

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{DiskInode, DiskInodeKind, IndirectBlock, INODE_DIRECT_COUNT, MAX_FILE_SIZE};

/// 目录项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::{DirEntry, DirSlot, NAME_MAX_LEN};

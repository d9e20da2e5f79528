use crate::MAGIC;

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录格式化时确定的分区参数，其余区域边界由此推导
#[derive(Debug, Clone)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// 索引节点区域占据块数
    pub inode_area_blocks: u32,
    /// 索引节点总容量
    pub inodes: u32,
    /// 数据块位图占据块数
    pub data_bitmap_blocks: u32,
}

impl SuperBlock {
    #[inline]
    pub fn init(
        &mut self,
        total_blocks: u32,
        inode_area_blocks: u32,
        inodes: u32,
        data_bitmap_blocks: u32,
    ) {
        *self = Self {
            magic: MAGIC,
            total_blocks,
            inode_area_blocks,
            inodes,
            data_bitmap_blocks,
        };
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }
}

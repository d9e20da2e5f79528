//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘或一个扁平的镜像文件；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 驱动必须保证：
//! - 每次访问恰好一整块，不存在部分块操作；
//! - 块编号越界或底层介质出错时返回 [`DeviceError`]，而非部分成功。

#![no_std]

use core::fmt::Debug;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Debug {
    /// 设备的总块数
    fn num_blocks(&self) -> usize;

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;
}

/// 设备层的错误，对上层统一表现为 I/O 失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// 块编号超出设备容量
    OutOfRange,
    /// 底层介质读写失败
    Io,
}

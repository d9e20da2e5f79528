use std::sync::{Arc, Mutex};

use block_dev::{BlockDevice, DeviceError};
use sim_fs::{SimFileSystem, BLOCK_SIZE};

/// 内存里的虚拟磁盘，供不落盘的测试场景使用
#[derive(Debug)]
pub struct MemDisk {
    blocks: Mutex<Vec<[u8; BLOCK_SIZE]>>,
}

impl MemDisk {
    pub fn new(num_blocks: usize) -> Self {
        Self {
            blocks: Mutex::new(vec![[0; BLOCK_SIZE]; num_blocks]),
        }
    }
}

impl BlockDevice for MemDisk {
    fn num_blocks(&self) -> usize {
        self.blocks.lock().unwrap().len()
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let blocks = self.blocks.lock().unwrap();
        let block = blocks.get(block_id).ok_or(DeviceError::OutOfRange)?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let mut blocks = self.blocks.lock().unwrap();
        let block = blocks.get_mut(block_id).ok_or(DeviceError::OutOfRange)?;
        block.copy_from_slice(buf);
        Ok(())
    }
}

/// 格式化并挂载一块新的内存磁盘
pub fn setup(num_blocks: usize) -> (Arc<MemDisk>, SimFileSystem) {
    let disk = Arc::new(MemDisk::new(num_blocks));
    SimFileSystem::format(disk.clone()).unwrap();
    let fs = SimFileSystem::mount(disk.clone()).unwrap();
    (disk, fs)
}

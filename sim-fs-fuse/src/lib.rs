#[cfg(test)]
mod tests;

use std::fs::OpenOptions;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use block_dev::{BlockDevice, DeviceError};
use sim_fs::BLOCK_SIZE;

/// 文件承载的虚拟磁盘：一个扁平镜像文件，按块粒度读写
#[derive(Debug)]
pub struct BlockFile {
    file: Mutex<std::fs::File>,
    num_blocks: usize,
}

impl BlockFile {
    /// 新建（或截断重建）一个 `num_blocks` 块的虚拟磁盘文件
    pub fn create(path: impl AsRef<Path>, num_blocks: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len((num_blocks * BLOCK_SIZE) as u64)?;

        Ok(Self {
            file: Mutex::new(file),
            num_blocks,
        })
    }

    /// 打开既有的虚拟磁盘文件，块数由文件长度推得
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "image size is not a whole number of blocks",
            ));
        }

        Ok(Self {
            file: Mutex::new(file),
            num_blocks: (len / BLOCK_SIZE as u64) as usize,
        })
    }
}

impl BlockDevice for BlockFile {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        if block_id >= self.num_blocks {
            return Err(DeviceError::OutOfRange);
        }

        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .map_err(io_error("seeking to", block_id))?;
        file.read_exact(buf).map_err(io_error("reading", block_id))
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if block_id >= self.num_blocks {
            return Err(DeviceError::OutOfRange);
        }

        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .map_err(io_error("seeking to", block_id))?;
        file.write_all(buf).map_err(io_error("writing", block_id))
    }
}

fn io_error(action: &'static str, block_id: usize) -> impl FnOnce(io::Error) -> DeviceError {
    move |err| {
        log::error!("{action} block {block_id} failed: {err}");
        DeviceError::Io
    }
}

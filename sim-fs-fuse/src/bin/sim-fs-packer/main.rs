mod cli;

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use sim_fs::SimFileSystem;
use sim_fs_fuse::BlockFile;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let image = cli.out_dir.join("fs.img");
    println!("source={:?}\nimage={image:?}", cli.source);

    let block_file = Arc::new(BlockFile::create(&image, cli.blocks)?);

    SimFileSystem::format(block_file.clone()).expect("formatting failed");
    let mut fs = SimFileSystem::mount(block_file).expect("mounting failed");
    let root = fs.dir_create().expect("no free inode for the root directory");

    for entry in fs::read_dir(&cli.source)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .expect("source file name is not valid UTF-8");

        let mut data: Vec<u8> = Vec::new();
        File::open(entry.path())?.read_to_end(&mut data)?;

        let inode = fs.create().expect("no free inode");
        fs.write(inode, &data, 0).expect("writing file data failed");
        fs.dir_add(root, &name, inode)
            .expect("registering the directory entry failed");
        log::info!("packed {name:?}: inode={inode} bytes={}", data.len());
    }

    log::info!(
        "root inode={root} free_inodes={} free_data_blocks={}",
        fs.free_inodes(),
        fs.free_data_blocks(),
    );
    fs.unmount().expect("unmounting failed");

    Ok(())
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Directory whose regular files are packed into the image
    #[arg(long, short)]
    pub source: PathBuf,

    /// Output directory for fs.img
    #[arg(long, short = 'O')]
    pub out_dir: PathBuf,

    /// Total block count of the image
    #[arg(long, short, default_value_t = 1024)]
    pub blocks: usize,
}

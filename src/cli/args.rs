use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mosaicpro", version, about = "MOSAICPRO mosaic redaction CLI")]
pub struct CliArgs {
    /// Configuration file (JSON). Missing keys fall back to defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Directory holding `<stem>.pose.json` landmark estimates.
    /// Defaults to each image's own directory
    #[arg(long, global = true)]
    pub poses: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Redact a single image
    Process {
        /// Input image (jpg, jpeg or png)
        input: PathBuf,

        /// Output image; the extension selects the format
        output: PathBuf,

        /// Minimum mosaic block size, overrides `mosaic.min_size`
        #[arg(short = 's', long)]
        mosaic_size: Option<u32>,

        /// Overwrite an existing output
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Redact every matching image in a directory
    Batch {
        /// Directory to scan
        input_dir: PathBuf,

        /// Directory receiving the redacted images
        output_dir: PathBuf,

        /// File name pattern; supports `*`, `?` and `{a,b}`
        #[arg(short, long, default_value = "*.{jpg,jpeg,png}")]
        pattern: String,

        /// Descend into subdirectories, mirroring them under the output directory
        #[arg(short, long, default_value_t = false)]
        recursive: bool,

        /// Worker threads, each with its own landmark engine
        #[arg(short = 'j', long, default_value_t = 1)]
        parallel: usize,

        /// Reprocess images whose output already exists
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Drain `<root>/input` into `<root>/output` and `<root>/error`
    Folder {
        /// Root holding the input/, output/ and error/ directories
        root: PathBuf,

        /// Worker threads, each with its own landmark engine
        #[arg(short = 'j', long, default_value_t = 1)]
        parallel: usize,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(default_value = "mosaicpro.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Print version and the effective configuration
    Info,
}

//! Command line parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Transfer files to and from an SFTP or FTP server
#[derive(Debug, Parser)]
#[command(name = "rax-transfer", version, about)]
pub struct Cli {
    /// Connection settings file (defaults to ./rax-transfer.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum Command {
    /// List a remote directory
    Ls {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Download a remote file, or a whole directory with -r
    Get {
        remote: String,
        local: PathBuf,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Upload a local file, or a whole directory with -r, into a remote directory
    Put {
        local: PathBuf,
        #[arg(default_value = ".")]
        remote_dir: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Remove a remote file, or a whole directory with -r
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    Mkdir {
        path: String,
    },
    Rmdir {
        path: String,
    },
}

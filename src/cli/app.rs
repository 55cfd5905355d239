use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "yallanegev-export")]
#[command(about = "Exports Yalla Negev surveys and responses from Firestore to a spreadsheet on Drive")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read surveys and responses, build the workbook, upload it to Drive
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Firestore document whose subcollections hold the survey data
    #[arg(long)]
    pub document_path: Option<String>,
    /// Directory the workbook is written to before upload
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Write the workbook locally and skip the Drive upload
    #[arg(long)]
    pub skip_upload: bool,
}

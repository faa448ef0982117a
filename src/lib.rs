pub use cli::{
    Arguments, CLIParser, CleanExportArguments, PreviewArguments, ProcessArguments,
    UnblackArguments,
};

use batch::{BatchOptions, BatchProcessor};
use html::{CleanExportOptions, ExportCleaner};

pub mod batch;
mod cli;
pub mod color;
pub mod error;
pub mod html;
mod logger;
pub mod preview;
pub mod transform;

pub type Result<T> = std::result::Result<T, error::Error>;

pub fn run(arguments: &Arguments) -> Result<()> {
    match arguments {
        Arguments::Process(arguments) => run_batch(&BatchOptions::from(arguments)),
        Arguments::Unblack(arguments) => run_batch(&BatchOptions::from(arguments)),
        Arguments::Preview(arguments) => preview::run_preview(arguments),
        Arguments::CleanExport(arguments) => {
            let options = CleanExportOptions::from(arguments);
            ExportCleaner::new(&options).run()
        }
    }
}

fn run_batch(options: &BatchOptions) -> Result<()> {
    let processor = BatchProcessor::new(options);
    let summary = processor.run()?;
    println!(
        "Processed {} images, {} skipped because of errors",
        summary.processed, summary.failed
    );
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use image::DynamicImage;
use threadpool::ThreadPool;

use crate::cli::{ProcessArguments, UnblackArguments};
use crate::error::Error;
use crate::transform::{remove_black_background, PixelTransformer, TransformationOptions};
use crate::Result;

const DEFAULT_OUTPUT_DIRECTORY_NAME: &str = "result";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BatchMode {
    Lightness(TransformationOptions),
    BlackRemoval,
}

pub struct BatchOptions {
    pub input_directory: PathBuf,
    pub output_directory: Option<PathBuf>,
    pub mode: BatchMode,
    pub number_of_threads: usize,
}

impl From<&ProcessArguments> for BatchOptions {
    fn from(value: &ProcessArguments) -> Self {
        BatchOptions {
            input_directory: value.input_directory.clone(),
            output_directory: value.output_directory.clone(),
            mode: BatchMode::Lightness(TransformationOptions::from(value)),
            number_of_threads: value.number_of_threads,
        }
    }
}

impl From<&UnblackArguments> for BatchOptions {
    fn from(value: &UnblackArguments) -> Self {
        BatchOptions {
            input_directory: value.input_directory.clone(),
            output_directory: value.output_directory.clone(),
            mode: BatchMode::BlackRemoval,
            number_of_threads: value.number_of_threads,
        }
    }
}

pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

pub struct BatchProcessor<'a> {
    options: &'a BatchOptions,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(options: &'a BatchOptions) -> Self {
        BatchProcessor { options }
    }

    /// Runs the configured transform over every PNG file in the input
    /// directory. Individual file failures are logged and skipped; the
    /// run only fails as a whole when the directory itself is unusable.
    pub fn run(&self) -> Result<BatchSummary> {
        let input_directory = &self.options.input_directory;
        if !input_directory.is_dir() {
            return Err(Error::InputPathIsNotADirectory(
                input_directory.display().to_string(),
            ));
        }
        let output_directory = self.output_directory();
        fs::create_dir_all(&output_directory).map_err(|e| {
            Error::UnableToCreateOutputDirectory(output_directory.display().to_string(), e)
        })?;
        let input_files = collect_png_files(input_directory)?;
        log::info!(
            "Processing {} PNG files from '{}' into '{}'",
            input_files.len(),
            input_directory.display(),
            output_directory.display()
        );
        Ok(self.process_files(&input_files, &output_directory))
    }

    fn process_files(&self, input_files: &[PathBuf], output_directory: &Path) -> BatchSummary {
        let pool = ThreadPool::new(self.options.number_of_threads.max(1));
        let (sender, receiver) = channel();
        for input_file in input_files {
            let input_file = input_file.clone();
            let output_file = output_file_for(&input_file, output_directory);
            let mode = self.options.mode;
            let sender = sender.clone();
            pool.execute(move || {
                let result = process_file(&input_file, &output_file, &mode);
                if let Err(ref error) = result {
                    log::warn!("Skipping '{}': {}", input_file.display(), error);
                }
                sender
                    .send(result.is_ok())
                    .expect("Receiving end of the result channel was dropped");
            });
        }
        drop(sender);
        let mut summary = BatchSummary {
            processed: 0,
            failed: 0,
        };
        for success in receiver {
            if success {
                summary.processed += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    fn output_directory(&self) -> PathBuf {
        match &self.options.output_directory {
            Some(directory) => directory.clone(),
            None => self
                .options
                .input_directory
                .join(DEFAULT_OUTPUT_DIRECTORY_NAME),
        }
    }
}

fn process_file(input_file: &Path, output_file: &Path, mode: &BatchMode) -> Result<()> {
    let image = image::open(input_file)
        .map_err(|e| Error::ImageDecodingFailed(input_file.display().to_string(), e))?;
    let image = DynamicImage::ImageRgba8(image.to_rgba8());
    let output = match mode {
        BatchMode::Lightness(options) => PixelTransformer::new(options).transform(&image)?,
        BatchMode::BlackRemoval => remove_black_background(&image)?,
    };
    output
        .save(output_file)
        .map_err(|e| Error::ImageEncodingFailed(output_file.display().to_string(), e))?;
    log::info!("Processed '{}'", input_file.display());
    Ok(())
}

fn collect_png_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .map_err(|e| Error::UnableToReadDirectory(directory.display().to_string(), e))?;
    let mut input_files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| Error::UnableToReadDirectory(directory.display().to_string(), e))?;
        let path = entry.path();
        if path.is_file() && has_png_extension(&path) {
            input_files.push(path);
        }
    }
    input_files.sort();
    Ok(input_files)
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

fn output_file_for(input_file: &Path, output_directory: &Path) -> PathBuf {
    match input_file.file_name() {
        Some(file_name) => output_directory.join(file_name),
        None => output_directory.join(input_file),
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{collect_png_files, has_png_extension, BatchMode, BatchOptions, BatchProcessor};
    use crate::transform::TransformationOptions;

    #[test]
    fn png_extension_is_matched_case_insensitively() {
        assert!(has_png_extension(Path::new("plot.png")));
        assert!(has_png_extension(Path::new("plot.PNG")));
        assert!(has_png_extension(Path::new("dir/plot.Png")));
        assert!(!has_png_extension(Path::new("plot.jpg")));
        assert!(!has_png_extension(Path::new("plot")));
        assert!(!has_png_extension(Path::new("png")));
    }

    #[test]
    fn output_directory_defaults_to_result_inside_the_input() {
        let options = BatchOptions {
            input_directory: PathBuf::from("/plots"),
            output_directory: None,
            mode: BatchMode::BlackRemoval,
            number_of_threads: 1,
        };
        let processor = BatchProcessor::new(&options);
        assert_eq!(processor.output_directory(), PathBuf::from("/plots/result"));
    }

    #[test]
    fn explicit_output_directory_is_respected() {
        let options = BatchOptions {
            input_directory: PathBuf::from("/plots"),
            output_directory: Some(PathBuf::from("/elsewhere")),
            mode: BatchMode::Lightness(TransformationOptions::default()),
            number_of_threads: 1,
        };
        let processor = BatchProcessor::new(&options);
        assert_eq!(processor.output_directory(), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn collect_png_files_ignores_other_entries() {
        let directory = tempfile::tempdir().expect("Creation of temporary directory failed");
        fs::write(directory.path().join("a.png"), b"not really a png").unwrap();
        fs::write(directory.path().join("b.PNG"), b"not really a png").unwrap();
        fs::write(directory.path().join("notes.txt"), b"notes").unwrap();
        fs::create_dir(directory.path().join("nested.png")).unwrap();
        let files = collect_png_files(directory.path()).expect("Collecting files failed");
        let file_names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(file_names, vec!["a.png", "b.PNG"]);
    }
}

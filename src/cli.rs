use clap::{
    arg, crate_description, crate_name, crate_version, value_parser, Arg, ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::{io, thread};

pub enum Arguments {
    Process(ProcessArguments),
    Unblack(UnblackArguments),
    Preview(PreviewArguments),
    CleanExport(CleanExportArguments),
}

pub struct ProcessArguments {
    pub input_directory: PathBuf,
    pub output_directory: Option<PathBuf>,
    pub invert_lightness: bool,
    pub transparency_threshold: Option<f32>,
    pub number_of_threads: usize,
}

pub struct UnblackArguments {
    pub input_directory: PathBuf,
    pub output_directory: Option<PathBuf>,
    pub number_of_threads: usize,
}

pub struct PreviewArguments {
    pub input_file: PathBuf,
    pub invert_lightness: bool,
    pub transparency_threshold: Option<f32>,
}

pub struct CleanExportArguments {
    pub input_directory: PathBuf,
    pub media_directory_name: String,
}

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_subcommands(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .about(crate_description!())
            .subcommand_required(true)
            .arg_required_else_help(true)
    }

    fn register_subcommands(command: Command) -> Command {
        command
            .subcommand(Self::create_process_subcommand())
            .subcommand(Self::create_unblack_subcommand())
            .subcommand(Self::create_preview_subcommand())
            .subcommand(Self::create_clean_export_subcommand())
    }

    fn create_process_subcommand() -> Command {
        Command::new("process")
            .about("Apply lightness transforms to every PNG file in a directory")
            .arg(Self::create_input_directory_argument())
            .arg(Self::create_output_directory_argument())
            .arg(Self::create_invert_lightness_argument())
            .arg(Self::create_threshold_argument())
            .arg(Self::create_threads_argument())
    }

    fn create_unblack_subcommand() -> Command {
        Command::new("unblack")
            .about("Turn black backgrounds transparent in every PNG file in a directory")
            .arg(Self::create_input_directory_argument())
            .arg(Self::create_output_directory_argument())
            .arg(Self::create_threads_argument())
    }

    fn create_preview_subcommand() -> Command {
        Command::new("preview")
            .about("Interactively preview lightness transforms on a single PNG file")
            .arg(Self::create_input_file_argument())
            .arg(Self::create_invert_lightness_argument())
            .arg(Self::create_threshold_argument())
    }

    fn create_clean_export_subcommand() -> Command {
        Command::new("clean-export")
            .about("Clean up a static HTML export directory for publishing")
            .arg(Self::create_input_directory_argument())
            .arg(Self::create_media_directory_argument())
    }

    fn create_input_directory_argument() -> Arg {
        Arg::new("input_directory")
            .help("Path to the input directory")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_input_file_argument() -> Arg {
        Arg::new("input_file")
            .help("Path to the input PNG file")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_output_directory_argument() -> Arg {
        arg!(output_directory: -o --output_directory <DIRECTORY> "Directory the processed images are written to")
            .required(false)
            .value_parser(value_parser!(PathBuf))
    }

    fn create_invert_lightness_argument() -> Arg {
        arg!(invert_lightness: -i --invert_lightness "Invert the lightness of every pixel")
    }

    fn create_threshold_argument() -> Arg {
        arg!(transparency_threshold: --threshold <THRESHOLD> "Lightness below which a pixel becomes fully transparent")
            .required(false)
            .value_parser(parse_threshold)
    }

    fn create_threads_argument() -> Arg {
        arg!(-t --threads <THREADS> "Number of Threads")
            .default_value(get_number_of_threads().unwrap_or(1).to_string())
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn create_media_directory_argument() -> Arg {
        arg!(media_directory: -m --media_directory <NAME> "Name of the subdirectory collecting the image files")
            .default_value("media")
            .required(false)
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        match matches.subcommand() {
            Some(("process", matches)) => {
                Arguments::Process(Self::extract_process_arguments(matches))
            }
            Some(("unblack", matches)) => {
                Arguments::Unblack(Self::extract_unblack_arguments(matches))
            }
            Some(("preview", matches)) => {
                Arguments::Preview(Self::extract_preview_arguments(matches))
            }
            Some(("clean-export", matches)) => {
                Arguments::CleanExport(Self::extract_clean_export_arguments(matches))
            }
            _ => unreachable!("A subcommand is required by the base command"),
        }
    }

    fn extract_process_arguments(matches: &ArgMatches) -> ProcessArguments {
        ProcessArguments {
            input_directory: Self::extract_input_directory_argument(matches),
            output_directory: Self::extract_output_directory_argument(matches),
            invert_lightness: Self::extract_invert_lightness_argument(matches),
            transparency_threshold: Self::extract_threshold_argument(matches),
            number_of_threads: Self::extract_threads_argument(matches),
        }
    }

    fn extract_unblack_arguments(matches: &ArgMatches) -> UnblackArguments {
        UnblackArguments {
            input_directory: Self::extract_input_directory_argument(matches),
            output_directory: Self::extract_output_directory_argument(matches),
            number_of_threads: Self::extract_threads_argument(matches),
        }
    }

    fn extract_preview_arguments(matches: &ArgMatches) -> PreviewArguments {
        PreviewArguments {
            input_file: Self::extract_input_file_argument(matches),
            invert_lightness: Self::extract_invert_lightness_argument(matches),
            transparency_threshold: Self::extract_threshold_argument(matches),
        }
    }

    fn extract_clean_export_arguments(matches: &ArgMatches) -> CleanExportArguments {
        CleanExportArguments {
            input_directory: Self::extract_input_directory_argument(matches),
            media_directory_name: Self::extract_media_directory_argument(matches),
        }
    }

    fn extract_input_directory_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("input_directory")
            .expect("Required argument input_directory not provided")
            .clone()
    }

    fn extract_input_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("input_file")
            .expect("Required argument input_file not provided")
            .clone()
    }

    fn extract_output_directory_argument(matches: &ArgMatches) -> Option<PathBuf> {
        matches.get_one::<PathBuf>("output_directory").cloned()
    }

    fn extract_invert_lightness_argument(matches: &ArgMatches) -> bool {
        matches.get_flag("invert_lightness")
    }

    fn extract_threshold_argument(matches: &ArgMatches) -> Option<f32> {
        matches.get_one::<f32>("transparency_threshold").copied()
    }

    fn extract_threads_argument(matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("threads")
            .expect("Required argument threads not provided")
            .to_owned()
    }

    fn extract_media_directory_argument(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("media_directory")
            .expect("Media directory name must be provided, but was unset")
            .to_owned()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_threshold(value: &str) -> Result<f32, String> {
    let threshold: f32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!(
            "threshold must lie between 0.0 and 1.0, but was {}",
            threshold
        ));
    }
    Ok(threshold)
}

fn get_number_of_threads() -> io::Result<usize> {
    Ok(thread::available_parallelism()?.get())
}

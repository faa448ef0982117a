use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};

use crate::cli::CleanExportArguments;
use crate::error::Error;
use crate::Result;

const HTML_DOCUMENT_NAME: &str = "index.html";
const STYLESHEET_LINK: &str = r#"<link rel="stylesheet" href="style.css"/>"#;
const IMAGE_FILE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "svg", "webp"];

pub struct CleanExportOptions {
    pub input_directory: PathBuf,
    pub media_directory_name: String,
}

impl From<&CleanExportArguments> for CleanExportOptions {
    fn from(value: &CleanExportArguments) -> Self {
        CleanExportOptions {
            input_directory: value.input_directory.clone(),
            media_directory_name: value.media_directory_name.clone(),
        }
    }
}

pub struct ExportCleaner<'a> {
    options: &'a CleanExportOptions,
}

impl<'a> ExportCleaner<'a> {
    pub fn new(options: &'a CleanExportOptions) -> Self {
        ExportCleaner { options }
    }

    /// Moves loose image files into the media subdirectory and rewrites
    /// the exported document in place.
    pub fn run(&self) -> Result<()> {
        let input_directory = &self.options.input_directory;
        if !input_directory.is_dir() {
            return Err(Error::InputPathIsNotADirectory(
                input_directory.display().to_string(),
            ));
        }
        let media_directory = input_directory.join(&self.options.media_directory_name);
        fs::create_dir_all(&media_directory).map_err(|e| {
            Error::UnableToCreateOutputDirectory(media_directory.display().to_string(), e)
        })?;
        self.move_image_files(&media_directory)?;
        let document_path = input_directory.join(HTML_DOCUMENT_NAME);
        if !document_path.is_file() {
            return Err(Error::HtmlDocumentNotFound(
                document_path.display().to_string(),
            ));
        }
        let document = fs::read_to_string(&document_path).map_err(|e| {
            Error::UnableToOpenInputFileForReading(document_path.display().to_string(), e)
        })?;
        let document = self.clean_document(&document);
        fs::write(&document_path, document).map_err(|e| {
            Error::UnableToOpenOutputFileForWriting(document_path.display().to_string(), e)
        })?;
        log::info!("Rewrote '{}'", document_path.display());
        Ok(())
    }

    fn move_image_files(&self, media_directory: &Path) -> Result<()> {
        let input_directory = &self.options.input_directory;
        let entries = fs::read_dir(input_directory)
            .map_err(|e| Error::UnableToReadDirectory(input_directory.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::UnableToReadDirectory(input_directory.display().to_string(), e)
            })?;
            let path = entry.path();
            if !path.is_file() || !has_image_extension(&path) {
                continue;
            }
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let destination = media_directory.join(file_name);
            match fs::rename(&path, &destination) {
                Ok(_) => log::info!(
                    "Moved '{}' into '{}'",
                    path.display(),
                    media_directory.display()
                ),
                Err(error) => log::warn!("Could not move '{}': {}", path.display(), error),
            }
        }
        Ok(())
    }

    fn clean_document(&self, document: &str) -> String {
        let document = remove_first_style_block(document);
        let document = append_stylesheet_link(&document);
        self.rewrite_image_sources(&document)
    }

    fn rewrite_image_sources(&self, document: &str) -> String {
        let pattern = Regex::new(r#"(?i)(<img[^>]*?\bsrc\s*=\s*")([^"]*)(")"#)
            .expect("Image source pattern must compile");
        pattern
            .replace_all(document, |captures: &Captures| {
                let source = &captures[2];
                if source.is_empty() || is_absolute_source(source) {
                    return captures[0].to_string();
                }
                let file_name = source.rsplit(['/', '\\']).next().unwrap_or(source);
                format!(
                    "{}{}/{}{}",
                    &captures[1], self.options.media_directory_name, file_name, &captures[3]
                )
            })
            .into_owned()
    }
}

fn remove_first_style_block(document: &str) -> String {
    let pattern =
        Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("Style block pattern must compile");
    match pattern.find(document) {
        Some(style_block) => {
            let mut output = String::with_capacity(document.len());
            output.push_str(&document[..style_block.start()]);
            output.push_str(&document[style_block.end()..]);
            output
        }
        None => {
            log::warn!("No inline style block found, nothing removed");
            document.to_string()
        }
    }
}

fn append_stylesheet_link(document: &str) -> String {
    let pattern = Regex::new(r"(?i)</head>").expect("Head end pattern must compile");
    match pattern.find(document) {
        Some(head_end) => {
            let mut output = String::with_capacity(document.len() + STYLESHEET_LINK.len());
            output.push_str(&document[..head_end.start()]);
            output.push_str(STYLESHEET_LINK);
            output.push_str(&document[head_end.start()..]);
            output
        }
        None => {
            log::warn!("No head element found, stylesheet link not added");
            document.to_string()
        }
    }
}

fn is_absolute_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            IMAGE_FILE_EXTENSIONS
                .iter()
                .any(|supported| extension.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::{
        append_stylesheet_link, has_image_extension, remove_first_style_block, CleanExportOptions,
        ExportCleaner, STYLESHEET_LINK,
    };

    fn cleaner_options(media_directory_name: &str) -> CleanExportOptions {
        CleanExportOptions {
            input_directory: Path::new("/pages").to_path_buf(),
            media_directory_name: media_directory_name.to_owned(),
        }
    }

    #[test]
    fn first_style_block_is_removed() {
        let document = "<head><style>body { color: red; }</style><title>t</title></head>";
        let result = remove_first_style_block(document);
        assert_eq!(result, "<head><title>t</title></head>");
    }

    #[test]
    fn only_the_first_style_block_is_removed() {
        let document = "<style>a</style><style>b</style>";
        let result = remove_first_style_block(document);
        assert_eq!(result, "<style>b</style>");
    }

    #[test]
    fn document_without_style_block_is_unchanged() {
        let document = "<head><title>t</title></head>";
        assert_eq!(remove_first_style_block(document), document);
    }

    #[test]
    fn style_block_spanning_lines_is_removed() {
        let document = "<style type=\"text/css\">\nbody {\n  color: red;\n}\n</style><p>x</p>";
        assert_eq!(remove_first_style_block(document), "<p>x</p>");
    }

    #[test]
    fn stylesheet_link_is_appended_to_the_head() {
        let document = "<head><title>t</title></head><body></body>";
        let result = append_stylesheet_link(document);
        let expected = format!(
            "<head><title>t</title>{}</head><body></body>",
            STYLESHEET_LINK
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn document_without_head_is_unchanged() {
        let document = "<body></body>";
        assert_eq!(append_stylesheet_link(document), document);
    }

    #[test]
    fn relative_image_sources_are_rewritten() {
        let options = cleaner_options("media");
        let cleaner = ExportCleaner::new(&options);
        let document = r#"<img src="chart.png"/><img alt="x" src="plots/figure.png"/>"#;
        let result = cleaner.rewrite_image_sources(document);
        assert_eq!(
            result,
            r#"<img src="media/chart.png"/><img alt="x" src="media/figure.png"/>"#
        );
    }

    #[test]
    fn absolute_image_sources_are_untouched() {
        let options = cleaner_options("media");
        let cleaner = ExportCleaner::new(&options);
        let document = r#"<img src="https://example.com/logo.png"/><img src="http://example.com/a.png"/>"#;
        assert_eq!(cleaner.rewrite_image_sources(document), document);
    }

    #[test]
    fn configured_media_directory_name_is_used() {
        let options = cleaner_options("assets");
        let cleaner = ExportCleaner::new(&options);
        let document = r#"<img src="chart.png"/>"#;
        assert_eq!(
            cleaner.rewrite_image_sources(document),
            r#"<img src="assets/chart.png"/>"#
        );
    }

    #[test]
    fn image_extensions_are_recognized() {
        assert!(has_image_extension(Path::new("a.png")));
        assert!(has_image_extension(Path::new("a.JPG")));
        assert!(has_image_extension(Path::new("a.webp")));
        assert!(!has_image_extension(Path::new("index.html")));
        assert!(!has_image_extension(Path::new("style.css")));
    }
}

use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    InputPathIsNotADirectory(String),
    UnableToReadDirectory(String, std::io::Error),
    UnableToCreateOutputDirectory(String, std::io::Error),
    UnableToOpenInputFileForReading(String, std::io::Error),
    UnableToOpenOutputFileForWriting(String, std::io::Error),
    ImageDecodingFailed(String, image::ImageError),
    ImageEncodingFailed(String, image::ImageError),
    ImageIsNotRgba,
    HtmlDocumentNotFound(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputPathIsNotADirectory(path) => {
                write!(f, "The path '{}' is not a valid directory", path)
            }
            Self::UnableToReadDirectory(path, error) => {
                write!(f, "Unable to read directory '{}': {}", path, error)
            }
            Self::UnableToCreateOutputDirectory(path, error) => {
                write!(f, "Unable to create output directory '{}': {}", path, error)
            }
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::ImageDecodingFailed(path, error) => {
                write!(f, "Decoding of image '{}' failed: {}", path, error)
            }
            Self::ImageEncodingFailed(path, error) => {
                write!(f, "Encoding of image '{}' failed: {}", path, error)
            }
            Self::ImageIsNotRgba => {
                write!(
                    f,
                    "Image does not carry four RGBA channels, convert it before transforming"
                )
            }
            Self::HtmlDocumentNotFound(path) => {
                write!(f, "Expected HTML document '{}' not found", path)
            }
        }
    }
}

impl std::error::Error for Error {}

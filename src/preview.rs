use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::cli::PreviewArguments;
use crate::error::Error;
use crate::transform::{PixelTransformer, TransformationOptions, THRESHOLD_DISABLED};
use crate::Result;

const ANSI_RESET: &str = "\x1b[0m";
/// Dark gray shade standing in for transparent pixels.
const ANSI_TRANSPARENT_BACKGROUND: &str = "\x1b[48;5;236m";
const ANSI_TRANSPARENT_FOREGROUND: &str = "\x1b[38;5;236m";

const THRESHOLD_MINIMUM: f32 = 0.0;
const THRESHOLD_MAXIMUM: f32 = 0.3;
const THRESHOLD_STEP: f32 = 0.05;
const DEFAULT_THRESHOLD: f32 = 0.05;

/// Column count of a single preview pane.
const PREVIEW_WIDTH: u32 = 36;

pub struct PreviewState {
    pub invert_lightness: bool,
    pub threshold_enabled: bool,
    pub transparency_threshold: f32,
}

impl From<&PreviewArguments> for PreviewState {
    fn from(value: &PreviewArguments) -> Self {
        PreviewState {
            invert_lightness: value.invert_lightness,
            threshold_enabled: value.transparency_threshold.is_some(),
            transparency_threshold: value.transparency_threshold.unwrap_or(DEFAULT_THRESHOLD),
        }
    }
}

impl PreviewState {
    fn transformation_options(&self) -> TransformationOptions {
        TransformationOptions {
            invert_lightness: self.invert_lightness,
            transparency_threshold: if self.threshold_enabled {
                self.transparency_threshold
            } else {
                THRESHOLD_DISABLED
            },
        }
    }

    fn step_threshold(&mut self, step: f32) {
        self.transparency_threshold =
            (self.transparency_threshold + step).clamp(THRESHOLD_MINIMUM, THRESHOLD_MAXIMUM);
    }

    fn status_line(&self) -> String {
        let inversion = if self.invert_lightness { "on" } else { "off" };
        let threshold = if self.threshold_enabled {
            format!("{:.2}", self.transparency_threshold)
        } else {
            "off".to_string()
        };
        format!(
            "invert lightness: {}  transparency threshold: {}",
            inversion, threshold
        )
    }
}

/// Runs the interactive preview loop until the user quits or stdin is
/// exhausted. All state lives in the `PreviewState` passed around here;
/// nothing is read from ambient configuration.
pub fn run_preview(arguments: &PreviewArguments) -> Result<()> {
    let input_file = &arguments.input_file;
    let image = image::open(input_file)
        .map_err(|e| Error::ImageDecodingFailed(input_file.display().to_string(), e))?;
    let original = image.to_rgba8();
    let mut state = PreviewState::from(arguments);
    let stdin = io::stdin();
    let mut input_lines = stdin.lock().lines();
    loop {
        let processed = apply_state(&original, &state)?;
        draw(&original, &processed, &state);
        print!("> ");
        io::stdout().flush().ok();
        let Some(Ok(line)) = input_lines.next() else {
            break;
        };
        match line.trim() {
            "i" => state.invert_lightness = !state.invert_lightness,
            "t" => state.threshold_enabled = !state.threshold_enabled,
            "+" => state.step_threshold(THRESHOLD_STEP),
            "-" => state.step_threshold(-THRESHOLD_STEP),
            "s" => {
                let output_file = processed_output_path(input_file);
                processed.save(&output_file).map_err(|e| {
                    Error::ImageEncodingFailed(output_file.display().to_string(), e)
                })?;
                println!("Saved '{}'", output_file.display());
            }
            "q" => break,
            "" => {}
            other => println!("Unknown command '{}'", other),
        }
    }
    Ok(())
}

fn apply_state(original: &RgbaImage, state: &PreviewState) -> Result<RgbaImage> {
    let options = state.transformation_options();
    let transformer = PixelTransformer::new(&options);
    transformer.transform(&DynamicImage::ImageRgba8(original.clone()))
}

fn draw(original: &RgbaImage, processed: &RgbaImage, state: &PreviewState) {
    let scaled_original = scale_to_preview(original);
    let scaled_processed = scale_to_preview(processed);
    let pane_width = (scaled_original.width() as usize).max("Original".len());
    println!();
    println!("{:<width$}   {}", "Original", "Processed", width = pane_width);
    let left = render_image_ansi(&scaled_original);
    let right = render_image_ansi(&scaled_processed);
    for (left_row, right_row) in left.lines().zip(right.lines()) {
        println!("{}   {}", left_row, right_row);
    }
    println!();
    println!("{}", state.status_line());
    println!("[i] invert  [t] threshold  [+/-] adjust threshold  [s] save  [q] quit");
}

/// Renders an RGBA image as ANSI half block art, two pixel rows per
/// text line. Transparent pixels show up as a dark gray shade.
fn render_image_ansi(image: &RgbaImage) -> String {
    let mut output = String::new();
    for row in (0..image.height()).step_by(2) {
        for column in 0..image.width() {
            let top = *image.get_pixel(column, row);
            let bottom = if row + 1 < image.height() {
                *image.get_pixel(column, row + 1)
            } else {
                Rgba([0, 0, 0, 0])
            };
            output.push_str(&half_block(top, bottom));
        }
        output.push_str(ANSI_RESET);
        output.push('\n');
    }
    output
}

fn half_block(top: Rgba<u8>, bottom: Rgba<u8>) -> String {
    let foreground = if top[3] == 0 {
        ANSI_TRANSPARENT_FOREGROUND.to_string()
    } else {
        format!("\x1b[38;2;{};{};{}m", top[0], top[1], top[2])
    };
    let background = if bottom[3] == 0 {
        ANSI_TRANSPARENT_BACKGROUND.to_string()
    } else {
        format!("\x1b[48;2;{};{};{}m", bottom[0], bottom[1], bottom[2])
    };
    format!("{}{}\u{2580}", background, foreground)
}

fn scale_to_preview(image: &RgbaImage) -> RgbaImage {
    if image.width() <= PREVIEW_WIDTH {
        return image.clone();
    }
    let scale = PREVIEW_WIDTH as f32 / image.width() as f32;
    let height = ((image.height() as f32 * scale) as u32).max(1);
    imageops::resize(image, PREVIEW_WIDTH, height, FilterType::Nearest)
}

fn processed_output_path(input_file: &Path) -> PathBuf {
    let stem = input_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    input_file.with_file_name(format!("{}.processed.png", stem))
}

//! QR code rendering for transport records.
//!
//! This is the "text → visual code" half of the optical channel. The
//! reverse (camera frames → text) happens on the receiving device and is
//! outside this crate.
//!
//! ## Features
//!
//! - Unicode half-block QR for terminal playback
//! - SVG QR for embedding in pages
//! - PNG QR for exporting a sequence as image files
//!
//! ## Example
//!
//! ```rust,ignore
//! use qrbeam_core::qr::{self, QrConfig};
//!
//! let frame = qr::generate_ascii(record, &QrConfig::default())?;
//! println!("{frame}");
//! ```

use qrcode::render::{svg, unicode};
use qrcode::{EcLevel, QrCode};

use crate::config::ErrorCorrection;
use crate::error::{Error, Result};

/// Configuration for QR code generation.
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Error correction level (default: Medium)
    pub error_correction: EcLevel,
    /// Draw the blank border scanners rely on
    pub quiet_zone: bool,
    /// Edge length of exported PNGs in pixels
    pub png_size: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            error_correction: EcLevel::M,
            quiet_zone: true,
            png_size: 512,
        }
    }
}

impl From<&crate::config::QrSettings> for QrConfig {
    fn from(settings: &crate::config::QrSettings) -> Self {
        Self {
            error_correction: settings.error_correction.into(),
            quiet_zone: settings.quiet_zone,
            png_size: settings.png_size,
        }
    }
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => Self::L,
            ErrorCorrection::M => Self::M,
            ErrorCorrection::Q => Self::Q,
            ErrorCorrection::H => Self::H,
        }
    }
}

fn encode(data: &str, config: &QrConfig) -> Result<QrCode> {
    QrCode::with_error_correction_level(data, config.error_correction).map_err(|e| {
        Error::QrRender(format!(
            "{e} ({} bytes at level {:?})",
            data.len(),
            config.error_correction
        ))
    })
}

/// Generate a QR code for terminal display.
///
/// Uses Unicode block characters, two modules per character cell.
///
/// # Errors
///
/// Returns an error if the data does not fit a QR code at the configured
/// error correction level.
///
/// # Example
///
/// ```
/// use qrbeam_core::qr::{generate_ascii, QrConfig};
///
/// let qr = generate_ascii("{\"index\":0}", &QrConfig::default()).unwrap();
/// assert!(qr.lines().count() > 5);
/// ```
pub fn generate_ascii(data: &str, config: &QrConfig) -> Result<String> {
    let qr_code = encode(data, config)?;

    let rendered = qr_code
        .render::<unicode::Dense1x2>()
        .quiet_zone(config.quiet_zone)
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build();

    Ok(rendered)
}

/// Generate an SVG QR code.
///
/// # Errors
///
/// Returns an error if QR code generation fails.
///
/// # Example
///
/// ```
/// use qrbeam_core::qr::{generate_svg, QrConfig};
///
/// let svg = generate_svg("hello", &QrConfig::default()).unwrap();
/// assert!(svg.contains("<svg"));
/// assert!(svg.contains("</svg>"));
/// ```
pub fn generate_svg(data: &str, config: &QrConfig) -> Result<String> {
    let qr_code = encode(data, config)?;

    let svg_string = qr_code
        .render::<svg::Color>()
        .quiet_zone(config.quiet_zone)
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    Ok(svg_string)
}

/// Generate a PNG QR code scaled to `config.png_size` pixels square.
///
/// # Errors
///
/// Returns an error if QR code generation or PNG encoding fails.
pub fn generate_png(data: &str, config: &QrConfig) -> Result<Vec<u8>> {
    use image::Luma;

    let qr_code = encode(data, config)?;
    let size = config.png_size;

    let image = qr_code
        .render::<Luma<u8>>()
        .quiet_zone(config.quiet_zone)
        .build();

    let scaled = image::imageops::resize(&image, size, size, image::imageops::FilterType::Nearest);

    let mut png_bytes = Vec::new();
    {
        use image::ImageEncoder;
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&scaled, size, size, image::ExtendedColorType::L8)
            .map_err(|e| Error::QrRender(format!("failed to encode PNG: {e}")))?;
    }

    Ok(png_bytes)
}

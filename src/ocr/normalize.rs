//! Image Normalizer
//!
//! Classifies incoming image strings and turns them into the form fields the
//! provider expects. Classification happens once, in [`ImageDescriptor::parse`].
//!
//! Optional preprocessing (grayscale, auto contrast, sharpen, re-encode as PNG)
//! is applied to inline images only; remote URLs are forwarded untouched.

use std::io::Cursor;

use base64::Engine;
use image::{imageops, DynamicImage, GrayImage, ImageFormat};

use super::types::OcrError;

/// Media type assumed for bare base64 payloads
const RAW_BASE64_MEDIA_TYPE: &str = "image/jpeg";

/// An image reference as received from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDescriptor {
    /// `data:<media-type>;base64,<payload>`
    DataUrl(String),
    /// `http://` or `https://` reference fetched by the provider
    RemoteUrl(String),
    /// Bare base64 payload with no prefix
    RawBase64(String),
}

/// The image-carrying field of the provider form. Exactly one is sent per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageField {
    Base64Image(String),
    Url(String),
}

impl ImageField {
    pub fn name(&self) -> &'static str {
        match self {
            ImageField::Base64Image(_) => "base64Image",
            ImageField::Url(_) => "url",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ImageField::Base64Image(v) | ImageField::Url(v) => v,
        }
    }
}

impl ImageDescriptor {
    /// Classify a raw string. First match wins: data URL, remote URL, raw base64.
    pub fn parse(raw: &str) -> Self {
        if is_data_url(raw) {
            ImageDescriptor::DataUrl(raw.to_string())
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            ImageDescriptor::RemoteUrl(raw.to_string())
        } else {
            ImageDescriptor::RawBase64(raw.to_string())
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageDescriptor::DataUrl(_) => "data_url",
            ImageDescriptor::RemoteUrl(_) => "remote_url",
            ImageDescriptor::RawBase64(_) => "raw_base64",
        }
    }

    /// Provider field for this image
    pub fn to_field(&self) -> ImageField {
        match self {
            ImageDescriptor::DataUrl(url) => ImageField::Base64Image(url.clone()),
            ImageDescriptor::RemoteUrl(url) => ImageField::Url(url.clone()),
            ImageDescriptor::RawBase64(payload) => ImageField::Base64Image(format!(
                "data:{};base64,{}",
                RAW_BASE64_MEDIA_TYPE, payload
            )),
        }
    }

    /// Decoded bytes of an inline image. `None` for remote URLs.
    fn inline_bytes(&self) -> Option<Result<Vec<u8>, OcrError>> {
        let payload = match self {
            ImageDescriptor::DataUrl(url) => url
                .split_once(";base64,")
                .map(|(_, payload)| payload)
                .unwrap_or_default(),
            ImageDescriptor::RawBase64(payload) => payload.as_str(),
            ImageDescriptor::RemoteUrl(_) => return None,
        };

        // Line-wrapped payloads are accepted; the standard engine rejects whitespace.
        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

        Some(
            base64::engine::general_purpose::STANDARD
                .decode(cleaned.as_bytes())
                .map_err(|e| OcrError::Preprocessing(format!("invalid base64 payload: {}", e))),
        )
    }
}

impl From<&str> for ImageDescriptor {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Matches `^data:.*;base64,` where `.` does not cross a line break
fn is_data_url(s: &str) -> bool {
    match s.strip_prefix("data:") {
        Some(rest) => rest
            .split(['\n', '\r', '\u{2028}', '\u{2029}'])
            .next()
            .is_some_and(|line| line.contains(";base64,")),
        None => false,
    }
}

/// Preprocess an inline image for recognition and return it as a PNG data URL
/// descriptor. Remote URLs are returned unchanged.
///
/// CPU bound; run on a blocking thread.
pub fn preprocess(image: &ImageDescriptor) -> Result<ImageDescriptor, OcrError> {
    let bytes = match image.inline_bytes() {
        Some(bytes) => bytes?,
        None => return Ok(image.clone()),
    };

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| OcrError::Preprocessing(format!("failed to decode image: {}", e)))?;

    let mut gray = decoded.to_luma8();
    stretch_contrast(&mut gray);
    let sharpened = imageops::unsharpen(&gray, 1.0, 0);

    let mut buffer = Vec::new();
    DynamicImage::ImageLuma8(sharpened)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| OcrError::Preprocessing(format!("failed to encode image: {}", e)))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&buffer);
    Ok(ImageDescriptor::DataUrl(format!(
        "data:image/png;base64,{}",
        encoded
    )))
}

/// Linear auto-levels: map the darkest pixel to 0 and the brightest to 255
fn stretch_contrast(image: &mut GrayImage) {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));

    if max <= min {
        return;
    }

    let range = (max - min) as u32;
    for pixel in image.pixels_mut() {
        let v = (pixel.0[0] - min) as u32;
        pixel.0[0] = ((v * 255 + range / 2) / range) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn png_data_url(img: DynamicImage) -> String {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&buffer)
        )
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(
            ImageDescriptor::parse("data:image/png;base64,AAAA"),
            ImageDescriptor::DataUrl("data:image/png;base64,AAAA".into())
        );
        assert_eq!(
            ImageDescriptor::parse("https://example.com/a.png"),
            ImageDescriptor::RemoteUrl("https://example.com/a.png".into())
        );
        assert_eq!(
            ImageDescriptor::parse("http://example.com/a.png"),
            ImageDescriptor::RemoteUrl("http://example.com/a.png".into())
        );
        assert_eq!(
            ImageDescriptor::parse("not-a-valid-image-string-or-url"),
            ImageDescriptor::RawBase64("not-a-valid-image-string-or-url".into())
        );
    }

    #[test]
    fn test_data_url_edge_cases() {
        // Any media type, including an empty one, qualifies
        assert!(is_data_url("data:;base64,AAAA"));
        assert!(is_data_url("data:application/octet-stream;base64,"));
        // Not base64 encoded
        assert!(!is_data_url("data:text/plain,hello"));
        // Marker must be on the first line
        assert!(!is_data_url("data:image/png\n;base64,AAAA"));
        // Prefix is case sensitive
        assert!(!is_data_url("DATA:image/png;base64,AAAA"));
        // Scheme check is a plain prefix match
        assert_eq!(
            ImageDescriptor::parse("HTTPS://example.com").kind(),
            "raw_base64"
        );
        assert_eq!(ImageDescriptor::parse("ftp://example.com").kind(), "raw_base64");
    }

    #[test]
    fn test_form_fields() {
        assert_eq!(
            ImageDescriptor::parse("data:image/png;base64,AAAA").to_field(),
            ImageField::Base64Image("data:image/png;base64,AAAA".into())
        );

        let remote = ImageDescriptor::parse("https://example.com/a.png").to_field();
        assert_eq!(remote.name(), "url");
        assert_eq!(remote.value(), "https://example.com/a.png");

        let raw = ImageDescriptor::parse("/9j/4AAQ").to_field();
        assert_eq!(raw.name(), "base64Image");
        assert_eq!(raw.value(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_preprocess_remote_url_is_untouched() {
        let remote = ImageDescriptor::parse("https://example.com/scan.jpg");
        assert_eq!(preprocess(&remote).unwrap(), remote);
    }

    #[test]
    fn test_preprocess_produces_grayscale_png() {
        let mut img = RgbImage::new(8, 8);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([100 + x as u8 * 5, 120, 140]);
        }
        let input = ImageDescriptor::parse(&png_data_url(DynamicImage::ImageRgb8(img)));

        let output = preprocess(&input).unwrap();
        let ImageDescriptor::DataUrl(url) = &output else {
            panic!("expected a data URL, got {:?}", output);
        };
        assert!(url.starts_with("data:image/png;base64,"));

        let bytes = output.inline_bytes().unwrap().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_preprocess_accepts_raw_base64() {
        let url = png_data_url(DynamicImage::ImageLuma8(GrayImage::new(4, 4)));
        let payload = url.trim_start_matches("data:image/png;base64,");

        let output = preprocess(&ImageDescriptor::parse(payload)).unwrap();
        assert_eq!(output.kind(), "data_url");
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        let err = preprocess(&ImageDescriptor::parse("not-a-valid-image-string-or-url"))
            .unwrap_err();
        assert!(matches!(err, OcrError::Preprocessing(_)));

        // Valid base64, not an image
        let err = preprocess(&ImageDescriptor::parse("data:image/png;base64,AAAA")).unwrap_err();
        assert!(err.to_string().contains("failed to decode image"));
    }

    #[test]
    fn test_stretch_contrast() {
        let mut img = GrayImage::from_fn(3, 1, |x, _| Luma([100 + x as u8 * 10]));
        stretch_contrast(&mut img);
        let values: Vec<u8> = img.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 128, 255]);

        let mut flat = GrayImage::from_pixel(2, 2, Luma([42]));
        stretch_contrast(&mut flat);
        assert!(flat.pixels().all(|p| p.0[0] == 42));
    }
}

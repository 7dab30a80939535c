use axum_test::multipart::{MultipartForm, Part};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// PNG bytes of a `width`x`height` gradient
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

pub fn png_part(name: &str, width: u32, height: u32) -> Part {
    Part::bytes(png(width, height))
        .file_name(name)
        .mime_type("image/png")
}

/// A part that passes upload validation but is not a decodable image
pub fn broken_png_part(name: &str) -> Part {
    Part::bytes(b"definitely not a png".to_vec())
        .file_name(name)
        .mime_type("image/png")
}

/// Article form with the required fields
pub fn article_form(title: &str, content: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("content", content)
}

/// Pixel size of the image stored at `path`
pub fn dimensions(path: &std::path::Path) -> (u32, u32) {
    image::image_dimensions(path).expect("stored image readable")
}

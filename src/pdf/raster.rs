//! Raster image embedding as image XObjects

use crate::error::Result;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

/// An embedded image and its pixel size
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn flate_stream(dict: lopdf::Dictionary, raw: &[u8]) -> Result<Stream> {
    let mut stream = Stream::new(dict, deflate(raw)?);
    stream.dict.set("Filter", "FlateDecode");
    // Already compressed; keep lopdf from compressing it again on save
    stream.allows_compression = false;
    Ok(stream)
}

/// Decode PNG/JPEG/GIF/BMP bytes and add them to the document as an RGB
/// image XObject. Transparency is carried over as a soft mask.
pub(crate) fn embed_image(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let smask = if decoded.color().has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask = flate_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            &alpha,
        )?;
        Some(doc.add_object(mask))
    } else {
        None
    };

    let rgb = decoded.to_rgb8();
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if let Some(mask) = smask {
        dict.set("SMask", Object::Reference(mask));
    }
    let id = doc.add_object(flate_stream(dict, rgb.as_raw())?);

    Ok(EmbeddedImage { id, width, height })
}

/// Draw size for an image: native pixels as points, or scaled uniformly to
/// fit inside `fit`
pub(crate) fn draw_size(width: u32, height: u32, fit: Option<(f64, f64)>) -> (f64, f64) {
    let (w, h) = (f64::from(width), f64::from(height));
    match fit {
        Some((fw, fh)) if w > 0.0 && h > 0.0 => {
            let scale = (fw / w).min(fh / h);
            (w * scale, h * scale)
        }
        _ => (w, h),
    }
}

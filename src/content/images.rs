//! Image extraction from content streams.
//!
//! A second, independent pass over the parsed operators that tracks only
//! `q`/`Q`/`cm` and resolves each `Do` against the page's `/XObject`
//! resources. Image XObjects are classified by their filter chain and
//! placed by pushing the unit square through the CTM in effect at the
//! `Do`. Anything that fails to resolve is skipped with a debug note,
//! never an error.

use crate::content::graphics_state::{GraphicsStateStack, Matrix};
use crate::content::operators::Operator;
use crate::decoders;
use crate::document::PdfReader;
use crate::object::Object;
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Encoding of an image XObject's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// DCTDecode stream, bytes are a complete JPEG file
    Jpeg,
    /// FlateDecode stream, bytes are decompressed raw samples
    Raw,
    /// Any other filter chain, bytes left as stored
    Unknown,
}

/// An image XObject's pixel description and bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// XObject resource name
    pub name: String,
    /// Pixel width (/Width)
    pub width: u32,
    /// Pixel height (/Height)
    pub height: u32,
    /// Color space name when present (/ColorSpace)
    pub color_space: Option<String>,
    /// Bits per component (/BitsPerComponent), default 8
    pub bits_per_component: u32,
    /// Byte encoding
    pub format: ImageFormat,
    /// Image bytes (decompressed for Raw, as stored otherwise)
    pub data: Vec<u8>,
}

/// An image placed on the page via the CTM at its `Do`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    /// The image itself
    pub info: ImageInfo,
    /// X of the placement's minimum corner
    pub x: f32,
    /// Y of the placement's minimum corner
    pub y: f32,
    /// Placed width
    pub width: f32,
    /// Placed height
    pub height: f32,
    /// Full CTM at the `Do`, for callers that need rotation/skew
    pub transform: Matrix,
}

/// Run the image pass over a parsed content stream.
pub fn extract_images<R: Read + Seek>(
    operators: &[Operator],
    resources: &HashMap<String, Object>,
    reader: &mut PdfReader<R>,
) -> Vec<PlacedImage> {
    let mut images = Vec::new();
    let mut stack = GraphicsStateStack::new();

    for op in operators {
        match op {
            Operator::SaveState => stack.save(),
            Operator::RestoreState => stack.restore(),
            Operator::Cm { a, b, c, d, e, f } => {
                let m = Matrix {
                    a: *a,
                    b: *b,
                    c: *c,
                    d: *d,
                    e: *e,
                    f: *f,
                };
                let state = stack.current_mut();
                state.ctm = state.ctm.multiply(&m);
            },
            Operator::Do { name } => {
                match load_image_xobject(name, resources, reader) {
                    Some(info) => {
                        let ctm = stack.current().ctm;
                        let (x, y, width, height) = unit_square_placement(&ctm);
                        if !is_plausible_placement(x, y, width, height) {
                            log::debug!(
                                "image {} placed at ({}, {}) size {}x{}, outside plausible bounds",
                                name,
                                x,
                                y,
                                width,
                                height
                            );
                        }
                        images.push(PlacedImage {
                            info,
                            x,
                            y,
                            width,
                            height,
                            transform: ctm,
                        });
                    },
                    None => {
                        log::debug!("Do /{} did not resolve to an image XObject", name);
                    },
                }
            },
            _ => {},
        }
    }

    images
}

/// Resolve `resources./XObject/<name>` to an image stream.
///
/// Returns None for anything that is not an image (Form XObjects, broken
/// references, missing resources).
fn load_image_xobject<R: Read + Seek>(
    name: &str,
    resources: &HashMap<String, Object>,
    reader: &mut PdfReader<R>,
) -> Option<ImageInfo> {
    let xobjects = resources.get("XObject")?;
    let xobjects = reader.resolve(xobjects).ok()?;
    let xobjects = xobjects.as_dict()?;

    let entry = xobjects.get(name)?;
    let stream = reader.resolve(entry).ok()?;
    let (dict, data) = match &stream {
        Object::Stream { dict, data } => (dict, data),
        _ => return None,
    };

    let subtype = dict.get("Subtype").and_then(|o| o.as_name());
    if subtype != Some("Image") {
        return None;
    }

    let width = dict.get("Width").and_then(|o| o.as_integer()).unwrap_or(0) as u32;
    let height = dict.get("Height").and_then(|o| o.as_integer()).unwrap_or(0) as u32;
    let bits_per_component = dict
        .get("BitsPerComponent")
        .and_then(|o| o.as_integer())
        .unwrap_or(8) as u32;
    let color_space = dict
        .get("ColorSpace")
        .and_then(|o| o.as_name())
        .map(|s| s.to_string());

    let filters = decoders::filter_names(dict.get("Filter")).unwrap_or_default();
    let (format, bytes) = if filters.iter().any(|f| f == "DCTDecode" || f == "DCT") {
        (ImageFormat::Jpeg, data.to_vec())
    } else if filters.iter().any(|f| f == "FlateDecode" || f == "Fl") {
        match decoders::flate_decode(data) {
            Ok(decoded) => (ImageFormat::Raw, decoded),
            Err(e) => {
                log::debug!("image {} flate decode failed: {}", name, e);
                (ImageFormat::Unknown, data.to_vec())
            },
        }
    } else {
        (ImageFormat::Unknown, data.to_vec())
    };

    Some(ImageInfo {
        name: name.to_string(),
        width,
        height,
        color_space,
        bits_per_component,
        format,
        data: bytes,
    })
}

/// Transform the unit square through the CTM and return the bounding
/// placement as minimum corner plus extents.
pub(crate) fn unit_square_placement(ctm: &Matrix) -> (f32, f32, f32, f32) {
    let corners = [
        ctm.transform_point(0.0, 0.0),
        ctm.transform_point(1.0, 0.0),
        ctm.transform_point(0.0, 1.0),
        ctm.transform_point(1.0, 1.0),
    ];

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for p in &corners {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    (min_x, min_y, max_x - min_x, max_y - min_y)
}

fn is_plausible_placement(x: f32, y: f32, width: f32, height: f32) -> bool {
    const LIMIT: f32 = 1.0e6;
    x.is_finite()
        && y.is_finite()
        && width.is_finite()
        && height.is_finite()
        && width > 0.0
        && height > 0.0
        && x.abs() < LIMIT
        && y.abs() < LIMIT
        && width < LIMIT
        && height < LIMIT
}

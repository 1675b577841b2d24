//! Document reader: the crate's main entry point.
//!
//! [`PdfReader`] wraps any `Read + Seek` source, locates the
//! cross-reference table, and serves objects on demand with a
//! per-reader cache. When the trailer carries an `/Encrypt` dictionary
//! the reader installs a security handler up front and decrypts objects
//! transparently once a password has authenticated; the `/Encrypt`
//! dictionary itself is never run through decryption.

use crate::content::images::extract_images;
use crate::content::operators::Operator;
use crate::content::text::extract_text_elements;
use crate::content::parse_content_stream;
use crate::decoders;
use crate::encryption::{EncryptionHandler, EncryptionInfo};
use crate::error::{Error, Result};
use crate::fonts::{FontInfo, FontResolver};
use crate::layout::{group_text_elements, ImageBlock, PageLayout};
use crate::object::{Object, ObjectRef};
use crate::parser::parse_indirect_object;
use crate::xref::{self, XrefTable};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Default US Letter media box, used when no `/MediaBox` is found.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Reader over a single PDF document.
pub struct PdfReader<R: Read + Seek> {
    reader: R,
    xref: XrefTable,
    trailer: HashMap<String, Object>,
    cache: HashMap<(u32, u16), Object>,
    encryption: Option<EncryptionHandler>,
    /// Object number of an indirect /Encrypt dictionary; exempt from
    /// decryption
    encrypt_obj_num: Option<u32>,
}

impl std::fmt::Debug for PdfReader<BufReader<File>> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfReader")
            .field("objects", &self.xref.len())
            .field("encrypted", &self.encryption.is_some())
            .finish()
    }
}

impl PdfReader<BufReader<File>> {
    /// Open a PDF document from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> PdfReader<R> {
    /// Open a PDF document from any seekable byte source.
    ///
    /// Validates the header, parses the cross-reference table the
    /// `startxref` pointer names, and probes the trailer for
    /// `/Encrypt`.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut header = Vec::with_capacity(8);
        reader.by_ref().take(8).read_to_end(&mut header)?;
        if !header.starts_with(b"%PDF-") {
            return Err(Error::InvalidPdf("missing %PDF header".to_string()));
        }

        let startxref = xref::find_startxref(&mut reader)?;
        let table = xref::parse_xref(&mut reader, startxref)?;
        let trailer = table.trailer().clone();

        let mut document = Self {
            reader,
            xref: table,
            trailer,
            cache: HashMap::new(),
            encryption: None,
            encrypt_obj_num: None,
        };
        document.init_encryption()?;
        Ok(document)
    }

    /// Install the security handler when the trailer names `/Encrypt`.
    fn init_encryption(&mut self) -> Result<()> {
        let encrypt = match self.trailer.get("Encrypt") {
            Some(obj) => obj.clone(),
            None => return Ok(()),
        };

        let file_id = match self.trailer.get("ID") {
            Some(Object::Array(arr)) => arr
                .first()
                .and_then(|o| o.as_string())
                .map(|s| s.to_vec())
                .unwrap_or_default(),
            _ => {
                log::warn!("encrypted document has no usable /ID, using an empty file identifier");
                Vec::new()
            },
        };

        let encrypt_obj = match &encrypt {
            Object::Dictionary(_) => encrypt.clone(),
            Object::Reference(obj_ref) => {
                self.encrypt_obj_num = Some(obj_ref.id);
                self.get_object(obj_ref.id, obj_ref.gen)?
            },
            other => {
                return Err(Error::InvalidPdf(format!(
                    "/Encrypt has type {}",
                    other.type_name()
                )));
            },
        };

        let mut handler = EncryptionHandler::new(&encrypt_obj, file_id)?;

        // Many producers encrypt with the empty user password
        if handler.authenticate(b"").is_ok() {
            log::info!("authenticated with the empty password");
        }

        self.encryption = Some(handler);
        self.cache.clear();
        Ok(())
    }

    /// Whether the document carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    /// Try a password against the security handler.
    ///
    /// The password is tried as the user password first, then as the
    /// owner password via user-password recovery. Objects fetched
    /// before authentication were served as stored, so the cache is
    /// dropped on success.
    pub fn authenticate_with_password(&mut self, password: &[u8]) -> Result<()> {
        let handler = self
            .encryption
            .as_mut()
            .ok_or_else(|| Error::InvalidPdf("document is not encrypted".to_string()))?;
        handler.authenticate(password)?;
        self.cache.clear();
        Ok(())
    }

    /// Snapshot of the encryption parameters, None for plaintext files.
    pub fn encryption_info(&self) -> Option<EncryptionInfo> {
        self.encryption.as_ref().map(|h| h.info())
    }

    /// Load an indirect object by number and generation.
    pub fn get_object(&mut self, id: u32, gen: u16) -> Result<Object> {
        if let Some(obj) = self.cache.get(&(id, gen)) {
            return Ok(obj.clone());
        }

        let entry = *self.xref.get(id).ok_or(Error::ObjectNotFound(id, gen))?;
        if !entry.in_use {
            return Err(Error::ObjectNotFound(id, gen));
        }

        let buf = self.read_from(entry.offset)?;
        let indirect = parse_indirect_object(&buf, entry.offset as usize)?;
        if indirect.id != id || indirect.gen != gen {
            return Err(Error::ObjectMismatch {
                expected_id: id,
                expected_gen: gen,
                found_id: indirect.id,
                found_gen: indirect.gen,
            });
        }

        let mut object = indirect.object;
        if let Some(handler) = &self.encryption {
            if self.encrypt_obj_num != Some(id) {
                object = handler.decrypt_object(object, id, gen)?;
            }
        }

        self.cache.insert((id, gen), object.clone());
        Ok(object)
    }

    /// Follow a reference one hop; non-references come back cloned.
    pub fn resolve(&mut self, obj: &Object) -> Result<Object> {
        match obj {
            Object::Reference(obj_ref) => self.get_object(obj_ref.id, obj_ref.gen),
            other => Ok(other.clone()),
        }
    }

    /// The document catalog (`trailer./Root`).
    pub fn catalog(&mut self) -> Result<Object> {
        let root = self
            .trailer
            .get("Root")
            .cloned()
            .ok_or_else(|| Error::InvalidPdf("trailer has no /Root".to_string()))?;
        let catalog = self.resolve(&root)?;
        if catalog.as_dict().is_none() {
            return Err(Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: catalog.type_name().to_string(),
            });
        }
        Ok(catalog)
    }

    /// Number of pages, counted by walking the page tree.
    pub fn page_count(&mut self) -> Result<usize> {
        Ok(self.page_refs()?.len())
    }

    /// A page's dictionary by zero-based index.
    pub fn page(&mut self, index: usize) -> Result<HashMap<String, Object>> {
        let refs = self.page_refs()?;
        let page_ref = *refs.get(index).ok_or(Error::PageOutOfRange {
            index,
            count: refs.len(),
        })?;

        let obj = self.get_object(page_ref.id, page_ref.gen)?;
        let found = obj.type_name().to_string();
        obj.as_dict().cloned().ok_or(Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found,
        })
    }

    /// A page's decoded content bytes.
    ///
    /// `/Contents` arrays are concatenated with a single newline so
    /// operator spans split across streams stay separated. On an
    /// encrypted document this requires prior authentication; serving
    /// raw ciphertext as content would only look like garbage to the
    /// caller.
    pub fn page_contents(&mut self, index: usize) -> Result<Vec<u8>> {
        if let Some(handler) = &self.encryption {
            if !handler.is_authenticated() {
                return Err(Error::NotAuthenticated);
            }
        }

        let page = self.page(index)?;
        let contents = match page.get("Contents") {
            Some(obj) => obj.clone(),
            None => return Ok(Vec::new()),
        };

        let resolved = self.resolve(&contents)?;
        let streams: Vec<Object> = match resolved {
            Object::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    out.push(self.resolve(item)?);
                }
                out
            },
            other => vec![other],
        };

        let mut output = Vec::new();
        for stream in &streams {
            match stream {
                Object::Stream { dict, data } => {
                    let filter = match dict.get("Filter") {
                        Some(f) => Some(self.resolve(f)?),
                        None => None,
                    };
                    let decoded = decoders::decode_stream(data, filter.as_ref())?;
                    if !output.is_empty() {
                        output.push(b'\n');
                    }
                    output.extend_from_slice(&decoded);
                },
                other => {
                    log::warn!("/Contents entry is a {}, skipping", other.type_name());
                },
            }
        }
        Ok(output)
    }

    /// A page's `/Resources` dictionary, inherited from ancestors when
    /// the leaf lacks one.
    pub fn page_resources(&mut self, index: usize) -> Result<HashMap<String, Object>> {
        let page = self.page(index)?;
        let mut current = page;
        for _ in 0..MAX_TREE_DEPTH {
            if let Some(resources) = current.get("Resources") {
                let resolved = self.resolve(resources)?;
                return Ok(resolved.as_dict().cloned().unwrap_or_default());
            }
            match current.get("Parent").cloned() {
                Some(parent) => match self.resolve(&parent)?.as_dict() {
                    Some(dict) => current = dict.clone(),
                    None => break,
                },
                None => break,
            }
        }
        Ok(HashMap::new())
    }

    /// Extract the full layout of one page. Always computed fresh.
    pub fn extract_page_layout(&mut self, index: usize) -> Result<PageLayout> {
        let page = self.page(index)?;
        let media_box = self.media_box_for(&page)?;
        let width = media_box[2] - media_box[0];
        let height = media_box[3] - media_box[1];

        let contents = self.page_contents(index)?;
        let operators = parse_content_stream(&contents)?;
        let resources = self.page_resources(index)?;

        // Resolve each font named by a Tf once
        let mut resolver = FontResolver::new();
        let mut fonts: HashMap<String, FontInfo> = HashMap::new();
        for op in &operators {
            if let Operator::Tf { font, .. } = op {
                if !fonts.contains_key(font) {
                    let info = resolver.get_font(font, &resources, self);
                    fonts.insert(font.clone(), info);
                }
            }
        }

        let elements = extract_text_elements(&operators, &fonts);
        let text_blocks = group_text_elements(&elements);
        let images = extract_images(&operators, &resources, self)
            .into_iter()
            .map(ImageBlock::from)
            .collect();

        Ok(PageLayout {
            page_num: index,
            width,
            height,
            text_blocks,
            images,
        })
    }

    /// Walk the parent chain for an inheritable `/MediaBox`.
    fn media_box_for(&mut self, page: &HashMap<String, Object>) -> Result<[f32; 4]> {
        let mut current = page.clone();
        for _ in 0..MAX_TREE_DEPTH {
            if let Some(mb) = current.get("MediaBox") {
                let resolved = self.resolve(mb)?;
                if let Some(values) = media_box_values(&resolved) {
                    return Ok(values);
                }
                log::warn!("malformed /MediaBox, using default");
                break;
            }
            match current.get("Parent").cloned() {
                Some(parent) => match self.resolve(&parent)?.as_dict() {
                    Some(dict) => current = dict.clone(),
                    None => break,
                },
                None => break,
            }
        }
        Ok(DEFAULT_MEDIA_BOX)
    }

    /// Collect page references in tree order.
    fn page_refs(&mut self) -> Result<Vec<ObjectRef>> {
        let catalog = self.catalog()?;
        let pages = catalog
            .as_dict()
            .and_then(|d| d.get("Pages"))
            .cloned()
            .ok_or_else(|| Error::InvalidPdf("catalog has no /Pages".to_string()))?;

        let mut refs = Vec::new();
        let mut visited = HashSet::new();
        self.collect_pages(&pages, &mut refs, &mut visited, 0)?;
        Ok(refs)
    }

    fn collect_pages(
        &mut self,
        node: &Object,
        out: &mut Vec<ObjectRef>,
        visited: &mut HashSet<(u32, u16)>,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_TREE_DEPTH {
            return Err(Error::InvalidPdf("page tree too deep".to_string()));
        }

        let node_ref = node.as_reference();
        if let Some(obj_ref) = node_ref {
            // A revisited node means a cycle
            if !visited.insert((obj_ref.id, obj_ref.gen)) {
                return Ok(());
            }
        }

        let resolved = self.resolve(node)?;
        let dict = match resolved.as_dict() {
            Some(d) => d.clone(),
            None => {
                return Err(Error::InvalidPdf(
                    "page tree node is not a dictionary".to_string(),
                ));
            },
        };

        let node_type = dict.get("Type").and_then(|o| o.as_name());
        let is_pages = node_type == Some("Pages")
            || (node_type.is_none() && dict.contains_key("Kids"));

        if is_pages {
            let kids = dict
                .get("Kids")
                .cloned()
                .ok_or_else(|| Error::InvalidPdf("/Pages node has no /Kids".to_string()))?;
            let kids = self.resolve(&kids)?;
            let kids = kids
                .as_array()
                .cloned()
                .ok_or_else(|| Error::InvalidPdf("/Kids is not an array".to_string()))?;
            for kid in &kids {
                self.collect_pages(kid, out, visited, depth + 1)?;
            }
        } else {
            match node_ref {
                Some(obj_ref) => out.push(obj_ref),
                None => {
                    log::warn!("page leaf is a direct object, skipping");
                },
            }
        }

        Ok(())
    }

    fn read_from(&mut self, offset: u64) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

const MAX_TREE_DEPTH: usize = 64;

fn media_box_values(obj: &Object) -> Option<[f32; 4]> {
    let arr = obj.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    let mut values = [0f32; 4];
    for (value, entry) in values.iter_mut().zip(arr.iter()) {
        *value = entry.as_number()? as f32;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn push_object(buf: &mut Vec<u8>, offsets: &mut Vec<usize>, id: u32, body: &[u8]) {
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream_object(dict_extra: &str, data: &[u8]) -> Vec<u8> {
        let mut body =
            format!("<< /Length {}{} >>\nstream\n", data.len(), dict_extra).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        body
    }

    fn finish_pdf(mut buf: Vec<u8>, offsets: Vec<usize>, trailer_extra: &str) -> Vec<u8> {
        let xref_offset = buf.len();
        let count = offsets.len() + 1;
        buf.extend_from_slice(format!("xref\n0 {}\n", count).as_bytes());
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            buf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R{} >>\nstartxref\n{}\n%%EOF\n",
                count, trailer_extra, xref_offset
            )
            .as_bytes(),
        );
        buf
    }

    /// One catalog, one Pages node carrying the MediaBox, one page,
    /// one content stream.
    fn simple_pdf(content: &[u8]) -> Vec<u8> {
        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            3,
            b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
        );
        push_object(&mut buf, &mut offsets, 4, &stream_object("", content));
        finish_pdf(buf, offsets, "")
    }

    fn open_bytes(bytes: Vec<u8>) -> PdfReader<Cursor<Vec<u8>>> {
        PdfReader::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_open_simple_document() {
        let mut reader = open_bytes(simple_pdf(b"BT ET"));
        assert!(!reader.is_encrypted());
        assert!(reader.encryption_info().is_none());
        assert_eq!(reader.page_count().unwrap(), 1);
    }

    #[test]
    fn test_missing_header_rejected() {
        let result = PdfReader::from_reader(Cursor::new(b"not a pdf at all".to_vec()));
        assert!(matches!(result, Err(Error::InvalidPdf(_))));
    }

    #[test]
    fn test_page_out_of_range() {
        let mut reader = open_bytes(simple_pdf(b"BT ET"));
        let err = reader.page(1).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { index: 1, count: 1 }));
    }

    #[test]
    fn test_get_object_and_resolve() {
        let mut reader = open_bytes(simple_pdf(b"BT ET"));
        let catalog = reader.get_object(1, 0).unwrap();
        let dict = catalog.as_dict().unwrap();
        assert_eq!(dict.get("Type").and_then(|o| o.as_name()), Some("Catalog"));

        let pages_ref = dict.get("Pages").unwrap().clone();
        let pages = reader.resolve(&pages_ref).unwrap();
        assert!(pages.as_dict().is_some());
    }

    #[test]
    fn test_object_not_found() {
        let mut reader = open_bytes(simple_pdf(b"BT ET"));
        assert!(matches!(
            reader.get_object(99, 0),
            Err(Error::ObjectNotFound(99, 0))
        ));
    }

    #[test]
    fn test_media_box_inherited_from_pages_node() {
        let mut reader = open_bytes(simple_pdf(b"BT ET"));
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.width, 612.0);
        assert_eq!(layout.height, 792.0);
    }

    #[test]
    fn test_media_box_default_when_absent() {
        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
        );
        push_object(&mut buf, &mut offsets, 3, b"<< /Type /Page /Parent 2 0 R >>");
        let bytes = finish_pdf(buf, offsets, "");

        let mut reader = open_bytes(bytes);
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.width, 612.0);
        assert_eq!(layout.height, 792.0);
        assert!(layout.text_blocks.is_empty());
    }

    #[test]
    fn test_text_extracted_at_td_coordinates() {
        let mut reader =
            open_bytes(simple_pdf(b"BT /F1 12 Tf 72 700 Td (Hello World) Tj ET"));
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.text_blocks.len(), 1);
        let block = &layout.text_blocks[0];
        assert_eq!(block.text, "Hello World");
        assert_eq!(block.bounds.x, 72.0);
        assert_eq!(block.bounds.y, 700.0);
        assert_eq!(block.font_name.as_deref(), Some("F1"));
        assert_eq!(block.font_size, 12.0);
    }

    #[test]
    fn test_contents_array_joined_with_newline() {
        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            3,
            b"<< /Type /Page /Parent 2 0 R /Contents [4 0 R 5 0 R] >>",
        );
        push_object(&mut buf, &mut offsets, 4, &stream_object("", b"BT 10 20 Td"));
        push_object(&mut buf, &mut offsets, 5, &stream_object("", b"(Hi) Tj ET"));
        let bytes = finish_pdf(buf, offsets, "");

        let mut reader = open_bytes(bytes);
        let contents = reader.page_contents(0).unwrap();
        assert_eq!(contents, b"BT 10 20 Td\n(Hi) Tj ET");

        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.text_blocks[0].text, "Hi");
        assert_eq!(layout.text_blocks[0].bounds.x, 10.0);
    }

    #[test]
    fn test_flate_compressed_contents() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let plain = b"BT /F1 12 Tf 100 100 Td (zipped) Tj ET";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            3,
            b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            4,
            &stream_object(" /Filter /FlateDecode", &compressed),
        );
        let bytes = finish_pdf(buf, offsets, "");

        let mut reader = open_bytes(bytes);
        assert_eq!(reader.page_contents(0).unwrap(), plain);
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.text_blocks[0].text, "zipped");
    }

    #[test]
    fn test_image_xobject_extracted() {
        let jpeg_bytes = b"\xFF\xD8\xFF\xE0 not a real jpeg \xFF\xD9";
        let image = stream_object(
            " /Type /XObject /Subtype /Image /Width 8 /Height 4 \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
            jpeg_bytes,
        );

        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            3,
            b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R \
              /Resources << /XObject << /Im1 5 0 R >> >> >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            4,
            &stream_object("", b"q 200 0 0 100 30 40 cm /Im1 Do Q"),
        );
        push_object(&mut buf, &mut offsets, 5, &image);
        let bytes = finish_pdf(buf, offsets, "");

        let mut reader = open_bytes(bytes);
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.images.len(), 1);
        let img = &layout.images[0];
        assert_eq!(img.info.width, 8);
        assert_eq!(img.info.height, 4);
        assert_eq!(img.info.format, crate::content::ImageFormat::Jpeg);
        assert_eq!(img.info.data, jpeg_bytes);
        assert_eq!((img.x, img.y), (30.0, 40.0));
        assert_eq!((img.width, img.height), (200.0, 100.0));
    }

    #[test]
    fn test_to_unicode_font_used_for_decoding() {
        let cmap = b"beginbfchar\n<0001> <0048>\n<0002> <0069>\nendbfchar";
        let cmap_stream = stream_object("", cmap);

        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            3,
            b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R \
              /Resources << /Font << /F1 5 0 R >> >> >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            4,
            &stream_object("", b"BT /F1 12 Tf 10 10 Td <00010002> Tj ET"),
        );
        push_object(
            &mut buf,
            &mut offsets,
            5,
            b"<< /Type /Font /Subtype /Type0 /ToUnicode 6 0 R >>",
        );
        push_object(&mut buf, &mut offsets, 6, &cmap_stream);
        let bytes = finish_pdf(buf, offsets, "");

        let mut reader = open_bytes(bytes);
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.text_blocks[0].text, "Hi");
    }

    // Encrypted fixtures: RC4-128 (V=2, R=3) with the content stream
    // encrypted under its per-object key.

    const FIXTURE_FILE_ID: &[u8] = b"doc-fixture-id";
    const FIXTURE_PERMISSIONS: i32 = -4;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }

    fn object_key_rc4(file_key: &[u8], id: u32, gen: u16) -> Vec<u8> {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(file_key);
        hasher.update(&id.to_le_bytes()[..3]);
        hasher.update(gen.to_le_bytes());
        hasher.finalize()[..16].to_vec()
    }

    fn encrypted_pdf(user_pass: &[u8], owner_pass: &[u8], content: &[u8]) -> Vec<u8> {
        use crate::encryption::algorithms::{
            compute_encryption_key, compute_owner_password_hash, compute_user_key_r3,
        };
        use crate::encryption::rc4::rc4_crypt;

        let owner_hash = compute_owner_password_hash(owner_pass, user_pass, 3, 16);
        let file_key = compute_encryption_key(
            user_pass,
            &owner_hash,
            FIXTURE_PERMISSIONS,
            FIXTURE_FILE_ID,
            3,
            16,
            true,
        );
        let user_hash = compute_user_key_r3(&file_key, FIXTURE_FILE_ID);

        let encrypted = rc4_crypt(&object_key_rc4(&file_key, 4, 0), content);

        let mut buf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        push_object(&mut buf, &mut offsets, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
        push_object(
            &mut buf,
            &mut offsets,
            2,
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
        );
        push_object(
            &mut buf,
            &mut offsets,
            3,
            b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
        );
        push_object(&mut buf, &mut offsets, 4, &stream_object("", &encrypted));
        push_object(
            &mut buf,
            &mut offsets,
            5,
            format!(
                "<< /Filter /Standard /V 2 /R 3 /Length 128 /O <{}> /U <{}> /P {} >>",
                hex(&owner_hash),
                hex(&user_hash),
                FIXTURE_PERMISSIONS
            )
            .as_bytes(),
        );
        finish_pdf(
            buf,
            offsets,
            &format!(
                " /Encrypt 5 0 R /ID [<{0}> <{0}>]",
                hex(FIXTURE_FILE_ID)
            ),
        )
    }

    const SECRET_CONTENT: &[u8] = b"BT /F1 12 Tf 72 700 Td (Secret) Tj ET";

    #[test]
    fn test_encrypted_document_detected() {
        let mut reader = open_bytes(encrypted_pdf(b"user-pw", b"owner-pw", SECRET_CONTENT));
        assert!(reader.is_encrypted());
        let info = reader.encryption_info().unwrap();
        assert_eq!(info.revision, 3);
        assert!(!info.authenticated);
    }

    #[test]
    fn test_unauthenticated_content_access_signals() {
        let mut reader = open_bytes(encrypted_pdf(b"user-pw", b"owner-pw", SECRET_CONTENT));
        assert!(matches!(reader.page_contents(0), Err(Error::NotAuthenticated)));
        assert!(matches!(
            reader.extract_page_layout(0),
            Err(Error::NotAuthenticated)
        ));
    }

    #[test]
    fn test_unauthenticated_objects_served_as_stored() {
        // Below the content API, objects pass through undecrypted
        let mut reader = open_bytes(encrypted_pdf(b"user-pw", b"owner-pw", SECRET_CONTENT));
        let obj = reader.get_object(4, 0).unwrap();
        match obj {
            Object::Stream { data, .. } => {
                assert_eq!(data.len(), SECRET_CONTENT.len());
                assert_ne!(&data[..], SECRET_CONTENT);
            },
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_password_fails_and_stays_locked() {
        let mut reader = open_bytes(encrypted_pdf(b"user-pw", b"owner-pw", SECRET_CONTENT));
        let err = reader.authenticate_with_password(b"nope").unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed));
        assert!(!reader.encryption_info().unwrap().authenticated);
        assert!(matches!(reader.page_contents(0), Err(Error::NotAuthenticated)));
    }

    #[test]
    fn test_user_password_decrypts_content() {
        let mut reader = open_bytes(encrypted_pdf(b"user-pw", b"owner-pw", SECRET_CONTENT));
        reader.authenticate_with_password(b"user-pw").unwrap();

        let info = reader.encryption_info().unwrap();
        assert!(info.authenticated);
        assert!(!info.is_owner);

        assert_eq!(reader.page_contents(0).unwrap(), SECRET_CONTENT);
        let layout = reader.extract_page_layout(0).unwrap();
        assert_eq!(layout.text_blocks[0].text, "Secret");
        assert_eq!(layout.text_blocks[0].bounds.x, 72.0);
    }

    #[test]
    fn test_owner_password_authenticates_via_recovery() {
        let mut reader = open_bytes(encrypted_pdf(b"user-pw", b"owner-pw", SECRET_CONTENT));
        reader.authenticate_with_password(b"owner-pw").unwrap();

        let info = reader.encryption_info().unwrap();
        assert!(info.authenticated);
        assert!(info.is_owner);
        assert_eq!(reader.page_contents(0).unwrap(), SECRET_CONTENT);
    }

    #[test]
    fn test_authenticate_on_plaintext_document_errors() {
        let mut reader = open_bytes(simple_pdf(b"BT ET"));
        assert!(matches!(
            reader.authenticate_with_password(b"pw"),
            Err(Error::InvalidPdf(_))
        ));
    }
}

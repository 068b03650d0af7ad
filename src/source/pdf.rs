//! PDF document source backed by lopdf.
//!
//! Pages are decomposed by walking the content stream: each `BT`..`ET`
//! text object becomes a text block, each `Do` on an image XObject an image
//! block, and each `BI` inline image an image block without a reference.
//! Form XObjects are entered recursively with their own resources.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, ImageError, Result};
use crate::model::{ContentBlock, ExtractedImage, ImageRef, Metadata, Page};

use super::filters::{decode_stage, generic_filter, StageError};
use super::{DocumentSource, ImageExtractor};

/// Nesting limit for form XObjects and `/Parent` chains.
const MAX_DEPTH: usize = 16;

/// TJ displacement (thousandths of text space) treated as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A PDF opened for assembly.
pub struct PdfSource {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    filename: Option<String>,
}

impl PdfSource {
    /// Open a PDF file. The file name is recorded for the result.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_format_from_path(path)?;

        let doc = LopdfDocument::load(path).map_err(Error::from)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(Self::with_document(doc, filename))
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(Error::from)?;
        Ok(Self::with_document(doc, None))
    }

    /// Load a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Set the file name reported with the result.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    fn with_document(doc: LopdfDocument, filename: Option<String>) -> Self {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; content may be unreadable");
        }
        let pages = doc.get_pages();
        Self {
            doc,
            pages,
            filename,
        }
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.pages
            .get(&index)
            .copied()
            .ok_or(Error::PageOutOfRange(index, self.pages.len() as u32))
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj)? {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Page resources, following `/Parent` for inherited entries.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_DEPTH {
            if let Ok(res) = node.get(b"Resources") {
                return self.resolve_dict(res);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn xobjects<'a>(&'a self, resources: Option<&'a Dictionary>) -> Option<&'a Dictionary> {
        resources?
            .get(b"XObject")
            .ok()
            .and_then(|x| self.resolve_dict(x))
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => stream_content(s),
                Object::Array(arr) => self.concat_streams(arr),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => self.concat_streams(arr),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, parts: &[Object]) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for obj in parts {
            if let Some(Object::Stream(s)) = self.resolve(obj) {
                content.extend_from_slice(&stream_content(s)?);
                content.push(b' ');
            }
        }
        Ok(content)
    }

    /// Image XObjects reachable from `resources`, in dictionary order.
    fn collect_inventory(
        &self,
        resources: Option<&Dictionary>,
        depth: usize,
        seen_forms: &mut HashSet<ObjectId>,
        out: &mut Vec<ImageRef>,
    ) {
        let Some(xobjects) = self.xobjects(resources) else {
            return;
        };

        for (_, obj) in xobjects.iter() {
            let Ok(id) = obj.as_reference() else {
                continue;
            };
            let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
                continue;
            };
            match subtype(&stream.dict) {
                Some(b"Image") => {
                    let reference = ImageRef::from(id);
                    if !out.contains(&reference) {
                        out.push(reference);
                    }
                }
                Some(b"Form") if depth < MAX_DEPTH && seen_forms.insert(id) => {
                    let form_resources = self.form_resources(stream).or(resources);
                    self.collect_inventory(form_resources, depth + 1, seen_forms, out);
                }
                _ => {}
            }
        }
    }

    fn form_resources<'a>(&'a self, form: &'a Stream) -> Option<&'a Dictionary> {
        form.dict
            .get(b"Resources")
            .ok()
            .and_then(|r| self.resolve_dict(r))
    }

    fn inventory(&self, resources: Option<&Dictionary>) -> Vec<ImageRef> {
        let mut out = Vec::new();
        self.collect_inventory(resources, 0, &mut HashSet::new(), &mut out);
        out
    }

    /// Decode a text byte sequence with the named font's encoding.
    fn decode_text(&self, fonts: Option<&Dictionary>, font_name: &[u8], bytes: &[u8]) -> String {
        let font = fonts
            .and_then(|f| f.get(font_name).ok())
            .and_then(|f| self.resolve_dict(f));
        if let Some(font) = font {
            if let Ok(enc) = font.get_font_encoding(&self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    /// Extract document metadata.
    fn extract_metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.version());

        if let Some(info_dict) = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| self.resolve_dict(info))
        {
            metadata.title = get_string_from_dict(info_dict, b"Title");
            metadata.author = get_string_from_dict(info_dict, b"Author");
            metadata.subject = get_string_from_dict(info_dict, b"Subject");
            metadata.creator = get_string_from_dict(info_dict, b"Creator");
            metadata.producer = get_string_from_dict(info_dict, b"Producer");
            metadata.created =
                get_string_from_dict(info_dict, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified =
                get_string_from_dict(info_dict, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata.page_count = self.pages.len() as u32;
        metadata.encrypted = self.doc.is_encrypted();
        metadata
    }

    /// `/DecodeParms` for each of `count` filter stages.
    fn decode_params<'a>(&'a self, dict: &'a Dictionary, count: usize) -> Vec<Option<&'a Dictionary>> {
        match dict.get(b"DecodeParms").ok().and_then(|p| self.resolve(p)) {
            Some(Object::Array(items)) => (0..count)
                .map(|i| items.get(i).and_then(|p| self.resolve_dict(p)))
                .collect(),
            Some(Object::Dictionary(d)) => vec![Some(d); count],
            _ => vec![None; count],
        }
    }

    fn extract_stream(
        &self,
        reference: ImageRef,
        stream: &Stream,
    ) -> std::result::Result<ExtractedImage, ImageError> {
        let filters = filter_names(&stream.dict);
        let params = self.decode_params(&stream.dict, filters.len());

        // An image codec is only meaningful as the last stage.
        let (codec, stages) = match filters.split_last() {
            Some((last, leading)) => match passthrough_extension(last) {
                Some(extension) => (Some(extension), leading),
                None => (None, filters.as_slice()),
            },
            None => (None, filters.as_slice()),
        };

        let payload = decode_stages(reference, stages, &params, &stream.content)?;
        if payload.is_empty() {
            return Err(ImageError::Decode {
                reference,
                reason: "image stream is empty".to_string(),
            });
        }

        Ok(match codec {
            Some(extension) => ExtractedImage::new(extension, payload),
            None => ExtractedImage::sniffed(payload),
        })
    }
}

impl ImageExtractor for PdfSource {
    fn extract(&self, reference: ImageRef) -> std::result::Result<ExtractedImage, ImageError> {
        if reference.is_null() {
            return Err(ImageError::Unresolvable(reference));
        }

        let obj = self
            .doc
            .get_object(reference.into())
            .map_err(|_| ImageError::NotFound(reference))?;

        match obj {
            Object::Stream(stream) if matches!(subtype(&stream.dict), Some(b"Image")) => {
                self.extract_stream(reference, stream)
            }
            _ => Err(ImageError::NotAnImage(reference)),
        }
    }
}

impl DocumentSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, index: u32) -> Result<Page> {
        let page_id = self.page_id(index)?;
        let resources = self.page_resources(page_id);
        let content = self.page_content(page_id)?;

        let mut walker = BlockWalker::new(self);
        walker.walk(&content, resources, 0)?;

        Ok(Page {
            index,
            blocks: walker.blocks,
            image_inventory: self.inventory(resources),
        })
    }

    fn page_inventory(&self, index: u32) -> Result<Vec<ImageRef>> {
        let page_id = self.page_id(index)?;
        Ok(self.inventory(self.page_resources(page_id)))
    }

    fn metadata(&self) -> Metadata {
        self.extract_metadata()
    }

    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}

/// Content stream walker producing blocks in reading order.
struct BlockWalker<'a> {
    source: &'a PdfSource,
    blocks: Vec<ContentBlock>,
    seen_forms: HashSet<ObjectId>,
}

impl<'a> BlockWalker<'a> {
    fn new(source: &'a PdfSource) -> Self {
        Self {
            source,
            blocks: Vec::new(),
            seen_forms: HashSet::new(),
        }
    }

    fn walk(&mut self, content: &[u8], resources: Option<&'a Dictionary>, depth: usize) -> Result<()> {
        let content = Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;
        let fonts = resources
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|f| self.source.resolve_dict(f));

        let mut spans: Vec<String> = Vec::new();
        let mut font_name: Vec<u8> = Vec::new();
        let mut in_text = false;

        for op in &content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_text = true;
                    spans.clear();
                }
                "ET" => {
                    in_text = false;
                    self.flush_text(&mut spans);
                }
                "Tf" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        font_name = name.clone();
                    }
                }
                "Tj" | "'" | "\"" if in_text => {
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = op.operands.get(idx) {
                        push_span(&mut spans, self.source.decode_text(fonts, &font_name, bytes));
                    }
                }
                "TJ" if in_text => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let text = decode_tj(items, |bytes| {
                            self.source.decode_text(fonts, &font_name, bytes)
                        });
                        push_span(&mut spans, text);
                    }
                }
                "Do" => {
                    self.flush_text(&mut spans);
                    if let Some(Object::Name(name)) = op.operands.first() {
                        self.invoke_xobject(name, resources, depth)?;
                    }
                }
                "BI" => {
                    self.flush_text(&mut spans);
                    self.blocks.push(ContentBlock::inline_image());
                }
                _ => {}
            }
        }

        // Unterminated text object
        self.flush_text(&mut spans);
        Ok(())
    }

    fn flush_text(&mut self, spans: &mut Vec<String>) {
        if !spans.is_empty() {
            self.blocks.push(ContentBlock::Text {
                spans: std::mem::take(spans),
            });
        }
    }

    fn invoke_xobject(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        depth: usize,
    ) -> Result<()> {
        let source = self.source;
        let Some(entry) = source.xobjects(resources).and_then(|x| x.get(name).ok()) else {
            log::warn!(
                "XObject /{} is not in the page resources",
                String::from_utf8_lossy(name)
            );
            self.blocks.push(ContentBlock::image(ImageRef::NULL));
            return Ok(());
        };

        let (id, stream) = match entry {
            Object::Reference(id) => match source.doc.get_object(*id) {
                Ok(Object::Stream(s)) => (Some(*id), s),
                _ => {
                    self.blocks.push(ContentBlock::image(ImageRef::from(*id)));
                    return Ok(());
                }
            },
            Object::Stream(s) => (None, s),
            _ => return Ok(()),
        };

        match subtype(&stream.dict) {
            Some(b"Image") => {
                // A direct image stream has no object id to extract by.
                self.blocks.push(ContentBlock::Image {
                    reference: id.map(ImageRef::from),
                });
            }
            Some(b"Form") => {
                let fresh = id.map_or(true, |id| self.seen_forms.insert(id));
                if depth < MAX_DEPTH && fresh {
                    let form_resources = source.form_resources(stream).or(resources);
                    let content = stream_content(stream)?;
                    self.walk(&content, form_resources, depth + 1)?;
                    if let Some(id) = id {
                        self.seen_forms.remove(&id);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn push_span(spans: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        spans.push(text);
    }
}

/// Decode a TJ array, turning wide negative displacements into spaces.
fn decode_tj(items: &[Object], decode: impl Fn(&[u8]) -> String) -> String {
    let mut combined = String::new();
    for item in items {
        let adjustment = match item {
            Object::String(bytes, _) => {
                combined.push_str(&decode(bytes));
                continue;
            }
            Object::Integer(n) => -(*n as f32),
            Object::Real(n) => -n,
            _ => continue,
        };
        if adjustment > TJ_SPACE_THRESHOLD
            && !combined.ends_with(' ')
            && !combined.ends_with('\u{00A0}')
        {
            if let Some(c) = combined.chars().last() {
                if !is_spaceless_script_char(c) {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}

/// Scripts written without inter-word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK Extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK Unified Ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul Syllables
        | '\u{0E00}'..='\u{0E7F}' // Thai
    )
}

fn subtype(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Subtype").ok().and_then(|s| s.as_name().ok())
}

fn stream_content(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content().map_err(Error::from)
    } else {
        Ok(stream.content.clone())
    }
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Image codecs whose encoded bytes are usable as a file on their own.
fn passthrough_extension(filter: &str) -> Option<&'static str> {
    match filter {
        "DCTDecode" | "DCT" => Some("jpg"),
        "JPXDecode" => Some("jp2"),
        "JBIG2Decode" => Some("jb2"),
        "CCITTFaxDecode" | "CCF" => Some("fax"),
        _ => None,
    }
}

/// Undo the generic filter stages in front of the image bytes.
fn decode_stages(
    reference: ImageRef,
    stages: &[String],
    params: &[Option<&Dictionary>],
    content: &[u8],
) -> std::result::Result<Vec<u8>, ImageError> {
    let mut data = content.to_vec();
    for (i, stage) in stages.iter().enumerate() {
        if generic_filter(stage).is_none() {
            return Err(ImageError::UnsupportedFilter {
                reference,
                filter: stage.clone(),
            });
        }
        let stage_params = params.get(i).copied().flatten();
        data = decode_stage(stage, &data, stage_params).map_err(|e| match e {
            StageError::Unsupported(filter) => ImageError::UnsupportedFilter { reference, filter },
            StageError::Corrupt(reason) => ImageError::Decode { reference, reason },
        })?;
    }
    Ok(data)
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

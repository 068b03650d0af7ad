//! Builds small PDFs in memory for integration tests.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Bytes that start like a JPEG file.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    /// Add an image XObject with the given filter chain.
    pub fn image(&mut self, filters: &[&str], data: Vec<u8>) -> ObjectId {
        self.image_with_params(filters, data, Dictionary::new())
    }

    /// Add an image XObject with `/DecodeParms`, when not empty.
    pub fn image_with_params(
        &mut self,
        filters: &[&str],
        data: Vec<u8>,
        params: Dictionary,
    ) -> ObjectId {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        };
        match filters {
            [] => {}
            [single] => dict.set("Filter", Object::Name(single.as_bytes().to_vec())),
            many => dict.set(
                "Filter",
                Object::Array(
                    many.iter()
                        .map(|f| Object::Name(f.as_bytes().to_vec()))
                        .collect(),
                ),
            ),
        }
        if !params.is_empty() {
            dict.set("DecodeParms", params);
        }
        self.doc.add_object(Stream::new(dict, data))
    }

    /// Add a JPEG image passed through as-is.
    pub fn jpeg(&mut self) -> ObjectId {
        self.image(&["DCTDecode"], JPEG_BYTES.to_vec())
    }

    /// Add a form XObject drawing `content` with its own image resources.
    pub fn form(&mut self, xobjects: &[(&str, ObjectId)], content: &str) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
            "Resources" => self.resources(xobjects),
        };
        self.doc
            .add_object(Stream::new(dict, content.as_bytes().to_vec()))
    }

    /// Add a page with the given XObject resources and raw content stream.
    pub fn page(&mut self, xobjects: &[(&str, ObjectId)], content: &str) -> ObjectId {
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => self.resources(xobjects),
        });
        self.kids.push(page_id.into());
        page_id
    }

    pub fn info(&mut self, title: &str) {
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "CreationDate" => Object::string_literal("D:20240115103045"),
        });
        self.doc.trailer.set("Info", info_id);
    }

    fn resources(&self, xobjects: &[(&str, ObjectId)]) -> Dictionary {
        let mut x = Dictionary::new();
        for (name, id) in xobjects {
            x.set(*name, Object::Reference(*id));
        }
        dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
            "XObject" => x,
        }
    }

    pub fn build(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).unwrap();
        buf
    }
}

/// `BT ... ET` showing one string.
pub fn text(s: &str) -> String {
    format!("BT /F1 12 Tf 72 700 Td ({}) Tj ET\n", s)
}

/// Draw a named XObject.
pub fn draw(name: &str) -> String {
    format!("q 10 0 0 10 72 600 cm /{} Do Q\n", name)
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// ASCIIHex encoding with the `>` terminator.
pub fn ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = data
        .iter()
        .flat_map(|b| format!("{:02X}", b).into_bytes())
        .collect();
    out.push(b'>');
    out
}

use crate::errors::DocumentError;
use crate::image_ops::image_types::PageEncoding;
use crate::utils::types::ConvertedDocument;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::io::Write;

pub const DEFAULT_DOCUMENT_FILENAME: &str = "converted.pdf";
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Resource name every page uses for its image
const PAGE_IMAGE_NAME: &[u8] = b"Im0";

/// Builds one multi-page PDF out of already resized images.
///
/// Every image becomes a page of exactly its own size (1 px = 1 pt), drawn
/// edge to edge, in the order the images are given.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    encoding: PageEncoding,
    jpeg_quality: u8,
    filename: Option<String>,
}

impl DocumentAssembler {
    pub fn new(encoding: PageEncoding, jpeg_quality: u8, filename: Option<String>) -> Self {
        DocumentAssembler {
            encoding,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            filename,
        }
    }

    pub fn encoding(&self) -> PageEncoding {
        self.encoding
    }

    pub fn assemble(&self, images: &[DynamicImage]) -> Result<ConvertedDocument, DocumentError> {
        if images.is_empty() {
            return Err(DocumentError::EmptyInput);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(images.len());
        for img in images {
            let page_id = self.add_page(&mut doc, pages_id, img)?;
            kids.push(Object::Reference(page_id));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(images.len() as i64),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data)?;

        Ok(ConvertedDocument::new(
            data,
            self.filename.clone(),
            images.len(),
        ))
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        img: &DynamicImage,
    ) -> Result<ObjectId, DocumentError> {
        let width = Object::Integer(img.width() as i64);
        let height = Object::Integer(img.height() as i64);

        let image_id = doc.add_object(self.image_stream(img)?);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.clone(),
                        Object::Integer(0),
                        Object::Integer(0),
                        height.clone(),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(PAGE_IMAGE_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.encode()?));

        let mut xobjects = lopdf::Dictionary::new();
        xobjects.set(PAGE_IMAGE_NAME.to_vec(), Object::Reference(image_id));

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), width, height],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => xobjects,
            },
        }))
    }

    /// Image XObject holding the page pixels in the configured encoding
    fn image_stream(&self, img: &DynamicImage) -> Result<Stream, DocumentError> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let data = match self.encoding {
            PageEncoding::Jpeg => {
                let mut jpeg_bytes = Vec::new();
                JpegEncoder::new_with_quality(&mut jpeg_bytes, self.jpeg_quality)
                    .encode_image(&rgb)?;
                jpeg_bytes
            }
            PageEncoding::Flate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(rgb.as_raw())?;
                encoder.finish()?
            }
        };

        let mut dict = lopdf::Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(width as i64));
        dict.set("Height", Object::Integer(height as i64));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set(
            "Filter",
            Object::Name(self.encoding.filter_name().as_bytes().to_vec()),
        );

        Ok(Stream::new(dict, data))
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        DocumentAssembler::new(PageEncoding::default(), DEFAULT_JPEG_QUALITY, None)
    }
}

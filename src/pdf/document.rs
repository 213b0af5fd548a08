//! Page-addressable wrapper around a `lopdf::Document`
//!
//! Every transform goes through [`PdfDocument`]: it resolves page-tree
//! inheritance, copies pages between documents by importing only the objects
//! a page actually references, and appends overlay content without touching
//! the original content streams.

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use lopdf::encryption::DecryptionError;
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    SaveOptions, Stream, StringFormat,
};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoadError, SerializeError, TransformError};
use crate::layout::{normalize_rotation, PageSize, Rect};
use crate::pdf::images::EmbeddedImage;
use crate::pdf::overlay::{self, TextDraw, FONT_RESOURCE};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains
const MAX_TREE_DEPTH: usize = 64;

/// How to open a document
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// User or owner password for encrypted documents
    pub password: Option<String>,
    /// Accept an encrypted document without decrypting it. Nothing but the
    /// encryption state can be inspected in that case.
    pub ignore_encryption: bool,
}

impl LoadOptions {
    pub fn with_password(password: impl Into<String>) -> Self {
        Self { password: Some(password.into()), ..Self::default() }
    }
}

/// How to write a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Pack objects into compressed object streams (PDF 1.5+)
    pub compact_object_streams: bool,
    /// Flate level (0-9) for object streams
    pub compression_level: u32,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { compact_object_streams: false, compression_level: 6 }
    }
}

/// Standard security handler settings
#[derive(Debug, Clone)]
pub struct EncryptOptions {
    pub user_password: String,
    pub owner_password: String,
    pub permissions: Permissions,
}

/// Document information dictionary fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    /// Raw PDF date string, e.g. `D:20240102030405Z`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_date: Option<String>,
}

impl DocumentInfo {
    fn fields(&self) -> [(&'static str, &Option<String>); 8] {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
            ("CreationDate", &self.creation_date),
            ("ModDate", &self.mod_date),
        ]
    }
}

/// Format a timestamp as a PDF date string
pub fn pdf_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// A page copied into a document but not yet placed in its page tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle(ObjectId);

/// An image XObject stored in a document by [`PdfDocument::add_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageRef(ObjectId);

/// An in-memory document owned by a single transformation call
#[derive(Debug, Clone)]
pub struct PdfDocument {
    doc: Document,
    /// Shared Helvetica font object, created on first text draw
    font_id: Option<ObjectId>,
    /// Pages whose original content is already bracketed by q/Q
    isolated: HashSet<ObjectId>,
    /// Page ids in page order; cleared whenever the page tree changes
    pages: OnceCell<Vec<ObjectId>>,
}

impl PdfDocument {
    /// An empty document with a catalog and an empty page tree
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");

        let pages_id = doc.new_object_id();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![]));
        pages.set("Count", Object::Integer(0));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Self::from_lopdf(doc)
    }

    /// Parse a document from bytes
    pub fn load(bytes: &[u8], options: &LoadOptions) -> Result<Self, LoadError> {
        let loaded = match options.password.as_deref() {
            Some(password) => Document::load_mem_with_password(bytes, password),
            None => Document::load_mem(bytes),
        };

        let doc = loaded.map_err(|e| match e {
            lopdf::Error::InvalidPassword
            | lopdf::Error::Decryption(DecryptionError::IncorrectPassword) => LoadError::PasswordRequired,
            other => LoadError::Corrupt(other.to_string()),
        })?;

        if doc.is_encrypted() {
            if !options.ignore_encryption {
                return Err(LoadError::PasswordRequired);
            }
        } else if doc.catalog().is_err() {
            return Err(LoadError::Corrupt("document has no catalog".to_string()));
        }

        let document = Self::from_lopdf(doc);
        debug!(
            pages = document.page_count(),
            version = %document.doc.version,
            encrypted = document.is_encrypted(),
            "loaded document"
        );
        Ok(document)
    }

    pub fn from_lopdf(doc: Document) -> Self {
        Self { doc, font_id: None, isolated: HashSet::new(), pages: OnceCell::new() }
    }

    /// The underlying codec document
    pub fn lopdf(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn lopdf_mut(&mut self) -> &mut Document {
        self.pages.take();
        &mut self.doc
    }

    /// Still encrypted, i.e. loaded with `ignore_encryption` or encrypted
    /// since loading
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Page object ids in page order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.cached_pages().to_vec()
    }

    pub fn page_count(&self) -> usize {
        self.cached_pages().len()
    }

    /// The page tree is walked once and reused until it changes
    fn cached_pages(&self) -> &[ObjectId] {
        self.pages.get_or_init(|| self.doc.page_iter().collect())
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, TransformError> {
        let pages = self.cached_pages();
        pages.get(index).copied().ok_or(TransformError::PageOutOfRange {
            index,
            page_count: pages.len(),
        })
    }

    /// Look up a page attribute, walking up `/Parent` links when the page
    /// itself does not define it. References are resolved.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return self.doc.dereference(value).ok().map(|(_, object)| object);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn inherited_rect(&self, page_id: ObjectId, key: &[u8]) -> Option<Rect> {
        self.inherited(page_id, key)
            .and_then(|object| object.as_array().ok())
            .and_then(|array| Rect::from_pdf_array(array))
    }

    /// Media box of a page; pages without one are treated as US Letter
    pub fn media_box(&self, index: usize) -> Result<Rect, TransformError> {
        let page_id = self.page_id(index)?;
        Ok(self
            .inherited_rect(page_id, b"MediaBox")
            .unwrap_or_else(|| Rect::from_size(PageSize::letter())))
    }

    /// Width and height of a page's media box, ignoring `/Rotate`
    pub fn page_size(&self, index: usize) -> Result<PageSize, TransformError> {
        Ok(self.media_box(index)?.size())
    }

    /// Effective crop box: the page's own or inherited one, else the media box
    pub fn crop_box(&self, index: usize) -> Result<Rect, TransformError> {
        let page_id = self.page_id(index)?;
        match self.inherited_rect(page_id, b"CropBox") {
            Some(rect) => Ok(rect),
            None => self.media_box(index),
        }
    }

    /// Set the crop box as given; the rectangle is not clamped to the media box
    pub fn set_crop_box(&mut self, index: usize, rect: Rect) -> Result<(), TransformError> {
        let page_id = self.page_id(index)?;
        self.doc.get_dictionary_mut(page_id)?.set("CropBox", rect.to_pdf_array());
        Ok(())
    }

    /// Page rotation in degrees, one of 0, 90, 180 or 270
    pub fn rotation(&self, index: usize) -> Result<i64, TransformError> {
        let page_id = self.page_id(index)?;
        Ok(self
            .inherited(page_id, b"Rotate")
            .and_then(|object| object.as_i64().ok())
            .and_then(normalize_rotation)
            .unwrap_or(0))
    }

    /// Set an absolute rotation; any multiple of 90 is accepted and normalized
    pub fn set_rotation(&mut self, index: usize, degrees: i64) -> Result<(), TransformError> {
        let normalized = normalize_rotation(degrees).ok_or(TransformError::InvalidRotation(degrees))?;
        let page_id = self.page_id(index)?;
        self.doc.get_dictionary_mut(page_id)?.set("Rotate", Object::Integer(normalized));
        Ok(())
    }

    /// Rotate relative to the current rotation
    pub fn rotate_by(&mut self, index: usize, delta: i64) -> Result<(), TransformError> {
        let delta = normalize_rotation(delta).ok_or(TransformError::InvalidRotation(delta))?;
        let current = self.rotation(index)?;
        self.set_rotation(index, current + delta)
    }

    /// Raw content of a page, all content streams concatenated and decoded
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>, TransformError> {
        let page_id = self.page_id(index)?;
        Ok(self.doc.get_page_content(page_id)?)
    }

    /// Import pages of `source` into this document
    ///
    /// Only objects reachable from the selected pages are copied. Inherited
    /// attributes are written onto the copies, `/Parent` is dropped, and
    /// references to source pages that are not part of the selection become
    /// `null`. A page selected twice yields two page objects sharing the same
    /// content streams and resources.
    ///
    /// The copies are not part of the page tree until passed to [`add_page`].
    ///
    /// [`add_page`]: PdfDocument::add_page
    pub fn copy_pages(
        &mut self,
        source: &PdfDocument,
        indices: &[usize],
    ) -> Result<Vec<PageHandle>, TransformError> {
        let source_pages = source.page_ids();
        let page_count = source_pages.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= page_count) {
            return Err(TransformError::PageOutOfRange { index, page_count });
        }

        let mut importer = Importer {
            source: &source.doc,
            target: &mut self.doc,
            source_pages: source_pages.iter().copied().collect(),
            page_map: HashMap::new(),
            id_map: HashMap::new(),
        };

        // Reserve targets up front so links between selected pages resolve
        for &index in indices {
            let source_id = source_pages[index];
            if !importer.page_map.contains_key(&source_id) {
                let target_id = importer.target.new_object_id();
                importer.page_map.insert(source_id, target_id);
            }
        }

        let mut placed = HashSet::new();
        let mut handles = Vec::with_capacity(indices.len());
        for &index in indices {
            let source_id = source_pages[index];
            let page = importer.import_dict(&source.flattened_page(source_id));
            let target_id = if placed.insert(source_id) {
                importer.page_map[&source_id]
            } else {
                importer.target.new_object_id()
            };
            importer.target.objects.insert(target_id, Object::Dictionary(page));
            handles.push(PageHandle(target_id));
        }

        debug!(
            pages = handles.len(),
            objects = importer.id_map.len(),
            "copied pages"
        );
        Ok(handles)
    }

    /// A copy of the page dictionary with inherited attributes made explicit
    fn flattened_page(&self, page_id: ObjectId) -> Dictionary {
        let mut page = self.doc.get_dictionary(page_id).cloned().unwrap_or_default();
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = self.inherited(page_id, key) {
                    page.set(key, value.clone());
                }
            }
        }
        if !page.has(b"MediaBox") {
            page.set("MediaBox", Rect::from_size(PageSize::letter()).to_pdf_array());
        }
        page.remove(b"Parent");
        page
    }

    fn pages_root(&self) -> Result<ObjectId, TransformError> {
        Ok(self.doc.catalog()?.get(b"Pages")?.as_reference()?)
    }

    /// Append a copied page to the end of the page tree
    pub fn add_page(&mut self, handle: PageHandle) -> Result<(), TransformError> {
        let root_id = self.pages_root()?;
        self.pages.take();
        self.doc
            .get_dictionary_mut(handle.0)?
            .set("Parent", Object::Reference(root_id));

        let root = self.doc.get_dictionary_mut(root_id)?;
        let mut kids = root.get(b"Kids").and_then(Object::as_array).cloned().unwrap_or_default();
        kids.push(Object::Reference(handle.0));
        let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        root.set("Kids", Object::Array(kids));
        root.set("Count", Object::Integer(count + 1));
        Ok(())
    }

    /// Append an empty page of the given size; returns its index
    pub fn add_blank_page(&mut self, size: PageSize) -> Result<usize, TransformError> {
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("MediaBox", Rect::from_size(size).to_pdf_array());
        page.set("Resources", Object::Dictionary(Dictionary::new()));
        let page_id = self.doc.add_object(page);

        self.add_page(PageHandle(page_id))?;
        Ok(self.page_count() - 1)
    }

    /// Remove a page from the page tree and drop its page object
    pub fn remove_page(&mut self, index: usize) -> Result<(), TransformError> {
        let page_id = self.page_id(index)?;
        let parent_id = self.doc.get_dictionary(page_id)?.get(b"Parent")?.as_reference()?;
        self.pages.take();

        let parent = self.doc.get_dictionary_mut(parent_id)?;
        let mut kids = parent.get(b"Kids").and_then(Object::as_array).cloned().unwrap_or_default();
        if let Some(position) = kids.iter().position(|kid| kid.as_reference().ok() == Some(page_id)) {
            kids.remove(position);
        }
        let still_listed = kids.iter().any(|kid| kid.as_reference().ok() == Some(page_id));
        parent.set("Kids", Object::Array(kids));

        // Every ancestor counts the removed leaf
        let mut node_id = Some(parent_id);
        for _ in 0..MAX_TREE_DEPTH {
            let Some(id) = node_id else { break };
            let node = self.doc.get_dictionary_mut(id)?;
            if let Ok(count) = node.get(b"Count").and_then(Object::as_i64) {
                node.set("Count", Object::Integer((count - 1).max(0)));
            }
            node_id = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        if !still_listed {
            self.doc.objects.remove(&page_id);
            self.isolated.remove(&page_id);
        }
        Ok(())
    }

    /// Draw a run of Helvetica text on top of a page
    pub fn draw_text(&mut self, index: usize, draw: &TextDraw) -> Result<(), TransformError> {
        let page_id = self.prepare_overlay(index)?;

        let font_id = match self.font_id {
            Some(id) => id,
            None => {
                let id = self.doc.add_object(overlay::helvetica_font());
                self.font_id = Some(id);
                id
            }
        };
        self.set_page_resource(page_id, b"Font", FONT_RESOURCE, Object::Reference(font_id))?;

        if draw.opacity < 1.0 {
            self.set_page_resource(
                page_id,
                b"ExtGState",
                &overlay::opacity_resource(draw.opacity),
                Object::Dictionary(overlay::opacity_state(draw.opacity)),
            )?;
        }

        self.append_overlay(page_id, overlay::text_content(draw))
    }

    /// Fill a rectangle on top of a page
    pub fn draw_rect(&mut self, index: usize, rect: Rect, gray: f32) -> Result<(), TransformError> {
        let page_id = self.prepare_overlay(index)?;
        self.append_overlay(page_id, overlay::rect_content(&rect, gray))
    }

    /// Store an image once so it can be painted on any number of pages
    pub fn add_image(&mut self, image: &EmbeddedImage) -> ImageRef {
        let mut stream = image.stream.clone();
        if let Some(mask) = &image.soft_mask {
            let mask_id = self.doc.add_object(mask.clone());
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        ImageRef(self.doc.add_object(stream))
    }

    /// Paint a stored image into a rectangle on top of a page
    pub fn draw_image(&mut self, index: usize, image: ImageRef, rect: Rect) -> Result<(), TransformError> {
        let page_id = self.prepare_overlay(index)?;
        let name = format!("PPIm{}", image.0 .0);
        self.set_page_resource(page_id, b"XObject", &name, Object::Reference(image.0))?;
        self.append_overlay(page_id, overlay::image_content(&name, &rect))
    }

    /// First overlay on a page brackets its original content with q/Q
    fn prepare_overlay(&mut self, index: usize) -> Result<ObjectId, TransformError> {
        let page_id = self.page_id(index)?;
        if self.isolated.insert(page_id) {
            let streams = self.doc.get_page_contents(page_id);
            if !streams.is_empty() {
                self.doc.get_dictionary_mut(page_id)?.set(
                    "Contents",
                    Object::Array(streams.into_iter().map(Object::Reference).collect()),
                );
            }
            overlay::isolate_existing_content(&mut self.doc, page_id)?;
        }
        Ok(page_id)
    }

    fn append_overlay(&mut self, page_id: ObjectId, content: String) -> Result<(), TransformError> {
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        overlay::append_content_to_page(&mut self.doc, page_id, content_id)
    }

    /// Register a named resource on the page itself
    ///
    /// The effective resources (possibly inherited or shared with other pages)
    /// are copied onto the page first, so other pages never see the addition.
    fn set_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &[u8],
        name: &str,
        value: Object,
    ) -> Result<(), TransformError> {
        let mut resources = self
            .inherited(page_id, b"Resources")
            .and_then(|object| object.as_dict().ok())
            .cloned()
            .unwrap_or_default();

        let mut entries = resources
            .get(category)
            .ok()
            .and_then(|object| self.doc.dereference(object).ok())
            .and_then(|(_, object)| object.as_dict().ok())
            .cloned()
            .unwrap_or_default();

        entries.set(name, value);
        resources.set(category, Object::Dictionary(entries));
        self.doc
            .get_dictionary_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    fn info_dict(&self) -> Option<&Dictionary> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        self.doc.dereference(info).ok()?.1.as_dict().ok()
    }

    /// Read the document information dictionary
    pub fn info(&self) -> DocumentInfo {
        let Some(dict) = self.info_dict() else {
            return DocumentInfo::default();
        };
        let field = |key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|object| lopdf::decode_text_string(object).ok())
        };

        DocumentInfo {
            title: field(b"Title"),
            author: field(b"Author"),
            subject: field(b"Subject"),
            keywords: field(b"Keywords"),
            creator: field(b"Creator"),
            producer: field(b"Producer"),
            creation_date: field(b"CreationDate"),
            mod_date: field(b"ModDate"),
        }
    }

    /// Write the given fields into the information dictionary
    ///
    /// `None` fields leave existing values alone; other entries are kept.
    pub fn set_info(&mut self, info: &DocumentInfo) {
        let mut dict = self.info_dict().cloned().unwrap_or_default();
        for (key, value) in info.fields() {
            if let Some(value) = value {
                dict.set(key, lopdf::text_string(value));
            }
        }

        match self.doc.trailer.get(b"Info").and_then(Object::as_reference) {
            Ok(info_id) => {
                self.doc.objects.insert(info_id, Object::Dictionary(dict));
            }
            Err(_) => {
                let info_id = self.doc.add_object(dict);
                self.doc.trailer.set("Info", Object::Reference(info_id));
            }
        }
    }

    /// Encrypt with the standard security handler (RC4, 128-bit key)
    ///
    /// Must be the last mutation before [`serialize`]: strings and streams are
    /// encrypted in place.
    ///
    /// [`serialize`]: PdfDocument::serialize
    pub fn encrypt(&mut self, options: &EncryptOptions) -> Result<(), TransformError> {
        if options.user_password.is_empty() && options.owner_password.is_empty() {
            return Err(TransformError::EmptyPassword);
        }
        self.ensure_file_id();

        let state = EncryptionState::try_from(EncryptionVersion::V2 {
            document: &self.doc,
            owner_password: &options.owner_password,
            user_password: &options.user_password,
            key_length: 128,
            permissions: options.permissions,
        })?;
        self.doc.encrypt(&state)?;

        debug!(permissions = options.permissions.bits(), "encrypted document");
        Ok(())
    }

    /// The key derivation needs a file identifier; generate one if missing
    fn ensure_file_id(&mut self) {
        if self.doc.trailer.get(b"ID").is_ok() {
            return;
        }

        let mut hasher = Md5::new();
        hasher.update(Utc::now().to_rfc3339().as_bytes());
        hasher.update((self.doc.objects.len() as u64).to_le_bytes());
        hasher.update((self.page_count() as u64).to_le_bytes());
        let id = hasher.finalize().to_vec();

        self.doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(id.clone(), StringFormat::Hexadecimal),
                Object::String(id, StringFormat::Hexadecimal),
            ]),
        );
    }

    /// Encode the document
    ///
    /// Object streams are never used for encrypted documents.
    pub fn serialize(&mut self, options: &SerializeOptions) -> Result<Vec<u8>, SerializeError> {
        let mut bytes = Vec::new();

        if options.compact_object_streams && !self.doc.is_encrypted() {
            if self.doc.version.as_str() < "1.5" {
                self.doc.version = "1.5".to_string();
            }
            let save_options = SaveOptions::builder()
                .use_object_streams(true)
                .use_xref_streams(true)
                .compression_level(options.compression_level.min(9))
                .build();
            self.doc.save_with_options(&mut bytes, save_options)?;
        } else {
            self.doc.save_to(&mut bytes)?;
        }

        debug!(bytes = bytes.len(), compact = options.compact_object_streams, "serialized document");
        Ok(bytes)
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies the object subgraph reachable from selected pages
struct Importer<'a> {
    source: &'a Document,
    target: &'a mut Document,
    source_pages: HashSet<ObjectId>,
    /// Selected source page -> its first copy
    page_map: HashMap<ObjectId, ObjectId>,
    /// Every other imported object
    id_map: HashMap<ObjectId, ObjectId>,
}

impl Importer<'_> {
    fn import(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.import_reference(*id),
            Object::Array(items) => Object::Array(items.iter().map(|item| self.import(item)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.import_dict(dict)),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.import_dict(&stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_dict(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.import(value));
        }
        copy
    }

    fn import_reference(&mut self, id: ObjectId) -> Object {
        if self.source_pages.contains(&id) {
            return self
                .page_map
                .get(&id)
                .map_or(Object::Null, |&target| Object::Reference(target));
        }
        if let Some(&mapped) = self.id_map.get(&id) {
            return Object::Reference(mapped);
        }

        let source = self.source;
        let Ok(object) = source.get_object(id) else {
            return Object::Null;
        };
        // Never drag in page-tree nodes or pages outside the selection
        let is_tree_node = object
            .as_dict()
            .map(|dict| dict.has_type(b"Page") || dict.has_type(b"Pages"))
            .unwrap_or(false);
        if is_tree_node {
            return Object::Null;
        }

        // Map before recursing so cycles terminate
        let target_id = self.target.new_object_id();
        self.id_map.insert(id, target_id);
        let copy = self.import(object);
        self.target.objects.insert(target_id, copy);
        Object::Reference(target_id)
    }
}

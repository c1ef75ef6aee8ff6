//! Merges the fragments of a report into one PDF.

use std::collections::HashMap;

use lopdf::{Document, Object, ObjectId, dictionary};

use crate::{
    Error,
    report::work_area::{Fragment, FragmentId},
};

/// Put `fragments` in document order.
///
/// # Errors
/// Returns [Error::AssemblyError] unless there is exactly one header, exactly
/// one footer, and no two fragments share an ID.
pub fn order_fragments(mut fragments: Vec<Fragment>) -> Result<Vec<Fragment>, Error> {
    fragments.sort_by_key(Fragment::id);

    if fragments.first().map(Fragment::id) != Some(FragmentId::Header) {
        return Err(Error::AssemblyError("the report has no header".to_owned()));
    }

    if fragments.last().map(Fragment::id) != Some(FragmentId::Footer) {
        return Err(Error::AssemblyError("the report has no footer".to_owned()));
    }

    if let Some(pair) = fragments.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
        return Err(Error::AssemblyError(format!(
            "fragment {:?} was rendered more than once",
            pair[0].id()
        )));
    }

    Ok(fragments)
}

/// Merge `fragments` into one PDF, in document order.
///
/// The fragments are consumed, which deletes their files, whether or not
/// the merge succeeds.
///
/// # Errors
/// Returns [Error::AssemblyError] if the fragments are not a complete report
/// or one of them is not a valid PDF, or [Error::WorkAreaError] if a fragment
/// cannot be read.
pub fn assemble(fragments: Vec<Fragment>) -> Result<Vec<u8>, Error> {
    let fragments = order_fragments(fragments)?;
    let mut report = ReportDocument::new();

    for fragment in &fragments {
        let bytes = fragment.read()?;
        let source = Document::load_mem(&bytes).map_err(|error| {
            Error::AssemblyError(format!(
                "fragment {:?} is not a valid PDF: {error}",
                fragment.id()
            ))
        })?;

        report
            .append(&source)
            .map_err(|error| Error::AssemblyError(error.to_string()))?;
    }

    tracing::debug!(
        "merged {} fragments into {} pages",
        fragments.len(),
        report.kids.len()
    );

    report.finish()
}

/// A PDF that pages are appended to.
struct ReportDocument {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl ReportDocument {
    fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Copy every page of `source`, and everything the pages refer to, onto
    /// the end of the document.
    fn append(&mut self, source: &Document) -> Result<(), lopdf::Error> {
        let mut copier = ObjectCopier::new(source, &mut self.document);

        // `get_pages` is keyed by page number, so this is page order.
        for page_id in source.get_pages().into_values() {
            // Point the copied page at this document's page tree instead of
            // copying the source's.
            if let Ok(parent_id) = source
                .get_dictionary(page_id)
                .and_then(|page| page.get(b"Parent"))
                .and_then(Object::as_reference)
            {
                copier.id_map.insert(parent_id, self.pages_id);
            }

            let new_page_id = copier.copy_object(page_id)?;
            self.kids.push(Object::Reference(new_page_id));
        }

        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, Error> {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }
            .into(),
        );

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|error| Error::AssemblyError(error.to_string()))?;

        Ok(bytes)
    }
}

/// Deep copies objects from one document into another, giving each copied
/// object a new ID.
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    /// Copy the object `source_id` and everything it refers to, returning the
    /// ID of the copy. Objects are copied at most once.
    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the ID before recursing so that reference cycles terminate.
        let target_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, target_id);

        let object = self.source.get_object(source_id)?.clone();
        let object = self.remap_references(object)?;

        self.target.objects.insert(target_id, object);

        Ok(target_id)
    }

    fn remap_references(&mut self, object: Object) -> Result<Object, lopdf::Error> {
        match object {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => items
                .into_iter()
                .map(|item| self.remap_references(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Object::Array),
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            object => Ok(object),
        }
    }
}

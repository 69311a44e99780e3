use lopdf::{Document, Object, ObjectId, decode_text_string, dictionary, text_string};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, TimesheetError};

pub use crate::models::timesheet::FieldMap;

/// A fillable PDF read once and re-parsed for every document written from it.
#[derive(Clone, Debug)]
pub struct FormTemplate {
    path: PathBuf,
    bytes: Vec<u8>,
}

/// What happened to a field map while filling the form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Widgets that received a value
    pub filled: usize,
    /// Map keys with no field of that name in the template
    pub unmatched: Vec<String>,
}

/// A form field widget and the dictionary its value lives in.
struct FieldWidget {
    name: String,
    widget: ObjectId,
    holder: ObjectId,
}

impl FormTemplate {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).map_err(|e| TimesheetError::TemplateRead(path.to_path_buf(), e))?;

        let template = Self::from_bytes(path, bytes)?;
        info!(
            "Loaded template {} ({} bytes)",
            template.path.display(),
            template.bytes.len()
        );
        Ok(template)
    }

    /// Wrap template bytes, checking that they parse as a PDF.
    pub fn from_bytes<P: AsRef<Path>>(path: P, bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes)?;
        info!("Template has {} page(s)", doc.get_pages().len());

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill a fresh copy of the template with `fields`.
    pub fn fill(&self, fields: &FieldMap) -> Result<(Document, RenderStats)> {
        let mut doc = Document::load_mem(&self.bytes)?;
        let stats = fill_form(&mut doc, fields)?;
        Ok((doc, stats))
    }

    pub fn render_to_bytes(&self, fields: &FieldMap) -> Result<(Vec<u8>, RenderStats)> {
        let (mut doc, stats) = self.fill(fields)?;
        let mut output_buffer: Vec<u8> = Vec::new();
        doc.save_to(&mut output_buffer)?;

        debug!("Rendered PDF to {} bytes", output_buffer.len());
        Ok((output_buffer, stats))
    }

    pub fn render_to_file<P: AsRef<Path>>(
        &self,
        fields: &FieldMap,
        output: P,
    ) -> Result<RenderStats> {
        let output = output.as_ref();
        let (mut doc, stats) = self.fill(fields)?;

        let mut writer = BufWriter::new(File::create(output)?);
        doc.save_to(&mut writer)?;
        writer.flush()?;

        info!(
            "Wrote {} from {} ({} field(s) filled)",
            output.display(),
            self.path().display(),
            stats.filled
        );
        Ok(stats)
    }
}

/// Set every form field named in `fields`, leaving all other fields untouched.
///
/// Values are written to `/V` and cached appearances are dropped so the
/// fields stay editable; `NeedAppearances` makes viewers draw the new values.
pub fn fill_form(doc: &mut Document, fields: &FieldMap) -> Result<RenderStats> {
    set_need_appearances(doc)?;

    let widgets = field_widgets(doc);
    debug!("Found {} named form widget(s)", widgets.len());

    let mut stats = RenderStats::default();
    let mut matched = BTreeSet::new();

    for widget in &widgets {
        let Some(value) = fields.get(&widget.name) else {
            continue;
        };

        doc.get_dictionary_mut(widget.holder)?
            .set("V", text_string(value));
        doc.get_dictionary_mut(widget.widget)?.remove(b"AP");

        matched.insert(widget.name.as_str());
        stats.filled += 1;
    }

    stats.unmatched = fields
        .keys()
        .filter(|key| !matched.contains(key.as_str()))
        .cloned()
        .collect();

    if !stats.unmatched.is_empty() {
        debug!(
            "{} field(s) not present in the template: {:?}",
            stats.unmatched.len(),
            stats.unmatched
        );
    }

    Ok(stats)
}

/// Current `/V` of every named field, for checking a rendered document.
pub fn read_field_values(doc: &Document) -> FieldMap {
    let mut values = FieldMap::new();

    for widget in field_widgets(doc) {
        let Ok(holder) = doc.get_dictionary(widget.holder) else {
            continue;
        };

        let value = match holder.get(b"V") {
            Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            Ok(value) => match decode_text_string(value) {
                Ok(text) => text,
                Err(_) => continue,
            },
            Err(_) => continue,
        };

        values.insert(widget.name, value);
    }

    values
}

fn set_need_appearances(doc: &mut Document) -> Result<()> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let acroform = doc.get_dictionary(root_id)?.get(b"AcroForm").ok().cloned();

    match acroform {
        Some(Object::Reference(acroform_id)) => {
            doc.get_dictionary_mut(acroform_id)?.set("NeedAppearances", true);
        }
        Some(Object::Dictionary(_)) => {
            doc.get_dictionary_mut(root_id)?
                .get_mut(b"AcroForm")?
                .as_dict_mut()?
                .set("NeedAppearances", true);
        }
        _ => {
            info!("Template has no AcroForm, adding one");
            doc.get_dictionary_mut(root_id)?.set(
                "AcroForm",
                dictionary! {
                    "Fields" => Vec::<Object>::new(),
                    "NeedAppearances" => true,
                },
            );
        }
    }

    Ok(())
}

/// Widget annotations of all pages that carry a field name, either on the
/// widget itself or on its parent field.
fn field_widgets(doc: &Document) -> Vec<FieldWidget> {
    let mut widgets = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        let Ok((_, Object::Array(annots))) = doc.dereference(annots) else {
            continue;
        };

        for annot in annots {
            let Ok(widget_id) = annot.as_reference() else {
                debug!("Skipping inline annotation on page {}", page_number);
                continue;
            };

            if let Some((name, holder)) = field_name(doc, widget_id) {
                widgets.push(FieldWidget {
                    name,
                    widget: widget_id,
                    holder,
                });
            }
        }
    }

    widgets
}

fn field_name(doc: &Document, widget_id: ObjectId) -> Option<(String, ObjectId)> {
    let widget = doc.get_dictionary(widget_id).ok()?;

    if let Ok(name) = widget.get(b"T") {
        return Some((decode_text_string(name).ok()?, widget_id));
    }

    let parent_id = widget.get(b"Parent").ok()?.as_reference().ok()?;
    let name = doc.get_dictionary(parent_id).ok()?.get(b"T").ok()?;
    Some((decode_text_string(name).ok()?, parent_id))
}

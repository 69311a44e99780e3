//! Integration tests for the form renderer and the batch service
//!
//! These build fillable PDFs in memory and check what ends up in the
//! written documents.

use chrono::NaiveDate;
use lopdf::{Document, Object, ObjectId, StringFormat, dictionary};
use pretty_assertions::assert_eq;

use adjunct_timesheets::{
    FieldMap, FormTemplate, HolidayCalendar, PayPeriod, Payroll, RecordOutcome, TimesheetConfig,
    TimesheetRecord, TimesheetService,
    config::FormConfig,
    helpers::pdf::{fill_form, read_field_values},
    models::payroll::{Employee, InvalidCell, PayPeriodRow},
    service::SkipReason,
};

fn text_widget(doc: &mut Document, page_id: ObjectId, name: &[u8], y: i64) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::String(name.to_vec(), StringFormat::Literal),
        "Rect" => vec![50.into(), y.into(), 250.into(), (y + 14).into()],
        "P" => page_id,
        "AP" => dictionary! { "N" => dictionary! {} },
    })
}

/// Create a one-page PDF whose widgets are named `field_names`.
///
/// With `with_acroform` unset the catalog has no AcroForm entry, like a
/// template whose form dictionary was stripped.
fn create_form_pdf(field_names: &[&str], with_acroform: bool) -> Vec<u8> {
    let raw_names: Vec<&[u8]> = field_names.iter().map(|name| name.as_bytes()).collect();
    create_form_pdf_raw(&raw_names, with_acroform)
}

/// Same as [`create_form_pdf`], with field names given as raw string bytes.
fn create_form_pdf_raw(field_names: &[&[u8]], with_acroform: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! {},
    });

    let widget_ids: Vec<Object> = field_names
        .iter()
        .enumerate()
        .map(|(i, name)| text_widget(&mut doc, page_id, name, 700 - 16 * i as i64).into())
        .collect();

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .unwrap();
    page.set("Annots", widget_ids.clone());

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if with_acroform {
        let acroform_id = doc.add_object(dictionary! { "Fields" => widget_ids });
        catalog.set("AcroForm", acroform_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn need_appearances(doc: &Document) -> Option<bool> {
    let root_id = doc.trailer.get(b"Root").ok()?.as_reference().ok()?;
    let acroform = doc.get_dictionary(root_id).ok()?.get(b"AcroForm").ok()?;
    let (_, acroform) = doc.dereference(acroform).ok()?;
    acroform
        .as_dict()
        .ok()?
        .get(b"NeedAppearances")
        .ok()?
        .as_bool()
        .ok()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_record() -> TimesheetRecord {
    TimesheetRecord::assemble(
        "Grace Hopper",
        PayPeriod {
            pay_date: date(2024, 1, 19),
            week1_start: date(2024, 1, 1),
            week2_start: date(2024, 1, 8),
        },
        41.0,
        &HolidayCalendar::us_federal(2024),
        &FormConfig::default(),
    )
    .unwrap()
}

const TEMPLATE_FIELDS: &[&str] = &[
    "Name",
    "Pay Date",
    "DateMonday",
    "Hours WorkedMonday",
    "AM InMonday",
    "PM OutMonday",
    "OutMonday",
    "InMonday",
    "Hours WorkedTotal for the Week_2",
    "Hours WorkedTotal for the Period",
    "Department",
];

#[test]
fn test_fill_and_read_back() {
    let fields = sample_record().to_field_map();
    let template =
        FormTemplate::from_bytes("time-sheets.pdf", create_form_pdf(TEMPLATE_FIELDS, true))
            .unwrap();
    assert_eq!(template.path(), std::path::Path::new("time-sheets.pdf"));

    let (bytes, stats) = template.render_to_bytes(&fields).unwrap();
    assert_eq!(stats.filled, TEMPLATE_FIELDS.len() - 1);
    assert_eq!(stats.unmatched.len(), fields.len() - stats.filled);
    assert!(stats.unmatched.contains(&"DateSunday_2".to_string()));

    let doc = Document::load_mem(&bytes).unwrap();
    let values = read_field_values(&doc);

    for (name, value) in &values {
        assert_eq!(Some(value), fields.get(name), "field {name}");
    }
    assert_eq!(values.len(), TEMPLATE_FIELDS.len() - 1);
    assert_eq!(values["Name"], "Grace Hopper");
    assert_eq!(values["OutMonday"], "01:00 PM");
    assert_eq!(values["Hours WorkedTotal for the Period"], "41");

    // The template-only field keeps no value
    assert!(!values.contains_key("Department"));
    assert_eq!(need_appearances(&doc), Some(true));
}

#[test]
fn test_filled_widgets_lose_cached_appearance() {
    let mut doc = Document::load_mem(&create_form_pdf(&["Name", "Title"], true)).unwrap();

    let mut fields = FieldMap::new();
    fields.insert("Name".to_string(), "Grace Hopper".to_string());

    let stats = fill_form(&mut doc, &fields).unwrap();
    assert_eq!(stats.filled, 1);
    assert!(stats.unmatched.is_empty());

    let appearance_of = |name: &str| {
        doc.objects.values().find_map(|object| {
            let dict = object.as_dict().ok()?;
            match dict.get(b"T") {
                Ok(Object::String(t, _)) if t == name.as_bytes() => Some(dict.has(b"AP")),
                _ => None,
            }
        })
    };

    assert_eq!(appearance_of("Name"), Some(false));
    assert_eq!(appearance_of("Title"), Some(true));
}

#[test]
fn test_acroform_is_added_when_missing() {
    let template =
        FormTemplate::from_bytes("bare.pdf", create_form_pdf(&["Name"], false)).unwrap();

    let mut fields = FieldMap::new();
    fields.insert("Name".to_string(), "Zoë Ångström".to_string());

    let (doc, stats) = template.fill(&fields).unwrap();
    assert_eq!(stats.filled, 1);
    assert_eq!(need_appearances(&doc), Some(true));
    assert_eq!(read_field_values(&doc)["Name"], "Zoë Ångström");
}

#[test]
fn test_single_byte_field_names_match() {
    // "Café" and "Año" in PDFDocEncoding, as written by older form editors
    let template = FormTemplate::from_bytes(
        "latin1.pdf",
        create_form_pdf_raw(&[&b"Caf\xe9"[..], &b"A\xf1o"[..]], true),
    )
    .unwrap();

    let mut fields = FieldMap::new();
    fields.insert("Café".to_string(), "Espresso".to_string());
    fields.insert("Año".to_string(), "2024".to_string());

    let (doc, stats) = template.fill(&fields).unwrap();
    assert_eq!(stats.filled, 2);
    assert!(stats.unmatched.is_empty());

    let values = read_field_values(&doc);
    assert_eq!(values["Café"], "Espresso");
    assert_eq!(values["Año"], "2024");
}

#[test]
fn test_template_is_reused_across_records() {
    let template =
        FormTemplate::from_bytes("time-sheets.pdf", create_form_pdf(&["Name"], true)).unwrap();

    for name in ["First", "Second"] {
        let mut fields = FieldMap::new();
        fields.insert("Name".to_string(), name.to_string());
        let (doc, _) = template.fill(&fields).unwrap();
        assert_eq!(read_field_values(&doc)["Name"], name);
    }
}

#[test]
fn test_invalid_template_is_rejected() {
    assert!(FormTemplate::from_bytes("broken.pdf", b"not a pdf".to_vec()).is_err());
}

#[test]
fn test_process_payroll() {
    let output = tempfile::tempdir().unwrap();

    let mut config = TimesheetConfig::default();
    config.paths.output_dir = output.path().join("timesheets");

    let template =
        FormTemplate::from_bytes("time-sheets.pdf", create_form_pdf(TEMPLATE_FIELDS, true))
            .unwrap();
    let service = TimesheetService::new(config, HolidayCalendar::us_federal(2024), template);

    let payroll = Payroll {
        employees: vec![
            Employee {
                name: "Grace Hopper".to_string(),
                column: 4,
            },
            Employee {
                name: "Edsger Dijkstra".to_string(),
                column: 5,
            },
        ],
        rows: vec![
            PayPeriodRow {
                row: 6,
                period: Ok(PayPeriod {
                    pay_date: date(2024, 1, 19),
                    week1_start: date(2024, 1, 1),
                    week2_start: date(2024, 1, 8),
                }),
                hours: vec![Some(80.0), Some(0.0)],
            },
            PayPeriodRow {
                row: 7,
                period: Ok(PayPeriod {
                    pay_date: date(2024, 2, 2),
                    week1_start: date(2024, 1, 22),
                    week2_start: date(2024, 1, 29),
                }),
                hours: vec![None, Some(12.0)],
            },
            PayPeriodRow {
                row: 8,
                period: Err(InvalidCell {
                    row: 8,
                    column: 2,
                    value: "TBD".to_string(),
                }),
                hours: vec![Some(10.0), None],
            },
        ],
    };

    let report = service.process_payroll(&payroll).unwrap();

    assert_eq!(report.records.len(), 6);
    assert_eq!(report.rendered(), 1);
    assert_eq!(report.truncated(), 1);
    assert_eq!(report.skipped(), 3);
    assert_eq!(report.failed(), 1);

    match &report.records[0].outcome {
        RecordOutcome::Truncated {
            path,
            dropped_hours,
            ..
        } => {
            assert_eq!(*dropped_hours, 8.0);
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                "2024-01-19_Grace Hopper_timesheet_2024-01-19.pdf"
            );
            assert!(path.exists());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(matches!(
        report.records[1].outcome,
        RecordOutcome::Skipped(SkipReason::MissingHours)
    ));
    assert!(matches!(report.records[2].outcome, RecordOutcome::Failed(_)));
    assert!(matches!(
        report.records[3].outcome,
        RecordOutcome::Skipped(SkipReason::NoHours(_))
    ));

    let rendered = output
        .path()
        .join("timesheets")
        .join("2024-02-02_Edsger Dijkstra_timesheet_2024-02-02.pdf");
    match &report.records[4].outcome {
        RecordOutcome::Rendered { path, .. } => assert_eq!(path, &rendered),
        other => panic!("unexpected outcome {other:?}"),
    }

    let doc = Document::load(&rendered).unwrap();
    let values = read_field_values(&doc);
    assert_eq!(values["Name"], "Edsger Dijkstra");
    assert_eq!(values["Hours WorkedTotal for the Period"], "12");
    assert_eq!(values["DateMonday"], "2024-01-23");

    // Dijkstra has no hours in the row with the broken date
    assert!(matches!(
        report.records[5].outcome,
        RecordOutcome::Skipped(SkipReason::MissingHours)
    ));

    let written = std::fs::read_dir(output.path().join("timesheets"))
        .unwrap()
        .count();
    assert_eq!(written, 2);
}

mod common;

use std::convert::Infallible;

use car_editor_shared::{CarField, Event, ImageFile, Model};
use common::*;
use serde_json::{json, Value};

const PNG: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

#[derive(Debug)]
struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn parse_parts(content_type: &str, body: Vec<u8>) -> Vec<Part> {
    let boundary = multer::parse_boundary(content_type).expect("boundary in content type");
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("well-formed multipart") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field.bytes().await.expect("part body").to_vec();
        parts.push(Part {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    parts
}

/// Loads car 42, fills the status, applies `edits`, optionally selects an
/// image and submits. Returns the `Content-Type` header and body of the single `PUT`.
fn submit_edited(edits: &[(CarField, &str)], image: Option<ImageFile>) -> (String, Vec<u8>) {
    let app = Tester::default();
    let mut model = Model::default();
    open_loaded(&app, &mut model, &car_json());

    let status = [(CarField::Status, "Approved")];
    for (field, value) in status.iter().chain(edits) {
        app.update(
            Event::UpdateField {
                field: *field,
                value: (*value).into(),
            },
            &mut model,
        );
    }
    if let Some(image) = image {
        app.update(Event::SelectImage(image), &mut model);
    }

    let update = app.update(Event::Submit, &mut model);
    let requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);

    let request = &requests[0].operation;
    assert_eq!(request.method, "PUT");
    let content_type = header(request, "content-type")
        .expect("content type header")
        .to_string();
    (content_type, request.body.clone())
}

fn submit(image: Option<ImageFile>) -> (String, Vec<u8>) {
    submit_edited(&[], image)
}

#[tokio::test]
async fn dto_part_nulls_image_and_keeps_record_fields() {
    let (content_type, body) = submit(None);
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let parts = parse_parts(&content_type, body).await;
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "carDto");
    assert!(parts[0].file_name.is_none());

    let dto: Value = serde_json::from_slice(&parts[0].bytes).expect("carDto is JSON");
    assert_eq!(dto["image"], Value::Null);
    assert_eq!(dto["id"], json!(42));
    assert_eq!(dto["brand"], json!("Toyota"));
    assert_eq!(dto["year"], json!(2020));
    assert_eq!(dto["rentalRate"], json!(49.5));
    assert_eq!(dto["branchId"], json!("B1"));
    assert_eq!(dto["status"], json!("Approved"));
}

#[tokio::test]
async fn dto_part_carries_edited_values() {
    let edits = [
        (CarField::Brand, "Corolla Cross"),
        (CarField::RentalRate, "55.5"),
        (CarField::BranchId, "B2"),
    ];
    let (content_type, body) = submit_edited(&edits, None);

    let parts = parse_parts(&content_type, body).await;
    let dto: Value = serde_json::from_slice(&parts[0].bytes).expect("carDto is JSON");
    assert_eq!(dto["brand"], json!("Corolla Cross"));
    assert_eq!(dto["rentalRate"], json!(55.5));
    assert_eq!(dto["branchId"], json!("B2"));
    assert_eq!(dto["model"], json!("Corolla"));
    assert_eq!(dto["id"], json!(42));
}

#[tokio::test]
async fn image_part_is_sent_before_dto() {
    let image = ImageFile::new("corolla.png", PNG.to_vec());
    let (content_type, body) = submit(Some(image));

    let parts = parse_parts(&content_type, body).await;
    let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["image", "carDto"]);

    let image = &parts[0];
    assert_eq!(image.file_name.as_deref(), Some("corolla.png"));
    assert_eq!(image.content_type.as_deref(), Some("image/png"));
    assert_eq!(image.bytes, PNG);

    let dto: Value = serde_json::from_slice(&parts[1].bytes).expect("carDto is JSON");
    assert_eq!(dto["image"], Value::Null);
}

#[tokio::test]
async fn declared_content_type_is_kept() {
    let image = ImageFile::new("scan.heic", vec![0, 1, 2, 3]).with_content_type("image/heic");
    let (content_type, body) = submit(Some(image));

    let parts = parse_parts(&content_type, body).await;
    assert_eq!(parts[0].content_type.as_deref(), Some("image/heic"));
    assert_eq!(parts[0].bytes, [0, 1, 2, 3]);
}

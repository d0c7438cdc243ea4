//! Tests for drawn-object bounds extraction: images map a unit square
//! through the CTM, forms map their declared BBox, stencil masks are
//! skipped, and boxes come back in encounter order.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tachar_core::geom::Rect;
use tachar_core::processor::collect_object_bounds;

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn image_stream(stencil: bool) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => 1,
        "Height" => 1,
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 8,
    };
    if stencil {
        dict.set("ImageMask", true);
    }
    Stream::new(dict, vec![0u8])
}

fn form_stream(bbox: [i64; 4], matrix: Option<[f32; 6]>, operations: Vec<Operation>) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => bbox.iter().map(|&n| n.into()).collect::<Vec<Object>>(),
    };
    if let Some(m) = matrix {
        dict.set(
            "Matrix",
            m.iter().map(|&n| n.into()).collect::<Vec<Object>>(),
        );
    }
    Stream::new(dict, Content { operations }.encode().unwrap())
}

/// One page whose resources hold the given XObjects.
fn doc_with_xobjects(
    operations: Vec<Operation>,
    xobjects: Vec<(&str, Stream)>,
) -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut xobject_dict = Dictionary::new();
    for (name, stream) in xobjects {
        let id = doc.add_object(stream);
        xobject_dict.set(name, id);
    }
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations }.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "XObject" => xobject_dict },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    (doc, page_id)
}

fn assert_rect(actual: &Rect, expected: (f64, f64, f64, f64)) {
    let eps = 1e-6;
    assert!(
        (actual.x - expected.0).abs() < eps
            && (actual.y - expected.1).abs() < eps
            && (actual.width - expected.2).abs() < eps
            && (actual.height - expected.3).abs() < eps,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn image_bounds_follow_the_ctm() {
    let operations = vec![
        op("q", vec![]),
        op(
            "cm",
            vec![50.into(), 0.into(), 0.into(), 20.into(), 10.into(), 10.into()],
        ),
        op("Do", vec![Object::Name(b"Im1".to_vec())]),
        op("Q", vec![]),
    ];
    let (doc, page_id) = doc_with_xobjects(operations, vec![("Im1", image_stream(false))]);

    let bounds = collect_object_bounds(&doc, page_id).unwrap();
    assert_eq!(bounds.len(), 1);
    assert_rect(&bounds[0], (10.0, 10.0, 50.0, 20.0));
}

#[test]
fn stencil_masks_are_skipped() {
    let operations = vec![
        op("Do", vec![Object::Name(b"Mask".to_vec())]),
        op("Do", vec![Object::Name(b"Im1".to_vec())]),
    ];
    let (doc, page_id) = doc_with_xobjects(
        operations,
        vec![("Mask", image_stream(true)), ("Im1", image_stream(false))],
    );

    let bounds = collect_object_bounds(&doc, page_id).unwrap();
    assert_eq!(bounds.len(), 1);
    assert_rect(&bounds[0], (0.0, 0.0, 1.0, 1.0));
}

#[test]
fn form_bounds_compose_form_matrix_and_ctm() {
    let operations = vec![
        op(
            "cm",
            vec![2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()],
        ),
        op("Do", vec![Object::Name(b"Fm1".to_vec())]),
    ];
    // BBox 0..10 square, form matrix translates by (5, 5); under the
    // page's doubling cm the box lands at (10, 10) sized 20x20.
    let form = form_stream(
        [0, 0, 10, 10],
        Some([1.0, 0.0, 0.0, 1.0, 5.0, 5.0]),
        vec![],
    );
    let (doc, page_id) = doc_with_xobjects(operations, vec![("Fm1", form)]);

    let bounds = collect_object_bounds(&doc, page_id).unwrap();
    assert_eq!(bounds.len(), 1);
    assert_rect(&bounds[0], (10.0, 10.0, 20.0, 20.0));
}

#[test]
fn nested_objects_are_reported_in_encounter_order() {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(image_stream(false));
    let inner = form_stream(
        [0, 0, 5, 5],
        None,
        vec![op("Do", vec![Object::Name(b"Im1".to_vec())])],
    );
    let inner_id = {
        let mut stream = inner;
        stream.dict.set(
            "Resources",
            dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
        );
        doc.add_object(stream)
    };

    let operations = vec![
        op("Do", vec![Object::Name(b"Fm1".to_vec())]),
        op("Do", vec![Object::Name(b"Im2".to_vec())]),
    ];
    let image2_id = doc.add_object(image_stream(false));
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations }.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Fm1" => inner_id, "Im2" => image2_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let bounds = collect_object_bounds(&doc, page_id).unwrap();
    // Form box first, then the image it draws, then the page's image.
    assert_eq!(bounds.len(), 3);
    assert_rect(&bounds[0], (0.0, 0.0, 5.0, 5.0));
    assert_rect(&bounds[1], (0.0, 0.0, 1.0, 1.0));
    assert_rect(&bounds[2], (0.0, 0.0, 1.0, 1.0));
}

#[test]
fn duplicate_invocations_are_not_merged() {
    let operations = vec![
        op("Do", vec![Object::Name(b"Im1".to_vec())]),
        op("Do", vec![Object::Name(b"Im1".to_vec())]),
    ];
    let (doc, page_id) = doc_with_xobjects(operations, vec![("Im1", image_stream(false))]);

    let bounds = collect_object_bounds(&doc, page_id).unwrap();
    assert_eq!(bounds.len(), 2);
    assert_eq!(bounds[0], bounds[1]);
}

//! Page fitting over decoded documents: uniform scale, centering, and
//! degenerate extents.

mod common;

use common::*;
use whiprust::{PageRegion, Shape, Vector2, W2dReader};

#[test]
fn fits_letter_page_with_uniform_scale() {
    // 1000 x 2000 drawing; letter avail is 540 x 720, so height governs.
    let doc = W2dReader::from_bytes(b"(Line 0,0 1000,2000)".to_vec())
        .read_fitted(&PageRegion::LETTER)
        .unwrap();

    let transform = doc.page_transform.unwrap();
    assert!((transform.scale - 720.0 / 2000.0).abs() < 1e-9);

    let bounds = doc.compute_bounds().unwrap();
    assert!((bounds.height() - 720.0).abs() < 1e-6);
    // Width scaled by the same factor; the min corner sits at the margin.
    assert!((bounds.width() - 1000.0 * 720.0 / 2000.0).abs() < 1e-6);
    assert!((bounds.min.x - 36.0).abs() < 1e-6);
    assert!((bounds.min.y - 36.0).abs() < 1e-6);
}

#[test]
fn fit_covers_every_primitive_not_just_the_first() {
    let mut stream = Vec::new();
    stream.extend(binary_line((0, 0), (100, 100)));
    stream.extend_from_slice(b"(Circle 500,500 50)");

    let doc = W2dReader::from_bytes(stream)
        .read_fitted(&PageRegion::A4)
        .unwrap();

    let bounds = doc.compute_bounds().unwrap();
    assert!(bounds.width() <= PageRegion::A4.avail_width() + 1e-9);
    assert!(bounds.height() <= PageRegion::A4.avail_height() + 1e-9);

    // The circle's radius scaled with the page transform.
    match &doc.primitives[1].shape {
        Shape::Circle { radius, .. } => {
            let scale = doc.page_transform.unwrap().scale;
            assert!((radius - 50.0 * scale).abs() < 1e-9);
        }
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn degenerate_horizontal_extent_centered() {
    // A vertical line: zero width. Only the height ratio applies and the
    // x axis is centered.
    let doc = W2dReader::from_bytes(b"(Line 100,0 100,1000)".to_vec())
        .read_fitted(&PageRegion::LETTER)
        .unwrap();

    let bounds = doc.compute_bounds().unwrap();
    assert!(bounds.width().abs() < 1e-9);
    assert!((bounds.height() - PageRegion::LETTER.avail_height()).abs() < 1e-6);
    assert!((bounds.center().x - 306.0).abs() < 1e-6);
}

#[test]
fn single_point_document_placed_at_center() {
    // Both extents degenerate: scale stays 1.0 and the point lands at the
    // page center.
    let doc = W2dReader::from_bytes(b"(Text 40,40 \"N\")".to_vec())
        .read_fitted(&PageRegion::LETTER)
        .unwrap();

    assert_eq!(doc.page_transform.unwrap().scale, 1.0);
    match &doc.primitives[0].shape {
        Shape::TextRun { position, .. } => {
            assert_eq!(*position, Vector2::new(306.0, 396.0));
        }
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn empty_document_fit_is_none() {
    let mut doc = W2dReader::from_bytes(Vec::new()).read().unwrap();
    assert!(doc.fit_to_page(&PageRegion::LETTER).is_none());
    assert!(doc.page_transform.is_none());
}

#[test]
fn small_drawing_scales_up() {
    let doc = W2dReader::from_bytes(b"(Line 0,0 10,10)".to_vec())
        .read_fitted(&PageRegion::LETTER)
        .unwrap();
    // 10x10 into 540x720: the width ratio 54 governs.
    assert!((doc.page_transform.unwrap().scale - 54.0).abs() < 1e-9);
}

//! End-to-end transforms through a real GPU device.
//!
//! Each test skips (with a note on stderr) when no adapter is available.

mod common;

use common::{assert_uniform, solid, try_engine, BLACK_WHITE};
use image::{Rgba, RgbaImage};
use palette_filter::blob::BLOB_SCHEME;
use palette_filter::{Error, ImageElement, SkipReason, TransformOutcome};

// ============================================================================
// Output shape
// ============================================================================

#[tokio::test]
async fn output_dimensions_match_input_for_all_palette_sizes() {
    let Some(mut engine) = try_engine() else { return };

    for colors in [1usize, 2, 3, 16, 255, 256] {
        let values: Vec<u8> = (0..colors * 3).map(|i| (i % 256) as u8).collect();
        let name = format!("p{}", colors);
        engine.add_palette(&name, &values).unwrap();

        // 65 wide forces a padded readback row; 1x1 is the smallest target.
        for (w, h) in [(1, 1), (7, 3), (65, 2)] {
            let mut el = ImageElement::new("in.png", solid(w, h, [128, 0, 0, 255]))
                .with_palette(name.as_str());
            let outcome = engine.transform(&mut el).await.unwrap();
            assert_eq!(
                outcome,
                TransformOutcome::Applied { src: el.src().to_string(), width: w, height: h }
            );
            assert_eq!((el.natural_width(), el.natural_height()), (w, h));
        }
    }
}

#[tokio::test]
async fn new_source_is_a_blob_holding_the_png() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    let mut el = ImageElement::new("in.png", solid(5, 4, [255, 0, 0, 255])).with_palette("bw");
    engine.transform(&mut el).await.unwrap();

    assert!(el.src().starts_with(BLOB_SCHEME), "unexpected src {}", el.src());
    let png = engine.blob(el.src()).expect("blob should be published");
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(&decoded, el.bitmap());

    assert!(engine.revoke_object_url(el.src()));
    assert!(engine.blob(el.src()).is_none());
}

#[tokio::test]
async fn image_at_the_device_limit_is_applied() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    let max = engine.max_image_dimension();
    let mut el = ImageElement::new("wide.png", solid(max, 1, [255, 0, 0, 255])).with_palette("bw");
    let outcome = engine.transform(&mut el).await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!((el.natural_width(), el.natural_height()), (max, 1));
}

#[tokio::test]
async fn oversized_image_is_an_error_and_the_engine_keeps_working() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    let too_wide = engine.max_image_dimension() + 1;
    let original = solid(too_wide, 1, [255, 0, 0, 255]);
    let mut el = ImageElement::new("wide.png", original.clone()).with_palette("bw");
    let err = engine.transform(&mut el).await.unwrap_err();
    assert!(matches!(err, Error::Render(_)), "unexpected error {}", err);
    assert_eq!(el.src(), "wide.png");
    assert_eq!(el.bitmap(), &original);

    let mut tall = ImageElement::new("tall.png", solid(1, too_wide, [0, 0, 0, 255])).with_palette("bw");
    assert!(matches!(engine.transform(&mut tall).await, Err(Error::Render(_))));

    let mut next = ImageElement::new("next.png", solid(3, 3, [255, 0, 0, 255])).with_palette("bw");
    assert!(engine.transform(&mut next).await.unwrap().is_applied());
    assert_uniform(next.bitmap(), [255, 255, 255, 255]);
}

// ============================================================================
// Palette lookup
// ============================================================================

#[tokio::test]
async fn red_channel_zero_maps_to_first_entry() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    let mut el = ImageElement::new("black.png", solid(8, 8, [0, 0, 0, 255])).with_palette("bw");
    engine.transform(&mut el).await.unwrap();
    assert_uniform(el.bitmap(), [0, 0, 0, 255]);
}

#[tokio::test]
async fn red_channel_full_maps_to_last_entry() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    let mut el = ImageElement::new("red.png", solid(8, 8, [255, 0, 0, 255])).with_palette("bw");
    engine.transform(&mut el).await.unwrap();
    assert_uniform(el.bitmap(), [255, 255, 255, 255]);
}

#[tokio::test]
async fn single_entry_palette_gives_uniform_color() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("one", &[10, 20, 30]).unwrap();

    let gradient = RgbaImage::from_fn(16, 16, |x, y| {
        Rgba([(x * 16 + y) as u8, (y * 16) as u8, x as u8, 255])
    });
    let mut el = ImageElement::new("gradient.png", gradient).with_palette("one");
    engine.transform(&mut el).await.unwrap();
    assert_uniform(el.bitmap(), [10, 20, 30, 255]);
}

#[tokio::test]
async fn only_red_channel_indexes_the_palette() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    // Red fixed at 0; green, blue and alpha vary wildly.
    let noisy = RgbaImage::from_fn(9, 9, |x, y| {
        Rgba([0, (x * 28) as u8, (y * 28) as u8, (255 - x * 20) as u8])
    });
    let mut el = ImageElement::new("noisy.png", noisy).with_palette("bw");
    engine.transform(&mut el).await.unwrap();
    assert_uniform(el.bitmap(), [0, 0, 0, 255]);
}

#[tokio::test]
async fn output_keeps_source_orientation() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();

    // Top half red 0, bottom half red 255.
    let split = RgbaImage::from_fn(4, 6, |_, y| {
        Rgba([if y < 3 { 0 } else { 255 }, 0, 0, 255])
    });
    let mut el = ImageElement::new("split.png", split).with_palette("bw");
    engine.transform(&mut el).await.unwrap();

    for (x, y, p) in el.bitmap().enumerate_pixels() {
        let expected = if y < 3 { [0, 0, 0, 255] } else { [255, 255, 255, 255] };
        assert_eq!(p.0, expected, "pixel ({}, {})", x, y);
    }
}

#[tokio::test]
async fn left_to_right_ramp_walks_the_palette() {
    let Some(mut engine) = try_engine() else { return };
    // Four distinct entries.
    engine
        .add_palette("four", &[255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 0])
        .unwrap();

    let ramp = RgbaImage::from_fn(4, 1, |x, _| Rgba([[0, 96, 160, 255][x as usize], 0, 0, 255]));
    let mut el = ImageElement::new("ramp.png", ramp).with_palette("four");
    engine.transform(&mut el).await.unwrap();

    let row: Vec<[u8; 4]> = el.bitmap().pixels().map(|p| p.0).collect();
    assert_eq!(
        row,
        vec![[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 0, 255]]
    );
}

// ============================================================================
// Registry behavior
// ============================================================================

#[tokio::test]
async fn reregistering_replaces_the_table() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("swap", &[200, 10, 10]).unwrap();
    engine.add_palette("swap", &[10, 200, 10]).unwrap();
    assert_eq!(engine.palette("swap").unwrap().colors(), &[[10, 200, 10]]);

    let mut el = ImageElement::new("in.png", solid(3, 3, [77, 0, 0, 255])).with_palette("swap");
    engine.transform(&mut el).await.unwrap();
    assert_uniform(el.bitmap(), [10, 200, 10, 255]);
}

#[tokio::test]
async fn unregistered_palette_leaves_element_untouched() {
    let Some(engine) = try_engine() else { return };

    let original = solid(2, 2, [1, 2, 3, 4]);
    let mut el = ImageElement::new("keep.png", original.clone()).with_palette("missing");
    let outcome = engine.transform(&mut el).await.unwrap();

    assert_eq!(
        outcome,
        TransformOutcome::Skipped(SkipReason::UnknownPalette("missing".into()))
    );
    assert_eq!(el.src(), "keep.png");
    assert_eq!(el.bitmap(), &original);
}

#[tokio::test]
async fn missing_annotation_is_skipped() {
    let Some(engine) = try_engine() else { return };

    let mut el = ImageElement::new("plain.png", solid(2, 2, [9, 9, 9, 255]));
    let outcome = engine.transform(&mut el).await.unwrap();
    assert_eq!(outcome, TransformOutcome::Skipped(SkipReason::NoAnnotation));
    assert_eq!(el.src(), "plain.png");
}

// ============================================================================
// Shared render surface
// ============================================================================

#[tokio::test]
async fn results_depend_only_on_palette_not_call_order() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();
    engine.add_palette("warm", &[40, 0, 0, 250, 180, 20]).unwrap();

    let source = RgbaImage::from_fn(6, 5, |x, _| Rgba([if x % 2 == 0 { 0 } else { 255 }, 0, 0, 255]));

    let run = |first: &'static str, second: &'static str| {
        let source = source.clone();
        let engine = &engine;
        async move {
            let mut a = ImageElement::new("a.png", source.clone()).with_palette(first);
            let mut b = ImageElement::new("b.png", source).with_palette(second);
            engine.transform(&mut a).await.unwrap();
            engine.transform(&mut b).await.unwrap();
            (a, b)
        }
    };

    let (bw_first, warm_second) = run("bw", "warm").await;
    let (warm_first, bw_second) = run("warm", "bw").await;

    assert_ne!(bw_first.bitmap(), warm_second.bitmap());
    assert_eq!(bw_first.bitmap(), bw_second.bitmap());
    assert_eq!(warm_first.bitmap(), warm_second.bitmap());
}

#[tokio::test]
async fn concurrent_transforms_do_not_share_results() {
    let Some(mut engine) = try_engine() else { return };
    engine.add_palette("bw", &BLACK_WHITE).unwrap();
    engine.add_palette("one", &[10, 20, 30]).unwrap();

    // Different sizes, so a surface resized under a pending readback would show.
    let mut small = ImageElement::new("small.png", solid(3, 2, [255, 0, 0, 255])).with_palette("bw");
    let mut large = ImageElement::new("large.png", solid(70, 9, [0, 0, 0, 255])).with_palette("one");

    let (r1, r2) = tokio::join!(engine.transform(&mut small), engine.transform(&mut large));
    assert!(r1.unwrap().is_applied());
    assert!(r2.unwrap().is_applied());

    assert_eq!((small.natural_width(), small.natural_height()), (3, 2));
    assert_eq!((large.natural_width(), large.natural_height()), (70, 9));
    assert_uniform(small.bitmap(), [255, 255, 255, 255]);
    assert_uniform(large.bitmap(), [10, 20, 30, 255]);
    assert_ne!(small.src(), large.src());
}

#[tokio::test]
async fn engines_are_independent() {
    let Some(mut first) = try_engine() else { return };
    let Some(second) = try_engine() else { return };
    first.add_palette("bw", &BLACK_WHITE).unwrap();

    assert!(first.has_palette("bw"));
    assert!(!second.has_palette("bw"));

    let mut el = ImageElement::new("in.png", solid(2, 2, [255, 0, 0, 255])).with_palette("bw");
    first.transform(&mut el).await.unwrap();
    assert!(first.blob(el.src()).is_some());
    assert!(second.blob(el.src()).is_none());
}

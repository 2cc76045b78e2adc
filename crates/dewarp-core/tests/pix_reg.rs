//! Pix regression test
//!
//! Exercises copy-on-write ownership, depth conversion, comparison and
//! guide-line rendering on synthetic images.

use dewarp_core::{Color, Error, Pix, PixelDepth, Point, Segment};
use dewarp_test::{RegParams, synth};

#[test]
fn pix_reg_ownership() {
    let mut rp = RegParams::new("pix_ownership");

    let pix = synth::gray_ramp(64, 8).expect("ramp");
    let shared = pix.clone();
    rp.compare_values(2.0, pix.ref_count() as f64, 0.0);

    // A shared image cannot be taken over; a mutable copy leaves it intact
    let pix = match pix.try_into_mut() {
        Ok(_) => {
            rp.check(false, "shared pix must not convert in place");
            return;
        }
        Err(pix) => pix,
    };
    let mut copy = pix.to_mut();
    copy.set_all(7);
    let copy: Pix = copy.into();
    rp.check(shared.get_pixel(63, 0) == Some(255), "original untouched");
    rp.check(copy.get_pixel(63, 0) == Some(7), "copy modified");

    drop(shared);
    rp.check(pix.try_into_mut().is_ok(), "sole owner converts in place");

    assert!(rp.cleanup(), "pix ownership regression test failed");
}

#[test]
fn pix_reg_convert_and_compare() {
    let mut rp = RegParams::new("pix_compare");

    let gray = synth::gray_ramp(32, 4).expect("ramp");
    let rgb = gray.convert_to_32();
    rp.check(rgb.depth() == PixelDepth::Bit32, "converted to 32 bpp");
    rp.compare_values(3.0, rgb.spp() as f64, 0.0);
    for x in [0u32, 13, 31] {
        let v = gray.get_pixel(x, 2).expect("gray") as u8;
        rp.check(rgb.get_rgb(x, 2) == Some((v, v, v)), "gray replicated");
    }

    let mut shifted = rgb.to_mut();
    shifted
        .set_rgb(5, 1, 250, 0, 0)
        .expect("set in bounds");
    let shifted: Pix = shifted.into();
    let diff = rgb.diff(&shifted, 10).expect("diff");
    rp.compare_values(1.0, diff.count_over as f64, 0.0);
    rp.check(!rgb.equals(&shifted), "one pixel differs");
    rp.check(rgb.equals(&rgb.deep_clone()), "deep clone is equal");

    rp.check(
        matches!(gray.diff(&rgb, 0), Err(Error::IncompatibleDepths(8, 32))),
        "depths must match",
    );
    let small = synth::gray_ramp(16, 4).expect("small ramp");
    rp.check(
        matches!(gray.diff(&small, 0), Err(Error::DimensionMismatch { .. })),
        "sizes must match",
    );

    assert!(rp.cleanup(), "pix compare regression test failed");
}

#[test]
fn pix_reg_render_lines() {
    let mut rp = RegParams::new("pix_render");

    let page = synth::ruled_page(120, 80, 10).expect("page");
    let mut pm = page.to_mut();

    // A guide line that runs off both sides is clipped, not rejected
    let steep = Segment::new(Point::new(-50.0, -20.0), Point::new(170.0, 90.0));
    pm.render_segment_color(&steep, 1, Color::BLUE).expect("steep");
    let flat = Segment::new(Point::new(0.0, 40.0), Point::new(120.0, 40.0));
    pm.render_segment_color(&flat, 3, Color::RED).expect("flat");
    let out: Pix = pm.into();

    rp.check(out.get_rgb(60, 40) == Some((255, 0, 0)), "flat line center");
    rp.check(out.get_rgb(60, 39) == Some((255, 0, 0)), "flat line above");
    rp.check(out.get_rgb(60, 41) == Some((255, 0, 0)), "flat line below");
    rp.check(out.get_rgb(60, 43) == page.get_rgb(60, 43), "outside the stroke");

    let outside = Segment::new(Point::new(-10.0, -10.0), Point::new(-1.0, -30.0));
    let mut pm = page.to_mut();
    pm.render_segment_color(&outside, 2, Color::GREEN)
        .expect("outside is a no-op");
    rp.compare_pix(&page, &pm.into());

    let mut pm = page.to_mut();
    let bad = Segment::new(Point::new(f64::NAN, 0.0), Point::new(1.0, 1.0));
    rp.check(
        pm.render_segment_color(&bad, 1, Color::RED).is_err(),
        "non-finite endpoints rejected",
    );

    assert!(rp.cleanup(), "pix render regression test failed");
}

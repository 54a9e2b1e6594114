//! Tests for bathymetry buckets and diverging color scales.

use map_common::Color;
use renderer::colorscale::ramp;
use renderer::{
    bathymetry_bucket, bathymetry_color, ColorScale, ContinuousScale, DivergingPalette,
    ResolvedScale, BATHYMETRY_BREAKS, BATHYMETRY_BUCKETS, BATHYMETRY_COLORS,
};

// ============================================================================
// Bathymetry buckets
// ============================================================================

#[test]
fn test_every_non_positive_value_has_exactly_one_bucket() {
    let mut value = 0.0f32;
    while value > -6000.0 {
        let bucket = bathymetry_bucket(value).expect("value <= 0 must have a bucket");
        let k = BATHYMETRY_BUCKETS - 1 - bucket;
        let (upper, lower) = (BATHYMETRY_BREAKS[k], BATHYMETRY_BREAKS[k + 1]);
        assert!(value <= upper && value > lower, "{} not in ({}, {}]", value, lower, upper);

        let containing = (0..BATHYMETRY_BUCKETS)
            .filter(|&k| value <= BATHYMETRY_BREAKS[k] && value > BATHYMETRY_BREAKS[k + 1])
            .count();
        assert_eq!(containing, 1);
        value -= 2.5;
    }
}

#[test]
fn test_breakpoints_belong_to_the_shallower_side_of_the_bucket_below() {
    for k in 1..BATHYMETRY_BUCKETS {
        let brk = BATHYMETRY_BREAKS[k];
        assert_eq!(bathymetry_bucket(brk), Some(BATHYMETRY_BUCKETS - 1 - k));
    }
}

#[test]
fn test_extreme_depths_use_the_deepest_bucket() {
    assert_eq!(bathymetry_bucket(-10_994.0), Some(0));
    assert_eq!(bathymetry_bucket(f32::NEG_INFINITY), Some(0));
    assert_eq!(bathymetry_color(-5000.0), Some(BATHYMETRY_COLORS[0]));
}

#[test]
fn test_land_is_left_to_the_caller() {
    let scale = ColorScale::Bathymetry { land: None }.resolve(None).unwrap();
    assert_eq!(scale.color(12.0), None);

    let tan = Color::rgb(210, 180, 140);
    let scale = ColorScale::Bathymetry { land: Some(tan) }.resolve(None).unwrap();
    assert_eq!(scale.color(12.0), Some(tan));
    assert_eq!(scale.color(f32::NAN), None);
    assert_eq!(scale.legend_entries()[0].label, "Land");
    assert_eq!(scale.legend_entries().len(), BATHYMETRY_BUCKETS + 1);
}

// ============================================================================
// Diverging palettes
// ============================================================================

#[test]
fn test_default_window_keeps_sixty_colors() {
    let scale = ContinuousScale::new(DivergingPalette::RdYlBu);
    let colors = scale.colors().unwrap();
    assert_eq!(colors.len(), 60);

    let mut classes = DivergingPalette::RdYlBu.classes();
    classes.reverse();
    let full = ramp(&classes, 100);
    assert_eq!(colors[0], full[30]);
    assert_eq!(colors[59], full[89]);
}

#[test]
fn test_scales_reversed_by_default() {
    assert!(ContinuousScale::default().reverse);
    assert!(ContinuousScale::new(DivergingPalette::BrBG).reverse);

    let scale: ColorScale = serde_yaml::from_str("kind: diverging\npalette: Spectral\n").unwrap();
    assert!(matches!(scale, ColorScale::Diverging(s) if s.reverse));
}

#[test]
fn test_reverse_flips_the_ramp() {
    let forward = ContinuousScale::new(DivergingPalette::BrBG)
        .reversed(false)
        .index_range(0, 99);
    let reversed = forward.clone().reversed(true);
    let a = forward.colors().unwrap();
    let mut b = reversed.colors().unwrap();
    b.reverse();
    assert_eq!(a, b);
}

#[test]
fn test_index_range_outside_steps_rejected() {
    let scale = ContinuousScale::new(DivergingPalette::Spectral).steps(50);
    assert!(scale.colors().is_err());
    let scale = ContinuousScale::new(DivergingPalette::Spectral).index_range(40, 20);
    assert!(scale.colors().is_err());
}

#[test]
fn test_linear_mapping_hits_both_ends() {
    let scale = ColorScale::Diverging(ContinuousScale::new(DivergingPalette::Spectral).limits(-5.0, 45.0))
        .resolve(Some((-100.0, 100.0)))
        .unwrap();
    let ResolvedScale::Linear { colors, min, max } = &scale else {
        panic!("expected a linear scale");
    };
    assert_eq!((*min, *max), (-5.0, 45.0));
    assert_eq!(scale.color(-5.0), Some(colors[0]));
    assert_eq!(scale.color(45.0), Some(*colors.last().unwrap()));
    assert_eq!(scale.color(-50.0), Some(colors[0]));
    assert_eq!(scale.color(f32::NAN), None);
}

#[test]
fn test_limits_default_to_data_range() {
    let scale = ColorScale::diverging(DivergingPalette::RdBu)
        .resolve(Some((2.0, 8.0)))
        .unwrap();
    assert!(matches!(scale, ResolvedScale::Linear { min, max, .. } if min == 2.0 && max == 8.0));
    assert_eq!(scale.legend_entries().len(), 5);
    assert_eq!(scale.legend_entries()[0].label, "8");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_scale_from_yaml() {
    let yaml = "kind: diverging\npalette: RdYlBu\nreverse: true\n";
    let scale: ColorScale = serde_yaml::from_str(yaml).unwrap();
    match scale {
        ColorScale::Diverging(s) => {
            assert_eq!(s.palette, DivergingPalette::RdYlBu);
            assert!(s.reverse);
            assert_eq!(s.steps, 100);
            assert_eq!(s.index_range, (30, 89));
        }
        other => panic!("unexpected scale {:?}", other),
    }

    let scale: ColorScale = serde_yaml::from_str("kind: bathymetry\nland: \"#D2B48C\"\n").unwrap();
    assert_eq!(scale, ColorScale::Bathymetry { land: Some(Color::rgb(210, 180, 140)) });
}

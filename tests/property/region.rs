//! Property-based tests for region geometry

use bamboo::types::Region;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_corners_normalize(
        ax in 0u32..5000,
        ay in 0u32..5000,
        bx in 0u32..5000,
        by in 0u32..5000
    ) {
        let region = Region::from_corners((ax, ay), (bx, by));
        prop_assert_eq!(region.width, ax.abs_diff(bx));
        prop_assert_eq!(region.height, ay.abs_diff(by));
        prop_assert_eq!(Region::from_corners(region.origin, region.opposite_corner()), region);
    }

    #[test]
    fn test_scaled_region_stays_in_frame(
        x in 0u32..400,
        y in 0u32..300,
        w in 1u32..200,
        h in 1u32..200,
        scale in 0.1f64..3.0,
    ) {
        let (width, height) = (400, 300);
        let scaled = Region::new((x, y), w, h).scale_from_center(scale, width, height);
        prop_assert!(scaled.fits_within(width, height));
    }
}

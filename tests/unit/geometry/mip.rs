use super::*;

#[test]
fn zoomed_in_never_decimates() {
    for zoom in [1.0, 1.5, 2.0, 8.0, 64.0] {
        assert_eq!(decimation_for_zoom(zoom).unwrap(), 1);
    }
}

#[test]
fn zoomed_out_picks_next_power_of_two() {
    assert_eq!(decimation_for_zoom(0.3).unwrap(), 4);
    assert_eq!(decimation_for_zoom(0.5).unwrap(), 2);
    assert_eq!(decimation_for_zoom(0.25).unwrap(), 4);
    assert_eq!(decimation_for_zoom(0.26).unwrap(), 4);
    assert_eq!(decimation_for_zoom(0.24).unwrap(), 8);
    assert_eq!(decimation_for_zoom(0.99).unwrap(), 2);
}

#[test]
fn invalid_zoom_is_rejected() {
    assert!(decimation_for_zoom(0.0).is_err());
    assert!(decimation_for_zoom(-1.0).is_err());
    assert!(decimation_for_zoom(f64::NAN).is_err());
    assert!(decimation_for_zoom(f64::INFINITY).is_err());
}

#[test]
fn tile_size_is_bounded() {
    assert_eq!(tile_size(8).unwrap(), 256);
    assert_eq!(tile_size(0).unwrap(), 1);
    assert!(tile_size(MAX_TILE_SIZE_POW2 + 1).is_err());
}

#[test]
fn tile_bounds_are_multiples_of_tile_size() {
    let rod = RectI::from_size(1920, 1080);
    let visible = RectI::new(37, 101, 1500, 999).unwrap();
    for (zoom, pow2) in [(1.0, 8), (0.3, 6), (0.5, 7), (2.0, 4)] {
        let sel = select_tile(rod, visible, zoom, pow2).unwrap().unwrap();
        let t = 1 << pow2;
        assert_eq!(sel.tile.x1 % t, 0);
        assert_eq!(sel.tile.y1 % t, 0);
        assert_eq!(sel.tile.x2 % t, 0);
        assert_eq!(sel.tile.y2 % t, 0);
    }
}

#[test]
fn texture_rect_is_clamped_to_rod() {
    let rod = RectI::from_size(1000, 600);
    let sel = select_tile(rod, rod, 1.0, 8).unwrap().unwrap();
    assert_eq!(sel.mip, 1);
    assert_eq!(sel.tile, RectI::new(0, 0, 1024, 768).unwrap());
    assert_eq!(sel.texture.rect(), rod);
    assert_eq!(sel.texture.width, 1000);
    assert_eq!(sel.texture.height, 600);
}

#[test]
fn decimated_texture_counts_destination_pixels() {
    let rod = RectI::from_size(1000, 600);
    let sel = select_tile(rod, rod, 0.3, 6).unwrap().unwrap();
    assert_eq!(sel.mip, 4);
    // 1000 / 4 = 250 decimated columns, rounded outward to 256.
    assert_eq!(sel.tile, RectI::new(0, 0, 256, 192).unwrap());
    assert_eq!(sel.texture.rect(), rod);
    assert_eq!(sel.texture.width, 250);
    assert_eq!(sel.texture.height, 150);
    assert!(sel.texture.width as i32 <= rod.width());
    assert!(sel.texture.height as i32 <= rod.height());
}

#[test]
fn odd_extent_rounds_destination_up() {
    let rod = RectI::from_size(10, 5);
    let sel = select_tile(rod, rod, 0.5, 2).unwrap().unwrap();
    assert_eq!(sel.mip, 2);
    assert_eq!(sel.texture.width, 5);
    assert_eq!(sel.texture.height, 3);
}

#[test]
fn negative_origin_rounds_outward() {
    let rod = RectI::new(-300, -300, 300, 300).unwrap();
    let sel = select_tile(rod, rod, 1.0, 8).unwrap().unwrap();
    assert_eq!(sel.tile, RectI::new(-512, -512, 512, 512).unwrap());
    assert_eq!(sel.texture.rect(), rod);
}

#[test]
fn empty_visible_region_is_degenerate() {
    let rod = RectI::from_size(100, 100);
    let visible = RectI::new(10, 10, 10, 50).unwrap();
    assert_eq!(select_tile(rod, visible, 1.0, 4).unwrap(), None);
}

#[test]
fn visible_region_outside_rod_is_degenerate() {
    let rod = RectI::from_size(100, 100);
    let visible = RectI::new(512, 512, 600, 600).unwrap();
    assert_eq!(select_tile(rod, visible, 1.0, 4).unwrap(), None);
}

#[test]
fn dst_index_rounds_up_to_next_sample() {
    let sel = select_tile(RectI::from_size(64, 64), RectI::from_size(64, 64), 0.25, 2)
        .unwrap()
        .unwrap();
    let t = sel.texture;
    assert_eq!(t.mip, 4);
    assert_eq!(t.dst_index_at_or_after(0, 0), 0);
    assert_eq!(t.dst_index_at_or_after(0, 1), 1);
    assert_eq!(t.dst_index_at_or_after(0, 4), 1);
    assert_eq!(t.dst_index_at_or_after(0, 5), 2);
}

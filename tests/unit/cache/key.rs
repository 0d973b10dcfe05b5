use super::*;
use crate::geometry::mip::select_tile;

fn base() -> CacheKey {
    let rod = RectI::from_size(640, 480);
    CacheKey {
        time: 12,
        graph_hash: 0xfeed,
        exposure: Exposure::from(1.0),
        color_space: ColorSpace::Srgb,
        bit_depth: BitDepth::Byte,
        channels: DisplayChannels::Rgba,
        view: 0,
        rod,
        display_window: RectI::from_size(1920, 1080),
        texture: select_tile(rod, rod, 1.0, 8).unwrap().unwrap().texture,
    }
}

fn variants() -> Vec<(&'static str, CacheKey)> {
    let b = base();
    let other_rod = RectI::from_size(640, 481);
    vec![
        ("time", CacheKey { time: 13, ..b }),
        ("graph_hash", CacheKey { graph_hash: 0xbeef, ..b }),
        ("exposure", CacheKey { exposure: Exposure::from(1.5), ..b }),
        ("color_space", CacheKey { color_space: ColorSpace::Rec709, ..b }),
        ("bit_depth", CacheKey { bit_depth: BitDepth::Float, ..b }),
        ("channels", CacheKey { channels: DisplayChannels::Luminance, ..b }),
        ("view", CacheKey { view: 1, ..b }),
        ("rod", CacheKey { rod: other_rod, ..b }),
        (
            "display_window",
            CacheKey {
                display_window: RectI::from_size(1280, 720),
                ..b
            },
        ),
        (
            "texture",
            CacheKey {
                texture: select_tile(b.rod, b.rod, 0.5, 8).unwrap().unwrap().texture,
                ..b
            },
        ),
    ]
}

#[test]
fn equal_parameters_give_equal_keys() {
    assert_eq!(base(), base());
    assert_eq!(base().fingerprint(), base().fingerprint());
}

#[test]
fn any_single_field_change_gives_a_distinct_key() {
    let b = base();
    for (field, k) in variants() {
        assert_ne!(k, b, "changing {field} must change the key");
        assert_ne!(
            k.fingerprint(),
            b.fingerprint(),
            "changing {field} must change the fingerprint"
        );
    }
}

#[test]
fn variants_are_pairwise_distinct() {
    let v = variants();
    for i in 0..v.len() {
        for j in i + 1..v.len() {
            assert_ne!(v[i].1.fingerprint(), v[j].1.fingerprint(), "{} vs {}", v[i].0, v[j].0);
        }
    }
}

#[test]
fn exposure_round_trips_its_value() {
    assert_eq!(Exposure::from(2.25).value(), 2.25);
}

#[test]
fn fingerprint_display_is_32_hex_digits() {
    let s = base().fingerprint().to_string();
    assert_eq!(s.len(), 32);
    assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
}

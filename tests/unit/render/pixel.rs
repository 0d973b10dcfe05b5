use super::*;
use crate::color::lut::{ColorSpace, U8XX_MAX};

fn params(channels: DisplayChannels, exposure: f32, lut: Option<&'static Lut>) -> PixelParams {
    PixelParams {
        exposure,
        channels: channels.map(),
        lut,
    }
}

fn row(pixels: &[[f32; 4]]) -> Vec<f32> {
    pixels.iter().flatten().copied().collect()
}

fn read_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn channel_modes_map_to_offsets() {
    assert_eq!(DisplayChannels::Rgba.map().offsets, [0, 1, 2]);
    assert_eq!(DisplayChannels::G.map().offsets, [1, 1, 1]);
    assert_eq!(DisplayChannels::A.map().offsets, [3, 3, 3]);
    let l = DisplayChannels::Luminance.map();
    assert!(l.luminance);
    assert_eq!(l.offsets, [0, 1, 2]);
}

#[test]
fn luminance_is_applied_after_exposure() {
    let p = params(DisplayChannels::Luminance, 2.0, None);
    let [r, g, b] = p.sample(&[1.0, 0.5, 0.25, 1.0]);
    let expected = 0.299 * 2.0 + 0.587 * 1.0 + 0.114 * 0.5;
    assert!((r - expected).abs() < 1e-6);
    assert_eq!(r, g);
    assert_eq!(g, b);
}

#[test]
fn single_channel_is_replicated() {
    let p = params(DisplayChannels::B, 1.0, None);
    assert_eq!(p.sample(&[0.1, 0.2, 0.3, 0.4]), [0.3, 0.3, 0.3]);
}

#[test]
fn bgra_packing_is_little_endian_bgra() {
    let word = to_bgra(0x11, 0x22, 0x33, 0xFF);
    assert_eq!(word.to_le_bytes(), [0x33, 0x22, 0x11, 0xFF]);
}

#[test]
fn carry_accumulator_never_exceeds_16_bits() {
    // Worst case: every sample at the top of the range with a full fractional byte carried.
    let mut acc = 0xFFu32;
    for _ in 0..10_000 {
        acc = carry_step(acc, U8XX_MAX);
        assert!(acc <= 0xFFFF);
    }

    // Pseudo-random sweep over the valid range.
    let mut carry = ErrorCarry::default();
    let mut x = 0x1234_5678u32;
    for _ in 0..100_000 {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        let s = (x % (u32::from(U8XX_MAX) + 1)) as u16;
        carry.push([s, U8XX_MAX - s, s / 2]);
        assert!(carry.accumulators().iter().all(|&a| a <= 0xFFFF));
    }
}

#[test]
fn carry_diffuses_fractional_remainder() {
    // 0x7F80 is code 127.5; alternating output averages to the true value.
    let mut carry = ErrorCarry::default();
    let codes: Vec<u8> = (0..4).map(|_| carry.push([0x7F80; 3])[0]).collect();
    assert_eq!(codes, vec![128, 127, 128, 127]);
}

#[test]
fn jittered_phase_is_seeded_and_in_range() {
    let a = JitteredPhase { seed: 7 };
    let b = JitteredPhase { seed: 7 };
    let c = JitteredPhase { seed: 8 };
    let mut differs = false;
    for row in 0..64 {
        let s = a.start_column(row, 37);
        assert!(s < 37);
        assert_eq!(s, b.start_column(row, 37));
        differs |= s != c.start_column(row, 37);
    }
    assert!(differs);
    assert_eq!(a.start_column(5, 1), 0);
}

#[test]
fn fixed_phase_is_clamped() {
    assert_eq!(FixedPhase { column: 3 }.start_column(0, 10), 3);
    assert_eq!(FixedPhase { column: 30 }.start_column(0, 10), 9);
    assert_eq!(CenteredPhase.start_column(7, 10), 5);
    assert_eq!(CenteredPhase.start_column(7, 1), 0);
}

#[test]
fn float_row_steps_by_decimation_and_forces_alpha() {
    let src = row(&[
        [0.1, 0.2, 0.3, 0.0],
        [9.0, 9.0, 9.0, 9.0],
        [0.4, 0.5, 0.6, 0.0],
        [9.0, 9.0, 9.0, 9.0],
    ]);
    let mut dst = vec![0u8; 2 * 16];
    convert_row_f32(&src, 2, &mut dst, &params(DisplayChannels::Rgba, 1.0, None));
    assert_eq!(read_f32(&dst), vec![0.1, 0.2, 0.3, 1.0, 0.4, 0.5, 0.6, 1.0]);
}

#[test]
fn byte_row_without_lut_quantizes_directly() {
    let src = row(&[[1.0, 0.0, 0.5, 0.0], [0.0, 1.0, 0.0, 0.0]]);
    let mut dst = vec![0u8; 8];
    convert_row_u8(&src, 1, &mut dst, &params(DisplayChannels::Rgba, 1.0, None), 1);
    assert_eq!(dst, vec![128, 0, 255, 255, 0, 255, 0, 255]);
}

#[test]
fn byte_row_is_fully_written_from_any_start() {
    let lut = ColorSpace::Srgb.lut();
    let src = row(&[[0.18, 0.18, 0.18, 1.0]; 9]);
    for start in 0..9 {
        let mut dst = vec![0u8; 9 * 4];
        convert_row_u8(&src, 1, &mut dst, &params(DisplayChannels::Rgba, 1.0, lut), start);
        for px in dst.chunks_exact(4) {
            assert_eq!(px[3], 255);
            assert!(px[0] == 117 || px[0] == 118, "got {}", px[0]);
        }
    }
}

#[test]
fn byte_row_stops_at_source_end() {
    let src = row(&[[1.0; 4]; 3]);
    let mut dst = vec![0u8; 4 * 4];
    convert_row_u8(&src, 2, &mut dst, &params(DisplayChannels::Rgba, 1.0, None), 0);
    // Two samples exist at step 2 (columns 0 and 2); the tail stays cleared.
    assert_eq!(&dst[..8], &[255; 8]);
    assert_eq!(&dst[8..], &[0; 8]);
}

//! Tests for the texturing stage.

use std::io::Cursor;

use ffp_memory::FlatMemory;
use ffp_texture::{wrap_nearest, Texturing};
use ffp_twin_core::protocol::DEFAULT_TEXTURE_OFFSET;
use ffp_twin_core::{
    run_stage, Command, CommandReader, CommandWriter, Fragment, Opcode, PipeError, TexFragment,
    TextureBinding,
};

const TEX_OFFSET: u32 = 0x100;

/// 2x2 texture: red, green / blue, white (RGBA words, red in the low byte).
fn checker_memory() -> FlatMemory {
    let mut mem = FlatMemory::zeroed(0x200);
    let texels = [0xFF00_00FF, 0xFF00_FF00, 0xFFFF_0000, 0xFFFF_FFFF];
    for (i, texel) in texels.into_iter().enumerate() {
        mem.write_word(TEX_OFFSET as usize + 4 * i, texel).unwrap();
    }
    mem
}

fn bound(mem: &FlatMemory) -> Texturing<&FlatMemory> {
    let mut stage = Texturing::new(mem);
    let mut sink = CommandWriter::new(Vec::new());
    ffp_twin_core::Stage::handle(
        &mut stage,
        Command::BindTexture(TextureBinding {
            offset: TEX_OFFSET,
            width: 2,
            height: 2,
        }),
        &mut sink,
    )
    .unwrap();
    stage
}

fn tex(s: f32, t: f32) -> TexFragment {
    TexFragment {
        x: 3,
        y: 4,
        z: 0x1234,
        s,
        t,
    }
}

// ============================================================================
// Addressing
// ============================================================================

mod addressing {
    use super::*;

    #[test]
    fn coordinates_repeat() {
        assert_eq!(wrap_nearest(0.25, 4), 1);
        assert_eq!(wrap_nearest(1.25, 4), 1);
        assert_eq!(wrap_nearest(-0.25, 4), 3);
        assert_eq!(wrap_nearest(0.0, 4), 0);
        assert_eq!(wrap_nearest(1.0, 4), 0);
    }

    #[test]
    fn fraction_rounding_to_one_picks_the_last_texel() {
        // -1e-9 floors to -1; the fraction rounds to exactly 1.0 in f32.
        assert_eq!(wrap_nearest(-1e-9, 8), 7);
    }

    #[test]
    fn start_up_binding_is_empty() {
        let mem = FlatMemory::zeroed(4);
        let stage = Texturing::new(&mem);
        assert_eq!(stage.binding().offset, DEFAULT_TEXTURE_OFFSET);
        assert_eq!((stage.binding().width, stage.binding().height), (0, 0));
    }
}

// ============================================================================
// Sampling
// ============================================================================

mod sampling {
    use super::*;

    #[test]
    fn nearest_texels_of_a_two_by_two_texture() {
        let mem = checker_memory();
        let stage = bound(&mem);
        assert_eq!(stage.sample(0.25, 0.25).unwrap(), 0xFFFF_0000);
        assert_eq!(stage.sample(0.75, 0.25).unwrap(), 0xFF00_FF00);
        assert_eq!(stage.sample(0.25, 0.75).unwrap(), 0xFF00_00FF);
        assert_eq!(stage.sample(0.75, 0.75).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn every_channel_value_survives_conversion() {
        let mut mem = FlatMemory::zeroed(256 * 4);
        for v in 0..=255u32 {
            let texel = (v << 24) | ((255 - v) << 16) | (v << 8) | v;
            mem.write_word(4 * v as usize, texel).unwrap();
        }
        let mut stage = Texturing::new(&mem);
        let mut sink = CommandWriter::new(Vec::new());
        ffp_twin_core::Stage::handle(
            &mut stage,
            Command::BindTexture(TextureBinding {
                offset: 0,
                width: 256,
                height: 1,
            }),
            &mut sink,
        )
        .unwrap();
        for v in 0..=255u32 {
            let argb = stage.sample((v as f32 + 0.5) / 256.0, 0.5).unwrap();
            assert_eq!(argb, (v << 24) | (v << 16) | (v << 8) | (255 - v), "texel {v}");
        }
    }

    #[test]
    fn sampling_outside_memory_fails() {
        let mem = FlatMemory::zeroed(16);
        let stage = Texturing::new(&mem);
        let err = stage.sample(0.5, 0.5).unwrap_err();
        assert!(matches!(err, PipeError::TexelOutOfRange { .. }));
    }
}

// ============================================================================
// Stream behavior
// ============================================================================

mod stream {
    use super::*;

    #[test]
    fn tex_fragments_become_colored_fragments() {
        let mem = checker_memory();
        let input = {
            let mut w = CommandWriter::new(Vec::new());
            w.write_command(&Command::BindTexture(TextureBinding {
                offset: TEX_OFFSET,
                width: 2,
                height: 2,
            }))
            .unwrap();
            w.write_command(&Command::TexFragment(tex(0.75, 0.75))).unwrap();
            w.write_command(&Command::Sync).unwrap();
            w.into_inner().unwrap()
        };
        let mut stage = Texturing::new(&mem);
        let mut output = Vec::new();
        run_stage(&mut stage, Cursor::new(input), &mut output).unwrap();
        let cmds = CommandReader::new(Cursor::new(output))
            .read_to_end(&Opcode::ALL)
            .unwrap();
        assert_eq!(
            cmds,
            vec![
                Command::Fragment(Fragment {
                    x: 3,
                    y: 4,
                    z: 0x1234,
                    color: 0xFFFF_FFFF,
                }),
                Command::Sync,
            ]
        );
        assert_eq!(stage.binding().width, 2);
    }

    #[test]
    fn texture_loaded_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgba([0x40, 0x80, 0xC0, 0xFF]));
        img.save(&path).unwrap();

        let mut mem = FlatMemory::zeroed(0x100);
        let binding = mem.load_png(&path, 0x40).unwrap();
        let mut stage = Texturing::new(&mem);
        let mut sink = CommandWriter::new(Vec::new());
        ffp_twin_core::Stage::handle(&mut stage, Command::BindTexture(binding), &mut sink)
            .unwrap();
        assert_eq!(stage.sample(0.9, 0.0).unwrap(), 0xFF40_80C0);
        assert_eq!(stage.sample(0.1, 0.0).unwrap(), 0);
    }
}

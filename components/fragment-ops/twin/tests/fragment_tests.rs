//! Tests for the fragment operations stage.

use std::io::Cursor;

use ffp_fragment_ops::FragmentOps;
use ffp_twin_core::protocol::MAX_DEPTH;
use ffp_twin_core::{
    run_stage, BlendFactor, Command, CommandReader, CommandWriter, ErrorCategory, Fragment,
    FragmentState, Opcode, PipeError, Stage,
};

fn frag(x: u16, y: u16, z: u32, color: u32) -> Fragment {
    Fragment { x, y, z, color }
}

fn with_state(state: FragmentState) -> FragmentOps {
    let mut ops = FragmentOps::new(8, 4);
    let mut sink = CommandWriter::new(Vec::new());
    ops.handle(Command::FragmentState(state), &mut sink).unwrap();
    ops
}

fn depth_state(write: bool) -> FragmentState {
    FragmentState {
        depth_test: true,
        depth_write: write,
        ..FragmentState::default()
    }
}

fn blend_state(src: BlendFactor, dst: BlendFactor) -> FragmentState {
    FragmentState {
        blend: true,
        src_factor: src.bits(),
        dst_factor: dst.bits(),
        ..FragmentState::default()
    }
}

// ============================================================================
// Buffers
// ============================================================================

mod buffers {
    use super::*;

    #[test]
    fn start_cleared() {
        let ops = FragmentOps::new(8, 4);
        assert!(ops.depth_buffer().iter().all(|&z| z == MAX_DEPTH));
        assert!(ops.frame_buffer().iter().all(|&c| c == 0));
        assert_eq!(ops.frame_buffer().len(), 32);
    }

    #[test]
    fn writes_are_row_major() {
        let mut ops = FragmentOps::new(8, 4);
        ops.process(frag(3, 2, 0, 0xFF12_3456)).unwrap();
        assert_eq!(ops.frame_buffer()[2 * 8 + 3], 0xFF12_3456);
    }

    #[test]
    fn out_of_bounds_is_a_resource_error() {
        let mut ops = FragmentOps::new(8, 4);
        let err = ops.process(frag(8, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, PipeError::FragmentOutOfBounds { x: 8, y: 0, .. }));
        assert_eq!(err.category(), ErrorCategory::Resource);
        assert!(ops.process(frag(0, 4, 0, 0)).is_err());
    }

    #[test]
    fn clear_depth_resets_every_entry() {
        let mut ops = with_state(depth_state(true));
        for x in 0..8 {
            ops.process(frag(x, 1, x as u32, 0xFFFF_FFFF)).unwrap();
        }
        assert!(ops.depth_buffer().iter().any(|&z| z != MAX_DEPTH));
        ops.clear_depth();
        assert!(ops.depth_buffer().iter().all(|&z| z == MAX_DEPTH));
    }
}

// ============================================================================
// Depth test
// ============================================================================

mod depth {
    use super::*;

    #[test]
    fn less_or_equal_passes() {
        let mut ops = with_state(depth_state(true));
        assert!(ops.process(frag(0, 0, 100, 1)).unwrap().is_some());
        assert!(ops.process(frag(0, 0, 100, 2)).unwrap().is_some());
        assert!(ops.process(frag(0, 0, 101, 3)).unwrap().is_none());
        assert!(ops.process(frag(0, 0, 50, 4)).unwrap().is_some());
        assert_eq!(ops.frame_buffer()[0], 4);
        assert_eq!(ops.depth_buffer()[0], 50);
    }

    #[test]
    fn masked_write_keeps_the_buffer() {
        let mut ops = with_state(depth_state(false));
        assert!(ops.process(frag(1, 0, 10, 1)).unwrap().is_some());
        assert_eq!(ops.depth_buffer()[1], MAX_DEPTH);
        // Still passes: nothing nearer was recorded.
        assert!(ops.process(frag(1, 0, 20, 2)).unwrap().is_some());
    }

    #[test]
    fn disabled_test_never_writes_depth() {
        let mut ops = with_state(FragmentState {
            depth_write: true,
            ..FragmentState::default()
        });
        ops.process(frag(2, 0, 5, 1)).unwrap();
        assert_eq!(ops.depth_buffer()[2], MAX_DEPTH);
    }

    #[test]
    fn depth_is_written_even_when_alpha_rejects() {
        let mut ops = with_state(FragmentState {
            alpha_test: true,
            ..depth_state(true)
        });
        assert!(ops.process(frag(0, 0, 7, 0x1000_0000)).unwrap().is_none());
        assert_eq!(ops.depth_buffer()[0], 7);
        assert_eq!(ops.frame_buffer()[0], 0);
    }
}

// ============================================================================
// Alpha test
// ============================================================================

mod alpha {
    use super::*;

    #[test]
    fn reference_is_exclusive() {
        let mut ops = with_state(FragmentState {
            alpha_test: true,
            ..FragmentState::default()
        });
        assert!(ops.process(frag(0, 0, 0, 171 << 24)).unwrap().is_none());
        assert!(ops.process(frag(0, 0, 0, 172 << 24)).unwrap().is_some());
    }

    #[test]
    fn disabled_passes_transparent_fragments() {
        let mut ops = FragmentOps::new(8, 4);
        assert!(ops.process(frag(0, 0, 0, 0x0000_00FF)).unwrap().is_some());
    }
}

// ============================================================================
// Blending
// ============================================================================

mod blending {
    use super::*;

    #[test]
    fn one_zero_is_identity() {
        let mut ops = with_state(blend_state(BlendFactor::One, BlendFactor::Zero));
        ops.process(frag(0, 0, 0, 0xFF00_00FF)).unwrap();
        let out = ops.process(frag(0, 0, 0, 0x7F12_3456)).unwrap().unwrap();
        assert_eq!(out.color, 0x7F12_3456);
    }

    #[test]
    fn additive_saturates() {
        let mut ops = with_state(blend_state(BlendFactor::One, BlendFactor::One));
        ops.process(frag(0, 0, 0, 0xFF80_8080)).unwrap();
        let out = ops.process(frag(0, 0, 0, 0xFF80_0000)).unwrap().unwrap();
        assert_eq!(out.color, 0xFFFF_8080);
    }

    #[test]
    fn source_alpha_over_destination() {
        let mut ops = with_state(blend_state(
            BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha,
        ));
        // Opaque source replaces, transparent source keeps.
        ops.process(frag(0, 0, 0, 0xFF00_FF00)).unwrap();
        let kept = ops.process(frag(0, 0, 0, 0x00FF_0000)).unwrap().unwrap();
        assert_eq!(kept.color & 0x00FF_FFFF, 0x0000_FF00);
        let replaced = ops.process(frag(0, 0, 0, 0xFF00_00FF)).unwrap().unwrap();
        assert_eq!(replaced.color & 0x00FF_FFFF, 0x0000_00FF);
    }

    #[test]
    fn one_minus_src_color_weights_destination() {
        let mut ops = FragmentOps::new(8, 4);
        ops.process(frag(0, 0, 0, 0xFFFF_FFFF)).unwrap();
        let mut sink = CommandWriter::new(Vec::new());
        let state = blend_state(BlendFactor::Zero, BlendFactor::OneMinusSrcColor);
        ops.handle(Command::FragmentState(state), &mut sink).unwrap();
        let out = ops.process(frag(0, 0, 0, 0x00FF_0000)).unwrap().unwrap();
        assert_eq!(out.color, 0xFF00_FFFF);
    }

    #[test]
    fn unknown_factor_is_fatal_only_when_blending() {
        let bad = FragmentState {
            src_factor: 12,
            ..FragmentState::default()
        };
        let mut ops = with_state(bad);
        assert!(ops.process(frag(0, 0, 0, 1)).is_ok());

        let mut ops = with_state(FragmentState { blend: true, ..bad });
        let err = ops.process(frag(0, 0, 0, 1)).unwrap_err();
        assert!(matches!(err, PipeError::UnknownBlendFactor(12)));
        assert_eq!(err.category(), ErrorCategory::Protocol);
    }
}

// ============================================================================
// Stream behavior
// ============================================================================

mod stream {
    use super::*;

    fn run(ops: &mut FragmentOps, commands: &[Command]) -> Vec<Command> {
        let mut writer = CommandWriter::new(Vec::new());
        for cmd in commands {
            writer.write_command(cmd).unwrap();
        }
        let input = writer.into_inner().unwrap();
        let mut output = Vec::new();
        run_stage(ops, Cursor::new(input), &mut output).unwrap();
        CommandReader::new(Cursor::new(output))
            .read_to_end(&Opcode::ALL)
            .unwrap()
    }

    #[test]
    fn passing_fragments_are_forwarded_and_clears_handled() {
        let mut ops = FragmentOps::new(8, 4);
        let out = run(
            &mut ops,
            &[
                Command::FragmentState(depth_state(true)),
                Command::Fragment(frag(1, 1, 10, 0xFF00_0001)),
                Command::Fragment(frag(1, 1, 20, 0xFF00_0002)),
                Command::ClearDepth,
                Command::ClearFramebuffer,
                Command::Sync,
            ],
        );
        assert_eq!(
            out,
            vec![
                Command::Fragment(frag(1, 1, 10, 0xFF00_0001)),
                Command::ClearFramebuffer,
                Command::Sync,
            ]
        );
        assert!(ops.depth_buffer().iter().all(|&z| z == MAX_DEPTH));
        assert!(ops.frame_buffer().iter().all(|&c| c == 0));
    }

    #[test]
    fn state_word_round_trips_through_the_stream() {
        let state = FragmentState {
            depth_test: true,
            depth_write: true,
            alpha_test: false,
            blend: true,
            src_factor: BlendFactor::SrcAlpha.bits(),
            dst_factor: BlendFactor::OneMinusSrcAlpha.bits(),
        };
        let mut ops = FragmentOps::new(2, 2);
        run(&mut ops, &[Command::FragmentState(state)]);
        assert_eq!(*ops.state(), state);
    }
}

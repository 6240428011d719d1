//! Tests for the illumination stage.

use std::io::Cursor;

use ffp_illumination::{shade_vertex, Illumination, SCENE_AMBIENT};
use ffp_twin_core::glam::{Vec3, Vec4};
use ffp_twin_core::{
    run_stage, Command, CommandReader, CommandWriter, LightParams, Opcode, PipeError, Triangle,
    Vertex, VertexLayout,
};

fn lit_vertex(ambient: Vec4, diffuse: Vec4, normal: Vec3) -> Vertex {
    Vertex::new(Vec4::new(10.0, 20.0, 0.5, 1.0), ambient).with_lighting(diffuse, normal)
}

fn run(stage: &mut Illumination, commands: &[Command]) -> Result<Vec<Command>, PipeError> {
    let mut writer = CommandWriter::new(Vec::new());
    for cmd in commands {
        writer.write_command(cmd)?;
    }
    let input = writer.into_inner()?;
    let mut output = Vec::new();
    run_stage(stage, Cursor::new(input), &mut output)?;
    CommandReader::new(Cursor::new(output)).read_to_end(&Opcode::ALL)
}

// ============================================================================
// Shading
// ============================================================================

mod shading {
    use super::*;

    #[test]
    fn defaults_light_along_positive_z() {
        let light = LightParams::default();
        assert_eq!(light.direction, Vec4::new(0.0, 0.0, 1.0, 0.0));
        assert_eq!(light.diffuse_color, Vec4::new(1.0, 1.0, 1.0, 0.0));
    }

    #[test]
    fn facing_the_light_adds_full_diffuse() {
        let v = lit_vertex(Vec4::ONE, Vec4::new(0.5, 0.25, 1.0, 0.75), Vec3::Z);
        let c = shade_vertex(&v, &LightParams::default());
        assert_eq!(c, Vec4::new(0.5 + 0.2, 0.25 + 0.2, 1.0 + 0.2, 0.75));
    }

    #[test]
    fn facing_away_leaves_only_ambient() {
        let v = lit_vertex(Vec4::new(1.0, 0.5, 0.0, 1.0), Vec4::ONE, -Vec3::Z);
        let c = shade_vertex(&v, &LightParams::default());
        assert_eq!(c.truncate(), (Vec4::new(1.0, 0.5, 0.0, 1.0) * SCENE_AMBIENT).truncate());
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn result_is_not_clamped() {
        let light = LightParams {
            direction: Vec4::new(0.0, 1.0, 0.0, 0.0),
            diffuse_color: Vec4::splat(2.0),
        };
        let v = lit_vertex(Vec4::ONE, Vec4::ONE, Vec3::Y);
        let c = shade_vertex(&v, &light);
        assert!(c.x > 2.0, "{c:?}");
    }

    #[test]
    fn oblique_normal_scales_diffuse() {
        let light = LightParams {
            direction: Vec4::new(1.0, 0.0, 0.0, 0.0),
            diffuse_color: Vec4::ONE,
        };
        let v = lit_vertex(Vec4::ZERO, Vec4::ONE, Vec3::new(0.5, 0.5, 0.0));
        let c = shade_vertex(&v, &light);
        assert_eq!(c, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }
}

// ============================================================================
// Stream behavior
// ============================================================================

mod stream {
    use super::*;

    #[test]
    fn lit_triangles_leave_as_colored_triangles() {
        let v = lit_vertex(Vec4::ONE, Vec4::new(1.0, 0.0, 0.0, 1.0), Vec3::Z);
        let tri = Triangle::new(VertexLayout::Vertex4N3, [v, v, v]);
        let mut stage = Illumination::new();
        let out = run(&mut stage, &[Command::Triangle(tri), Command::Sync]).unwrap();

        assert_eq!(out.len(), 2);
        let Command::Triangle(shaded) = &out[0] else {
            panic!("expected a triangle, got {:?}", out[0]);
        };
        assert_eq!(shaded.layout, VertexLayout::Vertex4);
        assert_eq!(shaded.vertices[0].position, v.position);
        assert_eq!(shaded.vertices[0].color, Vec4::new(1.0 + 0.2, 0.2, 0.2, 1.0));
        assert_eq!(out[1], Command::Sync);
    }

    #[test]
    fn light_commands_are_consumed() {
        let light = LightParams {
            direction: Vec4::new(0.0, 1.0, 0.0, 0.0),
            diffuse_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
        };
        let mut stage = Illumination::new();
        let out = run(
            &mut stage,
            &[
                Command::LightState { enabled: true },
                Command::LightParams(light),
            ],
        )
        .unwrap();
        assert!(out.is_empty());
        assert_eq!(*stage.light(), light);
        assert!(stage.enabled());
    }

    #[test]
    fn unlit_triangles_pass_through() {
        let tri = Triangle::new(
            VertexLayout::Vertex4,
            [Vertex::new(Vec4::new(1.0, 2.0, 3.0, 1.0), Vec4::ONE); 3],
        );
        let mut stage = Illumination::new();
        let out = run(&mut stage, &[Command::Triangle(tri)]).unwrap();
        assert_eq!(out, vec![Command::Triangle(tri)]);
    }

    #[test]
    fn object_space_lit_triangle_is_fatal() {
        let v = lit_vertex(Vec4::ONE, Vec4::ONE, Vec3::Z);
        let tri = Triangle::new(VertexLayout::Vertex3N3, [v, v, v]);
        let mut stage = Illumination::new();
        let err = run(&mut stage, &[Command::Triangle(tri)]).unwrap_err();
        assert!(matches!(
            err,
            PipeError::Unsupported {
                stage: "illumination",
                word
            } if word == Opcode::Vertex3N3.word()
        ));
    }
}

use material::{
    displaced_standard, inject, BaseProgram, ChunkLibrary, InjectionError, InjectionMarker,
    ShaderPatch, UniformSynchronizer, AMPLITUDE_UNIFORM, TIME_UNIFORM,
};
use std::time::Duration;

fn occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn standard_base_carries_each_marker_once() {
    let base = BaseProgram::standard();
    for marker in InjectionMarker::ALL {
        let source = match marker.stage() {
            material::Stage::Vertex => &base.vertex,
            material::Stage::Fragment => &base.fragment,
        };
        assert_eq!(occurrences(source, marker.text()), 1, "{marker}");
    }
}

#[test]
fn injected_program_keeps_markers_and_appends_patch() {
    let patch = ShaderPatch::displacement();
    let program = displaced_standard(4.0).unwrap();
    let vertex = program.vertex_source();
    let fragment = program.fragment_source();

    let marker = InjectionMarker::VertexBody.text();
    let expected = format!("{marker}{}", patch.vertex_body);
    assert!(vertex.contains(&expected));
    assert_eq!(occurrences(vertex, marker), 1);

    let marker = InjectionMarker::FragmentBody.text();
    assert!(fragment.contains(&format!("{marker}{}", patch.fragment_body)));
}

#[test]
fn arbitrary_patch_text_is_spliced_verbatim() {
    let patch = ShaderPatch {
        vertex_declarations: "\nfloat extraVertex;".into(),
        vertex_body: "\n    extraVertex = 1.0;".into(),
        fragment_declarations: "".into(),
        fragment_body: "\n    // nothing to do".into(),
    };
    let program = inject(BaseProgram::standard(), &patch, 2.0).unwrap();
    assert!(program.vertex_source().contains("float extraVertex;"));
    assert!(program.fragment_source().contains("// nothing to do"));
    assert_eq!(
        BaseProgram::standard().fragment.len() + patch.fragment_body.len(),
        program.fragment_source().len()
    );
}

#[test]
fn each_missing_marker_is_named() {
    for marker in InjectionMarker::ALL {
        let mut base = BaseProgram::standard();
        let source = match marker.stage() {
            material::Stage::Vertex => &mut base.vertex,
            material::Stage::Fragment => &mut base.fragment,
        };
        *source = source.replace(marker.text(), "");
        let err = inject(base, &ShaderPatch::displacement(), 4.0).unwrap_err();
        assert_eq!(err, InjectionError::MarkerNotFound { marker });
    }
}

#[test]
fn resolved_sources_declare_the_uniform_block_in_both_stages() {
    let program = displaced_standard(4.0).unwrap();
    let resolved = program.resolve(&ChunkLibrary::standard()).unwrap();
    for source in [&resolved.vertex, &resolved.fragment] {
        assert_eq!(occurrences(source, "uniform MaterialUniforms"), 1);
        assert_eq!(occurrences(source, "uniform SceneParams"), 1);
        assert!(!source.contains("#include"));
    }
    assert!(resolved.vertex.contains("layout(location = 2) out float vDisplacement;"));
    assert!(resolved.fragment.contains("layout(location = 2) in float vDisplacement;"));
}

#[test]
fn resolve_fails_on_a_chunk_the_library_lacks() {
    let program = displaced_standard(4.0).unwrap();
    let err = program.resolve(&ChunkLibrary::empty()).unwrap_err();
    assert_eq!(err, InjectionError::UnknownChunk("common".into()));
}

#[test]
fn synchronizer_updates_the_injected_table() {
    let mut program = displaced_standard(4.0).unwrap();
    let sync = UniformSynchronizer::default();
    assert!(sync.sync(Some(program.uniforms_mut()), Duration::from_millis(2_500), 4.875));
    assert_eq!(program.uniforms().get(TIME_UNIFORM), Some(0.5));
    assert_eq!(program.uniforms().get(AMPLITUDE_UNIFORM), Some(4.875));

    let bytes = program.uniforms().std140_bytes();
    assert_eq!(&bytes[0..4], &0.5_f32.to_ne_bytes());
    assert_eq!(&bytes[4..8], &4.875_f32.to_ne_bytes());
}

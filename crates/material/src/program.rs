use std::borrow::Cow;

use tracing::debug;

use crate::chunks::{expand_includes, ChunkLibrary, CUSTOM_UNIFORMS_CHUNK};
use crate::error::InjectionError;
use crate::marker::{InjectionMarker, Stage};
use crate::uniforms::UniformTable;

pub const TIME_UNIFORM: &str = "time";
pub const AMPLITUDE_UNIFORM: &str = "amplitude";

const STANDARD_VERTEX: &str = include_str!("../glsl/standard.vert");
const STANDARD_FRAGMENT: &str = include_str!("../glsl/standard.frag");

/// Unmodified vertex and fragment sources of a host material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseProgram {
    pub vertex: String,
    pub fragment: String,
}

impl BaseProgram {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Physically based lit material with every injection marker in place.
    pub fn standard() -> Self {
        Self::new(STANDARD_VERTEX, STANDARD_FRAGMENT)
    }

    fn source(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }

    fn source_mut(&mut self, stage: Stage) -> &mut String {
        match stage {
            Stage::Vertex => &mut self.vertex,
            Stage::Fragment => &mut self.fragment,
        }
    }
}

/// Four code fragments spliced in after their markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderPatch {
    pub vertex_declarations: Cow<'static, str>,
    pub vertex_body: Cow<'static, str>,
    pub fragment_declarations: Cow<'static, str>,
    pub fragment_body: Cow<'static, str>,
}

impl ShaderPatch {
    /// Noise driven vertex displacement with matching bump-mapped normals.
    /// Reads the `time` and `amplitude` uniforms.
    pub fn displacement() -> Self {
        Self {
            vertex_declarations: Cow::Borrowed(include_str!("../glsl/displacement_pars.vert")),
            vertex_body: Cow::Borrowed(include_str!("../glsl/displacement_body.vert")),
            fragment_declarations: Cow::Borrowed(include_str!("../glsl/displacement_pars.frag")),
            fragment_body: Cow::Borrowed(include_str!("../glsl/displacement_body.frag")),
        }
    }

    pub fn code_for(&self, marker: InjectionMarker) -> &str {
        match marker {
            InjectionMarker::VertexDeclarations => &self.vertex_declarations,
            InjectionMarker::VertexBody => &self.vertex_body,
            InjectionMarker::FragmentDeclarations => &self.fragment_declarations,
            InjectionMarker::FragmentBody => &self.fragment_body,
        }
    }
}

/// Rewritten program plus the uniform table it reads. The sources are fixed
/// once built; only uniform values change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProgram {
    vertex: String,
    fragment: String,
    uniforms: UniformTable,
}

/// Program with every include expanded, ready for the GLSL frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProgram {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgram {
    pub fn vertex_source(&self) -> &str {
        &self.vertex
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment
    }

    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformTable {
        &mut self.uniforms
    }

    /// Expands chunks through `library`. `custom_uniforms` always resolves to
    /// this program's own uniform block.
    pub fn resolve(&self, library: &ChunkLibrary) -> Result<ResolvedProgram, InjectionError> {
        let block = self.uniforms.block_declaration();
        let lookup = |name: &str| {
            if name == CUSTOM_UNIFORMS_CHUNK {
                Some(Cow::Borrowed(block.as_str()))
            } else {
                library.get(name).map(Cow::Borrowed)
            }
        };
        Ok(ResolvedProgram {
            vertex: expand_includes(&self.vertex, &lookup)?,
            fragment: expand_includes(&self.fragment, &lookup)?,
        })
    }
}

/// Splices `patch` into `base` after each marker and registers the `time`
/// and `amplitude` uniforms.
///
/// Every marker must occur exactly once. All markers are checked before any
/// source is touched, so a failure never yields a partially patched program.
pub fn inject(
    base: BaseProgram,
    patch: &ShaderPatch,
    initial_amplitude: f32,
) -> Result<ShaderProgram, InjectionError> {
    for marker in InjectionMarker::ALL {
        locate(base.source(marker.stage()), marker)?;
    }

    let mut program = base;
    for marker in InjectionMarker::ALL {
        let source = program.source_mut(marker.stage());
        let at = locate(source, marker)? + marker.text().len();
        source.insert_str(at, patch.code_for(marker));
    }

    let mut uniforms = UniformTable::new();
    uniforms.register(TIME_UNIFORM, 0.0);
    uniforms.register(AMPLITUDE_UNIFORM, initial_amplitude);
    debug!(
        vertex_len = program.vertex.len(),
        fragment_len = program.fragment.len(),
        initial_amplitude,
        "shader patch injected"
    );

    Ok(ShaderProgram {
        vertex: program.vertex,
        fragment: program.fragment,
        uniforms,
    })
}

fn locate(source: &str, marker: InjectionMarker) -> Result<usize, InjectionError> {
    let mut hits = source.match_indices(marker.text()).map(|(at, _)| at);
    let first = hits
        .next()
        .ok_or(InjectionError::MarkerNotFound { marker })?;
    let extra = hits.count();
    if extra > 0 {
        return Err(InjectionError::MarkerRepeated {
            marker,
            count: extra + 1,
        });
    }
    Ok(first)
}

/// The standard material with the displacement patch applied.
pub fn displaced_standard(initial_amplitude: f32) -> Result<ShaderProgram, InjectionError> {
    inject(
        BaseProgram::standard(),
        &ShaderPatch::displacement(),
        initial_amplitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_base() -> BaseProgram {
        BaseProgram::new(
            "#include <displacementmap_pars_vertex>\nvoid main() {\n#include <displacementmap_vertex>\n}\n",
            "#include <bumpmap_pars_fragment>\nvoid main() {\n#include <normal_fragment_maps>\n}\n",
        )
    }

    fn tagged_patch() -> ShaderPatch {
        ShaderPatch {
            vertex_declarations: "\n// vd".into(),
            vertex_body: "\n// vb".into(),
            fragment_declarations: "\n// fd".into(),
            fragment_body: "\n// fb".into(),
        }
    }

    #[test]
    fn patch_lands_directly_after_each_marker() {
        let program = inject(tiny_base(), &tagged_patch(), 4.0).unwrap();
        assert_eq!(
            program.vertex_source(),
            "#include <displacementmap_pars_vertex>\n// vd\nvoid main() {\n#include <displacementmap_vertex>\n// vb\n}\n"
        );
        assert!(program
            .fragment_source()
            .contains("#include <normal_fragment_maps>\n// fb\n"));
    }

    #[test]
    fn injection_registers_time_and_amplitude() {
        let program = inject(tiny_base(), &tagged_patch(), 3.5).unwrap();
        assert_eq!(program.uniforms().get(TIME_UNIFORM), Some(0.0));
        assert_eq!(program.uniforms().get(AMPLITUDE_UNIFORM), Some(3.5));
        assert_eq!(program.uniforms().len(), 2);
    }

    #[test]
    fn repeated_marker_is_rejected() {
        let mut base = tiny_base();
        base.vertex.push_str("#include <displacementmap_vertex>\n");
        let err = inject(base, &tagged_patch(), 4.0).unwrap_err();
        assert_eq!(
            err,
            InjectionError::MarkerRepeated {
                marker: InjectionMarker::VertexBody,
                count: 2,
            }
        );
    }

    #[test]
    fn missing_fragment_marker_is_reported_before_any_splice() {
        let base = BaseProgram::new(tiny_base().vertex, "void main() {}\n");
        let err = inject(base, &tagged_patch(), 4.0).unwrap_err();
        assert_eq!(
            err,
            InjectionError::MarkerNotFound {
                marker: InjectionMarker::FragmentDeclarations,
            }
        );
        assert!(err.to_string().contains("fragment source"));
    }

    #[test]
    fn standard_program_resolves_without_includes() {
        let program = displaced_standard(4.0).unwrap();
        let resolved = program.resolve(&ChunkLibrary::standard()).unwrap();
        assert!(!resolved.vertex.contains("#include"));
        assert!(!resolved.fragment.contains("#include"));
        assert!(resolved.vertex.contains("#define time material_uniforms.u_time"));
        assert!(resolved.fragment.contains("#define amplitude material_uniforms.u_amplitude"));
        assert!(resolved.vertex.starts_with("#version 450"));
    }
}

use std::fmt;

/// Shader stage a source string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Fixed splice points inside the base material program.
///
/// Each marker is an `#include` directive the host pipeline already expands
/// to its own default code; custom code lands directly after it so the
/// default still runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionMarker {
    VertexDeclarations,
    VertexBody,
    FragmentDeclarations,
    FragmentBody,
}

impl InjectionMarker {
    pub const ALL: [InjectionMarker; 4] = [
        InjectionMarker::VertexDeclarations,
        InjectionMarker::VertexBody,
        InjectionMarker::FragmentDeclarations,
        InjectionMarker::FragmentBody,
    ];

    /// Verbatim text searched for in the base source.
    pub fn text(self) -> &'static str {
        match self {
            InjectionMarker::VertexDeclarations => "#include <displacementmap_pars_vertex>",
            InjectionMarker::VertexBody => "#include <displacementmap_vertex>",
            InjectionMarker::FragmentDeclarations => "#include <bumpmap_pars_fragment>",
            InjectionMarker::FragmentBody => "#include <normal_fragment_maps>",
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            InjectionMarker::VertexDeclarations | InjectionMarker::VertexBody => Stage::Vertex,
            InjectionMarker::FragmentDeclarations | InjectionMarker::FragmentBody => {
                Stage::Fragment
            }
        }
    }
}

impl fmt::Display for InjectionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

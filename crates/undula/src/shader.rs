use anyhow::{Context, Result};
use material::ChunkLibrary;
use sceneconfig::SceneConfig;

use crate::cli::{ShaderArgs, StageSelection};

pub fn print(args: &ShaderArgs, scene: &SceneConfig) -> Result<()> {
    print!("{}", render(args, scene)?);
    Ok(())
}

/// Augmented sources as printed by `undula shader`.
pub fn render(args: &ShaderArgs, scene: &SceneConfig) -> Result<String> {
    let program = material::displaced_standard(scene.amplitude.initial)
        .context("failed to inject displacement into the base material")?;
    let (vertex, fragment) = if args.raw {
        (
            program.vertex_source().to_string(),
            program.fragment_source().to_string(),
        )
    } else {
        let resolved = program
            .resolve(&ChunkLibrary::standard())
            .context("failed to resolve shader chunks")?;
        (resolved.vertex, resolved.fragment)
    };

    let mut out = String::new();
    if matches!(args.stage, StageSelection::Vertex | StageSelection::Both) {
        out.push_str("// ---- vertex ----\n");
        out.push_str(&vertex);
    }
    if matches!(args.stage, StageSelection::Fragment | StageSelection::Both) {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("// ---- fragment ----\n");
        out.push_str(&fragment);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_selection_limits_output() {
        let scene = SceneConfig::default();
        let vertex = render(
            &ShaderArgs {
                stage: StageSelection::Vertex,
                raw: false,
            },
            &scene,
        )
        .unwrap();
        assert!(vertex.contains("// ---- vertex ----"));
        assert!(!vertex.contains("// ---- fragment ----"));
        assert!(!vertex.contains("#include"));

        let both = render(
            &ShaderArgs {
                stage: StageSelection::Both,
                raw: true,
            },
            &scene,
        )
        .unwrap();
        assert!(both.contains("#include <normal_fragment_maps>"));
        assert!(both.contains("#include <displacementmap_vertex>"));
    }
}

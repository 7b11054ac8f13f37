use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::InjectionError;

/// Name of the chunk generated from the program's own [`UniformTable`].
///
/// [`UniformTable`]: crate::UniformTable
pub const CUSTOM_UNIFORMS_CHUNK: &str = "custom_uniforms";

const MAX_INCLUDE_DEPTH: usize = 8;

/// Named GLSL snippets that `#include <name>` directives expand to.
#[derive(Debug, Clone, Default)]
pub struct ChunkLibrary {
    chunks: HashMap<String, Cow<'static, str>>,
}

impl ChunkLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Library backing the standard physically based material.
    pub fn standard() -> Self {
        let mut library = Self::empty();
        for (name, body) in STANDARD_CHUNKS {
            library.insert(*name, Cow::Borrowed(*body));
        }
        library
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<Cow<'static, str>>) {
        self.chunks.insert(name.into(), body.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.chunks.get(name).map(|body| body.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chunks.contains_key(name)
    }
}

/// Expands every `#include <name>` line in `source` through `lookup`,
/// recursing into the expanded text. Anything trailing the directive on the
/// same line is kept on the following line.
pub(crate) fn expand_includes<'a, F>(source: &str, lookup: &F) -> Result<String, InjectionError>
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    expand(source, lookup, 0)
}

fn expand<'a, F>(source: &str, lookup: &F, depth: usize) -> Result<String, InjectionError>
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let Some((name, rest)) = parse_include(line) else {
            out.push_str(line);
            continue;
        };
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(InjectionError::IncludeDepth(name.to_string()));
        }
        let body = lookup(name).ok_or_else(|| InjectionError::UnknownChunk(name.to_string()))?;
        let expanded = expand(&body, lookup, depth + 1)?;
        out.push_str(&expanded);
        if !expanded.is_empty() && !expanded.ends_with('\n') {
            out.push('\n');
        }
        if !rest.trim().is_empty() {
            out.push_str(rest);
        }
        if !line.ends_with('\n') && out.ends_with('\n') && rest.trim().is_empty() {
            out.pop();
        }
    }
    Ok(out)
}

fn parse_include(line: &str) -> Option<(&str, &str)> {
    let directive = line.trim_start().strip_prefix("#include")?;
    let directive = directive.trim_start().strip_prefix('<')?;
    let end = directive.find('>')?;
    let name = directive[..end].trim();
    if name.is_empty() {
        return None;
    }
    Some((name, &directive[end + 1..]))
}

const STANDARD_CHUNKS: &[(&str, &str)] = &[
    ("common", COMMON),
    ("scene_pars", SCENE_PARS),
    ("beginnormal_vertex", "vec3 objectNormal = vec3(normal);\n"),
    (
        "defaultnormal_vertex",
        "vec3 transformedNormal = mat3(scene.normalMatrix) * objectNormal;\n",
    ),
    ("normal_vertex", "vNormal = normalize(transformedNormal);\n"),
    ("begin_vertex", "vec3 transformed = vec3(position);\n"),
    ("displacementmap_pars_vertex", ""),
    ("displacementmap_vertex", ""),
    ("project_vertex", PROJECT_VERTEX),
    ("bumpmap_pars_fragment", ""),
    ("lights_physical_pars_fragment", LIGHTS_PHYSICAL_PARS),
    (
        "normal_fragment_begin",
        "vec3 normal = normalize(vNormal) * faceDirection;\n",
    ),
    ("normal_fragment_maps", ""),
    ("lights_physical_fragment", LIGHTS_PHYSICAL),
];

const COMMON: &str = r"#define PI 3.141592653589793
#define RECIPROCAL_PI 0.3183098861837907
#define EPSILON 1e-6
";

/// Must match `SceneUniforms` in the renderer.
const SCENE_PARS: &str = r"layout(std140, set = 0, binding = 0) uniform SceneParams {
    mat4 modelMatrix;
    mat4 viewMatrix;
    mat4 projectionMatrix;
    mat4 normalMatrix;
    vec4 cameraPosition;
    vec4 diffuseColor;
    vec4 materialParams;
    vec4 lightDirection;
    vec4 lightColor;
    vec4 ambientColor;
} scene;
";

const PROJECT_VERTEX: &str = r"vec4 mvPosition = scene.viewMatrix * scene.modelMatrix * vec4(transformed, 1.0);
gl_Position = scene.projectionMatrix * mvPosition;
";

const LIGHTS_PHYSICAL_PARS: &str = r"float D_GGX(float alpha, float dotNH) {
    float a2 = alpha * alpha;
    float denom = dotNH * dotNH * (a2 - 1.0) + 1.0;
    return RECIPROCAL_PI * a2 / (denom * denom);
}

float V_GGX_SmithCorrelated(float alpha, float dotNL, float dotNV) {
    float a2 = alpha * alpha;
    float gv = dotNL * sqrt(a2 + (1.0 - a2) * dotNV * dotNV);
    float gl = dotNV * sqrt(a2 + (1.0 - a2) * dotNL * dotNL);
    return 0.5 / max(gv + gl, EPSILON);
}

vec3 F_Schlick(vec3 f0, float dotVH) {
    float fresnel = pow(1.0 - dotVH, 5.0);
    return f0 * (1.0 - fresnel) + vec3(fresnel);
}
";

// Light direction arrives in world space; normals live in view space.
const LIGHTS_PHYSICAL: &str = r"float metalness = scene.materialParams.x;
float roughness = max(scene.materialParams.y, 0.0525);
vec3 albedo = diffuseColor.rgb * (1.0 - metalness);
vec3 specularColor = mix(vec3(0.04), diffuseColor.rgb, metalness);
float alphaRoughness = roughness * roughness;
vec3 viewDir = normalize(vViewPosition);
vec3 lightDir = normalize((scene.viewMatrix * vec4(scene.lightDirection.xyz, 0.0)).xyz);
vec3 halfDir = normalize(lightDir + viewDir);
float dotNL = clamp(dot(normal, lightDir), 0.0, 1.0);
float dotNV = clamp(dot(normal, viewDir), 0.0, 1.0);
float dotNH = clamp(dot(normal, halfDir), 0.0, 1.0);
float dotVH = clamp(dot(viewDir, halfDir), 0.0, 1.0);
vec3 irradiance = dotNL * scene.lightColor.rgb;
vec3 directDiffuse = irradiance * RECIPROCAL_PI * albedo;
vec3 directSpecular = irradiance * F_Schlick(specularColor, dotVH)
    * V_GGX_SmithCorrelated(alphaRoughness, dotNL, dotNV) * D_GGX(alphaRoughness, dotNH);
vec3 indirectDiffuse = scene.ambientColor.rgb * RECIPROCAL_PI * albedo;
vec3 outgoingLight = directDiffuse + directSpecular + indirectDiffuse;
";

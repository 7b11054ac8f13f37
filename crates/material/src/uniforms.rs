/// Bind group index the custom uniform block is declared at. Group 0 holds
/// the scene parameters.
pub const MATERIAL_UNIFORM_GROUP: u32 = 1;

/// GLSL instance name of the generated block.
pub const MATERIAL_BLOCK_INSTANCE: &str = "material_uniforms";

/// Prefix applied to every member so the bare names stay free for macros.
const MEMBER_PREFIX: &str = "u_";

#[derive(Debug, Clone, PartialEq)]
struct UniformSlot {
    name: String,
    value: f32,
}

/// Ordered set of named scalar uniforms shared by both shader stages.
///
/// Registration order fixes the std140 layout, so the table is only ever
/// appended to while a program is being assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformTable {
    slots: Vec<UniformSlot>,
}

impl UniformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` with an initial value. Re-registering an existing name
    /// overwrites its value and keeps the original slot.
    pub fn register(&mut self, name: impl Into<String>, value: f32) {
        let name = name.into();
        match self.slots.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => slot.value = value,
            None => self.slots.push(UniformSlot { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.value)
    }

    /// Writes a registered uniform. Returns false when `name` is unknown.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        match self.slots.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Byte size of the std140 block, rounded up to a whole vec4.
    pub fn std140_size(&self) -> usize {
        let raw = self.slots.len().max(1) * std::mem::size_of::<f32>();
        raw.div_ceil(16) * 16
    }

    /// Packs the current values as consecutive floats, zero padded to
    /// [`Self::std140_size`].
    pub fn std140_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.std140_size());
        for slot in &self.slots {
            bytes.extend_from_slice(&slot.value.to_ne_bytes());
        }
        bytes.resize(self.std140_size(), 0);
        bytes
    }

    /// GLSL declaration of the block plus one `#define` per member so shader
    /// code can refer to each uniform by its bare name.
    pub fn block_declaration(&self) -> String {
        let mut out = format!(
            "layout(std140, set = {MATERIAL_UNIFORM_GROUP}, binding = 0) uniform MaterialUniforms {{\n"
        );
        if self.slots.is_empty() {
            out.push_str("    float _padding;\n");
        }
        for slot in &self.slots {
            out.push_str(&format!("    float {MEMBER_PREFIX}{};\n", slot.name));
        }
        out.push_str(&format!("}} {MATERIAL_BLOCK_INSTANCE};\n"));
        for slot in &self.slots {
            out.push_str(&format!(
                "#define {name} {MATERIAL_BLOCK_INSTANCE}.{MEMBER_PREFIX}{name}\n",
                name = slot.name
            ));
        }
        out
    }
}

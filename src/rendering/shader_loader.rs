use std::collections::HashMap;

use anyhow::Context;
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags, Validator},
};
use naga_oil::compose::{Composer, NagaModuleDescriptor};

use crate::rendering::{permutation::ShaderPermutation, reflection::NagaReflection};

pub const FORWARD_SHADER_PATH: &str = "assets/shaders/forward.wgsl";

/// Embedded so permutations can be composed without touching the filesystem.
pub const FORWARD_SHADER_SOURCE: &str = include_str!("../../assets/shaders/forward.wgsl");

const SHADER_CAPABILITIES: Capabilities = Capabilities::PUSH_CONSTANT;

/// One permutation of the forward shader, ready to hand to wgpu.
pub struct ComposedShader {
    pub permutation: ShaderPermutation,
    /// Plain WGSL with the permutation's defines applied.
    pub wgsl: String,
    pub reflection: NagaReflection,
}

pub struct ShaderComposer {
    composer: Composer,
    compose_count: HashMap<ShaderPermutation, u32>,
}

impl Default for ShaderComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderComposer {
    pub fn new() -> Self {
        Self {
            composer: Composer::default().with_capabilities(SHADER_CAPABILITIES),
            compose_count: HashMap::new(),
        }
    }

    pub fn compose(&mut self, permutation: &ShaderPermutation) -> anyhow::Result<ComposedShader> {
        let module = self
            .composer
            .make_naga_module(NagaModuleDescriptor {
                source: FORWARD_SHADER_SOURCE,
                file_path: FORWARD_SHADER_PATH,
                shader_defs: permutation.shader_defs(),
                ..Default::default()
            })
            .with_context(|| format!("Failed to compose forward shader for {permutation}"))?;

        let info = Validator::new(ValidationFlags::all(), SHADER_CAPABILITIES)
            .validate(&module)
            .with_context(|| format!("Forward shader for {permutation} failed validation"))?;

        let wgsl = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
            .context("Failed to convert Naga module to WGSL string")?;

        *self.compose_count.entry(permutation.clone()).or_default() += 1;
        log::debug!("Composed forward shader {permutation}");

        Ok(ComposedShader {
            permutation: permutation.clone(),
            wgsl,
            reflection: NagaReflection::new(module),
        })
    }

    /// How many times `permutation` has been composed.
    pub fn compose_count(&self, permutation: &ShaderPermutation) -> u32 {
        self.compose_count.get(permutation).copied().unwrap_or(0)
    }
}

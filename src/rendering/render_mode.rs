use std::fmt;

use crate::rendering::permutation::ShaderPermutation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// The scene renderer's own per-item path, used as the reference image.
    Stock,
    /// Per-draw constants written from the CPU before every draw.
    Explicit,
    /// Constants precomputed into one GPU array, one draw per item.
    BindlessConstants,
    /// Constants array plus merged geometry, one indirect multi-draw.
    #[default]
    BindlessMultiDraw,
}

impl RenderMode {
    pub const ALL: [RenderMode; 4] = [
        RenderMode::Stock,
        RenderMode::Explicit,
        RenderMode::BindlessConstants,
        RenderMode::BindlessMultiDraw,
    ];

    pub fn index(self) -> usize {
        match self {
            RenderMode::Stock => 0,
            RenderMode::Explicit => 1,
            RenderMode::BindlessConstants => 2,
            RenderMode::BindlessMultiDraw => 3,
        }
    }

    /// Defines consumed by `assets/shaders/forward.wgsl`.
    pub fn shader_defines(self) -> &'static [&'static str] {
        match self {
            RenderMode::Stock => &["STOCK_RENDERER", "PER_DRAW_UNIFORM"],
            RenderMode::Explicit => &["EXPLICIT_CONSTANTS", "PER_DRAW_UNIFORM"],
            RenderMode::BindlessConstants => &["BINDLESS_CONSTANTS", "PUSH_DRAW_ORDINAL"],
            RenderMode::BindlessMultiDraw => &["BINDLESS_CONSTANTS", "MULTI_DRAW"],
        }
    }

    pub fn permutation(self) -> ShaderPermutation {
        ShaderPermutation::new(self.shader_defines().iter().copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            RenderMode::Stock => "Stock",
            RenderMode::Explicit => "Explicit",
            RenderMode::BindlessConstants => "Bindless constants",
            RenderMode::BindlessMultiDraw => "Bindless multi-draw",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_has_its_own_permutation() {
        for a in RenderMode::ALL {
            assert_eq!(RenderMode::ALL[a.index()], a);
            for b in RenderMode::ALL {
                assert_eq!(a == b, a.permutation() == b.permutation());
            }
        }
    }

    #[test]
    fn default_is_multi_draw() {
        assert_eq!(RenderMode::default(), RenderMode::BindlessMultiDraw);
    }
}

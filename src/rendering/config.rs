use std::str::FromStr;

use crate::{rendering::render_mode::RenderMode, scene_graph::demo_scene::DemoSceneConfig};

pub const SUBMISSION_REPEAT_VAR: &str = "DRAWBENCH_SUBMISSION_REPEAT";
pub const GRID_SIZE_VAR: &str = "DRAWBENCH_GRID_SIZE";

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub initial_mode: RenderMode,
    /// How many times each frame's draw submission is issued. Only useful for
    /// amplifying per-draw overhead when measuring.
    pub submission_repeat: u32,
    pub clear_color: wgpu::Color,
    pub demo_scene: DemoSceneConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            initial_mode: RenderMode::default(),
            submission_repeat: 1,
            clear_color: wgpu::Color {
                r: 0.2,
                g: 0.6,
                b: 0.9,
                a: 1.0,
            },
            demo_scene: DemoSceneConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name. Values that don't parse
    /// as a positive integer are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(repeat) = parse_positive(SUBMISSION_REPEAT_VAR, lookup(SUBMISSION_REPEAT_VAR)) {
            self.submission_repeat = repeat;
        }
        if let Some(grid_size) = parse_positive(GRID_SIZE_VAR, lookup(GRID_SIZE_VAR)) {
            self.demo_scene.grid_size = grid_size;
        }
        self
    }
}

fn parse_positive<T>(name: &str, value: Option<String>) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let value = value?;

    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Some(parsed),
        _ => {
            log::warn!("Ignoring {name}={value:?}: expected a positive integer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn overrides(vars: &[(&str, &str)]) -> RenderConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        RenderConfig::default().with_overrides(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = RenderConfig::default();

        assert_eq!(config.initial_mode, RenderMode::BindlessMultiDraw);
        assert_eq!(config.submission_repeat, 1);
    }

    #[test]
    fn overrides_apply() {
        let config = overrides(&[(SUBMISSION_REPEAT_VAR, "4"), (GRID_SIZE_VAR, " 10 ")]);

        assert_eq!(config.submission_repeat, 4);
        assert_eq!(config.demo_scene.grid_size, 10);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let config = overrides(&[(SUBMISSION_REPEAT_VAR, "0"), (GRID_SIZE_VAR, "lots")]);

        assert_eq!(config.submission_repeat, 1);
        assert_eq!(
            config.demo_scene.grid_size,
            DemoSceneConfig::default().grid_size
        );
    }
}

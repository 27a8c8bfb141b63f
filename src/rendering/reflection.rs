use std::collections::HashMap;

use naga::{ArraySize, Handle, Module, Type, TypeInner};

/// Layout lookup for the constant blocks of the currently selected shader
/// variant. Member paths use `.` for struct members and `[i]` for array
/// elements, e.g. `camera.view` or `lights[2].color`.
pub trait ShaderReflection {
    /// Size in bytes of the block's type, `None` if the variant has no such block.
    fn block_size(&self, block: &str) -> Option<u64>;

    /// Byte offset of `member` from the start of `block`, `None` if absent.
    fn member_offset(&self, block: &str, member: &str) -> Option<u64>;

    /// Element count of a fixed-size array member.
    fn array_length(&self, block: &str, member: &str) -> Option<u32>;
}

#[derive(Debug, PartialEq)]
struct PathSegment<'a> {
    name: &'a str,
    indices: Vec<u32>,
}

fn parse_member_path(path: &str) -> Option<Vec<PathSegment<'_>>> {
    if path.is_empty() {
        return Some(Vec::new());
    }

    path.split('.')
        .map(|segment| {
            let (name, mut rest) = match segment.find('[') {
                Some(bracket) => segment.split_at(bracket),
                None => (segment, ""),
            };

            let mut indices = Vec::new();
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped.find(']')?;
                indices.push(stripped[..close].parse().ok()?);
                rest = &stripped[close + 1..];
            }

            if !rest.is_empty() || (name.is_empty() && indices.is_empty()) {
                return None;
            }

            Some(PathSegment { name, indices })
        })
        .collect()
}

/// Reflects a composed naga module. Blocks are global variables looked up by
/// name; a storage array block is addressed with a leading index (`[0].world`).
pub struct NagaReflection {
    module: Module,
}

impl NagaReflection {
    pub fn new(module: Module) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    fn block_type(&self, block: &str) -> Option<Handle<Type>> {
        self.module
            .global_variables
            .iter()
            .find(|(_, variable)| variable.name.as_deref() == Some(block))
            .map(|(_, variable)| variable.ty)
    }

    fn resolve(&self, block: &str, member: &str) -> Option<(u64, Handle<Type>)> {
        let mut ty = self.block_type(block)?;
        let mut offset = 0u64;

        for segment in parse_member_path(member)? {
            if !segment.name.is_empty() {
                let TypeInner::Struct { members, .. } = &self.module.types[ty].inner else {
                    return None;
                };
                let found = members
                    .iter()
                    .find(|m| m.name.as_deref() == Some(segment.name))?;
                offset += found.offset as u64;
                ty = found.ty;
            }

            for index in segment.indices {
                let TypeInner::Array { base, size, stride } = self.module.types[ty].inner else {
                    return None;
                };
                if let ArraySize::Constant(length) = size {
                    if index >= length.get() {
                        return None;
                    }
                }
                offset += index as u64 * stride as u64;
                ty = base;
            }
        }

        Some((offset, ty))
    }
}

impl ShaderReflection for NagaReflection {
    fn block_size(&self, block: &str) -> Option<u64> {
        let ty = self.block_type(block)?;
        Some(self.module.types[ty].inner.size(self.module.to_ctx()) as u64)
    }

    fn member_offset(&self, block: &str, member: &str) -> Option<u64> {
        self.resolve(block, member).map(|(offset, _)| offset)
    }

    fn array_length(&self, block: &str, member: &str) -> Option<u32> {
        let (_, ty) = self.resolve(block, member)?;
        match self.module.types[ty].inner {
            TypeInner::Array {
                size: ArraySize::Constant(length),
                ..
            } => Some(length.get()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct StaticBlock {
    size: u64,
    members: HashMap<String, u64>,
    array_lengths: HashMap<String, u32>,
}

/// Hand-written block layouts. Member paths are matched verbatim.
#[derive(Debug, Clone, Default)]
pub struct StaticReflection {
    blocks: HashMap<String, StaticBlock>,
}

impl StaticReflection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: &str, size: u64) -> Self {
        self.blocks.entry(block.to_string()).or_default().size = size;
        self
    }

    pub fn with_member(mut self, block: &str, member: &str, offset: u64) -> Self {
        self.blocks
            .entry(block.to_string())
            .or_default()
            .members
            .insert(member.to_string(), offset);
        self
    }

    pub fn with_array(mut self, block: &str, member: &str, offset: u64, length: u32) -> Self {
        let entry = self.blocks.entry(block.to_string()).or_default();
        entry.members.insert(member.to_string(), offset);
        entry.array_lengths.insert(member.to_string(), length);
        self
    }
}

impl ShaderReflection for StaticReflection {
    fn block_size(&self, block: &str) -> Option<u64> {
        self.blocks.get(block).map(|block| block.size)
    }

    fn member_offset(&self, block: &str, member: &str) -> Option<u64> {
        self.blocks.get(block)?.members.get(member).copied()
    }

    fn array_length(&self, block: &str, member: &str) -> Option<u32> {
        self.blocks.get(block)?.array_lengths.get(member).copied()
    }
}

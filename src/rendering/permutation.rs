use std::{collections::BTreeSet, fmt};

/// A set of shader defines. Two permutations are the same shader variant if
/// and only if their define sets are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderPermutation {
    defines: BTreeSet<String>,
}

impl ShaderPermutation {
    pub fn new<I, S>(defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            defines: defines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_defined(&self, define: &str) -> bool {
        self.defines.contains(define)
    }

    pub fn defines(&self) -> impl Iterator<Item = &str> {
        self.defines.iter().map(String::as_str)
    }

    /// Defines in the form naga_oil's preprocessor takes them.
    pub fn shader_defs(&self) -> std::collections::HashMap<String, naga_oil::compose::ShaderDefValue> {
        self.defines
            .iter()
            .map(|define| (define.clone(), naga_oil::compose::ShaderDefValue::Bool(true)))
            .collect()
    }
}

impl fmt::Display for ShaderPermutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, define) in self.defines.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{define}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_order_does_not_matter() {
        let a = ShaderPermutation::new(["B", "A"]);
        let b = ShaderPermutation::new(["A", "B", "A"]);

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[A, B]");
        assert!(a.is_defined("A"));
        assert!(!a.is_defined("C"));
    }
}

//! Named code blocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::code::Code;

/// A single encoded block: a name plus the code it is encoded in.
///
/// Two blocks are equal when their codes are equal; names are labels only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    name: String,
    code: Arc<Code>,
}

impl Block {
    /// Create a block.
    pub fn new(name: impl Into<String>, code: Arc<Code>) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }

    /// Block name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The code of the block.
    pub fn code(&self) -> &Arc<Code> {
        &self.code
    }

    /// Number of physical qubits.
    pub fn len(&self) -> usize {
        self.code.n()
    }

    /// True for a zero-qubit block.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of an error key for this block.
    pub fn key_width(&self) -> usize {
        self.code.key_width()
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.code, &other.code) || *self.code == *other.code
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.code)
    }
}

/// Key widths of a sequence of blocks.
pub fn key_widths(blocks: &[Block]) -> Vec<usize> {
    blocks.iter().map(Block::key_width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Basis;

    #[test]
    fn test_equality_ignores_name() {
        let a = Block::new("a", Arc::new(Code::golay()));
        let b = Block::new("b", Arc::new(Code::golay()));
        let c = Block::new("a", Arc::new(Code::ed422(None)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_state_block_differs_from_code_block() {
        let code = Arc::new(Code::ed422(None));
        let state = Arc::new(Code::state(code.clone(), vec![Basis::X]).unwrap());
        let a = Block::new("a", code);
        let b = Block::new("a", state);
        assert_ne!(a, b);
        assert_eq!(a.key_width(), b.key_width());
        assert_eq!(b.to_string(), "a.[[4,1,2]]X");
    }
}

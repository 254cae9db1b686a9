//! Error types for opcode parsing and instruction resolution.

use alloc::string::String;
use core::fmt;

use crate::ir::Instruction;
use crate::opcode::Opcode;

/// Resolution failure: the instruction's opcode is a registry gap.
///
/// A gap means the code generator emitted an opcode the optimizer knows
/// nothing about. Callers should treat it as a fatal internal error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgInfoError {
    /// The opcode has no entry in the property table.
    Unregistered {
        /// The instruction that failed to resolve.
        instruction: Instruction,
    },

    /// The opcode has an entry, but no flag in it is set.
    EmptyRecord {
        /// The instruction that failed to resolve.
        instruction: Instruction,
    },
}

impl ProgInfoError {
    /// The instruction that failed to resolve.
    pub fn instruction(&self) -> &Instruction {
        match self {
            ProgInfoError::Unregistered { instruction }
            | ProgInfoError::EmptyRecord { instruction } => instruction,
        }
    }

    /// The opcode with the missing or empty entry.
    pub fn opcode(&self) -> Opcode {
        self.instruction().opcode
    }
}

impl fmt::Display for ProgInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgInfoError::Unregistered { instruction } => write!(
                f,
                "unknown instruction '{}': opcode {} has no registry entry",
                instruction, instruction.opcode
            ),
            ProgInfoError::EmptyRecord { instruction } => write!(
                f,
                "unknown instruction '{}': registry entry for {} has no flags set",
                instruction, instruction.opcode
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProgInfoError {}

/// An assembler name that matches no [`Opcode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOpcodeError {
    name: String,
}

impl ParseOpcodeError {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    /// The name that failed to parse.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ParseOpcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown opcode '{}'", self.name)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseOpcodeError {}

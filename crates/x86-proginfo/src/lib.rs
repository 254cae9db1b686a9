//! # x86-proginfo: Instruction Metadata for an x86-32 Code Generator
//!
//! `x86-proginfo` is the knowledge base an optimizer and register allocator
//! consult about every instruction the x86-32 backend emits: which operands
//! are read or written, which registers are used implicitly, how the
//! condition flags flow, and whether control falls through.
//!
//! ## Quick Start
//!
//! ```rust
//! use x86_proginfo::{resolve, Instruction, Opcode, Operand, Register};
//!
//! // mull %ecx  =>  edx:eax = eax * ecx
//! let instr = Instruction::new(Opcode::MulL, Register::Ecx, Operand::None);
//! let info = resolve(&instr).unwrap();
//! assert!(info.reguse.contains(Register::Eax));
//! assert!(info.regset.contains(Register::Edx));
//! assert!(info.set_carry);
//! ```
//!
//! ## Features
//!
//! - **Static table**: one [`ProgInfo`] per opcode, built and checked at
//!   compile time.
//! - **Operand-aware resolution**: variable shift counts, one-operand
//!   `imul`, and address registers are folded in per instruction.
//! - **Fallible**: registry gaps are a [`ProgInfoError`], never a panic.
//! - **`no_std` + `alloc`**: the `std` feature only adds
//!   `std::error::Error` impls.
//! - **serde**: optional `Serialize`/`Deserialize` on all data types.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// The table repeats identical records across opcodes and is built with
// const builders that return `Self`.
#![allow(
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::single_match_else,
    clippy::map_unwrap_or,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools
)]

extern crate alloc;

/// Error types for opcode parsing and resolution.
pub mod error;
/// The metadata record and its component flags.
pub mod info;
/// Registers, register sets, operands, instructions.
pub mod ir;
/// The x86-32 opcode space.
pub mod opcode;
/// Per-instruction resolution.
pub mod resolve;
/// The static property table.
pub mod table;

// Re-exports
pub use error::{ParseOpcodeError, ProgInfoError};
pub use info::{Access, ControlFlow, Family, OpClass, ProgInfo, Pseudo};
pub use ir::{AddrName, Instruction, MemoryOperand, Operand, OperandSize, RegSet, Register};
pub use opcode::Opcode;
pub use resolve::{resolve, resolve_with};
pub use table::ProgTable;

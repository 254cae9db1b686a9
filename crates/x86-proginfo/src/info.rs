//! The per-instruction metadata record.
//!
//! [`ProgInfo`] replaces a packed flag word with named fields so that every
//! fact is accessed by name. All builders are `const fn`; the property table
//! is assembled at compile time from them.

use core::fmt;

use crate::ir::{OperandSize, RegSet};

/// How an instruction uses one operand position.
///
/// The three facts are independent: an operand can be read and written
/// (read-modify-write), used only as an address, or an address that is
/// also written through (x87 popping stores).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Access {
    /// The operand's value is read.
    pub read: bool,
    /// The operand is written.
    pub write: bool,
    /// The operand is used as an address rather than a value; the
    /// optimizer must not replace it with a register.
    pub addr: bool,
}

impl Access {
    /// Operand not touched.
    pub const NONE: Access = Access {
        read: false,
        write: false,
        addr: false,
    };
    /// Read only.
    pub const READ: Access = Access {
        read: true,
        write: false,
        addr: false,
    };
    /// Write only.
    pub const WRITE: Access = Access {
        read: false,
        write: true,
        addr: false,
    };
    /// Read-modify-write.
    pub const RDWR: Access = Access {
        read: true,
        write: true,
        addr: false,
    };
    /// Address use only.
    pub const ADDR: Access = Access {
        read: false,
        write: false,
        addr: true,
    };

    /// Builder: additionally mark the operand as an address use.
    #[must_use]
    pub const fn with_addr(mut self) -> Access {
        self.addr = true;
        self
    }

    /// Union of two access sets.
    #[must_use]
    pub const fn union(self, other: Access) -> Access {
        Access {
            read: self.read || other.read,
            write: self.write || other.write,
            addr: self.addr || other.addr,
        }
    }

    /// Returns `true` if no fact is set.
    pub const fn is_none(self) -> bool {
        !self.read && !self.write && !self.addr
    }

    /// Returns `true` for read-modify-write.
    pub const fn is_rdwr(self) -> bool {
        self.read && self.write
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("-");
        }
        if self.read {
            f.write_str("r")?;
        }
        if self.write {
            f.write_str("w")?;
        }
        if self.addr {
            f.write_str("a")?;
        }
        Ok(())
    }
}

/// Control-flow behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlFlow {
    /// Falls through to the next instruction.
    #[default]
    FallThrough,
    /// Unconditional jump; ends the block.
    Jump,
    /// Conditional jump.
    CondJump,
    /// Call; control returns to the next instruction.
    Call,
    /// Return or trap; ends the block with no successor in the function.
    Break,
}

impl ControlFlow {
    /// Whether straight-line execution stops after this instruction.
    pub const fn breaks_block(self) -> bool {
        matches!(self, ControlFlow::Jump | ControlFlow::Break)
    }

    /// Whether the instruction has a branch target.
    pub const fn is_branch(self) -> bool {
        matches!(self, ControlFlow::Jump | ControlFlow::CondJump)
    }
}

/// Whether an opcode is a real machine instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pseudo {
    /// A machine instruction.
    #[default]
    Real,
    /// A compiler directive or marker with bookkeeping meaning only.
    Marker,
    /// A directive the optimizer steps over entirely.
    Skip,
}

/// Value-flow class used by copy propagation and conversion folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpClass {
    /// Anything else.
    #[default]
    Other,
    /// Plain copy of source to destination.
    Move,
    /// Copy with width or type conversion.
    Conv,
}

/// Opcode families whose register usage depends on the operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    /// Register usage is fully static.
    #[default]
    Plain,
    /// Shift or rotate; a non-constant count is read from `cl`.
    ShiftCount,
    /// `imul` whose one-operand form implies `edx:eax`.
    WideMultiply,
}

/// Metadata record for one opcode, or for one resolved instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgInfo {
    /// Operand-size class, `None` when implicit.
    pub size: Option<OperandSize>,
    /// Use of the source (left) operand.
    pub left: Access,
    /// Use of the destination (right) operand.
    pub right: Access,
    /// Writes the condition flags.
    pub set_carry: bool,
    /// Reads the condition flags.
    pub use_carry: bool,
    /// Leaves the condition flags undefined (calls, jumps, returns).
    pub kill_carry: bool,
    /// Control-flow class.
    pub control: ControlFlow,
    /// Real instruction or compiler directive.
    pub pseudo: Pseudo,
    /// Move / conversion class.
    pub class: OpClass,
    /// Operand-dependent family.
    pub family: Family,
    /// Explicit "known, nothing further" marker.
    pub ok: bool,
    /// Registers read that are not explicit operands.
    pub reguse: RegSet,
    /// Registers written that are not explicit operands.
    pub regset: RegSet,
    /// Registers read to compute memory addresses.
    pub regindex: RegSet,
}

impl ProgInfo {
    /// A record with nothing set.
    pub const EMPTY: ProgInfo = ProgInfo {
        size: None,
        left: Access::NONE,
        right: Access::NONE,
        set_carry: false,
        use_carry: false,
        kill_carry: false,
        control: ControlFlow::FallThrough,
        pseudo: Pseudo::Real,
        class: OpClass::Other,
        family: Family::Plain,
        ok: false,
        reguse: RegSet::EMPTY,
        regset: RegSet::EMPTY,
        regindex: RegSet::EMPTY,
    };

    /// Returns `true` if no flag is set.
    ///
    /// Register sets do not count: an entry with only implicit registers is
    /// still a registry gap.
    pub const fn is_empty(&self) -> bool {
        self.size.is_none()
            && self.left.is_none()
            && self.right.is_none()
            && !self.set_carry
            && !self.use_carry
            && !self.kill_carry
            && matches!(self.control, ControlFlow::FallThrough)
            && matches!(self.pseudo, Pseudo::Real)
            && matches!(self.class, OpClass::Other)
            && matches!(self.family, Family::Plain)
            && !self.ok
    }

    /// Whether this is a compiler directive rather than a machine instruction.
    pub const fn is_pseudo(&self) -> bool {
        !matches!(self.pseudo, Pseudo::Real)
    }

    /// Whether straight-line execution stops after this instruction.
    pub const fn breaks_block(&self) -> bool {
        self.control.breaks_block()
    }

    /// Whether no instruction may be scheduled across this one.
    pub const fn is_barrier(&self) -> bool {
        self.control.breaks_block() || matches!(self.control, ControlFlow::Call)
    }

    /// Plain copy of source to destination.
    pub const fn is_move(&self) -> bool {
        matches!(self.class, OpClass::Move)
    }

    /// Copy with conversion.
    pub const fn is_conv(&self) -> bool {
        matches!(self.class, OpClass::Conv)
    }

    /// Whether the instruction produces, consumes or clobbers the flags.
    pub const fn touches_flags(&self) -> bool {
        self.set_carry || self.use_carry || self.kill_carry
    }

    /// All registers read without being explicit operands.
    pub const fn implicit_reads(&self) -> RegSet {
        self.reguse.union(self.regindex)
    }

    // ── const builders ───────────────────────────────────────────────────

    /// Builder: set the size class.
    #[must_use]
    pub const fn with_size(mut self, size: OperandSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Builder: set the source operand access.
    #[must_use]
    pub const fn with_left(mut self, access: Access) -> Self {
        self.left = access;
        self
    }

    /// Builder: set the destination operand access.
    #[must_use]
    pub const fn with_right(mut self, access: Access) -> Self {
        self.right = access;
        self
    }

    /// Builder: the instruction writes the flags.
    #[must_use]
    pub const fn with_set_carry(mut self) -> Self {
        self.set_carry = true;
        self
    }

    /// Builder: the instruction reads the flags.
    #[must_use]
    pub const fn with_use_carry(mut self) -> Self {
        self.use_carry = true;
        self
    }

    /// Builder: the flags are undefined afterwards.
    #[must_use]
    pub const fn with_kill_carry(mut self) -> Self {
        self.kill_carry = true;
        self
    }

    /// Builder: set the control-flow class.
    #[must_use]
    pub const fn with_control(mut self, control: ControlFlow) -> Self {
        self.control = control;
        self
    }

    /// Builder: set the pseudo class.
    #[must_use]
    pub const fn with_pseudo(mut self, pseudo: Pseudo) -> Self {
        self.pseudo = pseudo;
        self
    }

    /// Builder: set the move / conversion class.
    #[must_use]
    pub const fn with_class(mut self, class: OpClass) -> Self {
        self.class = class;
        self
    }

    /// Builder: set the operand-dependent family.
    #[must_use]
    pub const fn with_family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    /// Builder: set the explicit OK marker.
    #[must_use]
    pub const fn with_ok(mut self) -> Self {
        self.ok = true;
        self
    }

    /// Builder: add implicitly read registers.
    #[must_use]
    pub const fn with_reguse(mut self, regs: RegSet) -> Self {
        self.reguse = self.reguse.union(regs);
        self
    }

    /// Builder: add implicitly written registers.
    #[must_use]
    pub const fn with_regset(mut self, regs: RegSet) -> Self {
        self.regset = self.regset.union(regs);
        self
    }
}

impl fmt::Display for ProgInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            Some(size) => write!(f, "{}", size)?,
            None => f.write_str("-")?,
        }
        write!(f, " left={} right={}", self.left, self.right)?;
        if self.set_carry {
            f.write_str(" set-carry")?;
        }
        if self.use_carry {
            f.write_str(" use-carry")?;
        }
        if self.kill_carry {
            f.write_str(" kill-carry")?;
        }
        if self.control != ControlFlow::FallThrough {
            write!(f, " {:?}", self.control)?;
        }
        if self.pseudo != Pseudo::Real {
            write!(f, " pseudo={:?}", self.pseudo)?;
        }
        if !self.reguse.is_empty() {
            write!(f, " use={}", self.reguse)?;
        }
        if !self.regset.is_empty() {
            write!(f, " set={}", self.regset)?;
        }
        if !self.regindex.is_empty() {
            write!(f, " index={}", self.regindex)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Register;
    use alloc::format;

    #[test]
    fn empty_record_is_empty() {
        assert!(ProgInfo::EMPTY.is_empty());
        assert_eq!(ProgInfo::default(), ProgInfo::EMPTY);
    }

    #[test]
    fn ok_marker_alone_is_not_empty() {
        assert!(!ProgInfo::EMPTY.with_ok().is_empty());
    }

    #[test]
    fn implicit_registers_alone_are_empty() {
        let info = ProgInfo::EMPTY.with_reguse(RegSet::of(Register::Eax));
        assert!(info.is_empty());
    }

    #[test]
    fn access_combinations_stay_independent() {
        let a = Access::WRITE.with_addr();
        assert!(a.write && a.addr && !a.read);
        assert!(!a.is_rdwr());
        assert!(Access::READ.union(Access::WRITE).is_rdwr());
        assert_eq!(format!("{}", Access::RDWR), "rw");
        assert_eq!(format!("{}", a), "wa");
        assert_eq!(format!("{}", Access::NONE), "-");
    }

    #[test]
    fn control_flow_classes() {
        assert!(ControlFlow::Jump.breaks_block());
        assert!(ControlFlow::Break.breaks_block());
        assert!(!ControlFlow::CondJump.breaks_block());
        assert!(ControlFlow::CondJump.is_branch());
        assert!(!ControlFlow::Call.is_branch());
    }

    #[test]
    fn barrier_covers_calls_and_block_ends() {
        let call = ProgInfo::EMPTY.with_control(ControlFlow::Call);
        let ret = ProgInfo::EMPTY.with_control(ControlFlow::Break);
        let jcc = ProgInfo::EMPTY.with_control(ControlFlow::CondJump);
        assert!(call.is_barrier() && !call.breaks_block());
        assert!(ret.is_barrier() && ret.breaks_block());
        assert!(!jcc.is_barrier());
    }

    #[test]
    fn builders_accumulate_registers() {
        let info = ProgInfo::EMPTY
            .with_ok()
            .with_reguse(RegSet::of(Register::Esi))
            .with_reguse(RegSet::of(Register::Edi))
            .with_regset(RegSet::of(Register::Ecx));
        assert_eq!(info.reguse.len(), 2);
        assert!(info.regset.contains(Register::Cl));
        assert_eq!(info.implicit_reads(), info.reguse);
    }

    #[test]
    fn display_summarises_record() {
        let info = ProgInfo::EMPTY
            .with_size(OperandSize::Dword)
            .with_left(Access::READ)
            .with_right(Access::RDWR)
            .with_set_carry()
            .with_regset(RegSet::of(Register::Edx));
        let s = format!("{}", info);
        assert!(s.starts_with("dword"));
        assert!(s.contains("left=r "));
        assert!(s.contains("right=rw "));
        assert!(s.contains("set-carry"));
        assert!(s.contains("set={edx}"));
    }
}

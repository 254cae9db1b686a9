//! Operand and instruction model consumed by the resolver.
//!
//! These types describe one decoded instruction the way the code generator
//! hands it to the optimizer: an opcode plus a source and a destination
//! operand descriptor. Only the facts the resolver needs are modelled
//! (operand kind, base and index registers, addressing name).

use alloc::string::String;
use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use crate::opcode::Opcode;

/// x86-32 architectural register.
///
/// General-purpose registers appear at every width; all widths of one
/// register (and the `h` byte halves) share a single allocator unit
/// (see [`Register::unit`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Register {
    // -- 32-bit general-purpose registers --
    /// EAX: accumulator.
    Eax,
    /// ECX: counter; `cl` holds variable shift counts.
    Ecx,
    /// EDX: data; high half of wide multiply / divide.
    Edx,
    /// EBX: base.
    Ebx,
    /// ESP: stack pointer.
    Esp,
    /// EBP: frame pointer.
    Ebp,
    /// ESI: string source index.
    Esi,
    /// EDI: string destination index.
    Edi,
    // -- 16-bit general-purpose registers --
    /// 16-bit accumulator.
    Ax,
    /// 16-bit counter.
    Cx,
    /// 16-bit data.
    Dx,
    /// 16-bit base.
    Bx,
    /// 16-bit stack pointer.
    Sp,
    /// 16-bit frame pointer.
    Bp,
    /// 16-bit source index.
    Si,
    /// 16-bit destination index.
    Di,
    // -- 8-bit general-purpose registers --
    /// Low byte of EAX.
    Al,
    /// Low byte of ECX.
    Cl,
    /// Low byte of EDX.
    Dl,
    /// Low byte of EBX.
    Bl,
    /// High byte of AX.
    Ah,
    /// High byte of CX.
    Ch,
    /// High byte of DX.
    Dh,
    /// High byte of BX.
    Bh,
    // -- SSE --
    /// SSE register 0.
    Xmm0,
    /// SSE register 1.
    Xmm1,
    /// SSE register 2.
    Xmm2,
    /// SSE register 3.
    Xmm3,
    /// SSE register 4.
    Xmm4,
    /// SSE register 5.
    Xmm5,
    /// SSE register 6.
    Xmm6,
    /// SSE register 7.
    Xmm7,
    // -- x87 stack --
    /// x87 stack top.
    St0,
    /// x87 stack slot 1.
    St1,
    /// x87 stack slot 2.
    St2,
    /// x87 stack slot 3.
    St3,
    /// x87 stack slot 4.
    St4,
    /// x87 stack slot 5.
    St5,
    /// x87 stack slot 6.
    St6,
    /// x87 stack slot 7.
    St7,
}

/// Canonical register for each allocator unit, indexed by unit number.
const UNIT_REGISTERS: [Register; RegSet::UNITS] = [
    Register::Eax,
    Register::Ecx,
    Register::Edx,
    Register::Ebx,
    Register::Esp,
    Register::Ebp,
    Register::Esi,
    Register::Edi,
    Register::Xmm0,
    Register::Xmm1,
    Register::Xmm2,
    Register::Xmm3,
    Register::Xmm4,
    Register::Xmm5,
    Register::Xmm6,
    Register::Xmm7,
];

impl Register {
    /// Allocator unit of this register, or `None` for registers the
    /// allocator never assigns (the x87 stack).
    ///
    /// All widths of a general-purpose register map to the same unit,
    /// including the high byte halves (`ah` is part of `eax`).
    pub const fn unit(self) -> Option<u8> {
        use Register::*;
        match self {
            Eax | Ax | Al | Ah => Some(0),
            Ecx | Cx | Cl | Ch => Some(1),
            Edx | Dx | Dl | Dh => Some(2),
            Ebx | Bx | Bl | Bh => Some(3),
            Esp | Sp => Some(4),
            Ebp | Bp => Some(5),
            Esi | Si => Some(6),
            Edi | Di => Some(7),
            Xmm0 => Some(8),
            Xmm1 => Some(9),
            Xmm2 => Some(10),
            Xmm3 => Some(11),
            Xmm4 => Some(12),
            Xmm5 => Some(13),
            Xmm6 => Some(14),
            Xmm7 => Some(15),
            St0 | St1 | St2 | St3 | St4 | St5 | St6 | St7 => None,
        }
    }

    /// Size of the register in bits.
    pub fn size_bits(self) -> u16 {
        use Register::*;
        match self {
            Eax | Ecx | Edx | Ebx | Esp | Ebp | Esi | Edi => 32,
            Ax | Cx | Dx | Bx | Sp | Bp | Si | Di => 16,
            Al | Cl | Dl | Bl | Ah | Ch | Dh | Bh => 8,
            Xmm0 | Xmm1 | Xmm2 | Xmm3 | Xmm4 | Xmm5 | Xmm6 | Xmm7 => 128,
            St0 | St1 | St2 | St3 | St4 | St5 | St6 | St7 => 80,
        }
    }

    /// The full-width register sharing this register's unit
    /// (`al` → `eax`, `xmm3` → `xmm3`). x87 registers map to themselves.
    pub fn full(self) -> Register {
        match self.unit() {
            Some(unit) => UNIT_REGISTERS[unit as usize],
            None => self,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Zero-allocation: write Debug chars lowercased directly to the formatter.
        use fmt::Write as _;
        struct LowerWriter<'a, 'b>(&'a mut fmt::Formatter<'b>);
        impl fmt::Write for LowerWriter<'_, '_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                for c in s.chars() {
                    self.0.write_char(c.to_ascii_lowercase())?;
                }
                Ok(())
            }
        }
        write!(LowerWriter(f), "{:?}", self)
    }
}

// ─── RegSet ─────────────────────────────────────────────────────────────────

/// Set of allocator units (general-purpose and SSE registers).
///
/// Membership is by unit, so `al`, `ax` and `eax` are the same element.
/// Registers without a unit (x87) are silently ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegSet(u16);

impl RegSet {
    /// Number of allocator units.
    pub const UNITS: usize = 16;

    /// The empty set.
    pub const EMPTY: RegSet = RegSet(0);

    /// Set holding exactly the unit of `reg`.
    pub const fn of(reg: Register) -> RegSet {
        match reg.unit() {
            Some(unit) => RegSet(1 << unit),
            None => RegSet(0),
        }
    }

    /// Union of two sets.
    pub const fn union(self, other: RegSet) -> RegSet {
        RegSet(self.0 | other.0)
    }

    /// Whether the unit of `reg` is in the set.
    pub const fn contains(self, reg: Register) -> bool {
        match reg.unit() {
            Some(unit) => self.0 & (1 << unit) != 0,
            None => false,
        }
    }

    /// Whether every unit of `other` is also in `self`.
    pub const fn is_superset(self, other: RegSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Add the unit of `reg`.
    pub fn insert(&mut self, reg: Register) {
        *self = self.union(RegSet::of(reg));
    }

    /// Returns `true` if no unit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of units in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw unit mask (bit `n` = unit `n`).
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Canonical register of every unit in the set, in unit order.
    pub fn iter(self) -> impl Iterator<Item = Register> {
        UNIT_REGISTERS
            .iter()
            .enumerate()
            .filter(move |(unit, _)| self.0 & (1 << unit) != 0)
            .map(|(_, &reg)| reg)
    }
}

impl From<Register> for RegSet {
    fn from(reg: Register) -> Self {
        RegSet::of(reg)
    }
}

impl BitOr for RegSet {
    type Output = RegSet;

    fn bitor(self, rhs: RegSet) -> RegSet {
        self.union(rhs)
    }
}

impl BitOr<Register> for RegSet {
    type Output = RegSet;

    fn bitor(self, rhs: Register) -> RegSet {
        self.union(RegSet::of(rhs))
    }
}

impl BitOrAssign for RegSet {
    fn bitor_assign(&mut self, rhs: RegSet) {
        *self = self.union(rhs);
    }
}

impl FromIterator<Register> for RegSet {
    fn from_iter<I: IntoIterator<Item = Register>>(iter: I) -> Self {
        iter.into_iter()
            .fold(RegSet::EMPTY, |set, reg| set.union(RegSet::of(reg)))
    }
}

impl fmt::Display for RegSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, reg) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", reg)?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for RegSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegSet{}", self)
    }
}

// ─── Operand size ───────────────────────────────────────────────────────────

/// Natural operand width of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandSize {
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Word,
    /// 32-bit integer.
    Dword,
    /// 64-bit integer (x87 `V` forms).
    Qword,
    /// Single-precision float.
    Float32,
    /// Double-precision float.
    Float64,
}

impl OperandSize {
    /// Return the operand size in bits.
    pub fn bits(self) -> u16 {
        match self {
            OperandSize::Byte => 8,
            OperandSize::Word => 16,
            OperandSize::Dword | OperandSize::Float32 => 32,
            OperandSize::Qword | OperandSize::Float64 => 64,
        }
    }

    /// Whether this is a floating-point class.
    pub fn is_float(self) -> bool {
        matches!(self, OperandSize::Float32 | OperandSize::Float64)
    }
}

impl fmt::Display for OperandSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandSize::Byte => write!(f, "byte"),
            OperandSize::Word => write!(f, "word"),
            OperandSize::Dword => write!(f, "dword"),
            OperandSize::Qword => write!(f, "qword"),
            OperandSize::Float32 => write!(f, "float32"),
            OperandSize::Float64 => write!(f, "float64"),
        }
    }
}

// ─── Memory operands ────────────────────────────────────────────────────────

/// Addressing name of a memory reference.
///
/// Only [`AddrName::None`] references compute their address from the base
/// register; the named forms are relative to a pseudo-register (static base,
/// stack pointer, frame pointer) the allocator never assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddrName {
    /// Plain `disp(base)` reference.
    #[default]
    None,
    /// External (global) symbol: `sym+disp(SB)`.
    Extern,
    /// File-local static symbol: `sym<>+disp(SB)`.
    Static,
    /// Local stack slot: `sym-disp(SP)`.
    Auto,
    /// Incoming argument slot: `sym+disp(FP)`.
    Param,
}

/// A memory reference (dereferenced or used as an address constant).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryOperand {
    /// How the address is formed.
    pub name: AddrName,
    /// Base register (meaningful for [`AddrName::None`]).
    pub base: Option<Register>,
    /// Index register for scaled-index addressing.
    pub index: Option<Register>,
    /// Index scale factor: 1, 2, 4, or 8.
    pub scale: u8,
    /// Displacement in bytes.
    pub disp: i64,
    /// Symbol name for named references.
    pub symbol: Option<String>,
}

impl Default for MemoryOperand {
    fn default() -> Self {
        Self {
            name: AddrName::None,
            base: None,
            index: None,
            scale: 1,
            disp: 0,
            symbol: None,
        }
    }
}

impl MemoryOperand {
    /// `disp(base)`.
    pub fn base(base: Register, disp: i64) -> Self {
        Self {
            base: Some(base),
            disp,
            ..Self::default()
        }
    }

    /// `disp(base)(index*scale)`; `base` may be absent.
    pub fn indexed(base: Option<Register>, index: Register, scale: u8, disp: i64) -> Self {
        Self {
            base,
            index: Some(index),
            scale,
            disp,
            ..Self::default()
        }
    }

    /// A named reference such as a stack slot or a global symbol.
    pub fn named(name: AddrName, symbol: Option<&str>, disp: i64) -> Self {
        Self {
            name,
            symbol: symbol.map(String::from),
            disp,
            ..Self::default()
        }
    }

    /// Builder: attach a scaled index register.
    #[must_use]
    pub fn with_index(mut self, index: Register, scale: u8) -> Self {
        self.index = Some(index);
        self.scale = scale;
        self
    }

    /// Whether the address is computed from the base register.
    pub fn is_base_relative(&self) -> bool {
        self.name == AddrName::None
    }
}

impl fmt::Display for MemoryOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            AddrName::None => {
                if self.disp != 0 || self.base.is_none() {
                    write!(f, "{}", self.disp)?;
                }
                if let Some(base) = self.base {
                    write!(f, "({})", base)?;
                }
            }
            named => {
                let sym = self.symbol.as_deref().unwrap_or("");
                f.write_str(sym)?;
                if named == AddrName::Static {
                    f.write_str("<>")?;
                }
                if sym.is_empty() {
                    write!(f, "{}", self.disp)?;
                } else if self.disp != 0 {
                    write!(f, "{:+}", self.disp)?;
                }
                let pseudo = match named {
                    AddrName::Auto => "SP",
                    AddrName::Param => "FP",
                    _ => "SB",
                };
                write!(f, "({})", pseudo)?;
            }
        }
        if let Some(index) = self.index {
            write!(f, "({}*{})", index, self.scale)?;
        }
        Ok(())
    }
}

// ─── Operands ───────────────────────────────────────────────────────────────

/// One operand descriptor of a decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// The slot is unused by this instruction form.
    #[default]
    None,
    /// An integer constant.
    Immediate(i64),
    /// A register operand.
    Register(Register),
    /// A dereferenced memory reference.
    Memory(MemoryOperand),
    /// An address constant (`$sym(reg)`); the address is computed but
    /// never dereferenced.
    Address(MemoryOperand),
    /// A branch target (instruction index).
    Branch(u32),
}

impl Operand {
    /// Returns `true` for an unused slot.
    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }

    /// Returns `true` for an integer constant.
    pub fn is_immediate(&self) -> bool {
        matches!(self, Operand::Immediate(_))
    }

    /// The register of a register operand.
    pub fn register(&self) -> Option<Register> {
        match self {
            Operand::Register(reg) => Some(*reg),
            _ => None,
        }
    }

    /// The memory reference of a memory or address operand.
    pub fn memory(&self) -> Option<&MemoryOperand> {
        match self {
            Operand::Memory(mem) | Operand::Address(mem) => Some(mem),
            _ => None,
        }
    }

    /// The scaled index register, if the operand carries one.
    pub fn index(&self) -> Option<Register> {
        self.memory().and_then(|mem| mem.index)
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Register(reg)
    }
}

impl From<MemoryOperand> for Operand {
    fn from(mem: MemoryOperand) -> Self {
        Operand::Memory(mem)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Immediate(v) => write!(f, "${}", v),
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Memory(m) => write!(f, "{}", m),
            Operand::Address(m) => write!(f, "${}", m),
            Operand::Branch(target) => write!(f, "@{}", target),
        }
    }
}

// ─── Instructions ───────────────────────────────────────────────────────────

/// A decoded two-operand instruction, as produced by code generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// The opcode (mnemonic and width).
    pub opcode: Opcode,
    /// Source (left) operand.
    pub src: Operand,
    /// Destination (right) operand.
    pub dst: Operand,
}

impl Instruction {
    /// Create an instruction from its opcode and both operands.
    pub fn new(opcode: Opcode, src: impl Into<Operand>, dst: impl Into<Operand>) -> Self {
        Self {
            opcode,
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// An instruction with both operand slots unused.
    pub fn bare(opcode: Opcode) -> Self {
        Self {
            opcode,
            src: Operand::None,
            dst: Operand::None,
        }
    }

    /// Builder: replace the source operand.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<Operand>) -> Self {
        self.src = src.into();
        self
    }

    /// Builder: replace the destination operand.
    #[must_use]
    pub fn with_dst(mut self, dst: impl Into<Operand>) -> Self {
        self.dst = dst.into();
        self
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        let mut sep = " ";
        for operand in [&self.src, &self.dst] {
            if !operand.is_none() {
                write!(f, "{}{}", sep, operand)?;
                sep = ", ";
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec::Vec;

    #[test]
    fn register_display_is_lowercase() {
        assert_eq!(format!("{}", Register::Eax), "eax");
        assert_eq!(format!("{}", Register::Xmm7), "xmm7");
        assert_eq!(format!("{}", Register::St0), "st0");
    }

    #[test]
    fn byte_and_word_registers_share_unit() {
        assert_eq!(Register::Al.unit(), Register::Eax.unit());
        assert_eq!(Register::Ah.unit(), Register::Eax.unit());
        assert_eq!(Register::Cx.unit(), Register::Ecx.unit());
        assert_eq!(Register::Bh.full(), Register::Ebx);
        assert_eq!(Register::Di.full(), Register::Edi);
    }

    #[test]
    fn x87_registers_have_no_unit() {
        assert_eq!(Register::St3.unit(), None);
        assert!(RegSet::of(Register::St3).is_empty());
        assert_eq!(Register::St3.full(), Register::St3);
    }

    #[test]
    fn register_sizes() {
        assert_eq!(Register::Edx.size_bits(), 32);
        assert_eq!(Register::Dx.size_bits(), 16);
        assert_eq!(Register::Dh.size_bits(), 8);
        assert_eq!(Register::Xmm2.size_bits(), 128);
    }

    #[test]
    fn regset_membership_by_unit() {
        let mut set = RegSet::EMPTY;
        set.insert(Register::Cl);
        assert!(set.contains(Register::Ecx));
        assert!(set.contains(Register::Ch));
        assert!(!set.contains(Register::Eax));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn regset_union_and_display() {
        let set = RegSet::of(Register::Edx) | Register::Eax | RegSet::of(Register::Xmm1);
        assert_eq!(format!("{}", set), "{eax, edx, xmm1}");
        assert_eq!(format!("{:?}", RegSet::EMPTY), "RegSet{}");
        let regs: Vec<Register> = set.iter().collect();
        assert_eq!(regs, [Register::Eax, Register::Edx, Register::Xmm1]);
    }

    #[test]
    fn regset_collect_and_superset() {
        let set: RegSet = [Register::Si, Register::Edi, Register::Esi]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.is_superset(RegSet::of(Register::Di)));
        assert!(!RegSet::of(Register::Di).is_superset(set));
        assert_eq!(set.bits(), 0b1100_0000);
    }

    #[test]
    fn memory_operand_display() {
        assert_eq!(format!("{}", MemoryOperand::base(Register::Ebx, 8)), "8(ebx)");
        assert_eq!(format!("{}", MemoryOperand::base(Register::Ebx, 0)), "(ebx)");
        assert_eq!(
            format!(
                "{}",
                MemoryOperand::indexed(Some(Register::Eax), Register::Esi, 4, -16)
            ),
            "-16(eax)(esi*4)"
        );
        assert_eq!(
            format!("{}", MemoryOperand::named(AddrName::Auto, Some("x"), -8)),
            "x-8(SP)"
        );
        assert_eq!(
            format!("{}", MemoryOperand::named(AddrName::Static, Some("tab"), 0)),
            "tab<>(SB)"
        );
        assert_eq!(
            format!("{}", MemoryOperand::named(AddrName::Param, None, 4)),
            "4(FP)"
        );
    }

    #[test]
    fn operand_accessors() {
        let mem = MemoryOperand::indexed(None, Register::Ecx, 2, 0);
        let op = Operand::Address(mem.clone());
        assert_eq!(op.index(), Some(Register::Ecx));
        assert_eq!(op.memory(), Some(&mem));
        assert_eq!(Operand::Register(Register::Eax).register(), Some(Register::Eax));
        assert!(Operand::default().is_none());
        assert!(Operand::Immediate(3).is_immediate());
        assert_eq!(Operand::Immediate(3).index(), None);
    }

    #[test]
    fn instruction_display() {
        let instr = Instruction::new(
            Opcode::AddL,
            Operand::Immediate(1),
            MemoryOperand::base(Register::Ebp, -4),
        );
        assert_eq!(format!("{}", instr), "ADDL $1, -4(ebp)");
        assert_eq!(format!("{}", Instruction::bare(Opcode::Cdq)), "CDQ");
        let jmp = Instruction::bare(Opcode::Jmp).with_dst(Operand::Branch(12));
        assert_eq!(format!("{}", jmp), "JMP @12");
    }
}

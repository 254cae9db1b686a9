//! The instruction property table.
//!
//! One [`ProgInfo`] per opcode the code generator emits, built at compile
//! time into an array indexed by [`Opcode::index`]. Entries for opcodes the
//! generator never produces are left out; resolving those is a registry gap.
//!
//! As a rule every size variant of an operation is listed even when only a
//! subset is emitted.

use crate::error::ProgInfoError;
use crate::info::{Access, ControlFlow, Family, OpClass, ProgInfo, Pseudo};
use crate::ir::{Instruction, OperandSize, RegSet, Register};
use crate::opcode::Opcode;

const AX: RegSet = RegSet::of(Register::Eax);
const CX: RegSet = RegSet::of(Register::Ecx);
const DX: RegSet = RegSet::of(Register::Edx);
const SI: RegSet = RegSet::of(Register::Esi);
const DI: RegSet = RegSet::of(Register::Edi);

const RD: Access = Access::READ;
const WR: Access = Access::WRITE;
const RW: Access = Access::RDWR;
const AD: Access = Access::ADDR;

const B: OperandSize = OperandSize::Byte;
const W: OperandSize = OperandSize::Word;
const L: OperandSize = OperandSize::Dword;
const Q: OperandSize = OperandSize::Qword;
const F: OperandSize = OperandSize::Float32;
const D: OperandSize = OperandSize::Float64;

/// Per-opcode property table.
#[derive(Debug, Clone)]
pub struct ProgTable {
    entries: [Option<ProgInfo>; Opcode::COUNT],
}

impl ProgTable {
    /// A table with no entries.
    pub const fn empty() -> Self {
        ProgTable {
            entries: [None; Opcode::COUNT],
        }
    }

    /// Build a table from raw entries indexed by [`Opcode::index`].
    pub const fn new(entries: [Option<ProgInfo>; Opcode::COUNT]) -> Self {
        ProgTable { entries }
    }

    /// Builder: register (or replace) the entry for `op`.
    #[must_use]
    pub const fn with_entry(mut self, op: Opcode, info: ProgInfo) -> Self {
        self.entries[op.index()] = Some(info);
        self
    }

    /// The built-in x86-32 table.
    pub fn x86() -> &'static ProgTable {
        &X86_TABLE
    }

    /// Static record of `op`, if registered.
    #[inline]
    pub fn lookup(&self, op: Opcode) -> Option<&ProgInfo> {
        self.entries[op.index()].as_ref()
    }

    /// Registered opcodes with their records, in opcode order.
    pub fn registered(&self) -> impl Iterator<Item = (Opcode, &ProgInfo)> + '_ {
        Opcode::ALL
            .iter()
            .zip(self.entries.iter())
            .filter_map(|(&op, entry)| entry.as_ref().map(|info| (op, info)))
    }

    /// Opcodes that would fail to resolve: unregistered, or registered with
    /// an empty record.
    pub fn gaps(&self) -> impl Iterator<Item = Opcode> + '_ {
        Opcode::ALL
            .iter()
            .copied()
            .filter(move |&op| self.lookup(op).map_or(true, ProgInfo::is_empty))
    }

    /// Resolve `instr` against this table.
    ///
    /// # Errors
    ///
    /// See [`crate::resolve_with`].
    pub fn resolve(&self, instr: &Instruction) -> Result<ProgInfo, ProgInfoError> {
        crate::resolve::resolve_with(self, instr)
    }

    const fn build_x86() -> Self {
        let mut table = ProgTable::empty();
        let mut i = 0;
        while i < Opcode::COUNT {
            table.entries[i] = x86_entry(Opcode::ALL[i]);
            i += 1;
        }
        table
    }
}

const X86_ENTRIES: ProgTable = ProgTable::build_x86();

static X86_TABLE: ProgTable = X86_ENTRIES;

// Every registered entry must carry at least one flag.
const _: () = {
    let mut i = 0;
    while i < Opcode::COUNT {
        if let Some(info) = &X86_ENTRIES.entries[i] {
            assert!(!info.is_empty(), "registered opcode with no flags set");
        }
        i += 1;
    }
};

// ─── Entry shapes ───────────────────────────────────────────────────────────

const fn op(size: OperandSize) -> ProgInfo {
    ProgInfo::EMPTY.with_size(size)
}

const fn ok() -> ProgInfo {
    ProgInfo::EMPTY.with_ok()
}

const fn pseudo(kind: Pseudo) -> ProgInfo {
    ProgInfo::EMPTY.with_pseudo(kind)
}

/// `dst op= src`, flags written.
const fn alu(size: OperandSize) -> ProgInfo {
    op(size).with_left(RD).with_right(RW).with_set_carry()
}

/// `dst op= src`, flags untouched (SSE arithmetic).
const fn sse(size: OperandSize) -> ProgInfo {
    op(size).with_left(RD).with_right(RW)
}

/// Compare: both operands read, flags written.
const fn cmp(size: OperandSize) -> ProgInfo {
    op(size).with_left(RD).with_right(RD).with_set_carry()
}

/// One-operand read-modify-write on the destination.
const fn unary(size: OperandSize) -> ProgInfo {
    op(size).with_right(RW)
}

/// Shift or rotate by `src`.
const fn shift(size: OperandSize) -> ProgInfo {
    alu(size).with_family(Family::ShiftCount)
}

const fn mov(size: OperandSize) -> ProgInfo {
    op(size).with_left(RD).with_right(WR).with_class(OpClass::Move)
}

/// Conversion; `size` is the destination class.
const fn conv(size: OperandSize) -> ProgInfo {
    op(size).with_left(RD).with_right(WR).with_class(OpClass::Conv)
}

/// One-operand multiply or divide through the accumulator.
const fn muldiv(size: OperandSize, uses: RegSet, sets: RegSet) -> ProgInfo {
    op(size)
        .with_left(RD)
        .with_set_carry()
        .with_reguse(uses)
        .with_regset(sets)
}

/// x87 arithmetic: the source is a memory address or stack slot.
const fn farith(size: OperandSize) -> ProgInfo {
    op(size).with_left(AD).with_right(RW)
}

const fn fcom(size: OperandSize) -> ProgInfo {
    op(size).with_left(AD).with_right(RD)
}

const fn fload(size: OperandSize) -> ProgInfo {
    op(size).with_left(AD).with_right(WR)
}

/// x87 popping store. The destination is marked as an address so the
/// register optimizer never replaces the memory reference with an integer
/// register; the old value is not read, so it is also write-only.
const fn fstore_pop(size: OperandSize) -> ProgInfo {
    op(size).with_left(RD).with_right(WR.with_addr())
}

const fn jcc() -> ProgInfo {
    ProgInfo::EMPTY
        .with_control(ControlFlow::CondJump)
        .with_use_carry()
}

const fn setcc() -> ProgInfo {
    op(B).with_right(RW).with_use_carry()
}

/// String op, sign extension or repeat prefix: only implicit registers.
const fn string(uses: RegSet, sets: RegSet) -> ProgInfo {
    ok().with_reguse(uses).with_regset(sets)
}

// ─── The table ──────────────────────────────────────────────────────────────

const fn x86_entry(opcode: Opcode) -> Option<ProgInfo> {
    use Opcode as O;

    let info = match opcode {
        O::Type => pseudo(Pseudo::Skip),
        O::Text | O::FuncData | O::PcData => pseudo(Pseudo::Marker),
        O::Undef => ProgInfo::EMPTY.with_control(ControlFlow::Break),
        O::UseField => ok(),
        O::CheckNil => ProgInfo::EMPTY.with_left(RD),
        O::VarDef | O::VarKill => pseudo(Pseudo::Marker).with_right(WR),
        // Stands for the USED and SET annotations.
        O::Nop => ProgInfo::EMPTY.with_left(RD).with_right(WR),

        O::Call => ProgInfo::EMPTY
            .with_right(AD)
            .with_control(ControlFlow::Call)
            .with_kill_carry(),
        O::Jmp => ProgInfo::EMPTY
            .with_control(ControlFlow::Jump)
            .with_kill_carry(),
        O::Ret => ProgInfo::EMPTY
            .with_control(ControlFlow::Break)
            .with_kill_carry(),
        O::DuffCopy => string(DI.union(SI), DI.union(SI).union(CX)),
        O::DuffZero => string(AX.union(DI), DI),

        O::AdcB => alu(B).with_use_carry(),
        O::AdcL => alu(L).with_use_carry(),
        O::AdcW => alu(W).with_use_carry(),
        O::AddB | O::AndB | O::OrB | O::SubB | O::XorB => alu(B),
        O::AddL | O::AndL | O::OrL | O::SubL | O::XorL => alu(L),
        O::AddW | O::AndW | O::OrW | O::SubW | O::XorW => alu(W),
        O::SbbB => alu(B).with_use_carry(),
        O::SbbL => alu(L).with_use_carry(),
        O::SbbW => alu(W).with_use_carry(),
        O::CmpB | O::TestB => cmp(B),
        O::CmpL | O::TestL => cmp(L),
        O::CmpW | O::TestW => cmp(W),
        O::DecB | O::IncB | O::NotB => unary(B),
        O::DecL | O::IncL | O::NotL => unary(L),
        O::DecW | O::IncW | O::NotW => unary(W),
        O::NegB => unary(B).with_set_carry(),
        O::NegL => unary(L).with_set_carry(),
        O::NegW => unary(W).with_set_carry(),

        O::DivB | O::IDivB => muldiv(B, AX, AX),
        O::DivL | O::IDivL => muldiv(L, AX.union(DX), AX.union(DX)),
        O::DivW | O::IDivW => muldiv(W, AX.union(DX), AX.union(DX)),
        O::MulB | O::IMulB => muldiv(B, AX, AX),
        O::MulL => muldiv(L, AX, AX.union(DX)),
        O::MulW => muldiv(W, AX, AX.union(DX)),
        // Implicit registers depend on whether a destination is given.
        O::IMulL => op(L)
            .with_left(RD)
            .with_family(Family::WideMultiply)
            .with_set_carry(),
        O::IMulW => op(W)
            .with_left(RD)
            .with_family(Family::WideMultiply)
            .with_set_carry(),

        O::Cdq | O::Cwd => string(AX, AX.union(DX)),
        O::Cld | O::Std => ok(),
        O::Sahf => string(AX, AX),

        O::RclB | O::RcrB => shift(B).with_use_carry(),
        O::RclL | O::RcrL => shift(L).with_use_carry(),
        O::RclW | O::RcrW => shift(W).with_use_carry(),
        O::RolB | O::RorB | O::SalB | O::SarB | O::ShlB | O::ShrB => shift(B),
        O::RolL | O::RorL | O::SalL | O::SarL | O::ShlL | O::ShrL => shift(L),
        O::RolW | O::RorW | O::SalW | O::SarW | O::ShlW | O::ShrW => shift(W),

        O::MovB => mov(B),
        O::MovL => mov(L),
        O::MovW => mov(W),
        O::MovBlSx | O::MovBlZx | O::MovWlSx | O::MovWlZx => conv(L),
        O::MovBwSx | O::MovBwZx => conv(W),
        O::LeaL | O::LeaW => ProgInfo::EMPTY.with_left(AD).with_right(WR),
        O::PushL => op(L).with_left(RD),
        O::PopL => op(L).with_right(WR),
        O::XchgB => op(B).with_left(RW).with_right(RW),
        O::XchgL => op(L).with_left(RW).with_right(RW),
        O::XchgW => op(W).with_left(RW).with_right(RW),

        O::MovSb | O::MovSl | O::MovSw => string(DI.union(SI), DI.union(SI)),
        O::StosB | O::StosL | O::StosW => string(AX.union(DI), DI),
        O::Rep | O::RepN => string(CX, CX),

        O::AddSd | O::DivSd | O::MulSd | O::SubSd => sse(D),
        O::AddSs | O::DivSs | O::MulSs | O::SubSs => sse(F),
        O::Pxor => sse(D),
        O::ComiSd => cmp(D),
        O::ComiSs => cmp(F),
        O::UComISd => op(D).with_left(RD).with_right(RD),
        O::UComISs => op(F).with_left(RD).with_right(RD),
        O::CvtSd2Sl | O::CvtSs2Sl | O::CvttSd2Sl | O::CvttSs2Sl => conv(L),
        O::CvtSd2Ss | O::CvtSl2Ss => conv(F),
        O::CvtSl2Sd | O::CvtSs2Sd => conv(D),
        O::MovSd => mov(D),
        O::MovSs => mov(F),
        // MOVAPD is emitted as the faster synonym of MOVSD for
        // register-to-register copies; it is a plain move.
        O::MovApd => mov(D),

        O::FLdCw => op(W).with_left(AD),
        O::FStCw => op(W).with_right(AD),
        O::FStSw => op(W).with_right(WR.with_addr()),
        O::FAddD | O::FAddDP | O::FDivD | O::FDivDP | O::FDivRD | O::FDivRDP => farith(D),
        O::FMulD | O::FMulDP | O::FSubD | O::FSubDP | O::FSubRD | O::FSubRDP => farith(D),
        O::FAddF | O::FDivF | O::FDivRF | O::FMulF | O::FSubF | O::FSubRF => farith(F),
        O::FComD | O::FComDP | O::FComDPP => fcom(D),
        O::FComF | O::FComFP | O::FUComIP => fcom(F),
        // Also used for float32 values; the size class is nominal.
        O::FChs => unary(D),
        // Exchanges two stack slots: both are read and both are written.
        O::FXchD => op(D).with_left(RW).with_right(RW),
        O::FMovD => fload(D),
        O::FMovF => fload(F),
        O::FMovL => fload(L),
        O::FMovV => fload(Q),
        O::FMovW => fload(W),
        O::FMovDP => fstore_pop(D),
        O::FMovFP => fstore_pop(F),
        O::FMovLP => fstore_pop(L),
        O::FMovVP => fstore_pop(Q),
        O::FMovWP => fstore_pop(W),

        O::Jcc | O::Jcs | O::Jeq | O::Jge | O::Jgt | O::Jhi | O::Jle | O::Jls => jcc(),
        O::Jlt | O::Jmi | O::Jne | O::Joc | O::Jos | O::Jpc | O::Jpl | O::Jps => jcc(),

        O::SetCc | O::SetCs | O::SetEq | O::SetGe | O::SetGt | O::SetHi | O::SetLe => setcc(),
        O::SetLs | O::SetLt | O::SetMi | O::SetNe | O::SetOc | O::SetOs | O::SetPc => setcc(),
        O::SetPl | O::SetPs => setcc(),

        O::Cpuid | O::Hlt | O::Int | O::Lock | O::Rdtsc => return None,
    };
    Some(info)
}

//! The closed opcode space of the x86-32 backend.
//!
//! Every mnemonic-and-width form is its own variant (`AddB`, `AddW`, `AddL`).
//! Names follow the backend assembler: the width suffix is part of the
//! mnemonic (`L` = 32-bit, `W` = 16-bit, `B` = 8-bit; x87 `F` = float32,
//! `D` = float64, `V` = int64, trailing `P` = pop), so `Display` prints
//! `ADDL`, `CVTSD2SL`, `FMOVDP`.

use core::fmt;
use core::str::FromStr;

use crate::error::ParseOpcodeError;

macro_rules! opcodes {
    ($( $(#[$meta:meta])* $name:ident ),* $(,)?) => {
        /// Backend opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u16)]
        pub enum Opcode {
            $( $(#[$meta])* $name, )*
        }

        impl Opcode {
            /// Every opcode, in declaration order (`ALL[op.index()] == op`).
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Variant identifiers, parallel to [`Opcode::ALL`].
            const IDENTS: &'static [&'static str] = &[ $( stringify!($name), )* ];
        }
    };
}

opcodes! {
    // -- Compiler pseudo-instructions and generic control flow --
    /// Type annotation for the garbage collector; not an instruction.
    Type,
    /// Function entry directive.
    Text,
    /// Function metadata directive.
    FuncData,
    /// PC-value table directive.
    PcData,
    /// Unreachable trap.
    Undef,
    /// Records a struct field use for the linker.
    UseField,
    /// Nil-pointer check of the source operand.
    CheckNil,
    /// Marks the start of a variable's live range.
    VarDef,
    /// Marks the end of a variable's live range.
    VarKill,
    /// Compiler-internal no-op carrying USED/SET annotations (not Intel `nop`).
    Nop,
    /// Call.
    Call,
    /// Unconditional jump.
    Jmp,
    /// Return.
    Ret,
    /// Call into the unrolled block-copy routine.
    DuffCopy,
    /// Call into the unrolled block-zero routine.
    DuffZero,

    // -- Integer arithmetic and logic --
    AdcB,
    AdcL,
    AdcW,
    AddB,
    AddL,
    AddW,
    AndB,
    AndL,
    AndW,
    CmpB,
    CmpL,
    CmpW,
    DecB,
    DecL,
    DecW,
    IncB,
    IncL,
    IncW,
    NegB,
    NegL,
    NegW,
    NotB,
    NotL,
    NotW,
    OrB,
    OrL,
    OrW,
    SbbB,
    SbbL,
    SbbW,
    SubB,
    SubL,
    SubW,
    TestB,
    TestL,
    TestW,
    XorB,
    XorL,
    XorW,

    // -- Multiply and divide --
    DivB,
    DivL,
    DivW,
    IDivB,
    IDivL,
    IDivW,
    IMulB,
    IMulL,
    IMulW,
    MulB,
    MulL,
    MulW,

    // -- Sign extension into DX and flag transfer --
    /// EAX → EDX:EAX.
    Cdq,
    /// AX → DX:AX.
    Cwd,
    Cld,
    Std,
    Sahf,

    // -- Shifts and rotates --
    RclB,
    RclL,
    RclW,
    RcrB,
    RcrL,
    RcrW,
    RolB,
    RolL,
    RolW,
    RorB,
    RorL,
    RorW,
    SalB,
    SalL,
    SalW,
    SarB,
    SarL,
    SarW,
    ShlB,
    ShlL,
    ShlW,
    ShrB,
    ShrL,
    ShrW,

    // -- Moves, extensions, address computation --
    MovB,
    MovL,
    MovW,
    MovBlSx,
    MovBlZx,
    MovBwSx,
    MovBwZx,
    MovWlSx,
    MovWlZx,
    LeaL,
    LeaW,
    PushL,
    PopL,
    XchgB,
    XchgL,
    XchgW,

    // -- String operations and repeat prefixes --
    /// String move, byte.
    MovSb,
    /// String move, doubleword.
    MovSl,
    /// String move, word.
    MovSw,
    StosB,
    StosL,
    StosW,
    Rep,
    RepN,

    // -- SSE scalar --
    AddSd,
    AddSs,
    ComiSd,
    ComiSs,
    CvtSd2Sl,
    CvtSd2Ss,
    CvtSl2Sd,
    CvtSl2Ss,
    CvtSs2Sd,
    CvtSs2Sl,
    CvttSd2Sl,
    CvttSs2Sl,
    DivSd,
    DivSs,
    /// Scalar double move (SSE, not the string move).
    MovSd,
    /// Scalar single move.
    MovSs,
    MovApd,
    MulSd,
    MulSs,
    Pxor,
    SubSd,
    SubSs,
    UComISd,
    UComISs,

    // -- x87 --
    FAddD,
    FAddDP,
    FAddF,
    FChs,
    FComD,
    FComDP,
    FComDPP,
    FComF,
    FComFP,
    FDivD,
    FDivDP,
    FDivF,
    FDivRD,
    FDivRDP,
    FDivRF,
    FLdCw,
    FMovD,
    FMovF,
    FMovL,
    FMovV,
    FMovW,
    FMovDP,
    FMovFP,
    FMovLP,
    FMovVP,
    FMovWP,
    FMulD,
    FMulDP,
    FMulF,
    FStCw,
    FStSw,
    FSubD,
    FSubDP,
    FSubF,
    FSubRD,
    FSubRDP,
    FSubRF,
    FUComIP,
    FXchD,

    // -- Conditional jumps --
    /// Jump if carry clear.
    Jcc,
    /// Jump if carry set.
    Jcs,
    Jeq,
    Jge,
    Jgt,
    Jhi,
    Jle,
    Jls,
    Jlt,
    Jmi,
    Jne,
    /// Jump if overflow clear.
    Joc,
    /// Jump if overflow set.
    Jos,
    /// Jump if parity clear.
    Jpc,
    Jpl,
    /// Jump if parity set.
    Jps,

    // -- Set byte on condition --
    SetCc,
    SetCs,
    SetEq,
    SetGe,
    SetGt,
    SetHi,
    SetLe,
    SetLs,
    SetLt,
    SetMi,
    SetNe,
    SetOc,
    SetOs,
    SetPc,
    SetPl,
    SetPs,

    // -- Encoder-only: never produced by code generation --
    Cpuid,
    Hlt,
    Int,
    Lock,
    Rdtsc,
}

impl Opcode {
    /// Number of opcodes.
    pub const COUNT: usize = Opcode::ALL.len();

    /// Dense index of this opcode, `0..Opcode::COUNT`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Opcode at `index`, if in range.
    pub fn from_index(index: usize) -> Option<Opcode> {
        Opcode::ALL.get(index).copied()
    }

    fn ident(self) -> &'static str {
        Opcode::IDENTS[self.index()]
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write as _;
        for c in self.ident().chars() {
            f.write_char(c.to_ascii_uppercase())?;
        }
        Ok(())
    }
}

impl FromStr for Opcode {
    type Err = ParseOpcodeError;

    /// Parse an assembler name such as `ADDL` or `fmovdp` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.ident().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseOpcodeError::new(s))
    }
}

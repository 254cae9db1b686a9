//! Property-based tests using proptest.
//!
//! Random instructions over the whole opcode space: resolution must be
//! deterministic, never panic, and always fold address registers in.

use proptest::prelude::*;
use x86_proginfo::{
    resolve, AddrName, Family, Instruction, MemoryOperand, Opcode, Operand, ProgTable, RegSet,
    Register,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn arb_opcode() -> impl Strategy<Value = Opcode> {
    prop::sample::select(Opcode::ALL)
}

/// Registers the allocator can name in an address.
fn arb_gpr() -> impl Strategy<Value = Register> {
    prop::sample::select(vec![
        Register::Eax,
        Register::Ecx,
        Register::Edx,
        Register::Ebx,
        Register::Esp,
        Register::Ebp,
        Register::Esi,
        Register::Edi,
    ])
}

fn arb_register() -> impl Strategy<Value = Register> {
    prop_oneof![
        arb_gpr(),
        prop::sample::select(vec![
            Register::Al,
            Register::Cl,
            Register::Ah,
            Register::Dx,
            Register::Xmm0,
            Register::Xmm5,
            Register::St0,
            Register::St1,
        ]),
    ]
}

fn arb_name() -> impl Strategy<Value = AddrName> {
    prop::sample::select(vec![
        AddrName::None,
        AddrName::Extern,
        AddrName::Static,
        AddrName::Auto,
        AddrName::Param,
    ])
}

fn arb_memory() -> impl Strategy<Value = MemoryOperand> {
    (
        arb_name(),
        prop::option::of(arb_gpr()),
        prop::option::of(arb_gpr()),
        prop::sample::select(vec![1u8, 2, 4, 8]),
        -4096i64..4096,
    )
        .prop_map(|(name, base, index, scale, disp)| MemoryOperand {
            name,
            base,
            index,
            scale,
            disp,
            symbol: (name != AddrName::None).then(|| "sym".to_string()),
        })
}

fn arb_operand() -> impl Strategy<Value = Operand> {
    prop_oneof![
        Just(Operand::None),
        any::<i32>().prop_map(|v| Operand::Immediate(i64::from(v))),
        arb_register().prop_map(Operand::Register),
        arb_memory().prop_map(Operand::Memory),
        arb_memory().prop_map(Operand::Address),
        (0u32..1024).prop_map(Operand::Branch),
    ]
}

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    (arb_opcode(), arb_operand(), arb_operand())
        .prop_map(|(opcode, src, dst)| Instruction { opcode, src, dst })
}

/// Address registers the resolver must report for `operand`.
fn expected_index(operand: &Operand) -> RegSet {
    let mut set = RegSet::EMPTY;
    if let Operand::Memory(mem) = operand {
        if mem.name == AddrName::None {
            if let Some(base) = mem.base {
                set.insert(base);
            }
        }
    }
    if let Some(index) = operand.index() {
        set.insert(index);
    }
    set
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Resolution is a pure function of the instruction.
    #[test]
    fn resolution_is_deterministic(instr in arb_instruction()) {
        prop_assert_eq!(resolve(&instr), resolve(&instr.clone()));
    }

    /// Every opcode outside the gap list resolves, whatever the operands.
    #[test]
    fn resolution_is_total(instr in arb_instruction()) {
        let registered = ProgTable::x86().gaps().all(|op| op != instr.opcode);
        prop_assert_eq!(resolve(&instr).is_ok(), registered, "{}", instr);
    }

    /// Address registers are reported regardless of access flags.
    #[test]
    fn address_registers_always_reported(instr in arb_instruction()) {
        if let Ok(info) = resolve(&instr) {
            let expected = expected_index(&instr.src) | expected_index(&instr.dst);
            prop_assert_eq!(info.regindex, expected, "{}", instr);
        }
    }

    /// Corrections only ever add facts to the static record.
    #[test]
    fn corrections_are_monotone(instr in arb_instruction()) {
        if let Ok(info) = resolve(&instr) {
            let base = ProgTable::x86().lookup(instr.opcode).copied().unwrap();
            prop_assert!(info.reguse.is_superset(base.reguse));
            prop_assert!(info.regset.is_superset(base.regset));
            prop_assert_eq!(info.left, base.left);
            prop_assert!(!base.right.read || info.right.read);
            prop_assert!(!base.right.write || info.right.write);
            prop_assert_eq!(info.set_carry, base.set_carry);
            prop_assert_eq!(info.use_carry, base.use_carry);
            prop_assert_eq!(info.control, base.control);
        }
    }

    /// Only the operand-dependent families pick up implicit registers.
    #[test]
    fn plain_records_keep_implicit_registers(instr in arb_instruction()) {
        if let Ok(info) = resolve(&instr) {
            if info.family == Family::Plain {
                let base = ProgTable::x86().lookup(instr.opcode).copied().unwrap();
                prop_assert_eq!(info.reguse, base.reguse);
                prop_assert_eq!(info.regset, base.regset);
                prop_assert_eq!(info.right, base.right);
            }
        }
    }

    /// Display never panics and always starts with the opcode name.
    #[test]
    fn display_starts_with_opcode(instr in arb_instruction()) {
        let text = instr.to_string();
        prop_assert!(text.starts_with(&instr.opcode.to_string()));
    }
}

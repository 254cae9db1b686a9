#![no_main]
use libfuzzer_sys::fuzz_target;
use x86_proginfo::{AddrName, Instruction, MemoryOperand, Opcode, Operand, Register};

const REGISTERS: [Register; 12] = [
    Register::Eax,
    Register::Ecx,
    Register::Edx,
    Register::Ebx,
    Register::Esp,
    Register::Ebp,
    Register::Esi,
    Register::Edi,
    Register::Cl,
    Register::Ah,
    Register::Xmm1,
    Register::St0,
];

const NAMES: [AddrName; 5] = [
    AddrName::None,
    AddrName::Extern,
    AddrName::Static,
    AddrName::Auto,
    AddrName::Param,
];

fn register(b: u8) -> Register {
    REGISTERS[b as usize % REGISTERS.len()]
}

/// Decode one operand from up to four bytes.
fn operand(bytes: &[u8]) -> Operand {
    let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
    match byte(0) % 6 {
        0 => Operand::None,
        1 => Operand::Immediate(i64::from(byte(1) as i8)),
        2 => Operand::Register(register(byte(1))),
        3 | 4 => {
            let mem = MemoryOperand {
                name: NAMES[byte(1) as usize % NAMES.len()],
                base: (byte(2) & 0x80 != 0).then(|| register(byte(2))),
                index: (byte(3) & 0x80 != 0).then(|| register(byte(3))),
                scale: 1 << (byte(3) & 3),
                disp: i64::from(byte(1) as i8),
                symbol: None,
            };
            if byte(0) % 6 == 3 {
                Operand::Memory(mem)
            } else {
                Operand::Address(mem)
            }
        }
        _ => Operand::Branch(u32::from(byte(1))),
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    // Every byte value maps to some opcode, so gaps are exercised too.
    let opcode = Opcode::ALL[first as usize % Opcode::COUNT];
    let (src, dst) = rest.split_at(rest.len().min(4));
    let instr = Instruction {
        opcode,
        src: operand(src),
        dst: operand(dst),
    };

    // Resolution must never panic, only return Ok/Err, and must be stable.
    let result = x86_proginfo::resolve(&instr);
    assert_eq!(result, x86_proginfo::resolve(&instr));
    let _ = instr.to_string();
    if let Err(err) = result {
        assert_eq!(err.opcode(), opcode);
        let _ = err.to_string();
    }
});

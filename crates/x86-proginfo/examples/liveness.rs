//! Liveness example: the kind of backward pass a register allocator runs
//! over resolved instruction metadata.
//!
//! Run with: `cargo run --example liveness`

use x86_proginfo::{resolve, Instruction, MemoryOperand, Opcode, Operand, ProgInfo, RegSet, Register};

/// Registers read and written by one instruction, explicit and implicit.
fn uses_and_defs(instr: &Instruction, info: &ProgInfo) -> (RegSet, RegSet) {
    let mut uses = info.implicit_reads();
    let mut defs = info.regset;
    if let Some(reg) = instr.src.register() {
        if info.left.read {
            uses.insert(reg);
        }
        if info.left.write {
            defs.insert(reg);
        }
    }
    if let Some(reg) = instr.dst.register() {
        if info.right.read {
            uses.insert(reg);
        }
        if info.right.write {
            defs.insert(reg);
        }
    }
    (uses, defs)
}

fn main() {
    println!("=== x86_proginfo liveness example ===\n");

    // a[i] = (x * y) >> n ; straight-line block
    let block = [
        Instruction::new(Opcode::MovL, MemoryOperand::base(Register::Ebp, 8), Register::Eax),
        Instruction::new(Opcode::MovL, MemoryOperand::base(Register::Ebp, 12), Register::Ebx),
        Instruction::new(Opcode::MulL, Register::Ebx, Operand::None),
        Instruction::new(Opcode::MovL, MemoryOperand::base(Register::Ebp, 16), Register::Ecx),
        Instruction::new(Opcode::ShrL, Register::Cl, Register::Eax),
        Instruction::new(
            Opcode::MovL,
            Register::Eax,
            MemoryOperand::indexed(Some(Register::Edi), Register::Esi, 4, 0),
        ),
        Instruction::bare(Opcode::Ret),
    ];

    let mut infos = Vec::with_capacity(block.len());
    for instr in &block {
        match resolve(instr) {
            Ok(info) => infos.push(info),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }

    // Walk backwards: live_in = uses ∪ (live_out − defs).
    let mut live = RegSet::EMPTY;
    let mut rows = Vec::with_capacity(block.len());
    for (instr, info) in block.iter().zip(&infos).rev() {
        let (uses, defs) = uses_and_defs(instr, info);
        let mut live_in = uses;
        for reg in live.iter() {
            if !defs.contains(reg) {
                live_in.insert(reg);
            }
        }
        rows.push((instr, uses, defs, live_in));
        live = live_in;
    }

    println!("{:<28} {:<22} {:<16} live-in", "instruction", "uses", "defs");
    for (instr, uses, defs, live_in) in rows.into_iter().rev() {
        println!(
            "{:<28} {:<22} {:<16} {}",
            instr.to_string(),
            uses.to_string(),
            defs.to_string(),
            live_in
        );
    }
    println!("\nlive on entry: {live}");
}

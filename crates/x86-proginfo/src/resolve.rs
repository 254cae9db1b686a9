//! Per-instruction resolution.
//!
//! The table holds what is true of an opcode in general; a few facts depend
//! on the operands actually present. Resolution copies the static record and
//! applies those corrections:
//!
//! - a shift or rotate by a non-constant count also reads `ecx` (the count
//!   lives in `cl`);
//! - a one-operand `imul` reads `eax` and writes `edx:eax`, while the
//!   two-operand form updates its destination in place;
//! - registers that form a memory address are recorded in
//!   [`ProgInfo::regindex`], whatever the operand's own access.

use crate::error::ProgInfoError;
use crate::info::{Access, Family, ProgInfo};
use crate::ir::{Instruction, Operand, RegSet, Register};
use crate::table::ProgTable;

/// Resolve `instr` against the built-in x86-32 table.
///
/// # Errors
///
/// Returns [`ProgInfoError::Unregistered`] or [`ProgInfoError::EmptyRecord`]
/// when the opcode is a registry gap.
pub fn resolve(instr: &Instruction) -> Result<ProgInfo, ProgInfoError> {
    resolve_with(ProgTable::x86(), instr)
}

/// Resolve `instr` against `table`.
///
/// # Errors
///
/// Returns [`ProgInfoError::Unregistered`] when `table` has no entry for the
/// opcode, and [`ProgInfoError::EmptyRecord`] when the entry has no flag set.
pub fn resolve_with(table: &ProgTable, instr: &Instruction) -> Result<ProgInfo, ProgInfoError> {
    let mut info = match table.lookup(instr.opcode) {
        Some(info) if !info.is_empty() => *info,
        Some(_) => {
            log::error!("registry entry for {} has no flags set", instr.opcode);
            return Err(ProgInfoError::EmptyRecord {
                instruction: instr.clone(),
            });
        }
        None => {
            log::error!("no registry entry for {}", instr.opcode);
            return Err(ProgInfoError::Unregistered {
                instruction: instr.clone(),
            });
        }
    };

    match info.family {
        Family::Plain => {}
        Family::ShiftCount => {
            if !instr.src.is_immediate() {
                log::trace!("{}: variable shift count reads ecx", instr);
                info.reguse.insert(Register::Ecx);
            }
        }
        Family::WideMultiply => {
            if instr.dst.is_none() {
                log::trace!("{}: one-operand multiply into edx:eax", instr);
                info.reguse.insert(Register::Eax);
                info.regset |= RegSet::of(Register::Eax) | Register::Edx;
            } else {
                log::trace!("{}: two-operand multiply updates destination", instr);
                info.right = info.right.union(Access::RDWR);
            }
        }
    }

    let addressing = address_registers(&instr.src) | address_registers(&instr.dst);
    if !addressing.is_empty() {
        log::trace!("{}: address registers {}", instr, addressing);
        info.regindex |= addressing;
    }

    Ok(info)
}

/// Registers read to form the address of `operand`.
///
/// The base register counts only for a plain dereference; named references
/// are relative to pseudo-registers, and an address constant's base is
/// carried by the value itself. An index register always counts.
fn address_registers(operand: &Operand) -> RegSet {
    let mut regs = RegSet::EMPTY;
    if let Operand::Memory(mem) = operand {
        if let Some(base) = mem.base.filter(|_| mem.is_base_relative()) {
            regs.insert(base);
        }
    }
    if let Some(index) = operand.index() {
        regs.insert(index);
    }
    regs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ControlFlow;
    use crate::ir::{AddrName, MemoryOperand};
    use crate::opcode::Opcode;

    fn regs(list: &[Register]) -> RegSet {
        list.iter().copied().collect()
    }

    #[test]
    fn plain_register_instruction_is_static_record() {
        let instr = Instruction::new(Opcode::AddL, Register::Ebx, Register::Eax);
        let info = resolve(&instr).unwrap();
        assert_eq!(Some(&info), ProgTable::x86().lookup(Opcode::AddL));
    }

    #[test]
    fn shift_by_register_reads_ecx() {
        let instr = Instruction::new(Opcode::ShlL, Register::Cl, Register::Eax);
        let info = resolve(&instr).unwrap();
        assert_eq!(info.reguse, regs(&[Register::Ecx]));
    }

    #[test]
    fn shift_by_constant_has_no_implicit_use() {
        let instr = Instruction::new(Opcode::SarW, Operand::Immediate(3), Register::Dx);
        let info = resolve(&instr).unwrap();
        assert!(info.reguse.is_empty());
    }

    #[test]
    fn shift_by_memory_count_reads_ecx() {
        let count = MemoryOperand::named(AddrName::Auto, Some("n"), -4);
        let instr = Instruction::new(Opcode::RolB, count, Register::Al);
        assert!(resolve(&instr).unwrap().reguse.contains(Register::Ecx));
    }

    #[test]
    fn one_operand_imul_uses_edx_eax() {
        let instr = Instruction::new(Opcode::IMulL, Register::Ecx, Operand::None);
        let info = resolve(&instr).unwrap();
        assert_eq!(info.reguse, regs(&[Register::Eax]));
        assert_eq!(info.regset, regs(&[Register::Eax, Register::Edx]));
        assert_eq!(info.right, Access::NONE);
    }

    #[test]
    fn two_operand_imul_updates_destination() {
        let instr = Instruction::new(Opcode::IMulW, Register::Cx, Register::Bx);
        let info = resolve(&instr).unwrap();
        assert!(info.right.is_rdwr());
        assert!(info.reguse.is_empty());
        assert!(info.regset.is_empty());
    }

    #[test]
    fn store_through_base_and_index_records_both() {
        let dst = MemoryOperand::indexed(Some(Register::Ebx), Register::Esi, 4, 8);
        let instr = Instruction::new(Opcode::MovL, Register::Eax, dst);
        let info = resolve(&instr).unwrap();
        assert_eq!(info.right, Access::WRITE);
        assert_eq!(info.regindex, regs(&[Register::Ebx, Register::Esi]));
    }

    #[test]
    fn named_reference_base_is_not_an_address_register() {
        let mut src = MemoryOperand::named(AddrName::Param, Some("x"), 4);
        src.base = Some(Register::Ebp);
        let instr = Instruction::new(Opcode::MovL, src, Register::Eax);
        assert!(resolve(&instr).unwrap().regindex.is_empty());
    }

    #[test]
    fn address_constant_contributes_only_its_index() {
        let src = Operand::Address(MemoryOperand::indexed(
            Some(Register::Edx),
            Register::Edi,
            2,
            0,
        ));
        let instr = Instruction::new(Opcode::LeaL, src, Register::Eax);
        assert_eq!(resolve(&instr).unwrap().regindex, regs(&[Register::Edi]));
    }

    #[test]
    fn plain_memory_source_records_base() {
        let instr = Instruction::new(
            Opcode::CmpB,
            MemoryOperand::base(Register::Ecx, 0),
            Operand::Immediate(0),
        );
        let info = resolve(&instr).unwrap();
        assert_eq!(info.regindex, regs(&[Register::Ecx]));
        assert!(info.set_carry);
    }

    #[test]
    fn resolution_never_clears_static_facts() {
        let instr = Instruction::new(Opcode::Jne, Operand::None, Operand::Branch(7));
        let info = resolve(&instr).unwrap();
        assert_eq!(info.control, ControlFlow::CondJump);
        assert!(info.use_carry);
    }

    #[test]
    fn encoder_only_opcode_is_unregistered() {
        let instr = Instruction::bare(Opcode::Hlt);
        assert_eq!(
            resolve(&instr),
            Err(ProgInfoError::Unregistered { instruction: instr })
        );
    }

    #[test]
    fn empty_entry_is_rejected() {
        let table = ProgTable::empty().with_entry(Opcode::Cld, ProgInfo::EMPTY);
        let instr = Instruction::bare(Opcode::Cld);
        let err = resolve_with(&table, &instr).unwrap_err();
        assert_eq!(err, ProgInfoError::EmptyRecord { instruction: instr });
    }

    #[test]
    fn custom_table_gets_same_corrections() {
        let shift = ProgInfo::EMPTY
            .with_left(Access::READ)
            .with_family(Family::ShiftCount);
        let table = ProgTable::empty().with_entry(Opcode::Hlt, shift);
        let instr = Instruction::new(Opcode::Hlt, Register::Cl, Register::Eax);
        let info = table.resolve(&instr).unwrap();
        assert!(info.reguse.contains(Register::Ecx));
    }
}

//! x86_64 System V switch stubs. Only the callee-saved registers, the
//! stack pointer and the resume address survive a call boundary, so they
//! are all a context needs to carry.

use core::arch::global_asm;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RegisterFile {
    rbx: u64,
    rbp: u64,
    r12: u64,
    r13: u64,
    r14: u64,
    r15: u64,
    rsp: u64,
    rip: u64,
}

/// Point `regs` at `entry` running on `stack`.
///
/// The stack pointer is dropped 8 bytes below a 16-byte boundary so the
/// entry function observes the alignment a `call` would have produced; the
/// vacated slot holds a null return address to terminate unwinding.
pub(crate) fn prepare(regs: &mut RegisterFile, entry: usize, stack: &mut [u8]) {
    let top = stack.as_mut_ptr() as usize + stack.len();
    let sp = (top & !0xf) - 8;
    unsafe { (sp as *mut u64).write(0) };
    regs.rsp = sp as u64;
    regs.rip = entry as u64;
}

// utl_ctx_save(regs in rdi): returns 0 to the direct caller and 1 when
// jumped back to. utl_ctx_jump(regs in rdi): reinstates the file and
// continues at the saved rip as if utl_ctx_save had just returned 1.
global_asm!(
    r#"
.text
.globl utl_ctx_save
.type utl_ctx_save, @function
utl_ctx_save:
    mov qword ptr [rdi + 0x00], rbx
    mov qword ptr [rdi + 0x08], rbp
    mov qword ptr [rdi + 0x10], r12
    mov qword ptr [rdi + 0x18], r13
    mov qword ptr [rdi + 0x20], r14
    mov qword ptr [rdi + 0x28], r15
    lea rax, [rsp + 8]
    mov qword ptr [rdi + 0x30], rax
    mov rax, qword ptr [rsp]
    mov qword ptr [rdi + 0x38], rax
    xor eax, eax
    ret
.size utl_ctx_save, . - utl_ctx_save

.globl utl_ctx_jump
.type utl_ctx_jump, @function
utl_ctx_jump:
    mov rbx, qword ptr [rdi + 0x00]
    mov rbp, qword ptr [rdi + 0x08]
    mov r12, qword ptr [rdi + 0x10]
    mov r13, qword ptr [rdi + 0x18]
    mov r14, qword ptr [rdi + 0x20]
    mov r15, qword ptr [rdi + 0x28]
    mov rsp, qword ptr [rdi + 0x30]
    mov eax, 1
    jmp qword ptr [rdi + 0x38]
.size utl_ctx_jump, . - utl_ctx_jump
"#
);

extern "C" {
    pub(crate) fn utl_ctx_save(regs: *mut RegisterFile) -> u64;
    pub(crate) fn utl_ctx_jump(regs: *const RegisterFile) -> !;
}

//! Lexical tables for the Organised Assembly language.
//!
//! Register names, instruction mnemonics and reserved words are compiled in and
//! assembled exactly once into an immutable [`Lexicon`]. Order matters: the
//! grammar turns every table into an ordered choice, so the order below is the
//! order in which alternatives are tried.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

// ============================================================================
// REGISTERS
// ============================================================================

/// General purpose registers, 8 through 64 bits.
pub const GP_REGISTERS: &[&str] = &[
    "al", "ah", "ax", "eax", "rax", //
    "bl", "bh", "bx", "ebx", "rbx", //
    "cl", "ch", "cx", "ecx", "rcx", //
    "dl", "dh", "dx", "edx", "rdx", //
    "di", "edi", "rdi", //
    "si", "esi", "rsi", //
    "sp", "esp", "rsp", //
    "bp", "ebp", "rbp", //
    "r8", "r8d", "r8w", "r9", "r9d", "r9w", //
    "r10", "r10d", "r10w", "r11", "r11d", "r11w", //
    "r12", "r12d", "r12w", "r13", "r13d", "r13w", //
    "r14", "r14d", "r14w", "r15", "r15d", "r15w",
];

pub const SEGMENT_REGISTERS: &[&str] = &["cs", "ds", "es", "fs", "gs"];

pub const CONTROL_REGISTERS: &[&str] = &["cr0", "cr1", "cr2", "cr3", "cr4", "cr5", "cr6", "cr7"];

pub const VECTOR_REGISTERS: &[&str] = &[
    "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7", //
    "xmm8", "xmm9", "xmm10", "xmm11", "xmm12", "xmm13", "xmm14", "xmm15",
];

// ============================================================================
// KEYWORDS
// ============================================================================

/// Condition codes accepted after `if`, `while`, `for` and `set`.
pub const CONDITION_SUFFIXES: [&str; 14] = [
    "e", "z", "l", "g", "a", "b", "le", "ge", "be", "ae", "c", "s", "p", "o",
];

pub const SIZE_KEYWORDS: &[&str] = &["byte", "word", "dword", "qword"];

/// Data string sizes: `bytes`, `words`, `dwords`, `qwords`.
pub const STRING_SIZE_KEYWORDS: &[&str] = &["bytes", "words", "dwords", "qwords"];

pub const STRUCTURAL_KEYWORDS: &[&str] = &[
    "constant", "string", "cstring", "function", "method", "using", "namespace", "ref", "enum",
    "struct", "sizeof", "alias", "binary",
];

/// Instruction prefixes matched ahead of the mnemonic, never as opcodes.
pub const REP_PREFIXES: &[&str] = &["rep", "repe", "repne", "repnz", "repz"];

/// General purpose x86-64 mnemonics.
///
/// `set<cc>` forms are generated from [`CONDITION_SUFFIXES`]. The `rep` family
/// and `callf` are filtered out when the lexicon is assembled.
const BASE_INSTRUCTIONS: &[&str] = &[
    "aaa", "aad", "aam", "aas", "adc", "adcx", "add", "adox", "and", "andn", "arpl", "bextr",
    "blsi", "blsmsk", "blsr", "bound", "bsf", "bsr", "bswap", "bt", "btc", "btr", "bts", "bzhi",
    "call", "callf", "cbw", "cdq", "cdqe", "clac", "clc", "cld", "clflush", "cli", "clts", "cmc",
    "cmova", "cmovae", "cmovb", "cmovbe", "cmovc", "cmove", "cmovg", "cmovge", "cmovl", "cmovle",
    "cmovna", "cmovnae", "cmovnb", "cmovnbe", "cmovnc", "cmovne", "cmovng", "cmovnge", "cmovnl",
    "cmovnle", "cmovno", "cmovnp", "cmovns", "cmovnz", "cmovo", "cmovp", "cmovpe", "cmovpo",
    "cmovs", "cmovz", "cmp", "cmpsb", "cmpsd", "cmpsq", "cmpsw", "cmpxchg", "cmpxchg16b",
    "cmpxchg8b", "cpuid", "cqo", "crc32", "cwd", "cwde", "daa", "das", "dec", "div", "enter",
    "hlt", "idiv", "imul", "in", "inc", "insb", "insd", "insw", "int", "int1", "int3", "into",
    "invd", "invlpg", "iret", "iretd", "iretq", "ja", "jae", "jb", "jbe", "jc", "jcxz", "je",
    "jecxz", "jg", "jge", "jl", "jle", "jmp", "jna", "jnae", "jnb", "jnbe", "jnc", "jne", "jng",
    "jnge", "jnl", "jnle", "jno", "jnp", "jns", "jnz", "jo", "jp", "jpe", "jpo", "jrcxz", "js",
    "jz", "lahf", "lar", "lds", "lea", "leave", "les", "lfence", "lfs", "lgdt", "lgs", "lidt",
    "lldt", "lmsw", "lodsb", "lodsd", "lodsq", "lodsw", "loop", "loope", "loopne", "loopnz",
    "loopz", "lsl", "lss", "ltr", "lzcnt", "mfence", "monitor", "mov", "movbe", "movsb", "movsd",
    "movsq", "movsw", "movsx", "movsxd", "movzx", "mul", "mulx", "mwait", "neg", "nop", "not",
    "or", "out", "outsb", "outsd", "outsw", "pause", "pdep", "pext", "pop", "popa", "popad",
    "popcnt", "popf", "popfd", "popfq", "prefetchnta", "prefetcht0", "prefetcht1", "prefetcht2",
    "push", "pusha", "pushad", "pushf", "pushfd", "pushfq", "rcl", "rcr", "rdmsr", "rdpmc",
    "rdrand", "rdseed", "rdtsc", "rdtscp", "rep", "repe", "repne", "repnz", "repz", "ret", "retf",
    "retn", "rol", "ror", "rorx", "rsm", "sahf", "sal", "sar", "sarx", "sbb", "scasb", "scasd",
    "scasq", "scasw", "sfence", "sgdt", "shl", "shld", "shlx", "shr", "shrd", "shrx", "sidt",
    "sldt", "smsw", "stac", "stc", "std", "sti", "stosb", "stosd", "stosq", "stosw", "str", "sub",
    "swapgs", "syscall", "sysenter", "sysexit", "sysret", "test", "tzcnt", "ud2", "verr", "verw",
    "wait", "wbinvd", "wrmsr", "xadd", "xchg", "xgetbv", "xlatb", "xor", "xrstor", "xsave",
    "xsetbv",
];

/// Vector mnemonics. These are matched by the vector instruction rule only and
/// are not reserved.
pub const VECTOR_INSTRUCTIONS: &[&str] = &[
    "addpd", "addps", "addsd", "addss", "andnpd", "andnps", "andpd", "andps", "cmppd", "cmpps",
    "cmpss", "comisd", "comiss", "cvtdq2pd", "cvtdq2ps", "cvtpd2dq", "cvtpd2ps", "cvtps2dq",
    "cvtps2pd", "cvtsd2si", "cvtsd2ss", "cvtsi2sd", "cvtsi2ss", "cvtss2sd", "cvtss2si",
    "cvttpd2dq", "cvttps2dq", "cvttsd2si", "cvttss2si", "divpd", "divps", "divsd", "divss",
    "maxpd", "maxps", "maxsd", "maxss", "minpd", "minps", "minsd", "minss", "movapd", "movaps",
    "movd", "movdqa", "movdqu", "movhlps", "movhpd", "movhps", "movlhps", "movlpd", "movlps",
    "movmskpd", "movmskps", "movq", "movss", "movupd", "movups", "mulpd", "mulps", "mulsd",
    "mulss", "orpd", "orps", "paddb", "paddd", "paddq", "paddw", "pand", "pandn", "pcmpeqb",
    "pcmpeqd", "pcmpeqw", "pcmpgtb", "pcmpgtd", "pcmpgtw", "pmaxub", "pminub", "pmovmskb",
    "pmullw", "por", "pshufd", "pslld", "psllq", "psllw", "psrad", "psraw", "psrld", "psrlq",
    "psrlw", "psubb", "psubd", "psubq", "psubw", "punpckhbw", "punpckhdq", "punpcklbw",
    "punpckldq", "pxor", "rcpps", "rcpss", "rsqrtps", "rsqrtss", "shufpd", "shufps", "sqrtpd",
    "sqrtps", "sqrtsd", "sqrtss", "subpd", "subps", "subsd", "subss", "ucomisd", "ucomiss",
    "unpckhpd", "unpckhps", "unpcklpd", "unpcklps", "xorpd", "xorps",
];

// ============================================================================
// LEXICON
// ============================================================================

/// The assembled keyword tables.
#[derive(Debug)]
pub struct Lexicon {
    instructions: Vec<String>,
    if_keywords: Vec<String>,
    while_keywords: Vec<String>,
    for_keywords: Vec<String>,
    reserved: Vec<String>,
    reserved_set: BTreeSet<String>,
}

static LEXICON: Lazy<Lexicon> = Lazy::new(Lexicon::assemble);

/// Process-wide lexicon, built on first use.
pub fn lexicon() -> &'static Lexicon {
    &LEXICON
}

impl Lexicon {
    fn assemble() -> Self {
        let mut instructions: Vec<String> = BASE_INSTRUCTIONS
            .iter()
            .filter(|m| **m != "callf" && !m.starts_with("rep"))
            .map(|m| m.to_string())
            .collect();
        for suffix in CONDITION_SUFFIXES {
            for form in [format!("set{suffix}"), format!("setn{suffix}")] {
                if !instructions.contains(&form) {
                    instructions.push(form);
                }
            }
        }

        let if_keywords = conditional_family("if");
        let for_keywords = conditional_family("for");
        let while_keywords = conditional_family("while");

        let reserved: Vec<String> = instructions
            .iter()
            .chain(&if_keywords)
            .chain(&for_keywords)
            .chain(&while_keywords)
            .cloned()
            .chain(SIZE_KEYWORDS.iter().map(|s| s.to_string()))
            .chain(STRING_SIZE_KEYWORDS.iter().map(|s| s.to_string()))
            .chain(STRUCTURAL_KEYWORDS.iter().map(|s| s.to_string()))
            .collect();
        let reserved_set = reserved.iter().cloned().collect();

        Self {
            instructions,
            if_keywords,
            while_keywords,
            for_keywords,
            reserved,
            reserved_set,
        }
    }

    /// Opcodes accepted by the instruction rule.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn if_keywords(&self) -> &[String] {
        &self.if_keywords
    }

    pub fn while_keywords(&self) -> &[String] {
        &self.while_keywords
    }

    pub fn for_keywords(&self) -> &[String] {
        &self.for_keywords
    }

    /// Every word the identifier rule refuses, in table order.
    pub fn reserved_words(&self) -> &[String] {
        &self.reserved
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved_set.contains(word)
    }
}

/// `<stem><cc>` and `<stem>n<cc>` for every condition suffix, interleaved.
fn conditional_family(stem: &str) -> Vec<String> {
    CONDITION_SUFFIXES
        .iter()
        .flat_map(|suffix| [format!("{stem}{suffix}"), format!("{stem}n{suffix}")])
        .collect()
}

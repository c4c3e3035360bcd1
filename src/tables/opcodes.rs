//! MOS 6502 opcode descriptor table.
//!
//! One descriptor per decodable byte value: instruction template, addressing
//! mode, and control-flow category. The 151 documented opcodes are legal;
//! the stable undocumented opcodes (LAX, SAX, the RMW combos, the wide NOPs)
//! carry descriptors flagged `illegal` so they can still be rendered when a
//! user forces code at one. Unstable opcodes (JAM, XAA, AHX, TAS, LAS, SHX,
//! SHY) have no descriptor at all.
//!
//! Templates use `@` as the operand placeholder; the formatter substitutes
//! a hex literal or a label.

use std::fmt;

/// 6502 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand, e.g. `TAX`.
    Implied,
    /// Operates on the accumulator, e.g. `ASL A`.
    Accumulator,
    /// One-byte literal operand, e.g. `LDA #$05`.
    Immediate,
    /// One-byte address in page zero.
    ZeroPage,
    /// Zero-page address indexed by X.
    ZeroPageX,
    /// Zero-page address indexed by Y.
    ZeroPageY,
    /// Two-byte little-endian absolute address.
    Absolute,
    /// Absolute address indexed by X.
    AbsoluteX,
    /// Absolute address indexed by Y.
    AbsoluteY,
    /// Two-byte pointer, only used by `JMP (addr)`.
    Indirect,
    /// Zero-page pointer indexed by X before the fetch.
    IndirectX,
    /// Zero-page pointer indexed by Y after the fetch.
    IndirectY,
    /// One-byte signed offset from the address after the instruction.
    Relative,
}

impl AddressingMode {
    /// Operand size in bytes.
    pub fn operand_len(self) -> usize {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectX
            | AddressingMode::IndirectY
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }

    /// Modes whose operand is a direct absolute address the analysis can
    /// resolve (indirect pointers are excluded by design).
    pub fn is_absolute_family(self) -> bool {
        matches!(
            self,
            AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY
        )
    }
}

/// Control-flow category of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// No control transfer; execution falls through.
    None,
    /// Subroutine call (JSR). The callee is not assumed to return, so the
    /// sequential path ends here; callers that do return are re-seeded by
    /// the user or a branch edge.
    Call,
    /// Unconditional jump; execution does not fall through.
    Jump,
    /// Return (RTS/RTI); execution does not fall through.
    Return,
    /// Conditional branch; transfers and falls through.
    Branch,
}

impl FlowKind {
    /// True for instructions that create an edge to a target address.
    pub fn is_control_transfer(self) -> bool {
        matches!(self, FlowKind::Call | FlowKind::Jump | FlowKind::Branch)
    }

    /// True when the analysis does not continue at the next sequential
    /// address. Only plain instructions and conditional branches fall
    /// through; a call's continuation depends on the callee returning,
    /// which static analysis cannot promise (inline-argument JSRs are the
    /// canonical counterexample).
    pub fn ends_sequential_flow(self) -> bool {
        matches!(self, FlowKind::Call | FlowKind::Jump | FlowKind::Return)
    }
}

/// Static metadata for one opcode byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    /// Render template with `@` marking the operand position.
    pub template: &'static str,
    /// Addressing mode; determines operand length and target computation.
    pub mode: AddressingMode,
    /// Control-flow category.
    pub flow: FlowKind,
    /// True for undocumented opcodes.
    pub illegal: bool,
}

impl OpcodeDescriptor {
    /// Total instruction length in bytes, opcode included.
    pub fn len(&self) -> usize {
        1 + self.mode.operand_len()
    }
}

impl fmt::Display for OpcodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}

/// Full 256-slot opcode lookup table.
pub struct OpcodeTable {
    entries: [Option<OpcodeDescriptor>; 256],
}

impl OpcodeTable {
    /// Descriptor for `byte`, or `None` when the value does not decode.
    pub fn get(&self, byte: u8) -> Option<&OpcodeDescriptor> {
        self.entries[byte as usize].as_ref()
    }

    /// True when `byte` decodes to a documented instruction.
    pub fn is_legal(&self, byte: u8) -> bool {
        matches!(self.get(byte), Some(d) if !d.illegal)
    }

    /// Build the complete table.
    pub fn build() -> Self {
        use AddressingMode::*;
        use FlowKind::{Branch, Call, Jump, Return};

        let mut t: [Option<OpcodeDescriptor>; 256] = [None; 256];

        let mut op = |byte: u8, template: &'static str, mode: AddressingMode, flow: FlowKind| {
            t[byte as usize] = Some(OpcodeDescriptor {
                template,
                mode,
                flow,
                illegal: false,
            });
        };
        let none = FlowKind::None;

        // Load / store
        op(0xA9, "LDA #@", Immediate, none);
        op(0xA5, "LDA @", ZeroPage, none);
        op(0xB5, "LDA @,X", ZeroPageX, none);
        op(0xAD, "LDA @", Absolute, none);
        op(0xBD, "LDA @,X", AbsoluteX, none);
        op(0xB9, "LDA @,Y", AbsoluteY, none);
        op(0xA1, "LDA (@,X)", IndirectX, none);
        op(0xB1, "LDA (@),Y", IndirectY, none);
        op(0xA2, "LDX #@", Immediate, none);
        op(0xA6, "LDX @", ZeroPage, none);
        op(0xB6, "LDX @,Y", ZeroPageY, none);
        op(0xAE, "LDX @", Absolute, none);
        op(0xBE, "LDX @,Y", AbsoluteY, none);
        op(0xA0, "LDY #@", Immediate, none);
        op(0xA4, "LDY @", ZeroPage, none);
        op(0xB4, "LDY @,X", ZeroPageX, none);
        op(0xAC, "LDY @", Absolute, none);
        op(0xBC, "LDY @,X", AbsoluteX, none);
        op(0x85, "STA @", ZeroPage, none);
        op(0x95, "STA @,X", ZeroPageX, none);
        op(0x8D, "STA @", Absolute, none);
        op(0x9D, "STA @,X", AbsoluteX, none);
        op(0x99, "STA @,Y", AbsoluteY, none);
        op(0x81, "STA (@,X)", IndirectX, none);
        op(0x91, "STA (@),Y", IndirectY, none);
        op(0x86, "STX @", ZeroPage, none);
        op(0x96, "STX @,Y", ZeroPageY, none);
        op(0x8E, "STX @", Absolute, none);
        op(0x84, "STY @", ZeroPage, none);
        op(0x94, "STY @,X", ZeroPageX, none);
        op(0x8C, "STY @", Absolute, none);

        // Arithmetic
        op(0x69, "ADC #@", Immediate, none);
        op(0x65, "ADC @", ZeroPage, none);
        op(0x75, "ADC @,X", ZeroPageX, none);
        op(0x6D, "ADC @", Absolute, none);
        op(0x7D, "ADC @,X", AbsoluteX, none);
        op(0x79, "ADC @,Y", AbsoluteY, none);
        op(0x61, "ADC (@,X)", IndirectX, none);
        op(0x71, "ADC (@),Y", IndirectY, none);
        op(0xE9, "SBC #@", Immediate, none);
        op(0xE5, "SBC @", ZeroPage, none);
        op(0xF5, "SBC @,X", ZeroPageX, none);
        op(0xED, "SBC @", Absolute, none);
        op(0xFD, "SBC @,X", AbsoluteX, none);
        op(0xF9, "SBC @,Y", AbsoluteY, none);
        op(0xE1, "SBC (@,X)", IndirectX, none);
        op(0xF1, "SBC (@),Y", IndirectY, none);

        // Logic
        op(0x29, "AND #@", Immediate, none);
        op(0x25, "AND @", ZeroPage, none);
        op(0x35, "AND @,X", ZeroPageX, none);
        op(0x2D, "AND @", Absolute, none);
        op(0x3D, "AND @,X", AbsoluteX, none);
        op(0x39, "AND @,Y", AbsoluteY, none);
        op(0x21, "AND (@,X)", IndirectX, none);
        op(0x31, "AND (@),Y", IndirectY, none);
        op(0x09, "ORA #@", Immediate, none);
        op(0x05, "ORA @", ZeroPage, none);
        op(0x15, "ORA @,X", ZeroPageX, none);
        op(0x0D, "ORA @", Absolute, none);
        op(0x1D, "ORA @,X", AbsoluteX, none);
        op(0x19, "ORA @,Y", AbsoluteY, none);
        op(0x01, "ORA (@,X)", IndirectX, none);
        op(0x11, "ORA (@),Y", IndirectY, none);
        op(0x49, "EOR #@", Immediate, none);
        op(0x45, "EOR @", ZeroPage, none);
        op(0x55, "EOR @,X", ZeroPageX, none);
        op(0x4D, "EOR @", Absolute, none);
        op(0x5D, "EOR @,X", AbsoluteX, none);
        op(0x59, "EOR @,Y", AbsoluteY, none);
        op(0x41, "EOR (@,X)", IndirectX, none);
        op(0x51, "EOR (@),Y", IndirectY, none);

        // Compare / bit test
        op(0xC9, "CMP #@", Immediate, none);
        op(0xC5, "CMP @", ZeroPage, none);
        op(0xD5, "CMP @,X", ZeroPageX, none);
        op(0xCD, "CMP @", Absolute, none);
        op(0xDD, "CMP @,X", AbsoluteX, none);
        op(0xD9, "CMP @,Y", AbsoluteY, none);
        op(0xC1, "CMP (@,X)", IndirectX, none);
        op(0xD1, "CMP (@),Y", IndirectY, none);
        op(0xE0, "CPX #@", Immediate, none);
        op(0xE4, "CPX @", ZeroPage, none);
        op(0xEC, "CPX @", Absolute, none);
        op(0xC0, "CPY #@", Immediate, none);
        op(0xC4, "CPY @", ZeroPage, none);
        op(0xCC, "CPY @", Absolute, none);
        op(0x24, "BIT @", ZeroPage, none);
        op(0x2C, "BIT @", Absolute, none);

        // Increment / decrement
        op(0xE6, "INC @", ZeroPage, none);
        op(0xF6, "INC @,X", ZeroPageX, none);
        op(0xEE, "INC @", Absolute, none);
        op(0xFE, "INC @,X", AbsoluteX, none);
        op(0xC6, "DEC @", ZeroPage, none);
        op(0xD6, "DEC @,X", ZeroPageX, none);
        op(0xCE, "DEC @", Absolute, none);
        op(0xDE, "DEC @,X", AbsoluteX, none);
        op(0xE8, "INX", Implied, none);
        op(0xC8, "INY", Implied, none);
        op(0xCA, "DEX", Implied, none);
        op(0x88, "DEY", Implied, none);

        // Shifts / rotates
        op(0x0A, "ASL A", Accumulator, none);
        op(0x06, "ASL @", ZeroPage, none);
        op(0x16, "ASL @,X", ZeroPageX, none);
        op(0x0E, "ASL @", Absolute, none);
        op(0x1E, "ASL @,X", AbsoluteX, none);
        op(0x4A, "LSR A", Accumulator, none);
        op(0x46, "LSR @", ZeroPage, none);
        op(0x56, "LSR @,X", ZeroPageX, none);
        op(0x4E, "LSR @", Absolute, none);
        op(0x5E, "LSR @,X", AbsoluteX, none);
        op(0x2A, "ROL A", Accumulator, none);
        op(0x26, "ROL @", ZeroPage, none);
        op(0x36, "ROL @,X", ZeroPageX, none);
        op(0x2E, "ROL @", Absolute, none);
        op(0x3E, "ROL @,X", AbsoluteX, none);
        op(0x6A, "ROR A", Accumulator, none);
        op(0x66, "ROR @", ZeroPage, none);
        op(0x76, "ROR @,X", ZeroPageX, none);
        op(0x6E, "ROR @", Absolute, none);
        op(0x7E, "ROR @,X", AbsoluteX, none);

        // Control transfer
        op(0x4C, "JMP @", Absolute, Jump);
        op(0x6C, "JMP (@)", Indirect, Jump);
        op(0x20, "JSR @", Absolute, Call);
        op(0x60, "RTS", Implied, Return);
        op(0x40, "RTI", Implied, Return);
        op(0x10, "BPL @", Relative, Branch);
        op(0x30, "BMI @", Relative, Branch);
        op(0x50, "BVC @", Relative, Branch);
        op(0x70, "BVS @", Relative, Branch);
        op(0x90, "BCC @", Relative, Branch);
        op(0xB0, "BCS @", Relative, Branch);
        op(0xD0, "BNE @", Relative, Branch);
        op(0xF0, "BEQ @", Relative, Branch);

        // Flags
        op(0x18, "CLC", Implied, none);
        op(0x38, "SEC", Implied, none);
        op(0x58, "CLI", Implied, none);
        op(0x78, "SEI", Implied, none);
        op(0xB8, "CLV", Implied, none);
        op(0xD8, "CLD", Implied, none);
        op(0xF8, "SED", Implied, none);

        // Transfers / stack
        op(0xAA, "TAX", Implied, none);
        op(0x8A, "TXA", Implied, none);
        op(0xA8, "TAY", Implied, none);
        op(0x98, "TYA", Implied, none);
        op(0xBA, "TSX", Implied, none);
        op(0x9A, "TXS", Implied, none);
        op(0x48, "PHA", Implied, none);
        op(0x68, "PLA", Implied, none);
        op(0x08, "PHP", Implied, none);
        op(0x28, "PLP", Implied, none);

        // Misc
        op(0xEA, "NOP", Implied, none);
        op(0x00, "BRK", Implied, none);

        let mut ill = |byte: u8, template: &'static str, mode: AddressingMode| {
            t[byte as usize] = Some(OpcodeDescriptor {
                template,
                mode,
                flow: FlowKind::None,
                illegal: true,
            });
        };

        // Stable undocumented read-modify-write combos
        ill(0x07, "SLO @", ZeroPage);
        ill(0x17, "SLO @,X", ZeroPageX);
        ill(0x0F, "SLO @", Absolute);
        ill(0x1F, "SLO @,X", AbsoluteX);
        ill(0x1B, "SLO @,Y", AbsoluteY);
        ill(0x03, "SLO (@,X)", IndirectX);
        ill(0x13, "SLO (@),Y", IndirectY);
        ill(0x27, "RLA @", ZeroPage);
        ill(0x37, "RLA @,X", ZeroPageX);
        ill(0x2F, "RLA @", Absolute);
        ill(0x3F, "RLA @,X", AbsoluteX);
        ill(0x3B, "RLA @,Y", AbsoluteY);
        ill(0x23, "RLA (@,X)", IndirectX);
        ill(0x33, "RLA (@),Y", IndirectY);
        ill(0x47, "SRE @", ZeroPage);
        ill(0x57, "SRE @,X", ZeroPageX);
        ill(0x4F, "SRE @", Absolute);
        ill(0x5F, "SRE @,X", AbsoluteX);
        ill(0x5B, "SRE @,Y", AbsoluteY);
        ill(0x43, "SRE (@,X)", IndirectX);
        ill(0x53, "SRE (@),Y", IndirectY);
        ill(0x67, "RRA @", ZeroPage);
        ill(0x77, "RRA @,X", ZeroPageX);
        ill(0x6F, "RRA @", Absolute);
        ill(0x7F, "RRA @,X", AbsoluteX);
        ill(0x7B, "RRA @,Y", AbsoluteY);
        ill(0x63, "RRA (@,X)", IndirectX);
        ill(0x73, "RRA (@),Y", IndirectY);
        ill(0xC7, "DCP @", ZeroPage);
        ill(0xD7, "DCP @,X", ZeroPageX);
        ill(0xCF, "DCP @", Absolute);
        ill(0xDF, "DCP @,X", AbsoluteX);
        ill(0xDB, "DCP @,Y", AbsoluteY);
        ill(0xC3, "DCP (@,X)", IndirectX);
        ill(0xD3, "DCP (@),Y", IndirectY);
        ill(0xE7, "ISB @", ZeroPage);
        ill(0xF7, "ISB @,X", ZeroPageX);
        ill(0xEF, "ISB @", Absolute);
        ill(0xFF, "ISB @,X", AbsoluteX);
        ill(0xFB, "ISB @,Y", AbsoluteY);
        ill(0xE3, "ISB (@,X)", IndirectX);
        ill(0xF3, "ISB (@),Y", IndirectY);

        // Stable undocumented load/store
        ill(0xA7, "LAX @", ZeroPage);
        ill(0xB7, "LAX @,Y", ZeroPageY);
        ill(0xAF, "LAX @", Absolute);
        ill(0xBF, "LAX @,Y", AbsoluteY);
        ill(0xA3, "LAX (@,X)", IndirectX);
        ill(0xB3, "LAX (@),Y", IndirectY);
        ill(0x87, "SAX @", ZeroPage);
        ill(0x97, "SAX @,Y", ZeroPageY);
        ill(0x8F, "SAX @", Absolute);
        ill(0x83, "SAX (@,X)", IndirectX);

        // Immediate-mode combos
        ill(0x0B, "ANC #@", Immediate);
        ill(0x2B, "ANC #@", Immediate);
        ill(0x4B, "ALR #@", Immediate);
        ill(0x6B, "ARR #@", Immediate);
        ill(0xCB, "SBX #@", Immediate);
        ill(0xEB, "SBC #@", Immediate);

        // Wide NOPs
        ill(0x1A, "NOP", Implied);
        ill(0x3A, "NOP", Implied);
        ill(0x5A, "NOP", Implied);
        ill(0x7A, "NOP", Implied);
        ill(0xDA, "NOP", Implied);
        ill(0xFA, "NOP", Implied);
        ill(0x80, "NOP #@", Immediate);
        ill(0x82, "NOP #@", Immediate);
        ill(0x89, "NOP #@", Immediate);
        ill(0xC2, "NOP #@", Immediate);
        ill(0xE2, "NOP #@", Immediate);
        ill(0x04, "NOP @", ZeroPage);
        ill(0x44, "NOP @", ZeroPage);
        ill(0x64, "NOP @", ZeroPage);
        ill(0x14, "NOP @,X", ZeroPageX);
        ill(0x34, "NOP @,X", ZeroPageX);
        ill(0x54, "NOP @,X", ZeroPageX);
        ill(0x74, "NOP @,X", ZeroPageX);
        ill(0xD4, "NOP @,X", ZeroPageX);
        ill(0xF4, "NOP @,X", ZeroPageX);
        ill(0x0C, "NOP @", Absolute);
        ill(0x1C, "NOP @,X", AbsoluteX);
        ill(0x3C, "NOP @,X", AbsoluteX);
        ill(0x5C, "NOP @,X", AbsoluteX);
        ill(0x7C, "NOP @,X", AbsoluteX);
        ill(0xDC, "NOP @,X", AbsoluteX);
        ill(0xFC, "NOP @,X", AbsoluteX);

        Self { entries: t }
    }
}

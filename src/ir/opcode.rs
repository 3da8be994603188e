use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::FastHashMap;

use super::schema::Schema;

/// Opcode enumeration for the supported sea-of-nodes subset.
///
/// The set follows HotSpot C2 node names, filtered for the interpreter's
/// scope: fp-free, call-free (uncommon traps excepted), volatile-free and
/// synchronization-free. IGV names outside this table resolve to
/// [`Opcode::Unknown`], which must never be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Control
    Start,
    If,
    IfTrue,
    IfFalse,
    Region,
    Goto,
    Return,
    Root,
    Halt,
    SafePoint,
    ParsePredicate,
    CallStaticJava,

    // Constants
    ConI,
    ConL,
    ConP,

    // Arithmetic - int32
    AddI,
    SubI,
    MulI,
    DivI,
    ModI,
    AbsI,

    // Arithmetic - int64
    AddL,
    SubL,
    MulL,
    DivL,
    ModL,
    AbsL,

    // Bitwise/shift - int32
    AndI,
    OrI,
    XorI,
    LShiftI,
    RShiftI,
    URShiftI,

    // Bitwise/shift - int64
    AndL,
    OrL,
    XorL,
    LShiftL,
    RShiftL,
    URShiftL,

    // Comparison
    CmpI,
    CmpL,
    CmpP,
    CmpU,
    CmpUL,
    Bool,

    // Conversions and casts
    ConvI2L,
    ConvL2I,
    Conv2B,
    CastII,
    CastLL,
    CastPP,
    CastX2P,
    CastP2X,

    // Conditional move
    CMoveI,
    CMoveL,
    CMoveP,

    // Memory - loads
    LoadB,
    LoadUB,
    LoadS,
    LoadUS,
    LoadI,
    LoadL,
    LoadP,
    LoadN,

    // Memory - stores
    StoreB,
    StoreC,
    StoreI,
    StoreL,
    StoreP,
    StoreN,

    // Memory - merge and allocation
    MergeMem,
    Allocate,
    AllocateArray,
    LoadRange,
    RangeCheck,
    AddP,

    // Merge
    Phi,

    // Projection and parameters
    Proj,
    Parm,

    // Markers
    Opaque1,
    ThreadLocal,

    // Sentinel for unrecognized IGV names
    Unknown,
}

/// Every opcode, in declaration order. Drives the name table and the
/// exhaustiveness tests.
pub(crate) const ALL_OPCODES: &[Opcode] = &[
    Opcode::Start,
    Opcode::If,
    Opcode::IfTrue,
    Opcode::IfFalse,
    Opcode::Region,
    Opcode::Goto,
    Opcode::Return,
    Opcode::Root,
    Opcode::Halt,
    Opcode::SafePoint,
    Opcode::ParsePredicate,
    Opcode::CallStaticJava,
    Opcode::ConI,
    Opcode::ConL,
    Opcode::ConP,
    Opcode::AddI,
    Opcode::SubI,
    Opcode::MulI,
    Opcode::DivI,
    Opcode::ModI,
    Opcode::AbsI,
    Opcode::AddL,
    Opcode::SubL,
    Opcode::MulL,
    Opcode::DivL,
    Opcode::ModL,
    Opcode::AbsL,
    Opcode::AndI,
    Opcode::OrI,
    Opcode::XorI,
    Opcode::LShiftI,
    Opcode::RShiftI,
    Opcode::URShiftI,
    Opcode::AndL,
    Opcode::OrL,
    Opcode::XorL,
    Opcode::LShiftL,
    Opcode::RShiftL,
    Opcode::URShiftL,
    Opcode::CmpI,
    Opcode::CmpL,
    Opcode::CmpP,
    Opcode::CmpU,
    Opcode::CmpUL,
    Opcode::Bool,
    Opcode::ConvI2L,
    Opcode::ConvL2I,
    Opcode::Conv2B,
    Opcode::CastII,
    Opcode::CastLL,
    Opcode::CastPP,
    Opcode::CastX2P,
    Opcode::CastP2X,
    Opcode::CMoveI,
    Opcode::CMoveL,
    Opcode::CMoveP,
    Opcode::LoadB,
    Opcode::LoadUB,
    Opcode::LoadS,
    Opcode::LoadUS,
    Opcode::LoadI,
    Opcode::LoadL,
    Opcode::LoadP,
    Opcode::LoadN,
    Opcode::StoreB,
    Opcode::StoreC,
    Opcode::StoreI,
    Opcode::StoreL,
    Opcode::StoreP,
    Opcode::StoreN,
    Opcode::MergeMem,
    Opcode::Allocate,
    Opcode::AllocateArray,
    Opcode::LoadRange,
    Opcode::RangeCheck,
    Opcode::AddP,
    Opcode::Phi,
    Opcode::Proj,
    Opcode::Parm,
    Opcode::Opaque1,
    Opcode::ThreadLocal,
    Opcode::Unknown,
];

static NAME_TABLE: Lazy<FastHashMap<&'static str, Opcode>> =
    Lazy::new(|| ALL_OPCODES.iter().map(|op| (op.as_str(), *op)).collect());

impl Opcode {
    /// The C2/IGV node name for this opcode.
    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Start => "Start",
            Opcode::If => "If",
            Opcode::IfTrue => "IfTrue",
            Opcode::IfFalse => "IfFalse",
            Opcode::Region => "Region",
            Opcode::Goto => "Goto",
            Opcode::Return => "Return",
            Opcode::Root => "Root",
            Opcode::Halt => "Halt",
            Opcode::SafePoint => "SafePoint",
            Opcode::ParsePredicate => "ParsePredicate",
            Opcode::CallStaticJava => "CallStaticJava",
            Opcode::ConI => "ConI",
            Opcode::ConL => "ConL",
            Opcode::ConP => "ConP",
            Opcode::AddI => "AddI",
            Opcode::SubI => "SubI",
            Opcode::MulI => "MulI",
            Opcode::DivI => "DivI",
            Opcode::ModI => "ModI",
            Opcode::AbsI => "AbsI",
            Opcode::AddL => "AddL",
            Opcode::SubL => "SubL",
            Opcode::MulL => "MulL",
            Opcode::DivL => "DivL",
            Opcode::ModL => "ModL",
            Opcode::AbsL => "AbsL",
            Opcode::AndI => "AndI",
            Opcode::OrI => "OrI",
            Opcode::XorI => "XorI",
            Opcode::LShiftI => "LShiftI",
            Opcode::RShiftI => "RShiftI",
            Opcode::URShiftI => "URShiftI",
            Opcode::AndL => "AndL",
            Opcode::OrL => "OrL",
            Opcode::XorL => "XorL",
            Opcode::LShiftL => "LShiftL",
            Opcode::RShiftL => "RShiftL",
            Opcode::URShiftL => "URShiftL",
            Opcode::CmpI => "CmpI",
            Opcode::CmpL => "CmpL",
            Opcode::CmpP => "CmpP",
            Opcode::CmpU => "CmpU",
            Opcode::CmpUL => "CmpUL",
            Opcode::Bool => "Bool",
            Opcode::ConvI2L => "ConvI2L",
            Opcode::ConvL2I => "ConvL2I",
            Opcode::Conv2B => "Conv2B",
            Opcode::CastII => "CastII",
            Opcode::CastLL => "CastLL",
            Opcode::CastPP => "CastPP",
            Opcode::CastX2P => "CastX2P",
            Opcode::CastP2X => "CastP2X",
            Opcode::CMoveI => "CMoveI",
            Opcode::CMoveL => "CMoveL",
            Opcode::CMoveP => "CMoveP",
            Opcode::LoadB => "LoadB",
            Opcode::LoadUB => "LoadUB",
            Opcode::LoadS => "LoadS",
            Opcode::LoadUS => "LoadUS",
            Opcode::LoadI => "LoadI",
            Opcode::LoadL => "LoadL",
            Opcode::LoadP => "LoadP",
            Opcode::LoadN => "LoadN",
            Opcode::StoreB => "StoreB",
            Opcode::StoreC => "StoreC",
            Opcode::StoreI => "StoreI",
            Opcode::StoreL => "StoreL",
            Opcode::StoreP => "StoreP",
            Opcode::StoreN => "StoreN",
            Opcode::MergeMem => "MergeMem",
            Opcode::Allocate => "Allocate",
            Opcode::AllocateArray => "AllocateArray",
            Opcode::LoadRange => "LoadRange",
            Opcode::RangeCheck => "RangeCheck",
            Opcode::AddP => "AddP",
            Opcode::Phi => "Phi",
            Opcode::Proj => "Proj",
            Opcode::Parm => "Parm",
            Opcode::Opaque1 => "Opaque1",
            Opcode::ThreadLocal => "ThreadLocal",
            Opcode::Unknown => "Unknown",
        }
    }

    /// Resolve an IGV node name. Unrecognized names map to `Unknown`.
    pub fn parse(name: &str) -> Opcode {
        NAME_TABLE.get(name).copied().unwrap_or(Opcode::Unknown)
    }

    /// Control category: nodes that carry the control token.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            Opcode::Start
                | Opcode::If
                | Opcode::IfTrue
                | Opcode::IfFalse
                | Opcode::Region
                | Opcode::Goto
                | Opcode::Return
                | Opcode::Root
                | Opcode::Halt
                | Opcode::SafePoint
                | Opcode::ParsePredicate
                | Opcode::CallStaticJava
        )
    }

    /// Side-effect-free computations (constants, arithmetic, comparisons,
    /// casts, conditional moves, address arithmetic).
    pub fn is_pure(self) -> bool {
        matches!(
            self,
            Opcode::ConI
                | Opcode::ConL
                | Opcode::ConP
                | Opcode::AddI
                | Opcode::SubI
                | Opcode::MulI
                | Opcode::DivI
                | Opcode::ModI
                | Opcode::AbsI
                | Opcode::AddL
                | Opcode::SubL
                | Opcode::MulL
                | Opcode::DivL
                | Opcode::ModL
                | Opcode::AbsL
                | Opcode::AndI
                | Opcode::OrI
                | Opcode::XorI
                | Opcode::LShiftI
                | Opcode::RShiftI
                | Opcode::URShiftI
                | Opcode::AndL
                | Opcode::OrL
                | Opcode::XorL
                | Opcode::LShiftL
                | Opcode::RShiftL
                | Opcode::URShiftL
                | Opcode::CmpI
                | Opcode::CmpL
                | Opcode::CmpP
                | Opcode::CmpU
                | Opcode::CmpUL
                | Opcode::Bool
                | Opcode::ConvI2L
                | Opcode::ConvL2I
                | Opcode::Conv2B
                | Opcode::CastII
                | Opcode::CastLL
                | Opcode::CastPP
                | Opcode::CastX2P
                | Opcode::CastP2X
                | Opcode::CMoveI
                | Opcode::CMoveL
                | Opcode::CMoveP
                | Opcode::AddP
                | Opcode::Opaque1
        )
    }

    /// Memory-effecting nodes: loads, stores, merges, allocation.
    pub fn is_memory(self) -> bool {
        self.is_load() || self.is_store() || matches!(
            self,
            Opcode::MergeMem | Opcode::Allocate | Opcode::AllocateArray | Opcode::LoadRange
        )
    }

    /// Merge points joining several predecessors.
    pub fn is_merge(self) -> bool {
        matches!(self, Opcode::Phi | Opcode::Region | Opcode::MergeMem)
    }

    pub fn is_load(self) -> bool {
        matches!(
            self,
            Opcode::LoadB
                | Opcode::LoadUB
                | Opcode::LoadS
                | Opcode::LoadUS
                | Opcode::LoadI
                | Opcode::LoadL
                | Opcode::LoadP
                | Opcode::LoadN
        )
    }

    pub fn is_store(self) -> bool {
        matches!(
            self,
            Opcode::StoreB
                | Opcode::StoreC
                | Opcode::StoreI
                | Opcode::StoreL
                | Opcode::StoreP
                | Opcode::StoreN
        )
    }

    /// Nodes whose input 0 (for `Region`: every input) is a control edge.
    /// These contribute edges to the control-successor adjacency.
    pub fn takes_control_input(self) -> bool {
        matches!(
            self,
            Opcode::If
                | Opcode::IfTrue
                | Opcode::IfFalse
                | Opcode::Goto
                | Opcode::Return
                | Opcode::Halt
                | Opcode::SafePoint
                | Opcode::ParsePredicate
                | Opcode::CallStaticJava
                | Opcode::Region
                | Opcode::Proj
                | Opcode::Parm
                | Opcode::RangeCheck
        )
    }

    /// Ranking used when a control node has several control-like successors.
    /// Lower ranks are preferred; ties fall back to block-start and position
    /// properties, then node ids.
    pub fn step_priority(self) -> u8 {
        match self {
            Opcode::Return => 0,
            Opcode::If | Opcode::ParsePredicate | Opcode::RangeCheck => 1,
            Opcode::IfTrue | Opcode::IfFalse => 2,
            Opcode::Goto => 3,
            Opcode::Region => 4,
            Opcode::SafePoint | Opcode::CallStaticJava | Opcode::Proj => 5,
            Opcode::Parm => 6,
            Opcode::Halt => 7,
            _ => 8,
        }
    }

    /// Positional input schema for this opcode.
    pub fn schema(self) -> Schema {
        match self {
            Opcode::Start => Schema::Start,
            Opcode::If
            | Opcode::IfTrue
            | Opcode::IfFalse
            | Opcode::Goto
            | Opcode::Root
            | Opcode::Halt
            | Opcode::SafePoint
            | Opcode::ParsePredicate
            | Opcode::CallStaticJava
            | Opcode::RangeCheck => Schema::Control,
            Opcode::Region | Opcode::Phi | Opcode::MergeMem => Schema::Merge,
            op if op.is_load() => Schema::Load,
            Opcode::LoadRange => Schema::Load,
            op if op.is_store() => Schema::Store,
            Opcode::Allocate | Opcode::AllocateArray => Schema::Allocate,
            Opcode::Return => Schema::Return,
            Opcode::Proj => Schema::Projection,
            Opcode::Parm => Schema::Parameter,
            _ => Schema::Pure,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Parsing helpers for the C2 `dump_spec` property.
//!
//! IGV dumps carry a free-form `dump_spec` string per node; a handful of
//! conventions inside it are load-bearing for execution: parameter slots
//! (`Parm0:`), constant payloads (`#int:42`, `#long:-5`), Bool condition
//! codes (`[lt]`), array element accesses (`[int:...`), and uncommon-trap
//! call stubs.

/// Condition-code mask bits tested by `Bool` nodes, `{LT=1, EQ=2, GT=4}`.
pub const MASK_LT: i32 = 1;
pub const MASK_EQ: i32 = 2;
pub const MASK_GT: i32 = 4;

/// Extract the parameter slot from a `Parm` dump_spec such as
/// `"Parm0: int:..."`.
pub fn parm_index(spec: &str) -> Option<i32> {
    let rest = spec.trim_start().strip_prefix("Parm")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || !rest[digits.len()..].starts_with(':') {
        return None;
    }
    digits.parse().ok()
}

/// Extract the payload of an int constant (`" #int:42"`).
pub fn int_constant(spec: &str) -> Option<i32> {
    signed_after(spec, "#int:").and_then(|v| i32::try_from(v).ok())
}

/// Extract the payload of a long constant (`" #long:-5"`).
pub fn long_constant(spec: &str) -> Option<i64> {
    signed_after(spec, "#long:")
}

fn signed_after(spec: &str, marker: &str) -> Option<i64> {
    let pos = spec.find(marker)?;
    let rest = &spec[pos + marker.len()..];
    let len = rest
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && c == '-'))
        .count();
    if len == 0 {
        return None;
    }
    rest[..len].parse().ok()
}

/// Decode a bracketed condition code (`"[lt]"`, `"[ge]"`) into the
/// `{LT=1, EQ=2, GT=4}` mask encoding.
pub fn cond_mask(spec: &str) -> Option<i32> {
    let open = spec.find('[')?;
    let rest = &spec[open + 1..];
    let close = rest.find(']')?;
    match &rest[..close] {
        "lt" => Some(MASK_LT),
        "le" => Some(MASK_LT | MASK_EQ),
        "eq" => Some(MASK_EQ),
        "ne" => Some(MASK_LT | MASK_GT),
        "ge" => Some(MASK_EQ | MASK_GT),
        "gt" => Some(MASK_GT),
        _ => None,
    }
}

/// Whether a `CallStaticJava` is an uncommon-trap stub (assumed non-firing).
pub fn mentions_uncommon_trap(spec: &str) -> bool {
    spec.contains("uncommon_trap")
}

/// Whether a load/store dump_spec describes an array element access
/// (C2 renders the element type in brackets).
pub fn is_array_access(spec: &str) -> bool {
    spec.contains('[')
}

/// Whether a C2 `type` property names a scalar data value. C2 renders
/// scalar kinds with a trailing colon (`int:`, `long:`); the machine-state
/// kinds (`control`, `memory`, `abIO`, `return_address`) have none.
pub fn is_scalar_value_type(ty: &str) -> bool {
    ty.ends_with(':')
}

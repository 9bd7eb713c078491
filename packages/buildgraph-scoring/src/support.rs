//! Small helpers shared by more than one metric.

/// First path segment after a leading `//`; used as a coarse
/// architectural-layer proxy by M1 and M5.
pub fn top_level_dir(package: &str) -> &str {
    let stripped = package.strip_prefix("//").unwrap_or(package);
    match stripped.find('/') {
        Some(idx) => &stripped[..idx],
        None => stripped,
    }
}

/// True iff `kind` names a protobuf-generated rule.
pub fn is_proto_kind(kind: &str) -> bool {
    kind.contains("proto")
}

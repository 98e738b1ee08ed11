//! Per-tool flag partitioning.
//!
//! Users supply a single list of flag groups. A bare group applies to every
//! tool; a group written as `tool:<flags>` applies only to that tool.

/// Extract the flag tokens that apply to `tool` from a combined flag list.
///
/// Order follows `all_flags`; duplicates are kept.
pub fn get_flags(tool: &str, all_flags: &[String]) -> Vec<String> {
    let mut result = Vec::new();

    for group in all_flags {
        let tokens = match group.split_once(':') {
            None => group.as_str(),
            Some((scope, rest)) if scope == tool => rest,
            Some(_) => continue,
        };
        result.extend(tokens.split_whitespace().map(str::to_string));
    }

    result
}

/// Check whether any of `flags` mentions `flag`.
pub fn is_flag_set(flag: &str, flags: &[String]) -> bool {
    flags.iter().any(|f| f.contains(flag))
}
